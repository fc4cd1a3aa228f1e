use ndarray::{ArrayViewD, Axis};
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::matrix::types::ResultMatrix;

/// Nested JSON lists mirroring the array's shape. A zero-dimensional array
/// yields its single element.
pub fn array_to_nested<T: Serialize + Copy>(array: ArrayViewD<'_, T>) -> Result<Value> {
    if array.ndim() == 0 {
        let scalar = array.iter().next().copied();
        return Ok(serde_json::to_value(scalar)?);
    }
    if array.ndim() == 1 {
        return Ok(serde_json::to_value(array.iter().copied().collect::<Vec<T>>())?);
    }

    let rows = array
        .axis_iter(Axis(0))
        .map(array_to_nested)
        .collect::<Result<Vec<Value>>>()?;
    Ok(Value::Array(rows))
}

pub fn matrix_to_nested(matrix: &ResultMatrix) -> Result<Value> {
    match matrix {
        ResultMatrix::U8(arr) => array_to_nested(arr.view()),
        ResultMatrix::U16(arr) => array_to_nested(arr.view()),
        ResultMatrix::F32(arr) => array_to_nested(arr.view()),
    }
}
