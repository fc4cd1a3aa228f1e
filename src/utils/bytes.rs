use ndarray::{ArrayD, IxDyn};
use npyz::WriterBuilder;

use crate::error::{Error, Result};
use crate::matrix::types::{ElementType, ResultMatrix};

fn write_npy<T>(array: &ArrayD<T>) -> Result<Vec<u8>>
where
    T: npyz::Serialize + npyz::AutoSerialize + Copy,
{
    let shape: Vec<u64> = array.shape().iter().map(|&d| d as u64).collect();
    let mut bytes = Vec::new();
    {
        let mut writer = npyz::WriteOptions::new()
            .default_dtype()
            .shape(&shape)
            .writer(&mut bytes)
            .begin_nd()?;
        // `iter` walks in logical (C) order whatever the memory layout.
        for value in array.iter() {
            writer.push(value)?;
        }
        writer.finish()?;
    }
    Ok(bytes)
}

/// Serializes the matrix in the `.npy` array-file format, C order.
pub fn matrix_to_npy(matrix: &ResultMatrix) -> Result<Vec<u8>> {
    match matrix {
        ResultMatrix::U8(arr) => write_npy(arr),
        ResultMatrix::U16(arr) => write_npy(arr),
        ResultMatrix::F32(arr) => write_npy(arr),
    }
}

fn read_array<T: npyz::Deserialize>(npy: npyz::NpyFile<&[u8]>) -> Result<ArrayD<T>> {
    let shape: Vec<usize> = npy.shape().iter().map(|&d| d as usize).collect();
    let fortran = npy.order() == npyz::Order::Fortran;
    let data = npy.into_vec::<T>()?;
    if fortran {
        use ndarray::ShapeBuilder;
        return Ok(ArrayD::from_shape_vec(IxDyn(&shape).f(), data)?);
    }
    Ok(ArrayD::from_shape_vec(IxDyn(&shape), data)?)
}

/// Reads an `.npy` blob produced by [`matrix_to_npy`] (or NumPy itself) back
/// into a matrix.
pub fn npy_to_matrix(bytes: &[u8]) -> Result<ResultMatrix> {
    let npy = npyz::NpyFile::new(bytes)?;
    // `DType::descr` is a quoted Python literal; the plain type string is not.
    let descr = match npy.dtype() {
        npyz::DType::Plain(ts) => ts.to_string(),
        other => return Err(Error::Processing(format!("unsupported npy dtype {}", other.descr()))),
    };

    if descr == ElementType::U8.descr() {
        Ok(ResultMatrix::U8(read_array(npy)?))
    } else if descr == ElementType::U16.descr() {
        Ok(ResultMatrix::U16(read_array(npy)?))
    } else if descr == ElementType::F32.descr() {
        Ok(ResultMatrix::F32(read_array(npy)?))
    } else {
        Err(Error::Processing(format!("unsupported npy dtype {descr}")))
    }
}
