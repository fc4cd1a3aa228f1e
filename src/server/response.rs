use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::error;

use crate::error::{Error, ErrorKind, Result};
use crate::matrix::types::{OutputFormat, ResultMatrix};
use crate::utils::{array, bytes};

#[derive(Debug, Serialize)]
pub struct MatrixBody {
    pub matrix: Value,
    pub shape: Vec<usize>,
    pub dtype: &'static str,
}

impl MatrixBody {
    pub fn from_matrix(matrix: &ResultMatrix) -> Result<Self> {
        Ok(Self {
            matrix: array::matrix_to_nested(matrix)?,
            shape: matrix.shape().to_vec(),
            dtype: matrix.dtype().name(),
        })
    }
}

/// Renders the matrix as the JSON body or the raw `.npy` payload.
pub fn format_matrix(matrix: &ResultMatrix, format: OutputFormat) -> Result<Response> {
    match format {
        OutputFormat::Json => Ok(Json(MatrixBody::from_matrix(matrix)?).into_response()),
        OutputFormat::Numpy => Ok(bytes::matrix_to_npy(matrix)?.into_response()),
    }
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::ClientInput => StatusCode::BAD_REQUEST,
            ErrorKind::Auth => StatusCode::UNAUTHORIZED,
            ErrorKind::Processing => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("request failed: {self:?}");
        }
        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{ArrayD, IxDyn};

    fn small() -> ResultMatrix {
        ResultMatrix::U8(ArrayD::from_shape_vec(IxDyn(&[1, 2]), vec![7, 8]).unwrap())
    }

    #[test]
    fn json_body_carries_shape_and_dtype() {
        let body = MatrixBody::from_matrix(&small()).unwrap();
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({ "matrix": [[7, 8]], "shape": [1, 2], "dtype": "uint8" })
        );
    }

    #[test]
    fn both_formats_answer_ok() {
        for format in [OutputFormat::Json, OutputFormat::Numpy] {
            let response = format_matrix(&small(), format).unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[test]
    fn errors_map_to_status_codes() {
        assert_eq!(Error::invalid_image("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::UnsupportedFormat("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            Error::Processing("boom".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
