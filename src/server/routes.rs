use std::sync::Arc;

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::Multipart;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::Response;
use axum::{Extension, Json};
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{auth, response, validation};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::matrix::convert;
use crate::matrix::types::{OutputFormat, UploadedImage};

/// Fields of a `/api/v1/convert` form.
#[derive(Debug, Default)]
pub struct ConvertForm {
    pub image: Option<UploadedImage>,
    pub format: Option<String>,
    pub preprocess: Vec<String>,
}

async fn read_form(mut multipart: Multipart, settings: &Settings) -> Result<ConvertForm> {
    let mut form = ConvertForm::default();
    // A body cut short by the size limit reads as an oversized image.
    let malformed = |err: MultipartError| {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            validation::oversized(settings)
        } else {
            Error::MalformedRequest(err.to_string())
        }
    };

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let filename = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(malformed)?;
                form.image = Some(UploadedImage::new(bytes.to_vec(), filename, content_type));
            }
            "format" => form.format = Some(field.text().await.map_err(malformed)?),
            "preprocess" => form.preprocess.push(field.text().await.map_err(malformed)?),
            other => debug!("ignoring form field {:?}", other),
        }
    }

    Ok(form)
}

async fn convert_impl(
    settings: &Settings,
    headers: &HeaderMap,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Response> {
    // The key is checked before the body is looked at.
    auth::check_headers(headers, settings)?;

    let multipart = multipart.map_err(|e| Error::MalformedRequest(e.to_string()))?;
    let form = read_form(multipart, settings).await?;
    validation::validate_image(form.image.as_ref(), settings)?;
    let format = match form.format.as_deref() {
        Some(format) => format.parse()?,
        None => OutputFormat::default(),
    };

    let upload = form.image.ok_or_else(|| Error::invalid_image("no image provided"))?;
    let preprocess = form.preprocess;
    info!(
        "converting {:?} ({} bytes) as {:?}, preprocess={:?}",
        upload.filename,
        upload.bytes.len(),
        format,
        preprocess
    );

    tokio::task::spawn_blocking(move || {
        let matrix = convert::image_to_matrix(&upload.bytes, preprocess.as_slice())?;
        debug!("matrix shape={:?} dtype={}", matrix.shape(), matrix.dtype().name());
        response::format_matrix(&matrix, format)
    })
    .await
    .map_err(|e| Error::processing(&e))?
}

pub async fn convert(
    Extension(settings): Extension<Arc<Settings>>,
    headers: HeaderMap,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> std::result::Result<Response, Error> {
    convert_impl(&settings, &headers, multipart).await
}

pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

pub async fn fallback(uri: Uri) -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": format!("No route for {uri}") })))
}
