use crate::config::Settings;
use crate::error::{Error, Result};
use crate::matrix::types::UploadedImage;

/// Rejection used for uploads over `max_image_size`, whether the validator or
/// the body limit catches them.
pub fn oversized(settings: &Settings) -> Error {
    Error::InvalidImage(format!(
        "image size exceeds the limit of {} MB",
        settings.max_image_size as f64 / 1024.0 / 1024.0
    ))
}

/// Checks presence, size, extension and declared MIME type, in that order.
pub fn validate_image(image: Option<&UploadedImage>, settings: &Settings) -> Result<()> {
    let image = image.ok_or_else(|| Error::invalid_image("no image provided"))?;

    if image.bytes.len() > settings.max_image_size {
        return Err(oversized(settings));
    }

    let extension = image.extension();
    if !settings.allowed_extensions.iter().any(|allowed| *allowed == extension) {
        return Err(Error::InvalidImage(format!(
            "unsupported image format. Allowed formats: {}",
            settings.allowed_extensions.join(", ")
        )));
    }

    match image.content_type.as_deref() {
        Some(content_type) if content_type.starts_with("image/") => Ok(()),
        _ => Err(Error::invalid_image("the uploaded file is not a valid image")),
    }
}
