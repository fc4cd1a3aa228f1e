use std::str::FromStr;

use ndarray::ArrayD;

use crate::error::Error;

/// An upload as received from the client, before any validation.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub bytes: Vec<u8>,
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

impl UploadedImage {
    pub fn new(bytes: Vec<u8>, filename: Option<String>, content_type: Option<String>) -> Self {
        Self { bytes, filename, content_type }
    }

    /// Text after the last `.` of the filename, lowercased. A filename
    /// without a dot yields the whole name; no filename yields "".
    pub fn extension(&self) -> String {
        self.filename
            .as_deref()
            .and_then(|name| name.rsplit('.').next())
            .unwrap_or_default()
            .to_lowercase()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    U8,
    U16,
    F32,
}

impl ElementType {
    /// NumPy dtype name.
    pub fn name(&self) -> &'static str {
        match self {
            ElementType::U8 => "uint8",
            ElementType::U16 => "uint16",
            ElementType::F32 => "float32",
        }
    }

    /// Type descriptor as written in an `.npy` header.
    pub fn descr(&self) -> &'static str {
        match self {
            ElementType::U8 => "|u1",
            ElementType::U16 => "<u2",
            ElementType::F32 => "<f4",
        }
    }
}

/// Image samples laid out as `(height, width)` or `(height, width, channels)`.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultMatrix {
    U8(ArrayD<u8>),
    U16(ArrayD<u16>),
    F32(ArrayD<f32>),
}

impl ResultMatrix {
    pub fn shape(&self) -> &[usize] {
        match self {
            ResultMatrix::U8(arr) => arr.shape(),
            ResultMatrix::U16(arr) => arr.shape(),
            ResultMatrix::F32(arr) => arr.shape(),
        }
    }

    pub fn dtype(&self) -> ElementType {
        match self {
            ResultMatrix::U8(_) => ElementType::U8,
            ResultMatrix::U16(_) => ElementType::U16,
            ResultMatrix::F32(_) => ElementType::F32,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Json,
    Numpy,
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "numpy" => Ok(OutputFormat::Numpy),
            _ => Err(Error::UnsupportedFormat(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: Option<&str>) -> UploadedImage {
        UploadedImage::new(vec![], name.map(String::from), None)
    }

    #[test]
    fn extension_is_last_segment_lowercased() {
        assert_eq!(upload(Some("photo.final.PNG")).extension(), "png");
        assert_eq!(upload(Some("png")).extension(), "png");
        assert_eq!(upload(None).extension(), "");
    }

    #[test]
    fn format_parsing_ignores_case() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("numpy".parse::<OutputFormat>().unwrap(), OutputFormat::Numpy);
        assert_eq!(OutputFormat::default(), OutputFormat::Json);
        let err = "bogus".parse::<OutputFormat>().unwrap_err();
        assert!(err.to_string().contains("bogus"));
    }
}
