use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, GrayAlphaImage, GrayImage, RgbImage, RgbaImage};
use tracing::debug;

use super::util::{normalize_samples, to_8bit, to_luma};
use crate::error::{Error, Result};

const RESIZE_PREFIX: &str = "resize_";

/// Most samples a single resize may allocate, for its output and for the
/// filter's intermediate buffer alike.
pub const MAX_RESIZE_SAMPLES: u64 = 1 << 26;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreprocessOp {
    Grayscale,
    Resize { width: u32, height: u32 },
    Normalize,
}

impl PreprocessOp {
    /// Parses one pipeline token. Unknown names and malformed resize specs
    /// give `None` and are skipped by [`apply`].
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "grayscale" => Some(PreprocessOp::Grayscale),
            "normalize" => Some(PreprocessOp::Normalize),
            _ if token.starts_with(RESIZE_PREFIX) => parse_resize(token),
            _ => None,
        }
    }

    /// Only a resize past [`MAX_RESIZE_SAMPLES`] fails; it is refused before
    /// anything is allocated.
    pub fn run(&self, image: DynamicImage) -> Result<DynamicImage> {
        match *self {
            PreprocessOp::Grayscale => Ok(DynamicImage::ImageLuma8(to_luma(&image))),
            PreprocessOp::Resize { width, height } => {
                check_resize(&image, width, height)?;
                Ok(image.resize_exact(width, height, FilterType::Lanczos3))
            }
            PreprocessOp::Normalize => Ok(normalize(image)),
        }
    }
}

fn check_resize(image: &DynamicImage, width: u32, height: u32) -> Result<()> {
    let channels = image.color().channel_count() as u64;
    // The filter's vertical pass holds an RGBA buffer of input width by output height.
    let intermediate = (image.width() as u64)
        .checked_mul(height as u64)
        .and_then(|n| n.checked_mul(4));
    let output = (width as u64)
        .checked_mul(height as u64)
        .and_then(|n| n.checked_mul(channels));

    match (intermediate, output) {
        (Some(i), Some(o)) if i <= MAX_RESIZE_SAMPLES && o <= MAX_RESIZE_SAMPLES => Ok(()),
        _ => Err(Error::Processing(format!(
            "resize to {width}x{height} exceeds the limit of {MAX_RESIZE_SAMPLES} samples"
        ))),
    }
}

// `resize_<W>x<H>`: only the segment after the first `_` counts, and only
// its first two `x`-separated pieces.
fn parse_resize(token: &str) -> Option<PreprocessOp> {
    let spec = token.split('_').nth(1)?;
    let mut dims = spec.split('x');
    let width: u32 = dims.next()?.trim().parse().ok()?;
    let height: u32 = dims.next()?.trim().parse().ok()?;
    if width == 0 || height == 0 {
        return None;
    }
    Some(PreprocessOp::Resize { width, height })
}

fn normalize(image: DynamicImage) -> DynamicImage {
    let image = to_8bit(image);
    let (width, height) = image.dimensions();
    let samples = normalize_samples(image.as_bytes());

    // Buffers are rebuilt from same-sized sample vectors, so these never fail.
    let rebuilt = match &image {
        DynamicImage::ImageLuma8(_) => {
            GrayImage::from_raw(width, height, samples).map(DynamicImage::ImageLuma8)
        }
        DynamicImage::ImageLumaA8(_) => {
            GrayAlphaImage::from_raw(width, height, samples).map(DynamicImage::ImageLumaA8)
        }
        DynamicImage::ImageRgb8(_) => {
            RgbImage::from_raw(width, height, samples).map(DynamicImage::ImageRgb8)
        }
        _ => RgbaImage::from_raw(width, height, samples).map(DynamicImage::ImageRgba8),
    };
    rebuilt.unwrap_or(image)
}

/// Runs every recognised token in order. Unknown tokens never fail; only an
/// oversized resize does.
pub fn apply<S: AsRef<str>>(image: DynamicImage, ops: &[S]) -> Result<DynamicImage> {
    ops.iter().try_fold(image, |image, token| {
        let token = token.as_ref();
        match PreprocessOp::parse(token) {
            Some(op) => {
                debug!("applying preprocess step {:?}", op);
                op.run(image)
            }
            None => {
                debug!("skipping unrecognised preprocess step {:?}", token);
                Ok(image)
            }
        }
    })
}
