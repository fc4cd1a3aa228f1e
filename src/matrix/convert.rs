use std::io::Cursor;

use image::{DynamicImage, ImageReader};
use ndarray::{ArrayD, IxDyn};
use tracing::debug;

use super::preprocess;
use super::types::ResultMatrix;
use super::util::to_8bit;
use crate::error::Result;

/// Decodes an upload, picking the codec from its content.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    let image = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode()?;
    debug!(
        "decoded {}x{} image ({:?})",
        image.width(),
        image.height(),
        image.color()
    );
    Ok(image)
}

fn matrix_shape(width: u32, height: u32, channels: u8) -> Vec<usize> {
    if channels == 1 {
        vec![height as usize, width as usize]
    } else {
        vec![height as usize, width as usize, channels as usize]
    }
}

/// Lays the image samples out as `(height, width)` or
/// `(height, width, channels)`, row-major with interleaved channels.
/// Only single-channel 16-bit images keep their depth; 16-bit images with
/// colour or alpha come out as 8-bit.
pub fn to_matrix(image: DynamicImage) -> Result<ResultMatrix> {
    let image = match image {
        DynamicImage::ImageLumaA16(_) | DynamicImage::ImageRgb16(_) | DynamicImage::ImageRgba16(_) => {
            to_8bit(image)
        }
        other => other,
    };
    let shape = matrix_shape(image.width(), image.height(), image.color().channel_count());

    let matrix = match image {
        DynamicImage::ImageLuma8(buf) => ResultMatrix::U8(ArrayD::from_shape_vec(IxDyn(&shape), buf.into_raw())?),
        DynamicImage::ImageLumaA8(buf) => ResultMatrix::U8(ArrayD::from_shape_vec(IxDyn(&shape), buf.into_raw())?),
        DynamicImage::ImageRgb8(buf) => ResultMatrix::U8(ArrayD::from_shape_vec(IxDyn(&shape), buf.into_raw())?),
        DynamicImage::ImageRgba8(buf) => ResultMatrix::U8(ArrayD::from_shape_vec(IxDyn(&shape), buf.into_raw())?),
        DynamicImage::ImageLuma16(buf) => ResultMatrix::U16(ArrayD::from_shape_vec(IxDyn(&shape), buf.into_raw())?),
        DynamicImage::ImageRgb32F(buf) => ResultMatrix::F32(ArrayD::from_shape_vec(IxDyn(&shape), buf.into_raw())?),
        DynamicImage::ImageRgba32F(buf) => ResultMatrix::F32(ArrayD::from_shape_vec(IxDyn(&shape), buf.into_raw())?),
        other => {
            let shape = matrix_shape(other.width(), other.height(), 4);
            ResultMatrix::U8(ArrayD::from_shape_vec(IxDyn(&shape), other.to_rgba8().into_raw())?)
        }
    };

    Ok(matrix)
}

/// Decode, preprocess and convert in one go.
pub fn image_to_matrix<S: AsRef<str>>(bytes: &[u8], ops: &[S]) -> Result<ResultMatrix> {
    let image = decode(bytes)?;
    let image = preprocess::apply(image, ops)?;
    to_matrix(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::types::ElementType;
    use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

    fn png_bytes(image: &DynamicImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn solid_png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        png_bytes(&DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color))))
    }

    #[test]
    fn solid_color_round_trips() {
        let matrix = image_to_matrix::<&str>(&solid_png(10, 10, [255, 0, 0]), &[]).unwrap();
        assert_eq!(matrix.shape(), &[10, 10, 3]);
        assert_eq!(matrix.dtype(), ElementType::U8);
        let ResultMatrix::U8(arr) = matrix else { panic!("expected u8 matrix") };
        for pixel in arr.as_slice().unwrap().chunks(3) {
            assert_eq!(pixel, &[255, 0, 0]);
        }
    }

    #[test]
    fn shape_is_height_first() {
        let matrix = image_to_matrix::<&str>(&solid_png(7, 3, [1, 2, 3]), &[]).unwrap();
        assert_eq!(matrix.shape(), &[3, 7, 3]);
    }

    #[test]
    fn grayscale_is_two_dimensional() {
        let matrix = image_to_matrix(&solid_png(10, 10, [255, 0, 0]), &["grayscale"]).unwrap();
        assert_eq!(matrix.shape(), &[10, 10]);
        let ResultMatrix::U8(arr) = matrix else { panic!("expected u8 matrix") };
        assert!(arr.iter().all(|&v| v == 76));
    }

    #[test]
    fn resize_reaches_target_shape() {
        let matrix = image_to_matrix(&solid_png(100, 50, [9, 9, 9]), &["resize_64x64"]).unwrap();
        assert_eq!(matrix.shape(), &[64, 64, 3]);
    }

    #[test]
    fn alpha_channel_is_kept() {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 2, Rgba([1, 2, 3, 4])));
        let matrix = image_to_matrix::<&str>(&png_bytes(&rgba), &[]).unwrap();
        assert_eq!(matrix.shape(), &[2, 4, 4]);
    }

    #[test]
    fn sixteen_bit_images_keep_depth() {
        let gray = DynamicImage::ImageLuma16(image::ImageBuffer::from_pixel(3, 3, image::Luma([1000u16])));
        let matrix = image_to_matrix::<&str>(&png_bytes(&gray), &[]).unwrap();
        assert_eq!(matrix.shape(), &[3, 3]);
        assert_eq!(matrix.dtype(), ElementType::U16);
    }

    #[test]
    fn sixteen_bit_colour_is_reduced_to_eight() {
        let rgb = DynamicImage::ImageRgb16(image::ImageBuffer::from_pixel(2, 3, Rgb([65535u16, 0, 32896])));
        let matrix = image_to_matrix::<&str>(&png_bytes(&rgb), &[]).unwrap();
        assert_eq!(matrix.shape(), &[3, 2, 3]);
        assert_eq!(matrix.dtype(), ElementType::U8);
        let ResultMatrix::U8(arr) = matrix else { panic!("expected u8 matrix") };
        assert_eq!(&arr.as_slice().unwrap()[..3], &[255, 0, 128]);
    }

    #[test]
    fn oversized_resize_is_a_processing_error() {
        let err = image_to_matrix(&solid_png(1, 1, [0, 0, 0]), &["resize_4294967295x4294967295"]).unwrap_err();
        assert!(err.detail().contains("exceeds the limit"));
    }

    #[test]
    fn corrupt_bytes_fail_to_decode() {
        let err = image_to_matrix::<&str>(b"definitely not an image", &[]).unwrap_err();
        assert!(err.detail().starts_with("error processing image:"));
    }
}
