use image::{DynamicImage, GrayImage, Luma};

/// ITU-R 601-2 luma in 16.16 fixed point.
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16) as u8
}

pub fn to_luma(image: &DynamicImage) -> GrayImage {
    if let DynamicImage::ImageLuma8(gray) = image {
        return gray.clone();
    }
    if let DynamicImage::ImageLumaA8(gray_alpha) = image {
        let (width, height) = gray_alpha.dimensions();
        return GrayImage::from_fn(width, height, |x, y| Luma([gray_alpha.get_pixel(x, y)[0]]));
    }

    let rgb_image = image.to_rgb8();
    let (width, height) = rgb_image.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let pixel = rgb_image.get_pixel(x, y);
        Luma([luma(pixel[0], pixel[1], pixel[2])])
    })
}

/// Scales samples into `[0, 1]` and straight back to 8 bits, truncating.
/// All-zero input skips the division.
pub fn normalize_samples(samples: &[u8]) -> Vec<u8> {
    let max = samples.iter().copied().max().unwrap_or(0);
    samples
        .iter()
        .map(|&s| {
            let mut value = s as f32;
            if max > 0 {
                value /= 255.0;
            }
            (value * 255.0) as u8
        })
        .collect()
}

/// Reduces any image to the 8-bit variant with the same channel layout.
pub fn to_8bit(image: DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageLuma8(_)
        | DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageRgb8(_)
        | DynamicImage::ImageRgba8(_) => image,
        DynamicImage::ImageLuma16(_) => DynamicImage::ImageLuma8(image.to_luma8()),
        DynamicImage::ImageLumaA16(_) => DynamicImage::ImageLumaA8(image.to_luma_alpha8()),
        DynamicImage::ImageRgb16(_) | DynamicImage::ImageRgb32F(_) => {
            DynamicImage::ImageRgb8(image.to_rgb8())
        }
        _ => DynamicImage::ImageRgba8(image.to_rgba8()),
    }
}
