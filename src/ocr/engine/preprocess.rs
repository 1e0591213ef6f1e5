use image::{DynamicImage, GrayImage, Luma};

const MIN_OCR_WIDTH: u32 = 1200;
const MAX_OCR_WIDTH: u32 = 6000;

/// Grayscale over a white background, upscaled when small, contrast stretched.
pub(super) fn prepare_for_ocr(image: DynamicImage) -> DynamicImage {
    let luma = flatten_to_luma(&image);
    let (width, height) = luma.dimensions();
    let scale = ocr_scale(width);
    let resized = if scale > 1 {
        image::imageops::resize(
            &luma,
            width.saturating_mul(scale),
            height.saturating_mul(scale),
            image::imageops::FilterType::Lanczos3,
        )
    } else {
        luma
    };
    DynamicImage::ImageLuma8(contrast_stretch(&resized))
}

fn flatten_to_luma(image: &DynamicImage) -> GrayImage {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut luma = GrayImage::new(width, height);
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as f32 / 255.0;
        let r = r as f32 * alpha + 255.0 * (1.0 - alpha);
        let g = g as f32 * alpha + 255.0 * (1.0 - alpha);
        let b = b as f32 * alpha + 255.0 * (1.0 - alpha);
        let value = (0.299 * r + 0.587 * g + 0.114 * b).round() as u8;
        luma.put_pixel(x, y, Luma([value]));
    }
    luma
}

fn ocr_scale(width: u32) -> u32 {
    if width == 0 || width >= MIN_OCR_WIDTH {
        return 1;
    }
    let mut scale = MIN_OCR_WIDTH.div_ceil(width).min(3);
    while width.saturating_mul(scale) > MAX_OCR_WIDTH && scale > 1 {
        scale -= 1;
    }
    scale.max(1)
}

fn contrast_stretch(image: &GrayImage) -> GrayImage {
    let mut min = 255u8;
    let mut max = 0u8;
    for pixel in image.pixels() {
        min = min.min(pixel[0]);
        max = max.max(pixel[0]);
    }
    if max <= min {
        return image.clone();
    }

    let scale = 255.0 / (max as f32 - min as f32);
    let mut output = image.clone();
    for pixel in output.pixels_mut() {
        pixel[0] = ((pixel[0] - min) as f32 * scale).round() as u8;
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn scale_only_applies_to_small_images() {
        assert_eq!(ocr_scale(0), 1);
        assert_eq!(ocr_scale(2000), 1);
        assert_eq!(ocr_scale(800), 2);
        assert_eq!(ocr_scale(100), 3);
    }

    #[test]
    fn transparent_pixels_become_white() {
        let mut rgba = RgbaImage::new(2, 1);
        rgba.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        rgba.put_pixel(1, 0, Rgba([0, 0, 0, 255]));
        let luma = flatten_to_luma(&DynamicImage::ImageRgba8(rgba));
        assert_eq!(luma.get_pixel(0, 0)[0], 255);
        assert_eq!(luma.get_pixel(1, 0)[0], 0);
    }

    #[test]
    fn contrast_stretch_spans_full_range() {
        let mut gray = GrayImage::new(3, 1);
        gray.put_pixel(0, 0, Luma([100]));
        gray.put_pixel(1, 0, Luma([150]));
        gray.put_pixel(2, 0, Luma([200]));
        let out = contrast_stretch(&gray);
        assert_eq!(out.get_pixel(0, 0)[0], 0);
        assert_eq!(out.get_pixel(1, 0)[0], 128);
        assert_eq!(out.get_pixel(2, 0)[0], 255);
    }

    #[test]
    fn prepared_image_is_grayscale_and_upscaled() {
        let rgba = RgbaImage::from_pixel(400, 20, Rgba([10, 20, 30, 255]));
        let prepared = prepare_for_ocr(DynamicImage::ImageRgba8(rgba));
        assert_eq!(prepared.width(), 1200);
        assert_eq!(prepared.height(), 60);
        assert!(matches!(prepared, DynamicImage::ImageLuma8(_)));
    }
}
