// QR code and logo images embedded in the worksheet header

use std::io::{Cursor, Read};

use ::image::{DynamicImage, ImageFormat, Luma, Rgba, RgbImage};
use qrcode::QrCode;

use crate::error::AppError;

// ============================================================================
// Logo Loading
// ============================================================================

/// Loads a logo from a file path or an http(s) URL.
pub fn load_logo(path: &Option<String>) -> Result<Option<DynamicImage>, AppError> {
    match path {
        Some(p) => {
            let image_bytes = if p.starts_with("http://") || p.starts_with("https://") {
                let response = ureq::get(p)
                    .call()
                    .map_err(|e| AppError::LogoError(format!("Failed to fetch URL: {}", e)))?;

                let mut bytes = Vec::new();
                response
                    .into_reader()
                    .read_to_end(&mut bytes)
                    .map_err(|e| AppError::LogoError(format!("Failed to read response: {}", e)))?;
                bytes
            } else {
                std::fs::read(p).map_err(|e| AppError::LogoError(format!("{}: {}", p, e)))?
            };

            let img = ::image::load_from_memory(&image_bytes)
                .map_err(|e| AppError::LogoError(format!("Failed to decode image: {}", e)))?;

            Ok(Some(img))
        }
        None => Ok(None),
    }
}

// ============================================================================
// QR Code Generation
// ============================================================================

/// QR bitmap encoding the answer-key link.
pub fn qr_image(url: &str) -> Result<DynamicImage, AppError> {
    let code = QrCode::new(url.as_bytes()).map_err(|e| AppError::QrError(e.to_string()))?;
    let image = code.render::<Luma<u8>>().quiet_zone(true).build();
    Ok(DynamicImage::ImageLuma8(image))
}

// ============================================================================
// Image Conversion
// ============================================================================

/// Flattens transparency onto a white background.
pub fn flatten_to_rgb(image: &DynamicImage) -> RgbImage {
    let rgba_image = image.to_rgba8();
    let (width_px, height_px) = rgba_image.dimensions();

    let mut rgb_image = RgbImage::new(width_px, height_px);
    for (x, y, pixel) in rgba_image.enumerate_pixels() {
        let Rgba([r, g, b, a]) = *pixel;
        let alpha = a as f32 / 255.0;
        let bg = 255.0;
        let out_r = (r as f32 * alpha + bg * (1.0 - alpha)) as u8;
        let out_g = (g as f32 * alpha + bg * (1.0 - alpha)) as u8;
        let out_b = (b as f32 * alpha + bg * (1.0 - alpha)) as u8;
        rgb_image.put_pixel(x, y, ::image::Rgb([out_r, out_g, out_b]));
    }
    rgb_image
}

/// PNG bytes for backends that embed encoded images (the Word writer).
pub fn png_bytes(image: &DynamicImage) -> Result<Vec<u8>, AppError> {
    let rgb = DynamicImage::ImageRgb8(flatten_to_rgb(image));
    let mut buf = Cursor::new(Vec::new());
    rgb.write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| AppError::LogoError(format!("Failed to encode image: {}", e)))?;
    Ok(buf.into_inner())
}

/// Largest (width, height) in mm that fits the box and keeps the aspect ratio.
pub fn fit_within(width_px: u32, height_px: u32, max_width_mm: f32, max_height_mm: f32) -> (f32, f32) {
    if width_px == 0 || height_px == 0 {
        return (0.0, 0.0);
    }
    let aspect_ratio = width_px as f32 / height_px as f32;
    if max_width_mm / max_height_mm > aspect_ratio {
        // Height-constrained
        (max_height_mm * aspect_ratio, max_height_mm)
    } else {
        // Width-constrained
        (max_width_mm, max_width_mm / aspect_ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qr_is_square() {
        let img = qr_image("https://example.com/answers").unwrap();
        assert_eq!(img.width(), img.height());
        assert!(img.width() > 20);
    }

    #[test]
    fn transparent_pixels_become_white() {
        let mut rgba = ::image::RgbaImage::new(2, 1);
        rgba.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        rgba.put_pixel(1, 0, Rgba([10, 20, 30, 255]));
        let rgb = flatten_to_rgb(&DynamicImage::ImageRgba8(rgba));
        assert_eq!(rgb.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(rgb.get_pixel(1, 0).0, [10, 20, 30]);
    }

    #[test]
    fn fit_keeps_aspect_ratio() {
        let (w, h) = fit_within(200, 100, 30.0, 25.0);
        assert!((w - 30.0).abs() < 1e-4 && (h - 15.0).abs() < 1e-4);
        let (w, h) = fit_within(100, 200, 30.0, 25.0);
        assert!((w - 12.5).abs() < 1e-4 && (h - 25.0).abs() < 1e-4);
    }

    #[test]
    fn png_encoding_produces_png_signature() {
        let bytes = png_bytes(&qr_image("x").unwrap()).unwrap();
        assert_eq!(&bytes[..4], b"\x89PNG");
    }

    #[test]
    fn missing_logo_file_is_an_error() {
        assert!(load_logo(&Some("no/such/logo.png".to_string())).is_err());
        assert!(load_logo(&None).unwrap().is_none());
    }
}
