//! Turns raw image bytes into displayable references.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;

use crate::error::Result;

/// Output of image processing for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedImage {
    pub primary_image_ref: String,
    pub thumbnail_image_ref: String,
    pub width: u32,
    pub height: u32,
}

/// Decodes an image and produces its display and thumbnail references.
/// Implementations must be safe to call from several threads at once.
pub trait ImageProcessor: Sync {
    fn process(&self, bytes: &[u8], mime_type: &str, compress: bool) -> Result<ProcessedImage>;
}

/// Encodes images as `data:` URIs: a bounded JPEG thumbnail, and either the
/// original bytes or a JPEG re-encode for the primary image.
#[derive(Debug, Clone)]
pub struct DataUriProcessor {
    pub thumbnail_size: u32,
    pub thumbnail_quality: u8,
    pub compress_quality: u8,
}

impl Default for DataUriProcessor {
    fn default() -> Self {
        Self {
            thumbnail_size: 200,
            thumbnail_quality: 70,
            compress_quality: 80,
        }
    }
}

impl ImageProcessor for DataUriProcessor {
    fn process(&self, bytes: &[u8], mime_type: &str, compress: bool) -> Result<ProcessedImage> {
        let img = image::load_from_memory(bytes)?;

        let thumbnail = if img.width() > self.thumbnail_size || img.height() > self.thumbnail_size {
            img.thumbnail(self.thumbnail_size, self.thumbnail_size)
        } else {
            img.clone()
        };
        let thumbnail_image_ref = jpeg_data_uri(&thumbnail, self.thumbnail_quality)?;

        let primary_image_ref = if compress {
            jpeg_data_uri(&img, self.compress_quality)?
        } else {
            data_uri(mime_type, bytes)
        };

        Ok(ProcessedImage {
            primary_image_ref,
            thumbnail_image_ref,
            width: img.width(),
            height: img.height(),
        })
    }
}

fn jpeg_data_uri(img: &DynamicImage, quality: u8) -> Result<String> {
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality).encode_image(&rgb)?;
    Ok(data_uri("image/jpeg", &buf))
}

fn data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 40, 40]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_process_reports_dimensions_and_thumbnail() {
        let processor = DataUriProcessor::default();
        let bytes = png_bytes(640, 320);

        let out = processor.process(&bytes, "image/png", false).unwrap();
        assert_eq!((out.width, out.height), (640, 320));
        assert!(out.primary_image_ref.starts_with("data:image/png;base64,"));
        assert!(out.thumbnail_image_ref.starts_with("data:image/jpeg;base64,"));

        let encoded = out.thumbnail_image_ref.trim_start_matches("data:image/jpeg;base64,");
        let thumb = image::load_from_memory(&STANDARD.decode(encoded).unwrap()).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (200, 100));
    }

    #[test]
    fn test_compress_reencodes_as_jpeg() {
        let processor = DataUriProcessor::default();
        let out = processor.process(&png_bytes(50, 50), "image/png", true).unwrap();
        assert!(out.primary_image_ref.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_undecodable_bytes_fail() {
        let processor = DataUriProcessor::default();
        assert!(processor.process(b"not an image", "image/png", false).is_err());
    }
}
