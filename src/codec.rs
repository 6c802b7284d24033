//! Image decode and re-encode.
//!
//! The engine always performs a full decode plus re-encode round trip,
//! even when source and target format match. Every output therefore
//! comes from the same pixel path regardless of how the input was
//! produced, and a same-format pass doubles as validation of the input.

use std::io::Cursor;

use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat};

use crate::classify::Format;

/// Lossy quality for WebP output. There is no user-facing quality knob;
/// every format encodes at its default.
const WEBP_QUALITY: f32 = 80.0;

/// Decode image bytes and re-encode them in the target format.
///
/// Decoding sniffs the actual byte content; the classified source tag is
/// never passed as a hint, so a mislabeled file still decodes as what it
/// really is. Pixel dimensions are preserved exactly.
///
/// # Errors
///
/// Fails when the bytes do not decode as an image or the target encode
/// fails. Callers treat either case as a per-item conversion failure.
pub fn convert(bytes: &[u8], target: Format) -> Result<Vec<u8>> {
    let img = image::load_from_memory(bytes).context("image decode failed")?;
    encode(&img, target)
}

fn encode(img: &DynamicImage, target: Format) -> Result<Vec<u8>> {
    match target {
        Format::Png => {
            let mut out = Cursor::new(Vec::new());
            img.write_to(&mut out, ImageFormat::Png)
                .context("PNG encode failed")?;
            Ok(out.into_inner())
        }
        Format::Jpeg => {
            // JPEG carries no alpha channel; flatten to RGB first
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let mut out = Cursor::new(Vec::new());
            rgb.write_to(&mut out, ImageFormat::Jpeg)
                .context("JPEG encode failed")?;
            Ok(out.into_inner())
        }
        Format::Webp => {
            let rgba = img.to_rgba8();
            let encoder = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height());
            Ok(encoder.encode(WEBP_QUALITY).to_vec())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_png(width: u32, height: u32) -> Vec<u8> {
        let img = image::ImageBuffer::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut bytes, ImageFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    fn sample_rgba_png(width: u32, height: u32) -> Vec<u8> {
        let img = image::ImageBuffer::from_fn(width, height, |x, _| {
            image::Rgba([255, 0, 0, (x % 256) as u8])
        });
        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut bytes, ImageFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    fn dimensions_of(bytes: &[u8]) -> (u32, u32) {
        let img = image::load_from_memory(bytes).unwrap();
        (img.width(), img.height())
    }

    #[test]
    fn same_format_round_trip_preserves_dimensions() {
        let png = sample_png(31, 17);
        let out = convert(&png, Format::Png).unwrap();
        assert_eq!(dimensions_of(&out), (31, 17));
    }

    #[test]
    fn png_to_jpeg_flattens_alpha() {
        let png = sample_rgba_png(20, 10);
        let out = convert(&png, Format::Jpeg).unwrap();
        let img = image::load_from_memory(&out).unwrap();
        assert_eq!((img.width(), img.height()), (20, 10));
    }

    #[test]
    fn png_to_webp_and_back() {
        let png = sample_png(24, 24);
        let webp_bytes = convert(&png, Format::Webp).unwrap();
        assert_eq!(dimensions_of(&webp_bytes), (24, 24));

        // The produced WebP must itself be decodable input
        let round = convert(&webp_bytes, Format::Png).unwrap();
        assert_eq!(dimensions_of(&round), (24, 24));
    }

    #[test]
    fn decode_ignores_the_claimed_format() {
        // JPEG bytes are still JPEG no matter what a filename claims;
        // conversion works because the decoder sniffs content
        let png = sample_png(8, 8);
        let jpeg_bytes = convert(&png, Format::Jpeg).unwrap();
        let out = convert(&jpeg_bytes, Format::Webp).unwrap();
        assert_eq!(dimensions_of(&out), (8, 8));
    }

    #[test]
    fn garbage_bytes_fail_to_convert() {
        assert!(convert(b"definitely not an image", Format::Png).is_err());
        assert!(convert(&[], Format::Png).is_err());
    }
}
