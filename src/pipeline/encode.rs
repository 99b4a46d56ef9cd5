//! Image encoding: raster file → PDF image XObject payload.
//!
//! Baseline JPEGs are embedded as-is with `DCTDecode`, so no generation loss
//! is introduced. Every other format is decoded, split into an RGB plane and
//! an alpha plane, and both are zlib-compressed for `FlateDecode`. The alpha
//! plane is only kept when some pixel is not fully opaque; it becomes the
//! image's `SMask`.

use crate::error::RelayError;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::{ColorType, GenericImageView, ImageFormat};
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Pixel payload of one image, ready to become a PDF XObject stream.
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    pub width: u32,
    pub height: u32,
    pub color_space: &'static str,
    pub bits_per_component: u8,
    pub filter: &'static str,
    pub data: Vec<u8>,
    /// Flate-compressed 8-bit soft mask, same size as the image.
    pub alpha: Option<Vec<u8>>,
}

/// Read and encode the image at `path`.
pub fn load_embedded_image(path: &Path) -> Result<EmbeddedImage, RelayError> {
    let bytes = std::fs::read(path).map_err(|e| RelayError::UnreadableImage {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    encode_image_bytes(&bytes).map_err(|detail| RelayError::UnreadableImage {
        path: path.to_path_buf(),
        detail,
    })
}

/// Encode in-memory image bytes. Errors are returned as plain text so the
/// caller can attach the source path.
pub fn encode_image_bytes(data: &[u8]) -> Result<EmbeddedImage, String> {
    let format = image::guess_format(data).ok();
    let decoded = image::load_from_memory(data).map_err(|e| e.to_string())?;
    let (width, height) = decoded.dimensions();
    if width == 0 || height == 0 {
        return Err(format!("image has zero dimension ({width}x{height})"));
    }

    if matches!(format, Some(ImageFormat::Jpeg)) && jpeg_components(data) != Some(4) {
        let color_space = match decoded.color() {
            ColorType::L8 | ColorType::La8 => "DeviceGray",
            _ => "DeviceRGB",
        };
        debug!("JPEG passthrough {}x{} ({})", width, height, color_space);
        return Ok(EmbeddedImage {
            width,
            height,
            color_space,
            bits_per_component: 8,
            filter: "DCTDecode",
            data: data.to_vec(),
            alpha: None,
        });
    }

    let rgba = decoded.to_rgba8();
    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    let mut alpha = Vec::with_capacity(width as usize * height as usize);
    let mut has_alpha = false;
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        if a != 255 {
            has_alpha = true;
        }
        rgb.extend_from_slice(&[r, g, b]);
        alpha.push(a);
    }

    let data = flate_compress(&rgb).map_err(|e| e.to_string())?;
    let alpha = if has_alpha {
        Some(flate_compress(&alpha).map_err(|e| e.to_string())?)
    } else {
        None
    };
    debug!(
        "Flate-encoded {}x{} → {} bytes{}",
        width,
        height,
        data.len(),
        if alpha.is_some() { " + alpha" } else { "" }
    );

    Ok(EmbeddedImage {
        width,
        height,
        color_space: "DeviceRGB",
        bits_per_component: 8,
        filter: "FlateDecode",
        data,
        alpha,
    })
}

fn flate_compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Number of colour components declared by the JPEG's frame header.
///
/// CMYK (4 components) is re-encoded as RGB: Adobe CMYK JPEGs are usually
/// stored inverted and render wrongly as a raw `DeviceCMYK` passthrough.
fn jpeg_components(data: &[u8]) -> Option<u8> {
    let mut i = 2;
    while i + 4 <= data.len() {
        if data[i] != 0xFF {
            return None;
        }
        let marker = data[i + 1];
        if marker == 0xFF {
            i += 1;
            continue;
        }
        let len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        // SOF0..SOF15 except DHT (C4), JPG (C8) and DAC (CC).
        if (0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC) {
            return data.get(i + 9).copied();
        }
        if marker == 0xDA {
            return None;
        }
        i += 2 + len;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::ZlibDecoder;
    use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::{Cursor, Read};

    fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        buf
    }

    fn inflate(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        ZlibDecoder::new(data).read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn jpeg_is_passed_through() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 8, Rgb([200, 10, 10])));
        let bytes = encode(&img, ImageFormat::Jpeg);
        let embedded = encode_image_bytes(&bytes).unwrap();
        assert_eq!(embedded.filter, "DCTDecode");
        assert_eq!(embedded.color_space, "DeviceRGB");
        assert_eq!((embedded.width, embedded.height), (16, 8));
        assert_eq!(embedded.data, bytes);
        assert!(embedded.alpha.is_none());
        assert_eq!(jpeg_components(&bytes), Some(3));
    }

    #[test]
    fn opaque_png_is_flate_without_mask() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 3, Rgb([1, 2, 3])));
        let embedded = encode_image_bytes(&encode(&img, ImageFormat::Png)).unwrap();
        assert_eq!(embedded.filter, "FlateDecode");
        assert!(embedded.alpha.is_none());
        let raw = inflate(&embedded.data);
        assert_eq!(raw.len(), 4 * 3 * 3);
        assert_eq!(&raw[..3], &[1, 2, 3]);
    }

    #[test]
    fn transparent_png_keeps_alpha() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([9, 9, 9, 128])));
        let embedded = encode_image_bytes(&encode(&img, ImageFormat::Png)).unwrap();
        let alpha = inflate(embedded.alpha.as_deref().unwrap());
        assert_eq!(alpha, vec![128; 4]);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(encode_image_bytes(b"not an image at all").is_err());
    }

    #[test]
    fn missing_file_is_unreadable() {
        let err = load_embedded_image(Path::new("/no/such/file.png")).unwrap_err();
        assert!(matches!(err, RelayError::UnreadableImage { .. }));
    }
}
