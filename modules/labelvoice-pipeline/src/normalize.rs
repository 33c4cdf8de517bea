//! Upload validation and downsizing.
//!
//! Every image sent for interpretation is RGB, at most [`MAX_DIMENSION`]
//! pixels on its longer side, and JPEG-encoded into a buffer owned by the
//! caller. Nothing is written to disk.

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{ImageFormat, ImageReader, RgbImage};
use labelvoice_common::{PipelineError, UploadedImage, MAX_UPLOAD_BYTES};

pub const MAX_DIMENSION: u32 = 1024;
pub const JPEG_MIME: &str = "image/jpeg";

/// Decoded formats accepted for interpretation.
const ALLOWED_FORMATS: &[ImageFormat] = &[ImageFormat::Jpeg, ImageFormat::Png];

#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pixels: RgbImage,
    jpeg: Vec<u8>,
}

impl NormalizedImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn jpeg(&self) -> &[u8] {
        &self.jpeg
    }
}

/// Validate, decode, downscale and re-encode one upload.
pub fn normalize(upload: &UploadedImage) -> Result<NormalizedImage, PipelineError> {
    if let Some(cause) = &upload.read_error {
        return Err(decode_error(format!("failed to read image: {cause}")));
    }
    let size = upload.size();
    if size > MAX_UPLOAD_BYTES {
        return Err(PipelineError::SizeExceeded {
            size,
            limit: MAX_UPLOAD_BYTES,
        });
    }
    if !upload.has_accepted_type() {
        return Err(PipelineError::UnsupportedType {
            mime_type: upload.mime_type.clone(),
        });
    }

    let reader = ImageReader::new(Cursor::new(upload.bytes.as_slice()))
        .with_guessed_format()
        .map_err(|e| decode_error(format!("failed to read image: {e}")))?;

    match reader.format() {
        Some(format) if ALLOWED_FORMATS.contains(&format) => {}
        Some(format) => {
            return Err(PipelineError::UnsupportedType {
                mime_type: format.to_mime_type().to_string(),
            })
        }
        None => return Err(decode_error("not a recognizable image".to_string())),
    }

    let decoded = reader
        .decode()
        .map_err(|e| decode_error(format!("failed to decode image: {e}")))?;

    let rgb = decoded.to_rgb8();
    let (width, height) = bounded_dimensions(rgb.width(), rgb.height(), MAX_DIMENSION);
    let pixels = if (width, height) == rgb.dimensions() {
        rgb
    } else {
        imageops::resize(&rgb, width, height, FilterType::Triangle)
    };

    let mut buf = Cursor::new(Vec::new());
    pixels
        .write_to(&mut buf, ImageFormat::Jpeg)
        .map_err(|e| decode_error(format!("failed to encode JPEG: {e}")))?;

    Ok(NormalizedImage {
        pixels,
        jpeg: buf.into_inner(),
    })
}

/// Fit `width`×`height` inside `max`×`max`, preserving aspect ratio. Never upscales.
pub fn bounded_dimensions(width: u32, height: u32, max: u32) -> (u32, u32) {
    let longer = width.max(height);
    if longer <= max {
        return (width, height);
    }
    let scale = max as f64 / longer as f64;
    let fit = |side: u32| ((side as f64 * scale).round() as u32).clamp(1, max);
    (fit(width), fit(height))
}

fn decode_error(cause: String) -> PipelineError {
    PipelineError::DecodeError { cause }
}
