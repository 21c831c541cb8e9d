//! Decoding and encoding at the file boundary.
//!
//! Nothing here retries; every failure is mapped onto a `CompressionError`
//! and handed back to the calling strategy.

use crate::error::{CompressionError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::pnm::{PnmEncoder, PnmSubtype, SampleEncoding};
use image::{ColorType, DynamicImage, ImageFormat, ImageReader};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// A decoded raster together with the container it was read from.
#[derive(Debug)]
pub struct LoadedImage {
    pub image: DynamicImage,
    pub source_format: Option<ImageFormat>,
}

impl LoadedImage {
    pub fn is_container(&self, format: ImageFormat) -> bool {
        self.source_format == Some(format)
    }

    /// True when the JPEG encoder can take the raster as-is.
    pub fn has_native_jpeg_pixels(&self) -> bool {
        matches!(self.image.color(), ColorType::L8 | ColorType::Rgb8)
    }
}

pub fn validate_file_exists(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(CompressionError::FileNotFound(path.to_path_buf()));
    }
    Ok(())
}

/// Decodes `path`, sniffing the container from content before trusting the
/// extension.
pub fn load_image(path: &Path) -> Result<LoadedImage> {
    validate_file_exists(path)?;

    let reader = ImageReader::open(path)?
        .with_guessed_format()
        .map_err(CompressionError::Io)?;
    let source_format = reader.format();
    let image = reader.decode().map_err(|source| CompressionError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(LoadedImage {
        image,
        source_format,
    })
}

pub fn create_output(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).map_err(|source| CompressionError::OutputCreation {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufWriter::new(file))
}

/// Writes `img` as PNG with the strongest deflate setting and adaptive
/// filtering. The output is deterministic for a given raster.
pub fn encode_png(img: &DynamicImage, writer: &mut BufWriter<File>, path: &Path) -> Result<()> {
    let encodable;
    let img = match img.color() {
        ColorType::Rgb32F | ColorType::Rgba32F => {
            encodable = DynamicImage::ImageRgba8(img.to_rgba8());
            &encodable
        }
        _ => img,
    };

    let encoder =
        PngEncoder::new_with_quality(&mut *writer, CompressionType::Best, FilterType::Adaptive);
    img.write_with_encoder(encoder)
        .map_err(|source| CompressionError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
    writer.flush()?;
    Ok(())
}

/// Writes `img` as baseline JPEG. Quality 0 is clamped to 1.
pub fn encode_jpeg(
    img: &DynamicImage,
    writer: &mut BufWriter<File>,
    path: &Path,
    quality: u8,
) -> Result<()> {
    let encodable;
    let img = match img.color() {
        ColorType::L8 | ColorType::Rgb8 => img,
        _ => {
            encodable = flatten_to_rgb(img);
            &encodable
        }
    };

    let encoder = JpegEncoder::new_with_quality(&mut *writer, quality.clamp(1, 100));
    img.write_with_encoder(encoder)
        .map_err(|source| CompressionError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
    writer.flush()?;
    Ok(())
}

/// Drops alpha and reduces to 8-bit RGB.
pub fn flatten_to_rgb(img: &DynamicImage) -> DynamicImage {
    DynamicImage::ImageRgb8(img.to_rgb8())
}

/// Writes an 8-bit binary PPM, the raw input the JPEG optimizers accept.
pub fn write_raw_ppm(img: &DynamicImage, path: &Path) -> Result<()> {
    let mut writer = create_output(path)?;
    let encoder = PnmEncoder::new(&mut writer)
        .with_subtype(PnmSubtype::Pixmap(SampleEncoding::Binary));
    flatten_to_rgb(img)
        .write_with_encoder(encoder)
        .map_err(|source| CompressionError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
    writer.flush()?;
    Ok(())
}
