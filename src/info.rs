//! `--info`: describe an image instead of compressing it.

use crate::error::Result;
use crate::imageio::load_image;
use crate::utils::format_file_size;
use image::{ColorType, GenericImageView, ImageFormat, Rgba};
use std::fs;
use std::path::{Path, PathBuf};

const LARGE_FILE_BYTES: u64 = 5 * 1024 * 1024;
const MEDIUM_FILE_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct ImageInfo {
    pub path: PathBuf,
    pub format: Option<ImageFormat>,
    pub width: u32,
    pub height: u32,
    pub color: ColorType,
    pub file_size: u64,
    /// Pixels at the four corners and the centre, labelled.
    pub samples: Vec<(&'static str, Rgba<u8>)>,
}

impl ImageInfo {
    pub fn read(path: &Path) -> Result<Self> {
        let loaded = load_image(path)?;
        let file_size = fs::metadata(path)?.len();
        let img = &loaded.image;
        let (width, height) = img.dimensions();
        let (right, bottom) = (width.saturating_sub(1), height.saturating_sub(1));

        let samples = [
            ("top left", 0, 0),
            ("top right", right, 0),
            ("bottom left", 0, bottom),
            ("bottom right", right, bottom),
            ("centre", width / 2, height / 2),
        ]
        .into_iter()
        .map(|(label, x, y)| (label, img.get_pixel(x, y)))
        .collect();

        Ok(Self {
            path: path.to_path_buf(),
            format: loaded.source_format,
            width,
            height,
            color: img.color(),
            file_size,
            samples,
        })
    }

    pub fn megapixels(&self) -> f64 {
        (self.width as u64 * self.height as u64) as f64 / 1_000_000.0
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// Rough advice on which `--quality`, size and format to try.
    pub fn suggestions(&self) -> Vec<&'static str> {
        let mut tips = Vec::new();

        tips.push(if self.file_size > LARGE_FILE_BYTES {
            "Large file (>5MB): try quality 60-80"
        } else if self.file_size > MEDIUM_FILE_BYTES {
            "Medium file (1-5MB): try quality 70-85"
        } else {
            "Small file (<1MB): try quality 85-95"
        });

        if self.width > 1920 || self.height > 1080 {
            tips.push("Large dimensions: consider --width 1920 or smaller");
        } else if self.width > 1280 || self.height > 720 {
            tips.push("HD dimensions: consider --width 1280 for web use");
        }

        tips.push(match self.format {
            Some(ImageFormat::Png) if self.color.has_alpha() => {
                "PNG with alpha: optipng keeps transparency, webp is usually smaller"
            }
            Some(ImageFormat::Png) => "PNG without alpha: jpeg or mozjpeg will be much smaller",
            Some(ImageFormat::Jpeg) => "JPEG: mozjpeg usually shaves a few percent more",
            Some(ImageFormat::WebP) => "WebP: already well compressed, adjust quality only",
            _ => "Other format: convert to jpeg or webp for better compression",
        });

        tips
    }
}

pub fn print_image_info(info: &ImageInfo) {
    println!("📊 Analyzing image: {:?}", info.path);
    println!("📋 Basic Information:");
    println!("  📏 Dimensions: {}x{} pixels", info.width, info.height);
    println!(
        "  📦 File size: {} ({} bytes)",
        format_file_size(info.file_size),
        info.file_size
    );
    println!("  🎨 Color type: {:?}", info.color);
    match info.format {
        Some(format) => println!("  🎭 Image format: {:?}", format),
        None => println!("  🎭 Image format: unknown"),
    }
    println!("  🔢 Megapixels: {:.2} MP", info.megapixels());
    println!("  📐 Aspect ratio: {:.2}:1", info.aspect_ratio());

    println!("\n🎨 Color samples (RGBA):");
    for (label, Rgba([r, g, b, a])) in &info.samples {
        println!("  {:<13} {:>3} {:>3} {:>3} {:>3}", label, r, g, b, a);
    }

    println!("\n💡 Compression Suggestions:");
    for tip in info.suggestions() {
        println!("  🎯 {}", tip);
    }
}
