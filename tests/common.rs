#![allow(dead_code)]

use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub fn create_temp_directory() -> TempDir {
    TempDir::new().unwrap()
}

/// Writes a small gradient image; the container follows the extension.
pub fn create_test_image(path: &Path, width: u32, height: u32) -> PathBuf {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 7 % 256) as u8, (y * 5 % 256) as u8, ((x + y) % 256) as u8])
    })
    .save(path)
    .unwrap();
    path.to_path_buf()
}

pub fn create_rgba_png(path: &Path) -> PathBuf {
    RgbaImage::from_fn(16, 16, |x, y| Rgba([x as u8 * 16, y as u8 * 16, 90, 128]))
        .save_with_format(path, ImageFormat::Png)
        .unwrap();
    path.to_path_buf()
}

pub fn create_corrupt_file(path: &Path) -> PathBuf {
    File::create(path)
        .unwrap()
        .write_all(b"fake image data")
        .unwrap();
    path.to_path_buf()
}

/// Five decodable inputs in mixed containers plus one that only looks like a JPEG.
pub fn create_mixed_batch(dir: &Path) -> (Vec<PathBuf>, PathBuf) {
    let valid = vec![
        create_test_image(&dir.join("one.png"), 40, 30),
        create_test_image(&dir.join("two.jpg"), 32, 32),
        create_test_image(&dir.join("three.bmp"), 20, 48),
        create_test_image(&dir.join("four.gif"), 24, 24),
        create_rgba_png(&dir.join("five.png")),
    ];
    let corrupt = create_corrupt_file(&dir.join("six.jpg"));
    (valid, corrupt)
}

pub fn detected_format(path: &Path) -> Option<ImageFormat> {
    image::ImageReader::open(path)
        .ok()?
        .with_guessed_format()
        .ok()?
        .format()
}

pub fn leftover_temp_files(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy().starts_with(".img-press-"))
                .unwrap_or(false)
        })
        .collect()
}
