//! Helpers shared by the single-file and batch front ends.
use crate::constants::{COMPRESSED_SUFFIX, SUPPORTED_IMAGE_EXTENSIONS, SUCCESS_PREFIX, WARNING_PREFIX};
use crate::error::{CompressionError, Result};
use crate::formats::Format;
use std::path::{Path, PathBuf};

/// Check if a file path represents a supported input image
///
/// # Arguments
/// * `path` - The file path to check
///
/// # Returns
/// * `true` if the extension (case-insensitive) is one the decoder accepts
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext_lower = ext.to_lowercase();
            SUPPORTED_IMAGE_EXTENSIONS.contains(&ext_lower.as_str())
        })
        .unwrap_or(false)
}

/// `<stem>_compressed.<ext>` next to `input`, used when no output path is given.
pub fn default_output_path(input: &Path, format: Format) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .ok_or_else(|| CompressionError::config(format!("Invalid input file name: {:?}", input)))?;
    let file_name = format!(
        "{}{}.{}",
        stem.to_string_lossy(),
        COMPRESSED_SUFFIX,
        format.extension()
    );
    Ok(input.with_file_name(file_name))
}

/// Format file size in human-readable format
///
/// # Arguments
/// * `bytes` - Size in bytes
///
/// # Returns
/// * Human-readable size string (e.g., "1.2 MB", "512 B")
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= THRESHOLD && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Size reduction as a percentage; negative when the output grew.
pub fn calculate_compression_ratio(original_size: u64, compressed_size: u64) -> f64 {
    if original_size == 0 {
        return 0.0;
    }
    ((original_size as f64 - compressed_size as f64) / original_size as f64) * 100.0
}

pub fn print_compression_result(original_size: u64, compressed_size: u64) {
    let ratio = calculate_compression_ratio(original_size, compressed_size);

    println!("📈 Original size: {}", format_file_size(original_size));
    println!("📈 Compressed size: {}", format_file_size(compressed_size));
    println!("🎯 Compression ratio: {:.1}%", ratio);

    if ratio > 0.0 {
        println!("{} Successfully reduced file size by {:.1}%", SUCCESS_PREFIX, ratio);
    } else {
        println!("{}  File size increased by {:.1}%", WARNING_PREFIX, ratio.abs());
    }
}
