use std::time::Duration;

pub const DEFAULT_QUALITY: u8 = 80;
pub const MIN_QUALITY: u8 = 0;
pub const MAX_QUALITY: u8 = 100;

// Worker pool bounds used when no explicit worker count is given
pub const MIN_AUTO_WORKERS: usize = 4;
pub const MAX_AUTO_WORKERS: usize = 8;

// optipng -o levels selected from quality
pub const OPTIPNG_MAX_LEVEL: u8 = 7;
pub const OPTIPNG_HIGH_LEVEL: u8 = 5;
pub const OPTIPNG_MEDIUM_LEVEL: u8 = 3;
pub const OPTIPNG_DEFAULT_LEVEL: u8 = 2;

pub const OPTIPNG_TOOL: &str = "optipng";
pub const MOZJPEG_TOOLS: &[&str] = &["mozjpeg", "cjpeg"];
pub const CWEBP_TOOL: &str = "cwebp";

// Progress units reported by the strategies
pub const LOAD_UNITS: u64 = 50;
pub const PREPARE_UNITS: u64 = 10;
pub const ENCODE_UNITS: u64 = 40;
pub const VALIDATE_UNITS: u64 = 20;
pub const CONVERT_UNITS: u64 = LOAD_UNITS + PREPARE_UNITS + ENCODE_UNITS;
pub const OPTIMIZE_UNITS: u64 = 80;

pub const SUPPORTED_IMAGE_EXTENSIONS: &[&str] =
    &["png", "jpg", "jpeg", "gif", "bmp", "tif", "tiff", "webp"];

pub const COMPRESSED_SUFFIX: &str = "_compressed";
pub const DEFAULT_BATCH_OUTPUT_DIR: &str = "compressed";
pub const TEMP_FILE_PREFIX: &str = ".img-press-";

pub const PROGRESS_BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";
pub const PROGRESS_TICK: Duration = Duration::from_millis(120);

// Common output message prefixes
pub const SIZE_PREFIX: &str = "📊";
pub const SUCCESS_PREFIX: &str = "✅";
pub const WARNING_PREFIX: &str = "⚠️";
pub const ERROR_PREFIX: &str = "❌";
pub const INFO_PREFIX: &str = "📋";
