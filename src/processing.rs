use crate::constants::{
    DEFAULT_QUALITY, ENCODE_UNITS, LOAD_UNITS, MAX_QUALITY, MIN_QUALITY, PREPARE_UNITS,
};
use crate::error::{CompressionError, Result};
use crate::formats::Format;
use crate::imageio::{create_output, encode_jpeg, encode_png, load_image};
use crate::optimized::{MozJpegProcessor, OptiPngProcessor, WebPProcessor};
use crate::progress::ProgressTracker;
use crate::tools::Toolbox;
use image::imageops::FilterType as ResizeFilter;
use image::DynamicImage;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Target dimensions applied to the decoded raster before encoding.
///
/// With only one side given the other follows the source aspect ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Resize {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl Resize {
    pub fn new(width: Option<u32>, height: Option<u32>) -> Result<Self> {
        if width == Some(0) || height == Some(0) {
            return Err(CompressionError::config("Resize dimensions must be greater than 0"));
        }
        Ok(Self { width, height })
    }

    pub fn is_noop(&self) -> bool {
        self.width.is_none() && self.height.is_none()
    }

    /// Output dimensions for a `width` x `height` source, `None` when
    /// nothing changes.
    pub fn target(&self, width: u32, height: u32) -> Option<(u32, u32)> {
        let scale = |side: u32, new: u32, old: u32| -> u32 {
            (u64::from(side) * u64::from(new) / u64::from(old.max(1))).max(1) as u32
        };
        let target = match (self.width, self.height) {
            (None, None) => return None,
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) => (w, scale(height, w, width)),
            (None, Some(h)) => (scale(width, h, height), h),
        };
        (target != (width, height)).then_some(target)
    }

    pub fn apply(&self, img: DynamicImage) -> DynamicImage {
        match self.target(img.width(), img.height()) {
            Some((w, h)) => {
                debug!("Resizing {}x{} to {}x{}", img.width(), img.height(), w, h);
                img.resize_exact(w, h, ResizeFilter::Lanczos3)
            }
            None => img,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionOptions {
    pub format: Format,
    pub quality: u8,
    pub resize: Resize,
}

impl CompressionOptions {
    pub fn new(format: Format, quality: Option<u8>) -> Result<Self> {
        let quality = quality.unwrap_or(DEFAULT_QUALITY);
        if !(MIN_QUALITY..=MAX_QUALITY).contains(&quality) {
            return Err(CompressionError::InvalidQuality(quality));
        }

        Ok(Self {
            format,
            quality,
            resize: Resize::default(),
        })
    }

    pub fn with_resize(mut self, resize: Resize) -> Self {
        self.resize = resize;
        self
    }
}

/// One encoding strategy per output format.
///
/// Implementations hold no per-call state, so a single instance is shared
/// by every worker in a batch.
pub trait Processor: Send + Sync {
    fn format(&self) -> Format;

    /// Writes `output_path` from `input_path` or reports why it could not.
    ///
    /// The parent directory of `output_path` must already exist. Any
    /// intermediate file created along the way is gone when this returns.
    fn process(
        &self,
        input_path: &Path,
        output_path: &Path,
        quality: u8,
        tracker: &mut dyn ProgressTracker,
    ) -> Result<()>;
}

/// Shared load, create, encode pipeline of the two pure strategies.
fn load_and_encode<F>(
    input_path: &Path,
    output_path: &Path,
    tracker: &mut dyn ProgressTracker,
    resize: Resize,
    label: &str,
    encode: F,
) -> Result<()>
where
    F: FnOnce(&DynamicImage, &mut std::io::BufWriter<std::fs::File>) -> Result<()>,
{
    tracker.describe("Loading image...");
    let image = resize.apply(load_image(input_path)?.image);
    tracker.add(LOAD_UNITS);

    tracker.describe("Creating output file...");
    let mut writer = create_output(output_path)?;
    tracker.add(PREPARE_UNITS);

    tracker.describe(&format!("Encoding as {}...", label));
    encode(&image, &mut writer)?;
    tracker.add(ENCODE_UNITS);
    Ok(())
}

/// Plain PNG at maximum compression.
#[derive(Debug, Default, Clone, Copy)]
pub struct PngProcessor {
    resize: Resize,
}

impl PngProcessor {
    pub fn new(resize: Resize) -> Self {
        Self { resize }
    }
}

impl Processor for PngProcessor {
    fn format(&self) -> Format {
        Format::Lossless
    }

    fn process(
        &self,
        input_path: &Path,
        output_path: &Path,
        _quality: u8,
        tracker: &mut dyn ProgressTracker,
    ) -> Result<()> {
        load_and_encode(input_path, output_path, tracker, self.resize, "PNG", |img, writer| {
            encode_png(img, writer, output_path)
        })
    }
}

/// Plain JPEG at the requested quality.
#[derive(Debug, Default, Clone, Copy)]
pub struct JpegProcessor {
    resize: Resize,
}

impl JpegProcessor {
    pub fn new(resize: Resize) -> Self {
        Self { resize }
    }
}

impl Processor for JpegProcessor {
    fn format(&self) -> Format {
        Format::Lossy
    }

    fn process(
        &self,
        input_path: &Path,
        output_path: &Path,
        quality: u8,
        tracker: &mut dyn ProgressTracker,
    ) -> Result<()> {
        load_and_encode(input_path, output_path, tracker, self.resize, "JPEG", |img, writer| {
            encode_jpeg(img, writer, output_path, quality)
        })
    }
}

/// Fixed table from `Format` to its strategy, built once at startup.
pub struct ProcessorRegistry {
    lossless: PngProcessor,
    lossless_optimized: OptiPngProcessor,
    lossy: JpegProcessor,
    lossy_optimized: MozJpegProcessor,
    next_gen: WebPProcessor,
}

impl ProcessorRegistry {
    pub fn new(toolbox: Toolbox) -> Self {
        Self::with_resize(toolbox, Resize::default())
    }

    /// Registry whose every strategy resizes before encoding.
    pub fn with_resize(toolbox: Toolbox, resize: Resize) -> Self {
        Self {
            lossless: PngProcessor::new(resize),
            lossless_optimized: OptiPngProcessor::new(toolbox.clone()).resized(resize),
            lossy: JpegProcessor::new(resize),
            lossy_optimized: MozJpegProcessor::new(toolbox.clone()).resized(resize),
            next_gen: WebPProcessor::new(toolbox).resized(resize),
        }
    }

    /// Registry resolving external tools on the process `PATH`.
    pub fn from_env() -> Self {
        Self::new(Toolbox::from_env())
    }

    pub fn get(&self, format: Format) -> &dyn Processor {
        match format {
            Format::Lossless => &self.lossless,
            Format::LosslessOptimized => &self.lossless_optimized,
            Format::Lossy => &self.lossy,
            Format::LossyOptimized => &self.lossy_optimized,
            Format::NextGen => &self.next_gen,
        }
    }

    /// Case-insensitive lookup by format name.
    pub fn get_processor(&self, name: &str) -> Result<&dyn Processor> {
        Format::from_str(name).map(|format| self.get(format))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::JobProgress;
    use image::{ImageFormat, Rgb, RgbImage};
    use tempfile::TempDir;

    fn write_sample(dir: &Path, name: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        RgbImage::from_fn(24, 18, |x, y| Rgb([(x * 10) as u8, (y * 12) as u8, 77]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_compression_options_default_quality() {
        let options = CompressionOptions::new(Format::Lossy, None).unwrap();
        assert_eq!(options.quality, 80);
        assert_eq!(options.format, Format::Lossy);
    }

    #[test]
    fn test_compression_options_bounds() {
        assert!(CompressionOptions::new(Format::Lossy, Some(0)).is_ok());
        assert!(CompressionOptions::new(Format::Lossy, Some(100)).is_ok());
        assert!(matches!(
            CompressionOptions::new(Format::Lossy, Some(101)),
            Err(CompressionError::InvalidQuality(101))
        ));
    }

    #[test]
    fn test_registry_covers_every_format() {
        let registry = ProcessorRegistry::from_env();
        for format in Format::ALL {
            assert_eq!(registry.get(format).format(), format);
        }
    }

    #[test]
    fn test_get_processor_case_insensitive() {
        let registry = ProcessorRegistry::from_env();
        assert_eq!(registry.get_processor("PNG").unwrap().format(), Format::Lossless);
        assert_eq!(
            registry.get_processor("MozJpeg").unwrap().format(),
            Format::LossyOptimized
        );
        assert!(matches!(
            registry.get_processor("heic"),
            Err(CompressionError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_png_processor_progress_split() {
        let temp_dir = TempDir::new().unwrap();
        let input = write_sample(temp_dir.path(), "in.jpg");
        let output = temp_dir.path().join("out.png");

        let mut progress = JobProgress::default();
        PngProcessor::default().process(&input, &output, 80, &mut progress).unwrap();

        assert_eq!(progress.units_completed, 100);
        assert_eq!(image::ImageFormat::from_path(&output).unwrap(), ImageFormat::Png);
        assert!(image::open(&output).is_ok());
    }

    #[test]
    fn test_png_processor_is_deterministic() {
        let temp_dir = TempDir::new().unwrap();
        let input = write_sample(temp_dir.path(), "in.bmp");
        let first = temp_dir.path().join("first.png");
        let second = temp_dir.path().join("second.png");

        PngProcessor::default()
            .process(&input, &first, 50, &mut JobProgress::default())
            .unwrap();
        PngProcessor::default()
            .process(&input, &second, 50, &mut JobProgress::default())
            .unwrap();

        assert_eq!(std::fs::read(first).unwrap(), std::fs::read(second).unwrap());
    }

    #[test]
    fn test_jpeg_processor_every_quality_bucket() {
        let temp_dir = TempDir::new().unwrap();
        let input = write_sample(temp_dir.path(), "in.png");

        for quality in [0u8, 1, 50, 80, 100] {
            let output = temp_dir.path().join(format!("out_{}.jpg", quality));
            JpegProcessor::default()
                .process(&input, &output, quality, &mut JobProgress::default())
                .unwrap();

            let reader = image::ImageReader::open(&output)
                .unwrap()
                .with_guessed_format()
                .unwrap();
            assert_eq!(reader.format(), Some(ImageFormat::Jpeg));
            assert!(reader.decode().is_ok());
        }
    }

    #[test]
    fn test_decode_error_stops_before_output() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("corrupt.png");
        std::fs::write(&input, b"\x89PNG garbage").unwrap();
        let output = temp_dir.path().join("out.jpg");

        let mut progress = JobProgress::default();
        let err = JpegProcessor::default()
            .process(&input, &output, 80, &mut progress)
            .unwrap_err();

        assert_eq!(err.kind(), crate::error::ErrorKind::Decode);
        assert_eq!(progress.units_completed, 0);
        assert!(!output.exists());
    }

    #[test]
    fn test_missing_output_dir_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let input = write_sample(temp_dir.path(), "in.png");
        let output = temp_dir.path().join("nope").join("out.png");

        let err = PngProcessor::default()
            .process(&input, &output, 80, &mut JobProgress::default())
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Io);
    }

    #[test]
    fn test_resize_target_keeps_aspect_ratio() {
        let width_only = Resize::new(Some(100), None).unwrap();
        assert_eq!(width_only.target(400, 300), Some((100, 75)));

        let height_only = Resize::new(None, Some(30)).unwrap();
        assert_eq!(height_only.target(400, 300), Some((40, 30)));

        let both = Resize::new(Some(50), Some(50)).unwrap();
        assert_eq!(both.target(400, 300), Some((50, 50)));

        assert_eq!(Resize::default().target(400, 300), None);
        assert_eq!(width_only.target(100, 75), None);
        assert_eq!(Resize::new(Some(1), None).unwrap().target(1000, 1), Some((1, 1)));
    }

    #[test]
    fn test_resize_rejects_zero() {
        assert!(Resize::new(Some(0), None).unwrap_err().is_config_error());
        assert!(Resize::new(None, Some(0)).is_err());
    }

    #[test]
    fn test_pure_strategies_resize_before_encode() {
        let temp_dir = TempDir::new().unwrap();
        let input = write_sample(temp_dir.path(), "in.png");
        let registry = ProcessorRegistry::with_resize(
            Toolbox::with_search_path(temp_dir.path()),
            Resize::new(Some(12), None).unwrap(),
        );

        for format in [Format::Lossless, Format::Lossy] {
            let output = temp_dir.path().join(format!("small.{}", format.extension()));
            registry
                .get(format)
                .process(&input, &output, 80, &mut JobProgress::default())
                .unwrap();

            let img = image::open(&output).unwrap();
            assert_eq!((img.width(), img.height()), (12, 9));
        }
    }
}
