//! Strategies that hand the final encode to an external binary.
//!
//! optipng and mozjpeg are optional: without them the plain container is
//! written and the job still succeeds. cwebp is mandatory, since there is no
//! in-process WebP encode path worth shipping.
//!
//! Input and output may name the same file. Tools then write to a sibling
//! temp file that replaces the output once they succeed.

use crate::constants::{
    CONVERT_UNITS, CWEBP_TOOL, MOZJPEG_TOOLS, OPTIMIZE_UNITS, OPTIPNG_TOOL, TEMP_FILE_PREFIX,
    VALIDATE_UNITS,
};
use crate::error::{CompressionError, Result};
use crate::formats::Format;
use crate::imageio::{load_image, write_raw_ppm, LoadedImage};
use crate::processing::{JpegProcessor, PngProcessor, Processor, Resize};
use crate::progress::ProgressTracker;
use crate::tools::{optipng_level, run_tool, Toolbox};
use image::ImageFormat;
use std::ffi::OsString;
use std::fs;
use std::path::Path;
use tempfile::TempPath;
use tracing::debug;

/// The file handed to the optimizer: either the caller's input or an
/// intermediate that is removed when this value drops.
enum Staged<'a> {
    Original(&'a Path),
    Temp(TempPath),
}

impl Staged<'_> {
    fn path(&self) -> &Path {
        match self {
            Staged::Original(path) => *path,
            Staged::Temp(temp) => &**temp,
        }
    }
}

/// Creates an empty, self-deleting file next to `output_path`.
fn temp_beside(output_path: &Path, suffix: &str) -> Result<TempPath> {
    let dir = match output_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file = tempfile::Builder::new()
        .prefix(TEMP_FILE_PREFIX)
        .suffix(suffix)
        .tempfile_in(dir)?;
    Ok(file.into_temp_path())
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Makes sure the optimizer gets a file in the converter's container.
/// `reuse_input` hands over the input untouched.
fn stage_container<'a>(
    input_path: &'a Path,
    output_path: &Path,
    quality: u8,
    reuse_input: bool,
    converter: &dyn Processor,
    tracker: &mut dyn ProgressTracker,
) -> Result<Staged<'a>> {
    if reuse_input {
        tracker.add(CONVERT_UNITS);
        return Ok(Staged::Original(input_path));
    }

    let suffix = format!(".{}", converter.format().extension());
    let temp = temp_beside(output_path, &suffix)?;
    converter.process(input_path, &temp, quality, tracker)?;
    Ok(Staged::Temp(temp))
}

/// Unoptimized fallback: the staged container file becomes the output.
fn copy_staged(staged: &Staged<'_>, output_path: &Path) -> Result<()> {
    if is_same_file(staged.path(), output_path) {
        debug!("{:?} already holds the unoptimized output", output_path);
        return Ok(());
    }

    fs::copy(staged.path(), output_path).map_err(|source| CompressionError::OutputCreation {
        path: output_path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Runs an external encoder reading `tool_input` and writing the path passed
/// to `args`. When `tool_input` is the output itself the tool writes a temp
/// file that is moved over the output afterwards.
fn run_tool_into<F>(
    tool: &str,
    program: &Path,
    tool_input: &Path,
    output_path: &Path,
    args: F,
) -> Result<()>
where
    F: FnOnce(&Path) -> Vec<OsString>,
{
    if !is_same_file(tool_input, output_path) {
        return run_tool(tool, program, args(output_path));
    }

    let suffix = output_path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    let pending = temp_beside(output_path, &suffix)?;
    run_tool(tool, program, args(&pending))?;
    pending
        .persist(output_path)
        .map_err(|e| CompressionError::OutputCreation {
            path: output_path.to_path_buf(),
            source: e.error,
        })
}

/// PNG passed through optipng.
#[derive(Debug, Clone, Default)]
pub struct OptiPngProcessor {
    toolbox: Toolbox,
    resize: Resize,
}

impl OptiPngProcessor {
    pub fn new(toolbox: Toolbox) -> Self {
        Self {
            toolbox,
            resize: Resize::default(),
        }
    }

    pub fn resized(mut self, resize: Resize) -> Self {
        self.resize = resize;
        self
    }
}

impl Processor for OptiPngProcessor {
    fn format(&self) -> Format {
        Format::LosslessOptimized
    }

    fn process(
        &self,
        input_path: &Path,
        output_path: &Path,
        quality: u8,
        tracker: &mut dyn ProgressTracker,
    ) -> Result<()> {
        tracker.describe("Validating input...");
        let loaded = load_image(input_path)?;
        tracker.add(VALIDATE_UNITS);

        tracker.describe("Applying basic PNG compression...");
        let staged = stage_container(
            input_path,
            output_path,
            quality,
            loaded.is_container(ImageFormat::Png) && self.resize.is_noop(),
            &PngProcessor::new(self.resize),
            tracker,
        )?;

        match self.toolbox.locate(&[OPTIPNG_TOOL]) {
            Some((tool, program)) => {
                let level = optipng_level(quality);
                tracker.describe(&format!("Optimizing with {} -o{}...", tool, level));
                run_tool_into(tool, &program, staged.path(), output_path, |target| {
                    vec![
                        format!("-o{}", level).into(),
                        "-quiet".into(),
                        "-clobber".into(),
                        "-out".into(),
                        target.into(),
                        staged.path().into(),
                    ]
                })?;
            }
            None => {
                debug!("{} unavailable, writing unoptimized PNG", OPTIPNG_TOOL);
                tracker.describe("Writing PNG without optimization...");
                copy_staged(&staged, output_path)?;
            }
        }

        tracker.add(OPTIMIZE_UNITS);
        Ok(())
    }
}

/// JPEG passed through mozjpeg (or a plain `cjpeg`).
#[derive(Debug, Clone, Default)]
pub struct MozJpegProcessor {
    toolbox: Toolbox,
    resize: Resize,
}

impl MozJpegProcessor {
    pub fn new(toolbox: Toolbox) -> Self {
        Self {
            toolbox,
            resize: Resize::default(),
        }
    }

    pub fn resized(mut self, resize: Resize) -> Self {
        self.resize = resize;
        self
    }

    fn stage_jpeg<'a>(
        &self,
        input_path: &'a Path,
        output_path: &Path,
        quality: u8,
        loaded: &LoadedImage,
        tracker: &mut dyn ProgressTracker,
    ) -> Result<Staged<'a>> {
        tracker.describe("Applying basic JPEG compression...");
        stage_container(
            input_path,
            output_path,
            quality,
            loaded.is_container(ImageFormat::Jpeg) && self.resize.is_noop(),
            &JpegProcessor::new(self.resize),
            tracker,
        )
    }
}

impl Processor for MozJpegProcessor {
    fn format(&self) -> Format {
        Format::LossyOptimized
    }

    fn process(
        &self,
        input_path: &Path,
        output_path: &Path,
        quality: u8,
        tracker: &mut dyn ProgressTracker,
    ) -> Result<()> {
        tracker.describe("Validating input...");
        let loaded = load_image(input_path)?;
        tracker.add(VALIDATE_UNITS);

        let Some((tool, program)) = self.toolbox.locate(MOZJPEG_TOOLS) else {
            let staged = self.stage_jpeg(input_path, output_path, quality, &loaded, tracker)?;
            debug!("{} unavailable, writing unoptimized JPEG", MOZJPEG_TOOLS.join("/"));
            tracker.describe("Writing JPEG without optimization...");
            copy_staged(&staged, output_path)?;
            tracker.add(OPTIMIZE_UNITS);
            return Ok(());
        };

        // Alpha, high bit-depth and resized rasters go to the tool as raw RGB
        // instead of a throwaway JPEG.
        let staged = if loaded.has_native_jpeg_pixels() && self.resize.is_noop() {
            self.stage_jpeg(input_path, output_path, quality, &loaded, tracker)?
        } else {
            tracker.describe("Writing raw pixels...");
            let raw = temp_beside(output_path, ".ppm")?;
            write_raw_ppm(&self.resize.apply(loaded.image), &raw)?;
            tracker.add(CONVERT_UNITS);
            Staged::Temp(raw)
        };

        tracker.describe(&format!("Optimizing with {}...", tool));
        run_tool_into(tool, &program, staged.path(), output_path, |target| {
            vec![
                "-quality".into(),
                quality.to_string().into(),
                "-optimize".into(),
                "-progressive".into(),
                "-outfile".into(),
                target.into(),
                staged.path().into(),
            ]
        })?;

        tracker.add(OPTIMIZE_UNITS);
        Ok(())
    }
}

/// WebP through cwebp. Missing or failing encoder fails the job.
#[derive(Debug, Clone, Default)]
pub struct WebPProcessor {
    toolbox: Toolbox,
    resize: Resize,
}

impl WebPProcessor {
    pub fn new(toolbox: Toolbox) -> Self {
        Self {
            toolbox,
            resize: Resize::default(),
        }
    }

    pub fn resized(mut self, resize: Resize) -> Self {
        self.resize = resize;
        self
    }
}

// Containers cwebp reads directly
fn cwebp_accepts(loaded: &LoadedImage) -> bool {
    [
        ImageFormat::Png,
        ImageFormat::Jpeg,
        ImageFormat::Tiff,
        ImageFormat::WebP,
    ]
    .into_iter()
    .any(|format| loaded.is_container(format))
}

impl Processor for WebPProcessor {
    fn format(&self) -> Format {
        Format::NextGen
    }

    fn process(
        &self,
        input_path: &Path,
        output_path: &Path,
        quality: u8,
        tracker: &mut dyn ProgressTracker,
    ) -> Result<()> {
        tracker.describe("Validating input...");
        let loaded = load_image(input_path)?;
        tracker.add(VALIDATE_UNITS);

        let (tool, program) = self
            .toolbox
            .locate(&[CWEBP_TOOL])
            .ok_or_else(|| CompressionError::ToolNotFound(CWEBP_TOOL.to_string()))?;

        // GIF/BMP and resized sources are handed over as PNG.
        let staged = if cwebp_accepts(&loaded) && self.resize.is_noop() {
            Staged::Original(input_path)
        } else {
            let temp = temp_beside(output_path, ".png")?;
            PngProcessor::new(self.resize).process(input_path, &temp, quality, tracker)?;
            Staged::Temp(temp)
        };

        tracker.describe("Encoding as WebP...");
        run_tool_into(tool, &program, staged.path(), output_path, |target| {
            vec![
                "-quiet".into(),
                "-q".into(),
                quality.to_string().into(),
                staged.path().into(),
                "-o".into(),
                target.into(),
            ]
        })?;

        tracker.add(OPTIMIZE_UNITS);
        Ok(())
    }
}
