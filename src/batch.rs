use crate::constants::DEFAULT_BATCH_OUTPUT_DIR;
use crate::error::{CompressionError, Result};
use crate::formats::Format;
use crate::processing::{CompressionOptions, ProcessorRegistry};
use crate::report::{BatchReport, BatchReporter};
use crate::scheduler::{self, Job};
use crate::utils::is_image_file;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Everything a batch run needs, fixed before any file is touched.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub options: CompressionOptions,
    /// `0` lets the scheduler pick.
    pub workers: usize,
    pub recursive: bool,
    pub skip_existing: bool,
}

impl BatchConfig {
    pub fn new(
        input_dir: PathBuf,
        output_dir: Option<PathBuf>,
        options: CompressionOptions,
        workers: usize,
        recursive: bool,
        skip_existing: bool,
    ) -> Result<Self> {
        if !input_dir.is_dir() {
            return Err(CompressionError::config(format!(
                "Input directory does not exist or is not a directory: {:?}",
                input_dir
            )));
        }

        let output_dir = output_dir.unwrap_or_else(|| input_dir.join(DEFAULT_BATCH_OUTPUT_DIR));

        Ok(Self {
            input_dir,
            output_dir,
            options,
            workers,
            recursive,
            skip_existing,
        })
    }
}

/// Jobs to submit plus the inputs left out by `--skip-existing`.
#[derive(Debug, Default)]
pub struct BatchPlan {
    pub jobs: Vec<Job>,
    pub skipped: Vec<PathBuf>,
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Supported images under `input_dir`, sorted.
///
/// Hidden entries and the `exclude` directory (usually the batch output
/// directory) are never descended into.
pub fn collect_image_files(
    input_dir: &Path,
    recursive: bool,
    exclude: Option<&Path>,
) -> Result<Vec<PathBuf>> {
    let root = input_dir.canonicalize()?;
    let exclude = exclude.and_then(|path| path.canonicalize().ok());

    let walker = if recursive {
        WalkDir::new(&root)
    } else {
        WalkDir::new(&root).max_depth(1)
    };

    let mut image_files = Vec::new();
    let entries = walker.into_iter().filter_entry(|e| {
        e.depth() == 0 || !(is_hidden(e) || exclude.as_deref() == Some(e.path()))
    });
    for entry in entries {
        let entry = entry?;
        if entry.file_type().is_file() && is_image_file(entry.path()) {
            image_files.push(entry.into_path());
        }
    }

    image_files.sort();
    Ok(image_files)
}

/// `<output_dir>/<stem>.<ext>` for a batch input.
pub fn generate_output_path(input_path: &Path, output_dir: &Path, format: Format) -> Result<PathBuf> {
    let file_stem = input_path
        .file_stem()
        .ok_or_else(|| CompressionError::config(format!("Invalid file name: {:?}", input_path)))?;

    let output_filename = format!("{}.{}", file_stem.to_string_lossy(), format.extension());
    Ok(output_dir.join(output_filename))
}

/// Numbered variant of `path` that is not yet in `taken`.
fn disambiguate(path: PathBuf, taken: &HashSet<PathBuf>) -> PathBuf {
    if !taken.contains(&path) {
        return path;
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

    (1..)
        .map(|n| dir.join(format!("{}_{}.{}", stem, n, ext)))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or(path)
}

/// Turns discovered files into jobs. Inputs sharing a stem get numbered
/// output names since every output lands in the same directory.
pub fn plan_jobs(files: &[PathBuf], config: &BatchConfig) -> Result<BatchPlan> {
    let format = config.options.format;
    let mut plan = BatchPlan::default();
    let mut taken = HashSet::new();

    for input_path in files {
        let output_path = generate_output_path(input_path, &config.output_dir, format)?;
        let output_path = disambiguate(output_path, &taken);
        taken.insert(output_path.clone());

        if config.skip_existing && output_path.exists() {
            debug!("Skipping {:?}: {:?} already exists", input_path, output_path);
            plan.skipped.push(input_path.clone());
            continue;
        }

        plan.jobs.push(Job {
            id: plan.jobs.len(),
            input_path: input_path.clone(),
            output_path,
            format,
            quality: config.options.quality,
        });
    }

    Ok(plan)
}

pub fn prepare_output_dir(output_dir: &Path) -> Result<()> {
    fs::create_dir_all(output_dir).map_err(|source| CompressionError::DirectoryCreationFailed {
        path: output_dir.to_path_buf(),
        source,
    })
}

/// Discovers, plans and runs a whole batch.
///
/// Failing jobs end up in the report; errors returned here mean the batch
/// never started.
pub fn run_batch_command(
    config: &BatchConfig,
    registry: Arc<ProcessorRegistry>,
    reporter: BatchReporter,
) -> Result<BatchReport> {
    let files = collect_image_files(&config.input_dir, config.recursive, Some(&config.output_dir))?;
    if files.is_empty() {
        return Err(CompressionError::NoImageFilesFound(config.input_dir.clone()));
    }
    debug!("Discovered {} image files under {:?}", files.len(), config.input_dir);

    let plan = plan_jobs(&files, config)?;
    if !plan.skipped.is_empty() {
        warn!("{} files skipped, output already exists", plan.skipped.len());
    }
    prepare_output_dir(&config.output_dir)?;

    let reporter = reporter.with_skipped(plan.skipped.len());
    scheduler::run_batch(plan.jobs, config.workers, registry, reporter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut file = File::create(path).unwrap();
        file.write_all(b"fake image data").unwrap();
    }

    fn config(input: &Path, skip_existing: bool) -> BatchConfig {
        BatchConfig::new(
            input.to_path_buf(),
            None,
            CompressionOptions::new(Format::Lossy, None).unwrap(),
            2,
            false,
            skip_existing,
        )
        .unwrap()
    }

    #[test]
    fn test_generate_output_path() {
        let result =
            generate_output_path(Path::new("photos/test.png"), Path::new("/tmp/output"), Format::Lossy)
                .unwrap();
        assert_eq!(result, PathBuf::from("/tmp/output/test.jpg"));

        let result =
            generate_output_path(Path::new("test.jpg"), Path::new("/tmp/output"), Format::NextGen)
                .unwrap();
        assert_eq!(result, PathBuf::from("/tmp/output/test.webp"));
    }

    #[test]
    fn test_batch_config_defaults_output_dir() {
        let temp_dir = TempDir::new().unwrap();
        let config = config(temp_dir.path(), false);
        assert_eq!(config.output_dir, temp_dir.path().join("compressed"));
    }

    #[test]
    fn test_batch_config_rejects_missing_input() {
        let err = BatchConfig::new(
            PathBuf::from("/definitely/not/a/dir"),
            None,
            CompressionOptions::new(Format::Lossy, None).unwrap(),
            0,
            false,
            false,
        )
        .unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_collect_image_files_directory() {
        let temp_dir = TempDir::new().unwrap();
        touch(&temp_dir.path().join("b.png"));
        touch(&temp_dir.path().join("a.JPG"));
        touch(&temp_dir.path().join("notes.txt"));
        touch(&temp_dir.path().join(".hidden.png"));
        touch(&temp_dir.path().join("sub").join("nested.png"));

        let files = collect_image_files(temp_dir.path(), false, None).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.JPG", "b.png"]);
    }

    #[test]
    fn test_collect_image_files_recursive_excludes_output() {
        let temp_dir = TempDir::new().unwrap();
        touch(&temp_dir.path().join("a.png"));
        touch(&temp_dir.path().join("sub").join("nested.gif"));
        touch(&temp_dir.path().join(".cache").join("thumb.png"));
        touch(&temp_dir.path().join("compressed").join("a.webp"));

        let output_dir = temp_dir.path().join("compressed");
        let files = collect_image_files(temp_dir.path(), true, Some(&output_dir)).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.png", "nested.gif"]);
    }

    #[test]
    fn test_plan_jobs_skip_existing() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a.png");
        let b = temp_dir.path().join("b.png");
        touch(&a);
        touch(&b);
        touch(&temp_dir.path().join("compressed").join("a.jpg"));

        let plan = plan_jobs(&[a.clone(), b.clone()], &config(temp_dir.path(), true)).unwrap();
        assert_eq!(plan.skipped, vec![a.clone()]);
        assert_eq!(plan.jobs.len(), 1);
        assert_eq!(plan.jobs[0].input_path, b);
        assert_eq!(plan.jobs[0].quality, 80);

        let plan = plan_jobs(&[a, b], &config(temp_dir.path(), false)).unwrap();
        assert!(plan.skipped.is_empty());
        assert_eq!(plan.jobs.len(), 2);
    }

    #[test]
    fn test_plan_jobs_numbers_colliding_outputs() {
        let temp_dir = TempDir::new().unwrap();
        let files = vec![
            temp_dir.path().join("x.jpg"),
            temp_dir.path().join("x.png"),
            temp_dir.path().join("sub").join("x.bmp"),
        ];

        let plan = plan_jobs(&files, &config(temp_dir.path(), false)).unwrap();
        let outputs: Vec<_> = plan
            .jobs
            .iter()
            .map(|j| j.output_path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(outputs, vec!["x.jpg", "x_1.jpg", "x_2.jpg"]);
    }

    #[test]
    fn test_run_batch_command_empty_dir() {
        let temp_dir = TempDir::new().unwrap();
        touch(&temp_dir.path().join("readme.txt"));

        let err = run_batch_command(
            &config(temp_dir.path(), false),
            Arc::new(ProcessorRegistry::from_env()),
            BatchReporter::hidden(),
        )
        .unwrap_err();
        assert!(matches!(err, CompressionError::NoImageFilesFound(_)));
    }

    #[test]
    fn test_prepare_output_dir_failure() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("file");
        touch(&blocker);

        let err = prepare_output_dir(&blocker.join("out")).unwrap_err();
        assert!(matches!(err, CompressionError::DirectoryCreationFailed { .. }));
        assert_eq!(err.kind(), crate::error::ErrorKind::Io);
    }
}
