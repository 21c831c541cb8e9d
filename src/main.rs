use anyhow::{Context, Result};
use clap::Parser;
use img_press::batch::{run_batch_command, BatchConfig};
use img_press::cli::Args;
use img_press::constants::{ERROR_PREFIX, INFO_PREFIX};
use img_press::formats::{batch_format, determine_output_format};
use img_press::imageio::validate_file_exists;
use img_press::info::{print_image_info, ImageInfo};
use img_press::processing::{CompressionOptions, ProcessorRegistry, Resize};
use img_press::progress::create_progress_bar;
use img_press::report::BatchReporter;
use img_press::scheduler::resolve_worker_count;
use img_press::tools::Toolbox;
use img_press::utils::{default_output_path, print_compression_result};
use indicatif::ProgressBar;
use std::fs;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args);

    let result = match (&args.input_dir, &args.input) {
        (Some(input_dir), _) => compress_batch(&args, input_dir),
        (None, Some(input)) if args.info => show_info(input),
        (None, Some(input)) => compress_single(&args, input),
        (None, None) => Err(anyhow::anyhow!("either --input or --input-dir is required")),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} Error: {:#}", ERROR_PREFIX, e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(args: &Args) {
    let filter = if args.verbose || args.quiet {
        EnvFilter::new(args.log_level())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_level()))
    };

    // Only fails if a subscriber is already installed.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn show_info(input: &Path) -> Result<()> {
    let info = ImageInfo::read(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    print_image_info(&info);
    Ok(())
}

fn compress_single(args: &Args, input: &Path) -> Result<()> {
    // Without --output, `auto` keeps the input's own format.
    let format_hint = args.output.as_deref().unwrap_or(input);
    let format = determine_output_format(Some(format_hint), args.format)?;
    let resize = Resize::new(args.width, args.height)?;
    let options = CompressionOptions::new(format, args.quality)?.with_resize(resize);
    let output = match &args.output {
        Some(output) => output.clone(),
        None => default_output_path(input, format)?,
    };
    validate_file_exists(input)?;

    if !args.quiet {
        println!("🚀 Compressing {:?} -> {:?}", input, output);
        println!("{} Format: {}, quality: {}", INFO_PREFIX, format, options.quality);
        print_resize(&options.resize);
    }

    let registry = ProcessorRegistry::with_resize(Toolbox::from_env(), options.resize);
    let processor = registry.get(format);
    debug!("Using {} processor", processor.format());

    let mut progress = if args.quiet {
        let pb = ProgressBar::hidden();
        pb.set_length(format.progress_units());
        pb
    } else {
        create_progress_bar(format.progress_units())
    };

    let outcome = processor.process(input, &output, options.quality, &mut progress);
    progress.finish_and_clear();
    outcome.with_context(|| format!("failed to compress {}", input.display()))?;

    if !args.quiet {
        let before = fs::metadata(input)?.len();
        let after = fs::metadata(&output)?.len();
        print_compression_result(before, after);
        println!("💾 Saved to {:?}", output);
    }

    Ok(())
}

fn compress_batch(args: &Args, input_dir: &Path) -> Result<()> {
    let format = batch_format(args.format);
    let resize = Resize::new(args.width, args.height)?;
    let options = CompressionOptions::new(format, args.quality)?.with_resize(resize);
    let config = BatchConfig::new(
        input_dir.to_path_buf(),
        args.output_dir.clone(),
        options,
        args.workers,
        args.recursive,
        args.skip_existing,
    )?;

    if !args.quiet {
        println!("🚀 Starting batch compression...");
        println!("📁 Input: {:?}", config.input_dir);
        println!("📁 Output: {:?}", config.output_dir);
        println!(
            "⚙️  Format: {}, quality: {}, workers: {}",
            format,
            options.quality,
            resolve_worker_count(config.workers)
        );
        print_resize(&options.resize);
    }

    let reporter = if args.quiet {
        BatchReporter::hidden()
    } else {
        BatchReporter::interactive()
    };
    let registry = ProcessorRegistry::with_resize(Toolbox::from_env(), options.resize);
    let report = run_batch_command(&config, Arc::new(registry), reporter)
        .with_context(|| format!("batch compression of {} failed", input_dir.display()))?;

    if args.quiet {
        for (path, failure) in &report.failures {
            eprintln!("{} {}: {}", ERROR_PREFIX, path.display(), failure);
        }
    } else {
        report.print_summary();
    }

    Ok(())
}

fn print_resize(resize: &Resize) {
    let side = |value: Option<u32>| value.map_or_else(|| "auto".to_string(), |v| v.to_string());
    if !resize.is_noop() {
        println!("📏 Resize: {} x {}", side(resize.width), side(resize.height));
    }
}
