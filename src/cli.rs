use crate::formats::{Format, FormatChoice};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "img-press",
    about = "Format-adaptive image compressor with a parallel batch mode",
    long_about = "img-press re-encodes images as PNG, JPEG or WebP, optionally running them through \
                  optipng, mozjpeg or cwebp when those tools are installed. \
                  Pass --input for a single file or --input-dir to compress a whole directory \
                  on a fixed pool of worker threads.",
    version,
    after_help = "FORMATS:\n  \
    png, optipng, jpeg (jpg), mozjpeg, webp, auto\n\n\
    EXAMPLES:\n  \
    img-press --input photo.png --output photo.jpg -q 85\n  \
    img-press --input photo.png --format optipng\n  \
    img-press --input photo.jpg --width 1280 -q 75\n  \
    img-press --input photo.jpg --info\n  \
    img-press --input-dir ./images --output-dir ./out --format webp -j 4 -r --skip-existing"
)]
pub struct Args {
    #[arg(
        short = 'i',
        long,
        help = "Input image file path",
        conflicts_with = "input_dir",
        required_unless_present = "input_dir"
    )]
    pub input: Option<PathBuf>,

    #[arg(
        short = 'o',
        long,
        help = "Output image file path (default: <input-stem>_compressed.<ext>)",
        requires = "input"
    )]
    pub output: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        default_value = "auto",
        value_parser = parse_format_choice,
        help = "Output format (png, optipng, jpeg, mozjpeg, webp, auto)",
        long_help = "Output format. `auto` infers the format from the --output extension in \
                     single-file mode, or from the input extension when --output is omitted, \
                     and means webp in batch mode."
    )]
    pub format: FormatChoice,

    #[arg(
        short = 'q',
        long,
        value_parser = clap::value_parser!(u8).range(0..=100),
        help = "Compression quality (0-100, default: 80)",
        long_help = "Compression quality from 0 (smallest) to 100 (best). \
                     For optipng: >=90 uses -o7, >=70 uses -o5, >=50 uses -o3, lower uses -o2."
    )]
    pub quality: Option<u8>,

    #[arg(
        short = 'w',
        long,
        value_parser = clap::value_parser!(u32).range(1..),
        help = "Resize to this width before encoding",
        long_help = "Resize to this width before encoding. Without --height the aspect ratio \
                     is kept."
    )]
    pub width: Option<u32>,

    #[arg(
        short = 'H',
        long,
        value_parser = clap::value_parser!(u32).range(1..),
        help = "Resize to this height before encoding",
        long_help = "Resize to this height before encoding. Without --width the aspect ratio \
                     is kept."
    )]
    pub height: Option<u32>,

    #[arg(
        long,
        requires = "input",
        help = "Show image metadata and compression suggestions instead of compressing"
    )]
    pub info: bool,

    #[arg(long, help = "Compress every image in this directory (batch mode)")]
    pub input_dir: Option<PathBuf>,

    #[arg(
        long,
        requires = "input_dir",
        help = "Batch output directory (default: <input-dir>/compressed)"
    )]
    pub output_dir: Option<PathBuf>,

    #[arg(
        short = 'j',
        long,
        default_value_t = 0,
        requires = "input_dir",
        help = "Number of worker threads (0 = auto, 4 to 8)"
    )]
    pub workers: usize,

    #[arg(short = 'r', long, requires = "input_dir", help = "Descend into subdirectories")]
    pub recursive: bool,

    #[arg(
        long,
        requires = "input_dir",
        help = "Skip inputs whose output file already exists"
    )]
    pub skip_existing: bool,

    #[arg(short = 'v', long, conflicts_with = "quiet", help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(long, help = "Only print errors")]
    pub quiet: bool,
}

impl Args {
    pub fn is_batch(&self) -> bool {
        self.input_dir.is_some()
    }

    /// Log filter directive implied by --verbose / --quiet.
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        }
    }
}

fn parse_format_choice(value: &str) -> Result<FormatChoice, String> {
    value.parse::<FormatChoice>().map_err(|e| {
        format!(
            "{} (expected one of: {}, auto)",
            e,
            Format::format_names().join(", ")
        )
    })
}
