pub mod batch;
pub mod cli;
pub mod constants;
pub mod error;
pub mod formats;
pub mod imageio;
pub mod info;
pub mod optimized;
pub mod processing;
pub mod progress;
pub mod report;
pub mod scheduler;
pub mod tools;
pub mod utils;

pub use batch::{collect_image_files, generate_output_path, plan_jobs, run_batch_command, BatchConfig};
pub use error::{CompressionError, ErrorKind, Result};
pub use formats::{determine_output_format, Format, FormatChoice};
pub use info::ImageInfo;
pub use processing::{CompressionOptions, Processor, ProcessorRegistry, Resize};
pub use progress::{JobProgress, ProgressTracker};
pub use report::{BatchReport, BatchReporter};
pub use scheduler::{resolve_worker_count, run_batch, Job, JobFailure, JobResult};
pub use tools::Toolbox;
