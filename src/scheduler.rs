//! Fixed-size worker pool for batch runs.
//!
//! Every job is pushed into a bounded queue up front. Workers pull until the
//! queue is drained and push one `JobResult` per job into the results
//! channel, which closes once the last worker exits. Results arrive in
//! completion order, not submission order.

use crate::constants::{MAX_AUTO_WORKERS, MIN_AUTO_WORKERS};
use crate::error::{CompressionError, ErrorKind, Result};
use crate::formats::Format;
use crate::processing::ProcessorRegistry;
use crate::progress::JobProgress;
use crate::report::{BatchReport, BatchReporter};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::any::Any;
use std::fmt;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// One input file to compress. Consumed exactly once by a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: usize,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub format: Format,
    pub quality: u8,
}

/// Why a job failed, detached from the original error so it can cross
/// threads and be kept in the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<CompressionError> for JobFailure {
    fn from(err: CompressionError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

#[derive(Debug, Clone)]
pub struct JobResult {
    pub job: Job,
    pub error: Option<JobFailure>,
    pub duration: Duration,
    pub worker: usize,
    /// Input and output sizes in bytes, when the job succeeded.
    pub sizes: Option<(u64, u64)>,
}

impl JobResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// `0` picks `clamp(available_parallelism, 4, 8)`, anything else is used
/// as given.
pub fn resolve_worker_count(requested: usize) -> usize {
    if requested > 0 {
        return requested;
    }
    num_cpus::get().clamp(MIN_AUTO_WORKERS, MAX_AUTO_WORKERS)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Runs a single job to completion on the calling thread.
pub fn execute_job(worker: usize, job: Job, registry: &ProcessorRegistry) -> JobResult {
    let started = Instant::now();
    let mut progress = JobProgress::default();
    let processor = registry.get(job.format);

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        processor.process(&job.input_path, &job.output_path, job.quality, &mut progress)
    }))
    .unwrap_or_else(|payload| Err(CompressionError::WorkerPanic(panic_message(&*payload))));
    let duration = started.elapsed();

    debug!(
        "Worker {} finished job {} after {} units ({})",
        worker, job.id, progress.units_completed, progress.current_description
    );

    let sizes = if outcome.is_ok() {
        fs::metadata(&job.input_path)
            .and_then(|input| Ok((input.len(), fs::metadata(&job.output_path)?.len())))
            .ok()
    } else {
        None
    };

    JobResult {
        error: outcome.err().map(JobFailure::from),
        job,
        duration,
        worker,
        sizes,
    }
}

fn worker_loop(
    worker: usize,
    jobs: Receiver<Job>,
    results: Sender<JobResult>,
    registry: Arc<ProcessorRegistry>,
) {
    debug!("Worker {} started", worker);
    while let Ok(job) = jobs.recv() {
        let result = execute_job(worker, job, &registry);
        if results.send(result).is_err() {
            warn!("Worker {}: result receiver dropped, stopping", worker);
            break;
        }
    }
    debug!("Worker {} drained the queue", worker);
}

/// Fans `jobs` out over `worker_count` workers and streams every result
/// through `reporter` as it arrives.
///
/// Per-job failures are recorded in the report; only failing to set up the
/// pool itself is returned as an error.
pub fn run_batch(
    jobs: Vec<Job>,
    worker_count: usize,
    registry: Arc<ProcessorRegistry>,
    mut reporter: BatchReporter,
) -> Result<BatchReport> {
    let workers = resolve_worker_count(worker_count);
    let total = jobs.len();
    let started = Instant::now();
    reporter.start(total);

    if total == 0 {
        return Ok(reporter.finish(workers, started.elapsed()));
    }

    let (job_tx, job_rx) = bounded::<Job>(total);
    for job in jobs {
        job_tx
            .send(job)
            .map_err(|_| CompressionError::config("job queue closed before submission"))?;
    }
    drop(job_tx);

    let (result_tx, result_rx) = bounded::<JobResult>(total);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("img-press-worker-{}", i))
        .panic_handler(|payload| error!("Worker thread panicked: {}", panic_message(&*payload)))
        .build()
        .map_err(|e| CompressionError::Io(std::io::Error::other(e)))?;

    debug!("Dispatching {} jobs to {} workers", total, workers);
    for worker in 0..workers {
        let job_rx = job_rx.clone();
        let result_tx = result_tx.clone();
        let registry = Arc::clone(&registry);
        pool.spawn(move || worker_loop(worker, job_rx, result_tx, registry));
    }
    drop(result_tx);
    drop(job_rx);

    for result in result_rx {
        reporter.record(result);
    }

    Ok(reporter.finish(workers, started.elapsed()))
}
