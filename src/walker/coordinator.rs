//! Render coordinator - orchestrates the scan and the worker pool
//!
//! The coordinator is responsible for:
//! - Setting up the job channel and render workers
//! - Running the scanner until discovery is complete
//! - Collecting per-job outcomes into an aggregate result
//! - Explicit completion: the job channel is closed once discovery drains,
//!   every worker is joined, and only then is the result produced

use crate::config::RenderConfig;
use crate::error::{MillError, Result};
use crate::job::{JobOutcome, RenderJob};
use crate::walker::scanner::Scanner;
use crate::walker::worker::Worker;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Cap on individually reported failures in the summary
pub const MAX_REPORTED_FAILURES: usize = 20;

/// Statistics shared by the scanner and the render workers
#[derive(Debug, Default)]
pub struct RenderStats {
    /// Directories enumerated
    pub dirs_scanned: AtomicU64,

    /// Regular files discovered (each becomes a job)
    pub files_found: AtomicU64,

    /// Source bytes handed to the converter
    pub bytes_found: AtomicU64,

    /// Entries skipped (non-regular, excluded, over depth limit)
    pub skipped: AtomicU64,

    /// Failures (enumeration, stat, or conversion)
    pub errors: AtomicU64,

    /// Jobs rendered successfully
    pub rendered: AtomicU64,
}

impl RenderStats {
    pub fn record_dir(&self) {
        self.dirs_scanned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_file(&self, bytes: u64) {
        self.files_found.fetch_add(1, Ordering::Relaxed);
        self.bytes_found.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_skip(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rendered(&self) {
        self.rendered.fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time progress view for display
#[derive(Debug, Clone, Default)]
pub struct RenderProgress {
    /// Directories enumerated
    pub dirs: u64,

    /// Files discovered
    pub files: u64,

    /// Jobs rendered
    pub rendered: u64,

    /// Failures so far
    pub errors: u64,

    /// Entries skipped
    pub skipped: u64,

    /// Elapsed time
    pub elapsed: Duration,
}

impl RenderProgress {
    /// Conversions per second since the run started
    pub fn jobs_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.rendered as f64 / secs
        } else {
            0.0
        }
    }
}

/// A failed job retained for the final report
#[derive(Debug)]
pub struct JobFailure {
    /// Path the failure is attributed to
    pub path: PathBuf,

    /// Rendered error message
    pub error: String,
}

/// Result of a completed render run
#[derive(Debug)]
pub struct RenderResult {
    /// Directories enumerated
    pub dirs_scanned: u64,

    /// Regular files discovered
    pub files_found: u64,

    /// Jobs rendered successfully
    pub rendered: u64,

    /// Failures (enumeration + conversion)
    pub errors: u64,

    /// Entries skipped
    pub skipped: u64,

    /// Source bytes handed to the converter
    pub bytes_read: u64,

    /// Time taken for the run
    pub duration: Duration,

    /// Whether the run completed (vs was interrupted or aborted)
    pub completed: bool,

    /// First failures, capped at [`MAX_REPORTED_FAILURES`]
    pub failures: Vec<JobFailure>,
}

/// Coordinates the scan and the render worker pool
pub struct RenderCoordinator {
    /// Configuration
    config: Arc<RenderConfig>,

    /// Shared statistics
    stats: Arc<RenderStats>,

    /// Shutdown signal
    shutdown: Arc<AtomicBool>,
}

impl RenderCoordinator {
    /// Create a new render coordinator
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config: Arc::new(config),
            stats: Arc::new(RenderStats::default()),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get a clone of the shutdown flag (for signal handlers)
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Get the shared statistics (for live progress display)
    pub fn stats(&self) -> Arc<RenderStats> {
        Arc::clone(&self.stats)
    }

    /// Snapshot current progress
    pub fn progress(&self, elapsed: Duration) -> RenderProgress {
        progress_snapshot(&self.stats, elapsed)
    }

    /// Run the render: scan the tree, convert every file, join everything
    pub async fn run(self) -> Result<RenderResult> {
        let start_time = Instant::now();

        info!(
            source = %self.config.scan_root().display(),
            dest = %self.config.mirror_root().display(),
            converter = %self.config.converter.display(),
            workers = self.config.worker_count,
            "Starting render run"
        );

        // Bounded job channel: discovery backpressures on conversion
        let (job_tx, job_rx) = flume::bounded::<RenderJob>(self.config.queue_size);

        // Outcome channel feeding the failure collector
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel::<JobOutcome>();

        // Spawn the render worker pool
        let mut workers = Vec::with_capacity(self.config.worker_count);
        for id in 0..self.config.worker_count {
            workers.push(Worker::spawn(
                id,
                Arc::clone(&self.config),
                Arc::clone(&self.stats),
                job_rx.clone(),
                outcome_tx.clone(),
                Arc::clone(&self.shutdown),
            ));
        }
        drop(job_rx);
        info!(count = workers.len(), "Render workers spawned");

        // Collect failures as outcomes arrive
        let collector = tokio::spawn(collect_failures(outcome_rx));

        // Run discovery; job_tx is dropped afterwards so the workers drain
        // the channel and exit
        let scanner = Scanner::new(
            Arc::clone(&self.config),
            Arc::clone(&self.stats),
            Arc::clone(&self.shutdown),
        );
        let scan_result = scanner.run(job_tx, outcome_tx.clone()).await;

        // Join all workers
        for worker in workers {
            if let Err(e) = worker.join().await {
                warn!(error = %e, "Worker failed to join cleanly");
            }
        }

        // Last outcome sender gone: the collector sees end-of-stream
        drop(outcome_tx);
        let failures = collector.await.unwrap_or_default();

        scan_result?;

        let duration = start_time.elapsed();
        let interrupted = self.shutdown.load(Ordering::SeqCst);

        let result = RenderResult {
            dirs_scanned: self.stats.dirs_scanned.load(Ordering::Relaxed),
            files_found: self.stats.files_found.load(Ordering::Relaxed),
            rendered: self.stats.rendered.load(Ordering::Relaxed),
            errors: self.stats.errors.load(Ordering::Relaxed),
            skipped: self.stats.skipped.load(Ordering::Relaxed),
            bytes_read: self.stats.bytes_found.load(Ordering::Relaxed),
            duration,
            completed: !interrupted,
            failures,
        };

        info!(
            dirs = result.dirs_scanned,
            files = result.files_found,
            rendered = result.rendered,
            errors = result.errors,
            duration_secs = duration.as_secs(),
            "Render run finished"
        );

        // In fail-fast mode the first failure is the run's error
        if self.config.fail_fast {
            if let Some(first) = result.failures.first() {
                return Err(MillError::Aborted {
                    path: first.path.clone(),
                    reason: first.error.clone(),
                });
            }
        }

        Ok(result)
    }
}

/// Drain the outcome channel, retaining the first failures for the report
async fn collect_failures(mut outcomes: mpsc::UnboundedReceiver<JobOutcome>) -> Vec<JobFailure> {
    let mut failures = Vec::new();

    while let Some(outcome) = outcomes.recv().await {
        match outcome {
            JobOutcome::Failed { path, error } => {
                if failures.len() < MAX_REPORTED_FAILURES {
                    failures.push(JobFailure {
                        path,
                        error: error.to_string(),
                    });
                } else {
                    debug!(path = %path.display(), "failure dropped from report (cap reached)");
                }
            }
            JobOutcome::Rendered { .. } | JobOutcome::Skipped { .. } => {}
        }
    }

    failures
}

/// Build a progress snapshot from the shared statistics
pub fn progress_snapshot(stats: &RenderStats, elapsed: Duration) -> RenderProgress {
    RenderProgress {
        dirs: stats.dirs_scanned.load(Ordering::Relaxed),
        files: stats.files_found.load(Ordering::Relaxed),
        rendered: stats.rendered.load(Ordering::Relaxed),
        errors: stats.errors.load(Ordering::Relaxed),
        skipped: stats.skipped.load(Ordering::Relaxed),
        elapsed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_rate() {
        let progress = RenderProgress {
            dirs: 10,
            files: 100,
            rendered: 50,
            errors: 2,
            skipped: 1,
            elapsed: Duration::from_secs(10),
        };
        assert!((progress.jobs_per_second() - 5.0).abs() < 0.01);

        let idle = RenderProgress::default();
        assert_eq!(idle.jobs_per_second(), 0.0);
    }

    #[test]
    fn test_stats_snapshot() {
        let stats = RenderStats::default();
        stats.record_dir();
        stats.record_file(1024);
        stats.record_file(512);
        stats.record_rendered();
        stats.record_error();
        stats.record_skip();

        let progress = progress_snapshot(&stats, Duration::from_secs(1));
        assert_eq!(progress.dirs, 1);
        assert_eq!(progress.files, 2);
        assert_eq!(progress.rendered, 1);
        assert_eq!(progress.errors, 1);
        assert_eq!(progress.skipped, 1);
        assert_eq!(stats.bytes_found.load(Ordering::Relaxed), 1536);
    }

    #[tokio::test]
    async fn test_collect_failures_caps_report() {
        let (tx, rx) = mpsc::unbounded_channel();
        let collector = tokio::spawn(collect_failures(rx));

        for i in 0..(MAX_REPORTED_FAILURES + 5) {
            tx.send(JobOutcome::Failed {
                path: format!("f{i}.dot").into(),
                error: MillError::ChannelClosed,
            })
            .unwrap();
        }
        tx.send(JobOutcome::Rendered {
            path: "ok.dot".into(),
            stderr: String::new(),
        })
        .unwrap();
        drop(tx);

        let failures = collector.await.unwrap();
        assert_eq!(failures.len(), MAX_REPORTED_FAILURES);
        assert_eq!(failures[0].path, PathBuf::from("f0.dot"));
    }
}
