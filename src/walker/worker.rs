//! Render worker pool
//!
//! Each worker:
//! - Pulls render jobs from the shared bounded job channel
//! - Invokes the external converter for the job
//! - Surfaces converter diagnostics and reports the job outcome
//!
//! Workers exit when the job channel is closed and drained, or when the
//! shutdown flag is raised (fail-fast or interrupt). Pending jobs are
//! abandoned on shutdown - there is no retry of any kind.

use crate::config::RenderConfig;
use crate::error::{MillError, WorkerError};
use crate::job::{JobOutcome, RenderJob};
use crate::render;
use crate::walker::coordinator::RenderStats;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// A render worker task
pub struct Worker {
    /// Worker ID
    id: usize,

    /// Task handle
    handle: Option<JoinHandle<Result<(), MillError>>>,
}

impl Worker {
    /// Spawn a new render worker
    pub fn spawn(
        id: usize,
        config: Arc<RenderConfig>,
        stats: Arc<RenderStats>,
        jobs: flume::Receiver<RenderJob>,
        outcomes: mpsc::UnboundedSender<JobOutcome>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        let handle = tokio::spawn(worker_loop(id, config, stats, jobs, outcomes, shutdown));

        Self {
            id,
            handle: Some(handle),
        }
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Wait for the worker to finish
    pub async fn join(mut self) -> Result<(), MillError> {
        match self.handle.take() {
            Some(handle) => match handle.await {
                Ok(result) => result,
                Err(e) => Err(WorkerError::Panicked {
                    id: self.id,
                    message: e.to_string(),
                }
                .into()),
            },
            None => Ok(()),
        }
    }
}

/// Main loop for a render worker
async fn worker_loop(
    id: usize,
    config: Arc<RenderConfig>,
    stats: Arc<RenderStats>,
    jobs: flume::Receiver<RenderJob>,
    outcomes: mpsc::UnboundedSender<JobOutcome>,
    shutdown: Arc<AtomicBool>,
) -> Result<(), MillError> {
    debug!(worker = id, "Render worker started");

    loop {
        if shutdown.load(Ordering::Relaxed) {
            debug!(worker = id, "Render worker shutting down");
            break;
        }

        // Channel closed and drained means discovery is finished
        let job = match jobs.recv_async().await {
            Ok(job) => job,
            Err(_) => break,
        };

        let rel = job.rel_path();

        match render::render_job(&config, &job).await {
            Ok(stderr) => {
                stats.record_rendered();
                if !stderr.is_empty() {
                    // The converter may warn on stderr even on success;
                    // surface it to the operator verbatim
                    eprint!("{stderr}");
                }
                let _ = outcomes.send(JobOutcome::Rendered { path: rel, stderr });
            }
            Err(e) => {
                stats.record_error();
                warn!(worker = id, path = %rel.display(), error = %e, "Conversion failed");
                if config.fail_fast {
                    shutdown.store(true, Ordering::SeqCst);
                }
                if outcomes
                    .send(JobOutcome::Failed {
                        path: rel,
                        error: e.into(),
                    })
                    .is_err()
                {
                    return Err(WorkerError::ResultChannelClosed.into());
                }
            }
        }
    }

    debug!(worker = id, "Render worker stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use std::path::{Path, PathBuf};

    #[cfg(unix)]
    #[tokio::test]
    async fn test_worker_processes_jobs_and_exits_on_close() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("res");
        let dest = dir.path().join("bin");
        std::fs::create_dir_all(&source).unwrap();
        std::fs::write(source.join("a.dot"), "digraph {}").unwrap();

        let converter = dir.path().join("fake-dot");
        std::fs::write(
            &converter,
            "#!/bin/sh\nout=\"\"; src=\"\"\nfor a in \"$@\"; do\n  case \"$a\" in\n    -o*) out=\"${a#-o}\" ;;\n    -T*) : ;;\n    *) src=\"$a\" ;;\n  esac\ndone\ncp \"$src\" \"$out\"\n",
        )
        .unwrap();
        std::fs::set_permissions(&converter, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut config = test_config(&source, &dest);
        config.converter = converter;

        let stats = Arc::new(RenderStats::default());
        let shutdown = Arc::new(AtomicBool::new(false));
        let (job_tx, job_rx) = flume::bounded(4);
        let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();

        let worker = Worker::spawn(
            0,
            Arc::new(config),
            Arc::clone(&stats),
            job_rx,
            outcome_tx,
            shutdown,
        );
        assert_eq!(worker.id(), 0);

        job_tx
            .send_async(RenderJob::new(PathBuf::new(), "a.dot".into(), 10))
            .await
            .unwrap();
        drop(job_tx);

        worker.join().await.unwrap();

        assert!(dest.join("a.svg").is_file());
        assert_eq!(stats.rendered.load(Ordering::Relaxed), 1);

        let outcome = outcome_rx.recv().await.unwrap();
        assert!(outcome.is_success());
        assert_eq!(outcome.path(), Path::new("a.dot"));
    }

    #[tokio::test]
    async fn test_worker_fail_fast_raises_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("res");
        std::fs::create_dir_all(&source).unwrap();
        std::fs::write(source.join("a.dot"), "digraph {}").unwrap();

        let mut config = test_config(&source, &dir.path().join("bin"));
        config.converter = dir.path().join("no-such-converter");
        config.fail_fast = true;

        let stats = Arc::new(RenderStats::default());
        let shutdown = Arc::new(AtomicBool::new(false));
        let (job_tx, job_rx) = flume::bounded(4);
        let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();

        let worker = Worker::spawn(
            0,
            Arc::new(config),
            Arc::clone(&stats),
            job_rx,
            outcome_tx,
            Arc::clone(&shutdown),
        );

        job_tx
            .send_async(RenderJob::new(PathBuf::new(), "a.dot".into(), 10))
            .await
            .unwrap();
        drop(job_tx);

        worker.join().await.unwrap();

        assert!(shutdown.load(Ordering::SeqCst));
        assert_eq!(stats.errors.load(Ordering::Relaxed), 1);
        assert!(matches!(
            outcome_rx.recv().await,
            Some(JobOutcome::Failed { .. })
        ));
    }
}
