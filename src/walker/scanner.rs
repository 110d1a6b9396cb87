//! Directory scanner - concurrent tree discovery
//!
//! The scanner enumerates the tree under the configured scan root and emits
//! one [`RenderJob`] per regular file. Directory listings run concurrently,
//! bounded by a semaphore; discovered subdirectories feed back into a task
//! channel, and an in-flight counter makes completion explicit: the scan is
//! done when the counter reaches zero.
//!
//! Enumeration order is whatever the filesystem returns - there is no
//! ordering contract across siblings or across directories.

use crate::config::RenderConfig;
use crate::error::{MillError, Result, WalkError};
use crate::job::{DirTask, JobOutcome, RenderJob};
use crate::walker::coordinator::RenderStats;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, warn};

/// How long the dispatch loop waits for a task before re-checking completion
const DISPATCH_POLL: Duration = Duration::from_millis(50);

/// Concurrent directory-listing scanner
pub struct Scanner {
    config: Arc<RenderConfig>,
    stats: Arc<RenderStats>,
    shutdown: Arc<AtomicBool>,
}

impl Scanner {
    /// Create a new scanner
    pub fn new(
        config: Arc<RenderConfig>,
        stats: Arc<RenderStats>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            config,
            stats,
            shutdown,
        }
    }

    /// Run the scan to completion
    ///
    /// Jobs are pushed into `jobs` (bounded - discovery backpressures on
    /// conversion throughput); enumeration failures and skips are reported
    /// through `outcomes`. Returns once every directory listing has settled.
    pub async fn run(
        &self,
        jobs: flume::Sender<RenderJob>,
        outcomes: mpsc::UnboundedSender<JobOutcome>,
    ) -> Result<()> {
        let (task_tx, mut task_rx) = mpsc::channel::<DirTask>(self.config.queue_size);

        // Bounds concurrent read_dir calls, not total directories
        let semaphore = Arc::new(Semaphore::new(self.config.worker_count.max(4)));

        // Counts queued + running directory tasks; zero means the scan is done
        let in_flight = Arc::new(AtomicU64::new(0));

        in_flight.fetch_add(1, Ordering::SeqCst);
        task_tx
            .send(DirTask::root())
            .await
            .map_err(|_| MillError::ChannelClosed)?;

        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                debug!("Shutdown signal received, stopping discovery");
                break;
            }

            let task = match tokio::time::timeout(DISPATCH_POLL, task_rx.recv()).await {
                Ok(Some(task)) => task,
                Ok(None) => break,
                Err(_) => {
                    if in_flight.load(Ordering::SeqCst) == 0 {
                        break;
                    }
                    continue;
                }
            };

            let config = Arc::clone(&self.config);
            let stats = Arc::clone(&self.stats);
            let shutdown = Arc::clone(&self.shutdown);
            let semaphore = Arc::clone(&semaphore);
            let in_flight_clone = Arc::clone(&in_flight);
            let tx = task_tx.clone();
            let jobs = jobs.clone();
            let outcomes = outcomes.clone();

            tokio::spawn(async move {
                // Scope the permit to the listing itself. Pushing subtasks
                // must not hold a slot, or a full task channel with every
                // permit taken by blocked senders would wedge the dispatcher.
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => scan_directory(&config, &stats, &jobs, &outcomes, &task).await,
                    Err(_) => Ok(Vec::new()),
                };

                match result {
                    Ok(subdirs) => {
                        if !shutdown.load(Ordering::Relaxed) && !subdirs.is_empty() {
                            in_flight_clone.fetch_add(subdirs.len() as u64, Ordering::SeqCst);
                            for sub in subdirs {
                                if tx.send(sub).await.is_err() {
                                    in_flight_clone.fetch_sub(1, Ordering::SeqCst);
                                }
                            }
                        }
                    }
                    Err(e) => {
                        let path = config.scan_root().join(&task.rel_path);
                        warn!(path = %path.display(), error = %e, "Directory scan failed");
                        stats.record_error();
                        if config.fail_fast {
                            shutdown.store(true, Ordering::SeqCst);
                        }
                        let _ = outcomes.send(JobOutcome::Failed {
                            path,
                            error: e.into(),
                        });
                    }
                }

                in_flight_clone.fetch_sub(1, Ordering::SeqCst);
            });
        }

        // Wait for in-flight listings to settle. On the shutdown path, tasks
        // still queued in the channel will never be dispatched - drain them so
        // the counter can reach zero.
        loop {
            if in_flight.load(Ordering::SeqCst) == 0 {
                break;
            }
            if self.shutdown.load(Ordering::Relaxed) {
                while task_rx.try_recv().is_ok() {
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        Ok(())
    }
}

/// Enumerate one directory: emit jobs for files, return subdirectory tasks
async fn scan_directory(
    config: &RenderConfig,
    stats: &RenderStats,
    jobs: &flume::Sender<RenderJob>,
    outcomes: &mpsc::UnboundedSender<JobOutcome>,
    task: &DirTask,
) -> std::result::Result<Vec<DirTask>, WalkError> {
    let dir_abs = config.scan_root().join(&task.rel_path);

    let mut entries =
        tokio::fs::read_dir(&dir_abs)
            .await
            .map_err(|e| WalkError::ReadDirFailed {
                path: dir_abs.clone(),
                source: e,
            })?;

    stats.record_dir();

    let mut subdirs = Vec::new();

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                return Err(WalkError::ReadDirFailed {
                    path: dir_abs,
                    source: e,
                })
            }
        };

        let name = entry.file_name();
        let rel = task.rel_path.join(&name);

        if config.is_excluded(&rel.to_string_lossy()) {
            stats.record_skip();
            debug!(path = %rel.display(), "Excluded from scan");
            let _ = outcomes.send(JobOutcome::Skipped {
                path: rel,
                reason: "matched exclude pattern".into(),
            });
            continue;
        }

        // Point-in-time status query. The entry may have vanished or become
        // unreadable between the listing and the stat.
        let metadata = match entry.metadata().await {
            Ok(metadata) => metadata,
            Err(e) => {
                let err = WalkError::StatFailed {
                    path: entry.path(),
                    source: e,
                };
                if config.fail_fast {
                    return Err(err);
                }
                stats.record_error();
                let _ = outcomes.send(JobOutcome::Failed {
                    path: entry.path(),
                    error: err.into(),
                });
                continue;
            }
        };

        let file_type = metadata.file_type();

        if file_type.is_dir() {
            let within_depth = config
                .max_depth
                .map(|max| task.depth + 1 <= max)
                .unwrap_or(true);

            if within_depth {
                subdirs.push(DirTask::new(rel, task.depth + 1));
            } else {
                stats.record_skip();
                debug!(path = %rel.display(), "Over depth limit");
            }
        } else if file_type.is_file() {
            stats.record_file(metadata.len());
            let job = RenderJob::new(task.rel_path.clone(), name, metadata.len());
            if jobs.send_async(job).await.is_err() {
                // Workers are gone; nothing left to discover for
                debug!("Job channel closed, stopping enumeration");
                return Ok(Vec::new());
            }
        } else {
            // Symlinks, sockets, devices - never handed to the converter
            stats.record_skip();
            debug!(path = %rel.display(), "Skipping non-regular entry");
            let _ = outcomes.send(JobOutcome::Skipped {
                path: rel,
                reason: "not a regular file".into(),
            });
        }
    }

    Ok(subdirs)
}
