//! dotmill - Concurrent Diagram-Tree Renderer
//!
//! Entry point for the CLI application.

use anyhow::{bail, Context, Result};
use clap::Parser;
use dotmill::config::{CliArgs, RenderConfig};
use dotmill::progress::{print_header, print_summary, ProgressReporter};
use dotmill::walker::{coordinator::progress_snapshot, RenderCoordinator};
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Setup logging
    setup_logging(args.verbose)?;

    // Validate and create config
    let config = RenderConfig::from_args(args).context("Invalid configuration")?;

    // Create tokio runtime
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create async runtime")?;

    runtime.block_on(run_inner(config))
}

async fn run_inner(config: RenderConfig) -> Result<()> {
    // Print header
    if config.show_progress {
        print_header(
            &config.scan_root().display().to_string(),
            &config.mirror_root().display().to_string(),
            &config.converter.display().to_string(),
            config.worker_count,
        );
    }

    // Create coordinator
    let coordinator = RenderCoordinator::new(config.clone());

    // Setup signal handler for graceful shutdown
    let shutdown_flag = coordinator.shutdown_flag();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, shutting down...");
        shutdown_flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to set signal handler")?;

    // Create progress reporter with a periodic updater
    let progress = if config.show_progress {
        Some(ProgressReporter::new())
    } else {
        None
    };

    if let Some(ref p) = progress {
        p.set_status("Scanning source tree...");
    }

    let updater = progress.as_ref().map(|reporter| {
        let reporter = reporter.clone();
        let stats = coordinator.stats();
        let start = Instant::now();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(100));
            loop {
                ticker.tick().await;
                reporter.update(&progress_snapshot(&stats, start.elapsed()));
            }
        })
    });

    // Run the render
    let result = coordinator.run().await;

    if let Some(handle) = updater {
        handle.abort();
    }

    let result = match result {
        Ok(result) => result,
        Err(e) => {
            if let Some(ref p) = progress {
                p.finish_and_clear();
            }
            return Err(e).context("Render run failed");
        }
    };

    // Finish progress
    if let Some(ref p) = progress {
        if result.completed {
            p.finish("Render finished");
        } else {
            p.finish("Render interrupted");
        }
    }

    // Print summary
    print_summary(&result);

    if !result.completed {
        info!("Run was interrupted before completion");
    }

    // Aggregate exit status: any failure makes the run fail
    if result.errors > 0 {
        bail!(
            "{} of {} jobs failed ({} rendered)",
            result.errors,
            result.files_found,
            result.rendered
        );
    }

    Ok(())
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("dotmill=debug,warn")
    } else {
        EnvFilter::new("dotmill=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}
