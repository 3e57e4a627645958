//! metabatch - Concurrent Image Metadata Tagger
//!
//! Entry point for the CLI application. The main thread is the
//! single-threaded event consumer: it drains the engine's channel,
//! renders progress, and never shares state with the workers.

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::RecvTimeoutError;
use metabatch::config::CliArgs;
use metabatch::events::BatchEvent;
use metabatch::progress::{print_header, print_summary, ProgressReporter};
use metabatch::services::{HttpGenerator, SidecarWriter};
use metabatch::{BatchCoordinator, ChannelSink};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
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

    // Validate configuration
    let config = args.batch_config().context("Invalid configuration")?;
    let endpoint = args.endpoint_url().context("Invalid endpoint")?;

    // Wire the collaborators the engine will call from its workers
    let generator = HttpGenerator::new(endpoint.as_str(), Duration::from_secs(args.timeout))
        .context("Failed to build HTTP client")?;
    let (sink, events) = ChannelSink::new();

    let coordinator = BatchCoordinator::new(
        config.clone(),
        Arc::new(generator),
        Arc::new(SidecarWriter::new()),
        Arc::new(sink),
    )
    .context("Failed to initialize batch engine")?;

    if !args.quiet {
        print_header(&args.root, config.worker_count, &endpoint);
    }

    // Start the batch; a bad root fails here, synchronously
    let handle = coordinator
        .run_batch(&args.root)
        .context("Failed to start batch")?;

    if handle.total() == 0 {
        info!(root = %args.root.display(), "no matching images found");
    }

    // Setup signal handler: stop consuming and let in-flight items finish
    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, finishing in-flight items...");
        flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to set signal handler")?;

    let progress = (!args.quiet).then(|| ProgressReporter::new(handle.total()));

    // Drain events on the main thread
    let mut summary = None;
    while summary.is_none() && !interrupted.load(Ordering::SeqCst) {
        match events.recv_timeout(Duration::from_millis(100)) {
            Ok(BatchEvent::Log { message }) => {
                if let Some(ref p) = progress {
                    p.log_line(&message);
                }
            }
            Ok(BatchEvent::ItemCompleted { .. }) => {
                if let Some(ref p) = progress {
                    p.record_item(handle.succeeded(), handle.failed());
                }
            }
            Ok(BatchEvent::BatchCompleted { summary: s }) => summary = Some(s),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    // Graceful either way: reject new work, drain what was accepted
    coordinator.shutdown();

    match summary {
        Some(summary) => {
            if let Some(ref p) = progress {
                p.finish("batch complete");
            }
            if !args.quiet {
                print_summary(&summary);
            }
            if summary.failed > 0 {
                info!(failed = summary.failed, "batch completed with failures");
            }
        }
        None => {
            if let Some(ref p) = progress {
                p.finish("interrupted");
            }
            info!("batch interrupted before completion");
        }
    }

    Ok(())
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("metabatch=debug,warn")
    } else {
        EnvFilter::new("metabatch=info,warn")
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
