//! Configuration types for metabatch
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation

use crate::batch::ExtensionFilter;
use crate::error::ConfigError;
use clap::Parser;
use std::path::PathBuf;

/// Maximum reasonable worker count
const MAX_WORKERS: usize = 256;

/// Default worker count; collaborator calls are I/O bound, so a small
/// fixed pool is the admission control for connections and file handles
pub const DEFAULT_WORKERS: usize = 4;

/// Runtime configuration for the batch engine
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Concurrency limit of the worker pool
    pub worker_count: usize,

    /// Which files count as work items
    pub extensions: ExtensionFilter,
}

impl BatchConfig {
    /// Build a validated configuration
    pub fn new(worker_count: usize, extensions: ExtensionFilter) -> Result<Self, ConfigError> {
        if worker_count == 0 || worker_count > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: worker_count,
                max: MAX_WORKERS,
            });
        }

        Ok(Self {
            worker_count,
            extensions,
        })
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKERS,
            extensions: ExtensionFilter::default_images(),
        }
    }
}

/// Batch image metadata tagger
#[derive(Parser, Debug, Clone)]
#[command(
    name = "metabatch",
    version,
    about = "Batch image metadata tagger",
    long_about = "Recursively enumerates image files under a folder, requests metadata for each\n\
                  from a generation service, and persists the result beside the image.\n\n\
                  Items are processed in parallel on a bounded worker pool; a failing item is\n\
                  recorded and counted without aborting the rest of the batch.",
    after_help = "EXAMPLES:\n    \
        metabatch ~/Pictures --endpoint http://localhost:8702/describe\n    \
        metabatch /mnt/photos -w 8 --endpoint https://tagger.internal/v1/metadata\n    \
        metabatch ./shoot --ext jpg --ext tiff --endpoint http://localhost:8702/describe -v"
)]
pub struct CliArgs {
    /// Folder to process (searched recursively)
    #[arg(value_name = "DIR")]
    pub root: PathBuf,

    /// Metadata generation service endpoint
    #[arg(long, value_name = "URL")]
    pub endpoint: String,

    /// Number of worker threads
    #[arg(
        short = 'w',
        long,
        default_value_t = DEFAULT_WORKERS,
        value_name = "NUM"
    )]
    pub workers: usize,

    /// File extension to include (repeatable; defaults to jpg, jpeg, png)
    #[arg(long = "ext", value_name = "EXT", action = clap::ArgAction::Append)]
    pub extensions: Vec<String>,

    /// Generation service timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    pub timeout: u64,

    /// Quiet mode - suppress progress output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (show per-item details)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Validate the engine-facing subset of the arguments
    pub fn batch_config(&self) -> Result<BatchConfig, ConfigError> {
        let extensions = if self.extensions.is_empty() {
            ExtensionFilter::default_images()
        } else {
            ExtensionFilter::new(&self.extensions)?
        };

        BatchConfig::new(self.workers, extensions)
    }

    /// Validate the generation service endpoint
    pub fn endpoint_url(&self) -> Result<String, ConfigError> {
        let endpoint = self.endpoint.trim();
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            Ok(endpoint.to_string())
        } else {
            Err(ConfigError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: "expected an http:// or https:// URL".into(),
            })
        }
    }
}
