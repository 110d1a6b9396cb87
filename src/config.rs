//! Configuration types for dotmill
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation

use crate::error::ConfigError;
use clap::Parser;
use regex::Regex;
use std::path::PathBuf;

/// Maximum reasonable worker count
const MAX_WORKERS: usize = 512;

/// Minimum job queue size
const MIN_QUEUE_SIZE: usize = 16;

/// Renders a tree of diagram description files into a mirrored tree of images
#[derive(Parser, Debug, Clone)]
#[command(
    name = "dotmill",
    version,
    about = "Renders a tree of diagram description files into a mirrored image tree",
    long_about = "Recursively scans a source directory for diagram description files and\n\
                  invokes an external converter (Graphviz dot by default) for each one,\n\
                  writing the rendered images into a mirrored destination tree.\n\n\
                  Every regular file found is handed to the converter - no extension\n\
                  filtering is applied.",
    after_help = "EXAMPLES:\n    \
        dotmill res -o bin -s intro\n    \
        dotmill diagrams -o site/img -T png -w 8\n    \
        dotmill res --converter /usr/local/bin/dot --fail-fast\n    \
        dotmill res --exclude '\\.drafts' --max-depth 4"
)]
pub struct CliArgs {
    /// Source tree root containing diagram description files
    #[arg(value_name = "SOURCE_ROOT", default_value = "res")]
    pub source_root: PathBuf,

    /// Destination root for rendered images
    #[arg(short = 'o', long, default_value = "bin", value_name = "DIR")]
    pub output: PathBuf,

    /// Subdirectory of the source root to scan (default: the whole root)
    #[arg(short = 's', long, value_name = "NAME")]
    pub subdir: Option<PathBuf>,

    /// External converter binary
    #[arg(short = 'c', long, default_value = "dot", value_name = "BIN")]
    pub converter: PathBuf,

    /// Output format passed to the converter (doubles as the output extension)
    #[arg(short = 'T', long, default_value = "svg", value_name = "FMT")]
    pub format: String,

    /// Number of render workers
    #[arg(
        short = 'w',
        long,
        default_value_t = default_workers(),
        value_name = "NUM"
    )]
    pub workers: usize,

    /// Render job queue capacity (bounds discovery ahead of conversion)
    #[arg(long, default_value = "1024", value_name = "NUM")]
    pub queue_size: usize,

    /// Maximum directory depth (unlimited if not set)
    #[arg(short = 'd', long, value_name = "NUM")]
    pub max_depth: Option<usize>,

    /// Exclude relative paths matching pattern (can be repeated)
    #[arg(long = "exclude", value_name = "PATTERN", action = clap::ArgAction::Append)]
    pub exclude_patterns: Vec<String>,

    /// Abort the whole run on the first failure
    #[arg(long)]
    pub fail_fast: bool,

    /// Quiet mode - suppress progress output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

fn default_workers() -> usize {
    // Conversion is dominated by external process I/O, so go past core count
    num_cpus::get() * 2
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Source tree root
    pub source_root: PathBuf,

    /// Destination tree root
    pub dest_root: PathBuf,

    /// Subdirectory of the source root to scan (empty = whole root)
    pub subdir: PathBuf,

    /// Converter binary
    pub converter: PathBuf,

    /// Output format / extension (no leading dot)
    pub format: String,

    /// Number of render workers
    pub worker_count: usize,

    /// Job queue capacity
    pub queue_size: usize,

    /// Maximum traversal depth
    pub max_depth: Option<usize>,

    /// Compiled exclude patterns, matched against relative paths
    pub exclude_patterns: Vec<Regex>,

    /// Abort on first failure instead of collecting a summary
    pub fail_fast: bool,

    /// Show progress indicator
    pub show_progress: bool,

    /// Verbose logging
    pub verbose: bool,
}

impl RenderConfig {
    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        // Validate worker count
        if args.workers == 0 || args.workers > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: args.workers,
                max: MAX_WORKERS,
            });
        }

        // Validate queue size
        if args.queue_size < MIN_QUEUE_SIZE {
            return Err(ConfigError::InvalidQueueSize {
                size: args.queue_size,
                min: MIN_QUEUE_SIZE,
            });
        }

        // Normalize the format: accept "svg" and ".svg" alike
        let format = args.format.trim_start_matches('.').to_string();
        if format.is_empty() || format.contains(std::path::MAIN_SEPARATOR) {
            return Err(ConfigError::InvalidFormat {
                format: args.format,
            });
        }

        // Compile exclude patterns
        let exclude_patterns = args
            .exclude_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| ConfigError::InvalidExcludePattern {
                    pattern: p.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let subdir = args.subdir.unwrap_or_default();

        let config = Self {
            source_root: args.source_root,
            dest_root: args.output,
            subdir,
            converter: args.converter,
            format,
            worker_count: args.workers,
            queue_size: args.queue_size,
            max_depth: args.max_depth,
            exclude_patterns,
            fail_fast: args.fail_fast,
            show_progress: !args.quiet,
            verbose: args.verbose,
        };

        // The scan root must exist up front; the destination tree is created
        // lazily as jobs render into it.
        let scan_root = config.scan_root();
        if !scan_root.is_dir() {
            return Err(ConfigError::SourceRootMissing { path: scan_root });
        }

        Ok(config)
    }

    /// Root directory the scanner enumerates
    pub fn scan_root(&self) -> PathBuf {
        self.source_root.join(&self.subdir)
    }

    /// Root of the mirrored destination tree
    ///
    /// Keeps the scanned subdirectory in the output layout, so scanning
    /// `res/intro` renders into `bin/intro`.
    pub fn mirror_root(&self) -> PathBuf {
        self.dest_root.join(&self.subdir)
    }

    /// Check if a relative path should be excluded from the scan
    pub fn is_excluded(&self, rel_path: &str) -> bool {
        self.exclude_patterns.iter().any(|re| re.is_match(rel_path))
    }
}

#[cfg(test)]
pub(crate) fn test_config(source_root: &std::path::Path, dest_root: &std::path::Path) -> RenderConfig {
    RenderConfig {
        source_root: source_root.to_path_buf(),
        dest_root: dest_root.to_path_buf(),
        subdir: PathBuf::new(),
        converter: PathBuf::from("dot"),
        format: "svg".into(),
        worker_count: 2,
        queue_size: 64,
        max_depth: None,
        exclude_patterns: Vec::new(),
        fail_fast: false,
        show_progress: false,
        verbose: false,
    }
}
