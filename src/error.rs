//! Error types for dotmill
//!
//! This module defines the error hierarchy that covers:
//! - Directory enumeration and status-query errors
//! - Converter process errors
//! - Configuration and CLI errors
//! - Worker task errors
//!
//! Design philosophy:
//! - Use thiserror for structured error types in library code
//! - Errors should be actionable - include the path and the underlying cause
//! - Preserve error chains for debugging

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Top-level error type for the dotmill application
#[derive(Error, Debug)]
pub enum MillError {
    /// Tree traversal errors
    #[error("Walk error: {0}")]
    Walk(#[from] WalkError),

    /// Converter invocation errors
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Worker/concurrency errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Interrupted by signal
    #[error("Operation interrupted by signal")]
    Interrupted,

    /// Channel closed unexpectedly
    #[error("Channel closed unexpectedly")]
    ChannelClosed,

    /// Fail-fast mode stopped the run after the first failure
    #[error("Run aborted after failure on '{path}': {reason}")]
    Aborted { path: PathBuf, reason: String },
}

/// Directory enumeration and status-query errors
#[derive(Error, Debug)]
pub enum WalkError {
    /// Directory listing failed
    #[error("Failed to read directory '{path}': {source}")]
    ReadDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Status query for an entry failed (vanished, permission, I/O)
    #[error("Failed to stat '{path}': {source}")]
    StatFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Converter process errors
#[derive(Error, Debug)]
pub enum RenderError {
    /// The converter binary could not be started
    #[error("Failed to spawn converter '{converter}': {source}")]
    SpawnFailed {
        converter: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The converter ran but exited non-zero
    #[error("Converter failed on '{path}' ({status}): {stderr}")]
    ConverterFailed {
        path: PathBuf,
        status: ExitStatus,
        stderr: String,
    },

    /// The mirrored output directory could not be created
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid worker count
    #[error("Invalid worker count {count}: must be between 1 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },

    /// Invalid queue size
    #[error("Invalid queue size {size}: must be at least {min}")]
    InvalidQueueSize { size: usize, min: usize },

    /// The scan root does not exist or is not a directory
    #[error("Source directory '{path}' does not exist or is not a directory")]
    SourceRootMissing { path: PathBuf },

    /// Empty or malformed output format
    #[error("Invalid output format '{format}'")]
    InvalidFormat { format: String },

    /// Invalid exclude pattern
    #[error("Invalid exclude pattern '{pattern}': {reason}")]
    InvalidExcludePattern { pattern: String, reason: String },
}

/// Worker task errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Worker panicked
    #[error("Worker {id} panicked: {message}")]
    Panicked { id: usize, message: String },

    /// Result channel closed
    #[error("Result channel closed unexpectedly")]
    ResultChannelClosed,
}

/// Result type alias for MillError
pub type Result<T> = std::result::Result<T, MillError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let walk_err = WalkError::ReadDirFailed {
            path: "/missing".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        let mill_err: MillError = walk_err.into();
        assert!(matches!(mill_err, MillError::Walk(_)));

        let cfg_err = ConfigError::InvalidWorkerCount { count: 0, max: 512 };
        let mill_err: MillError = cfg_err.into();
        assert!(matches!(mill_err, MillError::Config(_)));
    }

    #[test]
    fn test_error_display_includes_path() {
        let err = WalkError::StatFailed {
            path: "/data/a.dot".into(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(err.to_string().contains("/data/a.dot"));
    }
}
