//! Work item types shared between the scanner and the render workers.
//!
//! A [`DirTask`] is one directory awaiting enumeration; a [`RenderJob`] is one
//! file awaiting conversion. Both carry paths relative to the scan root so the
//! destination tree can mirror the source tree exactly.

use crate::error::MillError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// A directory awaiting enumeration, relative to the scan root
#[derive(Debug, Clone)]
pub struct DirTask {
    /// Path relative to the scan root (empty for the root itself)
    pub rel_path: PathBuf,

    /// Depth from root (0 = root)
    pub depth: usize,
}

impl DirTask {
    /// Create a new directory task
    pub fn new(rel_path: PathBuf, depth: usize) -> Self {
        Self { rel_path, depth }
    }

    /// Create the root task
    pub fn root() -> Self {
        Self {
            rel_path: PathBuf::new(),
            depth: 0,
        }
    }
}

/// One file to convert
///
/// Derived 1:1 from a regular-file entry. Jobs are immutable and independent;
/// the destination path is a pure function of the source path, so no two jobs
/// ever write to the same output file.
#[derive(Debug, Clone)]
pub struct RenderJob {
    /// Directory containing the file, relative to the scan root
    pub rel_dir: PathBuf,

    /// File name within `rel_dir`
    pub file_name: OsString,

    /// Source file size in bytes, from the discovery stat
    pub size: u64,
}

impl RenderJob {
    /// Create a new render job
    pub fn new(rel_dir: PathBuf, file_name: OsString, size: u64) -> Self {
        Self {
            rel_dir,
            file_name,
            size,
        }
    }

    /// Path of the source file relative to the scan root
    pub fn rel_path(&self) -> PathBuf {
        self.rel_dir.join(&self.file_name)
    }

    /// Absolute source path under the scan root
    pub fn source_path(&self, scan_root: &Path) -> PathBuf {
        scan_root.join(&self.rel_dir).join(&self.file_name)
    }

    /// Mirrored destination path with the extension swapped for `format`
    ///
    /// `intro/sub/b.dot` renders to `<mirror_root>/intro/sub/b.svg`. A file
    /// without an extension keeps its whole name as the stem.
    pub fn dest_path(&self, mirror_root: &Path, format: &str) -> PathBuf {
        let name = Path::new(&self.file_name);
        let stem = name.file_stem().unwrap_or(name.as_os_str());

        let mut out_name = stem.to_os_string();
        out_name.push(".");
        out_name.push(format);

        mirror_root.join(&self.rel_dir).join(out_name)
    }
}

/// Outcome of a single job, collected into the run summary
#[derive(Debug)]
pub enum JobOutcome {
    /// Converted successfully; stderr holds any converter diagnostics
    Rendered { path: PathBuf, stderr: String },

    /// Entry was not a regular file, or was excluded
    Skipped { path: PathBuf, reason: String },

    /// Conversion or enumeration failed
    Failed { path: PathBuf, error: MillError },
}

impl JobOutcome {
    /// Returns true if this outcome represents success
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Rendered { .. })
    }

    /// Returns the path associated with this outcome
    pub fn path(&self) -> &Path {
        match self {
            JobOutcome::Rendered { path, .. } => path,
            JobOutcome::Skipped { path, .. } => path,
            JobOutcome::Failed { path, .. } => path,
        }
    }
}
