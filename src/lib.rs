//! dotmill - Concurrent Diagram-Tree Renderer
//!
//! A tool that recursively scans a source directory for diagram description
//! files and drives an external converter (Graphviz `dot` by default) to
//! produce a mirrored tree of rendered images. dotmill does not parse the
//! diagram format itself - it is an orchestration layer around the converter
//! process.
//!
//! # Features
//!
//! - **Mirrored Output**: every source file `root/.../name.ext` renders to
//!   `out/.../name.<format>`, with destination directories created on demand.
//!
//! - **Bounded Concurrency**: directory listings run concurrently behind a
//!   semaphore, and conversions run on a fixed worker pool fed by a bounded
//!   job channel, so discovery can never outrun conversion unboundedly.
//!
//! - **No Filtering**: every regular file found is handed to the converter;
//!   non-regular entries (symlinks, sockets, devices) are skipped explicitly.
//!
//! - **Aggregate Reporting**: per-job outcomes are collected into a summary
//!   with an aggregate exit status; `--fail-fast` restores abort-on-first-error.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                       Source tree                          │
//! │                 res/intro/**.dot (etc.)                    │
//! └─────────────────────────────┬──────────────────────────────┘
//!                               │ read_dir + stat
//!                               ▼
//! ┌────────────────────────────────────────────────────────────┐
//! │  Scanner ──► bounded job channel ──► render worker pool    │
//! │                                       │  spawns converter  │
//! │                                       ▼                    │
//! │                              JobOutcome collector          │
//! └─────────────────────────────┬──────────────────────────────┘
//!                               │
//!                               ▼
//! ┌────────────────────────────────────────────────────────────┐
//! │                     Mirrored output tree                   │
//! │                    bin/intro/**.svg (etc.)                 │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```bash
//! # Render res/intro into bin/intro as SVG
//! dotmill res -s intro -o bin
//!
//! # PNG output with 8 workers, stopping on the first failure
//! dotmill diagrams -T png -w 8 --fail-fast
//! ```

pub mod config;
pub mod error;
pub mod job;
pub mod progress;
pub mod render;
pub mod walker;

pub use config::{CliArgs, RenderConfig};
pub use error::{MillError, Result};
pub use job::{DirTask, JobOutcome, RenderJob};
pub use walker::{RenderCoordinator, RenderProgress, RenderResult};
