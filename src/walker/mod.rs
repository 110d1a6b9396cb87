//! Concurrent tree scan and render orchestration
//!
//! # Architecture
//!
//! ```text
//!                  ┌──────────────────────────┐
//!                  │        Scanner           │
//!                  │  concurrent read_dir     │
//!                  │  (semaphore-bounded)     │
//!                  └────────────┬─────────────┘
//!                               │ RenderJob
//!                               ▼
//!                  ┌──────────────────────────┐
//!                  │   Job channel (bounded)  │
//!                  └────────────┬─────────────┘
//!        ┌──────────────────────┼──────────────────────┐
//!        │                      │                      │
//!  ┌─────▼─────┐          ┌─────▼─────┐          ┌─────▼─────┐
//!  │  Worker 1 │          │  Worker 2 │          │  Worker N │
//!  │ converter │          │ converter │          │ converter │
//!  │  process  │          │  process  │          │  process  │
//!  └─────┬─────┘          └─────┬─────┘          └─────┬─────┘
//!        │                      │                      │
//!        └──────────► JobOutcome collector ◄───────────┘
//! ```

pub mod coordinator;
pub mod scanner;
pub mod worker;

pub use coordinator::{
    JobFailure, RenderCoordinator, RenderProgress, RenderResult, RenderStats,
};
pub use scanner::Scanner;
pub use worker::Worker;
