//! # autodev
//!
//! Autonomous improvement worker for Roblox game projects written in Lua.
//!
//! The crate finds work, asks several code generation backends for candidate
//! implementations, keeps the best one that passes validation, and records
//! every attempt.
//!
//! ## Architecture
//!
//! ```text
//!   TaskSource ──► prioritize ──► Developer ──────────────────────────────┐
//!  (scanner or                     │ plan       (completion LLM)          │
//!   task queue)                    │ generate   (pattern coder, hosted    │
//!                                  │             inference, LLM)          │
//!                                  │ select     (quality × confidence)    │
//!                                  │ validate                             │
//!                                  └ save/learn/log ──► generated_features/
//!                                                       autonomous_dev.log
//! ```
//!
//! ## Modules
//! - `source`: task sources (Lua scanner, JSON task queue)
//! - `task`: task model and prioritization
//! - `backend`: generation backends behind traits, with HTTP clients
//! - `pipeline`: candidate generation, selection, validation and persistence
//! - `worker`: improvement loop, queue worker and its status
//! - `api`: HTTP control surface for the queue worker
//! - `setup`, `train`: one-shot backend preparation

pub mod api;
pub mod backend;
pub mod config;
pub mod pipeline;
pub mod setup;
pub mod source;
pub mod task;
pub mod train;
pub mod util;
pub mod worker;

pub use config::Config;
pub use task::{Severity, Task, TaskKind};
