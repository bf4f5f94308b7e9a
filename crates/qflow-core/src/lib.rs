#![forbid(unsafe_code)]
//! qflow-core: shared kernel for the qflow query adapter.
//!
//! This crate contains only *pure* types, small helpers, and interfaces
//! (traits) that other crates implement. There is **no runtime** and **no
//! I/O** here; the only async surface is the `Stream` type sources return.
//!
//! Crates that use this:
//! - qflow-operators: normalizes callbacks and implements per-kind cursors.
//! - qflow-planner: builds `Query` handles and lowers them to physical programs.
//! - qflow-exec: drives enumerations and emits `EnumerationReport`s.

pub mod cancel;
pub mod comparer;
pub mod config;
pub mod dag;
pub mod error;
pub mod hash;
pub mod id;
pub mod manifest;
pub mod prelude;
pub mod source;
pub mod state;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
