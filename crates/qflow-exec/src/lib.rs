#![forbid(unsafe_code)]
//! qflow-exec: enumeration runtime, result cursors, replay checks and metrics.
//!
//! The engine lowers a `Query` afresh for every enumeration and hands back a
//! lazily-opened `ResultStream`; `run` additionally produces an
//! `EnumerationReport` for provenance.

pub mod cursor;
pub mod metrics;
pub mod replay;
pub mod runtime;

pub use cursor::ResultStream;
pub use runtime::Engine;
