#![forbid(unsafe_code)]
//! qflow-planner: fluent pipeline construction and lowering.
//!
//! Design:
//! - `Query<T>` is a persistent handle over an immutable chain of typed
//!   nodes (`logical`). Chaining an operator validates its arguments, wraps
//!   the selectors and appends a node; nothing is evaluated.
//! - `ops` holds the operator entry points with the pipeline handle as an
//!   explicit, possibly absent, first argument.
//! - `lower` compiles a chain into a `PhysicalProgram` (bound execution
//!   closure + plan description + plan hash) once per enumeration.
//! - `dsl::yaml` builds `Query<serde_json::Value>` pipelines from YAML.
//!
//! NOTE: there is no optimizer; plans execute exactly as they were chained.

pub mod dsl;
pub mod logical;
pub mod lower;
pub mod ops;
pub mod physical;
pub mod query;

pub use dsl::yaml::{parse_yaml_pipeline, DslError, ParsedPipeline};
pub use logical::{LogicalNode, NodeRef};
pub use lower::lower_to_physical;
pub use physical::{PhysicalProgram, Stage};
pub use query::Query;
