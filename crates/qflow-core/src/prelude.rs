//! Convenient re-exports for downstream crates.

pub use crate::cancel::CancellationSignal;
pub use crate::comparer::{Comparer, EqualityComparer};
pub use crate::config::EngineConfig;
pub use crate::dag::{NodeDescriptor, NodeKind, PlanTree, SequenceRef};
pub use crate::error::{BoxError, Error, Result};
pub use crate::id::{CursorId, NodeId};
pub use crate::manifest::EnumerationReport;
pub use crate::source::{
    Element, ElementStream, OnceSource, SequenceSource, StreamSource, VecSource,
};
pub use crate::state::{CursorState, EnumerationState};
