//! Operator traits + the per-enumeration execution context.
//!
//! The planner lowers every logical node into one of these operators and
//! chains their `execute` calls into a single element stream. `execute` must
//! not pull from its inputs or invoke any selector; all work happens when the
//! returned stream is polled.

use std::sync::Arc;

use qflow_core::cancel::CancellationSignal;
use qflow_core::config::EngineConfig;
use qflow_core::dag::NodeKind;
use qflow_core::id::CursorId;
use qflow_core::source::ElementStream;

/// State shared by every operator cursor of one enumeration.
#[derive(Debug, Clone)]
pub struct ExecContext {
    pub cancel: CancellationSignal,
    pub config: Arc<EngineConfig>,
    pub cursor: CursorId,
}

impl ExecContext {
    pub fn new(cancel: CancellationSignal, config: Arc<EngineConfig>) -> Self {
        Self {
            cancel,
            config,
            cursor: CursorId::next(),
        }
    }

    /// Context with a private signal and default config; handy in tests.
    pub fn detached() -> Self {
        Self::new(CancellationSignal::new(), Arc::new(EngineConfig::default()))
    }
}

/// Single-input operator (filter, select, group_by, aggregate...).
///
/// Invariants:
/// - Selectors run strictly one at a time and in input order.
/// - The output order is a deterministic function of the input order.
pub trait UnaryOperator<I, O>: Send + Sync + 'static {
    /// Human-readable operator name (stable).
    fn name(&self) -> &'static str;

    fn kind(&self) -> NodeKind;

    fn execute(&self, input: ElementStream<I>, ctx: &ExecContext) -> ElementStream<O>;
}

/// Two-input operator (join, group_join). The inner side is fully
/// materialized before the first outer element is pulled.
pub trait BinaryOperator<L, R, O>: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    fn kind(&self) -> NodeKind;

    fn execute(
        &self,
        outer: ElementStream<L>,
        inner: ElementStream<R>,
        ctx: &ExecContext,
    ) -> ElementStream<O>;
}
