//! Physical program: the bound execution closure of a pipeline plus the plan
//! it was compiled from.
//!
//! A program is produced fresh for every enumeration; `open` wires the
//! operator cursors together against one `ExecContext` without pulling.

use std::fmt;
use std::sync::Arc;

use qflow_core::dag::PlanTree;
use qflow_core::error::Result;
use qflow_core::hash::Hash256;
use qflow_core::source::ElementStream;
use qflow_operators::traits::ExecContext;

/// Compiled form of one node and everything beneath it.
pub type Stage<T> = Arc<dyn Fn(&ExecContext) -> Result<ElementStream<T>> + Send + Sync>;

pub struct PhysicalProgram<T> {
    pub stage: Stage<T>,
    pub plan: PlanTree,
    /// Hash of the plan shape; node ids are excluded.
    pub plan_hash: Hash256,
}

impl<T> PhysicalProgram<T> {
    pub fn new(stage: Stage<T>, plan: PlanTree, plan_hash: Hash256) -> Self {
        Self {
            stage,
            plan,
            plan_hash,
        }
    }

    pub fn open(&self, ctx: &ExecContext) -> Result<ElementStream<T>> {
        (self.stage)(ctx)
    }
}

impl<T> Clone for PhysicalProgram<T> {
    fn clone(&self) -> Self {
        Self {
            stage: Arc::clone(&self.stage),
            plan: self.plan.clone(),
            plan_hash: self.plan_hash,
        }
    }
}

impl<T> fmt::Debug for PhysicalProgram<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhysicalProgram")
            .field("plan", &self.plan)
            .field("plan_hash", &self.plan_hash.to_hex())
            .finish_non_exhaustive()
    }
}
