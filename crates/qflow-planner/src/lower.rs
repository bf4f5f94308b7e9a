//! Lowering: `Query` -> `PhysicalProgram`.
//!
//! Walks the node chain once and binds every node to its execution closure.
//! The engine lowers afresh for each enumeration, so compiled closures are
//! never shared between cursors.

use tracing::debug;

use qflow_core::error::Result;
use qflow_core::hash::hash_serde;
use qflow_core::source::Element;

use crate::physical::PhysicalProgram;
use crate::query::Query;

pub fn lower_to_physical<T: Element>(query: &Query<T>) -> Result<PhysicalProgram<T>> {
    let plan = query.explain();
    let plan_hash = hash_serde(&plan.shape())?;
    let stage = query.node().lower();
    debug!(
        root = %plan.node.id,
        kind = %plan.node.kind,
        nodes = plan.len(),
        plan_hash = %plan_hash,
        "lowered pipeline"
    );
    Ok(PhysicalProgram::new(stage, plan, plan_hash))
}
