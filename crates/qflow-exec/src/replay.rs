//! Repeatability checks.
//!
//! A pipeline is immutable, so two enumerations over restartable sources
//! must yield the same elements in the same order. `verify_repeatable` runs
//! two independent enumerations and compares plan hash and output digest.

use serde::Serialize;

use qflow_core::cancel::CancellationSignal;
use qflow_core::error::{Error, Result};
use qflow_core::hash::{hash_serde, Hash256};
use qflow_core::source::Element;
use qflow_planner::Query;

use crate::runtime::Engine;

/// Digest of an ordered output sequence.
pub fn hash_outputs<T: Serialize>(items: &[T]) -> Result<Hash256> {
    hash_serde(&items)
}

/// Enumerate `query` twice and return the shared output digest.
pub async fn verify_repeatable<T: Element + Serialize>(
    engine: &Engine,
    query: &Query<T>,
    cancel: &CancellationSignal,
) -> Result<Hash256> {
    let (_, first) = engine.run(query, cancel).await?;
    let (_, second) = engine.run(query, cancel).await?;

    if first.cursor == second.cursor {
        return Err(Error::Invariant("enumerations shared a cursor".into()));
    }
    if first.plan_hash != second.plan_hash {
        return Err(Error::Invariant(format!(
            "plan hash changed between enumerations: {} vs {}",
            first.plan_hash, second.plan_hash
        )));
    }
    match (first.outputs_digest, second.outputs_digest) {
        (Some(a), Some(b)) if a == b => Ok(a),
        (a, b) => Err(Error::Invariant(format!(
            "enumerations diverged: {:?} vs {:?} ({} vs {} rows)",
            a.map(|h| h.to_hex()),
            b.map(|h| h.to_hex()),
            first.rows_yielded,
            second.rows_yielded
        ))),
    }
}
