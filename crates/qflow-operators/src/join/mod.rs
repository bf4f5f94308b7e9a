//! Join operators.
//!
//! Both joins build a lookup over the whole inner sequence before the first
//! outer element is pulled, then look it up once per outer element:
//! `NotStarted -> BuildingInnerLookup -> IteratingOuter -> Completed`.

pub mod group;
pub mod hash;

pub use group::GroupJoin;
pub use hash::HashJoin;

use tracing::trace;

use qflow_core::error::Error;
use qflow_core::id::CursorId;
use qflow_core::state::CursorState;

/// Lifecycle bookkeeping for one join cursor.
#[derive(Debug)]
pub(crate) struct Phase {
    op: &'static str,
    cursor: CursorId,
    state: CursorState,
}

impl Phase {
    pub(crate) fn new(op: &'static str, cursor: CursorId) -> Self {
        Self {
            op,
            cursor,
            state: CursorState::NotStarted,
        }
    }

    pub(crate) fn state(&self) -> CursorState {
        self.state
    }

    pub(crate) fn advance(&mut self, next: CursorState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "{} cursor: {:?} -> {:?}",
            self.op,
            self.state,
            next
        );
        trace!(op = self.op, cursor = %self.cursor, from = ?self.state, to = ?next, "join phase");
        self.state = next;
    }

    /// Record the terminal state matching `err`.
    pub(crate) fn fail(&mut self, err: &Error) {
        let next = if err.is_cancelled() {
            CursorState::Cancelled
        } else {
            CursorState::Faulted
        };
        if !self.state.is_terminal() {
            trace!(
                op = self.op,
                cursor = %self.cursor,
                from = ?self.state,
                to = ?next,
                error = %err,
                "join phase"
            );
            self.state = next;
        }
    }
}
