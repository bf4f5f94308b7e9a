//! Execution-cursor state machines.
//!
//! `CursorState` is the per-join lifecycle:
//! `NotStarted -> BuildingInnerLookup -> IteratingOuter -> Completed`, with
//! `Faulted` reachable from the two working states and `Cancelled` from any
//! non-terminal state. `EnumerationState` is the coarser lifecycle of a whole
//! enumeration as seen by its caller.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorState {
    NotStarted,
    BuildingInnerLookup,
    IteratingOuter,
    Completed,
    Faulted,
    Cancelled,
}

impl CursorState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CursorState::Completed | CursorState::Faulted | CursorState::Cancelled
        )
    }

    pub fn can_transition_to(self, next: CursorState) -> bool {
        use CursorState::*;
        match (self, next) {
            (NotStarted, BuildingInnerLookup) => true,
            (BuildingInnerLookup, IteratingOuter) => true,
            (IteratingOuter, Completed) => true,
            (BuildingInnerLookup | IteratingOuter, Faulted) => true,
            (s, Cancelled) => !s.is_terminal(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumerationState {
    Pending,
    Streaming,
    Completed,
    Faulted,
    Cancelled,
}

impl EnumerationState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            EnumerationState::Completed | EnumerationState::Faulted | EnumerationState::Cancelled
        )
    }
}

#[cfg(test)]
mod tests {
    use super::CursorState::*;

    #[test]
    fn join_lifecycle_transitions() {
        assert!(NotStarted.can_transition_to(BuildingInnerLookup));
        assert!(BuildingInnerLookup.can_transition_to(IteratingOuter));
        assert!(IteratingOuter.can_transition_to(Completed));
        assert!(!NotStarted.can_transition_to(IteratingOuter));
        assert!(!NotStarted.can_transition_to(Faulted));
    }

    #[test]
    fn terminal_states_absorb() {
        for t in [Completed, Faulted, Cancelled] {
            assert!(t.is_terminal());
            let all = [
                NotStarted,
                BuildingInnerLookup,
                IteratingOuter,
                Completed,
                Faulted,
                Cancelled,
            ];
            for next in all {
                assert!(!t.can_transition_to(next), "{t:?} -> {next:?}");
            }
        }
        assert!(NotStarted.can_transition_to(Cancelled));
    }
}
