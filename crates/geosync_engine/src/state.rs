//! The edit state machine gating session operations.

use crate::error::{EngineError, EngineResult};

/// Where a session is in its offline editing lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditState {
    /// No replica has been generated and attached yet.
    NoLocalReplica,
    /// A loaded replica is attached and no edit is in progress.
    ReadyToSync,
    /// Features are selected and await a commit.
    IsEditing,
}

/// Session operations gated by [`EditState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditAction {
    /// Generate a replica.
    Generate,
    /// Select features near a point.
    Select,
    /// Run a sync pass.
    Sync,
    /// Commit a geometry move of the selection.
    Move,
    /// Commit an attribute update of the selection.
    UpdateAttribute,
}

/// The transition table of the offline editing lifecycle.
///
/// The machine answers whether an action is legal and records the
/// current state; moving between states is driven by the session as
/// operations complete (a generate job attaching its replica, an
/// edit committing). Sync passes do not change state in either
/// direction.
#[derive(Debug)]
pub struct EditStateMachine {
    state: EditState,
}

impl EditStateMachine {
    /// Creates a machine in `NoLocalReplica`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: EditState::NoLocalReplica,
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> EditState {
        self.state
    }

    /// Checks that `action` is legal in the current state.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidStateTransition`] naming the
    /// state and the rejected action. The rejection is synchronous; it
    /// reports a caller bug, never a runtime condition.
    pub fn check(&self, action: EditAction) -> EngineResult<()> {
        if Self::permits(self.state, action) {
            Ok(())
        } else {
            Err(EngineError::InvalidStateTransition {
                from: self.state,
                action,
            })
        }
    }

    /// Moves to `to`, returning the state left behind.
    pub(crate) fn set_state(&mut self, to: EditState) -> EditState {
        std::mem::replace(&mut self.state, to)
    }

    fn permits(state: EditState, action: EditAction) -> bool {
        matches!(
            (state, action),
            (EditState::NoLocalReplica, EditAction::Generate)
                | (EditState::ReadyToSync, EditAction::Select | EditAction::Sync)
                | (EditState::IsEditing, EditAction::Move | EditAction::UpdateAttribute)
        )
    }
}

impl Default for EditStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const ALL_ACTIONS: [EditAction; 5] = [
        EditAction::Generate,
        EditAction::Select,
        EditAction::Sync,
        EditAction::Move,
        EditAction::UpdateAttribute,
    ];

    #[test]
    fn transition_table_is_total() {
        let table = [
            (EditState::NoLocalReplica, vec![EditAction::Generate]),
            (
                EditState::ReadyToSync,
                vec![EditAction::Select, EditAction::Sync],
            ),
            (
                EditState::IsEditing,
                vec![EditAction::Move, EditAction::UpdateAttribute],
            ),
        ];
        for (state, allowed) in table {
            let mut machine = EditStateMachine::new();
            machine.set_state(state);
            for action in ALL_ACTIONS {
                assert_eq!(
                    machine.check(action).is_ok(),
                    allowed.contains(&action),
                    "{state:?} / {action:?}"
                );
            }
        }
    }

    #[test]
    fn violation_names_state_and_action() {
        let machine = EditStateMachine::new();
        let err = machine.check(EditAction::Sync).unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidStateTransition {
                from: EditState::NoLocalReplica,
                action: EditAction::Sync,
            }
        );
        assert_eq!(err.kind(), ErrorKind::InvalidStateTransition);
    }

    #[test]
    fn set_state_returns_previous() {
        let mut machine = EditStateMachine::new();
        assert_eq!(
            machine.set_state(EditState::ReadyToSync),
            EditState::NoLocalReplica
        );
        assert_eq!(machine.state(), EditState::ReadyToSync);
    }
}
