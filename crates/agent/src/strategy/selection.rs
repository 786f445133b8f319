//! Speaker selection.

use huddle_core::error::DialogueError;
use huddle_core::message::{AuthorRole, MessageLog};
use huddle_core::participant::{Participant, ParticipantId};

/// Decides which participant speaks next.
pub trait SelectionPolicy: Send + Sync {
    /// Pick the next speaker from `participants` given the log so far.
    ///
    /// `Ok(None)` means the rule picked a participant that is not registered;
    /// callers treat that as a configuration error. An empty log is rejected.
    fn select_next(
        &self,
        participants: &[Participant],
        log: &MessageLog,
    ) -> Result<Option<Participant>, DialogueError>;

    /// Participant ids the rule table can return, checked once at startup.
    fn targets(&self) -> Vec<ParticipantId> {
        Vec::new()
    }
}

/// Two-party rule table keyed on the last utterance:
///
/// | last author     | next     |
/// |-----------------|----------|
/// | user            | `first`  |
/// | `second`        | `first`  |
/// | anything else   | `second` |
#[derive(Debug, Clone)]
pub struct AlternatingSelection {
    first: ParticipantId,
    second: ParticipantId,
}

impl AlternatingSelection {
    pub fn new(first: ParticipantId, second: ParticipantId) -> Self {
        Self { first, second }
    }

    fn target_for(&self, log: &MessageLog) -> Result<&ParticipantId, DialogueError> {
        let last = log.last().ok_or(DialogueError::EmptyLog)?;
        if last.role == AuthorRole::User || last.is_from(&self.second) {
            Ok(&self.first)
        } else {
            Ok(&self.second)
        }
    }
}

impl SelectionPolicy for AlternatingSelection {
    fn select_next(
        &self,
        participants: &[Participant],
        log: &MessageLog,
    ) -> Result<Option<Participant>, DialogueError> {
        let target = self.target_for(log)?;
        Ok(participants.iter().find(|p| &p.id == target).cloned())
    }

    fn targets(&self) -> Vec<ParticipantId> {
        vec![self.first.clone(), self.second.clone()]
    }
}
