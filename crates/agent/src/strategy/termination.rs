//! Session termination.

use huddle_core::message::MessageLog;
use huddle_core::participant::ParticipantId;

/// Decides whether the dialogue has reached its end.
pub trait TerminationPolicy: Send + Sync {
    fn should_terminate(&self, log: &MessageLog) -> bool;

    /// Participants whose utterances may end the session. Empty means anyone.
    fn terminators(&self) -> Vec<ParticipantId> {
        Vec::new()
    }
}

/// Ends the session when the last utterance contains a completion marker.
///
/// Matching is case-insensitive and looks at the last utterance only. With no
/// authorized terminators configured, any author can end the session.
#[derive(Debug, Clone)]
pub struct MarkerTermination {
    marker: String,
    authorized: Vec<ParticipantId>,
}

impl MarkerTermination {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into().to_lowercase(),
            authorized: Vec::new(),
        }
    }

    /// Only honor the marker when the last author is one of `authorized`.
    pub fn with_authorized(mut self, authorized: Vec<ParticipantId>) -> Self {
        self.authorized = authorized;
        self
    }
}

impl TerminationPolicy for MarkerTermination {
    fn should_terminate(&self, log: &MessageLog) -> bool {
        let Some(last) = log.last() else {
            return false;
        };

        if !self.authorized.is_empty() && !self.authorized.iter().any(|id| last.is_from(id)) {
            return false;
        }

        last.text.to_lowercase().contains(&self.marker)
    }

    fn terminators(&self) -> Vec<ParticipantId> {
        self.authorized.clone()
    }
}
