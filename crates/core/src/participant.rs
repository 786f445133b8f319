//! Participants: the named roles allowed to speak in a dialogue session.

use serde::{Deserialize, Serialize};

/// Stable identifier of a participant (e.g. `INCIDENT_MANAGER`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named role in the group chat. Fixed for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub display_name: String,
}

impl Participant {
    pub fn new(id: &str, display_name: impl Into<String>) -> Self {
        Self {
            id: ParticipantId::from(id),
            display_name: display_name.into(),
        }
    }
}
