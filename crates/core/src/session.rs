//! Dialogue session states.
//!
//! ```text
//! Idle → Running → Terminated
//!                → MaxIterationsReached
//!                → Error
//! ```
//!
//! A rate-limited turn stays in `Running`; the three right-hand states are
//! terminal for one input unit, after which the driver is back to `Idle`.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogueState {
    /// Waiting for the next input unit.
    Idle,
    /// Participants are taking turns.
    Running,
    /// The termination policy fired.
    Terminated,
    /// The turn ceiling was hit without a termination signal.
    MaxIterationsReached,
    /// A non-recoverable generation error aborted the unit.
    Error,
}

impl DialogueState {
    /// Whether this state ends the processing of an input unit.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Terminated | Self::MaxIterationsReached | Self::Error
        )
    }

    /// Legal edges of the session state graph.
    pub fn can_transition_to(self, to: DialogueState) -> bool {
        use DialogueState::*;
        matches!(
            (self, to),
            (Idle, Running)
                | (Running, Terminated)
                | (Running, MaxIterationsReached)
                | (Running, Error)
        ) || (self.is_terminal() && to == Idle)
    }
}

impl fmt::Display for DialogueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "IDLE"),
            Self::Running => write!(f, "RUNNING"),
            Self::Terminated => write!(f, "TERMINATED"),
            Self::MaxIterationsReached => write!(f, "MAX_ITERATIONS_REACHED"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}
