//! Domain event system: decoupled observation of a running group chat.
//!
//! The dialogue driver publishes events as turns happen. The CLI subscribes
//! to print utterances live; tests subscribe to assert on ordering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::session::DialogueState;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A new input unit was appended and the session started running
    UnitStarted {
        unit: String,
        session_id: String,
        timestamp: DateTime<Utc>,
    },

    /// A participant finished its turn
    UtteranceAppended {
        session_id: String,
        turn: u32,
        author: String,
        text: String,
        timestamp: DateTime<Utc>,
    },

    /// The model generated a response (one per provider round-trip)
    ResponseGenerated {
        speaker: String,
        model: String,
        tokens_used: u32,
        timestamp: DateTime<Utc>,
    },

    /// A tool was executed during generation
    ToolExecuted {
        speaker: String,
        tool_name: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// The generation service throttled us; the same turn will be retried
    RateLimited {
        session_id: String,
        turn: u32,
        backoff_secs: u64,
        timestamp: DateTime<Utc>,
    },

    /// An input unit reached a terminal state
    SessionFinished {
        unit: String,
        session_id: String,
        state: DialogueState,
        turns: u32,
        timestamp: DateTime<Utc>,
    },

    /// An error occurred
    ErrorOccurred {
        context: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
