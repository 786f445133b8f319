//! Message and dialogue domain types.
//!
//! Two layers live here:
//! - [`Utterance`] and [`MessageLog`]: what the group chat sees. One utterance
//!   per turn, tagged with who said it.
//! - [`Message`]: what a provider sees. Roles are the LLM roles (system, user,
//!   assistant, tool) and tool calls are carried inline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::participant::ParticipantId;

/// Author name used for utterances submitted by the user (input units).
pub const USER_AUTHOR: &str = "user";

/// Unique identifier for a dialogue session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether an utterance came from the user or from a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorRole {
    User,
    Participant,
}

/// One role-tagged message in a dialogue log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub id: String,

    /// Participant id, or [`USER_AUTHOR`] for user input.
    pub author: String,

    pub role: AuthorRole,

    pub text: String,

    pub timestamp: DateTime<Utc>,
}

impl Utterance {
    /// Create a user-authored utterance.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            author: USER_AUTHOR.to_string(),
            role: AuthorRole::User,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create an utterance spoken by a participant.
    pub fn from_participant(author: &ParticipantId, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            author: author.to_string(),
            role: AuthorRole::Participant,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// True if this utterance was spoken by the given participant.
    pub fn is_from(&self, participant: &ParticipantId) -> bool {
        self.role == AuthorRole::Participant && self.author == participant.as_str()
    }
}

/// An append-only, ordered sequence of utterances for one dialogue session.
///
/// Insertion order is significant: "last" is what the selection and
/// termination policies look at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageLog {
    pub session_id: SessionId,

    utterances: Vec<Utterance>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl MessageLog {
    /// Create a new empty log with a fresh session id.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            session_id: SessionId::new(),
            utterances: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append an utterance.
    pub fn push(&mut self, utterance: Utterance) {
        self.updated_at = Utc::now();
        self.utterances.push(utterance);
    }

    /// The most recent utterance, if any.
    pub fn last(&self) -> Option<&Utterance> {
        self.utterances.last()
    }

    pub fn len(&self) -> usize {
        self.utterances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utterances.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Utterance> {
        self.utterances.iter()
    }

    pub fn as_slice(&self) -> &[Utterance] {
        &self.utterances
    }

    /// Drop every utterance and start a new session.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a MessageLog {
    type Item = &'a Utterance;
    type IntoIter = std::slice::Iter<'a, Utterance>;

    fn into_iter(self) -> Self::IntoIter {
        self.utterances.iter()
    }
}

/// The role of a message sender in a provider request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user (and, from one participant's view, the other participants)
    User,
    /// The model being asked to speak
    Assistant,
    /// System instructions
    System,
    /// Tool execution result
    Tool,
}

/// A single message in a provider conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,

    pub role: Role,

    pub content: String,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<MessageToolCall>,

    /// If this is a tool result, which tool call it responds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    /// Create a tool result message.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        let mut msg = Self::with_role(Role::Tool, content);
        msg.tool_call_id = Some(tool_call_id.into());
        msg
    }
}

/// A tool call embedded in an assistant message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageToolCall {
    /// Unique ID for this tool call
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments as JSON string
    pub arguments: String,
}
