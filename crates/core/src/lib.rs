//! # Huddle Core
//!
//! Domain types, traits, and error definitions for the Huddle multi-agent
//! runtime. Every other crate in the workspace depends inward on this one.
//!
//! ## Design Philosophy
//!
//! Each external collaborator (LLM backend, tool) is a trait here and the
//! implementations live in their own crates. The dialogue types (`Utterance`,
//! `MessageLog`, `Participant`) are plain values so the arbitration policies
//! built on top of them stay pure and easy to test.

pub mod error;
pub mod event;
pub mod message;
pub mod participant;
pub mod provider;
pub mod session;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{DialogueError, Error, ProviderError, Result, ToolError};
pub use event::{DomainEvent, EventBus};
pub use message::{AuthorRole, Message, MessageLog, Role, SessionId, Utterance, USER_AUTHOR};
pub use participant::{Participant, ParticipantId};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use session::DialogueState;
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult};
