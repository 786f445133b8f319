//! The group chat: the heart of Huddle.
//!
//! Two participants take turns over a shared message log:
//!
//! 1. **Receive** an input unit (a log file path) as a user utterance
//! 2. **Select** the next speaker from the last utterance
//! 3. **Generate** the speaker's utterance, letting it call its own tools
//! 4. **Check** whether the last utterance ends the session
//!
//! The loop continues until the termination policy fires, the turn ceiling
//! is reached or generation fails for a reason other than rate limiting.

pub mod driver;
pub mod generator;
pub mod instructions;
pub mod source;
pub mod strategy;
pub mod team;

#[cfg(test)]
mod test_helpers;

pub use driver::{DialogueDriver, SessionOutcome};
pub use generator::{Generator, ProviderGenerator};
pub use source::{DirectorySource, InputSource, stage_samples};
pub use strategy::{AlternatingSelection, MarkerTermination, SelectionPolicy, TerminationPolicy};
pub use team::incident_response_chat;
