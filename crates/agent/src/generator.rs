//! Utterance generation: one participant's turn.
//!
//! A turn is a small Act-Observe loop. The speaker's instructions and the
//! whole message log go to the model; if it asks for tools they run against
//! the speaker's own registry and the results go back, until the model
//! answers in plain text.

use async_trait::async_trait;
use huddle_core::error::ProviderError;
use huddle_core::event::{DomainEvent, EventBus};
use huddle_core::message::{Message, MessageLog, Utterance};
use huddle_core::participant::{Participant, ParticipantId};
use huddle_core::provider::{Provider, ProviderRequest};
use huddle_core::tool::{ToolCall, ToolRegistry};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Text returned when a speaker keeps calling tools past the limit.
pub const TOOL_LIMIT_REPLY: &str =
    "I've reached the maximum number of tool call iterations for this turn.";

/// Produces the next utterance for a speaker.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        speaker: &Participant,
        log: &MessageLog,
    ) -> Result<Utterance, ProviderError>;
}

/// What a participant brings to its turns.
struct Profile {
    instructions: String,
    tools: Arc<ToolRegistry>,
}

/// A [`Generator`] backed by a chat completion [`Provider`].
pub struct ProviderGenerator {
    /// The LLM provider to use
    provider: Arc<dyn Provider>,

    /// The model (or deployment) to use
    model: String,

    temperature: f32,

    max_tokens: Option<u32>,

    /// Instructions and tools, per participant
    profiles: HashMap<ParticipantId, Profile>,

    /// Maximum tool round-trips per turn
    max_tool_iterations: u32,

    event_bus: Arc<EventBus>,
}

impl ProviderGenerator {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            profiles: HashMap::new(),
            max_tool_iterations: 8,
            event_bus,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_max_tool_iterations(mut self, max: u32) -> Self {
        self.max_tool_iterations = max;
        self
    }

    /// Bind instructions and a tool set to a participant.
    pub fn with_participant(
        mut self,
        id: &ParticipantId,
        instructions: impl Into<String>,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        self.profiles.insert(
            id.clone(),
            Profile {
                instructions: instructions.into(),
                tools,
            },
        );
        self
    }

    /// The log as seen by `speaker`: its own utterances are the assistant's,
    /// everything else (user and other participants) is input.
    fn conversation_for(speaker: &ParticipantId, instructions: &str, log: &MessageLog) -> Vec<Message> {
        let mut messages = Vec::with_capacity(log.len() + 1);
        messages.push(Message::system(instructions));
        for utterance in log {
            if utterance.is_from(speaker) {
                messages.push(Message::assistant(&utterance.text));
            } else {
                messages.push(Message::user(&utterance.text));
            }
        }
        messages
    }
}

#[async_trait]
impl Generator for ProviderGenerator {
    async fn generate(
        &self,
        speaker: &Participant,
        log: &MessageLog,
    ) -> Result<Utterance, ProviderError> {
        let profile = self.profiles.get(&speaker.id).ok_or_else(|| {
            ProviderError::NotConfigured(format!("no instructions for participant {}", speaker.id))
        })?;

        info!(
            speaker = %speaker.id,
            session_id = %log.session_id,
            messages = log.len(),
            "Generating utterance"
        );

        let mut conversation = Self::conversation_for(&speaker.id, &profile.instructions, log);
        let tool_definitions = profile.tools.definitions();
        let mut iteration = 0;

        loop {
            iteration += 1;

            if iteration > self.max_tool_iterations {
                warn!(
                    speaker = %speaker.id,
                    iterations = iteration,
                    "Max tool iterations reached, forcing text response"
                );
                break;
            }

            debug!(speaker = %speaker.id, iteration, "Generation iteration");

            let request = ProviderRequest {
                model: self.model.clone(),
                messages: conversation.clone(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                tools: tool_definitions.clone(),
            };

            let response = self.provider.complete(request).await?;

            if let Some(usage) = &response.usage {
                self.event_bus.publish(DomainEvent::ResponseGenerated {
                    speaker: speaker.id.to_string(),
                    model: response.model.clone(),
                    tokens_used: usage.total_tokens,
                    timestamp: chrono::Utc::now(),
                });
            }

            if response.message.tool_calls.is_empty() {
                return Ok(Utterance::from_participant(
                    &speaker.id,
                    response.message.content,
                ));
            }

            debug!(
                tool_count = response.message.tool_calls.len(),
                "Executing tool calls"
            );

            let tool_calls = response.message.tool_calls.clone();
            conversation.push(response.message);

            for tc in &tool_calls {
                let call = ToolCall {
                    id: tc.id.clone(),
                    name: tc.name.clone(),
                    arguments: serde_json::from_str(&tc.arguments).unwrap_or_default(),
                };

                let start = std::time::Instant::now();
                let result = profile.tools.execute(&call).await;
                let duration_ms = start.elapsed().as_millis() as u64;

                let (success, output) = match result {
                    Ok(tool_result) => (tool_result.success, tool_result.output),
                    Err(e) => {
                        warn!(speaker = %speaker.id, tool = %tc.name, error = %e, "Tool execution failed");
                        // The model sees the error and can recover
                        (false, format!("Error: {e}"))
                    }
                };

                self.event_bus.publish(DomainEvent::ToolExecuted {
                    speaker: speaker.id.to_string(),
                    tool_name: tc.name.clone(),
                    success,
                    duration_ms,
                    timestamp: chrono::Utc::now(),
                });

                conversation.push(Message::tool_result(&tc.id, output));
            }
        }

        Ok(Utterance::from_participant(&speaker.id, TOOL_LIMIT_REPLY))
    }
}
