//! Shared test helpers: scripted providers and generators.

use async_trait::async_trait;
use huddle_core::error::ProviderError;
use huddle_core::message::{Message, MessageLog, MessageToolCall, Utterance};
use huddle_core::participant::Participant;
use huddle_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::generator::Generator;

/// A mock provider that returns a sequence of scripted results.
///
/// Each call to `complete` pops the next result and records the request.
/// Panics if more calls are made than results provided.
pub struct SequentialMockProvider {
    results: Mutex<VecDeque<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self::with_results(responses.into_iter().map(Ok).collect())
    }

    pub fn with_results(results: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a provider that returns a single text response (no tool calls).
    pub fn single_text(text: &str) -> Self {
        Self::new(vec![make_text_response(text)])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let call = requests.len();
        requests.push(request);
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("SequentialMockProvider: no more responses (call #{call})"))
    }
}

/// Create a simple text response (no tool calls).
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// Create a response with tool calls and optional text content.
pub fn make_tool_call_response(tool_calls: Vec<MessageToolCall>, text: &str) -> ProviderResponse {
    let mut msg = Message::assistant(text);
    msg.tool_calls = tool_calls;
    ProviderResponse {
        message: msg,
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// Helper to create a tool call.
pub fn make_tool_call(name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall {
        id: format!("call_{name}"),
        name: name.to_string(),
        arguments: serde_json::to_string(&args).unwrap(),
    }
}

/// A generator that replays scripted texts (or errors) in order and records
/// the log length and speaker it was called with.
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    calls: Mutex<Vec<(String, usize)>>,
    /// Reply once the script runs out. `None` panics instead.
    fallback: Option<String>,
}

impl ScriptedGenerator {
    pub fn new(script: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
            fallback: None,
        }
    }

    /// Always answer `text`.
    pub fn repeating(text: &str) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            fallback: Some(text.to_string()),
        }
    }

    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// `(speaker, log length)` per call.
    pub fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(
        &self,
        speaker: &Participant,
        log: &MessageLog,
    ) -> Result<Utterance, ProviderError> {
        self.calls
            .lock()
            .unwrap()
            .push((speaker.id.to_string(), log.len()));

        let next = self.script.lock().unwrap().pop_front();
        let text = match (next, &self.fallback) {
            (Some(result), _) => result?,
            (None, Some(fallback)) => fallback.clone(),
            (None, None) => panic!("ScriptedGenerator: script exhausted"),
        };
        Ok(Utterance::from_participant(&speaker.id, text))
    }
}
