//! End-to-end integration tests for the Huddle incident-response chat.
//!
//! These tests exercise the full pipeline from a log file on disk to the
//! final session state, including tool execution against the file and
//! rate-limit recovery.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use huddle_agent::{DirectorySource, incident_response_chat, stage_samples};
use huddle_config::AppConfig;
use huddle_core::error::ProviderError;
use huddle_core::event::EventBus;
use huddle_core::message::{Message, MessageToolCall, Role};
use huddle_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use huddle_core::session::DialogueState;

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that returns scripted results in sequence.
struct ScriptedProvider {
    results: Mutex<VecDeque<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(results: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(request);
        let call = requests.len();
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("ScriptedProvider exhausted at call #{call}"))
    }
}

fn text_response(text: &str) -> Result<ProviderResponse, ProviderError> {
    Ok(ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock".into(),
    })
}

fn tool_response(name: &str, args: serde_json::Value) -> Result<ProviderResponse, ProviderError> {
    let mut msg = Message::assistant("");
    msg.tool_calls = vec![MessageToolCall {
        id: format!("call_{name}"),
        name: name.to_string(),
        arguments: serde_json::to_string(&args).unwrap(),
    }];
    Ok(ProviderResponse {
        message: msg,
        usage: None,
        model: "mock".into(),
    })
}

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.group_chat.unit_delay_secs = 0;
    config
}

const ALERT_LOG: &str = "\
[2025-01-15 08:01:12] INFO   payments: Service started.
[2025-01-15 08:14:03] ALERT  payments: Request failed with status 503.
[2025-01-15 08:14:09] ALERT  payments: Request failed with status 503.
[2025-01-15 08:14:15] ALERT  payments: Health check failed.";

fn write_log(dir: &Path, name: &str, content: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path.display().to_string()
}

// ── E2E: Full incident pipeline ──────────────────────────────────────────

#[tokio::test]
async fn e2e_alerts_are_remediated_and_session_terminates() {
    let dir = tempfile::tempdir().unwrap();
    let logfile = write_log(dir.path(), "payments.log", ALERT_LOG);

    let provider = Arc::new(ScriptedProvider::new(vec![
        // incident manager reads the log, then recommends
        tool_response("read_log_file", serde_json::json!({ "logfile": logfile })),
        text_response(&format!("INCIDENT_MANAGER > {logfile} | Restart service payments")),
        // devops assistant applies the remediation, then reports
        tool_response(
            "restart_service",
            serde_json::json!({ "service_name": "payments", "logfile": logfile }),
        ),
        text_response("DEVOPS_ASSISTANT > Service payments restarted successfully. No action needed."),
    ]));

    let mut driver = incident_response_chat(
        provider.clone(),
        &test_config(),
        Some(dir.path()),
        Arc::new(EventBus::default()),
    )
    .unwrap();

    let outcome = driver.process_unit(&logfile).await.unwrap();

    assert_eq!(outcome.state, DialogueState::Terminated);
    assert_eq!(outcome.turns, 2);
    assert_eq!(outcome.utterances.len(), 3);
    assert_eq!(outcome.utterances[0].text, format!("USER > {logfile}"));
    assert_eq!(outcome.utterances[1].author, "INCIDENT_MANAGER");
    assert_eq!(outcome.utterances[2].author, "DEVOPS_ASSISTANT");
    assert_eq!(provider.calls(), 4);

    // the manager saw the file contents through its tool
    let requests = provider.requests();
    let read_result = requests[1].messages.last().unwrap();
    assert_eq!(read_result.role, Role::Tool);
    assert_eq!(read_result.content.matches("ALERT").count(), 3);

    // the assistant's remediation was recorded after the original lines
    let content = std::fs::read_to_string(&logfile).unwrap();
    assert!(content.starts_with(ALERT_LOG));
    assert!(content.contains("ALERT  DevopsAssistant: Multiple failures detected in payments. Restarting service."));
    assert!(content.trim_end().ends_with("INFO  payments: Service restarted successfully."));

    assert_eq!(driver.state(), DialogueState::Idle);
    assert!(driver.log().is_empty());
}

#[tokio::test]
async fn e2e_escalation_is_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let logfile = write_log(dir.path(), "disk.log", "[2025-01-15 09:00:00] ALERT  storage: Disk corrupted.");

    let provider = Arc::new(ScriptedProvider::new(vec![
        text_response(&format!("INCIDENT_MANAGER > {logfile} | Escalate issue.")),
        tool_response("escalate_issue", serde_json::json!({ "logfile": logfile })),
        text_response("DEVOPS_ASSISTANT > Submitted escalation request."),
        text_response(&format!("INCIDENT_MANAGER > {logfile} | No action needed.")),
    ]));

    let mut driver = incident_response_chat(
        provider,
        &test_config(),
        Some(dir.path()),
        Arc::new(EventBus::default()),
    )
    .unwrap();

    let outcome = driver.process_unit(&logfile).await.unwrap();
    assert_eq!(outcome.state, DialogueState::Terminated);
    assert_eq!(outcome.turns, 3);

    let content = std::fs::read_to_string(&logfile).unwrap();
    assert!(content.contains("ALERT  DevopsAssistant: Requesting escalation."));
}

#[tokio::test]
async fn e2e_tools_cannot_escape_the_log_directory() {
    let dir = tempfile::tempdir().unwrap();
    let outside = tempfile::tempdir().unwrap();
    let logfile = write_log(dir.path(), "api.log", ALERT_LOG);
    let foreign = write_log(outside.path(), "other.log", "untouched");

    let provider = Arc::new(ScriptedProvider::new(vec![
        text_response(&format!("INCIDENT_MANAGER > {logfile} | Increase quota")),
        tool_response("increase_quota", serde_json::json!({ "logfile": foreign })),
        text_response("DEVOPS_ASSISTANT > No action needed."),
    ]));

    let mut driver = incident_response_chat(
        provider.clone(),
        &test_config(),
        Some(dir.path()),
        Arc::new(EventBus::default()),
    )
    .unwrap();

    let outcome = driver.process_unit(&logfile).await.unwrap();
    assert_eq!(outcome.state, DialogueState::Terminated);

    let denied = provider.requests()[2].messages.last().unwrap().clone();
    assert!(denied.content.contains("Permission denied"));
    assert_eq!(std::fs::read_to_string(&foreign).unwrap(), "untouched");
}

// ── E2E: Limits and recovery ─────────────────────────────────────────────

#[tokio::test]
async fn e2e_max_iterations_without_resolution() {
    let responses = (0..10)
        .map(|i| text_response(&format!("still analyzing ({i})")))
        .collect();
    let provider = Arc::new(ScriptedProvider::new(responses));

    let mut driver = incident_response_chat(
        provider.clone(),
        &test_config(),
        None,
        Arc::new(EventBus::default()),
    )
    .unwrap();

    let outcome = driver.process_unit("logs/stuck.log").await.unwrap();
    assert_eq!(outcome.state, DialogueState::MaxIterationsReached);
    assert_eq!(outcome.turns, 10);
    assert_eq!(provider.calls(), 10);
}

#[tokio::test(start_paused = true)]
async fn e2e_rate_limit_backs_off_and_retries() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        Err(ProviderError::ApiError {
            status_code: 400,
            message: "Rate limit is exceeded. Try again in 60 seconds.".into(),
        }),
        text_response("INCIDENT_MANAGER > logs/a.log | No action needed."),
    ]));

    let mut driver = incident_response_chat(
        provider.clone(),
        &test_config(),
        None,
        Arc::new(EventBus::default()),
    )
    .unwrap();

    let start = tokio::time::Instant::now();
    let outcome = driver.process_unit("logs/a.log").await.unwrap();

    assert!(start.elapsed() >= Duration::from_secs(60));
    assert_eq!(outcome.state, DialogueState::Terminated);
    assert_eq!(outcome.turns, 1);
    assert_eq!(outcome.utterances.len(), 2);
    assert_eq!(provider.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn e2e_rate_limited_turn_replays_its_tool_calls() {
    let dir = tempfile::tempdir().unwrap();
    let logfile = write_log(dir.path(), "payments.log", ALERT_LOG);
    let restart = || {
        tool_response(
            "restart_service",
            serde_json::json!({ "service_name": "payments", "logfile": logfile }),
        )
    };

    let provider = Arc::new(ScriptedProvider::new(vec![
        text_response(&format!("INCIDENT_MANAGER > {logfile} | Restart service payments")),
        restart(),
        Err(ProviderError::RateLimited {
            retry_after_secs: 60,
        }),
        restart(),
        text_response("DEVOPS_ASSISTANT > Service payments restarted successfully. No action needed."),
    ]));

    let mut driver = incident_response_chat(
        provider.clone(),
        &test_config(),
        Some(dir.path()),
        Arc::new(EventBus::default()),
    )
    .unwrap();

    let outcome = driver.process_unit(&logfile).await.unwrap();

    assert_eq!(outcome.state, DialogueState::Terminated);
    assert_eq!(outcome.turns, 2);
    assert_eq!(outcome.utterances.len(), 3);
    assert_eq!(provider.calls(), 5);

    // the whole turn ran again, tool call included
    let content = std::fs::read_to_string(&logfile).unwrap();
    assert_eq!(content.matches("Restart initiated.").count(), 2);
}

#[tokio::test]
async fn e2e_failed_unit_does_not_stop_the_run() {
    let samples = tempfile::tempdir().unwrap();
    write_log(samples.path(), "a.log", ALERT_LOG);
    write_log(samples.path(), "b.log", ALERT_LOG);

    let provider = Arc::new(ScriptedProvider::new(vec![
        Err(ProviderError::AuthenticationFailed("token expired".into())),
        text_response("INCIDENT_MANAGER > b.log | No action needed."),
    ]));

    let mut driver = incident_response_chat(
        provider,
        &test_config(),
        Some(samples.path()),
        Arc::new(EventBus::default()),
    )
    .unwrap();

    let outcomes = driver
        .process_all(&DirectorySource::new(samples.path()), Duration::ZERO)
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].state, DialogueState::Error);
    assert!(outcomes[0].error.as_deref().unwrap().contains("token expired"));
    assert_eq!(outcomes[1].state, DialogueState::Terminated);
    assert_eq!(outcomes[1].utterances.len(), 2);
}

// ── E2E: Staging and multi-file runs ─────────────────────────────────────

#[tokio::test]
async fn e2e_staged_run_processes_copies_in_order() {
    let samples = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let work_dir = work.path().join("logs");
    write_log(samples.path(), "b_quota.log", ALERT_LOG);
    write_log(samples.path(), "a_api.log", ALERT_LOG);

    assert_eq!(stage_samples(samples.path(), &work_dir).await.unwrap(), 2);

    let first = work_dir.join("a_api.log").display().to_string();
    let second = work_dir.join("b_quota.log").display().to_string();

    let provider = Arc::new(ScriptedProvider::new(vec![
        text_response(&format!("INCIDENT_MANAGER > {first} | Increase quota")),
        tool_response("increase_quota", serde_json::json!({ "logfile": first })),
        text_response("DEVOPS_ASSISTANT > Successfully increased quota. No action needed."),
        text_response(&format!("INCIDENT_MANAGER > {second} | No action needed.")),
    ]));

    let mut driver = incident_response_chat(
        provider.clone(),
        &test_config(),
        Some(&work_dir),
        Arc::new(EventBus::default()),
    )
    .unwrap();

    let outcomes = driver
        .process_all(&DirectorySource::new(&work_dir), Duration::ZERO)
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].unit, first);
    assert_eq!(outcomes[1].unit, second);
    assert_eq!(outcomes[0].turns, 2);
    assert_eq!(outcomes[1].turns, 1);

    // automatic reset: the second unit's first request only sees its own unit
    let requests = provider.requests();
    let user_messages: Vec<&str> = requests[3]
        .messages
        .iter()
        .filter(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(user_messages, vec![format!("USER > {second}")]);

    // the copy was remediated, the sample was not
    let staged = std::fs::read_to_string(&first).unwrap();
    assert!(staged.contains("Quota successfully increased to 150% of previous limit."));
    let pristine = std::fs::read_to_string(samples.path().join("a_api.log")).unwrap();
    assert_eq!(pristine, ALERT_LOG);
}
