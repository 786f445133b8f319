//! The group chat driver: runs one dialogue session per input unit.
//!
//! ```text
//! IDLE ── unit ──▶ RUNNING ── marker ──────▶ TERMINATED
//!                    │  ▲    ── ceiling ─────▶ MAX_ITERATIONS_REACHED
//!                    │  │    ── error ───────▶ ERROR
//!                    └──┘ rate limit: back off, same turn
//! ```
//!
//! Every terminal state hands the driver back to `IDLE` before
//! [`DialogueDriver::process_unit`] returns.

use huddle_config::GroupChatConfig;
use huddle_core::error::{DialogueError, Error, Result};
use huddle_core::event::{DomainEvent, EventBus};
use huddle_core::message::{MessageLog, Utterance};
use huddle_core::participant::Participant;
use huddle_core::session::DialogueState;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::generator::Generator;
use crate::instructions::unit_prompt;
use crate::source::InputSource;
use crate::strategy::{SelectionPolicy, TerminationPolicy};

pub const DEFAULT_MAX_ITERATIONS: u32 = 10;
pub const DEFAULT_RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(60);

/// How one input unit ended.
#[derive(Debug, Clone, Serialize)]
pub struct SessionOutcome {
    pub unit: String,
    pub state: DialogueState,
    /// Generation calls that produced an utterance.
    pub turns: u32,
    /// The session's log, including the opening user utterance.
    pub utterances: Vec<Utterance>,
    /// Set when `state` is `Error`.
    pub error: Option<String>,
}

/// Drives a fixed set of participants through turn-based sessions.
pub struct DialogueDriver {
    participants: Vec<Participant>,
    selection: Box<dyn SelectionPolicy>,
    termination: Box<dyn TerminationPolicy>,
    generator: Arc<dyn Generator>,
    max_iterations: u32,
    automatic_reset: bool,
    rate_limit_backoff: Duration,
    state: DialogueState,
    log: MessageLog,
    event_bus: Arc<EventBus>,
}

impl DialogueDriver {
    pub fn new(
        participants: Vec<Participant>,
        selection: Box<dyn SelectionPolicy>,
        termination: Box<dyn TerminationPolicy>,
        generator: Arc<dyn Generator>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            participants,
            selection,
            termination,
            generator,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            automatic_reset: true,
            rate_limit_backoff: DEFAULT_RATE_LIMIT_BACKOFF,
            state: DialogueState::Idle,
            log: MessageLog::new(),
            event_bus,
        }
    }

    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_automatic_reset(mut self, enabled: bool) -> Self {
        self.automatic_reset = enabled;
        self
    }

    pub fn with_rate_limit_backoff(mut self, backoff: Duration) -> Self {
        self.rate_limit_backoff = backoff;
        self
    }

    /// Apply the `[group_chat]` limits from configuration.
    pub fn with_settings(self, settings: &GroupChatConfig) -> Self {
        self.with_max_iterations(settings.max_iterations)
            .with_automatic_reset(settings.automatic_reset)
            .with_rate_limit_backoff(Duration::from_secs(settings.rate_limit_backoff_secs))
    }

    pub fn state(&self) -> DialogueState {
        self.state
    }

    /// The current session's log.
    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Startup check: every participant the selection rules can name and every
    /// authorized terminator must be registered, and the turn ceiling must
    /// allow at least one turn.
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(Error::Config {
                message: "max_iterations must be greater than 0".into(),
            });
        }
        for target in self.selection.targets() {
            if !self.participants.iter().any(|p| p.id == target) {
                return Err(DialogueError::ParticipantNotFound {
                    target: target.to_string(),
                }
                .into());
            }
        }
        for id in self.termination.terminators() {
            if !self.participants.iter().any(|p| p.id == id) {
                return Err(DialogueError::UnknownParticipant(id.to_string()).into());
            }
        }
        Ok(())
    }

    fn advance(&mut self, to: DialogueState) -> Result<()> {
        if !self.state.can_transition_to(to) {
            return Err(Error::Internal(format!(
                "illegal session transition {} -> {to}",
                self.state
            )));
        }
        debug!(from = %self.state, to = %to, "Session transition");
        self.state = to;
        Ok(())
    }

    /// Run one input unit to a terminal state.
    ///
    /// Recoverable outcomes (termination, the turn ceiling, a failed
    /// generation) come back as a [`SessionOutcome`]. `Err` is reserved for
    /// configuration faults: a selection rule naming an unknown participant.
    pub async fn process_unit(&mut self, unit: &str) -> Result<SessionOutcome> {
        self.advance(DialogueState::Running)?;
        self.log.push(Utterance::user(unit_prompt(unit)));

        info!(unit, session_id = %self.log.session_id, "Processing input unit");
        self.event_bus.publish(DomainEvent::UnitStarted {
            unit: unit.to_string(),
            session_id: self.log.session_id.to_string(),
            timestamp: chrono::Utc::now(),
        });

        let (state, turns, failure) = match self.run_turns().await {
            Ok(finished) => finished,
            Err(e) => {
                // Leave the driver reusable before surfacing the fault
                self.state = DialogueState::Idle;
                self.log.reset();
                return Err(e);
            }
        };

        self.advance(state)?;
        let outcome = SessionOutcome {
            unit: unit.to_string(),
            state,
            turns,
            utterances: self.log.as_slice().to_vec(),
            error: failure,
        };

        info!(unit, state = %state, turns, "Input unit finished");
        self.event_bus.publish(DomainEvent::SessionFinished {
            unit: unit.to_string(),
            session_id: self.log.session_id.to_string(),
            state,
            turns,
            timestamp: chrono::Utc::now(),
        });

        if state == DialogueState::Error || self.automatic_reset {
            self.log.reset();
        }
        self.advance(DialogueState::Idle)?;

        Ok(outcome)
    }

    /// Process every unit from `source` in order, pausing `unit_delay`
    /// before each one. Stops at the first configuration fault.
    pub async fn process_all(
        &mut self,
        source: &dyn InputSource,
        unit_delay: Duration,
    ) -> Result<Vec<SessionOutcome>> {
        let units = source.units().await?;
        info!(units = units.len(), "Starting group chat");

        let mut outcomes = Vec::with_capacity(units.len());
        for unit in units {
            if !unit_delay.is_zero() {
                debug!(delay_secs = unit_delay.as_secs(), "Pausing before next unit");
                tokio::time::sleep(unit_delay).await;
            }
            outcomes.push(self.process_unit(&unit).await?);
        }
        Ok(outcomes)
    }

    /// The turn loop. Returns the terminal state, the turn count and the
    /// error text for a failed generation.
    ///
    /// A rate-limited turn is generated again from scratch. Tool calls the
    /// speaker made before the limit hit are not rolled back and run again on
    /// retry, so a remediation can be recorded twice in its log file.
    async fn run_turns(&mut self) -> Result<(DialogueState, u32, Option<String>)> {
        let mut turn: u32 = 0;

        while turn < self.max_iterations {
            let speaker = self
                .selection
                .select_next(&self.participants, &self.log)?
                .ok_or_else(|| Error::Config {
                    message: format!(
                        "selection rule named a participant outside {}",
                        self.participant_ids().join(", ")
                    ),
                })?;

            debug!(turn = turn + 1, speaker = %speaker.id, "Turn");

            match self.generator.generate(&speaker, &self.log).await {
                Ok(utterance) => {
                    turn += 1;
                    self.event_bus.publish(DomainEvent::UtteranceAppended {
                        session_id: self.log.session_id.to_string(),
                        turn,
                        author: utterance.author.clone(),
                        text: utterance.text.clone(),
                        timestamp: chrono::Utc::now(),
                    });
                    self.log.push(utterance);

                    if self.termination.should_terminate(&self.log) {
                        return Ok((DialogueState::Terminated, turn, None));
                    }
                }
                Err(e) if e.is_rate_limit() => {
                    warn!(
                        turn = turn + 1,
                        backoff_secs = self.rate_limit_backoff.as_secs(),
                        "Rate limited, retrying the same turn"
                    );
                    self.event_bus.publish(DomainEvent::RateLimited {
                        session_id: self.log.session_id.to_string(),
                        turn: turn + 1,
                        backoff_secs: self.rate_limit_backoff.as_secs(),
                        timestamp: chrono::Utc::now(),
                    });
                    tokio::time::sleep(self.rate_limit_backoff).await;
                }
                Err(e) => {
                    error!(turn = turn + 1, speaker = %speaker.id, error = %e, "Generation failed");
                    self.event_bus.publish(DomainEvent::ErrorOccurred {
                        context: format!("turn {} ({})", turn + 1, speaker.id),
                        error_message: e.to_string(),
                        timestamp: chrono::Utc::now(),
                    });
                    return Ok((DialogueState::Error, turn, Some(e.to_string())));
                }
            }
        }

        Ok((DialogueState::MaxIterationsReached, turn, None))
    }

    fn participant_ids(&self) -> Vec<&str> {
        self.participants.iter().map(|p| p.id.as_str()).collect()
    }
}
