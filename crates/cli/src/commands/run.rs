//! `huddle run`: Process every log file with the incident-response chat.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use huddle_agent::{DirectorySource, SessionOutcome, incident_response_chat, stage_samples};
use huddle_config::AppConfig;
use huddle_core::event::{DomainEvent, EventBus};
use tokio::sync::broadcast::error::RecvError;

/// Command-line overrides for a run.
#[derive(Debug, Default)]
pub struct RunOptions {
    pub source: Option<PathBuf>,
    pub work_dir: Option<PathBuf>,
    pub max_iterations: Option<u32>,
    pub no_delay: bool,
}

impl RunOptions {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(source) = &self.source {
            config.logs.source_dir = source.clone();
        }
        if let Some(work_dir) = &self.work_dir {
            config.logs.work_dir = work_dir.clone();
        }
        if let Some(max) = self.max_iterations {
            config.group_chat.max_iterations = max;
        }
        if self.no_delay {
            config.group_chat.unit_delay_secs = 0;
        }
    }
}

pub async fn run(options: RunOptions) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    options.apply(&mut config);
    config.validate()?;

    // Fail early with setup instructions when no key is set
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    AZURE_OPENAI_API_KEY=...   (with AZURE_OPENAI_ENDPOINT)");
        eprintln!("    OPENAI_API_KEY=sk-...      (with HUDDLE_PROVIDER=openai)");
        eprintln!("    HUDDLE_API_KEY=...         (generic)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let router = huddle_providers::build_from_config(&config);
    let provider = router.default().ok_or_else(|| {
        format!(
            "Provider '{}' is not configured (Azure needs AZURE_OPENAI_ENDPOINT or [providers.azure] api_url)",
            config.default_provider
        )
    })?;

    let work_dir = config.logs.work_dir.clone();
    println!("Getting log files...\n");
    if config.logs.source_dir.is_dir() {
        stage_samples(&config.logs.source_dir, &work_dir).await?;
    } else {
        tracing::warn!(
            source = %config.logs.source_dir.display(),
            "Sample directory not found, processing {} as is",
            work_dir.display()
        );
    }

    let event_bus = Arc::new(EventBus::default());
    let printer = tokio::spawn(print_events(event_bus.subscribe()));

    let mut driver = incident_response_chat(provider, &config, Some(&work_dir), event_bus)?;
    let unit_delay = Duration::from_secs(config.group_chat.unit_delay_secs);
    let result = driver
        .process_all(&DirectorySource::new(&work_dir), unit_delay)
        .await;

    // Closing the bus lets the printer drain and exit
    drop(driver);
    let _ = printer.await;

    let outcomes = result?;
    print_summary(&outcomes);
    Ok(())
}

/// Print the conversation as it happens.
async fn print_events(mut rx: tokio::sync::broadcast::Receiver<Arc<DomainEvent>>) {
    loop {
        match rx.recv().await {
            Ok(event) => match event.as_ref() {
                DomainEvent::UnitStarted { unit, .. } => {
                    println!("\nReady to process log file: {unit}\n");
                }
                DomainEvent::UtteranceAppended { text, .. } => println!("{text}"),
                DomainEvent::RateLimited { backoff_secs, .. } => {
                    println!("Waiting {backoff_secs}s (rate limited)...");
                }
                DomainEvent::ErrorOccurred { error_message, .. } => {
                    eprintln!("Error during chat invocation: {error_message}");
                }
                _ => {}
            },
            Err(RecvError::Lagged(missed)) => {
                tracing::warn!(missed, "Event printer fell behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

fn print_summary(outcomes: &[SessionOutcome]) {
    println!();
    println!("  Summary");
    println!("  ───────");
    if outcomes.is_empty() {
        println!("  No log files found.");
    }
    for outcome in outcomes {
        println!(
            "  {:<40} {:<24} {} turn(s)",
            outcome.unit,
            outcome.state.to_string(),
            outcome.turns
        );
        if let Some(error) = &outcome.error {
            println!("    {error}");
        }
    }
    println!();
}
