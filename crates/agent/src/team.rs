//! Wiring of the incident-response group chat.

use huddle_config::AppConfig;
use huddle_core::error::Result;
use huddle_core::event::EventBus;
use huddle_core::participant::ParticipantId;
use huddle_core::provider::Provider;
use std::path::Path;
use std::sync::Arc;

use crate::driver::DialogueDriver;
use crate::generator::ProviderGenerator;
use crate::instructions::{
    DEVOPS_ASSISTANT_INSTRUCTIONS, INCIDENT_MANAGER_INSTRUCTIONS, devops_assistant,
    incident_manager,
};
use crate::strategy::{AlternatingSelection, MarkerTermination};

/// Build the two-role chat: the incident manager reads logs and recommends,
/// the DevOps assistant applies remediations.
///
/// `log_root` confines both roles' tools to one directory.
pub fn incident_response_chat(
    provider: Arc<dyn Provider>,
    config: &AppConfig,
    log_root: Option<&Path>,
    event_bus: Arc<EventBus>,
) -> Result<DialogueDriver> {
    let manager = incident_manager();
    let devops = devops_assistant();
    let settings = &config.group_chat;

    let generator = ProviderGenerator::new(provider, &config.default_model, event_bus.clone())
        .with_temperature(config.default_temperature)
        .with_max_tokens(config.default_max_tokens)
        .with_max_tool_iterations(settings.max_tool_iterations)
        .with_participant(
            &manager.id,
            INCIDENT_MANAGER_INSTRUCTIONS,
            Arc::new(huddle_tools::incident_manager_registry(log_root)),
        )
        .with_participant(
            &devops.id,
            DEVOPS_ASSISTANT_INSTRUCTIONS,
            Arc::new(huddle_tools::devops_registry(log_root)),
        );

    let selection = AlternatingSelection::new(manager.id.clone(), devops.id.clone());
    let termination = MarkerTermination::new(&settings.termination_marker).with_authorized(
        settings
            .authorized_terminators
            .iter()
            .map(|id| ParticipantId::from(id.as_str()))
            .collect(),
    );

    let driver = DialogueDriver::new(
        vec![manager, devops],
        Box::new(selection),
        Box::new(termination),
        Arc::new(generator),
        event_bus,
    )
    .with_settings(settings);

    driver.validate()?;
    Ok(driver)
}
