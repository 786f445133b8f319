//! Built-in participant roles and their system instructions.

use huddle_core::participant::Participant;

pub const INCIDENT_MANAGER: &str = "INCIDENT_MANAGER";
pub const DEVOPS_ASSISTANT: &str = "DEVOPS_ASSISTANT";

pub const INCIDENT_MANAGER_INSTRUCTIONS: &str = r#"
Analyze the given log file or the response from the devops assistant.
Recommend which one of the following actions should be taken:

Restart service {service_name}
Rollback transaction
Redeploy resource {resource_name}
Increase quota

If there are no issues or if the issue has already been resolved, respond with "INCIDENT_MANAGER > No action needed."
If none of the options resolve the issue, respond with "Escalate issue."

RULES:
- Do not perform any corrective actions yourself.
- Read the log file on every turn.
- Prepend your response with this text: "INCIDENT_MANAGER > {logfilepath} | "
- Only respond with the corrective action instructions.
"#;

pub const DEVOPS_ASSISTANT_INSTRUCTIONS: &str = r#"
Read the instructions from the INCIDENT_MANAGER and apply the appropriate resolution function.
Return the response as "{function_response}"
If the instructions indicate there are no issues or actions needed,
take no action and respond with "No action needed."

RULES:
- Use the instructions provided.
- Do not read any log files yourself.
- Prepend your response with this text: "DEVOPS_ASSISTANT > "
"#;

/// The analyzing role. Speaks first on every input unit.
pub fn incident_manager() -> Participant {
    Participant::new(INCIDENT_MANAGER, "Incident Manager")
}

/// The acting role. Holds the remediation tools.
pub fn devops_assistant() -> Participant {
    Participant::new(DEVOPS_ASSISTANT, "DevOps Assistant")
}

/// Format an input unit as the user's opening utterance.
pub fn unit_prompt(unit: &str) -> String {
    format!("USER > {unit}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instructions_carry_response_prefixes() {
        assert!(INCIDENT_MANAGER_INSTRUCTIONS.contains("\"INCIDENT_MANAGER > {logfilepath} | \""));
        assert!(DEVOPS_ASSISTANT_INSTRUCTIONS.contains("\"DEVOPS_ASSISTANT > \""));
        assert!(DEVOPS_ASSISTANT_INSTRUCTIONS.contains("No action needed."));
    }

    #[test]
    fn roles_use_their_constants() {
        assert_eq!(incident_manager().id.as_str(), INCIDENT_MANAGER);
        assert_eq!(devops_assistant().id.as_str(), DEVOPS_ASSISTANT);
    }

    #[test]
    fn unit_prompt_format() {
        assert_eq!(unit_prompt("logs/app.log"), "USER > logs/app.log");
    }
}
