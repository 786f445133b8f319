//! The DevOps remediation catalog.
//!
//! Each action is one variant of [`RemediationAction`] carrying its own
//! parameters. [`RemediationTool`] exposes one kind to the model by name;
//! execution parses the arguments into the enum and applies it through a
//! single `match`.

use async_trait::async_trait;
use huddle_core::error::ToolError;
use huddle_core::tool::{Tool, ToolResult};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::log_file::{append_entries, log_timestamp, resolve_logfile};

/// The name of each catalog entry, as the model sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemediationKind {
    RestartService,
    RollbackTransaction,
    RedeployResource,
    IncreaseQuota,
    EscalateIssue,
}

impl RemediationKind {
    pub const ALL: [RemediationKind; 5] = [
        Self::RestartService,
        Self::RollbackTransaction,
        Self::RedeployResource,
        Self::IncreaseQuota,
        Self::EscalateIssue,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::RestartService => "restart_service",
            Self::RollbackTransaction => "rollback_transaction",
            Self::RedeployResource => "redeploy_resource",
            Self::IncreaseQuota => "increase_quota",
            Self::EscalateIssue => "escalate_issue",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::RestartService => "A function that restarts the named service",
            Self::RollbackTransaction => "A function that rolls back the transaction",
            Self::RedeployResource => "A function that redeploys the named resource",
            Self::IncreaseQuota => "A function that increases the quota",
            Self::EscalateIssue => "A function that escalates the issue",
        }
    }

    /// The string parameter this kind needs besides `logfile`, if any.
    fn target_param(self) -> Option<&'static str> {
        match self {
            Self::RestartService => Some("service_name"),
            Self::RedeployResource => Some("resource_name"),
            _ => None,
        }
    }

    pub fn parameters_schema(self) -> serde_json::Value {
        let mut properties = serde_json::json!({
            "logfile": {
                "type": "string",
                "description": "Path of the log file to record the action in"
            }
        });
        let mut required = vec!["logfile"];
        if let Some(param) = self.target_param() {
            properties[param] = serde_json::json!({
                "type": "string",
                "description": format!("The {}", param.replace('_', " "))
            });
            required.insert(0, param);
        }
        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required
        })
    }
}

/// A remediation request with everything needed to carry it out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemediationAction {
    RestartService { service_name: String },
    RollbackTransaction,
    RedeployResource { resource_name: String },
    IncreaseQuota,
    EscalateIssue,
}

impl RemediationAction {
    /// Build the action for `kind` from model-supplied JSON arguments.
    pub fn parse(kind: RemediationKind, arguments: &serde_json::Value) -> Result<Self, ToolError> {
        let required = |key: &str| -> Result<String, ToolError> {
            arguments[key]
                .as_str()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .ok_or_else(|| ToolError::InvalidArguments(format!("Missing '{key}' argument")))
        };

        Ok(match kind {
            RemediationKind::RestartService => Self::RestartService {
                service_name: required("service_name")?,
            },
            RemediationKind::RollbackTransaction => Self::RollbackTransaction,
            RemediationKind::RedeployResource => Self::RedeployResource {
                resource_name: required("resource_name")?,
            },
            RemediationKind::IncreaseQuota => Self::IncreaseQuota,
            RemediationKind::EscalateIssue => Self::EscalateIssue,
        })
    }

    pub fn kind(&self) -> RemediationKind {
        match self {
            Self::RestartService { .. } => RemediationKind::RestartService,
            Self::RollbackTransaction => RemediationKind::RollbackTransaction,
            Self::RedeployResource { .. } => RemediationKind::RedeployResource,
            Self::IncreaseQuota => RemediationKind::IncreaseQuota,
            Self::EscalateIssue => RemediationKind::EscalateIssue,
        }
    }

    /// Lines recorded in the log file, stamped with `ts`.
    pub fn log_entries(&self, ts: &str) -> Vec<String> {
        match self {
            Self::RestartService { service_name } => vec![
                format!("[{ts}] ALERT  DevopsAssistant: Multiple failures detected in {service_name}. Restarting service."),
                format!("[{ts}] INFO  {service_name}: Restart initiated."),
                format!("[{ts}] INFO  {service_name}: Service restarted successfully."),
            ],
            Self::RollbackTransaction => vec![
                format!("[{ts}] ALERT  DevopsAssistant: Transaction failure detected. Rolling back transaction batch."),
                format!("[{ts}] INFO   TransactionProcessor: Rolling back transaction batch."),
                format!("[{ts}] INFO   Transaction rollback completed successfully."),
            ],
            Self::RedeployResource { resource_name } => vec![
                format!("[{ts}] ALERT  DevopsAssistant: Resource deployment failure detected in '{resource_name}'. Redeploying resource."),
                format!("[{ts}] INFO   DeploymentManager: Redeployment request submitted."),
                format!("[{ts}] INFO   DeploymentManager: Service successfully redeployed, resource '{resource_name}' created successfully."),
            ],
            Self::IncreaseQuota => vec![
                format!("[{ts}] ALERT  DevopsAssistant: High request volume detected. Increasing quota."),
                format!("[{ts}] INFO   APIManager: Quota increase request submitted."),
                format!("[{ts}] INFO   APIManager: Quota successfully increased to 150% of previous limit."),
            ],
            Self::EscalateIssue => vec![
                format!("[{ts}] ALERT  DevopsAssistant: Cannot resolve issue."),
                format!("[{ts}] ALERT  DevopsAssistant: Requesting escalation."),
            ],
        }
    }

    /// Human-readable confirmation returned to the model.
    pub fn confirmation(&self) -> String {
        match self {
            Self::RestartService { service_name } => {
                format!("Service {service_name} restarted successfully.")
            }
            Self::RollbackTransaction => "Transaction rolled back successfully.".into(),
            Self::RedeployResource { resource_name } => {
                format!("Resource '{resource_name}' redeployed successfully.")
            }
            Self::IncreaseQuota => "Successfully increased quota.".into(),
            Self::EscalateIssue => "Submitted escalation request.".into(),
        }
    }

    /// Record the action in `logfile` and return the confirmation.
    pub async fn apply(&self, logfile: &Path) -> std::io::Result<String> {
        let entries = self.log_entries(&log_timestamp());
        append_entries(logfile, &entries).await?;
        info!(action = self.kind().name(), logfile = %logfile.display(), "Remediation applied");
        Ok(self.confirmation())
    }
}

/// Exposes one [`RemediationKind`] as a callable tool.
pub struct RemediationTool {
    kind: RemediationKind,
    /// Directory the target log file must live in. `None` = allow all.
    root: Option<PathBuf>,
}

impl RemediationTool {
    pub fn new(kind: RemediationKind) -> Self {
        Self { kind, root: None }
    }

    pub fn within(kind: RemediationKind, root: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            root: Some(root.into()),
        }
    }
}

#[async_trait]
impl Tool for RemediationTool {
    fn name(&self) -> &str {
        self.kind.name()
    }

    fn description(&self) -> &str {
        self.kind.description()
    }

    fn parameters_schema(&self) -> serde_json::Value {
        self.kind.parameters_schema()
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let action = RemediationAction::parse(self.kind, &arguments)?;
        let raw = arguments["logfile"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'logfile' argument".into()))?;
        let logfile = resolve_logfile(raw, self.root.as_deref())?;

        match action.apply(&logfile).await {
            Ok(confirmation) => Ok(ToolResult::ok(confirmation)),
            Err(e) => Ok(ToolResult::failed(format!(
                "Failed to update {}: {e}",
                logfile.display()
            ))),
        }
    }
}
