//! Log file access: the incident manager's `read_log_file` tool and the
//! append helper the remediation tools write through.

use async_trait::async_trait;
use huddle_core::error::ToolError;
use huddle_core::tool::{Tool, ToolResult};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Timestamp format used for every appended log line.
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local time in [`LOG_TIMESTAMP_FORMAT`].
pub fn log_timestamp() -> String {
    chrono::Local::now().format(LOG_TIMESTAMP_FORMAT).to_string()
}

/// Resolve a model-supplied log path and make sure it stays under `root`.
///
/// `root = None` allows any path. Traversal components are rejected before
/// touching the file system.
pub fn resolve_logfile(path: &str, root: Option<&Path>) -> Result<PathBuf, ToolError> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(ToolError::InvalidArguments("Missing 'logfile' argument".into()));
    }

    let candidate = PathBuf::from(trimmed);
    if candidate
        .components()
        .any(|c| matches!(c, std::path::Component::ParentDir))
    {
        return Err(ToolError::PermissionDenied {
            tool_name: "logfile".into(),
            reason: format!("path traversal in '{trimmed}'"),
        });
    }

    let Some(root) = root else {
        return Ok(candidate);
    };

    let canonical_root = root.canonicalize().map_err(|e| ToolError::ExecutionFailed {
        tool_name: "logfile".into(),
        reason: format!("log directory {} is not accessible: {e}", root.display()),
    })?;
    let canonical = candidate.canonicalize().map_err(|e| ToolError::ExecutionFailed {
        tool_name: "logfile".into(),
        reason: format!("{trimmed}: {e}"),
    })?;

    if !canonical.starts_with(&canonical_root) {
        return Err(ToolError::PermissionDenied {
            tool_name: "logfile".into(),
            reason: format!("'{trimmed}' is outside {}", root.display()),
        });
    }
    Ok(canonical)
}

/// Append `lines` to the log file as one newline-prefixed block.
pub async fn append_entries(path: &Path, lines: &[String]) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .await?;
    let block = format!("\n{}", lines.join("\n"));
    file.write_all(block.as_bytes()).await?;
    file.flush().await
}

/// Reads the log file under investigation.
pub struct ReadLogFileTool {
    /// Directory the log file must live in. `None` = allow all.
    pub root: Option<PathBuf>,
}

impl ReadLogFileTool {
    pub fn new() -> Self {
        Self { root: None }
    }

    pub fn within(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }
}

impl Default for ReadLogFileTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ReadLogFileTool {
    fn name(&self) -> &str {
        "read_log_file"
    }

    fn description(&self) -> &str {
        "Reads the full contents of the given log file"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "logfile": {
                    "type": "string",
                    "description": "Path of the log file to read"
                }
            },
            "required": ["logfile"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let raw = arguments["logfile"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'logfile' argument".into()))?;
        let path = resolve_logfile(raw, self.root.as_deref())?;

        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(ToolResult::ok(content)),
            Err(e) => Ok(ToolResult::failed(format!(
                "Failed to read {}: {e}",
                path.display()
            ))),
        }
    }
}
