//! Tools available to Huddle participants.
//!
//! The incident manager reads log files; the DevOps assistant applies
//! remediations from a fixed catalog and records them in the log file.

pub mod log_file;
pub mod remediation;

use std::path::Path;

use huddle_core::tool::ToolRegistry;

pub use log_file::ReadLogFileTool;
pub use remediation::{RemediationAction, RemediationKind, RemediationTool};

/// Tools for the participant that analyzes logs.
///
/// With `root` set, only files under that directory can be read.
pub fn incident_manager_registry(root: Option<&Path>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    let tool = match root {
        Some(root) => ReadLogFileTool::within(root),
        None => ReadLogFileTool::new(),
    };
    registry.register(Box::new(tool));
    registry
}

/// The full remediation catalog for the participant that acts.
pub fn devops_registry(root: Option<&Path>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    for kind in RemediationKind::ALL {
        let tool = match root {
            Some(root) => RemediationTool::within(kind, root),
            None => RemediationTool::new(kind),
        };
        registry.register(Box::new(tool));
    }
    registry
}
