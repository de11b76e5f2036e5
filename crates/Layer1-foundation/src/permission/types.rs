//! Permission action types
//!
//! Describes the side effect a pending action would have. One value is
//! shown to the human for each confirmation.

use serde::{Deserialize, Serialize};

/// Types of permission actions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PermissionAction {
    /// Execute a shell command
    Execute { command: String },

    /// Write to a file (whole-file write or span replacement)
    FileWrite { path: String },

    /// Call a tool hosted by an external provider
    ProviderTool { provider: String, tool: String },
}

impl PermissionAction {
    pub fn execute(command: impl Into<String>) -> Self {
        Self::Execute {
            command: command.into(),
        }
    }

    pub fn file_write(path: impl Into<String>) -> Self {
        Self::FileWrite { path: path.into() }
    }

    pub fn provider_tool(provider: impl Into<String>, tool: impl Into<String>) -> Self {
        Self::ProviderTool {
            provider: provider.into(),
            tool: tool.into(),
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> String {
        match self {
            Self::Execute { command } => format!("Execute: {}", command),
            Self::FileWrite { path } => format!("Write file: {}", path),
            Self::ProviderTool { provider, tool } => {
                format!("Call tool '{}' on provider '{}'", tool, provider)
            }
        }
    }

    /// Short label used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Execute { .. } => "execute",
            Self::FileWrite { .. } => "file_write",
            Self::ProviderTool { .. } => "provider_tool",
        }
    }
}

impl std::fmt::Display for PermissionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}
