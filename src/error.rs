use crate::queue::JobStage;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the crate
pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// An external tool could not be located or started. Only the operator can fix this.
    #[error("The command '{tool}' is not available. Install it or copy it into '{}'.", hint.display())]
    DependencyUnavailable { tool: String, hint: PathBuf },

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Probe failed: {0}")]
    Probe(String),

    #[error("Render failed: {0}")]
    Render(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Illegal job transition from {from:?} to {to:?}")]
    InvalidTransition { from: JobStage, to: JobStage },

    #[error("Workspace {0} is no longer accepting jobs")]
    WorkspaceStopped(u32),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

impl AppError {
    pub fn dependency(tool: impl Into<String>, hint: impl Into<PathBuf>) -> Self {
        Self::DependencyUnavailable {
            tool: tool.into(),
            hint: hint.into(),
        }
    }

    /// Whether this is the operator-recoverable "tool missing" condition
    pub fn is_dependency_unavailable(&self) -> bool {
        matches!(self, AppError::DependencyUnavailable { .. })
    }
}
