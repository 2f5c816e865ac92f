use thiserror::Error;

/// Coarse classification of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    MalformedInput,
    UnknownAction,
    InvalidRequest,
    Library,
    Unexpected,
}

/// Every way a request can fail. The `Display` text is the wire `error` string.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Error processing {action}: {message}")]
    InvalidRequest { action: String, message: String },

    #[error("Failed to initialize agent: {0:#}")]
    InitializeAgent(anyhow::Error),

    #[error("Failed to generate completion: {0:#}")]
    GenerateCompletion(anyhow::Error),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Failed to execute tool {tool}: {error:#}")]
    ExecuteTool { tool: String, error: anyhow::Error },

    #[error("Error processing {action}: {message}")]
    Panicked {
        action: String,
        message: String,
        traceback: Option<String>,
    },

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl BridgeError {
    pub fn kind(&self) -> FailureKind {
        match self {
            BridgeError::InvalidJson(_) => FailureKind::MalformedInput,
            BridgeError::UnknownAction(_) => FailureKind::UnknownAction,
            BridgeError::InvalidRequest { .. } => FailureKind::InvalidRequest,
            BridgeError::InitializeAgent(_)
            | BridgeError::GenerateCompletion(_)
            | BridgeError::ToolNotFound(_)
            | BridgeError::ExecuteTool { .. } => FailureKind::Library,
            BridgeError::Panicked { .. } | BridgeError::Unexpected(_) => FailureKind::Unexpected,
        }
    }

    /// Diagnostic stack trace, only present for caught panics.
    pub fn traceback(&self) -> Option<&str> {
        match self {
            BridgeError::Panicked { traceback, .. } => traceback.as_deref(),
            _ => None,
        }
    }
}
