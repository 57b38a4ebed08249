use thiserror::Error;

/// Top-level error type for jiraprompt.
#[derive(Debug, Error)]
pub enum JiraPromptError {
    /// Error from a chat-completion provider.
    #[error("provider error: {0}")]
    Provider(String),

    /// Transport failure before any HTTP status was received.
    #[error("network error: {0}")]
    Network(String),

    /// A remote service answered with a non-success status.
    #[error("{service} HTTP {status}")]
    HttpStatus { service: String, status: u16 },

    /// Page content could not be extracted for sending.
    #[error("Error fetching Jira content: {0}")]
    Fetch(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Persistent store error.
    #[error("memory error: {0}")]
    Memory(String),

    /// CSV import rejected.
    #[error("{0}")]
    Import(String),

    /// Invalid prompt edit or selection.
    #[error("{0}")]
    Prompt(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl JiraPromptError {
    /// Shorthand for a non-success response from `service`.
    pub fn http_status(service: &str, status: u16) -> Self {
        Self::HttpStatus {
            service: service.to_string(),
            status,
        }
    }
}
