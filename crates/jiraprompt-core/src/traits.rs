use crate::error::JiraPromptError;
use async_trait::async_trait;

/// A single chat-completion call: one system message, one user message.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Model identifier sent with the request.
    pub model: String,
    /// Text of the selected prompt.
    pub system_prompt: String,
    /// Redacted issue content.
    pub user_content: String,
}

/// Chat-completion backend.
///
/// Implemented by the OpenAI-compatible provider; tests substitute their own.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Human-readable provider name.
    fn name(&self) -> &str;

    /// Send the request and return the assistant's reply text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, JiraPromptError>;
}
