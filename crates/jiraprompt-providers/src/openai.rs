//! OpenAI-compatible chat-completion provider.
//!
//! Works with OpenAI's API and any gateway exposing `/chat/completions`.

use async_trait::async_trait;
use jiraprompt_core::{
    error::JiraPromptError,
    traits::{CompletionRequest, Provider},
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

/// Reply text used when the response carries no message content.
pub const NO_RESPONSE: &str = "No response";

/// OpenAI-compatible provider.
pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenAiProvider {
    /// Create from config values.
    pub fn from_config(base_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Build the two-message conversation: system prompt, then issue content.
pub(crate) fn build_messages(request: &CompletionRequest) -> Vec<ChatMessage> {
    vec![
        ChatMessage {
            role: "system".to_string(),
            content: request.system_prompt.clone(),
        },
        ChatMessage {
            role: "user".to_string(),
            content: request.user_content.clone(),
        },
    ]
}

#[derive(Serialize, Deserialize, Clone)]
pub(crate) struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Serialize)]
pub(crate) struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
pub(crate) struct ChatCompletionResponse {
    pub choices: Option<Vec<ChatChoice>>,
    pub usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
pub(crate) struct ChatChoice {
    pub message: Option<ChatReply>,
}

#[derive(Deserialize)]
pub(crate) struct ChatReply {
    pub content: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct ChatUsage {
    pub total_tokens: Option<u64>,
}

impl ChatCompletionResponse {
    /// First choice's content, or [`NO_RESPONSE`] when it is missing or empty.
    pub(crate) fn reply_text(&self) -> String {
        self.choices
            .as_ref()
            .and_then(|c| c.first())
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.as_deref())
            .filter(|s| !s.is_empty())
            .unwrap_or(NO_RESPONSE)
            .to_string()
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, JiraPromptError> {
        let start = Instant::now();
        let body = ChatCompletionRequest {
            model: request.model.clone(),
            messages: build_messages(request),
        };

        let url = self.endpoint();
        debug!("openai: POST {url} model={}", request.model);

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| JiraPromptError::Network(format!("openai request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(JiraPromptError::http_status(
                "OpenAI API",
                resp.status().as_u16(),
            ));
        }

        let parsed: ChatCompletionResponse = resp.json().await.map_err(|e| {
            JiraPromptError::Provider(format!("openai: failed to parse response: {e}"))
        })?;

        debug!(
            "openai: reply in {}ms, tokens={:?}",
            start.elapsed().as_millis(),
            parsed.usage.as_ref().and_then(|u| u.total_tokens)
        );

        Ok(parsed.reply_text())
    }
}
