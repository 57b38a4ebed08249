//! Popup state and readiness rules.
//!
//! Everything the popup used to keep in module-level variables is carried in
//! [`PopupState`]; handlers take state in and hand new state back.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::JiraPromptError;
use crate::prompt::{sort_prompts, Prompt};

/// Message shown when nothing is cached for the issue.
pub const READY_MESSAGE: &str = "Ready!";

/// Cached completion text keyed by issue key.
pub type LastResponses = BTreeMap<String, String>;

/// API credentials for the completion endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub api_key: String,
    pub model: String,
}

impl Settings {
    /// Build settings from user input, trimming both values.
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.trim().to_string(),
            model: model.trim().to_string(),
        }
    }
}

/// Everything read from the store on open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredState {
    pub settings: Settings,
    pub prompts: Vec<Prompt>,
    pub last_responses: LastResponses,
}

/// Why the send action is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blocker {
    MissingApiKey,
    MissingModel,
    NoPrompts,
    NotJiraIssue,
}

impl Blocker {
    /// User-facing explanation.
    pub fn message(&self) -> &'static str {
        match self {
            Self::MissingApiKey => "No API key set. Please configure in Settings.",
            Self::MissingModel => "No model set. Please configure in Settings.",
            Self::NoPrompts => "No prompts defined. Please add prompts in Settings.",
            Self::NotJiraIssue => "Please open this on a Jira issue page.",
        }
    }
}

/// State of one popup session for one page.
#[derive(Debug, Clone)]
pub struct PopupState {
    pub settings: Settings,
    /// Sorted by title.
    pub prompts: Vec<Prompt>,
    pub last_responses: LastResponses,
    /// Issue key of the page, when it is a Jira issue page.
    pub issue_key: Option<String>,
}

impl PopupState {
    pub fn new(stored: StoredState, issue_key: Option<String>) -> Self {
        let mut prompts = stored.prompts;
        sort_prompts(&mut prompts);
        Self {
            settings: stored.settings,
            prompts,
            last_responses: stored.last_responses,
            issue_key,
        }
    }

    /// Cached response for this issue, or the ready message.
    pub fn initial_message(&self) -> &str {
        self.issue_key
            .as_ref()
            .and_then(|k| self.last_responses.get(k))
            .map(String::as_str)
            .unwrap_or(READY_MESSAGE)
    }

    /// Reasons send is disabled, in evaluation order.
    ///
    /// The page check only runs once the configuration checks pass.
    pub fn blockers(&self) -> Vec<Blocker> {
        let mut blockers = Vec::new();
        if self.settings.api_key.is_empty() {
            blockers.push(Blocker::MissingApiKey);
        }
        if self.settings.model.is_empty() {
            blockers.push(Blocker::MissingModel);
        }
        if self.prompts.is_empty() {
            blockers.push(Blocker::NoPrompts);
        }
        if blockers.is_empty() && self.issue_key.is_none() {
            blockers.push(Blocker::NotJiraIssue);
        }
        blockers
    }

    pub fn can_send(&self) -> bool {
        self.blockers().is_empty()
    }

    /// Resolve a prompt by exact title, or by 1-based position in the sorted list.
    pub fn select_prompt(&self, selector: &str) -> Result<&Prompt, JiraPromptError> {
        if let Some(p) = self.prompts.iter().find(|p| p.title == selector) {
            return Ok(p);
        }
        selector
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| self.prompts.get(i))
            .ok_or_else(|| JiraPromptError::Prompt(format!("no prompt matches {selector:?}")))
    }

    /// Record a completion for this issue, returning the updated cache.
    pub fn with_response(mut self, text: &str) -> Self {
        if let Some(key) = &self.issue_key {
            self.last_responses.insert(key.clone(), text.to_string());
        }
        self
    }

    /// Drop this issue's cached response. Returns whether one existed.
    pub fn clear_response(&mut self) -> bool {
        match &self.issue_key {
            Some(key) => self.last_responses.remove(key).is_some(),
            None => false,
        }
    }
}
