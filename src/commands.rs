//! Handlers behind each CLI subcommand.
//!
//! Handlers take the store and anything else they talk to explicitly, and
//! return the text to print. Asking the user anything stays in `main`.

use jiraprompt_core::{
    error::JiraPromptError,
    popup::{Blocker, PopupState, Settings, READY_MESSAGE},
    prompt::{self, OverwriteDecision, Prompt},
    traits::{CompletionRequest, Provider},
};
use jiraprompt_jira::{classify, JiraClient};
use jiraprompt_memory::Store;
use std::path::Path;
use tracing::info;

/// Result of `send`.
#[derive(Debug)]
pub enum SendOutcome {
    /// Nothing was sent; each blocker explains why.
    Blocked(Vec<Blocker>),
    Completed(String),
}

// --- Settings ---

fn masked(value: &str) -> String {
    let len = value.chars().count();
    if len == 0 {
        return "(not set)".to_string();
    }
    let tail: String = value.chars().skip(len.saturating_sub(4)).collect();
    format!("****{tail}")
}

pub async fn show_settings(store: &Store) -> Result<String, JiraPromptError> {
    let settings = store.settings().await?;
    let model = if settings.model.is_empty() {
        "(not set)"
    } else {
        settings.model.as_str()
    };
    Ok(format!(
        "API key: {}\nModel: {model}",
        masked(&settings.api_key)
    ))
}

/// Overwrite whichever settings were given, keeping the others.
pub async fn update_settings(
    store: &Store,
    api_key: Option<&str>,
    model: Option<&str>,
) -> Result<String, JiraPromptError> {
    let current = store.settings().await?;
    let settings = Settings::new(
        api_key.unwrap_or(&current.api_key),
        model.unwrap_or(&current.model),
    );
    store.save_settings(&settings).await?;
    Ok("API Key and model saved".to_string())
}

// --- Prompt library ---

async fn sorted_prompts(store: &Store) -> Result<Vec<Prompt>, JiraPromptError> {
    let mut prompts = store.prompts().await?;
    prompt::sort_prompts(&mut prompts);
    Ok(prompts)
}

/// Convert a 1-based position from the command line.
fn index_of(position: usize) -> Result<usize, JiraPromptError> {
    position
        .checked_sub(1)
        .ok_or_else(|| JiraPromptError::Prompt("positions start at 1".to_string()))
}

pub async fn list_prompts(store: &Store) -> Result<String, JiraPromptError> {
    let prompts = sorted_prompts(store).await?;
    if prompts.is_empty() {
        return Ok("No prompts defined yet.".to_string());
    }
    Ok(prompts
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{}. {}", i + 1, p.title))
        .collect::<Vec<_>>()
        .join("\n"))
}

pub async fn add_prompt(store: &Store, title: &str, text: &str) -> Result<String, JiraPromptError> {
    let prompts = prompt::add(store.prompts().await?, title, text)?;
    store.save_prompts(&prompts).await?;
    Ok(format!("Saved prompt \"{}\".", title.trim()))
}

pub async fn edit_prompt(
    store: &Store,
    position: usize,
    title: &str,
    text: &str,
) -> Result<String, JiraPromptError> {
    let prompts = prompt::update(store.prompts().await?, index_of(position)?, title, text)?;
    store.save_prompts(&prompts).await?;
    Ok(format!("Updated prompt {position}."))
}

/// Delete the prompt at `position` once `confirm` agrees.
pub async fn delete_prompt<F>(
    store: &Store,
    position: usize,
    confirm: F,
) -> Result<String, JiraPromptError>
where
    F: FnOnce(&Prompt) -> bool,
{
    let (remaining, removed) = prompt::delete(store.prompts().await?, index_of(position)?)?;
    if !confirm(&removed) {
        return Ok(format!("Kept \"{}\".", removed.title));
    }
    store.save_prompts(&remaining).await?;
    Ok(format!("Deleted \"{}\".", removed.title))
}

pub async fn export_prompts(store: &Store, path: &Path) -> Result<String, JiraPromptError> {
    let prompts = store.prompts().await?;
    let csv = prompt::export_csv(&prompts)?;
    std::fs::write(path, csv)?;
    Ok(format!(
        "Exported {} prompt(s) to {}",
        prompts.len(),
        path.display()
    ))
}

/// Merge a CSV file into the library. `decide` is consulted once when
/// the file repeats existing titles.
pub async fn import_prompts<F>(
    store: &Store,
    path: &Path,
    decide: F,
) -> Result<String, JiraPromptError>
where
    F: FnOnce(&[String]) -> OverwriteDecision,
{
    let text = std::fs::read_to_string(path)
        .map_err(|e| JiraPromptError::Import(format!("Error reading file: {e}")))?;
    let imported = prompt::import_csv(&text)?;
    let outcome = prompt::merge_imported(store.prompts().await?, imported, decide);
    store.save_prompts(&outcome.prompts).await?;
    info!(
        "import: {} added, {} replaced, {} kept",
        outcome.added, outcome.replaced, outcome.skipped
    );
    Ok(format!(
        "Prompts imported successfully. ({} added, {} replaced, {} kept)",
        outcome.added, outcome.replaced, outcome.skipped
    ))
}

// --- Issue pages ---

/// Load stored state for the page at `page_url`.
pub async fn open_popup(store: &Store, page_url: &str) -> Result<PopupState, JiraPromptError> {
    let issue_key = classify(page_url).map(|loc| loc.issue_key);
    Ok(PopupState::new(store.snapshot().await?, issue_key))
}

fn blocker_text(blockers: &[Blocker]) -> String {
    blockers
        .iter()
        .map(Blocker::message)
        .collect::<Vec<_>>()
        .join("\n")
}

/// What the popup would show on open: blockers first, then the cached
/// response or the ready message.
pub async fn show(store: &Store, page_url: &str) -> Result<String, JiraPromptError> {
    let state = open_popup(store, page_url).await?;
    let blockers = state.blockers();
    if !blockers.is_empty() {
        return Ok(blocker_text(&blockers));
    }
    Ok(state.initial_message().to_string())
}

pub async fn fetch(jira: &JiraClient, page_url: &str) -> Result<String, JiraPromptError> {
    Ok(jira.extract(page_url).await?.text)
}

/// Check readiness, extract the page, and run the selected prompt over it.
///
/// `make_provider` is only called once the page has been extracted.
pub async fn send<F>(
    store: &Store,
    jira: &JiraClient,
    page_url: &str,
    selector: &str,
    make_provider: F,
) -> Result<SendOutcome, JiraPromptError>
where
    F: FnOnce(&Settings) -> Box<dyn Provider>,
{
    let state = open_popup(store, page_url).await?;
    let blockers = state.blockers();
    if !blockers.is_empty() {
        return Ok(SendOutcome::Blocked(blockers));
    }
    let system_prompt = state.select_prompt(selector)?.prompt.clone();

    let content = jira
        .extract(page_url)
        .await
        .map_err(|e| JiraPromptError::Fetch(e.to_string()))?;

    let provider = make_provider(&state.settings);
    let text = complete_and_cache(store, state, provider.as_ref(), &system_prompt, &content.text)
        .await?;
    Ok(SendOutcome::Completed(text))
}

/// Run one completion and remember the reply for the popup's issue.
pub async fn complete_and_cache(
    store: &Store,
    state: PopupState,
    provider: &dyn Provider,
    system_prompt: &str,
    content: &str,
) -> Result<String, JiraPromptError> {
    let request = CompletionRequest {
        model: state.settings.model.clone(),
        system_prompt: system_prompt.to_string(),
        user_content: content.to_string(),
    };
    let text = provider.complete(&request).await?;
    info!(
        "{}: {} chars for {}",
        provider.name(),
        text.len(),
        state.issue_key.as_deref().unwrap_or("-")
    );

    let state = state.with_response(&text);
    store.save_last_responses(&state.last_responses).await?;
    Ok(text)
}

/// Forget the cached response for the page's issue.
pub async fn clear(store: &Store, page_url: &str) -> Result<String, JiraPromptError> {
    let mut state = open_popup(store, page_url).await?;
    if state.clear_response() {
        store.save_last_responses(&state.last_responses).await?;
    }
    Ok(READY_MESSAGE.to_string())
}

#[cfg(test)]
mod tests;
