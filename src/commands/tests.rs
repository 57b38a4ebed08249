use super::*;
use async_trait::async_trait;
use jiraprompt_core::config::JiraConfig;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

const ISSUE_URL: &str = "https://foo.atlassian.net/browse/ABC-1";

/// Unique scratch file path for CSV round trips.
fn temp_csv() -> PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!(
        "__jiraprompt_cmd_test_{}_{}__.csv",
        std::process::id(),
        id
    ))
}

async fn configured_store() -> Store {
    let store = Store::in_memory().await.unwrap();
    store
        .save_settings(&Settings::new("sk-test-1234", "gpt-4o"))
        .await
        .unwrap();
    store
        .save_prompts(&[
            Prompt::new("Triage", "Triage this."),
            Prompt::new("acceptance", "Write acceptance criteria."),
        ])
        .await
        .unwrap();
    store
}

/// Records what it was asked and answers with a fixed reply.
struct FakeProvider {
    reply: String,
    seen: Mutex<Vec<CompletionRequest>>,
}

impl FakeProvider {
    fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Provider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, JiraPromptError> {
        self.seen.lock().unwrap().push(request.clone());
        Ok(self.reply.clone())
    }
}

struct FailingProvider;

#[async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _request: &CompletionRequest) -> Result<String, JiraPromptError> {
        Err(JiraPromptError::http_status("OpenAI API", 500))
    }
}

fn jira() -> JiraClient {
    JiraClient::new(&JiraConfig::default()).unwrap()
}

// --- Settings ---

#[tokio::test]
async fn test_show_settings_masks_key() {
    let store = Store::in_memory().await.unwrap();
    assert_eq!(
        show_settings(&store).await.unwrap(),
        "API key: (not set)\nModel: (not set)"
    );

    let store = configured_store().await;
    assert_eq!(
        show_settings(&store).await.unwrap(),
        "API key: ****1234\nModel: gpt-4o"
    );
}

#[tokio::test]
async fn test_update_settings_keeps_unspecified_value() {
    let store = configured_store().await;
    let msg = update_settings(&store, None, Some("  gpt-4o-mini ")).await.unwrap();
    assert_eq!(msg, "API Key and model saved");

    let settings = store.settings().await.unwrap();
    assert_eq!(settings.api_key, "sk-test-1234");
    assert_eq!(settings.model, "gpt-4o-mini");
}

// --- Prompt library ---

#[tokio::test]
async fn test_list_prompts() {
    let store = Store::in_memory().await.unwrap();
    assert_eq!(list_prompts(&store).await.unwrap(), "No prompts defined yet.");

    let store = configured_store().await;
    assert_eq!(
        list_prompts(&store).await.unwrap(),
        "1. acceptance\n2. Triage"
    );
}

#[tokio::test]
async fn test_add_prompt_requires_both_parts() {
    let store = Store::in_memory().await.unwrap();
    let err = add_prompt(&store, "  ", "body").await.unwrap_err();
    assert_eq!(err.to_string(), "Both title and prompt are required");
    assert!(store.prompts().await.unwrap().is_empty());

    add_prompt(&store, " Summary ", " Summarize. ").await.unwrap();
    assert_eq!(
        store.prompts().await.unwrap(),
        vec![Prompt::new("Summary", "Summarize.")]
    );
}

#[tokio::test]
async fn test_edit_prompt_uses_listed_position() {
    let store = configured_store().await;
    edit_prompt(&store, 2, "Triage v2", "Triage harder.").await.unwrap();

    let listing = list_prompts(&store).await.unwrap();
    assert_eq!(listing, "1. acceptance\n2. Triage v2");

    let err = edit_prompt(&store, 0, "x", "y").await.unwrap_err();
    assert!(matches!(err, JiraPromptError::Prompt(_)));
    let err = edit_prompt(&store, 3, "x", "y").await.unwrap_err();
    assert_eq!(err.to_string(), "no prompt at position 3 (have 2)");
}

#[tokio::test]
async fn test_delete_prompt_honours_confirmation() {
    let store = configured_store().await;

    let msg = delete_prompt(&store, 1, |p| {
        assert_eq!(p.title, "acceptance");
        false
    })
    .await
    .unwrap();
    assert_eq!(msg, "Kept \"acceptance\".");
    assert_eq!(store.prompts().await.unwrap().len(), 2);

    let msg = delete_prompt(&store, 1, |_| true).await.unwrap();
    assert_eq!(msg, "Deleted \"acceptance\".");
    assert_eq!(list_prompts(&store).await.unwrap(), "1. Triage");
}

#[tokio::test]
async fn test_export_empty_library_fails() {
    let store = Store::in_memory().await.unwrap();
    let path = temp_csv();
    let err = export_prompts(&store, &path).await.unwrap_err();
    assert_eq!(err.to_string(), "No prompts to export.");
    assert!(!path.exists());
}

#[tokio::test]
async fn test_export_then_import_into_fresh_store() {
    let store = configured_store().await;
    store
        .save_prompts(&[Prompt::new("Multi", "line one\nsaid \"two\", then three")])
        .await
        .unwrap();
    let path = temp_csv();
    export_prompts(&store, &path).await.unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.starts_with("Title,Prompt\r\n\"Multi\""));

    let fresh = Store::in_memory().await.unwrap();
    let msg = import_prompts(&fresh, &path, |_| panic!("no duplicates expected"))
        .await
        .unwrap();
    assert_eq!(msg, "Prompts imported successfully. (1 added, 0 replaced, 0 kept)");
    assert_eq!(fresh.prompts().await.unwrap(), store.prompts().await.unwrap());

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_import_asks_once_and_keeps_existing() {
    let store = configured_store().await;
    let path = temp_csv();
    std::fs::write(
        &path,
        "Title,Prompt\r\n\"Triage\",\"new triage\"\r\n\"New\",\"fresh\"\r\n",
    )
    .unwrap();

    let mut asked = Vec::new();
    let msg = import_prompts(&store, &path, |dups| {
        asked.extend_from_slice(dups);
        OverwriteDecision::KeepExisting
    })
    .await
    .unwrap();
    assert_eq!(asked, vec!["Triage".to_string()]);
    assert_eq!(msg, "Prompts imported successfully. (1 added, 0 replaced, 1 kept)");

    let prompts = store.prompts().await.unwrap();
    let triage = prompts.iter().find(|p| p.title == "Triage").unwrap();
    assert_eq!(triage.prompt, "Triage this.");
    assert!(prompts.iter().any(|p| p.title == "New"));

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_import_missing_file() {
    let store = Store::in_memory().await.unwrap();
    let err = import_prompts(
        &store,
        Path::new("/nonexistent/__jiraprompt__/prompts.csv"),
        |_| OverwriteDecision::Overwrite,
    )
    .await
    .unwrap_err();
    assert!(err.to_string().starts_with("Error reading file"));
}

// --- Issue pages ---

#[tokio::test]
async fn test_show_lists_every_config_blocker() {
    let store = Store::in_memory().await.unwrap();
    assert_eq!(
        show(&store, ISSUE_URL).await.unwrap(),
        "No API key set. Please configure in Settings.\n\
         No model set. Please configure in Settings.\n\
         No prompts defined. Please add prompts in Settings."
    );
}

#[tokio::test]
async fn test_show_ready_then_cached_response() {
    let store = configured_store().await;
    assert_eq!(show(&store, ISSUE_URL).await.unwrap(), "Ready!");
    assert_eq!(
        show(&store, "https://example.com/wiki").await.unwrap(),
        "Please open this on a Jira issue page."
    );

    let state = open_popup(&store, ISSUE_URL).await.unwrap();
    let provider = FakeProvider::new("Looks like a regression.");
    complete_and_cache(&store, state, &provider, "Triage this.", "Issue Key: ABC-1")
        .await
        .unwrap();

    assert_eq!(
        show(&store, ISSUE_URL).await.unwrap(),
        "Looks like a regression."
    );
    assert_eq!(
        show(&store, "https://foo.atlassian.net/browse/ABC-2").await.unwrap(),
        "Ready!"
    );
}

#[tokio::test]
async fn test_complete_and_cache_sends_model_and_prompt() {
    let store = configured_store().await;
    let state = open_popup(&store, ISSUE_URL).await.unwrap();
    let provider = FakeProvider::new("Done.");

    let text = complete_and_cache(&store, state, &provider, "Triage this.", "content")
        .await
        .unwrap();
    assert_eq!(text, "Done.");

    let seen = provider.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].model, "gpt-4o");
    assert_eq!(seen[0].system_prompt, "Triage this.");
    assert_eq!(seen[0].user_content, "content");

    let cached = store.last_responses().await.unwrap();
    assert_eq!(cached.get("ABC-1").map(String::as_str), Some("Done."));
}

#[tokio::test]
async fn test_failed_completion_leaves_cache_alone() {
    let store = configured_store().await;
    let state = open_popup(&store, ISSUE_URL).await.unwrap();

    let err = complete_and_cache(&store, state, &FailingProvider, "p", "c")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "OpenAI API HTTP 500");
    assert!(store.last_responses().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_send_blocked_off_issue_page() {
    let store = configured_store().await;
    let outcome = send(&store, &jira(), "https://example.com/page", "1", |_| {
        panic!("provider must not be built")
    })
    .await
    .unwrap();
    assert!(matches!(
        outcome,
        SendOutcome::Blocked(ref b) if b == &vec![Blocker::NotJiraIssue]
    ));
}

#[tokio::test]
async fn test_send_blocked_without_settings() {
    let store = Store::in_memory().await.unwrap();
    let outcome = send(&store, &jira(), ISSUE_URL, "1", |_| {
        panic!("provider must not be built")
    })
    .await
    .unwrap();
    match outcome {
        SendOutcome::Blocked(blockers) => assert_eq!(blockers.len(), 3),
        other => panic!("expected Blocked, got {other:?}"),
    }
}

#[tokio::test]
async fn test_send_unknown_prompt_fails_before_fetch() {
    let store = configured_store().await;
    let err = send(&store, &jira(), ISSUE_URL, "Nope", |_| {
        panic!("provider must not be built")
    })
    .await
    .unwrap_err();
    assert!(matches!(err, JiraPromptError::Prompt(_)));
}

#[tokio::test]
async fn test_send_wraps_extraction_failure() {
    // Issue pages are always fetched over https; a plain-http listener
    // cannot complete the handshake.
    let server = wiremock::MockServer::start().await;
    let page = format!("{}/browse/ABC-1", server.uri());

    let store = configured_store().await;
    let mut cached = jiraprompt_core::popup::LastResponses::new();
    cached.insert("ABC-1".into(), "earlier reply".into());
    store.save_last_responses(&cached).await.unwrap();

    let err = send(&store, &jira(), &page, "Triage", |_| {
        panic!("provider must not be built")
    })
    .await
    .unwrap_err();
    assert!(matches!(err, JiraPromptError::Fetch(_)));
    assert!(
        err.to_string().starts_with("Error fetching Jira content: "),
        "got {err}"
    );
    assert_eq!(store.last_responses().await.unwrap(), cached);
}

#[tokio::test]
async fn test_clear_removes_only_this_issue() {
    let store = configured_store().await;
    let mut cached = jiraprompt_core::popup::LastResponses::new();
    cached.insert("ABC-1".into(), "one".into());
    cached.insert("ABC-2".into(), "two".into());
    store.save_last_responses(&cached).await.unwrap();

    assert_eq!(clear(&store, ISSUE_URL).await.unwrap(), "Ready!");

    let cached = store.last_responses().await.unwrap();
    assert!(!cached.contains_key("ABC-1"));
    assert_eq!(cached.get("ABC-2").map(String::as_str), Some("two"));
}
