//! Jira issue page detection.

use url::Url;

/// Where an issue lives: the Jira host and the issue key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueLocator {
    /// Host, with the port when it is not the scheme default.
    pub domain: String,
    /// Upper-cased issue key, e.g. `ABC-123`.
    pub issue_key: String,
}

impl IssueLocator {
    /// REST endpoint returning every field plus rendered HTML and field names.
    pub fn rest_url(&self) -> String {
        format!(
            "https://{}/rest/api/2/issue/{}?fields=*all&expand=renderedFields,names",
            self.domain, self.issue_key
        )
    }
}

/// Classify a page URL. Returns `None` for anything that is not
/// `/browse/<ISSUE-KEY>`, including URLs that fail to parse.
pub fn classify(page_url: &str) -> Option<IssueLocator> {
    let url = Url::parse(page_url).ok()?;
    let host = url.host_str()?;
    let mut segments = url.path_segments()?;

    if !segments.next()?.eq_ignore_ascii_case("browse") {
        return None;
    }
    let key = segments.next()?;
    if !looks_like_issue_key(key) {
        return None;
    }

    let domain = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    Some(IssueLocator {
        domain,
        issue_key: key.to_ascii_uppercase(),
    })
}

/// `[A-Z][A-Z0-9_]+-\d+`, ignoring case.
fn looks_like_issue_key(key: &str) -> bool {
    let Some((project, number)) = key.rsplit_once('-') else {
        return false;
    };
    let mut chars = project.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let rest: Vec<char> = chars.collect();

    starts_with_letter
        && !rest.is_empty()
        && rest.iter().all(|c| c.is_ascii_alphanumeric() || *c == '_')
        && !number.is_empty()
        && number.chars().all(|c| c.is_ascii_digit())
}
