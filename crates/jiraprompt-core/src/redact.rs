//! Redaction of flattened issue text before it leaves the machine.
//!
//! Passes run in a fixed order:
//! 1. Whitespace runs collapse to single spaces, each line trimmed
//! 2. UUID-shaped tokens
//! 3. Password / passcode values, in `key: value` lines and in tags
//! 4. http(s) links, keeping only the host
//! 5. Leftover `<br>` and `<p>` tags
//!
//! Collapsing first keeps a secret on one logical line so step 3 sees all
//! of it. Links are replaced after step 3 so a password that happens to be
//! a URL is still caught as a password.

use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Marker for redacted UUIDs.
pub const UUID_MARKER: &str = "[REDACTED-UUID]";
/// Marker for redacted secrets.
pub const SECRET_MARKER: &str = "[REDACTED]";

/// Result of redacting a block of text.
#[derive(Debug)]
pub struct RedactResult {
    /// The redacted text.
    pub text: String,
    pub uuids: usize,
    pub secrets: usize,
    pub links: usize,
}

impl RedactResult {
    /// Whether anything sensitive was replaced.
    pub fn was_modified(&self) -> bool {
        self.uuids + self.secrets + self.links > 0
    }
}

fn uuid_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}\b")
            .expect("valid regex")
    })
}

fn secret_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)((?:password|passcode)\s*[:=]\s*)[^\n]+").expect("valid regex")
    })
}

fn password_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)(<password>)(.*?)(</password>)").expect("valid regex")
    })
}

fn passcode_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)(<passcode\b[^>]*>)(.*?)(</passcode>)").expect("valid regex")
    })
}

fn link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)https?://([^/?#\s]+)\S*").expect("valid regex"))
}

fn br_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<br\s*/?>").expect("valid regex"))
}

fn p_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)</?p\b[^>]*>").expect("valid regex"))
}

/// Collapse whitespace runs inside each line and trim every line.
pub fn collapse_whitespace(input: &str) -> String {
    input
        .split('\n')
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Replace every match of `re` using `rep`, counting replacements.
fn replace_counting<F>(re: &Regex, text: &str, mut rep: F) -> (String, usize)
where
    F: FnMut(&Captures) -> String,
{
    let mut count = 0;
    let out = re
        .replace_all(text, |caps: &Captures| {
            count += 1;
            rep(caps)
        })
        .into_owned();
    (out, count)
}

/// Run the full redaction pass over flattened issue text.
pub fn redact(input: &str) -> RedactResult {
    let text = collapse_whitespace(input);

    let (text, uuids) = replace_counting(uuid_re(), &text, |_| UUID_MARKER.to_string());

    let (text, line_secrets) = replace_counting(secret_line_re(), &text, |c| {
        format!("{}{SECRET_MARKER}", &c[1])
    });
    let (text, password_tags) = replace_counting(password_tag_re(), &text, |c| {
        format!("{}{SECRET_MARKER}{}", &c[1], &c[3])
    });
    let (text, passcode_tags) = replace_counting(passcode_tag_re(), &text, |c| {
        format!("{}{SECRET_MARKER}{}", &c[1], &c[3])
    });

    let (text, links) = replace_counting(link_re(), &text, |c| {
        format!("[{} REDACTED LINK]", &c[1])
    });

    let text = br_re().replace_all(&text, "").into_owned();
    let text = p_re().replace_all(&text, "").into_owned();

    RedactResult {
        text,
        uuids,
        secrets: line_secrets + password_tags + passcode_tags,
        links,
    }
}
