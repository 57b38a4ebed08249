//! HTML to plain text for Jira's rendered fields.

use html2text::render::TrivialDecorator;
use tracing::warn;

/// Wide enough that rendered paragraphs are never re-wrapped.
const RENDER_WIDTH: usize = 1000;

/// Flatten an HTML fragment to trimmed plain text.
///
/// Only text content is kept: no link targets, footnotes, or emphasis marks.
///
/// Falls back to the raw markup if the renderer rejects it; the redaction
/// pass strips the usual tag remnants afterwards.
pub fn html_to_text(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }
    let rendered = html2text::config::with_decorator(TrivialDecorator::new())
        .string_from_read(html.as_bytes(), RENDER_WIDTH);
    match rendered {
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            warn!("html: failed to render fragment: {e}");
            html.trim().to_string()
        }
    }
}
