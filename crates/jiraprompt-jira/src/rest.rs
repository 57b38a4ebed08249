//! Flattening of the Jira REST issue representation
//! (`fields=*all&expand=renderedFields,names`).

use serde_json::{Map, Value};

use crate::html::html_to_text;

/// Fields that are either noise or handled separately.
const SKIPPED_FIELDS: &[&str] = &["comment", "attachment"];

/// Build plain text from an issue JSON document.
///
/// Layout: key, summary, source URL, a blank line, one `Name: value` line
/// per named field, then a `Comments:` block when there are comments.
pub fn flatten_issue(data: &Value, source_url: &str) -> String {
    let empty = Map::new();
    let names = data.get("names").and_then(Value::as_object).unwrap_or(&empty);
    let fields = data.get("fields").and_then(Value::as_object).unwrap_or(&empty);
    let rendered = data
        .get("renderedFields")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    let mut lines = Vec::new();
    lines.push(format!(
        "Issue Key: {}",
        data.get("key").and_then(Value::as_str).unwrap_or_default()
    ));
    if let Some(summary) = fields.get("summary").and_then(Value::as_str) {
        if !summary.is_empty() {
            lines.push(format!("Summary: {summary}"));
        }
    }
    lines.push(format!("URL: {source_url}"));
    lines.push(String::new());

    for (field_key, display_name) in names {
        if SKIPPED_FIELDS.contains(&field_key.as_str()) {
            continue;
        }
        let Some(value) = fields.get(field_key) else {
            continue;
        };
        if is_absent(value) {
            continue;
        }

        let text = match rendered.get(field_key).and_then(Value::as_str) {
            Some(html) if !html.is_empty() => html_to_text(html),
            _ => field_text(value),
        };
        let label = display_name
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| display_name.to_string());
        lines.push(format!("{label}: {text}"));
    }

    let comments = rendered
        .get("comment")
        .and_then(|c| c.get("comments"))
        .and_then(Value::as_array)
        .filter(|c| !c.is_empty());
    if let Some(comments) = comments {
        lines.push(String::new());
        lines.push("Comments:".to_string());
        for comment in comments {
            lines.push(comment_header(comment));
            lines.push(html_to_text(
                comment.get("body").and_then(Value::as_str).unwrap_or_default(),
            ));
            lines.push(String::new());
        }
    }

    lines.join("\n")
}

fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// `author (created):`, or `author:` when there is no timestamp.
fn comment_header(comment: &Value) -> String {
    let author = comment
        .get("author")
        .and_then(|a| first_text(a, &["displayName", "name"]))
        .unwrap_or_else(|| "Unknown".to_string());
    match comment.get("created").and_then(Value::as_str) {
        Some(created) if !created.is_empty() => format!("{author} ({created}):"),
        _ => format!("{author}:"),
    }
}

/// Text for a raw (unrendered) field value.
fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) if items.first().is_some_and(is_scalar) => items
            .iter()
            .map(scalar_text)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| first_text(item, &["name", "value", "displayName"]))
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => first_text(value, &["name", "displayName", "value"])
            .unwrap_or_else(|| value.to_string()),
        Value::Null => String::new(),
    }
}

fn is_scalar(value: &Value) -> bool {
    value.is_string() || value.is_number()
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// First of `keys` holding a non-empty string or a number.
fn first_text(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match value.get(*k)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
