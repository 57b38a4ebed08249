//! Flattening of Jira's XML issue export (RSS-style `<item>` documents)
//! and of arbitrary XML pages.

use roxmltree::{Document, Node, ParsingOptions};
use tracing::warn;

/// Build plain text from an XML page.
///
/// Jira exports (recognised by their `customfield` elements) produce a
/// title/summary/link/description header followed by `Name: value` lines.
/// Any other document yields its non-blank text nodes in order.
pub fn flatten_xml(body: &str) -> String {
    let opts = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = match Document::parse_with_options(body, opts) {
        Ok(doc) => doc,
        Err(e) => {
            warn!("XML parse errors: {e}");
            return non_blank_lines(body.lines());
        }
    };

    let custom_fields: Vec<Node> = elements(doc.root(), "customfield").collect();
    if custom_fields.is_empty() {
        return non_blank_lines(doc.descendants().filter(|n| n.is_text()).filter_map(|n| n.text()));
    }

    let mut lines = Vec::new();
    for name in ["title", "summary", "link"] {
        if let Some(el) = item_child(&doc, name) {
            lines.push(text_content(el).trim().to_string());
        }
    }
    if let Some(desc) = item_child(&doc, "description") {
        let paragraphs: Vec<Node> = elements(desc, "p").collect();
        if paragraphs.is_empty() {
            let text = text_content(desc);
            if !text.trim().is_empty() {
                lines.push(text.trim().to_string());
            }
        } else {
            for p in paragraphs {
                let text = text_content(p);
                if !text.trim().is_empty() {
                    lines.push(text.trim().to_string());
                }
            }
        }
    }
    if !lines.is_empty() {
        lines.push(String::new());
    }

    for cf in custom_fields {
        let name = elements(cf, "customfieldname")
            .next()
            .map(|n| text_content(n).trim().to_string())
            .unwrap_or_default();
        for value_el in elements(cf, "customfieldvalue") {
            let value = strip_cdata_markers(&text_content(value_el));
            let value = value.trim();
            if name.is_empty() && value.is_empty() {
                continue;
            }
            if name.is_empty() {
                lines.push(value.to_string());
            } else {
                lines.push(format!("{name}: {value}"));
            }
        }
    }

    lines.join("\n")
}

/// Descendant elements (excluding `node` itself) with the given local name.
fn elements<'a, 'input>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.descendants()
        .skip(1)
        .filter(move |n| n.is_element() && n.tag_name().name() == name)
}

/// First `<name>` element whose parent is an `<item>`.
fn item_child<'a, 'input>(doc: &'a Document<'input>, name: &'static str) -> Option<Node<'a, 'input>> {
    elements(doc.root(), name).find(|n| {
        n.parent_element()
            .is_some_and(|p| p.tag_name().name() == "item")
    })
}

/// Concatenated text of every descendant text node.
fn text_content(node: Node) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

fn strip_cdata_markers(text: &str) -> String {
    text.replace("<![CDATA[", "").replace("]]>", "")
}

fn non_blank_lines<'s>(texts: impl Iterator<Item = &'s str>) -> String {
    texts
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
