//! Quote-aware CSV codec for prompt import/export.
//!
//! The parser scans the whole text in one pass so quoted fields may contain
//! commas, doubled quotes, and line breaks.

const BOM: char = '\u{FEFF}';

/// Parse CSV text into rows of fields.
///
/// A `"` toggles quoted mode wherever it appears; inside quotes `""` is a
/// literal quote. Both CRLF and LF end a row. Trailing blank lines are
/// dropped, but an empty last field without a trailing newline is kept.
pub fn parse(text: &str) -> Vec<Vec<String>> {
    let text = text.strip_prefix(BOM).unwrap_or(text);

    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => row.push(std::mem::take(&mut field)),
            '\r' | '\n' if !in_quotes => {
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            _ => field.push(c),
        }
    }

    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    while rows.last().is_some_and(|r| is_blank_row(r)) {
        rows.pop();
    }

    rows
}

/// Encode rows as CSV: every field quoted, rows joined with CRLF.
pub fn encode_rows<R, F>(rows: R) -> String
where
    R: IntoIterator<Item = F>,
    F: IntoIterator,
    F::Item: AsRef<str>,
{
    rows.into_iter()
        .map(|fields| {
            fields
                .into_iter()
                .map(|f| quote(f.as_ref()))
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join("\r\n")
}

/// Wrap a single field in quotes, doubling any quotes inside it.
pub fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn is_blank_row(row: &[String]) -> bool {
    row.len() == 1 && row[0].is_empty()
}
