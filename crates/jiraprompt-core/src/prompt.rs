//! Prompt library: the `{title, prompt}` model, manual edits, and CSV
//! import/export with an all-or-nothing overwrite decision.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::csv;
use crate::error::JiraPromptError;

/// Header row written on export and skipped on import.
pub const CSV_HEADER: &str = "Title,Prompt";

/// A reusable system prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub title: String,
    pub prompt: String,
}

impl Prompt {
    pub fn new(title: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            prompt: prompt.into(),
        }
    }
}

/// Answer to "replace the prompts that already exist?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwriteDecision {
    Overwrite,
    KeepExisting,
}

/// Result of merging an import into the library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub prompts: Vec<Prompt>,
    pub added: usize,
    pub replaced: usize,
    pub skipped: usize,
}

/// Order titles the way a user expects to read them: case-insensitive,
/// with an exact comparison to break ties.
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Sort prompts by title in place.
pub fn sort_prompts(prompts: &mut [Prompt]) {
    prompts.sort_by(|a, b| compare_titles(&a.title, &b.title));
}

/// Validate a manual edit; both parts are trimmed and required.
fn validated(title: &str, prompt: &str) -> Result<Prompt, JiraPromptError> {
    let title = title.trim();
    let prompt = prompt.trim();
    if title.is_empty() || prompt.is_empty() {
        return Err(JiraPromptError::Prompt(
            "Both title and prompt are required".to_string(),
        ));
    }
    Ok(Prompt::new(title, prompt))
}

fn check_index(prompts: &[Prompt], index: usize) -> Result<(), JiraPromptError> {
    if index >= prompts.len() {
        return Err(JiraPromptError::Prompt(format!(
            "no prompt at position {} (have {})",
            index + 1,
            prompts.len()
        )));
    }
    Ok(())
}

/// Append a new prompt. Titles are not checked for uniqueness here.
pub fn add(mut prompts: Vec<Prompt>, title: &str, prompt: &str) -> Result<Vec<Prompt>, JiraPromptError> {
    prompts.push(validated(title, prompt)?);
    Ok(prompts)
}

/// Replace the prompt at `index` (0-based, in sorted order).
pub fn update(
    mut prompts: Vec<Prompt>,
    index: usize,
    title: &str,
    prompt: &str,
) -> Result<Vec<Prompt>, JiraPromptError> {
    sort_prompts(&mut prompts);
    check_index(&prompts, index)?;
    prompts[index] = validated(title, prompt)?;
    Ok(prompts)
}

/// Remove the prompt at `index` (0-based, in sorted order), returning the
/// remaining list and the removed entry.
pub fn delete(mut prompts: Vec<Prompt>, index: usize) -> Result<(Vec<Prompt>, Prompt), JiraPromptError> {
    sort_prompts(&mut prompts);
    check_index(&prompts, index)?;
    let removed = prompts.remove(index);
    Ok((prompts, removed))
}

/// Render the library as CSV: a plain header row, then quoted data rows.
pub fn export_csv(prompts: &[Prompt]) -> Result<String, JiraPromptError> {
    if prompts.is_empty() {
        return Err(JiraPromptError::Prompt("No prompts to export.".to_string()));
    }
    let body = csv::encode_rows(prompts.iter().map(|p| [p.title.as_str(), p.prompt.as_str()]));
    Ok(format!("{CSV_HEADER}\r\n{body}"))
}

/// Parse an exported CSV back into prompts.
///
/// The first row is the header. Rows with fewer than two fields are
/// ignored; extra fields are dropped.
pub fn import_csv(text: &str) -> Result<Vec<Prompt>, JiraPromptError> {
    let rows = csv::parse(text);
    if rows.len() < 2 {
        return Err(JiraPromptError::Import(
            "CSV file contains no prompt entries.".to_string(),
        ));
    }

    let imported: Vec<Prompt> = rows
        .into_iter()
        .skip(1)
        .filter(|row| row.len() >= 2)
        .map(|mut row| {
            row.truncate(2);
            let prompt = row.pop().unwrap_or_default();
            let title = row.pop().unwrap_or_default();
            Prompt { title, prompt }
        })
        .collect();

    if imported.is_empty() {
        return Err(JiraPromptError::Import(
            "No valid prompts parsed from CSV.".to_string(),
        ));
    }
    Ok(imported)
}

/// Titles of imported prompts that already exist in the library, in import order.
pub fn duplicate_titles(existing: &[Prompt], imported: &[Prompt]) -> Vec<String> {
    imported
        .iter()
        .filter(|p| existing.iter().any(|e| e.title == p.title))
        .map(|p| p.title.clone())
        .collect()
}

/// Merge `imported` into `existing`.
///
/// `decide` is asked once, with every duplicate title, and only when there
/// is at least one duplicate. Its answer applies to all of them.
pub fn merge_imported<F>(existing: Vec<Prompt>, imported: Vec<Prompt>, decide: F) -> MergeOutcome
where
    F: FnOnce(&[String]) -> OverwriteDecision,
{
    let duplicates = duplicate_titles(&existing, &imported);
    let decision = if duplicates.is_empty() {
        OverwriteDecision::Overwrite
    } else {
        decide(&duplicates)
    };

    let mut merged = existing;
    let (mut added, mut replaced, mut skipped) = (0, 0, 0);

    for p in imported {
        match merged.iter().position(|x| x.title == p.title) {
            Some(idx) if decision == OverwriteDecision::Overwrite => {
                merged[idx] = p;
                replaced += 1;
            }
            Some(_) => skipped += 1,
            None => {
                merged.push(p);
                added += 1;
            }
        }
    }

    MergeOutcome {
        prompts: merged,
        added,
        replaced,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn library() -> Vec<Prompt> {
        vec![
            Prompt::new("Summarize", "Summarize the ticket."),
            Prompt::new("Estimate", "Estimate effort in days."),
        ]
    }

    #[test]
    fn test_sort_is_case_insensitive() {
        let mut prompts = vec![
            Prompt::new("beta", "b"),
            Prompt::new("Alpha", "a"),
            Prompt::new("alpha", "a2"),
            Prompt::new("Gamma", "g"),
        ];
        sort_prompts(&mut prompts);
        let titles: Vec<_> = prompts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha", "alpha", "beta", "Gamma"]);
    }

    #[test]
    fn test_add_requires_title_and_prompt() {
        let err = add(library(), "  ", "text").unwrap_err();
        assert_eq!(err.to_string(), "Both title and prompt are required");
        let err = add(library(), "Title", "\n").unwrap_err();
        assert_eq!(err.to_string(), "Both title and prompt are required");
    }

    #[test]
    fn test_add_trims_and_allows_duplicate_titles() {
        let prompts = add(library(), " Summarize ", " Again ").unwrap();
        assert_eq!(prompts.len(), 3);
        assert_eq!(prompts[2], Prompt::new("Summarize", "Again"));
    }

    #[test]
    fn test_update_uses_sorted_position() {
        // Sorted: Estimate, Summarize.
        let prompts = update(library(), 0, "Estimate", "Use story points.").unwrap();
        assert_eq!(prompts[0], Prompt::new("Estimate", "Use story points."));
        assert_eq!(prompts[1], Prompt::new("Summarize", "Summarize the ticket."));
    }

    #[test]
    fn test_delete_out_of_range() {
        let err = delete(library(), 5).unwrap_err();
        assert!(err.to_string().contains("no prompt at position 6"));
    }

    #[test]
    fn test_delete_returns_removed() {
        let (rest, removed) = delete(library(), 1).unwrap();
        assert_eq!(removed.title, "Summarize");
        assert_eq!(rest, vec![Prompt::new("Estimate", "Estimate effort in days.")]);
    }

    #[test]
    fn test_export_format() {
        let csv = export_csv(&[Prompt::new("Say \"hi\"", "a, b")]).unwrap();
        assert_eq!(csv, "Title,Prompt\r\n\"Say \"\"hi\"\"\",\"a, b\"");
    }

    #[test]
    fn test_export_empty_is_error() {
        let err = export_csv(&[]).unwrap_err();
        assert_eq!(err.to_string(), "No prompts to export.");
    }

    #[test]
    fn test_export_then_import_round_trip() {
        let prompts = vec![
            Prompt::new("Commas, everywhere", "one, two, three"),
            Prompt::new("Quotes \"here\"", "He said \"\"twice\"\""),
            Prompt::new("Multi\nline", "first line\r\nsecond line\nthird"),
        ];
        let csv = export_csv(&prompts).unwrap();
        assert_eq!(import_csv(&csv).unwrap(), prompts);
    }

    #[test]
    fn test_import_header_only() {
        let err = import_csv("Title,Prompt\r\n").unwrap_err();
        assert_eq!(err.to_string(), "CSV file contains no prompt entries.");
    }

    #[test]
    fn test_import_skips_short_rows() {
        let err = import_csv("Title,Prompt\nonlyone\nalsoone").unwrap_err();
        assert_eq!(err.to_string(), "No valid prompts parsed from CSV.");

        let prompts = import_csv("Title,Prompt\nonlyone\nA,B,extra").unwrap();
        assert_eq!(prompts, vec![Prompt::new("A", "B")]);
    }

    #[test]
    fn test_merge_without_duplicates_never_asks() {
        let asked = Cell::new(false);
        let outcome = merge_imported(library(), vec![Prompt::new("New", "n")], |_| {
            asked.set(true);
            OverwriteDecision::KeepExisting
        });
        assert!(!asked.get());
        assert_eq!(outcome.added, 1);
        assert_eq!(outcome.prompts.len(), 3);
    }

    #[test]
    fn test_merge_asks_once_with_all_duplicates() {
        let calls = Cell::new(0);
        let imported = vec![
            Prompt::new("Summarize", "new summary"),
            Prompt::new("Fresh", "f"),
            Prompt::new("Estimate", "new estimate"),
        ];
        let outcome = merge_imported(library(), imported, |dups| {
            calls.set(calls.get() + 1);
            assert_eq!(dups, ["Summarize".to_string(), "Estimate".to_string()]);
            OverwriteDecision::Overwrite
        });
        assert_eq!(calls.get(), 1);
        assert_eq!(outcome.replaced, 2);
        assert_eq!(outcome.added, 1);
        assert_eq!(outcome.prompts[0], Prompt::new("Summarize", "new summary"));
        assert_eq!(outcome.prompts[1], Prompt::new("Estimate", "new estimate"));
        assert_eq!(outcome.prompts[2], Prompt::new("Fresh", "f"));
    }

    #[test]
    fn test_merge_declined_keeps_existing_byte_identical() {
        let before = library();
        let outcome = merge_imported(
            before.clone(),
            vec![Prompt::new("Summarize", "hijacked"), Prompt::new("Other", "o")],
            |_| OverwriteDecision::KeepExisting,
        );
        assert_eq!(outcome.prompts[..2], before[..]);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.added, 1);
    }
}
