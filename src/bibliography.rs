use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::patterns::{self, PatternSet};
use crate::types::{BibEntry, Finding};

/// Leading reference labels such as "[2000a]" or "[Ath00]". Their years are
/// not publication years.
static LABEL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\[[^\]]*\]\s*").unwrap());

/// Reduce a bibliography line to its matching key: the text up to and
/// including the first publication year.
///
/// "Athens, P. 2000. The book." → "Athens, P. 2000". Without a year the key
/// is the line minus its last character and `has_year` is false.
pub fn key_of(line: &str, patterns: &PatternSet) -> BibEntry {
    let body = match LABEL_RE.find(line) {
        Some(m) => &line[m.end()..],
        None => line,
    };
    match first_year_end(body, patterns) {
        Some(end) => BibEntry {
            key: body[..end].to_string(),
            line: line.to_string(),
            has_year: true,
        },
        None => BibEntry {
            key: drop_last_char(line).to_string(),
            line: line.to_string(),
            has_year: false,
        },
    }
}

/// End offset of the first year that stands on its own: not inside a
/// bracket and not part of a longer number or word.
fn first_year_end(text: &str, patterns: &PatternSet) -> Option<usize> {
    patterns::year_matches(patterns, text)
        .find(|m| {
            let before = text[..m.start()].chars().next_back();
            let after = text[m.end()..].chars().next();
            !before.is_some_and(|c| c == '[' || c.is_ascii_alphanumeric())
                && !after.is_some_and(|c| c.is_ascii_digit())
        })
        .map(|m| m.end())
}

fn drop_last_char(line: &str) -> &str {
    match line.char_indices().next_back() {
        Some((idx, _)) => &line[..idx],
        None => line,
    }
}

/// The bibliography keyed for matching.
#[derive(Debug, Clone, Default)]
pub struct BibIndex {
    /// Every line with its key, in file order.
    pub entries: Vec<BibEntry>,
    /// Distinct keys in first-seen order.
    keys: Vec<String>,
    /// Key to the first line that produced it.
    key_to_line: HashMap<String, String>,
    /// Duplicate keys and missing years found while building.
    pub findings: Vec<Finding>,
}

impl BibIndex {
    pub fn build<S: AsRef<str>>(lines: &[S], patterns: &PatternSet) -> Self {
        let mut index = BibIndex::default();
        for line in lines {
            let entry = key_of(line.as_ref(), patterns);
            index.insert(entry);
        }
        index
    }

    fn insert(&mut self, entry: BibEntry) {
        if !entry.has_year {
            warn!(reference = %short(&entry.line, 60), "reference has no publication year");
            self.findings.push(Finding::MissingPublicationYear {
                reference: entry.line.clone(),
            });
        }
        match self.key_to_line.get(&entry.key) {
            Some(first) => {
                warn!(key = %entry.key, "non-unique or duplicate bibliography entry");
                self.findings.push(Finding::DuplicateReferenceKey {
                    key: entry.key.clone(),
                    first: first.clone(),
                    duplicate: entry.line.clone(),
                });
            }
            None => {
                self.key_to_line.insert(entry.key.clone(), entry.line.clone());
                self.keys.push(entry.key.clone());
            }
        }
        self.entries.push(entry);
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// The canonical (first-seen) line for a key.
    pub fn line_for(&self, key: &str) -> Option<&str> {
        self.key_to_line.get(key).map(String::as_str)
    }

}

/// First `max` chars of `text`, for log and report previews.
pub fn short(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
