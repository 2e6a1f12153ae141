use std::fmt;

use serde::Serialize;

/// A name-year citation found in the manuscript.
///
/// `complete` is true for citations taken from a parenthetical
/// "(Author 1990)" span and false for in-text "Author (1990)" ones, whose
/// author names may carry inflection suffixes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Citation {
    pub authors: Vec<String>,
    pub year: String,
    pub complete: bool,
}

impl Citation {
    pub fn new(authors: Vec<String>, year: impl Into<String>, complete: bool) -> Self {
        Self {
            authors,
            year: year.into(),
            complete,
        }
    }
}

impl fmt::Display for Citation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.complete {
            write!(f, "({} {})", self.authors.join(", "), self.year)
        } else {
            write!(f, "({}... {})", self.authors.join("..., "), self.year)
        }
    }
}

/// One bibliography line reduced to its matching key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BibEntry {
    pub key: String,
    pub line: String,
    pub has_year: bool,
}

/// How a single citation resolved against the bibliography.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CitationStatus {
    Resolved { reference: String },
    Ambiguous { candidates: Vec<String> },
    Missing,
}

#[derive(Debug, Clone, Serialize)]
pub struct CitationOutcome {
    pub citation: Citation,
    pub status: CitationStatus,
}

/// Data-quality findings. None of these stop a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    MissingPublicationYear { reference: String },
    DuplicateReferenceKey { key: String, first: String, duplicate: String },
    MissingReferenceForCitation { citation: Citation },
    AmbiguousCitation { citation: Citation, candidates: Vec<String> },
    UncitedReference { reference: String },
}

/// Per-reference citation tally.
#[derive(Debug, Clone, Serialize)]
pub struct ReferenceUsage {
    pub key: String,
    pub reference: String,
    pub citations: usize,
}

/// Everything `Matcher::cross_check` learned about one manuscript.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrossCheckReport {
    pub outcomes: Vec<CitationOutcome>,
    pub references: Vec<ReferenceUsage>,
    pub findings: Vec<Finding>,
    pub missing_reference_count: usize,
    pub uncited_reference_count: usize,
}

/// Aggregate counts handed to the reporting layer.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Summary {
    pub total_citations: usize,
    pub unique_citations: usize,
    pub total_references: usize,
    pub missing_reference_count: usize,
    pub uncited_reference_count: usize,
}

impl Summary {
    /// Share of unique citations without a reference; `None` when nothing was cited.
    pub fn missing_reference_ratio(&self) -> Option<f64> {
        percentage(self.missing_reference_count, self.unique_citations)
    }

    /// Share of references never cited; `None` for an empty bibliography.
    pub fn uncited_reference_ratio(&self) -> Option<f64> {
        percentage(self.uncited_reference_count, self.total_references)
    }
}

fn percentage(part: usize, whole: usize) -> Option<f64> {
    if whole == 0 {
        None
    } else {
        Some(100.0 * part as f64 / whole as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_complete_citation() {
        let c = Citation::new(vec!["Rasku".into(), "Hotokka".into()], "2013", true);
        assert_eq!(c.to_string(), "(Rasku, Hotokka 2013)");
    }

    #[test]
    fn display_incomplete_citation() {
        let c = Citation::new(vec!["Descartes".into(), "Platon".into()], "2003", false);
        assert_eq!(c.to_string(), "(Descartes..., Platon... 2003)");
    }

    #[test]
    fn summary_guards_empty_inputs() {
        let summary = Summary {
            total_citations: 0,
            unique_citations: 0,
            total_references: 0,
            missing_reference_count: 0,
            uncited_reference_count: 0,
        };
        assert!(summary.missing_reference_ratio().is_none());
        assert!(summary.uncited_reference_ratio().is_none());
    }

    #[test]
    fn summary_percentages() {
        let summary = Summary {
            total_citations: 861,
            unique_citations: 355,
            total_references: 295,
            missing_reference_count: 41,
            uncited_reference_count: 60,
        };
        let missing = summary.missing_reference_ratio().expect("should have a ratio");
        assert!((missing - 11.549).abs() < 0.01);
        let uncited = summary.uncited_reference_ratio().expect("should have a ratio");
        assert!((uncited - 20.338).abs() < 0.01);
    }
}
