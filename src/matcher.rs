use std::collections::HashMap;

use tracing::{debug, info};

use crate::bibliography::BibIndex;
use crate::patterns::PatternSet;
use crate::types::{
    Citation, CitationOutcome, CitationStatus, CrossCheckReport, Finding, ReferenceUsage,
};

/// Locates an author name inside a bibliography key or line.
pub trait AuthorMatcher {
    /// Byte offset of `author` in `haystack`, searching from `from` onwards.
    fn find(&self, author: &str, haystack: &str, from: usize) -> Option<usize>;
}

/// Plain substring search. "Rasku" also matches inside "Rasku-Puttonen".
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringMatcher;

impl AuthorMatcher for SubstringMatcher {
    fn find(&self, author: &str, haystack: &str, from: usize) -> Option<usize> {
        haystack.get(from..)?.find(author).map(|pos| from + pos)
    }
}

/// Substring search that only accepts whole words.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordBoundaryMatcher;

impl AuthorMatcher for WordBoundaryMatcher {
    fn find(&self, author: &str, haystack: &str, from: usize) -> Option<usize> {
        let mut start = from;
        while let Some(pos) = SubstringMatcher.find(author, haystack, start) {
            let end = pos + author.len();
            let before = haystack[..pos].chars().next_back();
            let after = haystack[end..].chars().next();
            if !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
            {
                return Some(pos);
            }
            start = pos + author.chars().next().map_or(1, char::len_utf8);
        }
        None
    }
}

/// Cross-checks citations against a bibliography.
pub struct Matcher<'p> {
    patterns: &'p PatternSet,
    suffix_eat: usize,
    author_matcher: Box<dyn AuthorMatcher>,
}

impl<'p> Matcher<'p> {
    pub fn new(patterns: &'p PatternSet, suffix_eat: usize) -> Self {
        Self {
            patterns,
            suffix_eat,
            author_matcher: Box::new(SubstringMatcher),
        }
    }

    pub fn with_author_matcher(mut self, author_matcher: Box<dyn AuthorMatcher>) -> Self {
        self.author_matcher = author_matcher;
        self
    }

    /// Key the bibliography lines, then check every citation against them.
    ///
    /// `citations` should already be deduplicated; each entry is reported once.
    pub fn cross_check<S: AsRef<str>>(
        &self,
        citations: &[Citation],
        bib_lines: &[S],
    ) -> CrossCheckReport {
        let index = BibIndex::build(bib_lines, self.patterns);
        self.cross_check_index(citations, &index)
    }

    pub fn cross_check_index(&self, citations: &[Citation], index: &BibIndex) -> CrossCheckReport {
        let mut report = CrossCheckReport {
            findings: index.findings.clone(),
            ..CrossCheckReport::default()
        };
        let mut counts: HashMap<&str, usize> =
            index.keys().iter().map(|k| (k.as_str(), 0)).collect();

        for citation in citations {
            let keys = self.find_references(citation, index);
            for key in &keys {
                if let Some(count) = counts.get_mut(key.as_str()) {
                    *count += 1;
                }
            }
            let status = classify(citation, &keys, index, &mut report);
            report.outcomes.push(CitationOutcome {
                citation: citation.clone(),
                status,
            });
        }

        for key in index.keys() {
            let citations = counts.get(key.as_str()).copied().unwrap_or(0);
            let reference = index.line_for(key).unwrap_or(key).to_string();
            if citations == 0 {
                report.uncited_reference_count += 1;
                report.findings.push(Finding::UncitedReference {
                    reference: reference.clone(),
                });
            }
            report.references.push(ReferenceUsage {
                key: key.clone(),
                reference,
                citations,
            });
        }

        info!(
            citations = citations.len(),
            references = index.keys().len(),
            missing = report.missing_reference_count,
            uncited = report.uncited_reference_count,
            "cross-check complete"
        );
        report
    }

    /// Keys of every reference the citation could point to.
    ///
    /// Tries, in order: authors in citation order within the keys; for
    /// in-text citations, the same with 1..=`suffix_eat` trailing chars
    /// removed from each name; finally, authors in any order anywhere in the
    /// full reference lines (covers editors).
    pub fn find_references(&self, citation: &Citation, index: &BibIndex) -> Vec<String> {
        let authors: Vec<&str> = citation.authors.iter().map(String::as_str).collect();
        let mut keys = self.match_keys(&authors, &citation.year, index.keys());

        if keys.is_empty() && !citation.complete {
            for eat in 1..=self.suffix_eat {
                let stripped: Vec<&str> = authors.iter().map(|a| eat_suffix(a, eat)).collect();
                keys = self.match_keys(&stripped, &citation.year, index.keys());
                if !keys.is_empty() {
                    debug!(%citation, eat, "matched after stripping name suffixes");
                    break;
                }
            }
        }

        if keys.is_empty() {
            keys = self.match_full_text(&authors, &citation.year, index);
            if !keys.is_empty() {
                debug!(%citation, "matched in full reference text");
            }
        }
        keys
    }

    /// Keys containing the year and every author in the given order.
    pub fn match_keys(&self, authors: &[&str], year: &str, keys: &[String]) -> Vec<String> {
        keys.iter()
            .filter(|key| key.contains(year) && self.in_order(authors, key))
            .cloned()
            .collect()
    }

    /// Each author is searched at or after the previous author's position,
    /// so a repeated surname may match the same occurrence.
    fn in_order(&self, authors: &[&str], haystack: &str) -> bool {
        let mut from = 0;
        for author in authors {
            match self.author_matcher.find(author, haystack, from) {
                Some(pos) => from = pos,
                None => return false,
            }
        }
        true
    }

    fn match_full_text(&self, authors: &[&str], year: &str, index: &BibIndex) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for entry in &index.entries {
            let line = entry.line.as_str();
            let all_present = authors
                .iter()
                .all(|a| self.author_matcher.find(a, line, 0).is_some());
            if all_present && line.contains(year) && !keys.contains(&entry.key) {
                keys.push(entry.key.clone());
            }
        }
        keys
    }
}

fn classify(
    citation: &Citation,
    keys: &[String],
    index: &BibIndex,
    report: &mut CrossCheckReport,
) -> CitationStatus {
    let line_of = |key: &String| index.line_for(key).unwrap_or(key).to_string();
    match keys {
        [] => {
            report.missing_reference_count += 1;
            report.findings.push(Finding::MissingReferenceForCitation {
                citation: citation.clone(),
            });
            CitationStatus::Missing
        }
        [key] => CitationStatus::Resolved {
            reference: line_of(key),
        },
        _ => {
            let candidates: Vec<String> = keys.iter().map(line_of).collect();
            report.findings.push(Finding::AmbiguousCitation {
                citation: citation.clone(),
                candidates: candidates.clone(),
            });
            CitationStatus::Ambiguous { candidates }
        }
    }
}

/// Remove up to `count` trailing chars, always keeping the first one.
fn eat_suffix(name: &str, count: usize) -> &str {
    let len = name.chars().count();
    let keep = len.saturating_sub(count).max(1);
    match name.char_indices().nth(keep) {
        Some((idx, _)) => &name[..idx],
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn defaults() -> PatternSet {
        PatternSet::build(&Config::default()).expect("default patterns should compile")
    }

    fn cite(authors: &[&str], year: &str, complete: bool) -> Citation {
        Citation::new(authors.iter().map(|a| a.to_string()).collect(), year, complete)
    }

    const RASKU: &str = "Rasku, J., Musliu, N. & Karkkainen, T. 2013. Automating the personnel rostering.";

    #[test]
    fn resolves_single_reference() {
        let p = defaults();
        let report = Matcher::new(&p, 2).cross_check(
            &[cite(&["Rasku", "Musliu", "Karkkainen"], "2013", true)],
            &[RASKU],
        );
        assert_eq!(
            report.outcomes[0].status,
            CitationStatus::Resolved { reference: RASKU.into() }
        );
        assert_eq!(report.missing_reference_count, 0);
        assert_eq!(report.uncited_reference_count, 0);
        assert_eq!(report.references[0].citations, 1);
    }

    #[test]
    fn ambiguous_citation_lists_all_candidates() {
        let p = defaults();
        let bib = [
            "Bennett, M. J. 1993. Towards Ethnorelativism: A developmental model.",
            "Bennett, J. M. 1993. Cultural Marginality. Identity Issues.",
        ];
        let report = Matcher::new(&p, 2).cross_check(&[cite(&["Bennett"], "1993", true)], &bib);
        match &report.outcomes[0].status {
            CitationStatus::Ambiguous { candidates } => assert_eq!(candidates.len(), 2),
            other => panic!("expected ambiguity, got {other:?}"),
        }
        assert!(report.references.iter().all(|r| r.citations == 1));
        assert_eq!(report.uncited_reference_count, 0);
        assert!(report
            .findings
            .iter()
            .any(|f| matches!(f, Finding::AmbiguousCitation { candidates, .. } if candidates.len() == 2)));
    }

    #[test]
    fn suffix_stripping_recovers_inflected_names() {
        let p = defaults();
        let bib = [RASKU, "Rask, A. 2013. Another paper."];
        let citation = cite(&["Raskun"], "2013", false);

        let report = Matcher::new(&p, 2).cross_check(std::slice::from_ref(&citation), &bib);
        assert_eq!(
            report.outcomes[0].status,
            CitationStatus::Resolved { reference: RASKU.into() }
        );

        let report = Matcher::new(&p, 0).cross_check(&[citation], &bib);
        assert_eq!(report.outcomes[0].status, CitationStatus::Missing);
        assert_eq!(report.missing_reference_count, 1);
    }

    #[test]
    fn complete_citations_are_not_stripped() {
        let p = defaults();
        let report = Matcher::new(&p, 2).cross_check(&[cite(&["Raskun"], "2013", true)], &[RASKU]);
        assert_eq!(report.outcomes[0].status, CitationStatus::Missing);
    }

    #[test]
    fn key_search_enforces_author_order() {
        let p = defaults();
        let index = BibIndex::build(&[RASKU], &p);
        let matcher = Matcher::new(&p, 2);
        assert!(matcher.match_keys(&["Musliu", "Rasku"], "2013", index.keys()).is_empty());
        assert_eq!(matcher.match_keys(&["Rasku", "Musliu"], "2013", index.keys()).len(), 1);

        // The full-text fallback ignores order.
        let keys = matcher.find_references(&cite(&["Musliu", "Rasku"], "2013", true), &index);
        assert_eq!(keys, vec!["Rasku, J., Musliu, N. & Karkkainen, T. 2013".to_string()]);
    }

    #[test]
    fn key_search_allows_overlapping_names() {
        let p = defaults();
        let index = BibIndex::build(
            &["Smith, J. 2000. Twice.", "Rasku-Puttonen, H. 1988. Hyphenated."],
            &p,
        );
        let matcher = Matcher::new(&p, 0);
        assert_eq!(
            matcher.match_keys(&["Smith", "Smith"], "2000", index.keys()),
            vec!["Smith, J. 2000".to_string()]
        );
        assert_eq!(
            matcher.match_keys(&["Rasku-Puttonen", "Puttonen"], "1988", index.keys()),
            vec!["Rasku-Puttonen, H. 1988".to_string()]
        );
    }

    #[test]
    fn suffix_stripping_runs_before_full_text_fallback() {
        let p = defaults();
        let bib = ["Rasku, J. 2013. A.", "Smith, A. 2013. On Raskun's work."];
        let index = BibIndex::build(&bib, &p);
        let citation = cite(&["Raskun"], "2013", false);

        let keys = Matcher::new(&p, 2).find_references(&citation, &index);
        assert_eq!(keys, vec!["Rasku, J. 2013".to_string()]);

        // Without stripping only the full text mentions the inflected name.
        let keys = Matcher::new(&p, 0).find_references(&citation, &index);
        assert_eq!(keys, vec!["Smith, A. 2013".to_string()]);
    }

    #[test]
    fn full_text_fallback_can_be_ambiguous() {
        let p = defaults();
        let bib = [
            "Jones, A. 2001. A chapter. In Smith, B. (ed.) The Book. London.",
            "Brown, C. 2001. Another chapter. In Smith, B. (ed.) The Book. London.",
        ];
        let index = BibIndex::build(&bib, &p);
        let matcher = Matcher::new(&p, 2);
        let citation = cite(&["Smith"], "2001", true);

        let keys = matcher.find_references(&citation, &index);
        assert_eq!(keys, vec!["Jones, A. 2001".to_string(), "Brown, C. 2001".to_string()]);

        let report = matcher.cross_check_index(&[citation], &index);
        assert_eq!(
            report.outcomes[0].status,
            CitationStatus::Ambiguous {
                candidates: bib.iter().map(|l| l.to_string()).collect()
            }
        );
        assert!(report.references.iter().all(|r| r.citations == 1));
        assert_eq!(report.uncited_reference_count, 0);
    }

    #[test]
    fn full_text_fallback_finds_editors() {
        let p = defaults();
        let line = "Jones, A. 2001. A chapter. In Smith, B. (ed.) The Book. London.";
        let report = Matcher::new(&p, 2).cross_check(&[cite(&["Smith"], "2001", true)], &[line]);
        assert_eq!(
            report.outcomes[0].status,
            CitationStatus::Resolved { reference: line.into() }
        );
    }

    #[test]
    fn uncited_reference_reported_once_despite_duplicates() {
        let p = defaults();
        let bib = [
            "Colwell, S. 1998. Mentoring, socialisation and the mentor.",
            "Colwell, S. 1998. Mentoring, socialisation and the mentor (reprint).",
            RASKU,
        ];
        let report = Matcher::new(&p, 2).cross_check(&[cite(&["Rasku"], "2013", true)], &bib);
        let uncited: Vec<_> = report
            .findings
            .iter()
            .filter(|f| matches!(f, Finding::UncitedReference { .. }))
            .collect();
        assert_eq!(uncited.len(), 1);
        assert_eq!(report.uncited_reference_count, 1);
        assert!(report
            .findings
            .iter()
            .any(|f| matches!(f, Finding::DuplicateReferenceKey { .. })));
    }

    #[test]
    fn missing_reference_end_to_end() {
        let p = defaults();
        let bib = [
            "Bennett, M. J. 1993. Towards Ethnorelativism.",
            "Campinha-Bacote, J. 1999. The Model and Instrument.",
        ];
        let report = Matcher::new(&p, 2).cross_check(&[cite(&["Anderws"], "2008", false)], &bib);
        assert_eq!(report.missing_reference_count, 1);
        assert_eq!(report.outcomes[0].status, CitationStatus::Missing);
        assert_eq!(report.uncited_reference_count, 2);
    }

    #[test]
    fn strict_names_reject_partial_words() {
        let p = defaults();
        let index = BibIndex::build(&[RASKU], &p);
        let loose = Matcher::new(&p, 0);
        let strict = Matcher::new(&p, 0).with_author_matcher(Box::new(WordBoundaryMatcher));
        assert_eq!(loose.match_keys(&["Rask"], "2013", index.keys()).len(), 1);
        assert!(strict.match_keys(&["Rask"], "2013", index.keys()).is_empty());
        assert_eq!(strict.match_keys(&["Rasku"], "2013", index.keys()).len(), 1);
    }

    #[test]
    fn eat_suffix_keeps_first_char() {
        assert_eq!(eat_suffix("Raskun", 1), "Rasku");
        assert_eq!(eat_suffix("Virtasen", 2), "Virtas");
        assert_eq!(eat_suffix("Li", 5), "L");
    }
}
