use std::ops::Range;

use tracing::{debug, trace};

use crate::patterns::{self, PatternSet};
use crate::types::Citation;

/// Extract every name-year citation from one normalized manuscript line.
///
/// In-text citations ("Platon et al. state (2003)") come first, followed by
/// the parenthetical ones in order of appearance. A parenthesized year that
/// already belongs to an in-text citation is not extracted a second time.
pub fn extract_line(
    line: &str,
    patterns: &PatternSet,
    multi_cite_separators: &[String],
) -> Vec<Citation> {
    let mut citations = Vec::new();
    let text_spans = extract_in_text(line, patterns, &mut citations);
    extract_parenthetical(line, patterns, multi_cite_separators, &text_spans, &mut citations);
    citations
}

/// Extract citations from all lines, stopping once more than `max_cites`
/// citations were collected.
pub fn extract_lines<'a, I>(
    lines: I,
    patterns: &PatternSet,
    multi_cite_separators: &[String],
    max_cites: Option<usize>,
) -> Vec<Citation>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut all: Vec<Citation> = Vec::new();
    for (idx, line) in lines.into_iter().enumerate() {
        if max_cites.is_some_and(|max| all.len() > max) {
            debug!(line = idx + 1, "citation limit reached, stopping");
            break;
        }
        let found = extract_line(line, patterns, multi_cite_separators);
        if !found.is_empty() {
            trace!(line = idx + 1, count = found.len(), "citations on line");
        }
        all.extend(found);
    }
    all
}

/// "Author (Year)" forms. Returns the byte spans that were consumed.
fn extract_in_text(
    line: &str,
    patterns: &PatternSet,
    out: &mut Vec<Citation>,
) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    for caps in patterns.in_text.captures_iter(line) {
        let Some(whole) = caps.get(0) else { continue };
        trace!(text = whole.as_str(), "detected in-text citation");

        let authors = patterns::find_authors(patterns, whole.as_str());
        let Some(year) = caps.name("year") else { continue };
        if authors.is_empty() {
            continue;
        }
        let citation = Citation::new(authors, year.as_str(), false);
        trace!(citation = %citation, "extracted in-text citation");
        out.push(citation);
        spans.push(whole.range());
    }
    spans
}

/// "(Author Year; Author2 Year2)" forms.
fn extract_parenthetical(
    line: &str,
    patterns: &PatternSet,
    multi_cite_separators: &[String],
    text_spans: &[Range<usize>],
    out: &mut Vec<Citation>,
) {
    for caps in patterns.citation_like.captures_iter(line) {
        let (Some(whole), Some(inner), Some(year)) =
            (caps.get(0), caps.name("inner"), caps.name("year"))
        else {
            continue;
        };
        if is_bare_year(inner.as_str(), year.as_str())
            || text_spans.iter().any(|s| contains(s, &whole.range()))
        {
            continue;
        }
        trace!(text = inner.as_str(), "detected citation-like span");

        for segment in split_multi(inner.as_str(), multi_cite_separators) {
            match parse_segment(segment, patterns) {
                Some(citation) => {
                    trace!(citation = %citation, "extracted parenthetical citation");
                    out.push(citation);
                }
                None => trace!(segment, "segment is not a citation"),
            }
        }
    }
}

/// Apply the strict pattern to one segment of a parenthetical span.
fn parse_segment(segment: &str, patterns: &PatternSet) -> Option<Citation> {
    let caps = patterns.parenthetical.captures(segment)?;
    let whole = caps.get(0)?;
    let year = caps.name("year")?;
    let authors = patterns::find_authors(patterns, whole.as_str());
    if authors.is_empty() {
        return None;
    }
    Some(Citation::new(authors, year.as_str(), true))
}

/// "(2009)" on its own pairs with an author mentioned in the running text.
fn is_bare_year(inner: &str, year: &str) -> bool {
    inner.trim().trim_end_matches('.') == year
}

fn contains(outer: &Range<usize>, inner: &Range<usize>) -> bool {
    outer.start <= inner.start && inner.end <= outer.end
}

/// Split on every configured separator.
fn split_multi<'a>(text: &'a str, separators: &[String]) -> Vec<&'a str> {
    let mut segments = vec![text];
    for sep in separators.iter().filter(|s| !s.is_empty()) {
        segments = segments
            .into_iter()
            .flat_map(|s| s.split(sep.as_str()))
            .collect();
    }
    segments
}
