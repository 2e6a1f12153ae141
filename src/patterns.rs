use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::{Config, ConfigError};

/// One capitalized surname. Apostrophes and hyphens cover "D'Alembert" and
/// "Flycht-Eriksson"; a possessive "'s" is matched here and split off by
/// [`split_possessive`].
const AUTHOR: &str = r"[A-Z][a-zA-Z'`-]+";

/// " 1990", "1990b", "1990."; the year itself is capture group 1.
const YEAR: &str = r" *((?:18|19|20)[0-9][0-9][a-z]?)\.?";

/// Lowercase words allowed between the authors and the year, e.g. "write",
/// "state", "in press".
const FILLER_WORD: &str = r"(?: ?[a-z]+ )";

/// Same as [`YEAR`] but with a named group, for use inside larger patterns.
const YEAR_NAMED: &str = r" *(?P<year>(?:18|19|20)[0-9][0-9][a-z]?)\.?";

/// In-text citations accept only a handful of words between the names and
/// the parenthesized year.
const MAX_TEXT_FILLER_WORDS: usize = 3;

static AUTHOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(AUTHOR).unwrap());

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(YEAR).unwrap());

/// The compiled recognition patterns for one configuration.
///
/// Built once up front and shared read-only by the extractor, the
/// bibliography keyer and the matcher.
#[derive(Debug, Clone)]
pub struct PatternSet {
    /// A single author token.
    pub author: Regex,
    /// A publication year; group 1 is the year without padding or period.
    pub year: Regex,
    /// Any parenthesized span holding a year. Group `inner` is the text
    /// between the parentheses, group `year` the year.
    pub citation_like: Regex,
    /// "Author, Author2 et al. 1990, p. 12-14" with the year in group `year`.
    pub parenthetical: Regex,
    /// "Author and Author2 write (1990)".
    pub in_text: Regex,
}

impl PatternSet {
    pub fn build(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        build_patterns(
            &config.connective_words,
            &config.page_markers,
            &config.etal_markers,
        )
    }
}

/// Compile the five recognition patterns from the configured marker words.
///
/// Markers are always escaped, so "p." matches a literal period.
pub fn build_patterns(
    connective_words: &[String],
    page_markers: &[String],
    etal_markers: &[String],
) -> Result<PatternSet, ConfigError> {
    let author_list = author_list_pattern(connective_words);
    let etal = etal_pattern(etal_markers);
    let pages = page_range_pattern(page_markers);
    let year = YEAR_NAMED;

    let parenthetical = format!(r"{author_list}{etal}{FILLER_WORD}*{year}{pages}?");
    let citation_like = format!(r"\((?P<inner>[^)]*?{year}{pages}?[^)]*?)\)");
    let in_text = format!(
        r"{author_list}{etal}{FILLER_WORD}{{0,{MAX_TEXT_FILLER_WORDS}}} ?\({year}{pages}?\)"
    );

    Ok(PatternSet {
        author: AUTHOR_RE.clone(),
        year: YEAR_RE.clone(),
        citation_like: Regex::new(&citation_like)?,
        parenthetical: Regex::new(&parenthetical)?,
        in_text: Regex::new(&in_text)?,
    })
}

/// Authors joined by a connective word, "&" or a comma, e.g.
/// "Rasku, Musliu & Karkkainen".
fn author_list_pattern(connective_words: &[String]) -> String {
    let mut joiners: Vec<String> = connective_words
        .iter()
        .map(|w| format!(" +{} +", regex::escape(w.trim())))
        .collect();
    joiners.push(" +& +".to_string());
    joiners.push(", +".to_string());
    format!(r"(?:{AUTHOR}(?:{})?)+", joiners.join("|"))
}

/// Optional "more authors" marker with an optional leading comma. A marker's
/// closing period is optional in the text, so "et al." also matches "et al".
/// The returned fragment is already optional.
fn etal_pattern(etal_markers: &[String]) -> String {
    let alternatives: Vec<String> = etal_markers
        .iter()
        .map(|m| {
            let m = m.trim();
            match m.strip_suffix('.') {
                Some(stem) => format!(r"{}\.?", regex::escape(stem)),
                None => regex::escape(m),
            }
        })
        .collect();
    if alternatives.is_empty() {
        return String::new();
    }
    format!(r"(?:,? (?:{}))?", alternatives.join("|"))
}

/// ", 30", ", p. 30-32", ", 4--12". An empty marker makes the prefix optional.
fn page_range_pattern(page_markers: &[String]) -> String {
    let words: Vec<String> = page_markers
        .iter()
        .filter(|m| !m.is_empty())
        .map(|m| regex::escape(m))
        .collect();
    let allows_bare = page_markers.is_empty() || page_markers.iter().any(|m| m.is_empty());

    let prefix = match (words.is_empty(), allows_bare) {
        (true, _) => String::new(),
        (false, false) => format!(r"(?:{}) +", words.join("|")),
        (false, true) => format!(r"(?:(?:{}) +)?", words.join("|")),
    };
    format!(r"(?:, +{prefix}[0-9]+(?:-+[0-9]+)?\.?)")
}

/// Split a matched author token into the surname and a possessive "'s".
pub fn split_possessive(token: &str) -> (&str, Option<&str>) {
    match token.strip_suffix("'s") {
        Some(name) if !name.is_empty() => (name, Some(&token[name.len()..])),
        _ => (token, None),
    }
}

/// All author surnames in `text`, in order of appearance.
pub fn find_authors(patterns: &PatternSet, text: &str) -> Vec<String> {
    patterns
        .author
        .find_iter(text)
        .map(|m| split_possessive(m.as_str()).0.to_string())
        .collect()
}

/// Every year in `text`, left to right, without padding or trailing period.
pub fn year_matches<'t>(
    patterns: &PatternSet,
    text: &'t str,
) -> impl Iterator<Item = regex::Match<'t>> {
    patterns
        .year
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
}
