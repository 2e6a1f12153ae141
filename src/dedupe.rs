use std::collections::HashSet;

use crate::types::Citation;

/// Drop repeated citations, keeping the first occurrence of each.
///
/// Two citations are the same when their author lists (in order), years and
/// completeness flags are equal.
pub fn dedupe(citations: &[Citation]) -> Vec<Citation> {
    let mut seen: HashSet<&Citation> = HashSet::with_capacity(citations.len());
    citations
        .iter()
        .filter(|c| seen.insert(*c))
        .cloned()
        .collect()
}
