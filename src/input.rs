use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::normalize::normalize;

/// Read the manuscript, one paragraph per line, with accents folded.
pub fn read_manuscript(path: &Path) -> Result<Vec<String>> {
    let text = read(path)?;
    let lines: Vec<String> = text.lines().map(normalize).collect();
    debug!(path = %path.display(), lines = lines.len(), "read manuscript");
    Ok(lines)
}

/// Read the bibliography, one reference per line. Blank lines are dropped.
pub fn read_bibliography(path: &Path) -> Result<Vec<String>> {
    let text = read(path)?;
    let refs = bibliography_lines(&text);
    debug!(path = %path.display(), references = refs.len(), "read bibliography");
    Ok(refs)
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn bibliography_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| normalize(line).trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bibliography_skips_blank_lines() {
        let text = "  Kärkkäinen, T. 2010. A.\n\n   \nRasku, J. 2013. B.  \n";
        assert_eq!(
            bibliography_lines(text),
            vec!["Karkkainen, T. 2010. A.", "Rasku, J. 2013. B."]
        );
    }

    #[test]
    fn missing_file_has_context() {
        let err = read_manuscript(Path::new("/nonexistent/manuscript.txt"))
            .expect_err("should fail");
        assert!(format!("{err:#}").contains("/nonexistent/manuscript.txt"));
    }
}
