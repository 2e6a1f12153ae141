use thiserror::Error;

pub const DEFAULT_CONNECTIVE_WORDS: &[&str] = &["and"];
pub const DEFAULT_MULTI_CITE_SEPARATORS: &[&str] = &[";"];
pub const DEFAULT_PAGE_MARKERS: &[&str] = &["p."];
pub const DEFAULT_ETAL_MARKERS: &[&str] = &["et al."];
/// Finnish "Raskun mukaan" needs one char eaten, "Virtasen" needs two.
pub const DEFAULT_SUFFIX_EAT: usize = 2;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("connective words must not be empty")]
    EmptyConnective,
    #[error("multi-citation separators must not be empty")]
    EmptySeparator,
    #[error("et al. markers must not be empty")]
    EmptyEtalMarker,
    #[error("marker {0:?} contains a parenthesis")]
    ParenthesisInMarker(String),
    #[error("marker {marker:?} is used both as {first} and as {second}")]
    ConflictingMarker {
        marker: String,
        first: &'static str,
        second: &'static str,
    },
    #[error("invalid citation pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Recognition and matching settings, fixed for the whole run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Words that join author names besides "&" and ",".
    pub connective_words: Vec<String>,
    /// Separators between several citations inside one pair of parentheses.
    pub multi_cite_separators: Vec<String>,
    /// Page-number prefixes. An empty string means pages may appear bare.
    pub page_markers: Vec<String>,
    pub etal_markers: Vec<String>,
    /// Upper bound on trailing chars stripped from in-text author names.
    pub suffix_eat: usize,
    /// Stop extracting once this many citations were collected.
    pub max_cites: Option<usize>,
    /// Require author names to match whole words in bibliography keys.
    pub strict_names: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connective_words: to_owned(DEFAULT_CONNECTIVE_WORDS),
            multi_cite_separators: to_owned(DEFAULT_MULTI_CITE_SEPARATORS),
            page_markers: to_owned(DEFAULT_PAGE_MARKERS),
            etal_markers: to_owned(DEFAULT_ETAL_MARKERS),
            suffix_eat: DEFAULT_SUFFIX_EAT,
            max_cites: None,
            strict_names: false,
        }
    }
}

impl Config {
    /// Add connective words on top of the current ones, skipping repeats.
    pub fn with_connective_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for word in words {
            let word = word.into();
            if !self.connective_words.contains(&word) {
                self.connective_words.push(word);
            }
        }
        self
    }

    /// Check that the markers can be turned into unambiguous patterns.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connective_words.iter().any(|w| w.trim().is_empty()) {
            return Err(ConfigError::EmptyConnective);
        }
        if self.multi_cite_separators.is_empty()
            || self.multi_cite_separators.iter().any(|s| s.is_empty())
        {
            return Err(ConfigError::EmptySeparator);
        }
        if self.etal_markers.iter().any(|m| m.trim().is_empty()) {
            return Err(ConfigError::EmptyEtalMarker);
        }

        let roles: [(&'static str, &[String]); 4] = [
            ("connective word", self.connective_words.as_slice()),
            ("multi-citation separator", self.multi_cite_separators.as_slice()),
            ("page marker", self.page_markers.as_slice()),
            ("et al. marker", self.etal_markers.as_slice()),
        ];
        for &(_, markers) in &roles {
            if let Some(m) = markers.iter().find(|m| m.contains(['(', ')'])) {
                return Err(ConfigError::ParenthesisInMarker(m.to_string()));
            }
        }
        for (i, &(first, a)) in roles.iter().enumerate() {
            for &(second, b) in &roles[i + 1..] {
                if let Some(m) = a.iter().find(|m| !m.is_empty() && b.contains(m)) {
                    return Err(ConfigError::ConflictingMarker {
                        marker: m.to_string(),
                        first,
                        second,
                    });
                }
            }
        }
        Ok(())
    }
}

fn to_owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
