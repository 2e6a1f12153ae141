mod bibliography;
mod config;
mod dedupe;
mod extract;
mod input;
mod matcher;
mod normalize;
mod patterns;
mod report;
mod types;

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};

use config::Config;
use matcher::{Matcher, WordBoundaryMatcher};
use patterns::PatternSet;
use report::ColorMode;
use types::Summary;

#[derive(Parser, Debug)]
#[command(
    name = "citecheck",
    version,
    about = "Cross-check name-year citations in a manuscript against its bibliography"
)]
struct Cli {
    /// The manuscript as plain text (1 line = 1 paragraph)
    textfile: PathBuf,

    /// The bibliography as plain text (1 line = 1 reference)
    bibfile: PathBuf,

    /// Multiple citations separator, e.g. "Author 1990; Author 1992" (repeatable)
    #[arg(short = 'm', value_name = "SEP")]
    multi_cite_sep: Vec<String>,

    /// Additional word to treat as "and" (repeatable, e.g. -a och -a und)
    #[arg(short = 'a', value_name = "WORD")]
    and_words: Vec<String>,

    /// Page number abbreviation; "" allows bare page numbers (repeatable)
    #[arg(short = 'p', value_name = "ABBR")]
    page_num_abbr: Vec<String>,

    /// Marker for further authors (repeatable)
    #[arg(long = "etal", value_name = "MARKER")]
    etal_markers: Vec<String>,

    /// Eat this many letters from the end of author names of in-text
    /// citations to remove inflection suffixes
    #[arg(short = 'e', default_value_t = config::DEFAULT_SUFFIX_EAT)]
    suffix_eat_cnt: usize,

    /// Stop after reading this many citations
    #[arg(long)]
    max_cites: Option<usize>,

    /// Only match author names as whole words in the bibliography
    #[arg(long)]
    strict_names: bool,

    /// Verbosity level (0-3)
    #[arg(short = 'v', default_value_t = 1)]
    verbosity: u8,

    /// Print the report as JSON
    #[arg(long, env = "CITECHECK_JSON")]
    json: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Disable colored output (also disabled by a non-empty NO_COLOR)
    #[arg(long)]
    no_color: bool,
}

impl Cli {
    fn config(&self) -> Config {
        let defaults = Config::default();
        let or_default = |given: &[String], default: Vec<String>| {
            if given.is_empty() { default } else { given.to_vec() }
        };
        Config {
            multi_cite_separators: or_default(&self.multi_cite_sep, defaults.multi_cite_separators.clone()),
            page_markers: or_default(&self.page_num_abbr, defaults.page_markers.clone()),
            etal_markers: or_default(&self.etal_markers, defaults.etal_markers.clone()),
            suffix_eat: self.suffix_eat_cnt,
            max_cites: self.max_cites,
            strict_names: self.strict_names,
            ..defaults
        }
        .with_connective_words(self.and_words.iter().cloned())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbosity);
    debug!(?cli, "CLI arguments parsed");

    let config = cli.config();
    let patterns = PatternSet::build(&config).context("Invalid citation configuration")?;

    let manuscript = input::read_manuscript(&cli.textfile)?;
    let bib = input::read_bibliography(&cli.bibfile)?;

    let mut cites = extract::extract_lines(
        manuscript.iter().map(String::as_str),
        &patterns,
        &config.multi_cite_separators,
        config.max_cites,
    );
    let mut unique = dedupe::dedupe(&cites);
    cites.sort();
    unique.sort();
    info!(cites = cites.len(), unique = unique.len(), references = bib.len(), "extraction done");

    let mut matcher = Matcher::new(&patterns, config.suffix_eat);
    if config.strict_names {
        matcher = matcher.with_author_matcher(Box::new(WordBoundaryMatcher));
    }
    let check = matcher.cross_check(&unique, &bib);

    let summary = Summary {
        total_citations: cites.len(),
        unique_citations: unique.len(),
        total_references: bib.len(),
        missing_reference_count: check.missing_reference_count,
        uncited_reference_count: check.uncited_reference_count,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if cli.json {
        let output = report::JsonOutput {
            summary,
            citations: &unique,
            report: &check,
        };
        return report::print_json(&mut out, &output, cli.pretty);
    }

    let color = ColorMode::detect(cli.no_color, io::stdout().is_terminal());
    if cli.verbosity > 0 {
        report::print_counts(&mut out, &summary)?;
    }
    report::print_findings(&mut out, &check, color)?;
    if cli.verbosity > 0 {
        report::print_summary(&mut out, &summary)?;
    }
    out.flush()?;
    Ok(())
}

/// `RUST_LOG` wins; otherwise the verbosity level picks the filter.
fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::CitationStatus;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("arguments should parse")
    }

    #[test]
    fn defaults_match_the_documented_ones() {
        let config = parse(&["citecheck", "thesis.txt", "bib.txt"]).config();
        assert_eq!(config.connective_words, vec!["and"]);
        assert_eq!(config.multi_cite_separators, vec![";"]);
        assert_eq!(config.page_markers, vec!["p."]);
        assert_eq!(config.etal_markers, vec!["et al."]);
        assert_eq!(config.suffix_eat, 2);
    }

    #[test]
    fn flags_override_defaults() {
        let config = parse(&[
            "citecheck", "vkirja.txt", "llue.txt", "-a", "ja", "-a", "und", "-e", "3", "-p", "",
            "-m", "/",
        ])
        .config();
        assert_eq!(config.connective_words, vec!["and", "ja", "und"]);
        assert_eq!(config.page_markers, vec![""]);
        assert_eq!(config.multi_cite_separators, vec!["/"]);
        assert_eq!(config.suffix_eat, 3);
        config.validate().expect("should validate");
    }

    #[test]
    fn pipeline_end_to_end() {
        let config = Config::default();
        let patterns = PatternSet::build(&config).expect("default patterns should compile");
        let manuscript = [
            "As noted (Rasku, Musliu & Karkkainen 2013; Bennett 1993), rostering is hard.",
            "Raskun (2013) mukaan asia on toisin, and (Anderws 2008) agrees.",
            "Again (Rasku, Musliu & Karkkainen 2013).",
        ];
        let bib = [
            "Rasku, J., Musliu, N. & Karkkainen, T. 2013. Automating rostering.",
            "Bennett, M. J. 1993. Towards Ethnorelativism.",
            "Bennett, J. M. 1993. Cultural Marginality.",
            "Colwell, S. 1998. Mentoring.",
        ];
        let cites = extract::extract_lines(manuscript, &patterns, &config.multi_cite_separators, None);
        assert_eq!(cites.len(), 5);
        let unique = dedupe::dedupe(&cites);
        assert_eq!(unique.len(), 4);

        let report = Matcher::new(&patterns, config.suffix_eat).cross_check(&unique, &bib);
        assert_eq!(report.missing_reference_count, 1);
        assert_eq!(report.uncited_reference_count, 1);
        let resolved = report
            .outcomes
            .iter()
            .filter(|o| matches!(o.status, CitationStatus::Resolved { .. }))
            .count();
        assert_eq!(resolved, 2);
    }
}
