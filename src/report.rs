use std::ffi::OsStr;
use std::io::Write;

use owo_colors::OwoColorize;
use serde::Serialize;

use crate::bibliography::short;
use crate::types::{Citation, CrossCheckReport, Finding, Summary};

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    /// Color only on a terminal, unless `--no-color` or `NO_COLOR` says otherwise.
    pub fn detect(no_color_flag: bool, stdout_is_terminal: bool) -> Self {
        let env = std::env::var_os("NO_COLOR");
        ColorMode(stdout_is_terminal && !should_disable_color(no_color_flag, env.as_deref()))
    }

    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Any non-empty `NO_COLOR` value counts.
fn should_disable_color(no_color_flag: bool, no_color_env: Option<&OsStr>) -> bool {
    no_color_flag || no_color_env.is_some_and(|value| !value.is_empty())
}

/// Full machine-readable output.
#[derive(Debug, Serialize)]
pub struct JsonOutput<'a> {
    pub summary: Summary,
    pub citations: &'a [Citation],
    pub report: &'a CrossCheckReport,
}

pub fn print_json(w: &mut dyn Write, output: &JsonOutput<'_>, pretty: bool) -> anyhow::Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(output)?
    } else {
        serde_json::to_string(output)?
    };
    writeln!(w, "{json}")?;
    Ok(())
}

pub fn print_counts(w: &mut dyn Write, summary: &Summary) -> std::io::Result<()> {
    writeln!(w, "Read from files:")?;
    writeln!(w, "#cites: {}", summary.total_citations)?;
    writeln!(w, "#unique cites: {}", summary.unique_citations)?;
    writeln!(w, "#references: {}", summary.total_references)?;
    writeln!(w)
}

/// Print every finding, grouped the way they were discovered: bibliography
/// problems, then citation problems, then uncited references.
pub fn print_findings(
    w: &mut dyn Write,
    report: &CrossCheckReport,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w, "Detected problems:")?;
    let mut last_group = None;
    for finding in &report.findings {
        let group = finding_group(finding);
        if last_group.is_some_and(|g| g != group) {
            writeln!(w)?;
        }
        last_group = Some(group);
        print_finding(w, finding, color)?;
    }
    writeln!(w)
}

fn finding_group(finding: &Finding) -> u8 {
    match finding {
        Finding::MissingPublicationYear { .. } | Finding::DuplicateReferenceKey { .. } => 0,
        Finding::MissingReferenceForCitation { .. } | Finding::AmbiguousCitation { .. } => 1,
        Finding::UncitedReference { .. } => 2,
    }
}

fn print_finding(w: &mut dyn Write, finding: &Finding, color: ColorMode) -> std::io::Result<()> {
    match finding {
        Finding::MissingPublicationYear { reference } => {
            let msg = format!("Reference '{}...' has no publication year", short(reference, 60));
            write_colored(w, &msg, color, Tone::Warn)
        }
        Finding::DuplicateReferenceKey { first, duplicate, .. } => {
            write_colored(w, "Non-unique or duplicate bibliography entry:", color, Tone::Warn)?;
            writeln!(w, "\t{duplicate}")?;
            writeln!(w, "\t{first}")
        }
        Finding::MissingReferenceForCitation { citation } => {
            let msg = format!("No reference for citation ({citation})");
            write_colored(w, &msg, color, Tone::Error)
        }
        Finding::AmbiguousCitation { citation, candidates } => {
            let msg = format!("Citation ({citation}) is not unique, it can be any of these...");
            write_colored(w, &msg, color, Tone::Warn)?;
            for candidate in candidates {
                writeln!(w, "\t{}...'", short(candidate, 60))?;
            }
            Ok(())
        }
        Finding::UncitedReference { reference } => {
            let msg = format!("Reference '{}...' is not cited", short(reference, 50));
            write_colored(w, &msg, color, Tone::Dim)
        }
    }
}

pub fn print_summary(w: &mut dyn Write, summary: &Summary) -> std::io::Result<()> {
    writeln!(w, "Summary:")?;
    writeln!(
        w,
        "No reference for citation: {}/{} ({})",
        summary.missing_reference_count,
        summary.unique_citations,
        format_ratio(summary.missing_reference_ratio())
    )?;
    writeln!(
        w,
        "Reference was not cited: {}/{} ({})",
        summary.uncited_reference_count,
        summary.total_references,
        format_ratio(summary.uncited_reference_ratio())
    )
}

fn format_ratio(ratio: Option<f64>) -> String {
    match ratio {
        Some(r) => format!("{r:.2}%"),
        None => "n/a".to_string(),
    }
}

#[derive(Clone, Copy)]
enum Tone {
    Error,
    Warn,
    Dim,
}

fn write_colored(w: &mut dyn Write, msg: &str, color: ColorMode, tone: Tone) -> std::io::Result<()> {
    if !color.enabled() {
        return writeln!(w, "{msg}");
    }
    match tone {
        Tone::Error => writeln!(w, "{}", msg.red()),
        Tone::Warn => writeln!(w, "{}", msg.yellow()),
        Tone::Dim => writeln!(w, "{}", msg.dimmed()),
    }
}
