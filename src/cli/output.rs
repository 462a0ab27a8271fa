//! Output formatting utilities for CLI.

use codetrail::display::{self, Style};
use codetrail::{AttemptReport, ChallengeSpec};
use serde::Serialize;

/// JSON-serializable attempt.
#[derive(Debug, Serialize)]
pub(super) struct JsonAttempt<'a> {
    /// Challenge title.
    pub(super) title: &'a str,
    /// Verdict, state trace, output and fuel.
    #[serde(flatten)]
    pub(super) report: &'a AttemptReport,
}

impl<'a> JsonAttempt<'a> {
    /// Pair a report with its challenge.
    pub(super) fn new(challenge: &'a ChallengeSpec, report: &'a AttemptReport) -> Self {
        Self {
            title: &challenge.title,
            report,
        }
    }
}

/// Format one attempt as human-readable text.
pub(super) fn format_attempt_text(
    challenge: &ChallengeSpec,
    report: &AttemptReport,
    style: Style,
) -> String {
    let mut output = String::new();
    output.push_str(&style.title(&format!(
        "Challenge {}: {}",
        challenge.id, challenge.title
    )));
    output.push('\n');
    output.push_str(&display::feedback(report, style));
    if !report.passed() {
        output.push_str(&style.dim(&format!("Hint: {}", challenge.hint)));
        output.push('\n');
    }
    output.push_str(&format!("Fuel used: {}\n", report.fuel_used));
    output
}

/// Outcome of one reference solution under `check`.
#[derive(Debug, Clone)]
pub(super) struct CheckEntry {
    /// Challenge id.
    pub(super) id: u32,
    /// Challenge title.
    pub(super) title: String,
    /// What running the solution produced.
    pub(super) report: AttemptReport,
}

/// JSON-serializable `check` summary.
#[derive(Debug, Serialize)]
pub(super) struct JsonCheckReport<'a> {
    /// Challenges checked.
    pub(super) total: usize,
    /// Solutions that pass.
    pub(super) passed: usize,
    /// Per-challenge results in id order.
    pub(super) results: Vec<JsonCheckEntry<'a>>,
}

/// JSON-serializable `check` entry.
#[derive(Debug, Serialize)]
pub(super) struct JsonCheckEntry<'a> {
    /// Challenge id.
    pub(super) id: u32,
    /// Challenge title.
    pub(super) title: &'a str,
    /// Whether the reference solution passes.
    pub(super) passed: bool,
    /// Why it failed; absent on a pass.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) reason: Option<String>,
    /// Fuel the solution burned.
    pub(super) fuel_used: u64,
}

impl<'a> JsonCheckReport<'a> {
    /// Build from check entries.
    pub(super) fn from_entries(entries: &'a [CheckEntry]) -> Self {
        Self {
            total: entries.len(),
            passed: entries.iter().filter(|e| e.report.passed()).count(),
            results: entries
                .iter()
                .map(|e| JsonCheckEntry {
                    id: e.id,
                    title: &e.title,
                    passed: e.report.passed(),
                    reason: (!e.report.passed()).then(|| e.report.verdict.to_string()),
                    fuel_used: e.report.fuel_used,
                })
                .collect(),
        }
    }
}

/// Format check results as human-readable text.
pub(super) fn format_check_text(entries: &[CheckEntry], style: Style) -> String {
    let mut output = String::new();
    for entry in entries {
        if entry.report.passed() {
            output.push_str(&format!(
                "  {} {:>3}. {} ({} fuel)\n",
                style.success("✓"),
                entry.id,
                entry.title,
                entry.report.fuel_used
            ));
        } else {
            output.push_str(&format!(
                "  {} {:>3}. {}: {}\n",
                style.failure("✗"),
                entry.id,
                entry.title,
                entry.report.verdict
            ));
        }
    }
    let passed = entries.iter().filter(|e| e.report.passed()).count();
    output.push_str(&format!(
        "\n{passed}/{} reference solutions pass\n",
        entries.len()
    ));
    output
}
