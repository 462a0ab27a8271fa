//! Check command implementation: prove every reference solution passes.

use super::output::{CheckEntry, JsonCheckReport, format_check_text};
use super::{CliError, OutputFormat, Settings};
use codetrail::ChallengeRunner;
use codetrail::display::Style;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::io::{self, IsTerminal};
use std::process::ExitCode;
use std::time::Instant;

/// Execute the check command. Exits 1 if any solution fails.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded.
pub(crate) fn execute(
    settings: &Settings,
    threads: Option<usize>,
    format: OutputFormat,
    progress: bool,
) -> Result<ExitCode, CliError> {
    let catalog = settings.load_catalog()?;
    let config = settings.runner_config()?;

    // Set thread pool size if specified
    if let Some(num_threads) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .ok(); // Ignore error if already initialized
    }

    let pb = if progress {
        let pb = ProgressBar::new(catalog.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} solutions")
                .map_err(|e| CliError::new(format!("Invalid progress template: {e}")))?
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    let start = Instant::now();

    // Each solution gets its own runner and therefore its own namespace
    let entries: Vec<CheckEntry> = catalog
        .challenges()
        .par_iter()
        .map(|challenge| {
            let mut runner = ChallengeRunner::new(config);
            let report = runner.evaluate(challenge, &challenge.solution);
            if let Some(pb) = &pb {
                pb.inc(1);
            }
            CheckEntry {
                id: challenge.id,
                title: challenge.title.clone(),
                report,
            }
        })
        .collect();

    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }
    let duration = start.elapsed();
    let all_pass = entries.iter().all(|e| e.report.passed());

    match format {
        OutputFormat::Text => {
            let style = Style::new(settings.color && io::stdout().is_terminal());
            print!("{}", format_check_text(&entries, style));
            println!("Duration: {:.2}s", duration.as_secs_f64());
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&JsonCheckReport::from_entries(&entries))?;
            println!("{json}");
        }
    }

    Ok(if all_pass {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}
