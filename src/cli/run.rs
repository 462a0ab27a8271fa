//! Run command implementation: one attempt, no prompts.

use super::output::{JsonAttempt, format_attempt_text};
use super::{CliError, OutputFormat, Settings};
use codetrail::display::Style;
use codetrail::{ChallengeRunner, JsonFileStore, ProgressStore};
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Execute the run command. Exits 0 when the snippet passes, 1 otherwise.
///
/// # Errors
///
/// Returns an error if the catalog or snippet cannot be read, the id is
/// unknown, or a pass cannot be saved.
pub(crate) fn execute(
    settings: &Settings,
    id: u32,
    file: &Path,
    user: Option<String>,
    progress: PathBuf,
    format: OutputFormat,
) -> Result<ExitCode, CliError> {
    let catalog = settings.load_catalog()?;
    let challenge = catalog
        .get(id)
        .ok_or_else(|| CliError::new(format!("No challenge with id {id}")))?;
    let source = read_source(file)?;
    let mut runner = ChallengeRunner::new(settings.runner_config()?);

    let report = match user {
        Some(user) => {
            let store = JsonFileStore::new(progress);
            let mut record = store.load(&user);
            runner.attempt(challenge, &source, &mut record, &store)?
        }
        None => runner.evaluate(challenge, &source),
    };

    match format {
        OutputFormat::Text => {
            let style = Style::new(settings.color && io::stdout().is_terminal());
            print!("{}", format_attempt_text(challenge, &report, style));
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&JsonAttempt::new(challenge, &report))?;
            println!("{json}");
        }
    }

    Ok(if report.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn read_source(file: &Path) -> Result<String, CliError> {
    if file == Path::new("-") {
        let mut source = String::new();
        io::stdin().read_to_string(&mut source)?;
        return Ok(source);
    }
    fs::read_to_string(file)
        .map_err(|e| CliError::new(format!("Failed to read {}: {e}", file.display())))
}
