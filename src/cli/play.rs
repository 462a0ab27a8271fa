//! Play command implementation.

use super::{CliError, Settings};
use codetrail::{
    ChallengeRunner, GameContext, JsonFileStore, MemoryStore, ProgressStore, Session,
    SessionConfig,
};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;

/// Execute the play command.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded, the terminal fails, or
/// progress cannot be saved.
pub(crate) fn execute(
    settings: &Settings,
    progress: PathBuf,
    no_save: bool,
) -> Result<ExitCode, CliError> {
    let context = GameContext::new(settings.load_catalog()?);
    let runner = ChallengeRunner::new(settings.runner_config()?);
    let store: Box<dyn ProgressStore> = if no_save {
        Box::new(MemoryStore::new())
    } else {
        Box::new(JsonFileStore::new(progress))
    };

    let stdout = io::stdout();
    let config = SessionConfig {
        color: settings.color && stdout.is_terminal(),
    };
    let session = Session::new(
        &context,
        config,
        runner,
        store.as_ref(),
        io::stdin().lock(),
        stdout.lock(),
    );
    let record = session.run()?;
    tracing::info!(user = record.user(), score = record.score(), "session ended");
    Ok(ExitCode::SUCCESS)
}
