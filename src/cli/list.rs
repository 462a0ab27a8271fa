//! List command implementation.

use super::{CliError, Settings};
use codetrail::display::Style;
use codetrail::{JsonFileStore, ProgressStore, UserProgress};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;

/// Execute the list command.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded.
pub(crate) fn execute(
    settings: &Settings,
    user: Option<String>,
    progress: PathBuf,
) -> Result<ExitCode, CliError> {
    let catalog = settings.load_catalog()?;
    let record = user.map(|user| JsonFileStore::new(progress).load(&user));
    let style = Style::new(settings.color && io::stdout().is_terminal());

    print!("{}", format_list(&catalog, record.as_ref(), style));
    Ok(ExitCode::SUCCESS)
}

fn format_list(
    catalog: &codetrail::Catalog,
    record: Option<&UserProgress>,
    style: Style,
) -> String {
    let mut output = String::new();
    output.push_str(&style.title(&format!("{} challenges", catalog.len())));
    output.push('\n');
    for challenge in catalog.challenges() {
        let mark = match record {
            Some(record) if record.is_completed(challenge.id) => style.success("[x] "),
            Some(_) => "[ ] ".to_string(),
            None => String::new(),
        };
        output.push_str(&format!("  {mark}{:>3}. {}\n", challenge.id, challenge.title));
    }
    if let Some(record) = record {
        output.push_str(&format!(
            "\n{}: {} of {} completed, score {}\n",
            record.user(),
            record.score(),
            catalog.len(),
            record.score()
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_list_marks_completed() {
        let catalog = codetrail::Catalog::builtin().unwrap();
        let mut record = UserProgress::new("ada");
        record.record_completion(2);
        let text = format_list(&catalog, Some(&record), Style::plain());
        assert!(text.contains("[ ]   1. Add two numbers"));
        assert!(text.contains("[x]   2. Even or odd"));
        assert!(text.contains("ada: 1 of"));
    }
}
