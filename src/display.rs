//! Terminal rendering for the game: styled text and the fixed screens.

use crate::challenge::{ChallengeSpec, Guide};
use crate::progress::UserProgress;
use crate::runner::{AttemptReport, END_SENTINEL, Verdict};
use crate::value::Bindings;
use crossterm::style::{Attribute, Color, Stylize};
use std::fmt::Write;

/// Whether output carries ANSI styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    color: bool,
}

impl Style {
    /// Styled when `color` is set.
    #[must_use]
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Never styled.
    #[must_use]
    pub fn plain() -> Self {
        Self::new(false)
    }

    fn paint(self, text: &str, color: Option<Color>, attribute: Option<Attribute>) -> String {
        if !self.color {
            return text.to_string();
        }
        let mut styled = text.stylize();
        if let Some(color) = color {
            styled = styled.with(color);
        }
        if let Some(attribute) = attribute {
            styled = styled.attribute(attribute);
        }
        styled.to_string()
    }

    /// Headings.
    #[must_use]
    pub fn title(self, text: &str) -> String {
        self.paint(text, None, Some(Attribute::Bold))
    }

    /// Passed attempts.
    #[must_use]
    pub fn success(self, text: &str) -> String {
        self.paint(text, Some(Color::Green), Some(Attribute::Bold))
    }

    /// Failed attempts.
    #[must_use]
    pub fn failure(self, text: &str) -> String {
        self.paint(text, Some(Color::Red), Some(Attribute::Bold))
    }

    /// Hints and secondary text.
    #[must_use]
    pub fn dim(self, text: &str) -> String {
        self.paint(text, None, Some(Attribute::Dim))
    }

    /// Guide speech and names.
    #[must_use]
    pub fn accent(self, text: &str) -> String {
        self.paint(text, Some(Color::Cyan), None)
    }
}

/// `a = 5, b = 8`, or `(none)`.
#[must_use]
pub fn bindings_summary(bindings: &Bindings) -> String {
    if bindings.is_empty() {
        return "(none)".to_string();
    }
    bindings
        .iter()
        .map(|(name, value)| format!("{name} = {}", value.repr()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// The challenge as shown before the learner types.
#[must_use]
pub fn challenge_card(challenge: &ChallengeSpec, completed: bool, style: Style) -> String {
    let mut card = String::new();
    let mut heading = format!("Challenge {}: {}", challenge.id, challenge.title);
    if completed {
        heading.push_str(" [completed]");
    }
    let _ = writeln!(card, "\n{}", style.title(&heading));
    let _ = writeln!(card, "{}", challenge.description);
    let _ = writeln!(
        card,
        "{}",
        style.dim(&format!("Starting values: {}", bindings_summary(&challenge.starter)))
    );
    card
}

/// Feedback for a finished attempt.
#[must_use]
pub fn feedback(report: &AttemptReport, style: Style) -> String {
    let mut text = String::new();
    if !report.output.is_empty() {
        let _ = writeln!(text, "{}", style.dim("Your code printed:"));
        for line in report.output.lines() {
            let _ = writeln!(text, "  {line}");
        }
    }
    match &report.verdict {
        Verdict::Passed if report.newly_completed => {
            let _ = writeln!(text, "{}", style.success("Correct! +1 point"));
        }
        Verdict::Passed => {
            let _ = writeln!(
                text,
                "{}",
                style.success("Correct! (already completed, no new point)")
            );
        }
        Verdict::Faulted { fault } => {
            let _ = writeln!(text, "{}", style.failure(&format!("Not yet: {fault}")));
        }
        Verdict::Mismatch { .. } => {
            let _ = writeln!(
                text,
                "{}",
                style.failure(&format!("Not quite: {}", report.verdict))
            );
        }
    }
    text
}

/// Numbered guide list.
#[must_use]
pub fn guide_menu(guides: &[Guide], style: Style) -> String {
    let mut menu = format!("{}\n", style.title("Choose your guide:"));
    for (i, guide) in guides.iter().enumerate() {
        let _ = writeln!(
            menu,
            "  {}. {} - {}",
            i + 1,
            style.accent(&guide.name),
            guide.tagline
        );
    }
    menu
}

/// Guide speech line.
#[must_use]
pub fn speech(guide: &Guide, line: &str, style: Style) -> String {
    format!("{}: {line}\n", style.accent(&guide.name))
}

/// Short tour of the snippet language.
#[must_use]
pub fn primer(style: Style) -> String {
    let mut text = format!("{}\n", style.title("How to play"));
    let lines = [
        "Each challenge gives you some starting variables and asks you to set others.".to_string(),
        format!("Write a few lines of code, then a line with only {END_SENTINEL} to submit."),
        String::new(),
        "  x = 3 + 4           assign a value".to_string(),
        "  if x > 5:           indent the body by four spaces".to_string(),
        "      print(x)        print shows a value".to_string(),
        "  for n in range(3):  loops over 0, 1, 2".to_string(),
        "  L = [1, 2, 3]       lists, 'text' strings, True and False".to_string(),
        String::new(),
        "Available helpers: print, range, len, sum, min, max, abs, sorted.".to_string(),
        "Imports are not allowed.".to_string(),
    ];
    for line in lines {
        let _ = writeln!(text, "{line}");
    }
    text
}

/// End-of-round score line.
#[must_use]
pub fn summary(progress: &UserProgress, total: usize, style: Style) -> String {
    format!(
        "\n{}\n",
        style.title(&format!(
            "{}, you have completed {} of {total} challenges. Score: {}",
            progress.user(),
            progress.score(),
            progress.score()
        ))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::Catalog;
    use crate::error::Fault;
    use crate::runner::AttemptState;

    fn report(verdict: Verdict, output: &str, newly_completed: bool) -> AttemptReport {
        AttemptReport {
            challenge_id: 1,
            verdict,
            states: vec![AttemptState::Failed],
            output: output.to_string(),
            fuel_used: 1,
            newly_completed,
        }
    }

    #[test]
    fn test_plain_style_has_no_escapes() {
        let style = Style::plain();
        assert_eq!(style.success("ok"), "ok");
        assert_eq!(style.failure("no"), "no");
    }

    #[test]
    fn test_color_style_emits_escapes() {
        let styled = Style::new(true).failure("no");
        assert!(styled.contains('\u{1b}'));
        assert!(styled.contains("no"));
    }

    #[test]
    fn test_challenge_card() {
        let catalog = Catalog::builtin().unwrap();
        let card = challenge_card(catalog.get(1).unwrap(), true, Style::plain());
        assert!(card.contains("Challenge 1: Add two numbers [completed]"));
        assert!(card.contains("Starting values: a = 5, b = 8"));
    }

    #[test]
    fn test_feedback_variants() {
        let passed = feedback(&report(Verdict::Passed, "13\n", true), Style::plain());
        assert!(passed.contains("  13"));
        assert!(passed.contains("+1 point"));

        let again = feedback(&report(Verdict::Passed, "", false), Style::plain());
        assert!(again.contains("already completed"));

        let fault = Fault::policy("import of 'os' is not allowed (line 1)");
        let rejected = feedback(&report(Verdict::Faulted { fault }, "", false), Style::plain());
        assert!(rejected.contains("policy violation"));
    }

    #[test]
    fn test_empty_bindings_summary() {
        assert_eq!(bindings_summary(&Bindings::new()), "(none)");
    }

    #[test]
    fn test_guide_menu_numbers_from_one() {
        let catalog = Catalog::builtin().unwrap();
        let menu = guide_menu(catalog.guides(), Style::plain());
        assert!(menu.contains("  1. Pixel the Robot"));
        assert!(menu.contains("  3. Captain Loop"));
    }
}
