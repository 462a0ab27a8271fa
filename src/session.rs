//! The interactive game loop.
//!
//! A session walks through fixed phases: name, guide, optional tutorial,
//! every challenge in order, a summary, and an optional replay that starts
//! the challenges again. End of input at any prompt ends the session.

use crate::challenge::{Catalog, Guide};
use crate::display::{self, Style};
use crate::progress::{ProgressStore, UserProgress};
use crate::rng::Rng;
use crate::runner::ChallengeRunner;
use std::fmt;
use std::io::{self, BufRead, Write};
use tracing::debug;

/// Immutable content shared by everything a session touches.
#[derive(Debug, Clone)]
pub struct GameContext {
    catalog: Catalog,
}

impl GameContext {
    /// Wrap a loaded catalog.
    #[must_use]
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    /// Challenges and guides.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

/// Presentation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Emit ANSI styling.
    pub color: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { color: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    AskName,
    ChooseGuide,
    Tutorial,
    Challenge(usize),
    Retry(usize),
    Summary,
    Replay,
    Done,
}

/// One learner at one terminal.
pub struct Session<'a, R, W> {
    context: &'a GameContext,
    runner: ChallengeRunner,
    store: &'a dyn ProgressStore,
    input: R,
    output: W,
    style: Style,
    progress: UserProgress,
    guide: usize,
    lines: Rng,
}

impl<R, W> fmt::Debug for Session<'_, R, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("runner", &self.runner)
            .field("style", &self.style)
            .field("progress", &self.progress)
            .field("guide", &self.guide)
            .finish_non_exhaustive()
    }
}

impl<'a, R: BufRead, W: Write> Session<'a, R, W> {
    /// Set up a session reading from `input` and writing to `output`.
    pub fn new(
        context: &'a GameContext,
        config: SessionConfig,
        runner: ChallengeRunner,
        store: &'a dyn ProgressStore,
        input: R,
        output: W,
    ) -> Self {
        let lines = Rng::new(runner.config().seed);
        Self {
            context,
            runner,
            store,
            input,
            output,
            style: Style::new(config.color),
            progress: UserProgress::default(),
            guide: 0,
            lines,
        }
    }

    /// Play until the learner stops or input ends. Returns the learner's
    /// progress as it stands at the end.
    ///
    /// # Errors
    ///
    /// Terminal I/O failures and failures to save progress.
    pub fn run(mut self) -> io::Result<UserProgress> {
        writeln!(self.output, "{}", self.style.title("Welcome to codetrail!"))?;
        let mut phase = Phase::AskName;
        while phase != Phase::Done {
            debug!(?phase, "session phase");
            phase = match phase {
                Phase::AskName => self.ask_name()?,
                Phase::ChooseGuide => self.choose_guide()?,
                Phase::Tutorial => self.tutorial()?,
                Phase::Challenge(index) => self.challenge(index)?,
                Phase::Retry(index) => self.retry(index)?,
                Phase::Summary => self.summary()?,
                Phase::Replay => self.replay()?,
                Phase::Done => Phase::Done,
            };
        }
        writeln!(self.output, "Goodbye!")?;
        Ok(self.progress)
    }

    fn guide(&self) -> &'a Guide {
        let guides = self.context.catalog().guides();
        &guides[self.guide.min(guides.len() - 1)]
    }

    fn say(&mut self, line: &str) -> io::Result<()> {
        let text = display::speech(self.guide(), line, self.style);
        write!(self.output, "{text}")
    }

    /// Trimmed answer line; `None` at end of input.
    fn prompt(&mut self, question: &str) -> io::Result<Option<String>> {
        write!(self.output, "{question}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn ask_yes_no(&mut self, question: &str) -> io::Result<Option<bool>> {
        loop {
            let Some(answer) = self.prompt(&format!("{question} (y/n) "))? else {
                return Ok(None);
            };
            match answer.to_ascii_lowercase().as_str() {
                "y" | "yes" => return Ok(Some(true)),
                "n" | "no" => return Ok(Some(false)),
                _ => writeln!(self.output, "Please answer y or n.")?,
            }
        }
    }

    fn ask_name(&mut self) -> io::Result<Phase> {
        let Some(name) = self.prompt("What is your name? ")? else {
            return Ok(Phase::Done);
        };
        if name.is_empty() {
            return Ok(Phase::AskName);
        }
        self.progress = self.store.load(&name);
        if self.progress.score() > 0 {
            writeln!(
                self.output,
                "Welcome back, {name}! Your score is {}.",
                self.progress.score()
            )?;
        } else {
            writeln!(self.output, "Nice to meet you, {name}!")?;
        }
        Ok(Phase::ChooseGuide)
    }

    fn choose_guide(&mut self) -> io::Result<Phase> {
        let guides = self.context.catalog().guides();
        write!(self.output, "{}", display::guide_menu(guides, self.style))?;
        let Some(answer) = self.prompt(&format!("Enter 1-{}: ", guides.len()))? else {
            return Ok(Phase::Done);
        };
        match answer.parse::<usize>() {
            Ok(choice) if (1..=guides.len()).contains(&choice) => {
                self.guide = choice - 1;
                let greeting = self.guide().greeting.clone();
                self.say(&greeting)?;
                Ok(Phase::Tutorial)
            }
            _ => {
                writeln!(self.output, "That is not one of the choices.")?;
                Ok(Phase::ChooseGuide)
            }
        }
    }

    fn tutorial(&mut self) -> io::Result<Phase> {
        match self.ask_yes_no("Would you like a quick tutorial?")? {
            None => Ok(Phase::Done),
            Some(wanted) => {
                if wanted {
                    write!(self.output, "{}", display::primer(self.style))?;
                }
                Ok(Phase::Challenge(0))
            }
        }
    }

    fn challenge(&mut self, index: usize) -> io::Result<Phase> {
        let Some(challenge) = self.context.catalog().challenges().get(index) else {
            return Ok(Phase::Summary);
        };
        let report = self.runner.run_interactive(
            challenge,
            &mut self.input,
            &mut self.output,
            self.style,
            &mut self.progress,
            self.store,
        )?;
        let Some(report) = report else {
            return Ok(Phase::Done);
        };
        if report.passed() {
            let guide = self.guide();
            if let Some(line) = self.lines.choose(&guide.encouragements) {
                let line = line.clone();
                self.say(&line)?;
            }
            Ok(Phase::Challenge(index + 1))
        } else {
            let hint = format!("Hint: {}", challenge.hint);
            writeln!(self.output, "{}", self.style.dim(&hint))?;
            Ok(Phase::Retry(index))
        }
    }

    fn retry(&mut self, index: usize) -> io::Result<Phase> {
        Ok(match self.ask_yes_no("Try again?")? {
            None => Phase::Done,
            Some(true) => Phase::Challenge(index),
            Some(false) => Phase::Challenge(index + 1),
        })
    }

    fn summary(&mut self) -> io::Result<Phase> {
        let total = self.context.catalog().len();
        write!(
            self.output,
            "{}",
            display::summary(&self.progress, total, self.style)
        )?;
        Ok(Phase::Replay)
    }

    fn replay(&mut self) -> io::Result<Phase> {
        Ok(match self.ask_yes_no("Play the challenges again?")? {
            Some(true) => Phase::Challenge(0),
            None | Some(false) => Phase::Done,
        })
    }
}
