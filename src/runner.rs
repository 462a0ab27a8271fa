//! Challenge runner: drives one attempt through vetting, execution and
//! verification, and records a pass.
//!
//! ```text
//! Presenting -> AwaitingCode -> Vetting -> Executing -> Verifying -> Passed
//!                                  |           |            |
//!                                  +-----------+------------+-----> Failed
//! ```

use crate::challenge::ChallengeSpec;
use crate::display::{self, Style};
use crate::error::Fault;
use crate::progress::{ProgressStore, UserProgress};
use crate::rng::Rng;
use crate::sandbox::{ExecutionOutcome, Sandbox, SandboxConfig};
use crate::value::Value;
use crate::verifier::{self, VerificationResult};
use crate::vetter;
use serde::Serialize;
use std::fmt;
use std::io::{self, BufRead, Write};
use tracing::{debug, info};

/// Line that ends a snippet typed at the prompt.
pub const END_SENTINEL: &str = "END";

/// Stage of one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptState {
    /// The challenge is being shown.
    Presenting,
    /// Waiting for snippet lines.
    AwaitingCode,
    /// Screening the snippet.
    Vetting,
    /// Running the snippet in the sandbox.
    Executing,
    /// Comparing bindings with the expected values.
    Verifying,
    /// Terminal: the attempt passed.
    Passed,
    /// Terminal: the attempt failed.
    Failed,
}

impl AttemptState {
    /// Whether the attempt is over.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, AttemptState::Passed | AttemptState::Failed)
    }
}

/// Runner configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunnerConfig {
    /// Seed applied to the randomness source before every attempt.
    pub seed: u64,
    /// Sandbox limits.
    pub sandbox: SandboxConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            sandbox: SandboxConfig::default(),
        }
    }
}

/// Why an attempt ended the way it did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    /// Every expected value matched.
    Passed,
    /// Rejected by the vetter or faulted while running.
    Faulted {
        /// What went wrong.
        fault: Fault,
    },
    /// Ran, but left the wrong state behind.
    Mismatch {
        /// First offending variable.
        name: String,
        /// Value the challenge expects.
        expected: Value,
        /// Value found; `None` when unbound.
        actual: Option<Value>,
    },
}

impl From<VerificationResult> for Verdict {
    fn from(result: VerificationResult) -> Self {
        match result {
            VerificationResult::Pass => Verdict::Passed,
            VerificationResult::Fail {
                name,
                expected,
                actual,
            } => Verdict::Mismatch {
                name,
                expected,
                actual,
            },
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Passed => write!(f, "passed"),
            Verdict::Faulted { fault } => write!(f, "{fault}"),
            Verdict::Mismatch {
                name,
                expected,
                actual,
            } => {
                let result = VerificationResult::Fail {
                    name: name.clone(),
                    expected: expected.clone(),
                    actual: actual.clone(),
                };
                write!(f, "{result}")
            }
        }
    }
}

/// Everything one attempt produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptReport {
    /// Challenge attempted.
    pub challenge_id: u32,
    /// Outcome and reason.
    #[serde(flatten)]
    pub verdict: Verdict,
    /// States visited, ending in `Passed` or `Failed`.
    pub states: Vec<AttemptState>,
    /// Printed output of a successful run.
    pub output: String,
    /// Fuel the sandbox burned.
    pub fuel_used: u64,
    /// Whether this attempt earned a point.
    pub newly_completed: bool,
}

impl AttemptReport {
    /// Whether the attempt passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Passed
    }

    /// Terminal state.
    #[must_use]
    pub fn final_state(&self) -> AttemptState {
        self.states.last().copied().unwrap_or(AttemptState::Failed)
    }
}

/// Runs attempts against challenges.
#[derive(Debug, Clone, Copy)]
pub struct ChallengeRunner {
    config: RunnerConfig,
    sandbox: Sandbox,
    rng: Rng,
}

impl ChallengeRunner {
    /// Create a runner.
    #[must_use]
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            config,
            sandbox: Sandbox::new(config.sandbox),
            rng: Rng::new(config.seed),
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Randomness source of the current attempt; reseeded before each one.
    pub fn rng(&mut self) -> &mut Rng {
        &mut self.rng
    }

    /// Vet, run and verify `source`. Touches no progress.
    pub fn evaluate(&mut self, challenge: &ChallengeSpec, source: &str) -> AttemptReport {
        self.rng.reseed(self.config.seed);
        let mut states = vec![
            AttemptState::Presenting,
            AttemptState::AwaitingCode,
            AttemptState::Vetting,
        ];
        let failed = |mut states: Vec<AttemptState>, fault: Fault, fuel_used: u64| {
            states.push(AttemptState::Failed);
            AttemptReport {
                challenge_id: challenge.id,
                verdict: Verdict::Faulted { fault },
                states,
                output: String::new(),
                fuel_used,
                newly_completed: false,
            }
        };

        debug!(challenge = challenge.id, "vetting snippet");
        let program = match vetter::vet(source) {
            Ok(program) => program,
            Err(fault) => {
                debug!(challenge = challenge.id, %fault, "snippet rejected");
                return failed(states, fault, 0);
            }
        };

        states.push(AttemptState::Executing);
        let execution = self.sandbox.execute(&program, &challenge.starter);
        let bindings = match execution.outcome {
            ExecutionOutcome::Success(bindings) => bindings,
            ExecutionOutcome::Failure(fault) => {
                return failed(states, fault, execution.fuel_used);
            }
        };

        states.push(AttemptState::Verifying);
        let result = verifier::verify(&bindings, &challenge.expected);
        debug!(challenge = challenge.id, passed = result.is_pass(), "verified");
        states.push(if result.is_pass() {
            AttemptState::Passed
        } else {
            AttemptState::Failed
        });

        AttemptReport {
            challenge_id: challenge.id,
            verdict: result.into(),
            states,
            output: execution.output,
            fuel_used: execution.fuel_used,
            newly_completed: false,
        }
    }

    /// Evaluate `source` and, on a pass, record the completion and persist
    /// it before returning.
    ///
    /// # Errors
    ///
    /// Propagates a failure to save progress.
    pub fn attempt(
        &mut self,
        challenge: &ChallengeSpec,
        source: &str,
        progress: &mut UserProgress,
        store: &dyn ProgressStore,
    ) -> io::Result<AttemptReport> {
        let mut report = self.evaluate(challenge, source);
        if report.passed() {
            report.newly_completed = progress.record_completion(challenge.id);
            store.save(progress)?;
            info!(
                user = progress.user(),
                challenge = challenge.id,
                score = progress.score(),
                newly_completed = report.newly_completed,
                "challenge passed"
            );
        }
        Ok(report)
    }

    /// One interactive attempt: show the challenge, read a snippet up to
    /// [`END_SENTINEL`], evaluate, record and print feedback.
    ///
    /// Returns `None` when input ends before the sentinel.
    ///
    /// # Errors
    ///
    /// Propagates terminal I/O failures and failures to save progress.
    pub fn run_interactive<R: BufRead, W: Write>(
        &mut self,
        challenge: &ChallengeSpec,
        input: &mut R,
        output: &mut W,
        style: Style,
        progress: &mut UserProgress,
        store: &dyn ProgressStore,
    ) -> io::Result<Option<AttemptReport>> {
        write!(
            output,
            "{}",
            display::challenge_card(challenge, progress.is_completed(challenge.id), style)
        )?;
        writeln!(
            output,
            "{}",
            style.dim(&format!(
                "Type your code, then a line with only {END_SENTINEL} to submit."
            ))
        )?;
        output.flush()?;

        let Some(source) = read_snippet(input)? else {
            return Ok(None);
        };
        let report = self.attempt(challenge, &source, progress, store)?;
        write!(output, "{}", display::feedback(&report, style))?;
        Ok(Some(report))
    }
}

/// Collect lines up to a line that is exactly [`END_SENTINEL`] (surrounding
/// whitespace ignored). `None` when input ends first.
///
/// # Errors
///
/// Propagates read failures.
pub fn read_snippet<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut source = String::new();
    let mut line = String::new();
    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if line.trim() == END_SENTINEL {
            return Ok(Some(source));
        }
        source.push_str(line.trim_end_matches(['\n', '\r']));
        source.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::Catalog;
    use crate::error::FaultKind;
    use crate::progress::MemoryStore;
    use std::io::Cursor;

    fn challenge(id: u32) -> ChallengeSpec {
        Catalog::builtin().unwrap().get(id).unwrap().clone()
    }

    #[test]
    fn test_pass_visits_every_state() {
        let mut runner = ChallengeRunner::new(RunnerConfig::default());
        let report = runner.evaluate(&challenge(1), "c = a + b");
        assert!(report.passed());
        assert_eq!(
            report.states,
            vec![
                AttemptState::Presenting,
                AttemptState::AwaitingCode,
                AttemptState::Vetting,
                AttemptState::Executing,
                AttemptState::Verifying,
                AttemptState::Passed,
            ]
        );
    }

    #[test]
    fn test_policy_violation_never_executes() {
        let mut runner = ChallengeRunner::new(RunnerConfig::default());
        let report = runner.evaluate(&challenge(1), "import os\nc = a + b");
        assert_eq!(report.final_state(), AttemptState::Failed);
        assert!(!report.states.contains(&AttemptState::Executing));
        assert_eq!(report.fuel_used, 0);
        let Verdict::Faulted { fault } = &report.verdict else {
            panic!("expected a fault");
        };
        assert_eq!(fault.kind, FaultKind::PolicyViolation);
    }

    #[test]
    fn test_runtime_fault_skips_verification() {
        let mut runner = ChallengeRunner::new(RunnerConfig::default());
        let report = runner.evaluate(&challenge(1), "c = a / 0");
        assert!(report.states.contains(&AttemptState::Executing));
        assert!(!report.states.contains(&AttemptState::Verifying));
        assert!(report.verdict.to_string().contains("ZeroDivisionError"));
    }

    #[test]
    fn test_mismatch_reports_expected_and_actual() {
        let mut runner = ChallengeRunner::new(RunnerConfig::default());
        let report = runner.evaluate(&challenge(2), "is_even = 0");
        assert_eq!(
            report.verdict,
            Verdict::Mismatch {
                name: "is_even".into(),
                expected: Value::Bool(true),
                actual: Some(Value::Int(0)),
            }
        );
        assert_eq!(report.verdict.to_string(), "expected is_even = True, got 0");
    }

    #[test]
    fn test_seed_applied_before_each_attempt() {
        let mut runner = ChallengeRunner::new(RunnerConfig::default());
        runner.evaluate(&challenge(1), "c = a + b");
        let first = runner.rng().next_u64();
        runner.evaluate(&challenge(3), "total = sum(L)");
        let second = runner.rng().next_u64();
        assert_eq!(first, second);
        assert_eq!(first, Rng::new(42).next_u64());
    }

    #[test]
    fn test_attempt_records_and_saves_once() {
        let store = MemoryStore::new();
        let mut progress = UserProgress::new("ada");
        let mut runner = ChallengeRunner::new(RunnerConfig::default());

        let report = runner
            .attempt(&challenge(3), "total = sum(L)", &mut progress, &store)
            .unwrap();
        assert!(report.newly_completed);
        assert_eq!(store.load("ada").score(), 1);

        let report = runner
            .attempt(&challenge(3), "total = sum(L)", &mut progress, &store)
            .unwrap();
        assert!(report.passed());
        assert!(!report.newly_completed);
        assert_eq!(progress.score(), 1);

        let report = runner
            .attempt(&challenge(1), "c = 0", &mut progress, &store)
            .unwrap();
        assert!(!report.passed());
        assert_eq!(progress.score(), 1);
    }

    #[test]
    fn test_read_snippet() {
        let mut input = Cursor::new("x = 1\r\nif x:\n    y = 2\n  END  \nrest\n");
        let source = read_snippet(&mut input).unwrap().unwrap();
        assert_eq!(source, "x = 1\nif x:\n    y = 2\n");

        let mut input = Cursor::new("x = 1\nENDING\n");
        assert_eq!(read_snippet(&mut input).unwrap(), None);
    }

    #[test]
    fn test_run_interactive() {
        let store = MemoryStore::new();
        let mut progress = UserProgress::new("ada");
        let mut runner = ChallengeRunner::new(RunnerConfig::default());
        let mut input = Cursor::new("c = a + b\nprint(c)\nEND\n");
        let mut output = Vec::new();

        let report = runner
            .run_interactive(
                &challenge(1),
                &mut input,
                &mut output,
                Style::plain(),
                &mut progress,
                &store,
            )
            .unwrap()
            .unwrap();
        assert!(report.passed());
        assert_eq!(report.output, "13\n");
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Add two numbers"));
        assert!(text.contains("13"));
    }

    #[test]
    fn test_report_json() {
        let mut runner = ChallengeRunner::new(RunnerConfig::default());
        let report = runner.evaluate(&challenge(1), "c = 1");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["verdict"], "mismatch");
        assert_eq!(json["name"], "c");
        assert_eq!(json["expected"], 13);
        assert_eq!(json["actual"], 1);
        assert_eq!(json["states"][5], "failed");
    }
}
