//! Sandbox executor: runs a parsed snippet against a snapshot of starter
//! bindings.
//!
//! The sandbox performs no policy checks of its own; callers vet first. What
//! it does guarantee:
//! - only the allow-listed capabilities ([`Builtin`]) resolve as globals
//! - every run starts from a fresh copy of the starter bindings
//! - execution is metered: statements, loop iterations and calls each burn
//!   one unit of fuel, and exhausting the budget is a runtime fault
//! - copying a value, and scanning or building a large one, burns a further
//!   unit per 64 elements
//! - call depth, nested collection sizes and printed output are bounded
//!
//! A run either succeeds with the final top-level bindings, or fails with a
//! single [`Fault`]. Partial bindings and output are never exposed on failure.

mod builtins;
mod exception;
mod interp;
mod methods;
mod ops;

pub use builtins::Builtin;

use crate::error::Fault;
use crate::lang::{self, Program};
use crate::value::Bindings;
use interp::Interpreter;
use serde::Serialize;
use tracing::debug;

/// Resource limits for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SandboxConfig {
    /// Fuel units available to a run.
    pub step_budget: u64,
    /// Deepest allowed nesting of function calls.
    pub max_call_depth: usize,
    /// Most elements a run may build into one value, counting nested items
    /// and string bytes. Also caps the total number of characters printed.
    pub max_collection_len: usize,
    /// Most lines a run may print.
    pub max_output_lines: usize,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            step_budget: 100_000,
            max_call_depth: 64,
            max_collection_len: 100_000,
            max_output_lines: 1_000,
        }
    }
}

/// Result of running a snippet.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// Every top-level name bound after the run, in first-binding order.
    Success(Bindings),
    /// The run stopped at a fault.
    Failure(Fault),
}

impl ExecutionOutcome {
    /// Whether the run completed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Success(_))
    }

    /// Final bindings of a successful run.
    #[must_use]
    pub fn bindings(&self) -> Option<&Bindings> {
        match self {
            ExecutionOutcome::Success(bindings) => Some(bindings),
            ExecutionOutcome::Failure(_) => None,
        }
    }

    /// Fault of a failed run.
    #[must_use]
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            ExecutionOutcome::Success(_) => None,
            ExecutionOutcome::Failure(fault) => Some(fault),
        }
    }
}

/// An outcome together with what the run printed and the fuel it burned.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    /// Bindings or fault.
    pub outcome: ExecutionOutcome,
    /// Captured `print` output. Empty when the run failed.
    pub output: String,
    /// Fuel consumed, including the unit that exhausted the budget.
    pub fuel_used: u64,
}

/// Runs snippets under a fixed [`SandboxConfig`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Sandbox {
    config: SandboxConfig,
}

impl Sandbox {
    /// Create a sandbox with the given limits.
    #[must_use]
    pub fn new(config: SandboxConfig) -> Self {
        Self { config }
    }

    /// Limits applied to every run.
    #[must_use]
    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Run an already vetted program against a copy of `starter`.
    #[must_use]
    pub fn execute(&self, program: &Program, starter: &Bindings) -> Execution {
        let mut interpreter = Interpreter::new(&self.config, starter.clone());
        let result = interpreter.run(program);
        let fuel_used = interpreter.fuel_used();

        match result {
            Ok(()) => {
                let (bindings, output) = interpreter.finish();
                debug!(fuel_used, bindings = bindings.len(), "snippet completed");
                Execution {
                    outcome: ExecutionOutcome::Success(bindings),
                    output,
                    fuel_used,
                }
            }
            Err(exception) => {
                debug!(fuel_used, %exception, "snippet raised");
                Execution {
                    outcome: ExecutionOutcome::Failure(exception.into_fault()),
                    output: String::new(),
                    fuel_used,
                }
            }
        }
    }

    /// Parse and run `source` without vetting it.
    ///
    /// For callers that have vetted the source already, or that deliberately
    /// want the sandbox alone (benchmarks, tests).
    #[must_use]
    pub fn execute_source(&self, source: &str, starter: &Bindings) -> Execution {
        match lang::parse(source) {
            Ok(program) => self.execute(&program, starter),
            Err(err) => Execution {
                outcome: ExecutionOutcome::Failure(Fault::syntax(err.to_string())),
                output: String::new(),
                fuel_used: 0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FaultKind;
    use crate::value::Value;

    fn run(source: &str) -> Execution {
        Sandbox::default().execute_source(source, &Bindings::new())
    }

    fn bindings(source: &str) -> Bindings {
        match run(source).outcome {
            ExecutionOutcome::Success(bindings) => bindings,
            ExecutionOutcome::Failure(fault) => panic!("{source:?} failed: {fault}"),
        }
    }

    fn fault(source: &str) -> Fault {
        match run(source).outcome {
            ExecutionOutcome::Success(b) => panic!("{source:?} succeeded with {b:?}"),
            ExecutionOutcome::Failure(fault) => fault,
        }
    }

    #[test]
    fn test_starter_is_copied_not_shared() {
        let starter: Bindings = [("L", Value::List(vec![Value::Int(1)]))]
            .into_iter()
            .collect();
        let execution = Sandbox::default().execute_source("L.append(2)", &starter);
        let after = execution.outcome.bindings().unwrap();
        assert_eq!(
            after.get("L"),
            Some(&Value::List(vec![Value::Int(1), Value::Int(2)]))
        );
        assert_eq!(starter.get("L"), Some(&Value::List(vec![Value::Int(1)])));
    }

    #[test]
    fn test_bindings_in_first_binding_order() {
        let starter: Bindings = [("a", Value::Int(5)), ("b", Value::Int(8))]
            .into_iter()
            .collect();
        let execution = Sandbox::default().execute_source("c = a + b\na = 0", &starter);
        let after = execution.outcome.bindings().unwrap();
        let names: Vec<&str> = after.names().collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(after.get("c"), Some(&Value::Int(13)));
    }

    #[test]
    fn test_syntax_fault() {
        let execution = run("x = (");
        assert_eq!(execution.outcome.fault().unwrap().kind, FaultKind::SyntaxFault);
        assert_eq!(execution.fuel_used, 0);
    }

    #[test]
    fn test_infinite_loop_exhausts_budget() {
        let fault = fault("while True:\n    pass\n");
        assert_eq!(fault.kind, FaultKind::RuntimeFault);
        assert!(fault.message.starts_with("TimeoutError"), "{fault}");
    }

    #[test]
    fn test_budget_is_configurable() {
        let sandbox = Sandbox::new(SandboxConfig {
            step_budget: 10,
            ..SandboxConfig::default()
        });
        let execution = sandbox.execute_source("for i in range(20):\n    pass\n", &Bindings::new());
        assert!(!execution.outcome.is_success());
        assert_eq!(execution.fuel_used, 11);

        let execution = sandbox.execute_source("x = 1", &Bindings::new());
        assert!(execution.outcome.is_success());
        assert_eq!(execution.fuel_used, 1);
    }

    #[test]
    fn test_unknown_names_are_runtime_faults() {
        for source in ["open('x')", "eval('1')", "exec('x = 1')", "__builtins__"] {
            let fault = fault(source);
            assert_eq!(fault.kind, FaultKind::RuntimeFault, "{source}");
            assert!(fault.message.starts_with("NameError"), "{source}: {fault}");
        }
    }

    #[test]
    fn test_imports_fail_when_run_unvetted() {
        let fault = fault("import os");
        assert!(fault.message.starts_with("ImportError"), "{fault}");
    }

    #[test]
    fn test_output_captured_only_on_success() {
        let execution = run("print('hi', 3)\nprint('a', 'b', sep='-', end='!')");
        assert_eq!(execution.output, "hi 3\na-b!");

        let execution = run("print('hi')\nx = 1 / 0");
        assert!(execution.output.is_empty());
        assert!(execution.outcome.fault().unwrap().message.contains("ZeroDivisionError"));
    }

    #[test]
    fn test_fault_reports_line() {
        let fault = fault("x = 1\ny = [1, 2][5]\n");
        assert_eq!(fault.message, "IndexError: list index out of range (line 2)");
    }

    #[test]
    fn test_functions_are_bound() {
        let after = bindings("def double(n):\n    return n * 2\nx = double(4)\n");
        assert!(matches!(after.get("double"), Some(Value::Function(_))));
        assert_eq!(after.get("x"), Some(&Value::Int(8)));
    }

    #[test]
    fn test_runs_are_independent() {
        let sandbox = Sandbox::default();
        let starter: Bindings = [("n", Value::Int(3))].into_iter().collect();
        let first = sandbox.execute_source("n = n * 2\nm = n", &starter);
        let second = sandbox.execute_source("n = n * 2\nm = n", &starter);
        assert_eq!(first, second);
    }

    #[test]
    fn test_self_doubling_is_stopped() {
        let doubling = fault("L = [1]\nwhile True:\n    L = [L, L]\n");
        assert!(doubling.message.starts_with("MemoryError"), "{doubling}");
        let grid = fault("M = [[0] * 1000] * 1000");
        assert!(grid.message.starts_with("MemoryError"), "{grid}");
    }

    #[test]
    fn test_large_copies_and_scans_burn_fuel() {
        let fuel = |source: &str, len: i64| {
            let starter: Bindings = [("L", Value::List((0..len).map(Value::Int).collect()))]
                .into_iter()
                .collect();
            Sandbox::default().execute_source(source, &starter).fuel_used
        };
        assert_eq!(fuel("y = L", 6400) - fuel("y = L", 64), 99);
        assert_eq!(fuel("L.count(0)", 6400) - fuel("L.count(0)", 64), 99);
        assert_eq!(fuel("L.append(0)", 6400), fuel("L.append(0)", 64));
        assert_eq!(fuel("r = range(6400)", 0) - fuel("r = range(64)", 0), 99);
    }

    #[test]
    fn test_growing_in_place_respects_nested_limit() {
        let sandbox = Sandbox::new(SandboxConfig {
            max_collection_len: 10_000,
            ..SandboxConfig::default()
        });
        let starter: Bindings = [("L", Value::List((0..1000).map(Value::Int).collect()))]
            .into_iter()
            .collect();
        let message = |source: &str| {
            let execution = sandbox.execute_source(source, &starter);
            execution
                .outcome
                .fault()
                .map(|fault| fault.message.clone())
                .unwrap_or_default()
        };

        assert!(message("M = [L] * 11").starts_with("MemoryError"));
        for source in [
            "for i in range(20):\n    L.append(L)",
            "for i in range(20):\n    L.insert(0, L)",
            "for i in range(20):\n    L[0] = L",
            "for i in range(20):\n    L.extend([L])",
            "D = {}\nfor i in range(11):\n    D[i] = L",
        ] {
            assert!(message(source).starts_with("MemoryError"), "{source}");
        }
        assert_eq!(message("for i in range(5):\n    L.append(i)"), "");
        assert_eq!(message("L[0] = [1, 2, 3]"), "");
    }

    #[test]
    fn test_value_depth_is_bounded() {
        let wrapped = fault("L = []\nwhile True:\n    L = [L]\n");
        assert!(wrapped.message.starts_with("RecursionError"), "{wrapped}");
        let appended = fault("L = []\nwhile True:\n    M = []\n    M.append(L)\n    L = M\n");
        assert!(appended.message.starts_with("RecursionError"), "{appended}");
        let shallow = bindings("L = []\nfor i in range(50):\n    L = [L]\n");
        assert!(shallow.contains("L"));
    }
}
