//! Property-based tests for the vet/run/verify pipeline.
//!
//! Run with: cargo test --release prop_sandbox

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use proptest::prelude::*;

use codetrail::{
    Bindings, Catalog, ChallengeRunner, FaultKind, MemoryStore, ProgressStore, RunnerConfig,
    Sandbox, SandboxConfig, UserProgress, Value, vet,
};

/// Wrap `body` in `depth` nested compound statements.
fn nest(body: &str, openers: &[u8]) -> String {
    let mut source = String::new();
    for (level, opener) in openers.iter().enumerate() {
        let indent = "    ".repeat(level);
        let header = match opener % 4 {
            0 => "if True:",
            1 => "for i in range(1):",
            2 => "while False:",
            _ => "def f():",
        };
        source.push_str(&format!("{indent}{header}\n"));
    }
    source.push_str(&"    ".repeat(openers.len()));
    source.push_str(body);
    source.push('\n');
    source
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// An import anywhere in the tree is a policy violation.
    #[test]
    fn prop_import_rejected_at_any_depth(
        openers in prop::collection::vec(any::<u8>(), 0..8),
        module in "[a-z]{1,8}",
        from in any::<bool>(),
    ) {
        let body = if from {
            format!("from {module} import x")
        } else {
            format!("import {module}")
        };
        let fault = vet(&nest(&body, &openers)).unwrap_err();
        prop_assert_eq!(fault.kind, FaultKind::PolicyViolation);
    }

    /// The same snippet against the same starter yields the same outcome.
    #[test]
    fn prop_runs_are_deterministic(
        a in -1_000i64..1_000,
        b in -1_000i64..1_000,
        items in prop::collection::vec(-50i64..50, 0..20),
    ) {
        let starter: Bindings = [
            ("a", Value::Int(a)),
            ("b", Value::Int(b)),
            ("L", Value::List(items.into_iter().map(Value::Int).collect())),
        ]
        .into_iter()
        .collect();
        let program = vet(
            "c = a * b - len(L)\nL.append(c)\nS = sorted(L)\nm = max(L)\nd = [x % 7 for x in L if x != 0]",
        )
        .unwrap();
        let sandbox = Sandbox::default();
        let first = sandbox.execute(&program, &starter);
        let second = sandbox.execute(&program, &starter);
        prop_assert_eq!(first, second);
    }

    /// Any budget stops an endless loop with a runtime fault.
    #[test]
    fn prop_budget_always_terminates(budget in 1u64..2_000) {
        let sandbox = Sandbox::new(SandboxConfig { step_budget: budget, ..SandboxConfig::default() });
        let execution = sandbox.execute(&vet("while True:\n    pass").unwrap(), &Bindings::new());
        let fault = execution.outcome.fault().unwrap();
        prop_assert_eq!(fault.kind, FaultKind::RuntimeFault);
        prop_assert_eq!(execution.fuel_used, budget + 1);
    }

    /// Score is the number of distinct challenges ever passed.
    #[test]
    fn prop_score_counts_distinct_passes(
        attempts in prop::collection::vec((1u32..=15, any::<bool>()), 0..30),
    ) {
        let catalog = Catalog::builtin().unwrap();
        let store = MemoryStore::new();
        let mut progress = UserProgress::new("ada");
        let mut runner = ChallengeRunner::new(RunnerConfig::default());
        let mut passed = std::collections::BTreeSet::new();

        for (id, correct) in attempts {
            let challenge = catalog.get(id).unwrap();
            let source = if correct { challenge.solution.as_str() } else { "x = 1 / 0" };
            let report = runner.attempt(challenge, source, &mut progress, &store).unwrap();
            prop_assert_eq!(report.passed(), correct);
            if correct {
                prop_assert_eq!(report.newly_completed, passed.insert(id));
            }
        }

        prop_assert_eq!(progress.score() as usize, passed.len());
        prop_assert_eq!(store.load("ada").score() as usize, passed.len());
    }
}
