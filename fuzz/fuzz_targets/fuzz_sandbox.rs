#![no_main]

use arbitrary::Arbitrary;
use codetrail::{Bindings, Sandbox, SandboxConfig, Value, vet};
use libfuzzer_sys::fuzz_target;

/// Snippet plus the starter values it runs against.
#[derive(Arbitrary, Debug)]
struct SandboxInput {
    /// Snippet text.
    source: String,
    /// Integer starter value bound to `n`.
    n: i64,
    /// List starter value bound to `L`.
    items: Vec<i64>,
    /// Fuel budget before capping.
    budget: u16,
}

fuzz_target!(|input: SandboxInput| {
    let Ok(program) = vet(&input.source) else {
        return;
    };

    // Small limits keep each run fast
    let sandbox = Sandbox::new(SandboxConfig {
        step_budget: u64::from(input.budget.min(5_000)).max(1),
        max_call_depth: 16,
        max_collection_len: 1_000,
        max_output_lines: 50,
    });
    let starter: Bindings = [
        ("n", Value::Int(input.n)),
        (
            "L",
            Value::List(input.items.into_iter().take(100).map(Value::Int).collect()),
        ),
    ]
    .into_iter()
    .collect();

    let first = sandbox.execute(&program, &starter);
    let second = sandbox.execute(&program, &starter);
    assert!(first.fuel_used <= sandbox.config().step_budget + 1);
    assert_eq!(first.outcome.is_success(), second.outcome.is_success());
    if !first.outcome.is_success() {
        assert!(first.output.is_empty());
    }
});
