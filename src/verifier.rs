//! Outcome verifier: compares final bindings with a challenge's expected
//! bindings.

use crate::value::{Bindings, Value};
use serde::Serialize;
use std::fmt;

/// Verdict for one set of bindings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum VerificationResult {
    /// Every expected binding is present and equal.
    Pass,
    /// The first expected binding, in declared order, that is missing or
    /// differs.
    Fail {
        /// Variable name.
        name: String,
        /// Value the challenge expects.
        expected: Value,
        /// Value the snippet left behind; `None` when the name is unbound.
        actual: Option<Value>,
    },
}

impl VerificationResult {
    /// Whether verification passed.
    #[must_use]
    pub fn is_pass(&self) -> bool {
        matches!(self, VerificationResult::Pass)
    }
}

impl fmt::Display for VerificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationResult::Pass => write!(f, "all expected values match"),
            VerificationResult::Fail {
                name,
                expected,
                actual: None,
            } => write!(
                f,
                "variable '{name}' was never set (expected {})",
                expected.repr()
            ),
            VerificationResult::Fail {
                name,
                expected,
                actual: Some(actual),
            } => write!(
                f,
                "expected {name} = {}, got {}",
                expected.repr(),
                actual.repr()
            ),
        }
    }
}

/// Check `bindings` against `expected`, in `expected`'s declared order.
///
/// Extra bindings are ignored; only the first discrepancy is reported.
#[must_use]
pub fn verify(bindings: &Bindings, expected: &Bindings) -> VerificationResult {
    for (name, want) in expected.iter() {
        match bindings.get(name) {
            None => {
                return VerificationResult::Fail {
                    name: name.to_string(),
                    expected: want.clone(),
                    actual: None,
                };
            }
            Some(got) if got != want => {
                return VerificationResult::Fail {
                    name: name.to_string(),
                    expected: want.clone(),
                    actual: Some(got.clone()),
                };
            }
            Some(_) => {}
        }
    }
    VerificationResult::Pass
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bindings(pairs: &[(&str, Value)]) -> Bindings {
        pairs.iter().map(|(n, v)| (*n, v.clone())).collect()
    }

    #[test]
    fn test_pass_ignores_extra_bindings() {
        let actual = bindings(&[("c", Value::Int(13)), ("tmp", Value::Int(1))]);
        let expected = bindings(&[("c", Value::Int(13))]);
        assert_eq!(verify(&actual, &expected), VerificationResult::Pass);
    }

    #[test]
    fn test_first_missing_in_declared_order() {
        let actual = bindings(&[("b", Value::Int(2))]);
        let expected = bindings(&[("z", Value::Int(1)), ("a", Value::Int(1))]);
        assert_eq!(
            verify(&actual, &expected),
            VerificationResult::Fail {
                name: "z".into(),
                expected: Value::Int(1),
                actual: None,
            }
        );
    }

    #[test]
    fn test_first_mismatch_reported() {
        let actual = bindings(&[("a", Value::Int(1)), ("b", Value::Int(0)), ("c", Value::Int(0))]);
        let expected = bindings(&[("a", Value::Int(1)), ("b", Value::Int(2)), ("c", Value::Int(3))]);
        let result = verify(&actual, &expected);
        assert_eq!(
            result,
            VerificationResult::Fail {
                name: "b".into(),
                expected: Value::Int(2),
                actual: Some(Value::Int(0)),
            }
        );
        assert_eq!(result.to_string(), "expected b = 2, got 0");
    }

    #[test]
    fn test_bool_is_distinct_from_int() {
        let expected = bindings(&[("is_even", Value::Bool(true))]);
        let result = verify(&bindings(&[("is_even", Value::Int(1))]), &expected);
        assert!(!result.is_pass());
        assert_eq!(result.to_string(), "expected is_even = True, got 1");
        assert!(verify(&bindings(&[("is_even", Value::Bool(true))]), &expected).is_pass());
    }

    #[test]
    fn test_int_and_float_compare_numerically() {
        let expected = bindings(&[("avg", Value::Float(5.0))]);
        assert!(verify(&bindings(&[("avg", Value::Int(5))]), &expected).is_pass());
    }

    #[test]
    fn test_missing_message() {
        let result = verify(&Bindings::new(), &bindings(&[("x", Value::Str("a".into()))]));
        assert_eq!(result.to_string(), "variable 'x' was never set (expected 'a')");
    }

    #[test]
    fn test_serializes_with_tag() {
        let json = serde_json::to_string(&VerificationResult::Pass).unwrap();
        assert_eq!(json, r#"{"result":"pass"}"#);
    }
}
