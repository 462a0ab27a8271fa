//! Fault taxonomy for snippet attempts.

use serde::Serialize;
use std::fmt;

/// Category of a failed snippet, before verification is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// The snippet does not parse.
    SyntaxFault,
    /// The snippet contains a disallowed construct; it was never executed.
    PolicyViolation,
    /// The snippet raised an error while running.
    RuntimeFault,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultKind::SyntaxFault => write!(f, "syntax fault"),
            FaultKind::PolicyViolation => write!(f, "policy violation"),
            FaultKind::RuntimeFault => write!(f, "runtime fault"),
        }
    }
}

/// A snippet failure: what went wrong and a message meant for the learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fault {
    /// Failure category.
    pub kind: FaultKind,
    /// Human-readable description.
    pub message: String,
}

impl Fault {
    /// Create a fault of the given kind.
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for a [`FaultKind::SyntaxFault`].
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(FaultKind::SyntaxFault, message)
    }

    /// Shorthand for a [`FaultKind::PolicyViolation`].
    pub fn policy(message: impl Into<String>) -> Self {
        Self::new(FaultKind::PolicyViolation, message)
    }

    /// Shorthand for a [`FaultKind::RuntimeFault`].
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(FaultKind::RuntimeFault, message)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Fault {}
