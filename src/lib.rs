// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Codetrail: a turn-based coding exercise game.
//!
//! A learner is shown a challenge, types a short snippet in a small
//! Python-flavoured language, and passes when running the snippet leaves the
//! expected variables behind.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Session (name, guide, replay)     │
//! ├─────────────────────────────────────┤
//! │   Challenge Runner ── Progress      │
//! ├──────────┬──────────┬───────────────┤
//! │  Vetter  │ Sandbox  │   Verifier    │
//! ├──────────┴──────────┴───────────────┤
//! │   Snippet language (lexer, parser)  │
//! └─────────────────────────────────────┘
//! ```
//!
//! Every attempt is vetted before it runs, runs against a fresh copy of the
//! challenge's starter values, and is metered so that no snippet can hang
//! the game.

pub mod challenge;
pub mod display;
pub mod error;
pub mod lang;
pub mod progress;
pub mod rng;
pub mod runner;
pub mod sandbox;
pub mod session;
pub mod value;
pub mod verifier;
pub mod vetter;

pub use challenge::{Catalog, CatalogError, ChallengeSpec, Guide};
pub use error::{Fault, FaultKind};
pub use progress::{JsonFileStore, MemoryStore, ProgressStore, UserProgress};
pub use runner::{AttemptReport, AttemptState, ChallengeRunner, RunnerConfig, Verdict};
pub use sandbox::{Execution, ExecutionOutcome, Sandbox, SandboxConfig};
pub use session::{GameContext, Session, SessionConfig};
pub use value::{Bindings, Value};
pub use verifier::{VerificationResult, verify};
pub use vetter::vet;
