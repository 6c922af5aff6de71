//! Pattern evaluation for the Pattern Check plugin.
//!
//! A pattern is a declarative `{key, type, value}` check: `key` is a path
//! expression into the inbound payload, `type` one of `equals`, `not_equals`,
//! `contains` or `not_contains`, and `value` the expected text. This crate
//! compiles workflow definitions into typed patterns, resolves paths against
//! serialized payloads and evaluates a pattern against the resolved value.

mod error;
mod evaluator;
mod loader;
mod outcome;
mod path;
mod pattern;

pub use error::RuleError;
pub use evaluator::{evaluate, PatternEvaluator};
pub use loader::{load_flow, load_patterns};
pub use outcome::EvaluationOutcome;
pub use path::{FieldPath, JsonPathResolver, PathResolver};
pub use pattern::{compile_patterns, MatchKind, Pattern, UnknownMatchKind};
pub use pattern_check_core::config::AbsentFieldPolicy;
