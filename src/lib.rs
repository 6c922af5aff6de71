//! Pattern Check: a workflow decision gate.
//!
//! A flow declares field patterns; each inbound payload is checked against
//! them and every verdict is reported as an execution step update. The
//! workflow continues only when all patterns match.
//!
//! # Crates
//!
//! * `pattern_check_core`: configuration, error type and tracing setup, re-exported at the root
//! * `protocol`: wire types shared with the host and the step backend
//! * `rules`: patterns, path resolution and the evaluator
//! * `engine`: evaluation sessions, step reporters and host adapters

pub use pattern_check_engine as engine;
pub use pattern_check_protocol as protocol;
pub use pattern_check_rules as rules;

pub use pattern_check_core::logging::init_tracing;
pub use pattern_check_core::{AbsentFieldPolicy, PluginConfig};
pub use pattern_check_engine::{
    EngineError, EvaluationSession, HttpStepReporter, PatternCheckPlugin, Plugin,
    RecordingReporter, StepReporter,
};
pub use pattern_check_protocol::execution::{ExecuteTaskRequest, ExecutionResult};
pub use pattern_check_rules::{MatchKind, Pattern, PatternEvaluator};
