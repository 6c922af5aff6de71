use pattern_check_rules::RuleError;
use thiserror::Error;

use crate::reporter::ReporterError;

/// Errors surfaced to the host for one invocation. None of them is retried.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("platform `{0}` is not supported by this plugin")]
    UnsupportedPlatform(String),
    #[error(transparent)]
    Rules(#[from] RuleError),
    #[error("failed to serialize payload: {0}")]
    PayloadSerialization(#[source] serde_json::Error),
    #[error("failed to report step update: {0}")]
    StepReport(#[from] ReporterError),
    #[error("{0} is not supported by this plugin")]
    NotSupported(&'static str),
}

impl EngineError {
    /// Stable machine readable code used by the HTTP adapter.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::UnsupportedPlatform(_) => "unsupported_platform",
            EngineError::Rules(RuleError::UnknownMatchKind { .. }) => "unknown_match_kind",
            EngineError::Rules(_) => "invalid_pattern",
            EngineError::PayloadSerialization(_) => "payload_serialization",
            EngineError::StepReport(_) => "step_report_failed",
            EngineError::NotSupported(_) => "not_supported",
        }
    }
}
