//! Pattern Check engine - evaluation sessions, step reporting and the host adapters.

pub mod api;
pub mod channel;
pub mod error;
pub mod http_reporter;
pub mod messages;
pub mod plugin;
pub mod reporter;
pub mod session;

pub use api::{PluginApiBuilder, PluginServiceConfig, ServiceHandle};
pub use channel::StepChannel;
pub use error::EngineError;
pub use http_reporter::HttpStepReporter;
pub use plugin::{metadata, PatternCheckPlugin, Plugin};
pub use reporter::{RecordingReporter, ReporterError, StepReporter};
pub use session::{EvaluationSession, SessionReport};
