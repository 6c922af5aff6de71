use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use pattern_check_protocol::execution::Platform;
use pattern_check_protocol::step::StepUpdate;
use thiserror::Error;

/// Sink that persists or forwards execution step updates.
///
/// Implementations must tolerate concurrent calls for different executions.
#[async_trait]
pub trait StepReporter: Send + Sync {
    async fn report(&self, update: &StepUpdate, platform: &Platform) -> Result<(), ReporterError>;

    /// Called once a step has received its terminal update.
    async fn flush(&self) -> Result<(), ReporterError> {
        Ok(())
    }
}

#[async_trait]
impl<T> StepReporter for Arc<T>
where
    T: StepReporter + ?Sized,
{
    async fn report(&self, update: &StepUpdate, platform: &Platform) -> Result<(), ReporterError> {
        (**self).report(update, platform).await
    }

    async fn flush(&self) -> Result<(), ReporterError> {
        (**self).flush().await
    }
}

#[derive(Debug, Error)]
pub enum ReporterError {
    #[error("invalid step backend url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("step backend request failed: {0}")]
    Http(String),
    #[error("step backend returned unexpected status {status}")]
    UnexpectedStatus { status: reqwest::StatusCode },
    #[error("step update rejected: {0}")]
    Rejected(String),
}

/// In-memory reporter that keeps every update it receives.
///
/// Used by the CLI dry run and by tests; it can be told to fail a given call
/// to exercise the abort paths.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    updates: Mutex<Vec<(Platform, StepUpdate)>>,
    calls: Mutex<usize>,
    flushes: Mutex<usize>,
    fail_on_call: Option<usize>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reporter whose `call`-th report (1-based) fails without being recorded.
    pub fn failing_on(call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Self::default()
        }
    }

    /// Updates recorded so far, in the order they were reported.
    pub fn updates(&self) -> Vec<StepUpdate> {
        self.updates
            .lock()
            .iter()
            .map(|(_, update)| update.clone())
            .collect()
    }

    pub fn platforms(&self) -> Vec<Platform> {
        self.updates
            .lock()
            .iter()
            .map(|(platform, _)| platform.clone())
            .collect()
    }

    /// Number of report calls, including a failed one.
    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }

    pub fn flushes(&self) -> usize {
        *self.flushes.lock()
    }
}

#[async_trait]
impl StepReporter for RecordingReporter {
    async fn report(&self, update: &StepUpdate, platform: &Platform) -> Result<(), ReporterError> {
        let call = {
            let mut calls = self.calls.lock();
            *calls += 1;
            *calls
        };

        if self.fail_on_call == Some(call) {
            return Err(ReporterError::Rejected(format!(
                "recording reporter configured to fail call {call}"
            )));
        }

        self.updates.lock().push((platform.clone(), update.clone()));
        Ok(())
    }

    async fn flush(&self) -> Result<(), ReporterError> {
        *self.flushes.lock() += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn records_until_the_configured_failure() {
        let reporter = RecordingReporter::failing_on(2);
        let platform = Platform::from("alertflow");
        let update = StepUpdate::builder(Uuid::new_v4(), Uuid::new_v4())
            .message("first")
            .build();

        reporter.report(&update, &platform).await.expect("first call");
        assert!(reporter.report(&update, &platform).await.is_err());
        reporter.report(&update, &platform).await.expect("third call");

        assert_eq!(reporter.calls(), 3);
        assert_eq!(reporter.updates().len(), 2);
        assert_eq!(reporter.platforms(), vec![platform.clone(), platform]);
    }
}
