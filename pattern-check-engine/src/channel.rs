use pattern_check_protocol::execution::Platform;
use pattern_check_protocol::step::{StepStatus, StepUpdate, StepUpdateBuilder};
use pattern_check_rules::EvaluationOutcome;
use tracing::warn;
use uuid::Uuid;

use crate::error::EngineError;
use crate::messages;
use crate::reporter::{ReporterError, StepReporter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChannelState {
    Open,
    /// A report failed; nothing else may be sent for this step.
    Poisoned,
    Closed,
}

/// Reporting channel scoped to one execution step.
///
/// The channel is consumed by its terminal update. A failed report poisons it
/// so no further updates are attempted, and dropping it before a terminal
/// update was delivered is logged.
pub struct StepChannel<'a, R: StepReporter + ?Sized> {
    reporter: &'a R,
    platform: &'a Platform,
    execution_id: Uuid,
    step_id: Uuid,
    state: ChannelState,
}

impl<'a, R: StepReporter + ?Sized> StepChannel<'a, R> {
    pub fn open(reporter: &'a R, platform: &'a Platform, execution_id: Uuid, step_id: Uuid) -> Self {
        Self {
            reporter,
            platform,
            execution_id,
            step_id,
            state: ChannelState::Open,
        }
    }

    fn update(&self) -> StepUpdateBuilder {
        StepUpdate::builder(self.execution_id, self.step_id)
    }

    async fn send(&mut self, update: StepUpdate) -> Result<(), EngineError> {
        if self.state != ChannelState::Open {
            return Err(ReporterError::Rejected("step channel is no longer open".into()).into());
        }

        if let Err(err) = self.reporter.report(&update, self.platform).await {
            warn!(
                execution_id = %self.execution_id,
                step_id = %self.step_id,
                error = %err,
                "step update could not be reported"
            );
            self.state = ChannelState::Poisoned;
            return Err(err.into());
        }
        Ok(())
    }

    /// Marks the step as running.
    pub async fn running(&mut self) -> Result<(), EngineError> {
        let update = self
            .update()
            .message(messages::CHECKING_PATTERNS)
            .status(StepStatus::Running)
            .started_now()
            .build();
        self.send(update).await
    }

    /// Reports the verdict of one pattern. A mismatch is annotated `canceled`
    /// but does not close the step.
    pub async fn record(&mut self, outcome: &EvaluationOutcome) -> Result<(), EngineError> {
        let update = if outcome.matched {
            self.update()
                .message(messages::pattern_matched(&outcome.description))
                .build()
        } else {
            self.update()
                .message(messages::pattern_mismatched(&outcome.description))
                .status(StepStatus::Canceled)
                .finished_now()
                .build()
        };
        self.send(update).await
    }

    /// Sends the terminal update and flushes the reporter.
    pub async fn close(mut self, status: StepStatus, message: &str) -> Result<(), EngineError> {
        self.finish(status, message, false).await
    }

    /// Terminal update for a step that never went through `running`.
    pub async fn close_immediately(mut self, status: StepStatus, message: &str) -> Result<(), EngineError> {
        self.finish(status, message, true).await
    }

    /// Flushes the updates delivered before a session failed. The step keeps
    /// no terminal status.
    pub async fn abort(self) {
        self.flush_quietly().await;
    }

    async fn flush_quietly(&self) {
        if let Err(err) = self.reporter.flush().await {
            warn!(
                execution_id = %self.execution_id,
                step_id = %self.step_id,
                error = %err,
                "step reporter flush failed"
            );
        }
    }

    async fn finish(&mut self, status: StepStatus, message: &str, started: bool) -> Result<(), EngineError> {
        debug_assert!(status.is_terminal());

        let mut builder = self.update().message(message).status(status);
        if started {
            builder = builder.started_now();
        }
        if let Err(err) = self.send(builder.finished_now().build()).await {
            self.flush_quietly().await;
            return Err(err);
        }
        self.state = ChannelState::Closed;
        self.reporter.flush().await?;
        Ok(())
    }
}

impl<R: StepReporter + ?Sized> Drop for StepChannel<'_, R> {
    fn drop(&mut self) {
        match self.state {
            ChannelState::Closed => {}
            ChannelState::Open => warn!(
                execution_id = %self.execution_id,
                step_id = %self.step_id,
                "step channel dropped without a terminal status"
            ),
            ChannelState::Poisoned => warn!(
                execution_id = %self.execution_id,
                step_id = %self.step_id,
                "step left without a terminal status after a reporting failure"
            ),
        }
    }
}
