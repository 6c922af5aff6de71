use pattern_check_protocol::execution::{ExecutionResult, Platform};
use pattern_check_protocol::step::StepStatus;
use pattern_check_rules::{EvaluationOutcome, PathResolver, Pattern, PatternEvaluator};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::channel::StepChannel;
use crate::error::EngineError;
use crate::messages;
use crate::reporter::StepReporter;

/// Everything a finished session produced.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub result: ExecutionResult,
    /// Per-pattern verdicts, in declaration order.
    pub outcomes: Vec<EvaluationOutcome>,
    pub mismatch_count: usize,
}

/// Evaluates one rule set against one payload for one execution step.
///
/// Every pattern is evaluated and reported, even after a mismatch; only the
/// mismatch count decides the final status. Each step report completes before
/// the next pattern is looked at, and a failed report aborts the session.
pub struct EvaluationSession<'a, R: StepReporter + ?Sized, P: PathResolver + ?Sized> {
    reporter: &'a R,
    resolver: &'a P,
    evaluator: PatternEvaluator,
    platform: Platform,
    execution_id: Uuid,
    step_id: Uuid,
}

impl<'a, R, P> EvaluationSession<'a, R, P>
where
    R: StepReporter + ?Sized,
    P: PathResolver + ?Sized,
{
    pub fn new(
        reporter: &'a R,
        resolver: &'a P,
        platform: Platform,
        execution_id: Uuid,
        step_id: Uuid,
    ) -> Self {
        Self {
            reporter,
            resolver,
            evaluator: PatternEvaluator::default(),
            platform,
            execution_id,
            step_id,
        }
    }

    pub fn with_evaluator(mut self, evaluator: PatternEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    fn channel(&self) -> StepChannel<'_, R> {
        StepChannel::open(self.reporter, &self.platform, self.execution_id, self.step_id)
    }

    pub async fn run<T>(&self, patterns: &[Pattern], payload: &T) -> Result<SessionReport, EngineError>
    where
        T: Serialize + ?Sized,
    {
        if patterns.is_empty() {
            info!(execution_id = %self.execution_id, step_id = %self.step_id, "no patterns defined");
            self.channel()
                .close_immediately(StepStatus::Success, messages::NO_PATTERNS_DEFINED)
                .await?;
            return Ok(SessionReport {
                result: ExecutionResult::success(),
                outcomes: Vec::new(),
                mismatch_count: 0,
            });
        }

        // Serialized before the step is opened, so a failure leaves no step history.
        let payload = serde_json::to_string(payload).map_err(EngineError::PayloadSerialization)?;

        let mut channel = self.channel();
        let (outcomes, mismatch_count) = match self.evaluate_all(&mut channel, patterns, &payload).await {
            Ok(evaluated) => evaluated,
            Err(err) => {
                channel.abort().await;
                return Err(err);
            }
        };

        let result = if mismatch_count > 0 {
            channel
                .close(StepStatus::NoPatternMatch, messages::SOME_PATTERNS_MISMATCHED)
                .await?;
            ExecutionResult::no_pattern_match()
        } else {
            channel
                .close(StepStatus::Success, messages::ALL_PATTERNS_MATCHED)
                .await?;
            ExecutionResult::success()
        };

        info!(
            execution_id = %self.execution_id,
            step_id = %self.step_id,
            mismatches = mismatch_count,
            success = result.success,
            "pattern check finished"
        );

        Ok(SessionReport {
            result,
            outcomes,
            mismatch_count,
        })
    }

    async fn evaluate_all(
        &self,
        channel: &mut StepChannel<'_, R>,
        patterns: &[Pattern],
        payload: &str,
    ) -> Result<(Vec<EvaluationOutcome>, usize), EngineError> {
        channel.running().await?;
        info!(
            execution_id = %self.execution_id,
            step_id = %self.step_id,
            patterns = patterns.len(),
            "checking patterns"
        );

        let mut outcomes = Vec::with_capacity(patterns.len());
        let mut mismatch_count = 0;
        for pattern in patterns {
            let located = self.resolver.lookup(payload, &pattern.key);
            let outcome = self.evaluator.evaluate(pattern, located);
            debug!(
                execution_id = %self.execution_id,
                key = %pattern.key,
                kind = %pattern.kind,
                matched = outcome.matched,
                "pattern evaluated"
            );

            channel.record(&outcome).await?;
            if outcome.is_mismatch() {
                mismatch_count += 1;
            }
            outcomes.push(outcome);
        }
        Ok((outcomes, mismatch_count))
    }
}
