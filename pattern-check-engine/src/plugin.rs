use async_trait::async_trait;
use pattern_check_core::config::PluginConfig;
use pattern_check_protocol::execution::{ExecuteTaskRequest, ExecutionResult, PayloadHandlerRequest};
use pattern_check_protocol::metadata::{ActionDescriptor, PluginMetadata};
use pattern_check_rules::{compile_patterns, JsonPathResolver, PathResolver, PatternEvaluator};
use tracing::warn;

use crate::error::EngineError;
use crate::reporter::StepReporter;
use crate::session::{EvaluationSession, SessionReport};

/// Surface a host adapter (in-process call, HTTP server, CLI) drives.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Runs the plugin's action for one workflow step.
    async fn evaluate(&self, request: ExecuteTaskRequest) -> Result<ExecutionResult, EngineError>;

    /// Alert/payload ingestion entry point.
    async fn handle_payload(
        &self,
        request: PayloadHandlerRequest,
    ) -> Result<ExecutionResult, EngineError>;

    fn describe(&self) -> PluginMetadata;
}

/// Decision gate that checks a flow's patterns against the inbound payload.
pub struct PatternCheckPlugin<R, P = JsonPathResolver> {
    reporter: R,
    resolver: P,
    config: PluginConfig,
}

impl<R: StepReporter> PatternCheckPlugin<R, JsonPathResolver> {
    pub fn new(reporter: R) -> Self {
        Self::from_config(reporter, &PluginConfig::default())
    }

    pub fn from_config(reporter: R, config: &PluginConfig) -> Self {
        Self {
            reporter,
            resolver: JsonPathResolver,
            config: config.clone(),
        }
    }
}

impl<R: StepReporter, P: PathResolver> PatternCheckPlugin<R, P> {
    pub fn with_resolver<Q: PathResolver>(self, resolver: Q) -> PatternCheckPlugin<R, Q> {
        PatternCheckPlugin {
            reporter: self.reporter,
            resolver,
            config: self.config,
        }
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Like [`Plugin::evaluate`] but also returns the per-pattern verdicts.
    pub async fn run(&self, request: &ExecuteTaskRequest) -> Result<SessionReport, EngineError> {
        let platform = &request.platform;
        if !self.config.supports_platform(platform.as_str()) {
            warn!(%platform, "rejecting request for unsupported platform");
            return Err(EngineError::UnsupportedPlatform(platform.to_string()));
        }

        let patterns = compile_patterns(&request.flow.patterns)?;

        EvaluationSession::new(
            &self.reporter,
            &self.resolver,
            platform.clone(),
            request.execution_id,
            request.step_id,
        )
        .with_evaluator(PatternEvaluator::new(self.config.absent_fields))
        .run(&patterns, &request.payload)
        .await
    }
}

#[async_trait]
impl<R: StepReporter, P: PathResolver> Plugin for PatternCheckPlugin<R, P> {
    async fn evaluate(&self, request: ExecuteTaskRequest) -> Result<ExecutionResult, EngineError> {
        self.run(&request).await.map(|report| report.result)
    }

    async fn handle_payload(
        &self,
        _request: PayloadHandlerRequest,
    ) -> Result<ExecutionResult, EngineError> {
        Err(EngineError::NotSupported("payload handling"))
    }

    fn describe(&self) -> PluginMetadata {
        metadata()
    }
}

/// Static descriptor of the pattern check action.
pub fn metadata() -> PluginMetadata {
    PluginMetadata {
        name: "Pattern Check".into(),
        kind: "action".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        author: "JustNZ".into(),
        action: ActionDescriptor {
            name: "Pattern Check".into(),
            description: "Check flow patterns".into(),
            plugin: "pattern_check".into(),
            icon: "solar:list-check-minimalistic-bold".into(),
            category: "Utility".into(),
            params: Vec::new(),
        },
        endpoints: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pattern_check_core::config::AbsentFieldPolicy;
    use pattern_check_protocol::execution::{FlowDefinition, PatternDefinition, Platform};
    use pattern_check_rules::RuleError;
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::reporter::RecordingReporter;

    fn request(platform: &str, patterns: Vec<PatternDefinition>) -> ExecuteTaskRequest {
        ExecuteTaskRequest {
            platform: Platform::from(platform),
            execution_id: Uuid::new_v4(),
            step_id: Uuid::new_v4(),
            flow: FlowDefinition::with_patterns(patterns),
            payload: json!({"severity": "critical", "env": "prod"}),
        }
    }

    #[tokio::test]
    async fn unsupported_platform_fails_without_side_effects() {
        let reporter = Arc::new(RecordingReporter::new());
        let plugin = PatternCheckPlugin::new(reporter.clone());

        let err = plugin
            .evaluate(request("jenkins", vec![]))
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::UnsupportedPlatform(ref p) if p == "jenkins"));
        assert_eq!(reporter.calls(), 0);
    }

    #[tokio::test]
    async fn unknown_match_kind_fails_before_reporting() {
        let reporter = Arc::new(RecordingReporter::new());
        let plugin = PatternCheckPlugin::new(reporter.clone());

        let err = plugin
            .evaluate(request(
                "alertflow",
                vec![
                    PatternDefinition::new("severity", "equals", "critical"),
                    PatternDefinition::new("env", "matches", "pr.*"),
                ],
            ))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EngineError::Rules(RuleError::UnknownMatchKind { ref kind, .. }) if kind == "matches"
        ));
        assert_eq!(err.code(), "unknown_match_kind");
        assert_eq!(reporter.calls(), 0);
    }

    #[tokio::test]
    async fn unparseable_path_is_reported_as_a_mismatch() {
        let reporter = Arc::new(RecordingReporter::new());
        let plugin = PatternCheckPlugin::new(reporter.clone());

        let report = plugin
            .run(&request(
                "alertflow",
                vec![
                    PatternDefinition::new("labels[", "equals", "x"),
                    PatternDefinition::new("severity", "equals", "critical"),
                ],
            ))
            .await
            .expect("evaluate");

        assert_eq!(report.mismatch_count, 1);
        assert!(!report.outcomes[0].field_present);
        assert_eq!(report.result.status(), Some("noPatternMatch"));
        assert_eq!(reporter.calls(), 4);
        assert_eq!(
            reporter.updates()[1].lines(),
            vec!["Pattern: labels[ == x not found."]
        );
    }

    #[tokio::test]
    async fn alert_list_statuses_are_reachable_with_hash_paths() {
        let reporter = Arc::new(RecordingReporter::new());
        let plugin = PatternCheckPlugin::new(reporter.clone());
        let mut request = request(
            "alertflow",
            vec![PatternDefinition::new("alerts.#.status", "contains", "firing")],
        );
        request.payload = json!({"alerts": [{"status": "firing"}]});

        let result = plugin.evaluate(request).await.expect("evaluate");

        assert!(result.success);
        assert_eq!(reporter.calls(), 3);
    }

    #[tokio::test]
    async fn reports_platform_tag_with_every_update() {
        let reporter = Arc::new(RecordingReporter::new());
        let plugin = PatternCheckPlugin::new(reporter.clone());

        let result = plugin
            .evaluate(request(
                "ExFlow",
                vec![PatternDefinition::new("severity", "equals", "critical")],
            ))
            .await
            .expect("evaluate");

        assert!(result.success);
        assert_eq!(reporter.calls(), 3);
        assert!(reporter
            .platforms()
            .iter()
            .all(|platform| platform.as_str() == "exflow"));
    }

    #[tokio::test]
    async fn configured_platforms_replace_the_defaults() {
        let reporter = Arc::new(RecordingReporter::new());
        let config = PluginConfig {
            platforms: vec!["jenkins".into()],
            ..PluginConfig::default()
        };
        let plugin = PatternCheckPlugin::from_config(reporter.clone(), &config);

        let accepted = plugin
            .evaluate(request("Jenkins", vec![]))
            .await
            .expect("evaluate");
        let rejected = plugin.evaluate(request("alertflow", vec![])).await.unwrap_err();

        assert!(accepted.success);
        assert!(matches!(rejected, EngineError::UnsupportedPlatform(ref p) if p == "alertflow"));
        assert_eq!(reporter.calls(), 1);
    }

    #[tokio::test]
    async fn never_match_policy_flows_into_the_session() {
        let reporter = Arc::new(RecordingReporter::new());
        let config = PluginConfig {
            absent_fields: AbsentFieldPolicy::NeverMatch,
            ..PluginConfig::default()
        };
        let plugin = PatternCheckPlugin::from_config(reporter.clone(), &config);

        let result = plugin
            .evaluate(request(
                "alertflow",
                vec![PatternDefinition::new("team", "equals", "")],
            ))
            .await
            .expect("evaluate");

        assert!(!result.success);
        assert_eq!(result.status(), Some("noPatternMatch"));
    }

    #[tokio::test]
    async fn payload_handling_is_not_supported() {
        let plugin = PatternCheckPlugin::new(RecordingReporter::new());
        let err = plugin
            .handle_payload(PayloadHandlerRequest {
                platform: Platform::from("alertflow"),
                endpoint: Some("/alerts".into()),
                payload: json!({}),
            })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "payload handling is not supported by this plugin");
        assert_eq!(plugin.reporter().calls(), 0);
    }

    #[test]
    fn describes_the_action() {
        let plugin = PatternCheckPlugin::new(RecordingReporter::new());
        let metadata = plugin.describe();
        assert_eq!(metadata.name, "Pattern Check");
        assert_eq!(metadata.kind, "action");
        assert_eq!(metadata.action.plugin, "pattern_check");
        assert_eq!(metadata.action.category, "Utility");
    }
}
