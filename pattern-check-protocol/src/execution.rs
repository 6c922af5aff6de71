use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Identifier of the orchestration platform a request originates from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub struct Platform(String);

impl Platform {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Platform {
    fn from(value: &str) -> Self {
        Platform::new(value)
    }
}

impl From<String> for Platform {
    fn from(value: String) -> Self {
        Platform::new(value)
    }
}

impl From<Platform> for String {
    fn from(value: Platform) -> Self {
        value.0
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A pattern exactly as it appears in a workflow definition.
///
/// The `type` tag is kept as free text here; it is only interpreted when the
/// definition is compiled into a typed pattern.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatternDefinition {
    pub key: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub value: String,
}

impl PatternDefinition {
    pub fn new(key: impl Into<String>, kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: kind.into(),
            value: value.into(),
        }
    }
}

/// The part of a workflow definition the plugin cares about.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlowDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub patterns: Vec<PatternDefinition>,
}

impl FlowDefinition {
    pub fn with_patterns(patterns: Vec<PatternDefinition>) -> Self {
        Self {
            patterns,
            ..Self::default()
        }
    }
}

/// Invocation sent by the host runtime for one workflow step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecuteTaskRequest {
    pub platform: Platform,
    pub execution_id: Uuid,
    pub step_id: Uuid,
    #[serde(default)]
    pub flow: FlowDefinition,
    #[serde(default)]
    pub payload: Value,
}

/// Alert/payload ingestion request. Part of the host interface, not handled by this plugin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PayloadHandlerRequest {
    pub platform: Platform,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub payload: Value,
}

/// Final answer for one invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}

impl ExecutionResult {
    pub fn success() -> Self {
        Self {
            success: true,
            data: None,
        }
    }

    /// Result for a session in which at least one pattern did not match.
    pub fn no_pattern_match() -> Self {
        let mut data = Map::new();
        data.insert("status".into(), Value::String("noPatternMatch".into()));
        Self {
            success: false,
            data: Some(data),
        }
    }

    /// Returns `data.status` when present.
    pub fn status(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|data| data.get("status"))
            .and_then(Value::as_str)
    }
}
