use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Static descriptor a plugin hands to its host. Informational only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PluginMetadata {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub version: String,
    pub author: String,
    pub action: ActionDescriptor,
    #[serde(default)]
    pub endpoints: Vec<String>,
}

/// How the action shows up in a workflow editor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionDescriptor {
    pub name: String,
    pub description: String,
    pub plugin: String,
    pub icon: String,
    pub category: String,
    #[serde(default)]
    pub params: Vec<Value>,
}
