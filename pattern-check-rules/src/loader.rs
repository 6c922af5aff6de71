use std::fs;
use std::path::{Path, PathBuf};

use pattern_check_protocol::execution::{FlowDefinition, PatternDefinition};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::RuleError;
use crate::pattern::{compile_patterns, Pattern};

/// Loads pattern definitions from a JSON/YAML file or a directory of them.
///
/// Files in a directory are read in file name order and their patterns are
/// concatenated, so declaration order stays deterministic.
pub fn load_flow(path: impl AsRef<Path>) -> Result<FlowDefinition, RuleError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(RuleError::MissingPath(path.display().to_string()));
    }

    if path.is_dir() {
        let mut flow = FlowDefinition::default();
        for file in pattern_files(path)? {
            let mut document = load_from_file(&file)?;
            flow.patterns.append(&mut document.patterns);
        }
        Ok(flow)
    } else {
        load_from_file(path)
    }
}

/// Loads and compiles patterns in one go.
pub fn load_patterns(path: impl AsRef<Path>) -> Result<Vec<Pattern>, RuleError> {
    let flow = load_flow(path)?;
    compile_patterns(&flow.patterns)
}

fn pattern_files(path: &Path) -> Result<Vec<PathBuf>, RuleError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(path).map_err(|err| RuleError::from_io(path, err))? {
        let entry = entry.map_err(|err| RuleError::from_io(path, err))?;
        let file_type = entry
            .file_type()
            .map_err(|err| RuleError::from_io(entry.path(), err))?;
        if file_type.is_dir() {
            continue;
        }

        let entry_path = entry.path();
        if let Some(ext) = entry_path.extension().and_then(|value| value.to_str()) {
            if matches!(ext, "json" | "yaml" | "yml") {
                files.push(entry_path);
            }
        }
    }
    files.sort();
    Ok(files)
}

fn load_from_file(path: &Path) -> Result<FlowDefinition, RuleError> {
    let raw = fs::read_to_string(path).map_err(|err| RuleError::from_io(path, err))?;
    parse_flow(&raw, path)
}

fn parse_flow(raw: &str, path: &Path) -> Result<FlowDefinition, RuleError> {
    // YAML is a superset of JSON, so one parser covers both file kinds.
    let document = serde_yaml::from_str::<PatternDocument>(raw).map_err(|err| {
        RuleError::parse_error(
            path.to_path_buf(),
            format!("expected a patterns document, a list or a single pattern: {err}"),
        )
    })?;

    Ok(match document {
        PatternDocument::List(patterns) => FlowDefinition::with_patterns(patterns),
        PatternDocument::Single(pattern) => FlowDefinition::with_patterns(vec![pattern]),
        PatternDocument::Flow(flow) => FlowDefinition {
            id: flow.id,
            name: flow.name,
            patterns: flow.patterns,
        },
    })
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PatternDocument {
    List(Vec<PatternDefinition>),
    Single(PatternDefinition),
    Flow(FlowDocument),
}

/// A flow file must carry a `patterns` key, even if the list is empty.
#[derive(Debug, Deserialize)]
struct FlowDocument {
    #[serde(default)]
    id: Option<Uuid>,
    #[serde(default)]
    name: Option<String>,
    patterns: Vec<PatternDefinition>,
}
