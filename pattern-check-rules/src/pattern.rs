use std::fmt;
use std::str::FromStr;

use pattern_check_protocol::execution::PatternDefinition;
use serde::{Deserialize, Serialize};

use crate::error::RuleError;

/// Comparison a pattern applies to the resolved value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Equals,
    NotEquals,
    Contains,
    NotContains,
}

impl MatchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchKind::Equals => "equals",
            MatchKind::NotEquals => "not_equals",
            MatchKind::Contains => "contains",
            MatchKind::NotContains => "not_contains",
        }
    }

    /// Operator as it is written in step messages.
    pub fn operator(self) -> &'static str {
        match self {
            MatchKind::Equals => "==",
            MatchKind::NotEquals => "!=",
            MatchKind::Contains => "contains",
            MatchKind::NotContains => "not contains",
        }
    }

    /// Whether the pattern succeeds when its underlying comparison fails.
    pub fn is_negated(self) -> bool {
        matches!(self, MatchKind::NotEquals | MatchKind::NotContains)
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a match kind tag outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMatchKind(pub String);

impl FromStr for MatchKind {
    type Err = UnknownMatchKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "equals" => Ok(MatchKind::Equals),
            "not_equals" => Ok(MatchKind::NotEquals),
            "contains" => Ok(MatchKind::Contains),
            "not_contains" => Ok(MatchKind::NotContains),
            _ => Err(UnknownMatchKind(value.to_string())),
        }
    }
}

/// A typed field-match rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pattern {
    /// Path expression locating the field in the payload.
    pub key: String,
    #[serde(rename = "type")]
    pub kind: MatchKind,
    pub value: String,
}

impl Pattern {
    pub fn new(key: impl Into<String>, kind: MatchKind, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind,
            value: value.into(),
        }
    }

    pub fn equals(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, MatchKind::Equals, value)
    }

    pub fn not_equals(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, MatchKind::NotEquals, value)
    }

    pub fn contains(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, MatchKind::Contains, value)
    }

    pub fn not_contains(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, MatchKind::NotContains, value)
    }
}

impl TryFrom<&PatternDefinition> for Pattern {
    type Error = RuleError;

    fn try_from(definition: &PatternDefinition) -> Result<Self, Self::Error> {
        let kind = definition
            .kind
            .parse::<MatchKind>()
            .map_err(|UnknownMatchKind(kind)| RuleError::UnknownMatchKind {
                key: definition.key.clone(),
                kind,
            })?;
        Ok(Pattern::new(definition.key.clone(), kind, definition.value.clone()))
    }
}

impl From<&Pattern> for PatternDefinition {
    fn from(pattern: &Pattern) -> Self {
        PatternDefinition::new(pattern.key.clone(), pattern.kind.as_str(), pattern.value.clone())
    }
}

/// Compiles workflow pattern definitions, keeping declaration order.
///
/// Fails on the first definition whose `type` is not a known match kind.
pub fn compile_patterns(definitions: &[PatternDefinition]) -> Result<Vec<Pattern>, RuleError> {
    definitions.iter().map(Pattern::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_definitions_in_order() {
        let definitions = vec![
            PatternDefinition::new("severity", "equals", "critical"),
            PatternDefinition::new("env", "not_equals", "prod"),
            PatternDefinition::new("msg", "Contains", "error"),
        ];

        let patterns = compile_patterns(&definitions).expect("compile");
        assert_eq!(
            patterns,
            vec![
                Pattern::equals("severity", "critical"),
                Pattern::not_equals("env", "prod"),
                Pattern::contains("msg", "error"),
            ]
        );
    }

    #[test]
    fn unknown_kind_is_an_explicit_error() {
        let definitions = vec![
            PatternDefinition::new("severity", "equals", "critical"),
            PatternDefinition::new("env", "starts_with", "pro"),
        ];

        let err = compile_patterns(&definitions).unwrap_err();
        match err {
            RuleError::UnknownMatchKind { key, kind } => {
                assert_eq!(key, "env");
                assert_eq!(kind, "starts_with");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn definitions_round_trip_through_typed_patterns() {
        let pattern = Pattern::not_contains("msg", "debug");
        let definition = PatternDefinition::from(&pattern);
        assert_eq!(definition.kind, "not_contains");
        assert_eq!(Pattern::try_from(&definition).expect("compile"), pattern);
    }
}
