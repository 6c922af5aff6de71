use crate::pattern::Pattern;

/// Verdict for one pattern against one payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationOutcome {
    pub pattern: Pattern,
    /// Canonical string form of the located value; empty when nothing was found.
    pub resolved_value: String,
    /// Whether the path located a value at all.
    pub field_present: bool,
    pub matched: bool,
    pub description: String,
}

impl EvaluationOutcome {
    pub fn is_mismatch(&self) -> bool {
        !self.matched
    }
}
