//! Step log lines written by an evaluation session.

pub const CHECKING_PATTERNS: &str = "Checking for patterns";
pub const NO_PATTERNS_DEFINED: &str = "No patterns are defined. Continue to next step";
pub const SOME_PATTERNS_MISMATCHED: &str = "Some patterns did not match. Cancel execution";
pub const ALL_PATTERNS_MATCHED: &str = "All patterns matched. Continue to next step";

pub fn pattern_matched(description: &str) -> String {
    format!("Pattern: {description}. Continue to next step")
}

pub fn pattern_mismatched(description: &str) -> String {
    format!("Pattern: {description}.")
}
