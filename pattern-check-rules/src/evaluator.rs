use pattern_check_core::config::AbsentFieldPolicy;
use tracing::trace;

use crate::outcome::EvaluationOutcome;
use crate::pattern::{MatchKind, Pattern};

/// Evaluates one pattern against an already resolved value.
///
/// Returns whether the pattern's intent holds and the human readable verdict.
/// Negated kinds read inverted: a satisfied `!=` is described as "not found",
/// a violated one as "matched".
pub fn evaluate(resolved: &str, pattern: &Pattern) -> (bool, String) {
    let condition_holds = match pattern.kind {
        MatchKind::Equals | MatchKind::NotEquals => resolved == pattern.value,
        MatchKind::Contains | MatchKind::NotContains => resolved.contains(pattern.value.as_str()),
    };
    verdict(pattern, condition_holds)
}

fn verdict(pattern: &Pattern, condition_holds: bool) -> (bool, String) {
    let matched = condition_holds != pattern.kind.is_negated();
    let word = if condition_holds { "matched" } else { "not found" };
    let description = format!(
        "{} {} {} {}",
        pattern.key,
        pattern.kind.operator(),
        pattern.value,
        word
    );
    (matched, description)
}

/// Pattern evaluator configured with how missing fields are treated.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternEvaluator {
    absent_fields: AbsentFieldPolicy,
}

impl PatternEvaluator {
    pub fn new(absent_fields: AbsentFieldPolicy) -> Self {
        Self { absent_fields }
    }

    pub fn absent_fields(&self) -> AbsentFieldPolicy {
        self.absent_fields
    }

    /// Evaluates `pattern` against the value located for it, `None` meaning
    /// the path located nothing.
    pub fn evaluate(&self, pattern: &Pattern, located: Option<String>) -> EvaluationOutcome {
        let field_present = located.is_some();
        let resolved_value = located.unwrap_or_default();

        let (matched, description) = match (field_present, self.absent_fields) {
            (false, AbsentFieldPolicy::NeverMatch) => verdict(pattern, false),
            _ => evaluate(&resolved_value, pattern),
        };

        trace!(
            key = %pattern.key,
            kind = %pattern.kind,
            field_present,
            matched,
            "evaluated pattern"
        );

        EvaluationOutcome {
            pattern: pattern.clone(),
            resolved_value,
            field_present,
            matched,
            description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Pattern::equals("severity", "critical"), "critical", true, "severity == critical matched")]
    #[test_case(Pattern::equals("severity", "critical"), "warning", false, "severity == critical not found")]
    #[test_case(Pattern::not_equals("env", "prod"), "staging", true, "env != prod not found")]
    #[test_case(Pattern::not_equals("env", "prod"), "prod", false, "env != prod matched")]
    #[test_case(Pattern::contains("msg", "error"), "an error occurred", true, "msg contains error matched")]
    #[test_case(Pattern::contains("msg", "error"), "all good", false, "msg contains error not found")]
    #[test_case(Pattern::not_contains("msg", "debug"), "release build", true, "msg not contains debug not found")]
    #[test_case(Pattern::not_contains("msg", "debug"), "debug build", false, "msg not contains debug matched")]
    fn describes_every_kind(pattern: Pattern, resolved: &str, matched: bool, description: &str) {
        assert_eq!(evaluate(resolved, &pattern), (matched, description.to_string()));
    }

    #[test_case("", true ; "empty value")]
    #[test_case("anything at all", true ; "non empty value")]
    fn empty_substring_is_always_contained(resolved: &str, matched: bool) {
        let (result, _) = evaluate(resolved, &Pattern::contains("msg", ""));
        assert_eq!(result, matched);
    }

    #[test]
    fn equals_and_not_equals_are_complements() {
        for (resolved, expected) in [("prod", "prod"), ("prod", "dev"), ("", ""), ("", "x")] {
            let (eq, _) = evaluate(resolved, &Pattern::equals("env", expected));
            let (ne, _) = evaluate(resolved, &Pattern::not_equals("env", expected));
            assert_ne!(eq, ne, "resolved={resolved:?} expected={expected:?}");
        }
    }

    #[test]
    fn absent_field_compares_as_empty_by_default() {
        let evaluator = PatternEvaluator::default();

        let outcome = evaluator.evaluate(&Pattern::equals("missing", ""), None);
        assert!(outcome.matched);
        assert!(!outcome.field_present);
        assert_eq!(outcome.resolved_value, "");

        let outcome = evaluator.evaluate(&Pattern::contains("missing", "x"), None);
        assert!(!outcome.matched);
    }

    #[test]
    fn absent_field_can_be_told_apart_from_empty_string() {
        let evaluator = PatternEvaluator::new(AbsentFieldPolicy::NeverMatch);

        let equals = evaluator.evaluate(&Pattern::equals("missing", ""), None);
        assert!(!equals.matched);
        assert_eq!(equals.description, "missing ==  not found");

        let not_equals = evaluator.evaluate(&Pattern::not_equals("missing", ""), None);
        assert!(not_equals.matched);

        let contains = evaluator.evaluate(&Pattern::contains("missing", ""), None);
        assert!(!contains.matched);

        let not_contains = evaluator.evaluate(&Pattern::not_contains("missing", "x"), None);
        assert!(not_contains.matched);

        let present_empty = evaluator.evaluate(&Pattern::equals("blank", ""), Some(String::new()));
        assert!(present_empty.matched);
    }
}
