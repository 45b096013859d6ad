//! Result Validator
//!
//! Evaluates an entered result value against a specification expression.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

use labqc_models::ResultStatus;

use super::parser::{parse_spec, ExactValue, ParsedPredicate};

/// Outcome of checking one value against one expression
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationOutcome {
    pub status: ResultStatus,
    pub predicate: ParsedPredicate,
    /// Number read from the sanitized value, if any.
    pub numeric_value: Option<f64>,
}

impl ValidationOutcome {
    pub fn passed(&self) -> bool {
        self.status == ResultStatus::Pass
    }
}

fn numeric_prefix() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^-?([0-9]+(\.[0-9]*)?|\.[0-9]+)").expect("numeric prefix pattern"))
}

/// Strips everything except digits, `.` and `-`, then reads the leading number.
///
/// `"45.8%"` reads as `45.8`, `"1.2.3"` as `1.2`, `"abc"` as nothing.
pub fn sanitize_numeric(raw: &str) -> Option<f64> {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    numeric_prefix()
        .find(&kept)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

pub fn validate(raw_value: &str, expression: &str) -> ValidationOutcome {
    let predicate = parse_spec(expression);
    evaluate(raw_value, predicate)
}

/// Checks a value against an already parsed predicate.
pub fn evaluate(raw_value: &str, predicate: ParsedPredicate) -> ValidationOutcome {
    let numeric_value = sanitize_numeric(raw_value);

    let passed = match (&predicate, numeric_value) {
        (ParsedPredicate::Exact(ExactValue::Text(expected)), _) => {
            raw_value.trim().to_lowercase() == expected.to_lowercase()
        }
        (_, None) => false,
        (ParsedPredicate::Max(bound), Some(value)) => value <= *bound,
        (ParsedPredicate::Min(bound), Some(value)) => value >= *bound,
        (ParsedPredicate::Range { low, high }, Some(value)) => *low <= value && value <= *high,
        (ParsedPredicate::Exact(ExactValue::Number(expected)), Some(value)) => value == *expected,
    };

    ValidationOutcome {
        status: if passed {
            ResultStatus::Pass
        } else {
            ResultStatus::Fail
        },
        predicate,
        numeric_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_is_inclusive() {
        assert_eq!(validate("10", "<10").status, ResultStatus::Pass);
        assert_eq!(validate("9.99", "<10").status, ResultStatus::Pass);
        assert_eq!(validate("10.01", "<10").status, ResultStatus::Fail);
    }

    #[test]
    fn test_min_is_inclusive() {
        assert_eq!(validate("95", ">95").status, ResultStatus::Pass);
        assert_eq!(validate("94.9", ">=95").status, ResultStatus::Fail);
    }

    #[test]
    fn test_range_bounds_inclusive() {
        assert!(validate("40", "40-50").passed());
        assert!(validate("50", "40-50").passed());
        assert!(!validate("50.5", "40-50").passed());
        assert!(validate("-7", "-10 to -5").passed());
        assert!(!validate("-4", "-10--5").passed());
    }

    #[test]
    fn test_value_is_sanitized() {
        let outcome = validate("45.8%", "40-50");
        assert_eq!(outcome.numeric_value, Some(45.8));
        assert!(outcome.passed());

        assert_eq!(sanitize_numeric(" 7.5 mg/kg"), Some(7.5));
        assert_eq!(sanitize_numeric("1.2.3"), Some(1.2));
        assert_eq!(sanitize_numeric(".5"), Some(0.5));
    }

    #[test]
    fn test_non_numeric_against_numeric_predicate_fails() {
        let outcome = validate("abc", "<10");
        assert_eq!(outcome.status, ResultStatus::Fail);
        assert_eq!(outcome.numeric_value, None);
        assert!(!validate("", "40-50").passed());
    }

    #[test]
    fn test_exact_number() {
        assert!(validate("7", "7").passed());
        assert!(validate("7.0", "7").passed());
        assert!(!validate("7.1", "7").passed());
    }

    #[test]
    fn test_text_match_ignores_case_and_whitespace() {
        assert!(validate("  light yellow ", "Light Yellow").passed());
        assert!(validate("CHARACTERISTIC", "Characteristic").passed());
        assert!(!validate("Dark Brown", "Light Yellow").passed());
    }

    #[test]
    fn test_evaluate_reuses_predicate() {
        let predicate = parse_spec("<=0.5");
        let outcome = evaluate("0.4", predicate.clone());
        assert!(outcome.passed());
        assert_eq!(outcome.predicate, predicate);
    }
}
