//! Specification Evaluation Module
//!
//! Parses specification expressions and checks entered result values
//! against them. Both steps are pure and never fail; an unparsable
//! expression degrades to a text match and an unreadable value fails.

pub mod parser;
pub mod validator;

pub use parser::{parse_decimal, parse_spec, ExactValue, ParsedPredicate};
pub use validator::{evaluate, sanitize_numeric, validate, ValidationOutcome};

#[cfg(test)]
mod property_tests {
    use super::*;
    use labqc_models::ResultStatus;
    use proptest::prelude::*;

    fn bound() -> impl Strategy<Value = f64> {
        (-10_000i64..10_000).prop_map(|n| n as f64 / 100.0)
    }

    proptest! {
        #[test]
        fn max_bound_passes_at_and_below(b in bound(), delta in 1i64..10_000) {
            let expr = format!("<{}", b);
            let below = b - delta as f64 / 100.0;
            prop_assert_eq!(validate(&b.to_string(), &expr).status, ResultStatus::Pass);
            prop_assert_eq!(validate(&below.to_string(), &expr).status, ResultStatus::Pass);
        }

        #[test]
        fn range_accepts_endpoints(a in bound(), b in bound()) {
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            let expr = format!("{}-{}", low, high);
            prop_assert_eq!(parse_spec(&expr), ParsedPredicate::Range { low, high });
            prop_assert!(validate(&low.to_string(), &expr).passed());
            prop_assert!(validate(&high.to_string(), &expr).passed());
        }

        #[test]
        fn letters_never_pass_numeric_predicates(word in "[a-zA-Z ]{1,12}", b in bound()) {
            prop_assert_eq!(validate(&word, &format!(">={}", b)).status, ResultStatus::Fail);
        }

        #[test]
        fn parse_never_panics(expr in "\\PC{0,24}") {
            let _ = parse_spec(&expr);
        }
    }
}
