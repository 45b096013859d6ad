//! Specification Expression Parser
//!
//! Turns a specification expression such as `<10`, `40-50` or `Light Yellow`
//! into a typed predicate. Parsing never fails: anything that is not a
//! recognizable numeric form becomes a case-insensitive text match.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

/// Bound used by an exact-match predicate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExactValue {
    Number(f64),
    Text(String),
}

/// A parsed specification expression.
///
/// Bounds are inclusive: `<` and `<=` both yield [`ParsedPredicate::Max`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ParsedPredicate {
    Max(f64),
    Min(f64),
    Range { low: f64, high: f64 },
    Exact(ExactValue),
}

impl ParsedPredicate {
    pub fn is_numeric(&self) -> bool {
        !matches!(self, Self::Exact(ExactValue::Text(_)))
    }
}

impl fmt::Display for ParsedPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Max(bound) => write!(f, "<= {}", bound),
            Self::Min(bound) => write!(f, ">= {}", bound),
            Self::Range { low, high } => write!(f, "{} to {}", low, high),
            Self::Exact(ExactValue::Number(n)) => write!(f, "= {}", n),
            Self::Exact(ExactValue::Text(text)) => write!(f, "\"{}\"", text),
        }
    }
}

const NUMBER: &str = r"-?[0-9]+(?:\.[0-9]+)?";

fn hyphen_range() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(&format!(r"^({NUMBER})\s*-\s*({NUMBER})$")).expect("hyphen range pattern")
    })
}

fn worded_range() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(&format!(r"(?i)^({NUMBER})\s+to\s+({NUMBER})$")).expect("worded range pattern")
    })
}

fn plain_number() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(&format!(r"^{NUMBER}$")).expect("number pattern"))
}

/// Parses a plain decimal number. Exponents, `inf` and `NaN` are rejected.
pub fn parse_decimal(text: &str) -> Option<f64> {
    let text = text.trim();
    if !plain_number().is_match(text) {
        return None;
    }
    text.parse().ok()
}

pub fn parse_spec(expression: &str) -> ParsedPredicate {
    let trimmed = expression.trim();

    if let Some(range) = parse_range(trimmed) {
        return range;
    }

    if let Some(rest) = trimmed.strip_prefix('<') {
        if let Some(bound) = parse_decimal(rest.strip_prefix('=').unwrap_or(rest)) {
            return ParsedPredicate::Max(bound);
        }
    }

    if let Some(rest) = trimmed.strip_prefix('>') {
        if let Some(bound) = parse_decimal(rest.strip_prefix('=').unwrap_or(rest)) {
            return ParsedPredicate::Min(bound);
        }
    }

    match parse_decimal(trimmed) {
        Some(n) => ParsedPredicate::Exact(ExactValue::Number(n)),
        None => ParsedPredicate::Exact(ExactValue::Text(trimmed.to_string())),
    }
}

fn parse_range(expression: &str) -> Option<ParsedPredicate> {
    let captures = hyphen_range()
        .captures(expression)
        .or_else(|| worded_range().captures(expression))?;

    let low = captures.get(1)?.as_str().parse().ok()?;
    let high = captures.get(2)?.as_str().parse().ok()?;
    Some(ParsedPredicate::Range { low, high })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_max_inclusive() {
        assert_eq!(parse_spec("<10"), ParsedPredicate::Max(10.0));
        assert_eq!(parse_spec("<=10"), ParsedPredicate::Max(10.0));
        assert_eq!(parse_spec(" < 2.5 "), ParsedPredicate::Max(2.5));
    }

    #[test]
    fn test_non_ascii_digits_are_text() {
        assert_eq!(
            parse_spec("٣-٥"),
            ParsedPredicate::Exact(ExactValue::Text("٣-٥".to_string()))
        );
        assert_eq!(parse_decimal("٣"), None);
    }

    #[test]
    fn test_parse_min_inclusive() {
        assert_eq!(parse_spec(">95"), ParsedPredicate::Min(95.0));
        assert_eq!(parse_spec(">=99.5"), ParsedPredicate::Min(99.5));
    }

    #[test]
    fn test_parse_ranges() {
        assert_eq!(parse_spec("40-50"), ParsedPredicate::Range { low: 40.0, high: 50.0 });
        assert_eq!(
            parse_spec("0.880-0.892"),
            ParsedPredicate::Range { low: 0.880, high: 0.892 }
        );
        assert_eq!(parse_spec("190 - 200"), ParsedPredicate::Range { low: 190.0, high: 200.0 });
    }

    #[test]
    fn test_leading_minus_is_a_sign() {
        assert_eq!(parse_spec("-10--5"), ParsedPredicate::Range { low: -10.0, high: -5.0 });
        assert_eq!(parse_spec("-3-4"), ParsedPredicate::Range { low: -3.0, high: 4.0 });
        assert_eq!(parse_spec("-5"), ParsedPredicate::Exact(ExactValue::Number(-5.0)));
    }

    #[test]
    fn test_worded_range() {
        assert_eq!(parse_spec("-10 to -5"), ParsedPredicate::Range { low: -10.0, high: -5.0 });
        assert_eq!(parse_spec("1 TO 2"), ParsedPredicate::Range { low: 1.0, high: 2.0 });
    }

    #[test]
    fn test_exact_number() {
        assert_eq!(parse_spec("7"), ParsedPredicate::Exact(ExactValue::Number(7.0)));
        assert_eq!(parse_spec("0.5"), ParsedPredicate::Exact(ExactValue::Number(0.5)));
    }

    #[test]
    fn test_fallback_to_text() {
        assert_eq!(
            parse_spec("  Light Yellow "),
            ParsedPredicate::Exact(ExactValue::Text("Light Yellow".to_string()))
        );
        assert_eq!(
            parse_spec("<abc"),
            ParsedPredicate::Exact(ExactValue::Text("<abc".to_string()))
        );
        assert_eq!(
            parse_spec("1e5"),
            ParsedPredicate::Exact(ExactValue::Text("1e5".to_string()))
        );
        assert_eq!(parse_spec(""), ParsedPredicate::Exact(ExactValue::Text(String::new())));
        assert!(!parse_spec("NaN").is_numeric());
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("45.8"), Some(45.8));
        assert_eq!(parse_decimal("-0.25"), Some(-0.25));
        assert_eq!(parse_decimal("inf"), None);
        assert_eq!(parse_decimal("1."), None);
        assert_eq!(parse_decimal(""), None);
    }
}
