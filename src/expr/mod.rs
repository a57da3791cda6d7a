//! Attribute value expressions
//!
//! Parses the arithmetic subset of the level template language, normalizes it
//! into a polynomial and renders the result back to text.

pub mod ast;
pub mod encoder;
pub mod grammar;
pub mod lexer;
pub mod polynomial;

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ExprError;

pub use ast::{BinaryOp, Expr};
pub use encoder::ExpressionEncoder;
pub use grammar::parse;
pub use polynomial::Polynomial;

static NUMERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*-?\s*[0-9]+(\.[0-9]+)?(e-?[0-9]+)?\s*$").expect("numeric pattern must compile")
});

/// Significant digits tried before falling back to the exact rendering
const SIGNIFICANT_DIGITS: usize = 15;

/// True if `text` is a plain number literal, optionally signed
pub fn is_numeric(text: &str) -> bool {
    NUMERIC.is_match(text)
}

/// Parse a plain number literal, allowing whitespace after the sign
pub fn parse_numeric(text: &str) -> Option<f64> {
    if !is_numeric(text) {
        return None;
    }
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    compact.parse().ok()
}

/// Render a number the way simplified expressions print it.
///
/// Values print in their shortest round-trip form. Noise in the last bit or
/// two (`0.1 + 0.2`) is snapped to the nearby short decimal first.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let snapped = format!("{:.*e}", SIGNIFICANT_DIGITS - 1, value)
        .parse::<f64>()
        .unwrap_or(value);
    let shown = if (snapped - value).abs() <= 2.0 * f64::EPSILON * value.abs() {
        snapped
    } else {
        value
    };
    if shown == 0.0 {
        // Never `-0`
        return "0".to_string();
    }
    shown.to_string()
}

/// Simplify an expression into canonical form.
///
/// Input containing `^` is returned unchanged since the template evaluator has
/// no exponent operator.
pub fn simplify(text: &str) -> Result<String, ExprError> {
    if text.contains('^') {
        return Ok(text.to_string());
    }
    let expr = parse(text).map_err(|errs| {
        errs.into_iter()
            .next()
            .unwrap_or_else(|| ExprError::syntax(0..text.len(), "Invalid expression"))
    })?;
    Ok(Polynomial::from_expr(&expr)?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric() {
        assert!(is_numeric("10"));
        assert!(is_numeric(" -2.5 "));
        assert!(is_numeric("- 3"));
        assert!(is_numeric("1e-3"));
        assert!(!is_numeric("+3"));
        assert!(!is_numeric("a"));
        assert!(!is_numeric("1 + 2"));
        assert!(!is_numeric(""));
    }

    #[test]
    fn test_parse_numeric() {
        assert_eq!(parse_numeric("- 3"), Some(-3.0));
        assert_eq!(parse_numeric("45.5"), Some(45.5));
        assert_eq!(parse_numeric("x"), None);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(10.0), "10");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(1.0 / 3.0), "0.3333333333333333");
        assert_eq!(format_number(0.1 + 0.2), "0.3");
        assert_eq!(format_number(2.0 + 2.0 * f64::EPSILON), "2");
        assert_eq!(format_number(-12.25), "-12.25");
    }

    #[test]
    fn test_format_number_keeps_precision() {
        assert_eq!(format_number(0.123456789012), "0.123456789012");
        assert_eq!(format_number(-0.123456789012), "-0.123456789012");
        assert_eq!(format_number(0.00000000001), "0.00000000001");
    }

    #[test]
    fn test_simplify_keeps_small_constants() {
        assert_eq!(simplify("0.00000000001 + (0)").unwrap(), "0.00000000001");
        assert_eq!(simplify("2 * (0) - (0.123456789012)").unwrap(), "-0.123456789012");
        assert_eq!(simplify("x + 0.00000000001").unwrap(), "x + 0.00000000001");
    }

    #[test]
    fn test_simplify() {
        assert_eq!(simplify("foo + 25 + (1)").unwrap(), "foo + 26");
        assert_eq!(simplify("2 * (3) - (x)").unwrap(), "-x + 6");
        assert_eq!(simplify("x * x + (1)").unwrap(), "x * x + 1");
    }

    #[test]
    fn test_simplify_keeps_exponents_verbatim() {
        assert_eq!(simplify("x ^ 2 + (1)").unwrap(), "x ^ 2 + (1)");
    }

    #[test]
    fn test_simplify_rejects_non_arithmetic() {
        assert!(matches!(simplify("a < b"), Err(ExprError::Syntax { .. })));
        assert_eq!(simplify("1 / 0"), Err(ExprError::DivisionByZero));
    }
}
