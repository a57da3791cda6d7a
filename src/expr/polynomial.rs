//! Canonical polynomial form for attribute value expressions.
//!
//! Expressions are normalized into a sum of terms, each term a coefficient
//! times a monomial. Monomials are products of factors raised to positive
//! integer powers, where a factor is either a symbol or a quotient that could
//! not be reduced. Like terms are collected during construction, so two
//! algebraically equal linear expressions normalize to the same polynomial.
//!
//! ## Rendering
//!
//! Non-constant terms are written in order of first appearance and the
//! constant term goes last, which keeps a translated value readable:
//! `foo + 25` translated by `1` renders as `foo + 26`. Powers are written as
//! repeated products (`x * x`) since the level template evaluator has no
//! exponent operator.

use std::fmt;

use crate::error::ExprError;
use crate::expr::ast::{BinaryOp, Expr};
use crate::expr::format_number;

/// Relative tolerance for treating two coefficients as equal
const TOLERANCE: f64 = 4.0 * f64::EPSILON;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= TOLERANCE * a.abs().max(b.abs())
}

/// An irreducible factor of a monomial
#[derive(Debug, Clone)]
pub enum Factor {
    Symbol(String),
    Quotient(Box<Polynomial>, Box<Polynomial>),
}

impl PartialEq for Factor {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Factor::Symbol(a), Factor::Symbol(b)) => a == b,
            (Factor::Quotient(n1, d1), Factor::Quotient(n2, d2)) => n1 == n2 && d1 == d2,
            _ => false,
        }
    }
}

/// A product of factors, each with a positive exponent
#[derive(Debug, Clone, Default)]
pub struct Monomial {
    factors: Vec<(Factor, u32)>,
}

impl Monomial {
    pub fn one() -> Self {
        Self::default()
    }

    pub fn of(factor: Factor) -> Self {
        Self {
            factors: vec![(factor, 1)],
        }
    }

    pub fn is_one(&self) -> bool {
        self.factors.is_empty()
    }

    fn exponent_of(&self, factor: &Factor) -> u32 {
        self.factors
            .iter()
            .find(|(f, _)| f == factor)
            .map_or(0, |(_, e)| *e)
    }

    /// Factors shared with `other`, each at the lower exponent
    fn common(&self, other: &Monomial) -> Monomial {
        let factors = self
            .factors
            .iter()
            .filter_map(|(f, e)| {
                let shared = (*e).min(other.exponent_of(f));
                (shared > 0).then(|| (f.clone(), shared))
            })
            .collect();
        Monomial { factors }
    }

    /// Divide out `divisor`, which must be a factor of `self`
    fn without(&self, divisor: &Monomial) -> Monomial {
        let factors = self
            .factors
            .iter()
            .filter_map(|(f, e)| {
                let left = e.saturating_sub(divisor.exponent_of(f));
                (left > 0).then(|| (f.clone(), left))
            })
            .collect();
        Monomial { factors }
    }

    fn mul(&self, other: &Monomial) -> Monomial {
        let mut result = self.clone();
        for (factor, exp) in &other.factors {
            match result.factors.iter_mut().find(|(f, _)| f == factor) {
                Some((_, e)) => *e += exp,
                None => result.factors.push((factor.clone(), *exp)),
            }
        }
        result
    }

    /// Order-insensitive equality (`x * y` is the same monomial as `y * x`)
    fn same_as(&self, other: &Monomial) -> bool {
        self.factors.len() == other.factors.len()
            && self
                .factors
                .iter()
                .all(|(f, e)| other.factors.iter().any(|(g, d)| f == g && e == d))
    }

    /// True if the monomial is a single factor that renders without parentheses
    fn is_bare_symbol(&self) -> bool {
        matches!(self.factors.as_slice(), [(Factor::Symbol(_), 1)])
    }

    fn write(&self, f: &mut fmt::Formatter<'_>, standalone: bool) -> fmt::Result {
        let single = standalone && self.factors.len() == 1 && self.factors[0].1 == 1;
        let mut first = true;
        for (factor, exp) in &self.factors {
            for _ in 0..*exp {
                if !first {
                    write!(f, " * ")?;
                }
                first = false;
                match factor {
                    Factor::Symbol(name) => write!(f, "{}", name)?,
                    Factor::Quotient(num, den) if single => write_quotient(f, num, den)?,
                    Factor::Quotient(num, den) => {
                        write!(f, "(")?;
                        write_quotient(f, num, den)?;
                        write!(f, ")")?;
                    }
                }
            }
        }
        Ok(())
    }
}

fn write_quotient(f: &mut fmt::Formatter<'_>, num: &Polynomial, den: &Polynomial) -> fmt::Result {
    if num.terms.len() > 1 {
        write!(f, "({})", num)?;
    } else {
        write!(f, "{}", num)?;
    }
    if den.is_bare_symbol() {
        write!(f, " / {}", den)
    } else {
        write!(f, " / ({})", den)
    }
}

#[derive(Debug, Clone)]
struct Term {
    monomial: Monomial,
    coefficient: f64,
}

/// A sum of terms in canonical form
#[derive(Debug, Clone, Default)]
pub struct Polynomial {
    terms: Vec<Term>,
}

impl PartialEq for Polynomial {
    fn eq(&self, other: &Self) -> bool {
        self.terms.len() == other.terms.len()
            && self.terms.iter().all(|t| {
                other.terms.iter().any(|u| {
                    t.monomial.same_as(&u.monomial) && approx_eq(t.coefficient, u.coefficient)
                })
            })
    }
}

impl Polynomial {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn constant(value: f64) -> Self {
        let mut poly = Self::zero();
        poly.add_term(Monomial::one(), value);
        poly
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Self::from_factor(Factor::Symbol(name.into()))
    }

    fn from_factor(factor: Factor) -> Self {
        Self {
            terms: vec![Term {
                monomial: Monomial::of(factor),
                coefficient: 1.0,
            }],
        }
    }

    /// Normalize a parsed expression
    pub fn from_expr(expr: &Expr) -> Result<Self, ExprError> {
        Ok(match expr {
            Expr::Number(n) => Self::constant(*n),
            Expr::Symbol(name) => Self::symbol(name.clone()),
            Expr::Neg(inner) => Self::from_expr(inner)?.neg(),
            Expr::Binary(op, lhs, rhs) => {
                let lhs = Self::from_expr(lhs)?;
                let rhs = Self::from_expr(rhs)?;
                match op {
                    BinaryOp::Add => lhs.add(&rhs),
                    BinaryOp::Sub => lhs.add(&rhs.neg()),
                    BinaryOp::Mul => lhs.mul(&rhs),
                    BinaryOp::Div => lhs.div(&rhs)?,
                }
            }
        })
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// The value of a polynomial without non-constant terms
    pub fn as_constant(&self) -> Option<f64> {
        match self.terms.as_slice() {
            [] => Some(0.0),
            [term] if term.monomial.is_one() => Some(term.coefficient),
            _ => None,
        }
    }

    /// Largest monomial dividing every term
    fn common_monomial(&self) -> Monomial {
        let mut terms = self.terms.iter();
        let first = terms.next().map(|t| t.monomial.clone()).unwrap_or_default();
        terms.fold(first, |acc, t| acc.common(&t.monomial))
    }

    fn without_monomial(&self, divisor: &Monomial) -> Self {
        let terms = self
            .terms
            .iter()
            .map(|t| Term {
                monomial: t.monomial.without(divisor),
                coefficient: t.coefficient,
            })
            .collect();
        Self { terms }
    }

    fn is_bare_symbol(&self) -> bool {
        match self.terms.as_slice() {
            [term] => approx_eq(term.coefficient, 1.0) && term.monomial.is_bare_symbol(),
            _ => false,
        }
    }

    fn add_term(&mut self, monomial: Monomial, coefficient: f64) {
        if let Some(idx) = self.terms.iter().position(|t| t.monomial.same_as(&monomial)) {
            let sum = self.terms[idx].coefficient + coefficient;
            // Cancellation is judged against the magnitudes involved so that
            // `0.1 + 0.2 - 0.3` collapses to zero
            let scale = self.terms[idx].coefficient.abs().max(coefficient.abs());
            if sum.abs() <= TOLERANCE * scale {
                self.terms.remove(idx);
            } else {
                self.terms[idx].coefficient = sum;
            }
        } else if coefficient != 0.0 {
            self.terms.push(Term {
                monomial,
                coefficient,
            });
        }
    }

    pub fn add(mut self, other: &Polynomial) -> Self {
        for term in &other.terms {
            self.add_term(term.monomial.clone(), term.coefficient);
        }
        self
    }

    pub fn neg(self) -> Self {
        self.scale(-1.0)
    }

    fn scale(mut self, factor: f64) -> Self {
        for term in &mut self.terms {
            term.coefficient *= factor;
        }
        self.terms.retain(|t| t.coefficient != 0.0);
        self
    }

    pub fn mul(&self, other: &Polynomial) -> Self {
        if let Some(cancelled) = self
            .cancel_quotient(other)
            .or_else(|| other.cancel_quotient(self))
        {
            return cancelled;
        }
        let mut result = Self::zero();
        for a in &self.terms {
            for b in &other.terms {
                result.add_term(a.monomial.mul(&b.monomial), a.coefficient * b.coefficient);
            }
        }
        result
    }

    pub fn div(self, other: &Polynomial) -> Result<Self, ExprError> {
        if let Some(divisor) = other.as_constant() {
            if divisor == 0.0 {
                return Err(ExprError::DivisionByZero);
            }
            return Ok(self.scale(1.0 / divisor));
        }
        if self.is_zero() {
            return Ok(self);
        }

        // `a * b / b` is `a`
        let shared = self.common_monomial().common(&other.common_monomial());
        let (numerator, denominator) = if shared.is_one() {
            (self, other.clone())
        } else {
            (self.without_monomial(&shared), other.without_monomial(&shared))
        };
        if let Some(divisor) = denominator.as_constant() {
            return Ok(numerator.scale(1.0 / divisor));
        }
        if let Some(ratio) = numerator.ratio_to(&denominator) {
            return Ok(Self::constant(ratio));
        }

        // Keep the sign outside the quotient: `-a / b` rather than `(-a) / b`
        let negative = numerator.leading_coefficient() < 0.0;
        let numerator = if negative { numerator.neg() } else { numerator };
        let quotient = Self::from_factor(Factor::Quotient(
            Box::new(numerator),
            Box::new(denominator),
        ));
        Ok(if negative { quotient.neg() } else { quotient })
    }

    /// `k * (n / d)` times a multiple of `d` collapses back to a multiple of `n`
    fn cancel_quotient(&self, other: &Polynomial) -> Option<Polynomial> {
        let [term] = self.terms.as_slice() else {
            return None;
        };
        let [(Factor::Quotient(num, den), 1)] = term.monomial.factors.as_slice() else {
            return None;
        };
        let ratio = other.ratio_to(den)?;
        Some(num.as_ref().clone().scale(term.coefficient * ratio))
    }

    /// If `self == k * other` for some constant `k`, return `k`
    fn ratio_to(&self, other: &Polynomial) -> Option<f64> {
        if self.terms.len() != other.terms.len() {
            return None;
        }
        let first = other.terms.first()?;
        let matching = self
            .terms
            .iter()
            .find(|t| t.monomial.same_as(&first.monomial))?;
        let ratio = matching.coefficient / first.coefficient;
        let proportional = other.terms.iter().all(|u| {
            self.terms.iter().any(|t| {
                t.monomial.same_as(&u.monomial) && approx_eq(t.coefficient, ratio * u.coefficient)
            })
        });
        proportional.then_some(ratio)
    }

    /// Coefficient of the first term in render order
    fn leading_coefficient(&self) -> f64 {
        self.ordered_terms()
            .next()
            .map(|t| t.coefficient)
            .unwrap_or(0.0)
    }

    /// Non-constant terms in insertion order, then the constant term
    fn ordered_terms(&self) -> impl Iterator<Item = &Term> {
        self.terms
            .iter()
            .filter(|t| !t.monomial.is_one())
            .chain(self.terms.iter().filter(|t| t.monomial.is_one()))
    }
}

impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "0");
        }
        for (i, term) in self.ordered_terms().enumerate() {
            let negative = term.coefficient < 0.0;
            match (i, negative) {
                (0, true) => write!(f, "-")?,
                (0, false) => {}
                (_, true) => write!(f, " - ")?,
                (_, false) => write!(f, " + ")?,
            }

            let magnitude = term.coefficient.abs();
            if term.monomial.is_one() {
                write!(f, "{}", format_number(magnitude))?;
            } else if approx_eq(magnitude, 1.0) {
                term.monomial.write(f, true)?;
            } else {
                write!(f, "{} * ", format_number(magnitude))?;
                term.monomial.write(f, false)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::grammar::parse;

    fn normalize(input: &str) -> Polynomial {
        Polynomial::from_expr(&parse(input).unwrap()).unwrap()
    }

    fn render(input: &str) -> String {
        normalize(input).to_string()
    }

    #[test]
    fn test_constant_folding() {
        assert_eq!(render("2 * (3) - (10)"), "-4");
        assert_eq!(render("(1 + 3) / 2"), "2");
    }

    #[test]
    fn test_constant_goes_last() {
        assert_eq!(render("10 + (a + b + c)"), "a + b + c + 10");
    }

    #[test]
    fn test_like_terms_cancel() {
        assert_eq!(render("a + (-a)"), "0");
        assert_eq!(render("x - x + 3"), "3");
    }

    #[test]
    fn test_like_terms_collect() {
        assert_eq!(render("x + x"), "2 * x");
        assert_eq!(render("x * y + y * x"), "2 * x * y");
    }

    #[test]
    fn test_powers_are_repeated_products() {
        assert_eq!(render("x * x + (1)"), "x * x + 1");
        assert_eq!(render("(a + 1) * (a - 1)"), "a * a - 1");
    }

    #[test]
    fn test_leading_negative_term() {
        assert_eq!(render("2 * (0) - (x)"), "-x");
        assert_eq!(render("2 * (5) - (x)"), "-x + 10");
        assert_eq!(render("-(2 * y) + 1"), "-2 * y + 1");
    }

    #[test]
    fn test_fractional_coefficients() {
        assert_eq!(render("(a + b) / 2"), "0.5 * a + 0.5 * b");
        assert_eq!(render("0.1 + 0.2 - 0.3"), "0");
    }

    #[test]
    fn test_division_by_proportional_polynomial() {
        assert_eq!(render("(2 * a + 2 * b) / (a + b)"), "2");
        assert_eq!(render("x / x"), "1");
    }

    #[test]
    fn test_irreducible_quotient() {
        assert_eq!(render("a / b"), "a / b");
        assert_eq!(render("(a + 1) / (b + 2)"), "(a + 1) / (b + 2)");
        assert_eq!(render("-a / b"), "-a / b");
        assert_eq!(render("a / b + a / b"), "2 * (a / b)");
        assert_eq!(render("a / b - a / b"), "0");
    }

    #[test]
    fn test_shared_factors_cancel() {
        assert_eq!(render("a * b / b"), "a");
        assert_eq!(render("x * x / x"), "x");
        assert_eq!(render("(a * b + a) / (a * c)"), "(b + 1) / c");
        assert_eq!(render("2 * a / (4 * a * b)"), "2 / (4 * b)");
    }

    #[test]
    fn test_quotient_times_denominator() {
        assert_eq!(render("2 / (a + 1) * (a + 1)"), "2");
        assert_eq!(render("(2 * a + 2) * (x / (a + 1))"), "2 * x");
        assert_eq!(render("-(a / (b + 1)) * (b + 1)"), "-a");
    }

    #[test]
    fn test_tiny_constants_survive() {
        assert_eq!(render("0.00000000001"), "0.00000000001");
        assert_eq!(render("x * 0.00000000001"), "0.00000000001 * x");
    }

    #[test]
    fn test_division_by_zero() {
        let err = Polynomial::from_expr(&parse("a / (1 - 1)").unwrap()).unwrap_err();
        assert_eq!(err, ExprError::DivisionByZero);
    }

    #[test]
    fn test_order_insensitive_equality() {
        assert_eq!(normalize("a + b"), normalize("b + a"));
        assert_ne!(normalize("a + b"), normalize("a - b"));
    }
}
