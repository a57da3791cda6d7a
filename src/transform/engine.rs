//! The locate, operate, simplify and splice pipeline

use tracing::{debug, trace};

use crate::expr::{self, ExpressionEncoder};
use crate::locate::{AttributeLocator, Occurrence, ScopeFilter};

use super::error::TransformError;

/// Combines an attribute's current expression with the transform expression
pub type Operation = fn(&str, &str) -> Result<String, TransformError>;

/// An operation bound to a set of attributes.
///
/// A `Transform` holds only compiled patterns and flags; every call to
/// [`Transform::apply`] starts from a fresh symbol table.
#[derive(Debug, Clone)]
pub struct Transform {
    locator: AttributeLocator,
    operation: Operation,
    simplify_expressions: bool,
    lenient: bool,
}

impl Transform {
    /// Build a transform over `attrs`.
    ///
    /// With a scope the transform only touches elements matching the filter,
    /// and exactly one attribute may be targeted.
    pub fn new(
        attrs: &[&str],
        operation: Operation,
        simplify_expressions: bool,
        scope: Option<&ScopeFilter>,
    ) -> Result<Self, TransformError> {
        let locator = match scope {
            Some(scope) => {
                if attrs.len() != 1 {
                    return Err(TransformError::InvalidConfiguration(format!(
                        "a scoped transform targets exactly one attribute, got {}",
                        attrs.len()
                    )));
                }
                AttributeLocator::scoped(attrs, scope)?
            }
            None => AttributeLocator::general(attrs)?,
        };

        debug!(
            attrs = ?attrs,
            simplify_expressions,
            scope = ?scope.map(ScopeFilter::tag_pattern),
            "transform configured"
        );

        Ok(Self {
            locator,
            operation,
            simplify_expressions,
            lenient: false,
        })
    }

    /// Keep the raw operation result when the simplifier rejects it
    pub fn lenient(mut self) -> Self {
        self.lenient = true;
        self
    }

    /// Apply the operation to every targeted attribute in `text`.
    ///
    /// Tag attributes are rewritten first, then macro parameters. Any error
    /// aborts the whole call and no partial result is returned.
    pub fn apply(&self, text: &str, transform_expr: &str) -> Result<String, TransformError> {
        let span = tracing::debug_span!("transform", bytes = text.len(), transform_expr);
        let _enter = span.enter();

        let mut encoder = self.simplify_expressions.then(ExpressionEncoder::new);
        let encoded_transform = match encoder.as_mut() {
            Some(encoder) => encoder.encode(transform_expr),
            None => transform_expr.to_string(),
        };
        trace!(encoded_transform = %encoded_transform, "encoded transform expression");

        let text = self.locator.replace_tags(text, |occ| {
            self.rewrite(occ, &encoded_transform, &mut encoder)
        })?;
        let text = self.locator.replace_macros(&text, |occ| {
            self.rewrite(occ, &encoded_transform, &mut encoder)
        })?;

        match encoder {
            Some(encoder) => {
                debug!(symbols = encoder.len(), "decoding transformed text");
                encoder.decode(&text)
            }
            None => Ok(text),
        }
    }

    fn rewrite(
        &self,
        occ: &Occurrence<'_>,
        transform_expr: &str,
        encoder: &mut Option<ExpressionEncoder>,
    ) -> Result<String, TransformError> {
        let current = match encoder.as_mut() {
            Some(encoder) => encoder.encode(occ.expr),
            None => occ.expr.to_string(),
        };
        let applied = (self.operation)(&current, transform_expr)?;
        trace!(attr = occ.attr, current = %current, applied = %applied, "operation applied");

        if !self.simplify_expressions || expr::is_numeric(&applied) {
            return Ok(applied);
        }

        match expr::simplify(&applied) {
            Ok(simplified) => Ok(simplified),
            Err(err) if self.lenient => {
                debug!(attr = occ.attr, error = %err, "keeping unsimplified value");
                Ok(applied)
            }
            Err(err) => {
                let shown = encoder
                    .as_ref()
                    .and_then(|encoder| encoder.decode(&applied).ok())
                    .unwrap_or(applied);
                Err(TransformError::simplify(shown, err))
            }
        }
    }
}
