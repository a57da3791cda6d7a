//! Error types for the transform engine

use std::fmt;

use thiserror::Error;

use crate::error::ExprError;

/// What kind of value failed a numeric check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericValue {
    Coordinate,
    Angle,
    CenterOfRotation,
}

impl fmt::Display for NumericValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericValue::Coordinate => write!(f, "Coordinate"),
            NumericValue::Angle => write!(f, "Angle values"),
            NumericValue::CenterOfRotation => write!(f, "Center of rotation coordinates"),
        }
    }
}

/// Errors that can occur while transforming a document
#[derive(Debug, Error)]
pub enum TransformError {
    /// A transform that needs an expression was given none
    #[error("Missing argument.")]
    MissingArgument,

    #[error("{what} must be numeric (got \"{value}\").")]
    NotNumeric { what: NumericValue, value: String },

    #[error("Etag \"{etag}\" not found.")]
    EtagNotFound { etag: String },

    #[error("Param \"{param}\" does not exist on element with etag \"{etag}\".")]
    ParamNotOnEtag { param: String, etag: String },

    /// An element positioned on one horizontal axis only
    #[error("Element '{element}' has no position on the {axis} axis.")]
    MissingPosition { element: String, axis: char },

    /// The simplifier rejected an expression
    #[error("Cannot simplify \"{expr}\": {source}")]
    Simplify {
        expr: String,
        #[source]
        source: ExprError,
    },

    /// A decoded symbol was never recorded by the encoder
    #[error("unrecognized symbol \"{0}\"")]
    UnrecognizedSymbol(String),

    #[error("invalid transform configuration: {0}")]
    InvalidConfiguration(String),

    /// An attribute pattern failed to compile
    #[error("invalid attribute pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl TransformError {
    pub fn not_numeric(what: NumericValue, value: impl Into<String>) -> Self {
        Self::NotNumeric {
            what,
            value: value.into(),
        }
    }

    pub fn simplify(expr: impl Into<String>, source: ExprError) -> Self {
        Self::Simplify {
            expr: expr.into(),
            source,
        }
    }

    pub fn missing_position(element: impl Into<String>, axis: char) -> Self {
        Self::MissingPosition {
            element: element.into(),
            axis,
        }
    }

    /// True for errors caused by user input rather than by a defect.
    ///
    /// User errors are reported as messages; everything else is logged as an
    /// internal failure.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::MissingArgument
                | Self::NotNumeric { .. }
                | Self::EtagNotFound { .. }
                | Self::ParamNotOnEtag { .. }
                | Self::MissingPosition { .. }
                | Self::Simplify { .. }
        )
    }
}
