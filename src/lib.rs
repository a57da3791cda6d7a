//! ALF Edit - expression-aware attribute transforms for level files
//!
//! Level files mix XML tags with template macro calls, and positions are often
//! written as expressions (`x="{{ wall_x + 2 }}"`). This library locates those
//! values, applies an algebraic edit (translate, mirror, rotate, set) and
//! simplifies the result, leaving everything else in the text untouched.
//!
//! # Example
//!
//! ```rust
//! use alf_edit::{EditConfig, TransformEdit};
//!
//! let edit = TransformEdit::new(EditConfig::default()).unwrap();
//! let level = r#"<Wall x="{{ base }}" z="0" /> {{ Ramp(x=1, z=2, angle=90) }}"#;
//!
//! let moved = edit.translate_x(level, "10").unwrap();
//! assert_eq!(moved, r#"<Wall x="{{ base + 10 }}" z="0" /> {{ Ramp(x=11, z=2, angle=90) }}"#);
//! ```

pub mod config;
pub mod edit;
pub mod error;
pub mod expr;
pub mod locate;
pub mod transform;

pub use config::{ConfigError, EditConfig};
pub use edit::TransformEdit;
pub use error::ExprError;
pub use expr::{is_numeric, simplify};
pub use locate::{AttributeLocator, MacroParameter, Occurrence, ScopeFilter};
pub use transform::{Transform, TransformError};
