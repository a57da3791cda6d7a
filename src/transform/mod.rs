//! Attribute transforms
//!
//! A [`Transform`] binds an [`Operation`] to a set of attribute names and
//! rewrites every matching value in a document:
//!
//! 1. locate each tag attribute, then each macro parameter
//! 2. shield function calls and colors behind symbols
//! 3. combine the current value with the transform expression
//! 4. simplify, unless disabled or already numeric
//! 5. restore the shielded text and splice the value back
//!
//! Rotations and etag patches need a whole element at a time and live in
//! [`rotation`] and [`etag`].

pub mod engine;
pub mod error;
pub mod etag;
pub mod operations;
pub mod rotation;

pub use engine::{Operation, Transform};
pub use error::{NumericValue, TransformError};
pub use etag::apply_param_to_etag;
pub use rotation::{AttributeBag, AxisForm, Direction, Rotation90, PLACED_ACTOR_ATTRIBUTES};
