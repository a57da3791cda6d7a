//! Geometric edits over whole level documents
//!
//! [`TransformEdit`] pre-builds one [`Transform`] per attribute group so that
//! each edit is a single call taking the document text and returning the new
//! text.
//!
//! # Example
//!
//! ```
//! use alf_edit::{EditConfig, TransformEdit};
//!
//! let edit = TransformEdit::new(EditConfig::default()).unwrap();
//! let out = edit.translate_x(r#"<Wall x="{{ base + 2 }}" />"#, "3").unwrap();
//! assert_eq!(out, r#"<Wall x="{{ base + 5 }}" />"#);
//! ```

use tracing::debug;

use crate::config::EditConfig;
use crate::locate::ScopeFilter;
use crate::transform::{
    apply_param_to_etag, operations, Direction, Rotation90, Transform, TransformError,
};

const X_ATTRIBUTES: [&str; 3] = ["cx", "x", "xx"];
const Z_ATTRIBUTES: [&str; 3] = ["cz", "z", "zz"];
const Y_ATTRIBUTES: [&str; 2] = ["y", "yy"];
const ANGLE_ATTRIBUTES: [&str; 1] = ["angle"];
const DIMENSION_ATTRIBUTES: [&str; 2] = ["w", "d"];

/// All document-level edits, configured once
#[derive(Debug, Clone)]
pub struct TransformEdit {
    config: EditConfig,
    x_add: Transform,
    y_add: Transform,
    z_add: Transform,
    angle_mirror_x: Transform,
    angle_mirror_y: Transform,
    angle_mirror_z: Transform,
    // Mirroring across the X axis moves z coordinates, and vice versa
    coord_mirror_x: Transform,
    coord_mirror_y: Transform,
    coord_mirror_z: Transform,
    simplifier: Transform,
}

impl TransformEdit {
    pub fn new(config: EditConfig) -> Result<Self, TransformError> {
        let simplify = config.simplify_expressions;
        let ramps = ScopeFilter::named(&config.ramp_element);
        let all: Vec<&str> = X_ATTRIBUTES
            .iter()
            .chain(&Z_ATTRIBUTES)
            .chain(&Y_ATTRIBUTES)
            .chain(&DIMENSION_ATTRIBUTES)
            .copied()
            .collect();

        let edit = Self {
            x_add: Transform::new(&X_ATTRIBUTES, operations::addition, simplify, None)?,
            y_add: Transform::new(&Y_ATTRIBUTES, operations::addition, simplify, None)?,
            z_add: Transform::new(&Z_ATTRIBUTES, operations::addition, simplify, None)?,
            angle_mirror_x: Transform::new(&ANGLE_ATTRIBUTES, operations::angle_mirror_x, false, None)?,
            angle_mirror_y: Transform::new(
                &ANGLE_ATTRIBUTES,
                operations::angle_mirror_y_ramp,
                false,
                Some(&ramps),
            )?,
            angle_mirror_z: Transform::new(&ANGLE_ATTRIBUTES, operations::angle_mirror_z, false, None)?,
            coord_mirror_x: Transform::new(&Z_ATTRIBUTES, operations::coordinate_mirror, simplify, None)?,
            coord_mirror_y: Transform::new(&Y_ATTRIBUTES, operations::coordinate_mirror, simplify, None)?,
            coord_mirror_z: Transform::new(&X_ATTRIBUTES, operations::coordinate_mirror, simplify, None)?,
            // Always simplifies, whatever the configuration says
            simplifier: Transform::new(&all, operations::identity, true, None)?,
            config,
        };
        debug!(config = ?edit.config, "transform edit ready");
        Ok(edit)
    }

    pub fn config(&self) -> &EditConfig {
        &self.config
    }

    pub fn translate_x(&self, text: &str, expr: &str) -> Result<String, TransformError> {
        self.x_add.apply(text, expr)
    }

    pub fn translate_y(&self, text: &str, expr: &str) -> Result<String, TransformError> {
        self.y_add.apply(text, expr)
    }

    pub fn translate_z(&self, text: &str, expr: &str) -> Result<String, TransformError> {
        self.z_add.apply(text, expr)
    }

    /// Mirror across the line `z = pivot`
    pub fn mirror_x(&self, text: &str, pivot: &str) -> Result<String, TransformError> {
        let text = self.angle_mirror_x.apply(text, pivot)?;
        self.coord_mirror_x.apply(&text, pivot)
    }

    /// Mirror across the plane `y = pivot`; only ramps change angle
    pub fn mirror_y(&self, text: &str, pivot: &str) -> Result<String, TransformError> {
        let text = self.angle_mirror_y.apply(text, pivot)?;
        self.coord_mirror_y.apply(&text, pivot)
    }

    /// Mirror across the line `x = pivot`
    pub fn mirror_z(&self, text: &str, pivot: &str) -> Result<String, TransformError> {
        let text = self.angle_mirror_z.apply(text, pivot)?;
        self.coord_mirror_z.apply(&text, pivot)
    }

    pub fn rotate_90_clockwise(
        &self,
        text: &str,
        pivot_x: &str,
        pivot_z: &str,
    ) -> Result<String, TransformError> {
        self.rotate(text, pivot_x, pivot_z, Direction::Clockwise)
    }

    pub fn rotate_90_counterclockwise(
        &self,
        text: &str,
        pivot_x: &str,
        pivot_z: &str,
    ) -> Result<String, TransformError> {
        self.rotate(text, pivot_x, pivot_z, Direction::Counterclockwise)
    }

    fn rotate(
        &self,
        text: &str,
        pivot_x: &str,
        pivot_z: &str,
        direction: Direction,
    ) -> Result<String, TransformError> {
        Rotation90::new(pivot_x, pivot_z, direction, self.config.simplify_expressions)?.apply(text)
    }

    /// Set `attr` to `value` everywhere, or only on elements named `scope`
    pub fn set(
        &self,
        text: &str,
        value: &str,
        attr: &str,
        scope: Option<&str>,
    ) -> Result<String, TransformError> {
        let scope = scope.map(ScopeFilter::named);
        Transform::new(
            &[attr],
            operations::set,
            self.config.simplify_expressions,
            scope.as_ref(),
        )?
        .lenient()
        .apply(text, value)
    }

    pub fn set_on_etag(
        &self,
        text: &str,
        value: &str,
        attr: &str,
        etag: &str,
    ) -> Result<String, TransformError> {
        apply_param_to_etag(text, attr, value, etag)
    }

    /// Re-simplify every coordinate and dimension
    pub fn simplify(&self, text: &str) -> Result<String, TransformError> {
        self.simplifier.apply(text, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn edit() -> TransformEdit {
        TransformEdit::new(EditConfig::default()).unwrap()
    }

    #[test]
    fn test_translate_z_macro() {
        let input = r#"{{ Foo(cx=0, x=0, xx=0, cz=0, z=0, zz=0, y=0, yy=0, irrelevant="0" }}"#;
        assert_eq!(
            edit().translate_z(input, "1").unwrap(),
            r#"{{ Foo(cx=0, x=0, xx=0, cz=1, z=1, zz=1, y=0, yy=0, irrelevant="0" }}"#
        );
    }

    #[test]
    fn test_translate_y_macro() {
        let input = r#"{{ Foo(cx=0, x=0, xx=0, cz=0, z=0, zz=0, y=0, yy=0, irrelevant="0" }}"#;
        assert_eq!(
            edit().translate_y(input, "1").unwrap(),
            r#"{{ Foo(cx=0, x=0, xx=0, cz=0, z=0, zz=0, y=1, yy=1, irrelevant="0" }}"#
        );
    }

    #[test]
    fn test_translate_missing_argument() {
        let err = edit().translate_x(r#"<A x="1" />"#, "").unwrap_err();
        assert!(matches!(err, TransformError::MissingArgument));
    }

    #[test]
    fn test_mirror_z_flips_x_and_angle() {
        let input = r#"<Wall x="2" xx="6" z="1" angle="90" />"#;
        assert_eq!(
            edit().mirror_z(input, "").unwrap(),
            r#"<Wall x="-2" xx="-6" z="1" angle="270" />"#
        );
    }

    #[test]
    fn test_mirror_x_flips_z_and_angle() {
        let input = r#"<Wall x="2" z="{{ h + 1 }}" angle="0" />"#;
        assert_eq!(
            edit().mirror_x(input, "3").unwrap(),
            r#"<Wall x="2" z="{{ -h + 5 }}" angle="180" />"#
        );
    }

    #[test]
    fn test_mirror_y_only_turns_ramps() {
        let input = r#"<Ramp y="1" angle="90" /><Wall y="2" angle="90" />"#;
        assert_eq!(
            edit().mirror_y(input, "").unwrap(),
            r#"<Ramp y="-1" angle="270" /><Wall y="-2" angle="90" />"#
        );
    }

    #[test]
    fn test_mirror_y_custom_ramp_element() {
        let edit = TransformEdit::new(EditConfig::new().with_ramp_element("Slope")).unwrap();
        let input = r#"<Slope angle="0" /><Ramp angle="0" />"#;
        assert_eq!(
            edit.mirror_y(input, "").unwrap(),
            r#"<Slope angle="180" /><Ramp angle="0" />"#
        );
    }

    #[test]
    fn test_mirror_rejects_symbolic_pivot() {
        let err = edit().mirror_z(r#"<A x="1" />"#, "p").unwrap_err();
        assert!(err.is_user_error());
    }

    #[test]
    fn test_set_scoped_and_general() {
        let input = r#"<Ramp foo="1" /><Wall foo="2" />"#;
        assert_eq!(
            edit().set(input, "0", "foo", Some("Ramp")).unwrap(),
            r#"<Ramp foo="0" /><Wall foo="2" />"#
        );
        assert_eq!(
            edit().set(input, "0", "foo", None).unwrap(),
            r#"<Ramp foo="0" /><Wall foo="0" />"#
        );
    }

    #[test]
    fn test_set_dotted_value() {
        let input = r#"<Foo bar="{{ 1 }}" />"#;
        assert_eq!(
            edit().set(input, "bar.1", "bar", None).unwrap(),
            r#"<Foo bar="{{ bar.1 }}" />"#
        );
    }

    #[test]
    fn test_simplify_ignores_config() {
        let edit = TransformEdit::new(EditConfig::new().with_simplify_expressions(false)).unwrap();
        let input = r#"<Wall x="{{ a + a }}" w="2 * 3" angle="1 + 1" />"#;
        assert_eq!(
            edit.simplify(input).unwrap(),
            r#"<Wall x="{{ 2 * a }}" w="6" angle="1 + 1" />"#
        );
    }

    #[test]
    fn test_rotate_round_trip() {
        let input = r#"<Wall x="0" xx="4" z="1" zz="{{ h }}" angle="0" />
{{ Ramp(cx=1, cz=2, w=3, d=5, angle=90) }}"#;
        let edit = edit();
        let turned = edit.rotate_90_clockwise(input, "1", "1").unwrap();
        assert_ne!(turned, input);
        assert_eq!(edit.rotate_90_counterclockwise(&turned, "1", "1").unwrap(), input);
    }
}
