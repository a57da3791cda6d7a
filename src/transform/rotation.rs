//! Quarter-turn rotation of placed actors about a pivot.
//!
//! Placed actors describe their footprint on the horizontal plane in one of
//! several ways per axis (`x` and `xx` corners, `x` with a width `w`, a
//! center `cx`, or a bare `x`). Each element is converted into a center and
//! size per axis, rotated, and converted back into the representation it
//! started with, so only values change and no attribute is added or removed.
//!
//! Extents keep their sign through the round trip: `x = c + (s) / 2` and
//! `xx = c - (s) / 2`, with `s = (x) - (xx)`.

use tracing::{debug, trace};

use crate::expr::{self, format_number, is_numeric, parse_numeric, ExpressionEncoder};
use crate::locate::{AttributeLocator, ScopeFilter};

use super::error::{NumericValue, TransformError};

/// Attributes that position an actor on the horizontal plane
pub const PLACED_ACTOR_ATTRIBUTES: [&str; 9] =
    ["cx", "x", "xx", "cz", "z", "zz", "w", "d", "angle"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Clockwise,
    Counterclockwise,
}

impl Direction {
    fn angle_step(self) -> f64 {
        match self {
            Direction::Clockwise => 90.0,
            Direction::Counterclockwise => 270.0,
        }
    }

    fn rotate_centers(self, x: &str, z: &str, px: &str, pz: &str) -> (String, String) {
        match self {
            Direction::Clockwise => (
                format!("({}) - ({}) + ({})", px, z, pz),
                format!("({}) + ({}) - ({})", pz, x, px),
            ),
            Direction::Counterclockwise => (
                format!("({}) + ({}) - ({})", px, z, pz),
                format!("({}) - ({}) + ({})", pz, x, px),
            ),
        }
    }
}

/// Attribute names describing one horizontal axis
#[derive(Debug, Clone, Copy)]
struct Axis {
    label: char,
    position: &'static str,
    far: &'static str,
    size: &'static str,
    center: &'static str,
}

const X_AXIS: Axis = Axis {
    label: 'x',
    position: "x",
    far: "xx",
    size: "w",
    center: "cx",
};

const Z_AXIS: Axis = Axis {
    label: 'z',
    position: "z",
    far: "zz",
    size: "d",
    center: "cz",
};

/// Which representation an element uses for one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisForm {
    /// Both corners, `x` and `xx`
    Extent,
    /// Corner and size, `x` and `w`
    Sized,
    /// Center, `cx`
    Center,
    /// A lone `x`
    Point,
    Absent,
}

impl AxisForm {
    fn detect(bag: &AttributeBag, axis: &Axis) -> Self {
        let has = |name| bag.get(name).is_some();
        if has(axis.position) && has(axis.far) {
            AxisForm::Extent
        } else if has(axis.position) && has(axis.size) {
            AxisForm::Sized
        } else if has(axis.center) {
            AxisForm::Center
        } else if has(axis.position) {
            AxisForm::Point
        } else {
            AxisForm::Absent
        }
    }

    fn has_position(self) -> bool {
        self != AxisForm::Absent
    }
}

/// Attribute values gathered from one element, in order of appearance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeBag {
    entries: Vec<(String, String)>,
}

impl AttributeBag {
    pub fn get(&self, attr: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == attr)
            .map(|(_, value)| value.as_str())
    }

    /// Insert or overwrite, keeping the first position of the attribute
    pub fn set(&mut self, attr: &str, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(name, _)| name == attr) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((attr.to_string(), value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// One axis in center and size form
#[derive(Debug, Clone, Default)]
struct StandardAxis {
    center: Option<String>,
    size: Option<String>,
}

impl StandardAxis {
    fn from_bag(bag: &AttributeBag, axis: &Axis, form: AxisForm) -> Self {
        let get = |name| bag.get(name).map(str::to_string);
        match form {
            AxisForm::Extent => {
                let (near, far) = (get(axis.position), get(axis.far));
                match (near, far) {
                    (Some(near), Some(far)) => Self {
                        center: Some(format!("(({}) + ({})) / 2", near, far)),
                        size: Some(format!("({}) - ({})", near, far)),
                    },
                    _ => Self::default(),
                }
            }
            AxisForm::Sized => Self {
                center: get(axis.position),
                size: get(axis.size),
            },
            AxisForm::Center => Self {
                center: get(axis.center),
                size: get(axis.size),
            },
            AxisForm::Point => Self {
                center: get(axis.position),
                size: None,
            },
            AxisForm::Absent => Self {
                center: None,
                size: get(axis.size),
            },
        }
    }
}

/// A quarter turn about a fixed pivot
#[derive(Debug, Clone)]
pub struct Rotation90 {
    pivot_x: String,
    pivot_z: String,
    direction: Direction,
    simplify_expressions: bool,
    elements: AttributeLocator,
    attributes: AttributeLocator,
    single: Vec<(&'static str, AttributeLocator)>,
}

impl Rotation90 {
    /// Pivot coordinates must be plain numbers; empty means 0
    pub fn new(
        pivot_x: &str,
        pivot_z: &str,
        direction: Direction,
        simplify_expressions: bool,
    ) -> Result<Self, TransformError> {
        let pivot = |value: &str| -> Result<String, TransformError> {
            let value = if value.trim().is_empty() { "0" } else { value };
            if !is_numeric(value) {
                return Err(TransformError::not_numeric(NumericValue::CenterOfRotation, value));
            }
            Ok(value.trim().to_string())
        };
        let pivot_x = pivot(pivot_x)?;
        let pivot_z = pivot(pivot_z)?;

        let elements = AttributeLocator::scoped(&PLACED_ACTOR_ATTRIBUTES, &ScopeFilter::any_actor())?;
        let attributes = AttributeLocator::general(&PLACED_ACTOR_ATTRIBUTES)?;
        let single = PLACED_ACTOR_ATTRIBUTES
            .iter()
            .map(|&attr| Ok((attr, AttributeLocator::general(&[attr])?)))
            .collect::<Result<Vec<_>, regex::Error>>()?;

        debug!(%pivot_x, %pivot_z, ?direction, simplify_expressions, "rotation configured");

        Ok(Self {
            pivot_x,
            pivot_z,
            direction,
            simplify_expressions,
            elements,
            attributes,
            single,
        })
    }

    /// Rotate every placed actor in `text`
    pub fn apply(&self, text: &str) -> Result<String, TransformError> {
        let span = tracing::debug_span!("rotate", direction = ?self.direction);
        let _enter = span.enter();

        let text = self
            .elements
            .rewrite_tag_matches(text, |element| self.rotate_element(element, false))?;
        self.elements
            .rewrite_macro_matches(&text, |element| self.rotate_element(element, true))
    }

    fn rotate_element(&self, element: &str, macro_form: bool) -> Result<String, TransformError> {
        let mut bag = AttributeBag::default();
        if macro_form {
            for param in self.attributes.macro_parameters(element) {
                let occ = param.occurrence();
                bag.set(occ.attr, occ.expr);
            }
        } else {
            for occ in self.attributes.tag_occurrences(element) {
                bag.set(occ.attr, occ.expr);
            }
        }
        trace!(element = element_name(element), ?bag, "gathered attributes");

        let rotated = self.rotate_bag(&bag, element_name(element))?;

        let mut out = element.to_string();
        for (attr, value) in rotated.iter() {
            if bag.get(attr) == Some(value) {
                continue;
            }
            let locator = self.locator_for(attr)?;
            out = if macro_form {
                locator.replace_macros(&out, |_| Ok::<_, TransformError>(value.to_string()))?
            } else {
                locator.replace_tags(&out, |_| Ok::<_, TransformError>(value.to_string()))?
            };
        }
        Ok(out)
    }

    fn locator_for(&self, attr: &str) -> Result<&AttributeLocator, TransformError> {
        self.single
            .iter()
            .find(|(name, _)| *name == attr)
            .map(|(_, locator)| locator)
            .ok_or_else(|| {
                TransformError::InvalidConfiguration(format!("no locator for attribute '{}'", attr))
            })
    }

    /// Rotate the attributes of one element, returning the new values
    pub fn rotate_bag(&self, bag: &AttributeBag, element: &str) -> Result<AttributeBag, TransformError> {
        let angle = bag
            .get("angle")
            .map(|value| {
                parse_numeric(value)
                    .ok_or_else(|| TransformError::not_numeric(NumericValue::Angle, value))
            })
            .transpose()?;

        let x_form = AxisForm::detect(bag, &X_AXIS);
        let z_form = AxisForm::detect(bag, &Z_AXIS);
        match (x_form.has_position(), z_form.has_position()) {
            (true, false) => return Err(TransformError::missing_position(element, Z_AXIS.label)),
            (false, true) => return Err(TransformError::missing_position(element, X_AXIS.label)),
            _ => {}
        }

        let x = StandardAxis::from_bag(bag, &X_AXIS, x_form);
        let z = StandardAxis::from_bag(bag, &Z_AXIS, z_form);

        // Sizes trade places; centers move around the pivot
        let (x_center, z_center) = match (&x.center, &z.center) {
            (Some(xc), Some(zc)) => {
                let (x_new, z_new) =
                    self.direction
                        .rotate_centers(xc, zc, &self.pivot_x, &self.pivot_z);
                (Some(x_new), Some(z_new))
            }
            _ => (None, None),
        };
        let rotated_x = StandardAxis {
            center: x_center,
            size: z.size.clone().or_else(|| x.size.clone()),
        };
        let rotated_z = StandardAxis {
            center: z_center,
            size: x.size.clone().or_else(|| z.size.clone()),
        };

        let mut encoder = ExpressionEncoder::new();
        let mut out = bag.clone();
        self.write_axis(&mut out, &X_AXIS, x_form, &rotated_x, &mut encoder)?;
        self.write_axis(&mut out, &Z_AXIS, z_form, &rotated_z, &mut encoder)?;

        if let Some(angle) = angle {
            let turned = (angle + self.direction.angle_step()).rem_euclid(360.0);
            out.set("angle", format_number(turned));
        }
        Ok(out)
    }

    fn write_axis(
        &self,
        out: &mut AttributeBag,
        axis: &Axis,
        form: AxisForm,
        rotated: &StandardAxis,
        encoder: &mut ExpressionEncoder,
    ) -> Result<(), TransformError> {
        let center = rotated.center.as_deref();
        let size = rotated.size.as_deref();
        match (form, center) {
            (AxisForm::Extent, Some(center)) => {
                if let Some(size) = size {
                    let near = format!("{} + ({}) / 2", center, size);
                    let far = format!("{} - ({}) / 2", center, size);
                    out.set(axis.position, self.finish(&near, encoder)?);
                    out.set(axis.far, self.finish(&far, encoder)?);
                }
            }
            (AxisForm::Sized, Some(center)) => {
                out.set(axis.position, self.finish(center, encoder)?);
                if let Some(size) = size {
                    out.set(axis.size, self.finish_size(size, encoder)?);
                }
            }
            (AxisForm::Center, Some(center)) => {
                out.set(axis.center, self.finish(center, encoder)?);
                if out.get(axis.size).is_some() {
                    if let Some(size) = size {
                        out.set(axis.size, self.finish_size(size, encoder)?);
                    }
                }
            }
            (AxisForm::Point, Some(center)) => {
                out.set(axis.position, self.finish(center, encoder)?);
            }
            (AxisForm::Absent, _) => {
                if out.get(axis.size).is_some() {
                    if let Some(size) = size {
                        out.set(axis.size, self.finish_size(size, encoder)?);
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Simplify a derived value unless it is already a number
    fn finish(&self, value: &str, encoder: &mut ExpressionEncoder) -> Result<String, TransformError> {
        if !self.simplify_expressions || is_numeric(value) {
            return Ok(value.to_string());
        }
        let simplified = expr::simplify(&encoder.encode(value))
            .map_err(|err| TransformError::simplify(value, err))?;
        encoder.decode(&simplified)
    }

    /// Sizes are written as magnitudes when they come out numeric
    fn finish_size(
        &self,
        value: &str,
        encoder: &mut ExpressionEncoder,
    ) -> Result<String, TransformError> {
        let size = self.finish(value, encoder)?;
        Ok(match parse_numeric(&size) {
            Some(n) => format_number(n.abs()),
            None => size,
        })
    }
}

/// Name of the element that opens `element`
fn element_name(element: &str) -> &str {
    let rest = element.trim_start_matches(['<', '{']).trim_start();
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    &rest[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bag(pairs: &[(&str, &str)]) -> AttributeBag {
        let mut bag = AttributeBag::default();
        for (k, v) in pairs {
            bag.set(k, *v);
        }
        bag
    }

    fn clockwise() -> Rotation90 {
        Rotation90::new("0", "0", Direction::Clockwise, true).unwrap()
    }

    #[test]
    fn test_pivot_must_be_numeric() {
        let err = Rotation90::new("a", "0", Direction::Clockwise, true).unwrap_err();
        assert!(matches!(
            err,
            TransformError::NotNumeric { what: NumericValue::CenterOfRotation, .. }
        ));
        assert!(Rotation90::new("", " 2 ", Direction::Clockwise, true).is_ok());
    }

    #[test]
    fn test_detect_axis_forms() {
        let b = bag(&[("x", "0"), ("xx", "2"), ("z", "1"), ("d", "3"), ("cx", "9")]);
        assert_eq!(AxisForm::detect(&b, &X_AXIS), AxisForm::Extent);
        assert_eq!(AxisForm::detect(&b, &Z_AXIS), AxisForm::Sized);
        let b = bag(&[("cx", "0"), ("z", "5")]);
        assert_eq!(AxisForm::detect(&b, &X_AXIS), AxisForm::Center);
        assert_eq!(AxisForm::detect(&b, &Z_AXIS), AxisForm::Point);
        assert_eq!(AxisForm::detect(&bag(&[("w", "1")]), &X_AXIS), AxisForm::Absent);
    }

    #[test]
    fn test_rotate_sized_clockwise() {
        let b = bag(&[("x", "1"), ("z", "2"), ("w", "4"), ("d", "6"), ("angle", "0")]);
        let out = clockwise().rotate_bag(&b, "Wall").unwrap();
        assert_eq!(out.get("x"), Some("-2"));
        assert_eq!(out.get("z"), Some("1"));
        assert_eq!(out.get("w"), Some("6"));
        assert_eq!(out.get("d"), Some("4"));
        assert_eq!(out.get("angle"), Some("90"));
    }

    #[test]
    fn test_rotate_extent_keeps_orientation() {
        let b = bag(&[("x", "0"), ("xx", "4"), ("z", "0"), ("zz", "2")]);
        let out = clockwise().rotate_bag(&b, "Solid").unwrap();
        // center (2, 1) moves to (-1, 2); width and depth swap
        assert_eq!(out.get("x"), Some("-2"));
        assert_eq!(out.get("xx"), Some("0"));
        assert_eq!(out.get("z"), Some("0"));
        assert_eq!(out.get("zz"), Some("4"));
    }

    #[test]
    fn test_round_trip_restores_every_form() {
        let cw = clockwise();
        let ccw = Rotation90::new("0", "0", Direction::Counterclockwise, true).unwrap();
        let cases = [
            bag(&[("x", "0"), ("xx", "4"), ("z", "1"), ("zz", "3")]),
            bag(&[("x", "a"), ("w", "2"), ("z", "b"), ("d", "5"), ("angle", "270")]),
            bag(&[("cx", "base + 1"), ("cz", "3"), ("w", "2"), ("d", "8")]),
            bag(&[("x", "7"), ("z", "-2")]),
        ];
        for case in cases {
            let there = cw.rotate_bag(&case, "Foo").unwrap();
            let back = ccw.rotate_bag(&there, "Foo").unwrap();
            assert_eq!(back, case);
        }
    }

    #[test]
    fn test_angle_wraps() {
        let b = bag(&[("cx", "0"), ("cz", "0"), ("angle", "315")]);
        let out = clockwise().rotate_bag(&b, "Ramp").unwrap();
        assert_eq!(out.get("angle"), Some("45"));
    }

    #[test]
    fn test_non_numeric_angle() {
        let b = bag(&[("x", "0"), ("z", "0"), ("angle", "a")]);
        let err = clockwise().rotate_bag(&b, "Ramp").unwrap_err();
        assert!(matches!(
            err,
            TransformError::NotNumeric { what: NumericValue::Angle, .. }
        ));
    }

    #[test]
    fn test_position_on_one_axis_only() {
        let b = bag(&[("x", "0"), ("w", "1")]);
        let err = clockwise().rotate_bag(&b, "Wall").unwrap_err();
        assert!(matches!(err, TransformError::MissingPosition { axis: 'z', .. }));
        assert!(err.to_string().contains("Wall"));
    }

    #[test]
    fn test_element_name() {
        assert_eq!(element_name("<Wall x=\"1\" />"), "Wall");
        assert_eq!(element_name("{{ Ramp(x=1) }}"), "Ramp");
    }
}
