//! Operations combining an attribute's current value with a transform value

use crate::expr::{format_number, is_numeric, parse_numeric};

use super::error::{NumericValue, TransformError};

/// `current + (transform)`
pub fn addition(current: &str, transform: &str) -> Result<String, TransformError> {
    if transform.trim().is_empty() {
        return Err(TransformError::MissingArgument);
    }
    Ok(format!("{} + ({})", current, transform))
}

/// Reflect a coordinate about `pivot`, which defaults to 0
pub fn coordinate_mirror(current: &str, pivot: &str) -> Result<String, TransformError> {
    let pivot = if pivot.trim().is_empty() { "0" } else { pivot };
    if !is_numeric(pivot) {
        return Err(TransformError::not_numeric(NumericValue::Coordinate, pivot));
    }
    Ok(format!("2 * ({}) - ({})", pivot, current))
}

fn numeric_angle(current: &str) -> Result<f64, TransformError> {
    parse_numeric(current).ok_or_else(|| TransformError::not_numeric(NumericValue::Angle, current))
}

/// Angle correction for a mirror across the Z axis
pub fn angle_mirror_z(current: &str, _: &str) -> Result<String, TransformError> {
    let angle = numeric_angle(current)?;
    let mirrored = if angle == 0.0 { angle } else { 360.0 - angle };
    Ok(format_number(mirrored))
}

/// Angle correction for a mirror across the X axis
pub fn angle_mirror_x(current: &str, _: &str) -> Result<String, TransformError> {
    let angle = numeric_angle(current)?;
    let mirrored = if angle <= 180.0 {
        180.0 - angle
    } else {
        540.0 - angle
    };
    Ok(format_number(mirrored))
}

/// Vertical mirror for ramps: the slope faces the opposite way
pub fn angle_mirror_y_ramp(current: &str, _: &str) -> Result<String, TransformError> {
    let angle = numeric_angle(current)?;
    let flipped = match angle {
        a if a == 0.0 => "180",
        a if a == 90.0 => "270",
        a if a == 180.0 => "0",
        a if a == 270.0 => "90",
        _ => return Ok(current.to_string()),
    };
    Ok(flipped.to_string())
}

pub fn set(_: &str, value: &str) -> Result<String, TransformError> {
    Ok(value.to_string())
}

pub fn identity(current: &str, _: &str) -> Result<String, TransformError> {
    Ok(current.to_string())
}
