//! Set one attribute on the element carrying a given etag

use tracing::debug;

use crate::expr::{self, is_numeric, ExpressionEncoder};
use crate::locate::{AttributeLocator, EtagLocator};

use super::error::TransformError;

/// Replace `param` with `value` on the first tag-form and the first
/// macro-form element tagged `etag`.
///
/// The value is simplified once up front. Values the simplifier cannot read
/// (strings, colors mixed with text) are written as given.
pub fn apply_param_to_etag(
    text: &str,
    param: &str,
    value: &str,
    etag: &str,
) -> Result<String, TransformError> {
    let elements = EtagLocator::new(etag)?;
    let params = AttributeLocator::general(&[param])?;
    let value = simplify_value(value)?;

    let mut did_match = false;
    let mut did_update = false;
    let mut out = text.to_string();

    if let Some(range) = elements.find_tag(&out) {
        did_match = true;
        let rewritten = params.replace_tags(&out[range.clone()], |_| {
            did_update = true;
            Ok::<_, TransformError>(value.clone())
        })?;
        out.replace_range(range, &rewritten);
    }

    if let Some(range) = elements.find_macro(&out) {
        did_match = true;
        let rewritten = params.replace_macros(&out[range.clone()], |_| {
            did_update = true;
            Ok::<_, TransformError>(value.clone())
        })?;
        out.replace_range(range, &rewritten);
    }

    debug!(etag, param, did_match, did_update, "etag patch");

    if !did_match {
        return Err(TransformError::EtagNotFound {
            etag: etag.to_string(),
        });
    }
    if !did_update {
        return Err(TransformError::ParamNotOnEtag {
            param: param.to_string(),
            etag: etag.to_string(),
        });
    }
    Ok(out)
}

fn simplify_value(value: &str) -> Result<String, TransformError> {
    if is_numeric(value) {
        return Ok(value.to_string());
    }
    let mut encoder = ExpressionEncoder::new();
    match expr::simplify(&encoder.encode(value)) {
        Ok(simplified) => encoder.decode(&simplified),
        Err(err) => {
            debug!(value, error = %err, "writing unsimplified value");
            Ok(value.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const LEVEL: &str = r#"<Wall etag="aaaaaaa" x="0" z="0" />
<Ramp etag="bbbbbbb" x="1" angle="0" />
{{ Ramp(x=2, etag='ccccccc', z=4) }}"#;

    #[test]
    fn test_patch_tag_element() {
        let out = apply_param_to_etag(LEVEL, "x", "1 + 2", "bbbbbbb").unwrap();
        assert_eq!(
            out,
            r#"<Wall etag="aaaaaaa" x="0" z="0" />
<Ramp etag="bbbbbbb" x="3" angle="0" />
{{ Ramp(x=2, etag='ccccccc', z=4) }}"#
        );
    }

    #[test]
    fn test_patch_macro_element() {
        let out = apply_param_to_etag(LEVEL, "z", "h / 2 + h / 2", "ccccccc").unwrap();
        assert!(out.ends_with("{{ Ramp(x=2, etag='ccccccc', z=h) }}"));
    }

    #[test]
    fn test_color_value_written_verbatim() {
        let text = r##"<Solid etag="ddddddd" color="#000000" />"##;
        let out = apply_param_to_etag(text, "color", "#ff8800", "ddddddd").unwrap();
        assert_eq!(out, r##"<Solid etag="ddddddd" color="#ff8800" />"##);
    }

    #[test]
    fn test_unknown_etag() {
        let err = apply_param_to_etag(LEVEL, "x", "1", "zzzzzzz").unwrap_err();
        assert!(matches!(err, TransformError::EtagNotFound { .. }));
        assert!(err.is_user_error());
    }

    #[test]
    fn test_param_missing_on_element() {
        let err = apply_param_to_etag(LEVEL, "angle", "90", "aaaaaaa").unwrap_err();
        assert!(matches!(err, TransformError::ParamNotOnEtag { .. }));
        assert_eq!(
            err.to_string(),
            "Param \"angle\" does not exist on element with etag \"aaaaaaa\"."
        );
    }
}
