//! Attribute locator
//!
//! Finds attribute values in level text without parsing the document. The
//! dialect mixes XML tags with template macro calls, so two pattern kinds are
//! matched independently:
//!
//! - **Tag attributes**: `<Wall x="0" z="{{ base + 2 }}" />`
//! - **Macro parameters**: `{{ Wall(x=0, z=base + 2) }}`
//!
//! ## Example
//!
//! ```
//! use alf_edit::locate::AttributeLocator;
//!
//! let locator = AttributeLocator::general(&["x"]).unwrap();
//! let text = r#"<Wall x="{{ 10 }}" />"#;
//! let values: Vec<_> = locator.tag_occurrences(text).map(|o| o.expr).collect();
//! assert_eq!(values, vec!["10"]);
//! ```

pub mod patterns;

use std::ops::Range;

use regex::{Captures, Regex};

pub use patterns::ANY_ACTOR;

/// One attribute value found in the text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence<'t> {
    /// Byte range of the whole match
    pub range: Range<usize>,
    /// Everything before the value, including the attribute name
    pub prefix: &'t str,
    pub attr: &'t str,
    pub expr: &'t str,
    /// Everything after the value up to the end of the match
    pub suffix: &'t str,
}

impl<'t> Occurrence<'t> {
    fn from_captures(caps: &Captures<'t>, group: &str) -> Option<Self> {
        let name = |part: &str| format!("{}{}", group, part);
        let whole = caps.get(0)?;
        let prefix = caps.name(&name("prefix"))?;
        let attr = caps.name(&name("attr"))?;
        let expr = caps.name(&name("expr"))?;
        let suffix = caps
            .name(&name("suffix"))
            .map(|m| m.as_str())
            .unwrap_or("");
        Some(Self {
            range: whole.range(),
            prefix: prefix.as_str(),
            attr: attr.as_str(),
            expr: expr.as_str(),
            suffix,
        })
    }
}

/// A macro parameter, distinguished by where it sits in the call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MacroParameter<'t> {
    /// Last parameter; the suffix closes the call
    Terminal(Occurrence<'t>),
    /// Followed by more parameters; the suffix is empty
    Continuation(Occurrence<'t>),
}

impl<'t> MacroParameter<'t> {
    pub fn occurrence(&self) -> &Occurrence<'t> {
        match self {
            MacroParameter::Terminal(occ) | MacroParameter::Continuation(occ) => occ,
        }
    }

    pub fn into_occurrence(self) -> Occurrence<'t> {
        match self {
            MacroParameter::Terminal(occ) | MacroParameter::Continuation(occ) => occ,
        }
    }
}

/// Element names an attribute must belong to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeFilter {
    tag: String,
    macro_name: String,
}

impl ScopeFilter {
    /// Raw regex sources for the tag and macro names
    pub fn new(tag: impl Into<String>, macro_name: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            macro_name: macro_name.into(),
        }
    }

    /// Exactly the element called `name`, in both syntaxes
    pub fn named(name: &str) -> Self {
        let escaped = regex::escape(name);
        Self::new(escaped.clone(), escaped)
    }

    /// Any element with an identifier name
    pub fn any_actor() -> Self {
        Self::new(ANY_ACTOR, ANY_ACTOR)
    }

    pub fn tag_pattern(&self) -> &str {
        &self.tag
    }

    pub fn macro_pattern(&self) -> &str {
        &self.macro_name
    }
}

/// Compiled tag and macro patterns for a set of attribute names
#[derive(Debug, Clone)]
pub struct AttributeLocator {
    tag: Regex,
    macro_call: Regex,
    scoped: bool,
}

impl AttributeLocator {
    /// Locate `attrs` anywhere in the text
    pub fn general(attrs: &[&str]) -> Result<Self, regex::Error> {
        Ok(Self {
            tag: Regex::new(&patterns::general_tag(attrs))?,
            macro_call: Regex::new(&patterns::general_macro(attrs))?,
            scoped: false,
        })
    }

    /// Locate `attrs` only inside elements matching `scope`.
    ///
    /// A scoped match spans the whole element from its opening `<` or `{{`, so
    /// each element yields at most one occurrence.
    pub fn scoped(attrs: &[&str], scope: &ScopeFilter) -> Result<Self, regex::Error> {
        Ok(Self {
            tag: Regex::new(&patterns::scoped_tag(attrs, scope.tag_pattern()))?,
            macro_call: Regex::new(&patterns::scoped_macro(attrs, scope.macro_pattern()))?,
            scoped: true,
        })
    }

    pub fn is_scoped(&self) -> bool {
        self.scoped
    }

    /// Tag-form attribute values, left to right
    pub fn tag_occurrences<'a, 't>(
        &'a self,
        text: &'t str,
    ) -> impl Iterator<Item = Occurrence<'t>> + 'a
    where
        't: 'a,
    {
        self.tag
            .captures_iter(text)
            .filter_map(|caps| Occurrence::from_captures(&caps, ""))
    }

    /// Macro-form parameter values, left to right
    pub fn macro_parameters<'a, 't>(
        &'a self,
        text: &'t str,
    ) -> impl Iterator<Item = MacroParameter<'t>> + 'a
    where
        't: 'a,
    {
        let scoped = self.scoped;
        self.macro_call.captures_iter(text).filter_map(move |caps| {
            if scoped {
                // Scoped suffixes always run to the closing braces
                return Occurrence::from_captures(&caps, "").map(MacroParameter::Terminal);
            }
            if caps.name("t_expr").is_some() {
                Occurrence::from_captures(&caps, "t_").map(MacroParameter::Terminal)
            } else {
                Occurrence::from_captures(&caps, "c_").map(MacroParameter::Continuation)
            }
        })
    }

    /// Rewrite every tag-form value through `f`, which returns the new value
    pub fn replace_tags<E>(
        &self,
        text: &str,
        mut f: impl FnMut(&Occurrence<'_>) -> Result<String, E>,
    ) -> Result<String, E> {
        splice(text, self.tag_occurrences(text), |occ| {
            Ok(format!("{}{}{}", occ.prefix, f(occ)?, occ.suffix))
        })
    }

    /// Rewrite every macro-form value through `f`, which returns the new value
    pub fn replace_macros<E>(
        &self,
        text: &str,
        mut f: impl FnMut(&Occurrence<'_>) -> Result<String, E>,
    ) -> Result<String, E> {
        let occurrences = self
            .macro_parameters(text)
            .map(MacroParameter::into_occurrence);
        splice(text, occurrences, |occ| {
            Ok(format!("{}{}{}", occ.prefix, f(occ)?, occ.suffix))
        })
    }

    /// Rewrite the whole matched text of every tag-form occurrence
    pub fn rewrite_tag_matches<E>(
        &self,
        text: &str,
        mut f: impl FnMut(&str) -> Result<String, E>,
    ) -> Result<String, E> {
        splice(text, self.tag_occurrences(text), |occ| {
            f(&text[occ.range.clone()])
        })
    }

    /// Rewrite the whole matched text of every macro-form occurrence
    pub fn rewrite_macro_matches<E>(
        &self,
        text: &str,
        mut f: impl FnMut(&str) -> Result<String, E>,
    ) -> Result<String, E> {
        let occurrences = self
            .macro_parameters(text)
            .map(MacroParameter::into_occurrence);
        splice(text, occurrences, |occ| f(&text[occ.range.clone()]))
    }
}

/// Patterns for the element carrying one etag
#[derive(Debug, Clone)]
pub struct EtagLocator {
    tag: Regex,
    macro_call: Regex,
}

impl EtagLocator {
    pub fn new(etag: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            tag: Regex::new(&patterns::etag_tag(etag))?,
            macro_call: Regex::new(&patterns::etag_macro(etag))?,
        })
    }

    /// Byte range of the first tag-form element with the etag
    pub fn find_tag(&self, text: &str) -> Option<Range<usize>> {
        self.tag.find(text).map(|m| m.range())
    }

    /// Byte range of the first macro-form element with the etag
    pub fn find_macro(&self, text: &str) -> Option<Range<usize>> {
        self.macro_call.find(text).map(|m| m.range())
    }
}

/// Rebuild `text`, replacing each occurrence's range with the output of `f`
fn splice<'t, E>(
    text: &'t str,
    occurrences: impl Iterator<Item = Occurrence<'t>>,
    mut f: impl FnMut(&Occurrence<'t>) -> Result<String, E>,
) -> Result<String, E> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for occ in occurrences {
        out.push_str(&text[last..occ.range.start]);
        out.push_str(&f(&occ)?);
        last = occ.range.end;
    }
    out.push_str(&text[last..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mark_tags(locator: &AttributeLocator, text: &str) -> String {
        splice(text, locator.tag_occurrences(text), |o| {
            Ok::<_, ()>(format!("@{}@{}@{}@", o.prefix, o.expr, o.suffix))
        })
        .unwrap()
    }

    #[test]
    fn test_occurrence_parts_rebuild_the_match() {
        let locator = AttributeLocator::general(&["x", "xx"]).unwrap();
        let text = r#"<Wall x = ' a + b '  xx="{{3}}"/>"#;
        for occ in locator.tag_occurrences(text) {
            let rebuilt = format!("{}{}{}", occ.prefix, occ.expr, occ.suffix);
            assert_eq!(rebuilt, &text[occ.range.clone()]);
        }
        assert_eq!(locator.tag_occurrences(text).count(), 2);
    }

    #[test]
    fn test_general_tag_plain_and_interpolated() {
        let locator = AttributeLocator::general(&["j", "jj"]).unwrap();
        let text = r#"<Foo j="0" jj="{{ a + 2 }}" jjj="5" />"#;
        assert_eq!(
            mark_tags(&locator, text),
            r#"<Foo@ j="@0@"@@ jj="{{ @a + 2@ }}"@ jjj="5" />"#
        );
    }

    #[test]
    fn test_empty_value_is_not_matched() {
        let locator = AttributeLocator::general(&["x"]).unwrap();
        assert_eq!(locator.tag_occurrences(r#"<Foo x="  " />"#).count(), 0);
    }

    #[test]
    fn test_macro_terminal_and_continuation() {
        let locator = AttributeLocator::general(&["x", "z"]).unwrap();
        let text = "{{ Foo(x=1, y=2, z=a + 3) }}";
        let params: Vec<_> = locator.macro_parameters(text).collect();
        assert_eq!(params.len(), 2);
        match &params[0] {
            MacroParameter::Continuation(occ) => {
                assert_eq!(occ.expr, "1");
                assert_eq!(occ.suffix, "");
            }
            other => panic!("expected continuation, got {:?}", other),
        }
        match &params[1] {
            MacroParameter::Terminal(occ) => {
                assert_eq!(occ.attr, "z");
                assert_eq!(occ.expr, "a + 3");
                assert_eq!(occ.suffix, ") }");
            }
            other => panic!("expected terminal, got {:?}", other),
        }
    }

    #[test]
    fn test_scoped_tag_only_inside_named_element() {
        let locator = AttributeLocator::scoped(&["foo"], &ScopeFilter::named("Ramp")).unwrap();
        let text = r#"<Wall foo="1" /><Ramp
    bar="2"
    foo="3"
/>"#;
        let values: Vec<_> = locator.tag_occurrences(text).map(|o| o.expr).collect();
        assert_eq!(values, vec!["3"]);
        let occ = locator.tag_occurrences(text).next().unwrap();
        assert!(occ.prefix.starts_with("<Ramp"));
        assert!(occ.suffix.ends_with("/>"));
    }

    #[test]
    fn test_scoped_macro() {
        let locator = AttributeLocator::scoped(&["foo"], &ScopeFilter::named("Ramp")).unwrap();
        let text = "{{ Wall(foo=1) }} {{ Ramp(x=0, foo=2, z=1) }}";
        let params: Vec<_> = locator.macro_parameters(text).collect();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].occurrence().expr, "2");
        assert_eq!(params[0].occurrence().suffix, ", z=1) }}");
    }

    #[test]
    fn test_replace_is_all_or_nothing() {
        let locator = AttributeLocator::general(&["x"]).unwrap();
        let text = r#"<A x="1" /><B x="2" />"#;
        let mut seen = 0;
        let result = locator.replace_tags(text, |occ| {
            seen += 1;
            if occ.expr == "2" {
                Err("bad value")
            } else {
                Ok("9".to_string())
            }
        });
        assert_eq!(result, Err("bad value"));
        assert_eq!(seen, 2);
    }

    #[test]
    fn test_replace_macros_keeps_formatting() {
        let locator = AttributeLocator::general(&["x"]).unwrap();
        let text = "{{ Foo(x = 1,x=2) }}";
        let out = locator
            .replace_macros(text, |occ| Ok::<_, ()>(format!("<{}>", occ.expr)))
            .unwrap();
        assert_eq!(out, "{{ Foo(x = <1>,x=<2>) }}");
    }

    #[test]
    fn test_etag_locator_finds_first_element() {
        let locator = EtagLocator::new("abc1234").unwrap();
        let text = r#"<Wall etag="zzz" x="0" /><Ramp x="1" etag="abc1234" angle="0" /><Ramp etag="abc1234" />"#;
        let range = locator.find_tag(text).unwrap();
        assert_eq!(&text[range], r#"<Ramp x="1" etag="abc1234" angle="0" />"#);
        assert!(locator.find_macro(text).is_none());

        let text = "{{ Wall(x=0, etag='abc1234', z=1) }}";
        assert_eq!(locator.find_macro(text), Some(0..text.len()));
    }
}
