//! Regex sources for the two attribute syntaxes of level files.
//!
//! Tag attributes look like `x="0"` or `x="{{ base + 2 }}"`. Macro parameters
//! look like `x=0` inside `{{ Wall(x=0, z=base + 2) }}`. Patterns come in a
//! general flavour (any occurrence anywhere) and a scoped flavour (only inside
//! elements whose name matches a filter).
//!
//! Every attribute pattern exposes the named groups `prefix`, `attr`, `expr` and
//! `suffix`, which concatenate back into the whole match. The general macro
//! pattern has two alternatives and prefixes those groups with `t_` (terminal,
//! last parameter of the call) or `c_` (continuation).

/// Element names accepted by an unrestricted scope
pub const ANY_ACTOR: &str = "[a-zA-Z_][a-zA-Z0-9_]*";

/// Value inside a tag attribute: at least one non-space character, no quotes
/// or braces
const TAG_EXPR: &str = r#"[^"'{}]*?[^"'{}\s]+?[^"'{}]*?"#;

/// Attribute names as an escaped alternation
pub fn alternation(attrs: &[&str]) -> String {
    attrs
        .iter()
        .map(|attr| regex::escape(attr))
        .collect::<Vec<_>>()
        .join("|")
}

pub fn general_tag(attrs: &[&str]) -> String {
    let names = alternation(attrs);
    [
        r#"(?P<prefix>[\s"'](?P<attr>"#,
        &names,
        r#")\s*=\s*["']\s*\{?\{?\s*)(?P<expr>"#,
        TAG_EXPR,
        r#")(?P<suffix>\s*\}?\}?\s*["'])"#,
    ]
    .concat()
}

pub fn general_macro(attrs: &[&str]) -> String {
    let names = alternation(attrs);
    [
        r#"(?P<t_prefix>[\s"',(](?P<t_attr>"#,
        &names,
        r#")\s*=\s*)(?P<t_expr>[^"',{}]+)(?P<t_suffix>\)\s*\})"#,
        r#"|(?P<c_prefix>[\s"',(](?P<c_attr>"#,
        &names,
        r#")\s*=\s*)(?P<c_expr>[^"',{}]+)"#,
    ]
    .concat()
}

/// Tag attribute inside an element named by `tag`; the match runs to the end
/// of the element
pub fn scoped_tag(attrs: &[&str], tag: &str) -> String {
    let names = alternation(attrs);
    [
        r#"(?s)(?P<prefix><"#,
        tag,
        r#"(?:\s+[^>]*?\s+|\s+)(?P<attr>"#,
        &names,
        r#")\s*=\s*["']\s*\{?\{?\s*)(?P<expr>"#,
        TAG_EXPR,
        r#")(?P<suffix>\s*\}?\}?\s*["']\s*.*?/>)"#,
    ]
    .concat()
}

/// Macro parameter inside a call named by `name`; the match runs to the end
/// of the call
pub fn scoped_macro(attrs: &[&str], name: &str) -> String {
    let names = alternation(attrs);
    [
        r#"(?P<prefix>\{\{\s*"#,
        name,
        r#"(?:\s*\(\s*|.+?[,\s])(?P<attr>"#,
        &names,
        r#")\s*=\s*)(?P<expr>[^,}]+)(?P<suffix>\)\s*\}\}|,.*?\}\})"#,
    ]
    .concat()
}

/// A whole tag-form element carrying `etag`
pub fn etag_tag(etag: &str) -> String {
    [
        r#"(?s)<"#,
        ANY_ACTOR,
        r#"(?:\s+[^>]*?\s+|\s+)etag\s*=\s*["']\s*"#,
        &regex::escape(etag),
        r#"\s*["']\s*.*?/>"#,
    ]
    .concat()
}

/// A whole macro-form element carrying `etag`
pub fn etag_macro(etag: &str) -> String {
    [
        r#"\{\{\s*"#,
        ANY_ACTOR,
        r#"(?:\s*\(\s*|.+?[,\s])etag\s*=["']\s*"#,
        &regex::escape(etag),
        r#"\s*["'].*?\}\}"#,
    ]
    .concat()
}
