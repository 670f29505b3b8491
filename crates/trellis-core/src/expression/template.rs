//! `{{this.<path>}}` substitution
//!
//! Placeholders are replaced by source text, so the result can be handed to
//! the call-expression parser: strings become single-quoted literals and every
//! other value is inlined as JSON.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde_json::Value;
use tracing::warn;

lazy_static! {
    static ref THIS_TEMPLATE_REGEX: Regex = Regex::new(r"\{\{this\.([^}]+)\}\}").unwrap();
}

/// Token inlined when a placeholder path does not resolve
pub const UNDEFINED_TOKEN: &str = "undefined";

/// Walk a dotted path through objects and arrays
///
/// Array segments are numeric indices: `rows.0.name`.
pub fn lookup_path<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(data, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Quote a string as a single-quoted literal
pub fn quote_string(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if c == '\\' || c == '\'' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

/// Render a value as expression source text
pub fn to_source_literal(value: &Value) -> String {
    match value {
        Value::String(s) => quote_string(s),
        other => other.to_string(),
    }
}

/// Replace every `{{this.<path>}}` in `source` with the value found in `data`
pub fn resolve_templates(source: &str, data: &Value) -> String {
    THIS_TEMPLATE_REGEX
        .replace_all(source, |caps: &Captures| {
            let path = &caps[1];
            match lookup_path(data, path) {
                Some(value) => to_source_literal(value),
                None => {
                    warn!("Template path 'this.{}' did not resolve; inlining {}", path, UNDEFINED_TOKEN);
                    UNDEFINED_TOKEN.to_string()
                }
            }
        })
        .into_owned()
}

/// Replace every placeholder with `undefined`, without data
///
/// Used to check that an expression parses before any event data exists.
pub fn blank_templates(source: &str) -> String {
    THIS_TEMPLATE_REGEX.replace_all(source, UNDEFINED_TOKEN).into_owned()
}
