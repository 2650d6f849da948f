// src/core/interpolator.rs

use crate::models::{Escaping, Scalar};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::BTreeMap;

lazy_static! {
    // Triple braces first so `{{{name}}}` is never read as `{` + `{{name}}` + `}`.
    static ref PLACEHOLDER_RE: Regex =
        Regex::new(r"\{\{\{\s*([^{}]*?)\s*\}\}\}|\{\{\s*(&)?\s*([^{}]*?)\s*\}\}")
            .expect("placeholder pattern is valid");
}

/// Renders a command template against a flat parameter mapping.
///
/// Supported placeholders:
/// - `{{{name}}}` and `{{& name}}` are always substituted verbatim.
/// - `{{name}}` is substituted according to `escaping`.
/// - `{{! comment}}` renders nothing.
///
/// A placeholder whose name is not in `parameters` renders as the empty string.
pub fn render(template: &str, parameters: &BTreeMap<String, Scalar>, escaping: Escaping) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures<'_>| {
            if let Some(name) = caps.get(1) {
                return lookup(name.as_str(), parameters);
            }
            let raw = caps.get(2).is_some();
            let name = caps.get(3).map_or("", |m| m.as_str());
            if name.starts_with('!') {
                return String::new();
            }
            let value = lookup(name, parameters);
            match escaping {
                Escaping::Html if !raw => escape_html(&value),
                _ => value,
            }
        })
        .into_owned()
}

fn lookup(name: &str, parameters: &BTreeMap<String, Scalar>) -> String {
    match parameters.get(name) {
        Some(value) => value.to_string(),
        None => {
            log::trace!("Placeholder '{}' has no value; rendering it empty.", name);
            String::new()
        }
    }
}

/// Escapes the same character set as mustache.js.
fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            '/' => escaped.push_str("&#x2F;"),
            '`' => escaped.push_str("&#x60;"),
            '=' => escaped.push_str("&#x3D;"),
            other => escaped.push(other),
        }
    }
    escaped
}
