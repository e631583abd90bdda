//! Abbreviation (macro) pre-expansion.
//!
//! A document may contain one abbreviation region delimited by two marker
//! lines such as `=== Abbreviations ===` (three or more `=` on each side,
//! case-insensitive). Each definition inside has the form
//!
//! ```text
//! \name = { body };
//! \name(x, y=default) = { body with x and y };
//! ```
//!
//! The region is replaced by a blank line and every valid macro is applied,
//! in declaration order, to the rest of the document. Each macro gets exactly
//! one pass; the text is not re-scanned until a fixed point is reached.

pub mod template;

use std::ops::Range;

use tracing::{debug, warn};

use crate::macros::template::MacroBody;
use crate::parser::error::{Issue, IssueKind};

/// One macro parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub default: Option<String>,
}

/// A macro definition from the abbreviation region.
#[derive(Debug, Clone, PartialEq)]
pub struct Macro {
    pub name: String,
    pub params: Vec<Param>,
    pub body: MacroBody,
    /// Invalid macros never expand; their call sites are left untouched.
    pub valid: bool,
}

/// Result of expanding a document.
#[derive(Debug, Clone, PartialEq)]
pub struct Expansion {
    pub text: String,
    pub macros: Vec<Macro>,
    pub issues: Vec<Issue>,
}

/// Expand abbreviations in `source`, returning the expanded text.
pub fn preprocess(source: &str) -> String {
    expand(source, 0).text
}

/// Expand abbreviations, also returning the definitions and any issues.
pub fn expand(source: &str, file_id: usize) -> Expansion {
    let Some(region) = find_region(source) else {
        return Expansion {
            text: source.to_string(),
            macros: Vec::new(),
            issues: Vec::new(),
        };
    };

    let mut issues = Vec::new();
    let mut macros = Vec::new();
    for line in source[region.inner.clone()].lines() {
        let Some(def) = parse_definition(line) else {
            continue;
        };
        if let Some(reason) = def.error {
            warn!(name = %def.mac.name, %reason, "invalid macro, leaving it unexpanded");
            issues.push(Issue::warning(
                IssueKind::InvalidMacro {
                    name: def.mac.name.clone(),
                    reason,
                },
                None,
                file_id,
            ));
        }
        macros.push(def.mac);
    }

    let mut text = String::with_capacity(source.len());
    text.push_str(&source[..region.outer.start]);
    text.push('\n');
    text.push_str(&source[region.outer.end..]);

    for mac in macros.iter().filter(|m| m.valid) {
        text = apply(mac, &text);
    }
    debug!(count = macros.len(), "expanded abbreviations");

    Expansion {
        text,
        macros,
        issues,
    }
}

// ---------------------------------------------------------------------------
// Region
// ---------------------------------------------------------------------------

struct Region {
    /// From the start of the opening marker line to the end of the closing
    /// marker line (including its newline).
    outer: Range<usize>,
    /// The definition lines between the markers.
    inner: Range<usize>,
}

fn find_region(source: &str) -> Option<Region> {
    let mut open: Option<(usize, usize)> = None;
    let mut offset = 0;
    for line in source.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        if !is_marker_line(line) {
            continue;
        }
        match open {
            None => open = Some((start, offset)),
            Some((open_start, open_end)) => {
                return Some(Region {
                    outer: open_start..offset,
                    inner: open_end..start,
                });
            }
        }
    }
    None
}

fn is_marker_line(line: &str) -> bool {
    let line = line.trim();
    let lead = line.len() - line.trim_start_matches('=').len();
    let trail = line.len() - line.trim_end_matches('=').len();
    if lead < 3 || trail < 3 || lead + trail >= line.len() {
        return false;
    }
    line[lead..line.len() - trail]
        .trim()
        .eq_ignore_ascii_case("abbreviations")
}

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

struct Definition {
    mac: Macro,
    error: Option<String>,
}

/// Parse `\name(params) = { body };`. Lines of any other shape are ignored.
fn parse_definition(line: &str) -> Option<Definition> {
    let rest = line.trim().strip_prefix('\\')?;
    let name_len = rest
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(rest.len());
    if name_len == 0 {
        return None;
    }
    let name = &rest[..name_len];
    let rest = rest[name_len..].trim_start();

    let (param_list, rest) = match rest.strip_prefix('(') {
        Some(inner) => {
            let close = inner.find(')')?;
            (Some(&inner[..close]), inner[close + 1..].trim_start())
        }
        None => (None, rest),
    };

    let rest = rest.strip_prefix('=')?.trim();
    let rest = rest.strip_suffix(';')?.trim_end();
    let body = rest.strip_prefix('{')?.strip_suffix('}')?.trim();

    let (params, error) = match param_list {
        Some(list) => parse_params(list),
        None => (Vec::new(), None),
    };
    let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
    let body = MacroBody::compile(body, &names);

    Some(Definition {
        mac: Macro {
            name: name.to_string(),
            params,
            body,
            valid: error.is_none(),
        },
        error,
    })
}

fn parse_params(list: &str) -> (Vec<Param>, Option<String>) {
    let mut params: Vec<Param> = Vec::new();
    let mut error = None;

    if list.trim().is_empty() {
        return (params, None);
    }

    for raw in split_top_level(list) {
        let (name, default) = match raw.split_once('=') {
            Some((name, default)) => (name.trim(), Some(strip_group(default.trim()).to_string())),
            None => (raw.trim(), None),
        };
        if name.is_empty() {
            error.get_or_insert_with(|| "empty parameter name".to_string());
            continue;
        }
        if params.iter().any(|p| p.name == name) {
            error.get_or_insert_with(|| format!("duplicate parameter '{}'", name));
        }
        if default.is_none() && params.iter().any(|p| p.default.is_some()) {
            error.get_or_insert_with(|| {
                format!("required parameter '{}' follows a parameter with a default", name)
            });
        }
        params.push(Param {
            name: name.to_string(),
            default,
        });
    }

    (params, error)
}

/// Split on commas that are not inside a brace group.
fn split_top_level(list: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in list.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                items.push(&list[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(&list[start..]);
    items
}

/// Remove one pair of enclosing braces, if present.
fn strip_group(s: &str) -> &str {
    s.strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .unwrap_or(s)
}

// ---------------------------------------------------------------------------
// Expansion
// ---------------------------------------------------------------------------

/// Apply one macro to `text` in a single left-to-right pass.
fn apply(mac: &Macro, text: &str) -> String {
    let needle = format!("\\{}", mac.name);
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find(&needle) {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + needle.len()..];

        if mac.params.is_empty() {
            if after.starts_with(|c: char| c.is_alphabetic()) {
                out.push_str(&needle);
            } else {
                out.push_str(&mac.body.instantiate(&[]));
            }
            rest = after;
            continue;
        }

        match parse_call(after).and_then(|(args, used)| bind(mac, &args).map(|v| (v, used))) {
            Some((values, used)) => {
                let values: Vec<&str> = values.iter().map(|s| s.as_str()).collect();
                out.push_str(&mac.body.instantiate(&values));
                rest = &after[used..];
            }
            None => {
                out.push_str(&needle);
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Parse `(arg, {group}, ...)` at the start of `s`. Returns the arguments and
/// the number of bytes consumed. An empty unbraced argument is `None`
/// (omitted); `{}` is an explicit empty string.
fn parse_call(s: &str) -> Option<(Vec<Option<String>>, usize)> {
    let bytes = s.as_bytes();
    if bytes.first() != Some(&b'(') {
        return None;
    }
    let mut args = Vec::new();
    let mut i = 1;

    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if args.is_empty() && bytes.get(i) == Some(&b')') {
            return Some((args, i + 1));
        }

        let arg = if bytes.get(i) == Some(&b'{') {
            let start = i + 1;
            let mut depth = 1;
            i += 1;
            while i < bytes.len() && depth > 0 {
                match bytes[i] {
                    b'{' => depth += 1,
                    b'}' => depth -= 1,
                    _ => {}
                }
                i += 1;
            }
            if depth != 0 {
                return None;
            }
            Some(s[start..i - 1].to_string())
        } else {
            let start = i;
            while i < bytes.len() && !matches!(bytes[i], b',' | b'(' | b')' | b'\n') {
                i += 1;
            }
            Some(s[start..i].trim_end().to_string()).filter(|a| !a.is_empty())
        };
        args.push(arg);

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        match bytes.get(i) {
            Some(b',') => i += 1,
            Some(b')') => return Some((args, i + 1)),
            _ => return None,
        }
    }
}

/// Match supplied arguments to parameters, filling in defaults. `None` when
/// too many arguments are given or a required one is missing.
fn bind(mac: &Macro, args: &[Option<String>]) -> Option<Vec<String>> {
    if args.len() > mac.params.len() {
        return None;
    }
    mac.params
        .iter()
        .enumerate()
        .map(|(i, param)| args.get(i).cloned().flatten().or_else(|| param.default.clone()))
        .collect()
}
