use std::collections::BTreeMap;

use tracing::warn;

use crate::parser::error::IssueKind;

/// Document metadata from the front matter block.
pub type Meta = BTreeMap<String, String>;

/// A split document: metadata, byte offset where the body starts, and the
/// reason the front matter could not be read, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontMatter {
    pub meta: Meta,
    pub body_start: usize,
    pub error: Option<IssueKind>,
}

/// Split an optional TOML front matter block delimited by `---` lines off
/// the start of `source`.
///
/// The opening `---` must be followed directly by a non-blank line;
/// otherwise it is a thematic break. String values are kept verbatim,
/// arrays are joined with a single space, and any other value uses its
/// TOML representation. Malformed TOML leaves the whole text in the body.
pub fn split(source: &str) -> FrontMatter {
    let none = FrontMatter {
        meta: Meta::new(),
        body_start: 0,
        error: None,
    };

    let Some(first) = source.split_inclusive('\n').next() else {
        return none;
    };
    if first.trim_end() != "---" {
        return none;
    }
    let opens_block = source[first.len()..]
        .split_inclusive('\n')
        .next()
        .is_some_and(|line| !line.trim().is_empty());
    if !opens_block {
        return none;
    }

    let mut offset = first.len();
    let mut close = None;
    for line in source[offset..].split_inclusive('\n') {
        if line.trim_end() == "---" {
            close = Some((offset, offset + line.len()));
            break;
        }
        offset += line.len();
    }
    let Some((toml_end, body_start)) = close else {
        return none;
    };

    let toml_str = &source[first.len()..toml_end];
    match toml::from_str::<toml::Table>(toml_str) {
        Ok(table) => FrontMatter {
            meta: table
                .into_iter()
                .map(|(key, value)| (key, flatten(value)))
                .collect(),
            body_start,
            error: None,
        },
        Err(e) => {
            let reason = e.message().to_string();
            warn!(%reason, "malformed front matter, keeping it as text");
            FrontMatter {
                error: Some(IssueKind::MalformedFrontMatter { reason }),
                ..none
            }
        }
    }
}

fn flatten(value: toml::Value) -> String {
    match value {
        toml::Value::String(s) => s,
        toml::Value::Array(items) => items
            .into_iter()
            .map(flatten)
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_string(),
    }
}
