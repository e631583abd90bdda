use crate::tree::{Node, Tag};

/// A piece of inline text after pattern recognition.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment<'a> {
    Text(&'a str),
    Node(Node),
}

/// Split `text` into plain runs and cross-referencing nodes:
///
/// - `{ref: #key}` → [`Tag::Reference`]
/// - `{#key}` → [`Tag::Label`]
/// - `{bib: key}` → [`Tag::Citation`]
/// - `{bibitem: key}` → [`Tag::BibEntry`]
pub fn scan(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut plain_start = 0;
    let mut search = 0;

    while let Some(offset) = text[search..].find('{') {
        let open = search + offset;
        match match_pattern(&text[open..]) {
            Some((node, len)) => {
                if plain_start < open {
                    segments.push(Segment::Text(&text[plain_start..open]));
                }
                segments.push(Segment::Node(node));
                plain_start = open + len;
                search = plain_start;
            }
            None => search = open + 1,
        }
    }
    if plain_start < text.len() {
        segments.push(Segment::Text(&text[plain_start..]));
    }
    segments
}

/// Try each pattern at the start of `s` (which begins with `{`).
fn match_pattern(s: &str) -> Option<(Node, usize)> {
    let close = s.find('}')?;
    let inner = s[1..close].trim();
    let len = close + 1;

    let (tag, key) = if let Some(rest) = inner.strip_prefix('#') {
        (Tag::Label, rest)
    } else if let Some(rest) = inner.strip_prefix("ref:") {
        (Tag::Reference, rest.trim_start().strip_prefix('#')?)
    } else if let Some(rest) = inner.strip_prefix("bibitem:") {
        (Tag::BibEntry, rest.trim_start())
    } else if let Some(rest) = inner.strip_prefix("bib:") {
        (Tag::Citation, rest.trim_start())
    } else {
        return None;
    };

    if key.is_empty() || key.contains(char::is_whitespace) {
        return None;
    }
    Some((Node::new(tag).with_attr("key", key), len))
}
