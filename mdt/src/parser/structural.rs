use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser as CmarkParser, Tag as CmarkTag, TagEnd};

use crate::parser::inline::{self, Segment};
use crate::tree::{Node, Tag};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse a run of Markdown text and append the resulting nodes to `container`.
pub fn parse_into(source: &str, container: &mut Node) {
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES | Options::ENABLE_MATH;
    let events: Vec<Event<'_>> = CmarkParser::new_ext(source, options).collect();

    let mut i = 0;
    collect_children(&events, &mut i, container, &|_| false);
}

// ---------------------------------------------------------------------------
// Event folding
// ---------------------------------------------------------------------------

/// Append nodes to `parent` until an End event accepted by `is_end`.
///
/// Consecutive text events are buffered so that inline patterns split over
/// several events (pulldown-cmark breaks text at some punctuation) are still
/// recognized.
fn collect_children(
    events: &[Event<'_>],
    i: &mut usize,
    parent: &mut Node,
    is_end: &dyn Fn(&TagEnd) -> bool,
) {
    let mut pending = String::new();

    while *i < events.len() {
        let ev = &events[*i];
        *i += 1;

        match ev {
            Event::Text(s) => pending.push_str(s),
            Event::SoftBreak => pending.push('\n'),
            Event::End(tag_end) => {
                if is_end(tag_end) {
                    break;
                }
            }
            Event::Start(tag) => {
                flush_text(parent, &mut pending);
                start_element(events, i, parent, tag);
            }
            Event::Code(s) => {
                flush_text(parent, &mut pending);
                parent.push(Node::new(Tag::Code).with_text(s.to_string()));
            }
            Event::InlineMath(s) => {
                flush_text(parent, &mut pending);
                parent.push(Node::new(Tag::Math { display: false }).with_text(s.to_string()));
            }
            Event::DisplayMath(s) => {
                flush_text(parent, &mut pending);
                parent.push(Node::new(Tag::Math { display: true }).with_text(s.to_string()));
            }
            Event::Html(s) | Event::InlineHtml(s) => {
                flush_text(parent, &mut pending);
                parent.push(Node::new(Tag::Html).with_text(s.to_string()));
            }
            Event::HardBreak => {
                flush_text(parent, &mut pending);
                parent.push(Node::new(Tag::HardBreak));
            }
            Event::Rule => {
                flush_text(parent, &mut pending);
                parent.push(Node::new(Tag::Rule));
            }
            Event::TaskListMarker(checked) => {
                pending.push_str(if *checked { "[x] " } else { "[ ] " });
            }
            _ => {}
        }
    }

    flush_text(parent, &mut pending);
}

/// Handle a Start event: build the element and fold its content.
fn start_element(events: &[Event<'_>], i: &mut usize, parent: &mut Node, tag: &CmarkTag<'_>) {
    let mut node = match tag {
        CmarkTag::Paragraph => Node::new(Tag::Paragraph),
        CmarkTag::Heading { level, .. } => Node::new(Tag::Heading(heading_level_to_u8(level))),
        CmarkTag::BlockQuote(_) => Node::new(Tag::BlockQuote),
        CmarkTag::CodeBlock(kind) => {
            let language = match kind {
                CodeBlockKind::Fenced(lang) => {
                    let lang = lang.to_string();
                    if lang.is_empty() { None } else { Some(lang) }
                }
                CodeBlockKind::Indented => None,
            };
            let content = collect_raw_until(events, i, |e| matches!(e, TagEnd::CodeBlock));
            parent.push(Node::new(Tag::CodeBlock { language }).with_text(content));
            return;
        }
        CmarkTag::HtmlBlock => {
            let content = collect_raw_until(events, i, |e| matches!(e, TagEnd::HtmlBlock));
            parent.push(Node::new(Tag::Html).with_text(content));
            return;
        }
        CmarkTag::List(start) => Node::new(Tag::List {
            ordered: start.is_some(),
            start: start.unwrap_or(1),
        }),
        CmarkTag::Item => Node::new(Tag::Item),
        CmarkTag::Table(_) => Node::new(Tag::Table),
        CmarkTag::TableHead => Node::new(Tag::TableHead),
        CmarkTag::TableRow => Node::new(Tag::TableRow),
        CmarkTag::TableCell => Node::new(Tag::TableCell),
        CmarkTag::Emphasis => Node::new(Tag::Emphasis),
        CmarkTag::Strong => Node::new(Tag::Strong),
        CmarkTag::Strikethrough => Node::new(Tag::Strikethrough),
        CmarkTag::Link { dest_url, title, .. } => {
            let mut link = Node::new(Tag::Link).with_attr("href", dest_url.to_string());
            if !title.is_empty() {
                link.set_attr("title", title.to_string());
            }
            link
        }
        CmarkTag::Image { dest_url, title, .. } => {
            let mut image = Node::new(Tag::Image).with_attr("src", dest_url.to_string());
            if !title.is_empty() {
                image.set_attr("title", title.to_string());
            }
            image
        }
        // Extensions we do not enable: their content flows into the parent.
        _ => return,
    };

    let end = end_matcher(&node.tag);
    collect_children(events, i, &mut node, &*end);
    parent.push(node);
}

/// The End event that closes an element built by [`start_element`].
fn end_matcher(tag: &Tag) -> Box<dyn Fn(&TagEnd) -> bool> {
    match tag {
        Tag::Paragraph => Box::new(|e| matches!(e, TagEnd::Paragraph)),
        Tag::Heading(_) => Box::new(|e| matches!(e, TagEnd::Heading(_))),
        Tag::BlockQuote => Box::new(|e| matches!(e, TagEnd::BlockQuote(_))),
        Tag::List { .. } => Box::new(|e| matches!(e, TagEnd::List(_))),
        Tag::Item => Box::new(|e| matches!(e, TagEnd::Item)),
        Tag::Table => Box::new(|e| matches!(e, TagEnd::Table)),
        Tag::TableHead => Box::new(|e| matches!(e, TagEnd::TableHead)),
        Tag::TableRow => Box::new(|e| matches!(e, TagEnd::TableRow)),
        Tag::TableCell => Box::new(|e| matches!(e, TagEnd::TableCell)),
        Tag::Emphasis => Box::new(|e| matches!(e, TagEnd::Emphasis)),
        Tag::Strong => Box::new(|e| matches!(e, TagEnd::Strong)),
        Tag::Strikethrough => Box::new(|e| matches!(e, TagEnd::Strikethrough)),
        Tag::Link => Box::new(|e| matches!(e, TagEnd::Link)),
        Tag::Image => Box::new(|e| matches!(e, TagEnd::Image)),
        _ => Box::new(|_| false),
    }
}

/// Append buffered text to `parent`, splitting out inline patterns.
fn flush_text(parent: &mut Node, pending: &mut String) {
    if pending.is_empty() {
        return;
    }
    for segment in inline::scan(pending) {
        match segment {
            Segment::Text(s) => parent.append_text(s),
            Segment::Node(node) => parent.push(node),
        }
    }
    pending.clear();
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn heading_level_to_u8(level: &HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Collect raw text content (no inline patterns) until a matching End tag.
fn collect_raw_until(events: &[Event<'_>], i: &mut usize, is_end: impl Fn(&TagEnd) -> bool) -> String {
    let mut text = String::new();
    while *i < events.len() {
        let ev = &events[*i];
        *i += 1;
        match ev {
            Event::End(tag_end) if is_end(tag_end) => break,
            Event::Text(s) | Event::Html(s) => text.push_str(s),
            _ => {}
        }
    }
    text
}
