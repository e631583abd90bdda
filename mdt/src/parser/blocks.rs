use std::ops::Range;

use tracing::{debug, warn};

use crate::block::reference::ProofSubject;
use crate::block::{BlockInfo, BlockKind};
use crate::parser::error::{Issue, IssueKind};
use crate::parser::structural;
use crate::tree::{Node, Role, Tag};

/// Marker that closes a definition block when it ends a raw block.
pub const TERMINATOR: &str = "{}";

/// End-of-proof glyph of a top-level proof.
pub const QED_HOLLOW: &str = "\u{25A1}";
/// End-of-proof glyph of a proof nested inside another proof.
pub const QED_SOLID: &str = "\u{25A0}";

// ---------------------------------------------------------------------------
// Raw blocks
// ---------------------------------------------------------------------------

/// A blank-line separated chunk of source text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawBlock<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

impl RawBlock<'_> {
    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Split `source` into raw blocks at blank lines. Blank lines inside a
/// fenced code block do not split. `base` is added to every offset.
pub fn split_blocks(source: &str, base: usize) -> Vec<RawBlock<'_>> {
    let mut blocks = Vec::new();
    let mut current: Option<(usize, usize)> = None;
    let mut fence: Option<(char, usize)> = None;
    let mut offset = 0;

    for line in source.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        let content = line.trim_end_matches(['\n', '\r']);

        if fence.is_none() && content.trim().is_empty() {
            if let Some((s, e)) = current.take() {
                blocks.push(RawBlock {
                    text: &source[s..e],
                    start: base + s,
                    end: base + e,
                });
            }
            continue;
        }

        fence = match (fence, fence_marker(content)) {
            (None, Some(open)) => Some(open),
            (Some((ch, len)), Some((c, l))) if c == ch && l >= len => None,
            (state, _) => state,
        };

        let end = start + content.len();
        current = Some(match current {
            Some((s, _)) => (s, end),
            None => (start, end),
        });
    }

    if let Some((s, e)) = current {
        blocks.push(RawBlock {
            text: &source[s..e],
            start: base + s,
            end: base + e,
        });
    }
    blocks
}

/// A ``` or ~~~ fence of three or more characters, indented at most three spaces.
fn fence_marker(line: &str) -> Option<(char, usize)> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let trimmed = &line[indent..];
    let ch = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = trimmed.len() - trimmed.trim_start_matches(ch).len();
    (len >= 3).then_some((ch, len))
}

/// Strip a trailing terminator. Returns the remaining text and whether the
/// terminator was present.
pub fn strip_terminator(text: &str) -> (&str, bool) {
    match text.trim_end().strip_suffix(TERMINATOR) {
        Some(body) => (body, true),
        None => (text, false),
    }
}

// ---------------------------------------------------------------------------
// Start grammar
// ---------------------------------------------------------------------------

/// The recognized opening of a definition block:
///
/// ```text
/// [{#label}] Type[*] [(name)] [[references]] : body
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BlockStart<'a> {
    pub label: Option<&'a str>,
    pub kind: BlockKind,
    pub starred: bool,
    pub name: Option<&'a str>,
    pub references: Option<&'a str>,
    pub subject: Option<ProofSubject>,
    /// Text after the colon (leading whitespace removed).
    pub rest: &'a str,
}

/// Decide whether `text` opens a definition block. `None` means "not a
/// block": the text falls through to ordinary parsing.
pub fn parse_start(text: &str) -> Option<BlockStart<'_>> {
    let mut s = text.trim_start();

    let mut label = None;
    if let Some(after) = s.strip_prefix('{') {
        let close = after.find('}')?;
        let key = after[..close].trim().strip_prefix('#')?.trim();
        if key.is_empty() || key.contains(char::is_whitespace) {
            return None;
        }
        label = Some(key);
        s = after[close + 1..].trim_start();
    }

    let token_len = s.find(|c: char| !c.is_ascii_alphabetic()).unwrap_or(s.len());
    let token = &s[..token_len];
    if !is_type_shaped(token) {
        return None;
    }
    s = &s[token_len..];

    let starred = s.starts_with('*');
    if starred {
        s = &s[1..];
    }
    s = s.trim_start();

    let mut name = None;
    if let Some(after) = s.strip_prefix('(') {
        let close = after.find(')')?;
        name = Some(after[..close].trim());
        s = after[close + 1..].trim_start();
    }

    let mut references = None;
    if let Some(after) = s.strip_prefix('[') {
        let close = after.find(']')?;
        references = Some(after[..close].trim());
        s = after[close + 1..].trim_start();
    }

    let rest = s.strip_prefix(':')?.trim_start();
    let kind: BlockKind = token.parse().ok()?;

    let mut subject = None;
    if kind.is_proof() {
        if references.is_some() {
            return None;
        }
        if let Some(name) = name {
            subject = Some(ProofSubject::parse(name)?);
        }
    }

    Some(BlockStart {
        label,
        kind,
        starred,
        name: name.filter(|n| !n.is_empty()),
        references: references.filter(|r| !r.is_empty()),
        subject,
        rest,
    })
}

/// Capitalized first letter followed by lowercase letters only.
pub fn is_type_shaped(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) if first.is_ascii_uppercase() => chars.all(|c| c.is_ascii_lowercase()),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Outcome of feeding one raw block to the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The block was consumed; more input may follow.
    Continue,
    /// The block closed the innermost open definition block.
    Terminated,
    /// There is no more input.
    EndOfInput,
}

/// An open definition block.
struct Frame {
    node: Node,
    start: usize,
}

/// Consumes raw blocks, recognizing definition blocks and handing every
/// other block to the upstream Markdown parser.
///
/// Open definition blocks form a stack, so blocks nest freely: the first
/// terminator closes the innermost open block. Ordinary text is buffered
/// and parsed into the innermost open block (or the root) as one run, so
/// multi-paragraph constructs such as loose lists survive intact.
pub struct BlockMachine<'a> {
    blocks: Vec<RawBlock<'a>>,
    pos: usize,
    root: Node,
    frames: Vec<Frame>,
    run: String,
    file_id: usize,
    issues: Vec<Issue>,
}

impl<'a> BlockMachine<'a> {
    pub fn new(blocks: Vec<RawBlock<'a>>, file_id: usize) -> Self {
        BlockMachine {
            blocks,
            pos: 0,
            root: Node::root(),
            frames: Vec::new(),
            run: String::new(),
            file_id,
            issues: Vec::new(),
        }
    }

    /// Number of definition blocks currently open.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Consume the next raw block.
    pub fn step(&mut self) -> Step {
        let Some(block) = self.blocks.get(self.pos).copied() else {
            return Step::EndOfInput;
        };
        self.pos += 1;

        if let Some(start) = parse_start(block.text) {
            self.flush_run();
            let (body, terminated) = strip_terminator(start.rest);
            self.open(&start, block.start);
            self.push_run(body);
            if terminated {
                self.close();
                return Step::Terminated;
            }
            return Step::Continue;
        }

        if !self.frames.is_empty() {
            let (body, terminated) = strip_terminator(block.text);
            if terminated {
                self.push_run(body);
                self.close();
                return Step::Terminated;
            }
        }

        self.push_run(block.text);
        Step::Continue
    }

    /// Run to the end of input and return the tree. Blocks still open are
    /// closed with an `UnterminatedBlock` warning.
    pub fn finish(mut self) -> (Node, Vec<Issue>) {
        while self.step() != Step::EndOfInput {}
        self.flush_run();

        let end = self.blocks.last().map(|b| b.end).unwrap_or(0);
        while let Some(frame) = self.frames.last() {
            let kind = frame
                .node
                .block()
                .map(|info| info.kind.to_string())
                .unwrap_or_default();
            warn!(%kind, offset = frame.start, "unterminated block, closing it at end of input");
            self.issues.push(
                Issue::warning(
                    IssueKind::UnterminatedBlock { kind },
                    Some(frame.start..end),
                    self.file_id,
                )
                .with_note(format!("end the block with `{}`", TERMINATOR)),
            );
            self.close();
        }

        (self.root, self.issues)
    }

    fn container(&mut self) -> &mut Node {
        match self.frames.last_mut() {
            Some(frame) => &mut frame.node,
            None => &mut self.root,
        }
    }

    fn push_run(&mut self, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        if !self.run.is_empty() {
            self.run.push_str("\n\n");
        }
        self.run.push_str(text);
    }

    fn flush_run(&mut self) {
        if self.run.is_empty() {
            return;
        }
        let run = std::mem::take(&mut self.run);
        structural::parse_into(&run, self.container());
    }

    fn open(&mut self, start: &BlockStart<'_>, offset: usize) {
        let mut info = BlockInfo::new(start.kind);
        if start.starred {
            info.numbered = false;
        }
        info.label = start.label.map(str::to_string);
        info.subject = start.subject.clone();
        if start.kind.is_proof() {
            info.proof_depth = self
                .frames
                .iter()
                .filter(|f| f.node.block().is_some_and(|b| b.kind.is_proof()))
                .count() as u32;
        } else {
            info.name = start.name.map(str::to_string);
            info.references = start.references.map(str::to_string);
        }
        debug!(kind = %start.kind, depth = self.frames.len(), "open block");

        let heading = block_heading(&info);
        let mut node = Node::new(Tag::Block(info));
        node.push(heading);
        self.frames.push(Frame {
            node,
            start: offset,
        });
    }

    fn close(&mut self) {
        self.flush_run();
        let Some(mut frame) = self.frames.pop() else {
            return;
        };
        if let Some(info) = frame.node.block().filter(|b| b.kind.is_proof()) {
            let nested = info.proof_depth > 0;
            let mut qed = Node::span(Role::Qed).with_text(if nested { QED_SOLID } else { QED_HOLLOW });
            qed.flags.nested = nested;
            frame.node.push(qed);
        }
        self.container().push(frame.node);
    }
}

/// The inline heading of a block: optional label, the type label hook, then
/// a number placeholder with name/references, or the proof subject.
fn block_heading(info: &BlockInfo) -> Node {
    let kind = info.kind.as_str();
    let mut heading = Node::span(Role::BlockHeading).with_attr("type", kind);
    if let Some(label) = &info.label {
        heading.push(Node::new(Tag::Label).with_attr("key", label.clone()));
    }
    heading.push(Node::span(Role::BlockLabel).with_attr("type", kind));
    if !info.kind.is_proof() {
        heading.push(Node::span(Role::BlockNumber));
    }

    match &info.subject {
        Some(ProofSubject::Reference(key)) => {
            let mut subject = Node::span(Role::ProofSubject).with_text("of ");
            subject.push(Node::new(Tag::Reference).with_attr("key", key.clone()));
            heading.push(subject);
        }
        Some(ProofSubject::Text(text)) => {
            heading.push(Node::span(Role::ProofSubject).with_text(format!("of {}", text)));
        }
        None => {}
    }
    if let Some(name) = &info.name {
        heading.push(Node::span(Role::BlockName).with_text(name.clone()));
    }
    if let Some(references) = &info.references {
        heading.push(Node::span(Role::BlockReferences).with_text(references.clone()));
    }
    heading
}
