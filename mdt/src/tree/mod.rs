use std::collections::BTreeMap;
use std::fmt;

use crate::block::BlockInfo;

/// Attribute map of a node. Conventional keys: `id`, `key`, `href`, `src`,
/// `title`, `level`, `number`, `label`.
pub type Attributes = BTreeMap<String, String>;

/// A node of the document tree.
///
/// Inline flow follows the element-tree convention: `text` is the content
/// before the first child, and each child's `tail` is the content between
/// that child and the next sibling. The tail belongs to the parent's flow,
/// so a renderer emits `text`, then for every child its own rendering
/// followed by its tail.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub tag: Tag,
    pub attrs: Attributes,
    pub flags: Flags,
    pub text: String,
    pub tail: String,
    pub children: Vec<Node>,
}

/// Element kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    /// Top of a converted document.
    Root,
    /// Heading plus everything up to the next heading of equal or shallower depth.
    Section,
    /// Exported table of contents.
    Toc,

    // Block-level
    Heading(u8),
    Paragraph,
    BlockQuote,
    CodeBlock { language: Option<String> },
    List { ordered: bool, start: u64 },
    Item,
    Table,
    TableHead,
    TableRow,
    TableCell,
    Rule,
    /// Raw HTML, passed through by the structural backend.
    Html,
    /// Theorem/definition/proof-style block.
    Block(BlockInfo),

    // Inline
    Span(Role),
    Emphasis,
    Strong,
    Strikethrough,
    Code,
    Link,
    Image,
    Math { display: bool },
    HardBreak,

    // Cross-referencing
    Label,
    Reference,
    Citation,
    BibEntry,
}

/// Purpose of a generated `span`. Replaces matching on class strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    /// Inline heading of a block (holds number, name, references).
    BlockHeading,
    /// Empty hook for the generated type label, ahead of the number.
    BlockLabel,
    /// Placeholder filled with the block number by the resolver.
    BlockNumber,
    BlockName,
    BlockReferences,
    /// `of <subject>` part of a proof heading.
    ProofSubject,
    /// End-of-proof glyph.
    Qed,
    /// Number injected at the start of a heading.
    SectionNumber,
    /// Resolved number attached to a reference.
    ReferenceNumber,
    /// Title part of a TOC entry.
    TocTitle,
}

impl Role {
    /// Class name used by the structural backend.
    pub fn class_name(self) -> &'static str {
        match self {
            Role::BlockHeading => "block_heading",
            Role::BlockLabel => "block_label",
            Role::BlockNumber => "block_number",
            Role::BlockName => "block_name",
            Role::BlockReferences => "block_references",
            Role::ProofSubject => "proof_subject",
            Role::Qed => "qed",
            Role::SectionNumber => "section_number",
            Role::ReferenceNumber => "reference_number",
            Role::TocTitle => "toc_title",
        }
    }
}

/// Presentation flags that used to live in a space-separated class list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    /// Node is a link target (carries an `id`).
    pub anchor: bool,
    /// Qed marker of a proof opened inside another proof.
    pub nested: bool,
}

impl Node {
    pub fn new(tag: Tag) -> Self {
        Node {
            tag,
            attrs: Attributes::new(),
            flags: Flags::default(),
            text: String::new(),
            tail: String::new(),
            children: Vec::new(),
        }
    }

    pub fn root() -> Self {
        Node::new(Tag::Root)
    }

    pub fn span(role: Role) -> Self {
        Node::new(Tag::Span(role))
    }

    pub fn with_attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attrs.insert(key.to_string(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(|s| s.as_str())
    }

    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        self.attrs.insert(key.to_string(), value.into());
    }

    pub fn push(&mut self, child: Node) {
        self.children.push(child);
    }

    /// Append inline text at the end of this node's flow: into `text` when
    /// there are no children yet, otherwise into the last child's tail.
    pub fn append_text(&mut self, s: &str) {
        match self.children.last_mut() {
            Some(last) => last.tail.push_str(s),
            None => self.text.push_str(s),
        }
    }

    pub fn heading_level(&self) -> Option<u8> {
        match self.tag {
            Tag::Heading(level) => Some(level),
            _ => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self.tag {
            Tag::Span(role) => Some(role),
            _ => None,
        }
    }

    pub fn block(&self) -> Option<&BlockInfo> {
        match &self.tag {
            Tag::Block(info) => Some(info),
            _ => None,
        }
    }

    pub fn block_mut(&mut self) -> Option<&mut BlockInfo> {
        match &mut self.tag {
            Tag::Block(info) => Some(info),
            _ => None,
        }
    }

    /// First descendant (pre-order, excluding self) matching `pred`.
    pub fn find(&self, pred: &dyn Fn(&Node) -> bool) -> Option<&Node> {
        for child in &self.children {
            if pred(child) {
                return Some(child);
            }
            if let Some(found) = child.find(pred) {
                return Some(found);
            }
        }
        None
    }

    /// All descendants matching `pred`, in document order.
    pub fn find_all<'a>(&'a self, pred: &dyn Fn(&Node) -> bool, out: &mut Vec<&'a Node>) {
        for child in &self.children {
            if pred(child) {
                out.push(child);
            }
            child.find_all(pred, out);
        }
    }

    /// Plain text of this node's content (text, children, and the children's
    /// tails), without this node's own tail.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        out.push_str(&self.text);
        for child in &self.children {
            child.collect_text(out);
            out.push_str(&child.tail);
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text_content())
    }
}
