pub mod block;
pub mod macros;
pub mod parser;
pub mod tree;

pub use parser::front_matter::Meta;
pub use parser::{Issue, IssueKind, Parser};
pub use tree::{Node, Role, Tag};

use crate::macros::Macro;

/// A parsed document.
#[derive(Debug, Clone)]
pub struct Parsed {
    /// Root of the document tree, before sectioning and numbering.
    pub root: Node,
    /// Front matter values.
    pub meta: Meta,
    /// Abbreviations defined by the document, valid or not.
    pub macros: Vec<Macro>,
    /// The macro-expanded source. Issue spans index into this text.
    pub source: String,
    /// The source file ID (for error reporting with codespan-reporting).
    pub source_id: usize,
    pub issues: Vec<Issue>,
}

/// Parse `source` with file id 0.
pub fn parse(source: &str) -> Parsed {
    Parser::new(source.to_string(), 0).parse()
}
