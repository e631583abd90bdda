pub mod blocks;
pub mod error;
pub mod front_matter;
pub mod inline;
mod structural;

pub use error::{Issue, IssueKind};

use crate::Parsed;
use crate::macros;
use crate::parser::blocks::BlockMachine;

/// Parser entry point.
pub struct Parser {
    source: String,
    file_id: usize,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser { source, file_id }
    }

    /// Parse the source into a document tree.
    ///
    /// Abbreviations are expanded first; front matter is then split off the
    /// expanded text and the remainder runs through the block grammar.
    /// Parsing never fails: problems are reported as [`Issue`]s.
    pub fn parse(&self) -> Parsed {
        let expansion = macros::expand(&self.source, self.file_id);
        let mut issues = expansion.issues;

        let front = front_matter::split(&expansion.text);
        if let Some(kind) = front.error {
            issues.push(Issue::warning(kind, Some(0..3), self.file_id));
        }

        let body = &expansion.text[front.body_start..];
        let raw = blocks::split_blocks(body, front.body_start);
        let (root, block_issues) = BlockMachine::new(raw, self.file_id).finish();
        issues.extend(block_issues);

        Parsed {
            root,
            meta: front.meta,
            macros: expansion.macros,
            source: expansion.text,
            source_id: self.file_id,
            issues,
        }
    }
}
