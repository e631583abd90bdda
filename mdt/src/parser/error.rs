use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};
use thiserror::Error;

/// Recoverable conditions met while converting a document. None of them
/// aborts the conversion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IssueKind {
    #[error("unterminated {kind} block (missing `{{}}`)")]
    UnterminatedBlock { kind: String },

    #[error("undefined reference '{key}'")]
    UnresolvedReference { key: String },

    #[error("no bibliography entry for citation '{key}'")]
    UnknownCitation { key: String },

    #[error("invalid macro '\\{name}': {reason}")]
    InvalidMacro { name: String, reason: String },

    #[error("malformed render option '{option}': {reason}")]
    MalformedRenderOption { option: String, reason: String },

    #[error("malformed front matter: {reason}")]
    MalformedFrontMatter { reason: String },
}

/// An issue with optional source location information.
///
/// Spans are byte ranges into the macro-expanded source held by
/// [`crate::Parsed::source`].
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub kind: IssueKind,
    pub span: Option<Range<usize>>,
    pub file_id: usize,
    pub severity: Severity,
    pub notes: Vec<String>,
}

impl Issue {
    pub fn warning(kind: IssueKind, span: Option<Range<usize>>, file_id: usize) -> Self {
        Issue {
            kind,
            span,
            file_id,
            severity: Severity::Warning,
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        let labels = match &self.span {
            Some(span) => vec![Label::primary(self.file_id, span.clone())],
            None => Vec::new(),
        };
        Diagnostic::new(self.severity)
            .with_message(self.message())
            .with_labels(labels)
            .with_notes(self.notes.clone())
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.kind.fmt(f)
    }
}
