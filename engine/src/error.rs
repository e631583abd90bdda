use mdt::{Issue, IssueKind};
use thiserror::Error;

/// A render option or configuration value that could not be understood.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    #[error("expected `key=value`")]
    MissingValue { option: String },

    #[error("empty key")]
    EmptyKey { option: String },

    #[error("expected `true` or `false`, got '{value}'")]
    NotABool { option: String, value: String },

    #[error("unknown class '{name}'")]
    UnknownClass { option: String, name: String },

    #[error("unknown output format '{0}' (expected `html` or `latex`)")]
    UnknownFormat(String),
}

impl OptionError {
    /// The option text the error refers to.
    pub fn option(&self) -> &str {
        match self {
            OptionError::MissingValue { option }
            | OptionError::EmptyKey { option }
            | OptionError::NotABool { option, .. }
            | OptionError::UnknownClass { option, .. } => option,
            OptionError::UnknownFormat(value) => value,
        }
    }

    pub fn to_issue(&self, file_id: usize) -> Issue {
        Issue::warning(
            IssueKind::MalformedRenderOption {
                option: self.option().to_string(),
                reason: self.to_string(),
            },
            None,
            file_id,
        )
    }
}
