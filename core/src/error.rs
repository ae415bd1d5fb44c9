//! Error types for partial parsing.
//!
//! Syntax problems in a partial source are reported as [`SyntaxError`];
//! failures to open or read the source itself pass through unchanged as
//! [`std::io::Error`] inside [`PartialError::Io`].

use thiserror::Error;

use crate::SectionKind;

/// Malformed partial source.
///
/// A document that fails with a syntax error is never constructed, so it can
/// never enter a registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    /// A header line names a word that is not one of the known section kinds.
    #[error("invalid section name '{0}'")]
    InvalidSectionName(String),
    /// The same section kind appears twice in one source.
    #[error("duplicate section '{0}'")]
    DuplicateSection(SectionKind),
    /// No `PARTIAL:` header was found.
    #[error("missing required PARTIAL section")]
    MissingPartialSection,
}

/// Errors that can occur while building a [`Document`](crate::Document).
#[derive(Debug, Error)]
pub enum PartialError {
    /// The source text is not a valid partial.
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    /// The source could not be opened or read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PartialError {
    /// Returns the syntax error, if this is one.
    pub fn as_syntax(&self) -> Option<&SyntaxError> {
        match self {
            Self::Syntax(err) => Some(err),
            Self::Io(_) => None,
        }
    }
}

/// Convenience alias for results with [`PartialError`].
pub type Result<T> = std::result::Result<T, PartialError>;
