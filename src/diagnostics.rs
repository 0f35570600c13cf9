//! Diagnostic types for the pegma parsers.
//!
//! Two disjoint kinds of failure exist and never mix:
//!
//! - [`SyntaxError`]: malformed source. These are *collected* into a shared,
//!   caller-owned list so one pass can surface several independent problems;
//!   they are never used for control flow.
//! - [`InternalError`]: a defect signal for states the parsers guarantee are
//!   unreachable on any input. It travels through the `Err` arm of
//!   [`ParseResult`] and aborts the whole pass.

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use crate::cursor::{Cursor, Position};

/// Outcome of one parse attempt: `Ok(Some(_))` on success, `Ok(None)` when
/// the construct was malformed (with at least one new [`SyntaxError`] in the
/// shared list), `Err` on an internal invariant violation.
pub type ParseResult<T> = Result<Option<T>, InternalError>;

/// A single user-facing parse problem, tagged with its source position.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("{message} [{line}:{column}]")]
#[diagnostic(code(pegma::parse::syntax))]
pub struct SyntaxError {
    pub message: String,
    pub line: usize,
    pub column: usize,
    #[label("here")]
    pub span: SourceSpan,
}

impl SyntaxError {
    /// A diagnostic at the cursor's current position.
    pub fn new(message: impl Into<String>, cursor: &Cursor) -> Self {
        Self::at(message, cursor.position())
    }

    /// A diagnostic at an earlier, recorded position.
    pub fn at(message: impl Into<String>, position: Position) -> Self {
        SyntaxError {
            message: message.into(),
            line: position.line,
            column: position.column,
            span: (position.offset, 0).into(),
        }
    }
}

/// An impossible-state signal. Reaching one of these is a parser bug, not a
/// problem with the input, so it is never added to the diagnostics list.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("internal parser error: {message} [{line}:{column}]")]
#[diagnostic(code(pegma::parse::internal))]
pub struct InternalError {
    pub message: String,
    pub line: usize,
    pub column: usize,
    #[label("invariant violated here")]
    pub span: SourceSpan,
}

impl InternalError {
    pub fn new(message: impl Into<String>, cursor: &Cursor) -> Self {
        let position = cursor.position();
        InternalError {
            message: message.into(),
            line: position.line,
            column: position.column,
            span: (position.offset, 0).into(),
        }
    }
}
