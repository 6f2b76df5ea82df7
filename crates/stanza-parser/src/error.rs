//! Parse errors

use crate::token::Span;
use thiserror::Error;

/// Result of a parse operation.
pub type ParseResult<T> = Result<T, ParseError>;

/// Errors produced while lexing or parsing manifest text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// Input contained a character sequence no token matches.
    #[error("Unexpected character '{found}' at line {line}, column {column}")]
    UnexpectedCharacter {
        /// The offending character.
        found: char,
        /// 1-based line number.
        line: u32,
        /// 1-based column number.
        column: u32,
        /// Byte range in the source.
        span: (usize, usize),
    },

    /// The parser met a token it did not expect.
    #[error("Expected {expected}, found {found} at line {line}, column {column}")]
    UnexpectedToken {
        /// Description of what the parser was looking for.
        expected: String,
        /// Display form of the token actually found.
        found: String,
        /// 1-based line number.
        line: u32,
        /// 1-based column number.
        column: u32,
        /// Byte range in the source.
        span: (usize, usize),
    },
}

impl ParseError {
    /// Line the error occurred on.
    pub fn line(&self) -> u32 {
        match self {
            ParseError::UnexpectedCharacter { line, .. } => *line,
            ParseError::UnexpectedToken { line, .. } => *line,
        }
    }

    /// Column the error occurred on.
    pub fn column(&self) -> u32 {
        match self {
            ParseError::UnexpectedCharacter { column, .. } => *column,
            ParseError::UnexpectedToken { column, .. } => *column,
        }
    }

    /// Byte range of the offending source text.
    pub fn span(&self) -> (usize, usize) {
        match self {
            ParseError::UnexpectedCharacter { span, .. } => *span,
            ParseError::UnexpectedToken { span, .. } => *span,
        }
    }

    pub(crate) fn unexpected_token(expected: impl Into<String>, found: String, span: Span) -> Self {
        ParseError::UnexpectedToken {
            expected: expected.into(),
            found,
            line: span.line,
            column: span.column,
            span: (span.start, span.end),
        }
    }
}
