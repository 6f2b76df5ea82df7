//! Lexer for the Stanza manifest language.
//!
//! This module implements the lexer using the logos library. The
//! logos-generated enum is internal; it is converted to the public
//! [`Token`] enum with line/column tracking, and an explicit end-of-input
//! marker is appended.

use crate::error::ParseError;
use crate::token::{Span, Token};
use logos::Logos;

/// Logos-based token enum for lexing.
///
/// Converted to the public Token enum after lexing.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"#[^\n]*")]
enum LogosToken {
    // Keywords (must come before names)
    #[token("class")]
    Class,

    #[token("define")]
    Define,

    #[token("node")]
    Node,

    #[token("inherits")]
    Inherits,

    #[token("include")]
    Include,

    #[token("default")]
    Default,

    #[token("undef")]
    Undef,

    #[token("true")]
    True,

    #[token("false")]
    False,

    // Name segments (must come after keywords)
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Name(String),

    // Variables
    #[regex(r"\$[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice()[1..].to_string())]
    Variable(String),

    // Numbers
    #[regex(r"-?[0-9]+", |lex| lex.slice().parse().ok())]
    IntLiteral(i64),

    // Strings
    #[regex(r#""([^"\\]|\\.)*""#, parse_string)]
    #[regex(r"'([^'\\]|\\.)*'", parse_string)]
    StringLiteral(String),

    // Punctuation (2-char before 1-char)
    #[token("::")]
    ColonColon,

    #[token("=>")]
    FatArrow,

    #[token("=")]
    Equal,

    #[token(":")]
    Colon,

    #[token(",")]
    Comma,

    #[token("(")]
    LeftParen,

    #[token(")")]
    RightParen,

    #[token("{")]
    LeftBrace,

    #[token("}")]
    RightBrace,
}

// Helper parsing functions
fn parse_string(lex: &mut logos::Lexer<'_, LogosToken>) -> Option<String> {
    let s = lex.slice();
    let inner = &s[1..s.len() - 1]; // Remove quotes
    Some(unescape_string(inner))
}

fn unescape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some('\\') => result.push('\\'),
                Some('"') => result.push('"'),
                Some('\'') => result.push('\''),
                Some(c) => result.push(c),
                None => break,
            }
        } else {
            result.push(c);
        }
    }

    result
}

fn convert_token(token: LogosToken) -> Token {
    match token {
        LogosToken::Class => Token::Class,
        LogosToken::Define => Token::Define,
        LogosToken::Node => Token::Node,
        LogosToken::Inherits => Token::Inherits,
        LogosToken::Include => Token::Include,
        LogosToken::Default => Token::Default,
        LogosToken::Undef => Token::Undef,
        LogosToken::True => Token::True,
        LogosToken::False => Token::False,
        LogosToken::Name(name) => Token::Name(name),
        LogosToken::Variable(name) => Token::Variable(name),
        LogosToken::IntLiteral(value) => Token::IntLiteral(value),
        LogosToken::StringLiteral(value) => Token::StringLiteral(value),
        LogosToken::ColonColon => Token::ColonColon,
        LogosToken::FatArrow => Token::FatArrow,
        LogosToken::Equal => Token::Equal,
        LogosToken::Colon => Token::Colon,
        LogosToken::Comma => Token::Comma,
        LogosToken::LeftParen => Token::LeftParen,
        LogosToken::RightParen => Token::RightParen,
        LogosToken::LeftBrace => Token::LeftBrace,
        LogosToken::RightBrace => Token::RightBrace,
    }
}

/// Tokenize manifest source into a token stream with source locations.
///
/// # Arguments
/// * `source` - Full manifest text
///
/// # Returns
/// * `Ok(Vec<(Token, Span)>)` - Token stream ending with `Token::Eof`
/// * `Err(ParseError)` - First unrecognized character sequence
pub fn tokenize(source: &str) -> Result<Vec<(Token, Span)>, ParseError> {
    let mut lexer = LogosToken::lexer(source);
    let mut tokens = Vec::new();
    let mut line = 1u32;
    let mut column = 1u32;
    let mut last_end = 0;

    while let Some(result) = lexer.next() {
        let range = lexer.span();

        // Advance line/column over skipped text (whitespace, comments)
        for c in source[last_end..range.start].chars() {
            if c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }

        let span = Span::new(range.start, range.end, line, column);

        match result {
            Ok(token) => tokens.push((convert_token(token), span)),
            Err(_) => {
                let found = source[range.start..].chars().next().unwrap_or('\0');
                return Err(ParseError::UnexpectedCharacter {
                    found,
                    line,
                    column,
                    span: (range.start, range.end),
                });
            }
        }

        // Advance over the token itself
        for c in source[range.start..range.end].chars() {
            if c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }

        last_end = range.end;
    }

    let eof = Span::new(source.len(), source.len(), line, column);
    tokens.push((Token::Eof, eof));
    Ok(tokens)
}
