//! Recursive-descent parser for Stanza manifests.
//!
//! Grammar (declarations are flat; bodies are structural only):
//!
//! ```text
//! manifest  := decl*
//! decl      := class | define | node
//! class     := "class" qname params? ("inherits" qname)? block
//! define    := "define" qname params? block
//! node      := "node" (name | string | "default") block
//! params    := "(" (param ("," param)* ","?)? ")"
//! param     := variable ("=" expr)?
//! block     := "{" statement* "}"
//! statement := "include" qname ("," qname)* | resource
//! resource  := name "{" expr ":" (attr ("," attr)* ","?)? "}"
//! attr      := name "=>" expr
//! expr      := string | number | bool | variable | qname | "undef"
//! ```

use crate::ast::{
    Attribute, Block, ClassDecl, Decl, DefineDecl, Expr, Manifest, NodeDecl, NodeMatcher, Param,
    ResourceDecl, Statement,
};
use crate::error::{ParseError, ParseResult};
use crate::lexer::tokenize;
use crate::token::{Span, Token};

/// Parse manifest source into a declaration AST.
pub fn parse(source: &str) -> ParseResult<Manifest> {
    let tokens = tokenize(source)?;
    Parser::new(tokens).parse_manifest()
}

struct Parser {
    tokens: Vec<(Token, Span)>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<(Token, Span)>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos].0
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx].0
    }

    fn span(&self) -> Span {
        self.tokens[self.pos].1
    }

    /// Consume the current token. The trailing Eof token is never consumed.
    fn advance(&mut self) -> (Token, Span) {
        let entry = self.tokens[self.pos].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        entry
    }

    fn expect(&mut self, expected: &Token, what: &str) -> ParseResult<Span> {
        if self.peek() == expected {
            Ok(self.advance().1)
        } else {
            Err(self.unexpected(what))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::unexpected_token(expected, self.peek().to_string(), self.span())
    }

    fn parse_manifest(&mut self) -> ParseResult<Manifest> {
        let mut decls = Vec::new();
        while !matches!(self.peek(), Token::Eof) {
            decls.push(self.parse_decl()?);
        }
        Ok(Manifest { decls })
    }

    fn parse_decl(&mut self) -> ParseResult<Decl> {
        match self.peek() {
            Token::Class => self.parse_class().map(Decl::Class),
            Token::Define => self.parse_define().map(Decl::Definition),
            Token::Node => self.parse_node().map(Decl::Node),
            _ => Err(self.unexpected("'class', 'define', or 'node'")),
        }
    }

    fn parse_class(&mut self) -> ParseResult<ClassDecl> {
        let line = self.span().line;
        self.expect(&Token::Class, "'class'")?;
        let name = self.parse_qualified_name()?;
        let params = self.parse_params()?;

        let parent = if matches!(self.peek(), Token::Inherits) {
            self.advance();
            Some(self.parse_qualified_name()?)
        } else {
            None
        };

        let body = self.parse_block()?;
        Ok(ClassDecl {
            name,
            params,
            parent,
            body,
            line,
        })
    }

    fn parse_define(&mut self) -> ParseResult<DefineDecl> {
        let line = self.span().line;
        self.expect(&Token::Define, "'define'")?;
        let name = self.parse_qualified_name()?;
        let params = self.parse_params()?;
        let body = self.parse_block()?;
        Ok(DefineDecl {
            name,
            params,
            body,
            line,
        })
    }

    fn parse_node(&mut self) -> ParseResult<NodeDecl> {
        let line = self.span().line;
        self.expect(&Token::Node, "'node'")?;

        let (token, span) = self.advance();
        let matcher = match token {
            Token::Default => NodeMatcher::Default,
            Token::Name(name) => NodeMatcher::Name(name),
            Token::StringLiteral(name) => NodeMatcher::Name(name),
            found => {
                return Err(ParseError::unexpected_token(
                    "a node name or 'default'",
                    found.to_string(),
                    span,
                ))
            }
        };

        let body = self.parse_block()?;
        Ok(NodeDecl {
            matcher,
            body,
            line,
        })
    }

    /// Parse an optional parenthesized parameter list.
    fn parse_params(&mut self) -> ParseResult<Vec<Param>> {
        let mut params = Vec::new();
        if !matches!(self.peek(), Token::LeftParen) {
            return Ok(params);
        }
        self.advance();

        while !matches!(self.peek(), Token::RightParen) {
            let (token, span) = self.advance();
            let name = match token {
                Token::Variable(name) => name,
                found => {
                    return Err(ParseError::unexpected_token(
                        "a parameter variable",
                        found.to_string(),
                        span,
                    ))
                }
            };

            let default = if matches!(self.peek(), Token::Equal) {
                self.advance();
                Some(self.parse_expr()?)
            } else {
                None
            };
            params.push(Param { name, default });

            if matches!(self.peek(), Token::Comma) {
                self.advance();
            } else {
                break;
            }
        }

        self.expect(&Token::RightParen, "')'")?;
        Ok(params)
    }

    fn parse_block(&mut self) -> ParseResult<Block> {
        self.expect(&Token::LeftBrace, "'{'")?;
        let mut statements = Vec::new();
        while !matches!(self.peek(), Token::RightBrace) {
            statements.push(self.parse_statement()?);
        }
        self.expect(&Token::RightBrace, "'}'")?;
        Ok(Block { statements })
    }

    fn parse_statement(&mut self) -> ParseResult<Statement> {
        match self.peek() {
            Token::Include => {
                self.advance();
                let mut names = vec![self.parse_qualified_name()?];
                while matches!(self.peek(), Token::Comma) {
                    self.advance();
                    names.push(self.parse_qualified_name()?);
                }
                Ok(Statement::Include(names))
            }
            Token::Name(_) if matches!(self.peek_at(1), Token::LeftBrace) => {
                self.parse_resource().map(Statement::Resource)
            }
            _ => Err(self.unexpected("'include' or a resource declaration")),
        }
    }

    fn parse_resource(&mut self) -> ParseResult<ResourceDecl> {
        let line = self.span().line;
        let (token, span) = self.advance();
        let type_name = match token {
            Token::Name(name) => name,
            found => {
                return Err(ParseError::unexpected_token(
                    "a resource type name",
                    found.to_string(),
                    span,
                ))
            }
        };

        self.expect(&Token::LeftBrace, "'{'")?;
        let title = self.parse_expr()?;
        self.expect(&Token::Colon, "':'")?;

        let mut attributes = Vec::new();
        while !matches!(self.peek(), Token::RightBrace) {
            let (token, span) = self.advance();
            let name = match token {
                Token::Name(name) => name,
                found => {
                    return Err(ParseError::unexpected_token(
                        "an attribute name",
                        found.to_string(),
                        span,
                    ))
                }
            };
            self.expect(&Token::FatArrow, "'=>'")?;
            let value = self.parse_expr()?;
            attributes.push(Attribute { name, value });

            if matches!(self.peek(), Token::Comma) {
                self.advance();
            } else {
                break;
            }
        }

        self.expect(&Token::RightBrace, "'}'")?;
        Ok(ResourceDecl {
            type_name,
            title,
            attributes,
            line,
        })
    }

    fn parse_expr(&mut self) -> ParseResult<Expr> {
        if matches!(self.peek(), Token::Name(_) | Token::ColonColon) {
            return self.parse_qualified_name().map(Expr::Name);
        }

        let (token, span) = self.advance();
        match token {
            Token::StringLiteral(value) => Ok(Expr::Str(value)),
            Token::IntLiteral(value) => Ok(Expr::Int(value)),
            Token::True => Ok(Expr::Bool(true)),
            Token::False => Ok(Expr::Bool(false)),
            Token::Undef => Ok(Expr::Undef),
            Token::Variable(name) => Ok(Expr::Variable(name)),
            found => Err(ParseError::unexpected_token(
                "an expression",
                found.to_string(),
                span,
            )),
        }
    }

    /// Parse a possibly qualified name, preserving a leading `::` marker.
    fn parse_qualified_name(&mut self) -> ParseResult<String> {
        let mut name = String::new();

        if matches!(self.peek(), Token::ColonColon) {
            self.advance();
            name.push_str("::");
        }

        loop {
            let (token, span) = self.advance();
            match token {
                Token::Name(segment) => name.push_str(&segment),
                found => {
                    return Err(ParseError::unexpected_token(
                        "a name segment",
                        found.to_string(),
                        span,
                    ))
                }
            }
            if matches!(self.peek(), Token::ColonColon) && matches!(self.peek_at(1), Token::Name(_))
            {
                self.advance();
                name.push_str("::");
            } else {
                break;
            }
        }

        Ok(name)
    }
}
