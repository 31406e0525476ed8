//! Recursive-descent parser for the Weft workflow language
//!
//! Consumes the token stream produced by [`lexer::tokenize`] and builds a
//! [`Program`]. Statement parsing is driven by the dispatch tables in
//! `dispatch.rs`; which table applies depends on the body being parsed
//! (workflow main body, handler, activity).
//!
//! Two entry points exist:
//!
//! - [`parse`] stops at the first error and returns no AST.
//! - [`parse_collecting`] records an error, skips to the next top-level
//!   definition and keeps going, returning every definition that parsed.

pub mod ast;
pub mod lexer;
pub mod token;

mod awaits;
mod definitions;
mod dispatch;
mod statements;

#[cfg(test)]
mod tests;

use tracing::{debug, trace};

pub use crate::errors::{ParseError, ParseResult};

use ast::{Definition, Position, Program, Statement};
use dispatch::{lookup, Scope, TOP_LEVEL};
use token::{Token, TokenKind};

/* ===================== Public API ===================== */

/// Parse a token stream, failing on the first error
pub fn parse(tokens: Vec<Token>) -> ParseResult<Program> {
    Parser::new(tokens).parse_program()
}

/// Parse a token stream, collecting every error.
///
/// A definition that fails to parse is dropped; parsing resumes at the next
/// `workflow`/`activity` keyword in column 1.
pub fn parse_collecting(tokens: Vec<Token>) -> (Program, Vec<ParseError>) {
    Parser::new(tokens).parse_program_recovering()
}

/* ===================== Parser ===================== */

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let line = tokens.last().map_or(1, |t| t.line);
            tokens.push(Token::new(TokenKind::Eof, "", line, 1));
        }
        Self { tokens, pos: 0 }
    }

    /// Fail-fast: the first error aborts the whole parse
    pub fn parse_program(&mut self) -> ParseResult<Program> {
        let mut definitions = Vec::new();
        loop {
            self.skip_newlines_and_comments();
            if self.at_eof() {
                break;
            }
            definitions.push(self.parse_definition()?);
        }
        Ok(Program { definitions })
    }

    /// Collect-all: every broken definition contributes one error
    pub fn parse_program_recovering(&mut self) -> (Program, Vec<ParseError>) {
        let mut definitions = Vec::new();
        let mut errors = Vec::new();
        loop {
            self.skip_newlines_and_comments();
            if self.at_eof() {
                break;
            }
            let start = self.pos;
            match self.parse_definition() {
                Ok(def) => definitions.push(def),
                Err(err) => {
                    debug!(line = err.position.line, error = %err, "recovering from parse error");
                    errors.push(err);
                    self.synchronize(start);
                }
            }
        }
        (Program { definitions }, errors)
    }

    fn parse_definition(&mut self) -> ParseResult<Definition> {
        let kind = self.peek_kind();
        match lookup(TOP_LEVEL, kind) {
            Some(parse) => {
                trace!(line = self.current().line, ?kind, "parsing definition");
                parse(self)
            }
            None => Err(self.error_here(format!(
                "expected 'workflow' or 'activity' definition, found {}",
                self.found()
            ))),
        }
    }

    /// Skip to the next definition keyword in column 1 (or end of input).
    /// Always moves past the token where the failed definition started.
    fn synchronize(&mut self, definition_start: usize) {
        let last = self.tokens.len() - 1;
        self.pos = self.pos.max(definition_start + 1).min(last);
        while !self.at_eof() && !self.at_definition_start() {
            self.pos += 1;
        }
    }

    fn at_definition_start(&self) -> bool {
        let token = self.current();
        token.column == 1 && lookup(TOP_LEVEL, token.kind).is_some()
    }

    /* ===================== Blocks ===================== */

    /// `: NEWLINE INDENT statements DEDENT`
    fn parse_block(&mut self, scope: Scope) -> ParseResult<Vec<Statement>> {
        self.expect(TokenKind::Colon, "':'")?;
        self.expect_line_end()?;
        self.parse_block_body(scope)
    }

    /// Like [`Parser::parse_block`] but the indented block may be absent
    fn parse_optional_block(
        &mut self,
        scope: Scope,
    ) -> ParseResult<Option<Vec<Statement>>> {
        self.expect(TokenKind::Colon, "':'")?;
        self.expect_line_end()?;
        if self.block_follows() {
            Ok(Some(self.parse_block_body(scope)?))
        } else {
            Ok(None)
        }
    }

    fn parse_block_body(&mut self, scope: Scope) -> ParseResult<Vec<Statement>> {
        let mut body = self.parse_leading_comments(scope)?;
        let indent = self.expect(TokenKind::Indent, "an indented block")?;
        self.parse_statements(scope, indent.column, &mut body)?;
        self.expect(TokenKind::Dedent, "end of block")?;
        Ok(body)
    }

    /// Comment lines between a block header and its first statement
    /// appear before the `Indent` token
    fn parse_leading_comments(&mut self, scope: Scope) -> ParseResult<Vec<Statement>> {
        let mut comments = Vec::new();
        loop {
            self.skip_newlines();
            if !self.check(TokenKind::Comment) {
                return Ok(comments);
            }
            comments.push(self.parse_comment(scope)?);
        }
    }

    /// Statements up to (not including) the closing `Dedent`.
    ///
    /// `indent` is the column of the block's statements. Comment lines are
    /// lexed before the `Dedent` that follows them; a trailing comment written
    /// further left belongs to an enclosing block, so the `Dedent` is moved in
    /// front of it.
    fn parse_statements(
        &mut self,
        scope: Scope,
        indent: usize,
        body: &mut Vec<Statement>,
    ) -> ParseResult<()> {
        loop {
            self.skip_newlines();
            if self.check(TokenKind::Dedent) || self.at_eof() {
                return Ok(());
            }
            if self.outdented_comment(indent) {
                self.hoist_dedent();
                return Ok(());
            }
            body.push(self.parse_statement(scope)?);
        }
    }

    /// A comment left of `indent` with only comments and blank lines between
    /// it and the end of the block
    fn outdented_comment(&self, indent: usize) -> bool {
        let token = self.current();
        if token.kind != TokenKind::Comment || token.column >= indent {
            return false;
        }
        self.tokens[self.pos..]
            .iter()
            .find(|t| !matches!(t.kind, TokenKind::Newline | TokenKind::Comment))
            .map_or(true, |t| matches!(t.kind, TokenKind::Dedent | TokenKind::Eof))
    }

    /// Move the next `Dedent` in front of the comments preceding it
    fn hoist_dedent(&mut self) {
        let offset = self.tokens[self.pos..]
            .iter()
            .position(|t| t.kind == TokenKind::Dedent);
        if let Some(offset) = offset {
            let dedent = self.tokens.remove(self.pos + offset);
            self.tokens.insert(self.pos, dedent);
        }
    }

    fn block_follows(&self) -> bool {
        self.peek_kind_at(self.significant_offset()) == TokenKind::Indent
    }

    /// Offset from the cursor to the first token that is not a newline or a
    /// comment line
    fn significant_offset(&self) -> usize {
        self.tokens[self.pos..]
            .iter()
            .position(|t| !matches!(t.kind, TokenKind::Newline | TokenKind::Comment))
            .unwrap_or(0)
    }

    /* ===================== Token Helpers ===================== */

    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_kind(&self) -> TokenKind {
        self.current().kind
    }

    fn peek_kind_at(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map_or(TokenKind::Eof, |t| t.kind)
    }

    fn position(&self) -> Position {
        self.current().position()
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn at_eof(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_here(format!("expected {}, found {}", expected, self.found())))
        }
    }

    fn expect_name(&mut self, expected: &str) -> ParseResult<String> {
        Ok(self.expect(TokenKind::Ident, expected)?.literal)
    }

    fn expect_args(&mut self, expected: &str) -> ParseResult<String> {
        Ok(self.expect(TokenKind::Args, expected)?.literal)
    }

    /// Optional `-> (text)` or `-> name`
    fn parse_arrow_target(&mut self, expected: &str) -> ParseResult<Option<String>> {
        if !self.match_token(TokenKind::Arrow) {
            return Ok(None);
        }
        match self.peek_kind() {
            TokenKind::Args | TokenKind::Ident => Ok(Some(self.advance().literal)),
            _ => Err(self.error_here(format!(
                "expected {} after '->', found {}",
                expected,
                self.found()
            ))),
        }
    }

    /// A statement ends at a newline, optionally preceded by a trailing comment
    fn expect_line_end(&mut self) -> ParseResult<()> {
        self.match_token(TokenKind::Comment);
        if self.match_token(TokenKind::Newline) || self.at_eof() {
            Ok(())
        } else {
            Err(self.error_here(format!(
                "unexpected {} at end of statement",
                self.found()
            )))
        }
    }

    fn skip_newlines(&mut self) {
        while self.check(TokenKind::Newline) {
            self.advance();
        }
    }

    /// Skip blank lines and drop comments where no statement list exists
    fn skip_newlines_and_comments(&mut self) {
        while matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Comment) {
            self.advance();
        }
    }

    /// Source text of the remaining tokens on this line, spacing preserved
    fn rest_of_line(&mut self) -> String {
        let mut text = String::new();
        let mut previous_end: Option<usize> = None;
        while !matches!(
            self.peek_kind(),
            TokenKind::Newline
                | TokenKind::Comment
                | TokenKind::Eof
                | TokenKind::Indent
                | TokenKind::Dedent
        ) {
            let token = self.advance();
            if let Some(end) = previous_end {
                let gap = token.column.saturating_sub(end);
                text.extend(std::iter::repeat(' ').take(gap));
            }
            previous_end = Some(token.column + token.source_width());
            text.push_str(&token.source_text());
        }
        text
    }

    fn error_here(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.position())
    }

    /// Description of the current token for error messages
    fn found(&self) -> String {
        let token = self.current();
        match token.kind {
            TokenKind::Newline => "end of line".to_string(),
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::Indent => "indentation".to_string(),
            TokenKind::Dedent => "end of block".to_string(),
            TokenKind::Comment => "comment".to_string(),
            _ => format!("'{}'", token.source_text()),
        }
    }
}
