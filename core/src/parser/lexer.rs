//! Indentation-aware lexer
//!
//! Turns Weft source text into a flat token stream. Block structure is
//! expressed with synthetic `Indent`/`Dedent` tokens computed from an
//! indentation stack, the same way Python's tokenizer does it. Parenthesized
//! spans are captured whole as `Args` tokens and never tokenized further.

use crate::errors::LexError;

use super::ast::Position;
use super::token::{keyword, Token, TokenKind};

/// Tokenize a complete source file
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new().run(source)
}

struct Lexer {
    tokens: Vec<Token>,
    /// Widths of the open indentation levels; `0` is the sentinel base level
    indent_stack: Vec<usize>,
    /// First whitespace character used for indentation in this file
    indent_char: Option<char>,
}

impl Lexer {
    fn new() -> Self {
        Self {
            tokens: Vec::new(),
            indent_stack: vec![0],
            indent_char: None,
        }
    }

    fn run(mut self, source: &str) -> Result<Vec<Token>, LexError> {
        let mut last_line = 0;

        for (index, raw_line) in source.split('\n').enumerate() {
            let line = index + 1;
            last_line = line;
            let text = raw_line.strip_suffix('\r').unwrap_or(raw_line);
            self.lex_line(text, line)?;
        }

        let eof_line = last_line.max(1);
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.push(TokenKind::Dedent, "", eof_line, 1);
        }
        self.push(TokenKind::Eof, "", eof_line, 1);

        Ok(self.tokens)
    }

    fn push(&mut self, kind: TokenKind, literal: impl Into<String>, line: usize, column: usize) {
        self.tokens.push(Token::new(kind, literal, line, column));
    }

    fn lex_line(&mut self, text: &str, line: usize) -> Result<(), LexError> {
        let chars: Vec<char> = text.chars().collect();
        let leading = chars
            .iter()
            .take_while(|c| **c == ' ' || **c == '\t')
            .count();

        // Blank lines and full-line comments leave indentation alone
        if leading == chars.len() {
            self.push(TokenKind::Newline, "", line, leading + 1);
            return Ok(());
        }
        if chars[leading] == '#' {
            let comment: String = chars[leading + 1..].iter().collect();
            self.push(TokenKind::Comment, comment, line, leading + 1);
            self.push(TokenKind::Newline, "", line, chars.len() + 1);
            return Ok(());
        }

        self.check_indent_chars(&chars[..leading], line)?;
        self.update_indentation(leading, line)?;
        self.lex_content(&chars, leading, line)?;
        self.push(TokenKind::Newline, "", line, chars.len() + 1);
        Ok(())
    }

    fn check_indent_chars(&mut self, whitespace: &[char], line: usize) -> Result<(), LexError> {
        let Some(&first) = whitespace.first() else {
            return Ok(());
        };
        let mixed = LexError::MixedIndentation {
            position: Position::new(line, 1),
        };
        if whitespace.iter().any(|c| *c != first) {
            return Err(mixed);
        }
        match self.indent_char {
            Some(expected) if expected != first => Err(mixed),
            Some(_) => Ok(()),
            None => {
                self.indent_char = Some(first);
                Ok(())
            }
        }
    }

    fn update_indentation(&mut self, width: usize, line: usize) -> Result<(), LexError> {
        let top = self.current_indent();
        if width > top {
            self.indent_stack.push(width);
            self.push(TokenKind::Indent, "", line, width + 1);
            return Ok(());
        }

        while width < self.current_indent() {
            self.indent_stack.pop();
            self.push(TokenKind::Dedent, "", line, width + 1);
        }
        if width != self.current_indent() {
            return Err(LexError::InconsistentDedent {
                position: Position::new(line, width + 1),
            });
        }
        Ok(())
    }

    fn current_indent(&self) -> usize {
        self.indent_stack.last().copied().unwrap_or(0)
    }

    fn lex_content(&mut self, chars: &[char], start: usize, line: usize) -> Result<(), LexError> {
        let mut i = start;

        while i < chars.len() {
            let c = chars[i];
            let column = i + 1;

            match c {
                ' ' | '\t' => {
                    i += 1;
                }
                '#' => {
                    let comment: String = chars[i + 1..].iter().collect();
                    self.push(TokenKind::Comment, comment, line, column);
                    break;
                }
                '(' => {
                    let close = find_closing_paren(chars, i).ok_or(LexError::UnclosedParen {
                        position: Position::new(line, column),
                    })?;
                    let interior: String = chars[i + 1..close].iter().collect();
                    self.push(TokenKind::Args, interior, line, column);
                    i = close + 1;
                }
                ')' => {
                    return Err(LexError::UnmatchedParen {
                        position: Position::new(line, column),
                    });
                }
                '"' => {
                    let end = find_string_end(chars, i).ok_or(LexError::UnterminatedString {
                        position: Position::new(line, column),
                    })?;
                    let literal: String = chars[i..=end].iter().collect();
                    self.push(TokenKind::String, literal, line, column);
                    i = end + 1;
                }
                '-' if chars.get(i + 1) == Some(&'>') => {
                    self.push(TokenKind::Arrow, "->", line, column);
                    i += 2;
                }
                ':' => {
                    self.push(TokenKind::Colon, ":", line, column);
                    i += 1;
                }
                c if is_word_char(c) => {
                    let end = scan_while(chars, i, is_word_char);
                    let word: String = chars[i..end].iter().collect();
                    let kind = keyword(&word).unwrap_or(TokenKind::Ident);
                    self.push(kind, word, line, column);
                    i = end;
                }
                _ => {
                    let end = scan_while(chars, i, is_symbol_char);
                    let symbol: String = chars[i..end].iter().collect();
                    self.push(TokenKind::Symbol, symbol, line, column);
                    i = end;
                }
            }
        }

        Ok(())
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_symbol_char(c: char) -> bool {
    !is_word_char(c) && !c.is_whitespace() && !matches!(c, '(' | ')' | '"' | '#' | ':')
}

/// Index one past the last consecutive character matching `pred`.
/// Always advances at least one character.
fn scan_while(chars: &[char], start: usize, pred: fn(char) -> bool) -> usize {
    let mut end = start + 1;
    while end < chars.len() && pred(chars[end]) {
        // `->` is always its own token
        if chars[end] == '-' && chars.get(end + 1) == Some(&'>') {
            break;
        }
        end += 1;
    }
    end
}

/// Find the `)` balancing the `(` at `open`, skipping quoted text
fn find_closing_paren(chars: &[char], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i < chars.len() {
        match chars[i] {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            '"' => {
                i = find_string_end(chars, i)?;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Find the `"` closing the string opened at `open`. A single quote is
/// ordinary text.
fn find_string_end(chars: &[char], open: usize) -> Option<usize> {
    let mut i = open + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            '"' => return Some(i),
            _ => i += 1,
        }
    }
    None
}
