//! Error types for every phase of the front end
//!
//! Each phase reports its own typed error. Callers that want one uniform list
//! (the CLI, an editor integration) convert them into [`Diagnostic`]s, which
//! are tagged with the phase that produced them.

use serde::Serialize;
use thiserror::Error;

use crate::parser::ast::Position;

/// Fatal tokenizer error. The file cannot be parsed at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("inconsistent dedent at line {}", .position.line)]
    InconsistentDedent { position: Position },

    #[error("mixed tabs and spaces in indentation at line {}", .position.line)]
    MixedIndentation { position: Position },

    #[error("unclosed '(' at line {}", .position.line)]
    UnclosedParen { position: Position },

    #[error("unmatched ')' at line {}", .position.line)]
    UnmatchedParen { position: Position },

    #[error("unterminated string at line {}", .position.line)]
    UnterminatedString { position: Position },
}

impl LexError {
    pub fn position(&self) -> Position {
        match self {
            LexError::InconsistentDedent { position }
            | LexError::MixedIndentation { position }
            | LexError::UnclosedParen { position }
            | LexError::UnmatchedParen { position }
            | LexError::UnterminatedString { position } => *position,
        }
    }
}

/// Syntax error with the position of the offending token
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub position: Position,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: Position) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// What kind of name a reference or definition denotes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Workflow,
    Activity,
    Signal,
    Query,
    Update,
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SymbolKind::Workflow => "workflow",
            SymbolKind::Activity => "activity",
            SymbolKind::Signal => "signal",
            SymbolKind::Query => "query",
            SymbolKind::Update => "update",
        };
        f.write_str(name)
    }
}

/// Name-resolution error. Never fatal; the resolver collects all of them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("duplicate {kind} definition: {name}")]
    DuplicateDefinition {
        kind: SymbolKind,
        name: String,
        position: Position,
    },

    #[error("duplicate {kind} declaration: {name} in workflow {workflow}")]
    DuplicateDeclaration {
        kind: SymbolKind,
        name: String,
        workflow: String,
        position: Position,
    },

    #[error("undefined {kind}: {name}")]
    Undefined {
        kind: SymbolKind,
        name: String,
        position: Position,
    },
}

impl ResolveError {
    pub fn position(&self) -> Position {
        match self {
            ResolveError::DuplicateDefinition { position, .. }
            | ResolveError::DuplicateDeclaration { position, .. }
            | ResolveError::Undefined { position, .. } => *position,
        }
    }
}

/// Pipeline phase that produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Lex,
    Parse,
    Resolve,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Lex => "lex",
            Phase::Parse => "parse",
            Phase::Resolve => "resolve",
        };
        f.write_str(name)
    }
}

/// A phase-tagged error record: what went wrong and where.
///
/// This type is independent of any output format so both the CLI and an
/// editor integration can consume it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{phase} error at line {line}, col {column}: {message}")]
pub struct Diagnostic {
    pub phase: Phase,
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl Diagnostic {
    pub fn new(phase: Phase, message: impl Into<String>, position: Position) -> Self {
        Self {
            phase,
            message: message.into(),
            line: position.line,
            column: position.column,
        }
    }
}

impl From<LexError> for Diagnostic {
    fn from(err: LexError) -> Self {
        Diagnostic::new(Phase::Lex, err.to_string(), err.position())
    }
}

impl From<ParseError> for Diagnostic {
    fn from(err: ParseError) -> Self {
        Diagnostic::new(Phase::Parse, err.message, err.position)
    }
}

impl From<ResolveError> for Diagnostic {
    fn from(err: ResolveError) -> Self {
        Diagnostic::new(Phase::Resolve, err.to_string(), err.position())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lex_error_names_line() {
        let err = LexError::MixedIndentation {
            position: Position::new(4, 1),
        };
        assert_eq!(
            err.to_string(),
            "mixed tabs and spaces in indentation at line 4"
        );
    }

    #[test]
    fn test_diagnostic_display_includes_phase_and_position() {
        let err = ResolveError::Undefined {
            kind: SymbolKind::Activity,
            name: "Bar".to_string(),
            position: Position::new(3, 5),
        };
        let diagnostic = Diagnostic::from(err);
        assert_eq!(diagnostic.phase, Phase::Resolve);
        assert_eq!(
            diagnostic.to_string(),
            "resolve error at line 3, col 5: undefined activity: Bar"
        );
    }
}
