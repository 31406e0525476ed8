//! Token model for the Weft lexer

use serde::Serialize;

use super::ast::Position;

/// Kind of a lexical token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    // Definitions and declarations
    Workflow,
    Activity,
    Signal,
    Query,
    Update,

    // Temporal primitives
    Spawn,
    Detach,
    Nexus,
    Timer,
    Await,
    All,
    One,
    ContinueAsNew,
    Close,
    Completed,
    Failed,

    // Control flow
    Switch,
    Case,
    Default,
    If,
    Else,
    For,
    Break,
    Continue,
    Return,
    Options,

    // Payload-carrying tokens
    Ident,
    String,
    Args,
    Symbol,
    Comment,

    // Punctuation
    Arrow,
    Colon,

    // Layout
    Newline,
    Indent,
    Dedent,
    Eof,
}

/// Static keyword table. Bare words not listed here lex as `Ident`.
const KEYWORDS: &[(&str, TokenKind)] = &[
    ("workflow", TokenKind::Workflow),
    ("activity", TokenKind::Activity),
    ("signal", TokenKind::Signal),
    ("query", TokenKind::Query),
    ("update", TokenKind::Update),
    ("spawn", TokenKind::Spawn),
    ("detach", TokenKind::Detach),
    ("nexus", TokenKind::Nexus),
    ("timer", TokenKind::Timer),
    ("await", TokenKind::Await),
    ("all", TokenKind::All),
    ("one", TokenKind::One),
    ("continue_as_new", TokenKind::ContinueAsNew),
    ("close", TokenKind::Close),
    ("completed", TokenKind::Completed),
    ("failed", TokenKind::Failed),
    ("switch", TokenKind::Switch),
    ("case", TokenKind::Case),
    ("default", TokenKind::Default),
    ("if", TokenKind::If),
    ("else", TokenKind::Else),
    ("for", TokenKind::For),
    ("break", TokenKind::Break),
    ("continue", TokenKind::Continue),
    ("return", TokenKind::Return),
    ("options", TokenKind::Options),
];

/// Look up a bare word in the keyword table
pub fn keyword(word: &str) -> Option<TokenKind> {
    KEYWORDS
        .iter()
        .find(|(text, _)| *text == word)
        .map(|(_, kind)| *kind)
}

impl TokenKind {
    /// Human-readable name used in parse error messages
    pub fn describe(&self) -> &'static str {
        if let Some((text, _)) = KEYWORDS.iter().find(|(_, kind)| kind == self) {
            return text;
        }
        match self {
            TokenKind::Ident => "identifier",
            TokenKind::String => "string",
            TokenKind::Args => "parenthesized arguments",
            TokenKind::Symbol => "symbol",
            TokenKind::Comment => "comment",
            TokenKind::Arrow => "'->'",
            TokenKind::Colon => "':'",
            TokenKind::Newline => "end of line",
            TokenKind::Indent => "indent",
            TokenKind::Dedent => "dedent",
            TokenKind::Eof => "end of input",
            _ => "keyword",
        }
    }
}

/// A single token.
///
/// `literal` holds the text as written (quotes included for `String`),
/// except for `Args` tokens where it holds the interior text without the
/// surrounding parentheses, and `Comment` tokens where it holds the text
/// after `#`. Lines and columns are 1-based and counted in characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, literal: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            kind,
            literal: literal.into(),
            line,
            column,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    /// Width of the token in the source line, in characters
    pub fn source_width(&self) -> usize {
        let inner = self.literal.chars().count();
        match self.kind {
            TokenKind::Args => inner + 2,
            TokenKind::Comment => inner + 1,
            TokenKind::Newline | TokenKind::Indent | TokenKind::Dedent | TokenKind::Eof => 0,
            _ => inner,
        }
    }

    /// The token as it appeared in the source
    pub fn source_text(&self) -> String {
        match self.kind {
            TokenKind::Args => format!("({})", self.literal),
            TokenKind::Comment => format!("#{}", self.literal),
            _ => self.literal.clone(),
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} {:?} {:?}",
            self.line, self.column, self.kind, self.literal
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(keyword("workflow"), Some(TokenKind::Workflow));
        assert_eq!(keyword("continue_as_new"), Some(TokenKind::ContinueAsNew));
        assert_eq!(keyword("Workflow"), None);
        assert_eq!(keyword("order"), None);
    }

    #[test]
    fn test_source_width_accounts_for_delimiters() {
        let args = Token::new(TokenKind::Args, "x, y", 1, 1);
        assert_eq!(args.source_width(), 6);
        assert_eq!(args.source_text(), "(x, y)");

        let arrow = Token::new(TokenKind::Arrow, "->", 1, 1);
        assert_eq!(arrow.source_width(), 2);
    }
}
