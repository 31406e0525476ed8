//! Keyword dispatch tables
//!
//! Each table maps the kind of the first token of a line to the function
//! that parses it. A token missing from the applicable table is either a
//! temporal keyword that the body may not use (an error) or the start of a
//! raw statement. `case`, `default` and `options` followed by an operator are
//! raw statements too.

use crate::errors::ParseResult;

use super::ast::{Definition, Statement};
use super::token::TokenKind;
use super::Parser;

pub(super) type DefParser = fn(&mut Parser) -> ParseResult<Definition>;
pub(super) type StmtParser = fn(&mut Parser, Scope) -> ParseResult<Statement>;

/// The kind of body a statement is parsed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Scope {
    /// Main body of a workflow
    Workflow,
    Signal,
    Update,
    Query,
    Activity,
}

impl Scope {
    /// Query handlers and activities use the activity statement set
    pub(super) fn is_restricted(self) -> bool {
        matches!(self, Scope::Query | Scope::Activity)
    }

    pub(super) fn describe(self) -> &'static str {
        match self {
            Scope::Workflow => "a workflow body",
            Scope::Signal => "a signal handler",
            Scope::Update => "an update handler",
            Scope::Query => "a query handler",
            Scope::Activity => "an activity body",
        }
    }

    fn table(self) -> &'static [(TokenKind, StmtParser)] {
        if self.is_restricted() {
            ACTIVITY_BODY
        } else {
            WORKFLOW_BODY
        }
    }
}

pub(super) const TOP_LEVEL: &[(TokenKind, DefParser)] = &[
    (TokenKind::Workflow, Parser::parse_workflow_def),
    (TokenKind::Activity, Parser::parse_activity_def),
];

/// Statements allowed in workflow bodies and in signal/update handlers
const WORKFLOW_BODY: &[(TokenKind, StmtParser)] = &[
    (TokenKind::Activity, Parser::parse_activity_call_stmt),
    (TokenKind::Workflow, Parser::parse_workflow_call_stmt),
    (TokenKind::Spawn, Parser::parse_workflow_call_stmt),
    (TokenKind::Detach, Parser::parse_workflow_call_stmt),
    (TokenKind::Nexus, Parser::parse_workflow_call_stmt),
    (TokenKind::Await, Parser::parse_await),
    (TokenKind::Switch, Parser::parse_switch),
    (TokenKind::If, Parser::parse_if),
    (TokenKind::For, Parser::parse_for),
    (TokenKind::Close, Parser::parse_close),
    (TokenKind::ContinueAsNew, Parser::parse_continue_as_new),
    (TokenKind::Return, Parser::parse_return),
    (TokenKind::Break, Parser::parse_break),
    (TokenKind::Continue, Parser::parse_continue),
    (TokenKind::Comment, Parser::parse_comment),
    (TokenKind::Signal, Parser::parse_misplaced),
    (TokenKind::Query, Parser::parse_misplaced),
    (TokenKind::Update, Parser::parse_misplaced),
    (TokenKind::Timer, Parser::parse_misplaced),
    (TokenKind::Options, Parser::parse_misplaced),
    (TokenKind::Else, Parser::parse_misplaced),
    (TokenKind::Case, Parser::parse_misplaced),
    (TokenKind::Default, Parser::parse_misplaced),
    (TokenKind::Indent, Parser::parse_misplaced),
];

/// Statements allowed in activity bodies and query handlers
const ACTIVITY_BODY: &[(TokenKind, StmtParser)] = &[
    (TokenKind::Switch, Parser::parse_switch),
    (TokenKind::If, Parser::parse_if),
    (TokenKind::For, Parser::parse_for),
    (TokenKind::Return, Parser::parse_return),
    (TokenKind::Break, Parser::parse_break),
    (TokenKind::Continue, Parser::parse_continue),
    (TokenKind::Comment, Parser::parse_comment),
    (TokenKind::Options, Parser::parse_misplaced),
    (TokenKind::Else, Parser::parse_misplaced),
    (TokenKind::Case, Parser::parse_misplaced),
    (TokenKind::Default, Parser::parse_misplaced),
    (TokenKind::Indent, Parser::parse_misplaced),
];

/// Keywords rejected in restricted bodies instead of falling back to raw text
const TEMPORAL_KEYWORDS: &[TokenKind] = &[
    TokenKind::Workflow,
    TokenKind::Activity,
    TokenKind::Signal,
    TokenKind::Query,
    TokenKind::Update,
    TokenKind::Spawn,
    TokenKind::Detach,
    TokenKind::Nexus,
    TokenKind::Timer,
    TokenKind::Await,
    TokenKind::ContinueAsNew,
    TokenKind::Close,
];

/// Keywords that only mean something inside another construct. Followed by
/// an operator they start an ordinary raw line (`default = 1`).
const CONTEXTUAL_KEYWORDS: &[TokenKind] = &[
    TokenKind::Case,
    TokenKind::Default,
    TokenKind::Options,
];

pub(super) fn lookup<F: Copy>(table: &[(TokenKind, F)], kind: TokenKind) -> Option<F> {
    table
        .iter()
        .find(|(entry, _)| *entry == kind)
        .map(|(_, parse)| *parse)
}

impl Parser {
    /// Parse one statement in the given scope
    pub(super) fn parse_statement(&mut self, scope: Scope) -> ParseResult<Statement> {
        let kind = self.peek_kind();
        if CONTEXTUAL_KEYWORDS.contains(&kind) && self.peek_kind_at(1) == TokenKind::Symbol {
            return self.parse_raw(scope);
        }
        if let Some(parse) = lookup(scope.table(), kind) {
            return parse(self, scope);
        }
        if scope.is_restricted() && TEMPORAL_KEYWORDS.contains(&kind) {
            return Err(self.error_here(format!(
                "'{}' is not allowed in {}",
                kind.describe(),
                scope.describe()
            )));
        }
        self.parse_raw(scope)
    }
}
