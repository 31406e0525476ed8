//! Statement parsers: calls, control flow, termination and raw lines

use crate::errors::{ParseError, ParseResult};

use super::ast::{
    ActivityCall, CallMode, CloseReason, CloseStmt, ForKind, ForStmt, IfStmt, Position,
    Statement, SwitchBlock, SwitchCase, WorkflowCall,
};
use super::dispatch::Scope;
use super::token::TokenKind;
use super::Parser;

impl Parser {
    /* ===================== Calls ===================== */

    pub(super) fn parse_activity_call_stmt(&mut self, _scope: Scope) -> ParseResult<Statement> {
        let mut call = self.parse_activity_call()?;
        self.expect_line_end()?;
        call.options = self.parse_call_options()?;
        Ok(Statement::ActivityCall(call))
    }

    pub(super) fn parse_workflow_call_stmt(&mut self, _scope: Scope) -> ParseResult<Statement> {
        let mut call = self.parse_workflow_call()?;
        self.expect_line_end()?;
        call.options = self.parse_call_options()?;
        Ok(Statement::WorkflowCall(call))
    }

    /// `activity Name(args) [-> result]`, without the line end
    pub(super) fn parse_activity_call(&mut self) -> ParseResult<ActivityCall> {
        let keyword = self.expect(TokenKind::Activity, "'activity'")?;
        let name = self.expect_name("activity name")?;
        let args = self.expect_args("argument list after activity name")?;
        let result = self.parse_arrow_target("result binding")?;

        Ok(ActivityCall {
            name,
            args,
            result,
            options: None,
            resolved: None,
            position: keyword.position(),
        })
    }

    /// `[spawn|detach] [nexus "ns"] workflow Name(args) [-> result]`,
    /// without the line end
    pub(super) fn parse_workflow_call(&mut self) -> ParseResult<WorkflowCall> {
        let position = self.position();
        let mode = match self.peek_kind() {
            TokenKind::Spawn => {
                self.advance();
                CallMode::Spawn
            }
            TokenKind::Detach => {
                self.advance();
                CallMode::Detach
            }
            _ => CallMode::Child,
        };

        let namespace = if self.match_token(TokenKind::Nexus) {
            let token = self.expect(TokenKind::String, "quoted namespace after 'nexus'")?;
            Some(unquote(&token.literal))
        } else {
            None
        };

        self.expect(TokenKind::Workflow, "'workflow'")?;
        let name = self.expect_name("workflow name")?;
        let args = self.expect_args("argument list after workflow name")?;

        let arrow = self.position();
        let result = self.parse_arrow_target("result binding")?;
        if mode == CallMode::Detach && result.is_some() {
            return Err(ParseError::new(
                "cannot bind the result of a detached workflow call",
                arrow,
            ));
        }

        Ok(WorkflowCall {
            mode,
            namespace,
            name,
            args,
            result,
            options: None,
            resolved: None,
            position,
        })
    }

    /// A single `options(...)` line indented under a call. Comment lines
    /// between the call and its options are dropped.
    pub(super) fn parse_call_options(&mut self) -> ParseResult<Option<String>> {
        let offset = self.significant_offset();
        if self.peek_kind_at(offset) != TokenKind::Indent {
            return Ok(None);
        }
        self.skip_newlines_and_comments();
        if self.peek_kind_at(1) != TokenKind::Options {
            return Err(self.error_here(
                "unexpected indented block after call; only an options(...) line may follow",
            ));
        }
        self.advance();
        self.advance();
        let options = self.expect_args("'(' after 'options'")?;
        self.expect_line_end()?;

        self.skip_newlines_and_comments();
        if !self.check(TokenKind::Dedent) {
            return Err(self.error_here("only a single options(...) line may follow a call"));
        }
        self.advance();
        Ok(Some(options))
    }

    /* ===================== Control Flow ===================== */

    /// `if (cond):` block, optionally followed by `else:` or `else if`.
    /// Comment lines between the `if` body and `else` open the else body.
    pub(super) fn parse_if(&mut self, scope: Scope) -> ParseResult<Statement> {
        let keyword = self.expect(TokenKind::If, "'if'")?;
        let condition = self.expect_args("condition in parentheses after 'if'")?;
        let body = self.parse_block(scope)?;

        let else_body = if self.peek_kind_at(self.significant_offset()) == TokenKind::Else {
            let mut else_body = self.parse_leading_comments(scope)?;
            self.expect(TokenKind::Else, "'else'")?;
            if self.check(TokenKind::If) {
                else_body.push(self.parse_if(scope)?);
            } else {
                else_body.extend(self.parse_block(scope)?);
            }
            Some(else_body)
        } else {
            None
        };

        Ok(Statement::If(IfStmt {
            condition,
            body,
            else_body,
            position: keyword.position(),
        }))
    }

    /// `for:`, `for (cond):` or `for (var in iterable):`
    pub(super) fn parse_for(&mut self, scope: Scope) -> ParseResult<Statement> {
        let keyword = self.expect(TokenKind::For, "'for'")?;
        let kind = if self.check(TokenKind::Args) {
            let header = self.advance();
            loop_kind(&header.literal, header.position())?
        } else {
            ForKind::Infinite
        };
        let body = self.parse_block(scope)?;

        Ok(Statement::For(ForStmt {
            kind,
            body,
            position: keyword.position(),
        }))
    }

    /// `switch (expr):` with one or more `case` blocks and an optional
    /// trailing `default` block
    pub(super) fn parse_switch(&mut self, scope: Scope) -> ParseResult<Statement> {
        let keyword = self.expect(TokenKind::Switch, "'switch'")?;
        let expr = self.expect_args("expression in parentheses after 'switch'")?;
        self.expect(TokenKind::Colon, "':' after switch expression")?;
        self.expect_line_end()?;
        self.skip_newlines_and_comments();
        if !self.check(TokenKind::Indent) {
            return Err(ParseError::new(
                "switch requires at least one 'case'",
                keyword.position(),
            ));
        }
        self.advance();

        let mut cases = Vec::new();
        let mut default = None;
        loop {
            self.skip_newlines_and_comments();
            match self.peek_kind() {
                TokenKind::Dedent | TokenKind::Eof => break,
                TokenKind::Case => {
                    if default.is_some() {
                        return Err(self.error_here("'case' cannot follow 'default'"));
                    }
                    let case = self.advance();
                    let value = self.parse_case_value()?;
                    let body = self.parse_block(scope)?;
                    cases.push(SwitchCase {
                        value,
                        body,
                        position: case.position(),
                    });
                }
                TokenKind::Default => {
                    if default.is_some() {
                        return Err(self.error_here("switch has more than one 'default'"));
                    }
                    self.advance();
                    default = Some(self.parse_block(scope)?);
                }
                _ => {
                    return Err(self.error_here(format!(
                        "expected 'case' or 'default' in switch block, found {}",
                        self.found()
                    )))
                }
            }
        }
        self.expect(TokenKind::Dedent, "end of switch block")?;

        if cases.is_empty() {
            return Err(ParseError::new(
                "switch requires at least one 'case'",
                keyword.position(),
            ));
        }

        Ok(Statement::Switch(SwitchBlock {
            expr,
            cases,
            default,
            position: keyword.position(),
        }))
    }

    fn parse_case_value(&mut self) -> ParseResult<String> {
        match self.peek_kind() {
            TokenKind::Args | TokenKind::String | TokenKind::Ident => Ok(self.advance().literal),
            _ => Err(self.error_here(format!(
                "expected case value, found {}",
                self.found()
            ))),
        }
    }

    pub(super) fn parse_break(&mut self, _scope: Scope) -> ParseResult<Statement> {
        let keyword = self.expect(TokenKind::Break, "'break'")?;
        self.expect_line_end()?;
        Ok(Statement::Break {
            position: keyword.position(),
        })
    }

    pub(super) fn parse_continue(&mut self, _scope: Scope) -> ParseResult<Statement> {
        let keyword = self.expect(TokenKind::Continue, "'continue'")?;
        self.expect_line_end()?;
        Ok(Statement::Continue {
            position: keyword.position(),
        })
    }

    /* ===================== Termination ===================== */

    /// `close [completed|failed] [(value)]`, main workflow body only
    pub(super) fn parse_close(&mut self, scope: Scope) -> ParseResult<Statement> {
        let keyword = self.expect(TokenKind::Close, "'close'")?;
        if scope != Scope::Workflow {
            return Err(ParseError::new(
                format!(
                    "'close' is not allowed in {}; handlers cannot end the workflow",
                    scope.describe()
                ),
                keyword.position(),
            ));
        }

        let reason = if self.match_token(TokenKind::Completed) {
            CloseReason::Completed
        } else if self.match_token(TokenKind::Failed) {
            CloseReason::Failed
        } else {
            CloseReason::None
        };
        let value = if self.check(TokenKind::Args) {
            Some(self.advance().literal)
        } else {
            None
        };
        self.expect_line_end()?;

        Ok(Statement::Close(CloseStmt {
            reason,
            value,
            position: keyword.position(),
        }))
    }

    /// `continue_as_new[(args)]`, main workflow body only
    pub(super) fn parse_continue_as_new(&mut self, scope: Scope) -> ParseResult<Statement> {
        let keyword = self.expect(TokenKind::ContinueAsNew, "'continue_as_new'")?;
        if scope != Scope::Workflow {
            return Err(ParseError::new(
                format!(
                    "'continue_as_new' is not allowed in {}; handlers cannot end the workflow",
                    scope.describe()
                ),
                keyword.position(),
            ));
        }
        let args = if self.check(TokenKind::Args) {
            self.advance().literal
        } else {
            String::new()
        };
        self.expect_line_end()?;

        Ok(Statement::ContinueAsNew {
            args,
            position: keyword.position(),
        })
    }

    /// `return [value]`; a workflow ends with `close` instead
    pub(super) fn parse_return(&mut self, scope: Scope) -> ParseResult<Statement> {
        let keyword = self.expect(TokenKind::Return, "'return'")?;
        if scope == Scope::Workflow {
            return Err(ParseError::new(
                "'return' is not allowed in a workflow body; use 'close' to end the workflow",
                keyword.position(),
            ));
        }
        let text = self.rest_of_line();
        self.expect_line_end()?;

        Ok(Statement::Return {
            value: (!text.is_empty()).then_some(text),
            position: keyword.position(),
        })
    }

    /* ===================== Everything Else ===================== */

    pub(super) fn parse_comment(&mut self, _scope: Scope) -> ParseResult<Statement> {
        let token = self.expect(TokenKind::Comment, "comment")?;
        self.expect_line_end()?;
        Ok(Statement::Comment {
            text: token.literal.trim().to_string(),
            position: token.position(),
        })
    }

    /// Fallback for lines without a statement keyword (assignments,
    /// expression calls, ...). The line is kept verbatim.
    pub(super) fn parse_raw(&mut self, _scope: Scope) -> ParseResult<Statement> {
        let position = self.position();
        let text = self.rest_of_line();
        if text.is_empty() {
            return Err(self.error_here(format!("unexpected {}", self.found())));
        }
        self.expect_line_end()?;
        Ok(Statement::Raw { text, position })
    }

    /// Keywords that are only valid as part of another construct
    pub(super) fn parse_misplaced(&mut self, scope: Scope) -> ParseResult<Statement> {
        let kind = self.peek_kind();
        let message = match kind {
            TokenKind::Signal | TokenKind::Query | TokenKind::Update if scope == Scope::Workflow => {
                format!(
                    "{} declarations must come before any other statement in a workflow body",
                    kind.describe()
                )
            }
            TokenKind::Signal | TokenKind::Query | TokenKind::Update => format!(
                "{} declarations are only allowed at the top of a workflow body, not in {}",
                kind.describe(),
                scope.describe()
            ),
            TokenKind::Timer => "a timer must be awaited: use 'await timer(...)'".to_string(),
            TokenKind::Options => {
                "options(...) must be indented directly under an activity or workflow call"
                    .to_string()
            }
            TokenKind::Else => "'else' without a matching 'if'".to_string(),
            TokenKind::Case | TokenKind::Default => {
                format!("'{}' outside of a switch block", kind.describe())
            }
            TokenKind::Indent => "unexpected indentation".to_string(),
            _ => format!("unexpected {}", self.found()),
        };
        Err(self.error_here(message))
    }
}

/// Classify a `for` header: a standalone `in` word splits it into loop
/// variable and iterable, anything else is a condition
fn loop_kind(header: &str, position: Position) -> ParseResult<ForKind> {
    let Some(at) = find_in_keyword(header) else {
        let condition = header.trim();
        if condition.is_empty() {
            return Err(ParseError::new(
                "empty loop condition; use 'for:' for an infinite loop",
                position,
            ));
        }
        return Ok(ForKind::Conditional {
            condition: condition.to_string(),
        });
    };

    let variable = header[..at].trim();
    let iterable = header[at + 2..].trim();

    let valid_variable = !variable.is_empty()
        && variable.split(',').map(str::trim).all(|name| {
            !name.is_empty()
                && !name.starts_with(|c: char| c.is_ascii_digit())
                && name.chars().all(|c| c.is_alphanumeric() || c == '_')
        });
    if !valid_variable {
        return Err(ParseError::new(
            format!("invalid loop variable '{}'", variable),
            position,
        ));
    }
    if iterable.is_empty() {
        return Err(ParseError::new("missing iterable after 'in'", position));
    }

    Ok(ForKind::Iteration {
        variable: variable.to_string(),
        iterable: iterable.to_string(),
    })
}

/// Byte offset of the first `in` word outside strings and nested parentheses
fn find_in_keyword(text: &str) -> Option<usize> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let mut depth = 0usize;
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let (offset, c) = chars[i];
        if in_string {
            if c == '\\' {
                i += 1;
            } else if c == '"' {
                in_string = false;
            }
        } else {
            match c {
                '"' => in_string = true,
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                'i' if depth == 0 => {
                    let next = chars.get(i + 1).map(|(_, c)| *c);
                    let after = chars.get(i + 2).map(|(_, c)| *c);
                    let before = i.checked_sub(1).map(|j| chars[j].1);
                    if next == Some('n')
                        && !before.is_some_and(is_word)
                        && !after.is_some_and(is_word)
                    {
                        return Some(offset);
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }
    None
}

fn unquote(literal: &str) -> String {
    let mut chars = literal.chars();
    match (chars.next(), chars.next_back()) {
        (Some('"'), Some('"')) => {
            chars.as_str().to_string()
        }
        _ => literal.to_string(),
    }
}
