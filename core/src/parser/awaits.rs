//! `await` statements: single targets, `await all` joins and `await one` races

use crate::errors::{ParseError, ParseResult};

use super::ast::{
    AwaitAllBlock, AwaitOneBlock, AwaitOneCase, AwaitStmt, AwaitTarget, CallMode, CaseTarget,
    EventRef, Position, Statement, WorkflowCall,
};
use super::dispatch::Scope;
use super::token::TokenKind;
use super::Parser;

impl Parser {
    pub(super) fn parse_await(&mut self, scope: Scope) -> ParseResult<Statement> {
        let keyword = self.expect(TokenKind::Await, "'await'")?;
        let position = keyword.position();

        let target = match self.peek_kind() {
            TokenKind::All => {
                self.advance();
                let body = self.parse_block(scope)?;
                return Ok(Statement::AwaitAll(AwaitAllBlock { body, position }));
            }
            TokenKind::One => {
                self.advance();
                return self.parse_await_one(scope, position);
            }
            TokenKind::Timer => {
                self.advance();
                let duration = self.expect_args("'(duration)' after 'timer'")?;
                self.expect_line_end()?;
                AwaitTarget::Timer { duration }
            }
            TokenKind::Signal => {
                self.advance();
                let event = self.parse_event_ref("signal name")?;
                self.expect_line_end()?;
                AwaitTarget::Signal(event)
            }
            TokenKind::Update => {
                self.advance();
                let event = self.parse_event_ref("update name")?;
                self.expect_line_end()?;
                AwaitTarget::Update(event)
            }
            TokenKind::Activity => {
                let mut call = self.parse_activity_call()?;
                self.expect_line_end()?;
                call.options = self.parse_call_options()?;
                AwaitTarget::Activity(call)
            }
            TokenKind::Workflow | TokenKind::Nexus | TokenKind::Spawn | TokenKind::Detach => {
                let mut call = self.parse_awaited_workflow_call()?;
                self.expect_line_end()?;
                call.options = self.parse_call_options()?;
                AwaitTarget::Workflow(call)
            }
            _ => {
                return Err(self.error_here(format!(
                    "expected 'all', 'one', 'timer', 'signal', 'update', 'activity' or \
                     'workflow' after 'await', found {}",
                    self.found()
                )))
            }
        };

        Ok(Statement::Await(AwaitStmt { target, position }))
    }

    /// `name [-> binding]` after `signal` or `update`
    fn parse_event_ref(&mut self, expected: &str) -> ParseResult<EventRef> {
        let position = self.position();
        let name = self.expect_name(expected)?;
        let binding = self.parse_arrow_target("binding name")?;
        Ok(EventRef {
            name,
            binding,
            resolved: None,
            position,
        })
    }

    /// Only plain child calls can be awaited; a spawned or detached call
    /// returns immediately
    fn parse_awaited_workflow_call(&mut self) -> ParseResult<WorkflowCall> {
        let call = self.parse_workflow_call()?;
        if call.mode != CallMode::Child {
            return Err(ParseError::new(
                "only child workflow calls can be awaited; drop 'spawn'/'detach'",
                call.position,
            ));
        }
        Ok(call)
    }

    fn parse_await_one(&mut self, scope: Scope, position: Position) -> ParseResult<Statement> {
        self.expect(TokenKind::Colon, "':' after 'await one'")?;
        self.expect_line_end()?;
        self.skip_newlines_and_comments();
        if !self.check(TokenKind::Indent) {
            return Err(ParseError::new(
                "'await one' requires at least one case",
                position,
            ));
        }
        self.advance();

        let mut cases = Vec::new();
        loop {
            self.skip_newlines_and_comments();
            if self.check(TokenKind::Dedent) || self.at_eof() {
                break;
            }
            cases.push(self.parse_await_one_case(scope)?);
        }
        self.expect(TokenKind::Dedent, "end of 'await one' block")?;

        if cases.is_empty() {
            return Err(ParseError::new(
                "'await one' requires at least one case",
                position,
            ));
        }
        Ok(Statement::AwaitOne(AwaitOneBlock { cases, position }))
    }

    fn parse_await_one_case(&mut self, scope: Scope) -> ParseResult<AwaitOneCase> {
        let position = self.position();
        let target = match self.peek_kind() {
            TokenKind::Signal => {
                self.advance();
                CaseTarget::Signal(self.parse_event_ref("signal name")?)
            }
            TokenKind::Update => {
                self.advance();
                CaseTarget::Update(self.parse_event_ref("update name")?)
            }
            TokenKind::Timer => {
                self.advance();
                let duration = self.expect_args("'(duration)' after 'timer'")?;
                CaseTarget::Timer { duration }
            }
            TokenKind::Activity => CaseTarget::Activity(self.parse_activity_call()?),
            TokenKind::Workflow | TokenKind::Nexus | TokenKind::Spawn | TokenKind::Detach => {
                CaseTarget::Workflow(self.parse_awaited_workflow_call()?)
            }
            TokenKind::Await => {
                self.advance();
                self.expect(TokenKind::All, "'all' (only 'await all' may race as a case)")?;
                let body = self.parse_block(scope)?;
                return Ok(AwaitOneCase {
                    target: CaseTarget::AwaitAll { body },
                    body: None,
                    position,
                });
            }
            _ => {
                return Err(self.error_here(format!(
                    "expected an 'await one' case (signal, update, timer, activity, workflow \
                     or 'await all'), found {}",
                    self.found()
                )))
            }
        };

        let body = self.parse_optional_block(scope)?;
        Ok(AwaitOneCase {
            target,
            body,
            position,
        })
    }
}
