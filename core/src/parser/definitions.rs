//! Top-level definitions and workflow declarations

use crate::errors::ParseResult;

use super::ast::{ActivityDef, Definition, QueryDecl, SignalDecl, UpdateDecl, WorkflowDef};
use super::dispatch::Scope;
use super::token::TokenKind;
use super::Parser;

impl Parser {
    /// `workflow Name(params) [-> (Ret)]:` followed by an indented body.
    ///
    /// Signal, query and update declarations are only accepted before the
    /// first ordinary statement of the body.
    pub(super) fn parse_workflow_def(&mut self) -> ParseResult<Definition> {
        let keyword = self.expect(TokenKind::Workflow, "'workflow'")?;
        let name = self.expect_name("workflow name")?;
        let params = self.expect_args("parameter list after workflow name")?;
        let return_type = self.parse_arrow_target("return type")?;
        self.expect(TokenKind::Colon, "':' after workflow signature")?;
        self.expect_line_end()?;

        let mut body = self.parse_leading_comments(Scope::Workflow)?;
        let indent = self.expect(TokenKind::Indent, "an indented workflow body")?;
        let options = self.parse_definition_options()?;

        let mut workflow = WorkflowDef {
            name,
            params,
            return_type,
            options,
            signals: Vec::new(),
            queries: Vec::new(),
            updates: Vec::new(),
            body: Vec::new(),
            position: keyword.position(),
        };

        loop {
            self.skip_newlines();
            match self.peek_kind() {
                TokenKind::Comment if !self.outdented_comment(indent.column) => {
                    body.push(self.parse_comment(Scope::Workflow)?)
                }
                TokenKind::Signal => workflow.signals.push(self.parse_signal_decl()?),
                TokenKind::Query => workflow.queries.push(self.parse_query_decl()?),
                TokenKind::Update => workflow.updates.push(self.parse_update_decl()?),
                _ => break,
            }
        }

        self.parse_statements(Scope::Workflow, indent.column, &mut body)?;
        self.expect(TokenKind::Dedent, "end of workflow body")?;
        workflow.body = body;

        Ok(Definition::Workflow(workflow))
    }

    /// `activity Name(params) [-> (Ret)]:` followed by an indented body
    pub(super) fn parse_activity_def(&mut self) -> ParseResult<Definition> {
        let keyword = self.expect(TokenKind::Activity, "'activity'")?;
        let name = self.expect_name("activity name")?;
        let params = self.expect_args("parameter list after activity name")?;
        let return_type = self.parse_arrow_target("return type")?;
        self.expect(TokenKind::Colon, "':' after activity signature")?;
        self.expect_line_end()?;

        let mut body = self.parse_leading_comments(Scope::Activity)?;
        let indent = self.expect(TokenKind::Indent, "an indented activity body")?;
        let options = self.parse_definition_options()?;
        self.parse_statements(Scope::Activity, indent.column, &mut body)?;
        self.expect(TokenKind::Dedent, "end of activity body")?;

        Ok(Definition::Activity(ActivityDef {
            name,
            params,
            return_type,
            options,
            body,
            position: keyword.position(),
        }))
    }

    /// An `options(...)` line opening a definition body
    fn parse_definition_options(&mut self) -> ParseResult<Option<String>> {
        if !self.check(TokenKind::Options) || self.peek_kind_at(1) == TokenKind::Symbol {
            return Ok(None);
        }
        self.advance();
        let options = self.expect_args("'(' after 'options'")?;
        self.expect_line_end()?;
        Ok(Some(options))
    }

    fn parse_signal_decl(&mut self) -> ParseResult<SignalDecl> {
        let keyword = self.expect(TokenKind::Signal, "'signal'")?;
        let name = self.expect_name("signal name")?;
        let params = self.expect_args("parameter list after signal name")?;
        if self.check(TokenKind::Arrow) {
            return Err(self.error_here(format!(
                "signal '{}' cannot declare a return type",
                name
            )));
        }
        let body = self.parse_block(Scope::Signal)?;

        Ok(SignalDecl {
            name,
            params,
            body,
            position: keyword.position(),
        })
    }

    fn parse_query_decl(&mut self) -> ParseResult<QueryDecl> {
        let keyword = self.expect(TokenKind::Query, "'query'")?;
        let name = self.expect_name("query name")?;
        let params = self.expect_args("parameter list after query name")?;
        let Some(return_type) = self.parse_arrow_target("return type")? else {
            return Err(self.error_here(format!(
                "query '{}' must declare a return type",
                name
            )));
        };
        let body = self.parse_block(Scope::Query)?;

        Ok(QueryDecl {
            name,
            params,
            return_type,
            body,
            position: keyword.position(),
        })
    }

    fn parse_update_decl(&mut self) -> ParseResult<UpdateDecl> {
        let keyword = self.expect(TokenKind::Update, "'update'")?;
        let name = self.expect_name("update name")?;
        let params = self.expect_args("parameter list after update name")?;
        let Some(return_type) = self.parse_arrow_target("return type")? else {
            return Err(self.error_here(format!(
                "update '{}' must declare a return type",
                name
            )));
        };
        let body = self.parse_block(Scope::Update)?;

        Ok(UpdateDecl {
            name,
            params,
            return_type,
            body,
            position: keyword.position(),
        })
    }
}
