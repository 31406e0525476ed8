//! Rule: Unreachable Code
//!
//! Warns about statements that follow `close`, `return`, `continue_as_new`,
//! `break` or `continue` in the same block. Comments don't count. Only the
//! first unreachable statement of each block is reported.

use crate::parser::ast::{Program, Statement};

use super::super::{for_each_block, root_bodies, ValidationError, ValidationRule};

pub struct UnreachableCodeRule;

impl ValidationRule for UnreachableCodeRule {
    fn id(&self) -> &'static str {
        "unreachable-code"
    }

    fn description(&self) -> &'static str {
        "statements after close, return, continue_as_new, break or continue never run"
    }

    fn validate(&self, program: &Program) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        for body in root_bodies(program) {
            for_each_block(body, &mut |block| {
                if let Some(error) = check_block(block, self.id()) {
                    errors.push(error);
                }
            });
        }
        errors
    }
}

fn check_block(block: &[Statement], rule_id: &'static str) -> Option<ValidationError> {
    let mut statements = block.iter().filter(|s| !s.is_comment());
    let exit = statements.by_ref().find_map(exit_keyword)?;
    let unreachable = statements.next()?;
    Some(ValidationError::warning(
        unreachable.position(),
        format!("unreachable statement after '{}'", exit),
        rule_id,
    ))
}

/// Keyword of a statement that leaves the current block
fn exit_keyword(statement: &Statement) -> Option<&'static str> {
    match statement {
        Statement::Close(_) => Some("close"),
        Statement::Return { .. } => Some("return"),
        Statement::ContinueAsNew { .. } => Some("continue_as_new"),
        Statement::Break { .. } => Some("break"),
        Statement::Continue { .. } => Some("continue"),
        _ => None,
    }
}
