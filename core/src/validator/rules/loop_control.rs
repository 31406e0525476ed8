//! Rule: Loop Control
//!
//! Reports an error when `break` or `continue` appears outside of any `for`
//! loop. Handler bodies start outside a loop even when the workflow body
//! around them is looping.
//!
//! # Valid
//!
//! ```weft
//! for (item in items):
//!     if (item.skip):
//!         continue
//! ```
//!
//! # Invalid
//!
//! ```weft
//! if (done):
//!     break
//! ```

use crate::parser::ast::{Program, Statement};

use super::super::{root_bodies, ValidationError, ValidationRule};

pub struct LoopControlRule;

impl ValidationRule for LoopControlRule {
    fn id(&self) -> &'static str {
        "loop-control"
    }

    fn description(&self) -> &'static str {
        "break and continue must be inside a for loop"
    }

    fn validate(&self, program: &Program) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        for body in root_bodies(program) {
            check_body(body, false, &mut errors, self.id());
        }
        errors
    }
}

fn check_body(
    body: &[Statement],
    in_loop: bool,
    errors: &mut Vec<ValidationError>,
    rule_id: &'static str,
) {
    for statement in body {
        match statement {
            Statement::Break { position } if !in_loop => {
                errors.push(ValidationError::error(
                    *position,
                    "'break' outside of a loop",
                    rule_id,
                ));
            }
            Statement::Continue { position } if !in_loop => {
                errors.push(ValidationError::error(
                    *position,
                    "'continue' outside of a loop",
                    rule_id,
                ));
            }
            Statement::For(stmt) => check_body(&stmt.body, true, errors, rule_id),
            other => {
                for nested in other.nested_blocks() {
                    check_body(nested, in_loop, errors, rule_id);
                }
            }
        }
    }
}
