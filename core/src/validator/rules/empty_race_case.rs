//! Rule: Empty Race Case
//!
//! Hints at an `await one` where no case has a body, binds a result, or
//! nests an `await all`. Such a race completes, but nothing afterwards can
//! tell which case won.
//!
//! # Flagged
//!
//! ```weft
//! await one:
//!     signal approve:
//!     timer(1h):
//! ```

use crate::parser::ast::{AwaitOneCase, CaseTarget, Program, Statement};

use super::super::{for_each_block, root_bodies, ValidationError, ValidationRule};

pub struct EmptyRaceCaseRule;

impl ValidationRule for EmptyRaceCaseRule {
    fn id(&self) -> &'static str {
        "empty-race-case"
    }

    fn description(&self) -> &'static str {
        "an await one race should let the program tell which case won"
    }

    fn validate(&self, program: &Program) -> Vec<ValidationError> {
        let mut hints = Vec::new();
        for body in root_bodies(program) {
            for_each_block(body, &mut |block| {
                for statement in block {
                    let Statement::AwaitOne(race) = statement else {
                        continue;
                    };
                    if race.cases.len() > 1 && race.cases.iter().all(is_silent) {
                        hints.push(ValidationError::hint(
                            race.position,
                            "no case of this 'await one' has a body or a binding; \
                             the winning case cannot be told apart",
                            self.id(),
                        ));
                    }
                }
            });
        }
        hints
    }
}

fn is_silent(case: &AwaitOneCase) -> bool {
    let has_body = case
        .body
        .as_ref()
        .is_some_and(|body| body.iter().any(|s| !s.is_comment()));
    let observable = match &case.target {
        CaseTarget::Signal(event) | CaseTarget::Update(event) => event.binding.is_some(),
        CaseTarget::Activity(call) => call.result.is_some(),
        CaseTarget::Workflow(call) => call.result.is_some(),
        CaseTarget::Timer { .. } => false,
        CaseTarget::AwaitAll { .. } => true,
    };
    !has_body && !observable
}
