//! Lints over a parsed program
//!
//! Each rule in [`rules`] looks at the whole [`Program`] and reports what the
//! grammar accepts but is still wrong or suspicious: loop control outside a
//! loop, code after the flow has left a block, races whose winner is
//! invisible. Lints carry a [`Severity`]; only `Error` lints fail `weft check`.

pub mod rules;

use std::fmt;

use serde::Serialize;

use crate::parser::ast::{Definition, Position, Program, Statement};

// ============================================================================
// Findings
// ============================================================================

/// One lint, tagged with the id of the rule that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub position: Position,
    pub message: String,
    pub severity: Severity,
    pub rule_id: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Hint,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Hint => "hint",
        })
    }
}

impl ValidationError {
    fn new(
        severity: Severity,
        position: Position,
        message: impl Into<String>,
        rule_id: &'static str,
    ) -> Self {
        Self {
            position,
            message: message.into(),
            severity,
            rule_id,
        }
    }

    pub fn error(position: Position, message: impl Into<String>, rule_id: &'static str) -> Self {
        Self::new(Severity::Error, position, message, rule_id)
    }

    pub fn warning(position: Position, message: impl Into<String>, rule_id: &'static str) -> Self {
        Self::new(Severity::Warning, position, message, rule_id)
    }

    pub fn hint(position: Position, message: impl Into<String>, rule_id: &'static str) -> Self {
        Self::new(Severity::Hint, position, message, rule_id)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at line {}, col {}: {} [{}]",
            self.severity, self.position.line, self.position.column, self.message, self.rule_id
        )
    }
}

impl std::error::Error for ValidationError {}

// ============================================================================
// Rules
// ============================================================================

/// A lint over the whole program. Rules are independent of each other.
pub trait ValidationRule: Send + Sync {
    /// Stable id shown in output, e.g. `loop-control`
    fn id(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn validate(&self, program: &Program) -> Vec<ValidationError>;
}

/// The registered rules, run in order
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(rules::LoopControlRule),
                Box::new(rules::UnreachableCodeRule),
                Box::new(rules::EmptyRaceCaseRule),
            ],
        }
    }

    pub fn validate(&self, program: &Program) -> Vec<ValidationError> {
        self.rules
            .iter()
            .flat_map(|rule| rule.validate(program))
            .collect()
    }

    /// (id, description) of every registered rule
    pub fn rules(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.rules.iter().map(|r| (r.id(), r.description()))
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Traversal Helpers
// ============================================================================

/// Every top-level statement list in the program: workflow main bodies,
/// handler bodies and activity bodies
pub(crate) fn root_bodies(program: &Program) -> Vec<&[Statement]> {
    let mut bodies: Vec<&[Statement]> = Vec::new();
    for definition in &program.definitions {
        match definition {
            Definition::Workflow(wf) => {
                bodies.push(&wf.body);
                bodies.extend(wf.signals.iter().map(|s| s.body.as_slice()));
                bodies.extend(wf.queries.iter().map(|q| q.body.as_slice()));
                bodies.extend(wf.updates.iter().map(|u| u.body.as_slice()));
            }
            Definition::Activity(act) => bodies.push(&act.body),
        }
    }
    bodies
}

/// Call `visit` on `body` and on every statement list nested inside it
pub(crate) fn for_each_block<'a>(body: &'a [Statement], visit: &mut dyn FnMut(&'a [Statement])) {
    visit(body);
    for statement in body {
        for nested in statement.nested_blocks() {
            for_each_block(nested, visit);
        }
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Run every built-in rule over `program`
pub fn validate_program(program: &Program) -> Vec<ValidationError> {
    Validator::new().validate(program)
}

/// Check if a program has any Error-severity findings
pub fn has_errors(program: &Program) -> bool {
    validate_program(program).iter().any(|e| e.is_error())
}
