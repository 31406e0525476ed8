//! Two-pass name resolution
//!
//! Pass 1 collects every top-level workflow and activity into name maps,
//! reporting repeated names. Pass 2 walks each workflow: its main body and
//! the bodies of its signal, query and update handlers. Every call and
//! awaited signal/update is linked to its declaration by filling in the
//! node's `resolved` handle; names that match nothing are reported.
//!
//! Resolution never stops early: every error is collected and returned.


use std::collections::HashMap;

use tracing::{debug, trace};

use crate::errors::{ResolveError, SymbolKind};
use crate::parser::ast::{
    ActivityCall, AwaitTarget, CaseTarget, DeclRef, DefId, Definition, EventRef, Position,
    Program, Statement, WorkflowCall, WorkflowDef,
};

/// Link every call and await site in `program` to its declaration
pub fn resolve(program: &mut Program) -> Vec<ResolveError> {
    let mut errors = Vec::new();
    let globals = GlobalScope::collect(program, &mut errors);
    debug!(
        workflows = globals.workflows.len(),
        activities = globals.activities.len(),
        "collected definitions"
    );

    for (index, definition) in program.definitions.iter_mut().enumerate() {
        let Definition::Workflow(workflow) = definition else {
            continue;
        };
        let id = DefId(index);
        let locals = LocalScope::collect(id, workflow, &mut errors);

        let mut walker = BodyResolver {
            globals: &globals,
            locals: &locals,
            errors: &mut errors,
        };
        trace!(workflow = %workflow.name, "resolving workflow");
        walker.walk(&mut workflow.body);
        for signal in &mut workflow.signals {
            walker.walk(&mut signal.body);
        }
        for query in &mut workflow.queries {
            walker.walk(&mut query.body);
        }
        for update in &mut workflow.updates {
            walker.walk(&mut update.body);
        }
    }

    debug!(errors = errors.len(), "resolution finished");
    errors
}

/* ===================== Pass 1: Definitions ===================== */

#[derive(Debug, Default)]
struct GlobalScope {
    workflows: HashMap<String, DefId>,
    activities: HashMap<String, DefId>,
}

impl GlobalScope {
    /// First definition of a name wins; later ones are reported
    fn collect(program: &Program, errors: &mut Vec<ResolveError>) -> Self {
        let mut scope = Self::default();
        for (index, definition) in program.definitions.iter().enumerate() {
            let (map, kind) = match definition {
                Definition::Workflow(_) => (&mut scope.workflows, SymbolKind::Workflow),
                Definition::Activity(_) => (&mut scope.activities, SymbolKind::Activity),
            };
            let name = definition.name();
            if map.contains_key(name) {
                errors.push(ResolveError::DuplicateDefinition {
                    kind,
                    name: name.to_string(),
                    position: definition.position(),
                });
            } else {
                map.insert(name.to_string(), DefId(index));
            }
        }
        scope
    }
}

/* ===================== Pass 2: Workflow Scopes ===================== */

/// Signals, queries and updates declared by one workflow. References to
/// another workflow's declarations never resolve.
#[derive(Debug)]
struct LocalScope {
    workflow: DefId,
    signals: HashMap<String, usize>,
    updates: HashMap<String, usize>,
}

impl LocalScope {
    fn collect(workflow: DefId, def: &WorkflowDef, errors: &mut Vec<ResolveError>) -> Self {
        let signals = declaration_map(
            def,
            SymbolKind::Signal,
            def.signals.iter().map(|s| (s.name.as_str(), s.position)),
            errors,
        );
        // queries are never awaited, but repeated names are still reported
        declaration_map(
            def,
            SymbolKind::Query,
            def.queries.iter().map(|q| (q.name.as_str(), q.position)),
            errors,
        );
        let updates = declaration_map(
            def,
            SymbolKind::Update,
            def.updates.iter().map(|u| (u.name.as_str(), u.position)),
            errors,
        );

        Self {
            workflow,
            signals,
            updates,
        }
    }

    fn signal(&self, name: &str) -> Option<DeclRef> {
        self.signals.get(name).map(|&index| DeclRef {
            workflow: self.workflow,
            index,
        })
    }

    fn update(&self, name: &str) -> Option<DeclRef> {
        self.updates.get(name).map(|&index| DeclRef {
            workflow: self.workflow,
            index,
        })
    }
}

fn declaration_map<'a>(
    def: &WorkflowDef,
    kind: SymbolKind,
    declarations: impl Iterator<Item = (&'a str, Position)>,
    errors: &mut Vec<ResolveError>,
) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (index, (name, position)) in declarations.enumerate() {
        if map.contains_key(name) {
            errors.push(ResolveError::DuplicateDeclaration {
                kind,
                name: name.to_string(),
                workflow: def.name.clone(),
                position,
            });
        } else {
            map.insert(name.to_string(), index);
        }
    }
    map
}

/* ===================== Body Walk ===================== */

struct BodyResolver<'a> {
    globals: &'a GlobalScope,
    locals: &'a LocalScope,
    errors: &'a mut Vec<ResolveError>,
}

impl BodyResolver<'_> {
    fn walk(&mut self, body: &mut [Statement]) {
        for statement in body {
            self.statement(statement);
        }
    }

    fn statement(&mut self, statement: &mut Statement) {
        match statement {
            Statement::ActivityCall(call) => self.activity_call(call),
            Statement::WorkflowCall(call) => self.workflow_call(call),
            Statement::Await(stmt) => match &mut stmt.target {
                AwaitTarget::Timer { .. } => {}
                AwaitTarget::Signal(event) => self.signal(event),
                AwaitTarget::Update(event) => self.update(event),
                AwaitTarget::Activity(call) => self.activity_call(call),
                AwaitTarget::Workflow(call) => self.workflow_call(call),
            },
            Statement::AwaitAll(block) => self.walk(&mut block.body),
            Statement::AwaitOne(block) => {
                for case in &mut block.cases {
                    match &mut case.target {
                        CaseTarget::Timer { .. } => {}
                        CaseTarget::Signal(event) => self.signal(event),
                        CaseTarget::Update(event) => self.update(event),
                        CaseTarget::Activity(call) => self.activity_call(call),
                        CaseTarget::Workflow(call) => self.workflow_call(call),
                        CaseTarget::AwaitAll { body } => self.walk(body),
                    }
                    if let Some(body) = &mut case.body {
                        self.walk(body);
                    }
                }
            }
            Statement::Switch(block) => {
                for case in &mut block.cases {
                    self.walk(&mut case.body);
                }
                if let Some(default) = &mut block.default {
                    self.walk(default);
                }
            }
            Statement::If(stmt) => {
                self.walk(&mut stmt.body);
                if let Some(else_body) = &mut stmt.else_body {
                    self.walk(else_body);
                }
            }
            Statement::For(stmt) => self.walk(&mut stmt.body),
            Statement::Close(_)
            | Statement::Return { .. }
            | Statement::Break { .. }
            | Statement::Continue { .. }
            | Statement::ContinueAsNew { .. }
            | Statement::Raw { .. }
            | Statement::Comment { .. } => {}
        }
    }

    fn activity_call(&mut self, call: &mut ActivityCall) {
        call.resolved = self.globals.activities.get(&call.name).copied();
        if call.resolved.is_none() {
            self.undefined(SymbolKind::Activity, &call.name, call.position);
        }
    }

    fn workflow_call(&mut self, call: &mut WorkflowCall) {
        // the target lives in another namespace
        if call.namespace.is_some() {
            return;
        }
        call.resolved = self.globals.workflows.get(&call.name).copied();
        if call.resolved.is_none() {
            self.undefined(SymbolKind::Workflow, &call.name, call.position);
        }
    }

    fn signal(&mut self, event: &mut EventRef) {
        event.resolved = self.locals.signal(&event.name);
        if event.resolved.is_none() {
            self.undefined(SymbolKind::Signal, &event.name, event.position);
        }
    }

    fn update(&mut self, event: &mut EventRef) {
        event.resolved = self.locals.update(&event.name);
        if event.resolved.is_none() {
            self.undefined(SymbolKind::Update, &event.name, event.position);
        }
    }

    fn undefined(&mut self, kind: SymbolKind, name: &str, position: Position) {
        trace!(%kind, name, line = position.line, "unresolved reference");
        self.errors.push(ResolveError::Undefined {
            kind,
            name: name.to_string(),
            position,
        });
    }
}
