//! Abstract Syntax Tree node types
//!
//! Definitions and statements are sum types. Every node carries the
//! [`Position`] of its first token. The serialized form uses a `"type"`
//! discriminant per node kind (`"workflowDef"`, `"activityCall"`,
//! `"awaitOne"`, ...) and camelCase field names; editor tooling depends on
//! both staying stable.

use serde::Serialize;

/// Source location (1-based line and column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/* ===================== Resolved References ===================== */

/// Handle to a top-level definition: its index in [`Program::definitions`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DefId(pub usize);

/// Handle to a signal, query or update declared on a workflow.
///
/// `index` points into the workflow's `signals`, `queries` or `updates`
/// list; which one follows from the site holding the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DeclRef {
    pub workflow: DefId,
    pub index: usize,
}

/* ===================== Program & Definitions ===================== */

/// A parsed source file (or several files joined together)
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Program {
    pub definitions: Vec<Definition>,
}

impl Program {
    pub fn get(&self, id: DefId) -> Option<&Definition> {
        self.definitions.get(id.0)
    }

    pub fn workflows(&self) -> impl Iterator<Item = &WorkflowDef> + '_ {
        self.definitions.iter().filter_map(|def| match def {
            Definition::Workflow(wf) => Some(wf),
            Definition::Activity(_) => None,
        })
    }

    pub fn activities(&self) -> impl Iterator<Item = &ActivityDef> + '_ {
        self.definitions.iter().filter_map(|def| match def {
            Definition::Activity(act) => Some(act),
            Definition::Workflow(_) => None,
        })
    }

    /// The signal a resolved reference points at
    pub fn signal(&self, decl: DeclRef) -> Option<&SignalDecl> {
        match self.get(decl.workflow)? {
            Definition::Workflow(wf) => wf.signals.get(decl.index),
            Definition::Activity(_) => None,
        }
    }

    /// The update a resolved reference points at
    pub fn update(&self, decl: DeclRef) -> Option<&UpdateDecl> {
        match self.get(decl.workflow)? {
            Definition::Workflow(wf) => wf.updates.get(decl.index),
            Definition::Activity(_) => None,
        }
    }
}

/// Top-level definition
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Definition {
    #[serde(rename = "workflowDef")]
    Workflow(WorkflowDef),
    #[serde(rename = "activityDef")]
    Activity(ActivityDef),
}

impl Definition {
    pub fn name(&self) -> &str {
        match self {
            Definition::Workflow(wf) => &wf.name,
            Definition::Activity(act) => &act.name,
        }
    }

    pub fn position(&self) -> Position {
        match self {
            Definition::Workflow(wf) => wf.position,
            Definition::Activity(act) => act.position,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDef {
    pub name: String,
    pub params: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
    pub signals: Vec<SignalDecl>,
    pub queries: Vec<QueryDecl>,
    pub updates: Vec<UpdateDecl>,
    pub body: Vec<Statement>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDef {
    pub name: String,
    pub params: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
    pub body: Vec<Statement>,
    pub position: Position,
}

/* ===================== Declarations ===================== */

/// `signal name(params):` handler. Mutates state, cannot end the workflow.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalDecl {
    pub name: String,
    pub params: String,
    pub body: Vec<Statement>,
    pub position: Position,
}

/// `query name(params) -> (T):` handler. Read-only, restricted body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDecl {
    pub name: String,
    pub params: String,
    pub return_type: String,
    pub body: Vec<Statement>,
    pub position: Position,
}

/// `update name(params) -> (T):` handler. Mutates state and answers the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDecl {
    pub name: String,
    pub params: String,
    pub return_type: String,
    pub body: Vec<Statement>,
    pub position: Position,
}

/* ===================== Statements ===================== */

/// Statement AST node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Statement {
    ActivityCall(ActivityCall),
    WorkflowCall(WorkflowCall),
    Await(AwaitStmt),
    AwaitAll(AwaitAllBlock),
    AwaitOne(AwaitOneBlock),
    Switch(SwitchBlock),
    If(IfStmt),
    For(ForStmt),
    Close(CloseStmt),
    Return {
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<String>,
        position: Position,
    },
    Break {
        position: Position,
    },
    Continue {
        position: Position,
    },
    ContinueAsNew {
        args: String,
        position: Position,
    },
    /// Any line that does not start with a recognized keyword
    Raw {
        text: String,
        position: Position,
    },
    Comment {
        text: String,
        position: Position,
    },
}

impl Statement {
    pub fn position(&self) -> Position {
        match self {
            Statement::ActivityCall(call) => call.position,
            Statement::WorkflowCall(call) => call.position,
            Statement::Await(stmt) => stmt.position,
            Statement::AwaitAll(block) => block.position,
            Statement::AwaitOne(block) => block.position,
            Statement::Switch(block) => block.position,
            Statement::If(stmt) => stmt.position,
            Statement::For(stmt) => stmt.position,
            Statement::Close(stmt) => stmt.position,
            Statement::Return { position, .. }
            | Statement::Break { position }
            | Statement::Continue { position }
            | Statement::ContinueAsNew { position, .. }
            | Statement::Raw { position, .. }
            | Statement::Comment { position, .. } => *position,
        }
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, Statement::Comment { .. })
    }

    /// Statement lists nested directly inside this statement, in source order
    pub fn nested_blocks(&self) -> Vec<&[Statement]> {
        match self {
            Statement::AwaitAll(block) => vec![block.body.as_slice()],
            Statement::AwaitOne(block) => block
                .cases
                .iter()
                .flat_map(|case| {
                    let mut blocks: Vec<&[Statement]> = Vec::new();
                    if let CaseTarget::AwaitAll { body } = &case.target {
                        blocks.push(body);
                    }
                    if let Some(body) = &case.body {
                        blocks.push(body);
                    }
                    blocks
                })
                .collect(),
            Statement::Switch(block) => {
                let mut blocks: Vec<&[Statement]> =
                    block.cases.iter().map(|c| c.body.as_slice()).collect();
                if let Some(default) = &block.default {
                    blocks.push(default);
                }
                blocks
            }
            Statement::If(stmt) => {
                let mut blocks: Vec<&[Statement]> = vec![stmt.body.as_slice()];
                if let Some(else_body) = &stmt.else_body {
                    blocks.push(else_body);
                }
                blocks
            }
            Statement::For(stmt) => vec![stmt.body.as_slice()],
            Statement::ActivityCall(_)
            | Statement::WorkflowCall(_)
            | Statement::Await(_)
            | Statement::Close(_)
            | Statement::Return { .. }
            | Statement::Break { .. }
            | Statement::Continue { .. }
            | Statement::ContinueAsNew { .. }
            | Statement::Raw { .. }
            | Statement::Comment { .. } => Vec::new(),
        }
    }
}

/// `activity Name(args) [-> result]`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityCall {
    pub name: String,
    pub args: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<DefId>,
    pub position: Position,
}

/// How a child workflow is started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallMode {
    /// Run and wait for the result
    Child,
    /// Start and keep a handle
    Spawn,
    /// Fire and forget
    Detach,
}

/// `[spawn|detach] [nexus "ns"] workflow Name(args) [-> result]`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowCall {
    pub mode: CallMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub name: String,
    pub args: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<DefId>,
    pub position: Position,
}

/// Single `await <target>`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AwaitStmt {
    pub target: AwaitTarget,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AwaitTarget {
    Timer {
        duration: String,
    },
    Signal(EventRef),
    Update(EventRef),
    Activity(ActivityCall),
    Workflow(WorkflowCall),
}

/// Reference to a signal or update on the enclosing workflow
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRef {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<DeclRef>,
    pub position: Position,
}

/// `await all:` - every member runs concurrently, the block ends when all finish
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AwaitAllBlock {
    pub body: Vec<Statement>,
    pub position: Position,
}

/// `await one:` - the first case to complete wins
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AwaitOneBlock {
    pub cases: Vec<AwaitOneCase>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AwaitOneCase {
    pub target: CaseTarget,
    /// Statements run when this case wins; `None` when the case has no block
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Vec<Statement>>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CaseTarget {
    Signal(EventRef),
    Update(EventRef),
    Timer { duration: String },
    Activity(ActivityCall),
    Workflow(WorkflowCall),
    /// Nested `await all:` racing as a single branch
    AwaitAll { body: Vec<Statement> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchBlock {
    pub expr: String,
    pub cases: Vec<SwitchCase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Vec<Statement>>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchCase {
    pub value: String,
    pub body: Vec<Statement>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IfStmt {
    pub condition: String,
    pub body: Vec<Statement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub else_body: Option<Vec<Statement>>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForStmt {
    pub kind: ForKind,
    pub body: Vec<Statement>,
    pub position: Position,
}

/// Loop header variants
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "loop", rename_all = "camelCase")]
pub enum ForKind {
    /// `for:`
    Infinite,
    /// `for (cond):`
    Conditional { condition: String },
    /// `for (var in iterable):`
    Iteration { variable: String, iterable: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CloseReason {
    #[default]
    None,
    Completed,
    Failed,
}

/// `close [completed|failed] [(value)]`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseStmt {
    pub reason: CloseReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub position: Position,
}
