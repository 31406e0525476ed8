//! Tests for the Weft parser

use super::ast::*;
use super::lexer::tokenize;
use super::*;

// ============================================================================
// Helper Functions
// ============================================================================

fn parse_source(source: &str) -> ParseResult<Program> {
    let tokens = tokenize(source).expect("Source should tokenize");
    parse(tokens)
}

/// Parse source that must be valid
fn parse_ok(source: &str) -> Program {
    parse_source(source).unwrap_or_else(|e| panic!("Parse failed at {}: {}", e.position, e))
}

/// Parse source that must be rejected, returning the error
fn parse_err(source: &str) -> ParseError {
    match parse_source(source) {
        Ok(program) => panic!("Expected a parse error, got {:#?}", program),
        Err(err) => err,
    }
}

/// Body of the first workflow in the source
fn workflow_body(source: &str) -> Vec<Statement> {
    let program = parse_ok(source);
    let workflow = program
        .workflows()
        .next()
        .expect("Source should define a workflow");
    workflow.body.clone()
}

fn first_workflow(program: &Program) -> &WorkflowDef {
    program.workflows().next().expect("Should have a workflow")
}

// ============================================================================
// Definitions
// ============================================================================

#[test]
fn test_workflow_and_activity_definitions() {
    let source = r#"
workflow Order(id: string) -> (Receipt):
    activity Charge(id) -> receipt
    close completed(receipt)

activity Charge(id: string) -> (Receipt):
    return lookup(id)
"#;

    let program = parse_ok(source);
    assert_eq!(program.definitions.len(), 2);

    let workflow = first_workflow(&program);
    assert_eq!(workflow.name, "Order");
    assert_eq!(workflow.params, "id: string");
    assert_eq!(workflow.return_type.as_deref(), Some("Receipt"));
    assert_eq!(workflow.position, Position::new(2, 1));
    assert_eq!(workflow.body.len(), 2);

    let activity = program.activities().next().unwrap();
    assert_eq!(activity.name, "Charge");
    assert_eq!(activity.position, Position::new(6, 1));
    assert_eq!(
        activity.body,
        vec![Statement::Return {
            value: Some("lookup(id)".to_string()),
            position: Position::new(7, 5),
        }]
    );
}

#[test]
fn test_definition_options_line() {
    let source = r#"
activity Charge(id):
    options(retry: 3, timeout: 30s)
    return id
"#;

    let program = parse_ok(source);
    let activity = program.activities().next().unwrap();
    assert_eq!(
        activity.options.as_deref(),
        Some("retry: 3, timeout: 30s")
    );
    assert_eq!(activity.body.len(), 1);
}

#[test]
fn test_empty_source_has_no_definitions() {
    let program = parse_ok("\n# only a comment\n\n");
    assert!(program.definitions.is_empty());
}

#[test]
fn test_top_level_statement_is_error() {
    let err = parse_err("x = 1\n");
    assert!(err.message.contains("expected 'workflow' or 'activity'"));
    assert_eq!(err.position, Position::new(1, 1));
}

#[test]
fn test_missing_colon_is_error() {
    let err = parse_err("workflow Broken(x)\n    activity A()\n");
    assert!(err.message.contains("expected ':'"), "{}", err.message);
    assert_eq!(err.position.line, 1);
}

#[test]
fn test_missing_body_is_error() {
    let err = parse_err("workflow Empty():\nworkflow Next():\n    x = 1\n");
    assert!(err.message.contains("indented workflow body"), "{}", err.message);
}

// ============================================================================
// Declarations
// ============================================================================

#[test]
fn test_signal_query_update_declarations() {
    let source = r#"
workflow Approval(id):
    signal approve(by: string):
        approver = by
    query status() -> (string):
        return state
    update bump(n: int) -> (int):
        count = count + n
        return count
    await signal approve
"#;

    let program = parse_ok(source);
    let workflow = first_workflow(&program);
    assert_eq!(workflow.signals.len(), 1);
    assert_eq!(workflow.signals[0].name, "approve");
    assert_eq!(workflow.signals[0].params, "by: string");
    assert_eq!(workflow.queries[0].return_type, "string");
    assert_eq!(workflow.updates[0].name, "bump");
    assert_eq!(workflow.updates[0].body.len(), 2);
    assert_eq!(workflow.body.len(), 1);
}

#[test]
fn test_declaration_after_statement_is_error() {
    let source = r#"
workflow W():
    activity A()
    signal late():
        x = 1
"#;

    let err = parse_err(source);
    assert!(err.message.contains("must come before"), "{}", err.message);
    assert_eq!(err.position, Position::new(4, 5));
}

#[test]
fn test_declaration_inside_handler_is_error() {
    let source = r#"
workflow W():
    signal outer():
        signal inner():
            x = 1
    x = 2
"#;

    let err = parse_err(source);
    assert!(err.message.contains("a signal handler"), "{}", err.message);
}

#[test]
fn test_query_requires_return_type() {
    let source = r#"
workflow W():
    query status():
        return state
    x = 1
"#;

    let err = parse_err(source);
    assert!(err.message.contains("must declare a return type"));
}

#[test]
fn test_signal_rejects_return_type() {
    let source = r#"
workflow W():
    signal ping() -> (bool):
        x = 1
    x = 2
"#;

    let err = parse_err(source);
    assert!(err.message.contains("cannot declare a return type"));
}

// ============================================================================
// Calls
// ============================================================================

#[test]
fn test_activity_call_with_options() {
    let source = r#"
workflow W():
    activity Charge(order.total) -> receipt
        options(retry: 3)
    activity Ship(receipt)
"#;

    let body = workflow_body(source);
    assert_eq!(body.len(), 2);
    let Statement::ActivityCall(call) = &body[0] else {
        panic!("Expected activity call, got {:?}", body[0]);
    };
    assert_eq!(call.name, "Charge");
    assert_eq!(call.args, "order.total");
    assert_eq!(call.result.as_deref(), Some("receipt"));
    assert_eq!(call.options.as_deref(), Some("retry: 3"));
    assert_eq!(call.resolved, None);
}

#[test]
fn test_comment_between_call_and_options() {
    let source = r#"
workflow W():
    activity Charge(x)
        # retry policy
        options(retries: 3)
    activity Ship(x)
    # ship next
    activity Notify(x)
"#;

    let body = workflow_body(source);
    assert_eq!(body.len(), 4);
    let Statement::ActivityCall(call) = &body[0] else {
        panic!("Expected activity call, got {:?}", body[0]);
    };
    assert_eq!(call.options.as_deref(), Some("retries: 3"));
    let Statement::ActivityCall(ship) = &body[1] else {
        panic!("Expected activity call, got {:?}", body[1]);
    };
    assert_eq!(ship.options, None);
    assert!(body[2].is_comment());
}

#[test]
fn test_second_options_line_is_error() {
    let source = r#"
workflow W():
    activity Charge(x)
        options(retry: 3)
        options(timeout: 5s)
"#;

    let err = parse_err(source);
    assert!(err.message.contains("single options"), "{}", err.message);
}

#[test]
fn test_indented_statement_after_call_is_error() {
    let source = r#"
workflow W():
    activity Charge(x)
        activity Other(x)
"#;

    let err = parse_err(source);
    assert!(err.message.contains("unexpected indented block"));
}

#[test]
fn test_misplaced_options_is_error() {
    let source = r#"
workflow W():
    x = 1
    options(retry: 3)
"#;

    let err = parse_err(source);
    assert!(err.message.contains("options(...)"), "{}", err.message);
}

#[test]
fn test_workflow_call_modes() {
    let source = r#"
workflow W():
    workflow Child(a) -> r
    spawn workflow Worker(b) -> handle
    detach workflow Audit(c)
    nexus "billing" workflow Invoice(d) -> inv
"#;

    let body = workflow_body(source);
    let calls: Vec<&WorkflowCall> = body
        .iter()
        .map(|stmt| match stmt {
            Statement::WorkflowCall(call) => call,
            other => panic!("Expected workflow call, got {:?}", other),
        })
        .collect();

    assert_eq!(calls[0].mode, CallMode::Child);
    assert_eq!(calls[0].result.as_deref(), Some("r"));
    assert_eq!(calls[1].mode, CallMode::Spawn);
    assert_eq!(calls[1].result.as_deref(), Some("handle"));
    assert_eq!(calls[2].mode, CallMode::Detach);
    assert_eq!(calls[2].result, None);
    assert_eq!(calls[3].namespace.as_deref(), Some("billing"));
    assert_eq!(calls[3].name, "Invoice");
    assert_eq!(calls[1].position, Position::new(4, 5));
}

#[test]
fn test_detach_with_result_is_error() {
    let err = parse_err("workflow W():\n    detach workflow Audit(x) -> h\n");
    assert!(err.message.contains("cannot bind the result"));
    assert_eq!(err.position, Position::new(2, 30));
}

// ============================================================================
// Await
// ============================================================================

#[test]
fn test_single_awaits() {
    let source = r#"
workflow W():
    signal ready():
        x = 1
    update resize(n) -> (int):
        return n
    await timer(5m)
    await signal ready
    await update resize -> size
    await activity Fetch(url) -> page
    await workflow Child(page) -> summary
"#;

    let body = workflow_body(source);
    let targets: Vec<&AwaitTarget> = body
        .iter()
        .map(|stmt| match stmt {
            Statement::Await(stmt) => &stmt.target,
            other => panic!("Expected await, got {:?}", other),
        })
        .collect();

    assert_eq!(
        targets[0],
        &AwaitTarget::Timer {
            duration: "5m".to_string()
        }
    );
    assert!(matches!(targets[1], AwaitTarget::Signal(e) if e.name == "ready" && e.binding.is_none()));
    assert!(matches!(targets[2], AwaitTarget::Update(e) if e.binding.as_deref() == Some("size")));
    assert!(matches!(targets[3], AwaitTarget::Activity(c) if c.name == "Fetch"));
    assert!(matches!(targets[4], AwaitTarget::Workflow(c) if c.mode == CallMode::Child));
}

#[test]
fn test_await_spawned_workflow_is_error() {
    let err = parse_err("workflow W():\n    await spawn workflow Child()\n");
    assert!(err.message.contains("only child workflow calls"));
}

#[test]
fn test_await_all_block() {
    let source = r#"
workflow W():
    await all:
        activity A()
        activity B()
    x = 1
"#;

    let body = workflow_body(source);
    assert_eq!(body.len(), 2);
    let Statement::AwaitAll(block) = &body[0] else {
        panic!("Expected await all, got {:?}", body[0]);
    };
    assert_eq!(block.body.len(), 2);
    assert_eq!(block.position, Position::new(3, 5));
}

#[test]
fn test_await_one_cases() {
    let source = r#"
workflow W():
    signal approve(by):
        approved = true
    await one:
        signal approve -> who:
            activity Notify(who)
        timer(1h):
        activity Poll() -> status:
            x = status
        await all:
            activity A()
            activity B()
"#;

    let body = workflow_body(source);
    let Statement::AwaitOne(block) = &body[0] else {
        panic!("Expected await one, got {:?}", body[0]);
    };
    assert_eq!(block.cases.len(), 4);

    let approve = &block.cases[0];
    assert!(matches!(&approve.target, CaseTarget::Signal(e) if e.binding.as_deref() == Some("who")));
    assert_eq!(approve.body.as_ref().map(Vec::len), Some(1));

    let timer = &block.cases[1];
    assert_eq!(
        timer.target,
        CaseTarget::Timer {
            duration: "1h".to_string()
        }
    );
    assert_eq!(timer.body, None);

    assert!(matches!(&block.cases[2].target, CaseTarget::Activity(c) if c.result.as_deref() == Some("status")));

    let CaseTarget::AwaitAll { body } = &block.cases[3].target else {
        panic!("Expected nested await all");
    };
    assert_eq!(body.len(), 2);
    assert_eq!(block.cases[3].body, None);
}

#[test]
fn test_await_one_without_cases_is_error() {
    let source = r#"
workflow W():
    await one:
    activity A()
"#;

    let err = parse_err(source);
    assert!(err.message.contains("requires at least one case"));
    assert_eq!(err.position, Position::new(3, 5));
}

#[test]
fn test_await_one_case_requires_colon() {
    let source = r#"
workflow W():
    await one:
        timer(5s)
"#;

    let err = parse_err(source);
    assert!(err.message.contains("expected ':'"), "{}", err.message);
}

#[test]
fn test_await_one_rejects_ordinary_statement_as_case() {
    let source = r#"
workflow W():
    await one:
        x = 1
"#;

    let err = parse_err(source);
    assert!(err.message.contains("expected an 'await one' case"));
}

#[test]
fn test_bare_timer_is_error() {
    let err = parse_err("workflow W():\n    timer(5s)\n");
    assert!(err.message.contains("must be awaited"));
}

// ============================================================================
// Control Flow
// ============================================================================

#[test]
fn test_if_else_if_else_chain() {
    let source = r#"
workflow W(x):
    if (x > 1):
        activity A()
    else if (x > 0):
        activity B()
    else:
        activity C()
"#;

    let body = workflow_body(source);
    assert_eq!(body.len(), 1);
    let Statement::If(outer) = &body[0] else {
        panic!("Expected if, got {:?}", body[0]);
    };
    assert_eq!(outer.condition, "x > 1");

    let else_body = outer.else_body.as_ref().expect("Should have else branch");
    let Statement::If(inner) = &else_body[0] else {
        panic!("Expected else-if, got {:?}", else_body[0]);
    };
    assert_eq!(inner.condition, "x > 0");
    assert_eq!(inner.position, Position::new(5, 10));
    assert_eq!(inner.else_body.as_ref().map(Vec::len), Some(1));
}

#[test]
fn test_comment_before_else_opens_else_body() {
    let source = r#"
workflow W(x):
    if (x > 1):
        a = 1
    # otherwise
    else:
        b = 2
    if (x > 0):
        c = 3
    # smaller
    else if (x < 0):
        d = 4
"#;

    let body = workflow_body(source);
    assert_eq!(body.len(), 2);

    let Statement::If(first) = &body[0] else {
        panic!("Expected if, got {:?}", body[0]);
    };
    assert_eq!(first.body.len(), 1);
    let else_body = first.else_body.as_ref().expect("Should have else branch");
    assert_eq!(
        else_body[0],
        Statement::Comment {
            text: "otherwise".to_string(),
            position: Position::new(5, 5),
        }
    );
    assert!(matches!(else_body[1], Statement::Raw { .. }));

    let Statement::If(second) = &body[1] else {
        panic!("Expected if, got {:?}", body[1]);
    };
    let else_body = second.else_body.as_ref().expect("Should have else branch");
    assert_eq!(else_body.len(), 2);
    assert!(else_body[0].is_comment());
    let Statement::If(inner) = &else_body[1] else {
        panic!("Expected else-if, got {:?}", else_body[1]);
    };
    assert_eq!(inner.condition, "x < 0");
}

#[test]
fn test_else_without_if_is_error() {
    let err = parse_err("workflow W():\n    else:\n        x = 1\n");
    assert!(err.message.contains("without a matching 'if'"));
}

#[test]
fn test_for_loop_variants() {
    let source = r#"
workflow W(items):
    for:
        break
    for (retries < 3):
        retries = retries + 1
    for (item in items):
        activity Handle(item)
    for (key, value in pairs(map)):
        continue
"#;

    let body = workflow_body(source);
    let kinds: Vec<&ForKind> = body
        .iter()
        .map(|stmt| match stmt {
            Statement::For(stmt) => &stmt.kind,
            other => panic!("Expected for, got {:?}", other),
        })
        .collect();

    assert_eq!(kinds[0], &ForKind::Infinite);
    assert_eq!(
        kinds[1],
        &ForKind::Conditional {
            condition: "retries < 3".to_string()
        }
    );
    assert_eq!(
        kinds[2],
        &ForKind::Iteration {
            variable: "item".to_string(),
            iterable: "items".to_string()
        }
    );
    assert_eq!(
        kinds[3],
        &ForKind::Iteration {
            variable: "key, value".to_string(),
            iterable: "pairs(map)".to_string()
        }
    );
}

#[test]
fn test_for_with_invalid_loop_variable_is_error() {
    let err = parse_err("workflow W():\n    for (a.b in items):\n        x = 1\n");
    assert!(err.message.contains("invalid loop variable"));
}

#[test]
fn test_switch_cases_and_default() {
    let source = r#"
workflow W(order):
    switch (order.kind):
        case "digital":
            activity Email(order)
        # physical goods ship
        case (2):
            activity Ship(order)
        case priority:
            activity Rush(order)
        default:
            activity Review(order)
"#;

    let body = workflow_body(source);
    let Statement::Switch(block) = &body[0] else {
        panic!("Expected switch, got {:?}", body[0]);
    };
    assert_eq!(block.expr, "order.kind");
    let values: Vec<&str> = block.cases.iter().map(|c| c.value.as_str()).collect();
    assert_eq!(values, vec!["\"digital\"", "2", "priority"]);
    // the comment between cases is dropped, not appended to the first case
    assert_eq!(block.cases[0].body.len(), 1);
    assert_eq!(block.default.as_ref().map(Vec::len), Some(1));
}

#[test]
fn test_switch_default_must_be_last() {
    let source = r#"
workflow W(x):
    switch (x):
        default:
            y = 1
        case (1):
            y = 2
"#;

    let err = parse_err(source);
    assert!(err.message.contains("'case' cannot follow 'default'"));
}

#[test]
fn test_switch_without_case_is_error() {
    let source = r#"
workflow W(x):
    switch (x):
        default:
            y = 1
"#;

    let err = parse_err(source);
    assert!(err.message.contains("at least one 'case'"));
}

#[test]
fn test_case_outside_switch_is_error() {
    let err = parse_err("workflow W():\n    case (1):\n        x = 1\n");
    assert!(err.message.contains("outside of a switch"));
}

// ============================================================================
// Termination
// ============================================================================

#[test]
fn test_close_variants_in_main_body() {
    let source = r#"
workflow W():
    if (cancelled):
        close failed("cancelled")
    if (done):
        close
    close completed(result)
"#;

    let body = workflow_body(source);
    let Statement::Close(last) = &body[2] else {
        panic!("Expected close, got {:?}", body[2]);
    };
    assert_eq!(last.reason, CloseReason::Completed);
    assert_eq!(last.value.as_deref(), Some("result"));

    let Statement::If(first) = &body[0] else {
        panic!("Expected if");
    };
    assert_eq!(
        first.body[0],
        Statement::Close(CloseStmt {
            reason: CloseReason::Failed,
            value: Some("\"cancelled\"".to_string()),
            position: Position::new(4, 9),
        })
    );
}

#[test]
fn test_close_in_signal_handler_is_error() {
    let source = r#"
workflow W():
    signal cancel():
        close failed
    await signal cancel
"#;

    let err = parse_err(source);
    assert!(err.message.contains("'close' is not allowed in a signal handler"));
    assert_eq!(err.position, Position::new(4, 9));
}

#[test]
fn test_close_in_update_handler_is_error() {
    let source = r#"
workflow W():
    update stop() -> (bool):
        close completed
    x = 1
"#;

    let err = parse_err(source);
    assert!(err.message.contains("an update handler"));
}

#[test]
fn test_return_in_workflow_body_is_error() {
    let err = parse_err("workflow W():\n    return 1\n");
    assert!(err.message.contains("use 'close'"));
}

#[test]
fn test_return_in_update_handler() {
    let source = r#"
workflow W():
    update bump(n) -> (int):
        return count + n
    x = 1
"#;

    let program = parse_ok(source);
    let update = &first_workflow(&program).updates[0];
    assert_eq!(
        update.body[0],
        Statement::Return {
            value: Some("count + n".to_string()),
            position: Position::new(4, 9),
        }
    );
}

#[test]
fn test_continue_as_new() {
    let body = workflow_body("workflow W(cursor):\n    continue_as_new(cursor)\n");
    assert_eq!(
        body[0],
        Statement::ContinueAsNew {
            args: "cursor".to_string(),
            position: Position::new(2, 5),
        }
    );

    let err = parse_err(
        "workflow W():\n    signal reset():\n        continue_as_new\n    x = 1\n",
    );
    assert!(err.message.contains("'continue_as_new' is not allowed"));
}

// ============================================================================
// Restricted Bodies
// ============================================================================

#[test]
fn test_temporal_keywords_rejected_in_activity() {
    let cases = [
        ("await timer(5s)", "'await' is not allowed in an activity body"),
        ("activity Other()", "'activity' is not allowed in an activity body"),
        ("workflow Child()", "'workflow' is not allowed"),
        ("spawn workflow Child()", "'spawn' is not allowed"),
        ("close completed", "'close' is not allowed"),
        ("continue_as_new", "'continue_as_new' is not allowed"),
        ("timer(5s)", "'timer' is not allowed"),
    ];

    for (line, expected) in cases {
        let source = format!("activity A():\n    x = 1\n    {}\n", line);
        let err = parse_err(&source);
        assert!(
            err.message.contains(expected),
            "'{}' produced '{}'",
            line,
            err.message
        );
        assert_eq!(err.position, Position::new(3, 5));
    }
}

#[test]
fn test_temporal_keywords_rejected_in_query_handler() {
    let source = r#"
workflow W():
    query status() -> (string):
        activity Fetch()
        return state
    x = 1
"#;

    let err = parse_err(source);
    assert!(err.message.contains("a query handler"), "{}", err.message);
}

#[test]
fn test_activity_body_control_flow() {
    let source = r#"
activity Sum(items) -> (int):
    total = 0
    for (item in items):
        if (item < 0):
            continue
        total = total + item
    switch (total):
        case (0):
            return 0
    return total
"#;

    let program = parse_ok(source);
    let activity = program.activities().next().unwrap();
    assert_eq!(activity.body.len(), 4);
    assert!(matches!(activity.body[0], Statement::Raw { .. }));
    assert!(matches!(activity.body[1], Statement::For(_)));
    assert!(matches!(activity.body[2], Statement::Switch(_)));
}

// ============================================================================
// Raw Statements & Comments
// ============================================================================

#[test]
fn test_raw_statement_preserves_spacing() {
    let body = workflow_body("workflow W():\n    total = price * (1 + tax)  -  discount\n");
    assert_eq!(
        body[0],
        Statement::Raw {
            text: "total = price * (1 + tax)  -  discount".to_string(),
            position: Position::new(2, 5),
        }
    );
}

#[test]
fn test_contextual_keywords_start_raw_lines() {
    let source = r#"
workflow W():
    default = 1
    case += 1

activity A():
    options = load()
    return options
"#;

    let program = parse_ok(source);
    let body = &first_workflow(&program).body;
    assert_eq!(
        body[0],
        Statement::Raw {
            text: "default = 1".to_string(),
            position: Position::new(3, 5),
        }
    );
    assert!(matches!(&body[1], Statement::Raw { text, .. } if text == "case += 1"));

    let Definition::Activity(activity) = &program.definitions[1] else {
        panic!("Expected activity, got {:?}", program.definitions[1]);
    };
    assert!(matches!(
        &activity.body[0],
        Statement::Raw { text, .. } if text == "options = load()"
    ));
}

#[test]
fn test_comments_become_statements_and_trailing_comments_drop() {
    let source = r#"
workflow W():
    # charge first
    activity Charge() # trailing
    # then ship
    activity Ship()
"#;

    let body = workflow_body(source);
    assert_eq!(body.len(), 4);
    assert_eq!(
        body[0],
        Statement::Comment {
            text: "charge first".to_string(),
            position: Position::new(3, 5),
        }
    );
    assert!(matches!(&body[1], Statement::ActivityCall(c) if c.name == "Charge"));
    assert!(body[2].is_comment());
}

#[test]
fn test_outdented_comment_belongs_to_enclosing_block() {
    let source = r#"
workflow W(x):
    if (x):
        activity A()
    # after the if
    activity B()
# between definitions

activity A():
    return 1
"#;

    let program = parse_ok(source);
    let body = &first_workflow(&program).body;
    assert_eq!(body.len(), 3);
    let Statement::If(stmt) = &body[0] else {
        panic!("Expected if, got {:?}", body[0]);
    };
    assert_eq!(stmt.body.len(), 1);
    assert_eq!(
        body[1],
        Statement::Comment {
            text: "after the if".to_string(),
            position: Position::new(5, 5),
        }
    );
    assert_eq!(program.definitions.len(), 2);
}

#[test]
fn test_unexpected_indentation_is_error() {
    let err = parse_err("workflow W():\n    x = 1\n        y = 2\n");
    assert!(err.message.contains("unexpected indentation"));
    assert_eq!(err.position.line, 3);
}

// ============================================================================
// Collect-All Mode
// ============================================================================

const BROKEN_THEN_GOOD: &str = r#"
workflow Broken(x)
    activity A()

workflow Good():
    activity A()
"#;

#[test]
fn test_collect_all_recovers_at_next_definition() {
    let tokens = tokenize(BROKEN_THEN_GOOD).unwrap();
    let (program, errors) = parse_collecting(tokens);

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].position.line, 2);
    assert_eq!(program.definitions.len(), 1);
    assert_eq!(program.definitions[0].name(), "Good");
}

#[test]
fn test_fail_fast_returns_no_program() {
    let err = parse_source(BROKEN_THEN_GOOD).unwrap_err();
    assert_eq!(err.position.line, 2);
}

#[test]
fn test_collect_all_reports_every_broken_definition() {
    let source = r#"
workflow A():
    return 1
activity B()
    x = 1
workflow C():
    close completed
"#;
    let (program, errors) = parse_collecting(tokenize(source).unwrap());
    assert_eq!(errors.len(), 2);
    let names: Vec<&str> = program.definitions.iter().map(|d| d.name()).collect();
    assert_eq!(names, vec!["C"]);
}

#[test]
fn test_collect_all_matches_fail_fast_on_valid_input() {
    let source = "workflow W():\n    activity A()\nactivity A():\n    return 1\n";
    let (program, errors) = parse_collecting(tokenize(source).unwrap());
    assert!(errors.is_empty());
    assert_eq!(program, parse_ok(source));
}

// ============================================================================
// Serialization
// ============================================================================

#[test]
fn test_parsing_is_idempotent() {
    let source = r#"
workflow W(x):
    await one:
        timer(5s):
            x = 1
    for (i in items):
        activity A(i)
"#;
    assert_eq!(parse_ok(source), parse_ok(source));
}

#[test]
fn test_json_discriminants_are_stable() {
    let source = r#"
workflow W():
    # note
    signal go():
        x = 1
    activity A() -> a
    await one:
        signal go:
    await all:
        spawn workflow C()
    await timer(1s)
    for:
        break
    continue_as_new()
    close completed(a)

activity A():
    return 1
"#;

    let program = parse_ok(source);
    let json = serde_json::to_value(&program).unwrap();
    let definitions = json["definitions"].as_array().unwrap();
    assert_eq!(definitions[0]["type"], "workflowDef");
    assert_eq!(definitions[1]["type"], "activityDef");

    let types: Vec<&str> = definitions[0]["body"]
        .as_array()
        .unwrap()
        .iter()
        .map(|stmt| stmt["type"].as_str().unwrap())
        .collect();
    assert_eq!(
        types,
        vec![
            "comment",
            "activityCall",
            "awaitOne",
            "awaitAll",
            "await",
            "for",
            "continueAsNew",
            "close"
        ]
    );

    let body = &definitions[0]["body"];
    assert_eq!(body[1]["position"], serde_json::json!({"line": 6, "column": 5}));
    assert!(body[1].get("resolved").is_none());
    assert_eq!(body[2]["cases"][0]["target"]["kind"], "signal");
    assert_eq!(body[3]["body"][0]["mode"], "spawn");
    assert_eq!(body[4]["target"]["kind"], "timer");
    assert_eq!(body[5]["kind"]["loop"], "infinite");
    assert_eq!(body[7]["reason"], "completed");
    assert_eq!(definitions[1]["body"][0]["type"], "return");

    // a second serialization yields the same document
    assert_eq!(serde_json::to_value(&program).unwrap(), json);
}
