//! Behavioural tests for envelope dispatch.
//!
//! Steps map the scenarios in `tests/features/bridge_dispatch.feature` onto a
//! headless bridge backed by a scratch directory.

use std::cell::RefCell;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::json;

use super::support::{Harness, envelope};
use crate::error::ErrorKind;
use crate::registry::DataSource;
use crate::response::Response;

#[derive(Default)]
struct BridgeWorld {
    harness: Option<Harness>,
}

impl BridgeWorld {
    fn harness(&mut self) -> &mut Harness {
        self.harness
            .as_mut()
            .expect("a bridge session should be started first")
    }
}

#[fixture]
fn world() -> RefCell<BridgeWorld> {
    RefCell::new(BridgeWorld::default())
}

#[given("a bridge session")]
fn given_bridge_session(world: &RefCell<BridgeWorld>) {
    world.borrow_mut().harness = Some(Harness::new());
}

#[given(r#"a file "{name}" containing "{content}""#)]
fn given_file(world: &RefCell<BridgeWorld>, name: String, content: String) {
    let mut world = world.borrow_mut();
    let path = world.harness().path(strip_quotes(&name));
    std::fs::write(path, strip_quotes(&content)).expect("seed file");
}

#[when(r#"script reads the file "{name}" with callback "{callback}""#)]
fn when_read_file(world: &RefCell<BridgeWorld>, name: String, callback: String) {
    let mut world = world.borrow_mut();
    let harness = world.harness();
    let path = harness.path(strip_quotes(&name));
    harness.call(&envelope(
        "fs",
        "readFile",
        json!({ "path": path }),
        strip_quotes(&callback),
    ));
}

#[when(r#"script sends "{action}" to domain "{domain}" with callback "{callback}""#)]
fn when_send_action(
    world: &RefCell<BridgeWorld>,
    action: String,
    domain: String,
    callback: String,
) {
    world.borrow_mut().harness().call(&envelope(
        strip_quotes(&domain),
        strip_quotes(&action),
        json!({}),
        strip_quotes(&callback),
    ));
}

#[when(r#"script sends a message without a domain using callback "{callback}""#)]
fn when_send_without_domain(world: &RefCell<BridgeWorld>, callback: String) {
    let message = json!({ "action": "readFile", "callbackId": strip_quotes(&callback) });
    world.borrow_mut().harness().call(&message);
}

#[when(r#"script creates a table "{id}" with callback "{callback}""#)]
fn when_create_table(world: &RefCell<BridgeWorld>, id: String, callback: String) {
    world.borrow_mut().harness().call(&envelope(
        "nativeUI",
        "create",
        json!({ "id": strip_quotes(&id), "kind": "table", "options": {
            "columns": [{ "id": "name", "title": "Name" }]
        }}),
        strip_quotes(&callback),
    ));
}

#[when(r#"script appends {count} rows to table "{id}" with callback "{callback}""#)]
fn when_append_rows(world: &RefCell<BridgeWorld>, count: usize, id: String, callback: String) {
    let rows: Vec<_> = (0..count)
        .map(|index| json!({ "name": format!("row {index}") }))
        .collect();
    world.borrow_mut().harness().call(&envelope(
        "nativeUI",
        "appendRows",
        json!({ "id": strip_quotes(&id), "rows": rows }),
        strip_quotes(&callback),
    ));
}

#[when(r#"script destroys component "{id}" with callback "{callback}""#)]
fn when_destroy(world: &RefCell<BridgeWorld>, id: String, callback: String) {
    world.borrow_mut().harness().call(&envelope(
        "nativeUI",
        "destroy",
        json!({ "id": strip_quotes(&id) }),
        strip_quotes(&callback),
    ));
}

#[when("the host tears the bridge down")]
fn when_teardown(world: &RefCell<BridgeWorld>) {
    world.borrow_mut().harness().bridge.teardown();
}

#[then(r#"callback "{callback}" resolves with "{value}""#)]
fn then_resolves_with(world: &RefCell<BridgeWorld>, callback: String, value: String) {
    let mut world = world.borrow_mut();
    let result = world.harness().result(strip_quotes(&callback));
    assert_eq!(result, json!(strip_quotes(&value)));
}

#[then(r#"callback "{callback}" succeeds"#)]
fn then_succeeds(world: &RefCell<BridgeWorld>, callback: String) {
    let mut world = world.borrow_mut();
    let response = world.harness().only_response(strip_quotes(&callback));
    assert!(response.is_success(), "expected success, got {response:?}");
}

#[then(r#"callback "{callback}" fails with "{kind}" and message "{message}""#)]
fn then_fails_with(world: &RefCell<BridgeWorld>, callback: String, kind: String, message: String) {
    let mut world = world.borrow_mut();
    let response = world.harness().only_response(strip_quotes(&callback));
    let expected: ErrorKind = strip_quotes(&kind).parse().expect("known error kind");
    let Response::Failure {
        error,
        message: actual,
        ..
    } = &response
    else {
        panic!("expected failure, got {response:?}");
    };
    assert_eq!(*error, expected);
    assert_eq!(actual, strip_quotes(&message));
}

#[then(r#"callback "{callback}" has no response"#)]
fn then_no_response(world: &RefCell<BridgeWorld>, callback: String) {
    let mut world = world.borrow_mut();
    let responses = world.harness().sink.responses_for(strip_quotes(&callback));
    assert!(responses.is_empty(), "unexpected responses: {responses:?}");
}

#[then(r#"table "{id}" has {count} rows"#)]
fn then_table_rows(world: &RefCell<BridgeWorld>, id: String, count: usize) {
    let mut world = world.borrow_mut();
    let harness = world.harness();
    let source = harness
        .bridge
        .data_source(strip_quotes(&id))
        .expect("live table");
    assert_eq!(source.row_count(0), count);
}

#[then("no widget is allocated")]
fn then_no_widget(world: &RefCell<BridgeWorld>) {
    let mut world = world.borrow_mut();
    let harness = world.harness();
    assert!(harness.bridge.registry().is_empty());
    assert_eq!(harness.toolkit.live_widgets(), 0);
}

/// Strips surrounding double quotes from a string if present.
fn strip_quotes(s: &str) -> &str {
    s.trim_matches('"')
}

#[scenario(
    path = "tests/features/bridge_dispatch.feature",
    name = "Reading an existing file resolves with its contents"
)]
fn read_existing_file(world: RefCell<BridgeWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/bridge_dispatch.feature",
    name = "Reading a missing file reports not found"
)]
fn read_missing_file(world: RefCell<BridgeWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/bridge_dispatch.feature",
    name = "Unknown actions are reported to the caller"
)]
fn unknown_action(world: RefCell<BridgeWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/bridge_dispatch.feature",
    name = "A message without a domain is rejected to its callback"
)]
fn message_without_domain(world: RefCell<BridgeWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/bridge_dispatch.feature",
    name = "A table is created, filled and destroyed"
)]
fn table_lifecycle(world: RefCell<BridgeWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/bridge_dispatch.feature",
    name = "Teardown ignores later messages"
)]
fn teardown_ignores_messages(world: RefCell<BridgeWorld>) {
    let _ = world;
}
