//! Integration tests: batching, coalescing and proxy lifecycle over a
//! recording host.

use native_bridge_core::protocol::{ObjectId, Operation, OperationKind, Properties};
use native_bridge_core::{Bridge, BridgeConfig, BridgeError, RecordingChannel, UsageError};
use serde_json::{Value, json};

fn props(value: Value) -> Properties {
    match value {
        Value::Object(map) => map,
        _ => Properties::new(),
    }
}

fn setup() -> (Bridge, RecordingChannel) {
    let channel = RecordingChannel::new();
    (Bridge::new(channel.clone()), channel)
}

#[test]
fn last_write_wins_within_a_tick() {
    let (bridge, channel) = setup();
    let label = bridge.create("Label", props(json!({"text": "a"}))).expect("create");
    bridge.flush();
    channel.reset_calls();

    label.set("text", json!("b")).expect("set");
    label.set("text", json!("c")).expect("set");
    let report = bridge.flush();

    assert_eq!(report.sent, 1);
    assert_eq!(
        channel.calls(),
        vec![Operation::Set {
            id: label.id(),
            properties: props(json!({"text": "c"})),
        }]
    );
}

#[test]
fn sets_on_different_keys_merge_into_one_operation() {
    let (bridge, channel) = setup();
    let button = bridge.create("Button", Properties::new()).expect("create");
    bridge.flush();
    channel.reset_calls();

    button.set("text", json!("ok")).expect("set");
    button.set("enabled", json!(false)).expect("set");
    button.set("text", json!("cancel")).expect("set");
    bridge.flush();

    let sets = channel.calls_of(OperationKind::Set);
    assert_eq!(sets.len(), 1);
    let Operation::Set { properties, .. } = &sets[0] else {
        panic!("expected a set");
    };
    let keys: Vec<_> = properties.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["text", "enabled"]);
    assert_eq!(properties.get("text"), Some(&json!("cancel")));
}

#[test]
fn create_and_dispose_in_one_tick_sends_nothing() {
    let (bridge, channel) = setup();
    let label = bridge.create("Label", props(json!({"text": "gone"}))).expect("create");
    label.set("text", json!("still gone")).expect("set");
    label.dispose().expect("dispose");

    let report = bridge.flush();
    assert_eq!(report.sent, 0);
    assert!(channel.calls().is_empty());
    assert!(label.is_disposed());
}

#[test]
fn dispose_after_flush_sends_one_destroy() {
    let (bridge, channel) = setup();
    let label = bridge.create("Label", Properties::new()).expect("create");
    bridge.flush();
    channel.reset_calls();

    label.set("text", json!("never sent")).expect("set");
    label.dispose().expect("dispose");
    label.dispose().expect("second dispose is a no-op");
    bridge.flush();

    assert_eq!(channel.calls(), vec![Operation::Destroy { id: label.id() }]);
}

#[test]
fn operations_on_disposed_proxies_are_noops() {
    let (bridge, channel) = setup();
    let label = bridge.create("Label", Properties::new()).expect("create");
    bridge.flush();
    label.dispose().expect("dispose");
    bridge.flush();
    channel.reset_calls();

    label.set("text", json!("x")).expect("set is a no-op");
    label.call("focus", Properties::new()).expect("call is a no-op");
    label.on("Selection", |_| {}).expect("listen is a no-op");
    assert!(bridge.pending_operations().is_empty());
    assert_eq!(
        label.get("text"),
        Err(BridgeError::Usage(UsageError::Disposed(label.id())))
    );
    bridge.flush();
    assert!(channel.calls().is_empty());
}

#[test]
fn unknown_ids_are_usage_errors() {
    let (bridge, _channel) = setup();
    let stranger = ObjectId::new(42);
    assert_eq!(
        bridge.set(stranger, "text", json!("x")),
        Err(BridgeError::Usage(UsageError::NotCreated(stranger)))
    );
    assert!(bridge.proxy(stranger).is_none());
}

#[test]
fn get_flushes_pending_operations_first() {
    let (bridge, channel) = setup();
    let label = bridge.create("Label", props(json!({"text": "a"}))).expect("create");
    label.set("text", json!("b")).expect("set");

    assert_eq!(label.get("text"), Ok(json!("b")));
    let kinds: Vec<_> = channel.calls().iter().map(Operation::kind).collect();
    assert_eq!(
        kinds,
        vec![OperationKind::Create, OperationKind::Set, OperationKind::Get]
    );
    assert!(bridge.pending_operations().is_empty());
}

#[test]
fn get_without_pending_operations_does_not_flush() {
    let (bridge, channel) = setup();
    let a = bridge.create("Label", props(json!({"text": "a"}))).expect("create");
    bridge.flush();
    let b = bridge.create("Label", Properties::new()).expect("create");
    channel.prime(a.id(), "text", json!("changed by the user"));

    assert_eq!(a.get("text"), Ok(json!("changed by the user")));
    assert_eq!(bridge.pending_operations().len(), 1);
    assert!(!b.is_disposed());
}

#[test]
fn creates_are_sent_before_other_operations() {
    let (bridge, channel) = setup();
    let first = bridge.create("Label", Properties::new()).expect("create");
    bridge.flush();
    channel.reset_calls();

    first.set("text", json!("x")).expect("set");
    let second = bridge.create("Label", Properties::new()).expect("create");
    bridge.flush();

    let order: Vec<_> = channel.calls().iter().map(|op| (op.kind(), op.target())).collect();
    assert_eq!(
        order,
        vec![
            (OperationKind::Create, second.id()),
            (OperationKind::Set, first.id()),
        ]
    );
}

#[test]
fn issuance_order_is_kept_without_hoisting() {
    let config = BridgeConfig {
        hoist_creates: false,
        ..BridgeConfig::default()
    };
    let channel = RecordingChannel::new();
    let bridge = Bridge::with_config(channel.clone(), config);
    let first = bridge.create("Label", Properties::new()).expect("create");
    bridge.flush();
    channel.reset_calls();

    first.set("text", json!("x")).expect("set");
    bridge.create("Label", Properties::new()).expect("create");
    bridge.flush();

    let kinds: Vec<_> = channel.calls().iter().map(Operation::kind).collect();
    assert_eq!(kinds, vec![OperationKind::Set, OperationKind::Create]);
}

#[test]
fn invalid_values_become_diagnostics() {
    let (bridge, channel) = setup();
    let label = bridge.create("Label", Properties::new()).expect("create");
    bridge.flush();
    channel.reset_calls();

    label.set("opacity", json!(2)).expect("invalid values are not errors");
    assert!(bridge.pending_operations().is_empty());
    let diagnostics = bridge.take_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].message, "Unsupported value for opacity: 2");
    assert!(bridge.diagnostics().is_empty());

    label
        .set_all(props(json!({"opacity": -1, "text": "kept"})))
        .expect("set_all");
    bridge.flush();
    assert_eq!(
        channel.calls(),
        vec![Operation::Set {
            id: label.id(),
            properties: props(json!({"text": "kept"})),
        }]
    );
}

#[test]
fn failing_operations_do_not_abort_the_flush() {
    let (bridge, channel) = setup();
    let a = bridge.create("Label", Properties::new()).expect("create");
    let b = bridge.create("Label", Properties::new()).expect("create");
    channel.fail_on(a.id(), OperationKind::Create);

    let report = bridge.flush();
    assert_eq!(report.sent, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 0);
    assert_eq!(report.failures[0].id, a.id());
    assert_eq!(channel.calls_for(b.id()).len(), 1);
}

#[test]
fn disposing_a_parent_disposes_its_children() {
    let (bridge, channel) = setup();
    let composite = bridge.create("Composite", Properties::new()).expect("create");
    let child = bridge
        .create_child(&composite, "Label", props(json!({"text": "inner"})))
        .expect("create child");
    bridge.flush();

    let Some(Operation::Create { properties, .. }) = channel.calls_for(child.id()).first().cloned() else {
        panic!("child create missing");
    };
    assert_eq!(properties.get("parent"), Some(&json!(composite.id().to_string())));
    assert_eq!(child.parent(), Some(composite.id()));

    channel.reset_calls();
    child.set("text", json!("dropped")).expect("set");
    composite.dispose().expect("dispose");
    bridge.flush();

    assert!(child.is_disposed());
    assert_eq!(channel.calls(), vec![Operation::Destroy { id: composite.id() }]);
}

#[test]
fn reset_starts_over() {
    let (bridge, _channel) = setup();
    let label = bridge.create("Label", Properties::new()).expect("create");
    label.set("opacity", json!(5)).expect("set");
    bridge.reset();

    assert!(bridge.pending_operations().is_empty());
    assert!(bridge.diagnostics().is_empty());
    let fresh = bridge.create("Label", Properties::new()).expect("create");
    assert_ne!(fresh.id(), label.id());
    assert!(label.is_disposed());
}

#[test]
fn handles_from_before_a_reset_do_not_reach_new_objects() {
    let (bridge, channel) = setup();
    let old = bridge.create("Label", Properties::new()).expect("create");
    bridge.flush();
    bridge.reset();
    let fresh = bridge.create("Button", Properties::new()).expect("create");
    bridge.flush();
    channel.reset_calls();

    old.set("text", json!("from an old handle")).expect("set is a no-op");
    bridge.flush();

    assert!(channel.calls().is_empty());
    assert!(!fresh.is_disposed());
    assert_eq!(
        old.get("text"),
        Err(BridgeError::Usage(UsageError::Disposed(old.id())))
    );
}
