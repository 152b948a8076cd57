//! Integration tests: the animation lifecycle as seen by the host and by
//! listeners on the animated object.

use std::cell::RefCell;
use std::rc::Rc;

use native_bridge_core::protocol::{HostEvent, Operation, OperationKind, Properties};
use native_bridge_core::{AnimationState, Bridge, BridgeError, Proxy, RecordingChannel, UsageError};
use serde_json::{Value, json};

fn props(value: Value) -> Properties {
    match value {
        Value::Object(map) => map,
        _ => Properties::new(),
    }
}

fn setup() -> (Bridge, RecordingChannel, Proxy, Rc<RefCell<Vec<String>>>) {
    let channel = RecordingChannel::new();
    let bridge = Bridge::new(channel.clone());
    let label = bridge.create("Label", Properties::new()).expect("create");
    let events = Rc::new(RefCell::new(Vec::new()));
    for name in ["animationstart", "animationend"] {
        let sink = Rc::clone(&events);
        label
            .on(name, move |event| sink.borrow_mut().push(event.name.clone()))
            .expect("on");
    }
    bridge.flush();
    channel.reset_calls();
    (bridge, channel, label, events)
}

#[test]
fn animate_creates_a_native_animation_and_starts_it() {
    let (bridge, channel, label, _events) = setup();
    let animation = label
        .animate(
            props(json!({"opacity": 0.5, "visible": false})),
            &props(json!({"duration": 500, "easing": "ease-out"})),
        )
        .expect("animate");
    assert_eq!(animation.state(), AnimationState::Scheduled);
    bridge.flush();

    let calls = channel.calls();
    let Operation::Create {
        id,
        type_name,
        properties,
    } = &calls[0]
    else {
        panic!("expected a create first");
    };
    assert_eq!(*id, animation.id());
    assert_eq!(type_name, "tabris.Animation");
    assert_eq!(properties.get("target"), Some(&json!(label.id().to_string())));
    assert_eq!(
        properties.get("properties"),
        Some(&json!({"opacity": 0.5, "visibility": false}))
    );
    assert_eq!(properties.get("easing"), Some(&json!("ease-out")));
    assert_eq!(properties.get("duration"), Some(&json!(500.0)));

    let listened: Vec<_> = channel
        .calls_of(OperationKind::Listen)
        .into_iter()
        .filter_map(|op| match op {
            Operation::Listen { event, .. } => Some(event),
            _ => None,
        })
        .collect();
    assert_eq!(listened, vec!["Start", "Completion"]);
    assert_eq!(
        calls.last(),
        Some(&Operation::Call {
            id: animation.id(),
            method: "start".into(),
            parameters: Properties::new(),
        })
    );
}

#[test]
fn host_events_drive_the_state_machine() {
    let (bridge, channel, label, events) = setup();
    let animation = label
        .animate(props(json!({"opacity": 0.0})), &Properties::new())
        .expect("animate");
    bridge.flush();
    channel.reset_calls();

    bridge.dispatch(HostEvent::new(animation.id(), "Start"));
    assert_eq!(animation.state(), AnimationState::Running);
    bridge.dispatch(HostEvent::new(animation.id(), "Start"));

    bridge.dispatch(HostEvent::new(animation.id(), "Completion"));
    assert_eq!(animation.state(), AnimationState::Completed);
    bridge.dispatch(HostEvent::new(animation.id(), "Completion"));

    assert_eq!(*events.borrow(), vec!["animationstart", "animationend"]);
    bridge.flush();
    assert_eq!(channel.calls(), vec![Operation::Destroy { id: animation.id() }]);
}

#[test]
fn cancel_ends_the_animation_once() {
    let (bridge, channel, label, events) = setup();
    let animation = label
        .animate(props(json!({"opacity": 0.0})), &Properties::new())
        .expect("animate");
    bridge.flush();
    bridge.dispatch(HostEvent::new(animation.id(), "Start"));
    channel.reset_calls();

    animation.cancel().expect("cancel");
    animation.cancel().expect("second cancel is a no-op");
    assert_eq!(animation.state(), AnimationState::Cancelled);
    bridge.dispatch(HostEvent::new(animation.id(), "Completion"));

    assert_eq!(*events.borrow(), vec!["animationstart", "animationend"]);
    bridge.flush();
    assert_eq!(channel.calls_of(OperationKind::Call).len(), 1);
    assert_eq!(channel.calls_of(OperationKind::Destroy).len(), 1);
}

#[test]
fn cancel_is_sent_at_once_and_disposes_the_animation() {
    let (bridge, channel, label, _events) = setup();
    let animation = label
        .animate(props(json!({"opacity": 0.0})), &Properties::new())
        .expect("animate");
    bridge.flush();
    channel.reset_calls();

    animation.cancel().expect("cancel");
    assert_eq!(
        channel.calls(),
        vec![Operation::Call {
            id: animation.id(),
            method: "cancel".into(),
            parameters: Properties::new(),
        }]
    );
    assert!(!bridge.is_live(animation.id()));

    bridge.flush();
    assert_eq!(
        channel.calls().last(),
        Some(&Operation::Destroy { id: animation.id() })
    );
}

#[test]
fn cancel_before_the_first_flush_sends_nothing() {
    let (bridge, channel, label, events) = setup();
    let animation = label
        .animate(props(json!({"opacity": 0.0})), &Properties::new())
        .expect("animate");
    animation.cancel().expect("cancel");

    assert!(!bridge.is_live(animation.id()));
    assert_eq!(*events.borrow(), vec!["animationend"]);
    bridge.flush();
    assert!(channel.calls().is_empty());
}

#[test]
fn disposing_the_target_ends_its_animations() {
    let (bridge, channel, label, events) = setup();
    let animation = label
        .animate(props(json!({"opacity": 0.0})), &Properties::new())
        .expect("animate");
    bridge.flush();
    bridge.dispatch(HostEvent::new(animation.id(), "Start"));
    channel.reset_calls();

    label.dispose().expect("dispose");
    assert!(!bridge.is_live(animation.id()));
    assert_eq!(animation.state(), AnimationState::Cancelled);
    assert_eq!(*events.borrow(), vec!["animationstart", "animationend"]);

    bridge.dispatch(HostEvent::new(animation.id(), "Completion"));
    bridge.flush();
    assert_eq!(channel.calls(), vec![Operation::Destroy { id: label.id() }]);
}

#[test]
fn invalid_options_are_errors_and_queue_nothing() {
    let (bridge, _channel, label, _events) = setup();
    let result = label.animate(
        props(json!({"opacity": 0.0})),
        &props(json!({"easing": "bounce"})),
    );
    let Err(BridgeError::Validation(err)) = result else {
        panic!("expected a validation error");
    };
    assert_eq!(err.to_string(), "Unsupported value for easing: bounce");
    assert!(bridge.pending_operations().is_empty());

    let result = label.animate(props(json!({"opacity": 3})), &Properties::new());
    assert!(matches!(result, Err(BridgeError::Validation(_))));
    assert!(bridge.pending_operations().is_empty());
}

#[test]
fn animating_a_disposed_object_fails() {
    let (_bridge, _channel, label, _events) = setup();
    label.dispose().expect("dispose");
    let result = label.animate(props(json!({"opacity": 0.0})), &Properties::new());
    assert!(matches!(
        result,
        Err(BridgeError::Usage(UsageError::Disposed(id))) if id == label.id()
    ));
}
