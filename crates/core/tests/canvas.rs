//! Integration tests: canvas contexts and the packed draw payload.

use native_bridge_core::protocol::{
    DrawInstruction, Operation, OperationKind, PackedDecoder, PackedOperations, Properties,
};
use native_bridge_core::{Bridge, CanvasContext, Proxy, RecordingChannel};
use serde_json::{Value, json};

fn props(value: Value) -> Properties {
    match value {
        Value::Object(map) => map,
        _ => Properties::new(),
    }
}

fn setup() -> (Bridge, RecordingChannel, Proxy, CanvasContext) {
    let channel = RecordingChannel::new();
    let bridge = Bridge::new(channel.clone());
    let canvas = bridge.create("Canvas", Properties::new()).expect("create canvas");
    let context = bridge.get_context(&canvas, 100.0, 200.0).expect("context");
    channel.reset_calls();
    (bridge, channel, canvas, context)
}

fn packed(names: &[&str], indices: &[u32], doubles: &[f64]) -> PackedOperations {
    PackedOperations {
        names: names.iter().map(|n| (*n).to_string()).collect(),
        indices: indices.to_vec(),
        doubles: doubles.to_vec(),
        ..PackedOperations::default()
    }
}

#[test]
fn get_context_creates_the_gc_once_and_initializes_every_time() {
    let channel = RecordingChannel::new();
    let bridge = Bridge::new(channel.clone());
    let canvas = bridge.create("Canvas", Properties::new()).expect("create canvas");

    let context = bridge.get_context(&canvas, 100.0, 200.0).expect("context");
    let creates = channel.calls_of(OperationKind::Create);
    assert_eq!(creates.len(), 2);
    let Operation::Create {
        id,
        type_name,
        properties,
    } = &creates[1]
    else {
        panic!("expected a create");
    };
    assert_eq!(*id, context.gc_id());
    assert_eq!(type_name, "rwt.widgets.GC");
    assert_eq!(properties.get("parent"), Some(&json!(canvas.id().to_string())));
    assert_eq!(
        channel.calls().last(),
        Some(&Operation::Call {
            id: context.gc_id(),
            method: "init".into(),
            parameters: props(json!({"width": 100, "height": 200})),
        })
    );

    let again = bridge.get_context(&canvas, 150.0, 250.0).expect("context");
    assert_eq!(again, context);
    assert_eq!(channel.calls_of(OperationKind::Create).len(), 2);
    assert_eq!(channel.calls_of(OperationKind::Call).len(), 2);
    assert_eq!(context.canvas_width(), 150.0);
    assert_eq!(context.canvas_height(), 250.0);
}

#[test]
fn path_instructions_are_packed_into_one_draw_call() {
    let (bridge, channel, _canvas, context) = setup();
    context.move_to(10.0, 20.0);
    context.line_to(30.0, 40.0);
    assert_eq!(context.pending_len(), 2);
    assert!(channel.calls().is_empty());

    bridge.flush();
    assert_eq!(
        channel.draw_payloads(context.gc_id()),
        vec![packed(&["moveTo", "lineTo"], &[0, 1], &[10.0, 20.0, 30.0, 40.0])]
    );
    assert_eq!(context.pending_len(), 0);
}

#[test]
fn names_are_sent_once_per_context() {
    let (bridge, channel, _canvas, context) = setup();
    context.move_to(1.0, 2.0);
    context.line_to(3.0, 4.0);
    bridge.flush();
    context.move_to(5.0, 6.0);
    context.line_to(7.0, 8.0);
    bridge.flush();
    context.rect(0.0, 0.0, 10.0, 10.0);
    bridge.flush();

    let payloads = channel.draw_payloads(context.gc_id());
    assert_eq!(payloads.len(), 3);
    assert_eq!(payloads[1], packed(&[], &[0, 1], &[5.0, 6.0, 7.0, 8.0]));
    assert_eq!(payloads[2], packed(&["rect"], &[2], &[0.0, 0.0, 10.0, 10.0]));

    let mut decoder = PackedDecoder::new();
    let decoded: Vec<_> = payloads
        .iter()
        .flat_map(|p| decoder.unpack(p).expect("decodable"))
        .collect();
    assert_eq!(decoded.len(), 5);
    assert_eq!(
        decoded[4],
        DrawInstruction::Rect {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
        }
    );
}

#[test]
fn fill_rect_expands_to_a_path() {
    let (bridge, channel, _canvas, context) = setup();
    context.fill_rect(1.0, 2.0, 3.0, 4.0);
    bridge.flush();
    assert_eq!(
        channel.draw_payloads(context.gc_id()),
        vec![packed(&["beginPath", "rect", "fill"], &[0, 1, 2], &[1.0, 2.0, 3.0, 4.0])]
    );
}

#[test]
fn empty_context_sends_no_draw_call() {
    let (bridge, channel, _canvas, context) = setup();
    let report = bridge.flush();
    assert_eq!(report.sent, 0);
    assert!(channel.draw_payloads(context.gc_id()).is_empty());
}

#[test]
fn draw_call_is_part_of_the_batch() {
    let (bridge, channel, canvas, context) = setup();
    canvas.set("visible", json!(false)).expect("set");
    context.stroke();
    bridge.flush();
    let kinds: Vec<_> = channel.calls().iter().map(Operation::kind).collect();
    assert_eq!(kinds, vec![OperationKind::Set, OperationKind::Call]);
}

#[test]
fn styles_start_with_canvas_defaults() {
    let (_bridge, _channel, _canvas, context) = setup();
    assert_eq!(context.line_width(), 1.0);
    assert_eq!(context.line_cap(), "butt");
    assert_eq!(context.line_join(), "miter");
    assert_eq!(context.text_align(), "start");
    assert_eq!(context.text_baseline(), "alphabetic");
    assert_eq!(context.fill_style(), "rgba(0, 0, 0, 1)");
    assert_eq!(context.global_alpha(), 1.0);
    assert_eq!(context.font(), "10px sans-serif");
}

#[test]
fn invalid_line_cap_keeps_the_previous_value() {
    let (bridge, channel, _canvas, context) = setup();
    context.set_line_cap("round");
    context.set_line_cap("foo");

    assert_eq!(context.line_cap(), "round");
    let diagnostics = bridge.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].message, "Unsupported value for lineCap: foo");
    assert_eq!(diagnostics[0].property, "lineCap");

    bridge.flush();
    let payloads = channel.draw_payloads(context.gc_id());
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].names, vec!["lineCap"]);
    assert_eq!(payloads[0].strings, vec!["round"]);
}

#[test]
fn invalid_line_width_is_reported() {
    let (bridge, _channel, _canvas, context) = setup();
    context.set_line_width(-1.0);
    context.set_line_width(0.0);
    assert_eq!(context.line_width(), 1.0);
    assert_eq!(context.pending_len(), 0);
    let messages: Vec<_> = bridge.diagnostics().into_iter().map(|d| d.message).collect();
    assert_eq!(
        messages,
        vec![
            "Unsupported value for lineWidth: -1",
            "Unsupported value for lineWidth: 0",
        ]
    );
}

#[test]
fn fill_style_packs_color_bytes() {
    let (bridge, channel, _canvas, context) = setup();
    context.set_fill_style("red");
    assert_eq!(context.fill_style(), "rgba(255, 0, 0, 1)");
    context.set_fill_style("not a color");
    assert_eq!(context.fill_style(), "rgba(255, 0, 0, 1)");
    bridge.flush();

    let payloads = channel.draw_payloads(context.gc_id());
    assert_eq!(payloads[0].names, vec!["fillStyle"]);
    assert_eq!(payloads[0].colors, vec![255, 0, 0, 255]);
    assert_eq!(bridge.diagnostics().len(), 1);
}

#[test]
fn fill_text_sends_three_false_flags() {
    let (bridge, channel, _canvas, context) = setup();
    context.fill_text("foo", 1.0, 2.0);
    bridge.flush();

    let payloads = channel.draw_payloads(context.gc_id());
    assert_eq!(payloads[0].names, vec!["fillText"]);
    assert_eq!(payloads[0].doubles, vec![1.0, 2.0]);
    assert_eq!(payloads[0].booleans, vec![false, false, false]);
    assert_eq!(payloads[0].strings, vec!["foo"]);
}

#[test]
fn font_is_packed_as_size_flags_and_family() {
    let (bridge, channel, _canvas, context) = setup();
    context.set_font("italic bold 12px Arial, sans-serif");
    assert_eq!(context.font(), "italic bold 12px Arial, sans-serif");
    bridge.flush();

    let payloads = channel.draw_payloads(context.gc_id());
    assert_eq!(payloads[0].doubles, vec![12.0]);
    assert_eq!(payloads[0].booleans, vec![true, true]);
    assert_eq!(payloads[0].strings, vec!["Arial, sans-serif"]);
}

#[test]
fn save_and_restore_the_drawing_state() {
    let (_bridge, _channel, _canvas, context) = setup();
    context.set_line_width(5.0);
    context.save();
    context.set_line_width(10.0);
    context.translate(3.0, 4.0);
    context.restore();

    assert_eq!(context.line_width(), 5.0);
    assert_eq!(context.current_transform().apply(0.0, 0.0), (0.0, 0.0));
    assert_eq!(context.pending_len(), 5);
}

#[test]
fn restore_on_empty_stack_is_still_sent() {
    let (bridge, channel, _canvas, context) = setup();
    context.set_line_width(3.0);
    context.restore();
    assert_eq!(context.line_width(), 3.0);
    bridge.flush();

    let payloads = channel.draw_payloads(context.gc_id());
    assert_eq!(payloads[0].names, vec!["lineWidth", "restore"]);
}

#[test]
fn transforms_compose() {
    let (_bridge, _channel, _canvas, context) = setup();
    context.translate(10.0, 20.0);
    context.scale(2.0, 3.0);
    assert_eq!(context.current_transform().apply(1.0, 1.0), (12.0, 23.0));
    context.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
    assert_eq!(context.current_transform().apply(1.0, 1.0), (1.0, 1.0));
}

#[test]
fn measure_text_is_local() {
    let (_bridge, channel, _canvas, context) = setup();
    assert!(context.measure_text("foo").width > 3.0);
    assert_eq!(context.pending_len(), 0);
    assert!(channel.calls().is_empty());
}

#[test]
fn disposed_context_drops_instructions() {
    let (bridge, channel, canvas, context) = setup();
    context.move_to(1.0, 1.0);
    canvas.dispose().expect("dispose");
    context.line_to(2.0, 2.0);
    bridge.flush();

    assert!(channel.draw_payloads(context.gc_id()).is_empty());
    assert_eq!(channel.calls(), vec![Operation::Destroy { id: canvas.id() }]);
}

#[test]
fn non_finite_arguments_drop_the_instruction() {
    let (bridge, channel, _canvas, context) = setup();
    context.move_to(f64::NAN, 1.0);
    context.translate(f64::INFINITY, 0.0);
    context.line_to(3.0, 4.0);

    assert_eq!(context.current_transform().apply(1.0, 1.0), (1.0, 1.0));
    let properties: Vec<_> = bridge.diagnostics().into_iter().map(|d| d.property).collect();
    assert_eq!(properties, vec!["moveTo", "translate"]);

    bridge.flush();
    let payloads = channel.draw_payloads(context.gc_id());
    assert_eq!(payloads, vec![packed(&["lineTo"], &[0], &[3.0, 4.0])]);
    let mut decoder = PackedDecoder::new();
    assert_eq!(
        decoder.unpack(&payloads[0]).expect("decodable"),
        vec![DrawInstruction::LineTo { x: 3.0, y: 4.0 }]
    );
}

#[test]
fn disposing_the_gc_gives_the_canvas_a_new_context() {
    let (bridge, channel, canvas, context) = setup();
    bridge.dispose(context.gc_id()).expect("dispose gc");

    let fresh = bridge.get_context(&canvas, 100.0, 200.0).expect("context");
    assert_ne!(fresh.gc_id(), context.gc_id());
    fresh.move_to(1.0, 2.0);
    bridge.flush();

    assert!(channel.draw_payloads(context.gc_id()).is_empty());
    assert_eq!(
        channel.draw_payloads(fresh.gc_id()),
        vec![packed(&["moveTo"], &[0], &[1.0, 2.0])]
    );
}
