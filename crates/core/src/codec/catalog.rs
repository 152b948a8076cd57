//! Static widget catalog consumed by the codec.

use super::{DefaultValue, NumberRange, PropertyDef, PropertyKind, TypeTable};

const ALIGNMENT: &[&str] = &["left", "center", "right"];
const PLACEMENT_PRIORITY: &[&str] = &["low", "normal", "high"];

const WIDGET: &[PropertyDef] = &[
    PropertyDef::new("enabled", PropertyKind::Boolean).with_default(DefaultValue::Bool(true)),
    PropertyDef::new("visible", PropertyKind::Boolean)
        .wire("visibility")
        .with_default(DefaultValue::Bool(true)),
    PropertyDef::new("bounds", PropertyKind::Bounds),
    PropertyDef::new("background", PropertyKind::Color),
    PropertyDef::new("foreground", PropertyKind::Color),
    PropertyDef::new("font", PropertyKind::Font),
    PropertyDef::new("opacity", PropertyKind::Number(NumberRange::Unit))
        .with_default(DefaultValue::Number(1.0)),
];

const TEXT: &[PropertyDef] = &[
    PropertyDef::new("text", PropertyKind::Text).with_default(DefaultValue::Text("")),
    PropertyDef::new("alignment", PropertyKind::Choice(ALIGNMENT))
        .with_default(DefaultValue::Text("left")),
];

const IMAGE: &[PropertyDef] = &[PropertyDef::new("image", PropertyKind::Image)];

const TEXT_INPUT: &[PropertyDef] = &[
    PropertyDef::new("message", PropertyKind::Text).with_default(DefaultValue::Text("")),
    PropertyDef::new("editable", PropertyKind::Boolean).with_default(DefaultValue::Bool(true)),
];

const ACTION: &[PropertyDef] = &[
    PropertyDef::new("title", PropertyKind::Text).with_default(DefaultValue::Text("")),
    PropertyDef::new("image", PropertyKind::Image),
    PropertyDef::new("enabled", PropertyKind::Boolean).with_default(DefaultValue::Bool(true)),
    PropertyDef::new("visible", PropertyKind::Boolean)
        .wire("visibility")
        .with_default(DefaultValue::Bool(true)),
    PropertyDef::new("placementPriority", PropertyKind::Choice(PLACEMENT_PRIORITY))
        .with_default(DefaultValue::Text("normal")),
];

const ANIMATION: &[PropertyDef] = &[
    PropertyDef::new("target", PropertyKind::Any),
    PropertyDef::new("properties", PropertyKind::Any),
    PropertyDef::new("delay", PropertyKind::Number(NumberRange::NonNegative)),
    PropertyDef::new("duration", PropertyKind::Number(NumberRange::NonNegative)),
    PropertyDef::new("repeat", PropertyKind::Number(NumberRange::NonNegative)),
    PropertyDef::new("reverse", PropertyKind::Boolean),
    PropertyDef::new("easing", PropertyKind::Text),
];

pub static TABLES: &[TypeTable] = &[
    TypeTable {
        name: "Action",
        wire_type: "tabris.Action",
        properties: &[ACTION],
    },
    TypeTable {
        name: "Button",
        wire_type: "rwt.widgets.Button",
        properties: &[WIDGET, TEXT, IMAGE],
    },
    TypeTable {
        name: "Label",
        wire_type: "rwt.widgets.Label",
        properties: &[WIDGET, TEXT],
    },
    TypeTable {
        name: "TextInput",
        wire_type: "rwt.widgets.Text",
        properties: &[WIDGET, TEXT, TEXT_INPUT],
    },
    TypeTable {
        name: "Composite",
        wire_type: "rwt.widgets.Composite",
        properties: &[WIDGET],
    },
    TypeTable {
        name: "Canvas",
        wire_type: "rwt.widgets.Canvas",
        properties: &[WIDGET],
    },
    TypeTable {
        name: "ImageView",
        wire_type: "tabris.ImageView",
        properties: &[WIDGET, IMAGE],
    },
    TypeTable {
        name: "_GC",
        wire_type: "rwt.widgets.GC",
        properties: &[],
    },
    TypeTable {
        name: "Animation",
        wire_type: "tabris.Animation",
        properties: &[ANIMATION],
    },
];

/// Codec table for a type tag.
pub fn lookup(type_name: &str) -> Option<&'static TypeTable> {
    TABLES.iter().find(|t| t.name == type_name)
}
