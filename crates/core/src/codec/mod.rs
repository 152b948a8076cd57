//! Property codec: maps application-level property values to wire values
//! and back, per widget type.
//!
//! Each known type owns a [`TypeTable`]. Keys missing from a table, and
//! every key of an unknown type, pass through unchanged.

pub mod catalog;
pub mod color;
pub mod font;

use native_bridge_protocol::{Bounds, Font, ImageSource};
use serde_json::{Map, Value, json};

use crate::error::InvalidValue;

pub use catalog::lookup;

/// Accepted numeric domain of a number property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberRange {
    Any,
    NonNegative,
    Positive,
    /// `[0, 1]`.
    Unit,
}

impl NumberRange {
    pub fn contains(self, n: f64) -> bool {
        n.is_finite()
            && match self {
                Self::Any => true,
                Self::NonNegative => n >= 0.0,
                Self::Positive => n > 0.0,
                Self::Unit => (0.0..=1.0).contains(&n),
            }
    }
}

/// How a property's value is encoded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyKind {
    /// Forwarded unchanged.
    Any,
    Boolean,
    Text,
    Number(NumberRange),
    /// CSS color or `[r, g, b, a?]`; `[r, g, b, a]` bytes on the wire.
    Color,
    /// Font shorthand; structured descriptor on the wire.
    Font,
    /// `src` string or `{src, width?, height?}`.
    Image,
    /// `[left, top, width, height]` or `{left, top, width, height}`.
    Bounds,
    /// Lowercase tokens in the application API, uppercase on the wire.
    Choice(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Unset,
    Bool(bool),
    Number(f64),
    Text(&'static str),
}

impl DefaultValue {
    pub fn to_value(self) -> Option<Value> {
        match self {
            Self::Unset => None,
            Self::Bool(b) => Some(Value::Bool(b)),
            Self::Number(n) => Some(json!(n)),
            Self::Text(s) => Some(Value::String(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropertyDef {
    pub name: &'static str,
    /// Property name on the wire; usually equal to `name`.
    pub wire_name: &'static str,
    pub kind: PropertyKind,
    pub default: DefaultValue,
}

impl PropertyDef {
    pub const fn new(name: &'static str, kind: PropertyKind) -> Self {
        Self {
            name,
            wire_name: name,
            kind,
            default: DefaultValue::Unset,
        }
    }

    pub const fn wire(mut self, wire_name: &'static str) -> Self {
        self.wire_name = wire_name;
        self
    }

    pub const fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = default;
        self
    }

    pub fn encode(&self, value: &Value) -> Result<Value, InvalidValue> {
        encode_value(self.kind, value).ok_or_else(|| InvalidValue::new(self.name, value.clone()))
    }

    pub fn decode(&self, wire: Value) -> Value {
        decode_value(self.kind, wire)
    }
}

/// Codec table of one widget type.
#[derive(Debug)]
pub struct TypeTable {
    /// Application-facing type tag, e.g. `Button`.
    pub name: &'static str,
    /// Type name sent in `create`, e.g. `rwt.widgets.Button`.
    pub wire_type: &'static str,
    /// Property groups, searched in order.
    pub properties: &'static [&'static [PropertyDef]],
}

impl TypeTable {
    pub fn property(&self, name: &str) -> Option<&'static PropertyDef> {
        self.properties
            .iter()
            .flat_map(|group| group.iter())
            .find(|p| p.name == name)
    }

    pub fn property_by_wire_name(&self, wire_name: &str) -> Option<&'static PropertyDef> {
        self.properties
            .iter()
            .flat_map(|group| group.iter())
            .find(|p| p.wire_name == wire_name)
    }
}

/// Wire type for a type tag. Unknown tags are sent as given.
pub fn wire_type(type_name: &str) -> &str {
    lookup(type_name).map_or(type_name, |t| t.wire_type)
}

/// Wire name of a property.
pub fn wire_name<'a>(table: Option<&TypeTable>, key: &'a str) -> &'a str {
    match table.and_then(|t| t.property(key)) {
        Some(def) => def.wire_name,
        None => key,
    }
}

/// Encode one property. Returns the wire name together with the wire value.
pub fn encode(
    table: Option<&TypeTable>,
    key: &str,
    value: &Value,
) -> Result<(String, Value), InvalidValue> {
    match table.and_then(|t| t.property(key)) {
        Some(def) => Ok((def.wire_name.to_string(), def.encode(value)?)),
        None => Ok((key.to_string(), value.clone())),
    }
}

/// Decode a value read back for the application-level property `key`.
pub fn decode(table: Option<&TypeTable>, key: &str, wire: Value) -> Value {
    match table.and_then(|t| t.property(key)) {
        Some(def) => def.decode(wire),
        None => wire,
    }
}

/// Decode a host payload keyed by wire names into application names.
pub fn decode_payload(table: Option<&TypeTable>, payload: Map<String, Value>) -> Map<String, Value> {
    payload
        .into_iter()
        .map(|(key, wire)| match table.and_then(|t| t.property_by_wire_name(&key)) {
            Some(def) => (def.name.to_string(), def.decode(wire)),
            None => (key, wire),
        })
        .collect()
}

/// Declared default of a property, if any.
pub fn default_value(table: Option<&TypeTable>, key: &str) -> Option<Value> {
    table
        .and_then(|t| t.property(key))
        .and_then(|def| def.default.to_value())
}

fn encode_value(kind: PropertyKind, value: &Value) -> Option<Value> {
    match kind {
        PropertyKind::Any => Some(value.clone()),
        PropertyKind::Boolean => value.is_boolean().then(|| value.clone()),
        PropertyKind::Text => value.is_string().then(|| value.clone()),
        PropertyKind::Number(range) => value
            .as_f64()
            .filter(|n| range.contains(*n))
            .map(|_| value.clone()),
        PropertyKind::Color if value.is_null() => Some(Value::Null),
        PropertyKind::Color => color::parse_value(value).and_then(|c| serde_json::to_value(c).ok()),
        PropertyKind::Font if value.is_null() => Some(Value::Null),
        PropertyKind::Font => value
            .as_str()
            .and_then(font::parse)
            .and_then(|f| serde_json::to_value(f).ok()),
        PropertyKind::Image if value.is_null() => Some(Value::Null),
        PropertyKind::Image => encode_image(value).and_then(|i| serde_json::to_value(i).ok()),
        PropertyKind::Bounds => encode_bounds(value).and_then(|b| serde_json::to_value(b).ok()),
        PropertyKind::Choice(tokens) => value
            .as_str()
            .filter(|s| tokens.iter().any(|t| t == s))
            .map(|s| Value::String(s.to_ascii_uppercase())),
    }
}

fn decode_value(kind: PropertyKind, wire: Value) -> Value {
    match kind {
        PropertyKind::Color => match serde_json::from_value::<native_bridge_protocol::Color>(wire.clone()) {
            Ok(color) => Value::String(color.to_css()),
            Err(_) => wire,
        },
        PropertyKind::Font => match serde_json::from_value::<Font>(wire.clone()) {
            Ok(font) => Value::String(font.to_css()),
            Err(_) => wire,
        },
        PropertyKind::Image => match serde_json::from_value::<ImageSource>(wire.clone()) {
            Ok(image) => {
                let mut out = Map::new();
                out.insert("src".into(), Value::String(image.src));
                if let Some(width) = image.width {
                    out.insert("width".into(), json!(width));
                }
                if let Some(height) = image.height {
                    out.insert("height".into(), json!(height));
                }
                Value::Object(out)
            }
            Err(_) => wire,
        },
        PropertyKind::Choice(_) => match wire {
            Value::String(s) => Value::String(s.to_ascii_lowercase()),
            other => other,
        },
        _ => wire,
    }
}

fn encode_image(value: &Value) -> Option<ImageSource> {
    let dimension = |v: Option<&Value>| -> Option<Option<f64>> {
        match v {
            None | Some(Value::Null) => Some(None),
            Some(v) => v.as_f64().filter(|n| NumberRange::NonNegative.contains(*n)).map(Some),
        }
    };
    match value {
        Value::String(src) if !src.is_empty() => Some(ImageSource {
            src: src.clone(),
            width: None,
            height: None,
        }),
        Value::Object(map) => {
            let src = map.get("src")?.as_str().filter(|s| !s.is_empty())?;
            Some(ImageSource {
                src: src.to_string(),
                width: dimension(map.get("width"))?,
                height: dimension(map.get("height"))?,
            })
        }
        _ => None,
    }
}

fn encode_bounds(value: &Value) -> Option<Bounds> {
    let num = |v: Option<&Value>| v.and_then(Value::as_f64).filter(|n| n.is_finite());
    match value {
        Value::Array(items) if items.len() == 4 => {
            let b = Bounds::new(
                num(items.first())?,
                num(items.get(1))?,
                num(items.get(2))?,
                num(items.get(3))?,
            );
            (b.width >= 0.0 && b.height >= 0.0).then_some(b)
        }
        Value::Object(map) => {
            let b = Bounds::new(
                num(map.get("left"))?,
                num(map.get("top"))?,
                num(map.get("width"))?,
                num(map.get("height"))?,
            );
            (b.width >= 0.0 && b.height >= 0.0).then_some(b)
        }
        _ => None,
    }
}
