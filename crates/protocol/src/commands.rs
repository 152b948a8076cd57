use serde::{Deserialize, Serialize};

use crate::tokens::{LineCap, LineJoin, TextAlign, TextBaseline};
use crate::types::{Color, Font};

/// A single primitive drawing instruction as replayed by the host's
/// graphics context.
///
/// Instructions are stateful in the canvas sense: the host keeps the current
/// path, styles and transform between instructions, mirroring the client's
/// `save`/`restore` stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrawInstruction {
    BeginPath,
    ClosePath,
    MoveTo {
        x: f64,
        y: f64,
    },
    LineTo {
        x: f64,
        y: f64,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Arc {
        x: f64,
        y: f64,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        anticlockwise: bool,
    },
    QuadraticCurveTo {
        cpx: f64,
        cpy: f64,
        x: f64,
        y: f64,
    },
    BezierCurveTo {
        cp1x: f64,
        cp1y: f64,
        cp2x: f64,
        cp2y: f64,
        x: f64,
        y: f64,
    },
    Fill,
    Stroke,
    ClearRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Save,
    Restore,

    LineWidth(f64),
    LineCap(LineCap),
    LineJoin(LineJoin),
    FillStyle(Color),
    StrokeStyle(Color),
    TextAlign(TextAlign),
    TextBaseline(TextBaseline),
    Font(Font),
    GlobalAlpha(f64),

    /// Draw text. The three flags (mnemonic, delimiter, tab expansion) are
    /// part of the host's text primitive and always sent as `false`.
    FillText {
        text: String,
        x: f64,
        y: f64,
    },
    StrokeText {
        text: String,
        x: f64,
        y: f64,
    },

    SetTransform([f64; 6]),
    Transform([f64; 6]),
    Translate {
        x: f64,
        y: f64,
    },
    Rotate(f64),
    Scale {
        x: f64,
        y: f64,
    },
}

/// How many entries of each argument column an instruction consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Arity {
    pub doubles: usize,
    pub booleans: usize,
    pub strings: usize,
    pub colors: usize,
}

impl Arity {
    const fn new(doubles: usize, booleans: usize, strings: usize, colors: usize) -> Self {
        Self {
            doubles,
            booleans,
            strings,
            colors,
        }
    }
}

/// Number of color bytes per color argument.
pub const COLOR_WIDTH: usize = 4;

/// Number of boolean flags attached to a text draw.
pub const TEXT_FLAGS: usize = 3;

/// Static column schema, keyed by operation name.
pub fn arity(name: &str) -> Option<Arity> {
    let arity = match name {
        "beginPath" | "closePath" | "fill" | "stroke" | "save" | "restore" => Arity::default(),
        "lineWidth" | "globalAlpha" | "rotate" => Arity::new(1, 0, 0, 0),
        "moveTo" | "lineTo" | "translate" | "scale" => Arity::new(2, 0, 0, 0),
        "rect" | "clearRect" | "quadraticCurveTo" => Arity::new(4, 0, 0, 0),
        "bezierCurveTo" | "transform" | "setTransform" => Arity::new(6, 0, 0, 0),
        "arc" => Arity::new(5, 1, 0, 0),
        "lineCap" | "lineJoin" | "textAlign" | "textBaseline" => Arity::new(0, 0, 1, 0),
        "fillStyle" | "strokeStyle" => Arity::new(0, 0, 0, COLOR_WIDTH),
        "font" => Arity::new(1, 2, 1, 0),
        "fillText" | "strokeText" => Arity::new(2, TEXT_FLAGS, 1, 0),
        _ => return None,
    };
    Some(arity)
}

impl DrawInstruction {
    /// Operation name as transmitted in the packed payload.
    pub fn name(&self) -> &'static str {
        match self {
            Self::BeginPath => "beginPath",
            Self::ClosePath => "closePath",
            Self::MoveTo { .. } => "moveTo",
            Self::LineTo { .. } => "lineTo",
            Self::Rect { .. } => "rect",
            Self::Arc { .. } => "arc",
            Self::QuadraticCurveTo { .. } => "quadraticCurveTo",
            Self::BezierCurveTo { .. } => "bezierCurveTo",
            Self::Fill => "fill",
            Self::Stroke => "stroke",
            Self::ClearRect { .. } => "clearRect",
            Self::Save => "save",
            Self::Restore => "restore",
            Self::LineWidth(_) => "lineWidth",
            Self::LineCap(_) => "lineCap",
            Self::LineJoin(_) => "lineJoin",
            Self::FillStyle(_) => "fillStyle",
            Self::StrokeStyle(_) => "strokeStyle",
            Self::TextAlign(_) => "textAlign",
            Self::TextBaseline(_) => "textBaseline",
            Self::Font(_) => "font",
            Self::GlobalAlpha(_) => "globalAlpha",
            Self::FillText { .. } => "fillText",
            Self::StrokeText { .. } => "strokeText",
            Self::SetTransform(_) => "setTransform",
            Self::Transform(_) => "transform",
            Self::Translate { .. } => "translate",
            Self::Rotate(_) => "rotate",
            Self::Scale { .. } => "scale",
        }
    }

    pub fn arity(&self) -> Arity {
        arity(self.name()).unwrap_or_default()
    }

    /// Rebuild an instruction from its name and the column slices it owns.
    ///
    /// Each slice must be exactly as long as [`arity`] says; returns `None`
    /// for unknown names, wrong slice lengths or unknown tokens.
    pub fn from_columns(
        name: &str,
        doubles: &[f64],
        booleans: &[bool],
        strings: &[String],
        colors: &[u8],
    ) -> Option<Self> {
        let expected = arity(name)?;
        if doubles.len() != expected.doubles
            || booleans.len() != expected.booleans
            || strings.len() != expected.strings
            || colors.len() != expected.colors
        {
            return None;
        }
        let d = doubles;
        let instruction = match name {
            "beginPath" => Self::BeginPath,
            "closePath" => Self::ClosePath,
            "fill" => Self::Fill,
            "stroke" => Self::Stroke,
            "save" => Self::Save,
            "restore" => Self::Restore,
            "lineWidth" => Self::LineWidth(d[0]),
            "globalAlpha" => Self::GlobalAlpha(d[0]),
            "rotate" => Self::Rotate(d[0]),
            "moveTo" => Self::MoveTo { x: d[0], y: d[1] },
            "lineTo" => Self::LineTo { x: d[0], y: d[1] },
            "translate" => Self::Translate { x: d[0], y: d[1] },
            "scale" => Self::Scale { x: d[0], y: d[1] },
            "rect" => Self::Rect {
                x: d[0],
                y: d[1],
                width: d[2],
                height: d[3],
            },
            "clearRect" => Self::ClearRect {
                x: d[0],
                y: d[1],
                width: d[2],
                height: d[3],
            },
            "quadraticCurveTo" => Self::QuadraticCurveTo {
                cpx: d[0],
                cpy: d[1],
                x: d[2],
                y: d[3],
            },
            "bezierCurveTo" => Self::BezierCurveTo {
                cp1x: d[0],
                cp1y: d[1],
                cp2x: d[2],
                cp2y: d[3],
                x: d[4],
                y: d[5],
            },
            "transform" => Self::Transform([d[0], d[1], d[2], d[3], d[4], d[5]]),
            "setTransform" => Self::SetTransform([d[0], d[1], d[2], d[3], d[4], d[5]]),
            "arc" => Self::Arc {
                x: d[0],
                y: d[1],
                radius: d[2],
                start_angle: d[3],
                end_angle: d[4],
                anticlockwise: booleans[0],
            },
            "lineCap" => Self::LineCap(strings[0].parse().ok()?),
            "lineJoin" => Self::LineJoin(strings[0].parse().ok()?),
            "textAlign" => Self::TextAlign(strings[0].parse().ok()?),
            "textBaseline" => Self::TextBaseline(strings[0].parse().ok()?),
            "fillStyle" => Self::FillStyle(Color::rgba(colors[0], colors[1], colors[2], colors[3])),
            "strokeStyle" => {
                Self::StrokeStyle(Color::rgba(colors[0], colors[1], colors[2], colors[3]))
            }
            "font" => Self::Font(Font {
                family: strings[0]
                    .split(',')
                    .map(str::trim)
                    .filter(|f| !f.is_empty())
                    .map(str::to_string)
                    .collect(),
                size: d[0],
                bold: booleans[0],
                italic: booleans[1],
            }),
            "fillText" => Self::FillText {
                text: strings[0].clone(),
                x: d[0],
                y: d[1],
            },
            "strokeText" => Self::StrokeText {
                text: strings[0].clone(),
                x: d[0],
                y: d[1],
            },
            _ => return None,
        };
        Some(instruction)
    }
}
