use std::collections::HashMap;

use native_bridge_protocol::{Color, DrawInstruction, PackedOperations};

/// Append-only builder of the columnar draw payload of one context.
///
/// The name table survives [`finish`](Self::finish): a name is transmitted
/// once per context, later payloads refer to it by index. The argument
/// columns start empty after every `finish`.
#[derive(Debug, Default)]
pub struct OperationPacker {
    table: HashMap<&'static str, u32>,
    pending: PackedOperations,
}

impl OperationPacker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instructions packed since the last `finish`.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn push(&mut self, instruction: &DrawInstruction) {
        let index = self.index_of(instruction.name());
        self.pending.indices.push(index);

        match instruction {
            DrawInstruction::BeginPath
            | DrawInstruction::ClosePath
            | DrawInstruction::Fill
            | DrawInstruction::Stroke
            | DrawInstruction::Save
            | DrawInstruction::Restore => {}
            DrawInstruction::MoveTo { x, y }
            | DrawInstruction::LineTo { x, y }
            | DrawInstruction::Translate { x, y }
            | DrawInstruction::Scale { x, y } => self.doubles(&[*x, *y]),
            DrawInstruction::Rect {
                x,
                y,
                width,
                height,
            }
            | DrawInstruction::ClearRect {
                x,
                y,
                width,
                height,
            } => self.doubles(&[*x, *y, *width, *height]),
            DrawInstruction::Arc {
                x,
                y,
                radius,
                start_angle,
                end_angle,
                anticlockwise,
            } => {
                self.doubles(&[*x, *y, *radius, *start_angle, *end_angle]);
                self.pending.booleans.push(*anticlockwise);
            }
            DrawInstruction::QuadraticCurveTo { cpx, cpy, x, y } => {
                self.doubles(&[*cpx, *cpy, *x, *y]);
            }
            DrawInstruction::BezierCurveTo {
                cp1x,
                cp1y,
                cp2x,
                cp2y,
                x,
                y,
            } => self.doubles(&[*cp1x, *cp1y, *cp2x, *cp2y, *x, *y]),
            DrawInstruction::LineWidth(v)
            | DrawInstruction::GlobalAlpha(v)
            | DrawInstruction::Rotate(v) => self.doubles(&[*v]),
            DrawInstruction::LineCap(cap) => self.string(cap.as_str()),
            DrawInstruction::LineJoin(join) => self.string(join.as_str()),
            DrawInstruction::TextAlign(align) => self.string(align.as_str()),
            DrawInstruction::TextBaseline(baseline) => self.string(baseline.as_str()),
            DrawInstruction::FillStyle(color) | DrawInstruction::StrokeStyle(color) => {
                self.color(*color);
            }
            DrawInstruction::Font(font) => {
                self.doubles(&[font.size]);
                self.pending.booleans.extend([font.bold, font.italic]);
                self.string(&font.family.join(", "));
            }
            DrawInstruction::FillText { text, x, y } | DrawInstruction::StrokeText { text, x, y } => {
                self.doubles(&[*x, *y]);
                self.pending.booleans.extend([false, false, false]);
                self.string(text);
            }
            DrawInstruction::SetTransform(m) | DrawInstruction::Transform(m) => self.doubles(m),
        }
    }

    /// Take the packed instructions, if any, and start a new payload.
    pub fn finish(&mut self) -> Option<PackedOperations> {
        if self.pending.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.pending))
    }

    fn index_of(&mut self, name: &'static str) -> u32 {
        if let Some(&index) = self.table.get(name) {
            return index;
        }
        let index = self.table.len() as u32;
        self.table.insert(name, index);
        self.pending.names.push(name.to_string());
        index
    }

    fn doubles(&mut self, values: &[f64]) {
        self.pending.doubles.extend_from_slice(values);
    }

    fn string(&mut self, value: &str) {
        self.pending.strings.push(value.to_string());
    }

    fn color(&mut self, color: Color) {
        self.pending.colors.extend(<[u8; 4]>::from(color));
    }
}
