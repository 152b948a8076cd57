//! Canvas drawing contexts.
//!
//! A [`CanvasContext`] keeps the drawing state locally and packs every
//! drawing call into an [`OperationPacker`]. On flush the bridge turns each
//! non-empty packer into exactly one `draw` call on the context's native GC.

pub mod metrics;
pub mod packer;
pub mod state;

use std::cell::RefCell;
use std::rc::Rc;

use native_bridge_protocol::{
    DrawInstruction, Font, LineCap, LineJoin, ObjectId, PackedOperations, Properties,
    TextAlign, TextBaseline,
};
use serde_json::{Value, json};

use crate::bridge::Bridge;
use crate::codec::{color, font};
use crate::error::{BridgeError, InvalidValue, UsageError};
use crate::proxy::Proxy;

pub use metrics::TextMetrics;
pub use packer::OperationPacker;
pub use state::{DrawingState, Matrix};

/// Type tag of the native graphics context behind a canvas.
pub const GC_TYPE: &str = "_GC";

const FALLBACK_FONT: &str = "10px sans-serif";

#[derive(Debug)]
pub(crate) struct ContextState {
    canvas: ObjectId,
    gc: ObjectId,
    width: f64,
    height: f64,
    current: DrawingState,
    saved: Vec<DrawingState>,
    packer: OperationPacker,
}

impl ContextState {
    pub(crate) fn gc(&self) -> ObjectId {
        self.gc
    }

    pub(crate) fn has_pending(&self) -> bool {
        !self.packer.is_empty()
    }

    pub(crate) fn take_packed(&mut self) -> Option<PackedOperations> {
        self.packer.finish()
    }
}

/// JSON form of a number for diagnostics: integral values without a
/// fraction, so `-1.0` reads as `-1`.
fn number_value(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9.0e15 {
        json!(n as i64)
    } else {
        json!(n)
    }
}

impl Bridge {
    /// The drawing context of a canvas widget, sized `width` × `height`.
    ///
    /// The native GC is created on first use and reused while it lives. Every
    /// call (re)initializes the native drawing surface immediately, outside
    /// the batch.
    pub fn get_context(&self, canvas: &Proxy, width: f64, height: f64) -> Result<CanvasContext, BridgeError> {
        if !self.is_live(canvas.id()) {
            return Err(UsageError::Disposed(canvas.id()).into());
        }
        let existing = self
            .state()
            .contexts
            .iter()
            .find(|c| c.borrow().canvas == canvas.id())
            .cloned();
        // A GC disposed on its own leaves its context behind; start over.
        let existing = match existing {
            Some(state) if self.is_live(state.borrow().gc) => Some(state),
            Some(stale) => {
                self.state().contexts.retain(|c| !Rc::ptr_eq(c, &stale));
                None
            }
            None => None,
        };

        let context = match existing {
            Some(state) => CanvasContext {
                bridge: self.clone(),
                state,
            },
            None => {
                let gc = self.create_child(canvas, GC_TYPE, Properties::new())?;
                let configured = self.config().canvas_font;
                let initial_font = font::parse(&configured)
                    .or_else(|| font::parse(FALLBACK_FONT))
                    .unwrap_or_else(|| Font {
                        family: Vec::new(),
                        size: 10.0,
                        bold: false,
                        italic: false,
                    });
                let state = Rc::new(RefCell::new(ContextState {
                    canvas: canvas.id(),
                    gc: gc.id(),
                    width,
                    height,
                    current: DrawingState::new(initial_font),
                    saved: Vec::new(),
                    packer: OperationPacker::new(),
                }));
                self.state().contexts.push(Rc::clone(&state));
                CanvasContext {
                    bridge: self.clone(),
                    state,
                }
            }
        };
        context.init(width, height)?;
        Ok(context)
    }
}

/// 2D drawing context bound to a native GC.
///
/// Style setters validate locally: a rejected value is reported as a
/// diagnostic and the previous value stays in effect. Instructions issued
/// after the GC is disposed are dropped.
#[derive(Clone)]
pub struct CanvasContext {
    bridge: Bridge,
    state: Rc<RefCell<ContextState>>,
}

impl std::fmt::Debug for CanvasContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanvasContext")
            .field("gc", &self.gc_id())
            .finish_non_exhaustive()
    }
}

impl PartialEq for CanvasContext {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl CanvasContext {
    pub fn gc_id(&self) -> ObjectId {
        self.state.borrow().gc
    }

    pub fn canvas_width(&self) -> f64 {
        self.state.borrow().width
    }

    pub fn canvas_height(&self) -> f64 {
        self.state.borrow().height
    }

    /// Instructions waiting for the next flush.
    pub fn pending_len(&self) -> usize {
        self.state.borrow().packer.len()
    }

    fn init(&self, width: f64, height: f64) -> Result<(), BridgeError> {
        let gc = {
            let mut state = self.state.borrow_mut();
            state.width = width;
            state.height = height;
            state.gc
        };
        let mut parameters = Properties::new();
        parameters.insert("width".into(), number_value(width));
        parameters.insert("height".into(), number_value(height));
        self.bridge.call_now(gc, "init", parameters)
    }

    fn push(&self, instruction: DrawInstruction) {
        let gc = self.gc_id();
        if !self.bridge.is_live(gc) {
            return;
        }
        self.state.borrow_mut().packer.push(&instruction);
    }

    fn reject(&self, property: &str, value: Value) {
        self.bridge.report(InvalidValue::new(property, value));
    }

    /// Reports the first non-finite argument of `operation`. The packed
    /// payload is JSON, which has no NaN or infinities.
    fn finite(&self, operation: &str, values: &[f64]) -> bool {
        match values.iter().find(|v| !v.is_finite()) {
            Some(bad) => {
                self.reject(operation, number_value(*bad));
                false
            }
            None => true,
        }
    }

    // --- Paths ---

    pub fn begin_path(&self) {
        self.push(DrawInstruction::BeginPath);
    }

    pub fn close_path(&self) {
        self.push(DrawInstruction::ClosePath);
    }

    pub fn move_to(&self, x: f64, y: f64) {
        if !self.finite("moveTo", &[x, y]) {
            return;
        }
        self.push(DrawInstruction::MoveTo { x, y });
    }

    pub fn line_to(&self, x: f64, y: f64) {
        if !self.finite("lineTo", &[x, y]) {
            return;
        }
        self.push(DrawInstruction::LineTo { x, y });
    }

    pub fn rect(&self, x: f64, y: f64, width: f64, height: f64) {
        if !self.finite("rect", &[x, y, width, height]) {
            return;
        }
        self.push(DrawInstruction::Rect {
            x,
            y,
            width,
            height,
        });
    }

    pub fn arc(&self, x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64, anticlockwise: bool) {
        if !self.finite("arc", &[x, y, radius, start_angle, end_angle]) {
            return;
        }
        self.push(DrawInstruction::Arc {
            x,
            y,
            radius,
            start_angle,
            end_angle,
            anticlockwise,
        });
    }

    pub fn quadratic_curve_to(&self, cpx: f64, cpy: f64, x: f64, y: f64) {
        if !self.finite("quadraticCurveTo", &[cpx, cpy, x, y]) {
            return;
        }
        self.push(DrawInstruction::QuadraticCurveTo { cpx, cpy, x, y });
    }

    pub fn bezier_curve_to(&self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) {
        if !self.finite("bezierCurveTo", &[cp1x, cp1y, cp2x, cp2y, x, y]) {
            return;
        }
        self.push(DrawInstruction::BezierCurveTo {
            cp1x,
            cp1y,
            cp2x,
            cp2y,
            x,
            y,
        });
    }

    pub fn fill(&self) {
        self.push(DrawInstruction::Fill);
    }

    pub fn stroke(&self) {
        self.push(DrawInstruction::Stroke);
    }

    pub fn clear_rect(&self, x: f64, y: f64, width: f64, height: f64) {
        if !self.finite("clearRect", &[x, y, width, height]) {
            return;
        }
        self.push(DrawInstruction::ClearRect {
            x,
            y,
            width,
            height,
        });
    }

    /// `beginPath`, `rect`, `fill`.
    pub fn fill_rect(&self, x: f64, y: f64, width: f64, height: f64) {
        if !self.finite("fillRect", &[x, y, width, height]) {
            return;
        }
        self.begin_path();
        self.rect(x, y, width, height);
        self.fill();
    }

    /// `beginPath`, `rect`, `stroke`.
    pub fn stroke_rect(&self, x: f64, y: f64, width: f64, height: f64) {
        if !self.finite("strokeRect", &[x, y, width, height]) {
            return;
        }
        self.begin_path();
        self.rect(x, y, width, height);
        self.stroke();
    }

    // --- State stack ---

    pub fn save(&self) {
        {
            let mut state = self.state.borrow_mut();
            let snapshot = state.current.clone();
            state.saved.push(snapshot);
        }
        self.push(DrawInstruction::Save);
    }

    /// Pops the saved state. With an empty stack the state is unchanged;
    /// the instruction is sent either way so the host's stack stays in step.
    pub fn restore(&self) {
        {
            let mut state = self.state.borrow_mut();
            if let Some(previous) = state.saved.pop() {
                state.current = previous;
            }
        }
        self.push(DrawInstruction::Restore);
    }

    // --- Transforms ---

    pub fn set_transform(&self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) {
        let m = [a, b, c, d, e, f];
        if !self.finite("setTransform", &m) {
            return;
        }
        self.state.borrow_mut().current.transform = Matrix(m);
        self.push(DrawInstruction::SetTransform(m));
    }

    pub fn transform(&self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) {
        let m = [a, b, c, d, e, f];
        if !self.finite("transform", &m) {
            return;
        }
        self.apply_transform(&Matrix(m));
        self.push(DrawInstruction::Transform(m));
    }

    pub fn translate(&self, x: f64, y: f64) {
        if !self.finite("translate", &[x, y]) {
            return;
        }
        self.apply_transform(&Matrix::translation(x, y));
        self.push(DrawInstruction::Translate { x, y });
    }

    pub fn rotate(&self, angle: f64) {
        if !self.finite("rotate", &[angle]) {
            return;
        }
        self.apply_transform(&Matrix::rotation(angle));
        self.push(DrawInstruction::Rotate(angle));
    }

    pub fn scale(&self, x: f64, y: f64) {
        if !self.finite("scale", &[x, y]) {
            return;
        }
        self.apply_transform(&Matrix::scaling(x, y));
        self.push(DrawInstruction::Scale { x, y });
    }

    pub fn current_transform(&self) -> Matrix {
        self.state.borrow().current.transform
    }

    fn apply_transform(&self, m: &Matrix) {
        let mut state = self.state.borrow_mut();
        state.current.transform = state.current.transform.multiply(m);
    }

    // --- Text ---

    pub fn fill_text(&self, text: &str, x: f64, y: f64) {
        if !self.finite("fillText", &[x, y]) {
            return;
        }
        self.push(DrawInstruction::FillText {
            text: text.to_string(),
            x,
            y,
        });
    }

    pub fn stroke_text(&self, text: &str, x: f64, y: f64) {
        if !self.finite("strokeText", &[x, y]) {
            return;
        }
        self.push(DrawInstruction::StrokeText {
            text: text.to_string(),
            x,
            y,
        });
    }

    /// Computed locally from the current font; never queued.
    pub fn measure_text(&self, text: &str) -> TextMetrics {
        metrics::measure(text, &self.state.borrow().current.font)
    }

    // --- Styles ---

    pub fn line_width(&self) -> f64 {
        self.state.borrow().current.line_width
    }

    pub fn set_line_width(&self, width: f64) {
        if !(width.is_finite() && width > 0.0) {
            self.reject("lineWidth", number_value(width));
            return;
        }
        self.state.borrow_mut().current.line_width = width;
        self.push(DrawInstruction::LineWidth(width));
    }

    pub fn global_alpha(&self) -> f64 {
        self.state.borrow().current.global_alpha
    }

    pub fn set_global_alpha(&self, alpha: f64) {
        if !(alpha.is_finite() && (0.0..=1.0).contains(&alpha)) {
            self.reject("globalAlpha", number_value(alpha));
            return;
        }
        self.state.borrow_mut().current.global_alpha = alpha;
        self.push(DrawInstruction::GlobalAlpha(alpha));
    }

    pub fn line_cap(&self) -> &'static str {
        self.state.borrow().current.line_cap.as_str()
    }

    pub fn set_line_cap(&self, value: &str) {
        match value.parse::<LineCap>() {
            Ok(cap) => {
                self.state.borrow_mut().current.line_cap = cap;
                self.push(DrawInstruction::LineCap(cap));
            }
            Err(_) => self.reject("lineCap", json!(value)),
        }
    }

    pub fn line_join(&self) -> &'static str {
        self.state.borrow().current.line_join.as_str()
    }

    pub fn set_line_join(&self, value: &str) {
        match value.parse::<LineJoin>() {
            Ok(join) => {
                self.state.borrow_mut().current.line_join = join;
                self.push(DrawInstruction::LineJoin(join));
            }
            Err(_) => self.reject("lineJoin", json!(value)),
        }
    }

    pub fn text_align(&self) -> &'static str {
        self.state.borrow().current.text_align.as_str()
    }

    pub fn set_text_align(&self, value: &str) {
        match value.parse::<TextAlign>() {
            Ok(align) => {
                self.state.borrow_mut().current.text_align = align;
                self.push(DrawInstruction::TextAlign(align));
            }
            Err(_) => self.reject("textAlign", json!(value)),
        }
    }

    pub fn text_baseline(&self) -> &'static str {
        self.state.borrow().current.text_baseline.as_str()
    }

    pub fn set_text_baseline(&self, value: &str) {
        match value.parse::<TextBaseline>() {
            Ok(baseline) => {
                self.state.borrow_mut().current.text_baseline = baseline;
                self.push(DrawInstruction::TextBaseline(baseline));
            }
            Err(_) => self.reject("textBaseline", json!(value)),
        }
    }

    /// Current fill color in accessor form, e.g. `rgba(0, 0, 0, 1)`.
    pub fn fill_style(&self) -> String {
        self.state.borrow().current.fill_style.to_css()
    }

    pub fn set_fill_style(&self, value: &str) {
        match color::parse(value) {
            Some(c) => {
                self.state.borrow_mut().current.fill_style = c;
                self.push(DrawInstruction::FillStyle(c));
            }
            None => self.reject("fillStyle", json!(value)),
        }
    }

    pub fn stroke_style(&self) -> String {
        self.state.borrow().current.stroke_style.to_css()
    }

    pub fn set_stroke_style(&self, value: &str) {
        match color::parse(value) {
            Some(c) => {
                self.state.borrow_mut().current.stroke_style = c;
                self.push(DrawInstruction::StrokeStyle(c));
            }
            None => self.reject("strokeStyle", json!(value)),
        }
    }

    pub fn font(&self) -> String {
        self.state.borrow().current.font.to_css()
    }

    pub fn set_font(&self, value: &str) {
        match font::parse(value) {
            Some(f) => {
                self.state.borrow_mut().current.font = f.clone();
                self.push(DrawInstruction::Font(f));
            }
            None => self.reject("font", json!(value)),
        }
    }

    /// Current drawing state, for inspection.
    pub fn drawing_state(&self) -> DrawingState {
        self.state.borrow().current.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_numbers_are_reported_without_fraction() {
        assert_eq!(number_value(-1.0), json!(-1));
        assert_eq!(number_value(0.5), json!(0.5));
        assert!(number_value(f64::NAN).is_null());
    }
}
