use native_bridge_protocol::{Color, Font, LineCap, LineJoin, TextAlign, TextBaseline};

/// 2D affine transform `[a, b, c, d, e, f]`, mapping
/// `(x, y)` to `(a*x + c*y + e, b*x + d*y + f)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix(pub [f64; 6]);

impl Matrix {
    pub const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    /// `self × other`: `other` is applied first.
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        let [a1, b1, c1, d1, e1, f1] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Matrix([
            a1 * a2 + c1 * b2,
            b1 * a2 + d1 * b2,
            a1 * c2 + c1 * d2,
            b1 * c2 + d1 * d2,
            a1 * e2 + c1 * f2 + e1,
            b1 * e2 + d1 * f2 + f1,
        ])
    }

    pub fn translation(x: f64, y: f64) -> Matrix {
        Matrix([1.0, 0.0, 0.0, 1.0, x, y])
    }

    pub fn scaling(x: f64, y: f64) -> Matrix {
        Matrix([x, 0.0, 0.0, y, 0.0, 0.0])
    }

    pub fn rotation(angle: f64) -> Matrix {
        let (sin, cos) = angle.sin_cos();
        Matrix([cos, sin, -sin, cos, 0.0, 0.0])
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let [a, b, c, d, e, f] = self.0;
        (a * x + c * y + e, b * x + d * y + f)
    }
}

/// Mutable drawing state of a context, as saved by `save` and restored by
/// `restore`.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawingState {
    pub line_width: f64,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub fill_style: Color,
    pub stroke_style: Color,
    pub text_align: TextAlign,
    pub text_baseline: TextBaseline,
    pub font: Font,
    pub global_alpha: f64,
    pub transform: Matrix,
}

impl DrawingState {
    pub fn new(font: Font) -> Self {
        Self {
            line_width: 1.0,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            fill_style: Color::BLACK,
            stroke_style: Color::BLACK,
            text_align: TextAlign::Start,
            text_baseline: TextBaseline::Alphabetic,
            font,
            global_alpha: 1.0,
            transform: Matrix::IDENTITY,
        }
    }
}
