use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Address of a remote native object.
///
/// Allocated by the client when a proxy is created and used as the only key
/// of every wire operation. On the wire it is the string `o<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(u64);

impl ObjectId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "o{}", self.0)
    }
}

impl std::str::FromStr for ObjectId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix('o')
            .and_then(|n| n.parse().ok())
            .map(ObjectId)
            .ok_or_else(|| format!("invalid object id: {s}"))
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// An RGBA color with every channel, alpha included, in the 0–255 range.
///
/// This is the wire form. Application code sees alpha as a 0–1 fraction,
/// see [`Color::to_css`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 4]", into = "[u8; 4]")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Alpha as a fraction in `[0, 1]`.
    pub fn alpha(&self) -> f64 {
        f64::from(self.a) / 255.0
    }

    /// Accessor form, e.g. `rgba(255, 0, 0, 1)`.
    pub fn to_css(&self) -> String {
        format!(
            "rgba({}, {}, {}, {})",
            self.r,
            self.g,
            self.b,
            format_fraction(self.alpha())
        )
    }
}

impl From<[u8; 4]> for Color {
    fn from([r, g, b, a]: [u8; 4]) -> Self {
        Self { r, g, b, a }
    }
}

impl From<Color> for [u8; 4] {
    fn from(c: Color) -> Self {
        [c.r, c.g, c.b, c.a]
    }
}

/// Formats a fraction with at most three decimals and no trailing zeros.
fn format_fraction(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    let text = format!("{rounded:.3}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Structured font descriptor.
///
/// Wire form: `[[family, ...], size, bold, italic]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "FontWire", into = "FontWire")]
pub struct Font {
    pub family: Vec<String>,
    pub size: f64,
    pub bold: bool,
    pub italic: bool,
}

type FontWire = (Vec<String>, f64, bool, bool);

impl From<FontWire> for Font {
    fn from((family, size, bold, italic): FontWire) -> Self {
        Self {
            family,
            size,
            bold,
            italic,
        }
    }
}

impl From<Font> for FontWire {
    fn from(font: Font) -> Self {
        (font.family, font.size, font.bold, font.italic)
    }
}

impl Font {
    /// Accessor form, e.g. `italic bold 12px Arial, sans-serif`.
    pub fn to_css(&self) -> String {
        let mut out = String::new();
        if self.italic {
            out.push_str("italic ");
        }
        if self.bold {
            out.push_str("bold ");
        }
        out.push_str(&format!("{}px ", format_fraction(self.size)));
        out.push_str(&self.family.join(", "));
        out
    }
}

/// Widget bounds in device independent pixels. Wire form: `[left, top, width, height]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

impl From<[f64; 4]> for Bounds {
    fn from([left, top, width, height]: [f64; 4]) -> Self {
        Self::new(left, top, width, height)
    }
}

impl From<Bounds> for [f64; 4] {
    fn from(b: Bounds) -> Self {
        [b.left, b.top, b.width, b.height]
    }
}

/// Image reference. Wire form: `[src, width | null, height | null]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ImageWire", into = "ImageWire")]
pub struct ImageSource {
    pub src: String,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

type ImageWire = (String, Option<f64>, Option<f64>);

impl From<ImageWire> for ImageSource {
    fn from((src, width, height): ImageWire) -> Self {
        Self { src, width, height }
    }
}

impl From<ImageSource> for ImageWire {
    fn from(image: ImageSource) -> Self {
        (image.src, image.width, image.height)
    }
}
