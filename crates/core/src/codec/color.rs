use native_bridge_protocol::Color;
use serde_json::Value;

const NAMED: &[(&str, Color)] = &[
    ("transparent", Color::rgba(0, 0, 0, 0)),
    ("black", Color::rgb(0, 0, 0)),
    ("silver", Color::rgb(192, 192, 192)),
    ("gray", Color::rgb(128, 128, 128)),
    ("grey", Color::rgb(128, 128, 128)),
    ("white", Color::rgb(255, 255, 255)),
    ("maroon", Color::rgb(128, 0, 0)),
    ("red", Color::rgb(255, 0, 0)),
    ("purple", Color::rgb(128, 0, 128)),
    ("fuchsia", Color::rgb(255, 0, 255)),
    ("green", Color::rgb(0, 128, 0)),
    ("lime", Color::rgb(0, 255, 0)),
    ("olive", Color::rgb(128, 128, 0)),
    ("yellow", Color::rgb(255, 255, 0)),
    ("navy", Color::rgb(0, 0, 128)),
    ("blue", Color::rgb(0, 0, 255)),
    ("teal", Color::rgb(0, 128, 128)),
    ("aqua", Color::rgb(0, 255, 255)),
    ("orange", Color::rgb(255, 165, 0)),
];

/// Parse a CSS color: a named color, `#rgb`, `#rrggbb`, `rgb(r, g, b)` or
/// `rgba(r, g, b, a)` with `a` in `[0, 1]`.
pub fn parse(text: &str) -> Option<Color> {
    let text = text.trim().to_ascii_lowercase();
    if let Some(hex) = text.strip_prefix('#') {
        return parse_hex(hex);
    }
    if let Some(args) = text.strip_prefix("rgba(").and_then(|t| t.strip_suffix(')')) {
        return parse_components(args, true);
    }
    if let Some(args) = text.strip_prefix("rgb(").and_then(|t| t.strip_suffix(')')) {
        return parse_components(args, false);
    }
    NAMED
        .iter()
        .find(|(name, _)| *name == text)
        .map(|(_, color)| *color)
}

/// Accepts either a CSS string or an `[r, g, b]` / `[r, g, b, a]` array
/// (alpha as a fraction).
pub fn parse_value(value: &Value) -> Option<Color> {
    match value {
        Value::String(s) => parse(s),
        Value::Array(items) if items.len() == 3 || items.len() == 4 => {
            let nums: Option<Vec<f64>> = items.iter().map(Value::as_f64).collect();
            let nums = nums?;
            let alpha = nums.get(3).copied().unwrap_or(1.0);
            from_parts(nums[0], nums[1], nums[2], alpha)
        }
        _ => None,
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let mut parts = hex.chars().map(|c| channel(&format!("{c}{c}")));
            Some(Color::rgb(parts.next()??, parts.next()??, parts.next()??))
        }
        6 => Some(Color::rgb(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        )),
        _ => None,
    }
}

fn parse_components(args: &str, with_alpha: bool) -> Option<Color> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    let expected = if with_alpha { 4 } else { 3 };
    if parts.len() != expected {
        return None;
    }
    let nums: Option<Vec<f64>> = parts.iter().map(|p| p.parse::<f64>().ok()).collect();
    let nums = nums?;
    let alpha = if with_alpha { nums[3] } else { 1.0 };
    from_parts(nums[0], nums[1], nums[2], alpha)
}

fn from_parts(r: f64, g: f64, b: f64, alpha: f64) -> Option<Color> {
    let byte = |v: f64| (v.is_finite() && (0.0..=255.0).contains(&v)).then(|| v.round() as u8);
    if !alpha.is_finite() || !(0.0..=1.0).contains(&alpha) {
        return None;
    }
    Some(Color::rgba(
        byte(r)?,
        byte(g)?,
        byte(b)?,
        (alpha * 255.0).round() as u8,
    ))
}
