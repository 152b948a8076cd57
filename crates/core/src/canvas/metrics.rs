use native_bridge_protocol::Font;

/// Result of `measureText`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    pub width: f64,
}

/// Advance of a glyph as a fraction of the font size.
fn advance(c: char) -> f64 {
    match c {
        'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '\'' | '!' | '|' => 0.28,
        'f' | 't' | 'r' | ' ' | '(' | ')' | '[' | ']' | '-' => 0.36,
        'm' | 'w' => 0.83,
        'M' | 'W' => 0.92,
        c if c.is_ascii_uppercase() || c.is_ascii_digit() => 0.64,
        c if c.is_ascii() => 0.55,
        // Wide scripts (CJK and similar) take roughly a full em.
        _ => 1.0,
    }
}

/// Estimate the rendered width of `text` in `font`, without a round trip
/// to the host.
pub fn measure(text: &str, font: &Font) -> TextMetrics {
    let weight = if font.bold { 1.08 } else { 1.0 };
    let ems: f64 = text.chars().map(advance).sum();
    TextMetrics {
        width: ems * font.size * weight,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn font(size: f64, bold: bool) -> Font {
        Font {
            family: vec!["sans-serif".into()],
            size,
            bold,
            italic: false,
        }
    }

    #[test]
    fn width_exceeds_character_count() {
        let metrics = measure("foo", &font(10.0, false));
        assert!(metrics.width > 3.0);
    }

    #[test]
    fn scales_with_size_and_weight() {
        let small = measure("Hello", &font(10.0, false)).width;
        let large = measure("Hello", &font(20.0, false)).width;
        let bold = measure("Hello", &font(10.0, true)).width;
        assert!((large - 2.0 * small).abs() < 1e-9);
        assert!(bold > small);
    }

    #[test]
    fn empty_text_has_no_width() {
        assert_eq!(measure("", &font(12.0, false)).width, 0.0);
    }
}
