use native_bridge_protocol::Font;

/// Parse a CSS-like font shorthand: `[italic] [bold] <size>px [family, ...]`.
///
/// Style and weight keywords may appear in any order before the size.
/// `normal` is accepted and ignored; numeric weights of 600 and above count
/// as bold. A missing family list means the host's default family.
pub fn parse(text: &str) -> Option<Font> {
    let mut font = Font {
        family: Vec::new(),
        size: 0.0,
        bold: false,
        italic: false,
    };
    let mut rest = text.trim();
    loop {
        let (token, tail) = match rest.split_once(char::is_whitespace) {
            Some((token, tail)) => (token, tail.trim_start()),
            None => (rest, ""),
        };
        if token.is_empty() {
            return None;
        }
        match token {
            "italic" | "oblique" => font.italic = true,
            "bold" | "bolder" => font.bold = true,
            "normal" => {}
            _ => {
                if let Ok(weight) = token.parse::<u16>() {
                    font.bold = weight >= 600;
                } else {
                    font.size = parse_size(token)?;
                    font.family = parse_families(tail);
                    return Some(font);
                }
            }
        }
        rest = tail;
    }
}

fn parse_size(token: &str) -> Option<f64> {
    let size: f64 = token.strip_suffix("px")?.parse().ok()?;
    (size.is_finite() && size > 0.0).then_some(size)
}

fn parse_families(list: &str) -> Vec<String> {
    list.split(',')
        .map(|f| f.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
        .filter(|f| !f.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_and_family() {
        let font = parse("10px sans-serif");
        assert_eq!(
            font,
            Some(Font {
                family: vec!["sans-serif".into()],
                size: 10.0,
                bold: false,
                italic: false,
            })
        );
    }

    #[test]
    fn style_flags_and_family_list() {
        let font = parse("italic bold 12px \"Helvetica Neue\", Arial").unwrap();
        assert!(font.italic);
        assert!(font.bold);
        assert_eq!(font.size, 12.0);
        assert_eq!(font.family, vec!["Helvetica Neue", "Arial"]);
    }

    #[test]
    fn numeric_weight() {
        assert!(parse("700 8px serif").is_some_and(|f| f.bold));
        assert!(parse("400 8px serif").is_some_and(|f| !f.bold));
    }

    #[test]
    fn missing_family_is_allowed() {
        assert!(parse("14px").is_some_and(|f| f.family.is_empty()));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("huge serif"), None);
        assert_eq!(parse("-3px serif"), None);
        assert_eq!(parse("bold"), None);
    }
}
