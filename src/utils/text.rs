//! Text processing utilities.

/// Truncate to at most `max_chars` characters without splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Case-insensitive substring test against any of `keywords`.
pub fn contains_any(text: &str, keywords: &[&str]) -> bool {
    let lowered = text.to_lowercase();
    keywords.iter().any(|k| lowered.contains(k))
}

/// Trim trailing zeros from a decimal rendering ("2.500" -> "2.5", "3.000" -> "3").
pub fn trim_decimal(value: f64, precision: usize) -> String {
    let rendered = format!("{:.*}", precision, value);
    let trimmed = if rendered.contains('.') {
        rendered.trim_end_matches('0').trim_end_matches('.')
    } else {
        rendered.as_str()
    };
    match trimmed {
        "-0" => "0".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("hi", 10), "hi");
        assert_eq!(truncate_chars("ééé", 2), "éé");
        assert_eq!(truncate_chars("", 5), "");
    }

    #[test]
    fn test_contains_any() {
        assert!(contains_any("Please PLOT sin(x)", &["plot", "graph"]));
        assert!(!contains_any("What is a cell?", &["plot", "graph"]));
    }

    #[test]
    fn test_trim_decimal() {
        assert_eq!(trim_decimal(2.5, 4), "2.5");
        assert_eq!(trim_decimal(3.0, 4), "3");
        assert_eq!(trim_decimal(-1.41421356, 4), "-1.4142");
        assert_eq!(trim_decimal(-0.00001, 4), "0");
    }
}
