// SVG text helpers
// Author: kelexine (https://github.com/kelexine)

use std::f64::consts::PI;

/// Escape text for use in SVG element content and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            // Control characters are not allowed in XML 1.0
            c if c.is_control() && c != '\n' && c != '\t' => {}
            c => out.push(c),
        }
    }
    out
}

/// Coordinate with exactly two decimals. Negative zero prints as `0.00`.
pub fn num(value: f64) -> String {
    let formatted = format!("{:.2}", value);
    if formatted == "-0.00" {
        "0.00".to_string()
    } else {
        formatted
    }
}

/// Cut a display name to `cap` characters, ending with an ellipsis.
pub fn truncate_name(name: &str, cap: usize) -> String {
    if name.chars().count() <= cap {
        return name.to_string();
    }
    let mut out: String = name.chars().take(cap.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Point on a circle; angle in degrees, 0° at three o'clock, clockwise.
pub fn polar(cx: f64, cy: f64, radius: f64, degrees: f64) -> (f64, f64) {
    let radians = degrees * PI / 180.0;
    (cx + radius * radians.cos(), cy + radius * radians.sin())
}

pub fn open_document(out: &mut String, width: f64, height: f64, label: &str) {
    out.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" role=\"img\" aria-label=\"{label}\">",
        w = num(width),
        h = num(height),
        label = escape(label),
    ));
}

pub fn close_document(out: &mut String) {
    out.push_str("</svg>");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_markup() {
        assert_eq!(
            escape("<a href=\"x\">Tom & 'Jerry'</a>"),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
        assert_eq!(escape("bell\u{7}"), "bell");
    }

    #[test]
    fn test_num_two_decimals() {
        assert_eq!(num(1.0), "1.00");
        assert_eq!(num(2.005_1), "2.01");
        assert_eq!(num(-0.0001), "0.00");
    }

    #[test]
    fn test_truncate_name() {
        assert_eq!(truncate_name("Rust", 14), "Rust");
        assert_eq!(truncate_name("ExactlyFourtee", 14), "ExactlyFourtee");
        assert_eq!(truncate_name("Jupyter Notebook", 14), "Jupyter Noteb…");
        assert_eq!(truncate_name("Jupyter Notebook", 14).chars().count(), 14);
    }

    #[test]
    fn test_polar_top_of_circle() {
        let (x, y) = polar(10.0, 10.0, 5.0, -90.0);
        assert!((x - 10.0).abs() < 1e-9);
        assert!((y - 5.0).abs() < 1e-9);
    }
}
