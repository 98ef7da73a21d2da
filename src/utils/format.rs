// Human-readable formatting helpers
// Author: kelexine (https://github.com/kelexine)

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Format a byte count with binary units and one decimal ("12.5 KB").
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{:.1} {}", value, UNITS[unit])
}

/// Format a percentage for display ("42.3%"); values below 0.1 keep two decimals.
pub fn format_percentage(percentage: f64) -> String {
    if percentage > 0.0 && percentage < 0.1 {
        format!("{:.2}%", percentage)
    } else {
        format!("{:.1}%", percentage)
    }
}

/// Singular/plural suffix helper ("1 repo", "3 repos").
pub fn pluralize(count: usize, singular: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}s", count, singular)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(40.0), "40.0%");
        assert_eq!(format_percentage(33.333), "33.3%");
        assert_eq!(format_percentage(0.05), "0.05%");
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize(1, "repo"), "1 repo");
        assert_eq!(pluralize(0, "repo"), "0 repos");
    }
}
