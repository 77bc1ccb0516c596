/// Truncate a string to a maximum length, adding an ellipsis if needed
pub fn truncate(s: &str, max_len: usize) -> String {
    let cleaned = s.replace('\t', " ");
    let chars: Vec<char> = cleaned.chars().collect();
    if chars.len() <= max_len {
        cleaned
    } else if max_len <= 1 {
        chars.into_iter().take(max_len).collect()
    } else {
        let truncated: String = chars.into_iter().take(max_len - 1).collect();
        format!("{}…", truncated)
    }
}

/// Format an ISO timestamp to a readable date
pub fn format_date(date: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(date) {
        dt.format("%b %d, %Y").to_string()
    } else if date.len() >= 10 {
        date.chars().take(10).collect()
    } else {
        date.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Citadel", 10), "Citadel");
        assert_eq!(truncate("Interdimensional Cable", 10), "Interdime…");
        assert_eq!(truncate("ok", 2), "ok");
        assert_eq!(truncate("abc", 1), "a");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2017-11-04T18:48:46.250Z"), "Nov 04, 2017");
        assert_eq!(format_date("2017-11-04"), "2017-11-04");
        assert_eq!(format_date("n/a"), "n/a");
    }
}
