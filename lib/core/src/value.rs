//! Canonical handling of missing field values.
//!
//! Upstream data marks a missing value in several ways: `"NA"`,
//! `"Not Available"`, `"unknown"`, an empty string or an actual null.
//! All of them collapse to `None` at ingestion and nothing past the
//! boundary compares against sentinel strings again.

/// Strings treated as a missing value (compared trimmed, ASCII case-insensitive)
pub const MISSING_SENTINELS: [&str; 3] = ["na", "not available", "unknown"];

/// Returns true if the raw string denotes a missing value
pub fn is_missing(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty()
        || MISSING_SENTINELS
            .iter()
            .any(|sentinel| trimmed.eq_ignore_ascii_case(sentinel))
}

/// Normalize a raw field value: trimmed text, or `None` when missing
pub fn normalize_value(raw: Option<&str>) -> Option<String> {
    match raw {
        Some(value) if !is_missing(value) => Some(value.trim().to_string()),
        _ => None,
    }
}

/// Exact-match test used by the similarity override: equal after trimming
/// and case folding.
pub fn texts_match(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels_are_missing() {
        for raw in ["NA", "na", " Not Available ", "unknown", "UNKNOWN", "", "   "] {
            assert!(is_missing(raw), "{raw:?} should be missing");
            assert_eq!(normalize_value(Some(raw)), None);
        }
        assert_eq!(normalize_value(None), None);
    }

    #[test]
    fn test_real_values_are_kept_trimmed() {
        assert_eq!(normalize_value(Some("  Metformin ")), Some("Metformin".to_string()));
        // Words that merely contain a sentinel are real values
        assert!(!is_missing("unknown etiology"));
        assert!(!is_missing("NAC"));
    }

    #[test]
    fn test_texts_match() {
        assert!(texts_match("Metformin", "metformin "));
        assert!(texts_match("Ärzte", "ärzte"));
        assert!(!texts_match("Metformin", "Insulin"));
    }
}
