// 🔤 Name Normalization
// Identity keys for deduplication and matching, plus display-name cleanup

use regex::Regex;
use std::sync::OnceLock;

/// Identity key: lowercase, internal whitespace collapsed to single spaces
///
/// "  AESTHETICS &   Dermatology " → "aesthetics & dermatology"
pub fn normalize_name(s: &str) -> String {
    collapse_whitespace(s).to_lowercase()
}

pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn title_without_space_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Two/three-letter title abbreviation glued to a capitalized word: "Dr.Sarah"
    RE.get_or_init(|| {
        Regex::new(r"\b([A-Z][a-z]{1,2})\.(\p{Lu})").expect("invalid title regex")
    })
}

/// Canonical display name of a practitioner
///
/// - "Dr.Sarah Mohamed" → "Dr. Sarah Mohamed"
/// - "Dr Anna Zakhozha" → "Dr. Anna Zakhozha"
/// - runs of whitespace collapse to one space
pub fn canonical_practitioner_name(raw: &str) -> String {
    let collapsed = collapse_whitespace(raw);
    let spaced = title_without_space_re()
        .replace_all(&collapsed, "$1. $2")
        .into_owned();

    match spaced.strip_prefix("Dr ") {
        Some(rest) => format!("Dr. {}", rest),
        None => spaced,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name_case_and_spaces() {
        assert_eq!(
            normalize_name("AESTHETICS & DERMATOLOGY"),
            normalize_name("  aesthetics &  dermatology")
        );
        assert_eq!(normalize_name("Botox"), "botox");
        assert_eq!(normalize_name("   "), "");
    }

    #[test]
    fn test_practitioner_missing_space_after_title() {
        assert_eq!(canonical_practitioner_name("Dr.Sarah Mohamed"), "Dr. Sarah Mohamed");
        assert_eq!(canonical_practitioner_name("Mrs.Olga Petrova"), "Mrs. Olga Petrova");
        assert_eq!(canonical_practitioner_name("Ms.Jane Doe"), "Ms. Jane Doe");
    }

    #[test]
    fn test_practitioner_already_canonical() {
        assert_eq!(canonical_practitioner_name("Dr. Anna Zakhozha"), "Dr. Anna Zakhozha");
        assert_eq!(canonical_practitioner_name("Nurse Maria"), "Nurse Maria");
    }

    #[test]
    fn test_practitioner_dr_without_period() {
        assert_eq!(canonical_practitioner_name("Dr Anna Zakhozha"), "Dr. Anna Zakhozha");
    }

    #[test]
    fn test_practitioner_whitespace_collapsed() {
        assert_eq!(canonical_practitioner_name("  Dr.  Anna   Zakhozha "), "Dr. Anna Zakhozha");
    }

    #[test]
    fn test_lowercase_after_period_untouched() {
        // Not a title followed by a name
        assert_eq!(canonical_practitioner_name("St.john"), "St.john");
    }
}
