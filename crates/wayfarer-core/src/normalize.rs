//! Cleaning of raw recognizer output into candidate place names.
//!
//! WordPiece recognizers mark sub-word continuations with `##`. When a span
//! begins part-way through a word the marker leaks into the grouped text
//! (e.g. `"New ##York"`), so it is stripped before any further use.
//!
//! The length filter is a noise heuristic, not a correctness check: real
//! two-letter places are deliberately excluded along with recognizer debris.

/// Sub-word continuation marker emitted by WordPiece tokenizers.
pub const CONTINUATION_MARKER: &str = "##";

/// Minimum cleaned name length, in characters, for a candidate to be kept.
pub const MIN_PLACE_NAME_LEN: usize = 3;

/// Strip continuation markers and surrounding whitespace.
///
/// `"New ##York"` → `"New York"`, `"  ##burg "` → `"burg"`.
pub fn normalize(raw: &str) -> String {
    raw.replace(CONTINUATION_MARKER, "").trim().to_string()
}

/// True if a cleaned name is long enough to be worth resolving.
///
/// Length is counted in characters so that non-ASCII names are not
/// over-counted.
pub fn is_valid(name: &str) -> bool {
    name.chars().count() >= MIN_PLACE_NAME_LEN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_inner_marker() {
        assert_eq!(normalize("New ##York"), "New York");
    }

    #[test]
    fn strips_leading_marker_and_whitespace() {
        assert_eq!(normalize("  ##burg "), "burg");
        assert_eq!(normalize("##ville"), "ville");
    }

    #[test]
    fn strips_every_marker() {
        assert_eq!(normalize("San##ta Fe"), "Santa Fe");
        assert_eq!(normalize("Sa ##n Fr ##an"), "Sa n Fr an");
        assert_eq!(normalize("####"), "");
    }

    #[test]
    fn plain_names_unchanged() {
        assert_eq!(normalize("Paris"), "Paris");
        assert_eq!(normalize("Eiffel Tower"), "Eiffel Tower");
    }

    #[test]
    fn lone_hash_is_kept() {
        assert_eq!(normalize("#1 Beach"), "#1 Beach");
    }

    #[test]
    fn length_threshold() {
        assert!(!is_valid(""));
        assert!(!is_valid("NY"));
        assert!(is_valid("Rio"));
        assert!(is_valid("Paris"));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        // Two characters, four bytes.
        assert!(!is_valid("Åö"));
        assert!(is_valid("Åre"));
    }

    #[test]
    fn marker_only_candidate_is_invalid() {
        assert!(!is_valid(&normalize(" ## ")));
    }
}
