//! Text normalisation and tokenisation.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Normalize a string for matching: lowercase, diacritics stripped via NFKD,
/// every non-alphanumeric character mapped to a space, whitespace collapsed.
///
/// Idempotent: `normalize(normalize(s)) == normalize(s)`.
pub fn normalize(s: &str) -> String {
    let stripped: String = s.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    let mapped: String = stripped
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split on whitespace.
pub fn tokenize(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
}

/// The last whitespace-delimited word of length ≥ 2, or empty.
pub fn last_part(s: &str) -> String {
    s.split_whitespace()
        .rev()
        .find(|w| w.chars().count() >= 2)
        .unwrap_or("")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_basic() {
        assert_eq!(normalize("Jan de Vries"), "jan de vries");
        assert_eq!(normalize("  J.  de   Vries, "), "j de vries");
    }

    #[test]
    fn normalize_strips_diacritics() {
        assert_eq!(normalize("Curaçao"), "curacao");
        assert_eq!(normalize("Thorbecke-société"), "thorbecke societe");
    }

    #[test]
    fn normalize_is_idempotent() {
        for s in ["Jan de Vries", "Curaçao!", "'s-Gravenhage", "  A--B  "] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn normalize_empty_and_punctuation() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("..."), "");
    }

    #[test]
    fn tokenize_splits_on_whitespace() {
        assert_eq!(tokenize("jan  de\nvries"), vec!["jan", "de", "vries"]);
        assert!(tokenize("  ").is_empty());
    }

    #[test]
    fn last_part_skips_short_words() {
        assert_eq!(last_part("jan de vries"), "vries");
        assert_eq!(last_part("vries j"), "vries");
        assert_eq!(last_part("j"), "");
        assert_eq!(last_part(""), "");
    }
}
