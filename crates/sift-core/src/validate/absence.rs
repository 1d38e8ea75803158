//! Recognizes extractor output that means "no value".

/// Phrases that stand for a missing value, lowercase.
pub const ABSENCE_PHRASES: &[&str] = &[
    "not specified",
    "not found",
    "not mentioned",
    "not available",
    "not applicable",
    "no information",
    "does not contain",
    "does not provide",
    "no value",
    "no specific",
    "unable to extract",
    "unable to determine",
    "no date",
    "no scheme",
    "no discount",
    "no cap",
    "n/a",
];

/// Longer explanations that still mean "no value".
pub const VERBOSE_ABSENCE_PHRASES: &[&str] = &["document does not", "not find", "no mention"];

/// Values shorter than this are checked for contained absence phrases.
pub const SHORT_VALUE_CHARS: usize = 100;
/// Values longer than this are checked for verbose absence sentences.
pub const VERBOSE_VALUE_CHARS: usize = 50;

/// Whether a raw value should be treated as null.
///
/// A value containing "yes" is never absent: it carries an answer even when
/// it also says something was not mentioned.
pub fn is_absent(value: &str) -> bool {
    let lower = value.trim().to_lowercase();
    if lower.contains("yes") {
        return false;
    }
    let len = lower.chars().count();

    if ABSENCE_PHRASES
        .iter()
        .any(|p| lower == *p || (len < SHORT_VALUE_CHARS && lower.contains(p)))
    {
        return true;
    }
    len > VERBOSE_VALUE_CHARS && VERBOSE_ABSENCE_PHRASES.iter().any(|p| lower.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_and_short_phrases() {
        assert!(is_absent("Not specified"));
        assert!(is_absent("  NOT FOUND  "));
        assert!(is_absent("Cap: not mentioned in the mail"));
        assert!(!is_absent("Flat 5% on NLC"));
    }

    #[test]
    fn test_yes_guard() {
        assert!(!is_absent("No discount mentioned, however GST inclusive - Yes"));
        assert!(!is_absent("Yes, not specified further"));
    }

    #[test]
    fn test_contained_phrase_only_below_100_chars() {
        let tail = " not specified";
        let short = format!("{}{}", "a".repeat(SHORT_VALUE_CHARS - 1 - tail.len()), tail);
        assert_eq!(short.chars().count(), SHORT_VALUE_CHARS - 1);
        assert!(is_absent(&short));

        let at_limit = format!("a{}", short);
        assert_eq!(at_limit.chars().count(), SHORT_VALUE_CHARS);
        assert!(!is_absent(&at_limit));
    }

    #[test]
    fn test_verbose_sentence_only_above_50_chars() {
        let sentence = "The document does not state it";
        let exact = format!("{}{}", sentence, ".".repeat(VERBOSE_VALUE_CHARS - sentence.len()));
        assert_eq!(exact.chars().count(), VERBOSE_VALUE_CHARS);
        assert!(!is_absent(&exact));
        assert!(is_absent(&format!("{}.", exact)));
    }

    #[test]
    fn test_verbose_sentence_beyond_100_chars() {
        let long = format!(
            "I could not find any reference to a maximum cap in the correspondence {}",
            "between the brand and the buyer for this quarter."
        );
        assert!(long.chars().count() >= SHORT_VALUE_CHARS);
        assert!(is_absent(&long));
    }
}
