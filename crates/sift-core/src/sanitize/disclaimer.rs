//! Disclaimer scoring.
//!
//! A paragraph is a disclaimer when it contains at least
//! [`MIN_PHRASE_MATCHES`] distinct canonical phrases, or at least one phrase
//! while being longer than [`LONG_PARAGRAPH_CHARS`] characters.

/// Canonical disclaimer phrases, lowercase. No phrase contains another.
pub const DISCLAIMER_PHRASES: &[&str] = &[
    "any files transmitted with it",
    "intended solely for",
    "intended recipient",
    "received this email in error",
    "received this e-mail in error",
    "please notify the sender",
    "delete this email",
    "delete this e-mail",
    "strictly prohibited",
    "unauthorized use",
    "unauthorised use",
    "confidentiality notice",
    "privileged communication",
    "legally privileged",
    "disclaimer",
    "caution: external email",
    "think before you click",
    "views or opinions presented",
    "accepts no liability",
    "cannot be guaranteed to be secure",
    "virus-free",
    "disclosing, copying, distributing",
];

pub const MIN_PHRASE_MATCHES: usize = 2;
pub const LONG_PARAGRAPH_CHARS: usize = 500;

/// Number of distinct canonical phrases present, case-insensitively.
pub fn phrase_matches(text: &str) -> usize {
    let lower = text.to_lowercase();
    DISCLAIMER_PHRASES
        .iter()
        .filter(|phrase| lower.contains(*phrase))
        .count()
}

/// Score a paragraph (a maximal run of non-blank lines).
pub fn is_disclaimer_paragraph(paragraph: &str) -> bool {
    let matches = phrase_matches(paragraph);
    matches >= MIN_PHRASE_MATCHES
        || (matches >= 1 && paragraph.chars().count() > LONG_PARAGRAPH_CHARS)
}

/// Looser check for short fragments such as table cells.
pub fn looks_like_disclaimer(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    lower.starts_with("caution:") || phrase_matches(&lower) > 0
}
