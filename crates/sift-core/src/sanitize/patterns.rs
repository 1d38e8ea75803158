//! Line patterns for mail correspondence and webmail print-outs.
//!
//! All patterns are matched against a trimmed line.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// `---------- Forwarded message ---------`
    pub static ref FORWARDED_MARKER: Regex =
        Regex::new(r"(?i)^-+\s*Forwarded message\s*-+$").unwrap();

    /// Repeated webmail print header: `6/12/25, 3:41 PM Example.com Mail - Subject`
    pub static ref PAGE_HEADER: Regex =
        Regex::new(r"^\d{1,2}/\d{1,2}/\d{2,4},\s+\d{1,2}:\d{2}\s+[AP]M\s+.*\bMail\b.*$").unwrap();

    /// Subject carried by a print header.
    pub static ref PAGE_HEADER_SUBJECT: Regex =
        Regex::new(r"\bMail\s+-\s+(.+)$").unwrap();

    /// Page separators emitted by extraction, including OCR markers.
    pub static ref PAGE_SEPARATOR: Regex =
        Regex::new(r"^---\s*(?:OCR\s+)?PAGE\s+\d+(?:\s+ERROR)?\s*---$").unwrap();

    pub static ref SUBJECT: Regex =
        Regex::new(r"(?i)^Subject:\s*(.+)$").unwrap();

    /// Mail header fields other than the subject.
    pub static ref HEADER_FIELD: Regex =
        Regex::new(r"(?i)^(?:From|To|Cc|Bcc|Sent|Date):").unwrap();

    /// Standalone webmail placeholders.
    pub static ref PRINT_PLACEHOLDER: Regex =
        Regex::new(r"(?i)^(?:\[image:[^\]]*\]|\[cid:[^\]]*\]|<image\d+\.[^>]*>|\[Quoted text hidden\])$").unwrap();

    /// Webmail URLs printed in page footers.
    pub static ref WEBMAIL_URL: Regex =
        Regex::new(r"https?://mail\.google\.com/mail/u/\S*").unwrap();

    /// Bare `n/m` page counters.
    pub static ref PAGE_COUNTER: Regex =
        Regex::new(r"^\d{1,3}/\d{1,3}$").unwrap();

    pub static ref FYI: Regex =
        Regex::new(r"(?i)^FYI:?$").unwrap();

    /// `On Mon, 2 Jun 2025 at 10:14, Someone <x@y.com> wrote:`
    pub static ref REPLY_MARKER: Regex =
        Regex::new(r"^On\s+\w+,.*wrote:").unwrap();

    /// Phone numbers and other bare numeric tokens.
    pub static ref BARE_NUMBER: Regex =
        Regex::new(r"^\+?[\d][\d\s()-]*$").unwrap();

    pub static ref SIGNATURE_LINES: Vec<Regex> = [
        r"(?i)^Thanks\s*(?:&|and)\s*Regards,?$",
        r"(?i)^(?:Best|Kind|Warm)\s+regards,?$",
        r"(?i)^Regards,?$",
        r"(?i)^Thanks,?$",
        r"(?i)^Thank\s+you,?$",
        r"(?i)^Sincerely,?$",
        r"^[A-Z][\w&.\- ]*\b(?:Pvt\.?|Private)\s+(?:Ltd|Limited)\.?$",
        r"(?i)^No\.\s*\d+.*Road,?$",
        r"^\d{6}(?:\s+\w+)?$",
        r"(?i)^India$",
        r"(?i)^Director\b.*$",
        r"(?i)^(?:M|Mob|Mobile|Ph|Phone|Tel)\s*[:.]?\s*\+?[\d\s-]{10,}$",
        r"^[\w.+-]*@[\w-]+(?:\.[\w-]+)+$",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect();
}

/// Webmail artefacts that carry no content, as lines.
pub fn is_print_noise(trimmed: &str) -> bool {
    PRINT_PLACEHOLDER.is_match(trimmed)
        || WEBMAIL_URL.is_match(trimmed)
        || PAGE_COUNTER.is_match(trimmed)
        || FYI.is_match(trimmed)
}

/// Webmail artefacts that carry no content, as table cells.
pub fn is_cell_noise(cell: &str) -> bool {
    let cell = cell.trim();
    PRINT_PLACEHOLDER.is_match(cell) || WEBMAIL_URL.is_match(cell)
}

/// Subject carried by a webmail print header, if any.
pub fn header_subject(trimmed: &str) -> Option<String> {
    PAGE_HEADER_SUBJECT
        .captures(trimmed)
        .map(|c| c[1].trim().to_string())
        .filter(|s| !s.is_empty())
}
