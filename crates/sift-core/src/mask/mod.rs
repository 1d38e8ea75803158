//! Deterministic pseudonymization of emails, phone numbers and person names.

mod store;

pub use store::{PiiCategory, PseudonymStore, SharedPseudonymStore, TokenAssigner};

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use tracing::debug;

use crate::error::SiftError;
use crate::models::config::MaskingConfig;
use crate::sanitize::SanitizedDocument;

lazy_static! {
    static ref EMAIL: Regex =
        Regex::new(r"\b([a-zA-Z0-9._%+-]+)@([a-zA-Z0-9.-]+\.[a-zA-Z]{2,})\b").unwrap();
    static ref PHONE: Regex = Regex::new(r"\b(\d{10})\b").unwrap();
}

/// Replaces PII in text with tokens from a [`TokenAssigner`].
///
/// Emails keep their domain (`[EMAIL_1]@example.com`), phone numbers and
/// names are replaced whole (`[PHONE_1]`, `[PERSON_1]`).
pub struct PiiMasker {
    names: Option<Regex>,
    protected_orgs: Vec<String>,
    window: usize,
}

impl PiiMasker {
    pub fn new(config: &MaskingConfig) -> Result<Self, SiftError> {
        let mut names: Vec<&str> = config
            .names
            .iter()
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
            .collect();
        // Longest first so a name is never shadowed by its own prefix.
        names.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        names.dedup();

        let names = if names.is_empty() {
            None
        } else {
            let alternation = names
                .iter()
                .map(|n| regex::escape(n))
                .collect::<Vec<_>>()
                .join("|");
            let pattern = format!(r"\b((?:{})(?:[ \t]+[A-Z][a-z]+)?)\b", alternation);
            Some(Regex::new(&pattern).map_err(|e| SiftError::Config(format!("name list: {}", e)))?)
        };

        Ok(Self {
            names,
            protected_orgs: config
                .protected_orgs
                .iter()
                .map(|o| o.trim().to_lowercase())
                .filter(|o| !o.is_empty())
                .collect(),
            window: config.org_window,
        })
    }

    /// Mask emails, then phone numbers, then names.
    pub fn mask(&self, text: &str, store: &mut impl TokenAssigner) -> String {
        let text = EMAIL.replace_all(text, |caps: &Captures| {
            let token = store.assign(PiiCategory::Email, &caps[0]);
            format!("[{}]@{}", token, &caps[2])
        });

        let text = PHONE.replace_all(&text, |caps: &Captures| {
            format!("[{}]", store.assign(PiiCategory::Phone, &caps[1]))
        });

        let Some(names) = &self.names else {
            return text.into_owned();
        };
        names
            .replace_all(&text, |caps: &Captures| {
                let m = &caps[1];
                let whole = caps.get(0).map_or(0..0, |g| g.range());
                if self.near_protected_org(&text, whole.start, whole.end) {
                    debug!("Not masking {:?}: near protected organization", m);
                    return m.to_string();
                }
                format!("[{}]", store.assign(PiiCategory::Name, m))
            })
            .into_owned()
    }

    /// Mask the text, the retained subject and every table cell of a
    /// sanitized document.
    pub fn mask_document(&self, doc: &mut SanitizedDocument, store: &mut impl TokenAssigner) {
        doc.text = self.mask(&doc.text, store);
        doc.subject = doc.subject.as_deref().map(|s| self.mask(s, store));
        for table in &mut doc.tables {
            table.map_cells(|cell| self.mask(cell, store));
        }
    }

    fn near_protected_org(&self, text: &str, start: usize, end: usize) -> bool {
        if self.protected_orgs.is_empty() {
            return false;
        }
        let mut from = start.saturating_sub(self.window);
        while !text.is_char_boundary(from) {
            from -= 1;
        }
        let mut to = (end + self.window).min(text.len());
        while !text.is_char_boundary(to) {
            to += 1;
        }
        let window = text[from..to].to_lowercase();
        self.protected_orgs.iter().any(|org| window.contains(org.as_str()))
    }
}
