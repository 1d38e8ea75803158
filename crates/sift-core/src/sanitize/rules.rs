//! The ordered line classification table.

use std::sync::Arc;

use regex::{Regex, RegexBuilder};

use super::patterns::{
    self, BARE_NUMBER, FORWARDED_MARKER, HEADER_FIELD, PAGE_HEADER, PAGE_SEPARATOR, REPLY_MARKER,
    SIGNATURE_LINES, SUBJECT,
};
use crate::error::SiftError;
use crate::models::config::SanitizerConfig;

/// What the sanitizer sees when classifying one non-blank line.
#[derive(Debug, Clone, Copy)]
pub struct LineContext<'a> {
    pub trimmed: &'a str,
    /// The line belongs to a paragraph scored as a disclaimer.
    pub in_disclaimer_paragraph: bool,
}

impl<'a> LineContext<'a> {
    pub fn new(line: &'a str) -> Self {
        Self {
            trimmed: line.trim(),
            in_disclaimer_paragraph: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleAction {
    /// Drop the line and up to this many following blank lines.
    DropWithTrailingBlanks(usize),
    /// Drop the line, remembering any subject it carries.
    DropPageHeader,
    KeepVerbatim,
    /// Keep the first subject line of the document, drop the rest.
    KeepFirstSubject,
    Drop,
    DropParagraph,
    EnterSignature,
}

type Predicate = Box<dyn Fn(&LineContext<'_>) -> bool + Send + Sync>;

/// One (predicate, action) entry.
pub struct LineRule {
    pub name: &'static str,
    pub action: RuleAction,
    /// Applies even after a terminal signature has been entered.
    pub structural: bool,
    predicate: Predicate,
}

impl LineRule {
    fn new(
        name: &'static str,
        action: RuleAction,
        structural: bool,
        predicate: impl Fn(&LineContext<'_>) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            action,
            structural,
            predicate: Box::new(predicate),
        }
    }

    pub fn matches(&self, ctx: &LineContext<'_>) -> bool {
        (self.predicate)(ctx)
    }
}

impl std::fmt::Debug for LineRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineRule")
            .field("name", &self.name)
            .field("action", &self.action)
            .finish()
    }
}

/// Built-in signature lines plus configured extras.
#[derive(Debug, Clone, Default)]
pub struct SignatureMatcher {
    extra: Vec<Regex>,
}

impl SignatureMatcher {
    pub fn new(extra_patterns: &[String]) -> Result<Self, SiftError> {
        let extra = extra_patterns
            .iter()
            .map(|p| {
                RegexBuilder::new(p)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| SiftError::Config(format!("signature pattern {:?}: {}", p, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { extra })
    }

    pub fn matches(&self, trimmed: &str) -> bool {
        SIGNATURE_LINES.iter().chain(&self.extra).any(|r| r.is_match(trimmed))
    }
}

/// Whether a line is substantive enough to show that a signature is not terminal.
pub fn is_new_content(trimmed: &str, min_len: usize) -> bool {
    REPLY_MARKER.is_match(trimmed)
        || (trimmed.chars().count() > min_len && !BARE_NUMBER.is_match(trimmed))
}

/// Lines skipped over when leaving a mid-document signature.
pub fn is_signature_filler(trimmed: &str, signatures: &SignatureMatcher) -> bool {
    trimmed.is_empty() || signatures.matches(trimmed) || BARE_NUMBER.is_match(trimmed)
}

/// Lines that never count as content during signature lookahead.
pub fn is_layout_line(trimmed: &str) -> bool {
    FORWARDED_MARKER.is_match(trimmed)
        || PAGE_HEADER.is_match(trimmed)
        || PAGE_SEPARATOR.is_match(trimmed)
        || patterns::is_print_noise(trimmed)
}

/// Build the rule table in priority order.
pub fn default_rules(config: &SanitizerConfig, signatures: Arc<SignatureMatcher>) -> Vec<LineRule> {
    let mut rules = vec![
        LineRule::new("forwarded_marker", RuleAction::DropWithTrailingBlanks(2), true, |c| {
            FORWARDED_MARKER.is_match(c.trimmed)
        }),
        LineRule::new("page_header", RuleAction::DropPageHeader, true, |c| {
            PAGE_HEADER.is_match(c.trimmed)
        }),
        LineRule::new("page_separator", RuleAction::KeepVerbatim, true, |c| {
            PAGE_SEPARATOR.is_match(c.trimmed)
        }),
        LineRule::new("subject", RuleAction::KeepFirstSubject, true, |c| {
            SUBJECT.is_match(c.trimmed)
        }),
    ];

    if config.drop_header_fields {
        rules.push(LineRule::new("header_field", RuleAction::Drop, false, |c| {
            HEADER_FIELD.is_match(c.trimmed)
        }));
    }
    if config.drop_print_noise {
        rules.push(LineRule::new("print_noise", RuleAction::Drop, false, |c| {
            patterns::is_print_noise(c.trimmed)
        }));
    }

    rules.push(LineRule::new("disclaimer", RuleAction::DropParagraph, false, |c| {
        c.in_disclaimer_paragraph
    }));
    rules.push(LineRule::new("signature", RuleAction::EnterSignature, false, move |c| {
        signatures.matches(c.trimmed)
    }));
    rules
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> Vec<LineRule> {
        default_rules(&SanitizerConfig::default(), Arc::new(SignatureMatcher::default()))
    }

    fn first_match(line: &str, in_disclaimer: bool) -> Option<&'static str> {
        let ctx = LineContext {
            trimmed: line.trim(),
            in_disclaimer_paragraph: in_disclaimer,
        };
        rules().into_iter().find(|r| r.matches(&ctx)).map(|r| r.name)
    }

    #[test]
    fn test_rule_order() {
        let names: Vec<_> = rules().iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec![
                "forwarded_marker",
                "page_header",
                "page_separator",
                "subject",
                "header_field",
                "print_noise",
                "disclaimer",
                "signature",
            ]
        );
    }

    #[test]
    fn test_each_rule_matches_its_line() {
        assert_eq!(first_match("---------- Forwarded message ---------", false), Some("forwarded_marker"));
        assert_eq!(first_match("1/7/25, 10:02 AM Example Mail - Offer", false), Some("page_header"));
        assert_eq!(first_match("--- PAGE 2 ---", false), Some("page_separator"));
        assert_eq!(first_match("Subject: Offer", false), Some("subject"));
        assert_eq!(first_match("From: Vendor <v@example.com>", false), Some("header_field"));
        assert_eq!(first_match("[Quoted text hidden]", false), Some("print_noise"));
        assert_eq!(first_match("any line at all", true), Some("disclaimer"));
        assert_eq!(first_match("Regards,", false), Some("signature"));
        assert_eq!(first_match("The scheme runs all quarter.", false), None);
    }

    #[test]
    fn test_subject_outranks_disclaimer() {
        assert_eq!(first_match("Subject: Offer", true), Some("subject"));
    }

    #[test]
    fn test_switches_remove_rules() {
        let config = SanitizerConfig {
            drop_header_fields: false,
            drop_print_noise: false,
            ..SanitizerConfig::default()
        };
        let rules = default_rules(&config, Arc::new(SignatureMatcher::default()));
        assert!(rules.iter().all(|r| r.name != "header_field" && r.name != "print_noise"));
    }

    #[test]
    fn test_extra_signature_patterns() {
        let matcher = SignatureMatcher::new(&["^team acme$".to_string()]).unwrap();
        assert!(matcher.matches("Team ACME"));
        assert!(SignatureMatcher::new(&["(".to_string()]).is_err());
    }

    #[test]
    fn test_new_content() {
        assert!(is_new_content("On Tue, 3 Jun 2025 at 09:12, Buyer wrote:", 20));
        assert!(is_new_content("Please share the revised slab for July.", 20));
        assert!(!is_new_content("9876543210", 20));
        assert!(!is_new_content("Short line", 20));
    }
}
