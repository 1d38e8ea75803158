//! Content sanitizer for extracted correspondence.
//!
//! A single top-down pass over lines. Each non-blank line is matched against
//! an ordered rule table ([`rules::default_rules`]); the first matching rule
//! decides what happens to it. Disclaimer scoring is done per paragraph before
//! the pass, and a signature line looks ahead a bounded number of lines to
//! decide whether it ends the document or only one message in a thread.

pub mod disclaimer;
pub mod patterns;
pub mod rules;

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::error::SiftError;
use crate::models::config::SanitizerConfig;
use crate::tables::ExtractedTable;
use rules::{LineContext, LineRule, RuleAction, SignatureMatcher};

/// Cleaned text and tables of one document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SanitizedDocument {
    pub text: String,
    /// The single retained subject.
    pub subject: Option<String>,
    pub tables: Vec<ExtractedTable>,
}

/// Cleaned text with its retained subject.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanitizedText {
    pub text: String,
    pub subject: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    TerminalSignature,
}

pub struct ContentSanitizer {
    rules: Vec<LineRule>,
    signatures: Arc<SignatureMatcher>,
    lookahead: usize,
    substantive_min_len: usize,
}

impl ContentSanitizer {
    pub fn new(config: &SanitizerConfig) -> Result<Self, SiftError> {
        let signatures = Arc::new(SignatureMatcher::new(&config.extra_signature_patterns)?);
        Ok(Self {
            rules: rules::default_rules(config, signatures.clone()),
            signatures,
            lookahead: config.signature_lookahead,
            substantive_min_len: config.substantive_min_len,
        })
    }

    pub fn rules(&self) -> &[LineRule] {
        &self.rules
    }

    /// Sanitize text and attach already-cleaned tables.
    pub fn sanitize(&self, text: &str, tables: Vec<ExtractedTable>) -> SanitizedDocument {
        let SanitizedText { text, subject } = self.sanitize_text(text);
        SanitizedDocument {
            text,
            subject,
            tables,
        }
    }

    /// Run the line pass over `text`.
    pub fn sanitize_text(&self, text: &str) -> SanitizedText {
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        let lines: Vec<&str> = text.split('\n').collect();
        let disclaimer_lines = disclaimer_flags(&lines);

        let mut kept: Vec<String> = Vec::with_capacity(lines.len());
        let mut subject: Option<String> = None;
        let mut header_subject: Option<String> = None;
        let mut state = State::Normal;
        let mut skip_blanks = 0;
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i];
            let mut ctx = LineContext::new(line);

            if ctx.trimmed.is_empty() {
                if skip_blanks > 0 {
                    skip_blanks -= 1;
                } else if state == State::Normal {
                    kept.push(String::new());
                }
                i += 1;
                continue;
            }
            skip_blanks = 0;
            ctx.in_disclaimer_paragraph = disclaimer_lines[i];

            let rule = self
                .rules
                .iter()
                .filter(|r| state == State::Normal || r.structural)
                .find(|r| r.matches(&ctx));

            let Some(rule) = rule else {
                if state == State::Normal {
                    kept.push(line.to_string());
                }
                i += 1;
                continue;
            };

            match rule.action {
                RuleAction::DropWithTrailingBlanks(n) => skip_blanks = n,
                RuleAction::DropPageHeader => {
                    if header_subject.is_none() {
                        header_subject = patterns::header_subject(ctx.trimmed);
                    }
                }
                RuleAction::KeepVerbatim => kept.push(line.to_string()),
                RuleAction::KeepFirstSubject => {
                    if subject.is_none() {
                        let value = patterns::SUBJECT
                            .captures(ctx.trimmed)
                            .map(|c| c[1].trim().to_string())
                            .unwrap_or_default();
                        kept.push(format!("Subject: {}", value));
                        subject = Some(value);
                    }
                }
                RuleAction::Drop | RuleAction::DropParagraph => {}
                RuleAction::EnterSignature => {
                    if self.signature_is_transition(&lines, i) {
                        i += 1;
                        while i < lines.len()
                            && rules::is_signature_filler(lines[i].trim(), &self.signatures)
                        {
                            i += 1;
                        }
                        continue;
                    }
                    debug!("Terminal signature at line {}", i + 1);
                    state = State::TerminalSignature;
                }
            }
            i += 1;
        }

        SanitizedText {
            text: collapse_blank_runs(&kept, 2),
            subject: subject.or(header_subject),
        }
    }

    /// Look ahead from a signature line for a reply marker or new content.
    fn signature_is_transition(&self, lines: &[&str], at: usize) -> bool {
        lines
            .iter()
            .skip(at + 1)
            .take(self.lookahead)
            .map(|l| l.trim())
            .filter(|l| !rules::is_signature_filler(l, &self.signatures) && !rules::is_layout_line(l))
            .any(|l| rules::is_new_content(l, self.substantive_min_len))
    }
}

/// Mark every line belonging to a paragraph scored as a disclaimer.
fn disclaimer_flags(lines: &[&str]) -> Vec<bool> {
    let mut flags = vec![false; lines.len()];
    let mut start = 0;
    while start < lines.len() {
        if lines[start].trim().is_empty() {
            start += 1;
            continue;
        }
        let end = lines[start..]
            .iter()
            .position(|l| l.trim().is_empty())
            .map_or(lines.len(), |n| start + n);
        let paragraph = lines[start..end].join("\n");
        if disclaimer::is_disclaimer_paragraph(&paragraph) {
            flags[start..end].iter_mut().for_each(|f| *f = true);
        }
        start = end;
    }
    flags
}

/// Join lines, allowing at most `max` consecutive blank lines and trimming
/// blank lines at both ends.
fn collapse_blank_runs(lines: &[String], max: usize) -> String {
    let mut out: Vec<&str> = Vec::with_capacity(lines.len());
    let mut blanks = 0;
    for line in lines {
        if line.trim().is_empty() {
            blanks += 1;
            if blanks <= max {
                out.push("");
            }
        } else {
            blanks = 0;
            out.push(line.trim_end());
        }
    }
    while out.first().is_some_and(|l| l.is_empty()) {
        out.remove(0);
    }
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DISCLAIMER: &str = "This email and any files transmitted with it are confidential.\n\
                              If you are not the intended recipient please notify the sender.";

    fn sanitizer() -> ContentSanitizer {
        ContentSanitizer::new(&SanitizerConfig::default()).unwrap()
    }

    #[test]
    fn test_first_subject_survives_disclaimer() {
        let input = format!(
            "Subject: Q3 price protection\n\nHello team,\n\n{}\nSubject: Q3 price protection\n\nPlease confirm the cap.",
            DISCLAIMER
        );
        let out = sanitizer().sanitize_text(&input);

        assert_eq!(
            out.text,
            "Subject: Q3 price protection\n\nHello team,\n\n\nPlease confirm the cap."
        );
        assert_eq!(out.subject.as_deref(), Some("Q3 price protection"));
        assert_eq!(out.text.matches("Subject:").count(), 1);
    }

    #[test]
    fn test_forwarded_marker_and_trailing_blanks() {
        let input = "Intro line\n---------- Forwarded message ---------\n\n\nFrom: a@b.com\nBody text";
        let out = sanitizer().sanitize_text(input);
        assert_eq!(out.text, "Intro line\nBody text");
    }

    #[test]
    fn test_page_header_dropped_and_supplies_subject() {
        let input = "6/12/25, 3:41 PM Example.com Mail - Monsoon sale support\n\
                     --- PAGE 1 ---\n\
                     The support is 5% on all SKUs.";
        let out = sanitizer().sanitize_text(input);
        assert_eq!(out.text, "--- PAGE 1 ---\nThe support is 5% on all SKUs.");
        assert_eq!(out.subject.as_deref(), Some("Monsoon sale support"));
    }

    #[test]
    fn test_terminal_signature_drops_to_end() {
        let input = "The scheme is approved.\n\nRegards,\nRavi\nAcme Retail Pvt Ltd\n9876543210";
        let out = sanitizer().sanitize_text(input);
        assert_eq!(out.text, "The scheme is approved.");
    }

    #[test]
    fn test_structural_rules_apply_after_terminal_signature() {
        let input = "Body\nRegards\nRavi\n--- PAGE 2 ---\nshort\nSubject: Late note\nok";
        let out = sanitizer().sanitize_text(input);
        assert_eq!(out.text, "Body\n--- PAGE 2 ---\nSubject: Late note");
        assert_eq!(out.subject.as_deref(), Some("Late note"));
    }

    #[test]
    fn test_forwarded_marker_followed_by_text() {
        let input = "Intro\n---------- Forwarded message ---------\nPlease see the scheme below.\n\nDetails";
        let out = sanitizer().sanitize_text(input);
        assert_eq!(out.text, "Intro\nPlease see the scheme below.\n\nDetails");
    }

    #[test]
    fn test_mid_thread_signature_is_skipped() {
        let input = "Please process the claim.\n\
                     Thanks,\n\
                     9876543210\n\
                     \n\
                     On Mon, 2 Jun 2025 at 10:14, Buyer <buyer@example.com> wrote:\n\
                     Sharing the revised slab for June.";
        let out = sanitizer().sanitize_text(input);
        assert_eq!(
            out.text,
            "Please process the claim.\n\
             On Mon, 2 Jun 2025 at 10:14, Buyer <buyer@example.com> wrote:\n\
             Sharing the revised slab for June."
        );
    }

    #[test]
    fn test_signature_lookahead_is_bounded() {
        let config = SanitizerConfig {
            signature_lookahead: 2,
            ..SanitizerConfig::default()
        };
        let input = "Body.\nRegards\nRavi\nSales\nOps\nA much longer line of real business content here.";
        let out = ContentSanitizer::new(&config).unwrap().sanitize_text(input);
        assert_eq!(out.text, "Body.");
    }

    #[test]
    fn test_blank_runs_collapse_and_crlf() {
        let input = "\r\n\r\nLine one\r\n\r\n\r\n\r\n\r\nLine two\r\n\r\n";
        let out = sanitizer().sanitize_text(input);
        assert_eq!(out.text, "Line one\n\n\nLine two");
    }

    #[test]
    fn test_sanitization_is_pure_function_of_text() {
        let input = format!("Subject: A\nBody\n\n{}\n\nThanks\n", DISCLAIMER);
        let s = sanitizer();
        assert_eq!(s.sanitize_text(&input), s.sanitize_text(&input));
        assert_eq!(s.sanitize_text(&input).text, "Subject: A\nBody");
    }

    #[test]
    fn test_rule_table_follows_config() {
        assert_eq!(sanitizer().rules().len(), 8);
        let config = SanitizerConfig {
            drop_print_noise: false,
            ..SanitizerConfig::default()
        };
        let s = ContentSanitizer::new(&config).unwrap();
        assert_eq!(s.rules().len(), 7);
        let input = "Body\n[Quoted text hidden]";
        assert_eq!(s.sanitize_text(input).text, input);
    }

    #[test]
    fn test_page_separators_kept_verbatim() {
        let input = "--- OCR PAGE 1 ---\n\nscanned words\n\n--- OCR PAGE 2 ERROR ---";
        assert_eq!(sanitizer().sanitize_text(input).text, input);
    }
}
