//! Enumerations and Yes/No flags.

use super::ValueNormalizer;
use crate::models::schema::{NO, YES};

/// Matches a value against a whitelist of uppercase identifiers.
pub struct EnumNormalizer<'a> {
    allowed: &'a [String],
    fold_hyphen: bool,
}

impl<'a> EnumNormalizer<'a> {
    pub fn new(allowed: &'a [String], fold_hyphen: bool) -> Self {
        Self {
            allowed,
            fold_hyphen,
        }
    }

    fn canonical(&self, value: &str) -> String {
        let upper = value.trim().to_uppercase().replace('/', "_");
        if self.fold_hyphen {
            upper.replace('-', "_")
        } else {
            upper
        }
    }
}

impl ValueNormalizer for EnumNormalizer<'_> {
    fn normalize(&self, value: &str) -> Result<String, String> {
        let wanted = self.canonical(value);
        self.allowed
            .iter()
            .find(|a| self.canonical(a) == wanted)
            .cloned()
            .ok_or_else(|| format!("'{}' not in allowed values {:?}", value, self.allowed))
    }
}

/// Maps common spellings onto `Yes` / `No`.
pub struct BooleanNormalizer;

impl ValueNormalizer for BooleanNormalizer {
    fn normalize(&self, value: &str) -> Result<String, String> {
        match value.trim().to_lowercase().as_str() {
            "yes" | "y" | "true" | "1" => Ok(YES.to_string()),
            "no" | "n" | "false" | "0" => Ok(NO.to_string()),
            _ => Err(format!("Expected Yes/No, got '{}'", value)),
        }
    }
}
