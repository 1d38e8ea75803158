//! Field schemas for validating externally extracted records.

use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::SiftError;

/// Canonical affirmative boolean value.
pub const YES: &str = "Yes";
/// Canonical negative boolean value, also the value of an absent boolean.
pub const NO: &str = "No";

/// How a field's value is validated and normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// Calendar date normalized to `YYYY-MM-DD`.
    Date {
        /// Accept `"<a> to <b>"` ranges verbatim.
        #[serde(default)]
        allow_range: bool,
    },
    /// Closed set of uppercase identifiers.
    Enum {
        allowed: Vec<String>,
        /// Value used when the input is null.
        #[serde(default)]
        default: Option<String>,
        /// Also treat `-` as `_` when matching.
        #[serde(default)]
        fold_hyphen: bool,
    },
    /// `Yes` / `No`; null becomes `No`.
    Boolean,
    Numeric {
        #[serde(default)]
        min: Option<Decimal>,
        #[serde(default)]
        max: Option<Decimal>,
    },
    Text {
        #[serde(default)]
        max_len: Option<usize>,
    },
}

/// One declared field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn new(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
        }
    }
}

/// Ordered list of declared fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldSchema {
    pub fields: Vec<FieldSpec>,
}

fn date() -> FieldKind {
    FieldKind::Date { allow_range: false }
}

fn text(max_len: usize) -> FieldKind {
    FieldKind::Text {
        max_len: Some(max_len),
    }
}

fn choices(values: &[&str]) -> FieldKind {
    FieldKind::Enum {
        allowed: values.iter().map(|v| v.to_string()).collect(),
        default: None,
        fold_hyphen: false,
    }
}

fn at_least_zero() -> FieldKind {
    FieldKind::Numeric {
        min: Some(Decimal::ZERO),
        max: None,
    }
}

impl FieldSchema {
    /// The scheme header record produced from vendor correspondence.
    pub fn scheme_header() -> Self {
        let fields = vec![
            FieldSpec::new("scheme_name", text(200)),
            FieldSpec::new("scheme_description", text(1000)),
            FieldSpec::new("scheme_period", choices(&["DURATION", "EVENT"])),
            FieldSpec::new("duration", text(100)),
            FieldSpec::new("discount_type", text(100)),
            FieldSpec::new("max_cap", at_least_zero()),
            FieldSpec::new("vendor_name", text(200)),
            FieldSpec::new("price_drop_date", date()),
            FieldSpec::new("start_date", date()),
            FieldSpec::new("end_date", date()),
            FieldSpec::new("fsn_file_config_file", FieldKind::Boolean),
            FieldSpec::new("min_actual_discount_or_agreed_claim", FieldKind::Boolean),
            FieldSpec::new("remove_gst", FieldKind::Boolean),
            FieldSpec::new("over_and_above", FieldKind::Boolean),
            FieldSpec::new("scheme_document", FieldKind::Boolean),
            FieldSpec::new("discount_slab_type", text(100)),
            FieldSpec::new("best_bet", text(100)),
            FieldSpec::new("brand_support_absolute", at_least_zero()),
            FieldSpec::new(
                "gst_rate",
                FieldKind::Numeric {
                    min: Some(Decimal::ZERO),
                    max: Some(Decimal::ONE_HUNDRED),
                },
            ),
            FieldSpec::new("scheme_type", choices(&["BUY_SIDE", "SELL_SIDE", "ONE_OFF"])),
            FieldSpec::new(
                "sub_type",
                choices(&[
                    "PERIODIC_CLAIM",
                    "PDC",
                    "ONE_OFF",
                    "COUPON",
                    "PUC_FDC",
                    "PREXO",
                    "SUPER_COIN",
                    "BANK_OFFER",
                    "LIFESTYLE",
                ]),
            ),
        ];
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn from_file(path: &Path) -> Result<Self, SiftError> {
        let content = std::fs::read_to_string(path)?;
        let schema: Self = serde_json::from_str(&content)
            .map_err(|e| SiftError::Config(format!("schema {}: {}", path.display(), e)))?;
        schema.check()?;
        Ok(schema)
    }

    pub fn save(&self, path: &Path) -> Result<(), SiftError> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Reject duplicate names and enums without allowed values.
    fn check(&self) -> Result<(), SiftError> {
        let mut seen = std::collections::HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SiftError::Config(format!("duplicate field {:?}", field.name)));
            }
            if let FieldKind::Enum { allowed, .. } = &field.kind {
                if allowed.is_empty() {
                    return Err(SiftError::Config(format!(
                        "enum field {:?} has no allowed values",
                        field.name
                    )));
                }
            }
        }
        Ok(())
    }
}
