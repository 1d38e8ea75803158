//! Validation and normalization of externally extracted field values.
//!
//! Values arrive as free text from an upstream extraction step. Each field is
//! first checked against the absence heuristic, then normalized according to
//! its declared [`FieldKind`]. Invalid values are kept as they came in and the
//! error is recorded next to the record.

pub mod absence;
pub mod choices;
pub mod dates;
pub mod numeric;

pub use absence::is_absent;
pub use choices::{BooleanNormalizer, EnumNormalizer};
pub use dates::{DateNormalizer, parse_date};
pub use numeric::{NumericNormalizer, parse_amount};

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use tracing::debug;

use crate::models::schema::{FieldKind, FieldSchema, FieldSpec, NO};

/// Normalizes one non-null raw value.
pub trait ValueNormalizer {
    /// The canonical form of `value`, or a reason it is invalid.
    fn normalize(&self, value: &str) -> Result<String, String>;
}

/// Outcome of validating one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub is_valid: bool,
    /// Normalized value when valid, the original otherwise.
    pub value: Option<String>,
    pub error: Option<String>,
}

impl ValidationResult {
    fn valid(value: Option<String>) -> Self {
        Self {
            is_valid: true,
            value,
            error: None,
        }
    }

    fn invalid(original: &str, error: String) -> Self {
        Self {
            is_valid: false,
            value: Some(original.to_string()),
            error: Some(error),
        }
    }
}

/// Field name to value, in schema order, plus the errors found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedRecord {
    pub fields: Vec<(String, Option<String>)>,
    pub errors: Vec<String>,
}

impl ValidatedRecord {
    pub fn get(&self, name: &str) -> Option<Option<&str>> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_deref())
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

struct OrderedFields<'a>(&'a [(String, Option<String>)]);

impl Serialize for OrderedFields<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl Serialize for ValidatedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("record", &OrderedFields(&self.fields))?;
        map.serialize_entry("validation_errors", &self.errors)?;
        map.end()
    }
}

/// Validates records against a [`FieldSchema`].
#[derive(Debug, Clone)]
pub struct FieldValidator {
    schema: FieldSchema,
}

impl FieldValidator {
    pub fn new(schema: FieldSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// Validate a single raw value against `spec`.
    pub fn validate_field(&self, spec: &FieldSpec, raw: Option<&str>) -> ValidationResult {
        let value = raw
            .map(str::trim)
            .filter(|v| !v.is_empty() && !is_absent(v));

        let Some(value) = value else {
            return ValidationResult::valid(null_value(&spec.kind));
        };

        let normalized = match &spec.kind {
            FieldKind::Date { allow_range } => DateNormalizer::new(*allow_range).normalize(value),
            FieldKind::Enum {
                allowed,
                fold_hyphen,
                ..
            } => EnumNormalizer::new(allowed, *fold_hyphen).normalize(value),
            FieldKind::Boolean => BooleanNormalizer.normalize(value),
            FieldKind::Numeric { min, max } => NumericNormalizer::new(*min, *max).normalize(value),
            FieldKind::Text { max_len } => check_length(value, *max_len),
        };

        match normalized {
            Ok(v) => ValidationResult::valid(Some(v)),
            Err(reason) => {
                debug!("Field {} rejected: {}", spec.name, reason);
                ValidationResult::invalid(raw.unwrap_or(value), format!("{}: {}", spec.name, reason))
            }
        }
    }

    /// Validate a raw JSON record.
    ///
    /// Every schema field appears in the output, in schema order; a missing
    /// field is validated as null. Fields unknown to the schema follow,
    /// unchanged.
    pub fn validate_record(&self, raw: &Map<String, Value>) -> ValidatedRecord {
        let mut record = ValidatedRecord::default();

        for spec in &self.schema.fields {
            let value = raw.get(&spec.name).and_then(raw_text);
            let result = self.validate_field(spec, value.as_deref());
            if let Some(error) = result.error {
                record.errors.push(error);
            }
            record.fields.push((spec.name.clone(), result.value));
        }

        for (name, value) in raw {
            if self.schema.get(name).is_none() {
                record.fields.push((name.clone(), raw_text(value)));
            }
        }

        debug!(
            "Validated {} fields, {} errors",
            record.fields.len(),
            record.errors.len()
        );
        record
    }
}

/// The value a field takes when its input is null.
fn null_value(kind: &FieldKind) -> Option<String> {
    match kind {
        FieldKind::Boolean => Some(NO.to_string()),
        FieldKind::Enum { default, .. } => default.clone(),
        _ => None,
    }
}

fn check_length(value: &str, max_len: Option<usize>) -> Result<String, String> {
    let len = value.chars().count();
    match max_len {
        Some(max) if len > max => Err(format!("Length {} above maximum {}", len, max)),
        _ => Ok(value.to_string()),
    }
}

/// Raw JSON scalar as text. Nested values become compact JSON.
fn raw_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn validator() -> FieldValidator {
        FieldValidator::new(FieldSchema::scheme_header())
    }

    fn check(field: &str, raw: Option<&str>) -> ValidationResult {
        let v = validator();
        let spec = v.schema().get(field).unwrap().clone();
        v.validate_field(&spec, raw)
    }

    #[test]
    fn test_date_normalized() {
        let r = check("start_date", Some("15/06/2025"));
        assert_eq!(r, ValidationResult::valid(Some("2025-06-15".to_string())));
    }

    #[test]
    fn test_invalid_date_keeps_original() {
        let r = check("end_date", Some("31 February 2025"));
        assert!(!r.is_valid);
        assert_eq!(r.value.as_deref(), Some("31 February 2025"));
        assert_eq!(
            r.error.as_deref(),
            Some("end_date: Invalid date format '31 February 2025'")
        );
    }

    #[test]
    fn test_enum_normalization() {
        assert!(!check("scheme_type", Some("buy-side")).is_valid);
        assert_eq!(
            check("scheme_type", Some("Sell_Side")).value.as_deref(),
            Some("SELL_SIDE")
        );
    }

    #[test]
    fn test_absence_nulls_value() {
        assert_eq!(check("max_cap", Some("Not specified")), ValidationResult::valid(None));
        let kept = "No discount mentioned, however GST inclusive - Yes";
        assert_eq!(
            check("scheme_description", Some(kept)),
            ValidationResult::valid(Some(kept.to_string()))
        );
    }

    #[test]
    fn test_boolean_null_defaults_to_no() {
        assert_eq!(check("remove_gst", None).value.as_deref(), Some("No"));
        assert_eq!(check("over_and_above", Some("Not mentioned")).value.as_deref(), Some("No"));
        assert_eq!(check("scheme_document", Some("  ")).value.as_deref(), Some("No"));
    }

    #[test]
    fn test_enum_null_uses_default() {
        let spec = FieldSpec::new(
            "side",
            FieldKind::Enum {
                allowed: vec!["BUY_SIDE".to_string(), "SELL_SIDE".to_string()],
                default: Some("BUY_SIDE".to_string()),
                fold_hyphen: false,
            },
        );
        let r = validator().validate_field(&spec, None);
        assert_eq!(r.value.as_deref(), Some("BUY_SIDE"));
        assert_eq!(check("sub_type", None).value, None);
    }

    #[test]
    fn test_text_length() {
        let long = "x".repeat(201);
        let r = check("vendor_name", Some(&long));
        assert!(!r.is_valid);
        assert_eq!(r.value.as_deref(), Some(long.as_str()));
        assert!(check("vendor_name", Some(&long[..200])).is_valid);
    }

    #[test]
    fn test_duration_is_free_text() {
        for raw in ["Q3 2025", "June 2025", "1 June 2025 to 30 June 2025"] {
            let r = check("duration", Some(raw));
            assert!(r.is_valid, "duration should accept {:?}", raw);
            assert_eq!(r.value.as_deref(), Some(raw));
        }
        assert!(!check("duration", Some(&"x".repeat(101))).is_valid);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let samples = [
            ("start_date", "15 June 2025"),
            ("duration", "1 June 2025 to 30 June 2025"),
            ("scheme_type", "one/off"),
            ("sub_type", "puc_fdc"),
            ("remove_gst", "TRUE"),
            ("gst_rate", "18.00%"),
            ("max_cap", "₹1,50,000"),
            ("scheme_name", "Monsoon price protection"),
        ];
        for (field, raw) in samples {
            let first = check(field, Some(raw));
            assert!(first.is_valid, "{} should accept {:?}", field, raw);
            let again = check(field, first.value.as_deref());
            assert_eq!(again, first, "{} not idempotent for {:?}", field, raw);
        }
    }

    #[test]
    fn test_record_fail_open_and_order() {
        let raw = json!({
            "gst_rate": 18,
            "start_date": "2025-02-31",
            "scheme_type": "Buy_Side",
            "notes": ["a", "b"]
        });
        let record = validator().validate_record(raw.as_object().unwrap());

        assert_eq!(record.fields.len(), 22);
        assert_eq!(record.fields[0], ("scheme_name".to_string(), None));
        assert_eq!(record.get("gst_rate"), Some(Some("18")));
        assert_eq!(record.get("start_date"), Some(Some("2025-02-31")));
        assert_eq!(record.get("scheme_type"), Some(Some("BUY_SIDE")));
        assert_eq!(record.get("remove_gst"), Some(Some("No")));
        assert_eq!(record.fields[21], ("notes".to_string(), Some(r#"["a","b"]"#.to_string())));
        assert_eq!(
            record.errors,
            vec!["start_date: Invalid date format '2025-02-31'".to_string()]
        );
        assert!(!record.is_valid());
    }

    #[test]
    fn test_record_serializes_in_schema_order() {
        let schema = FieldSchema {
            fields: vec![
                FieldSpec::new("z_flag", FieldKind::Boolean),
                FieldSpec::new("a_date", FieldKind::Date { allow_range: false }),
            ],
        };
        let record = FieldValidator::new(schema).validate_record(&Map::new());
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"record":{"z_flag":"No","a_date":null},"validation_errors":[]}"#
        );
    }
}
