//! Amounts and rates.

use std::str::FromStr;

use rust_decimal::Decimal;

use super::ValueNormalizer;

const CURRENCY_WORDS: &[&str] = &["inr", "rs.", "rs"];

/// Parse an amount written with currency marks, percent signs or
/// thousands separators (`"₹1,50,000"`, `"Rs. 5000"`, `"18%"`).
pub fn parse_amount(value: &str) -> Option<Decimal> {
    let mut cleaned: String = value
        .chars()
        .filter(|c| !matches!(c, '₹' | '$' | '€' | '£' | '%' | ',') && !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    for word in CURRENCY_WORDS {
        if let Some(rest) = cleaned.strip_prefix(word) {
            cleaned = rest.to_string();
            break;
        }
    }
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok().map(|d| d.normalize())
}

/// Parses a number and enforces optional bounds.
pub struct NumericNormalizer {
    min: Option<Decimal>,
    max: Option<Decimal>,
}

impl NumericNormalizer {
    pub fn new(min: Option<Decimal>, max: Option<Decimal>) -> Self {
        Self { min, max }
    }
}

impl ValueNormalizer for NumericNormalizer {
    fn normalize(&self, value: &str) -> Result<String, String> {
        let amount =
            parse_amount(value).ok_or_else(|| format!("Cannot parse '{}' as number", value))?;
        if let Some(min) = self.min {
            if amount < min {
                return Err(format!("{} below minimum {}", amount, min));
            }
        }
        if let Some(max) = self.max {
            if amount > max {
                return Err(format!("{} above maximum {}", amount, max));
            }
        }
        Ok(amount.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("₹1,50,000"), Some(Decimal::new(150000, 0)));
        assert_eq!(parse_amount("Rs. 5000"), Some(Decimal::new(5000, 0)));
        assert_eq!(parse_amount("INR 2,500.50"), Some(Decimal::new(250050, 2)));
        assert_eq!(parse_amount("18%"), Some(Decimal::new(18, 0)));
        assert_eq!(parse_amount("12.50"), Some(Decimal::new(125, 1)));
        assert_eq!(parse_amount("five lakh"), None);
        assert_eq!(parse_amount("%"), None);
    }

    #[test]
    fn test_bounds() {
        let rate = NumericNormalizer::new(Some(Decimal::ZERO), Some(Decimal::ONE_HUNDRED));
        assert_eq!(rate.normalize("18%").unwrap(), "18");
        assert_eq!(rate.normalize("100").unwrap(), "100");
        assert_eq!(rate.normalize("12.50 %").unwrap(), "12.5");
        assert_eq!(rate.normalize("118").unwrap_err(), "118 above maximum 100");
        assert_eq!(rate.normalize("-1").unwrap_err(), "-1 below minimum 0");
    }
}
