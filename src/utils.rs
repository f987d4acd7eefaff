use bigdecimal::{BigDecimal, RoundingMode};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}

pub fn fmt_json<T: Serialize>(value: &T, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match serde_json::to_string(value) {
        Ok(json) => write!(f, "{}", json),
        Err(_) => Err(fmt::Error),
    }
}

/// Gateway payloads report identifiers as either numbers or strings.
pub fn value_as_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn value_as_amount(value: &Value) -> Option<BigDecimal> {
    match value {
        Value::String(s) => BigDecimal::from_str(s).ok(),
        Value::Number(n) => BigDecimal::from_str(&n.to_string()).ok(),
        _ => None,
    }
}

/// Converts an order total into the settlement currency. Charged amounts are
/// always settled at two decimal places, rounded half-up.
pub fn convert_amount(amount: &BigDecimal, exchange_rate: &BigDecimal) -> BigDecimal {
    (amount * exchange_rate).with_scale_round(2, RoundingMode::HalfUp)
}

#[cfg(test)]
mod tests {
    use super::convert_amount;
    use bigdecimal::BigDecimal;
    use quickcheck_macros::quickcheck;
    use std::str::FromStr;

    #[test]
    fn test_convert_amount_identity_rate() {
        let amount = BigDecimal::from_str("1000").unwrap();
        let rate = BigDecimal::from_str("1.00").unwrap();
        assert_eq!(
            convert_amount(&amount, &rate),
            BigDecimal::from_str("1000.00").unwrap()
        );
    }

    #[test]
    fn test_convert_amount_rounds_half_up() {
        let amount = BigDecimal::from_str("333.33").unwrap();
        let rate = BigDecimal::from_str("0.005").unwrap();
        // 1.66665 rounds up at the third decimal
        assert_eq!(
            convert_amount(&amount, &rate),
            BigDecimal::from_str("1.67").unwrap()
        );
    }

    #[quickcheck]
    fn test_convert_amount_scale_is_always_two(cents: i64, rate_bp: u32) {
        let amount = BigDecimal::new(cents.into(), 2);
        let rate = BigDecimal::new(rate_bp.into(), 4);
        let converted = convert_amount(&amount, &rate);
        assert!(converted.fractional_digit_count() <= 2);
    }
}
