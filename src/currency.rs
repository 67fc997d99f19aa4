//! Rupee formatting and loose number coercion

use serde_json::Value;

/// Format an amount as `₹120,000.00`.
pub fn format_inr(amount: f64) -> String {
    if !amount.is_finite() {
        return "₹0.00".to_string();
    }

    let fixed = format!("{:.2}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    // "-0.00" would read oddly
    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("₹{}{}.{}", sign, grouped, fraction)
}

/// Keep only digits and dots, then parse. Anything unparseable is `0.0`.
pub fn safe_float(raw: &str) -> f64 {
    safe_float_or(raw, 0.0)
}

pub fn safe_float_or(raw: &str, default: f64) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.parse::<f64>().unwrap_or(default)
}

/// Coerce a JSON value the model produced into a float.
pub fn safe_float_value(value: &Value, default: f64) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(default),
        Value::String(s) => safe_float_or(s, default),
        _ => default,
    }
}

/// Inverse of [`format_inr`] for non-negative amounts.
pub fn parse_inr(formatted: &str) -> f64 {
    safe_float(&formatted.replace('₹', "").replace(',', ""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_inr() {
        assert_eq!(format_inr(0.0), "₹0.00");
        assert_eq!(format_inr(999.5), "₹999.50");
        assert_eq!(format_inr(1000.0), "₹1,000.00");
        assert_eq!(format_inr(120000.0), "₹120,000.00");
        assert_eq!(format_inr(1234567.891), "₹1,234,567.89");
        assert_eq!(format_inr(-1500.0), "₹-1,500.00");
        assert_eq!(format_inr(f64::NAN), "₹0.00");
    }

    #[test]
    fn test_safe_float() {
        assert_eq!(safe_float("45,000"), 45000.0);
        assert_eq!(safe_float("Rs. 12.5"), 12.5);
        assert_eq!(safe_float(""), 0.0);
        assert_eq!(safe_float("1.2.3"), 0.0);
        assert_eq!(safe_float_or("n/a", 35.0), 35.0);
    }

    #[test]
    fn test_safe_float_value() {
        assert_eq!(safe_float_value(&json!(30), 0.0), 30.0);
        assert_eq!(safe_float_value(&json!("120000.50"), 0.0), 120000.5);
        assert_eq!(safe_float_value(&json!(null), 7.0), 7.0);
        assert_eq!(safe_float_value(&json!(true), 7.0), 7.0);
    }

    #[test]
    fn test_parse_inr_round_trips_formatting() {
        assert_eq!(parse_inr("₹3,000"), 3000.0);
        assert_eq!(parse_inr(&format_inr(67200.0)), 67200.0);
        assert_eq!(parse_inr("No savings to invest"), 0.0);
    }
}
