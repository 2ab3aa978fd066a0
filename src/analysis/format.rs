//! Number formatting for KPI cards and narratives.

/// Two decimals with thousands separators, e.g. `1234.5` -> `1,234.50`
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((&fixed, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

/// Like [`format_amount`], but "n/a" for a missing value
pub fn format_optional(value: Option<f64>) -> String {
    value.map(format_amount).unwrap_or_else(|| "n/a".to_string())
}

/// Compact axis label
pub fn format_axis(value: f64) -> String {
    if value.abs() < 0.001 && value != 0.0 {
        format!("{:.2e}", value)
    } else if value.abs() >= 100_000.0 {
        format!("{:.2e}", value)
    } else if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(999.999), "1,000.00");
        assert_eq!(format_amount(1234.5), "1,234.50");
        assert_eq!(format_amount(-1234567.891), "-1,234,567.89");
        assert_eq!(format_amount(-0.001), "0.00");
    }

    #[test]
    fn test_format_optional() {
        assert_eq!(format_optional(None), "n/a");
        assert_eq!(format_optional(Some(12.0)), "12.00");
    }

    #[test]
    fn test_format_axis() {
        assert_eq!(format_axis(0.0), "0");
        assert_eq!(format_axis(42.0), "42");
        assert_eq!(format_axis(2.5), "2.50");
        assert_eq!(format_axis(250_000.0), "2.50e5");
    }
}
