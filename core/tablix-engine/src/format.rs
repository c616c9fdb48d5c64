//! FILENAME: core/tablix-engine/src/format.rs
//! PURPOSE: Display strings for cell values.
//! CONTEXT: Whole numbers get thousands separators and no decimals,
//! fractional numbers two decimals; booleans read Yes/No and dates show
//! the calendar day only.

use parser::ScalarValue;

/// Formats a value for display.
pub fn format_value(value: &ScalarValue) -> String {
    match value {
        ScalarValue::Null => String::new(),
        ScalarValue::Text(s) => s.clone(),
        ScalarValue::Number(n) => format_number(*n),
        ScalarValue::Boolean(b) => if *b { "Yes" } else { "No" }.to_string(),
        ScalarValue::Date(d) => d.format("%Y-%m-%d").to_string(),
    }
}

/// Formats a number with thousands separators.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    // -0 prints as 0
    let value = if value == 0.0 { 0.0 } else { value };
    let rounded = if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    };
    add_thousands_separator(&rounded)
}

/// Add thousands separators to a numeric string.
fn add_thousands_separator(s: &str) -> String {
    let (integer_part, decimal_part) = match s.split_once('.') {
        Some((int, dec)) => (int, Some(dec)),
        None => (s, None),
    };

    let negative = integer_part.starts_with('-');
    let digits: Vec<char> = integer_part.chars().filter(|c| c.is_ascii_digit()).collect();

    let mut result = String::with_capacity(s.len() + digits.len() / 3 + 1);
    if negative {
        result.push('-');
    }
    let len = digits.len();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }

    if let Some(decimal) = decimal_part {
        result.push('.');
        result.push_str(decimal);
    }

    result
}
