//! Lenient readings of untrusted JSON fields.
//!
//! Values arriving from the collaborator or from trade requests are loosely
//! typed. A field is read as a number when it is a JSON number, a numeric
//! string or `true`; anything falsy (`null`, `false`, `0`, `""`) or
//! non-numeric resolves to the caller's default instead of an error.

use serde_json::Value;

/// Numeric reading of `value`, or `None` when it is absent, falsy,
/// non-numeric or non-finite.
pub fn lenient_number(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        Value::Bool(true) => 1.0,
        _ => return None,
    };
    (number.is_finite() && number != 0.0).then_some(number)
}

pub fn number_or(value: Option<&Value>, default: f64) -> f64 {
    lenient_number(value).unwrap_or(default)
}

/// Text reading of `value`; falsy and structured values become empty.
pub fn text_or_empty(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) if number.as_f64() != Some(0.0) => number.to_string(),
        Some(Value::Bool(true)) => "true".to_string(),
        _ => String::new(),
    }
}

/// `true` unless the field is missing or JSON `null`.
pub fn is_present(value: Option<&Value>) -> bool {
    !matches!(value, None | Some(Value::Null))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn numbers_and_numeric_strings_are_read() {
        assert_eq!(lenient_number(Some(&json!(12.5))), Some(12.5));
        assert_eq!(lenient_number(Some(&json!(" 40 "))), Some(40.0));
        assert_eq!(lenient_number(Some(&json!(true))), Some(1.0));
    }

    #[test]
    fn falsy_and_garbage_fall_back_to_default() {
        for raw in [
            json!(null),
            json!(false),
            json!(0),
            json!(""),
            json!("twelve"),
            json!("NaN"),
            json!([1, 2]),
            json!({"amount": 3}),
        ] {
            assert_eq!(number_or(Some(&raw), 7.0), 7.0, "input {raw}");
        }
        assert_eq!(number_or(None, 1.0), 1.0);
    }

    #[test]
    fn text_reading() {
        assert_eq!(text_or_empty(Some(&json!("fine"))), "fine");
        assert_eq!(text_or_empty(Some(&json!(3))), "3");
        assert_eq!(text_or_empty(Some(&json!(null))), "");
        assert_eq!(text_or_empty(Some(&json!({"a": 1}))), "");
        assert_eq!(text_or_empty(None), "");
    }

    #[test]
    fn presence_ignores_null() {
        assert!(is_present(Some(&json!(0))));
        assert!(!is_present(Some(&json!(null))));
        assert!(!is_present(None));
    }
}
