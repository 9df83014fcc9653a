//! Default value coercion
//!
//! Schema authors write defaults loosely (`"default": "yes"` on a boolean,
//! `"default": "4711.4"` on a number). Each leaf kind accepts a small set of
//! spellings and rejects everything else.

use crate::document::kind_of;
use serde_json::{Number, Value};

pub fn string_default(value: &Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(format!("cannot use {} as string default", kind_of(other))),
    }
}

pub fn boolean_default(value: &Value) -> Result<bool, String> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) => Ok(matches!(
            s.trim().to_lowercase().as_str(),
            "true" | "on" | "yes"
        )),
        Value::Number(n) => Ok(n.as_f64().is_some_and(|f| f != 0.0)),
        other => Err(format!("cannot use {} as boolean default", kind_of(other))),
    }
}

pub fn integer_default(value: &Value) -> Result<i64, String> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .ok_or_else(|| format!("integer default out of range: {}", n)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(|f| f.trunc() as i64)
            .map_err(|_| format!("cannot parse integer default: {:?}", s)),
        Value::Bool(b) => Ok(i64::from(*b)),
        other => Err(format!("cannot use {} as integer default", kind_of(other))),
    }
}

pub fn number_default(value: &Value) -> Result<Number, String> {
    match value {
        Value::Number(n) => Ok(n.clone()),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .ok_or_else(|| format!("cannot parse number default: {:?}", s)),
        Value::Bool(b) => Ok(Number::from(i64::from(*b))),
        other => Err(format!("cannot use {} as number default", kind_of(other))),
    }
}

/// Integer bound; fractional bounds are truncated
pub fn integer_bound(value: &Value) -> Result<i64, String> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .ok_or_else(|| format!("integer bound out of range: {}", n)),
        other => Err(format!("bound must be a number, found {}", kind_of(other))),
    }
}

pub fn number_bound(value: &Value) -> Result<Number, String> {
    match value {
        Value::Number(n) => Ok(n.clone()),
        other => Err(format!("bound must be a number, found {}", kind_of(other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!("hallo"), "hallo")]
    #[case(json!(true), "true")]
    #[case(json!(false), "false")]
    #[case(json!(42), "42")]
    #[case(json!(4711.4), "4711.4")]
    fn test_string_default(#[case] value: Value, #[case] expected: &str) {
        assert_eq!(string_default(&value).unwrap(), expected);
    }

    #[rstest]
    #[case(json!(true), true)]
    #[case(json!("true"), true)]
    #[case(json!("On"), true)]
    #[case(json!("yes"), true)]
    #[case(json!("no"), false)]
    #[case(json!("1"), false)]
    #[case(json!(0), false)]
    #[case(json!(3), true)]
    fn test_boolean_default(#[case] value: Value, #[case] expected: bool) {
        assert_eq!(boolean_default(&value).unwrap(), expected);
    }

    #[rstest]
    #[case(json!(64), 64)]
    #[case(json!(4.9), 4)]
    #[case(json!("32"), 32)]
    #[case(json!("7.5"), 7)]
    #[case(json!(true), 1)]
    fn test_integer_default(#[case] value: Value, #[case] expected: i64) {
        assert_eq!(integer_default(&value).unwrap(), expected);
    }

    #[test]
    fn test_number_default_keeps_spelling() {
        assert_eq!(number_default(&json!(64)).unwrap().to_string(), "64");
        assert_eq!(number_default(&json!(4711.4)).unwrap().to_string(), "4711.4");
        assert_eq!(number_default(&json!("49.2")).unwrap().to_string(), "49.2");
    }

    #[rstest]
    #[case(json!(null))]
    #[case(json!([1]))]
    #[case(json!({"a": 1}))]
    fn test_rejects_containers(#[case] value: Value) {
        assert!(string_default(&value).is_err());
        assert!(boolean_default(&value).is_err());
        assert!(integer_default(&value).is_err());
        assert!(number_default(&value).is_err());
    }

    #[test]
    fn test_unparsable_strings() {
        assert!(integer_default(&json!("abc")).is_err());
        assert!(number_default(&json!("abc")).is_err());
    }
}
