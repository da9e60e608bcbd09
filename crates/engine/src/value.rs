//! Dynamic values passed between program functions
//!
//! Program data is untyped. Arguments travel as a list of JSON values, which
//! keeps hook bodies free to reshape them.

pub use serde_json::Value;

/// Argument list of a function call
pub type Args = Vec<Value>;

/// Whether a returned value carries nothing (`null` or an empty array)
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Turn a returned value into the argument list of the next call
///
/// Arrays are spread into the list, any other value becomes a single argument.
pub fn spread(value: Value) -> Args {
    match value {
        Value::Array(items) => items,
        other => vec![other],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_empty() {
        assert!(is_empty(&Value::Null));
        assert!(is_empty(&json!([])));
        assert!(!is_empty(&json!([0])));
        assert!(!is_empty(&json!(0)));
        assert!(!is_empty(&json!("")));
        assert!(!is_empty(&json!(false)));
    }

    #[test]
    fn test_spread() {
        assert_eq!(spread(json!([1, 2])), vec![json!(1), json!(2)]);
        assert_eq!(spread(json!(7)), vec![json!(7)]);
        assert_eq!(spread(json!({"a": 1})), vec![json!({"a": 1})]);
    }
}
