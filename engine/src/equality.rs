//! Structural equality over field values.
//!
//! Values are compared as JSON. A missing value and an explicit `null` are the
//! same thing at every depth, so serialization artifacts never read as a change.

use serde_json::{Map, Number, Value};

/// Compare two possibly-absent field values.
///
/// - absent and `null` are interchangeable
/// - scalars are equal iff identical; numbers compare by numeric value
/// - arrays are equal iff same length and pairwise equal, in order
/// - objects are equal iff they hold the same non-null keys with equal values
pub fn values_equal(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (present(a), present(b)) {
        (None, None) => true,
        (Some(a), Some(b)) => present_equal(a, b),
        _ => false,
    }
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn present_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len()
                && a.iter()
                    .zip(b)
                    .all(|(x, y)| values_equal(Some(x), Some(y)))
        }
        (Value::Object(a), Value::Object(b)) => objects_equal(a, b),
        _ => false,
    }
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
        return a == b;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn objects_equal(a: &Map<String, Value>, b: &Map<String, Value>) -> bool {
    let present_keys = |m: &Map<String, Value>| m.values().filter(|v| !v.is_null()).count();
    if present_keys(a) != present_keys(b) {
        return false;
    }
    a.iter()
        .filter(|(_, v)| !v.is_null())
        .all(|(key, v)| values_equal(Some(v), b.get(key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn eq(a: Value, b: Value) -> bool {
        values_equal(Some(&a), Some(&b))
    }

    #[test]
    fn absence_flavours_are_equal() {
        assert!(values_equal(None, None));
        assert!(values_equal(Some(&Value::Null), None));
        assert!(values_equal(None, Some(&Value::Null)));
        assert!(eq(Value::Null, Value::Null));
    }

    #[test]
    fn absent_differs_from_present() {
        assert!(!values_equal(None, Some(&json!(""))));
        assert!(!values_equal(Some(&json!([])), None));
        assert!(!values_equal(Some(&json!(0)), Some(&Value::Null)));
    }

    #[test]
    fn scalars() {
        assert!(eq(json!("todo"), json!("todo")));
        assert!(!eq(json!("todo"), json!("done")));
        assert!(eq(json!(true), json!(true)));
        assert!(!eq(json!("1"), json!(1)));
    }

    #[test]
    fn numbers_compare_by_value() {
        assert!(eq(json!(1), json!(1.0)));
        assert!(eq(json!(-3), json!(-3)));
        assert!(!eq(json!(1), json!(1.5)));
        assert!(!eq(json!(u64::MAX), json!(-1)));
    }

    #[test]
    fn sequences_are_order_sensitive() {
        assert!(eq(json!(["a", "b"]), json!(["a", "b"])));
        assert!(!eq(json!(["a", "b"]), json!(["a", "c"])));
        assert!(!eq(json!(["a", "b"]), json!(["a"])));
        assert!(!eq(json!(["a", "b"]), json!(["b", "a"])));
        assert!(eq(json!([]), json!([])));
    }

    #[test]
    fn nested_null_in_sequence_matches_null() {
        assert!(eq(json!(["a", null]), json!(["a", null])));
        assert!(!eq(json!(["a", null]), json!(["a", "b"])));
    }

    #[test]
    fn composites_compare_by_key_set() {
        assert!(eq(json!({"a": 1, "b": [1, 2]}), json!({"b": [1, 2], "a": 1})));
        assert!(!eq(json!({"a": 1}), json!({"a": 1, "b": 2})));
        assert!(!eq(json!({"a": 1}), json!({"b": 1})));
        assert!(!eq(json!({"a": {"x": 1}}), json!({"a": {"x": 2}})));
    }

    #[test]
    fn composite_null_entries_read_as_absent() {
        assert!(eq(json!({"a": 1, "b": null}), json!({"a": 1})));
        assert!(!eq(json!({"a": null}), json!({"b": 1})));
    }

    #[test]
    fn mismatched_kinds() {
        assert!(!eq(json!([]), json!({})));
        assert!(!eq(json!(["a"]), json!("a")));
    }
}
