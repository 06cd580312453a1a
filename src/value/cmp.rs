//! Loose (`==`), strict (`===`) and ordered (`<=>`) comparison, per
//! spec.md §4.1's cross-type table.

use super::array::strict_array_eq;
use super::Value;
use std::cmp::Ordering;

pub fn loose_eq(a: &Value, b: &Value) -> bool {
    let (a, b) = (a.deref(), b.deref());
    match (&a, &b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(_), _) | (_, Value::Bool(_)) => a.to_bool() == b.to_bool(),
        (Value::Null, _) | (_, Value::Null) => {
            // null vs non-bool: PHP compares via bool coercion too (null == "" is true,
            // null == 0 is true, null == [] is true).
            a.to_bool() == b.to_bool()
        }
        (Value::Array(x), Value::Array(y)) => x == y,
        (Value::Array(_), _) | (_, Value::Array(_)) => false,
        (Value::Object(x), Value::Object(y)) => std::rc::Rc::ptr_eq(x, y) || object_eq(x, y),
        (Value::Object(_), _) | (_, Value::Object(_)) => false,
        _ if a.is_numeric() && b.is_numeric() => numeric_compare(&a, &b) == Ordering::Equal,
        (Value::String(x), Value::String(y)) => x == y,
        _ => numeric_compare(&a, &b) == Ordering::Equal,
    }
}

fn object_eq(
    x: &super::object::ObjectHandle,
    y: &super::object::ObjectHandle,
) -> bool {
    let (x, y) = (x.borrow(), y.borrow());
    x.class_name == y.class_name
        && x.properties.len() == y.properties.len()
        && x.properties
            .iter()
            .all(|(k, v)| y.properties.get(k).map(|ov| v.loose_eq(ov)).unwrap_or(false))
}

pub fn strict_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Reference(_), _) | (_, Value::Reference(_)) => strict_eq(&a.deref(), &b.deref()),
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => strict_array_eq(x, y),
        (Value::Object(x), Value::Object(y)) => std::rc::Rc::ptr_eq(x, y),
        (Value::Resource(x), Value::Resource(y)) => x == y,
        (Value::Callable(x), Value::Callable(y)) => x == y,
        (Value::Goroutine(x), Value::Goroutine(y)) => std::sync::Arc::ptr_eq(x, y),
        (Value::WaitGroup(x), Value::WaitGroup(y)) => std::sync::Arc::ptr_eq(x, y),
        _ => false,
    }
}

/// Ordered comparison: null is less than any non-null, strings compare
/// lexicographically, numbers (incl. numeric strings) compare numerically.
pub fn compare(a: &Value, b: &Value) -> Ordering {
    let (a, b) = (a.deref(), b.deref());
    match (&a, &b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => {
            if b.to_bool() {
                Ordering::Less
            } else {
                Ordering::Equal
            }
        }
        (_, Value::Null) => {
            if a.to_bool() {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        }
        (Value::Bool(_), _) | (_, Value::Bool(_)) => a.to_bool().cmp(&b.to_bool()),
        (Value::String(x), Value::String(y)) if !(a.is_numeric() && b.is_numeric()) => {
            x.as_bytes().cmp(y.as_bytes())
        }
        _ => numeric_compare(&a, &b),
    }
}

fn numeric_compare(a: &Value, b: &Value) -> Ordering {
    if matches!(a, Value::Int(_)) && matches!(b, Value::Int(_)) {
        a.to_int().cmp(&b.to_int())
    } else {
        a.to_float().partial_cmp(&b.to_float()).unwrap_or(Ordering::Equal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_string_loosely_equals_false() {
        assert!(loose_eq(&Value::new_string("0"), &Value::new_bool(false)));
    }

    #[test]
    fn null_loosely_equals_false_but_not_strictly() {
        assert!(loose_eq(&Value::Null, &Value::new_bool(false)));
        assert!(!strict_eq(&Value::Null, &Value::new_bool(false)));
    }
}
