//! Binary arithmetic (spec.md §4.1): coerces to float iff either operand is
//! float, never panics (div/mod by zero yield the documented defaults), and
//! special-cases `+` between two arrays as a left-biased key union.

use super::php_string::PhpString;
use super::Value;

pub fn add(a: &Value, b: &Value) -> Value {
    let (a, b) = (a.deref(), b.deref());
    if let (Value::Array(x), Value::Array(y)) = (&a, &b) {
        return Value::new_array(x.union(y));
    }
    numeric_binop(&a, &b, |x, y| x + y, |x, y| x.checked_add(y))
}

pub fn sub(a: &Value, b: &Value) -> Value {
    numeric_binop(&a.deref(), &b.deref(), |x, y| x - y, |x, y| x.checked_sub(y))
}

pub fn mul(a: &Value, b: &Value) -> Value {
    numeric_binop(&a.deref(), &b.deref(), |x, y| x * y, |x, y| x.checked_mul(y))
}

/// Division by zero yields signed infinity rather than erroring.
pub fn div(a: &Value, b: &Value) -> Value {
    let (a, b) = (a.deref(), b.deref());
    if is_float_op(&a, &b) {
        let bf = b.to_float();
        return if bf == 0.0 {
            Value::new_float(signed_infinity(a.to_float()))
        } else {
            Value::new_float(a.to_float() / bf)
        };
    }
    let (ai, bi) = (a.to_int(), b.to_int());
    if bi == 0 {
        return Value::new_float(signed_infinity(a.to_float()));
    }
    if ai % bi == 0 {
        Value::new_int(ai / bi)
    } else {
        Value::new_float(ai as f64 / bi as f64)
    }
}

/// Modulo by zero yields zero (spec.md §4.1/§9).
pub fn modulo(a: &Value, b: &Value) -> Value {
    let bi = b.to_int();
    if bi == 0 {
        return Value::new_int(0);
    }
    Value::new_int(a.to_int().wrapping_rem(bi))
}

pub fn pow(a: &Value, b: &Value) -> Value {
    let (a, b) = (a.deref(), b.deref());
    if is_float_op(&a, &b) || b.to_int() < 0 {
        return Value::new_float(a.to_float().powf(b.to_float()));
    }
    let exp = b.to_int();
    match a.to_int().checked_pow(exp as u32) {
        Some(v) => Value::new_int(v),
        None => Value::new_float(a.to_float().powf(b.to_float())),
    }
}

pub fn concat(a: &Value, b: &Value) -> Value {
    let mut bytes = a.to_php_string().as_bytes().to_vec();
    bytes.extend_from_slice(b.to_php_string().as_bytes());
    Value::String(PhpString::new(bytes))
}

pub fn bitwise_and(a: &Value, b: &Value) -> Value {
    Value::new_int(a.to_int() & b.to_int())
}
pub fn bitwise_or(a: &Value, b: &Value) -> Value {
    Value::new_int(a.to_int() | b.to_int())
}
pub fn bitwise_xor(a: &Value, b: &Value) -> Value {
    Value::new_int(a.to_int() ^ b.to_int())
}
pub fn bitwise_not(a: &Value) -> Value {
    Value::new_int(!a.to_int())
}
pub fn shift_left(a: &Value, b: &Value) -> Value {
    Value::new_int(a.to_int().wrapping_shl(b.to_int() as u32))
}
pub fn shift_right(a: &Value, b: &Value) -> Value {
    Value::new_int(a.to_int().wrapping_shr(b.to_int() as u32))
}

pub fn neg(a: &Value) -> Value {
    match a.deref() {
        Value::Float(f) => Value::new_float(-f),
        other => match other.to_int().checked_neg() {
            Some(v) => Value::new_int(v),
            None => Value::new_float(-other.to_float()),
        },
    }
}

fn is_float_op(a: &Value, b: &Value) -> bool {
    matches!(a, Value::Float(_)) || matches!(b, Value::Float(_))
}

fn signed_infinity(numerator: f64) -> f64 {
    if numerator < 0.0 {
        f64::NEG_INFINITY
    } else {
        f64::INFINITY
    }
}

fn numeric_binop(
    a: &Value,
    b: &Value,
    float_op: impl Fn(f64, f64) -> f64,
    int_op: impl Fn(i64, i64) -> Option<i64>,
) -> Value {
    if is_float_op(a, b) {
        Value::new_float(float_op(a.to_float(), b.to_float()))
    } else {
        match int_op(a.to_int(), b.to_int()) {
            Some(v) => Value::new_int(v),
            None => Value::new_float(float_op(a.to_float(), b.to_float())),
        }
    }
}
