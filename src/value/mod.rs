//! The tagged runtime value (spec.md §3/§4.1): a discriminated union over
//! null, bool, int, float, string, array, object, resource, reference,
//! callable, goroutine and wait-group, plus the coercion, arithmetic and
//! comparison rules that operate on it.

pub mod array;
pub mod closure;
pub mod cmp;
pub mod concurrency;
pub mod object;
pub mod ops;
pub mod php_string;

use self::array::ArrayData;
use self::closure::Closure;
use self::concurrency::{GoroutineHandle, WaitGroupHandle};
use self::object::ObjectHandle;
use self::php_string::PhpString;
use std::cell::RefCell;
use std::fmt::{self, Display, Formatter};
use std::rc::Rc;

#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(PhpString),
    Array(Rc<ArrayData>),
    Object(ObjectHandle),
    Resource(Rc<str>),
    Reference(Rc<RefCell<Value>>),
    Callable(Rc<Closure>),
    Goroutine(GoroutineHandle),
    WaitGroup(WaitGroupHandle),
}

/// Bound on reference-chain length before `deref` gives up and returns
/// `Null`, guarding against reference cycles (data-model invariant: "no
/// operation enters an infinite deref loop").
const MAX_DEREF_DEPTH: usize = 1024;

impl Value {
    pub fn new_null() -> Value {
        Value::Null
    }
    pub fn new_bool(b: bool) -> Value {
        Value::Bool(b)
    }
    pub fn new_int(i: i64) -> Value {
        Value::Int(i)
    }
    pub fn new_float(f: f64) -> Value {
        Value::Float(f)
    }
    pub fn new_string(s: impl Into<PhpString>) -> Value {
        Value::String(s.into())
    }
    pub fn new_array(data: ArrayData) -> Value {
        Value::Array(Rc::new(data))
    }
    pub fn new_reference(target: Value) -> Value {
        Value::Reference(Rc::new(RefCell::new(target)))
    }
    pub fn new_closure(closure: Closure) -> Value {
        Value::Callable(Rc::new(closure))
    }

    /// Every operation other than reference plumbing first dereferences
    /// transitively (data-model invariant 1).
    pub fn deref(&self) -> Value {
        let mut current = self.clone();
        let mut depth = 0;
        while let Value::Reference(cell) = current {
            depth += 1;
            if depth > MAX_DEREF_DEPTH {
                return Value::Null;
            }
            current = cell.borrow().clone();
        }
        current
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Value::Reference(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self.deref(), Value::Null)
    }
    pub fn is_bool(&self) -> bool {
        matches!(self.deref(), Value::Bool(_))
    }
    pub fn is_int(&self) -> bool {
        matches!(self.deref(), Value::Int(_))
    }
    pub fn is_float(&self) -> bool {
        matches!(self.deref(), Value::Float(_))
    }
    pub fn is_string(&self) -> bool {
        matches!(self.deref(), Value::String(_))
    }
    pub fn is_array(&self) -> bool {
        matches!(self.deref(), Value::Array(_))
    }
    pub fn is_object(&self) -> bool {
        matches!(self.deref(), Value::Object(_))
    }
    pub fn is_numeric(&self) -> bool {
        match self.deref() {
            Value::Int(_) | Value::Float(_) => true,
            Value::String(s) => is_numeric_string(&s.to_string_lossy()),
            _ => false,
        }
    }

    // --- coercions (spec.md §4.1) ---

    pub fn to_bool(&self) -> bool {
        match self.deref() {
            Value::Null => false,
            Value::Bool(b) => b,
            Value::Int(i) => i != 0,
            Value::Float(f) => f != 0.0 && !f.is_nan(),
            Value::String(s) => {
                let bytes = s.as_bytes();
                !(bytes.is_empty() || bytes == b"0")
            }
            Value::Array(a) => !a.is_empty(),
            Value::Object(_)
            | Value::Resource(_)
            | Value::Callable(_)
            | Value::Goroutine(_)
            | Value::WaitGroup(_) => true,
            Value::Reference(_) => unreachable!("deref() never returns Reference"),
        }
    }

    pub fn to_int(&self) -> i64 {
        match self.deref() {
            Value::Null => 0,
            Value::Bool(b) => i64::from(b),
            Value::Int(i) => i,
            Value::Float(f) => f.trunc() as i64,
            Value::String(s) => parse_leading_number(&s.to_string_lossy()).0,
            Value::Array(a) => i64::from(!a.is_empty()),
            _ => 0,
        }
    }

    pub fn to_float(&self) -> f64 {
        match self.deref() {
            Value::Null => 0.0,
            Value::Bool(b) => {
                if b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Int(i) => i as f64,
            Value::Float(f) => f,
            Value::String(s) => parse_leading_number(&s.to_string_lossy()).1,
            Value::Array(a) => {
                if a.is_empty() {
                    0.0
                } else {
                    1.0
                }
            }
            _ => 0.0,
        }
    }

    pub fn to_php_string(&self) -> PhpString {
        match self.deref() {
            Value::Null => PhpString::from_str(""),
            Value::Bool(b) => PhpString::from_str(if b { "1" } else { "" }),
            Value::Int(i) => PhpString::from(i.to_string()),
            Value::Float(f) => PhpString::from(format_float(f)),
            Value::String(s) => s,
            Value::Array(_) => PhpString::from_str("Array"),
            Value::Object(obj) => PhpString::from(obj.borrow().class_name.clone()),
            _ => PhpString::from_str(""),
        }
    }

    pub fn class_name(&self) -> Option<String> {
        match self.deref() {
            Value::Object(obj) => Some(obj.borrow().class_name.clone()),
            _ => None,
        }
    }

    pub fn loose_eq(&self, other: &Value) -> bool {
        cmp::loose_eq(self, other)
    }

    pub fn strict_eq(&self, other: &Value) -> bool {
        cmp::strict_eq(self, other)
    }

    pub fn compare(&self, other: &Value) -> std::cmp::Ordering {
        cmp::compare(self, other)
    }
}

/// Shortest round-trip decimal formatting: Rust's default `{}` for `f64`
/// already produces the shortest string that reparses to the same value.
fn format_float(f: f64) -> String {
    if f.is_infinite() {
        return if f > 0.0 { "INF".to_string() } else { "-INF".to_string() };
    }
    if f.is_nan() {
        return "NAN".to_string();
    }
    let mut s = format!("{f}");
    if !s.contains('.') && !s.contains('e') && !s.contains("inf") && !s.contains("nan") {
        // integral floats still print as floats conceptually, but the source
        // language's shortest-roundtrip rule is happy with the bare integer form.
        return s;
    }
    if s.ends_with(".0") {
        s.truncate(s.len() - 2);
    }
    s
}

/// Lexes the leading numeric prefix: optional whitespace, optional sign,
/// digits, optional fraction, optional exponent; stops at the first
/// non-conforming byte. Returns `(as_int_truncated, as_float)`.
fn parse_leading_number(s: &str) -> (i64, f64) {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() && (bytes[i] as char).is_whitespace() {
        i += 1;
    }
    let start = i;
    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }
    let digits_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut end = i;
    let mut is_float = false;
    if i < bytes.len() && bytes[i] == b'.' {
        let mut j = i + 1;
        let frac_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > frac_start || i > digits_start {
            is_float = true;
            end = j;
            i = j;
        }
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_digits_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_digits_start {
            is_float = true;
            end = j;
        }
    }
    if end <= digits_start && !is_float {
        return (0, 0.0);
    }
    let text = &s[start..end];
    if text.is_empty() || text == "+" || text == "-" {
        return (0, 0.0);
    }
    let float_val: f64 = text.parse().unwrap_or(0.0);
    let int_val = if is_float {
        float_val.trunc() as i64
    } else {
        text.parse().unwrap_or(0)
    };
    (int_val, float_val)
}

fn is_numeric_string(s: &str) -> bool {
    let trimmed = s.trim();
    !trimmed.is_empty() && trimmed.parse::<f64>().is_ok()
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_php_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_roundtrips_through_php_string() {
        for i in [0_i64, 1, -1, i64::MAX, i64::MIN, 42] {
            let s = Value::new_int(i).to_php_string().to_string_lossy().to_string();
            assert_eq!(s.parse::<i64>().unwrap(), i);
        }
    }

    #[test]
    fn finite_float_roundtrips_through_php_string() {
        for f in [0.0_f64, 1.5, -3.25, 100.0, 0.1] {
            let s = Value::new_float(f).to_php_string().to_string_lossy().to_string();
            assert_eq!(s.parse::<f64>().unwrap(), f);
        }
    }

    #[test]
    fn string_to_int_stops_at_first_non_digit() {
        assert_eq!(Value::new_string("  -12abc").to_int(), -12);
    }

    #[test]
    fn empty_and_zero_string_are_falsy_others_truthy() {
        assert!(!Value::new_string("").to_bool());
        assert!(!Value::new_string("0").to_bool());
        assert!(Value::new_string("0.0").to_bool());
        assert!(Value::new_string("false").to_bool());
    }

    #[test]
    fn reference_cycle_guard_stops_infinite_deref() {
        let cell = Rc::new(RefCell::new(Value::Null));
        *cell.borrow_mut() = Value::Reference(cell.clone());
        let v = Value::Reference(cell);
        assert!(v.deref().is_null());
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.deref() {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(i) => write!(f, "Int({i})"),
            Value::Float(v) => write!(f, "Float({v})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Array(a) => write!(f, "Array(len={})", a.len()),
            Value::Object(o) => write!(f, "Object({})", o.borrow().class_name),
            Value::Resource(r) => write!(f, "Resource({r})"),
            Value::Callable(c) => write!(f, "{c:?}"),
            Value::Goroutine(g) => write!(f, "{g:?}"),
            Value::WaitGroup(w) => write!(f, "{w:?}"),
            Value::Reference(_) => unreachable!("deref() never returns Reference"),
        }
    }
}
