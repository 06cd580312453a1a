//! Ordered, copy-on-write array backing [`Value::Array`](super::Value::Array).
//!
//! Keys are normalised the way the source language normalises them (see
//! `ArrayKey::normalize`) and iteration order follows insertion order via
//! [`IndexMap`], matching invariant 2 ("array order preservation") of the
//! data model.

use super::Value;
use indexmap::IndexMap;
use std::fmt::{self, Display, Formatter};
use std::rc::Rc;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ArrayKey {
    Int(i64),
    Str(Rc<str>),
}

impl ArrayKey {
    /// Key normalisation: `Null -> ""`, `Bool -> 0|1`, canonical decimal-integer
    /// strings and floats become integer keys, everything else stays a string key.
    pub fn normalize(value: &Value) -> ArrayKey {
        match value {
            Value::Null => ArrayKey::Str(Rc::from("")),
            Value::Bool(b) => ArrayKey::Int(if *b { 1 } else { 0 }),
            Value::Int(i) => ArrayKey::Int(*i),
            Value::Float(f) => ArrayKey::Int(*f as i64),
            Value::String(s) => {
                let text = s.to_string_lossy();
                if let Some(key) = Self::canonical_integer(&text) {
                    ArrayKey::Int(key)
                } else {
                    ArrayKey::Str(Rc::from(text.as_ref()))
                }
            }
            other => ArrayKey::Str(Rc::from(other.to_php_string().to_string_lossy().as_ref())),
        }
    }

    /// A string is a canonical integer key iff it round-trips through
    /// `i64::to_string` exactly (no leading zeros, no leading `+`, "-0" excluded).
    fn canonical_integer(s: &str) -> Option<i64> {
        if s.is_empty() {
            return None;
        }
        let n: i64 = s.parse().ok()?;
        if n.to_string() == s {
            Some(n)
        } else {
            None
        }
    }
}

impl Display for ArrayKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ArrayKey::Int(i) => write!(f, "{i}"),
            ArrayKey::Str(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ArrayData {
    entries: IndexMap<ArrayKey, Value>,
    next_index: i64,
}

impl ArrayData {
    pub fn new() -> Self {
        ArrayData { entries: IndexMap::new(), next_index: 0 }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.get(&ArrayKey::normalize(key))
    }

    pub fn get_by_key(&self, key: &ArrayKey) -> Option<&Value> {
        self.entries.get(key)
    }

    /// `ArraySet`: insert or overwrite, bumping `next_index` per invariant 4.
    pub fn set(&mut self, key: &Value, value: Value) {
        let key = ArrayKey::normalize(key);
        self.bump_next_index(&key);
        self.entries.insert(key, value);
    }

    pub fn set_by_key(&mut self, key: ArrayKey, value: Value) {
        self.bump_next_index(&key);
        self.entries.insert(key, value);
    }

    fn bump_next_index(&mut self, key: &ArrayKey) {
        if let ArrayKey::Int(i) = key {
            if *i >= self.next_index {
                self.next_index = i.saturating_add(1);
            }
        }
    }

    /// Append with an implicit null key (`$a[] = v`), using and advancing `next_index`.
    pub fn push(&mut self, value: Value) {
        let key = ArrayKey::Int(self.next_index);
        self.next_index = self.next_index.saturating_add(1);
        self.entries.insert(key, value);
    }

    pub fn unset(&mut self, key: &Value) -> Option<Value> {
        self.entries.shift_remove(&ArrayKey::normalize(key))
    }

    pub fn next_index(&self) -> i64 {
        self.next_index
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, ArrayKey, Value> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ArrayKey> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.values()
    }

    /// Left-biased union (`$a + $b`): keys already present in `self` keep their value.
    pub fn union(&self, other: &ArrayData) -> ArrayData {
        let mut result = self.clone();
        for (key, value) in other.entries.iter() {
            if !result.entries.contains_key(key) {
                result.set_by_key(key.clone(), value.clone());
            }
        }
        result
    }
}

impl PartialEq for ArrayData {
    fn eq(&self, other: &Self) -> bool {
        if self.entries.len() != other.entries.len() {
            return false;
        }
        // loose array equality: same length, every key maps to a loosely-equal value,
        // order independent (per spec.md's `==` table).
        self.entries.iter().all(|(k, v)| {
            other.entries.get(k).map(|ov| v.loose_eq(ov)).unwrap_or(false)
        })
    }
}

/// Strict array equality additionally requires identical key order.
pub fn strict_array_eq(a: &ArrayData, b: &ArrayData) -> bool {
    if a.entries.len() != b.entries.len() {
        return false;
    }
    a.entries
        .iter()
        .zip(b.entries.iter())
        .all(|((ak, av), (bk, bv))| ak == bk && av.strict_eq(bv))
}

/// Makes a uniquely-owned array available for mutation, cloning the backing
/// data if other `Rc` handles alias it (copy-on-write, invariant 3).
pub fn make_mut(rc: &mut Rc<ArrayData>) -> &mut ArrayData {
    Rc::make_mut(rc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iteration_preserves_insertion_order() {
        let mut arr = ArrayData::new();
        arr.set(&Value::new_string("b"), Value::new_int(1));
        arr.set(&Value::new_string("a"), Value::new_int(2));
        arr.push(Value::new_int(3));
        let keys: Vec<String> = arr.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["b".to_string(), "a".to_string(), "0".to_string()]);
    }

    #[test]
    fn empty_plus_single_is_left_biased_union() {
        let empty = ArrayData::new();
        let mut one = ArrayData::new();
        one.push(Value::new_int(1));
        let result = empty.union(&one);
        assert_eq!(result.get_by_key(&ArrayKey::Int(0)).unwrap().to_int(), 1);
    }

    #[test]
    fn left_side_key_wins_in_union() {
        let mut left = ArrayData::new();
        left.push(Value::new_int(0));
        let mut right = ArrayData::new();
        right.push(Value::new_int(1));
        let result = left.union(&right);
        assert_eq!(result.len(), 1);
        assert_eq!(result.get_by_key(&ArrayKey::Int(0)).unwrap().to_int(), 0);
    }

    #[test]
    fn copy_on_write_isolates_mutation() {
        let mut original = Rc::new(ArrayData::new());
        Rc::get_mut(&mut original).unwrap().push(Value::new_int(1));
        let mut alias = original.clone();
        make_mut(&mut alias).set(&Value::new_int(0), Value::new_int(99));
        assert_eq!(original.get_by_key(&ArrayKey::Int(0)).unwrap().to_int(), 1);
        assert_eq!(alias.get_by_key(&ArrayKey::Int(0)).unwrap().to_int(), 99);
    }
}
