//! Byte-sequence string value. The source language's strings are not
//! guaranteed to be valid UTF-8, so the backing storage is raw bytes with a
//! cached length, shared behind `Rc` for cheap clones.

use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};
use std::rc::Rc;

#[derive(Clone, Debug, Eq)]
pub struct PhpString {
    bytes: Rc<[u8]>,
}

impl PhpString {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        PhpString { bytes: Rc::from(bytes.into()) }
    }

    pub fn from_str(s: &str) -> Self {
        PhpString::new(s.as_bytes().to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

impl PartialEq for PhpString {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl std::hash::Hash for PhpString {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl PartialOrd for PhpString {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.bytes.cmp(&other.bytes))
    }
}

impl Ord for PhpString {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.bytes.cmp(&other.bytes)
    }
}

impl Display for PhpString {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_lossy())
    }
}

impl From<&str> for PhpString {
    fn from(s: &str) -> Self {
        PhpString::from_str(s)
    }
}

impl From<String> for PhpString {
    fn from(s: String) -> Self {
        PhpString::new(s.into_bytes())
    }
}
