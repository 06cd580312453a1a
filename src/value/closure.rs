//! Closures: a function pointer into the compiled unit or a native host
//! function, a captured-variable map, and an optional `$this` binding.

use super::object::ObjectHandle;
use super::Value;
use std::fmt;
use std::rc::Rc;

#[derive(Clone)]
pub enum ClosureTarget {
    /// Index into the owning `CompiledUnit::functions` table.
    Compiled(usize),
    /// A host function registered in the registry, looked up by name.
    Native(Rc<str>),
}

#[derive(Clone)]
pub struct Closure {
    pub target: ClosureTarget,
    pub captured: Vec<(String, Value)>,
    pub bound_this: Option<ObjectHandle>,
    pub bound_class: Option<String>,
}

impl Closure {
    pub fn compiled(function_index: usize) -> Self {
        Closure {
            target: ClosureTarget::Compiled(function_index),
            captured: Vec::new(),
            bound_this: None,
            bound_class: None,
        }
    }

    pub fn native(name: impl AsRef<str>) -> Self {
        Closure {
            target: ClosureTarget::Native(Rc::from(name.as_ref())),
            captured: Vec::new(),
            bound_this: None,
            bound_class: None,
        }
    }

    pub fn with_capture(mut self, name: impl Into<String>, value: Value) -> Self {
        self.captured.push((name.into(), value));
        self
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            ClosureTarget::Compiled(idx) => write!(f, "Closure(#{idx})"),
            ClosureTarget::Native(name) => write!(f, "Closure(native:{name})"),
        }
    }
}

impl PartialEq for Closure {
    fn eq(&self, other: &Self) -> bool {
        match (&self.target, &other.target) {
            (ClosureTarget::Compiled(a), ClosureTarget::Compiled(b)) => a == b,
            (ClosureTarget::Native(a), ClosureTarget::Native(b)) => a == b,
            _ => false,
        }
    }
}
