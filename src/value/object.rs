//! Object runtime representation. Objects have reference semantics: every
//! `Value::Object` clone shares the same `Rc<RefCell<ObjectData>>`, so
//! property mutation through one handle is visible through every other
//! (data-model invariant 3).

use super::Value;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;

pub type ObjectHandle = Rc<RefCell<ObjectData>>;

#[derive(Debug)]
pub struct ObjectData {
    pub class_name: String,
    pub properties: IndexMap<String, Value>,
    pub destructed: bool,
    /// Monotonic id used only for `===` identity and debug display; two
    /// distinct `new` expressions never share one even if all properties match.
    pub id: u64,
}

impl ObjectData {
    pub fn new(class_name: impl Into<String>, id: u64) -> ObjectHandle {
        Rc::new(RefCell::new(ObjectData {
            class_name: class_name.into(),
            properties: IndexMap::new(),
            destructed: false,
            id,
        }))
    }
}
