//! Case-insensitive global symbol table for functions, classes, interfaces,
//! traits and constants (spec.md §4.2), grounded on the teacher's
//! case-insensitive name normalisation approach but simplified to a single
//! lower-cased `HashMap` lookup rather than an interned pointer table.

mod class;
mod error;
mod function;

pub use class::{ClassDescriptor, InterfaceDescriptor, TraitDescriptor};
pub use error::RegistryError;
pub use function::{FunctionBody, FunctionDescriptor, ParamDescriptor};

use crate::value::Value;
use std::collections::HashMap;

/// The pseudo-type every throwable class satisfies, regardless of its own
/// ancestry, as long as it descends from `Exception` or `Error`.
pub const THROWABLE_PSEUDO_TYPE: &str = "throwable";
const EXCEPTION_ROOT: &str = "exception";
const ERROR_ROOT: &str = "error";

#[derive(Default)]
pub struct Registry {
    functions: HashMap<String, FunctionDescriptor>,
    classes: HashMap<String, ClassDescriptor>,
    interfaces: HashMap<String, InterfaceDescriptor>,
    traits: HashMap<String, TraitDescriptor>,
    constants: HashMap<String, Value>,
}

fn key(name: &str) -> String {
    name.to_ascii_lowercase()
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    pub fn register_function(&mut self, desc: FunctionDescriptor) -> Result<(), RegistryError> {
        if desc.name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        self.functions.insert(key(&desc.name), desc);
        Ok(())
    }

    pub fn lookup_function(&self, name: &str) -> Option<&FunctionDescriptor> {
        self.functions.get(&key(name))
    }

    pub fn register_class(&mut self, desc: ClassDescriptor) -> Result<(), RegistryError> {
        if desc.name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        self.classes.insert(key(&desc.name), desc);
        Ok(())
    }

    pub fn lookup_class(&self, name: &str) -> Option<&ClassDescriptor> {
        self.classes.get(&key(name))
    }

    pub fn register_interface(&mut self, desc: InterfaceDescriptor) -> Result<(), RegistryError> {
        if desc.name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        self.interfaces.insert(key(&desc.name), desc);
        Ok(())
    }

    pub fn lookup_interface(&self, name: &str) -> Option<&InterfaceDescriptor> {
        self.interfaces.get(&key(name))
    }

    pub fn register_trait(&mut self, desc: TraitDescriptor) -> Result<(), RegistryError> {
        if desc.name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        self.traits.insert(key(&desc.name), desc);
        Ok(())
    }

    pub fn lookup_trait(&self, name: &str) -> Option<&TraitDescriptor> {
        self.traits.get(&key(name))
    }

    pub fn register_constant(&mut self, name: &str, value: Value) -> Result<(), RegistryError> {
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        self.constants.insert(name.to_string(), value);
        Ok(())
    }

    /// Constant names are case-sensitive, unlike functions/classes.
    pub fn lookup_constant(&self, name: &str) -> Option<&Value> {
        self.constants.get(name)
    }

    /// Walks the parent chain and the transitively-expanded interface set of
    /// `class_name`, checking whether `type_name` appears, with the
    /// `throwable` pseudo-type satisfied by any class descending from
    /// `Exception` or `Error`.
    pub fn instance_of(&self, class_name: &str, type_name: &str) -> bool {
        let type_key = key(type_name);
        if type_key == THROWABLE_PSEUDO_TYPE {
            return self.descends_from(class_name, EXCEPTION_ROOT)
                || self.descends_from(class_name, ERROR_ROOT);
        }
        if key(class_name) == type_key {
            return true;
        }
        let mut current = Some(class_name.to_string());
        while let Some(name) = current {
            if key(&name) == type_key {
                return true;
            }
            let Some(class) = self.classes.get(&key(&name)) else { break };
            if class
                .interfaces
                .iter()
                .any(|iface| self.interface_extends(iface, &type_key))
            {
                return true;
            }
            current = class.parent.clone();
        }
        false
    }

    fn descends_from(&self, class_name: &str, ancestor: &str) -> bool {
        let mut current = Some(class_name.to_string());
        while let Some(name) = current {
            if key(&name) == ancestor {
                return true;
            }
            let Some(class) = self.classes.get(&key(&name)) else { break };
            current = class.parent.clone();
        }
        false
    }

    fn interface_extends(&self, iface_name: &str, type_key: &str) -> bool {
        if key(iface_name) == *type_key {
            return true;
        }
        let Some(iface) = self.interfaces.get(&key(iface_name)) else { return false };
        iface.parents.iter().any(|p| self.interface_extends(p, type_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let mut reg = Registry::new();
        reg.register_function(FunctionDescriptor::native("Foo", 0, Some(0), false))
            .unwrap();
        assert!(reg.lookup_function("foo").is_some());
        assert!(reg.lookup_function("FOO").is_some());
        assert!(reg.lookup_function("Foo").is_some());
    }

    #[test]
    fn empty_name_registration_fails() {
        let mut reg = Registry::new();
        let err = reg
            .register_function(FunctionDescriptor::native("", 0, Some(0), false))
            .unwrap_err();
        assert!(matches!(err, RegistryError::EmptyName));
    }

    #[test]
    fn instance_of_walks_parent_and_interface_chain() {
        let mut reg = Registry::new();
        reg.register_interface(InterfaceDescriptor {
            name: "Throwable".into(),
            methods: vec![],
            parents: vec![],
        })
        .unwrap();
        reg.register_class(ClassDescriptor {
            name: "Exception".into(),
            parent: None,
            interfaces: vec!["Throwable".into()],
            ..ClassDescriptor::new("Exception")
        })
        .unwrap();
        reg.register_class(ClassDescriptor {
            name: "MyException".into(),
            parent: Some("Exception".into()),
            ..ClassDescriptor::new("MyException")
        })
        .unwrap();

        assert!(reg.instance_of("MyException", "Exception"));
        assert!(reg.instance_of("MyException", "Throwable"));
        assert!(reg.instance_of("MyException", "throwable"));
        assert!(!reg.instance_of("MyException", "RuntimeException"));
    }
}
