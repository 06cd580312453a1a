//! Descriptors for classes, interfaces and traits, as stored in the
//! registry after compilation (spec.md §3 `CompiledUnit`, §4.2 `Registry`).

#[derive(Clone, Debug, Default)]
pub struct ClassDescriptor {
    pub name: String,
    pub parent: Option<String>,
    pub interfaces: Vec<String>,
    pub traits: Vec<String>,
    pub properties: Vec<PropertyDescriptor>,
    pub methods: Vec<MethodDescriptor>,
    pub constants: Vec<(String, crate::value::Value)>,
    pub is_abstract: bool,
    pub is_final: bool,
}

impl ClassDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        ClassDescriptor { name: name.into(), ..Default::default() }
    }

    pub fn find_method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.name.eq_ignore_ascii_case(name))
    }
}

#[derive(Clone, Debug)]
pub struct PropertyDescriptor {
    pub name: String,
    pub default: crate::value::Value,
    pub is_static: bool,
}

#[derive(Clone, Debug)]
pub struct MethodDescriptor {
    pub name: String,
    /// Index into the owning `CompiledUnit::functions` table.
    pub function_index: usize,
    pub is_static: bool,
    pub is_abstract: bool,
}

#[derive(Clone, Debug, Default)]
pub struct InterfaceDescriptor {
    pub name: String,
    pub methods: Vec<String>,
    pub parents: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct TraitDescriptor {
    pub name: String,
    pub methods: Vec<MethodDescriptor>,
    pub properties: Vec<PropertyDescriptor>,
}
