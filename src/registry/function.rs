//! Function descriptors unifying user-defined and host (native) functions
//! under one registry entry (spec.md §4.2, §4.6 host-function ABI).

use crate::host::HostFn;

#[derive(Clone, Debug)]
pub struct ParamDescriptor {
    pub name: String,
    pub by_reference: bool,
    pub default: Option<crate::value::Value>,
}

#[derive(Clone)]
pub enum FunctionBody {
    /// Index into the owning `CompiledUnit::functions` table.
    Compiled(usize),
    Native(HostFn),
}

impl std::fmt::Debug for FunctionBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FunctionBody::Compiled(idx) => write!(f, "Compiled(#{idx})"),
            FunctionBody::Native(_) => write!(f, "Native(..)"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FunctionDescriptor {
    pub name: String,
    pub body: FunctionBody,
    pub min_args: usize,
    pub max_args: Option<usize>,
    pub variadic: bool,
    pub params: Vec<ParamDescriptor>,
}

impl FunctionDescriptor {
    pub fn compiled(
        name: impl Into<String>,
        function_index: usize,
        min_args: usize,
        max_args: Option<usize>,
        variadic: bool,
    ) -> Self {
        FunctionDescriptor {
            name: name.into(),
            body: FunctionBody::Compiled(function_index),
            min_args,
            max_args,
            variadic,
            params: Vec::new(),
        }
    }

    pub fn native(
        name: impl Into<String>,
        min_args: usize,
        max_args: Option<usize>,
        variadic: bool,
    ) -> Self {
        let name = name.into();
        FunctionDescriptor {
            body: FunctionBody::Native(crate::host::unimplemented_host_fn(name.clone())),
            name,
            min_args,
            max_args,
            variadic,
            params: Vec::new(),
        }
    }

    pub fn with_native_body(mut self, f: HostFn) -> Self {
        self.body = FunctionBody::Native(f);
        self
    }

    /// Arity validation performed on `init_fcall`/`do_fcall`.
    pub fn check_arity(&self, argc: usize) -> bool {
        if argc < self.min_args {
            return false;
        }
        match self.max_args {
            Some(max) => self.variadic || argc <= max,
            None => true,
        }
    }
}
