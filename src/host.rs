//! The host-function ABI (spec.md §4.6): the calling contract between the VM
//! and native Rust implementations of built-ins. A host function is a
//! closure `(context, args) -> Result<Value, HostError>`; the VM validates
//! arity before calling it (see `FunctionDescriptor::check_arity`).

use crate::registry::Registry;
use crate::value::closure::Closure;
use crate::value::Value;
use std::rc::Rc;

/// The subset of `ExecutionContext` a host function is allowed to touch,
/// expressed as a trait so `host.rs` doesn't need to depend on `vm::context`.
pub trait HostContext {
    fn write_output(&mut self, bytes: &[u8]);
    fn registry(&self) -> &Registry;
    fn get_global(&self, name: &str) -> Option<Value>;
    fn set_global(&mut self, name: &str, value: Value);
    fn halt(&mut self, exit_code: u8);
    fn warn(&mut self, message: &str);
    fn set_time_limit(&mut self, seconds: u64);
    /// Re-enters the VM to run a closure value to completion; used by
    /// built-ins like `go()` that need to invoke a first-class callable
    /// rather than just read/write values.
    fn call_closure(&mut self, closure: Rc<Closure>, args: Vec<Value>) -> Result<Value, Value>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum HostError {
    #[error("{0} expects at most {1} argument(s), {2} given")]
    TooManyArguments(String, usize, usize),
    #[error("{0} expects at least {1} argument(s), {2} given")]
    TooFewArguments(String, usize, usize),
    #[error("host function '{0}' raised: {1}")]
    Raised(String, String),
    #[error("host function '{0}' is not implemented")]
    NotImplemented(String),
}

pub type HostFn = Rc<dyn Fn(&mut dyn HostContext, &[Value]) -> Result<Value, HostError>>;

pub fn unimplemented_host_fn(name: String) -> HostFn {
    Rc::new(move |_ctx, _args| Err(HostError::NotImplemented(name.clone())))
}
