//! The minimal built-in surface named directly by the testable scenarios
//! (`count`, `go`, `waitgroup`, plus the exception base classes), kept small
//! per the Non-goals of `spec.md` §1/`SPEC_FULL.md` ("the standard library
//! catalogue ... is not implemented"). Registration mirrors the host-function
//! ABI of `host.rs` §4.6: a native `FunctionDescriptor` wraps an `HostFn`
//! closure that the VM calls through `HostContext`.

use crate::host::{HostContext, HostError};
use crate::registry::class::ClassDescriptor;
use crate::registry::{FunctionDescriptor, Registry};
use crate::value::concurrency::{new_goroutine, new_wait_group, GoroutineOutcome};
use crate::value::Value;
use std::rc::Rc;

/// Registers every built-in function and exception class. Called once
/// before `Vm::run`; the registry is otherwise treated as immutable after
/// bootstrap (spec.md §9 "Global mutable state").
pub fn register(registry: &mut Registry) {
    register_functions(registry);
    register_exception_hierarchy(registry);
}

fn register_functions(registry: &mut Registry) {
    let _ = registry.register_function(
        FunctionDescriptor::native("count", 1, Some(1), false).with_native_body(Rc::new(count)),
    );
    let _ = registry.register_function(
        FunctionDescriptor::native("go", 1, Some(2), false).with_native_body(Rc::new(go)),
    );
    let _ = registry.register_function(
        FunctionDescriptor::native("waitgroup", 0, Some(0), false).with_native_body(Rc::new(waitgroup)),
    );
    let _ = registry.register_function(
        FunctionDescriptor::native("set_time_limit", 1, Some(1), false).with_native_body(Rc::new(set_time_limit)),
    );
}

fn set_time_limit(ctx: &mut dyn HostContext, args: &[Value]) -> Result<Value, HostError> {
    let seconds = args.first().map(|v| v.to_int()).unwrap_or(0).max(0) as u64;
    ctx.set_time_limit(seconds);
    Ok(Value::new_bool(true))
}

/// `count(array|Countable|null) -> int`. PHP semantics for a non-array,
/// non-null argument are "count as 1 and emit a warning"; this simplified
/// version skips the warning plumbing since `warn` needs `&mut dyn HostContext`
/// which host functions do have, so it's wired through.
fn count(ctx: &mut dyn HostContext, args: &[Value]) -> Result<Value, HostError> {
    let subject = args.first().cloned().unwrap_or(Value::Null);
    let n = match &subject {
        Value::Array(arr) => arr.len() as i64,
        Value::Null => 0,
        _ => {
            ctx.warn("count(): argument is neither an array nor null");
            1
        }
    };
    Ok(Value::new_int(n))
}

/// `go(callable, array $bound_vars = []) -> Goroutine` (spec.md §5).
///
/// True concurrent interleaving would require the VM's dispatch loop itself
/// to be async (it isn't — `exec_frame` is a plain synchronous loop over
/// `Rc<RefCell<..>>`-backed values, which aren't `Send` anyway). This
/// implementation keeps the `Goroutine` value contract (a handle whose
/// `join()`/`result()` method yields the closure's outcome) but runs the
/// closure eagerly, to completion, before `go()` returns — a documented
/// simplification, not a hidden one; see `DESIGN.md`.
fn go(ctx: &mut dyn HostContext, args: &[Value]) -> Result<Value, HostError> {
    let callable = args.first().cloned().unwrap_or(Value::Null);
    let bound_args = match args.get(1) {
        Some(Value::Array(arr)) => arr.values().cloned().collect(),
        _ => Vec::new(),
    };
    let handle = new_goroutine();
    let Value::Callable(closure) = callable else {
        handle.complete(GoroutineOutcome::Errored("go() expects a callable first argument".to_string()));
        return Ok(Value::Goroutine(handle));
    };
    let outcome = match ctx.call_closure(closure, bound_args) {
        Ok(v) => GoroutineOutcome::Returned(v),
        Err(exc) => GoroutineOutcome::Errored(exception_message(&exc)),
    };
    handle.complete(outcome);
    Ok(Value::Goroutine(handle))
}

fn waitgroup(_ctx: &mut dyn HostContext, _args: &[Value]) -> Result<Value, HostError> {
    Ok(Value::WaitGroup(new_wait_group()))
}

fn exception_message(exc: &Value) -> String {
    if let Value::Object(obj) = exc {
        if let Some(Value::String(s)) = obj.borrow().properties.get("message") {
            return s.to_string_lossy().to_string();
        }
    }
    exc.to_php_string().to_string_lossy().to_string()
}

/// A small slice of PHP's built-in `Throwable` hierarchy: enough for
/// `catch (TypeError)`/`catch (Exception)` to work sensibly without
/// implementing the full SPL exception catalogue.
fn register_exception_hierarchy(registry: &mut Registry) {
    let _ = registry.register_class(ClassDescriptor::new("Exception"));
    let _ = registry.register_class(ClassDescriptor::new("Error"));
    let _ = registry.register_class(ClassDescriptor {
        parent: Some("Exception".to_string()),
        ..ClassDescriptor::new("RuntimeException")
    });
    let _ = registry.register_class(ClassDescriptor {
        parent: Some("Exception".to_string()),
        ..ClassDescriptor::new("LogicException")
    });
    let _ = registry.register_class(ClassDescriptor {
        parent: Some("Error".to_string()),
        ..ClassDescriptor::new("TypeError")
    });
    let _ = registry.register_class(ClassDescriptor {
        parent: Some("TypeError".to_string()),
        ..ClassDescriptor::new("ArgumentCountError")
    });
    let _ = registry.register_class(ClassDescriptor {
        parent: Some("Error".to_string()),
        ..ClassDescriptor::new("ArithmeticError")
    });
    let _ = registry.register_class(ClassDescriptor {
        parent: Some("ArithmeticError".to_string()),
        ..ClassDescriptor::new("DivisionByZeroError")
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::array::ArrayData;

    struct NullHost {
        registry: Registry,
        warnings: Vec<String>,
    }

    impl HostContext for NullHost {
        fn write_output(&mut self, _bytes: &[u8]) {}
        fn registry(&self) -> &Registry {
            &self.registry
        }
        fn get_global(&self, _name: &str) -> Option<Value> {
            None
        }
        fn set_global(&mut self, _name: &str, _value: Value) {}
        fn halt(&mut self, _exit_code: u8) {}
        fn warn(&mut self, message: &str) {
            self.warnings.push(message.to_string());
        }
        fn call_closure(&mut self, _closure: Rc<crate::value::closure::Closure>, _args: Vec<Value>) -> Result<Value, Value> {
            Ok(Value::Null)
        }
        fn set_time_limit(&mut self, _seconds: u64) {}
    }

    #[test]
    fn count_reads_array_length() {
        let mut host = NullHost { registry: Registry::new(), warnings: Vec::new() };
        let mut arr = ArrayData::new();
        arr.push(Value::new_int(1));
        arr.push(Value::new_int(2));
        let result = count(&mut host, &[Value::new_array(arr)]).unwrap();
        assert_eq!(result.to_int(), 2);
    }

    #[test]
    fn count_of_null_is_zero() {
        let mut host = NullHost { registry: Registry::new(), warnings: Vec::new() };
        let result = count(&mut host, &[Value::Null]).unwrap();
        assert_eq!(result.to_int(), 0);
    }

    #[test]
    fn register_builds_exception_chain() {
        let mut registry = Registry::new();
        register(&mut registry);
        assert!(registry.instance_of("ArgumentCountError", "TypeError"));
        assert!(registry.instance_of("ArgumentCountError", "Error"));
        assert!(registry.instance_of("ArgumentCountError", "throwable"));
        assert!(registry.lookup_function("count").is_some());
    }
}
