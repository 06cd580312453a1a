//! One call frame: a function's locals plus its transient operand stack.
//! Grounded on the teacher's `ExecutionContext` per-scope/call bookkeeping,
//! adapted from a DATEX scope chain to a flat, per-invocation register file.

use crate::value::closure::Closure;
use crate::value::object::ObjectHandle;
use crate::value::Value;
use std::rc::Rc;

/// Which compiled code this frame is running: the top-level program, or one
/// entry in `CompiledUnit::functions` (a declared function, method, or
/// closure body).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameSource {
    TopLevel,
    Function(usize),
}

/// What `InitFcall`/`InitMethodCall`/`InitStaticMethodCall` are building up
/// to, one `SendVal` at a time, until the matching `DoFcall` fires it.
#[derive(Clone, Debug)]
pub enum PendingCallTarget {
    Function(String),
    Method { object: Value, method: String },
    StaticMethod { class: String, method: String },
    /// A directly-resolved callable, e.g. `$fn()` where `$fn` holds a
    /// `Value::Callable` rather than a function name string.
    Closure(Rc<Closure>),
}

#[derive(Clone, Debug)]
pub struct PendingCall {
    pub target: PendingCallTarget,
    pub args: Vec<Value>,
}

pub struct Frame {
    pub source: FrameSource,
    pub ip: usize,
    pub locals: Vec<Value>,
    /// The conceptual `TmpVar` operand stack; `TmpVar`'s own numeric index
    /// is cosmetic, every push/pop targets the top of this vector.
    pub stack: Vec<Value>,
    pub this_obj: Option<ObjectHandle>,
    pub class_name: String,
    pub function_name: String,
    /// `(resume-ip, exception)` pairs armed by `Vm::handle_throw` when an
    /// unmatched exception runs a `finally` block; checked before every
    /// instruction and re-thrown once `ip` reaches the recorded address.
    pub pending_rethrows: Vec<(usize, Value)>,
    /// Stack of in-progress calls, one entry per `InitFcall`/`InitMethodCall`/
    /// `InitStaticMethodCall` not yet consumed by its `DoFcall`; nested calls
    /// in argument position push their own entry on top.
    pub call_stack: Vec<PendingCall>,
}

impl Frame {
    pub fn new(source: FrameSource, local_count: u32, this_obj: Option<ObjectHandle>, class_name: String, function_name: String) -> Self {
        Frame {
            source,
            ip: 0,
            locals: vec![Value::Null; local_count as usize],
            stack: Vec::new(),
            this_obj,
            class_name,
            function_name,
            pending_rethrows: Vec::new(),
            call_stack: Vec::new(),
        }
    }

    pub fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    /// Every `TmpVar` operand is read this way: pop when it's the rightmost
    /// (most-recently pushed) of a pair, because the universal convention is
    /// "op2 popped before op1".
    pub fn pop(&mut self) -> Value {
        self.stack.pop().unwrap_or(Value::Null)
    }
}
