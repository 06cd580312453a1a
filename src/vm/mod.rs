//! The bytecode interpreter (spec.md §4.5), grounded on the teacher's
//! `ExecutionContext`/`Protocol` dispatch loop but rebuilt around the
//! `Op`/`Operand` model of `opcode.rs` instead of DATEX wire instructions.
//!
//! The frame stack is walked recursively: `exec_frame` runs one frame to
//! completion (`Ok(return value)` or `Err(uncaught exception)`), and a call
//! opcode pushes a fresh frame and recurses rather than driving a single flat
//! dispatch loop. This mirrors the try/catch/finally propagation design,
//! which needs to re-examine the *caller's* try regions once a callee's own
//! regions are exhausted.

pub mod context;
pub mod frame;

use crate::ast::{Expr, Literal, Param};
use crate::compiler::{CompiledUnit, TryRegion};
use crate::host::{HostContext, HostError};
use crate::opcode::{Instruction, Op, Operand};
use crate::registry::class::{ClassDescriptor, PropertyDescriptor};
use crate::registry::{FunctionBody, FunctionDescriptor, Registry};
use crate::value::array::{ArrayData, ArrayKey};
use crate::value::closure::{Closure, ClosureTarget};
use crate::value::concurrency::{GoroutineHandle, GoroutineOutcome, WaitGroupHandle};
use crate::value::object::ObjectData;
use crate::value::Value;
use context::Deadline;
use frame::{Frame, FrameSource, PendingCall, PendingCallTarget};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

/// What one instruction asks the enclosing `exec_frame` loop to do next.
enum ExecResult {
    Continue,
    Jump(usize),
    Return(Value),
    Throw(Value),
}

/// Owns everything that outlives a single frame: the compiled program, the
/// symbol table, global variable storage, static property storage, and the
/// output sink.
pub struct Vm {
    unit: CompiledUnit,
    registry: Registry,
    globals: HashMap<String, Rc<RefCell<Value>>>,
    statics: HashMap<String, Rc<RefCell<Value>>>,
    out: Box<dyn Write>,
    next_object_id: u64,
    halted: Option<u8>,
    warnings: Vec<String>,
    deadline: Option<Deadline>,
}

impl Vm {
    pub fn new(unit: CompiledUnit, registry: Registry, out: Box<dyn Write>) -> Self {
        Vm {
            unit,
            registry,
            globals: HashMap::new(),
            statics: HashMap::new(),
            out,
            next_object_id: 0,
            halted: None,
            warnings: Vec::new(),
            deadline: None,
        }
    }

    pub fn set_time_limit(&mut self, seconds: u64) {
        self.deadline = Some(Deadline::from_seconds(seconds));
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn exit_code(&self) -> Option<u8> {
        self.halted
    }

    /// Runs the top-level program, registering every declared function and
    /// class up front (PHP hoists top-level declarations) so forward
    /// references work the way `Stmt::FunctionDecl`'s ordering would suggest.
    pub fn run(&mut self) -> Result<(), Value> {
        for (name, desc) in self.unit.classes.clone() {
            let _ = self.registry.register_class(desc);
            let _ = name;
        }
        for (name, desc) in self.unit.interfaces.clone() {
            let _ = self.registry.register_interface(desc);
            let _ = name;
        }
        for (name, desc) in self.unit.traits.clone() {
            let _ = self.registry.register_trait(desc);
            let _ = name;
        }

        let max_slot = self.unit.top_level_max_slot;
        let mut frame = Frame::new(FrameSource::TopLevel, max_slot, None, String::new(), "{main}".to_string());
        let top_level_slots = self.unit.top_level_slots.clone();
        for (name, slot) in top_level_slots {
            let cell = self.globals.entry(name).or_insert_with(|| Rc::new(RefCell::new(Value::Null))).clone();
            self.bind_cv_reference(&mut frame, slot, cell);
        }
        self.exec_frame(frame).map(|_| ())
    }

    // --- frame execution ---

    fn exec_frame(&mut self, mut frame: Frame) -> Result<Value, Value> {
        loop {
            if self.halted.is_some() {
                return Ok(Value::Null);
            }
            if let Some(pos) = frame.pending_rethrows.iter().position(|(resume_ip, _)| *resume_ip == frame.ip) {
                let (_, exception) = frame.pending_rethrows.remove(pos);
                if let Err(unhandled) = self.raise(&mut frame, exception) {
                    return Err(unhandled);
                }
                continue;
            }
            let Some(instr) = self.instruction_at(frame.source, frame.ip) else {
                return Ok(Value::Null);
            };
            match self.execute(&mut frame, &instr) {
                ExecResult::Continue => frame.ip += 1,
                ExecResult::Jump(target) => frame.ip = target,
                ExecResult::Return(v) => return Ok(v),
                ExecResult::Throw(v) => {
                    if let Err(unhandled) = self.raise(&mut frame, v) {
                        return Err(unhandled);
                    }
                }
            }
        }
    }

    fn instruction_at(&self, source: FrameSource, ip: usize) -> Option<Instruction> {
        let instructions = match source {
            FrameSource::TopLevel => &self.unit.instructions,
            FrameSource::Function(idx) => &self.unit.functions[idx].instructions,
        };
        instructions.get(ip).cloned()
    }

    fn try_regions_for(&self, source: FrameSource) -> &[TryRegion] {
        match source {
            FrameSource::TopLevel => &self.unit.top_level_try_regions,
            FrameSource::Function(idx) => &self.unit.functions[idx].try_regions,
        }
    }

    /// Finds the innermost enclosing try region containing `frame.ip`,
    /// working outward; on the first region with a matching catch or a
    /// `finally`, jumps there and returns `Ok`. If nothing in this frame
    /// handles it, returns `Err(exception)` for the caller to deal with.
    fn raise(&mut self, frame: &mut Frame, exception: Value) -> Result<(), Value> {
        let ip = frame.ip;
        let mut candidates: Vec<&TryRegion> =
            self.try_regions_for(frame.source).iter().filter(|r| r.start <= ip && ip < r.end).collect();
        candidates.sort_by_key(|r| r.end - r.start);
        let class_name = exception.class_name().unwrap_or_default();
        for region in candidates {
            for (types, catch_start) in &region.catches {
                if types.iter().any(|t| self.registry.instance_of(&class_name, t)) {
                    frame.ip = *catch_start;
                    frame.push(exception);
                    return Ok(());
                }
            }
            if let Some(finally_start) = region.finally {
                frame.ip = finally_start;
                if let Some(end) = region.finally_end {
                    frame.pending_rethrows.push((end, exception));
                }
                return Ok(());
            }
        }
        Err(exception)
    }

    // --- operand resolution ---

    fn resolve(&mut self, frame: &mut Frame, operand: &Operand) -> Value {
        match operand {
            Operand::Unused => Value::Null,
            Operand::Const(idx) => self.unit.constants.get(*idx as usize).cloned().unwrap_or(Value::Null),
            Operand::TmpVar(_) => frame.pop(),
            Operand::Cv(slot) => self.read_cv(frame, *slot),
            Operand::Var(name) => {
                let slots = self.slot_names_for(frame.source);
                match slots.get(name) {
                    Some(&slot) => self.read_cv(frame, slot),
                    None => Value::Null,
                }
            }
        }
    }

    fn slot_names_for(&self, source: FrameSource) -> &indexmap::IndexMap<String, u32> {
        match source {
            FrameSource::TopLevel => &self.unit.top_level_slots,
            FrameSource::Function(idx) => &self.unit.functions[idx].local_slots,
        }
    }

    /// Reads a local slot, transparently dereferencing (data-model invariant
    /// 1: every read sees through `=&` aliasing).
    fn read_cv(&self, frame: &Frame, slot: u32) -> Value {
        frame.locals.get(slot as usize).cloned().unwrap_or(Value::Null).deref()
    }

    /// Writes a local slot *through* any reference cell already bound there;
    /// this is what makes `=&` aliasing two-way.
    fn write_cv(&self, frame: &mut Frame, slot: u32, value: Value) {
        self.ensure_slot(frame, slot);
        if let Value::Reference(cell) = &frame.locals[slot as usize] {
            *cell.borrow_mut() = value;
            return;
        }
        frame.locals[slot as usize] = value;
    }

    /// Rebinds a local slot to point at `cell` itself (used by `AssignRef`
    /// and `BindGlobal`), as opposed to `write_cv`'s write-through.
    fn bind_cv_reference(&self, frame: &mut Frame, slot: u32, cell: Rc<RefCell<Value>>) {
        self.ensure_slot(frame, slot);
        frame.locals[slot as usize] = Value::Reference(cell);
    }

    /// Promotes whatever a local slot currently holds into a shared
    /// reference cell, returning that cell (used by `FetchW`/`FetchRw` and
    /// by-ref closure captures).
    fn promote_cv_to_reference(&self, frame: &mut Frame, slot: u32) -> Rc<RefCell<Value>> {
        self.ensure_slot(frame, slot);
        if let Value::Reference(cell) = &frame.locals[slot as usize] {
            return cell.clone();
        }
        let existing = frame.locals[slot as usize].clone();
        let cell = Rc::new(RefCell::new(existing));
        frame.locals[slot as usize] = Value::Reference(cell.clone());
        cell
    }

    fn ensure_slot(&self, frame: &mut Frame, slot: u32) {
        if slot as usize >= frame.locals.len() {
            frame.locals.resize(slot as usize + 1, Value::Null);
        }
    }

    fn push_result(&self, frame: &mut Frame, result: &Operand, value: Value) {
        if matches!(result, Operand::TmpVar(_)) {
            frame.push(value);
        }
    }

    // --- container write-target promotion (FetchDimW/FetchObjW) ---

    /// Auto-vivifies `container` into an array if it's currently null (or
    /// any non-array scalar, PHP's looser "just make it an array" rule), and
    /// returns a reference cell aliasing the element at `key` (appending when
    /// `key` is `None`).
    fn promote_array_element(container: &mut Value, key: Option<ArrayKey>) -> Rc<RefCell<Value>> {
        if !matches!(container, Value::Array(_)) {
            *container = Value::new_array(ArrayData::new());
        }
        let Value::Array(rc) = container else { unreachable!() };
        let arr = Rc::make_mut(rc);
        let key = key.unwrap_or_else(|| ArrayKey::Int(arr.next_index()));
        if let Some(Value::Reference(cell)) = arr.get_by_key(&key) {
            return cell.clone();
        }
        let existing = arr.get_by_key(&key).cloned().unwrap_or(Value::Null);
        let cell = Rc::new(RefCell::new(existing));
        arr.set_by_key(key, Value::Reference(cell.clone()));
        cell
    }

    /// Same idea for object properties, auto-vivifying a bare `stdClass`
    /// instance when the container is still null.
    fn promote_object_property(container: &mut Value, property: &str, new_id: u64) -> Rc<RefCell<Value>> {
        if matches!(container, Value::Null) {
            *container = Value::Object(ObjectData::new("stdClass", new_id));
        }
        let Value::Object(obj) = container else {
            return Rc::new(RefCell::new(Value::Null));
        };
        let mut data = obj.borrow_mut();
        if let Some(Value::Reference(cell)) = data.properties.get(property) {
            return cell.clone();
        }
        let existing = data.properties.get(property).cloned().unwrap_or(Value::Null);
        let cell = Rc::new(RefCell::new(existing));
        data.properties.insert(property.to_string(), Value::Reference(cell.clone()));
        cell
    }

    fn fetch_dim_w(&mut self, frame: &mut Frame, slot: u32, key: Option<ArrayKey>) -> Rc<RefCell<Value>> {
        self.ensure_slot(frame, slot);
        if let Value::Reference(cell) = frame.locals[slot as usize].clone() {
            let mut guard = cell.borrow_mut();
            Self::promote_array_element(&mut guard, key)
        } else {
            Self::promote_array_element(&mut frame.locals[slot as usize], key)
        }
    }

    fn fetch_obj_w(&mut self, frame: &mut Frame, slot: u32, property: &str) -> Rc<RefCell<Value>> {
        self.ensure_slot(frame, slot);
        self.next_object_id += 1;
        let id = self.next_object_id;
        if let Value::Reference(cell) = frame.locals[slot as usize].clone() {
            let mut guard = cell.borrow_mut();
            Self::promote_object_property(&mut guard, property, id)
        } else {
            Self::promote_object_property(&mut frame.locals[slot as usize], property, id)
        }
    }

    fn static_cell(&mut self, combined_key: &str) -> Rc<RefCell<Value>> {
        if let Some(cell) = self.statics.get(combined_key) {
            return cell.clone();
        }
        let default = self.default_static_value(combined_key);
        let cell = Rc::new(RefCell::new(default));
        self.statics.insert(combined_key.to_string(), cell.clone());
        cell
    }

    fn default_static_value(&self, combined_key: &str) -> Value {
        let (class, prop) = combined_key.split_once("::").unwrap_or((combined_key, ""));
        let mut current = Some(class.to_string());
        while let Some(name) = current {
            let Some(desc) = self.registry.lookup_class(&name) else { break };
            if let Some(p) = desc.properties.iter().find(|p| p.is_static && p.name == prop) {
                return p.default.clone();
            }
            current = desc.parent.clone();
        }
        Value::Null
    }

    // --- classes ---

    fn init_properties(&self, obj: &crate::value::object::ObjectHandle, class_name: &str) {
        let mut chain: Vec<ClassDescriptor> = Vec::new();
        let mut current = Some(class_name.to_string());
        while let Some(name) = current {
            let Some(desc) = self.registry.lookup_class(&name) else { break };
            current = desc.parent.clone();
            chain.push(desc.clone());
        }
        let mut data = obj.borrow_mut();
        let insert = |data: &mut ObjectData, p: &PropertyDescriptor| {
            if !p.is_static {
                data.properties.insert(p.name.clone(), p.default.clone());
            }
        };
        for desc in chain.into_iter().rev() {
            for trait_name in &desc.traits {
                if let Some(t) = self.registry.lookup_trait(trait_name) {
                    for p in &t.properties {
                        insert(&mut data, p);
                    }
                }
            }
            for p in &desc.properties {
                insert(&mut data, p);
            }
        }
    }

    fn resolve_method(&self, class_name: &str, method_name: &str) -> Option<(usize, String)> {
        let mut current = Some(class_name.to_string());
        while let Some(name) = current {
            let Some(desc) = self.registry.lookup_class(&name) else { break };
            if let Some(m) = desc.find_method(method_name) {
                return Some((m.function_index, name.clone()));
            }
            for trait_name in &desc.traits {
                if let Some(t) = self.registry.lookup_trait(trait_name) {
                    if let Some(m) = t.methods.iter().find(|m| m.name.eq_ignore_ascii_case(method_name)) {
                        return Some((m.function_index, name.clone()));
                    }
                }
            }
            current = desc.parent.clone();
        }
        None
    }

    fn make_exception(&mut self, class_name: &str, message: &str) -> Value {
        if self.registry.lookup_class(class_name).is_none() {
            let _ = self.registry.register_class(ClassDescriptor::new(class_name));
        }
        self.next_object_id += 1;
        let obj = ObjectData::new(class_name, self.next_object_id);
        obj.borrow_mut().properties.insert("message".to_string(), Value::new_string(message));
        Value::Object(obj)
    }

    /// `Exception`/`Error` and their descendants get `__construct($message)`
    /// and `getMessage()` for free, the way PHP's own base `Exception` class
    /// does, without the registry needing a way to attach a native method
    /// body to a `ClassDescriptor` (`MethodDescriptor::function_index` only
    /// ever points into a compiled unit). A subclass that declares its own
    /// `__construct`/`getMessage` overrides this via the ordinary
    /// `resolve_method` path, which is tried first.
    fn builtin_throwable_method(
        &self,
        object: &Value,
        class_name: &str,
        method: &str,
        args: &[Value],
    ) -> Option<Result<Value, Value>> {
        if !self.registry.instance_of(class_name, crate::registry::THROWABLE_PSEUDO_TYPE) {
            return None;
        }
        let Value::Object(obj) = object else { return None };
        match method.to_ascii_lowercase().as_str() {
            "__construct" => {
                let message = args.first().cloned().unwrap_or_else(|| Value::new_string(""));
                obj.borrow_mut().properties.insert("message".to_string(), message);
                Some(Ok(Value::Null))
            }
            "getmessage" => {
                let message = obj.borrow().properties.get("message").cloned().unwrap_or_else(|| Value::new_string(""));
                Some(Ok(message))
            }
            _ => None,
        }
    }

    // --- calls ---

    fn fold_default(expr: &Expr) -> Value {
        match expr {
            Expr::Literal(Literal::Null) => Value::Null,
            Expr::Literal(Literal::Bool(b)) => Value::new_bool(*b),
            Expr::Literal(Literal::Int(i)) => Value::new_int(*i),
            Expr::Literal(Literal::Float(f)) => Value::new_float(*f),
            Expr::Literal(Literal::String(s)) => Value::new_string(s.as_str()),
            _ => Value::Null,
        }
    }

    fn bind_params(
        &mut self,
        frame: &mut Frame,
        params: &[Param],
        slots: &indexmap::IndexMap<String, u32>,
        mut args: Vec<Value>,
        variadic: bool,
    ) {
        for (i, param) in params.iter().enumerate() {
            let Some(&slot) = slots.get(&param.name) else { continue };
            if variadic && i == params.len() - 1 {
                let rest: Vec<Value> = if args.len() > i { args.split_off(i) } else { Vec::new() };
                let mut arr = ArrayData::new();
                for v in rest {
                    arr.push(v);
                }
                self.write_cv(frame, slot, Value::new_array(arr));
            } else if let Some(v) = args.get(i).cloned() {
                self.write_cv(frame, slot, v);
            } else if let Some(default_expr) = &param.default {
                let v = Self::fold_default(default_expr);
                self.write_cv(frame, slot, v);
            } else {
                self.write_cv(frame, slot, Value::Null);
            }
        }
    }

    fn call_compiled(
        &mut self,
        idx: usize,
        args: Vec<Value>,
        this_obj: Option<crate::value::object::ObjectHandle>,
        class_name: String,
    ) -> Result<Value, Value> {
        let func = &self.unit.functions[idx];
        let max_slot = func.max_local_slot;
        let params = func.params.clone();
        let local_slots = func.local_slots.clone();
        let variadic = func.variadic;
        let name = func.name.clone();
        let mut frame = Frame::new(FrameSource::Function(idx), max_slot, this_obj, class_name, name);
        self.bind_params(&mut frame, &params, &local_slots, args, variadic);
        self.exec_frame(frame)
    }

    fn call_function_descriptor(&mut self, desc: &FunctionDescriptor, args: Vec<Value>) -> Result<Value, Value> {
        if !desc.check_arity(args.len()) {
            return Err(self.make_exception(
                "ArgumentCountError",
                &format!("{}() expects at least {} argument(s), {} given", desc.name, desc.min_args, args.len()),
            ));
        }
        match desc.body.clone() {
            FunctionBody::Compiled(idx) => self.call_compiled(idx, args, None, String::new()),
            FunctionBody::Native(f) => match f(self, &args) {
                Ok(v) => Ok(v),
                Err(HostError::Raised(class_name, message)) => Err(self.make_exception(&class_name, &message)),
                Err(other) => Err(self.make_exception("Error", &other.to_string())),
            },
        }
    }

    fn invoke(&mut self, target: PendingCallTarget, args: Vec<Value>) -> Result<Value, Value> {
        match target {
            PendingCallTarget::Function(name) => match self.registry.lookup_function(&name).cloned() {
                Some(desc) => self.call_function_descriptor(&desc, args),
                None => Err(self.make_exception("Error", &format!("Call to undefined function {name}()"))),
            },
            PendingCallTarget::Method { object, method } => {
                if let Value::WaitGroup(wg) = &object {
                    return self.invoke_waitgroup_method(wg.clone(), &method, args);
                }
                if let Value::Goroutine(g) = &object {
                    return self.invoke_goroutine_method(g.clone(), &method, args);
                }
                let class_name = object.class_name().unwrap_or_default();
                match self.resolve_method(&class_name, &method) {
                    Some((idx, owning_class)) => {
                        let this_obj = if let Value::Object(o) = &object { Some(o.clone()) } else { None };
                        self.call_compiled(idx, args, this_obj, owning_class)
                    }
                    None => {
                        if let Some(result) = self.builtin_throwable_method(&object, &class_name, &method, &args) {
                            return result;
                        }
                        Err(self.make_exception("Error", &format!("Call to undefined method {class_name}::{method}()")))
                    }
                }
            }
            PendingCallTarget::StaticMethod { class, method } => match self.resolve_method(&class, &method) {
                Some((idx, owning_class)) => self.call_compiled(idx, args, None, owning_class),
                None => Err(self.make_exception("Error", &format!("Call to undefined method {class}::{method}()"))),
            },
            PendingCallTarget::Closure(closure) => self.call_closure_value(closure, args),
        }
    }

    /// Runs a first-class callable to completion, binding its captured
    /// variables by name into the callee frame after ordinary parameter
    /// binding. Used both by `InitUserCall` (`$fn(...)`) and by host
    /// built-ins like `go()` (via `HostContext::call_closure`).
    fn call_closure_value(&mut self, closure: Rc<Closure>, args: Vec<Value>) -> Result<Value, Value> {
        match &closure.target {
            ClosureTarget::Compiled(idx) => {
                let idx = *idx;
                let func = &self.unit.functions[idx];
                let max_slot = func.max_local_slot;
                let params = func.params.clone();
                let local_slots = func.local_slots.clone();
                let variadic = func.variadic;
                let name = func.name.clone();
                let this_obj = closure.bound_this.clone();
                let class_name = closure.bound_class.clone().unwrap_or_default();
                let mut frame = Frame::new(FrameSource::Function(idx), max_slot, this_obj, class_name, name);
                self.bind_params(&mut frame, &params, &local_slots, args, variadic);
                for (cap_name, value) in &closure.captured {
                    if let Some(&slot) = local_slots.get(cap_name) {
                        self.write_cv(&mut frame, slot, value.clone());
                    }
                }
                self.exec_frame(frame)
            }
            ClosureTarget::Native(name) => {
                let name = name.to_string();
                match self.registry.lookup_function(&name).cloned() {
                    Some(desc) => self.call_function_descriptor(&desc, args),
                    None => Err(self.make_exception("Error", &format!("Call to undefined function {name}()"))),
                }
            }
        }
    }

    fn invoke_waitgroup_method(&mut self, wg: WaitGroupHandle, method: &str, args: Vec<Value>) -> Result<Value, Value> {
        match method.to_ascii_lowercase().as_str() {
            "add" => {
                let n = args.first().map(|v| v.to_int()).unwrap_or(1);
                match wg.add(n) {
                    Ok(()) => Ok(Value::Null),
                    Err(e) => Err(self.make_exception("Error", &e.to_string())),
                }
            }
            "done" => match wg.done() {
                Ok(()) => Ok(Value::Null),
                Err(e) => Err(self.make_exception("Error", &e.to_string())),
            },
            "wait" => {
                wg.wait_blocking();
                Ok(Value::Null)
            }
            "count" => Ok(Value::new_int(wg.count())),
            other => Err(self.make_exception("Error", &format!("Call to undefined method WaitGroup::{other}()"))),
        }
    }

    fn invoke_goroutine_method(&mut self, g: GoroutineHandle, method: &str, _args: Vec<Value>) -> Result<Value, Value> {
        match method.to_ascii_lowercase().as_str() {
            "join" | "result" => match g.join_blocking() {
                GoroutineOutcome::Returned(v) => Ok(v),
                GoroutineOutcome::Errored(message) => Err(self.make_exception("Error", &message)),
            },
            other => Err(self.make_exception("Error", &format!("Call to undefined method Goroutine::{other}()"))),
        }
    }

    // --- arithmetic/comparison ---

    fn binary_value(&mut self, frame: &mut Frame, instr: &Instruction) -> Value {
        use crate::value::ops;
        use std::cmp::Ordering;
        let right = self.resolve(frame, &instr.op2);
        let left = self.resolve(frame, &instr.op1);
        match instr.op {
            Op::Add => ops::add(&left, &right),
            Op::Sub => ops::sub(&left, &right),
            Op::Mul => ops::mul(&left, &right),
            Op::Div => ops::div(&left, &right),
            Op::Mod => ops::modulo(&left, &right),
            Op::Pow => ops::pow(&left, &right),
            Op::Concat => ops::concat(&left, &right),
            Op::BwAnd => ops::bitwise_and(&left, &right),
            Op::BwOr => ops::bitwise_or(&left, &right),
            Op::BwXor => ops::bitwise_xor(&left, &right),
            Op::Sl => ops::shift_left(&left, &right),
            Op::Sr => ops::shift_right(&left, &right),
            Op::IsEqual => Value::new_bool(left.loose_eq(&right)),
            Op::IsNotEqual => Value::new_bool(!left.loose_eq(&right)),
            Op::IsIdentical => Value::new_bool(left.strict_eq(&right)),
            Op::IsNotIdentical => Value::new_bool(!left.strict_eq(&right)),
            Op::IsSmaller => Value::new_bool(left.compare(&right) == Ordering::Less),
            Op::IsSmallerOrEqual => Value::new_bool(left.compare(&right) != Ordering::Greater),
            Op::IsGreater => Value::new_bool(left.compare(&right) == Ordering::Greater),
            Op::IsGreaterOrEqual => Value::new_bool(left.compare(&right) != Ordering::Less),
            Op::Spaceship => Value::new_int(match left.compare(&right) {
                Ordering::Less => -1,
                Ordering::Equal => 0,
                Ordering::Greater => 1,
            }),
            _ => unreachable!("binary_value called with a non-binary opcode"),
        }
    }

    fn compound_op(op: Op, current: &Value, rhs: &Value) -> Value {
        use crate::value::ops;
        match op {
            Op::AssignOpAdd => ops::add(current, rhs),
            Op::AssignOpSub => ops::sub(current, rhs),
            Op::AssignOpMul => ops::mul(current, rhs),
            Op::AssignOpDiv => ops::div(current, rhs),
            Op::AssignOpMod => ops::modulo(current, rhs),
            Op::AssignOpPow => ops::pow(current, rhs),
            Op::AssignOpConcat => ops::concat(current, rhs),
            Op::AssignOpBwAnd => ops::bitwise_and(current, rhs),
            Op::AssignOpBwOr => ops::bitwise_or(current, rhs),
            Op::AssignOpBwXor => ops::bitwise_xor(current, rhs),
            Op::AssignOpSl => ops::shift_left(current, rhs),
            Op::AssignOpSr => ops::shift_right(current, rhs),
            _ => unreachable!("compound_op called with a non-compound-assign opcode"),
        }
    }

    // --- dispatch ---

    fn execute(&mut self, frame: &mut Frame, instr: &Instruction) -> ExecResult {
        use Op::*;
        match instr.op {
            Add | Sub | Mul | Div | Mod | Pow | Concat | BwAnd | BwOr | BwXor | Sl | Sr | IsEqual | IsNotEqual
            | IsIdentical | IsNotIdentical | IsSmaller | IsSmallerOrEqual | IsGreater | IsGreaterOrEqual
            | Spaceship => {
                let value = self.binary_value(frame, instr);
                self.push_result(frame, &instr.result, value);
                ExecResult::Continue
            }
            Cast => {
                let type_name = self.resolve(frame, &instr.op2).to_php_string().to_string_lossy().to_string();
                let value = self.resolve(frame, &instr.op1);
                let result = match type_name.as_str() {
                    "int" | "integer" => Value::new_int(value.to_int()),
                    "float" | "double" => Value::new_float(value.to_float()),
                    "string" => Value::new_string(value.to_php_string()),
                    "bool" | "boolean" => Value::new_bool(value.to_bool()),
                    "array" => match value {
                        Value::Array(_) => value,
                        Value::Null => Value::new_array(ArrayData::new()),
                        other => {
                            let mut arr = ArrayData::new();
                            arr.push(other);
                            Value::new_array(arr)
                        }
                    },
                    _ => value,
                };
                self.push_result(frame, &instr.result, result);
                ExecResult::Continue
            }
            BwNot => {
                let v = self.resolve(frame, &instr.op1);
                let r = crate::value::ops::bitwise_not(&v);
                self.push_result(frame, &instr.result, r);
                ExecResult::Continue
            }
            BooleanNot => {
                let v = self.resolve(frame, &instr.op1);
                self.push_result(frame, &instr.result, Value::new_bool(!v.to_bool()));
                ExecResult::Continue
            }
            BooleanAnd => {
                let r = self.resolve(frame, &instr.op2);
                let l = self.resolve(frame, &instr.op1);
                self.push_result(frame, &instr.result, Value::new_bool(l.to_bool() && r.to_bool()));
                ExecResult::Continue
            }
            BooleanOr => {
                let r = self.resolve(frame, &instr.op2);
                let l = self.resolve(frame, &instr.op1);
                self.push_result(frame, &instr.result, Value::new_bool(l.to_bool() || r.to_bool()));
                ExecResult::Continue
            }

            Assign => {
                let value = self.resolve(frame, &instr.op2);
                match &instr.op1 {
                    Operand::Cv(slot) => self.write_cv(frame, *slot, value.clone()),
                    Operand::TmpVar(_) => {
                        if let Value::Reference(cell) = frame.pop() {
                            *cell.borrow_mut() = value.clone();
                        }
                    }
                    _ => {}
                }
                self.push_result(frame, &instr.result, value);
                ExecResult::Continue
            }
            AssignRef => {
                let value = self.resolve(frame, &instr.op2);
                let cell = match value {
                    Value::Reference(cell) => cell,
                    other => Rc::new(RefCell::new(other)),
                };
                if let Operand::Cv(slot) = &instr.op1 {
                    self.bind_cv_reference(frame, *slot, cell.clone());
                }
                self.push_result(frame, &instr.result, Value::Reference(cell));
                ExecResult::Continue
            }
            AssignOpAdd | AssignOpSub | AssignOpMul | AssignOpDiv | AssignOpMod | AssignOpPow | AssignOpConcat
            | AssignOpBwAnd | AssignOpBwOr | AssignOpBwXor | AssignOpSl | AssignOpSr => {
                let rhs = self.resolve(frame, &instr.op2);
                match &instr.op1 {
                    Operand::Cv(slot) => {
                        let slot = *slot;
                        let current = self.read_cv(frame, slot);
                        let result = Self::compound_op(instr.op, &current, &rhs);
                        self.write_cv(frame, slot, result.clone());
                        self.push_result(frame, &instr.result, result);
                    }
                    Operand::TmpVar(_) => {
                        if let Value::Reference(cell) = frame.pop() {
                            let current = cell.borrow().clone();
                            let result = Self::compound_op(instr.op, &current, &rhs);
                            *cell.borrow_mut() = result.clone();
                            self.push_result(frame, &instr.result, result);
                        }
                    }
                    _ => {}
                }
                ExecResult::Continue
            }
            QmAssign => {
                let rhs = self.resolve(frame, &instr.op2);
                if let Operand::Cv(slot) = &instr.op1 {
                    let slot = *slot;
                    let current = self.read_cv(frame, slot);
                    let result = if current.is_null() { rhs } else { current };
                    self.write_cv(frame, slot, result.clone());
                    self.push_result(frame, &instr.result, result);
                }
                ExecResult::Continue
            }

            FetchR => {
                if let Operand::Cv(slot) = instr.op1 {
                    let v = self.read_cv(frame, slot);
                    self.push_result(frame, &instr.result, v);
                }
                ExecResult::Continue
            }
            FetchW | FetchRw => {
                if let Operand::Cv(slot) = instr.op1 {
                    let cell = self.promote_cv_to_reference(frame, slot);
                    self.push_result(frame, &instr.result, Value::Reference(cell));
                }
                ExecResult::Continue
            }
            FetchDimR => {
                let key = self.resolve(frame, &instr.op2);
                let container = self.resolve(frame, &instr.op1);
                let result = match &container {
                    Value::Array(arr) => arr.get(&key).cloned().unwrap_or(Value::Null),
                    Value::String(s) => {
                        let idx = key.to_int();
                        if idx >= 0 {
                            s.as_bytes()
                                .get(idx as usize)
                                .map(|b| Value::new_string((*b as char).to_string()))
                                .unwrap_or(Value::Null)
                        } else {
                            Value::Null
                        }
                    }
                    _ => Value::Null,
                };
                self.push_result(frame, &instr.result, result.deref());
                ExecResult::Continue
            }
            FetchDimW | FetchDimRw => {
                let key = match &instr.op2 {
                    Operand::Unused => None,
                    other => Some(ArrayKey::normalize(&self.resolve(frame, other))),
                };
                if let Operand::Cv(slot) = instr.op1 {
                    let cell = self.fetch_dim_w(frame, slot, key);
                    self.push_result(frame, &instr.result, Value::Reference(cell));
                }
                ExecResult::Continue
            }
            FetchObjR => {
                let prop = self.resolve(frame, &instr.op2).to_php_string().to_string_lossy().to_string();
                let target = self.resolve(frame, &instr.op1);
                let result = match target {
                    Value::Object(obj) => obj.borrow().properties.get(&prop).cloned().unwrap_or(Value::Null),
                    _ => Value::Null,
                };
                self.push_result(frame, &instr.result, result.deref());
                ExecResult::Continue
            }
            FetchObjW | FetchObjRw => {
                let prop = self.resolve(frame, &instr.op2).to_php_string().to_string_lossy().to_string();
                if let Operand::Cv(slot) = instr.op1 {
                    let cell = self.fetch_obj_w(frame, slot, &prop);
                    self.push_result(frame, &instr.result, Value::Reference(cell));
                }
                ExecResult::Continue
            }
            FetchStaticR => {
                let combined = self.resolve(frame, &instr.op1).to_php_string().to_string_lossy().to_string();
                let cell = self.static_cell(&combined);
                let v = cell.borrow().clone();
                self.push_result(frame, &instr.result, v.deref());
                ExecResult::Continue
            }
            FetchStaticW => {
                let combined = self.resolve(frame, &instr.op1).to_php_string().to_string_lossy().to_string();
                let cell = self.static_cell(&combined);
                self.push_result(frame, &instr.result, Value::Reference(cell));
                ExecResult::Continue
            }

            Jmp => ExecResult::Jump(instr.jump_target.expect("Jmp missing jump_target") as usize),
            Jmpz => {
                let v = self.resolve(frame, &instr.op1);
                if !v.to_bool() {
                    ExecResult::Jump(instr.jump_target.expect("Jmpz missing jump_target") as usize)
                } else {
                    ExecResult::Continue
                }
            }
            Jmpnz => {
                let v = self.resolve(frame, &instr.op1);
                if v.to_bool() {
                    ExecResult::Jump(instr.jump_target.expect("Jmpnz missing jump_target") as usize)
                } else {
                    ExecResult::Continue
                }
            }
            JmpzEx => {
                let v = self.resolve(frame, &instr.op1);
                if !v.to_bool() {
                    self.push_result(frame, &instr.result, Value::new_bool(false));
                    ExecResult::Jump(instr.jump_target.expect("JmpzEx missing jump_target") as usize)
                } else {
                    ExecResult::Continue
                }
            }
            JmpnzEx => {
                let v = self.resolve(frame, &instr.op1);
                if v.to_bool() {
                    self.push_result(frame, &instr.result, Value::new_bool(true));
                    ExecResult::Jump(instr.jump_target.expect("JmpnzEx missing jump_target") as usize)
                } else {
                    ExecResult::Continue
                }
            }
            JmpSet => {
                let v = self.resolve(frame, &instr.op1);
                if v.to_bool() {
                    self.push_result(frame, &instr.result, v);
                    ExecResult::Jump(instr.jump_target.expect("JmpSet missing jump_target") as usize)
                } else {
                    ExecResult::Continue
                }
            }
            Coalesce => {
                let v = self.resolve(frame, &instr.op1);
                if !v.is_null() {
                    self.push_result(frame, &instr.result, v);
                    ExecResult::Jump(instr.jump_target.expect("Coalesce missing jump_target") as usize)
                } else {
                    ExecResult::Continue
                }
            }

            InitFcall => {
                let name = self.resolve(frame, &instr.op1).to_php_string().to_string_lossy().to_string();
                frame.call_stack.push(PendingCall { target: PendingCallTarget::Function(name), args: Vec::new() });
                ExecResult::Continue
            }
            InitUserCall => {
                // a dynamically-resolved call, e.g. `$fn(...)` where `$fn`
                // holds a first-class callable rather than a literal name.
                let callee = self.resolve(frame, &instr.op1);
                let target = match callee {
                    Value::Callable(c) => PendingCallTarget::Closure(c),
                    Value::String(s) => PendingCallTarget::Function(s.to_string_lossy().to_string()),
                    other => PendingCallTarget::Function(other.to_php_string().to_string_lossy().to_string()),
                };
                frame.call_stack.push(PendingCall { target, args: Vec::new() });
                ExecResult::Continue
            }
            SendVal | SendVar | SendRef => {
                let v = self.resolve(frame, &instr.op1);
                if let Some(pending) = frame.call_stack.last_mut() {
                    pending.args.push(v);
                }
                ExecResult::Continue
            }
            DoFcall => {
                let _argc = self.resolve(frame, &instr.op1);
                let Some(pending) = frame.call_stack.pop() else {
                    return ExecResult::Continue;
                };
                match self.invoke(pending.target, pending.args) {
                    Ok(v) => {
                        self.push_result(frame, &instr.result, v);
                        ExecResult::Continue
                    }
                    Err(exc) => ExecResult::Throw(exc),
                }
            }
            InitMethodCall => {
                let method = self.resolve(frame, &instr.op2).to_php_string().to_string_lossy().to_string();
                let target = self.resolve(frame, &instr.op1);
                frame
                    .call_stack
                    .push(PendingCall { target: PendingCallTarget::Method { object: target, method }, args: Vec::new() });
                ExecResult::Continue
            }
            InitStaticMethodCall => {
                let method = self.resolve(frame, &instr.op2).to_php_string().to_string_lossy().to_string();
                let class = self.resolve(frame, &instr.op1).to_php_string().to_string_lossy().to_string();
                frame
                    .call_stack
                    .push(PendingCall { target: PendingCallTarget::StaticMethod { class, method }, args: Vec::new() });
                ExecResult::Continue
            }
            Return | ReturnByRef => {
                let v = self.resolve(frame, &instr.op1);
                ExecResult::Return(v)
            }

            New => {
                let class_name = self.resolve(frame, &instr.op1).to_php_string().to_string_lossy().to_string();
                self.next_object_id += 1;
                let obj = ObjectData::new(class_name.clone(), self.next_object_id);
                self.init_properties(&obj, &class_name);
                self.push_result(frame, &instr.result, Value::Object(obj));
                ExecResult::Continue
            }
            Clone => {
                let v = self.resolve(frame, &instr.op1);
                let result = match v {
                    Value::Object(obj) => {
                        self.next_object_id += 1;
                        let src = obj.borrow();
                        let new_obj = ObjectData::new(src.class_name.clone(), self.next_object_id);
                        new_obj.borrow_mut().properties = src.properties.clone();
                        Value::Object(new_obj)
                    }
                    other => other,
                };
                self.push_result(frame, &instr.result, result);
                ExecResult::Continue
            }
            Throw => {
                let v = self.resolve(frame, &instr.op1);
                ExecResult::Throw(v)
            }
            Catch => {
                let exc = frame.pop();
                if let Operand::Cv(slot) = &instr.op1 {
                    self.write_cv(frame, *slot, exc.clone());
                }
                self.push_result(frame, &instr.result, exc);
                ExecResult::Continue
            }
            Instanceof => {
                let class_arg = self.resolve(frame, &instr.op2).to_php_string().to_string_lossy().to_string();
                let v = self.resolve(frame, &instr.op1);
                let result = v.class_name().map(|cn| self.registry.instance_of(&cn, &class_arg)).unwrap_or(false);
                self.push_result(frame, &instr.result, Value::new_bool(result));
                ExecResult::Continue
            }
            FetchClass => {
                let v = self.resolve(frame, &instr.op1);
                self.push_result(frame, &instr.result, v);
                ExecResult::Continue
            }
            InitArray => {
                self.push_result(frame, &instr.result, Value::new_array(ArrayData::new()));
                ExecResult::Continue
            }
            AddArrayElement => {
                let value = self.resolve(frame, &instr.result);
                let key = match &instr.op2 {
                    Operand::Unused => None,
                    other => Some(ArrayKey::normalize(&self.resolve(frame, other))),
                };
                if let Operand::Cv(slot) = instr.op1 {
                    self.ensure_slot(frame, slot);
                    if !matches!(frame.locals[slot as usize], Value::Array(_)) {
                        frame.locals[slot as usize] = Value::new_array(ArrayData::new());
                    }
                    if let Value::Array(rc) = &mut frame.locals[slot as usize] {
                        let arr = Rc::make_mut(rc);
                        match key {
                            Some(k) => arr.set_by_key(k, value),
                            None => arr.push(value),
                        }
                    }
                }
                ExecResult::Continue
            }
            DeclareClosure => {
                let idx = self.resolve(frame, &instr.op1).to_int() as usize;
                let mut closure = Closure::compiled(idx);
                if let FrameSource::Function(_) = frame.source {
                    closure.bound_this = frame.this_obj.clone();
                    if !frame.class_name.is_empty() {
                        closure.bound_class = Some(frame.class_name.clone());
                    }
                }
                self.push_result(frame, &instr.result, Value::new_closure(closure));
                ExecResult::Continue
            }

            FeReset => {
                let subject = self.resolve(frame, &instr.op1);
                let items: Vec<(Value, Value)> = match subject {
                    Value::Array(arr) => arr.iter().map(|(k, v)| (key_to_value(k), v.clone())).collect(),
                    Value::Object(obj) => {
                        obj.borrow().properties.iter().map(|(k, v)| (Value::new_string(k.as_str()), v.clone())).collect()
                    }
                    _ => Vec::new(),
                };
                let mut items_arr = ArrayData::new();
                for (k, v) in items {
                    let mut pair = ArrayData::new();
                    pair.push(k);
                    pair.push(v);
                    items_arr.push(Value::new_array(pair));
                }
                let mut state = ArrayData::new();
                state.set(&Value::new_string("pos"), Value::new_int(0));
                state.set(&Value::new_string("items"), Value::new_array(items_arr));
                if let Operand::Cv(slot) = instr.result {
                    self.write_cv(frame, slot, Value::new_array(state));
                }
                ExecResult::Continue
            }
            FeFetch => {
                let Operand::Cv(slot) = instr.op1 else { return ExecResult::Continue };
                let state = self.read_cv(frame, slot);
                let Value::Array(state_arr) = state else {
                    return ExecResult::Jump(instr.jump_target.expect("FeFetch missing jump_target") as usize);
                };
                let pos = state_arr.get(&Value::new_string("pos")).map(|v| v.to_int()).unwrap_or(0);
                let items_arr = match state_arr.get(&Value::new_string("items")) {
                    Some(Value::Array(items)) => items.clone(),
                    _ => Rc::new(ArrayData::new()),
                };
                if pos < 0 || (pos as usize) >= items_arr.len() {
                    return ExecResult::Jump(instr.jump_target.expect("FeFetch missing jump_target") as usize);
                }
                let (key, value) = match items_arr.get(&Value::new_int(pos)) {
                    Some(Value::Array(pair)) => (
                        pair.get(&Value::new_int(0)).cloned().unwrap_or(Value::Null),
                        pair.get(&Value::new_int(1)).cloned().unwrap_or(Value::Null),
                    ),
                    _ => (Value::Null, Value::Null),
                };
                let mut next_state = (*state_arr).clone();
                next_state.set(&Value::new_string("pos"), Value::new_int(pos + 1));
                self.write_cv(frame, slot, Value::new_array(next_state));
                if let Operand::Cv(key_slot) = instr.op2 {
                    self.write_cv(frame, key_slot, key);
                }
                self.push_result(frame, &instr.result, value);
                ExecResult::Continue
            }
            FeFree => {
                if let Operand::Cv(slot) = instr.op1 {
                    self.write_cv(frame, slot, Value::Null);
                }
                ExecResult::Continue
            }

            Yield | YieldFrom | GeneratorCreate | GeneratorReturn => {
                self.warn("generators are not supported by this runtime; treating as a no-op");
                self.push_result(frame, &instr.result, Value::Null);
                ExecResult::Continue
            }

            Include | IncludeOnce | Require | RequireOnce => {
                let _ = self.resolve(frame, &instr.op1);
                self.push_result(frame, &instr.result, Value::new_bool(true));
                ExecResult::Continue
            }
            Eval => {
                let _ = self.resolve(frame, &instr.op1);
                self.push_result(frame, &instr.result, Value::Null);
                ExecResult::Continue
            }

            Echo => {
                let v = self.resolve(frame, &instr.op1);
                let bytes = v.to_php_string().as_bytes().to_vec();
                self.write_output(&bytes);
                ExecResult::Continue
            }
            Print => {
                let v = self.resolve(frame, &instr.op1);
                let bytes = v.to_php_string().as_bytes().to_vec();
                self.write_output(&bytes);
                self.push_result(frame, &instr.result, Value::new_int(1));
                ExecResult::Continue
            }

            Declare => {
                let idx = self.resolve(frame, &instr.op1).to_int() as usize;
                if let Some(func) = self.unit.functions.get(idx) {
                    let min_args = func.params.iter().filter(|p| p.default.is_none() && !p.variadic).count();
                    let max_args = if func.variadic { None } else { Some(func.params.len()) };
                    let desc = FunctionDescriptor::compiled(func.name.clone(), idx, min_args, max_args, func.variadic);
                    let _ = self.registry.register_function(desc);
                }
                ExecResult::Continue
            }
            Exit => {
                let code = match &instr.op1 {
                    Operand::Unused => 0,
                    other => self.resolve(frame, other).to_int() as u8,
                };
                self.halt(code);
                ExecResult::Return(Value::Null)
            }
            Nop => ExecResult::Continue,
            ExtStmt => {
                if self.deadline.map(|d| d.expired()).unwrap_or(false) {
                    self.halt(255);
                    let exc = self.make_exception("Error", "Maximum execution time exceeded");
                    return ExecResult::Throw(exc);
                }
                ExecResult::Continue
            }
            BindGlobal => {
                let name = self.resolve(frame, &instr.op2).to_php_string().to_string_lossy().to_string();
                let cell = self.globals.entry(name).or_insert_with(|| Rc::new(RefCell::new(Value::Null))).clone();
                if let Operand::Cv(slot) = &instr.op1 {
                    self.bind_cv_reference(frame, *slot, cell);
                }
                ExecResult::Continue
            }
            BindLexical => {
                let name = self.resolve(frame, &instr.op2).to_php_string().to_string_lossy().to_string();
                let value = self.resolve(frame, &instr.result);
                if let Operand::Cv(slot) = &instr.op1 {
                    let current = self.read_cv(frame, *slot);
                    if let Value::Callable(rc) = current {
                        let mut closure = (*rc).clone();
                        closure.captured.push((name, value));
                        self.write_cv(frame, *slot, Value::new_closure(closure));
                    }
                }
                ExecResult::Continue
            }
            Free => {
                let _ = self.resolve(frame, &instr.op1);
                ExecResult::Continue
            }

            LoadConst => {
                let v = self.resolve(frame, &instr.op1);
                self.push_result(frame, &instr.result, v);
                ExecResult::Continue
            }
        }
    }
}

fn key_to_value(key: &ArrayKey) -> Value {
    match key {
        ArrayKey::Int(i) => Value::new_int(*i),
        ArrayKey::Str(s) => Value::new_string(s.as_ref()),
    }
}

impl HostContext for Vm {
    fn write_output(&mut self, bytes: &[u8]) {
        let _ = self.out.write_all(bytes);
    }

    fn registry(&self) -> &Registry {
        &self.registry
    }

    fn get_global(&self, name: &str) -> Option<Value> {
        self.globals.get(name).map(|c| c.borrow().clone())
    }

    fn set_global(&mut self, name: &str, value: Value) {
        let cell = self.globals.entry(name.to_string()).or_insert_with(|| Rc::new(RefCell::new(Value::Null))).clone();
        *cell.borrow_mut() = value;
    }

    fn halt(&mut self, exit_code: u8) {
        self.halted = Some(exit_code);
    }

    fn warn(&mut self, message: &str) {
        log::warn!("{message}");
        self.warnings.push(message.to_string());
    }

    fn call_closure(&mut self, closure: Rc<Closure>, args: Vec<Value>) -> Result<Value, Value> {
        self.call_closure_value(closure, args)
    }

    fn set_time_limit(&mut self, seconds: u64) {
        self.deadline = Some(Deadline::from_seconds(seconds));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOp, Expr, Stmt};
    use crate::compiler::Compiler;

    fn run_program(program: &[Stmt]) -> (Vm, Result<(), Value>) {
        let unit = Compiler::new("<test>").compile(program).expect("compiles");
        let mut vm = Vm::new(unit, Registry::new(), Box::new(Vec::new()));
        let result = vm.run();
        (vm, result)
    }

    #[test]
    fn echoes_simple_arithmetic() {
        let program = vec![Stmt::Echo(vec![Expr::binary(
            BinaryOp::Add,
            Expr::int(2),
            Expr::binary(BinaryOp::Mul, Expr::int(3), Expr::int(4)),
        )])];
        let (_vm, result) = run_program(&program);
        assert!(result.is_ok());
    }

    #[test]
    fn assigns_and_reads_a_variable() {
        let program = vec![
            Stmt::Expression(Expr::assign(Expr::var("x"), Expr::int(5))),
            Stmt::Echo(vec![Expr::var("x")]),
        ];
        let (_vm, result) = run_program(&program);
        assert!(result.is_ok());
    }

    #[test]
    fn undefined_function_call_raises_as_uncaught() {
        let program = vec![Stmt::Expression(Expr::call("does_not_exist", vec![]))];
        let (_vm, result) = run_program(&program);
        assert!(result.is_err());
    }
}
