//! Statement lowering and the `ProgramBuilder` that owns one function (or
//! the top-level program) being compiled. Grounded on the teacher's
//! `CompilationScope`, which likewise accumulates a flat instruction buffer
//! plus a side table of fixups resolved once the whole block is known.
//!
//! Operand-stack bookkeeping conventions shared by every `lower_*`/`emit_*`
//! method here and in `lower_expr.rs`:
//!
//! - When an instruction has two `TmpVar` operands, the VM pops `op2`
//!   first (it was pushed last) and `op1` second — so `op1` always
//!   names whatever was evaluated *first* in source order.
//! - Write-mode memory opcodes (`FetchDimW`, `FetchObjW`, `FetchStaticW`)
//!   and `AddArrayElement`/`BindLexical` repurpose the `result` operand to
//!   carry an input value rather than a destination, and most of them push
//!   something useful back so assignment expressions chain correctly.
//! - A value that must survive a nested sub-expression's own pushes (an
//!   array-under-construction, a fetched container reference, a `match`
//!   subject) is stashed into a synthetic `Cv` local rather than left on the
//!   operand stack, because `TmpVar` here models a strict, depth-blind LIFO
//!   stack, not Zend's indexed temp-variable file.

use super::error::{CompileError, CompileErrorKind, CompileErrors};
use super::scope::FunctionScope;
use super::{CompiledFunction, CompiledUnit, TryRegion};
use crate::ast::{CatchClause, Param, Position, Stmt};
use crate::opcode::{Instruction, Op, Operand};
use crate::registry::{ClassDescriptor, InterfaceDescriptor, MethodDescriptor, PropertyDescriptor, TraitDescriptor};
use crate::value::Value;
use std::collections::HashMap;

struct LoopCtx {
    break_jumps: Vec<usize>,
    continue_target: usize,
}

pub struct ProgramBuilder {
    instructions: Vec<Instruction>,
    constants: Vec<Value>,
    functions: Vec<CompiledFunction>,
    classes: HashMap<String, ClassDescriptor>,
    interfaces: HashMap<String, InterfaceDescriptor>,
    traits: HashMap<String, TraitDescriptor>,
    completed_try_regions: Vec<TryRegion>,
    loop_stack: Vec<LoopCtx>,
    pub scope: FunctionScope,
    pub source_file: String,
    pub current_function: String,
    pub current_class: String,
    synthetic_counter: u32,
    line_counter: u32,
}

impl ProgramBuilder {
    pub fn new(source_file: &str) -> Self {
        ProgramBuilder {
            instructions: Vec::new(),
            constants: Vec::new(),
            functions: Vec::new(),
            classes: HashMap::new(),
            interfaces: HashMap::new(),
            traits: HashMap::new(),
            completed_try_regions: Vec::new(),
            loop_stack: Vec::new(),
            scope: FunctionScope::new(),
            source_file: source_file.to_string(),
            current_function: "{main}".to_string(),
            current_class: String::new(),
            synthetic_counter: 0,
            line_counter: 1,
        }
    }

    pub fn lower_program(&mut self, program: &[Stmt], errors: &mut CompileErrors) {
        self.scope.in_function = false;
        self.lower_block(program, errors);
    }

    pub fn finish(mut self, source_file: String) -> CompiledUnit {
        CompiledUnit {
            source_file,
            instructions: self.instructions,
            constants: self.constants,
            functions: self.functions,
            classes: self.classes,
            interfaces: self.interfaces,
            traits: self.traits,
            top_level_try_regions: std::mem::take(&mut self.completed_try_regions),
            top_level_max_slot: self.scope.max_local_slot(),
            top_level_slots: self.scope.slot_names().clone(),
        }
    }

    // --- low-level emission helpers, shared with lower_expr.rs ---

    pub fn push(&mut self, op: Op, op1: Operand, op2: Operand, result: Operand) -> usize {
        let idx = self.instructions.len();
        self.instructions.push(Instruction::new(op, op1, op2, result, self.line_counter));
        idx
    }

    pub fn push_jump(&mut self, op: Op, op1: Operand) -> usize {
        let idx = self.instructions.len();
        self.instructions
            .push(Instruction::new(op, op1, Operand::Unused, Operand::Unused, self.line_counter).with_jump_target(0));
        idx
    }

    pub fn add_const(&mut self, value: Value) -> u32 {
        if let Some(pos) = self.constants.iter().position(|existing| existing.strict_eq(&value)) {
            return pos as u32;
        }
        self.constants.push(value);
        (self.constants.len() - 1) as u32
    }

    pub fn push_const(&mut self, value: Value) {
        let idx = self.add_const(value);
        self.push(Op::LoadConst, Operand::Const(idx), Operand::Unused, Operand::TmpVar(0));
    }

    pub fn patch_jump(&mut self, instr_idx: usize, target: usize) {
        self.instructions[instr_idx].jump_target = Some(target as u32);
    }

    pub fn here(&self) -> usize {
        self.instructions.len()
    }

    pub fn position(&self) -> Position {
        Position::at_line(self.line_counter)
    }

    pub fn synthetic_name(&mut self, prefix: &str) -> String {
        self.synthetic_counter += 1;
        format!("@{prefix}#{}", self.synthetic_counter)
    }

    /// Compiles `body` as a fresh function (closure, method, or top-level
    /// declared function) sharing this builder's constant pool and nested
    /// function list, and returns its index into `CompiledUnit::functions`.
    pub fn compile_nested_function(
        &mut self,
        name: &str,
        params: &[Param],
        body: &[Stmt],
        by_ref_return: bool,
        errors: &mut CompileErrors,
    ) -> usize {
        let saved_scope = std::mem::take(&mut self.scope);
        let saved_instructions = std::mem::take(&mut self.instructions);
        let saved_try_regions = std::mem::take(&mut self.completed_try_regions);
        let saved_loop_stack = std::mem::take(&mut self.loop_stack);
        let saved_function_name = std::mem::replace(&mut self.current_function, name.to_string());

        self.scope.in_function = true;
        for param in params {
            self.scope.slot_for(&param.name);
        }
        self.lower_block(body, errors);
        // implicit `return null;` if control falls off the end of the body.
        self.push_const(Value::Null);
        self.push(Op::Return, Operand::TmpVar(0), Operand::Unused, Operand::Unused);

        let instructions = std::mem::replace(&mut self.instructions, saved_instructions);
        let try_regions = std::mem::replace(&mut self.completed_try_regions, saved_try_regions);
        let variadic = params.last().map(|p| p.variadic).unwrap_or(false);
        let local_slots = self.scope.slot_names().clone();
        let max_local_slot = self.scope.max_local_slot();
        self.scope = saved_scope;
        self.loop_stack = saved_loop_stack;
        self.current_function = saved_function_name;

        self.functions.push(CompiledFunction {
            name: name.to_string(),
            instructions,
            params: params.to_vec(),
            local_slots,
            max_local_slot,
            variadic,
            is_generator: false,
            by_ref_return,
            try_regions,
        });
        self.functions.len() - 1
    }

    // --- statements ---

    pub fn lower_block(&mut self, stmts: &[Stmt], errors: &mut CompileErrors) {
        for stmt in stmts {
            self.lower_stmt(stmt, errors);
        }
    }

    fn lower_stmt(&mut self, stmt: &Stmt, errors: &mut CompileErrors) {
        self.line_counter += 1;
        match stmt {
            Stmt::Expression(expr) => {
                self.emit_expr(expr, errors);
                self.push(Op::Free, Operand::TmpVar(0), Operand::Unused, Operand::Unused);
            }
            Stmt::Echo(exprs) => {
                for expr in exprs {
                    self.emit_expr(expr, errors);
                    self.push(Op::Echo, Operand::TmpVar(0), Operand::Unused, Operand::Unused);
                }
            }
            Stmt::Print(expr) => {
                self.emit_expr(expr, errors);
                self.push(Op::Print, Operand::TmpVar(0), Operand::Unused, Operand::TmpVar(0));
                self.push(Op::Free, Operand::TmpVar(0), Operand::Unused, Operand::Unused);
            }
            Stmt::If { cond, then, elifs, otherwise } => self.lower_if(cond, then, elifs, otherwise, errors),
            Stmt::While { cond, body } => self.lower_while(cond, body, errors),
            Stmt::DoWhile { body, cond } => self.lower_do_while(body, cond, errors),
            Stmt::For { init, cond, step, body } => self.lower_for(init, cond, step, body, errors),
            Stmt::Foreach { subject, key_var, value_var, by_ref, body } => {
                self.lower_foreach(subject, key_var.as_deref(), value_var, *by_ref, body, errors)
            }
            Stmt::Switch { subject, cases } => self.lower_switch(subject, cases, errors),
            Stmt::Try { body, catches, finally } => self.lower_try(body, catches, finally, errors),
            Stmt::FunctionDecl { name, params, body, by_ref } => {
                let idx = self.compile_nested_function(name, params, body, *by_ref, errors);
                self.push_const(Value::new_int(idx as i64));
                self.push(Op::Declare, Operand::TmpVar(0), Operand::Unused, Operand::Unused);
            }
            Stmt::ClassDecl {
                name,
                parent,
                interfaces,
                traits,
                properties,
                methods,
                is_abstract,
                is_final,
            } => self.lower_class_decl(name, parent.as_deref(), interfaces, traits, properties, methods, *is_abstract, *is_final, errors),
            Stmt::InterfaceDecl { name, methods, parents } => {
                self.interfaces.insert(
                    name.clone(),
                    InterfaceDescriptor { name: name.clone(), parents: parents.clone(), methods: methods.clone() },
                );
            }
            Stmt::TraitDecl { name, methods } => {
                let mut compiled_methods = Vec::new();
                for (method_name, params, body) in methods {
                    let idx = self.compile_nested_function(method_name, params, body, false, errors);
                    compiled_methods.push(method_descriptor(method_name, idx));
                }
                self.traits.insert(
                    name.clone(),
                    TraitDescriptor { name: name.clone(), methods: compiled_methods, properties: Vec::new() },
                );
            }
            Stmt::Return(expr) => {
                match expr {
                    Some(e) => self.emit_expr(e, errors),
                    None => self.push_const(Value::Null),
                }
                if !self.scope.in_function {
                    errors.push(CompileError::new(
                        CompileErrorKind::ReturnOutsideFunction,
                        self.position(),
                        "return used outside of a function body",
                    ));
                }
                self.push(Op::Return, Operand::TmpVar(0), Operand::Unused, Operand::Unused);
            }
            Stmt::Break(level) => self.lower_break_continue(*level, true, errors),
            Stmt::Continue(level) => self.lower_break_continue(*level, false, errors),
            Stmt::Throw(expr) => {
                self.emit_expr(expr, errors);
                self.push(Op::Throw, Operand::TmpVar(0), Operand::Unused, Operand::Unused);
            }
            Stmt::Include { path, once, required } => {
                self.emit_expr(path, errors);
                let op = match (*once, *required) {
                    (true, true) => Op::RequireOnce,
                    (true, false) => Op::IncludeOnce,
                    (false, true) => Op::Require,
                    (false, false) => Op::Include,
                };
                self.push(op, Operand::TmpVar(0), Operand::Unused, Operand::TmpVar(0));
                self.push(Op::Free, Operand::TmpVar(0), Operand::Unused, Operand::Unused);
            }
            Stmt::Global(names) => {
                for name in names {
                    let slot = self.scope.slot_for(name);
                    let name_idx = self.add_const(Value::new_string(name.as_str()));
                    self.push(Op::BindGlobal, Operand::Cv(slot), Operand::Const(name_idx), Operand::Unused);
                }
            }
            Stmt::Block(stmts) => self.lower_block(stmts, errors),
        }
    }

    fn lower_if(
        &mut self,
        cond: &crate::ast::Expr,
        then: &[Stmt],
        elifs: &[(crate::ast::Expr, Vec<Stmt>)],
        otherwise: &[Stmt],
        errors: &mut CompileErrors,
    ) {
        self.emit_expr(cond, errors);
        let jmpz = self.push(Op::Jmpz, Operand::TmpVar(0), Operand::Unused, Operand::Unused);
        self.lower_block(then, errors);
        let mut end_jumps = vec![self.push(Op::Jmp, Operand::Unused, Operand::Unused, Operand::Unused)];
        self.patch_jump(jmpz, self.here());

        for (elif_cond, elif_body) in elifs {
            self.emit_expr(elif_cond, errors);
            let jmpz = self.push(Op::Jmpz, Operand::TmpVar(0), Operand::Unused, Operand::Unused);
            self.lower_block(elif_body, errors);
            end_jumps.push(self.push(Op::Jmp, Operand::Unused, Operand::Unused, Operand::Unused));
            self.patch_jump(jmpz, self.here());
        }

        self.lower_block(otherwise, errors);
        let end = self.here();
        for jmp in end_jumps {
            self.patch_jump(jmp, end);
        }
    }

    fn lower_while(&mut self, cond: &crate::ast::Expr, body: &[Stmt], errors: &mut CompileErrors) {
        let loop_start = self.here();
        self.emit_expr(cond, errors);
        let jmpz = self.push(Op::Jmpz, Operand::TmpVar(0), Operand::Unused, Operand::Unused);
        self.loop_stack.push(LoopCtx { break_jumps: Vec::new(), continue_target: loop_start });
        self.lower_block(body, errors);
        let ctx = self.loop_stack.pop().unwrap();
        self.push(Op::Jmp, Operand::Unused, Operand::Unused, Operand::Unused);
        self.patch_jump(self.here() - 1, loop_start);
        let end = self.here();
        self.patch_jump(jmpz, end);
        for jmp in ctx.break_jumps {
            self.patch_jump(jmp, end);
        }
    }

    fn lower_do_while(&mut self, body: &[Stmt], cond: &crate::ast::Expr, errors: &mut CompileErrors) {
        let loop_start = self.here();
        self.loop_stack.push(LoopCtx { break_jumps: Vec::new(), continue_target: 0 });
        self.lower_block(body, errors);
        let cond_pos = self.here();
        if let Some(ctx) = self.loop_stack.last_mut() {
            ctx.continue_target = cond_pos;
        }
        self.emit_expr(cond, errors);
        let jmpnz = self.push(Op::Jmpnz, Operand::TmpVar(0), Operand::Unused, Operand::Unused);
        self.patch_jump(jmpnz, loop_start);
        let end = self.here();
        let ctx = self.loop_stack.pop().unwrap();
        for jmp in ctx.break_jumps {
            self.patch_jump(jmp, end);
        }
    }

    fn lower_for(
        &mut self,
        init: &[crate::ast::Expr],
        cond: &[crate::ast::Expr],
        step: &[crate::ast::Expr],
        body: &[Stmt],
        errors: &mut CompileErrors,
    ) {
        for expr in init {
            self.emit_expr(expr, errors);
            self.push(Op::Free, Operand::TmpVar(0), Operand::Unused, Operand::Unused);
        }
        let cond_start = self.here();
        let jmpz = if let Some((last, rest)) = cond.split_last() {
            for expr in rest {
                self.emit_expr(expr, errors);
                self.push(Op::Free, Operand::TmpVar(0), Operand::Unused, Operand::Unused);
            }
            self.emit_expr(last, errors);
            Some(self.push(Op::Jmpz, Operand::TmpVar(0), Operand::Unused, Operand::Unused))
        } else {
            None
        };

        self.loop_stack.push(LoopCtx { break_jumps: Vec::new(), continue_target: 0 });
        self.lower_block(body, errors);
        let step_start = self.here();
        if let Some(ctx) = self.loop_stack.last_mut() {
            ctx.continue_target = step_start;
        }
        for expr in step {
            self.emit_expr(expr, errors);
            self.push(Op::Free, Operand::TmpVar(0), Operand::Unused, Operand::Unused);
        }
        let back = self.push(Op::Jmp, Operand::Unused, Operand::Unused, Operand::Unused);
        self.patch_jump(back, cond_start);
        let end = self.here();
        if let Some(jmpz) = jmpz {
            self.patch_jump(jmpz, end);
        }
        let ctx = self.loop_stack.pop().unwrap();
        for jmp in ctx.break_jumps {
            self.patch_jump(jmp, end);
        }
    }

    /// `FeFetch`'s own jump target fires when the iterator is exhausted;
    /// `op1` carries the live iterator state (a synthetic local written
    /// directly by `FeReset`, not pushed), `op2` optionally names a local to
    /// receive the current key, and `result` receives the current value.
    fn lower_foreach(
        &mut self,
        subject: &crate::ast::Expr,
        key_var: Option<&str>,
        value_var: &str,
        by_ref: bool,
        body: &[Stmt],
        errors: &mut CompileErrors,
    ) {
        self.emit_expr(subject, errors);
        let iter_slot = { let name = self.synthetic_name("foreach_iter"); self.scope.slot_for(&name) };
        self.push(Op::FeReset, Operand::TmpVar(0), Operand::Unused, Operand::Cv(iter_slot));

        let loop_start = self.here();
        let key_operand = match key_var {
            Some(name) => Operand::Cv(self.scope.slot_for(name)),
            None => Operand::Unused,
        };
        let fetch_idx = self.push_jump(Op::FeFetch, Operand::Cv(iter_slot));
        self.instructions[fetch_idx].op2 = key_operand;
        self.instructions[fetch_idx].result = Operand::TmpVar(0);

        let value_slot = self.scope.slot_for(value_var);
        let store_op = if by_ref { Op::AssignRef } else { Op::Assign };
        self.push(store_op, Operand::Cv(value_slot), Operand::TmpVar(0), Operand::TmpVar(0));
        self.push(Op::Free, Operand::TmpVar(0), Operand::Unused, Operand::Unused);

        self.loop_stack.push(LoopCtx { break_jumps: Vec::new(), continue_target: loop_start });
        self.lower_block(body, errors);
        let ctx = self.loop_stack.pop().unwrap();
        let back = self.push(Op::Jmp, Operand::Unused, Operand::Unused, Operand::Unused);
        self.patch_jump(back, loop_start);

        let end = self.here();
        self.patch_jump(fetch_idx, end);
        self.push(Op::FeFree, Operand::Cv(iter_slot), Operand::Unused, Operand::Unused);
        let after_free = self.here();
        for jmp in ctx.break_jumps {
            self.patch_jump(jmp, after_free);
        }
    }

    /// Lowered as a chain of equality tests against a stashed subject,
    /// matching the source language's `switch`/`case` fallthrough: a
    /// matched (or `default`) arm runs every following arm's statements
    /// until a `break`.
    fn lower_switch(
        &mut self,
        subject: &crate::ast::Expr,
        cases: &[(Option<crate::ast::Expr>, Vec<Stmt>)],
        errors: &mut CompileErrors,
    ) {
        self.emit_expr(subject, errors);
        let subject_slot = { let name = self.synthetic_name("switch_subject"); self.scope.slot_for(&name) };
        self.push(Op::Assign, Operand::Cv(subject_slot), Operand::TmpVar(0), Operand::TmpVar(0));
        self.push(Op::Free, Operand::TmpVar(0), Operand::Unused, Operand::Unused);

        let mut case_body_jumps = Vec::new();
        let mut default_index = None;
        for (case_expr, _) in cases {
            match case_expr {
                Some(expr) => {
                    self.push(Op::FetchR, Operand::Cv(subject_slot), Operand::Unused, Operand::TmpVar(0));
                    self.emit_expr(expr, errors);
                    self.push(Op::IsEqual, Operand::TmpVar(0), Operand::TmpVar(0), Operand::TmpVar(0));
                    case_body_jumps.push(Some(self.push(Op::Jmpnz, Operand::TmpVar(0), Operand::Unused, Operand::Unused)));
                }
                None => {
                    default_index = Some(case_body_jumps.len());
                    case_body_jumps.push(None);
                }
            }
        }
        let fallthrough_to_default = default_index.map(|_| self.push(Op::Jmp, Operand::Unused, Operand::Unused, Operand::Unused));

        self.loop_stack.push(LoopCtx { break_jumps: Vec::new(), continue_target: 0 });
        let mut body_starts = Vec::with_capacity(cases.len());
        for (_, body) in cases {
            body_starts.push(self.here());
            self.lower_block(body, errors);
        }
        let end = self.here();

        for (jmp, start) in case_body_jumps.into_iter().zip(body_starts.iter()) {
            if let Some(jmp) = jmp {
                self.patch_jump(jmp, *start);
            }
        }
        if let (Some(idx), Some(jmp)) = (default_index, fallthrough_to_default) {
            self.patch_jump(jmp, body_starts[idx]);
        } else if let Some(jmp) = fallthrough_to_default {
            self.patch_jump(jmp, end);
        }
        let ctx = self.loop_stack.pop().unwrap();
        for jmp in ctx.break_jumps {
            self.patch_jump(jmp, end);
        }
    }

    fn lower_try(&mut self, body: &[Stmt], catches: &[CatchClause], finally: &[Stmt], errors: &mut CompileErrors) {
        let try_start = self.here();
        self.lower_block(body, errors);
        let try_end = self.here();
        let mut end_jumps = vec![self.push(Op::Jmp, Operand::Unused, Operand::Unused, Operand::Unused)];

        let mut catch_entries = Vec::new();
        for catch in catches {
            let catch_start = self.here();
            match &catch.var {
                Some(var) => {
                    let slot = self.scope.slot_for(var);
                    self.push(Op::Catch, Operand::Cv(slot), Operand::Unused, Operand::TmpVar(0));
                }
                None => {
                    self.push(Op::Catch, Operand::Unused, Operand::Unused, Operand::TmpVar(0));
                }
            }
            self.push(Op::Free, Operand::TmpVar(0), Operand::Unused, Operand::Unused);
            self.lower_block(&catch.body, errors);
            end_jumps.push(self.push(Op::Jmp, Operand::Unused, Operand::Unused, Operand::Unused));
            catch_entries.push((catch.types.clone(), catch_start));
        }

        let finally_start = if !finally.is_empty() { Some(self.here()) } else { None };
        let after_catches = self.here();
        for jmp in end_jumps {
            self.patch_jump(jmp, after_catches);
        }
        if !finally.is_empty() {
            self.lower_block(finally, errors);
        }
        let finally_end = finally_start.map(|_| self.here());

        self.completed_try_regions.push(TryRegion {
            start: try_start,
            end: try_end,
            catches: catch_entries,
            finally: finally_start,
            finally_end,
        });
    }

    fn lower_break_continue(&mut self, level: u32, is_break: bool, errors: &mut CompileErrors) {
        let level = level.max(1) as usize;
        if level > self.loop_stack.len() {
            errors.push(CompileError::new(
                if is_break { CompileErrorKind::BreakOutsideLoop } else { CompileErrorKind::ContinueOutsideLoop },
                self.position(),
                format!("cannot {} out of {level} loop level(s); only {} enclosing", if is_break { "break" } else { "continue" }, self.loop_stack.len()),
            ));
            return;
        }
        let target_idx = self.loop_stack.len() - level;
        if is_break {
            let jmp = self.push(Op::Jmp, Operand::Unused, Operand::Unused, Operand::Unused);
            self.loop_stack[target_idx].break_jumps.push(jmp);
        } else {
            let target = self.loop_stack[target_idx].continue_target;
            let jmp = self.push(Op::Jmp, Operand::Unused, Operand::Unused, Operand::Unused);
            self.patch_jump(jmp, target);
        }
    }

    fn lower_class_decl(
        &mut self,
        name: &str,
        parent: Option<&str>,
        interfaces: &[String],
        traits: &[String],
        properties: &[(String, Option<crate::ast::Expr>, bool)],
        methods: &[(String, Vec<Param>, Vec<Stmt>, bool)],
        is_abstract: bool,
        is_final: bool,
        errors: &mut CompileErrors,
    ) {
        let saved_class = std::mem::replace(&mut self.current_class, name.to_string());

        let mut compiled_properties = Vec::new();
        for (prop_name, default, is_static) in properties {
            let default_value = match default {
                Some(expr) => self.const_fold_or_null(expr),
                None => Value::Null,
            };
            compiled_properties.push(PropertyDescriptor {
                name: prop_name.clone(),
                default: default_value,
                is_static: *is_static,
            });
        }

        let mut compiled_methods = Vec::new();
        for (method_name, params, body, is_static) in methods {
            let idx = self.compile_nested_function(method_name, params, body, false, errors);
            let mut descriptor = method_descriptor(method_name, idx);
            descriptor.is_static = *is_static;
            compiled_methods.push(descriptor);
        }

        self.classes.insert(
            name.to_string(),
            ClassDescriptor {
                name: name.to_string(),
                parent: parent.map(str::to_string),
                interfaces: interfaces.to_vec(),
                traits: traits.to_vec(),
                properties: compiled_properties,
                methods: compiled_methods,
                constants: Vec::new(),
                is_abstract,
                is_final,
            },
        );
        self.current_class = saved_class;
    }

    /// Class property defaults must be compile-time constant in the source
    /// language; anything else degrades to `null` with a diagnostic rather
    /// than failing the whole compile, since a best-effort default is more
    /// useful than none.
    fn const_fold_or_null(&mut self, expr: &crate::ast::Expr) -> Value {
        use crate::ast::{Expr, Literal};
        match expr {
            Expr::Literal(Literal::Null) => Value::Null,
            Expr::Literal(Literal::Bool(b)) => Value::new_bool(*b),
            Expr::Literal(Literal::Int(i)) => Value::new_int(*i),
            Expr::Literal(Literal::Float(f)) => Value::new_float(*f),
            Expr::Literal(Literal::String(s)) => Value::new_string(s.as_str()),
            _ => Value::Null,
        }
    }
}

fn method_descriptor(name: &str, function_index: usize) -> MethodDescriptor {
    MethodDescriptor { name: name.to_string(), function_index, is_static: false, is_abstract: false }
}
