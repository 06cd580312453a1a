//! Expression lowering. Every `emit_expr` call leaves exactly one value on
//! the VM's transient operand stack (spec.md §4.4's lowering contract); the
//! hybrid bytecode uses `Cv` operands for named locals (true random-access
//! registers) and `TmpVar` operands purely as stack discipline, so a
//! `TmpVar`'s numeric index is cosmetic and dispatch always pops/pushes the
//! top of the VM's operand stack for it.
//!
//! Write-mode memory opcodes (`fetch_dim_w`, `fetch_obj_w`,
//! `fetch_static_w`) repurpose their `result` operand to carry the value
//! being stored rather than a destination for a read, and they leave that
//! same value on the operand stack as their produced r-value (so
//! `$a[0] = $b[1] = 5` chains the way source-level assignment expects).

use super::lower_stmt::ProgramBuilder;
use crate::ast::{AssignOp, BinaryOp, Expr, Literal, MagicConstant, UnaryOp};
use crate::compiler::error::{CompileError, CompileErrorKind, CompileErrors};
use crate::opcode::{Op, Operand};
use crate::value::Value;

/// A resolved assignment target. `ArrayElem`/`PropElem` carry their
/// container already reduced to an `Operand::Cv` (see `container_operand`)
/// so `store_place` never needs to juggle a container value that sits
/// beneath other pending operand-stack pushes.
pub enum Place {
    Local(u32),
    ArrayElem { container: Operand, key: Option<Box<Expr>> },
    PropElem { target: Operand, property: String },
    StaticProp { class: String, property: String },
}

impl ProgramBuilder {
    pub fn emit_expr(&mut self, expr: &Expr, errors: &mut CompileErrors) {
        match expr {
            Expr::Literal(lit) => self.emit_literal(lit),
            Expr::MagicConstant(mc) => self.emit_magic_constant(*mc),
            Expr::Variable(name) => {
                let slot = self.scope.slot_for(name);
                self.push(Op::FetchR, Operand::Cv(slot), Operand::Unused, Operand::TmpVar(0));
            }
            Expr::Binary { op: BinaryOp::And, left, right } => {
                self.emit_short_circuit(true, left, right, errors)
            }
            Expr::Binary { op: BinaryOp::Or, left, right } => {
                self.emit_short_circuit(false, left, right, errors)
            }
            Expr::Binary { op, left, right } => {
                self.emit_expr(left, errors);
                self.emit_expr(right, errors);
                self.push(binary_opcode(*op), Operand::TmpVar(0), Operand::TmpVar(0), Operand::TmpVar(0));
            }
            Expr::Unary { op, operand } => {
                self.emit_expr(operand, errors);
                match op {
                    // `-x` desugars to `x * -1`; multiplication is
                    // commutative so operand order can't get this backwards,
                    // unlike a desugaring through `Sub`.
                    UnaryOp::Neg => {
                        self.push_const(Value::new_int(-1));
                        self.push(Op::Mul, Operand::TmpVar(0), Operand::TmpVar(0), Operand::TmpVar(0));
                    }
                    UnaryOp::Not => {
                        self.push(Op::BooleanNot, Operand::TmpVar(0), Operand::Unused, Operand::TmpVar(0));
                    }
                    UnaryOp::BwNot => {
                        self.push(Op::BwNot, Operand::TmpVar(0), Operand::Unused, Operand::TmpVar(0));
                    }
                }
            }
            Expr::Assign { op, target, value } => {
                self.emit_assign(*op, target, value, errors);
            }
            Expr::AssignRef { target, value } => {
                self.emit_assign_ref(target, value, errors);
            }
            Expr::Ternary { cond, then, otherwise } => {
                self.emit_ternary(cond, then.as_deref(), otherwise, errors);
            }
            Expr::Coalesce { left, right } => {
                self.emit_coalesce(left, right, errors);
            }
            Expr::Call { callee, args } => self.emit_call(callee, args, errors),
            Expr::MethodCall { target, method, args } => {
                self.emit_method_call(target, method, args, errors)
            }
            Expr::StaticCall { class, method, args } => {
                self.emit_static_call(class, method, args, errors)
            }
            Expr::PropertyAccess { target, property } => {
                self.emit_expr(target, errors);
                self.push_const(Value::new_string(property.as_str()));
                self.push(Op::FetchObjR, Operand::TmpVar(0), Operand::TmpVar(0), Operand::TmpVar(0));
            }
            Expr::StaticPropertyAccess { class, property } => {
                let key = format!("{class}::{property}");
                let idx = self.add_const(Value::new_string(key.as_str()));
                self.push(Op::FetchStaticR, Operand::Const(idx), Operand::Unused, Operand::TmpVar(0));
            }
            Expr::ArrayAccess { target, index } => {
                self.emit_expr(target, errors);
                match index {
                    Some(idx) => {
                        self.emit_expr(idx, errors);
                        self.push(Op::FetchDimR, Operand::TmpVar(0), Operand::TmpVar(0), Operand::TmpVar(0));
                    }
                    None => {
                        errors.push(CompileError::new(
                            CompileErrorKind::InvalidAssignmentTarget,
                            self.position(),
                            "cannot read from an empty `[]` append target",
                        ));
                    }
                }
            }
            Expr::New { class, args } => self.emit_new(class, args, errors),
            Expr::Cast { target_type, operand } => {
                self.emit_expr(operand, errors);
                self.push_const(Value::new_string(target_type.as_str()));
                self.push(Op::Cast, Operand::TmpVar(0), Operand::TmpVar(0), Operand::TmpVar(0));
            }
            Expr::Closure { params, uses, body } => self.emit_closure(params, uses, body, errors),
            Expr::ArrowFunction { params, body } => self.emit_arrow(params, body, errors),
            Expr::Match { subject, arms, default } => {
                self.emit_match(subject, arms, default.as_deref(), errors)
            }
            Expr::ArrayLiteral(entries) => self.emit_array_literal(entries, errors),
            Expr::InterpolatedString(parts) => self.emit_interpolated(parts, errors),
            Expr::ListPattern(_) => {
                errors.push(CompileError::new(
                    CompileErrorKind::InvalidAssignmentTarget,
                    self.position(),
                    "list() pattern may only appear as an assignment target",
                ));
            }
        }
    }

    fn emit_literal(&mut self, lit: &Literal) {
        let value = match lit {
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::new_bool(*b),
            Literal::Int(i) => Value::new_int(*i),
            Literal::Float(f) => Value::new_float(*f),
            Literal::String(s) => Value::new_string(s.as_str()),
        };
        self.push_const(value);
    }

    fn emit_magic_constant(&mut self, mc: MagicConstant) {
        let value = match mc {
            MagicConstant::File => Value::new_string(self.source_file.as_str()),
            MagicConstant::Line => Value::new_int(self.position().line as i64),
            MagicConstant::Dir => Value::new_string(
                std::path::Path::new(&self.source_file)
                    .parent()
                    .map(|p| p.to_string_lossy().to_string())
                    .unwrap_or_default(),
            ),
            MagicConstant::Function => Value::new_string(self.current_function.clone()),
            MagicConstant::Class => Value::new_string(self.current_class.clone()),
            MagicConstant::Method => Value::new_string(format!(
                "{}::{}",
                self.current_class, self.current_function
            )),
            MagicConstant::Namespace => Value::new_string(""),
        };
        self.push_const(value);
    }

    fn emit_short_circuit(&mut self, is_and: bool, left: &Expr, right: &Expr, errors: &mut CompileErrors) {
        // `JmpzEx`/`JmpnzEx` pop the left operand, coerce it to bool, push
        // that bool back, and take the branch without evaluating `right` at
        // all. When the branch isn't taken, `right` is evaluated and
        // double-negated so both paths leave one coerced bool behind.
        self.emit_expr(left, errors);
        let branch_op = if is_and { Op::JmpzEx } else { Op::JmpnzEx };
        let jmp_idx = self.push(branch_op, Operand::TmpVar(0), Operand::Unused, Operand::TmpVar(0));
        self.emit_expr(right, errors);
        self.push(Op::BooleanNot, Operand::TmpVar(0), Operand::Unused, Operand::TmpVar(0));
        self.push(Op::BooleanNot, Operand::TmpVar(0), Operand::Unused, Operand::TmpVar(0));
        self.patch_jump(jmp_idx, self.here());
    }

    fn emit_ternary(&mut self, cond: &Expr, then: Option<&Expr>, otherwise: &Expr, errors: &mut CompileErrors) {
        self.emit_expr(cond, errors);
        match then {
            Some(then_expr) => {
                let jmpz = self.push(Op::Jmpz, Operand::TmpVar(0), Operand::Unused, Operand::Unused);
                self.emit_expr(then_expr, errors);
                let jmp_end = self.push(Op::Jmp, Operand::Unused, Operand::Unused, Operand::Unused);
                self.patch_jump(jmpz, self.here());
                self.emit_expr(otherwise, errors);
                self.patch_jump(jmp_end, self.here());
            }
            None => {
                // `$a ?: $b`: reuse the condition's value as the "then" branch.
                let jmp_set = self.push(Op::JmpSet, Operand::TmpVar(0), Operand::Unused, Operand::TmpVar(0));
                self.emit_expr(otherwise, errors);
                self.patch_jump(jmp_set, self.here());
            }
        }
    }

    fn emit_coalesce(&mut self, left: &Expr, right: &Expr, errors: &mut CompileErrors) {
        self.emit_expr(left, errors);
        let jmp = self.push(Op::Coalesce, Operand::TmpVar(0), Operand::Unused, Operand::TmpVar(0));
        self.emit_expr(right, errors);
        self.patch_jump(jmp, self.here());
    }

    fn emit_call(&mut self, callee: &str, args: &[crate::ast::Arg], errors: &mut CompileErrors) {
        self.push_const(Value::new_string(callee));
        self.push(Op::InitFcall, Operand::TmpVar(0), Operand::Unused, Operand::Unused);
        for arg in args {
            self.emit_expr(&arg.value, errors);
            self.push(Op::SendVal, Operand::TmpVar(0), Operand::Unused, Operand::Unused);
        }
        self.push_const(Value::new_int(args.len() as i64));
        self.push(Op::DoFcall, Operand::TmpVar(0), Operand::Unused, Operand::TmpVar(0));
    }

    fn emit_method_call(
        &mut self,
        target: &Expr,
        method: &str,
        args: &[crate::ast::Arg],
        errors: &mut CompileErrors,
    ) {
        self.emit_expr(target, errors);
        self.push_const(Value::new_string(method));
        self.push(Op::InitMethodCall, Operand::TmpVar(0), Operand::TmpVar(0), Operand::Unused);
        for arg in args {
            self.emit_expr(&arg.value, errors);
            self.push(Op::SendVal, Operand::TmpVar(0), Operand::Unused, Operand::Unused);
        }
        self.push_const(Value::new_int(args.len() as i64));
        self.push(Op::DoFcall, Operand::TmpVar(0), Operand::Unused, Operand::TmpVar(0));
    }

    fn emit_static_call(
        &mut self,
        class: &str,
        method: &str,
        args: &[crate::ast::Arg],
        errors: &mut CompileErrors,
    ) {
        self.push_const(Value::new_string(class));
        self.push_const(Value::new_string(method));
        self.push(Op::InitStaticMethodCall, Operand::TmpVar(0), Operand::TmpVar(0), Operand::Unused);
        for arg in args {
            self.emit_expr(&arg.value, errors);
            self.push(Op::SendVal, Operand::TmpVar(0), Operand::Unused, Operand::Unused);
        }
        self.push_const(Value::new_int(args.len() as i64));
        self.push(Op::DoFcall, Operand::TmpVar(0), Operand::Unused, Operand::TmpVar(0));
    }

    fn emit_new(&mut self, class: &str, args: &[crate::ast::Arg], errors: &mut CompileErrors) {
        self.push_const(Value::new_string(class));
        self.push(Op::New, Operand::TmpVar(0), Operand::Unused, Operand::TmpVar(0));

        // stash the freshly allocated object so its constructor's (likely
        // void) return value doesn't clobber `new`'s own result.
        let obj_slot = { let name = self.synthetic_name("new_obj"); self.scope.slot_for(&name) };
        self.push(Op::Assign, Operand::Cv(obj_slot), Operand::TmpVar(0), Operand::TmpVar(0));
        self.push(Op::Free, Operand::TmpVar(0), Operand::Unused, Operand::Unused);

        self.push(Op::FetchR, Operand::Cv(obj_slot), Operand::Unused, Operand::TmpVar(0));
        self.push_const(Value::new_string("__construct"));
        self.push(Op::InitMethodCall, Operand::TmpVar(0), Operand::TmpVar(0), Operand::Unused);
        for arg in args {
            self.emit_expr(&arg.value, errors);
            self.push(Op::SendVal, Operand::TmpVar(0), Operand::Unused, Operand::Unused);
        }
        self.push_const(Value::new_int(args.len() as i64));
        self.push(Op::DoFcall, Operand::TmpVar(0), Operand::Unused, Operand::TmpVar(0));
        self.push(Op::Free, Operand::TmpVar(0), Operand::Unused, Operand::Unused);

        self.push(Op::FetchR, Operand::Cv(obj_slot), Operand::Unused, Operand::TmpVar(0));
    }

    fn emit_array_literal(&mut self, entries: &[(Option<Expr>, Expr)], errors: &mut CompileErrors) {
        // the array under construction and each explicit key are stashed in
        // synthetic locals (read via `Cv`, never popped) so `AddArrayElement`
        // only ever has to pop one thing — the element value, pushed
        // immediately beforehand with nothing else in between.
        self.push(Op::InitArray, Operand::Unused, Operand::Unused, Operand::TmpVar(0));
        let arr_slot = { let name = self.synthetic_name("array_literal"); self.scope.slot_for(&name) };
        self.push(Op::Assign, Operand::Cv(arr_slot), Operand::TmpVar(0), Operand::TmpVar(0));
        self.push(Op::Free, Operand::TmpVar(0), Operand::Unused, Operand::Unused);

        for (key, value) in entries {
            let key_operand = match key {
                Some(key_expr) => {
                    self.emit_expr(key_expr, errors);
                    let key_slot = { let name = self.synthetic_name("array_key"); self.scope.slot_for(&name) };
                    self.push(Op::Assign, Operand::Cv(key_slot), Operand::TmpVar(0), Operand::TmpVar(0));
                    self.push(Op::Free, Operand::TmpVar(0), Operand::Unused, Operand::Unused);
                    Operand::Cv(key_slot)
                }
                None => Operand::Unused,
            };
            self.emit_expr(value, errors);
            self.push(Op::AddArrayElement, Operand::Cv(arr_slot), key_operand, Operand::TmpVar(0));
        }
        self.push(Op::FetchR, Operand::Cv(arr_slot), Operand::Unused, Operand::TmpVar(0));
    }

    fn emit_interpolated(&mut self, parts: &[Expr], errors: &mut CompileErrors) {
        if parts.is_empty() {
            self.push_const(Value::new_string(""));
            return;
        }
        self.emit_expr(&parts[0], errors);
        for part in &parts[1..] {
            self.emit_expr(part, errors);
            self.push(Op::Concat, Operand::TmpVar(0), Operand::TmpVar(0), Operand::TmpVar(0));
        }
    }

    fn emit_closure(
        &mut self,
        params: &[crate::ast::Param],
        uses: &[(String, bool)],
        body: &[crate::ast::Stmt],
        errors: &mut CompileErrors,
    ) {
        let function_index = self.compile_nested_function("{closure}", params, body, false, errors);
        let closure_slot = self.declare_closure_value(function_index);
        for (name, by_ref) in uses {
            let slot = self.scope.slot_for(name);
            if *by_ref {
                self.push(Op::FetchRw, Operand::Cv(slot), Operand::Unused, Operand::TmpVar(0));
            } else {
                self.push(Op::FetchR, Operand::Cv(slot), Operand::Unused, Operand::TmpVar(0));
            }
            let name_idx = self.add_const(Value::new_string(name.as_str()));
            self.push(Op::BindLexical, Operand::Cv(closure_slot), Operand::Const(name_idx), Operand::TmpVar(0));
        }
        self.push(Op::FetchR, Operand::Cv(closure_slot), Operand::Unused, Operand::TmpVar(0));
    }

    fn emit_arrow(&mut self, params: &[crate::ast::Param], body: &Expr, errors: &mut CompileErrors) {
        // arrow functions implicitly capture every referenced outer variable
        // by value; we approximate this by capturing every slot already
        // allocated in the enclosing scope at the point of definition.
        let captured: Vec<String> = self.scope.slot_names().keys().cloned().collect();
        let body_stmts = vec![crate::ast::Stmt::Return(Some(body.clone()))];
        let function_index = self.compile_nested_function("{closure}", params, &body_stmts, false, errors);
        let closure_slot = self.declare_closure_value(function_index);
        for name in &captured {
            let slot = self.scope.slot_for(name);
            self.push(Op::FetchR, Operand::Cv(slot), Operand::Unused, Operand::TmpVar(0));
            let name_idx = self.add_const(Value::new_string(name.as_str()));
            self.push(Op::BindLexical, Operand::Cv(closure_slot), Operand::Const(name_idx), Operand::TmpVar(0));
        }
        self.push(Op::FetchR, Operand::Cv(closure_slot), Operand::Unused, Operand::TmpVar(0));
    }

    /// Emits `DeclareClosure` for `function_index` and stashes the result in
    /// a synthetic local, returning its slot — so the subsequent `BindLexical`
    /// calls (each themselves only one net stack push, for the captured
    /// value) never have to dig the closure back out from under them.
    fn declare_closure_value(&mut self, function_index: usize) -> u32 {
        self.push_const(Value::new_int(function_index as i64));
        self.push(Op::DeclareClosure, Operand::TmpVar(0), Operand::Unused, Operand::TmpVar(0));
        let slot = { let name = self.synthetic_name("closure"); self.scope.slot_for(&name) };
        self.push(Op::Assign, Operand::Cv(slot), Operand::TmpVar(0), Operand::TmpVar(0));
        self.push(Op::Free, Operand::TmpVar(0), Operand::Unused, Operand::Unused);
        slot
    }

    fn emit_match(
        &mut self,
        subject: &Expr,
        arms: &[(Vec<Expr>, Expr)],
        default: Option<&Expr>,
        errors: &mut CompileErrors,
    ) {
        // the subject is evaluated once; stash it in a synthetic local so
        // each arm's comparison can read it again without re-running any
        // side effects it might have.
        self.emit_expr(subject, errors);
        let subject_name = self.synthetic_name("match_subject");
        let subject_slot = self.scope.slot_for(&subject_name);
        self.push(Op::Assign, Operand::Cv(subject_slot), Operand::TmpVar(0), Operand::TmpVar(0));
        self.push(Op::Free, Operand::TmpVar(0), Operand::Unused, Operand::Unused);

        let mut end_jumps = Vec::new();
        for (conditions, result) in arms {
            let mut matched_jumps = Vec::new();
            for cond in conditions {
                self.push(Op::FetchR, Operand::Cv(subject_slot), Operand::Unused, Operand::TmpVar(0));
                self.emit_expr(cond, errors);
                self.push(Op::IsIdentical, Operand::TmpVar(0), Operand::TmpVar(0), Operand::TmpVar(0));
                matched_jumps.push(self.push(Op::Jmpnz, Operand::TmpVar(0), Operand::Unused, Operand::Unused));
            }
            let skip_arm = self.push(Op::Jmp, Operand::Unused, Operand::Unused, Operand::Unused);
            let arm_start = self.here();
            for jmp in matched_jumps {
                self.patch_jump(jmp, arm_start);
            }
            self.emit_expr(result, errors);
            end_jumps.push(self.push(Op::Jmp, Operand::Unused, Operand::Unused, Operand::Unused));
            let after_arm = self.here();
            self.patch_jump(skip_arm, after_arm);
        }
        match default {
            Some(d) => self.emit_expr(d, errors),
            None => self.push_const(Value::Null),
        }
        let end = self.here();
        for jmp in end_jumps {
            self.patch_jump(jmp, end);
        }
    }

    /// Lowers an expression used as an assignment target into a `Place`.
    pub fn resolve_place(&mut self, expr: &Expr, errors: &mut CompileErrors) -> Place {
        match expr {
            Expr::Variable(name) => Place::Local(self.scope.slot_for(name)),
            Expr::ArrayAccess { target, index } => {
                let container = self.container_operand(target, errors);
                Place::ArrayElem { container, key: index.clone() }
            }
            Expr::PropertyAccess { target, property } => {
                let container = self.container_operand(target, errors);
                Place::PropElem { target: container, property: property.clone() }
            }
            Expr::StaticPropertyAccess { class, property } => {
                Place::StaticProp { class: class.clone(), property: property.clone() }
            }
            _ => {
                errors.push(CompileError::new(
                    CompileErrorKind::InvalidAssignmentTarget,
                    self.position(),
                    "expression is not a valid assignment target",
                ));
                Place::Local({ let name = self.synthetic_name("invalid_target"); self.scope.slot_for(&name) })
            }
        }
    }

    /// Resolves `expr` (the container half of an array/property write
    /// target) to a `Cv` operand the VM can mutate in place. A `Cv` slot may
    /// itself hold a `Value::Reference` cell (from an enclosing write), in
    /// which case the VM dereferences through it rather than overwriting the
    /// binding — the same reference-transparency rule plain variable writes
    /// use. Non-variable roots (e.g. a bare function-call result) are
    /// rejected, matching the source language's own "cannot use a temporary
    /// expression in write context" rule.
    fn container_operand(&mut self, expr: &Expr, errors: &mut CompileErrors) -> Operand {
        match expr {
            Expr::Variable(name) => Operand::Cv(self.scope.slot_for(name)),
            Expr::ArrayAccess { target, index } => {
                let base = self.container_operand(target, errors);
                let key_operand = match index {
                    Some(idx) => {
                        self.emit_expr(idx, errors);
                        Operand::TmpVar(0)
                    }
                    None => Operand::Unused,
                };
                self.push(Op::FetchDimW, base, key_operand, Operand::TmpVar(0));
                self.stash_reference()
            }
            Expr::PropertyAccess { target, property } => {
                let base = self.container_operand(target, errors);
                self.push_const(Value::new_string(property.as_str()));
                self.push(Op::FetchObjW, base, Operand::TmpVar(0), Operand::TmpVar(0));
                self.stash_reference()
            }
            _ => {
                errors.push(CompileError::new(
                    CompileErrorKind::InvalidAssignmentTarget,
                    self.position(),
                    "cannot assign through a non-variable expression",
                ));
                Operand::Cv({ let name = self.synthetic_name("invalid_container"); self.scope.slot_for(&name) })
            }
        }
    }

    /// Moves the `Value::Reference` cell currently on top of the operand
    /// stack into a fresh synthetic local and returns that slot, so a
    /// subsequent sibling push (e.g. the next nesting level's key) can't
    /// bury it where a `TmpVar` pop could no longer reach it.
    fn stash_reference(&mut self) -> Operand {
        self.stash_reference_named("ref")
    }

    fn stash_reference_named(&mut self, prefix: &str) -> Operand {
        let slot = { let name = self.synthetic_name(prefix); self.scope.slot_for(&name) };
        self.push(Op::Assign, Operand::Cv(slot), Operand::TmpVar(0), Operand::TmpVar(0));
        self.push(Op::Free, Operand::TmpVar(0), Operand::Unused, Operand::Unused);
        Operand::Cv(slot)
    }

    fn emit_assign(&mut self, op: AssignOp, target: &Expr, value: &Expr, errors: &mut CompileErrors) {
        if op != AssignOp::Assign {
            // desugar compound assignment as `target = target OP value`.
            let arith = match op {
                AssignOp::AddAssign => BinaryOp::Add,
                AssignOp::SubAssign => BinaryOp::Sub,
                AssignOp::MulAssign => BinaryOp::Mul,
                AssignOp::DivAssign => BinaryOp::Div,
                AssignOp::ModAssign => BinaryOp::Mod,
                AssignOp::ConcatAssign => BinaryOp::Concat,
                AssignOp::Assign => unreachable!(),
            };
            let desugared = Expr::binary(arith, target.clone(), value.clone());
            self.emit_assign(AssignOp::Assign, target, &desugared, errors);
            return;
        }
        if let Expr::ListPattern(slots) = target {
            self.emit_list_assign(slots, value, errors);
            return;
        }
        let place = self.resolve_place(target, errors);
        self.emit_expr(value, errors);
        self.store_place(&place, errors);
    }

    fn emit_list_assign(&mut self, slots: &[Option<Expr>], value: &Expr, errors: &mut CompileErrors) {
        self.emit_expr(value, errors);
        let source_name = self.synthetic_name("list_source");
        let source_slot = self.scope.slot_for(&source_name);
        self.push(Op::Assign, Operand::Cv(source_slot), Operand::TmpVar(0), Operand::TmpVar(0));
        self.push(Op::Free, Operand::TmpVar(0), Operand::Unused, Operand::Unused);

        for (i, slot) in slots.iter().enumerate() {
            if let Some(target_expr) = slot {
                self.push(Op::FetchR, Operand::Cv(source_slot), Operand::Unused, Operand::TmpVar(0));
                self.push_const(Value::new_int(i as i64));
                self.push(Op::FetchDimR, Operand::TmpVar(0), Operand::TmpVar(0), Operand::TmpVar(0));
                let place = self.resolve_place(target_expr, errors);
                self.store_place(&place, errors);
                self.push(Op::Free, Operand::TmpVar(0), Operand::Unused, Operand::Unused);
            }
        }
        self.push(Op::FetchR, Operand::Cv(source_slot), Operand::Unused, Operand::TmpVar(0));
    }

    /// Stores the value currently on top of the operand stack into `place`,
    /// leaving it there afterward as the expression's produced r-value.
    ///
    /// `Op::Assign`'s canonical operand meaning is `op1 = target, op2 =
    /// value` everywhere in this compiler; a non-local place needs its
    /// write-mode fetch (which itself needs the key/property operand slots)
    /// to run *before* `Assign` sees the target, so the about-to-be-stored
    /// value is stashed into a synthetic local first — keeping every
    /// `Assign` call site down to at most one genuine `TmpVar` operand and
    /// avoiding the two-TmpVar pop-order ambiguity entirely.
    pub fn store_place(&mut self, place: &Place, errors: &mut CompileErrors) {
        match place {
            Place::Local(slot) => {
                self.push(Op::Assign, Operand::Cv(*slot), Operand::TmpVar(0), Operand::TmpVar(0));
            }
            Place::ArrayElem { container, key } => {
                let value_slot = self.stash_value("assign_value");
                let key_operand = match key {
                    Some(key_expr) => {
                        self.emit_expr(key_expr, errors);
                        Operand::TmpVar(0)
                    }
                    None => Operand::Unused,
                };
                self.push(Op::FetchDimW, container.clone(), key_operand, Operand::TmpVar(0));
                self.push(Op::Assign, Operand::TmpVar(0), Operand::Cv(value_slot), Operand::TmpVar(0));
            }
            Place::PropElem { target, property } => {
                let value_slot = self.stash_value("assign_value");
                self.push_const(Value::new_string(property.as_str()));
                self.push(Op::FetchObjW, target.clone(), Operand::TmpVar(0), Operand::TmpVar(0));
                self.push(Op::Assign, Operand::TmpVar(0), Operand::Cv(value_slot), Operand::TmpVar(0));
            }
            Place::StaticProp { class, property } => {
                let value_slot = self.stash_value("assign_value");
                let key = format!("{class}::{property}");
                let idx = self.add_const(Value::new_string(key.as_str()));
                self.push(Op::FetchStaticW, Operand::Const(idx), Operand::Unused, Operand::TmpVar(0));
                self.push(Op::Assign, Operand::TmpVar(0), Operand::Cv(value_slot), Operand::TmpVar(0));
            }
        }
    }

    /// Pops the value currently on top of the operand stack into a fresh
    /// synthetic local and returns its slot.
    fn stash_value(&mut self, prefix: &str) -> u32 {
        match self.stash_reference_named(prefix) {
            Operand::Cv(slot) => slot,
            _ => unreachable!("stash_reference_named always returns Operand::Cv"),
        }
    }

    fn emit_assign_ref(&mut self, target: &Expr, value: &Expr, errors: &mut CompileErrors) {
        let place = self.resolve_place(target, errors);
        self.emit_reference_source(value, errors);
        match place {
            Place::Local(slot) => {
                self.push(Op::AssignRef, Operand::Cv(slot), Operand::TmpVar(0), Operand::TmpVar(0));
            }
            other => self.store_place(&other, errors),
        }
    }

    /// Evaluates `expr` for use as the right-hand side of `=&`: variables
    /// and container elements are promoted to a shared `Value::Reference`
    /// cell (via `FetchRw`/`FetchDimW`/`FetchObjW`) so the alias is a true
    /// two-way share; anything else falls back to an ordinary value (the
    /// source language only allows referencing an lvalue, so this path is
    /// unreachable for well-formed programs and exists only for resilience
    /// against a malformed tree).
    fn emit_reference_source(&mut self, expr: &Expr, errors: &mut CompileErrors) {
        match expr {
            Expr::Variable(name) => {
                let slot = self.scope.slot_for(name);
                self.push(Op::FetchRw, Operand::Cv(slot), Operand::Unused, Operand::TmpVar(0));
            }
            Expr::ArrayAccess { target, index } => {
                let container = self.container_operand(target, errors);
                let key_operand = match index {
                    Some(idx) => {
                        self.emit_expr(idx, errors);
                        Operand::TmpVar(0)
                    }
                    None => Operand::Unused,
                };
                self.push(Op::FetchDimW, container, key_operand, Operand::TmpVar(0));
            }
            Expr::PropertyAccess { target, property } => {
                let container = self.container_operand(target, errors);
                self.push_const(Value::new_string(property.as_str()));
                self.push(Op::FetchObjW, container, Operand::TmpVar(0), Operand::TmpVar(0));
            }
            _ => self.emit_expr(expr, errors),
        }
    }
}

fn binary_opcode(op: BinaryOp) -> Op {
    match op {
        BinaryOp::Add => Op::Add,
        BinaryOp::Sub => Op::Sub,
        BinaryOp::Mul => Op::Mul,
        BinaryOp::Div => Op::Div,
        BinaryOp::Mod => Op::Mod,
        BinaryOp::Pow => Op::Pow,
        BinaryOp::Concat => Op::Concat,
        BinaryOp::BwAnd => Op::BwAnd,
        BinaryOp::BwOr => Op::BwOr,
        BinaryOp::BwXor => Op::BwXor,
        BinaryOp::Shl => Op::Sl,
        BinaryOp::Shr => Op::Sr,
        BinaryOp::Eq => Op::IsEqual,
        BinaryOp::NotEq => Op::IsNotEqual,
        BinaryOp::Identical => Op::IsIdentical,
        BinaryOp::NotIdentical => Op::IsNotIdentical,
        BinaryOp::Lt => Op::IsSmaller,
        BinaryOp::Lte => Op::IsSmallerOrEqual,
        BinaryOp::Gt => Op::IsGreater,
        BinaryOp::Gte => Op::IsGreaterOrEqual,
        BinaryOp::Spaceship => Op::Spaceship,
        BinaryOp::And | BinaryOp::Or => unreachable!("short-circuit ops handled separately"),
    }
}
