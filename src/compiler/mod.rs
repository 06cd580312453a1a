//! AST → bytecode lowering (spec.md §4.4), grounded on the teacher's
//! `CompilationScope` (index/buffer bookkeeping, `compiler/bytecode.rs`) and
//! `compiler/error.rs` (accumulated, non-panicking compile errors).

mod error;
mod lower_expr;
mod lower_stmt;
mod scope;

pub use error::{CompileError, CompileErrorKind, CompileErrors};
pub use scope::FunctionScope;

use crate::ast::{Param, Stmt};
use crate::opcode::Instruction;
use crate::registry::{ClassDescriptor, InterfaceDescriptor, TraitDescriptor};
use crate::value::Value;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct TryRegion {
    pub start: usize,
    pub end: usize,
    /// `(catch class names, catch start pc)`, tried in declaration order.
    pub catches: Vec<(Vec<String>, usize)>,
    pub finally: Option<usize>,
    /// First pc after the finally block, used by the VM to fire a deferred
    /// rethrow once an unmatched exception's finally has run to completion.
    pub finally_end: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct CompiledFunction {
    pub name: String,
    pub instructions: Vec<Instruction>,
    pub params: Vec<Param>,
    pub local_slots: indexmap::IndexMap<String, u32>,
    pub max_local_slot: u32,
    pub variadic: bool,
    pub is_generator: bool,
    pub by_ref_return: bool,
    pub try_regions: Vec<TryRegion>,
}

#[derive(Debug, Default)]
pub struct CompiledUnit {
    pub source_file: String,
    pub instructions: Vec<Instruction>,
    pub constants: Vec<Value>,
    pub functions: Vec<CompiledFunction>,
    pub classes: HashMap<String, ClassDescriptor>,
    pub interfaces: HashMap<String, InterfaceDescriptor>,
    pub traits: HashMap<String, TraitDescriptor>,
    pub top_level_try_regions: Vec<TryRegion>,
    pub top_level_max_slot: u32,
    pub top_level_slots: indexmap::IndexMap<String, u32>,
}

/// Compiles one top-level program (spec.md §4.4's "Input"/"Output").
pub struct Compiler {
    source_file: String,
}

impl Compiler {
    pub fn new(source_file: impl Into<String>) -> Self {
        Compiler { source_file: source_file.into() }
    }

    pub fn compile(&self, program: &[Stmt]) -> Result<CompiledUnit, CompileErrors> {
        let mut errors = CompileErrors::default();
        let mut builder = lower_stmt::ProgramBuilder::new(&self.source_file);
        builder.lower_program(program, &mut errors);
        let unit = builder.finish(self.source_file.clone());

        if errors.is_empty() {
            Ok(unit)
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOp, Expr, Stmt};

    #[test]
    fn compiles_simple_arithmetic_echo() {
        let program = vec![Stmt::Echo(vec![Expr::binary(
            BinaryOp::Add,
            Expr::int(2),
            Expr::binary(BinaryOp::Mul, Expr::int(3), Expr::int(4)),
        )])];
        let compiler = Compiler::new("<test>");
        let unit = compiler.compile(&program).expect("compiles");
        assert!(!unit.instructions.is_empty());
    }

    #[test]
    fn undeclared_variable_use_is_allowed_and_yields_null() {
        // the source language does not require declaration before use;
        // referencing an undefined variable is a runtime notice, not a
        // compile error.
        let program = vec![Stmt::Echo(vec![Expr::var("x")])];
        let compiler = Compiler::new("<test>");
        assert!(compiler.compile(&program).is_ok());
    }
}
