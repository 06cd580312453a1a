//! Compile-time errors (spec.md §4.4 "Failure semantics"): compilation
//! either succeeds with a `CompiledUnit` or fails with an accumulated list
//! of `(kind, position, message)` triples. Grounded on the teacher's
//! `compiler/error.rs` `CompilerError`, which likewise never panics and
//! instead returns a structured error value from a fallible compile step.

use crate::ast::Position;
use std::fmt::{self, Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileErrorKind {
    UndeclaredVariable,
    InvalidRedeclaration,
    BreakOutsideLoop,
    ContinueOutsideLoop,
    ReturnOutsideFunction,
    UnknownMagicConstantContext,
    InvalidAssignmentTarget,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    pub kind: CompileErrorKind,
    pub position: Position,
    pub message: String,
}

impl CompileError {
    pub fn new(kind: CompileErrorKind, position: Position, message: impl Into<String>) -> Self {
        CompileError { kind, position, message: message.into() }
    }
}

impl Display for CompileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} at line {}: {}", self.kind, self.position.line, self.message)
    }
}

impl std::error::Error for CompileError {}

/// Accumulates every error found during one `Compiler::compile` call; no
/// `CompiledUnit` is produced if this is non-empty when compilation ends.
#[derive(Debug, Default)]
pub struct CompileErrors(pub Vec<CompileError>);

impl CompileErrors {
    pub fn push(&mut self, err: CompileError) {
        self.0.push(err);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for CompileErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for err in &self.0 {
            writeln!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CompileErrors {}
