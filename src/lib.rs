//! A bytecode compiler and virtual machine for a PHP-like dynamically-typed
//! scripting language (spec.md §1/§2). The lexer/parser are out of scope;
//! this crate consumes an already-built AST (`ast.rs`) and compiles
//! (`compiler/`) it to a closed bytecode instruction set (`opcode.rs`) that
//! `vm/` executes against a tagged-value runtime (`value/`) and a
//! case-insensitive symbol table (`registry/`).

pub mod ast;
pub mod cache;
pub mod compiler;
pub mod host;
pub mod logger;
pub mod opcode;
pub mod registry;
pub mod stdlib;
pub mod task;
pub mod value;
pub mod vm;
