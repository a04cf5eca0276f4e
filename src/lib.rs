//! Single-pass compiler from Jack classes to Hack VM code.
//!
//! The lexer turns source text into tokens, and the compilation engine parses
//! them by recursive descent, resolving names through the symbol table and
//! writing VM instructions as each production is recognised. No syntax tree
//! is built in between.

mod common;
mod compiler;
pub mod engine;
pub mod lexer;
pub mod symbol_table;
pub mod vm_writer;

pub use common::{CompileError, CompileResult};
pub use compiler::{compile, compile_to};
