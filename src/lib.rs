//! Crate root: wires together the compilation pipeline.
//!
//! The stages are intentionally small and composable so they can be evolved
//! independently:
//! - `tokenizer` performs lexical analysis and produces a flat token stream.
//! - `codegen` parses that stream and emits stack-machine code in a single
//!   pass, with no syntax tree in between.
//! - `symtab` tracks declarations and lexical scope for the generator.
//! - `bytecode` holds the instruction model and the numeric opcode contract.
//! - `error` centralises the failure cases and their numeric codes.

pub mod bytecode;
pub mod error;
pub mod symtab;
pub mod tokenizer;

mod codegen;

pub use codegen::generate;
pub use error::{CompileError, CompileResult};

use bytecode::Instruction;

/// Compile PL/0 source text into stack-machine code.
pub fn compile(source: &str) -> CompileResult<Vec<Instruction>> {
  let tokens = tokenizer::tokenize(source)?;
  generate(&tokens)
}
