//! Instruction model for the target stack machine.
//!
//! The opcode numbers are the loader's contract; the listing format is one
//! instruction per line as four space-separated decimal integers `op r l m`.

use log::trace;
use std::{fmt, io};

/// Hard cap on the number of emitted instructions.
pub const MAX_CODE_LENGTH: usize = 1000;

/// Opcodes understood by the target machine.
///
/// The discriminants are the numeric encoding used in listings and by the
/// machine's loader; they must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
  /// Push an immediate value.
  Lit = 1,
  /// Load a variable from a frame slot.
  Lod = 2,
  /// Store into a variable's frame slot.
  Sto = 3,
  /// Call a procedure.
  Cal = 4,
  /// Jump when the top of stack is zero.
  Jpc = 5,
  /// Extend the current frame.
  Inc = 6,
  /// Unconditional jump.
  Jmp = 7,
  /// Return from a procedure.
  Rtn = 8,
  SioWrite = 9,
  SioRead = 10,
  SioHalt = 11,
  Neg = 12,
  Add = 13,
  Sub = 14,
  Mul = 15,
  Div = 16,
  Odd = 17,
  Eql = 18,
  Neq = 19,
  Lss = 20,
  Leq = 21,
  Gtr = 22,
  Geq = 23,
}

/// A single machine instruction: opcode, register, level, modifier.
///
/// The register field is reserved and always zero in generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
  pub op: Opcode,
  pub r: i64,
  pub l: i64,
  pub m: i64,
}

impl fmt::Display for Instruction {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{} {} {} {}", self.op as i64, self.r, self.l, self.m)
  }
}

/// Append-only instruction store with in-place patching of jump targets.
///
/// Indices are dense and assigned in emission order starting at 0, so a
/// recorded index stays valid for the lifetime of the store.
#[derive(Debug, Default)]
pub struct Emitter {
  code: Vec<Instruction>,
}

impl Emitter {
  pub fn new() -> Self {
    Self { code: Vec::new() }
  }

  /// Index the next emitted instruction will occupy.
  pub fn len(&self) -> usize {
    self.code.len()
  }

  pub fn is_empty(&self) -> bool {
    self.code.is_empty()
  }

  /// Append one instruction and return its index.
  ///
  /// # Panics
  ///
  /// Panics when the store already holds [`MAX_CODE_LENGTH`] instructions;
  /// the machine's loader cannot accept a longer program.
  pub fn emit(&mut self, op: Opcode, r: i64, l: i64, m: i64) -> usize {
    if self.code.len() == MAX_CODE_LENGTH {
      panic!("instruction store full ({MAX_CODE_LENGTH} instructions)");
    }
    let index = self.code.len();
    trace!("emit {index}: {op:?} {r} {l} {m}");
    self.code.push(Instruction { op, r, l, m });
    index
  }

  /// Rewrite the `m` field of an already-emitted instruction.
  pub fn patch(&mut self, index: usize, m: i64) {
    trace!("patch {index}: m <- {m}");
    self.code[index].m = m;
  }

  pub fn into_code(self) -> Vec<Instruction> {
    self.code
  }
}

/// Write a listing in the loader's plain-text format.
pub fn write_listing<W: io::Write>(code: &[Instruction], mut out: W) -> io::Result<()> {
  for instr in code {
    writeln!(out, "{instr}")?;
  }
  Ok(())
}
