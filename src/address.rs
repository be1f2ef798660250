//! Register names and the fixed layout of the machine's address space, with some convenience
//! functions.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use thiserror::Error;

use crate::bytecode::Word;

/// Number of general purpose registers, `R0` through `R7`.
pub const REGISTER_COUNT: usize = 8;

/// Number of words of linear memory. Code, data, the call stack, and the output port all
/// share this one address space.
pub const MEMORY_SIZE: usize = 400;

/// The stack pointer's value on an empty stack. The stack grows downward from here.
pub const STACK_BASE: Word = (MEMORY_SIZE - 1) as Word;

/// Writing to this address emits one character.
pub const CHAR_OUT_PORT: Word = 32;

/**
  A register index in `0..REGISTER_COUNT`. A `Register` can only be constructed in range, so
  indexing the register file with one never panics.
*/
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Default)]
pub struct Register(u8);

impl Register {
  /// In the register-or-immediate operand mode, `R7` in the second register field of
  /// `ADD`/`SUB` selects the immediate field instead of a register.
  pub const IMMEDIATE_SELECTOR: Register = Register(7);

  pub fn new(index: u8) -> Option<Register> {
    match (index as usize) < REGISTER_COUNT {
      true  => Some(Register(index)),
      false => None
    }
  }

  /// Builds a register from a raw instruction field, masking it to three bits.
  pub fn from_field(field: u8) -> Register {
    Register(field & 0x7)
  }

  /// Converts the register to an index into the register file.
  pub fn idx(&self) -> usize {
    self.0 as usize
  }

  pub fn code(&self) -> u8 {
    self.0
  }
}

impl Display for Register {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "R{}", self.0)
  }
}

#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("`{0}` is not a register (expected R0 through R7)")]
pub struct ParseRegisterError(pub String);

impl FromStr for Register {
  type Err = ParseRegisterError;

  /// Accepts `R0`..`R7` with either case of prefix.
  fn from_str(text: &str) -> Result<Self, Self::Err> {
    let digits = text
      .strip_prefix('R')
      .or_else(|| text.strip_prefix('r'))
      .ok_or_else(|| ParseRegisterError(text.to_string()))?;

    digits
      .parse::<u8>()
      .ok()
      .and_then(Register::new)
      .ok_or_else(|| ParseRegisterError(text.to_string()))
  }
}

/// True if `address` names a cell of memory.
pub fn in_memory(address: Word) -> bool {
  (address as usize) < MEMORY_SIZE
}
