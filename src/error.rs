//! Error types for assembly, loading, and execution.

use thiserror::Error;

use crate::bytecode::{Opcode, Word};

/// A problem with one line of assembly. None of these abort an assembly; they accumulate
/// and are reported together once both passes are done.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum AssemblyError {
  #[error("line {line}: unknown instruction `{mnemonic}`")]
  UnknownMnemonic { line: usize, mnemonic: String },

  #[error("line {line}: undefined label `{label}`")]
  UndefinedLabel { line: usize, label: String },

  #[error("line {line}: label `{label}` is already defined on line {first_line}")]
  DuplicateLabel { line: usize, label: String, first_line: usize },

  #[error("line {line}: `{label}` is not a valid label name")]
  InvalidLabel { line: usize, label: String },

  #[error("line {line}: {opcode} requires {expected} operand(s) but was given {found}")]
  WrongArity { line: usize, opcode: Opcode, expected: usize, found: usize },

  #[error("line {line}: expected a register (R0 through R7), found `{operand}`")]
  ExpectedRegister { line: usize, operand: String },

  #[error("line {line}: expected an immediate or label, found register `{operand}`")]
  ExpectedValue { line: usize, operand: String },

  #[error("line {line}: `{operand}` is not a decimal literal")]
  InvalidLiteral { line: usize, operand: String },

  #[error("line {line}: {opcode} cannot read R7, which selects the immediate operand")]
  ReservedRegister { line: usize, opcode: Opcode },

  #[error("line {line}: {opcode} is not available in this profile")]
  UnsupportedInstruction { line: usize, opcode: Opcode },
}

impl AssemblyError {
  pub fn line(&self) -> usize {
    match self {
      | AssemblyError::UnknownMnemonic { line, .. }
      | AssemblyError::UndefinedLabel { line, .. }
      | AssemblyError::DuplicateLabel { line, .. }
      | AssemblyError::InvalidLabel { line, .. }
      | AssemblyError::WrongArity { line, .. }
      | AssemblyError::ExpectedRegister { line, .. }
      | AssemblyError::ExpectedValue { line, .. }
      | AssemblyError::InvalidLiteral { line, .. }
      | AssemblyError::ReservedRegister { line, .. }
      | AssemblyError::UnsupportedInstruction { line, .. } => *line
    }
  }
}

/// The batch of errors from a rejected assembly, in source order.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("assembly failed with {} error(s):\n{}", .0.len(), error_lines(.0))]
pub struct AssemblyErrors(pub Vec<AssemblyError>);

fn error_lines(errors: &[AssemblyError]) -> String {
  errors
    .iter()
    .map(AssemblyError::to_string)
    .collect::<Vec<String>>()
    .join("\n")
}

/// A condition that stops the machine. `ip` is the address of the offending instruction.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum Fault {
  #[error("stack overflow at {ip}")]
  StackOverflow { ip: Word },

  #[error("stack underflow at {ip}")]
  StackUnderflow { ip: Word },

  #[error("division by zero at {ip}")]
  DivideByZero { ip: Word },

  #[error("illegal opcode {opcode} at {ip}")]
  IllegalOpcode { opcode: u8, ip: Word },

  #[error("instruction pointer {ip} is outside memory")]
  InstructionPointerOutOfRange { ip: Word },

  #[error("character output failed at {ip}: {reason}")]
  OutputFailed { ip: Word, reason: String },
}

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum LoadError {
  #[error("program of {words} words does not fit in {capacity} words of memory")]
  ProgramTooLarge { words: usize, capacity: usize },
}

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ImageError {
  #[error("binary image has {0} bytes, which is not a whole number of words")]
  OddLength(usize),
}
