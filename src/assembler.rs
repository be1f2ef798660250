/*!
  The two-pass assembler.

  The first pass walks the source recording the instruction index of every label. The second
  pass encodes each instruction line, resolving label operands through the table built by the
  first. Both passes thread an explicit `AsmContext` through, so nothing outlives a single
  assembly and independent assemblies share no state.

  No error stops an assembly. A line with a problem is reported and skipped, and the full batch
  of errors is available once both passes are done. Note that labels are assigned addresses
  by counting every instruction line in the first pass, so the addresses in a program with
  skipped lines are not meaningful. `Assembly::into_result` refuses such a program.
*/

use std::fmt::Write;

use crate::address::Register;
use crate::bytecode::assembly::{
  is_valid_label,
  parse_operand,
  parse_statement,
  split_line,
  Operand,
  OperandError,
  Statement
};
use crate::bytecode::{Instruction, Opcode, OperandShape, Word, MAX_IMMEDIATE};
use crate::config::{OperandMode, Profile};
use crate::error::{AssemblyError, AssemblyErrors};
use crate::program::{Program, SourceLine};
use crate::symboltable::SymbolTable;

/// Everything one assembly accumulates.
#[derive(Clone, Debug)]
pub struct AsmContext {
  pub profile : Profile,
  /// Label definitions from the first pass.
  pub symbols : SymbolTable,
  /// Encoded instructions from the second pass.
  pub program : Program,
  pub errors  : Vec<AssemblyError>,
}

impl AsmContext {
  pub fn new(profile: Profile) -> AsmContext {
    AsmContext {
      profile,
      symbols : SymbolTable::new(),
      program : Program::new(),
      errors  : Vec::new(),
    }
  }
}

/// The result of assembling a source text.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Assembly {
  pub program     : Program,
  /// Every problem found, ordered by line.
  pub errors      : Vec<AssemblyError>,
  pub label_count : usize,
}

impl Assembly {
  pub fn is_ok(&self) -> bool {
    self.errors.is_empty()
  }

  /// The number of instructions that were encoded.
  pub fn instruction_count(&self) -> usize {
    self.program.len()
  }

  /// The program, if the source assembled without a single error.
  pub fn into_result(self) -> Result<Program, AssemblyErrors> {
    match self.errors.is_empty() {
      true  => Ok(self.program),
      false => Err(AssemblyErrors(self.errors))
    }
  }
}

/// First pass: assigns each label the index of the next instruction.
pub fn collect_labels(source: &str, mut ctx: AsmContext) -> AsmContext {
  let mut instruction_count: usize = 0;

  for (index, raw) in source.lines().enumerate() {
    let line  = index + 1;
    let parts = split_line(raw);

    if let Some(label) = parts.label {
      if !is_valid_label(label) {
        ctx.errors.push(AssemblyError::InvalidLabel { line, label: label.to_string() });
      } else if let Err(first_line) = ctx.symbols.insert(label, instruction_count as Word, line) {
        ctx.errors.push(
          AssemblyError::DuplicateLabel { line, label: label.to_string(), first_line }
        );
      }
    }

    if !parts.body.is_empty() {
      instruction_count += 1;
    }
  }

  log::debug!("pass 1: {} labels over {} instructions", ctx.symbols.len(), instruction_count);
  ctx
}

/// Second pass: encodes every instruction line, skipping and reporting lines it cannot encode.
pub fn generate_code(source: &str, mut ctx: AsmContext) -> AsmContext {
  for (index, raw) in source.lines().enumerate() {
    let line = index + 1;
    let statement = match parse_statement(split_line(raw).body) {
      Some(statement) => statement,
      None            => continue
    };

    match encode_statement(&statement, line, &ctx) {
      Ok(instruction) => {
        log::trace!("line {}: {} => 0x{:04X}", line, instruction, instruction.encode());
        ctx.program.push(
          instruction.encode(),
          Some(SourceLine { number: line, text: raw.to_string() })
        );
      }
      Err(error) => ctx.errors.push(error)
    }
  }

  log::debug!("pass 2: encoded {} instructions", ctx.program.len());
  ctx
}

/// Assembles `source` in two passes.
pub fn assemble(source: &str, profile: Profile) -> Assembly {
  let ctx = collect_labels(source, AsmContext::new(profile));
  let mut ctx = generate_code(source, ctx);

  // Pass 1 and pass 2 errors interleave by line. The sort is stable, so errors on one line
  // keep the order they were found in.
  ctx.errors.sort_by_key(AssemblyError::line);

  for error in &ctx.errors {
    log::debug!("{}", error);
  }

  Assembly {
    program     : ctx.program,
    errors      : ctx.errors,
    label_count : ctx.symbols.len(),
  }
}

fn encode_statement(statement: &Statement, line: usize, ctx: &AsmContext)
  -> Result<Instruction, AssemblyError>
{
  let opcode = Opcode::from_mnemonic(statement.mnemonic).ok_or_else(
    || AssemblyError::UnknownMnemonic { line, mnemonic: statement.mnemonic.to_string() }
  )?;

  if !ctx.profile.supports(opcode) {
    return Err(AssemblyError::UnsupportedInstruction { line, opcode });
  }

  let operands = &statement.operands;
  if operands.len() != opcode.arity() {
    return Err(
      AssemblyError::WrongArity {
        line,
        opcode,
        expected : opcode.arity(),
        found    : operands.len()
      }
    );
  }

  let unused = Register::default();

  match opcode.shape() {

    OperandShape::Nullary => Ok(Instruction::new(opcode, unused, unused, 0)),

    OperandShape::Target => {
      let target = expect_value(operands[0], line, &ctx.symbols)?;
      Ok(Instruction::new(opcode, unused, unused, target))
    }

    OperandShape::RegisterRegister => {
      let reg1 = expect_register(operands[0], line)?;
      let reg2 = expect_register(operands[1], line)?;
      Ok(Instruction::new(opcode, reg1, reg2, 0))
    }

    OperandShape::RegisterValue => {
      let reg1 = expect_register(operands[0], line)?;

      let register_or_immediate =
        opcode != Opcode::Mov && ctx.profile.operand_mode == OperandMode::RegisterOrImmediate;

      match register_or_immediate {

        false => {
          let value = expect_value(operands[1], line, &ctx.symbols)?;
          Ok(Instruction::new(opcode, reg1, unused, value))
        }

        true => {
          match parse_operand(operands[1]) {
            Ok(Operand::Register(reg2)) if reg2 == Register::IMMEDIATE_SELECTOR => {
              Err(AssemblyError::ReservedRegister { line, opcode })
            }
            Ok(Operand::Register(reg2)) => Ok(Instruction::new(opcode, reg1, reg2, 0)),
            Ok(operand) => {
              let value = resolve_value(operand, operands[1], line, &ctx.symbols)?;
              Ok(Instruction::new(opcode, reg1, Register::IMMEDIATE_SELECTOR, value))
            }
            Err(error) => Err(operand_error(error, operands[1], line))
          }
        }

      } // end match on operand mode
    }

  }
}

fn operand_error(error: OperandError, token: &str, line: usize) -> AssemblyError {
  match error {
    OperandError::NoSuchRegister   => AssemblyError::ExpectedRegister { line, operand: token.to_string() },
    OperandError::MalformedLiteral => AssemblyError::InvalidLiteral { line, operand: token.to_string() },
  }
}

fn expect_register(token: &str, line: usize) -> Result<Register, AssemblyError> {
  match parse_operand(token) {
    Ok(Operand::Register(register)) => Ok(register),
    _ => Err(AssemblyError::ExpectedRegister { line, operand: token.to_string() })
  }
}

fn expect_value(token: &str, line: usize, symbols: &SymbolTable) -> Result<u8, AssemblyError> {
  match parse_operand(token) {
    Ok(operand) => resolve_value(operand, token, line, symbols),
    Err(OperandError::NoSuchRegister) => {
      Err(AssemblyError::ExpectedValue { line, operand: token.to_string() })
    }
    Err(error) => Err(operand_error(error, token, line))
  }
}

/// Turns a literal or label into an immediate field.
fn resolve_value(operand: Operand, token: &str, line: usize, symbols: &SymbolTable)
  -> Result<u8, AssemblyError>
{
  match operand {

    Operand::Literal(value) => Ok(mask_immediate(value, token, line)),

    Operand::Label(label) if !is_valid_label(label) => {
      Err(AssemblyError::InvalidLabel { line, label: label.to_string() })
    }

    Operand::Label(label) => {
      match symbols.get_address(label) {
        Some(address) => Ok(mask_immediate(address as i64, token, line)),
        None          => Err(AssemblyError::UndefinedLabel { line, label: label.to_string() })
      }
    }

    Operand::Register(_) => Err(AssemblyError::ExpectedValue { line, operand: token.to_string() })

  }
}

/// Keeps the low six bits of `value`. Negative values keep the low bits of their two's
/// complement.
fn mask_immediate(value: i64, token: &str, line: usize) -> u8 {
  let masked = (value & MAX_IMMEDIATE as i64) as u8;
  if masked as i64 != value {
    log::warn!("line {}: `{}` does not fit in 6 bits and was encoded as {}", line, token, masked);
  }
  masked
}

/// Formats an assembly error with the offending source line beneath it.
pub fn render_diagnostic(file: &str, source: &str, error: &AssemblyError) -> String {
  let line = error.line();
  let mut diagnostic = String::new();

  let _ = writeln!(diagnostic, "error: {}", error);
  let _ = writeln!(diagnostic, " --> {}:{}", file, line);
  if let Some(text) = source.lines().nth(line.saturating_sub(1)) {
    let _ = writeln!(diagnostic, "  |");
    let _ = writeln!(diagnostic, "{:>4} | {}", line, text.trim_end_matches('\r'));
  }

  diagnostic
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::bytecode::encode;

  fn words(source: &str) -> Vec<Word> {
    let assembly = assemble(source, Profile::CANONICAL);
    assert!(assembly.is_ok(), "unexpected errors: {:?}", assembly.errors);
    assembly.program.words().to_vec()
  }

  fn errors(source: &str, profile: Profile) -> Vec<AssemblyError> {
    assemble(source, profile).errors
  }

  #[test]
  fn operand_forms_encode() {
    let source = "
      MOV R1, 7
      ADD R2, 1
      ADD R4, R2
      SUB r3, -1
      MUL R1, R2
      STORE R0, R7
      JMP 4
      HALT
    ";
    assert_eq!(
      words(source),
      vec![
        encode(1, 1, 0, 7),
        0x25C1,
        encode(2, 4, 2, 0),
        encode(3, 3, 7, 63),
        encode(6, 1, 2, 0),
        encode(14, 0, 7, 0),
        encode(8, 0, 0, 4),
        0xC000,
      ]
    );
  }

  #[test]
  fn labels_resolve_forward_and_backward() {
    let source = "
      start:  JMP end       ; forward
              NOP
      middle:
      end:    JZ start      ; backward
              CALL middle
    ";
    let assembly = assemble(source, Profile::CANONICAL);
    assert!(assembly.is_ok());
    assert_eq!(assembly.label_count, 3);
    assert_eq!(
      assembly.program.words(),
      &[encode(8, 0, 0, 2), 0x0000, encode(9, 0, 0, 0), encode(10, 0, 0, 2)]
    );
  }

  #[test]
  fn assembly_is_deterministic() {
    let source = include_str!("../demos/fibonacci.asm");
    let first  = assemble(source, Profile::CANONICAL);
    let second = assemble(source, Profile::CANONICAL);
    assert_eq!(first.program.to_bytes(), second.program.to_bytes());
    assert_eq!(first.program.listing(), second.program.listing());
  }

  #[test]
  fn basic_profile_always_encodes_an_immediate() {
    let assembly = assemble("ADD R2, 3\nSUB R1, 1", Profile::BASIC);
    assert_eq!(assembly.program.words(), &[encode(2, 2, 0, 3), encode(3, 1, 0, 1)]);
    assert_eq!(
      errors("ADD R2, R3", Profile::BASIC),
      vec![AssemblyError::ExpectedValue { line: 1, operand: "R3".to_string() }]
    );
  }

  #[test]
  fn out_of_range_values_are_masked() {
    assert_eq!(words("MOV R0, 64\nMOV R0, -1"), vec![encode(1, 0, 0, 0), encode(1, 0, 0, 63)]);
  }

  #[test]
  fn errors_are_reported_and_lines_skipped() {
    let source = "
      FOO R1
      MOV R1
      JMP nowhere
      ADD R1, R7
      AND R1, 5
      MOV R9, 1
      MOV R1, 1x
      HALT
    ";
    let assembly = assemble(source, Profile::CANONICAL);
    assert_eq!(
      assembly.errors,
      vec![
        AssemblyError::UnknownMnemonic { line: 2, mnemonic: "FOO".to_string() },
        AssemblyError::WrongArity { line: 3, opcode: Opcode::Mov, expected: 2, found: 1 },
        AssemblyError::UndefinedLabel { line: 4, label: "nowhere".to_string() },
        AssemblyError::ReservedRegister { line: 5, opcode: Opcode::Add },
        AssemblyError::ExpectedRegister { line: 6, operand: "5".to_string() },
        AssemblyError::ExpectedRegister { line: 7, operand: "R9".to_string() },
        AssemblyError::InvalidLiteral { line: 8, operand: "1x".to_string() },
      ]
    );
    assert_eq!(assembly.instruction_count(), 1);
    assert!(assembly.into_result().is_err());
  }

  #[test]
  fn duplicate_and_invalid_labels() {
    let source = "a: NOP\na: NOP\n9lives: HALT\nJMP a";
    let assembly = assemble(source, Profile::CANONICAL);
    assert_eq!(
      assembly.errors,
      vec![
        AssemblyError::DuplicateLabel { line: 2, label: "a".to_string(), first_line: 1 },
        AssemblyError::InvalidLabel { line: 3, label: "9lives".to_string() },
      ]
    );
    // The first definition wins.
    assert_eq!(assembly.program.words()[3], encode(8, 0, 0, 0));
  }

  #[test]
  fn memory_io_depends_on_profile() {
    assert_eq!(
      errors("LOAD R1, R2", Profile::BASIC),
      vec![AssemblyError::UnsupportedInstruction { line: 1, opcode: Opcode::Load }]
    );
    assert!(errors("LOAD R1, R2", Profile::CANONICAL).is_empty());
  }

  #[test]
  fn listing_keeps_source_lines() {
    let program = assemble("loop: ADD R2, 1 ; step\nJMP loop", Profile::CANONICAL)
      .into_result()
      .unwrap();
    assert_eq!(program.origin(0).unwrap().number, 1);
    assert!(program.listing().contains("0x25C1  ; [0] loop: ADD R2, 1 ; step"));
  }

  #[test]
  fn diagnostic_quotes_the_line() {
    let source = "NOP\nBOGUS\n";
    let error = &assemble(source, Profile::CANONICAL).errors[0];
    let diagnostic = render_diagnostic("test.asm", source, error);
    assert!(diagnostic.contains(" --> test.asm:2"));
    assert!(diagnostic.contains("   2 | BOGUS"));
  }
}
