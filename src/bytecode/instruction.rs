use std::convert::TryFrom;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use strum_macros::{Display as StrumDisplay, EnumIter, EnumString, IntoStaticStr};
use num_enum::{TryFromPrimitive, IntoPrimitive};

use crate::address::Register;
use crate::bytecode::binary::{decode, encode, Word};

/**
  Opcodes of the virtual machine.

  The discriminant of each variant is its 4 bit opcode, so the order the opcodes are listed
  below is significant. Opcode 15 is unassigned. `Load` and `Store` exist only in profiles
  that provide memory I/O.
*/
#[derive(
  StrumDisplay, IntoStaticStr, EnumString, EnumIter, TryFromPrimitive, IntoPrimitive,
  Clone,        Copy,          Eq,         PartialEq, Debug,           Hash
)]
#[strum(serialize_all = "UPPERCASE")]
#[repr(u8)]
pub enum Opcode {
  Nop,    // nop
  Mov,    // mov( reg, value )
  Add,    // add( reg, reg | value )
  Sub,    // sub( reg, reg | value )
  And,    // and( reg, reg )
  Or,     // or( reg, reg )
  Mul,    // mul( reg, reg )
  Div,    // div( reg, reg )
  Jmp,    // jmp( value )
  Jz,     // jz( value )
  Call,   // call( value )
  Ret,    // ret
  Halt,   // halt
  Load,   // load( reg, reg )
  Store,  // store( reg, reg )
}

/// The operands an opcode takes in assembly.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum OperandShape {
  /// `NOP`, `RET`, `HALT`
  Nullary,
  /// A destination register and an immediate or label. `ADD`/`SUB` may also take a register
  /// as the second operand, depending on the operand mode.
  RegisterValue,
  /// Two registers.
  RegisterRegister,
  /// An immediate or label alone, used as a code address.
  Target,
}

impl Opcode {
  pub fn code(&self) -> u8 {
    Into::<u8>::into(*self)
  }

  /// Case-insensitive mnemonic lookup.
  pub fn from_mnemonic(mnemonic: &str) -> Option<Opcode> {
    Opcode::from_str(&mnemonic.to_ascii_uppercase()).ok()
  }

  pub fn shape(&self) -> OperandShape {
    match self {
      Opcode::Nop | Opcode::Ret | Opcode::Halt => OperandShape::Nullary,

      Opcode::Mov | Opcode::Add | Opcode::Sub  => OperandShape::RegisterValue,

      | Opcode::And
      | Opcode::Or
      | Opcode::Mul
      | Opcode::Div
      | Opcode::Load
      | Opcode::Store                          => OperandShape::RegisterRegister,

      Opcode::Jmp | Opcode::Jz | Opcode::Call  => OperandShape::Target,
    }
  }

  pub fn arity(&self) -> usize {
    match self.shape() {
      OperandShape::Nullary          => 0,
      OperandShape::Target           => 1,
      OperandShape::RegisterValue
      | OperandShape::RegisterRegister => 2,
    }
  }
}

/// Holds the decoded components of an instruction word.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Instruction {
  pub opcode : Opcode,
  pub reg1   : Register,
  pub reg2   : Register,
  pub imm    : u8
}

impl Instruction {
  pub fn new(opcode: Opcode, reg1: Register, reg2: Register, imm: u8) -> Instruction {
    Instruction { opcode, reg1, reg2, imm: imm & 0x3F }
  }

  /// Decodes a word. Returns `None` only for the unassigned opcode.
  pub fn try_decode(word: Word) -> Option<Instruction> {
    let fields = decode(word);
    let opcode = Opcode::try_from(fields.opcode).ok()?;

    Some(Instruction {
      opcode,
      reg1 : Register::from_field(fields.reg1),
      reg2 : Register::from_field(fields.reg2),
      imm  : fields.imm
    })
  }

  pub fn encode(&self) -> Word {
    encode(self.opcode.code(), self.reg1.code(), self.reg2.code(), self.imm)
  }

  /// True if an `ADD`/`SUB` in register-or-immediate mode reads its second operand from
  /// the immediate field.
  pub fn selects_immediate(&self) -> bool {
    self.reg2 == Register::IMMEDIATE_SELECTOR
  }
}

impl Display for Instruction {
  /// Disassembly, reading `ADD`/`SUB` in register-or-immediate mode.
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let Instruction { opcode, reg1, reg2, imm } = self;

    match opcode.shape() {

      OperandShape::Nullary => {
        write!(f, "{}", opcode)
      }

      OperandShape::RegisterValue if *opcode == Opcode::Mov || self.selects_immediate() => {
        write!(f, "{} {}, {}", opcode, reg1, imm)
      }

      OperandShape::RegisterValue | OperandShape::RegisterRegister => {
        write!(f, "{} {}, {}", opcode, reg1, reg2)
      }

      OperandShape::Target => {
        write!(f, "{} {}", opcode, imm)
      }

    }
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use strum::IntoEnumIterator;

  fn reg(index: u8) -> Register {
    Register::new(index).unwrap()
  }

  #[test]
  fn opcode_numbers_follow_the_table() {
    let mnemonics: Vec<String> = Opcode::iter().map(|op| op.to_string()).collect();
    assert_eq!(
      mnemonics,
      vec![
        "NOP", "MOV", "ADD", "SUB", "AND", "OR", "MUL", "DIV",
        "JMP", "JZ", "CALL", "RET", "HALT", "LOAD", "STORE"
      ]
    );
    assert_eq!(Opcode::Halt.code(), 12);
    assert_eq!(Opcode::try_from(14u8).ok(), Some(Opcode::Store));
    assert!(Opcode::try_from(15u8).is_err());
  }

  #[test]
  fn mnemonic_lookup_ignores_case() {
    assert_eq!(Opcode::from_mnemonic("call"), Some(Opcode::Call));
    assert_eq!(Opcode::from_mnemonic("HaLt"), Some(Opcode::Halt));
    assert_eq!(Opcode::from_mnemonic("PUSH"), None);
  }

  #[test]
  fn decode_rejects_only_the_unassigned_opcode() {
    assert_eq!(Instruction::try_decode(0xF000), None);
    let instruction = Instruction::try_decode(0x25C1).unwrap();
    assert_eq!(instruction, Instruction::new(Opcode::Add, reg(2), reg(7), 1));
    assert_eq!(instruction.encode(), 0x25C1);
  }

  #[test]
  fn disassembly() {
    assert_eq!(Instruction::new(Opcode::Add, reg(2), reg(7), 1).to_string(), "ADD R2, 1");
    assert_eq!(Instruction::new(Opcode::Add, reg(4), reg(2), 0).to_string(), "ADD R4, R2");
    assert_eq!(Instruction::new(Opcode::Mov, reg(3), reg(0), 10).to_string(), "MOV R3, 10");
    assert_eq!(Instruction::new(Opcode::Jz, reg(0), reg(0), 20).to_string(), "JZ 20");
    assert_eq!(Instruction::new(Opcode::Ret, reg(0), reg(0), 0).to_string(), "RET");
  }
}
