/*!
  Configuration for the engine and assembler.

  The toolchain has one instruction set. The older, simpler variants of it are expressed as
  `Profile`s: a choice of how `ADD`/`SUB` read their second operand, what `DIV` does with a
  zero divisor, and whether `LOAD`/`STORE` exist. The assembler and engine must be given the
  same profile for their encodings to agree.
*/

use strum_macros::{Display as StrumDisplay, EnumString};

use crate::bytecode::Opcode;

/// How `ADD` and `SUB` find their second operand.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum OperandMode {
  /// `reg2 == R7` selects the immediate field; any other `reg2` names a register.
  RegisterOrImmediate,
  /// The immediate field is always the second operand and `reg2` is ignored.
  ImmediateOnly,
}

/// What the engine does when `DIV` is given a zero divisor.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum DivideByZero {
  /// Stop the machine with `Fault::DivideByZero`.
  Halt,
  /// Write the ALU's result (zero, with the overflow flag set) and continue.
  Flag,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct Profile {
  pub operand_mode   : OperandMode,
  pub divide_by_zero : DivideByZero,
  /// Whether `LOAD` and `STORE` are part of the instruction set.
  pub memory_io      : bool,
}

impl Profile {
  /// Register-or-immediate `ADD`/`SUB`, fatal division by zero, and memory I/O.
  pub const CANONICAL: Profile = Profile {
    operand_mode   : OperandMode::RegisterOrImmediate,
    divide_by_zero : DivideByZero::Halt,
    memory_io      : true,
  };

  /// Immediate-only `ADD`/`SUB`, fatal division by zero, no memory I/O.
  pub const BASIC: Profile = Profile {
    operand_mode   : OperandMode::ImmediateOnly,
    divide_by_zero : DivideByZero::Halt,
    memory_io      : false,
  };

  pub fn supports(&self, opcode: Opcode) -> bool {
    match opcode {
      Opcode::Load | Opcode::Store => self.memory_io,
      _                            => true
    }
  }
}

impl Default for Profile {
  fn default() -> Self {
    Profile::CANONICAL
  }
}

/// Named profiles, as accepted on the command line.
#[derive(StrumDisplay, EnumString, Copy, Clone, Eq, PartialEq, Debug, Hash)]
#[strum(serialize_all = "lowercase")]
pub enum ProfileName {
  Canonical,
  Basic,
}

impl From<ProfileName> for Profile {
  fn from(name: ProfileName) -> Self {
    match name {
      ProfileName::Canonical => Profile::CANONICAL,
      ProfileName::Basic     => Profile::BASIC,
    }
  }
}

/// Everything the engine needs besides the program itself.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct EngineConfig {
  pub profile      : Profile,
  /// The most instructions a run may execute before it is stopped as incomplete.
  pub cycle_budget : u64,
}

impl EngineConfig {
  pub fn new(profile: Profile, cycle_budget: u64) -> EngineConfig {
    EngineConfig { profile, cycle_budget }
  }

  pub fn with_divide_by_zero(mut self, policy: DivideByZero) -> EngineConfig {
    self.profile.divide_by_zero = policy;
    self
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use std::str::FromStr;

  #[test]
  fn profile_names_parse() {
    assert_eq!(ProfileName::from_str("basic"), Ok(ProfileName::Basic));
    assert_eq!(Profile::from(ProfileName::Canonical), Profile::CANONICAL);
    assert!(ProfileName::from_str("turbo").is_err());
  }

  #[test]
  fn basic_profile_lacks_memory_io() {
    assert!(!Profile::BASIC.supports(Opcode::Store));
    assert!(Profile::BASIC.supports(Opcode::Div));
    assert!(Profile::CANONICAL.supports(Opcode::Load));
  }
}
