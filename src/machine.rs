//! The state of the simulated machine: register file, memory, and control registers. The
//! engine is the only thing that mutates it.

use std::fmt::{Display, Formatter};

use prettytable::{format as TableFormat, Table};

use crate::address::{in_memory, Register, MEMORY_SIZE, REGISTER_COUNT, STACK_BASE};
use crate::alu::StatusFlags;
use crate::bytecode::{Instruction, Word};

/// Number of memory cells shown when the machine is displayed.
const MEMORY_DUMP_WORDS: usize = 32;

/// Linear word-addressed memory. Reads outside of memory give zero and writes outside of
/// memory are dropped; callers decide whether that deserves a diagnostic.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Memory {
  cells: Vec<Word>
}

impl Memory {
  pub fn new() -> Memory {
    Memory { cells: vec![0; MEMORY_SIZE] }
  }

  pub fn read(&self, address: Word) -> Word {
    self.cells.get(address as usize).copied().unwrap_or(0)
  }

  /// Returns whether the write landed.
  pub fn write(&mut self, address: Word, value: Word) -> bool {
    match self.cells.get_mut(address as usize) {
      Some(cell) => {
        *cell = value;
        true
      }
      None => false
    }
  }

  pub fn as_slice(&self) -> &[Word] {
    &self.cells
  }

  pub fn len(&self) -> usize {
    self.cells.len()
  }
}

impl Default for Memory {
  fn default() -> Self {
    Memory::new()
  }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct MachineState {
  /// General purpose registers `R0`..`R7`
  pub registers  : [Word; REGISTER_COUNT],
  pub memory     : Memory,
  /// Stack Pointer, the address of the next free stack slot. The stack grows down.
  pub sp         : Word,
  /// Instruction Pointer, the address of the next fetch.
  pub ip         : Word,
  /// Instruction Register, the last word fetched.
  pub ir         : Word,
  /// Status flags latched from the last flag-setting instruction.
  pub flags      : StatusFlags,
  pub running    : bool,
  /// Number of `CALL`s without a matching `RET`. Diagnostic only.
  pub call_depth : Word,
}

impl MachineState {

  // region Display methods

  fn make_register_table<T>(name: char, registers: &[T], highlight: Option<usize>, start: usize)
    -> Table
    where T: Display
  {
    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Address", ubl->"Contents"]);

    for (i, cell) in registers.iter().enumerate() {
      match Some(i) == highlight {

        true  => {
          table.add_row(
            row![r->format!("* --> {}[{}] =", name, i + start), format!("{}", cell)]
          );
        }

        false => {
          table.add_row(
            row![r->format!("{}[{}] =", name, i + start), format!("{}", cell)]
          );
        }

      } // end match on highlight
    } // end for
    table
  }

  fn make_control_table(&self) -> Table {
    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Register", ubl->"Contents"]);

    let decoded = match Instruction::try_decode(self.ir) {
      Some(instruction) => instruction.to_string(),
      None              => "illegal".to_string()
    };

    table.add_row(row![r->"SP =", self.sp]);
    table.add_row(row![r->"IP =", self.ip]);
    table.add_row(row![r->"IR =", format!("0x{:04X} {}", self.ir, decoded)]);
    table.add_row(row![r->"Flags", self.flags]);
    table.add_row(row![r->"Depth", self.call_depth]);
    table
  }

  // endregion

  pub fn new() -> MachineState {
    MachineState {
      registers  : [0; REGISTER_COUNT],
      memory     : Memory::new(),
      sp         : STACK_BASE,
      ip         : 0,
      ir         : 0,
      flags      : StatusFlags::default(),
      running    : false,
      call_depth : 0,
    }
  }

  pub fn register(&self, register: Register) -> Word {
    self.registers[register.idx()]
  }

  pub fn set_register(&mut self, register: Register, value: Word) {
    self.registers[register.idx()] = value;
  }

  /// The words currently on the call stack, innermost last.
  pub fn stack(&self) -> &[Word] {
    match in_memory(self.sp) && self.sp < STACK_BASE {
      true  => &self.memory.as_slice()[self.sp as usize + 1..=STACK_BASE as usize],
      false => &[]
    }
  }
}

impl Default for MachineState {
  fn default() -> Self {
    MachineState::new()
  }
}


lazy_static! {
  static ref TABLE_DISPLAY_FORMAT: TableFormat::TableFormat =
    TableFormat::FormatBuilder::new()
      .column_separator('│')
      .borders(' ')
      .separator(
        TableFormat::LinePosition::Title,
        TableFormat::LineSeparator::new('─', '┼', ' ', ' ')
      )
      .separator(
        TableFormat::LinePosition::Bottom,
        TableFormat::LineSeparator::new('─', '┴', ' ', ' ')
      )
      .padding(1, 1)
      .build();
}

impl Display for MachineState {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let dump_end = MEMORY_DUMP_WORDS.min(self.memory.len());
    let dump: Vec<String> =
      self.memory.as_slice()[..dump_end]
          .iter()
          .map(|word| format!("0x{:04X}", word))
          .collect();

    // The highlighted cell is the next instruction to execute.
    let r_table = MachineState::make_register_table('R', &self.registers, None, 0);
    let c_table = self.make_control_table();
    let m_table = MachineState::make_register_table('M', &dump, Some(self.ip as usize), 0);

    let mut combined_table = table!([r_table, c_table, m_table]);

    combined_table.set_titles(row![ub->"Registers", ub->"Control", ub->"Memory"]);
    combined_table.set_format(*TABLE_DISPLAY_FORMAT);

    let state = match self.running {
      true  => "Running.",
      false => "Halted."
    };

    write!(f, "{}\n{}", state, combined_table)
  }
}
