/*!
  The fetch-decode-execute engine.

  An `Engine` owns one `MachineState` and steps it one instruction at a time until the machine
  halts, faults, or exhausts its cycle budget. Subroutine calls go through the in-memory stack
  only; the engine loop itself is flat and never recurses.

  Character output is written through an `OutputPort`, which every `std::io::Write` already is.
*/

use std::io::{self, Write};

use crate::address::{in_memory, Register, CHAR_OUT_PORT, MEMORY_SIZE, STACK_BASE};
use crate::alu::{compute_control, AluOp, AluOutput};
use crate::bytecode::{decode, Instruction, Opcode, Word};
use crate::config::{DivideByZero, EngineConfig, OperandMode};
use crate::error::{Fault, LoadError};
use crate::machine::MachineState;

/// Receives the characters a program writes to the character port.
pub trait OutputPort {
  fn emit(&mut self, byte: u8) -> io::Result<()>;
}

impl<W: Write> OutputPort for W {
  /// Each character is flushed as soon as it is written.
  fn emit(&mut self, byte: u8) -> io::Result<()> {
    self.write_all(&[byte])?;
    self.flush()
  }
}

/// Why a run stopped. The machine is not running after any of these.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RunStatus {
  /// The program executed `HALT`.
  Halted,
  /// The program hit a fatal condition.
  Faulted(Fault),
  /// The cycle budget ran out first.
  Incomplete,
  /// No program has been loaded, so nothing ran.
  NotLoaded,
}

pub struct Engine<P: OutputPort> {
  machine : MachineState,
  config  : EngineConfig,
  port    : P,
  cycles  : u64,
  /// Set once the machine stops.
  status  : Option<RunStatus>,
}

impl<P: OutputPort> Engine<P> {
  pub fn new(config: EngineConfig, port: P) -> Engine<P> {
    Engine {
      machine : MachineState::new(),
      config,
      port,
      cycles  : 0,
      status  : None,
    }
  }

  /// Resets the machine and copies `program` into memory starting at address 0.
  pub fn load_program(&mut self, program: &[Word]) -> Result<(), LoadError> {
    if program.len() > MEMORY_SIZE {
      return Err(LoadError::ProgramTooLarge { words: program.len(), capacity: MEMORY_SIZE });
    }

    self.machine = MachineState::new();
    for (address, word) in program.iter().enumerate() {
      self.machine.memory.write(address as Word, *word);
    }
    self.machine.running = true;
    self.cycles = 0;
    self.status = None;

    log::debug!("loaded {} words", program.len());
    Ok(())
  }

  /// Runs until the machine stops.
  pub fn run(&mut self) -> RunStatus {
    loop {
      if let Some(status) = self.step() {
        return status;
      }
    }
  }

  /// Executes one instruction. Returns `Some` once the machine has stopped, whether on this
  /// step or before it. Before any `load_program` this is `Some(RunStatus::NotLoaded)` and no
  /// cycle is counted.
  pub fn step(&mut self) -> Option<RunStatus> {
    if let Some(status) = &self.status {
      return Some(status.clone());
    }
    if !self.machine.running {
      return Some(RunStatus::NotLoaded);
    }

    if self.cycles >= self.config.cycle_budget {
      log::warn!("cycle budget of {} exhausted at IP={}", self.config.cycle_budget, self.machine.ip);
      return Some(self.stop(RunStatus::Incomplete));
    }

    self.cycles += 1;
    match self.cycle() {

      Ok(()) if self.machine.running => {
        #[cfg(feature = "trace_computation")] println!("{}", self.machine);
        None
      }

      Ok(()) => {
        log::debug!("halted after {} cycles", self.cycles);
        Some(self.stop(RunStatus::Halted))
      }

      Err(fault) => {
        log::error!("{}", fault);
        Some(self.stop(RunStatus::Faulted(fault)))
      }

    }
  }

  fn stop(&mut self, status: RunStatus) -> RunStatus {
    self.machine.running = false;
    self.status = Some(status.clone());
    status
  }

  pub fn machine(&self) -> &MachineState {
    &self.machine
  }

  pub fn config(&self) -> &EngineConfig {
    &self.config
  }

  pub fn port(&self) -> &P {
    &self.port
  }

  pub fn into_port(self) -> P {
    self.port
  }

  /// Instructions executed since the program was loaded, counting one that faulted.
  pub fn cycles(&self) -> u64 {
    self.cycles
  }

  pub fn status(&self) -> Option<&RunStatus> {
    self.status.as_ref()
  }

  // region Fetch and execute

  fn cycle(&mut self) -> Result<(), Fault> {
    let ip = self.machine.ip;
    if !in_memory(ip) {
      return Err(Fault::InstructionPointerOutOfRange { ip });
    }

    let word = self.machine.memory.read(ip);
    self.machine.ir = word;
    self.machine.ip = ip + 1;

    let instruction =
      match Instruction::try_decode(word) {
        Some(instruction) if self.config.profile.supports(instruction.opcode) => instruction,
        _ => return Err(Fault::IllegalOpcode { opcode: decode(word).opcode, ip })
      };

    log::trace!("{:>3}: {}", ip, instruction);
    self.execute(instruction, ip)
  }

  /// Runs the ALU through its control inputs.
  fn alu(&self, op: AluOp, x: Word, y: Word) -> AluOutput {
    match compute_control(op.control(), x, y) {
      Ok(output)     => output,
      Err(undefined) => undefined.output
    }
  }

  /// Stores `op`'s result in `destination` and latches every flag.
  fn arithmetic(&mut self, op: AluOp, destination: Register, y: Word) {
    let output = self.alu(op, self.machine.register(destination), y);
    self.machine.set_register(destination, output.value);
    self.machine.flags = output.flags;
  }

  /// Stores `op`'s result in `destination` and latches only the zero and sign flags.
  fn logical(&mut self, op: AluOp, destination: Register, y: Word) {
    let output = self.alu(op, self.machine.register(destination), y);
    self.machine.set_register(destination, output.value);
    self.machine.flags.zr = output.flags.zr;
    self.machine.flags.ng = output.flags.ng;
  }

  fn execute(&mut self, instruction: Instruction, ip: Word) -> Result<(), Fault> {
    let Instruction { opcode, reg1, reg2, imm } = instruction;
    let imm = imm as Word;

    match opcode {

      Opcode::Nop => {}

      Opcode::Mov => self.machine.set_register(reg1, imm),

      Opcode::Add | Opcode::Sub => {
        let y =
          match self.config.profile.operand_mode {
            OperandMode::RegisterOrImmediate if !instruction.selects_immediate() => {
              self.machine.register(reg2)
            }
            _ => imm
          };
        let op = match opcode {
          Opcode::Add => AluOp::Add,
          _           => AluOp::SubXY
        };
        self.arithmetic(op, reg1, y);
      }

      Opcode::And => self.logical(AluOp::And, reg1, self.machine.register(reg2)),

      Opcode::Or => self.logical(AluOp::Or, reg1, self.machine.register(reg2)),

      Opcode::Mul => self.arithmetic(AluOp::Mul, reg1, self.machine.register(reg2)),

      Opcode::Div => {
        let divisor = self.machine.register(reg2);
        if divisor == 0 && self.config.profile.divide_by_zero == DivideByZero::Halt {
          return Err(Fault::DivideByZero { ip });
        }
        self.arithmetic(AluOp::Div, reg1, divisor);
      }

      Opcode::Jmp => self.machine.ip = imm,

      Opcode::Jz => {
        if self.machine.flags.zr {
          self.machine.ip = imm;
        }
      }

      Opcode::Call => {
        let sp = self.machine.sp;
        if sp == 0 {
          return Err(Fault::StackOverflow { ip });
        }
        let return_address = self.machine.ip;
        self.machine.memory.write(sp, return_address);
        self.machine.sp = sp - 1;
        self.machine.call_depth = self.machine.call_depth.saturating_add(1);
        self.machine.ip = imm;

        #[cfg(feature = "trace_computation")]
          println!("call({}): return address {} at M[{}]", imm, return_address, sp);
      }

      Opcode::Ret => {
        if self.machine.sp >= STACK_BASE {
          return Err(Fault::StackUnderflow { ip });
        }
        self.machine.sp += 1;
        self.machine.ip = self.machine.memory.read(self.machine.sp);
        self.machine.call_depth = self.machine.call_depth.saturating_sub(1);

        #[cfg(feature = "trace_computation")] println!("ret: to {}", self.machine.ip);
      }

      Opcode::Halt => self.machine.running = false,

      Opcode::Load => {
        let address = self.machine.register(reg2);
        let value   = self.machine.memory.read(address);
        self.machine.set_register(reg1, value);
      }

      Opcode::Store => {
        let address = self.machine.register(reg2);
        let value   = self.machine.register(reg1);

        if address == CHAR_OUT_PORT {
          self.port
              .emit(value as u8)
              .map_err(|error| Fault::OutputFailed { ip, reason: error.to_string() })?;
        } else if !self.machine.memory.write(address, value) {
          log::warn!("store to {} at {} is outside memory and was dropped", address, ip);
        }
      }

    } // end match on opcode

    Ok(())
  }

  // endregion
}
