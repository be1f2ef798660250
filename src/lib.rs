/*!
  A 16-bit toy instruction set: an assembler that turns text into words, and an engine that
  executes them.

  ```text
  source text --assemble--> Program --Engine::load_program--> MachineState --run--> RunStatus
  ```

  Both halves share the instruction codec in `bytecode` and must be given the same `Profile`.
*/

#[macro_use] extern crate prettytable;
#[macro_use] extern crate lazy_static;

pub mod address;
pub mod alu;
pub mod assembler;
pub mod bytecode;
pub mod config;
pub mod engine;
pub mod error;
pub mod machine;
pub mod program;
pub mod symboltable;

pub use assembler::{assemble, Assembly};
pub use config::{DivideByZero, EngineConfig, OperandMode, Profile, ProfileName};
pub use engine::{Engine, OutputPort, RunStatus};
pub use error::{AssemblyError, AssemblyErrors, Fault, ImageError, LoadError};
pub use machine::MachineState;
pub use program::{binary_path_for, Program};
