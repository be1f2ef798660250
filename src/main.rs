//! `sim16`: loads a program, runs it, and reports how it stopped.
//!
//! # Usage
//! ```text
//! sim16 demos/fibonacci.asm --dump
//! sim16 program.bin --cycles 500 --profile basic
//! ```
//!
//! Characters the program writes to the output port go to stdout. Exits with status 2 when the
//! cycle budget runs out before the program halts.

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};

use sim16::assembler::render_diagnostic;
use sim16::{assemble, Engine, EngineConfig, Profile, ProfileName, Program, RunStatus};

#[derive(Parser, Debug)]
#[command(name = "sim16")]
#[command(about = "Run a program on the 16-bit toy machine", long_about = None)]
struct Args {
  /// Assembly source, or a raw binary image if the extension is `bin`
  program: PathBuf,

  /// Number of instructions to execute before giving up
  #[arg(long, default_value_t = 10_000)]
  cycles: u64,

  /// Instruction set profile: `canonical` or `basic`
  #[arg(long, default_value = "canonical")]
  profile: ProfileName,

  /// Print the machine state when the run ends
  #[arg(long, action = ArgAction::SetTrue)]
  dump: bool,
}

fn load(path: &Path, profile: Profile) -> Result<Program> {
  if path.extension().map_or(false, |extension| extension == "bin") {
    let bytes = fs::read(path)
      .with_context(|| format!("failed to read {}", path.display()))?;
    return Program::from_bytes(&bytes)
      .with_context(|| format!("failed to load {}", path.display()));
  }

  let source = fs::read_to_string(path)
    .with_context(|| format!("failed to read {}", path.display()))?;
  let assembly = assemble(&source, profile);
  let file = path.display().to_string();
  for error in &assembly.errors {
    eprint!("{}", render_diagnostic(&file, &source, error));
  }

  assembly
    .into_result()
    .with_context(|| format!("failed to assemble {}", path.display()))
}

fn main() -> Result<()> {
  env_logger::init();
  let args = Args::parse();

  #[cfg(feature = "trace_computation")]
  println!("Computation Tracing ENABLED");

  let profile = Profile::from(args.profile);
  let program = load(&args.program, profile)?;

  let mut engine = Engine::new(EngineConfig::new(profile, args.cycles), io::stdout());
  engine.load_program(program.words())?;
  let status = engine.run();

  if args.dump {
    println!("\n{}", engine.machine());
  }

  match status {
    RunStatus::Halted => {
      eprintln!("Halted after {} cycles.", engine.cycles());
      Ok(())
    }
    RunStatus::Faulted(fault) => {
      bail!("machine fault after {} cycles: {}", engine.cycles(), fault)
    }
    RunStatus::Incomplete => {
      eprintln!("Stopped: no HALT within {} cycles.", args.cycles);
      process::exit(2)
    }
    RunStatus::NotLoaded => bail!("no program was loaded")
  }
}
