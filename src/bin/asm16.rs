//! `asm16`: assembles a source file into a text listing and a raw binary image.
//!
//! # Usage
//! ```text
//! asm16 <input.asm> [-o <listing>] [--profile <canonical|basic>]
//! ```
//!
//! The listing defaults to `program.lst`; the binary image is written beside it with the
//! extension `bin`. Nothing is written if the source has errors.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use sim16::assembler::render_diagnostic;
use sim16::{assemble, Profile, ProfileName};

#[derive(Parser, Debug)]
#[command(name = "asm16")]
#[command(about = "Assemble a program for the 16-bit toy machine", long_about = None)]
struct Args {
  /// Assembly source file
  input: PathBuf,

  /// Listing output path
  #[arg(short, long, default_value = "program.lst")]
  output: PathBuf,

  /// Instruction set profile: `canonical` or `basic`
  #[arg(long, default_value = "canonical")]
  profile: ProfileName,
}

fn main() -> Result<()> {
  env_logger::init();
  let args = Args::parse();

  let source = fs::read_to_string(&args.input)
    .with_context(|| format!("failed to read {}", args.input.display()))?;

  let assembly = assemble(&source, Profile::from(args.profile));
  if !assembly.is_ok() {
    let file = args.input.display().to_string();
    for error in &assembly.errors {
      eprintln!("{}", render_diagnostic(&file, &source, error));
    }
    bail!("{} error(s) in {}", assembly.errors.len(), args.input.display());
  }

  let binary_path = assembly
    .program
    .write_artifacts(&args.output)
    .with_context(|| format!("failed to write {}", args.output.display()))?;

  println!(
    "Assembled {} instructions ({} labels) into {} and {}",
    assembly.instruction_count(),
    assembly.label_count,
    args.output.display(),
    binary_path.display()
  );
  Ok(())
}
