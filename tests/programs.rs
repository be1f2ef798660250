//! Whole programs, assembled from text and run to completion.

use std::io;

use sim16::bytecode::encode;
use sim16::{assemble, Engine, EngineConfig, Profile, Program, RunStatus};

const FIBONACCI : &str = include_str!("../demos/fibonacci.asm");
const HELLO     : &str = include_str!("../demos/hello.asm");

/// Every opcode except `LOAD` and `STORE`, with fixed jump targets.
const OPCODE_TOUR: &str = "
        NOP
        MOV R0, 10
        MOV R1, 5
        ADD R2, 3
        SUB R0, 2
        MOV R3, 12
        MOV R4, 9
        AND R3, R4
        OR  R4, R3
        MUL R1, R0
        MOV R5, 100     ; masked to 36
        MOV R6, 5
        DIV R5, R6
        JMP 15
        HALT            ; skipped
        SUB R6, 5
        JZ 18
        HALT            ; skipped when R6 is zero
        CALL 20
        HALT
        MOV R7, 42
        RET
";

fn assemble_ok(source: &str, profile: Profile) -> Program {
  let assembly = assemble(source, profile);
  assert!(assembly.is_ok(), "unexpected errors: {:?}", assembly.errors);
  assembly.program
}

fn run(program: &Program, profile: Profile) -> (Engine<Vec<u8>>, RunStatus) {
  let mut engine = Engine::new(EngineConfig::new(profile, 10_000), Vec::new());
  engine.load_program(program.words()).unwrap();
  let status = engine.run();
  (engine, status)
}

#[test]
fn fibonacci_reaches_the_tenth_term() {
  let program = assemble_ok(FIBONACCI, Profile::CANONICAL);
  let (engine, status) = run(&program, Profile::CANONICAL);

  assert_eq!(status, RunStatus::Halted);
  let registers = engine.machine().registers;
  assert_eq!(registers[0], 34);
  assert_eq!(registers[1], 55);
  assert_eq!(registers[2], 10);
  assert_eq!(registers[3], 10);
}

#[test]
fn fibonacci_from_its_binary_image() {
  let program = assemble_ok(FIBONACCI, Profile::CANONICAL);
  let reloaded = Program::from_bytes(&program.to_bytes()).unwrap();
  assert_eq!(reloaded.words(), program.words());

  let (engine, status) = run(&reloaded, Profile::CANONICAL);
  assert_eq!(status, RunStatus::Halted);
  assert_eq!(engine.machine().registers[1], 55);
}

#[test]
fn hello_world_writes_through_the_port() {
  let program = assemble_ok(HELLO, Profile::CANONICAL);
  assert_eq!(program.len(), 38);

  let (engine, status) = run(&program, Profile::CANONICAL);
  assert_eq!(status, RunStatus::Halted);

  // The port shadows an instruction of the program itself, which must survive the writes.
  assert_eq!(engine.machine().memory.read(32), program.words()[32]);
  assert_eq!(String::from_utf8(engine.into_port()).unwrap(), "HELLO, WORLD!\n");
}

#[test]
fn hello_world_needs_memory_io() {
  let assembly = assemble(HELLO, Profile::BASIC);
  assert_eq!(assembly.errors.len(), 14);
}

#[test]
fn opcode_tour_agrees_across_profiles() {
  for profile in [Profile::CANONICAL, Profile::BASIC] {
    let program = assemble_ok(OPCODE_TOUR, profile);
    let (engine, status) = run(&program, profile);
    assert_eq!(status, RunStatus::Halted, "profile {:?}", profile);

    let machine = engine.machine();
    assert_eq!(machine.registers, [8, 40, 3, 8, 9, 7, 0, 42], "profile {:?}", profile);
    assert_eq!(machine.sp, 399);
    assert_eq!(machine.call_depth, 0);
    assert_eq!(machine.ip, 20);
  }
}

#[test]
fn profiles_encode_immediates_differently() {
  let canonical = assemble_ok(OPCODE_TOUR, Profile::CANONICAL);
  let basic     = assemble_ok(OPCODE_TOUR, Profile::BASIC);

  assert_eq!(canonical.words()[3], encode(2, 2, 7, 3));
  assert_eq!(basic.words()[3], encode(2, 2, 0, 3));
  assert_eq!(canonical.words()[1], basic.words()[1]);
}

#[test]
fn runaway_program_is_incomplete() {
  let program = assemble_ok("top: ADD R0, 1\nJMP top", Profile::CANONICAL);
  let mut engine = Engine::new(EngineConfig::new(Profile::CANONICAL, 1_001), io::sink());
  engine.load_program(program.words()).unwrap();

  assert_eq!(engine.run(), RunStatus::Incomplete);
  assert_eq!(engine.machine().registers[0], 501);
  assert!(!engine.machine().running);
}
