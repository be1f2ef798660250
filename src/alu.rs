/*!
  The arithmetic-logic unit.

  The ALU is documented in terms of six control inputs, `zx nx zy ny f no`, read as a 6 bit
  vector with `zx` as the most significant bit. Only twenty vectors select a function. Rather
  than carry six independent booleans through the engine, each function is a variant of
  `AluOp`, and the variant's discriminant *is* its control vector. `AluOp::from_control` and
  `AluOp::control` translate between the two views without loss.

  For every function except `x*y` and `x÷y`, the vector also describes a datapath: zero then
  complement `x` per `zx`/`nx`, the same for `y` per `zy`/`ny`, add if `f` else and, and
  complement the result if `no`. `compute` evaluates the named function directly on the raw
  operands, which gives the same value, so the status flags can be defined on the operands
  the caller actually supplied.

  Addition and subtraction run through `ripple_add`, a bit-by-bit carry chain, so that carry
  and overflow fall out of the same circuit that produces the sum.

  Flag conventions: `x+y`, `x-y`, and `y-x` report true signed overflow. The carry of `x+y` is
  the carry out of the chain, while the carry of a subtraction is set when the minuend is less
  than the subtrahend as signed words. Increment reports only its carry. Negation, decrement,
  and the bitwise and selection functions clear both `cy` and `ov`.
*/

use std::convert::TryFrom;
use std::fmt::{Display, Formatter};

use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::{Display as StrumDisplay, EnumIter};
use thiserror::Error;

use crate::bytecode::{Word, WORD_BITS};

const SIGN_BIT: Word = 1 << (WORD_BITS - 1);

/// Status outputs describing the most recent ALU result.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct StatusFlags {
  /// The result is zero.
  pub zr: bool,
  /// The result's sign bit is set.
  pub ng: bool,
  /// Signed overflow.
  pub ov: bool,
  /// Carry out of an addition, or borrow out of a subtraction.
  pub cy: bool,
}

impl Display for StatusFlags {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "ZR={} NG={} OV={} CY={}",
      self.zr as u8, self.ng as u8, self.ov as u8, self.cy as u8
    )
  }
}

/// The six control inputs.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct ControlBits {
  pub zx : bool,
  pub nx : bool,
  pub zy : bool,
  pub ny : bool,
  pub f  : bool,
  pub no : bool,
}

impl ControlBits {
  /// Splits a vector `zx nx zy ny f no`, most significant bit first. Bits above the sixth
  /// are ignored.
  pub fn from_vector(vector: u8) -> ControlBits {
    let bit = |n: u8| vector & (1 << n) != 0;
    ControlBits {
      zx : bit(5),
      nx : bit(4),
      zy : bit(3),
      ny : bit(2),
      f  : bit(1),
      no : bit(0),
    }
  }

  pub fn vector(&self) -> u8 {
    (self.zx as u8) << 5 |
    (self.nx as u8) << 4 |
    (self.zy as u8) << 3 |
    (self.ny as u8) << 2 |
    (self.f  as u8) << 1 |
    (self.no as u8)
  }
}

impl Display for ControlBits {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{:06b}", self.vector())
  }
}

/// The functions the ALU can compute. Discriminants are control vectors.
#[derive(
  StrumDisplay, EnumIter, TryFromPrimitive, IntoPrimitive,
  Copy,         Clone,    Eq,               PartialEq,    Debug, Hash
)]
#[repr(u8)]
pub enum AluOp {
  #[strum(to_string = "0")]     Zero     = 0b101010,
  #[strum(to_string = "1")]     One      = 0b111111,
  #[strum(to_string = "-1")]    MinusOne = 0b111010,
  #[strum(to_string = "x")]     X        = 0b001100,
  #[strum(to_string = "y")]     Y        = 0b110000,
  #[strum(to_string = "!x")]    NotX     = 0b001101,
  #[strum(to_string = "!y")]    NotY     = 0b110001,
  #[strum(to_string = "-x")]    NegX     = 0b001111,
  #[strum(to_string = "-y")]    NegY     = 0b110011,
  #[strum(to_string = "x+1")]   IncX     = 0b011111,
  #[strum(to_string = "y+1")]   IncY     = 0b110111,
  #[strum(to_string = "x-1")]   DecX     = 0b001110,
  #[strum(to_string = "y-1")]   DecY     = 0b110010,
  #[strum(to_string = "x+y")]   Add      = 0b000010,
  #[strum(to_string = "x-y")]   SubXY    = 0b010011,
  #[strum(to_string = "y-x")]   SubYX    = 0b000111,
  #[strum(to_string = "x&y")]   And      = 0b000000,
  #[strum(to_string = "x|y")]   Or       = 0b010101,
  #[strum(to_string = "x*y")]   Mul      = 0b111100,
  #[strum(to_string = "x/y")]   Div      = 0b111101,
}

impl AluOp {
  pub fn from_control(control: ControlBits) -> Option<AluOp> {
    AluOp::try_from(control.vector()).ok()
  }

  pub fn control(&self) -> ControlBits {
    ControlBits::from_vector(Into::<u8>::into(*self))
  }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct AluOutput {
  pub value : Word,
  pub flags : StatusFlags,
}

/// A control vector outside the function table. The ALU still produces an output (zero), so
/// callers that only need to report the condition can carry on with `output`.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Error)]
#[error("control vector {control} does not select an ALU function")]
pub struct UndefinedFunction {
  pub control : ControlBits,
  pub output  : AluOutput,
}

/// Adds `a`, `b`, and `carry_in` one bit at a time. Returns the sum and the carry out of the
/// most significant bit.
pub fn ripple_add(a: Word, b: Word, carry_in: bool) -> (Word, bool) {
  let mut sum   : Word = 0;
  let mut carry : Word = carry_in as Word;

  for i in 0..WORD_BITS {
    let bit_a = (a >> i) & 1;
    let bit_b = (b >> i) & 1;

    sum  |= (bit_a ^ bit_b ^ carry) << i;
    carry = (bit_a & bit_b) | (bit_a & carry) | (bit_b & carry);
  }

  (sum, carry == 1)
}

fn is_negative(value: Word) -> bool {
  value & SIGN_BIT != 0
}

/// `x + y`, returning (sum, carry, overflow). Overflow when both operands have the same sign
/// and the sum's sign differs.
fn add(x: Word, y: Word) -> (Word, bool, bool) {
  let (sum, carry) = ripple_add(x, y, false);
  let overflow = is_negative(x) == is_negative(y) && is_negative(sum) != is_negative(x);
  (sum, carry, overflow)
}

/// `x - y` as `x + !y + 1`, returning (difference, signed less-than, overflow). The carry
/// flag of a subtraction is set when `x < y` as signed words. Overflow when the operands' signs
/// differ and the difference's sign differs from `x`.
fn subtract(x: Word, y: Word) -> (Word, bool, bool) {
  let (difference, _carry) = ripple_add(x, !y, true);
  let overflow = is_negative(x) != is_negative(y) && is_negative(difference) != is_negative(x);
  (difference, (x as i16) < (y as i16), overflow)
}

/// `x + 1`. Only the carry out of the chain is reported.
fn increment(x: Word) -> (Word, bool, bool) {
  let (sum, carry) = ripple_add(x, 1, false);
  (sum, carry, false)
}

/// `x - 1`. Reports neither carry nor overflow.
fn decrement(x: Word) -> (Word, bool, bool) {
  let (difference, _carry) = ripple_add(x, Word::MAX, false);
  (difference, false, false)
}

/// Two's complement negation. Reports neither carry nor overflow.
fn negate(x: Word) -> (Word, bool, bool) {
  let (negation, _carry) = ripple_add(!x, 1, false);
  (negation, false, false)
}

/// Computes `op` on `x` and `y`. Total: division by zero yields zero with `ov` set.
pub fn compute(op: AluOp, x: Word, y: Word) -> AluOutput {
  let (value, cy, ov) =
    match op {
      AluOp::Zero     => (0, false, false),
      AluOp::One      => (1, false, false),
      AluOp::MinusOne => (Word::MAX, false, false),
      AluOp::X        => (x, false, false),
      AluOp::Y        => (y, false, false),
      AluOp::NotX     => (!x, false, false),
      AluOp::NotY     => (!y, false, false),
      AluOp::NegX     => negate(x),
      AluOp::NegY     => negate(y),
      AluOp::IncX     => increment(x),
      AluOp::IncY     => increment(y),
      AluOp::DecX     => decrement(x),
      AluOp::DecY     => decrement(y),
      AluOp::Add      => add(x, y),
      AluOp::SubXY    => subtract(x, y),
      AluOp::SubYX    => subtract(y, x),
      AluOp::And      => (x & y, false, false),
      AluOp::Or       => (x | y, false, false),

      AluOp::Mul => {
        let product = x as u32 * y as u32;
        let wide    = product > Word::MAX as u32;
        (product as Word, wide, wide)
      }

      AluOp::Div => {
        match y {
          0 => (0, false, true),
          _ => (x / y, false, false)
        }
      }
    };

  AluOutput {
    value,
    flags: StatusFlags { zr: value == 0, ng: is_negative(value), ov, cy }
  }
}

/// Computes the function selected by a raw control vector.
pub fn compute_control(control: ControlBits, x: Word, y: Word) -> Result<AluOutput, UndefinedFunction> {
  match AluOp::from_control(control) {

    Some(op) => Ok(compute(op, x, y)),

    None => {
      log::warn!("Not a defined ALU function: control vector {}. Output is 0.", control);
      let output = AluOutput {
        value : 0,
        flags : StatusFlags { zr: true, ..StatusFlags::default() }
      };
      Err(UndefinedFunction { control, output })
    }

  }
}
