/*!
  This module is responsible for the encoding and decoding of binary instructions, and for
  the raw binary image a program is stored as.

*/

use crate::error::ImageError;

// If you change this you must also change the field constants below.
pub type Word = u16;

/// Width of a word in bits.
pub const WORD_BITS: u32 = 16;

pub const OPCODE_SHIFT   : u32 = 12;
pub const REG1_SHIFT     : u32 = 9;
pub const REG2_SHIFT     : u32 = 6;

pub const OPCODE_MASK    : Word = 0xF;
pub const REGISTER_MASK  : Word = 0x7;
pub const IMMEDIATE_MASK : Word = 0x3F;

/// The largest value an immediate field can hold.
pub const MAX_IMMEDIATE  : Word = IMMEDIATE_MASK;

/// The raw fields of an instruction word. Nothing here is checked against the opcode table.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct Fields {
  pub opcode : u8,
  pub reg1   : u8,
  pub reg2   : u8,
  pub imm    : u8
}

/**
  Packs the fields into a word:

  ```text
  [OpCode:4][Reg1:3][Reg2:3][Immediate:6]
  ```

  Each field is masked to its width, so this never fails. Out of range values are truncated,
  not rejected.
*/
pub fn encode(opcode: u8, reg1: u8, reg2: u8, imm: u8) -> Word {
  ((opcode as Word & OPCODE_MASK)    << OPCODE_SHIFT) |
  ((reg1   as Word & REGISTER_MASK)  << REG1_SHIFT  ) |
  ((reg2   as Word & REGISTER_MASK)  << REG2_SHIFT  ) |
   (imm    as Word & IMMEDIATE_MASK)
}

/// Unpacks every field of the word. Total: any word decodes.
pub fn decode(word: Word) -> Fields {
  Fields {
    opcode : ((word >> OPCODE_SHIFT) & OPCODE_MASK)   as u8,
    reg1   : ((word >> REG1_SHIFT)   & REGISTER_MASK) as u8,
    reg2   : ((word >> REG2_SHIFT)   & REGISTER_MASK) as u8,
    imm    : ( word                  & IMMEDIATE_MASK) as u8
  }
}

/// Serializes words in emission order, one little-endian `u16` per word, with no header.
pub fn words_to_bytes(words: &[Word]) -> Vec<u8> {
  words.iter().flat_map(|word| word.to_le_bytes()).collect()
}

/// The inverse of `words_to_bytes`. An image must hold a whole number of words.
pub fn words_from_bytes(bytes: &[u8]) -> Result<Vec<Word>, ImageError> {
  if bytes.len() % 2 != 0 {
    return Err(ImageError::OddLength(bytes.len()));
  }
  Ok(
    bytes
      .chunks_exact(2)
      .map(|pair| Word::from_le_bytes([pair[0], pair[1]]))
      .collect()
  )
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn known_encodings() {
    // MOV R0, 10
    assert_eq!(encode(1, 0, 0, 10), 0x100A);
    // ADD R2, 1 with the immediate selector in reg2
    assert_eq!(encode(2, 2, 7, 1), 0x25C1);
    // HALT
    assert_eq!(encode(12, 0, 0, 0), 0xC000);
  }

  #[test]
  fn out_of_range_fields_are_masked() {
    assert_eq!(encode(0x1F, 0, 0, 0), encode(0xF, 0, 0, 0));
    assert_eq!(encode(1, 9, 0, 0), encode(1, 1, 0, 0));
    // 100 & 0x3F == 36
    assert_eq!(encode(1, 5, 0, 100), encode(1, 5, 0, 36));
    // -1 as a byte is 0xFF, which masks to 63.
    assert_eq!(encode(8, 0, 0, -1i8 as u8), encode(8, 0, 0, 63));
  }

  #[test]
  fn decode_extracts_every_field() {
    let fields = decode(0xA5C7);
    assert_eq!(fields, Fields { opcode: 0xA, reg1: 2, reg2: 7, imm: 7 });
  }

  #[test]
  fn image_is_little_endian() {
    assert_eq!(words_to_bytes(&[0x100A, 0xC000]), vec![0x0A, 0x10, 0x00, 0xC0]);
    assert_eq!(words_from_bytes(&[0x0A, 0x10]), Ok(vec![0x100A]));
    assert_eq!(words_from_bytes(&[0x0A]), Err(ImageError::OddLength(1)));
  }
}
