/*!

  The VM uses a 16 bit word for everything: registers, memory cells, and instructions. Every
  instruction is exactly one word, so instruction indices and memory addresses coincide.
  The sizes of instruction components are as follows:

    Opcode:    4 bits   (bits 15-12)
    Reg1:      3 bits   (bits 11-9)
    Reg2:      3 bits   (bits 8-6)
    Immediate: 6 bits   (bits 5-0, unsigned)

  The immediate doubles as a jump or call target, so only the first 64 words of memory are
  reachable by `JMP`, `JZ`, and `CALL`.

  Labels do not appear in the bytecode. They are symbolic names for instruction indices,
  resolved during assembly through a symbol table that is thrown away afterward.

  An enum is only used for the opcode itself. `Instruction` is the decoded view of a word and
  converts losslessly back to it for every assigned opcode.

*/

mod binary;
mod instruction;
pub mod assembly;

pub use binary::{
  encode, decode, words_to_bytes, words_from_bytes,
  Fields, Word, WORD_BITS, MAX_IMMEDIATE
};
pub use instruction::{Instruction, Opcode, OperandShape};
