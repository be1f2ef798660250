//! An assembled program and the two artifacts it can be written as: a text listing and a raw
//! binary image.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::bytecode::{words_from_bytes, words_to_bytes, Instruction, Word};
use crate::error::ImageError;

/// The source line a word was assembled from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SourceLine {
  /// 1-based line number
  pub number : usize,
  pub text   : String
}

/// An ordered sequence of words, each optionally tagged with its source line. Programs loaded
/// from a binary image carry no source lines.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Program {
  words   : Vec<Word>,
  origins : Vec<Option<SourceLine>>
}

impl Program {
  pub fn new() -> Program {
    Program::default()
  }

  pub fn from_words(words: Vec<Word>) -> Program {
    let origins = vec![None; words.len()];
    Program { words, origins }
  }

  /// Reads a raw binary image, one little-endian word per two bytes.
  pub fn from_bytes(bytes: &[u8]) -> Result<Program, ImageError> {
    Ok(Program::from_words(words_from_bytes(bytes)?))
  }

  pub fn push(&mut self, word: Word, origin: Option<SourceLine>) {
    self.words.push(word);
    self.origins.push(origin);
  }

  pub fn words(&self) -> &[Word] {
    &self.words
  }

  pub fn origin(&self, index: usize) -> Option<&SourceLine> {
    self.origins.get(index).and_then(Option::as_ref)
  }

  pub fn len(&self) -> usize {
    self.words.len()
  }

  pub fn is_empty(&self) -> bool {
    self.words.is_empty()
  }

  pub fn to_bytes(&self) -> Vec<u8> {
    words_to_bytes(&self.words)
  }

  /**
    The text listing: a short header of `;` comments, then one line per word giving the
    word in hex, its index, and the line it came from. Words without a source line are shown
    disassembled.

    ```text
    ; Machine code listing
    ; 2 instructions
    0x1207  ; [0] MOV R1, 7
    0xC000  ; [1] HALT
    ```
  */
  pub fn listing(&self) -> String {
    let mut text = String::new();

    text.push_str("; Machine code listing\n");
    text.push_str(&format!("; {} instructions\n", self.len()));

    for (index, word) in self.words.iter().enumerate() {
      let source = match self.origin(index) {
        Some(line) => line.text.trim().to_string(),
        None => {
          match Instruction::try_decode(*word) {
            Some(instruction) => instruction.to_string(),
            None              => "(illegal)".to_string()
          }
        }
      };
      text.push_str(&format!("0x{:04X}  ; [{}] {}\n", word, index, source));
    }

    text
  }

  /// Writes the listing to `listing_path` and the binary image next to it. Returns the path
  /// the binary image was written to.
  pub fn write_artifacts(&self, listing_path: &Path) -> io::Result<PathBuf> {
    let binary_path = binary_path_for(listing_path);
    fs::write(listing_path, self.listing())?;
    fs::write(&binary_path, self.to_bytes())?;
    log::info!(
      "wrote {} words to {} and {}",
      self.len(),
      listing_path.display(),
      binary_path.display()
    );
    Ok(binary_path)
  }
}

/// The binary image is written beside the listing with a `bin` extension.
pub fn binary_path_for(listing_path: &Path) -> PathBuf {
  listing_path.with_extension("bin")
}


#[cfg(test)]
mod tests {
  use super::*;

  fn sample() -> Program {
    let mut program = Program::new();
    program.push(0x1207, Some(SourceLine { number: 3, text: "  MOV R1, 7   ".to_string() }));
    program.push(0xC000, Some(SourceLine { number: 4, text: "HALT".to_string() }));
    program
  }

  #[test]
  fn listing_has_header_and_one_line_per_word() {
    let listing = sample().listing();
    let lines: Vec<&str> = listing.lines().collect();
    assert_eq!(
      lines,
      vec![
        "; Machine code listing",
        "; 2 instructions",
        "0x1207  ; [0] MOV R1, 7",
        "0xC000  ; [1] HALT",
      ]
    );
  }

  #[test]
  fn listing_disassembles_words_without_source() {
    let program = Program::from_words(vec![0x25C1, 0xF000]);
    let listing = program.listing();
    assert!(listing.contains("0x25C1  ; [0] ADD R2, 1"));
    assert!(listing.contains("0xF000  ; [1] (illegal)"));
  }

  #[test]
  fn image_is_little_endian() {
    assert_eq!(sample().to_bytes(), vec![0x07, 0x12, 0x00, 0xC0]);
    let reloaded = Program::from_bytes(&sample().to_bytes()).unwrap();
    assert_eq!(reloaded.words(), sample().words());
    assert_eq!(Program::from_bytes(&[1, 2, 3]), Err(ImageError::OddLength(3)));
  }

  #[test]
  fn binary_sits_beside_listing() {
    assert_eq!(binary_path_for(Path::new("out/program.lst")), PathBuf::from("out/program.bin"));
    assert_eq!(binary_path_for(Path::new("program")), PathBuf::from("program.bin"));
  }

  #[test]
  fn artifacts_are_written() {
    let dir = std::env::temp_dir().join(format!("sim16-artifacts-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let listing_path = dir.join("program.lst");

    let binary_path = sample().write_artifacts(&listing_path).unwrap();

    assert_eq!(fs::read(&binary_path).unwrap(), sample().to_bytes());
    assert_eq!(fs::read_to_string(&listing_path).unwrap(), sample().listing());
    fs::remove_dir_all(&dir).unwrap();
  }
}
