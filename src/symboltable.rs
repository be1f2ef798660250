use std::collections::HashMap;

use string_cache::DefaultAtom;

use crate::bytecode::Word;

/**
  A symbol table maps label names to the instruction index they mark. Labels are interned
  since the same few names are looked up once for every reference. Several labels may mark
  the same index, so the mapping only runs one way. The table also remembers the line each
  label was defined on to report redefinitions.
*/
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
  table: HashMap<DefaultAtom, (Word, usize)>
}

impl SymbolTable {

  pub fn new() -> SymbolTable {
    SymbolTable {
      table: HashMap::new()
    }
  }

  pub fn get_address(&self, label: &str) -> Option<Word> {
    self.table.get(&DefaultAtom::from(label)).map(|(address, _line)| *address)
  }

  /// Defines `label`. A label that is already defined keeps its first definition, and the
  /// line of that definition is returned as the error.
  pub fn insert(&mut self, label: &str, address: Word, line: usize) -> Result<(), usize> {
    let atom = DefaultAtom::from(label);
    match self.table.get(&atom) {
      Some((_address, first_line)) => Err(*first_line),
      None => {
        self.table.insert(atom, (address, line));
        Ok(())
      }
    }
  }

  pub fn len(&self) -> usize {
    self.table.len()
  }

  pub fn is_empty(&self) -> bool {
    self.table.is_empty()
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn first_definition_wins() {
    let mut symbols = SymbolTable::new();
    assert_eq!(symbols.insert("loop", 4, 5), Ok(()));
    assert_eq!(symbols.insert("loop", 9, 12), Err(5));
    assert_eq!(symbols.get_address("loop"), Some(4));
    assert_eq!(symbols.len(), 1);
  }

  #[test]
  fn labels_may_share_an_address() {
    let mut symbols = SymbolTable::new();
    assert!(symbols.insert("start", 0, 1).is_ok());
    assert!(symbols.insert("top", 0, 2).is_ok());
    assert_eq!(symbols.get_address("start"), symbols.get_address("top"));
    assert_eq!(symbols.get_address("missing"), None);
  }
}
