/*!
  The human readable textual form of bytecode is called assembly. This module knows the shape
  of one line of assembly and nothing else: it splits a line into an optional label and a
  statement, and a statement into a mnemonic and its operands. Whether a mnemonic exists, how
  many operands it wants, and what a label resolves to are the assembler's business.

  A line has the form

  ```text
  [label:] [MNEMONIC [operand {, operand}]] [; comment]
  ```

  Whitespace around every part is insignificant and mnemonics and register names are case
  insensitive. Empty operands produced by stray commas are dropped.
*/

use nom::{
  bytes::complete::{is_not, take_till1},
  character::complete::{char as one_char, digit1, one_of},
  combinator::{all_consuming, opt, recognize},
  multi::separated_list0,
  sequence::{pair, preceded, terminated},
  IResult
};

use crate::address::Register;

/// A line with its comment removed, split at the first colon.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LineParts<'a> {
  pub label : Option<&'a str>,
  pub body  : &'a str
}

/// A mnemonic and its raw operand tokens.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Statement<'a> {
  pub mnemonic : &'a str,
  pub operands : Vec<&'a str>
}

/// One classified operand token.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Operand<'a> {
  Register(Register),
  Literal(i64),
  Label(&'a str)
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OperandError {
  /// Register syntax naming a register the machine does not have, like `R9`.
  NoSuchRegister,
  /// Starts like a number but is not one, like `12ab` or a value too large for `i64`.
  MalformedLiteral
}

fn strip_comment(raw: &str) -> &str {
  let code: IResult<&str, &str> = is_not(";")(raw);
  match code {
    Ok((_rest, code)) => code,
    // Nothing precedes the comment.
    Err(_) => ""
  }
}

/// Removes the comment from `raw` and splits off a label, if there is one. Both parts are
/// trimmed. A label is only recognized before the first colon on the line.
pub fn split_line(raw: &str) -> LineParts {
  let code = strip_comment(raw);
  let labeled: IResult<&str, Option<&str>> = opt(terminated(is_not(":"), one_char(':')))(code);

  match labeled {
    Ok((body, Some(label))) => LineParts { label: Some(label.trim()), body: body.trim() },
    _                       => LineParts { label: None, body: code.trim() }
  }
}

/// Splits a statement into its mnemonic and operand tokens. Returns `None` for an empty body.
pub fn parse_statement(body: &str) -> Option<Statement> {
  let body = body.trim();
  let mnemonic_p: IResult<&str, &str> = take_till1(char::is_whitespace)(body);
  let (rest, mnemonic) = mnemonic_p.ok()?;

  let rest = rest.trim();
  let operands = match rest.is_empty() {
    true  => vec![],
    false => {
      let list_p: IResult<&str, Vec<Option<&str>>> =
        separated_list0(one_char(','), opt(is_not(",")))(rest);
      match list_p {
        Ok((_rest, tokens)) => {
          tokens.into_iter()
                .flatten()
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .collect()
        }
        Err(_) => vec![]
      }
    }
  };

  Some(Statement { mnemonic, operands })
}

/// Register syntax: `R` or `r` followed by nothing but digits.
fn is_register_syntax(token: &str) -> bool {
  let parsed: IResult<&str, &str> = all_consuming(preceded(one_of("Rr"), digit1))(token);
  parsed.is_ok()
}

fn decimal_literal(token: &str) -> Option<&str> {
  let parsed: IResult<&str, &str> =
    all_consuming(recognize(pair(opt(one_char('-')), digit1)))(token);
  parsed.ok().map(|(_, literal)| literal)
}

/// Classifies a single operand token. A token in register syntax is a register, a token
/// beginning with a digit or a minus sign is a decimal literal, and anything else is taken to
/// be a label.
pub fn parse_operand(token: &str) -> Result<Operand, OperandError> {
  if is_register_syntax(token) {
    return token
      .parse::<Register>()
      .map(Operand::Register)
      .map_err(|_| OperandError::NoSuchRegister);
  }

  match token.chars().next() {
    Some(c) if c.is_ascii_digit() || c == '-' => {
      decimal_literal(token)
        .and_then(|literal| literal.parse::<i64>().ok())
        .map(Operand::Literal)
        .ok_or(OperandError::MalformedLiteral)
    }
    _ => Ok(Operand::Label(token))
  }
}

/// Labels start with a letter or underscore and continue with letters, digits, and
/// underscores.
pub fn is_valid_label(label: &str) -> bool {
  let mut chars = label.chars();
  match chars.next() {
    Some(first) if first.is_ascii_alphabetic() || first == '_' => {
      chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
    _ => false
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  fn reg(index: u8) -> Register {
    Register::new(index).unwrap()
  }

  #[test]
  fn comments_and_blank_lines_are_empty() {
    assert_eq!(split_line("   ; only a comment"), LineParts { label: None, body: "" });
    assert_eq!(split_line(""), LineParts { label: None, body: "" });
    assert_eq!(parse_statement(""), None);
  }

  #[test]
  fn label_and_statement_share_a_line() {
    let parts = split_line("  loop:   ADD R2, 1   ; step");
    assert_eq!(parts, LineParts { label: Some("loop"), body: "ADD R2, 1" });

    let statement = parse_statement(parts.body).unwrap();
    assert_eq!(statement.mnemonic, "ADD");
    assert_eq!(statement.operands, vec!["R2", "1"]);
  }

  #[test]
  fn label_alone_on_a_line() {
    assert_eq!(split_line("done:"), LineParts { label: Some("done"), body: "" });
  }

  #[test]
  fn stray_commas_are_dropped() {
    let statement = parse_statement("mov r1 , , 5,").unwrap();
    assert_eq!(statement.mnemonic, "mov");
    assert_eq!(statement.operands, vec!["r1", "5"]);
  }

  #[test]
  fn nullary_statement_has_no_operands() {
    let statement = parse_statement("HALT").unwrap();
    assert!(statement.operands.is_empty());
  }

  #[test]
  fn operands_are_classified() {
    assert_eq!(parse_operand("R3"), Ok(Operand::Register(reg(3))));
    assert_eq!(parse_operand("r0"), Ok(Operand::Register(reg(0))));
    assert_eq!(parse_operand("R8"), Err(OperandError::NoSuchRegister));
    assert_eq!(parse_operand("42"), Ok(Operand::Literal(42)));
    assert_eq!(parse_operand("-1"), Ok(Operand::Literal(-1)));
    assert_eq!(parse_operand("4x"), Err(OperandError::MalformedLiteral));
    assert_eq!(parse_operand("-"), Err(OperandError::MalformedLiteral));
    assert_eq!(parse_operand("loop"), Ok(Operand::Label("loop")));
    assert_eq!(parse_operand("Rx"), Ok(Operand::Label("Rx")));
  }

  #[test]
  fn label_names() {
    assert!(is_valid_label("loop"));
    assert!(is_valid_label("_start2"));
    assert!(!is_valid_label("2nd"));
    assert!(!is_valid_label("my label"));
    assert!(!is_valid_label(""));
  }
}
