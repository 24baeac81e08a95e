use crate::registry::{Registry, ANSWER};
use crate::syntax::{Operator, Token};
use crate::CalcError;

fn is_identifier_start(ch: char) -> bool {
  ch.is_alphabetic() || ch == '_'
}

fn is_identifier_char(ch: char) -> bool {
  ch.is_alphanumeric() || ch == '_'
}

/// A letter followed only by digits, such as `x1` or `a42`.
fn is_indexed_name(chars: &[char]) -> bool {
  match chars.split_first() {
    Some((first, rest)) => {
      (first.is_ascii_alphabetic() || *first == '_')
        && !rest.is_empty()
        && rest.iter().all(|c| c.is_ascii_digit())
    }
    None => false,
  }
}

/// Splits an expression into tokens. Whitespace is ignored. `locals` are
/// names known to the caller (scope variables, formal parameters) that
/// take part in identifier splitting.
pub fn tokenize(
  text: &str,
  registry: &Registry,
  locals: &[&str],
) -> Result<Vec<Token>, CalcError> {
  let tokens = Tokenizer::new(text, registry, locals).run()?;
  tracing::debug!(
    expression = text,
    tokens = %tokens.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(" "),
    "tokenized"
  );
  Ok(tokens)
}

struct Tokenizer<'a> {
  chars: Vec<char>,
  pos: usize,
  registry: &'a Registry,
  locals: &'a [&'a str],
}

impl<'a> Tokenizer<'a> {
  fn new(text: &str, registry: &'a Registry, locals: &'a [&'a str]) -> Self {
    Tokenizer {
      chars: text.chars().filter(|c| !c.is_whitespace()).collect(),
      pos: 0,
      registry,
      locals,
    }
  }

  fn peek(&self, offset: isize) -> Option<char> {
    let index = self.pos as isize + offset;
    if index < 0 {
      return None;
    }
    self.chars.get(index as usize).copied()
  }

  fn run(mut self) -> Result<Vec<Token>, CalcError> {
    let mut tokens = Vec::new();
    while let Some(ch) = self.peek(0) {
      match ch {
        '(' => {
          self.pos += 1;
          tokens.push(Token::LeftParen);
        }
        ')' => {
          self.pos += 1;
          tokens.push(Token::RightParen);
        }
        ',' => {
          self.pos += 1;
          tokens.push(Token::Comma);
        }
        '-' => tokens.push(self.minus()?),
        c if c.is_ascii_digit() || c == '.' => tokens.push(self.number()),
        c if is_identifier_start(c) => tokens.extend(self.identifiers()),
        c => match Operator::from_char(c) {
          Some(op) => {
            self.pos += 1;
            tokens.push(Token::Operator(op));
          }
          None => return Err(unknown_character(c)),
        },
      }
    }
    self.insert_implicit_multiplication(&mut tokens);
    Ok(tokens)
  }

  /// Digits and points. The literal is validated by the converter.
  fn number(&mut self) -> Token {
    let start = self.pos;
    while self
      .peek(0)
      .is_some_and(|c| c.is_ascii_digit() || c == '.')
    {
      self.pos += 1;
    }
    Token::Number(self.chars[start..self.pos].iter().collect())
  }

  /// A `-` right after an operator, `(`, `,` or at the start negates the
  /// operand that follows; anywhere else it subtracts.
  fn minus(&mut self) -> Result<Token, CalcError> {
    let previous = self.peek(-1);
    let negates = match previous {
      None | Some('(') | Some(',') => true,
      Some(c) => Operator::from_char(c).is_some(),
    };
    self.pos += 1;
    if !negates {
      return Ok(Token::Operator(Operator::Sub));
    }
    match self.peek(0) {
      Some(c) if is_identifier_start(c) || c.is_ascii_digit() || c == '.' || c == '(' => {
        Ok(Token::Negate)
      }
      _ => Err(CalcError::Syntax("invalid negation".to_string())),
    }
  }

  fn identifiers(&mut self) -> Vec<Token> {
    let start = self.pos;
    while self.peek(0).is_some_and(is_identifier_char) {
      self.pos += 1;
    }
    let run = self.chars[start..self.pos].to_vec();
    let mut tokens = Vec::new();
    self.split(&run, &mut tokens);
    tokens
  }

  fn is_known(&self, name: &str) -> bool {
    name == ANSWER || self.registry.contains_name(name) || self.locals.contains(&name)
  }

  /// Takes the longest known prefix of `chars` (one character when nothing
  /// matches) and repeats on the rest, so `xsinpi` reads as `x sin pi`.
  fn split(&self, chars: &[char], out: &mut Vec<Token>) {
    let mut rest = chars;
    while !rest.is_empty() {
      // digits left over after a name, as in `sqrt16`
      if rest[0].is_ascii_digit() {
        let end = rest
          .iter()
          .position(|c| !c.is_ascii_digit())
          .unwrap_or(rest.len());
        out.push(Token::Number(rest[..end].iter().collect()));
        rest = &rest[end..];
        continue;
      }
      let mut end = 1;
      for len in 2..=rest.len() {
        let part = &rest[..len];
        let name: String = part.iter().collect();
        if self.is_known(&name) || is_indexed_name(part) {
          end = len;
        }
      }
      out.push(Token::Identifier(rest[..end].iter().collect()));
      rest = &rest[end..];
    }
  }

  /// Inserts `*` between adjacent operands, as in `2x`, `2(3)` or `x y`.
  /// Nothing is inserted after a function that takes parameters, since
  /// what follows is its argument, nor before `(` after any function.
  fn insert_implicit_multiplication(&self, tokens: &mut Vec<Token>) {
    let mut i = 0;
    while i + 1 < tokens.len() {
      let left_is_operand = match &tokens[i] {
        Token::Operator(_) | Token::LeftParen | Token::Comma | Token::Negate => false,
        Token::Identifier(name) => match self.registry.function(name) {
          Some(def) => def.arity() == Some(0) && tokens[i + 1] != Token::LeftParen,
          None => true,
        },
        Token::Number(_) | Token::RightParen => true,
      };
      let right_is_operand = !matches!(
        tokens[i + 1],
        Token::Operator(_) | Token::RightParen | Token::Comma
      );
      if left_is_operand && right_is_operand {
        tokens.insert(i + 1, Token::Operator(Operator::Mul));
        i += 1;
      }
      i += 1;
    }
  }
}

fn unknown_character(ch: char) -> CalcError {
  let hint = match ch {
    '|' => "\n(For absolute value, use 'abs(x)' instead of '|x|')",
    '!' => "\n(For factorials, use 'fact(n)' instead of 'n!')",
    _ => "",
  };
  CalcError::Syntax(format!("unknown token at char '{ch}'{hint}"))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::number::MathContext;

  fn render(text: &str, locals: &[&str]) -> String {
    let mut math = MathContext::new(15).unwrap();
    let registry = Registry::new(&mut math);
    tokenize(text, &registry, locals)
      .unwrap()
      .iter()
      .map(|t| t.to_string())
      .collect::<Vec<_>>()
      .join(" ")
  }

  #[test]
  fn splits_concatenated_names() {
    assert_eq!(render("xsinpi", &[]), "x * sin pi");
    assert_eq!(render("x1y", &[]), "x1 * y");
    assert_eq!(render("ab", &[]), "a * b");
    assert_eq!(render("ab", &["ab"]), "ab");
    assert_eq!(render("sqrt 16", &[]), "sqrt 16");
  }

  #[test]
  fn keeps_answer_register_whole() {
    assert_eq!(render("2ans", &[]), "2 * ans");
  }

  #[test]
  fn distinguishes_negation_from_subtraction() {
    assert_eq!(render("-2^2", &[]), "¬ 2 ^ 2");
    assert_eq!(render("3-2", &[]), "3 - 2");
    assert_eq!(render("3*-x", &[]), "3 * ¬ x");
    assert_eq!(render("(-.5)", &[]), "( ¬ .5 )");
  }

  #[test]
  fn implicit_multiplication_skips_function_arguments() {
    assert_eq!(render("2sin(x)", &[]), "2 * sin ( x )");
    assert_eq!(render("(1)(2)", &[]), "( 1 ) * ( 2 )");
    assert_eq!(render("2 rand()", &[]), "2 * rand ( )");
  }

  #[test]
  fn rejects_unknown_characters_with_hints() {
    let mut math = MathContext::new(15).unwrap();
    let registry = Registry::new(&mut math);
    let err = tokenize("|x|", &registry, &[]).unwrap_err().to_string();
    assert!(err.contains("abs(x)"), "{err}");
    let err = tokenize("5!", &registry, &[]).unwrap_err().to_string();
    assert!(err.contains("fact(n)"), "{err}");
    assert!(tokenize("2*-", &registry, &[]).is_err());
  }
}
