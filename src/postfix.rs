//! Infix to postfix conversion (shunting-yard).
//!
//! Arguments bound to deferred parameters are not evaluated by the caller:
//! their postfix tokens are collected in a separate output buffer and then
//! wrapped into a single [`DeferredArgument`] token. Buffers form a stack,
//! one per deferred argument being read, so deferred arguments nest.

use std::sync::Arc;

use crate::number::MathContext;
use crate::registry::{FunctionDefinition, Registry};
use crate::syntax::{
  DeferredArgument, Operator, PostfixToken, Token, COMMA_PRECEDENCE,
  FUNCTION_PRECEDENCE,
};
use crate::CalcError;

#[derive(Debug)]
enum StackEntry {
  Operator(Operator),
  Comma,
  /// A function applied without parentheses, or waiting below its `(`.
  Function(Arc<FunctionDefinition>),
  LeftParen,
}

impl StackEntry {
  fn precedence(&self) -> Option<u8> {
    match self {
      StackEntry::Operator(op) => Some(op.precedence()),
      StackEntry::Comma => Some(COMMA_PRECEDENCE),
      StackEntry::Function(_) => Some(FUNCTION_PRECEDENCE),
      StackEntry::LeftParen => None,
    }
  }
}

/// An open `f(` whose arguments are being read.
#[derive(Debug)]
struct CallFrame {
  definition: Arc<FunctionDefinition>,
  /// Open parentheses, this call's included.
  depth: usize,
  arg_index: usize,
  /// The current argument is written to its own buffer.
  deferred: bool,
}

struct Converter<'a> {
  registry: &'a Registry,
  math: &'a mut MathContext,
  stack: Vec<StackEntry>,
  buffers: Vec<Vec<PostfixToken>>,
  frames: Vec<CallFrame>,
  open_parens: usize,
}

pub fn convert(
  tokens: &[Token],
  registry: &Registry,
  math: &mut MathContext,
) -> Result<Vec<PostfixToken>, CalcError> {
  let converter = Converter {
    registry,
    math,
    stack: Vec::new(),
    buffers: vec![Vec::new()],
    frames: Vec::new(),
    open_parens: 0,
  };
  let postfix = converter.run(tokens)?;
  tracing::debug!(
    postfix = %crate::syntax::postfix_to_string(&postfix),
    "converted to postfix"
  );
  Ok(postfix)
}

impl Converter<'_> {
  fn output(&mut self) -> &mut Vec<PostfixToken> {
    // buffers always holds the final output at the bottom
    let last = self.buffers.len() - 1;
    &mut self.buffers[last]
  }

  fn emit(&mut self, entry: StackEntry) {
    let token = match entry {
      StackEntry::Operator(op) => PostfixToken::Operator(op),
      StackEntry::Comma => PostfixToken::Comma,
      StackEntry::Function(definition) => PostfixToken::Function {
        definition,
        empty_call: false,
      },
      StackEntry::LeftParen => return,
    };
    self.output().push(token);
  }

  /// Pops entries that bind at least as tightly as `precedence`.
  fn pop_not_lower(&mut self, precedence: u8) {
    while let Some(top) = self.stack.last() {
      match top.precedence() {
        Some(p) if p >= precedence => {
          if let Some(entry) = self.stack.pop() {
            self.emit(entry);
          }
        }
        _ => break,
      }
    }
  }

  /// Pops entries down to the nearest `(` or separator.
  fn pop_argument(&mut self) {
    while let Some(top) = self.stack.last() {
      if matches!(top, StackEntry::LeftParen | StackEntry::Comma) {
        break;
      }
      if let Some(entry) = self.stack.pop() {
        self.emit(entry);
      }
    }
  }

  fn pop_to_paren(&mut self) {
    while let Some(top) = self.stack.last() {
      if matches!(top, StackEntry::LeftParen) {
        break;
      }
      if let Some(entry) = self.stack.pop() {
        self.emit(entry);
      }
    }
  }

  fn frame_at_depth(&self) -> Option<usize> {
    match self.frames.last() {
      Some(frame) if frame.depth == self.open_parens => Some(self.frames.len() - 1),
      _ => None,
    }
  }

  /// Closes the deferred argument being read by the innermost call and
  /// writes it to the enclosing buffer.
  fn finish_deferred(&mut self, frame: usize) {
    self.pop_argument();
    let postfix = self.buffers.pop().unwrap_or_default();
    let frame = &mut self.frames[frame];
    frame.deferred = false;
    let argument = DeferredArgument::new(&frame.definition, frame.arg_index, postfix);
    self.output().push(PostfixToken::Deferred(argument));
  }

  fn begin_argument(&mut self, frame: usize) {
    let frame = &mut self.frames[frame];
    if frame.definition.is_deferred(frame.arg_index) {
      frame.deferred = true;
      self.buffers.push(Vec::new());
    }
  }

  fn run(mut self, tokens: &[Token]) -> Result<Vec<PostfixToken>, CalcError> {
    let mut i = 0;
    while i < tokens.len() {
      let next = tokens.get(i + 1);
      match &tokens[i] {
        Token::Number(literal) => {
          let number = self
            .math
            .parse(literal)
            .ok_or_else(|| CalcError::Syntax(format!("unknown token '{literal}'")))?;
          self.output().push(PostfixToken::Number(number));
        }
        Token::Identifier(name) => {
          if let Some(definition) = self.registry.function(name).cloned() {
            let called = next == Some(&Token::LeftParen);
            if called {
              self.open_call(definition);
              i += 1;
            } else if definition.arity() == Some(0) {
              self.output().push(PostfixToken::Function {
                definition,
                empty_call: true,
              });
            } else if definition.has_deferred() {
              return Err(CalcError::Syntax(format!(
                "{} must be called with parentheses",
                definition.signature()
              )));
            } else {
              self.stack.push(StackEntry::Function(definition));
            }
          } else {
            self.output().push(PostfixToken::Identifier(name.clone()));
          }
        }
        Token::Operator(op) => {
          self.pop_not_lower(op.precedence());
          self.stack.push(StackEntry::Operator(*op));
        }
        Token::Negate => {
          let minus_one = self.math.integer(-1);
          self.output().push(PostfixToken::Number(minus_one));
          self.stack.push(StackEntry::Operator(Operator::Mul));
        }
        Token::LeftParen => {
          self.open_parens += 1;
          self.stack.push(StackEntry::LeftParen);
        }
        Token::Comma => self.comma(),
        Token::RightParen => {
          let empty_call = i > 0 && tokens[i - 1] == Token::LeftParen;
          self.close_paren(empty_call)?;
        }
      }
      i += 1;
    }

    if self.stack.iter().any(|e| matches!(e, StackEntry::LeftParen)) {
      return Err(CalcError::Syntax(
        "mismatched parenthesis, open > close".to_string(),
      ));
    }
    while let Some(entry) = self.stack.pop() {
      self.emit(entry);
    }
    let output = self.buffers.swap_remove(0);
    if output.is_empty() {
      return Err(CalcError::Syntax("expression is empty".to_string()));
    }
    Ok(output)
  }

  fn open_call(&mut self, definition: Arc<FunctionDefinition>) {
    self.stack.push(StackEntry::Function(definition.clone()));
    self.stack.push(StackEntry::LeftParen);
    self.open_parens += 1;
    self.frames.push(CallFrame {
      definition,
      depth: self.open_parens,
      arg_index: 0,
      deferred: false,
    });
    let frame = self.frames.len() - 1;
    self.begin_argument(frame);
  }

  fn comma(&mut self) {
    let frame = self.frame_at_depth();
    if let Some(frame) = frame {
      if self.frames[frame].deferred {
        self.finish_deferred(frame);
      }
    }
    self.pop_argument();
    self.stack.push(StackEntry::Comma);
    if let Some(frame) = frame {
      self.frames[frame].arg_index += 1;
      self.begin_argument(frame);
    }
  }

  fn close_paren(&mut self, empty_call: bool) -> Result<(), CalcError> {
    if !self.stack.iter().any(|e| matches!(e, StackEntry::LeftParen)) {
      return Err(CalcError::Syntax(
        "mismatched parenthesis, open < close".to_string(),
      ));
    }

    let frame = self.frame_at_depth();
    if let Some(frame) = frame {
      if self.frames[frame].deferred {
        if empty_call {
          self.buffers.pop();
          self.frames[frame].deferred = false;
        } else {
          self.finish_deferred(frame);
        }
      }
    }

    self.pop_to_paren();
    self.stack.pop();
    self.open_parens -= 1;

    if frame.is_some() {
      self.frames.pop();
      if let Some(StackEntry::Function(definition)) = self.stack.pop() {
        self.output().push(PostfixToken::Function {
          definition,
          empty_call,
        });
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::syntax::postfix_to_string;
  use crate::tokenizer::tokenize;

  fn postfix(text: &str) -> Result<String, CalcError> {
    let mut math = MathContext::new(15).unwrap();
    let registry = Registry::new(&mut math);
    let tokens = tokenize(text, &registry, &[])?;
    convert(&tokens, &registry, &mut math).map(|p| postfix_to_string(&p))
  }

  #[test]
  fn operators_pop_on_ties() {
    assert_eq!(postfix("2+3*4").unwrap(), "2.0 3.0 4.0 * +");
    assert_eq!(postfix("2^3^2").unwrap(), "2.0 3.0 ^ 2.0 ^");
    assert_eq!(postfix("8-2-1").unwrap(), "8.0 2.0 - 1.0 -");
  }

  #[test]
  fn negation_multiplies_by_minus_one() {
    assert_eq!(postfix("-2^2").unwrap(), "-1.0 2.0 2.0 ^ *");
  }

  #[test]
  fn arguments_are_joined_by_separators() {
    assert_eq!(postfix("hypot(3,4)").unwrap(), "3.0 4.0 , hypot");
    assert_eq!(postfix("sin x+1").unwrap(), "x sin 1.0 +");
  }

  #[test]
  fn deferred_arguments_become_single_tokens() {
    let rendered = postfix("int(x^2, x, 0, 1)").unwrap();
    assert_eq!(
      rendered,
      "{argument 'f' of int(f, d, a, b)} {argument 'd' of int(f, d, a, b)} 0.0 1.0 , , , int"
    );
  }

  #[test]
  fn deferred_arguments_nest() {
    let mut math = MathContext::new(15).unwrap();
    let registry = Registry::new(&mut math);
    let tokens = tokenize("deriv(int(t^2, t, 0, x), x, 2)", &registry, &[]).unwrap();
    let output = convert(&tokens, &registry, &mut math).unwrap();
    let PostfixToken::Deferred(outer) = &output[0] else {
      panic!("expected a deferred argument, got {}", output[0]);
    };
    assert_eq!(
      postfix_to_string(&outer.postfix[2..]),
      "0.0 x , , , int"
    );
    assert!(matches!(outer.postfix[0], PostfixToken::Deferred(_)));
  }

  #[test]
  fn reports_structural_errors() {
    let err = postfix("sin(").unwrap_err().to_string();
    assert!(err.contains("open > close"), "{err}");
    let err = postfix("1)").unwrap_err().to_string();
    assert!(err.contains("open < close"), "{err}");
    let err = postfix("").unwrap_err().to_string();
    assert!(err.contains("expression is empty"), "{err}");
    let err = postfix("1.2.3").unwrap_err().to_string();
    assert!(err.contains("unknown token"), "{err}");
  }
}
