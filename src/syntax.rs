use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::number::Number;
use crate::registry::{ArgKind, FunctionDefinition};

/// Variable bindings visible to one evaluation.
pub type Scope = HashMap<String, Number>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
  Add,
  Sub,
  Mul,
  Div,
  Rem,
  Pow,
}

impl Operator {
  pub fn from_char(ch: char) -> Option<Self> {
    match ch {
      '+' => Some(Operator::Add),
      '-' => Some(Operator::Sub),
      '*' => Some(Operator::Mul),
      '/' => Some(Operator::Div),
      '%' => Some(Operator::Rem),
      '^' => Some(Operator::Pow),
      _ => None,
    }
  }

  pub fn symbol(self) -> char {
    match self {
      Operator::Add => '+',
      Operator::Sub => '-',
      Operator::Mul => '*',
      Operator::Div => '/',
      Operator::Rem => '%',
      Operator::Pow => '^',
    }
  }

  pub fn precedence(self) -> u8 {
    match self {
      Operator::Add | Operator::Sub => 1,
      Operator::Mul | Operator::Div | Operator::Rem => 3,
      Operator::Pow => 4,
    }
  }
}

impl fmt::Display for Operator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.symbol())
  }
}

/// Precedence of a function applied without parentheses (`sin x`).
pub const FUNCTION_PRECEDENCE: u8 = 2;
/// Precedence of the argument separator.
pub const COMMA_PRECEDENCE: u8 = 0;

/// Tokenizer output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
  Number(String),
  Identifier(String),
  Operator(Operator),
  LeftParen,
  RightParen,
  Comma,
  /// Unary minus, rewritten to `-1 *` by the converter.
  Negate,
}

impl fmt::Display for Token {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Token::Number(text) | Token::Identifier(text) => f.write_str(text),
      Token::Operator(op) => write!(f, "{op}"),
      Token::LeftParen => f.write_str("("),
      Token::RightParen => f.write_str(")"),
      Token::Comma => f.write_str(","),
      Token::Negate => f.write_str("¬"),
    }
  }
}

/// Converter output, consumed by the evaluator.
#[derive(Debug, Clone)]
pub enum PostfixToken {
  Number(Number),
  Identifier(String),
  Operator(Operator),
  /// Joins the two topmost values into one argument list.
  Comma,
  Function {
    definition: Arc<FunctionDefinition>,
    /// Written as `f()`, so no argument is taken from the stack.
    empty_call: bool,
  },
  Deferred(DeferredArgument),
}

impl fmt::Display for PostfixToken {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PostfixToken::Number(n) => write!(f, "{n}"),
      PostfixToken::Identifier(name) => f.write_str(name),
      PostfixToken::Operator(op) => write!(f, "{op}"),
      PostfixToken::Comma => f.write_str(","),
      PostfixToken::Function { definition, .. } => {
        f.write_str(&definition.name)
      }
      PostfixToken::Deferred(arg) => write!(f, "{{{arg}}}"),
    }
  }
}

/// Renders a postfix program as space separated tokens.
pub fn postfix_to_string(postfix: &[PostfixToken]) -> String {
  postfix
    .iter()
    .map(|t| t.to_string())
    .collect::<Vec<_>>()
    .join(" ")
}

/// An unevaluated sub-expression passed to a deferred parameter, such as
/// the integrand of `int`.
#[derive(Debug, Clone)]
pub struct DeferredArgument {
  /// Signature of the function that owns the parameter.
  pub owner: String,
  pub param: String,
  pub kind: ArgKind,
  pub postfix: Arc<[PostfixToken]>,
  /// Bindings of the call site, installed when the owner is invoked.
  pub scope: Scope,
  /// When set, the single identifier bound to each call argument.
  pub variable: Option<String>,
}

impl DeferredArgument {
  pub fn new(
    owner: &FunctionDefinition,
    index: usize,
    postfix: Vec<PostfixToken>,
  ) -> Self {
    let (param, kind) = owner
      .param(index)
      .map(|p| (p.name.clone(), p.kind))
      .unwrap_or_else(|| (index.to_string(), ArgKind::Function));
    DeferredArgument {
      owner: owner.signature(),
      param,
      kind,
      postfix: postfix.into(),
      scope: Scope::new(),
      variable: None,
    }
  }

  pub fn with_variable(mut self, variable: impl Into<String>) -> Self {
    self.variable = Some(variable.into());
    self
  }

  /// Identifiers referenced directly by this argument, in sorted order and
  /// without repeats.
  pub fn identifiers(&self) -> std::collections::BTreeSet<&str> {
    self
      .postfix
      .iter()
      .filter_map(|token| match token {
        PostfixToken::Identifier(name) => Some(name.as_str()),
        _ => None,
      })
      .collect()
  }

  /// Reads a differential marker such as `x` or `dx` as a variable name.
  /// The marker may only consist of identifiers joined by implicit
  /// multiplication; a leading `d` is dropped when more follows.
  pub fn differential_name(&self) -> Option<String> {
    let mut parts = Vec::new();
    for token in self.postfix.iter() {
      match token {
        PostfixToken::Identifier(name) => parts.push(name.as_str()),
        PostfixToken::Operator(Operator::Mul) => {}
        _ => return None,
      }
    }
    match parts.as_slice() {
      [] => None,
      [single] => Some(single.to_string()),
      ["d", rest @ ..] => Some(rest.concat()),
      _ => None,
    }
  }
}

impl fmt::Display for DeferredArgument {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "argument '{}' of {}", self.param, self.owner)
  }
}

/// A value on the evaluation stack.
#[derive(Debug, Clone)]
pub enum Operand {
  Number(Number),
  List(Vec<Operand>),
  Deferred(DeferredArgument),
}

impl Operand {
  /// Flattens a separator pair into one argument list.
  pub fn join(a: Operand, b: Operand) -> Operand {
    let mut items = match a {
      Operand::List(items) => items,
      other => vec![other],
    };
    match b {
      Operand::List(more) => items.extend(more),
      other => items.push(other),
    }
    Operand::List(items)
  }

  pub fn into_value(self) -> Option<Value> {
    match self {
      Operand::Number(n) => Some(Value::Number(n)),
      Operand::List(items) => items
        .into_iter()
        .map(Operand::into_value)
        .collect::<Option<Vec<_>>>()
        .map(Value::List),
      Operand::Deferred(_) => None,
    }
  }
}

impl From<Value> for Operand {
  fn from(value: Value) -> Self {
    match value {
      Value::Number(n) => Operand::Number(n),
      Value::List(items) => {
        Operand::List(items.into_iter().map(Operand::from).collect())
      }
    }
  }
}

impl fmt::Display for Operand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Operand::Number(n) => write!(f, "{n}"),
      Operand::List(items) => {
        f.write_str("[")?;
        for (i, item) in items.iter().enumerate() {
          if i > 0 {
            f.write_str(", ")?;
          }
          write!(f, "{item}")?;
        }
        f.write_str("]")
      }
      Operand::Deferred(arg) => write!(f, "{arg}"),
    }
  }
}

/// Result of an evaluation: a number or a (possibly nested) list of them.
#[derive(Debug, Clone)]
pub enum Value {
  Number(Number),
  List(Vec<Value>),
}

impl Value {
  pub fn as_number(&self) -> Option<&Number> {
    match self {
      Value::Number(n) => Some(n),
      Value::List(_) => None,
    }
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::Number(n) => match f.precision() {
        Some(p) => write!(f, "{n:.p$}"),
        None => write!(f, "{n}"),
      },
      Value::List(items) => {
        f.write_str("[")?;
        for (i, item) in items.iter().enumerate() {
          if i > 0 {
            f.write_str(", ")?;
          }
          match f.precision() {
            Some(p) => write!(f, "{item:.p$}")?,
            None => write!(f, "{item}")?,
          }
        }
        f.write_str("]")
      }
    }
  }
}
