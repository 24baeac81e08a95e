use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::functions::{self, Builtin};
use crate::number::{MathContext, Number};
use crate::syntax::PostfixToken;

/// Name of the last-answer register.
pub const ANSWER: &str = "ans";

/// How a parameter receives its argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
  /// An evaluated number.
  Value,
  /// An unevaluated expression, called back with values.
  Function,
  /// An unevaluated variable marker such as `dx`.
  Differential,
}

impl ArgKind {
  pub fn is_deferred(self) -> bool {
    !matches!(self, ArgKind::Value)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
  pub name: String,
  pub kind: ArgKind,
  pub optional: bool,
}

impl Param {
  pub fn value(name: impl Into<String>) -> Self {
    Param {
      name: name.into(),
      kind: ArgKind::Value,
      optional: false,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Params {
  Fixed(Vec<Param>),
  /// Any number of arguments is accepted.
  Unchecked,
}

#[derive(Debug, Clone)]
pub enum Rule {
  Native(Builtin),
  /// A user definition: its whitespace-free body and the compiled program.
  Program {
    body: String,
    postfix: Arc<[PostfixToken]>,
  },
}

#[derive(Debug, Clone)]
pub struct FunctionDefinition {
  pub name: String,
  pub params: Params,
  pub rule: Rule,
}

impl FunctionDefinition {
  pub fn native(name: &str, params: Vec<Param>, builtin: Builtin) -> Self {
    FunctionDefinition {
      name: name.to_string(),
      params: Params::Fixed(params),
      rule: Rule::Native(builtin),
    }
  }

  pub fn param(&self, index: usize) -> Option<&Param> {
    match &self.params {
      Params::Fixed(params) => params.get(index),
      Params::Unchecked => None,
    }
  }

  pub fn param_names(&self) -> Vec<&str> {
    match &self.params {
      Params::Fixed(params) => params.iter().map(|p| p.name.as_str()).collect(),
      Params::Unchecked => Vec::new(),
    }
  }

  /// Number of declared parameters, `None` when unchecked.
  pub fn arity(&self) -> Option<usize> {
    match &self.params {
      Params::Fixed(params) => Some(params.len()),
      Params::Unchecked => None,
    }
  }

  pub fn required_arity(&self) -> Option<usize> {
    match &self.params {
      Params::Fixed(params) => Some(params.iter().filter(|p| !p.optional).count()),
      Params::Unchecked => None,
    }
  }

  pub fn is_deferred(&self, index: usize) -> bool {
    self.param(index).is_some_and(|p| p.kind.is_deferred())
  }

  pub fn has_deferred(&self) -> bool {
    match &self.params {
      Params::Fixed(params) => params.iter().any(|p| p.kind.is_deferred()),
      Params::Unchecked => false,
    }
  }

  pub fn is_custom(&self) -> bool {
    matches!(self.rule, Rule::Program { .. })
  }

  /// Names of the user definitions called from the body, including calls
  /// inside deferred arguments. Empty for built-ins.
  pub fn custom_calls(&self) -> BTreeSet<&str> {
    let mut calls = BTreeSet::new();
    if let Rule::Program { postfix, .. } = &self.rule {
      collect_custom_calls(postfix, &mut calls);
    }
    calls
  }

  /// `name(a, b)`, or `name(?)` when the arity is unchecked.
  pub fn signature(&self) -> String {
    match &self.params {
      Params::Fixed(_) => format!("{}({})", self.name, self.param_names().join(", ")),
      Params::Unchecked => format!("{}(?)", self.name),
    }
  }
}

impl PartialEq for FunctionDefinition {
  fn eq(&self, other: &Self) -> bool {
    let same_rule = match (&self.rule, &other.rule) {
      (Rule::Native(a), Rule::Native(b)) => a == b,
      (Rule::Program { body: a, .. }, Rule::Program { body: b, .. }) => a == b,
      _ => false,
    };
    self.name == other.name && self.params == other.params && same_rule
  }
}

fn collect_custom_calls<'a>(postfix: &'a [PostfixToken], calls: &mut BTreeSet<&'a str>) {
  for token in postfix {
    match token {
      PostfixToken::Function { definition, .. } if definition.is_custom() => {
        calls.insert(definition.name.as_str());
      }
      PostfixToken::Deferred(argument) => collect_custom_calls(&argument.postfix, calls),
      _ => {}
    }
  }
}

/// Canonical form. User definitions print as `name(a,b) = body` (or
/// `name = body` without parameters) and parse back to an equal definition.
impl fmt::Display for FunctionDefinition {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.rule {
      Rule::Program { body, .. } => {
        let params = self.param_names();
        if params.is_empty() {
          write!(f, "{} = {}", self.name, body)
        } else {
          write!(f, "{}({}) = {}", self.name, params.join(","), body)
        }
      }
      Rule::Native(_) => f.write_str(&self.signature()),
    }
  }
}

/// Every name the engine knows, split into three namespaces. Lookups
/// consult built-in functions first, then constants, then user
/// definitions.
#[derive(Debug, Clone)]
pub struct Registry {
  builtins: HashMap<String, Arc<FunctionDefinition>>,
  constants: HashMap<String, Number>,
  customs: HashMap<String, Arc<FunctionDefinition>>,
  /// Definition order of `customs`.
  order: Vec<String>,
}

impl Registry {
  pub fn new(math: &mut MathContext) -> Self {
    let builtins = functions::definitions()
      .into_iter()
      .map(|def| (def.name.clone(), Arc::new(def)))
      .collect();

    let mut constants = HashMap::new();
    constants.insert("pi".to_string(), math.pi());
    constants.insert("π".to_string(), math.pi());
    constants.insert("e".to_string(), math.e());
    constants.insert("i".to_string(), math.imaginary_unit());
    constants.insert("inf".to_string(), math.infinity());

    Registry {
      builtins,
      constants,
      customs: HashMap::new(),
      order: Vec::new(),
    }
  }

  pub fn builtin(&self, name: &str) -> Option<&Arc<FunctionDefinition>> {
    self.builtins.get(name)
  }

  pub fn constant(&self, name: &str) -> Option<&Number> {
    self.constants.get(name)
  }

  pub fn custom(&self, name: &str) -> Option<&Arc<FunctionDefinition>> {
    self.customs.get(name)
  }

  /// A callable definition, built-in or user-defined.
  pub fn function(&self, name: &str) -> Option<&Arc<FunctionDefinition>> {
    if self.constants.contains_key(name) {
      return None;
    }
    self.builtin(name).or_else(|| self.custom(name))
  }

  pub fn is_builtin(&self, name: &str) -> bool {
    self.builtins.contains_key(name)
  }

  pub fn is_constant(&self, name: &str) -> bool {
    self.constants.contains_key(name)
  }

  /// Names that user definitions may never take.
  pub fn is_reserved(&self, name: &str) -> bool {
    name == ANSWER || self.is_builtin(name) || self.is_constant(name)
  }

  pub fn contains_name(&self, name: &str) -> bool {
    self.is_reserved(name) || self.customs.contains_key(name)
  }

  /// Adds or replaces a user definition. A replaced definition keeps its
  /// place in the definition order.
  pub fn insert_custom(
    &mut self,
    definition: FunctionDefinition,
  ) -> Arc<FunctionDefinition> {
    let definition = Arc::new(definition);
    let name = definition.name.clone();
    if self
      .customs
      .insert(name.clone(), definition.clone())
      .is_none()
    {
      self.order.push(name);
    }
    definition
  }

  pub fn remove_custom(&mut self, name: &str) -> Option<Arc<FunctionDefinition>> {
    let removed = self.customs.remove(name)?;
    self.order.retain(|n| n != name);
    Some(removed)
  }

  /// User definitions other than `name` whose bodies call it.
  pub fn callers(&self, name: &str) -> Vec<&str> {
    self
      .customs()
      .filter(|d| d.name != name && d.custom_calls().contains(name))
      .map(|d| d.name.as_str())
      .collect()
  }

  /// User definitions in definition order.
  pub fn customs(&self) -> impl Iterator<Item = &Arc<FunctionDefinition>> {
    self.order.iter().filter_map(|name| self.customs.get(name))
  }

  pub fn builtins(&self) -> impl Iterator<Item = &Arc<FunctionDefinition>> {
    self.builtins.values()
  }
}
