use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::functions::{self, numeric_args};
use crate::host::CancelToken;
use crate::number::{MathContext, Number};
use crate::registry::{FunctionDefinition, Registry, Rule, ANSWER};
use crate::syntax::{DeferredArgument, Operand, Operator, PostfixToken, Scope, Value};
use crate::CalcError;

/// Deepest nesting of user definition calls, reached by definitions that
/// call themselves through a later redefinition.
const MAX_CALL_DEPTH: usize = 32;

/// Mutable state shared by every evaluation of a session.
pub struct Context {
  pub math: MathContext,
  /// Result of the last top-level evaluation, read through `ans`.
  pub answer: Value,
  pub rng: StdRng,
  pub cancel: Option<Arc<CancelToken>>,
  /// User definition calls currently running.
  depth: usize,
}

impl Context {
  pub fn new(math: MathContext) -> Self {
    let answer = Value::Number(math.integer(0));
    Context {
      math,
      answer,
      rng: StdRng::from_entropy(),
      cancel: None,
      depth: 0,
    }
  }

  /// Uses a fixed random seed, for reproducible `rand()` results.
  pub fn seed(&mut self, seed: u64) {
    self.rng = StdRng::seed_from_u64(seed);
  }

  pub fn check_cancelled(&self) -> Result<(), CalcError> {
    match &self.cancel {
      Some(token) if token.is_cancelled() => Err(CalcError::Cancelled),
      _ => Ok(()),
    }
  }

  /// Must succeed before the session state is changed. Once committed, a
  /// running job is no longer abandoned by its host.
  pub fn commit(&self) -> Result<(), CalcError> {
    match &self.cancel {
      Some(token) if !token.commit() => Err(CalcError::Cancelled),
      _ => Ok(()),
    }
  }
}

impl std::fmt::Debug for Context {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Context")
      .field("math", &self.math)
      .field("answer", &self.answer)
      .finish()
  }
}

/// Stack machine over a postfix program.
pub struct Evaluator<'a> {
  registry: &'a Registry,
  context: &'a mut Context,
  scope: Scope,
}

fn pop(stack: &mut Vec<Operand>) -> Result<Operand, CalcError> {
  stack.pop().ok_or_else(|| {
    CalcError::Syntax(
      "ran out of tokens during evaluation, make sure all operators and \
       functions have valid inputs and check implicit multiplication"
        .to_string(),
    )
  })
}

impl<'a> Evaluator<'a> {
  pub fn new(registry: &'a Registry, context: &'a mut Context, scope: Scope) -> Self {
    let scope = scope
      .into_iter()
      .map(|(name, value)| (name, value.normalize()))
      .collect();
    Evaluator {
      registry,
      context,
      scope,
    }
  }

  pub fn registry(&self) -> &Registry {
    self.registry
  }

  pub fn math(&mut self) -> &mut MathContext {
    &mut self.context.math
  }

  pub fn context_mut(&mut self) -> &mut Context {
    self.context
  }

  /// An evaluator for a nested program, sharing this one's context.
  fn nested(&mut self, scope: Scope) -> Evaluator<'_> {
    Evaluator::new(self.registry, self.context, scope)
  }

  pub fn run(&mut self, postfix: &[PostfixToken]) -> Result<Operand, CalcError> {
    let mut stack: Vec<Operand> = Vec::new();

    for token in postfix {
      self.context.check_cancelled()?;
      match token {
        PostfixToken::Number(n) => stack.push(Operand::Number(n.clone())),
        PostfixToken::Deferred(arg) => stack.push(Operand::Deferred(arg.clone())),
        PostfixToken::Identifier(name) => stack.push(self.resolve(name)?),
        PostfixToken::Operator(op) => {
          let b = pop(&mut stack)?;
          let a = pop(&mut stack)?;
          stack.push(self.apply_operator(*op, a, b)?);
        }
        PostfixToken::Comma => {
          let b = pop(&mut stack)?;
          let a = pop(&mut stack)?;
          stack.push(Operand::join(a, b));
        }
        PostfixToken::Function {
          definition,
          empty_call,
        } => {
          // user definitions are looked up by name at call time
          let registry = self.registry;
          let definition = if definition.is_custom() {
            registry.custom(&definition.name).ok_or_else(|| {
              CalcError::Name(format!("custom function does not exist: {}", definition.name))
            })?
          } else {
            definition
          };
          let args = if *empty_call || definition.arity() == Some(0) || stack.is_empty() {
            Vec::new()
          } else {
            match pop(&mut stack)? {
              Operand::List(items) => items,
              single => vec![single],
            }
          };
          let result = self.call(definition, args)?;
          stack.push(result);
        }
      }
    }

    if stack.len() > 1 {
      return Err(CalcError::Syntax(
        "leftover tokens after evaluation, make sure all operators and \
         functions have valid inputs"
          .to_string(),
      ));
    }
    pop(&mut stack)
  }

  fn resolve(&self, name: &str) -> Result<Operand, CalcError> {
    if name == ANSWER {
      return Ok(self.context.answer.clone().into());
    }
    if let Some(value) = self.scope.get(name) {
      return Ok(Operand::Number(value.clone()));
    }
    if let Some(value) = self.registry.constant(name) {
      return Ok(Operand::Number(value.clone()));
    }
    Err(CalcError::Name(format!("undefined token '{name}'")))
  }

  fn apply_operator(
    &mut self,
    op: Operator,
    a: Operand,
    b: Operand,
  ) -> Result<Operand, CalcError> {
    let domain = |reason: &dyn std::fmt::Display| {
      CalcError::Domain(format!(
        "domain error for operator '{op}' at {a} {op} {b}: {reason}"
      ))
    };
    let (Operand::Number(x), Operand::Number(y)) = (&a, &b) else {
      return Err(domain(&"operands must be numbers"));
    };
    let math = &mut self.context.math;
    let result = match op {
      Operator::Add => Ok(math.add(x, y)),
      Operator::Sub => Ok(math.sub(x, y)),
      Operator::Mul => Ok(math.mul(x, y)),
      Operator::Div => math.div(x, y),
      Operator::Rem => math.rem(x, y),
      Operator::Pow => math.pow(x, y),
    };
    result.map(Operand::Number).map_err(|e| domain(&e))
  }

  /// Calls a function with an argument list, checking its arity first.
  pub fn call(
    &mut self,
    definition: &FunctionDefinition,
    mut args: Vec<Operand>,
  ) -> Result<Operand, CalcError> {
    check_arity(definition, args.len())?;

    for (i, arg) in args.iter_mut().enumerate() {
      match arg {
        Operand::Deferred(deferred) => deferred.scope = self.scope.clone(),
        _ if definition.is_deferred(i) => {
          return Err(CalcError::Syntax(format!(
            "argument {} of {} must be an expression",
            i + 1,
            definition.signature()
          )));
        }
        _ => {}
      }
    }

    match &definition.rule {
      Rule::Native(builtin) => functions::call_native(self, definition, *builtin, args),
      Rule::Program { postfix, .. } => {
        let values = numeric_args(definition, &args)?;
        let mut scope = self.scope.clone();
        for (name, value) in definition.param_names().into_iter().zip(values) {
          scope.insert(name.to_string(), value);
        }
        if self.context.depth >= MAX_CALL_DEPTH {
          return Err(CalcError::Domain(format!(
            "maximum call depth of {MAX_CALL_DEPTH} exceeded in {}",
            definition.signature()
          )));
        }
        self.context.depth += 1;
        let result = self.nested(scope).run(postfix);
        self.context.depth -= 1;
        result
      }
    }
  }

  /// Evaluates a deferred argument with `values` bound to its variables:
  /// the marked variable when one is set, otherwise its free identifiers
  /// in sorted order.
  pub fn call_deferred(
    &mut self,
    argument: &DeferredArgument,
    values: Vec<Number>,
  ) -> Result<Operand, CalcError> {
    let mut scope = argument.scope.clone();
    match &argument.variable {
      Some(variable) => {
        let [value] = <[Number; 1]>::try_from(values).map_err(|values| {
          CalcError::Arity(format!(
            "{argument} expected 1 argument but {} were given",
            values.len()
          ))
        })?;
        scope.insert(variable.clone(), value);
      }
      None => {
        let free = self.free_variables(argument);
        if free.len() != values.len() {
          return Err(CalcError::Syntax(format!(
            "{} argument(s) passed to {}, but {} variable(s) found: {}",
            values.len(),
            argument,
            free.len(),
            free.join(", ")
          )));
        }
        scope.extend(free.into_iter().zip(values));
      }
    }
    self.nested(scope).run(&argument.postfix)
  }

  /// Identifiers of a deferred argument that nothing binds yet.
  pub fn free_variables(&self, argument: &DeferredArgument) -> Vec<String> {
    argument
      .identifiers()
      .into_iter()
      .filter(|name| {
        *name != ANSWER
          && !argument.scope.contains_key(*name)
          && !self.registry.contains_name(name)
      })
      .map(str::to_string)
      .collect()
  }

  /// Evaluates a deferred argument at a point and requires a number back.
  pub fn apply_at(
    &mut self,
    argument: &DeferredArgument,
    x: &Number,
  ) -> Result<Number, CalcError> {
    match self.call_deferred(argument, vec![x.clone()])? {
      Operand::Number(n) => Ok(n),
      other => Err(CalcError::Domain(format!(
        "{argument} must evaluate to a single number, got {other}"
      ))),
    }
  }
}

pub fn check_arity(definition: &FunctionDefinition, given: usize) -> Result<(), CalcError> {
  let (Some(total), Some(required)) = (definition.arity(), definition.required_arity()) else {
    return Ok(());
  };
  if (required..=total).contains(&given) {
    return Ok(());
  }
  let expected = if required == total {
    format!("{total} argument{}", if total == 1 { "" } else { "s" })
  } else {
    format!("{required} to {total} arguments")
  };
  Err(CalcError::Arity(format!(
    "function {} expected {} but {} {} given",
    definition.signature(),
    expected,
    given,
    if given == 1 { "was" } else { "were" }
  )))
}
