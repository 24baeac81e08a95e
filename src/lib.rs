use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

pub mod config;
pub mod custom;
pub mod evaluator;
pub mod functions;
pub mod host;
pub mod number;
pub mod postfix;
pub mod registry;
pub mod store;
pub mod syntax;
pub mod tokenizer;

pub use config::EngineConfig;
pub use evaluator::Context;
pub use number::{MathContext, Number};
pub use registry::{FunctionDefinition, Registry};
pub use store::{Store, StoreError};
pub use syntax::{Scope, Value};

use evaluator::Evaluator;

#[derive(Error, Debug)]
pub enum CalcError {
  #[error("SyntaxError: {0}")]
  Syntax(String),
  #[error("NameError: {0}")]
  Name(String),
  #[error("PermissionError: {0}")]
  Permission(String),
  #[error("ValueError: {0}")]
  Domain(String),
  #[error("TypeError: {0}")]
  Arity(String),
  #[error("TimeoutError: calculation took longer than {0:?}")]
  Timeout(Duration),
  #[error("calculation was cancelled")]
  Cancelled,
  #[error("StoreError: {0}")]
  Store(#[from] StoreError),
}

/// Evaluates an expression. On success the result becomes the new `ans`.
pub fn evaluate(
  registry: &Registry,
  context: &mut Context,
  text: &str,
  scope: &Scope,
) -> Result<Value, CalcError> {
  let locals: Vec<&str> = scope.keys().map(String::as_str).collect();
  let tokens = tokenizer::tokenize(text, registry, &locals)?;
  let postfix = postfix::convert(&tokens, registry, &mut context.math)?;
  let result = Evaluator::new(registry, context, scope.clone()).run(&postfix)?;
  let value = result.into_value().ok_or_else(|| {
    CalcError::Syntax("an expression argument cannot be a result".to_string())
  })?;
  context.commit()?;
  context.answer = value.clone();
  Ok(value)
}

/// Registers a user definition such as `f(x) = x^2`.
pub fn define(
  registry: &mut Registry,
  context: &mut Context,
  text: &str,
) -> Result<Arc<FunctionDefinition>, CalcError> {
  custom::define(registry, context, text)
}

/// Removes a user definition.
pub fn remove(
  registry: &mut Registry,
  context: &mut Context,
  name: &str,
) -> Result<Arc<FunctionDefinition>, CalcError> {
  custom::remove(registry, context, name)
}

/// Samples a one-parameter function at `samples` evenly spaced points.
pub fn plot(
  registry: &Registry,
  context: &mut Context,
  name: &str,
  xlow: f64,
  xhigh: f64,
  samples: usize,
) -> Result<Vec<(f64, f64)>, CalcError> {
  functions::plot::plot(registry, context, name, xlow, xhigh, samples)
}

/// Renders a result; lists print as `[a, b, ...]`.
pub fn format_value(value: &Value) -> String {
  value.to_string()
}

/// A registry with its evaluation context and optional definition store.
#[derive(Debug)]
pub struct Session {
  registry: Registry,
  context: Context,
  store: Option<Store>,
  config: EngineConfig,
}

impl Session {
  /// Creates a session and re-applies the stored definitions, if any.
  /// Stored definitions that no longer parse are skipped.
  pub fn new(config: EngineConfig) -> Result<Self, CalcError> {
    let mut math = MathContext::new(config.digits)
      .map_err(|e| CalcError::Domain(e.to_string()))?;
    let registry = Registry::new(&mut math);
    let mut session = Session {
      registry,
      context: Context::new(math),
      store: config.store.clone().map(Store::new),
      config,
    };
    session.load()?;
    Ok(session)
  }

  fn load(&mut self) -> Result<(), CalcError> {
    let Some(store) = &self.store else {
      return Ok(());
    };
    let stored = store.read()?;
    // callers stored before their callees load on a later pass
    let mut pending: Vec<&String> = stored.custom_functions.iter().collect();
    let mut loaded = 0;
    loop {
      let attempted = pending.len();
      let mut failed = Vec::new();
      for text in pending {
        match custom::define(&mut self.registry, &mut self.context, text) {
          Ok(_) => loaded += 1,
          Err(e) => failed.push((text, e)),
        }
      }
      if failed.is_empty() || failed.len() == attempted {
        for (text, e) in failed {
          tracing::warn!(definition = %text, error = %e, "skipping stored definition");
        }
        break;
      }
      pending = failed.into_iter().map(|(text, _)| text).collect();
    }
    tracing::info!(path = %store.path().display(), loaded, "loaded definitions");
    Ok(())
  }

  fn save(&self) -> Result<(), CalcError> {
    if let Some(store) = &self.store {
      store.write(self.registry.customs().map(|d| d.as_ref()))?;
    }
    Ok(())
  }

  pub fn config(&self) -> &EngineConfig {
    &self.config
  }

  pub fn registry(&self) -> &Registry {
    &self.registry
  }

  pub fn context(&self) -> &Context {
    &self.context
  }

  pub fn context_mut(&mut self) -> &mut Context {
    &mut self.context
  }

  pub fn answer(&self) -> &Value {
    &self.context.answer
  }

  pub fn evaluate(&mut self, text: &str, scope: &Scope) -> Result<Value, CalcError> {
    evaluate(&self.registry, &mut self.context, text, scope)
  }

  /// Evaluates without bindings and formats the result.
  pub fn interpret(&mut self, text: &str) -> Result<String, CalcError> {
    let value = self.evaluate(text, &Scope::new())?;
    Ok(self.format(&value))
  }

  /// Adds or replaces a definition and saves the store. When saving fails
  /// the registry is left as it was.
  pub fn define(&mut self, text: &str) -> Result<Arc<FunctionDefinition>, CalcError> {
    let previous = self.registry.clone();
    let definition = define(&mut self.registry, &mut self.context, text)?;
    self.save_or_restore(previous)?;
    Ok(definition)
  }

  pub fn remove(&mut self, name: &str) -> Result<Arc<FunctionDefinition>, CalcError> {
    let previous = self.registry.clone();
    let definition = remove(&mut self.registry, &mut self.context, name)?;
    self.save_or_restore(previous)?;
    Ok(definition)
  }

  fn save_or_restore(&mut self, previous: Registry) -> Result<(), CalcError> {
    if let Err(e) = self.save() {
      tracing::warn!(error = %e, "store not written, change undone");
      self.registry = previous;
      return Err(e);
    }
    Ok(())
  }

  pub fn plot(
    &mut self,
    name: &str,
    xlow: f64,
    xhigh: f64,
    samples: usize,
  ) -> Result<Vec<(f64, f64)>, CalcError> {
    plot(&self.registry, &mut self.context, name, xlow, xhigh, samples)
  }

  /// Formats a value with the session's number of digits.
  pub fn format(&self, value: &Value) -> String {
    format!("{:.*}", self.config.digits, value)
  }
}
