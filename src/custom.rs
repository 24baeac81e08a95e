//! User definitions of the form `name(a,b) = body`.

use std::collections::HashSet;
use std::sync::Arc;

use crate::evaluator::Context;
use crate::postfix::convert;
use crate::registry::{ArgKind, FunctionDefinition, Param, Params, Registry, Rule, ANSWER};
use crate::syntax::PostfixToken;
use crate::tokenizer::tokenize;
use crate::CalcError;

fn is_identifier(name: &str) -> bool {
  let mut chars = name.chars();
  match chars.next() {
    Some(first) if first.is_alphabetic() || first == '_' => {
      chars.all(|c| c.is_alphanumeric() || c == '_')
    }
    _ => false,
  }
}

/// Splits `name(a,b)=body` into its name, parameters and body.
fn split_definition(text: &str) -> Result<(String, Vec<String>, String), CalcError> {
  let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
  let (signature, body) = compact
    .split_once('=')
    .ok_or_else(|| CalcError::Syntax(format!("missing '=' in definition: {text}")))?;

  let (name, params) = match signature.split_once('(') {
    Some((name, rest)) => {
      let inner = rest.strip_suffix(')').ok_or_else(|| {
        CalcError::Syntax(format!("invalid function signature: {signature}"))
      })?;
      let params = if inner.is_empty() {
        Vec::new()
      } else {
        inner.split(',').map(str::to_string).collect()
      };
      (name, params)
    }
    None => (signature, Vec::new()),
  };
  Ok((name.to_string(), params, body.to_string()))
}

fn check_name(registry: &Registry, name: &str) -> Result<(), CalcError> {
  if registry.is_builtin(name) {
    Err(CalcError::Permission(format!("cannot redefine built-in function: {name}")))
  } else if registry.is_constant(name) || name == ANSWER {
    Err(CalcError::Permission(format!("cannot redefine built-in constant: {name}")))
  } else if !is_identifier(name) {
    Err(CalcError::Syntax(format!("invalid function name: {name}")))
  } else {
    Ok(())
  }
}

fn check_params(registry: &Registry, name: &str, params: &[String]) -> Result<(), CalcError> {
  let mut seen = HashSet::new();
  for param in params {
    if param == name {
      return Err(CalcError::Domain(format!(
        "function argument name cannot be the same as the function name: {param}"
      )));
    }
    if !is_identifier(param) {
      return Err(CalcError::Syntax(format!("invalid function argument name: {param}")));
    }
    if registry.contains_name(param) {
      return Err(CalcError::Permission(format!(
        "argument name is already a defined function/constant name: {param}"
      )));
    }
    if !seen.insert(param.as_str()) {
      return Err(CalcError::Syntax(format!("duplicate argument name: {param}")));
    }
  }
  Ok(())
}

/// Every identifier the body reads must be a parameter, a constant or
/// `ans`. Inside a deferred argument the variable named by the
/// differential marker that follows it is bound as well.
fn check_body(
  registry: &Registry,
  bound: &HashSet<String>,
  postfix: &[PostfixToken],
) -> Result<(), CalcError> {
  for (i, token) in postfix.iter().enumerate() {
    match token {
      PostfixToken::Identifier(ident) => {
        let known = ident == ANSWER || registry.is_constant(ident) || bound.contains(ident);
        if !known {
          return Err(CalcError::Name(format!(
            "token is not defined in function signature: {ident}"
          )));
        }
      }
      PostfixToken::Deferred(argument) if argument.kind == ArgKind::Function => {
        let mut inner = bound.clone();
        if let Some(PostfixToken::Deferred(marker)) = postfix.get(i + 1) {
          if marker.kind == ArgKind::Differential {
            inner.extend(marker.differential_name());
          }
        }
        check_body(registry, &inner, &argument.postfix)?;
      }
      _ => {}
    }
  }
  Ok(())
}

/// Parses and validates a definition without registering it.
pub fn parse(
  registry: &Registry,
  context: &mut Context,
  text: &str,
) -> Result<FunctionDefinition, CalcError> {
  let (name, params, body) = split_definition(text)?;
  check_name(registry, &name)?;
  check_params(registry, &name, &params)?;

  let locals: Vec<&str> = params.iter().map(String::as_str).collect();
  let tokens = tokenize(&body, registry, &locals)?;
  let postfix = convert(&tokens, registry, &mut context.math)?;
  let bound: HashSet<String> = params.iter().cloned().collect();
  check_body(registry, &bound, &postfix)?;

  Ok(FunctionDefinition {
    name,
    params: Params::Fixed(params.into_iter().map(Param::value).collect()),
    rule: Rule::Program {
      body,
      postfix: postfix.into(),
    },
  })
}

/// Parses a definition and registers it, replacing any earlier one.
pub fn define(
  registry: &mut Registry,
  context: &mut Context,
  text: &str,
) -> Result<Arc<FunctionDefinition>, CalcError> {
  let definition = parse(registry, context, text)?;
  context.commit()?;
  let replaced = registry.custom(&definition.name).is_some();
  let definition = registry.insert_custom(definition);
  tracing::info!(definition = %definition, replaced, "defined custom function");
  Ok(definition)
}

pub fn remove(
  registry: &mut Registry,
  context: &mut Context,
  name: &str,
) -> Result<Arc<FunctionDefinition>, CalcError> {
  if registry.is_builtin(name) {
    return Err(CalcError::Permission(format!("cannot remove built-in function: {name}")));
  }
  if registry.is_constant(name) || name == ANSWER {
    return Err(CalcError::Permission(format!("cannot remove built-in constant: {name}")));
  }
  if registry.custom(name).is_none() {
    return Err(CalcError::Name(format!("custom function does not exist: {name}")));
  }
  let callers = registry.callers(name);
  if !callers.is_empty() {
    return Err(CalcError::Permission(format!(
      "cannot remove {name}: still called by {}",
      callers.join(", ")
    )));
  }
  context.commit()?;
  let removed = registry
    .remove_custom(name)
    .ok_or_else(|| CalcError::Name(format!("custom function does not exist: {name}")))?;
  tracing::info!(name, "removed custom function");
  Ok(removed)
}
