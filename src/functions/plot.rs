use crate::evaluator::Evaluator;
use crate::registry::Registry;
use crate::syntax::Operand;
use crate::{CalcError, Context};

/// `n` evenly spaced points from `low` to `high`, both included.
pub fn linspace(low: f64, high: f64, n: usize) -> Vec<f64> {
  match n {
    0 => Vec::new(),
    1 => vec![low],
    _ => {
      let step = (high - low) / (n - 1) as f64;
      (0..n)
        .map(|i| if i == n - 1 { high } else { low + step * i as f64 })
        .collect()
    }
  }
}

/// Samples a one-parameter function on `[xlow, xhigh]`.
pub fn plot(
  registry: &Registry,
  context: &mut Context,
  name: &str,
  xlow: f64,
  xhigh: f64,
  samples: usize,
) -> Result<Vec<(f64, f64)>, CalcError> {
  let definition = registry
    .function(name)
    .cloned()
    .ok_or_else(|| CalcError::Name(format!("function does not exist: {name}")))?;

  let arity = definition.arity();
  if arity != Some(1) || definition.has_deferred() {
    let takes = arity.map_or_else(|| "any number of".to_string(), |n| n.to_string());
    return Err(CalcError::Domain(format!(
      "function is not one dimensional: {} takes {} arguments",
      definition.signature(),
      takes
    )));
  }
  let variable = definition.param_names().join("");

  let mut evaluator = Evaluator::new(registry, context, Default::default());
  let mut points = Vec::with_capacity(samples);
  for x in linspace(xlow, xhigh, samples) {
    let argument = evaluator.math().from_f64(x);
    let y = match evaluator.call(&definition, vec![Operand::Number(argument)])? {
      Operand::Number(y) => y.normalize(),
      other => {
        return Err(CalcError::Domain(format!(
          "cannot plot multiple outputs at {variable}={x}: {other}"
        )))
      }
    };
    let Some(y) = y.to_f64() else {
      return Err(CalcError::Domain(format!(
        "cannot plot imaginary output at {variable}={x}: {y}"
      )));
    };
    points.push((x, y));
  }
  tracing::debug!(function = %definition.signature(), samples = points.len(), "sampled");
  Ok(points)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn linspace_includes_both_ends() {
    assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    assert_eq!(linspace(2.0, 3.0, 1), vec![2.0]);
    assert!(linspace(2.0, 3.0, 0).is_empty());
  }
}
