// Built-in functions are organized by categories
pub mod calculus;
pub mod coordinates;
pub mod math;
pub mod plot;

use crate::evaluator::Evaluator;
use crate::number::{DomainError, Number};
use crate::registry::{ArgKind, FunctionDefinition, Param, Params, Rule};
use crate::syntax::Operand;
use crate::CalcError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
  // basic
  Neg,
  Abs,
  Rad,
  Deg,
  Round,
  Floor,
  Ceil,
  // roots & complex
  Sqrt,
  Root,
  Hypot,
  Real,
  Imag,
  // trigonometric
  Sin,
  Cos,
  Tan,
  Sec,
  Csc,
  Cot,
  Asin,
  Acos,
  Atan,
  // hyperbolic
  Sinh,
  Cosh,
  Tanh,
  // exponential & logarithmic
  Exp,
  Ln,
  Log,
  Logb,
  // combinatorial & random
  Fact,
  Permutations,
  Combinations,
  Fib,
  Rand,
  RandBetween,
  // aggregate
  Min,
  Max,
  // calculus
  Integrate,
  Differentiate,
  // coordinate systems
  Polar,
  Rect,
  CartesianToCylindrical,
  CartesianToSpherical,
  CylindricalToCartesian,
  CylindricalToSpherical,
  SphericalToCartesian,
  SphericalToCylindrical,
}

impl Builtin {
  pub fn is_calculus(self) -> bool {
    matches!(self, Builtin::Integrate | Builtin::Differentiate)
  }

  pub fn is_coordinate(self) -> bool {
    matches!(
      self,
      Builtin::Polar
        | Builtin::Rect
        | Builtin::CartesianToCylindrical
        | Builtin::CartesianToSpherical
        | Builtin::CylindricalToCartesian
        | Builtin::CylindricalToSpherical
        | Builtin::SphericalToCartesian
        | Builtin::SphericalToCylindrical
    )
  }
}

/// Name, parameter names (one per char) and rule of every fixed-arity
/// built-in. `f` and `d` of the calculus functions are deferred.
const TABLE: &[(&str, &str, Builtin)] = &[
  ("neg", "x", Builtin::Neg),
  ("abs", "x", Builtin::Abs),
  ("rad", "θ", Builtin::Rad),
  ("deg", "θ", Builtin::Deg),
  ("round", "x", Builtin::Round),
  ("floor", "x", Builtin::Floor),
  ("ceil", "x", Builtin::Ceil),
  ("sqrt", "x", Builtin::Sqrt),
  ("root", "xn", Builtin::Root),
  ("hypot", "ab", Builtin::Hypot),
  ("real", "c", Builtin::Real),
  ("imag", "c", Builtin::Imag),
  ("sin", "θ", Builtin::Sin),
  ("cos", "θ", Builtin::Cos),
  ("tan", "θ", Builtin::Tan),
  ("sec", "θ", Builtin::Sec),
  ("csc", "θ", Builtin::Csc),
  ("cot", "θ", Builtin::Cot),
  ("asin", "x", Builtin::Asin),
  ("acos", "x", Builtin::Acos),
  ("atan", "x", Builtin::Atan),
  ("sinh", "x", Builtin::Sinh),
  ("cosh", "x", Builtin::Cosh),
  ("tanh", "x", Builtin::Tanh),
  ("exp", "x", Builtin::Exp),
  ("ln", "x", Builtin::Ln),
  ("log", "x", Builtin::Log),
  ("logb", "xb", Builtin::Logb),
  ("fact", "x", Builtin::Fact),
  ("P", "nk", Builtin::Permutations),
  ("C", "nk", Builtin::Combinations),
  ("fib", "n", Builtin::Fib),
  ("rand", "", Builtin::Rand),
  ("randbetween", "ab", Builtin::RandBetween),
  ("int", "fdab", Builtin::Integrate),
  ("integrate", "fdab", Builtin::Integrate),
  ("deriv", "fdx", Builtin::Differentiate),
  ("nderiv", "fdxn", Builtin::Differentiate),
  ("polar", "xy", Builtin::Polar),
  ("rect", "rθ", Builtin::Rect),
  ("crtcyl", "xyz", Builtin::CartesianToCylindrical),
  ("crtsph", "xyz", Builtin::CartesianToSpherical),
  ("cylcrt", "ρφz", Builtin::CylindricalToCartesian),
  ("cylsph", "ρφz", Builtin::CylindricalToSpherical),
  ("sphcrt", "rθφ", Builtin::SphericalToCartesian),
  ("sphcyl", "rθφ", Builtin::SphericalToCylindrical),
];

fn params(names: &str, builtin: Builtin) -> Vec<Param> {
  names
    .chars()
    .map(|c| {
      let kind = match c {
        'f' if builtin.is_calculus() => ArgKind::Function,
        'd' if builtin.is_calculus() => ArgKind::Differential,
        _ => ArgKind::Value,
      };
      Param {
        name: c.to_string(),
        kind,
        optional: false,
      }
    })
    .collect()
}

/// All built-in function definitions.
pub fn definitions() -> Vec<FunctionDefinition> {
  let mut defs: Vec<FunctionDefinition> = TABLE
    .iter()
    .map(|(name, names, builtin)| {
      FunctionDefinition::native(name, params(names, *builtin), *builtin)
    })
    .collect();

  // differentiate(f, d, x[, n])
  let mut differentiate = params("fdxn", Builtin::Differentiate);
  differentiate[3].optional = true;
  defs.push(FunctionDefinition::native(
    "differentiate",
    differentiate,
    Builtin::Differentiate,
  ));

  for (name, builtin) in [("min", Builtin::Min), ("max", Builtin::Max)] {
    defs.push(FunctionDefinition {
      name: name.to_string(),
      params: Params::Unchecked,
      rule: Rule::Native(builtin),
    });
  }
  defs
}

/// Invokes a built-in on already arity-checked arguments.
pub fn call_native(
  ev: &mut Evaluator<'_>,
  def: &FunctionDefinition,
  builtin: Builtin,
  args: Vec<Operand>,
) -> Result<Operand, CalcError> {
  if builtin.is_calculus() {
    return calculus::apply(ev, def, builtin, args);
  }

  let numbers = numeric_args(def, &args)?;
  let result = if builtin.is_coordinate() {
    coordinates::apply(ev.math(), builtin, &numbers)
      .map(|items| Operand::List(items.into_iter().map(Operand::Number).collect()))
  } else {
    math::apply(ev.context_mut(), builtin, &numbers).map(Operand::Number)
  };
  result.map_err(|e| domain_in_function(def, &args, e))
}

/// Extracts plain numbers, rejecting lists and deferred expressions.
pub fn numeric_args(
  def: &FunctionDefinition,
  args: &[Operand],
) -> Result<Vec<Number>, CalcError> {
  args
    .iter()
    .map(|arg| match arg {
      Operand::Number(n) => Ok(n.clone()),
      _ => Err(domain_in_function(
        def,
        args,
        DomainError("arguments must be numbers".to_string()),
      )),
    })
    .collect()
}

pub fn domain_in_function(
  def: &FunctionDefinition,
  args: &[Operand],
  error: DomainError,
) -> CalcError {
  CalcError::Domain(format!(
    "domain error in function {} for argument(s) {}: {}",
    def.signature(),
    Operand::List(args.to_vec()),
    error
  ))
}
