use rand::Rng;

use super::Builtin;
use crate::evaluator::Context;
use crate::number::{DomainError, Number};

/// Applies a numeric built-in. The caller has already checked the arity,
/// so fixed-arity functions index their arguments directly.
pub fn apply(
  ctx: &mut Context,
  builtin: Builtin,
  args: &[Number],
) -> Result<Number, DomainError> {
  let Context { math, rng, .. } = ctx;
  let arg = |i: usize| -> Result<&Number, DomainError> {
    args
      .get(i)
      .ok_or_else(|| DomainError(format!("missing argument {}", i + 1)))
  };

  match builtin {
    Builtin::Neg => Ok(math.neg(arg(0)?)),
    Builtin::Abs => Ok(math.abs(arg(0)?)),
    Builtin::Rad => Ok(math.radians(arg(0)?)),
    Builtin::Deg => Ok(math.degrees(arg(0)?)),
    Builtin::Round => Ok(math.round(arg(0)?)),
    Builtin::Floor => Ok(math.floor(arg(0)?)),
    Builtin::Ceil => Ok(math.ceil(arg(0)?)),

    Builtin::Sqrt => Ok(math.sqrt(arg(0)?)),
    Builtin::Root => math.root(arg(0)?, arg(1)?),
    Builtin::Hypot => Ok(math.hypot(arg(0)?, arg(1)?)),
    Builtin::Real => Ok(math.real(arg(0)?)),
    Builtin::Imag => Ok(math.imag(arg(0)?)),

    Builtin::Sin => Ok(math.sin(arg(0)?)),
    Builtin::Cos => Ok(math.cos(arg(0)?)),
    Builtin::Tan => math.tan(arg(0)?),
    Builtin::Sec => math.sec(arg(0)?),
    Builtin::Csc => math.csc(arg(0)?),
    Builtin::Cot => math.cot(arg(0)?),
    Builtin::Asin => math.asin(arg(0)?),
    Builtin::Acos => math.acos(arg(0)?),
    Builtin::Atan => math.atan(arg(0)?),

    Builtin::Sinh => Ok(math.sinh(arg(0)?)),
    Builtin::Cosh => Ok(math.cosh(arg(0)?)),
    Builtin::Tanh => math.tanh(arg(0)?),

    Builtin::Exp => Ok(math.exp(arg(0)?)),
    Builtin::Ln => math.ln(arg(0)?),
    Builtin::Log => math.log10(arg(0)?),
    Builtin::Logb => math.log(arg(0)?, arg(1)?),

    Builtin::Fact => math.factorial(arg(0)?),
    Builtin::Permutations => math.permutations(arg(0)?, arg(1)?),
    Builtin::Combinations => math.binomial(arg(0)?, arg(1)?),
    Builtin::Fib => math.fibonacci(arg(0)?),
    Builtin::Rand => Ok(math.from_f64(rng.gen::<f64>())),
    Builtin::RandBetween => {
      let (low, high) = (arg(0)?, arg(1)?);
      let unit = math.from_f64(rng.gen::<f64>());
      let span = math.sub(high, low);
      Ok(math.add(&math.mul(&unit, &span), low))
    }

    Builtin::Min | Builtin::Max => {
      let (first, rest) = args
        .split_first()
        .ok_or_else(|| DomainError("at least one argument is required".to_string()))?;
      let mut best = first;
      for candidate in rest {
        let replace = if builtin == Builtin::Min {
          math.is_less(candidate, best)?
        } else {
          math.is_less(best, candidate)?
        };
        if replace {
          best = candidate;
        }
      }
      // a single complex argument is not comparable either
      math.is_less(best, best)?;
      Ok(best.clone())
    }

    Builtin::Integrate
    | Builtin::Differentiate
    | Builtin::Polar
    | Builtin::Rect
    | Builtin::CartesianToCylindrical
    | Builtin::CartesianToSpherical
    | Builtin::CylindricalToCartesian
    | Builtin::CylindricalToSpherical
    | Builtin::SphericalToCartesian
    | Builtin::SphericalToCylindrical => Err(DomainError(format!(
      "{builtin:?} is not a scalar function"
    ))),
  }
}
