//! Numerical integration and differentiation of deferred expressions.
//!
//! `int(f, d, a, b)` integrates with tanh-sinh quadrature, mapping infinite
//! bounds onto finite intervals first. `deriv(f, d, x)` and
//! `nderiv(f, d, x, n)` take central finite differences with a step scaled
//! to the working precision.

use super::{domain_in_function, Builtin};
use crate::evaluator::Evaluator;
use crate::number::{DomainError, MathContext, Number};
use crate::registry::{ArgKind, FunctionDefinition};
use crate::syntax::{DeferredArgument, Operand};
use crate::CalcError;

/// Quadrature levels after the first; each halves the step.
const MAX_LEVEL: usize = 8;
/// Highest derivative order accepted.
const MAX_ORDER: i64 = 32;

pub fn apply(
  ev: &mut Evaluator<'_>,
  def: &FunctionDefinition,
  builtin: Builtin,
  args: Vec<Operand>,
) -> Result<Operand, CalcError> {
  let (integrand, rest) = split_deferred(def, &args)?;
  let domain = |e: DomainError| domain_in_function(def, &args, e);

  let result = match builtin {
    Builtin::Integrate => {
      let [a, b] = rest.as_slice() else {
        return Err(domain(DomainError("expected two bounds".to_string())));
      };
      integrate(ev, &integrand, a, b)
    }
    _ => {
      let (x, order) = match rest.as_slice() {
        [x] => (x, 1),
        [x, n] => {
          let order = ev
            .math()
            .to_integer(n)
            .filter(|n| (0..=MAX_ORDER).contains(n))
            .ok_or_else(|| {
              domain(DomainError(format!(
                "derivative order must be an integer between 0 and {MAX_ORDER}"
              )))
            })?;
          (x, order as u32)
        }
        _ => return Err(domain(DomainError("expected a point".to_string()))),
      };
      differentiate(ev, &integrand, x, order)
    }
  };

  match result {
    Ok(n) => Ok(Operand::Number(n.normalize())),
    Err(Failure::Domain(e)) => Err(domain(e)),
    Err(Failure::Calc(e)) => Err(e),
  }
}

/// Errors of the numerical sweep: domain errors of the method itself get
/// the caller's context, errors raised while evaluating `f` pass through.
enum Failure {
  Domain(DomainError),
  Calc(CalcError),
}

impl From<CalcError> for Failure {
  fn from(e: CalcError) -> Self {
    Failure::Calc(e)
  }
}

impl From<DomainError> for Failure {
  fn from(e: DomainError) -> Self {
    Failure::Domain(e)
  }
}

/// Binds the differential marker to the integrand and returns the
/// remaining numeric arguments.
fn split_deferred(
  def: &FunctionDefinition,
  args: &[Operand],
) -> Result<(DeferredArgument, Vec<Number>), CalcError> {
  let (Some(Operand::Deferred(f)), Some(Operand::Deferred(d))) = (args.first(), args.get(1)) else {
    return Err(CalcError::Syntax(format!(
      "{} expects an expression and a differential variable",
      def.signature()
    )));
  };
  if f.kind != ArgKind::Function || d.kind != ArgKind::Differential {
    return Err(CalcError::Syntax(format!(
      "{} expects an expression and a differential variable",
      def.signature()
    )));
  }

  let postfix = d
    .postfix
    .iter()
    .map(|t| t.to_string())
    .collect::<Vec<_>>()
    .join(" ");
  let variable = d
    .differential_name()
    .ok_or_else(|| CalcError::Syntax(format!("invalid differential variable: {postfix}")))?;

  let mut numbers = Vec::new();
  for arg in &args[2..] {
    match arg {
      Operand::Number(n) => numbers.push(n.clone()),
      other => {
        return Err(domain_in_function(
          def,
          args,
          DomainError(format!("{other} is not a number")),
        ))
      }
    }
  }
  Ok((f.clone().with_variable(variable), numbers))
}

/// How the quadrature variable `s` maps onto the integration variable.
#[derive(Debug, Clone)]
enum Mapping {
  /// `x = s` on a finite interval.
  Identity,
  /// `x = a + s/(1-s)` for `s` in `[0, 1)`.
  Upper(Number),
  /// `x = b - s/(1-s)` for `s` in `[0, 1)`.
  Lower(Number),
  /// `x = s/(1-s²)` for `s` in `(-1, 1)`.
  Whole,
}

fn integrate(
  ev: &mut Evaluator<'_>,
  f: &DeferredArgument,
  a: &Number,
  b: &Number,
) -> Result<Number, Failure> {
  let math = ev.math();
  let lower_inf = math.is_infinite(a);
  let upper_inf = math.is_infinite(b);
  let a_negative = a.real_part().is_negative();
  let b_negative = b.real_part().is_negative();

  if !a.is_real() || !b.is_real() {
    return Err(DomainError("integration bounds must be real".to_string()).into());
  }

  // Orient the interval so that a < b.
  let same = match (lower_inf, upper_inf) {
    (true, true) => a_negative == b_negative,
    (false, false) => !math.is_less(a, b)? && !math.is_less(b, a)?,
    _ => false,
  };
  if same {
    return Ok(math.integer(0));
  }
  let reversed = match (lower_inf, upper_inf) {
    (true, _) => !a_negative,
    (false, true) => b_negative,
    (false, false) => math.is_less(b, a)?,
  };
  let (a, b) = if reversed { (b, a) } else { (a, b) };
  let (a_inf, b_inf) = (math.is_infinite(a), math.is_infinite(b));

  let zero = math.integer(0);
  let one = math.integer(1);
  let (mapping, low, high) = match (a_inf, b_inf) {
    (false, false) => (Mapping::Identity, a.clone(), b.clone()),
    (false, true) => (Mapping::Upper(a.clone()), zero, one),
    (true, false) => (Mapping::Lower(b.clone()), zero, one),
    (true, true) => (Mapping::Whole, math.integer(-1), one),
  };

  tracing::debug!(
    variable = f.variable.as_deref().unwrap_or_default(),
    ?mapping,
    "integrating"
  );
  let value = tanh_sinh(ev, &low, &high, |ev, s| integrand(ev, f, &mapping, s))?;
  Ok(if reversed { ev.math().neg(&value) } else { value })
}

/// `f(x(s)) * x'(s)` for the given mapping.
fn integrand(
  ev: &mut Evaluator<'_>,
  f: &DeferredArgument,
  mapping: &Mapping,
  s: &Number,
) -> Result<Number, Failure> {
  let (x, scale) = {
    let math = ev.math();
    let one = math.integer(1);
    match mapping {
      Mapping::Identity => (s.clone(), one),
      Mapping::Upper(a) | Mapping::Lower(a) => {
        let rest = math.sub(&one, s);
        let offset = math.div(s, &rest)?;
        let scale = math.div(&one, &math.mul(&rest, &rest))?;
        let x = if matches!(mapping, Mapping::Upper(_)) {
          math.add(a, &offset)
        } else {
          math.sub(a, &offset)
        };
        (x, scale)
      }
      Mapping::Whole => {
        let rest = math.sub(&one, &math.mul(s, s));
        let x = math.div(s, &rest)?;
        let numerator = math.add(&one, &math.mul(s, s));
        let scale = math.div(&numerator, &math.mul(&rest, &rest))?;
        (x, scale)
      }
    }
  };
  let y = ev.apply_at(f, &x)?;
  Ok(ev.math().mul(&y, &scale))
}

/// Tanh-sinh quadrature of `g` over `[low, high]`. Nodes are placed at
/// `x = c ± r (1 - q)` with `q = 2 / (e^{2u} + 1)` and `u = π/2 sinh t`, so
/// points close to the ends are computed without cancellation.
fn tanh_sinh<G>(
  ev: &mut Evaluator<'_>,
  low: &Number,
  high: &Number,
  mut g: G,
) -> Result<Number, Failure>
where
  G: FnMut(&mut Evaluator<'_>, &Number) -> Result<Number, Failure>,
{
  let digits = ev.math().digits() as i32;
  // nodes whose distance to an end drops below this are negligible
  let cutoff = 10f64.powi(-(digits + 4)).max(1e-300);
  let tolerance = 10f64.powi(-digits);

  let (center, radius, half_pi) = {
    let math = ev.math();
    let two = math.integer(2);
    let center = math.div(&math.add(low, high), &two)?;
    let radius = math.div(&math.sub(high, low), &two)?;
    let pi = math.pi();
    let half_pi = math.div(&pi, &two)?;
    (center, radius, half_pi)
  };

  // Sum of w(t) g(x(t)) over all nodes so far, without the step factor.
  let mut sum = g(ev, &center)?;
  sum = ev.math().mul(&sum, &half_pi);
  let mut previous: Option<Number> = None;
  // abscissa and contribution of the outermost node so far
  let mut edge: Option<(f64, Number)> = None;

  for level in 0..=MAX_LEVEL {
    let h = 0.5f64.powi(level as i32);
    // level 0 visits every integer multiple of h = 1, later levels only
    // the odd multiples of the new step
    let (start, stride) = if level == 0 { (1u32, 1u32) } else { (1, 2) };
    let mut k = start;
    loop {
      let t = f64::from(k) * h;
      let u = std::f64::consts::FRAC_PI_2 * t.sinh();
      let q_estimate = 2.0 / ((2.0 * u).exp() + 1.0);
      if q_estimate < cutoff || !q_estimate.is_finite() {
        break;
      }

      let (left, right, weight) = {
        let math = ev.math();
        let t = math.from_f64(t);
        let two = math.integer(2);
        let sinh = math.sinh(&t);
        let cosh = math.cosh(&t);
        let u = math.mul(&half_pi, &sinh);
        let e2u = math.exp(&math.mul(&two, &u));
        let q = math.div(&two, &math.add(&e2u, &math.integer(1)))?;
        // w = π/2 cosh t · q (2 - q)
        let weight = math.mul(
          &math.mul(&half_pi, &cosh),
          &math.mul(&q, &math.sub(&two, &q)),
        );
        let offset = math.mul(&radius, &math.sub(&math.integer(1), &q));
        (math.sub(&center, &offset), math.add(&center, &offset), weight)
      };

      let pair = {
        let fl = g(ev, &left)?;
        let fr = g(ev, &right)?;
        ev.math().add(&fl, &fr)
      };
      let math = ev.math();
      let term = math.mul(&weight, &pair);
      sum = math.add(&sum, &term);
      if edge.as_ref().map_or(true, |(outer, _)| t > *outer) {
        edge = Some((t, term));
      }
      k += stride;
    }

    let math = ev.math();
    let step = math.from_f64(h);
    let estimate = math.mul(&math.mul(&sum, &step), &radius);

    if let Some(prev) = &previous {
      let diff = math.abs(&math.sub(&estimate, prev));
      let size = math.abs(&estimate);
      let diff = diff.to_f64().unwrap_or(f64::INFINITY);
      let size = size.to_f64().unwrap_or(0.0);
      if level >= 3 && diff <= tolerance * size.max(1.0) {
        tracing::debug!(level, "quadrature converged");
        check_tail(math, edge.as_ref(), &sum, tolerance)?;
        return Ok(estimate);
      }
    }
    previous = Some(estimate);
  }

  check_tail(ev.math(), edge.as_ref(), &sum, tolerance)?;
  tracing::warn!(levels = MAX_LEVEL, "quadrature stopped before converging");
  previous.ok_or_else(|| Failure::Domain(DomainError("integral did not converge".to_string())))
}

/// Nodes stop where they get closer to an end than the cutoff. The
/// integral exists only if the outermost node adds next to nothing.
fn check_tail(
  math: &MathContext,
  edge: Option<&(f64, Number)>,
  sum: &Number,
  tolerance: f64,
) -> Result<(), Failure> {
  let Some((_, term)) = edge else {
    return Ok(());
  };
  let term = math.abs(term).to_f64().unwrap_or(f64::INFINITY);
  let size = math.abs(sum).to_f64().unwrap_or(0.0);
  if term.is_nan() || term > tolerance.sqrt() * size.max(1.0) {
    tracing::debug!(term, size, "quadrature tail does not vanish");
    return Err(DomainError("integral does not converge".to_string()).into());
  }
  Ok(())
}

/// n-th central difference `Σ (-1)^k C(n,k) f(x + (n/2 - k) h) / h^n` with
/// `h = 2^(-bits/(n+2))`.
fn differentiate(
  ev: &mut Evaluator<'_>,
  f: &DeferredArgument,
  x: &Number,
  order: u32,
) -> Result<Number, Failure> {
  if order == 0 {
    return Ok(ev.apply_at(f, x)?);
  }

  let (h, exponent) = {
    let math = ev.math();
    let exponent = (math.bits() / (order as usize + 2)) as i64;
    let h = math.pow(&math.integer(2), &math.integer(-exponent))?;
    (h, exponent)
  };
  tracing::debug!(
    variable = f.variable.as_deref().unwrap_or_default(),
    order,
    step = %format!("2^-{exponent}"),
    "differentiating"
  );

  let mut sum = ev.math().integer(0);
  let mut coefficient: i64 = 1;
  for k in 0..=order as i64 {
    let point = {
      let math = ev.math();
      // (n/2 - k) h, computed as (n - 2k) h / 2
      let shift = math.mul(&math.integer(order as i64 - 2 * k), &h);
      let shift = math.div(&shift, &math.integer(2))?;
      math.add(x, &shift)
    };
    let y = ev.apply_at(f, &point)?;
    let math = ev.math();
    let term = math.mul(&math.integer(coefficient), &y);
    sum = if k % 2 == 0 {
      math.add(&sum, &term)
    } else {
      math.sub(&sum, &term)
    };
    // C(n, k+1) = C(n, k) (n - k) / (k + 1)
    coefficient = coefficient * (order as i64 - k) / (k + 1);
  }

  let math = ev.math();
  let denominator = math.pow(&h, &math.integer(order as i64))?;
  Ok(math.div(&sum, &denominator)?)
}
