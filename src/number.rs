//! Arbitrary-precision real and complex numbers.
//!
//! Every value the engine computes with is a [`Number`]: either a real
//! `BigFloat` or a complex pair of them. Complex results whose imaginary
//! part is exactly zero are collapsed back to reals by [`Number::normalize`].
//! All arithmetic goes through a [`MathContext`], which owns the working
//! precision and astro-float's constant cache.

use std::fmt;

use astro_float::{BigFloat, Consts, Radix, RoundingMode};
use num_bigint::BigUint;
use num_traits::Zero;
use thiserror::Error;

/// Significant digits shown when no precision is requested.
pub const DEFAULT_DIGITS: usize = 15;

/// Largest loop count accepted by the iterative integer functions.
const MAX_ITERATIONS: i64 = 1_000_000;

#[derive(Debug, Clone)]
pub enum Number {
  Real(BigFloat),
  Complex(BigFloat, BigFloat),
}

/// A numeric primitive was applied outside its domain.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct DomainError(pub String);

fn domain<T>(msg: impl Into<String>) -> Result<T, DomainError> {
  Err(DomainError(msg.into()))
}

impl Number {
  pub fn normalize(self) -> Self {
    match self {
      Number::Complex(re, im) if im.is_zero() => Number::Real(re),
      other => other,
    }
  }

  pub fn is_real(&self) -> bool {
    matches!(self, Number::Real(_))
  }

  pub fn real_part(&self) -> &BigFloat {
    match self {
      Number::Real(re) | Number::Complex(re, _) => re,
    }
  }

  pub fn as_real(&self) -> Option<&BigFloat> {
    match self {
      Number::Real(re) => Some(re),
      Number::Complex(..) => None,
    }
  }

  /// Lossy conversion for plotting; `None` for complex values.
  pub fn to_f64(&self) -> Option<f64> {
    self.as_real().map(bigfloat_to_f64)
  }
}

impl fmt::Display for Number {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let digits = f.precision().unwrap_or(DEFAULT_DIGITS).max(1);
    match self {
      Number::Real(re) => f.write_str(&format_real(re, digits)),
      Number::Complex(re, im) => {
        let sign = if im.is_negative() { '-' } else { '+' };
        write!(
          f,
          "({} {} {}i)",
          format_real(re, digits),
          sign,
          format_real(&im.abs(), digits)
        )
      }
    }
  }
}

/// Working precision in bits for a requested number of decimal digits:
/// rounded up to the next word, plus one guard word, at least 128.
pub fn nominal_bits(digits: usize) -> usize {
  let base_bits = (digits as f64 * std::f64::consts::LOG2_10).ceil() as usize;
  let bits = ((base_bits + 63) & !63) + 64;
  bits.max(128)
}

pub fn bigfloat_to_f64(x: &BigFloat) -> f64 {
  if x.is_nan() {
    return f64::NAN;
  }
  if x.is_inf() {
    return if x.is_negative() {
      f64::NEG_INFINITY
    } else {
      f64::INFINITY
    };
  }
  if x.is_zero() {
    return 0.0;
  }
  let Some((words, _, sign, exponent, _)) = x.as_raw_parts() else {
    return f64::NAN;
  };
  let top = words.last().copied().unwrap_or(0) as f64;
  let next = if words.len() >= 2 {
    words[words.len() - 2] as f64
  } else {
    0.0
  };
  // two factors, so that subnormal results do not underflow early
  let shift = (exponent as i32).saturating_sub(64);
  let half = shift / 2;
  let value = (top + next / 2f64.powi(64)) * 2f64.powi(half) * 2f64.powi(shift - half);
  if sign.is_negative() { -value } else { value }
}

/// Decimal expansion of `x` with at least `digits + 2` significant digits.
/// Returns the sign, the digit string and the decimal exponent of its
/// first digit.
fn decimal_digits(x: &BigFloat, digits: usize) -> Option<(bool, String, i64)> {
  let (words, _, sign, exponent, _) = x.as_raw_parts()?;
  let mantissa = BigUint::from_bytes_le(
    &words
      .iter()
      .flat_map(|w| w.to_le_bytes())
      .collect::<Vec<u8>>(),
  );
  if mantissa.is_zero() {
    return Some((false, "0".to_string(), 0));
  }

  // value = mantissa * 2^(exponent - mantissa_bits)
  let shift = exponent as i64 - (words.len() * 64) as i64;
  let estimate =
    ((exponent as f64 - 1.0) * std::f64::consts::LOG10_2).floor() as i64;
  let scale = digits as i64 + 2 - estimate;

  let mut numerator = mantissa;
  let mut denominator = BigUint::from(1u32);
  if scale >= 0 {
    numerator *= BigUint::from(10u32).pow(scale as u32);
  } else {
    denominator *= BigUint::from(10u32).pow((-scale) as u32);
  }
  if shift >= 0 {
    numerator = numerator << (shift as u64);
  } else {
    denominator = denominator << ((-shift) as u64);
  }

  let text = (numerator / denominator).to_string();
  let exp10 = text.len() as i64 - 1 - scale;
  Some((sign.is_negative(), text, exp10))
}

/// Rounds a digit string half-up to `digits` places and strips trailing
/// zeros. A carry out of the first digit bumps the exponent.
fn round_significant(text: &str, digits: usize, exp10: i64) -> (String, i64) {
  let bytes = text.as_bytes();
  let mut exp10 = exp10;
  let mut kept: Vec<u8> = bytes[..bytes.len().min(digits)].to_vec();
  if bytes.len() > digits && bytes[digits] >= b'5' {
    let mut i = kept.len();
    loop {
      if i == 0 {
        kept.insert(0, b'1');
        kept.pop();
        exp10 += 1;
        break;
      }
      i -= 1;
      if kept[i] == b'9' {
        kept[i] = b'0';
      } else {
        kept[i] += 1;
        break;
      }
    }
  }
  let rounded = String::from_utf8_lossy(&kept).trim_end_matches('0').to_string();
  if rounded.is_empty() {
    ("0".to_string(), exp10)
  } else {
    (rounded, exp10)
  }
}

fn format_real(x: &BigFloat, digits: usize) -> String {
  if x.is_nan() {
    return "nan".to_string();
  }
  if x.is_inf() {
    return if x.is_negative() { "-inf" } else { "+inf" }.to_string();
  }
  if x.is_zero() {
    return "0.0".to_string();
  }
  let Some((negative, text, exp10)) = decimal_digits(x, digits) else {
    return "nan".to_string();
  };
  let (mantissa, exp10) = round_significant(&text, digits, exp10);
  let sign = if negative { "-" } else { "" };

  let min_fixed = -((digits as i64 / 3).max(5));
  if exp10 > min_fixed && exp10 < digits as i64 {
    if exp10 >= 0 {
      let int_len = exp10 as usize + 1;
      if mantissa.len() <= int_len {
        let padding = "0".repeat(int_len - mantissa.len());
        format!("{sign}{mantissa}{padding}.0")
      } else {
        let (int_part, frac_part) = mantissa.split_at(int_len);
        format!("{sign}{int_part}.{frac_part}")
      }
    } else {
      let zeros = "0".repeat((-exp10 - 1) as usize);
      format!("{sign}0.{zeros}{mantissa}")
    }
  } else {
    let (lead, rest) = mantissa.split_at(1);
    let rest = if rest.is_empty() { "0" } else { rest };
    let exp_sign = if exp10 >= 0 { '+' } else { '-' };
    format!("{sign}{lead}.{rest}e{exp_sign}{}", exp10.abs())
  }
}

/// Precision, rounding mode and constant cache shared by every numeric
/// operation of one session.
pub struct MathContext {
  bits: usize,
  digits: usize,
  rm: RoundingMode,
  consts: Consts,
}

impl fmt::Debug for MathContext {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MathContext")
      .field("bits", &self.bits)
      .field("digits", &self.digits)
      .finish()
  }
}

impl MathContext {
  pub fn new(digits: usize) -> Result<Self, DomainError> {
    let consts = Consts::new().map_err(|e| {
      DomainError(format!("cannot initialise numeric constants: {:?}", e))
    })?;
    let digits = digits.max(1);
    Ok(MathContext {
      bits: nominal_bits(digits),
      digits,
      rm: RoundingMode::ToEven,
      consts,
    })
  }

  pub fn bits(&self) -> usize {
    self.bits
  }

  pub fn digits(&self) -> usize {
    self.digits
  }

  // -- construction -------------------------------------------------------

  fn big(&self, v: i32) -> BigFloat {
    BigFloat::from_i32(v, self.bits)
  }

  pub fn integer(&self, v: i64) -> Number {
    Number::Real(BigFloat::from_i128(v as i128, self.bits))
  }

  pub fn from_f64(&self, v: f64) -> Number {
    Number::Real(BigFloat::from_f64(v, self.bits))
  }

  /// Parses a decimal literal made of digits and at most one point.
  pub fn parse(&mut self, literal: &str) -> Option<Number> {
    let points = literal.chars().filter(|c| *c == '.').count();
    let has_digit = literal.chars().any(|c| c.is_ascii_digit());
    let well_formed = literal.chars().all(|c| c.is_ascii_digit() || c == '.');
    if points > 1 || !has_digit || !well_formed {
      return None;
    }
    let mut text = literal.to_string();
    if text.starts_with('.') {
      text.insert(0, '0');
    }
    if text.ends_with('.') {
      text.push('0');
    }
    let value =
      BigFloat::parse(&text, Radix::Dec, self.bits, self.rm, &mut self.consts);
    if value.is_nan() {
      None
    } else {
      Some(Number::Real(value))
    }
  }

  pub fn pi(&mut self) -> Number {
    Number::Real(self.pi_big())
  }

  fn pi_big(&mut self) -> BigFloat {
    self.consts.pi(self.bits, self.rm)
  }

  pub fn e(&mut self) -> Number {
    Number::Real(self.consts.e(self.bits, self.rm))
  }

  pub fn imaginary_unit(&self) -> Number {
    Number::Complex(self.big(0), self.big(1))
  }

  pub fn infinity(&self) -> Number {
    Number::Real(BigFloat::from_f64(f64::INFINITY, self.bits))
  }

  // -- real helpers -------------------------------------------------------

  fn radd(&self, a: &BigFloat, b: &BigFloat) -> BigFloat {
    a.add(b, self.bits, self.rm)
  }

  fn rsub(&self, a: &BigFloat, b: &BigFloat) -> BigFloat {
    a.sub(b, self.bits, self.rm)
  }

  fn rmul(&self, a: &BigFloat, b: &BigFloat) -> BigFloat {
    a.mul(b, self.bits, self.rm)
  }

  fn rdiv(&self, a: &BigFloat, b: &BigFloat) -> Result<BigFloat, DomainError> {
    if b.is_zero() {
      return domain("division by zero");
    }
    Ok(a.div(b, self.bits, self.rm))
  }

  fn rhypot(&self, a: &BigFloat, b: &BigFloat) -> BigFloat {
    let sum = self.radd(&self.rmul(a, a), &self.rmul(b, b));
    sum.sqrt(self.bits, self.rm)
  }

  fn is_positive(x: &BigFloat) -> bool {
    !x.is_zero() && !x.is_negative()
  }

  fn less(&self, a: &BigFloat, b: &BigFloat) -> bool {
    self.rsub(a, b).is_negative()
  }

  fn rfloor(&self, x: &BigFloat) -> BigFloat {
    let int = x.int();
    if x.is_negative() && !self.rsub(x, &int).is_zero() {
      self.rsub(&int, &self.big(1))
    } else {
      int
    }
  }

  fn rceil(&self, x: &BigFloat) -> BigFloat {
    let int = x.int();
    if !x.is_negative() && !self.rsub(x, &int).is_zero() {
      self.radd(&int, &self.big(1))
    } else {
      int
    }
  }

  /// Round half to even.
  fn rround(&self, x: &BigFloat) -> BigFloat {
    let floor = self.rfloor(x);
    let frac = self.rsub(x, &floor);
    let half = self.rdiv_exact(&self.big(1), 2);
    let diff = self.rsub(&frac, &half);
    if diff.is_zero() {
      let halved = self.rdiv_exact(&floor, 2);
      if self.rsub(&halved, &halved.int()).is_zero() {
        floor
      } else {
        self.radd(&floor, &self.big(1))
      }
    } else if diff.is_negative() {
      floor
    } else {
      self.radd(&floor, &self.big(1))
    }
  }

  fn rdiv_exact(&self, a: &BigFloat, by: i32) -> BigFloat {
    a.div(&self.big(by), self.bits, self.rm)
  }

  fn is_finite(x: &BigFloat) -> bool {
    !x.is_nan() && !x.is_inf()
  }

  fn ratan2(&mut self, y: &BigFloat, x: &BigFloat) -> BigFloat {
    if x.is_zero() {
      let pi = self.pi_big();
      let half_pi = self.rdiv_exact(&pi, 2);
      return if y.is_zero() {
        self.big(0)
      } else if y.is_negative() {
        half_pi.neg()
      } else {
        half_pi
      };
    }
    let ratio = y.div(x, self.bits, self.rm);
    let base = ratio.atan(self.bits, self.rm, &mut self.consts);
    if !x.is_negative() {
      base
    } else if y.is_negative() {
      let pi = self.pi_big();
      self.rsub(&base, &pi)
    } else {
      let pi = self.pi_big();
      self.radd(&base, &pi)
    }
  }

  /// Integer value of `x` when it is a finite whole number of moderate size.
  pub fn to_integer(&self, x: &Number) -> Option<i64> {
    let re = x.as_real()?;
    if !Self::is_finite(re) || !self.rsub(re, &re.int()).is_zero() {
      return None;
    }
    let v = bigfloat_to_f64(re);
    if v.abs() > 9.0e15 { None } else { Some(v as i64) }
  }

  // -- complex helpers ----------------------------------------------------

  fn parts(&self, x: &Number) -> (BigFloat, BigFloat) {
    match x {
      Number::Real(re) => (re.clone(), self.big(0)),
      Number::Complex(re, im) => (re.clone(), im.clone()),
    }
  }

  fn complex(re: BigFloat, im: BigFloat) -> Number {
    Number::Complex(re, im).normalize()
  }

  fn cmul(
    &self,
    (a, b): &(BigFloat, BigFloat),
    (c, d): &(BigFloat, BigFloat),
  ) -> (BigFloat, BigFloat) {
    (
      self.rsub(&self.rmul(a, c), &self.rmul(b, d)),
      self.radd(&self.rmul(a, d), &self.rmul(b, c)),
    )
  }

  fn cdiv(
    &self,
    (a, b): &(BigFloat, BigFloat),
    (c, d): &(BigFloat, BigFloat),
  ) -> Result<(BigFloat, BigFloat), DomainError> {
    let den = self.radd(&self.rmul(c, c), &self.rmul(d, d));
    if den.is_zero() {
      return domain("division by zero");
    }
    let re = self.radd(&self.rmul(a, c), &self.rmul(b, d));
    let im = self.rsub(&self.rmul(b, c), &self.rmul(a, d));
    Ok((self.rdiv(&re, &den)?, self.rdiv(&im, &den)?))
  }

  fn cexp(&mut self, (x, y): &(BigFloat, BigFloat)) -> (BigFloat, BigFloat) {
    let ex = x.exp(self.bits, self.rm, &mut self.consts);
    let cos = y.cos(self.bits, self.rm, &mut self.consts);
    let sin = y.sin(self.bits, self.rm, &mut self.consts);
    (self.rmul(&ex, &cos), self.rmul(&ex, &sin))
  }

  fn cln(
    &mut self,
    (x, y): &(BigFloat, BigFloat),
  ) -> Result<(BigFloat, BigFloat), DomainError> {
    if x.is_zero() && y.is_zero() {
      return domain("logarithm of zero");
    }
    let modulus = self.rhypot(x, y);
    let re = modulus.ln(self.bits, self.rm, &mut self.consts);
    let im = self.ratan2(y, x);
    Ok((re, im))
  }

  fn csqrt(&self, (x, y): &(BigFloat, BigFloat)) -> (BigFloat, BigFloat) {
    if y.is_zero() {
      return if x.is_negative() {
        (self.big(0), x.neg().sqrt(self.bits, self.rm))
      } else {
        (x.sqrt(self.bits, self.rm), self.big(0))
      };
    }
    let r = self.rhypot(x, y);
    let re = self.rdiv_exact(&self.radd(&r, x), 2).sqrt(self.bits, self.rm);
    let im = self.rdiv_exact(&self.rsub(&r, x), 2).sqrt(self.bits, self.rm);
    if y.is_negative() { (re, im.neg()) } else { (re, im) }
  }

  fn csin(&mut self, (x, y): &(BigFloat, BigFloat)) -> (BigFloat, BigFloat) {
    let (sin, cos) = self.sin_cos(x);
    let (sinh, cosh) = self.sinh_cosh(y);
    (self.rmul(&sin, &cosh), self.rmul(&cos, &sinh))
  }

  fn ccos(&mut self, (x, y): &(BigFloat, BigFloat)) -> (BigFloat, BigFloat) {
    let (sin, cos) = self.sin_cos(x);
    let (sinh, cosh) = self.sinh_cosh(y);
    (self.rmul(&cos, &cosh), self.rmul(&sin, &sinh).neg())
  }

  fn csinh(&mut self, (x, y): &(BigFloat, BigFloat)) -> (BigFloat, BigFloat) {
    let (sin, cos) = self.sin_cos(y);
    let (sinh, cosh) = self.sinh_cosh(x);
    (self.rmul(&sinh, &cos), self.rmul(&cosh, &sin))
  }

  fn ccosh(&mut self, (x, y): &(BigFloat, BigFloat)) -> (BigFloat, BigFloat) {
    let (sin, cos) = self.sin_cos(y);
    let (sinh, cosh) = self.sinh_cosh(x);
    (self.rmul(&cosh, &cos), self.rmul(&sinh, &sin))
  }

  fn sin_cos(&mut self, x: &BigFloat) -> (BigFloat, BigFloat) {
    (
      x.sin(self.bits, self.rm, &mut self.consts),
      x.cos(self.bits, self.rm, &mut self.consts),
    )
  }

  fn sinh_cosh(&mut self, x: &BigFloat) -> (BigFloat, BigFloat) {
    (
      x.sinh(self.bits, self.rm, &mut self.consts),
      x.cosh(self.bits, self.rm, &mut self.consts),
    )
  }

  /// asin(z) = -i ln(iz + sqrt(1 - z^2))
  fn casin(
    &mut self,
    z: &(BigFloat, BigFloat),
  ) -> Result<(BigFloat, BigFloat), DomainError> {
    let one = (self.big(1), self.big(0));
    let z2 = self.cmul(z, z);
    let inner = (self.rsub(&one.0, &z2.0), z2.1.neg());
    let root = self.csqrt(&inner);
    let iz = (z.1.neg(), z.0.clone());
    let sum = (self.radd(&iz.0, &root.0), self.radd(&iz.1, &root.1));
    let (lr, li) = self.cln(&sum)?;
    Ok((li, lr.neg()))
  }

  /// atan(z) = (i/2) ln((i + z) / (i - z))
  fn catan(
    &mut self,
    (x, y): &(BigFloat, BigFloat),
  ) -> Result<(BigFloat, BigFloat), DomainError> {
    let one = self.big(1);
    let num = (x.clone(), self.radd(&one, y));
    let den = (x.neg(), self.rsub(&one, y));
    let ratio = self.cdiv(&num, &den)?;
    let (lr, li) = self.cln(&ratio)?;
    Ok((self.rdiv_exact(&li, 2).neg(), self.rdiv_exact(&lr, 2)))
  }

  fn from_parts(
    &self,
    result: Result<(BigFloat, BigFloat), DomainError>,
  ) -> Result<Number, DomainError> {
    result.map(|(re, im)| Self::complex(re, im))
  }

  // -- arithmetic ---------------------------------------------------------

  pub fn neg(&self, a: &Number) -> Number {
    match a {
      Number::Real(re) => Number::Real(re.neg()),
      Number::Complex(re, im) => Number::Complex(re.neg(), im.neg()),
    }
  }

  pub fn add(&self, a: &Number, b: &Number) -> Number {
    if let (Number::Real(x), Number::Real(y)) = (a, b) {
      return Number::Real(self.radd(x, y));
    }
    let (a, b) = (self.parts(a), self.parts(b));
    Self::complex(self.radd(&a.0, &b.0), self.radd(&a.1, &b.1))
  }

  pub fn sub(&self, a: &Number, b: &Number) -> Number {
    if let (Number::Real(x), Number::Real(y)) = (a, b) {
      return Number::Real(self.rsub(x, y));
    }
    let (a, b) = (self.parts(a), self.parts(b));
    Self::complex(self.rsub(&a.0, &b.0), self.rsub(&a.1, &b.1))
  }

  pub fn mul(&self, a: &Number, b: &Number) -> Number {
    if let (Number::Real(x), Number::Real(y)) = (a, b) {
      return Number::Real(self.rmul(x, y));
    }
    let (re, im) = self.cmul(&self.parts(a), &self.parts(b));
    Self::complex(re, im)
  }

  pub fn div(&self, a: &Number, b: &Number) -> Result<Number, DomainError> {
    if let (Number::Real(x), Number::Real(y)) = (a, b) {
      return self.rdiv(x, y).map(Number::Real);
    }
    self.from_parts(self.cdiv(&self.parts(a), &self.parts(b)))
  }

  /// Floored modulo, the result takes the sign of the divisor.
  pub fn rem(&self, a: &Number, b: &Number) -> Result<Number, DomainError> {
    let (Some(x), Some(y)) = (a.as_real(), b.as_real()) else {
      return domain("modulo is not defined for complex numbers");
    };
    let quotient = self.rfloor(&self.rdiv(x, y)?);
    Ok(Number::Real(self.rsub(x, &self.rmul(y, &quotient))))
  }

  pub fn pow(&mut self, a: &Number, b: &Number) -> Result<Number, DomainError> {
    if let (Number::Real(x), Number::Real(y)) = (a, b) {
      return self.real_pow(x, y);
    }
    let (base, exponent) = (self.parts(a), self.parts(b));
    if base.0.is_zero() && base.1.is_zero() {
      return if Self::is_positive(&exponent.0) {
        Ok(Number::Real(self.big(0)))
      } else {
        domain("zero raised to a non-positive power")
      };
    }
    let log = self.cln(&base)?;
    let product = self.cmul(&exponent, &log);
    let (re, im) = self.cexp(&product);
    Ok(Self::complex(re, im))
  }

  fn real_pow(&mut self, x: &BigFloat, y: &BigFloat) -> Result<Number, DomainError> {
    if let Some(n) = self.to_integer(&Number::Real(y.clone())) {
      if n.unsigned_abs() <= u32::MAX as u64 {
        if n < 0 && x.is_zero() {
          return domain("zero raised to a negative power");
        }
        let power = x.powi(n.unsigned_abs() as usize, self.bits, self.rm);
        return if n < 0 {
          self.rdiv(&self.big(1), &power).map(Number::Real)
        } else {
          Ok(Number::Real(power))
        };
      }
    }
    if x.is_zero() {
      return if Self::is_positive(y) {
        Ok(Number::Real(self.big(0)))
      } else {
        domain("zero raised to a non-positive power")
      };
    }
    if x.is_negative() {
      let log = self.cln(&(x.clone(), self.big(0)))?;
      let product = (self.rmul(y, &log.0), self.rmul(y, &log.1));
      let (re, im) = self.cexp(&product);
      return Ok(Self::complex(re, im));
    }
    Ok(Number::Real(x.pow(y, self.bits, self.rm, &mut self.consts)))
  }

  // -- elementary functions -----------------------------------------------

  pub fn abs(&self, a: &Number) -> Number {
    match a {
      Number::Real(re) => Number::Real(re.abs()),
      Number::Complex(re, im) => Number::Real(self.rhypot(re, im)),
    }
  }

  pub fn real(&self, a: &Number) -> Number {
    Number::Real(a.real_part().clone())
  }

  pub fn imag(&self, a: &Number) -> Number {
    match a {
      Number::Real(_) => Number::Real(self.big(0)),
      Number::Complex(_, im) => Number::Real(im.clone()),
    }
  }

  pub fn floor(&self, a: &Number) -> Number {
    let (re, im) = self.parts(a);
    Self::complex(self.rfloor(&re), self.rfloor(&im))
  }

  pub fn ceil(&self, a: &Number) -> Number {
    let (re, im) = self.parts(a);
    Self::complex(self.rceil(&re), self.rceil(&im))
  }

  pub fn round(&self, a: &Number) -> Number {
    let (re, im) = self.parts(a);
    Self::complex(self.rround(&re), self.rround(&im))
  }

  pub fn sqrt(&self, a: &Number) -> Number {
    match a {
      Number::Real(x) if !x.is_negative() => {
        Number::Real(x.sqrt(self.bits, self.rm))
      }
      _ => {
        let (re, im) = self.csqrt(&self.parts(a));
        Self::complex(re, im)
      }
    }
  }

  pub fn root(&mut self, a: &Number, n: &Number) -> Result<Number, DomainError> {
    let one = Number::Real(self.big(1));
    let inverse = self.div(&one, n)?;
    self.pow(a, &inverse)
  }

  pub fn hypot(&self, a: &Number, b: &Number) -> Number {
    let x = self.abs(a);
    let y = self.abs(b);
    Number::Real(self.rhypot(x.real_part(), y.real_part()))
  }

  pub fn exp(&mut self, a: &Number) -> Number {
    match a {
      Number::Real(x) => Number::Real(x.exp(self.bits, self.rm, &mut self.consts)),
      Number::Complex(..) => {
        let (re, im) = self.cexp(&self.parts(a));
        Self::complex(re, im)
      }
    }
  }

  pub fn ln(&mut self, a: &Number) -> Result<Number, DomainError> {
    match a {
      Number::Real(x) if Self::is_positive(x) => {
        Ok(Number::Real(x.ln(self.bits, self.rm, &mut self.consts)))
      }
      _ => {
        let parts = self.parts(a);
        let result = self.cln(&parts);
        self.from_parts(result)
      }
    }
  }

  pub fn log10(&mut self, a: &Number) -> Result<Number, DomainError> {
    if let Number::Real(x) = a {
      if Self::is_positive(x) {
        return Ok(Number::Real(x.log10(self.bits, self.rm, &mut self.consts)));
      }
    }
    let ten = Number::Real(self.big(10));
    self.log(a, &ten)
  }

  /// Logarithm of `a` in base `b`.
  pub fn log(&mut self, a: &Number, b: &Number) -> Result<Number, DomainError> {
    let num = self.ln(a)?;
    let den = self.ln(b)?;
    self.div(&num, &den)
  }

  pub fn sin(&mut self, a: &Number) -> Number {
    match a {
      Number::Real(x) => Number::Real(x.sin(self.bits, self.rm, &mut self.consts)),
      Number::Complex(..) => {
        let (re, im) = self.csin(&self.parts(a));
        Self::complex(re, im)
      }
    }
  }

  pub fn cos(&mut self, a: &Number) -> Number {
    match a {
      Number::Real(x) => Number::Real(x.cos(self.bits, self.rm, &mut self.consts)),
      Number::Complex(..) => {
        let (re, im) = self.ccos(&self.parts(a));
        Self::complex(re, im)
      }
    }
  }

  pub fn tan(&mut self, a: &Number) -> Result<Number, DomainError> {
    let sin = self.sin(a);
    let cos = self.cos(a);
    self.div(&sin, &cos)
  }

  pub fn sec(&mut self, a: &Number) -> Result<Number, DomainError> {
    let cos = self.cos(a);
    self.div(&Number::Real(self.big(1)), &cos)
  }

  pub fn csc(&mut self, a: &Number) -> Result<Number, DomainError> {
    let sin = self.sin(a);
    self.div(&Number::Real(self.big(1)), &sin)
  }

  pub fn cot(&mut self, a: &Number) -> Result<Number, DomainError> {
    let sin = self.sin(a);
    let cos = self.cos(a);
    self.div(&cos, &sin)
  }

  fn within_unit(&self, x: &BigFloat) -> bool {
    !self.less(&self.big(1), &x.abs())
  }

  pub fn asin(&mut self, a: &Number) -> Result<Number, DomainError> {
    match a {
      Number::Real(x) if self.within_unit(x) => {
        Ok(Number::Real(x.asin(self.bits, self.rm, &mut self.consts)))
      }
      _ => {
        let parts = self.parts(a);
        let result = self.casin(&parts);
        self.from_parts(result)
      }
    }
  }

  pub fn acos(&mut self, a: &Number) -> Result<Number, DomainError> {
    match a {
      Number::Real(x) if self.within_unit(x) => {
        Ok(Number::Real(x.acos(self.bits, self.rm, &mut self.consts)))
      }
      _ => {
        let asin = self.asin(a)?;
        let pi = self.pi_big();
        let half_pi = Number::Real(self.rdiv_exact(&pi, 2));
        Ok(self.sub(&half_pi, &asin))
      }
    }
  }

  pub fn atan(&mut self, a: &Number) -> Result<Number, DomainError> {
    match a {
      Number::Real(x) => Ok(Number::Real(x.atan(self.bits, self.rm, &mut self.consts))),
      Number::Complex(..) => {
        let parts = self.parts(a);
        let result = self.catan(&parts);
        self.from_parts(result)
      }
    }
  }

  pub fn atan2(&mut self, y: &Number, x: &Number) -> Result<Number, DomainError> {
    let (Some(y), Some(x)) = (y.as_real(), x.as_real()) else {
      return domain("atan2 is not defined for complex numbers");
    };
    Ok(Number::Real(self.ratan2(y, x)))
  }

  pub fn sinh(&mut self, a: &Number) -> Number {
    match a {
      Number::Real(x) => Number::Real(x.sinh(self.bits, self.rm, &mut self.consts)),
      Number::Complex(..) => {
        let (re, im) = self.csinh(&self.parts(a));
        Self::complex(re, im)
      }
    }
  }

  pub fn cosh(&mut self, a: &Number) -> Number {
    match a {
      Number::Real(x) => Number::Real(x.cosh(self.bits, self.rm, &mut self.consts)),
      Number::Complex(..) => {
        let (re, im) = self.ccosh(&self.parts(a));
        Self::complex(re, im)
      }
    }
  }

  pub fn tanh(&mut self, a: &Number) -> Result<Number, DomainError> {
    match a {
      Number::Real(x) => Ok(Number::Real(x.tanh(self.bits, self.rm, &mut self.consts))),
      Number::Complex(..) => {
        let sinh = self.sinh(a);
        let cosh = self.cosh(a);
        self.div(&sinh, &cosh)
      }
    }
  }

  pub fn radians(&mut self, a: &Number) -> Number {
    let pi = self.pi_big();
    let factor = Number::Real(self.rdiv_exact(&pi, 180));
    self.mul(a, &factor)
  }

  pub fn degrees(&mut self, a: &Number) -> Number {
    let pi = self.pi_big();
    let factor = Number::Real(self.big(180).div(&pi, self.bits, self.rm));
    self.mul(a, &factor)
  }

  pub fn is_less(&self, a: &Number, b: &Number) -> Result<bool, DomainError> {
    let (Some(x), Some(y)) = (a.as_real(), b.as_real()) else {
      return domain("complex numbers are not ordered");
    };
    Ok(self.less(x, y))
  }

  pub fn is_infinite(&self, a: &Number) -> bool {
    a.as_real().is_some_and(|x| x.is_inf())
  }

  // -- combinatorics ------------------------------------------------------

  fn bounded_count(&self, a: &Number, what: &str) -> Result<i64, DomainError> {
    match self.to_integer(a) {
      Some(n) if n < 0 => domain(format!("{what} must not be negative")),
      Some(n) if n > MAX_ITERATIONS => domain(format!("{what} is too large")),
      Some(n) => Ok(n),
      None => domain(format!("{what} must be an integer")),
    }
  }

  pub fn factorial(&self, a: &Number) -> Result<Number, DomainError> {
    let n = self.bounded_count(a, "factorial argument")?;
    let mut product = self.big(1);
    for k in 2..=n {
      product = self.rmul(&product, &BigFloat::from_i128(k as i128, self.bits));
    }
    Ok(Number::Real(product))
  }

  /// Falling factorial n (n-1) ... (n-k+1).
  pub fn permutations(&self, n: &Number, k: &Number) -> Result<Number, DomainError> {
    let k = self.bounded_count(k, "permutation size")?;
    let mut product = Number::Real(self.big(1));
    for i in 0..k {
      let factor = self.sub(n, &self.integer(i));
      product = self.mul(&product, &factor);
    }
    Ok(product)
  }

  pub fn binomial(&self, n: &Number, k: &Number) -> Result<Number, DomainError> {
    let k = self.bounded_count(k, "binomial lower index")?;
    let mut product = Number::Real(self.big(1));
    for i in 0..k {
      let factor = self.sub(n, &self.integer(i));
      product = self.mul(&product, &factor);
      product = self.div(&product, &self.integer(i + 1))?;
    }
    Ok(product)
  }

  pub fn fibonacci(&self, a: &Number) -> Result<Number, DomainError> {
    let n = match self.to_integer(a) {
      Some(n) if n.abs() <= MAX_ITERATIONS => n,
      Some(_) => return domain("fibonacci index is too large"),
      None => return domain("fibonacci index must be an integer"),
    };
    let (mut prev, mut cur) = (self.big(0), self.big(1));
    for _ in 0..n.abs() {
      let next = self.radd(&prev, &cur);
      prev = cur;
      cur = next;
    }
    // F(-n) = (-1)^(n+1) F(n)
    if n < 0 && n % 2 == 0 {
      Ok(Number::Real(prev.neg()))
    } else {
      Ok(Number::Real(prev))
    }
  }
}
