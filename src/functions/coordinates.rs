//! Conversions between cartesian `(x, y, z)`, polar `(r, θ)`, cylindrical
//! `(ρ, φ, z)` and spherical `(r, θ, φ)` coordinates. Spherical
//! coordinates use θ for the azimuth and φ for the polar angle.

use super::Builtin;
use crate::number::{DomainError, MathContext, Number};

pub fn apply(
  math: &mut MathContext,
  builtin: Builtin,
  args: &[Number],
) -> Result<Vec<Number>, DomainError> {
  match (builtin, args) {
    (Builtin::Polar, [x, y]) => Ok(vec![math.hypot(x, y), math.atan2(y, x)?]),
    (Builtin::Rect, [r, theta]) => {
      let cos = math.cos(theta);
      let sin = math.sin(theta);
      Ok(vec![math.mul(r, &cos), math.mul(r, &sin)])
    }
    (Builtin::CartesianToCylindrical, [x, y, z]) => {
      Ok(vec![math.hypot(x, y), math.atan2(y, x)?, z.clone()])
    }
    (Builtin::CartesianToSpherical, [x, y, z]) => {
      let squares = math.add(&math.add(&math.mul(x, x), &math.mul(y, y)), &math.mul(z, z));
      let r = math.sqrt(&squares);
      let cos_phi = math.div(z, &r)?;
      Ok(vec![r.clone(), math.atan2(y, x)?, math.acos(&cos_phi)?])
    }
    (Builtin::CylindricalToCartesian, [rho, phi, z]) => {
      let cos = math.cos(phi);
      let sin = math.sin(phi);
      Ok(vec![math.mul(rho, &cos), math.mul(rho, &sin), z.clone()])
    }
    (Builtin::CylindricalToSpherical, [rho, phi, z]) => {
      Ok(vec![math.hypot(rho, z), phi.clone(), math.atan2(rho, z)?])
    }
    (Builtin::SphericalToCartesian, [r, theta, phi]) => {
      let (sin_phi, cos_phi) = (math.sin(phi), math.cos(phi));
      let (sin_theta, cos_theta) = (math.sin(theta), math.cos(theta));
      let planar = math.mul(r, &sin_phi);
      Ok(vec![
        math.mul(&planar, &cos_theta),
        math.mul(&planar, &sin_theta),
        math.mul(r, &cos_phi),
      ])
    }
    (Builtin::SphericalToCylindrical, [r, theta, phi]) => {
      let (sin_phi, cos_phi) = (math.sin(phi), math.cos(phi));
      Ok(vec![math.mul(r, &sin_phi), theta.clone(), math.mul(r, &cos_phi)])
    }
    _ => Err(DomainError(format!(
      "{builtin:?} does not take {} coordinates",
      args.len()
    ))),
  }
}
