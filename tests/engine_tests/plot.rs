use super::*;

#[test]
fn samples_custom_function() {
  let mut session = session();
  session.define("f(x) = x^2").unwrap();
  let points = session.plot("f", 0.0, 1.0, 3).unwrap();
  assert_eq!(points, vec![(0.0, 0.0), (0.5, 0.25), (1.0, 1.0)]);
}

#[test]
fn samples_built_in() {
  let points = session().plot("abs", -1.0, 1.0, 5).unwrap();
  assert_eq!(
    points,
    vec![(-1.0, 1.0), (-0.5, 0.5), (0.0, 0.0), (0.5, 0.5), (1.0, 1.0)]
  );
}

#[test]
fn rejects_imaginary_output() {
  let err = session().plot("sqrt", -1.0, 1.0, 3).unwrap_err();
  assert!(matches!(err, CalcError::Domain(_)));
  assert!(err.to_string().contains("cannot plot imaginary output"), "{err}");
}

#[test]
fn rejects_multiple_outputs() {
  let mut session = session();
  session.define("g(x) = x,x").unwrap();
  let err = session.plot("g", 0.0, 1.0, 3).unwrap_err();
  assert!(matches!(err, CalcError::Domain(_)));
  assert!(err.to_string().contains("cannot plot multiple outputs at x=0"), "{err}");
}

#[test]
fn rejects_other_arities() {
  let mut session = session();
  let err = session.plot("hypot", 0.0, 1.0, 3).unwrap_err();
  assert!(err.to_string().contains("not one dimensional"), "{err}");
  assert!(matches!(session.plot("int", 0.0, 1.0, 3), Err(CalcError::Domain(_))));
  assert!(matches!(session.plot("missing", 0.0, 1.0, 3), Err(CalcError::Name(_))));
}
