use super::*;

mod integrate {
  use super::*;

  #[test]
  fn polynomial() {
    assert_eq!(interpret("int(x^2, x, 0, 1)").unwrap(), "0.333333333333333");
    assert_eq!(interpret("integrate(3t^2, t, 0, 2)").unwrap(), "8.0");
  }

  #[test]
  fn differential_marker() {
    assert_eq!(interpret("int(x^2, dx, 0, 1)").unwrap(), "0.333333333333333");
  }

  #[test]
  fn reversed_bounds_flip_the_sign() {
    assert_eq!(interpret("int(x^2, x, 1, 0)").unwrap(), "-0.333333333333333");
    assert_eq!(interpret("int(x^2, x, 2, 2)").unwrap(), "0.0");
  }

  #[test]
  fn infinite_bounds() {
    let mut session = session();
    let half_line = approx(&mut session, "int(1/x^2, x, 1, inf)");
    assert!((half_line - 1.0).abs() < 1e-9, "{half_line}");
    let whole_line = approx(&mut session, "int(1/(1+x^2), x, -inf, inf)");
    assert!((whole_line - std::f64::consts::PI).abs() < 1e-9, "{whole_line}");
  }

  #[test]
  fn reads_caller_bindings() {
    let mut session = session();
    let mut scope = infixcalc::Scope::new();
    let three = session.context_mut().math.integer(3);
    scope.insert("y".to_string(), three);
    let value = session.evaluate("int(x*y, x, 0, 2)", &scope).unwrap();
    assert_eq!(session.format(&value), "6.0");
  }

  #[test]
  fn custom_integrand() {
    let mut session = session();
    session.define("f(x) = 2x").unwrap();
    assert_eq!(session.interpret("int(f(u), u, 0, 3)").unwrap(), "9.0");
  }

  #[test]
  fn reports_divergence() {
    let err = interpret("int(1/x, x, 0, 1)").unwrap_err();
    assert!(matches!(err, CalcError::Domain(_)), "{err}");
    assert!(err.to_string().contains("does not converge"), "{err}");

    let mut session = session();
    let value = approx(&mut session, "int(1/sqrt(x), x, 0, 1)");
    assert!((value - 2.0).abs() < 1e-6, "{value}");
  }

  #[test]
  fn rejects_a_number_as_variable() {
    let err = interpret("int(x^2, 2, 0, 1)").unwrap_err();
    assert!(matches!(err, CalcError::Syntax(_)));
    assert!(err.to_string().contains("invalid differential variable"), "{err}");
  }

  #[test]
  fn needs_parentheses() {
    assert!(matches!(interpret("int x"), Err(CalcError::Syntax(_))));
  }
}

mod differentiate {
  use super::*;

  #[test]
  fn first_derivative() {
    assert_eq!(interpret("deriv(x^3, x, 2)").unwrap(), "12.0");
    assert_eq!(interpret("deriv(x^2, dx, 5)").unwrap(), "10.0");
  }

  #[test]
  fn higher_orders() {
    assert_eq!(interpret("nderiv(x^3, x, 2, 2)").unwrap(), "12.0");
    assert_eq!(interpret("differentiate(x^2, x, 3)").unwrap(), "6.0");
    assert_eq!(interpret("differentiate(x^3, x, 1, 2)").unwrap(), "6.0");
    assert_eq!(interpret("nderiv(x^2, x, 3, 0)").unwrap(), "9.0");
  }

  #[test]
  fn of_a_custom_function() {
    let mut session = session();
    session.define("f(x) = x^2").unwrap();
    assert_eq!(session.interpret("deriv(f(t), t, 3)").unwrap(), "6.0");
  }

  #[test]
  fn rejects_negative_order() {
    let err = interpret("nderiv(x^2, x, 1, -1)").unwrap_err();
    assert!(matches!(err, CalcError::Domain(_)));
  }
}
