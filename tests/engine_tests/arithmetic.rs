use super::*;

mod operators {
  use super::*;

  #[test]
  fn precedence() {
    assert_eq!(interpret("2+3*4").unwrap(), "14.0");
    assert_eq!(interpret("(2+3)*4").unwrap(), "20.0");
    assert_eq!(interpret("10-4-3").unwrap(), "3.0");
    assert_eq!(interpret("10/4").unwrap(), "2.5");
  }

  #[test]
  fn power_is_left_associative() {
    assert_eq!(interpret("2^3^2").unwrap(), "64.0");
  }

  #[test]
  fn negation_binds_looser_than_power() {
    assert_eq!(interpret("-2^2").unwrap(), "-4.0");
    assert_eq!(interpret("2*-3").unwrap(), "-6.0");
    assert_eq!(interpret("-(1+2)").unwrap(), "-3.0");
  }

  #[test]
  fn modulo_takes_sign_of_divisor() {
    assert_eq!(interpret("7%3").unwrap(), "1.0");
    assert_eq!(interpret("-7%3").unwrap(), "2.0");
  }
}

mod formatting {
  use super::*;

  #[test]
  fn fifteen_significant_digits() {
    assert_eq!(interpret("1/3").unwrap(), "0.333333333333333");
    assert_eq!(interpret("2/3").unwrap(), "0.666666666666667");
    assert_eq!(interpret("pi").unwrap(), "3.14159265358979");
    assert_eq!(interpret("0.1+0.2").unwrap(), "0.3");
  }

  #[test]
  fn large_numbers_use_exponent() {
    assert_eq!(interpret("10^20").unwrap(), "1.0e+20");
    assert_eq!(interpret("10^-5").unwrap(), "1.0e-5");
  }

  #[test]
  fn custom_digits() {
    let mut session = Session::new(EngineConfig::default().with_digits(5)).unwrap();
    assert_eq!(session.interpret("1/3").unwrap(), "0.33333");
    assert_eq!(session.interpret("pi").unwrap(), "3.1416");
  }

  #[test]
  fn lists() {
    assert_eq!(interpret("1,2").unwrap(), "[1.0, 2.0]");
  }
}

mod complex {
  use super::*;

  #[test]
  fn square_root_of_negative() {
    assert_eq!(interpret("sqrt(-4)").unwrap(), "(0.0 + 2.0i)");
  }

  #[test]
  fn imaginary_unit() {
    assert_eq!(interpret("i*i").unwrap(), "-1.0");
    assert_eq!(interpret("2+3i").unwrap(), "(2.0 + 3.0i)");
    assert_eq!(interpret("imag(2-3i)").unwrap(), "-3.0");
  }
}

mod functions {
  use super::*;

  #[test]
  fn rounding() {
    assert_eq!(interpret("round(2.5)").unwrap(), "2.0");
    assert_eq!(interpret("round(3.5)").unwrap(), "4.0");
    assert_eq!(interpret("floor(-2.5)").unwrap(), "-3.0");
    assert_eq!(interpret("ceil(2.1)").unwrap(), "3.0");
    assert_eq!(interpret("abs(-3)").unwrap(), "3.0");
  }

  #[test]
  fn combinatorics() {
    assert_eq!(interpret("fact(5)").unwrap(), "120.0");
    assert_eq!(interpret("P(5,2)").unwrap(), "20.0");
    assert_eq!(interpret("C(5,2)").unwrap(), "10.0");
    assert_eq!(interpret("fib(10)").unwrap(), "55.0");
  }

  #[test]
  fn transcendental() {
    assert_eq!(interpret("exp(0)").unwrap(), "1.0");
    assert_eq!(interpret("cos(0)").unwrap(), "1.0");
    assert_eq!(interpret("ln(e)").unwrap(), "1.0");
    assert_eq!(interpret("log(1000)").unwrap(), "3.0");
    assert_eq!(interpret("rad(180)").unwrap(), "3.14159265358979");
    assert_eq!(interpret("deg(pi)").unwrap(), "180.0");
  }

  #[test]
  fn variadic() {
    assert_eq!(interpret("min(3,1,2)").unwrap(), "1.0");
    assert_eq!(interpret("max(3,1,2)").unwrap(), "3.0");
    assert_eq!(interpret("hypot(3,4)").unwrap(), "5.0");
  }

  #[test]
  fn rand_stays_in_range() {
    let mut session = session();
    session.context_mut().seed(7);
    for _ in 0..20 {
      let x = approx(&mut session, "randbetween(2,3)");
      assert!((2.0..3.0).contains(&x), "{x} out of range");
    }
  }
}

mod answer {
  use super::*;

  #[test]
  fn starts_at_zero() {
    assert_eq!(interpret("ans").unwrap(), "0.0");
  }

  #[test]
  fn holds_last_result() {
    let mut session = session();
    session.interpret("2+2").unwrap();
    assert_eq!(session.interpret("ans*2").unwrap(), "8.0");
    assert_eq!(session.interpret("2ans").unwrap(), "16.0");
  }

  #[test]
  fn failed_evaluation_keeps_answer() {
    let mut session = session();
    session.interpret("5").unwrap();
    assert!(session.interpret("1/0").is_err());
    assert_eq!(session.interpret("ans").unwrap(), "5.0");
  }
}

mod variables {
  use super::*;
  use infixcalc::Scope;

  #[test]
  fn scope_bindings() {
    let mut session = session();
    let mut scope = Scope::new();
    let three = session.context_mut().math.integer(3);
    scope.insert("x".to_string(), three);
    let value = session.evaluate("2x^2+x", &scope).unwrap();
    assert_eq!(session.format(&value), "21.0");
  }
}
