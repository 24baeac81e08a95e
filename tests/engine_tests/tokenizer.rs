use super::*;

mod implicit_multiplication {
  use super::*;

  #[test]
  fn number_and_parenthesis() {
    assert_eq!(interpret("2(3+4)").unwrap(), "14.0");
    assert_eq!(interpret("(1+1)(2+1)").unwrap(), "6.0");
  }

  #[test]
  fn number_and_function() {
    assert_eq!(interpret("2sqrt(9)").unwrap(), "6.0");
    assert_eq!(interpret("2pi").unwrap(), "6.28318530717959");
  }

  #[test]
  fn function_without_parentheses() {
    assert_eq!(interpret("sqrt 16").unwrap(), "4.0");
    assert_eq!(interpret("sqrt 16+1").unwrap(), "5.0");
  }
}

mod whitespace {
  use super::*;

  #[test]
  fn is_ignored() {
    assert_eq!(interpret(" 1 +  2 ").unwrap(), "3.0");
    assert_eq!(interpret("hypot( 3 , 4 )").unwrap(), "5.0");
  }
}

mod literals {
  use super::*;

  #[test]
  fn leading_point() {
    assert_eq!(interpret(".5+.25").unwrap(), "0.75");
    assert_eq!(interpret("(-.5)").unwrap(), "-0.5");
  }
}

mod equivalence {
  use super::*;
  use infixcalc::Scope;

  #[test]
  fn implicit_and_explicit_products_agree() {
    let mut session = session();
    for x in [-2, 0, 3, 7] {
      let mut scope = Scope::new();
      let value = session.context_mut().math.integer(x);
      scope.insert("x".to_string(), value);
      let implicit = session.evaluate("2x", &scope).unwrap();
      let explicit = session.evaluate("2*x", &scope).unwrap();
      assert_eq!(session.format(&implicit), session.format(&explicit));
    }
  }

  #[test]
  fn repeated_evaluation_is_deterministic() {
    let mut session = session();
    let first = session.interpret("int(sin(x), x, 0, pi)").unwrap();
    let second = session.interpret("int(sin(x), x, 0, pi)").unwrap();
    assert_eq!(first, second);
  }
}
