use super::*;

mod define {
  use super::*;

  #[test]
  fn single_parameter() {
    let mut session = session();
    let definition = session.define("f(x) = x^2").unwrap();
    assert_eq!(definition.to_string(), "f(x) = x^2");
    assert_eq!(session.interpret("f(3)").unwrap(), "9.0");
    assert_eq!(session.interpret("2f(3)+1").unwrap(), "19.0");
  }

  #[test]
  fn several_parameters() {
    let mut session = session();
    session.define("g(a, b) = a*b+1").unwrap();
    assert_eq!(session.interpret("g(2,3)").unwrap(), "7.0");
  }

  #[test]
  fn without_parameters() {
    let mut session = session();
    session.define("c = 3").unwrap();
    assert_eq!(session.interpret("c").unwrap(), "3.0");
    assert_eq!(session.interpret("2c").unwrap(), "6.0");
    assert_eq!(session.interpret("c()").unwrap(), "3.0");
  }

  #[test]
  fn replaces_earlier_definition() {
    let mut session = session();
    session.define("f(x) = x^2").unwrap();
    session.define("f(x) = x+1").unwrap();
    assert_eq!(session.interpret("f(1)").unwrap(), "2.0");
    assert_eq!(session.registry().customs().count(), 1);
  }

  #[test]
  fn calls_other_definitions() {
    let mut session = session();
    session.define("f(x) = x^2").unwrap();
    session.define("h(x) = 2f(x)").unwrap();
    assert_eq!(session.interpret("h(3)").unwrap(), "18.0");
  }

  #[test]
  fn calls_follow_redefinition() {
    let mut session = session();
    session.define("f(x) = x^2").unwrap();
    let h = session.define("h(x) = f(x)+1").unwrap();
    assert_eq!(session.interpret("h(3)").unwrap(), "10.0");
    session.define("f(x) = 0").unwrap();
    assert_eq!(session.interpret("h(3)").unwrap(), "1.0");
    session.define(&h.to_string()).unwrap();
    assert_eq!(session.interpret("h(3)").unwrap(), "1.0");
  }

  #[test]
  fn stops_runaway_recursion() {
    let mut session = session();
    session.define("f(x) = x").unwrap();
    session.define("g(x) = f(x)+1").unwrap();
    session.define("f(x) = g(x)").unwrap();
    let err = session.interpret("f(1)").unwrap_err();
    assert!(matches!(err, CalcError::Domain(_)), "{err}");
    assert!(err.to_string().contains("maximum call depth"), "{err}");
    assert_eq!(session.interpret("1+1").unwrap(), "2.0");
  }

  #[test]
  fn reads_constants_and_answer() {
    let mut session = session();
    session.define("area(r) = pi r^2").unwrap();
    assert_eq!(session.interpret("area(1)").unwrap(), "3.14159265358979");
    session.define("twice = 2ans").unwrap();
    session.interpret("4").unwrap();
    assert_eq!(session.interpret("twice").unwrap(), "8.0");
  }
}

mod rejected {
  use super::*;

  #[test]
  fn built_in_names() {
    let mut session = session();
    assert!(matches!(session.define("sin(x) = x"), Err(CalcError::Permission(_))));
    assert!(matches!(session.define("pi = 3"), Err(CalcError::Permission(_))));
    assert!(matches!(session.define("ans = 3"), Err(CalcError::Permission(_))));
  }

  #[test]
  fn unknown_body_identifier() {
    let err = session().define("f(x) = x+y").unwrap_err();
    assert!(matches!(err, CalcError::Name(_)));
    assert!(err.to_string().contains("token is not defined in function signature: y"));
  }

  #[test]
  fn unknown_identifier_in_deferred_argument() {
    let mut session = session();
    let err = session.define("g(x) = int(t*q, t, 0, x)").unwrap_err();
    assert!(matches!(err, CalcError::Name(_)));
    assert!(err.to_string().contains("function signature: q"), "{err}");
    assert!(session.registry().custom("g").is_none());

    session.define("g(x) = int(t*x, dt, 0, x)").unwrap();
    assert_eq!(session.interpret("g(2)").unwrap(), "4.0");
  }

  #[test]
  fn bad_parameters() {
    let mut session = session();
    assert!(matches!(session.define("f(x, x) = x"), Err(CalcError::Syntax(_))));
    assert!(matches!(session.define("f(f) = f"), Err(CalcError::Domain(_))));
    assert!(matches!(session.define("f(pi) = 1"), Err(CalcError::Permission(_))));
    assert!(matches!(session.define("f(1x) = 1"), Err(CalcError::Syntax(_))));
  }

  #[test]
  fn malformed() {
    let mut session = session();
    assert!(matches!(session.define("f(x) x"), Err(CalcError::Syntax(_))));
    assert!(matches!(session.define("2f(x) = x"), Err(CalcError::Syntax(_))));
    assert_eq!(session.registry().customs().count(), 0);
  }
}

mod remove {
  use super::*;

  #[test]
  fn forgets_the_name() {
    let mut session = session();
    session.define("f(x) = x^2").unwrap();
    let removed = session.remove("f").unwrap();
    assert_eq!(removed.to_string(), "f(x) = x^2");
    assert!(session.registry().custom("f").is_none());
    assert!(matches!(session.interpret("f(2)"), Err(CalcError::Name(_))));
  }

  #[test]
  fn refuses_built_ins() {
    let mut session = session();
    assert!(matches!(session.remove("sin"), Err(CalcError::Permission(_))));
    assert!(matches!(session.remove("e"), Err(CalcError::Permission(_))));
  }

  #[test]
  fn refuses_while_called() {
    let mut session = session();
    session.define("f(x) = x^2").unwrap();
    session.define("h(x) = f(x)+1").unwrap();
    let err = session.remove("f").unwrap_err();
    assert!(matches!(err, CalcError::Permission(_)));
    assert!(err.to_string().contains("still called by h"), "{err}");
    assert_eq!(session.interpret("h(3)").unwrap(), "10.0");

    session.remove("h").unwrap();
    session.remove("f").unwrap();
    assert_eq!(session.registry().customs().count(), 0);
  }

  #[test]
  fn missing_function() {
    let err = session().remove("nonexistent").unwrap_err();
    assert!(matches!(err, CalcError::Name(_)));
  }
}

mod canonical_form {
  use super::*;

  #[test]
  fn parses_back_to_an_equal_definition() {
    let mut session = session();
    for text in ["f(x, y) = x^2 + y", "c = 3", "g(t) = sin(t)2"] {
      let first = session.define(text).unwrap();
      let second = session.define(&first.to_string()).unwrap();
      assert_eq!(first.to_string(), second.to_string());
      assert!(*first == *second, "{first} != {second}");
    }
  }

  #[test]
  fn remove_restores_the_registry() {
    let mut session = session();
    session.define("a(x) = x").unwrap();
    let before: Vec<String> = session.registry().customs().map(|d| d.to_string()).collect();
    let added = session.define("b(x) = 2x").unwrap();
    session.remove(&added.name).unwrap();
    let after: Vec<String> = session.registry().customs().map(|d| d.to_string()).collect();
    assert_eq!(before, after);
  }
}
