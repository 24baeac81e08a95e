use super::*;

#[test]
fn domain_errors_name_the_function() {
  let err = interpret("fact(-1)").unwrap_err();
  assert!(matches!(err, CalcError::Domain(_)));
  let message = err.to_string();
  assert!(message.starts_with("ValueError: domain error in function fact(x)"), "{message}");
}

#[test]
fn division_by_zero() {
  let err = interpret("1/0").unwrap_err();
  assert!(matches!(err, CalcError::Domain(_)));
  assert!(err.to_string().contains("division by zero"), "{err}");
}

#[test]
fn mismatched_parentheses() {
  let err = interpret("sin(").unwrap_err();
  assert!(matches!(err, CalcError::Syntax(_)));
  assert!(err.to_string().contains("open > close"), "{err}");

  let err = interpret("1)").unwrap_err();
  assert!(err.to_string().contains("open < close"), "{err}");
}

#[test]
fn malformed_input() {
  assert!(matches!(interpret(""), Err(CalcError::Syntax(_))));
  assert!(matches!(interpret("1.2.3"), Err(CalcError::Syntax(_))));
  assert!(matches!(interpret("2*"), Err(CalcError::Syntax(_))));
  let err = interpret("2|3").unwrap_err();
  assert!(err.to_string().contains("abs(x)"), "{err}");
}

#[test]
fn undefined_names() {
  let err = interpret("foo").unwrap_err();
  assert!(matches!(err, CalcError::Name(_)));
  assert!(err.to_string().contains("undefined token 'f'"), "{err}");
}

#[test]
fn wrong_arity() {
  let err = interpret("sin(1,2)").unwrap_err();
  assert!(matches!(err, CalcError::Arity(_)));
  assert_eq!(
    err.to_string(),
    "TypeError: function sin(θ) expected 1 argument but 2 were given"
  );
  assert!(matches!(interpret("int(x^2)"), Err(CalcError::Arity(_))));
}
