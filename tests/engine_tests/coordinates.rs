use super::*;

#[test]
fn polar() {
  assert_eq!(interpret("polar(3,4)").unwrap(), "[5.0, 0.927295218001612]");
}

#[test]
fn cartesian_to_cylindrical() {
  assert_eq!(
    interpret("crtcyl(3,4,5)").unwrap(),
    "[5.0, 0.927295218001612, 5.0]"
  );
}

#[test]
fn cylindrical_to_spherical() {
  assert_eq!(
    interpret("cylsph(3,0,4)").unwrap(),
    "[5.0, 0.0, 0.643501108793284]"
  );
}

#[test]
fn lists_become_the_answer() {
  let mut session = session();
  session.interpret("polar(3,4)").unwrap();
  assert_eq!(session.interpret("ans").unwrap(), "[5.0, 0.927295218001612]");
  assert!(matches!(session.interpret("ans+1"), Err(CalcError::Domain(_))));
}

#[test]
fn wrong_number_of_coordinates() {
  assert!(matches!(interpret("polar(1)"), Err(CalcError::Arity(_))));
}
