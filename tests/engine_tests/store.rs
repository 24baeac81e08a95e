use super::*;

fn stored_session(path: &std::path::Path) -> Result<Session, CalcError> {
  Session::new(EngineConfig::default().with_store(path.to_path_buf()))
}

#[test]
fn definitions_survive_a_restart() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("definitions.json");
  {
    let mut session = stored_session(&path).unwrap();
    session.define("f(x) = x^2").unwrap();
    session.define("c = 3").unwrap();
  }
  let text = std::fs::read_to_string(&path).unwrap();
  assert!(text.contains("\"f(x) = x^2\""), "{text}");

  let mut session = stored_session(&path).unwrap();
  assert_eq!(session.registry().customs().count(), 2);
  assert_eq!(session.interpret("f(c)").unwrap(), "9.0");
}

#[test]
fn removal_is_persisted() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("nested").join("definitions.json");
  let mut session = stored_session(&path).unwrap();
  session.define("f(x) = x^2").unwrap();
  session.remove("f").unwrap();
  let session = stored_session(&path).unwrap();
  assert_eq!(session.registry().customs().count(), 0);
}

#[test]
fn missing_file_is_empty() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("absent.json");
  let session = stored_session(&path).unwrap();
  assert_eq!(session.registry().customs().count(), 0);
  assert!(!path.exists());
}

#[test]
fn invalid_entries_are_skipped() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("definitions.json");
  std::fs::write(
    &path,
    r#"{ "custom_functions": ["f(x) = x^2", "sin(x) = x", "g(x) = y"] }"#,
  )
  .unwrap();
  let mut session = stored_session(&path).unwrap();
  assert_eq!(session.registry().customs().count(), 1);
  assert_eq!(session.interpret("f(4)").unwrap(), "16.0");
}

#[test]
fn malformed_file_is_an_error() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("definitions.json");
  std::fs::write(&path, "not json").unwrap();
  assert!(matches!(stored_session(&path), Err(CalcError::Store(_))));
}

#[test]
fn callers_survive_a_restart() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("definitions.json");
  {
    let mut session = stored_session(&path).unwrap();
    session.define("f(x) = x^2").unwrap();
    session.define("h(x) = f(x)+1").unwrap();
    session.define("f(x) = x+1").unwrap();
    assert_eq!(session.interpret("h(3)").unwrap(), "5.0");
    assert!(matches!(session.remove("f"), Err(CalcError::Permission(_))));
  }
  let mut session = stored_session(&path).unwrap();
  assert_eq!(session.registry().customs().count(), 2);
  assert_eq!(session.interpret("h(3)").unwrap(), "5.0");
}

#[test]
fn callers_stored_before_their_callees_load() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("definitions.json");
  std::fs::write(
    &path,
    r#"{ "custom_functions": ["h(x) = f(x)+1", "f(x) = x^2"] }"#,
  )
  .unwrap();
  let mut session = stored_session(&path).unwrap();
  assert_eq!(session.registry().customs().count(), 2);
  assert_eq!(session.interpret("h(3)").unwrap(), "10.0");
}

#[test]
fn failed_save_undoes_a_definition() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("definitions.json");
  let mut session = stored_session(&path).unwrap();
  std::fs::create_dir(&path).unwrap();

  let err = session.define("f(x) = x^2").unwrap_err();
  assert!(matches!(err, CalcError::Store(_)), "{err}");
  assert!(session.registry().custom("f").is_none());
  assert!(matches!(session.interpret("f(2)"), Err(CalcError::Name(_))));
}

#[test]
fn failed_save_undoes_a_removal() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("definitions.json");
  let mut session = stored_session(&path).unwrap();
  session.define("f(x) = x^2").unwrap();
  std::fs::remove_file(&path).unwrap();
  std::fs::create_dir(&path).unwrap();

  let err = session.remove("f").unwrap_err();
  assert!(matches!(err, CalcError::Store(_)), "{err}");
  assert_eq!(session.interpret("f(2)").unwrap(), "4.0");
  assert_eq!(session.registry().customs().count(), 1);
}
