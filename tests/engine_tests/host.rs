use super::*;
use infixcalc::host::run_with_timeout;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[tokio::test]
async fn runs_within_the_limit() {
  let shared = Arc::new(Mutex::new(session()));
  let result = run_with_timeout(shared.clone(), Duration::from_secs(10), |s| s.interpret("2+2"))
    .await
    .unwrap();
  assert_eq!(result, "4.0");
  assert_eq!(shared.lock().unwrap().answer().to_string(), "4.0");
}

#[tokio::test]
async fn abandons_slow_jobs() {
  let shared = Arc::new(Mutex::new(session()));
  let err = run_with_timeout(shared.clone(), Duration::from_millis(20), |s| {
    std::thread::sleep(Duration::from_millis(300));
    s.interpret("1+1")
  })
  .await
  .unwrap_err();
  assert!(matches!(err, CalcError::Timeout(_)));

  // waits for the abandoned job, which must not have touched `ans`
  let session = shared.lock().unwrap();
  assert_eq!(session.answer().to_string(), "0.0");
  assert!(session.context().cancel.is_none());
}

#[tokio::test]
async fn committed_jobs_finish() {
  let shared = Arc::new(Mutex::new(session()));
  let result = run_with_timeout(shared.clone(), Duration::from_millis(20), |s| {
    let definition = s.define("f(x) = x+1")?;
    std::thread::sleep(Duration::from_millis(200));
    Ok(definition.to_string())
  })
  .await
  .unwrap();
  assert_eq!(result, "f(x) = x+1");
  assert_eq!(shared.lock().unwrap().interpret("f(1)").unwrap(), "2.0");
}
