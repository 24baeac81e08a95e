//! Running engine jobs from an asynchronous host.
//!
//! The engine is synchronous. A host wraps each request in
//! [`run_with_timeout`], which runs it on tokio's blocking pool and abandons
//! it once the limit is reached. Abandonment is cooperative: the evaluator
//! polls the job's [`CancelToken`] between postfix tokens, and every change
//! to session state first commits the token, so an abandoned job never
//! leaves a partial definition or a stale `ans` behind.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::{CalcError, Session};

const RUNNING: u8 = 0;
const COMMITTED: u8 = 1;
const CANCELLED: u8 = 2;

#[derive(Debug)]
pub struct CancelToken {
  state: AtomicU8,
}

impl Default for CancelToken {
  fn default() -> Self {
    CancelToken {
      state: AtomicU8::new(RUNNING),
    }
  }
}

impl CancelToken {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_cancelled(&self) -> bool {
    self.state.load(Ordering::Acquire) == CANCELLED
  }

  /// Marks the job as about to change state. Fails if it was cancelled.
  pub fn commit(&self) -> bool {
    match self.state.compare_exchange(
      RUNNING,
      COMMITTED,
      Ordering::AcqRel,
      Ordering::Acquire,
    ) {
      Ok(_) => true,
      Err(current) => current == COMMITTED,
    }
  }

  /// Cancels a job that has not committed yet.
  pub fn cancel(&self) -> bool {
    match self.state.compare_exchange(
      RUNNING,
      CANCELLED,
      Ordering::AcqRel,
      Ordering::Acquire,
    ) {
      Ok(_) => true,
      Err(current) => current == CANCELLED,
    }
  }
}

/// Runs `job` against the shared session, giving up after `limit`.
///
/// Jobs on the same session are serialized by its mutex; time spent waiting
/// for the lock counts toward the limit. A job that already committed a
/// state change is awaited to completion even past the limit.
pub async fn run_with_timeout<T, F>(
  session: Arc<Mutex<Session>>,
  limit: Duration,
  job: F,
) -> Result<T, CalcError>
where
  T: Send + 'static,
  F: FnOnce(&mut Session) -> Result<T, CalcError> + Send + 'static,
{
  let token = Arc::new(CancelToken::new());
  let worker_token = token.clone();
  let mut handle = tokio::task::spawn_blocking(move || {
    let mut session = session.lock().unwrap_or_else(PoisonError::into_inner);
    session.context_mut().cancel = Some(worker_token);
    let result = job(&mut session);
    session.context_mut().cancel = None;
    result
  });

  let joined = match tokio::time::timeout(limit, &mut handle).await {
    Ok(joined) => joined,
    Err(_) if token.cancel() => {
      tracing::warn!(?limit, "calculation timed out");
      return Err(CalcError::Timeout(limit));
    }
    Err(_) => {
      tracing::debug!("calculation committed before the time limit, waiting");
      handle.await
    }
  };

  match joined {
    Ok(result) => result,
    Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
    Err(_) => Err(CalcError::Cancelled),
  }
}
