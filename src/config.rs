use std::path::PathBuf;
use std::time::Duration;

use crate::number::DEFAULT_DIGITS;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);
pub const DEFAULT_SAMPLES: usize = 100;

/// Settings of an engine session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
  /// Significant decimal digits of results; the working precision is
  /// derived from it.
  pub digits: usize,
  /// Limit for one request when run through [`crate::host`].
  pub timeout: Duration,
  /// File holding the user definitions, if they are persisted.
  pub store: Option<PathBuf>,
  /// Default number of plot samples.
  pub samples: usize,
}

impl Default for EngineConfig {
  fn default() -> Self {
    EngineConfig {
      digits: DEFAULT_DIGITS,
      timeout: DEFAULT_TIMEOUT,
      store: None,
      samples: DEFAULT_SAMPLES,
    }
  }
}

impl EngineConfig {
  pub fn with_store(mut self, path: impl Into<PathBuf>) -> Self {
    self.store = Some(path.into());
    self
  }

  pub fn with_digits(mut self, digits: usize) -> Self {
    self.digits = digits;
    self
  }
}
