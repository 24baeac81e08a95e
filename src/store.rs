//! JSON file holding the user definitions of a session:
//!
//! ```json
//! { "custom_functions": ["f(x) = x^2", "c = 3"] }
//! ```

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::registry::FunctionDefinition;

#[derive(Error, Debug)]
pub enum StoreError {
  #[error("cannot access {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
  #[error("malformed definition store {path}: {source}")]
  Json {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDefinitions {
  #[serde(default)]
  pub custom_functions: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Store {
  path: PathBuf,
}

impl Store {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Store { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Reads the stored definitions. A missing file is an empty store.
  pub fn read(&self) -> Result<StoredDefinitions, StoreError> {
    let text = match std::fs::read_to_string(&self.path) {
      Ok(text) => text,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        tracing::debug!(path = %self.path.display(), "no definition store yet");
        return Ok(StoredDefinitions::default());
      }
      Err(source) => {
        return Err(StoreError::Io {
          path: self.path.clone(),
          source,
        })
      }
    };
    serde_json::from_str(&text).map_err(|source| StoreError::Json {
      path: self.path.clone(),
      source,
    })
  }

  /// Rewrites the store with the canonical form of every definition.
  pub fn write<'a, I>(&self, definitions: I) -> Result<(), StoreError>
  where
    I: IntoIterator<Item = &'a FunctionDefinition>,
  {
    let stored = StoredDefinitions {
      custom_functions: definitions.into_iter().map(|d| d.to_string()).collect(),
    };
    let json = serde_json::to_string_pretty(&stored).map_err(|source| StoreError::Json {
      path: self.path.clone(),
      source,
    })?;
    if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
      std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
        path: parent.to_path_buf(),
        source,
      })?;
    }
    std::fs::write(&self.path, json).map_err(|source| StoreError::Io {
      path: self.path.clone(),
      source,
    })?;
    tracing::debug!(
      path = %self.path.display(),
      count = stored.custom_functions.len(),
      "saved definitions"
    );
    Ok(())
  }
}
