//! Error type for `sambahayan-engine`.
//!
//! Only failures the caller must see live here. Registry outages, semantic
//! filter failures and feedback write failures are logged and absorbed.

use sambahayan_core::person::PersonRef;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("household head {0} not found")]
  HeadNotFound(PersonRef),

  #[error("spouse {0} not found")]
  SpouseNotFound(PersonRef),

  /// The request was rejected before anything was written.
  #[error("invalid household: {0}")]
  Invalid(#[from] sambahayan_core::Error),

  #[error("registry lookup failed: {0}")]
  Directory(#[source] BoxError),

  /// The household transaction failed; nothing was saved.
  #[error("household save failed: {0}")]
  SaveTransaction(#[source] BoxError),

  #[error("store error: {0}")]
  Store(#[source] BoxError),
}

impl Error {
  /// The domain rule behind this error, if any, found by walking the source
  /// chain (store errors may wrap one).
  pub fn domain(&self) -> Option<&sambahayan_core::Error> {
    if let Self::Invalid(e) = self {
      return Some(e);
    }
    let mut current = std::error::Error::source(self);
    while let Some(err) = current {
      if let Some(domain) = err.downcast_ref::<sambahayan_core::Error>() {
        return Some(domain);
      }
      current = err.source();
    }
    None
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
