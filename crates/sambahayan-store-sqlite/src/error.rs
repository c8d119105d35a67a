//! Error type for `sambahayan-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A domain rule rejected the write (e.g. a member conflict).
  #[error("{0}")]
  Core(#[from] sambahayan_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored enum column held an unknown value.
  #[error("cannot decode {column}: {value:?}")]
  Decode {
    column: &'static str,
    value:  String,
  },
}

impl Error {
  /// Unwrap a domain error smuggled out of a `Connection::call` closure.
  pub(crate) fn from_call(err: tokio_rusqlite::Error) -> Self {
    match err {
      tokio_rusqlite::Error::Other(inner) => {
        match inner.downcast::<sambahayan_core::Error>() {
          Ok(core) => Self::Core(*core),
          Err(other) => Self::Database(tokio_rusqlite::Error::Other(other)),
        }
      }
      other => Self::Database(other),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
