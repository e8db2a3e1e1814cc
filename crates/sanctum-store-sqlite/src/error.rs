//! Error type for `sanctum-store-sqlite`.

use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] sanctum_core::Error),

  #[error("database error: {0}")]
  Database(#[source] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  /// A stored column could not be read back as its domain type.
  #[error("decode error: {0}")]
  Decode(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
  /// Carry this error out of a connection closure; [`From`] unwraps it again
  /// on the other side.
  pub(crate) fn abort(err: impl Into<Error>) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Other(Box::new(err.into()))
  }

  /// Whether retrying the operation later may succeed.
  pub fn is_transient(&self) -> bool {
    match self {
      Self::Database(tokio_rusqlite::Error::ConnectionClosed) => true,
      Self::Database(tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(f, _))) => {
        matches!(f.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
      }
      Self::Core(e) => e.is_transient(),
      _ => false,
    }
  }
}

impl From<tokio_rusqlite::Error> for Error {
  fn from(err: tokio_rusqlite::Error) -> Self {
    match err {
      tokio_rusqlite::Error::Other(inner) => match inner.downcast::<Error>() {
        Ok(ours) => *ours,
        Err(other) => Self::Database(tokio_rusqlite::Error::Other(other)),
      },
      err => Self::Database(err),
    }
  }
}

impl From<Error> for sanctum_core::Error {
  fn from(err: Error) -> Self {
    if err.is_transient() {
      return match err {
        Error::Core(e) => e,
        other => Self::StoreUnavailable(Box::new(other)),
      };
    }
    match err {
      Error::Core(e) => e,
      Error::Json(e) => Self::Serialization(e),
      other => Self::Store(Box::new(other)),
    }
  }
}
