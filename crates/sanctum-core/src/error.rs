//! Error types for `sanctum-core`.
//!
//! Every failure a caller can observe is classified into one of four groups:
//! configuration (fatal at startup), store unavailability (transient, retry
//! with backoff), logic errors such as [`Error::NotFound`] (never retried), and
//! write conflicts (retry the whole get-or-create once).

use thiserror::Error;

use crate::daily::DailyKind;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("configuration error: {0}")]
  Configuration(String),

  #[error("store unavailable: {0}")]
  StoreUnavailable(#[source] BoxError),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("write conflict: {0}")]
  Conflict(String),

  #[error("invalid day key: {0:?}")]
  InvalidDayKey(String),

  #[error("level {0} is outside 1..=10")]
  InvalidLevel(i64),

  #[error("invalid field {field:?}: {reason}")]
  InvalidField { field: String, reason: String },

  #[error("{0} must not be empty")]
  EmptyField(&'static str),

  #[error("payload belongs to {found}, expected {expected}")]
  PayloadMismatch { expected: DailyKind, found: DailyKind },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("store error: {0}")]
  Store(#[source] BoxError),
}

impl Error {
  /// Transient failures may succeed when retried with backoff.
  pub fn is_transient(&self) -> bool { matches!(self, Self::StoreUnavailable(_)) }

  /// Input rejected before it reached the store.
  pub fn is_validation(&self) -> bool {
    matches!(
      self,
      Self::InvalidDayKey(_)
        | Self::InvalidLevel(_)
        | Self::InvalidField { .. }
        | Self::EmptyField(_)
        | Self::PayloadMismatch { .. }
    )
  }

  pub(crate) fn invalid_field(
    field: impl Into<String>,
    reason: impl Into<String>,
  ) -> Self {
    Self::InvalidField { field: field.into(), reason: reason.into() }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
