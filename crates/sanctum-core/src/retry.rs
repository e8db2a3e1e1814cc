//! Bounded exponential backoff for transient store failures.

use std::{future::Future, time::Duration};

use backon::{ExponentialBuilder, Retryable};
use serde::Deserialize;

use crate::{Error, Result};

/// How transient ([`crate::Error::is_transient`]) failures are retried. Any other
/// error is returned immediately.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
  /// Total attempts, including the first. `1` disables retries.
  pub max_attempts:       u32,
  pub initial_backoff_ms: u64,
  pub max_backoff_ms:     u64,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self { max_attempts: 4, initial_backoff_ms: 50, max_backoff_ms: 1_000 }
  }
}

impl RetryPolicy {
  pub fn none() -> Self { Self { max_attempts: 1, ..Self::default() } }

  /// Doubling delays from `initial_backoff_ms`, capped at `max_backoff_ms`,
  /// one per retry.
  pub fn backoff(&self) -> ExponentialBuilder {
    ExponentialBuilder::default()
      .with_min_delay(Duration::from_millis(self.initial_backoff_ms))
      .with_max_delay(Duration::from_millis(self.max_backoff_ms))
      .with_factor(2.0)
      .with_max_times(self.max_attempts.saturating_sub(1) as usize)
  }

  /// Run `op` until it succeeds, fails with a non-transient error, or the
  /// attempts are exhausted (the last error is returned).
  pub async fn run<T, F, Fut>(&self, what: &str, op: F) -> Result<T>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
  {
    let mut attempt = 0u32;
    op.retry(self.backoff())
      .when(Error::is_transient)
      .notify(|err: &Error, pause: Duration| {
        attempt += 1;
        tracing::warn!(%err, what, attempt, ?pause, "transient store failure; retrying");
      })
      .await
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicU32, Ordering};

  use backon::BackoffBuilder as _;

  use super::*;

  fn fast(max_attempts: u32) -> RetryPolicy {
    RetryPolicy { max_attempts, initial_backoff_ms: 1, max_backoff_ms: 2 }
  }

  #[test]
  fn backoff_doubles_and_caps() {
    let p = RetryPolicy { max_attempts: 6, initial_backoff_ms: 50, max_backoff_ms: 300 };
    let delays: Vec<u64> =
      p.backoff().build().map(|d| (d.as_secs_f64() * 1000.0).round() as u64).collect();
    assert_eq!(delays, [50, 100, 200, 300, 300]);
  }

  #[test]
  fn single_attempt_never_waits() {
    assert_eq!(RetryPolicy::none().backoff().build().count(), 0);
  }

  #[tokio::test]
  async fn retries_transient_errors_until_success() {
    let calls = &AtomicU32::new(0);
    let out = fast(4)
      .run("test", || async move {
        if calls.fetch_add(1, Ordering::SeqCst) < 2 {
          Err(Error::StoreUnavailable("offline".into()))
        } else {
          Ok(7)
        }
      })
      .await
      .unwrap();
    assert_eq!(out, 7);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn gives_up_after_max_attempts() {
    let calls = &AtomicU32::new(0);
    let err = fast(3)
      .run("test", || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Err::<(), _>(Error::StoreUnavailable("offline".into()))
      })
      .await
      .unwrap_err();
    assert!(err.is_transient());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn logic_errors_are_not_retried() {
    let calls = &AtomicU32::new(0);
    let err = fast(5)
      .run("test", || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Err::<(), _>(Error::NotFound("daily record".into()))
      })
      .await
      .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }
}
