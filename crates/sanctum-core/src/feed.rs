//! Live change-feed subscriptions.
//!
//! Every write to a collection publishes a [`ScopeChange`] carrying the full
//! post-write contents of the affected scope. A [`Subscription`] filters the
//! published changes down to its own scope, applies its ordering and hands
//! the caller a fully materialised snapshot, never a diff.

use std::{
  pin::Pin,
  sync::Arc,
  task::{Context, Poll},
};

use futures::Stream;
use tokio::sync::{broadcast, mpsc};

use crate::list::{ListRecord, ListScope, Ordering, ordered};

/// The full, ordered contents of one scope at one point in time.
pub type Snapshot = Vec<ListRecord>;

/// Undelivered snapshots buffered per subscription.
const FEED_BUFFER: usize = 32;

/// Published by a store after each applied write, in write order.
#[derive(Debug, Clone)]
pub struct ScopeChange {
  pub scope:   ListScope,
  /// Post-write contents of `scope`, in store order.
  pub records: Arc<Vec<ListRecord>>,
}

// ─── Teardown ────────────────────────────────────────────────────────────────

/// Runs its release action exactly once: on explicit unsubscribe or on drop,
/// whichever comes first.
struct Teardown(Option<Box<dyn FnOnce() + Send>>);

impl Teardown {
  fn run(&mut self) {
    if let Some(release) = self.0.take() {
      release();
    }
  }
}

impl Drop for Teardown {
  fn drop(&mut self) { self.run(); }
}

// ─── Subscription ────────────────────────────────────────────────────────────

/// A live sequence of snapshots for one [`ListScope`].
pub struct Subscription {
  rx:       mpsc::Receiver<Snapshot>,
  teardown: Teardown,
}

impl Subscription {
  /// Wrap a receiver; `release` frees whatever feeds it.
  pub fn new(rx: mpsc::Receiver<Snapshot>, release: impl FnOnce() + Send + 'static) -> Self {
    Self { rx, teardown: Teardown(Some(Box::new(release))) }
  }

  /// The next snapshot, or `None` once unsubscribed or the store went away.
  pub async fn next(&mut self) -> Option<Snapshot> { self.rx.recv().await }

  /// Stop deliveries and release the feed. Snapshots still buffered are
  /// discarded. Calling this more than once is harmless.
  pub fn unsubscribe(&mut self) {
    self.teardown.run();
    self.rx.close();
    while self.rx.try_recv().is_ok() {}
  }

  pub fn is_active(&self) -> bool { self.teardown.0.is_some() }
}

impl Stream for Subscription {
  type Item = Snapshot;

  fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Snapshot>> {
    self.rx.poll_recv(cx)
  }
}

impl std::fmt::Debug for Subscription {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Subscription").field("active", &self.is_active()).finish()
  }
}

/// Start a subscription over `changes`.
///
/// `initial` must be the contents of `scope` read atomically with the
/// creation of `changes`, so that no write falls between the two. It is
/// delivered immediately; each later change to `scope` yields one more
/// snapshot.
pub fn spawn_feed(
  scope: ListScope,
  ordering: Option<Ordering>,
  initial: Vec<ListRecord>,
  mut changes: broadcast::Receiver<ScopeChange>,
) -> Subscription {
  let (tx, rx) = mpsc::channel(FEED_BUFFER);

  // The channel is fresh, so the first snapshot always fits.
  let _ = tx.try_send(ordered(initial, ordering.as_ref()));

  let task = tokio::spawn(async move {
    loop {
      match changes.recv().await {
        Ok(change) if change.scope == scope => {
          let snapshot = ordered(change.records.as_ref().clone(), ordering.as_ref());
          if tx.send(snapshot).await.is_err() {
            break;
          }
        }
        Ok(_) => {}
        // Snapshots are complete, so skipping intermediate ones loses nothing
        // but history.
        Err(broadcast::error::RecvError::Lagged(skipped)) => {
          tracing::warn!(
            owner = %scope.owner,
            collection = %scope.collection,
            skipped,
            "change feed lagged"
          );
        }
        Err(broadcast::error::RecvError::Closed) => break,
      }
    }
    tracing::debug!(owner = %scope.owner, collection = %scope.collection, "change feed closed");
  });

  Subscription::new(rx, move || task.abort())
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

  use super::*;

  #[test]
  fn teardown_runs_exactly_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (_tx, rx) = mpsc::channel(1);
    let counter = calls.clone();
    let mut sub = Subscription::new(rx, move || {
      counter.fetch_add(1, AtomicOrdering::SeqCst);
    });

    sub.unsubscribe();
    sub.unsubscribe();
    assert!(!sub.is_active());
    drop(sub);
    assert_eq!(calls.load(AtomicOrdering::SeqCst), 1);
  }

  #[test]
  fn drop_tears_down() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (_tx, rx) = mpsc::channel(1);
    let counter = calls.clone();
    drop(Subscription::new(rx, move || {
      counter.fetch_add(1, AtomicOrdering::SeqCst);
    }));
    assert_eq!(calls.load(AtomicOrdering::SeqCst), 1);
  }

  #[tokio::test]
  async fn unsubscribe_discards_buffered_snapshots() {
    let (tx, rx) = mpsc::channel(4);
    let mut sub = Subscription::new(rx, || {});
    tx.send(vec![]).await.unwrap();
    sub.unsubscribe();
    assert!(sub.next().await.is_none());
    assert!(tx.send(vec![]).await.is_err());
  }
}
