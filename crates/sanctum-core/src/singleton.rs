//! Get-or-create and update for daily singleton records.
//!
//! [`DailyRecords`] wraps any [`DocumentStore`] and turns its conditional
//! create into the full get-or-create contract: fetch by key, fall back to a
//! default payload only on a miss, retry the whole operation once if the
//! store reports a write conflict, and retry transient failures with backoff.

use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  daily::{DailyKind, DailyPayload, DailyRecord, PayloadPatch},
  day::DayKey,
  owner::OwnerId,
  retry::RetryPolicy,
  store::DocumentStore,
};

pub struct DailyRecords<'a, S> {
  store: &'a S,
  retry: &'a RetryPolicy,
}

impl<'a, S: DocumentStore> DailyRecords<'a, S> {
  pub fn new(store: &'a S, retry: &'a RetryPolicy) -> Self { Self { store, retry } }

  /// Return the record for `(owner, kind, day)`, creating it from `factory`
  /// if it does not exist yet.
  ///
  /// An existing record is returned unchanged and nothing is written.
  /// `factory` runs at most once per call.
  pub async fn get_or_create<F>(
    &self,
    owner: &OwnerId,
    kind: DailyKind,
    day: DayKey,
    factory: F,
  ) -> Result<DailyRecord>
  where
    F: FnOnce() -> DailyPayload,
  {
    if let Some(existing) = self.fetch(owner, kind, day).await? {
      debug!(%owner, %kind, %day, "daily record hit");
      return Ok(existing);
    }

    let payload = factory();
    payload.ensure_kind(kind)?;

    match self.create(owner, kind, day, payload.clone()).await {
      Err(err @ Error::Conflict(_)) => {
        warn!(%owner, %kind, %day, %err, "conflicting daily create; retrying once");
        if let Some(existing) = self.fetch(owner, kind, day).await? {
          return Ok(existing);
        }
        self.create(owner, kind, day, payload).await
      }
      other => other,
    }
  }

  /// Merge `patch` into the existing record. Fails with [`Error::NotFound`]
  /// when [`Self::get_or_create`] has not run for the key yet.
  pub async fn update(
    &self,
    owner: &OwnerId,
    kind: DailyKind,
    day: DayKey,
    patch: PayloadPatch,
  ) -> Result<DailyRecord> {
    if patch.kind() != kind {
      return Err(Error::PayloadMismatch { expected: kind, found: patch.kind() });
    }
    let record = self
      .retry
      .run("update_daily", || {
        let patch = patch.clone();
        async move {
          self
            .store
            .update_daily(owner, kind, day, patch)
            .await
            .map_err(Into::into)
        }
      })
      .await?;
    debug!(%owner, %kind, %day, "daily record updated");
    Ok(record)
  }

  pub async fn get(
    &self,
    owner: &OwnerId,
    kind: DailyKind,
    day: DayKey,
  ) -> Result<Option<DailyRecord>> {
    self.fetch(owner, kind, day).await
  }

  /// Every record of `kind`, oldest day first.
  pub async fn history(&self, owner: &OwnerId, kind: DailyKind) -> Result<Vec<DailyRecord>> {
    self
      .retry
      .run("list_daily", || async move {
        self.store.list_daily(owner, kind).await.map_err(Into::into)
      })
      .await
  }

  async fn fetch(
    &self,
    owner: &OwnerId,
    kind: DailyKind,
    day: DayKey,
  ) -> Result<Option<DailyRecord>> {
    self
      .retry
      .run("get_daily", || async move {
        self.store.get_daily(owner, kind, day).await.map_err(Into::into)
      })
      .await
  }

  async fn create(
    &self,
    owner: &OwnerId,
    kind: DailyKind,
    day: DayKey,
    payload: DailyPayload,
  ) -> Result<DailyRecord> {
    // Retrying is safe: the create is conditional on the key being absent.
    let record = self
      .retry
      .run("create_daily_if_absent", || {
        let payload = payload.clone();
        async move {
          self
            .store
            .create_daily_if_absent(owner, kind, day, payload)
            .await
            .map_err(Into::into)
        }
      })
      .await?;
    info!(%owner, %kind, %day, "daily record ready");
    Ok(record)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    Arc,
    atomic::{AtomicU32, AtomicUsize, Ordering},
  };

  use tokio::sync::Barrier;
  use uuid::Uuid;

  use super::*;
  use crate::{
    daily::CycleEntry,
    feed::Subscription,
    list::{Collection, Fields, ListRecord, ListScope, Ordering as ListOrdering},
    memory::MemoryStore,
  };

  fn owner() -> OwnerId { OwnerId::new("owner-1").unwrap() }

  fn day(s: &str) -> DayKey { s.parse().unwrap() }

  fn affirmation(text: &str) -> DailyPayload {
    DailyPayload::Affirmation { affirmation: text.into(), acknowledged: false }
  }

  fn fast_retry() -> RetryPolicy {
    RetryPolicy { max_attempts: 3, initial_backoff_ms: 1, max_backoff_ms: 1 }
  }

  // ── A store wrapper that can stall reads and inject failures ────────────

  #[derive(Clone)]
  struct Scripted {
    inner:              MemoryStore,
    /// All readers wait here after their miss, forcing a create race.
    barrier:            Option<Arc<Barrier>>,
    unavailable_reads:  Arc<AtomicU32>,
    conflicting_writes: Arc<AtomicU32>,
  }

  impl Scripted {
    fn new(inner: MemoryStore) -> Self {
      Self {
        inner,
        barrier: None,
        unavailable_reads: Arc::new(AtomicU32::new(0)),
        conflicting_writes: Arc::new(AtomicU32::new(0)),
      }
    }

    fn take(counter: &AtomicU32) -> bool {
      counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
    }
  }

  impl DocumentStore for Scripted {
    type Error = Error;

    async fn get_daily<'a>(
      &'a self,
      owner: &'a OwnerId,
      kind: DailyKind,
      day: DayKey,
    ) -> Result<Option<DailyRecord>> {
      if Self::take(&self.unavailable_reads) {
        return Err(Error::StoreUnavailable("connection reset".into()));
      }
      let found = self.inner.get_daily(owner, kind, day).await?;
      if let Some(barrier) = &self.barrier {
        barrier.wait().await;
      }
      Ok(found)
    }

    async fn create_daily_if_absent<'a>(
      &'a self,
      owner: &'a OwnerId,
      kind: DailyKind,
      day: DayKey,
      payload: DailyPayload,
    ) -> Result<DailyRecord> {
      if Self::take(&self.conflicting_writes) {
        return Err(Error::Conflict("document changed".into()));
      }
      self.inner.create_daily_if_absent(owner, kind, day, payload).await
    }

    async fn update_daily<'a>(
      &'a self,
      owner: &'a OwnerId,
      kind: DailyKind,
      day: DayKey,
      patch: PayloadPatch,
    ) -> Result<DailyRecord> {
      self.inner.update_daily(owner, kind, day, patch).await
    }

    async fn list_daily<'a>(
      &'a self,
      owner: &'a OwnerId,
      kind: DailyKind,
    ) -> Result<Vec<DailyRecord>> {
      self.inner.list_daily(owner, kind).await
    }

    async fn create_list_record<'a>(
      &'a self,
      owner: &'a OwnerId,
      collection: Collection,
      fields: Fields,
    ) -> Result<ListRecord> {
      self.inner.create_list_record(owner, collection, fields).await
    }

    async fn get_list_record<'a>(
      &'a self,
      owner: &'a OwnerId,
      collection: Collection,
      id: Uuid,
    ) -> Result<Option<ListRecord>> {
      self.inner.get_list_record(owner, collection, id).await
    }

    async fn update_list_record<'a>(
      &'a self,
      owner: &'a OwnerId,
      collection: Collection,
      id: Uuid,
      fields: Fields,
    ) -> Result<ListRecord> {
      self.inner.update_list_record(owner, collection, id, fields).await
    }

    async fn delete_list_record<'a>(
      &'a self,
      owner: &'a OwnerId,
      collection: Collection,
      id: Uuid,
    ) -> Result<()> {
      self.inner.delete_list_record(owner, collection, id).await
    }

    async fn list_records<'a>(
      &'a self,
      scope: &'a ListScope,
      ordering: Option<&'a ListOrdering>,
    ) -> Result<Vec<ListRecord>> {
      self.inner.list_records(scope, ordering).await
    }

    async fn subscribe(
      &self,
      scope: ListScope,
      ordering: Option<ListOrdering>,
    ) -> Result<Subscription> {
      self.inner.subscribe(scope, ordering).await
    }
  }

  // ── Tests ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn sequential_get_or_create_creates_once() {
    let store = MemoryStore::new();
    let retry = fast_retry();
    let daily = DailyRecords::new(&store, &retry);
    let d = day("2024-05-01");

    let first = daily
      .get_or_create(&owner(), DailyKind::Dashboard, d, || affirmation("A"))
      .await
      .unwrap();
    let second = daily
      .get_or_create(&owner(), DailyKind::Dashboard, d, || affirmation("B"))
      .await
      .unwrap();

    assert_eq!(first, second);
    assert_eq!(store.daily_creations(), 1);
  }

  #[tokio::test]
  async fn factory_is_not_called_on_a_hit() {
    let store = MemoryStore::new();
    let retry = fast_retry();
    let daily = DailyRecords::new(&store, &retry);
    let d = day("2024-05-01");
    daily
      .get_or_create(&owner(), DailyKind::Dashboard, d, || affirmation("A"))
      .await
      .unwrap();

    let calls = AtomicUsize::new(0);
    daily
      .get_or_create(&owner(), DailyKind::Dashboard, d, || {
        calls.fetch_add(1, Ordering::SeqCst);
        affirmation("B")
      })
      .await
      .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn concurrent_get_or_create_leaves_one_record() {
    let memory = MemoryStore::new();
    let mut store = Scripted::new(memory.clone());
    store.barrier = Some(Arc::new(Barrier::new(2)));
    let retry = fast_retry();
    let d = day("2024-05-02");

    let (a, b) = tokio::join!(
      async {
        DailyRecords::new(&store, &retry)
          .get_or_create(&owner(), DailyKind::Dashboard, d, || affirmation("A"))
          .await
      },
      async {
        DailyRecords::new(&store, &retry)
          .get_or_create(&owner(), DailyKind::Dashboard, d, || affirmation("B"))
          .await
      },
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(a, b, "both callers observe the single winner");
    assert_eq!(memory.daily_creations(), 1);
    let all = memory.list_daily(&owner(), DailyKind::Dashboard).await.unwrap();
    assert_eq!(all.len(), 1);
  }

  #[tokio::test]
  async fn conflict_is_retried_once() {
    let store = Scripted::new(MemoryStore::new());
    store.conflicting_writes.store(1, Ordering::SeqCst);
    let retry = fast_retry();
    let record = DailyRecords::new(&store, &retry)
      .get_or_create(&owner(), DailyKind::Dashboard, day("2024-05-03"), || affirmation("A"))
      .await
      .unwrap();
    assert_eq!(record.payload, affirmation("A"));
  }

  #[tokio::test]
  async fn repeated_conflict_is_surfaced() {
    let store = Scripted::new(MemoryStore::new());
    store.conflicting_writes.store(2, Ordering::SeqCst);
    let retry = fast_retry();
    let err = DailyRecords::new(&store, &retry)
      .get_or_create(&owner(), DailyKind::Dashboard, day("2024-05-03"), || affirmation("A"))
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
  }

  #[tokio::test]
  async fn transient_read_failures_are_retried() {
    let store = Scripted::new(MemoryStore::new());
    store.unavailable_reads.store(2, Ordering::SeqCst);
    let retry = fast_retry();
    let record = DailyRecords::new(&store, &retry)
      .get_or_create(&owner(), DailyKind::Dashboard, day("2024-05-04"), || affirmation("A"))
      .await
      .unwrap();
    assert_eq!(record.day_key, day("2024-05-04"));
  }

  #[tokio::test]
  async fn exhausted_retries_surface_store_unavailable() {
    let store = Scripted::new(MemoryStore::new());
    store.unavailable_reads.store(10, Ordering::SeqCst);
    let retry = fast_retry();
    let err = DailyRecords::new(&store, &retry)
      .get_or_create(&owner(), DailyKind::Dashboard, day("2024-05-04"), || affirmation("A"))
      .await
      .unwrap_err();
    assert!(err.is_transient());
  }

  #[tokio::test]
  async fn update_before_create_is_not_found_and_writes_nothing() {
    let store = MemoryStore::new();
    let retry = fast_retry();
    let err = DailyRecords::new(&store, &retry)
      .update(&owner(), DailyKind::Dashboard, day("2024-05-05"), PayloadPatch::acknowledge())
      .await
      .unwrap_err();

    assert!(matches!(err, Error::NotFound(_)));
    assert!(store.list_daily(&owner(), DailyKind::Dashboard).await.unwrap().is_empty());
    assert_eq!(store.daily_creations(), 0);
  }

  #[tokio::test]
  async fn update_merges_and_preserves_created_at() {
    let store = MemoryStore::new();
    let retry = fast_retry();
    let daily = DailyRecords::new(&store, &retry);
    let d = day("2024-05-06");
    let created = daily
      .get_or_create(&owner(), DailyKind::Dashboard, d, || affirmation("A"))
      .await
      .unwrap();

    let updated = daily
      .update(&owner(), DailyKind::Dashboard, d, PayloadPatch::acknowledge())
      .await
      .unwrap();

    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(
      updated.payload,
      DailyPayload::Affirmation { affirmation: "A".into(), acknowledged: true }
    );
  }

  #[tokio::test]
  async fn factory_payload_of_the_wrong_kind_is_rejected() {
    let store = MemoryStore::new();
    let retry = fast_retry();
    let err = DailyRecords::new(&store, &retry)
      .get_or_create(&owner(), DailyKind::Dashboard, day("2024-05-07"), || {
        CycleEntry::default().into()
      })
      .await
      .unwrap_err();
    assert!(matches!(err, Error::PayloadMismatch { .. }));
    assert_eq!(store.daily_creations(), 0);
  }
}
