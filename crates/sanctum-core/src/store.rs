//! The `DocumentStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `sanctum-store-sqlite`
//! and the in-process [`crate::memory::MemoryStore`]). Higher layers depend on
//! this abstraction, never on a concrete backend, and reach it through
//! [`crate::context::SessionContext`] rather than calling it directly.

use std::future::Future;

use uuid::Uuid;

use crate::{
  daily::{DailyKind, DailyPayload, DailyRecord, PayloadPatch},
  day::DayKey,
  feed::Subscription,
  list::{Collection, Fields, ListRecord, ListScope, Ordering},
  owner::OwnerId,
};

/// Abstraction over an owner-scoped document store.
///
/// Timestamps (`created_at`, `updated_at`) always come from the store's own
/// clock; callers never supply them. Backend errors must convert into the
/// core taxonomy so callers can tell transient failures from logic errors.
pub trait DocumentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static + Into<crate::Error>;

  // ── Daily singletons ──────────────────────────────────────────────────

  /// Fetch the record for `(owner, kind, day)`, if any.
  fn get_daily<'a>(
    &'a self,
    owner: &'a OwnerId,
    kind: DailyKind,
    day: DayKey,
  ) -> impl Future<Output = Result<Option<DailyRecord>, Self::Error>> + Send + 'a;

  /// Conditional create: persist a new record unless one already exists for
  /// the key, in which case the existing record is returned untouched.
  ///
  /// The existence check and the insert must be a single atomic step so two
  /// racing callers can never both create a record.
  fn create_daily_if_absent<'a>(
    &'a self,
    owner: &'a OwnerId,
    kind: DailyKind,
    day: DayKey,
    payload: DailyPayload,
  ) -> impl Future<Output = Result<DailyRecord, Self::Error>> + Send + 'a;

  /// Merge `patch` into an existing record. Fails with a not-found error and
  /// writes nothing when no record exists for the key.
  fn update_daily<'a>(
    &'a self,
    owner: &'a OwnerId,
    kind: DailyKind,
    day: DayKey,
    patch: PayloadPatch,
  ) -> impl Future<Output = Result<DailyRecord, Self::Error>> + Send + 'a;

  /// All records of `kind` for `owner`, ordered by day ascending.
  fn list_daily<'a>(
    &'a self,
    owner: &'a OwnerId,
    kind: DailyKind,
  ) -> impl Future<Output = Result<Vec<DailyRecord>, Self::Error>> + Send + 'a;

  // ── List collections ──────────────────────────────────────────────────

  /// Persist a new record with a store-assigned id and timestamp.
  fn create_list_record<'a>(
    &'a self,
    owner: &'a OwnerId,
    collection: Collection,
    fields: Fields,
  ) -> impl Future<Output = Result<ListRecord, Self::Error>> + Send + 'a;

  fn get_list_record<'a>(
    &'a self,
    owner: &'a OwnerId,
    collection: Collection,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<ListRecord>, Self::Error>> + Send + 'a;

  /// Merge `fields` into an existing record (not-found error if absent).
  fn update_list_record<'a>(
    &'a self,
    owner: &'a OwnerId,
    collection: Collection,
    id: Uuid,
    fields: Fields,
  ) -> impl Future<Output = Result<ListRecord, Self::Error>> + Send + 'a;

  /// Delete a record (not-found error if absent).
  fn delete_list_record<'a>(
    &'a self,
    owner: &'a OwnerId,
    collection: Collection,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Current contents of `scope`, sorted by `ordering` or in store order.
  fn list_records<'a>(
    &'a self,
    scope: &'a ListScope,
    ordering: Option<&'a Ordering>,
  ) -> impl Future<Output = Result<Vec<ListRecord>, Self::Error>> + Send + 'a;

  /// Open a live feed of snapshots for `scope`. The current contents are
  /// delivered immediately; every later write to the scope yields exactly one
  /// more snapshot, in the order the store applied the writes.
  fn subscribe(
    &self,
    scope: ListScope,
    ordering: Option<Ordering>,
  ) -> impl Future<Output = Result<Subscription, Self::Error>> + Send + '_;
}
