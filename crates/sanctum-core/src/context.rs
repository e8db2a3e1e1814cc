//! The per-session bundle every command handler works against.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use uuid::Uuid;

use crate::{
  Result,
  content::ContentCatalog,
  day::DayKey,
  feed::Subscription,
  list::{Collection, Fields, ListRecord, ListScope, Ordering, validate_patch},
  owner::OwnerId,
  retry::RetryPolicy,
  singleton::DailyRecords,
  store::DocumentStore,
};

/// Store handle, owner identity, calendar offset and content for one
/// authenticated session. Built once per request (or per client session) and
/// passed by reference; there is no process-wide instance.
pub struct SessionContext<S> {
  store:   Arc<S>,
  owner:   OwnerId,
  offset:  FixedOffset,
  catalog: Arc<ContentCatalog>,
  retry:   RetryPolicy,
}

impl<S> Clone for SessionContext<S> {
  fn clone(&self) -> Self {
    Self {
      store:   self.store.clone(),
      owner:   self.owner.clone(),
      offset:  self.offset,
      catalog: self.catalog.clone(),
      retry:   self.retry.clone(),
    }
  }
}

impl<S: DocumentStore> SessionContext<S> {
  /// A context on UTC days with the default retry policy.
  pub fn new(store: Arc<S>, owner: OwnerId, catalog: Arc<ContentCatalog>) -> Self {
    Self {
      store,
      owner,
      offset: Utc.fix(),
      catalog,
      retry: RetryPolicy::default(),
    }
  }

  pub fn with_offset(mut self, offset: FixedOffset) -> Self {
    self.offset = offset;
    self
  }

  pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
    self.retry = retry;
    self
  }

  pub fn owner(&self) -> &OwnerId { &self.owner }

  pub fn store(&self) -> &S { &self.store }

  pub fn catalog(&self) -> &ContentCatalog { &self.catalog }

  pub fn retry(&self) -> &RetryPolicy { &self.retry }

  /// The owner's calendar day containing `instant`.
  pub fn day_of(&self, instant: DateTime<Utc>) -> DayKey {
    DayKey::from_instant(&instant.with_timezone(&self.offset))
  }

  pub fn today(&self) -> DayKey { DayKey::today(self.offset) }

  pub fn daily(&self) -> DailyRecords<'_, S> { DailyRecords::new(self.store.as_ref(), &self.retry) }

  pub fn scope(&self, collection: Collection) -> ListScope {
    ListScope::new(self.owner.clone(), collection)
  }

  // ── Collections ─────────────────────────────────────────────────────────

  /// Creates are not retried: a second attempt after an ambiguous failure
  /// could insert a duplicate.
  pub async fn create_record(&self, collection: Collection, fields: Fields) -> Result<ListRecord> {
    let record = self
      .store
      .create_list_record(&self.owner, collection, fields)
      .await
      .map_err(Into::into)?;
    tracing::debug!(owner = %self.owner, %collection, id = %record.id, "record created");
    Ok(record)
  }

  pub async fn record(&self, collection: Collection, id: Uuid) -> Result<Option<ListRecord>> {
    self
      .retry
      .run("get_list_record", || async move {
        self.store.get_list_record(&self.owner, collection, id).await.map_err(Into::into)
      })
      .await
  }

  /// Set status flags on an existing record; any other field is rejected
  /// with [`crate::Error::InvalidField`]. Retried like reads.
  pub async fn update_record(
    &self,
    collection: Collection,
    id: Uuid,
    fields: Fields,
  ) -> Result<ListRecord> {
    validate_patch(collection, &fields)?;
    self
      .retry
      .run("update_list_record", || {
        let fields = fields.clone();
        async move {
          self
            .store
            .update_list_record(&self.owner, collection, id, fields)
            .await
            .map_err(Into::into)
        }
      })
      .await
  }

  pub async fn delete_record(&self, collection: Collection, id: Uuid) -> Result<()> {
    self
      .store
      .delete_list_record(&self.owner, collection, id)
      .await
      .map_err(Into::into)?;
    tracing::debug!(owner = %self.owner, %collection, %id, "record deleted");
    Ok(())
  }

  pub async fn records(
    &self,
    collection: Collection,
    ordering: Option<&Ordering>,
  ) -> Result<Vec<ListRecord>> {
    let scope = self.scope(collection);
    let scope = &scope;
    self
      .retry
      .run("list_records", || async move {
        self.store.list_records(scope, ordering).await.map_err(Into::into)
      })
      .await
  }

  pub async fn subscribe(
    &self,
    collection: Collection,
    ordering: Option<Ordering>,
  ) -> Result<Subscription> {
    let sub = self
      .store
      .subscribe(self.scope(collection), ordering)
      .await
      .map_err(Into::into)?;
    tracing::debug!(owner = %self.owner, %collection, "feed subscribed");
    Ok(sub)
  }
}
