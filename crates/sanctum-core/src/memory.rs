//! [`MemoryStore`], an in-process [`DocumentStore`].
//!
//! Every operation runs inside one mutex section, which makes the conditional
//! create atomic and publishes change events in exactly the order writes were
//! applied. Used by tests and by anything that wants a store without a file.

use std::{
  collections::BTreeMap,
  sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicUsize, Ordering as AtomicOrdering},
  },
};

use chrono::Utc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
  Error, Result,
  daily::{DailyKind, DailyPayload, DailyRecord, PayloadPatch},
  day::DayKey,
  feed::{ScopeChange, Subscription, spawn_feed},
  list::{Collection, Fields, ListRecord, ListScope, Ordering, ordered, validate_fields},
  owner::OwnerId,
  store::DocumentStore,
};

const CHANGE_CAPACITY: usize = 256;

type DailyKey = (OwnerId, DailyKind, DayKey);

#[derive(Default)]
struct State {
  daily: BTreeMap<DailyKey, DailyRecord>,
  /// Insertion order is the store order of list records.
  lists: Vec<ListRecord>,
}

impl State {
  fn scope_records(&self, scope: &ListScope) -> Vec<ListRecord> {
    self
      .lists
      .iter()
      .filter(|r| r.owner_id == scope.owner && r.collection == scope.collection)
      .cloned()
      .collect()
  }

  fn position(&self, owner: &OwnerId, collection: Collection, id: Uuid) -> Option<usize> {
    self
      .lists
      .iter()
      .position(|r| r.id == id && r.owner_id == *owner && r.collection == collection)
  }
}

/// Cloning is cheap; clones share the same data.
#[derive(Clone)]
pub struct MemoryStore {
  state:           Arc<Mutex<State>>,
  changes:         broadcast::Sender<ScopeChange>,
  daily_creations: Arc<AtomicUsize>,
}

impl Default for MemoryStore {
  fn default() -> Self { Self::new() }
}

impl MemoryStore {
  pub fn new() -> Self {
    let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
    Self {
      state: Arc::new(Mutex::new(State::default())),
      changes,
      daily_creations: Arc::new(AtomicUsize::new(0)),
    }
  }

  /// How many daily records this store has actually inserted.
  pub fn daily_creations(&self) -> usize { self.daily_creations.load(AtomicOrdering::SeqCst) }

  fn lock(&self) -> MutexGuard<'_, State> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Must be called with the lock held so events follow write order.
  fn publish(&self, state: &State, scope: ListScope) {
    let records = Arc::new(state.scope_records(&scope));
    // An error only means nobody is subscribed.
    let _ = self.changes.send(ScopeChange { scope, records });
  }
}

fn not_found_daily(owner: &OwnerId, kind: DailyKind, day: DayKey) -> Error {
  Error::NotFound(format!("{kind} record for {owner} on {day}"))
}

fn not_found_list(collection: Collection, id: Uuid) -> Error {
  Error::NotFound(format!("{collection} record {id}"))
}

impl DocumentStore for MemoryStore {
  type Error = Error;

  // ── Daily singletons ──────────────────────────────────────────────────────

  async fn get_daily<'a>(
    &'a self,
    owner: &'a OwnerId,
    kind: DailyKind,
    day: DayKey,
  ) -> Result<Option<DailyRecord>> {
    Ok(self.lock().daily.get(&(owner.clone(), kind, day)).cloned())
  }

  async fn create_daily_if_absent<'a>(
    &'a self,
    owner: &'a OwnerId,
    kind: DailyKind,
    day: DayKey,
    payload: DailyPayload,
  ) -> Result<DailyRecord> {
    payload.ensure_kind(kind)?;
    let mut state = self.lock();
    let record = state
      .daily
      .entry((owner.clone(), kind, day))
      .or_insert_with(|| {
        self.daily_creations.fetch_add(1, AtomicOrdering::SeqCst);
        let now = Utc::now();
        DailyRecord {
          owner_id: owner.clone(),
          kind,
          day_key: day,
          payload,
          created_at: now,
          updated_at: now,
        }
      });
    Ok(record.clone())
  }

  async fn update_daily<'a>(
    &'a self,
    owner: &'a OwnerId,
    kind: DailyKind,
    day: DayKey,
    patch: PayloadPatch,
  ) -> Result<DailyRecord> {
    let mut state = self.lock();
    let record = state
      .daily
      .get_mut(&(owner.clone(), kind, day))
      .ok_or_else(|| not_found_daily(owner, kind, day))?;

    let mut payload = record.payload.clone();
    patch.apply(&mut payload)?;
    record.payload = payload;
    record.updated_at = Utc::now();
    Ok(record.clone())
  }

  async fn list_daily<'a>(
    &'a self,
    owner: &'a OwnerId,
    kind: DailyKind,
  ) -> Result<Vec<DailyRecord>> {
    // BTreeMap order is (owner, kind, day), so this is day-ascending.
    Ok(
      self
        .lock()
        .daily
        .values()
        .filter(|r| r.owner_id == *owner && r.kind == kind)
        .cloned()
        .collect(),
    )
  }

  // ── List collections ──────────────────────────────────────────────────────

  async fn create_list_record<'a>(
    &'a self,
    owner: &'a OwnerId,
    collection: Collection,
    fields: Fields,
  ) -> Result<ListRecord> {
    validate_fields(&fields)?;
    let record = ListRecord {
      id: Uuid::new_v4(),
      owner_id: owner.clone(),
      collection,
      fields,
      created_at: Utc::now(),
    };

    let mut state = self.lock();
    state.lists.push(record.clone());
    self.publish(&state, ListScope::new(owner.clone(), collection));
    Ok(record)
  }

  async fn get_list_record<'a>(
    &'a self,
    owner: &'a OwnerId,
    collection: Collection,
    id: Uuid,
  ) -> Result<Option<ListRecord>> {
    let state = self.lock();
    Ok(state.position(owner, collection, id).map(|i| state.lists[i].clone()))
  }

  async fn update_list_record<'a>(
    &'a self,
    owner: &'a OwnerId,
    collection: Collection,
    id: Uuid,
    fields: Fields,
  ) -> Result<ListRecord> {
    validate_fields(&fields)?;
    let mut state = self.lock();
    let i = state
      .position(owner, collection, id)
      .ok_or_else(|| not_found_list(collection, id))?;

    state.lists[i].fields.extend(fields);
    let record = state.lists[i].clone();
    self.publish(&state, ListScope::new(owner.clone(), collection));
    Ok(record)
  }

  async fn delete_list_record<'a>(
    &'a self,
    owner: &'a OwnerId,
    collection: Collection,
    id: Uuid,
  ) -> Result<()> {
    let mut state = self.lock();
    let i = state
      .position(owner, collection, id)
      .ok_or_else(|| not_found_list(collection, id))?;

    state.lists.remove(i);
    self.publish(&state, ListScope::new(owner.clone(), collection));
    Ok(())
  }

  async fn list_records<'a>(
    &'a self,
    scope: &'a ListScope,
    ordering: Option<&'a Ordering>,
  ) -> Result<Vec<ListRecord>> {
    let records = self.lock().scope_records(scope);
    Ok(ordered(records, ordering))
  }

  async fn subscribe(
    &self,
    scope: ListScope,
    ordering: Option<Ordering>,
  ) -> Result<Subscription> {
    // Read and register under one lock so no write can slip in between.
    let (initial, changes) = {
      let state = self.lock();
      (state.scope_records(&scope), self.changes.subscribe())
    };
    Ok(spawn_feed(scope, ordering, initial, changes))
  }
}
