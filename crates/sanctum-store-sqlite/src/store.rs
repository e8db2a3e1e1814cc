//! [`SqliteStore`], the SQLite implementation of [`DocumentStore`].

use std::{path::Path, sync::Arc};

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use tokio::sync::broadcast;
use uuid::Uuid;

use sanctum_core::{
  daily::{DailyKind, DailyPayload, DailyRecord, PayloadPatch},
  day::DayKey,
  feed::{ScopeChange, Subscription, spawn_feed},
  list::{Collection, Fields, ListRecord, ListScope, Ordering, ordered, validate_fields},
  owner::OwnerId,
  store::DocumentStore,
};

use crate::{
  Error, Result,
  encode::{DAILY_COLUMNS, LIST_COLUMNS, RawDailyRecord, RawListRecord, encode_dt, encode_uuid},
  schema::SCHEMA,
};

/// Change events buffered for slow subscribers before they lag.
const CHANGE_CAPACITY: usize = 256;

type CallResult<T> = std::result::Result<T, tokio_rusqlite::Error>;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Sanctum document store backed by a single SQLite file.
///
/// Cloning is cheap: the connection handle and the change channel are shared.
#[derive(Clone)]
pub struct SqliteStore {
  conn:    tokio_rusqlite::Connection,
  changes: broadcast::Sender<ScopeChange>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
    let store = Self { conn, changes };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Connection-thread helpers ───────────────────────────────────────────────
//
// These run inside `Connection::call`, on the connection's own thread. All
// writes are serialised there, so publishing from inside the call emits change
// events in exactly the order the writes were applied.

fn select_daily(
  conn: &rusqlite::Connection,
  owner: &str,
  kind: &str,
  day: &str,
) -> CallResult<Option<RawDailyRecord>> {
  let sql = format!(
    "SELECT {DAILY_COLUMNS} FROM daily_records
     WHERE owner_id = ?1 AND kind = ?2 AND day_key = ?3"
  );
  Ok(
    conn
      .query_row(&sql, rusqlite::params![owner, kind, day], RawDailyRecord::from_row)
      .optional()?,
  )
}

fn select_list_record(
  conn: &rusqlite::Connection,
  owner: &str,
  collection: &str,
  id: &str,
) -> CallResult<Option<RawListRecord>> {
  let sql = format!(
    "SELECT {LIST_COLUMNS} FROM list_records
     WHERE record_id = ?1 AND owner_id = ?2 AND collection = ?3"
  );
  Ok(
    conn
      .query_row(&sql, rusqlite::params![id, owner, collection], RawListRecord::from_row)
      .optional()?,
  )
}

/// The contents of one scope in store order.
fn read_scope(conn: &rusqlite::Connection, scope: &ListScope) -> CallResult<Vec<ListRecord>> {
  let sql = format!(
    "SELECT {LIST_COLUMNS} FROM list_records
     WHERE owner_id = ?1 AND collection = ?2
     ORDER BY seq"
  );
  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map(
      rusqlite::params![scope.owner.as_str(), scope.collection.as_ref()],
      RawListRecord::from_row,
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  raws
    .into_iter()
    .map(|raw| raw.into_record().map_err(Error::abort))
    .collect()
}

/// Broadcast the post-write contents of `scope`. Skipped when nobody listens;
/// subscribers register on this same thread, so none can be missed.
fn publish(
  conn: &rusqlite::Connection,
  changes: &broadcast::Sender<ScopeChange>,
  scope: ListScope,
) -> CallResult<()> {
  if changes.receiver_count() == 0 {
    return Ok(());
  }
  let records = Arc::new(read_scope(conn, &scope)?);
  // Only fails when the last receiver dropped in the meantime.
  let _ = changes.send(ScopeChange { scope, records });
  Ok(())
}

fn not_found(what: String) -> tokio_rusqlite::Error {
  Error::abort(sanctum_core::Error::NotFound(what))
}

// ─── DocumentStore impl ──────────────────────────────────────────────────────

impl DocumentStore for SqliteStore {
  type Error = Error;

  // ── Daily singletons ──────────────────────────────────────────────────────

  async fn get_daily<'a>(
    &'a self,
    owner: &'a OwnerId,
    kind: DailyKind,
    day: DayKey,
  ) -> Result<Option<DailyRecord>> {
    let owner_str = owner.as_str().to_owned();
    let kind_str = kind.to_string();
    let day_str = day.to_string();

    let raw = self
      .conn
      .call(move |conn| select_daily(conn, &owner_str, &kind_str, &day_str))
      .await?;

    raw.map(RawDailyRecord::into_record).transpose()
  }

  async fn create_daily_if_absent<'a>(
    &'a self,
    owner: &'a OwnerId,
    kind: DailyKind,
    day: DayKey,
    payload: DailyPayload,
  ) -> Result<DailyRecord> {
    payload.ensure_kind(kind)?;

    let owner_str = owner.as_str().to_owned();
    let kind_str = kind.to_string();
    let day_str = day.to_string();
    let payload_str = serde_json::to_string(&payload)?;
    let now_str = encode_dt(Utc::now());

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO daily_records
             (owner_id, kind, day_key, payload_json, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?5)
           ON CONFLICT (owner_id, kind, day_key) DO NOTHING",
          rusqlite::params![owner_str, kind_str, day_str, payload_str, now_str],
        )?;
        let raw = select_daily(&tx, &owner_str, &kind_str, &day_str)?
          .ok_or_else(|| not_found(format!("{kind_str} record for {owner_str} on {day_str}")))?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.into_record()
  }

  async fn update_daily<'a>(
    &'a self,
    owner: &'a OwnerId,
    kind: DailyKind,
    day: DayKey,
    patch: PayloadPatch,
  ) -> Result<DailyRecord> {
    let owner_str = owner.as_str().to_owned();
    let kind_str = kind.to_string();
    let day_str = day.to_string();
    let now_str = encode_dt(Utc::now());

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut raw = select_daily(&tx, &owner_str, &kind_str, &day_str)?
          .ok_or_else(|| not_found(format!("{kind_str} record for {owner_str} on {day_str}")))?;

        let mut payload = raw.payload().map_err(Error::abort)?;
        patch.apply(&mut payload).map_err(Error::abort)?;
        raw.payload_json = serde_json::to_string(&payload).map_err(Error::abort)?;
        raw.updated_at = now_str;

        tx.execute(
          "UPDATE daily_records SET payload_json = ?4, updated_at = ?5
           WHERE owner_id = ?1 AND kind = ?2 AND day_key = ?3",
          rusqlite::params![owner_str, kind_str, day_str, raw.payload_json, raw.updated_at],
        )?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.into_record()
  }

  async fn list_daily<'a>(
    &'a self,
    owner: &'a OwnerId,
    kind: DailyKind,
  ) -> Result<Vec<DailyRecord>> {
    let owner_str = owner.as_str().to_owned();
    let kind_str = kind.to_string();

    let raws: Vec<RawDailyRecord> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {DAILY_COLUMNS} FROM daily_records
           WHERE owner_id = ?1 AND kind = ?2
           ORDER BY day_key"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![owner_str, kind_str], RawDailyRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDailyRecord::into_record).collect()
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

    let id_str = encode_uuid(record.id);
    let fields_str = serde_json::to_string(&record.fields)?;
    let at_str = encode_dt(record.created_at);
    let scope = ListScope::new(owner.clone(), collection);
    let changes = self.changes.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO list_records (record_id, owner_id, collection, fields_json, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            id_str,
            scope.owner.as_str(),
            scope.collection.as_ref(),
            fields_str,
            at_str,
          ],
        )?;
        publish(conn, &changes, scope)
      })
      .await?;

    Ok(record)
  }

  async fn get_list_record<'a>(
    &'a self,
    owner: &'a OwnerId,
    collection: Collection,
    id: Uuid,
  ) -> Result<Option<ListRecord>> {
    let owner_str = owner.as_str().to_owned();
    let collection_str = collection.to_string();
    let id_str = encode_uuid(id);

    let raw = self
      .conn
      .call(move |conn| select_list_record(conn, &owner_str, &collection_str, &id_str))
      .await?;

    raw.map(RawListRecord::into_record).transpose()
  }

  async fn update_list_record<'a>(
    &'a self,
    owner: &'a OwnerId,
    collection: Collection,
    id: Uuid,
    fields: Fields,
  ) -> Result<ListRecord> {
    validate_fields(&fields)?;
    let id_str = encode_uuid(id);
    let scope = ListScope::new(owner.clone(), collection);
    let changes = self.changes.clone();

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut raw = select_list_record(
          &tx,
          scope.owner.as_str(),
          scope.collection.as_ref(),
          &id_str,
        )?
        .ok_or_else(|| not_found(format!("{} record {id_str}", scope.collection)))?;

        let mut merged: Fields = serde_json::from_str(&raw.fields_json).map_err(Error::abort)?;
        merged.extend(fields);
        raw.fields_json = serde_json::to_string(&merged).map_err(Error::abort)?;

        tx.execute(
          "UPDATE list_records SET fields_json = ?2 WHERE record_id = ?1",
          rusqlite::params![id_str, raw.fields_json],
        )?;
        tx.commit()?;
        publish(conn, &changes, scope)?;
        Ok(raw)
      })
      .await?;

    raw.into_record()
  }

  async fn delete_list_record<'a>(
    &'a self,
    owner: &'a OwnerId,
    collection: Collection,
    id: Uuid,
  ) -> Result<()> {
    let id_str = encode_uuid(id);
    let scope = ListScope::new(owner.clone(), collection);
    let changes = self.changes.clone();

    self
      .conn
      .call(move |conn| {
        let deleted = conn.execute(
          "DELETE FROM list_records
           WHERE record_id = ?1 AND owner_id = ?2 AND collection = ?3",
          rusqlite::params![id_str, scope.owner.as_str(), scope.collection.as_ref()],
        )?;
        if deleted == 0 {
          return Err(not_found(format!("{} record {id_str}", scope.collection)));
        }
        publish(conn, &changes, scope)
      })
      .await?;

    Ok(())
  }

  async fn list_records<'a>(
    &'a self,
    scope: &'a ListScope,
    ordering: Option<&'a Ordering>,
  ) -> Result<Vec<ListRecord>> {
    let owned = scope.clone();
    let records = self.conn.call(move |conn| read_scope(conn, &owned)).await?;
    Ok(ordered(records, ordering))
  }

  async fn subscribe(
    &self,
    scope: ListScope,
    ordering: Option<Ordering>,
  ) -> Result<Subscription> {
    let changes = self.changes.clone();
    let read = scope.clone();

    // Register and read in the same call so no write can fall between them.
    let (initial, rx) = self
      .conn
      .call(move |conn| {
        let rx = changes.subscribe();
        let initial = read_scope(conn, &read)?;
        Ok((initial, rx))
      })
      .await?;

    Ok(spawn_feed(scope, ordering, initial, rx))
  }
}
