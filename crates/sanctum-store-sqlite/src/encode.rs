//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Payloads and fields are
//! stored as compact JSON. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, Utc};
use sanctum_core::{
  daily::{DailyKind, DailyPayload, DailyRecord},
  day::DayKey,
  list::{Collection, Fields, ListRecord},
  owner::OwnerId,
};
use uuid::Uuid;

use crate::{Error, Result};

pub const DAILY_COLUMNS: &str =
  "owner_id, kind, day_key, payload_json, created_at, updated_at";

pub const LIST_COLUMNS: &str = "record_id, owner_id, collection, fields_json, created_at";

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(e.to_string()))
}

// ─── Keys ────────────────────────────────────────────────────────────────────

pub fn decode_kind(s: &str) -> Result<DailyKind> {
  s.parse().map_err(|_| Error::Decode(format!("unknown daily kind: {s:?}")))
}

pub fn decode_collection(s: &str) -> Result<Collection> {
  s.parse().map_err(|_| Error::Decode(format!("unknown collection: {s:?}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `daily_records` row, in
/// [`DAILY_COLUMNS`] order.
pub struct RawDailyRecord {
  pub owner_id:     String,
  pub kind:         String,
  pub day_key:      String,
  pub payload_json: String,
  pub created_at:   String,
  pub updated_at:   String,
}

impl RawDailyRecord {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      owner_id:     row.get(0)?,
      kind:         row.get(1)?,
      day_key:      row.get(2)?,
      payload_json: row.get(3)?,
      created_at:   row.get(4)?,
      updated_at:   row.get(5)?,
    })
  }

  pub fn payload(&self) -> Result<DailyPayload> { Ok(serde_json::from_str(&self.payload_json)?) }

  pub fn into_record(self) -> Result<DailyRecord> {
    Ok(DailyRecord {
      payload:    self.payload()?,
      owner_id:   OwnerId::new(self.owner_id)?,
      kind:       decode_kind(&self.kind)?,
      day_key:    self.day_key.parse::<DayKey>()?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `list_records` row, in [`LIST_COLUMNS`]
/// order.
pub struct RawListRecord {
  pub record_id:   String,
  pub owner_id:    String,
  pub collection:  String,
  pub fields_json: String,
  pub created_at:  String,
}

impl RawListRecord {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      record_id:   row.get(0)?,
      owner_id:    row.get(1)?,
      collection:  row.get(2)?,
      fields_json: row.get(3)?,
      created_at:  row.get(4)?,
    })
  }

  pub fn into_record(self) -> Result<ListRecord> {
    Ok(ListRecord {
      id:         decode_uuid(&self.record_id)?,
      owner_id:   OwnerId::new(self.owner_id)?,
      collection: decode_collection(&self.collection)?,
      fields:     serde_json::from_str::<Fields>(&self.fields_json)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
