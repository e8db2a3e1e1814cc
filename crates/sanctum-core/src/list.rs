//! List records: independently created and deleted documents in a named,
//! per-owner collection (journal entries, rituals, transactions, ...).

use std::cmp;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{Error, Result, owner::OwnerId};

/// Field values are JSON scalars: string, number, bool or null.
pub type Fields = serde_json::Map<String, Value>;

// ─── Collection ──────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Collection {
  /// Journal entries.
  Grimoire,
  Obsessions,
  Glossary,
  Rituals,
  /// Income and expense transactions.
  Finances,
}

impl Collection {
  /// Boolean status flags an owner may flip after creation. Every other field
  /// is fixed once the record exists.
  pub fn status_fields(self) -> &'static [&'static str] {
    match self {
      Self::Rituals => &["completed"],
      Self::Grimoire | Self::Obsessions | Self::Glossary | Self::Finances => &[],
    }
  }
}

/// The set of records one subscription or listing covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListScope {
  pub owner:      OwnerId,
  pub collection: Collection,
}

impl ListScope {
  pub fn new(owner: OwnerId, collection: Collection) -> Self { Self { owner, collection } }
}

// ─── Record ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListRecord {
  pub id:         Uuid,
  pub owner_id:   OwnerId,
  pub collection: Collection,
  pub fields:     Fields,
  /// Store-assigned; the default sort key.
  pub created_at: DateTime<Utc>,
}

impl ListRecord {
  pub fn str_field(&self, name: &str) -> Option<&str> {
    self.fields.get(name).and_then(Value::as_str)
  }

  pub fn bool_field(&self, name: &str) -> Option<bool> {
    self.fields.get(name).and_then(Value::as_bool)
  }

  pub fn f64_field(&self, name: &str) -> Option<f64> {
    self.fields.get(name).and_then(Value::as_f64)
  }
}

/// Reject nested objects and arrays; list records hold only scalars.
pub fn validate_fields(fields: &Fields) -> Result<()> {
  for (name, value) in fields {
    if name.is_empty() {
      return Err(Error::invalid_field(name, "field names must not be empty"));
    }
    if value.is_object() || value.is_array() {
      return Err(Error::invalid_field(name, "only scalar values are allowed"));
    }
  }
  Ok(())
}

/// Reject an update unless it only sets `collection`'s status flags to
/// booleans.
pub fn validate_patch(collection: Collection, fields: &Fields) -> Result<()> {
  let allowed = collection.status_fields();
  for (name, value) in fields {
    if !allowed.contains(&name.as_str()) {
      return Err(Error::invalid_field(
        name.as_str(),
        format!("{collection} records cannot change this field after creation"),
      ));
    }
    if !value.is_boolean() {
      return Err(Error::invalid_field(name.as_str(), "status flags must be true or false"));
    }
  }
  Ok(())
}

// ─── Ordering ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
  Asc,
  #[default]
  Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
  CreatedAt,
  Field(String),
}

impl SortKey {
  /// `created_at` names the store timestamp; anything else is a field name.
  pub fn parse(name: &str) -> Self {
    match name {
      "created_at" => Self::CreatedAt,
      other => Self::Field(other.to_owned()),
    }
  }
}

/// A client-side sort applied to every snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ordering {
  pub key:       SortKey,
  pub direction: Direction,
}

impl Ordering {
  pub fn newest_first() -> Self { Self { key: SortKey::CreatedAt, direction: Direction::Desc } }

  pub fn by_field(name: impl Into<String>, direction: Direction) -> Self {
    Self { key: SortKey::Field(name.into()), direction }
  }

  /// Stable sort; ties keep store order.
  pub fn sort(&self, records: &mut [ListRecord]) {
    records.sort_by(|a, b| {
      let ord = match &self.key {
        SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
        SortKey::Field(name) => compare_scalars(a.fields.get(name), b.fields.get(name)),
      };
      match self.direction {
        Direction::Asc => ord,
        Direction::Desc => ord.reverse(),
      }
    });
  }
}

/// Apply `ordering` if present; otherwise keep store order.
pub fn ordered(mut records: Vec<ListRecord>, ordering: Option<&Ordering>) -> Vec<ListRecord> {
  if let Some(o) = ordering {
    o.sort(&mut records);
  }
  records
}

/// Total order over optional JSON scalars: missing and null sort after every
/// value, then bools, numbers and strings in that order.
fn compare_scalars(a: Option<&Value>, b: Option<&Value>) -> cmp::Ordering {
  fn rank(v: Option<&Value>) -> u8 {
    match v {
      Some(Value::Bool(_)) => 0,
      Some(Value::Number(_)) => 1,
      Some(Value::String(_)) => 2,
      Some(Value::Array(_) | Value::Object(_)) => 3,
      Some(Value::Null) | None => 4,
    }
  }

  match (a, b) {
    (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
    (Some(Value::Number(x)), Some(Value::Number(y))) => {
      let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
      x.total_cmp(&y)
    }
    (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
    _ => rank(a).cmp(&rank(b)),
  }
}
