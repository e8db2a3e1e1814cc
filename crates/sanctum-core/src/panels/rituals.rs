//! Ritual planner: recurring rituals with a completion toggle.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use super::{optional, required, to_fields};
use crate::{
  Error, Result,
  content::Schedule,
  context::SessionContext,
  list::{Collection, Fields, ListRecord},
  store::DocumentStore,
};

/// Where untimed rituals fall in an agenda.
const UNTIMED: &str = "23:59";

#[derive(Debug, Clone, Deserialize)]
pub struct NewRitual {
  pub name:     String,
  /// `HH:MM`; blank or absent means untimed.
  #[serde(default)]
  pub time:     Option<String>,
  pub schedule: Schedule,
}

#[derive(Serialize)]
struct RitualFields {
  name:      String,
  time:      Option<String>,
  schedule:  Schedule,
  completed: bool,
}

fn parse_time(time: Option<&str>) -> Result<Option<String>> {
  let Some(time) = optional(time) else {
    return Ok(None);
  };
  NaiveTime::parse_from_str(&time, "%H:%M")
    .map_err(|_| Error::invalid_field("time", format!("{time:?} is not HH:MM")))?;
  Ok(Some(time))
}

pub async fn add_ritual<S: DocumentStore>(
  ctx: &SessionContext<S>,
  ritual: NewRitual,
) -> Result<ListRecord> {
  let fields = to_fields(&RitualFields {
    name:      required(&ritual.name, "name")?,
    time:      parse_time(ritual.time.as_deref())?,
    schedule:  ritual.schedule,
    completed: false,
  })?;
  ctx.create_record(Collection::Rituals, fields).await
}

/// Populate an empty ritual list with the catalog's seed rituals. Returns how
/// many were inserted; zero when the owner already has rituals.
pub async fn seed_if_empty<S: DocumentStore>(ctx: &SessionContext<S>) -> Result<usize> {
  if !ctx.records(Collection::Rituals, None).await?.is_empty() {
    return Ok(0);
  }

  let mut inserted = 0;
  for seed in ctx.catalog().ritual_seeds.iter() {
    let fields = to_fields(&RitualFields {
      name:      seed.name.clone(),
      time:      seed.time.clone(),
      schedule:  seed.schedule,
      completed: false,
    })?;
    ctx.create_record(Collection::Rituals, fields).await?;
    inserted += 1;
  }
  info!(owner = %ctx.owner(), inserted, "seeded rituals");
  Ok(inserted)
}

/// Flip a ritual's `completed` flag.
pub async fn toggle<S: DocumentStore>(ctx: &SessionContext<S>, id: Uuid) -> Result<ListRecord> {
  let record = ctx
    .record(Collection::Rituals, id)
    .await?
    .ok_or_else(|| Error::NotFound(format!("ritual {id}")))?;

  let completed = record.bool_field("completed").unwrap_or(false);
  let mut fields = Fields::new();
  fields.insert("completed".into(), Value::Bool(!completed));
  ctx.update_record(Collection::Rituals, id, fields).await
}

pub async fn delete_ritual<S: DocumentStore>(ctx: &SessionContext<S>, id: Uuid) -> Result<()> {
  ctx.delete_record(Collection::Rituals, id).await
}

/// The rituals on `schedule`, earliest first; untimed ones go last.
pub fn agenda(records: &[ListRecord], schedule: Schedule) -> Vec<&ListRecord> {
  let mut due: Vec<&ListRecord> = records
    .iter()
    .filter(|r| r.str_field("schedule") == Some(schedule.as_ref()))
    .collect();
  due.sort_by(|a, b| slot(a).cmp(slot(b)));
  due
}

fn slot(record: &ListRecord) -> &str {
  record.str_field("time").filter(|t| !t.is_empty()).unwrap_or(UNTIMED)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::panels::testing::session;

  fn ritual(name: &str, time: Option<&str>, schedule: Schedule) -> NewRitual {
    NewRitual { name: name.into(), time: time.map(Into::into), schedule }
  }

  #[tokio::test]
  async fn seeding_happens_only_into_an_empty_list() {
    let ctx = session();
    let seeded = seed_if_empty(&ctx).await.unwrap();
    assert_eq!(seeded, ctx.catalog().ritual_seeds.len());
    assert_eq!(seed_if_empty(&ctx).await.unwrap(), 0);

    let all = ctx.records(Collection::Rituals, None).await.unwrap();
    assert_eq!(all.len(), seeded);
    assert!(all.iter().all(|r| r.bool_field("completed") == Some(false)));
  }

  #[tokio::test]
  async fn malformed_times_are_rejected() {
    let ctx = session();
    let err = add_ritual(&ctx, ritual("Mirror", Some("25:99"), Schedule::Daily))
      .await
      .unwrap_err();
    assert!(err.is_validation());

    let untimed = add_ritual(&ctx, ritual("Mirror", Some(""), Schedule::Daily)).await.unwrap();
    assert_eq!(untimed.fields.get("time"), Some(&Value::Null));
  }

  #[tokio::test]
  async fn toggle_flips_completion() {
    let ctx = session();
    let r = add_ritual(&ctx, ritual("Hydrate", Some("06:00"), Schedule::Daily)).await.unwrap();

    assert_eq!(toggle(&ctx, r.id).await.unwrap().bool_field("completed"), Some(true));
    assert_eq!(toggle(&ctx, r.id).await.unwrap().bool_field("completed"), Some(false));

    delete_ritual(&ctx, r.id).await.unwrap();
    assert!(matches!(toggle(&ctx, r.id).await, Err(Error::NotFound(_))));
  }

  #[tokio::test]
  async fn agenda_sorts_by_time_with_untimed_last() {
    let ctx = session();
    for (name, time) in [("late", Some("21:00")), ("none", None), ("early", Some("06:00"))] {
      add_ritual(&ctx, ritual(name, time, Schedule::Daily)).await.unwrap();
    }
    add_ritual(&ctx, ritual("weekly", Some("01:00"), Schedule::Weekly)).await.unwrap();

    let records = ctx.records(Collection::Rituals, None).await.unwrap();
    let names: Vec<&str> = agenda(&records, Schedule::Daily)
      .iter()
      .filter_map(|r| r.str_field("name"))
      .collect();
    assert_eq!(names, ["early", "late", "none"]);
  }
}
