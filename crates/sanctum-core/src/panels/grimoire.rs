//! Grimoire: free-form journal entries answering a daily prompt.

use serde::{Deserialize, Serialize};

use super::{optional, required, to_fields};
use crate::{
  Result,
  content::ContentCatalog,
  context::SessionContext,
  day::DayKey,
  list::{Collection, ListRecord, Ordering},
  store::DocumentStore,
};

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntryTag {
  #[default]
  DailyEntry,
  DreamLog,
  SelfInterrogation,
}

/// An entry as submitted.
#[derive(Debug, Clone, Deserialize)]
pub struct NewEntry {
  pub content: String,
  #[serde(default)]
  pub tag:     EntryTag,
  /// The prompt the entry answers; today's prompt when omitted.
  #[serde(default)]
  pub prompt:  Option<String>,
}

#[derive(Serialize)]
struct EntryFields {
  content: String,
  tag:     EntryTag,
  prompt:  String,
}

/// The journal prompt for `day`.
pub fn prompt_for(catalog: &ContentCatalog, day: DayKey) -> &str {
  catalog.journal_prompts.select(day.day_of_year())
}

pub async fn add_entry<S: DocumentStore>(
  ctx: &SessionContext<S>,
  entry: NewEntry,
) -> Result<ListRecord> {
  let content = required(&entry.content, "content")?;
  let prompt = optional(entry.prompt.as_deref())
    .unwrap_or_else(|| prompt_for(ctx.catalog(), ctx.today()).to_owned());

  let fields = to_fields(&EntryFields { content, tag: entry.tag, prompt })?;
  ctx.create_record(Collection::Grimoire, fields).await
}

/// All entries, newest first.
pub async fn entries<S: DocumentStore>(ctx: &SessionContext<S>) -> Result<Vec<ListRecord>> {
  ctx.records(Collection::Grimoire, Some(&Ordering::newest_first())).await
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{Error, panels::testing::session};

  #[tokio::test]
  async fn blank_entries_are_rejected_and_not_stored() {
    let ctx = session();
    let err = add_entry(&ctx, NewEntry { content: "   ".into(), tag: EntryTag::DreamLog, prompt: None })
      .await
      .unwrap_err();
    assert!(matches!(err, Error::EmptyField("content")));
    assert!(entries(&ctx).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn entry_defaults_to_todays_prompt() {
    let ctx = session();
    let record = add_entry(&ctx, NewEntry { content: "static".into(), tag: EntryTag::default(), prompt: None })
      .await
      .unwrap();

    assert_eq!(record.str_field("tag"), Some("daily_entry"));
    assert_eq!(record.str_field("prompt"), Some(prompt_for(ctx.catalog(), ctx.today())));
  }

  #[test]
  fn prompts_rotate_with_the_day() {
    let catalog = ContentCatalog::builtin().unwrap();
    let n = catalog.journal_prompts.len() as i64;
    let a: DayKey = "2024-01-01".parse().unwrap();
    let b = DayKey::from_date(a.date() + chrono::Duration::days(n));
    assert_eq!(prompt_for(&catalog, a), prompt_for(&catalog, b));
  }
}
