//! Lunar OS: one energy/mood log per day, plus the recent history chart.

use crate::{
  Result,
  context::SessionContext,
  daily::{CycleEntry, DailyKind, DailyPayload, DailyRecord},
  day::DayKey,
  store::DocumentStore,
};

/// Days shown on the cycle chart.
pub const CHART_DAYS: usize = 30;

pub async fn log_today<S: DocumentStore>(
  ctx: &SessionContext<S>,
  entry: CycleEntry,
) -> Result<DailyRecord> {
  log_cycle(ctx, ctx.today(), entry).await
}

/// Record `entry` for `day`: creates the day's log if absent, otherwise
/// overwrites the stored values in place.
pub async fn log_cycle<S: DocumentStore>(
  ctx: &SessionContext<S>,
  day: DayKey,
  entry: CycleEntry,
) -> Result<DailyRecord> {
  let daily = ctx.daily();
  let initial = entry.clone();
  let record = daily
    .get_or_create(ctx.owner(), DailyKind::LunarOs, day, move || initial.into())
    .await?;

  if record.payload == DailyPayload::from(entry.clone()) {
    return Ok(record);
  }
  daily.update(ctx.owner(), DailyKind::LunarOs, day, entry.into()).await
}

/// The latest `limit` logs, oldest first.
pub async fn history<S: DocumentStore>(
  ctx: &SessionContext<S>,
  limit: usize,
) -> Result<Vec<DailyRecord>> {
  let mut logs = ctx.daily().history(ctx.owner(), DailyKind::LunarOs).await?;
  let skip = logs.len().saturating_sub(limit);
  Ok(logs.split_off(skip))
}
