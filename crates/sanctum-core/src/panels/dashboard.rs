//! The dashboard's daily affirmation.

use crate::{
  Result,
  context::SessionContext,
  daily::{DailyKind, DailyPayload, DailyRecord, PayloadPatch},
  day::DayKey,
  store::DocumentStore,
};

/// Today's affirmation record, created on first access.
pub async fn today<S: DocumentStore>(ctx: &SessionContext<S>) -> Result<DailyRecord> {
  affirmation_for(ctx, ctx.today()).await
}

/// The affirmation record for `day`. A new record carries the catalog entry
/// selected by the day of year and starts unacknowledged; an existing one is
/// returned as stored.
pub async fn affirmation_for<S: DocumentStore>(
  ctx: &SessionContext<S>,
  day: DayKey,
) -> Result<DailyRecord> {
  let affirmation = ctx.catalog().affirmations.select(day.day_of_year()).clone();
  ctx
    .daily()
    .get_or_create(ctx.owner(), DailyKind::Dashboard, day, move || {
      DailyPayload::Affirmation { affirmation, acknowledged: false }
    })
    .await
}

pub async fn acknowledge<S: DocumentStore>(
  ctx: &SessionContext<S>,
  day: DayKey,
) -> Result<DailyRecord> {
  ctx
    .daily()
    .update(ctx.owner(), DailyKind::Dashboard, day, PayloadPatch::acknowledge())
    .await
}
