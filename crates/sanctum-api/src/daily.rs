//! Handlers for `/daily` endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/daily/dashboard/today` | Creates today's affirmation on first call |
//! | `POST`  | `/daily/dashboard/{day}/acknowledge` | 404 if the day was never opened |
//! | `POST`  | `/daily/lunar_os/today` | Body: cycle entry; create or overwrite |
//! | `GET`   | `/daily/lunar_os` | Optional `?limit=` (default 30) |
//! | `GET`   | `/daily/{kind}/{day}` | 404 if absent |
//! | `PATCH` | `/daily/{kind}/{day}` | Body: tagged payload patch |

use axum::{
  Json,
  extract::{Path, Query},
};
use sanctum_core::{
  daily::{CycleEntry, DailyKind, DailyRecord, PayloadPatch},
  day::DayKey,
  panels::{dashboard, lunar},
  store::DocumentStore,
};
use serde::Deserialize;

use crate::{error::ApiError, session::Session};

// ─── Dashboard ───────────────────────────────────────────────────────────────

/// `GET /daily/dashboard/today`
pub async fn dashboard_today<S>(Session(ctx): Session<S>) -> Result<Json<DailyRecord>, ApiError>
where
  S: DocumentStore,
{
  Ok(Json(dashboard::today(&ctx).await?))
}

/// `POST /daily/dashboard/{day}/acknowledge`
pub async fn acknowledge<S>(
  Session(ctx): Session<S>,
  Path(day): Path<DayKey>,
) -> Result<Json<DailyRecord>, ApiError>
where
  S: DocumentStore,
{
  Ok(Json(dashboard::acknowledge(&ctx, day).await?))
}

// ─── Lunar OS ────────────────────────────────────────────────────────────────

/// `POST /daily/lunar_os/today`
pub async fn log_cycle<S>(
  Session(ctx): Session<S>,
  Json(entry): Json<CycleEntry>,
) -> Result<Json<DailyRecord>, ApiError>
where
  S: DocumentStore,
{
  Ok(Json(lunar::log_today(&ctx, entry).await?))
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
  pub limit: Option<usize>,
}

/// `GET /daily/lunar_os[?limit=<n>]`
pub async fn cycle_history<S>(
  Session(ctx): Session<S>,
  Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<DailyRecord>>, ApiError>
where
  S: DocumentStore,
{
  let limit = params.limit.unwrap_or(lunar::CHART_DAYS);
  Ok(Json(lunar::history(&ctx, limit).await?))
}

// ─── Generic ─────────────────────────────────────────────────────────────────

/// `GET /daily/{kind}/{day}`
pub async fn get_one<S>(
  Session(ctx): Session<S>,
  Path((kind, day)): Path<(DailyKind, DayKey)>,
) -> Result<Json<DailyRecord>, ApiError>
where
  S: DocumentStore,
{
  let record = ctx
    .daily()
    .get(ctx.owner(), kind, day)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("no {kind} record on {day}")))?;
  Ok(Json(record))
}

/// `PATCH /daily/{kind}/{day}`
pub async fn update_one<S>(
  Session(ctx): Session<S>,
  Path((kind, day)): Path<(DailyKind, DayKey)>,
  Json(patch): Json<PayloadPatch>,
) -> Result<Json<DailyRecord>, ApiError>
where
  S: DocumentStore,
{
  Ok(Json(ctx.daily().update(ctx.owner(), kind, day, patch).await?))
}
