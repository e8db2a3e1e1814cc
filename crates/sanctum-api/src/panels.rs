//! Panel endpoints: validated writes and derived views over the owner's
//! collections.

use axum::{
  Json,
  extract::{Path, Query},
  http::StatusCode,
  response::IntoResponse,
};
use sanctum_core::{
  content::{GlossaryTerm, Schedule},
  list::{Collection, ListRecord},
  panels::{
    finances::{self, NewTransaction},
    glossary::{self, NewTerm},
    grimoire::{self, NewEntry},
    obsessions::{self, NewObsession},
    rituals::{self, NewRitual},
  },
  store::DocumentStore,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{error::ApiError, session::Session};

fn created(record: ListRecord) -> impl IntoResponse { (StatusCode::CREATED, Json(record)) }

// ─── Grimoire ────────────────────────────────────────────────────────────────

/// `POST /grimoire`
pub async fn add_entry<S>(
  Session(ctx): Session<S>,
  Json(entry): Json<NewEntry>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore,
{
  Ok(created(grimoire::add_entry(&ctx, entry).await?))
}

/// `GET /grimoire`
pub async fn entries<S>(Session(ctx): Session<S>) -> Result<Json<Vec<ListRecord>>, ApiError>
where
  S: DocumentStore,
{
  Ok(Json(grimoire::entries(&ctx).await?))
}

/// `GET /grimoire/prompt`
pub async fn prompt<S>(Session(ctx): Session<S>) -> Json<serde_json::Value>
where
  S: DocumentStore,
{
  let day = ctx.today();
  Json(json!({ "day": day, "prompt": grimoire::prompt_for(ctx.catalog(), day) }))
}

// ─── Obsessions ──────────────────────────────────────────────────────────────

/// `POST /obsessions`
pub async fn add_obsession<S>(
  Session(ctx): Session<S>,
  Json(obsession): Json<NewObsession>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore,
{
  Ok(created(obsessions::add_obsession(&ctx, obsession).await?))
}

/// `DELETE /obsessions/{id}`
pub async fn delete_obsession<S>(
  Session(ctx): Session<S>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: DocumentStore,
{
  obsessions::delete_obsession(&ctx, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Glossary ────────────────────────────────────────────────────────────────

/// `POST /glossary`
pub async fn add_term<S>(
  Session(ctx): Session<S>,
  Json(term): Json<NewTerm>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore,
{
  Ok(created(glossary::add_term(&ctx, term).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
  #[serde(default)]
  pub search: String,
}

/// `GET /glossary/lexicon[?search=<text>]`
pub async fn lexicon<S>(
  Session(ctx): Session<S>,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<GlossaryTerm>>, ApiError>
where
  S: DocumentStore,
{
  Ok(Json(glossary::lookup(&ctx, &params.search).await?))
}

// ─── Rituals ─────────────────────────────────────────────────────────────────

/// `POST /rituals`
pub async fn add_ritual<S>(
  Session(ctx): Session<S>,
  Json(ritual): Json<NewRitual>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore,
{
  Ok(created(rituals::add_ritual(&ctx, ritual).await?))
}

/// `POST /rituals/seed`
pub async fn seed_rituals<S>(Session(ctx): Session<S>) -> Result<Json<serde_json::Value>, ApiError>
where
  S: DocumentStore,
{
  let inserted = rituals::seed_if_empty(&ctx).await?;
  Ok(Json(json!({ "inserted": inserted })))
}

/// `POST /rituals/{id}/toggle`
pub async fn toggle_ritual<S>(
  Session(ctx): Session<S>,
  Path(id): Path<Uuid>,
) -> Result<Json<ListRecord>, ApiError>
where
  S: DocumentStore,
{
  Ok(Json(rituals::toggle(&ctx, id).await?))
}

/// `DELETE /rituals/{id}`
pub async fn delete_ritual<S>(
  Session(ctx): Session<S>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: DocumentStore,
{
  rituals::delete_ritual(&ctx, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /rituals/agenda/{schedule}`
pub async fn agenda<S>(
  Session(ctx): Session<S>,
  Path(schedule): Path<Schedule>,
) -> Result<Json<Vec<ListRecord>>, ApiError>
where
  S: DocumentStore,
{
  let records = ctx.records(Collection::Rituals, None).await?;
  Ok(Json(rituals::agenda(&records, schedule).into_iter().cloned().collect()))
}

// ─── Finances ────────────────────────────────────────────────────────────────

/// `POST /finances`
pub async fn add_transaction<S>(
  Session(ctx): Session<S>,
  Json(tx): Json<NewTransaction>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore,
{
  Ok(created(finances::add_transaction(&ctx, tx).await?))
}

#[derive(Debug, Serialize)]
pub struct Ledger {
  pub balance:      f64,
  pub transactions: Vec<ListRecord>,
}

/// `GET /finances/balance`
pub async fn ledger<S>(Session(ctx): Session<S>) -> Result<Json<Ledger>, ApiError>
where
  S: DocumentStore,
{
  let transactions = finances::transactions(&ctx).await?;
  Ok(Json(Ledger { balance: finances::balance(&transactions), transactions }))
}
