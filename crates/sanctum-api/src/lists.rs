//! Handlers for `/lists/{collection}` endpoints: raw access to any
//! collection plus a server-sent-events change feed.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/lists/{collection}` | Optional `?order_by=<field>&direction=asc\|desc` |
//! | `POST`   | `/lists/{collection}` | Body: flat JSON object of fields |
//! | `PATCH`  | `/lists/{collection}/{id}` | Body: status flags to set (400 for any other field) |
//! | `DELETE` | `/lists/{collection}/{id}` | 404 if absent |
//! | `GET`    | `/lists/{collection}/feed` | `text/event-stream` of full snapshots |

use axum::{
  Json,
  extract::{Path, Query},
  http::StatusCode,
  response::{
    IntoResponse,
    sse::{Event, KeepAlive, Sse},
  },
};
use futures::{Stream, StreamExt as _};
use sanctum_core::{
  list::{Collection, Direction, Fields, ListRecord, Ordering, SortKey},
  store::DocumentStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::ApiError, session::Session};

#[derive(Debug, Default, Deserialize)]
pub struct OrderParams {
  pub order_by:  Option<String>,
  pub direction: Option<Direction>,
}

impl OrderParams {
  /// `None` keeps store order.
  pub fn ordering(&self) -> Option<Ordering> {
    match (&self.order_by, self.direction) {
      (None, None) => None,
      (key, direction) => Some(Ordering {
        key:       key.as_deref().map_or(SortKey::CreatedAt, SortKey::parse),
        direction: direction.unwrap_or_default(),
      }),
    }
  }
}

/// `GET /lists/{collection}`
pub async fn list<S>(
  Session(ctx): Session<S>,
  Path(collection): Path<Collection>,
  Query(params): Query<OrderParams>,
) -> Result<Json<Vec<ListRecord>>, ApiError>
where
  S: DocumentStore,
{
  let ordering = params.ordering();
  Ok(Json(ctx.records(collection, ordering.as_ref()).await?))
}

/// `POST /lists/{collection}`
pub async fn create<S>(
  Session(ctx): Session<S>,
  Path(collection): Path<Collection>,
  Json(fields): Json<Fields>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore,
{
  let record = ctx.create_record(collection, fields).await?;
  Ok((StatusCode::CREATED, Json(record)))
}

/// `PATCH /lists/{collection}/{id}`
pub async fn update<S>(
  Session(ctx): Session<S>,
  Path((collection, id)): Path<(Collection, Uuid)>,
  Json(fields): Json<Fields>,
) -> Result<Json<ListRecord>, ApiError>
where
  S: DocumentStore,
{
  Ok(Json(ctx.update_record(collection, id, fields).await?))
}

/// `DELETE /lists/{collection}/{id}`
pub async fn delete<S>(
  Session(ctx): Session<S>,
  Path((collection, id)): Path<(Collection, Uuid)>,
) -> Result<StatusCode, ApiError>
where
  S: DocumentStore,
{
  ctx.delete_record(collection, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /lists/{collection}/feed`
///
/// Each event is a `snapshot` carrying the whole ordered collection. The
/// subscription is released when the client disconnects.
pub async fn feed<S>(
  Session(ctx): Session<S>,
  Path(collection): Path<Collection>,
  Query(params): Query<OrderParams>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError>
where
  S: DocumentStore,
{
  let subscription = ctx.subscribe(collection, params.ordering()).await?;
  let events = subscription.map(|snapshot| Event::default().event("snapshot").json_data(snapshot));
  Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
