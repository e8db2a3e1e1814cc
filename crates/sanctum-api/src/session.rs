//! Per-request session extraction.
//!
//! The upstream identity provider authenticates the caller and forwards an
//! opaque owner id in a header. This module only reads it; it never
//! authenticates anyone itself.

use axum::{
  extract::FromRequestParts,
  http::{HeaderName, request::Parts},
};
use chrono::{FixedOffset, Offset, Utc};
use sanctum_core::{
  context::SessionContext, owner::OwnerId, retry::RetryPolicy, store::DocumentStore,
};

use crate::{AppState, error::ApiError};

/// The header read when nothing else is configured.
pub const DEFAULT_OWNER_HEADER: &str = "x-sanctum-owner";

/// How requests are turned into sessions.
#[derive(Debug, Clone)]
pub struct SessionSettings {
  pub owner_header: HeaderName,
  /// Offset used to derive the owner's calendar day.
  pub utc_offset:   FixedOffset,
  pub retry:        RetryPolicy,
}

impl Default for SessionSettings {
  fn default() -> Self {
    Self {
      owner_header: HeaderName::from_static(DEFAULT_OWNER_HEADER),
      utc_offset:   Utc.fix(),
      retry:        RetryPolicy::default(),
    }
  }
}

/// Extractor: a [`SessionContext`] for the owner named in the request.
/// Rejects with 401 when the owner header is missing or blank.
pub struct Session<S>(pub SessionContext<S>);

impl<S> FromRequestParts<AppState<S>> for Session<S>
where
  S: DocumentStore + Clone + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let header = &state.settings.owner_header;
    let owner = parts
      .headers
      .get(header)
      .and_then(|v| v.to_str().ok())
      .map(OwnerId::new)
      .and_then(Result::ok)
      .ok_or_else(|| ApiError::Unauthorized(format!("missing {header} header")))?;

    let ctx = SessionContext::new(state.store.clone(), owner, state.catalog.clone())
      .with_offset(state.settings.utc_offset)
      .with_retry(state.settings.retry.clone());
    Ok(Session(ctx))
  }
}
