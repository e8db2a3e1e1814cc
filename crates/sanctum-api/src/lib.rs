//! JSON REST API for Sanctum.
//!
//! Exposes an axum [`Router`] backed by any
//! [`sanctum_core::store::DocumentStore`]. Every request names its owner in
//! a header (see [`SessionSettings`]); authentication itself, TLS, and
//! transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", sanctum_api::api_router(state))
//! ```

pub mod daily;
pub mod error;
pub mod lists;
pub mod panels;
pub mod session;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, patch, post},
};
use sanctum_core::{content::ContentCatalog, store::DocumentStore};

pub use error::ApiError;
pub use session::{Session, SessionSettings};

/// Shared state handed to every handler.
pub struct AppState<S> {
  pub store:    Arc<S>,
  pub catalog:  Arc<ContentCatalog>,
  pub settings: Arc<SessionSettings>,
}

impl<S> AppState<S> {
  pub fn new(store: S, catalog: ContentCatalog, settings: SessionSettings) -> Self {
    Self {
      store:    Arc::new(store),
      catalog:  Arc::new(catalog),
      settings: Arc::new(settings),
    }
  }
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    self.store.clone(),
      catalog:  self.catalog.clone(),
      settings: self.settings.clone(),
    }
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: DocumentStore + Clone + 'static,
{
  Router::new()
    // Daily singletons
    .route("/daily/dashboard/today", get(daily::dashboard_today::<S>))
    .route("/daily/dashboard/{day}/acknowledge", post(daily::acknowledge::<S>))
    .route("/daily/lunar_os", get(daily::cycle_history::<S>))
    .route("/daily/lunar_os/today", post(daily::log_cycle::<S>))
    .route("/daily/{kind}/{day}", get(daily::get_one::<S>).patch(daily::update_one::<S>))
    // Raw collections
    .route("/lists/{collection}", get(lists::list::<S>).post(lists::create::<S>))
    .route("/lists/{collection}/feed", get(lists::feed::<S>))
    .route(
      "/lists/{collection}/{id}",
      patch(lists::update::<S>).delete(lists::delete::<S>),
    )
    // Panels
    .route("/grimoire", get(panels::entries::<S>).post(panels::add_entry::<S>))
    .route("/grimoire/prompt", get(panels::prompt::<S>))
    .route("/obsessions", post(panels::add_obsession::<S>))
    .route("/obsessions/{id}", delete(panels::delete_obsession::<S>))
    .route("/glossary", post(panels::add_term::<S>))
    .route("/glossary/lexicon", get(panels::lexicon::<S>))
    .route("/rituals", post(panels::add_ritual::<S>))
    .route("/rituals/seed", post(panels::seed_rituals::<S>))
    .route("/rituals/agenda/{schedule}", get(panels::agenda::<S>))
    .route("/rituals/{id}", delete(panels::delete_ritual::<S>))
    .route("/rituals/{id}/toggle", post(panels::toggle_ritual::<S>))
    .route("/finances", post(panels::add_transaction::<S>))
    .route("/finances/balance", get(panels::ledger::<S>))
    .with_state(state)
}
