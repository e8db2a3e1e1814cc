//! SQLite backend for the Sanctum document store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every statement for one operation runs
//! inside a single connection call, which is what makes conditional creates
//! atomic and change events ordered.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
