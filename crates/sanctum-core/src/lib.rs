//! Core types and trait definitions for the Sanctum personal dashboard.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod content;
pub mod context;
pub mod daily;
pub mod day;
pub mod error;
pub mod feed;
pub mod list;
pub mod memory;
pub mod owner;
pub mod panels;
pub mod retry;
pub mod singleton;
pub mod store;

pub use error::{Error, Result};
