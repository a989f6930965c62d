//! IQA Adapters - External adapters for the IQA pipeline.
//!
//! This crate provides adapters for:
//! - Streaming remote images over HTTP(S)
//! - Work-item stores backed by SQLite or PostgreSQL

pub mod http;
pub mod store;

pub use http::{FetchConfig, HttpFetcher};
pub use store::{open_store, PgStore, SqliteStore, StoreLocation, DEFAULT_TABLE};
