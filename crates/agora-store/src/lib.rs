//! # agora-store
//!
//! Local media storage for the Agora client, backed by SQLite.
//!
//! Stands in for IPFS during development: media payloads live as base64
//! data URIs in a single key-value table keyed by media identifier.  The
//! crate exposes a synchronous `Database` handle that wraps a
//! `rusqlite::Connection` and provides the media CRUD plus the
//! timestamp-based eviction pass.

pub mod data_uri;
pub mod database;
pub mod media;
pub mod migrations;
pub mod models;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
pub use models::{MediaRecord, StoreStats};
