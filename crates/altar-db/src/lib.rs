//! Altar Database — SurrealDB connection management, schema migrations,
//! and repository implementations for accounts and weddings.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Error types ([`DbError`])
//! - Implementations of the `altar-core` repository traits ([`repository`])

mod connection;
mod convert;
mod error;
mod password;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::{latest_version, run_migrations};
