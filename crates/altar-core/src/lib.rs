//! Altar Core — domain models, error taxonomy, and repository traits
//! shared by the auth, database, and server crates.

pub mod error;
pub mod models;
pub mod repository;
