//! Domain models for Altar.
//!
//! These are the core types shared across all crates.

pub mod account;
pub mod identity;
pub mod wedding;
