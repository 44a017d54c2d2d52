//! Altar Server — configuration loading and wiring of the auth core.

pub mod config;
pub mod state;
