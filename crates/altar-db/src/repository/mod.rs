//! SurrealDB repository implementations.

mod legacy_admin;
mod super_admin;
mod wedding;
mod wedding_admin;

pub use legacy_admin::SurrealLegacyAdminRepository;
pub use super_admin::SurrealSuperAdminRepository;
pub use wedding::SurrealWeddingRepository;
pub use wedding_admin::SurrealWeddingAdminRepository;
