//! Altar Auth — bearer token issuance/verification, identity
//! resolution across account namespaces, and the wedding access policy.

pub mod config;
pub mod directory;
pub mod error;
pub mod password;
pub mod policy;
pub mod provider;
pub mod resolver;
pub mod session;
pub mod token;

pub use config::AuthConfig;
pub use directory::WeddingDirectory;
pub use error::AuthError;
pub use policy::{AccessMode, Audience, WeddingAccessPolicy};
pub use provider::{IdentityProvider, ProviderOutcome, ResolvedIdentity};
pub use resolver::{IdentityResolver, LoginOutput};
pub use session::{AccountMembershipLookup, MembershipLookup, SessionAuthenticator};
pub use token::{Claims, TokenCodec, TokenType};
