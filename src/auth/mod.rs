//! Token verification and the user directory. Accounts and tokens are
//! issued by the external auth service; this crate only trusts them.

pub mod claims;
pub(crate) mod extractors;
pub mod repo;
pub mod repo_types;

pub use extractors::{AdminUser, AuthUser};
