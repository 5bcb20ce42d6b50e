//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! Login:
//!     credentials → password.rs (Argon2 verify)
//!     → token.rs (issue signed assertion)
//!
//! Every request:
//!     Authorization: Bearer <token>
//!     → principal.rs (strip scheme)
//!     → token.rs (verify signature + expiry)
//!     → Principal::Authenticated | Principal::Anonymous
//! ```
//!
//! # Design Decisions
//! - Stateless: nothing about a session is stored server side
//! - Fail open to anonymous, fail closed at authorization
//! - No revocation list; a signed, unexpired token is always accepted

pub mod password;
pub mod principal;
pub mod role;
pub mod token;

/// Stable user identifier.
pub type UserId = u64;

pub use principal::{resolve_user_id, Principal, PrincipalResolver};
pub use role::Role;
pub use token::{IdentityAssertion, TokenCodec, TokenError};
