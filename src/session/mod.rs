//! Session and authorization layer: token storage and decoding, identity
//! resolution, the role permission matrix and the demo-credential fallback.
//! Keep the public surface thin and split implementation across sub-modules.

pub mod demo;
pub mod permissions;
mod resolver;
mod store;
mod token;

pub use permissions::{
    allowed_prefixes, can_access, ROLE_ADMIN, ROLE_MANAGER, ROLE_SALES, ROLE_USER,
};
pub use resolver::{CurrentUser, SessionContext};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore, TOKEN_KEY, USER_KEY};
pub use token::{decode_claims, looks_like_token, validate_claims, Claims, TokenError};
