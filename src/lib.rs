//! Client-side session & authorization layer for the CRM backend.
//!
//! The crate covers the one part of the client with real design content: how
//! the bearer token is stored, decoded and validated; how token claims and
//! the cached profile record merge into a single identity; which endpoint
//! prefixes each role is listed for; and how the HTTP gateway reacts
//! uniformly to success, authorization failure and network failure. Page
//! rendering and form plumbing are the embedding application's business.
//!
//! There is deliberately no cryptographic trust boundary here: tokens are
//! decoded for UI convenience only, and server-side authorization remains
//! mandatory.

pub mod config;
pub mod error;
pub mod gateway;
pub mod session;

pub use config::ClientConfig;
pub use error::ApiError;
pub use gateway::{DeniedNotice, Gateway, LogOnlyEvents, SessionEvents};
pub use session::{CurrentUser, SessionContext};
