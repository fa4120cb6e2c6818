//! Error taxonomy for the gateway. Every backend response outside the 2xx
//! range, and every transport failure, maps onto exactly one of these
//! variants; the gateway adds side effects (forced logout on 401, a denial
//! notice on 403) but always hands the error back to the caller.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// 401: the backend rejected the credential. The session has already
    /// been purged by the time the caller sees this.
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// 403: authenticated but not permitted. Session state is untouched.
    #[error("forbidden (role {role:?}, required {required_role:?}): {message}")]
    Forbidden {
        role: Option<String>,
        required_role: Option<String>,
        message: String,
    },

    /// 404: endpoint or record missing.
    #[error("not found: {path}")]
    NotFound { path: String },

    /// 5xx: backend-side failure.
    #[error("server fault HTTP {status}: {message}")]
    ServerFault { status: u16, message: String },

    /// No response at all: connect refused, DNS, timeout.
    #[error("backend unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),

    /// Any other non-success status (400, 409, ...).
    #[error("unexpected HTTP {status}: {message}")]
    Unexpected { status: u16, message: String },

    /// The response arrived but its body did not match the expected shape.
    #[error("invalid response body: {0}")]
    BadBody(#[from] serde_json::Error),

    /// The request could not be formed (bad path against the base URL).
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },
}

impl ApiError {
    /// HTTP status this error was classified from, when one exists.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Forbidden { .. } => Some(403),
            ApiError::NotFound { .. } => Some(404),
            ApiError::ServerFault { status, .. } | ApiError::Unexpected { status, .. } => {
                Some(*status)
            }
            ApiError::Unreachable(e) => e.status().map(|s| s.as_u16()),
            ApiError::BadBody(_) | ApiError::InvalidRequest { .. } => None,
        }
    }

    /// True for failures that never even reached the backend.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, ApiError::Unreachable(_))
    }
}
