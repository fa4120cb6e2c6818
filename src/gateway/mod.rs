//! HTTP gateway: the single chokepoint for every outbound backend call.
//! Attaches the bearer credential, logs the request with the caller's role,
//! and classifies every response and transport failure into the `ApiError`
//! taxonomy. Side effects are uniform across all resource families: a 401
//! forces a full logout before the error propagates, a 403 raises a denial
//! notice, and no failure branch is ever swallowed.

mod api;
pub mod models;

pub use api::Resource;

use std::sync::Arc;

use reqwest::{Method, Response, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::session::{can_access, FileSessionStore, SessionContext};

/// Out-of-band session notifications for the embedding UI: navigation to the
/// login entry point after a forced logout, and user-facing denial notices.
pub trait SessionEvents: Send + Sync {
    /// The session was purged after a 401; the UI should return to login.
    fn logged_out(&self) {}
    /// A 403 was classified; the UI may surface the notice.
    fn access_denied(&self, _notice: &DeniedNotice) {}
}

#[derive(Debug, Clone)]
pub struct DeniedNotice {
    pub path: String,
    pub role: Option<String>,
    pub required_role: Option<String>,
    pub message: String,
}

/// Default event sink: diagnostics only.
pub struct LogOnlyEvents;

impl SessionEvents for LogOnlyEvents {
    fn logged_out(&self) {
        warn!("session ended; redirect to login");
    }

    fn access_denied(&self, notice: &DeniedNotice) {
        warn!(
            "access denied on {} (your role: {}, required: {}): {}",
            notice.path,
            notice.role.as_deref().unwrap_or("none"),
            notice.required_role.as_deref().unwrap_or("unknown"),
            notice.message
        );
    }
}

#[derive(Clone)]
pub struct Gateway {
    base: Url,
    http: reqwest::Client,
    session: SessionContext,
    events: Arc<dyn SessionEvents>,
}

impl Gateway {
    pub fn new(
        config: &ClientConfig,
        session: SessionContext,
        events: Arc<dyn SessionEvents>,
    ) -> Result<Self, ApiError> {
        // Trailing slash so joins stay below the API prefix.
        let mut base = config.api_url.trim_end_matches('/').to_string();
        base.push('/');
        let base = Url::parse(&base).map_err(|e| ApiError::InvalidRequest {
            message: format!("invalid base URL '{}': {}", config.api_url, e),
        })?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::InvalidRequest { message: e.to_string() })?;
        Ok(Self { base, http, session, events })
    }

    /// File-backed store and log-only events; the common production setup.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let store = Arc::new(FileSessionStore::new(&config.storage_dir));
        Self::new(config, SessionContext::new(store), Arc::new(LogOnlyEvents))
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidRequest { message: format!("invalid path '{path}': {e}") })
    }

    /// Path as the permission matrix sees it: API prefix plus the relative
    /// endpoint, e.g. `/api/users/3`.
    fn matrix_path(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base.path().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Request/response core every operation funnels through.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let url = self.endpoint(path)?;
        let mut req = self.http.request(method.clone(), url);

        let role = self.session.role();
        match self.session.token() {
            Some(token) => {
                req = req.bearer_auth(&token);
                debug!("request proceeding: {} {} role={:?}", method, path, role);
            }
            None => warn!("no token found for API request: {} {}", method, path),
        }

        // Advisory pre-flight only: the matrix never blocks a request, the
        // server stays the authority.
        if let Some(r) = &role {
            let matrix_path = self.matrix_path(path);
            if !can_access(r, &matrix_path) {
                warn!(
                    "permission matrix lists no '{}' access to {}; sending anyway",
                    r, matrix_path
                );
            }
        }

        if let Some(b) = body {
            req = req.json(b);
        }

        let resp = match req.send().await {
            Ok(r) => r,
            Err(e) => {
                error!("backend unreachable for {} {}: {}", method, path, e);
                return Err(ApiError::Unreachable(e));
            }
        };
        self.classify(&method, path, role, resp).await
    }

    async fn classify(
        &self,
        method: &Method,
        path: &str,
        role: Option<String>,
        resp: Response,
    ) -> Result<Value, ApiError> {
        let status = resp.status();
        if status.is_success() {
            debug!("API success: {} {}", status.as_u16(), path);
            if status == StatusCode::NO_CONTENT {
                return Ok(Value::Null);
            }
            return Ok(resp.json().await.unwrap_or(Value::Null));
        }

        error!(
            "API error: {} {} status={} role={:?}",
            method,
            path,
            status.as_u16(),
            role
        );
        let body: Value = resp.json().await.unwrap_or_else(|_| serde_json::json!({}));
        let message = body
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("")
            .to_string();

        match status.as_u16() {
            401 => {
                warn!("401 unauthorized on {}; token invalid or expired, logging out", path);
                self.session.logout();
                self.events.logged_out();
                Err(ApiError::Unauthorized { message })
            }
            403 => {
                let required_role = body
                    .get("requiredRole")
                    .and_then(|v| v.as_str())
                    .map(String::from);
                let message = if message.is_empty() { "no permission".to_string() } else { message };
                let notice = DeniedNotice {
                    path: path.to_string(),
                    role: role.clone(),
                    required_role: required_role.clone(),
                    message: message.clone(),
                };
                error!(
                    "403 forbidden on {}: role={:?} required={:?}",
                    path, notice.role, notice.required_role
                );
                self.events.access_denied(&notice);
                Err(ApiError::Forbidden { role, required_role, message })
            }
            404 => {
                error!("404 not found: {} (endpoint may not exist)", path);
                Err(ApiError::NotFound { path: path.to_string() })
            }
            s if s >= 500 => {
                error!("{} server fault on {}", s, path);
                Err(ApiError::ServerFault { status: s, message })
            }
            s => {
                error!("HTTP {} on {}", s, path);
                Err(ApiError::Unexpected { status: s, message })
            }
        }
    }

    pub(crate) async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.request(Method::GET, path, None).await
    }

    pub(crate) async fn post(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.request(Method::POST, path, Some(body)).await
    }

    pub(crate) async fn put(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub(crate) async fn patch(&self, path: &str, body: Option<&Value>) -> Result<Value, ApiError> {
        self.request(Method::PATCH, path, body).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.request(Method::DELETE, path, None).await
    }
}
