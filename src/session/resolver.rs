//! Identity resolution: merge decoded token claims with the cached profile
//! record into a single `CurrentUser` view. Claims win whenever a valid token
//! is present; the cached record is overwritten on every successful decode so
//! the two representations converge after each login.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::permissions::{DEFAULT_DISPLAY_NAME, ROLE_USER};
use super::store::{SessionStore, TOKEN_KEY, USER_KEY};
use super::token::{self, Claims, TokenError};

fn default_role() -> String {
    ROLE_USER.to_string()
}

fn default_name() -> String {
    DEFAULT_DISPLAY_NAME.to_string()
}

/// Resolved, UI-facing identity. Serialized into the cached profile slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default, rename = "fullName", skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default = "default_role")]
    pub role: String,
}

impl CurrentUser {
    /// Build the view from decoded claims. Absent role falls back to the
    /// general-user constant, absent display name to the fixed default.
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            id: claims.id_str().or_else(|| claims.sub.clone()),
            name: claims
                .full_name
                .clone()
                .or_else(|| claims.name.clone())
                .unwrap_or_else(default_name),
            full_name: claims.full_name.clone(),
            email: claims.email.clone().or_else(|| claims.sub.clone()),
            role: claims.role.clone().unwrap_or_else(default_role),
        }
    }

    /// Case-insensitive role check.
    pub fn has_role(&self, role: &str) -> bool {
        self.role.eq_ignore_ascii_case(role)
    }

    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        roles.iter().any(|r| self.has_role(r))
    }

    /// Greeting name: full name, then a name field that is not itself a
    /// leaked token string, then the capitalized email local part.
    pub fn display_name(&self) -> String {
        if let Some(full) = &self.full_name {
            return full.clone();
        }
        if !self.name.is_empty() && !token::looks_like_token(&self.name) {
            return self.name.clone();
        }
        if let Some(email) = &self.email {
            if let Some(local) = email.split('@').next() {
                if !local.is_empty() {
                    let mut chars = local.chars();
                    if let Some(first) = chars.next() {
                        return first.to_uppercase().chain(chars).collect();
                    }
                }
            }
        }
        default_name()
    }
}

/// Handle over the two persisted session slots. Explicitly injected into the
/// gateway and any other consumer; there is no ambient global state, which
/// keeps the whole layer testable against a `MemorySessionStore`.
#[derive(Clone)]
pub struct SessionContext {
    store: Arc<dyn SessionStore>,
}

impl SessionContext {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub fn token(&self) -> Option<String> {
        self.store.get(TOKEN_KEY)
    }

    /// Store a raw token string verbatim. No format validation at write time.
    pub fn set_token(&self, token: &str) {
        self.store.set(TOKEN_KEY, token);
    }

    pub fn set_current_user(&self, user: &CurrentUser) {
        match serde_json::to_string(user) {
            Ok(json) => self.store.set(USER_KEY, &json),
            Err(e) => warn!("failed to serialize cached profile: {}", e),
        }
    }

    /// Clear both slots. Idempotent.
    pub fn logout(&self) {
        self.store.remove(TOKEN_KEY);
        self.store.remove(USER_KEY);
    }

    /// Validity check over the stored token. Never panics on garbage input;
    /// an expired token purges both slots *before* this returns false, so by
    /// the time the caller observes "invalid" the state change has happened.
    pub fn is_token_valid(&self) -> bool {
        let Some(raw) = self.token() else { return false };
        match token::validate_claims(&raw, chrono::Utc::now().timestamp()) {
            Ok(_) => true,
            Err(TokenError::Expired) => {
                warn!("token expired; clearing session slots");
                self.logout();
                false
            }
            Err(TokenError::Malformed) => {
                debug!("stored token is malformed");
                false
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        let has_token = self.token().is_some();
        let valid = self.is_token_valid();
        if has_token && !valid {
            warn!("token exists but is invalid");
        }
        valid
    }

    /// Resolve the current user. A valid token always wins: its claims build
    /// the view and refresh the cached profile slot. Without a usable token
    /// the cached record is the fallback; a corrupt record yields `None`.
    pub fn current_user(&self) -> Option<CurrentUser> {
        if let Some(raw) = self.token() {
            match token::validate_claims(&raw, chrono::Utc::now().timestamp()) {
                Ok(claims) => {
                    let user = CurrentUser::from_claims(&claims);
                    self.set_current_user(&user);
                    return Some(user);
                }
                Err(TokenError::Expired) => {
                    warn!("token expired while resolving identity; purging session");
                    self.logout();
                    return None;
                }
                Err(TokenError::Malformed) => {
                    debug!("stored token undecodable; falling back to cached profile");
                }
            }
        }
        self.cached_user()
    }

    fn cached_user(&self) -> Option<CurrentUser> {
        let raw = self.store.get(USER_KEY)?;
        let user: CurrentUser = match serde_json::from_str(&raw) {
            Ok(u) => u,
            Err(e) => {
                warn!("cached profile record is corrupt: {}", e);
                return None;
            }
        };
        // An earlier inconsistent write can leave a raw token string in the
        // name field; re-decode it instead of displaying it verbatim.
        if token::looks_like_token(&user.name) {
            if let Ok(claims) = token::decode_claims(&user.name) {
                let decoded = CurrentUser::from_claims(&claims);
                return Some(CurrentUser {
                    id: decoded.id.or(user.id),
                    name: decoded.name,
                    full_name: decoded.full_name.or(user.full_name),
                    email: decoded.email.or(user.email),
                    role: if claims.role.is_some() { decoded.role } else { user.role },
                });
            }
        }
        Some(user)
    }

    // Derived accessors: one resolution, then pure projections.

    pub fn role(&self) -> Option<String> {
        self.current_user().map(|u| u.role)
    }

    pub fn email(&self) -> Option<String> {
        self.current_user().and_then(|u| u.email)
    }

    pub fn user_id(&self) -> Option<String> {
        self.current_user().and_then(|u| u.id)
    }

    pub fn full_name(&self) -> Option<String> {
        self.current_user().map(|u| u.full_name.unwrap_or(u.name))
    }

    pub fn display_name(&self) -> String {
        self.current_user()
            .map(|u| u.display_name())
            .unwrap_or_else(default_name)
    }
}
