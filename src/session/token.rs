//! Token decoding. The bearer token is a compact three-segment string
//! (`header.claims.signature`); only the claims segment is interpreted. There
//! is deliberately no signature verification here — the server remains the
//! authorization boundary, this decode exists purely so the UI can show who
//! is logged in without another round trip.

use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Not three segments, or the claims segment did not decode/parse.
    #[error("malformed token")]
    Malformed,
    /// Structurally valid but `exp` lies strictly in the past.
    #[error("token expired")]
    Expired,
}

/// Claims carried in the middle segment. Every field is optional; whatever
/// the payload omits stays absent so the resolver can apply its own
/// fallbacks. Unknown fields (iat, iss, ...) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, rename = "fullName", skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// The backend serializes ids as numbers; older tokens carried strings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    /// Expiration, seconds since epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl Claims {
    /// Id claim normalized to a string regardless of the wire type.
    pub fn id_str(&self) -> Option<String> {
        match &self.id {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Cheap structural check used to spot token strings that leaked into
/// profile fields: three non-empty dot-separated segments.
pub fn looks_like_token(s: &str) -> bool {
    let mut count = 0usize;
    for seg in s.split('.') {
        if seg.is_empty() || seg.contains(char::is_whitespace) {
            return false;
        }
        count += 1;
    }
    count == 3
}

fn decode_segment(seg: &str) -> Option<Vec<u8>> {
    // Tokens are base64url without padding; tolerate padded/standard output
    // from older issuers.
    base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(seg)
        .or_else(|_| base64::engine::general_purpose::STANDARD.decode(seg))
        .ok()
}

/// Parse the claims segment of `raw`. Purely structural: expiry is not
/// checked here (see [`validate_claims`]).
pub fn decode_claims(raw: &str) -> Result<Claims, TokenError> {
    let parts: Vec<&str> = raw.split('.').collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
        return Err(TokenError::Malformed);
    }
    let payload = decode_segment(parts[1]).ok_or(TokenError::Malformed)?;
    serde_json::from_slice::<Claims>(&payload).map_err(|_| TokenError::Malformed)
}

/// Decode and additionally reject claims whose `exp` is strictly before
/// `now` (seconds since epoch). Tokens without `exp` never expire here.
pub fn validate_claims(raw: &str, now: i64) -> Result<Claims, TokenError> {
    let claims = decode_claims(raw)?;
    if let Some(exp) = claims.exp {
        if exp < now {
            return Err(TokenError::Expired);
        }
    }
    Ok(claims)
}
