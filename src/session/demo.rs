//! Fixed demo credentials. These bootstrap a session when the backend is
//! unreachable; they are a convenience, not a security mechanism. A matched
//! entry synthesizes an unsigned but decoder-parseable token so that demo
//! and network logins leave the session layer in indistinguishable states.

use base64::Engine;

/// Third token segment for synthesized tokens. There is no signature to
/// carry; the segment only exists so the token keeps its three-part shape.
const DEMO_SIGNATURE: &str = "ZGVtbw";

const DEMO_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Clone, Copy)]
pub struct DemoAccount {
    pub email: &'static str,
    pub password: &'static str,
    pub role: &'static str,
    pub name: &'static str,
}

pub const DEMO_ACCOUNTS: [DemoAccount; 4] = [
    DemoAccount { email: "admin@crm.com", password: "admin123", role: "ADMIN", name: "Admin User" },
    DemoAccount { email: "manager@crm.com", password: "manager123", role: "MANAGER", name: "Manager User" },
    DemoAccount { email: "sales@crm.com", password: "sales123", role: "SALES", name: "Sales Representative" },
    DemoAccount { email: "user@crm.com", password: "user123", role: "USER", name: "Regular User" },
];

/// Exact match over the fixed table.
pub fn match_credentials(email: &str, password: &str) -> Option<&'static DemoAccount> {
    DEMO_ACCOUNTS
        .iter()
        .find(|a| a.email == email && a.password == password)
}

fn b64_json(value: &serde_json::Value) -> String {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(value.to_string())
}

/// Synthesize a three-segment token for a matched demo account. The claims
/// segment parses through the normal decoder; `now` is seconds since epoch.
pub fn issue_demo_token(account: &DemoAccount, now: i64) -> String {
    let header = serde_json::json!({"alg": "none", "typ": "JWT"});
    let claims = serde_json::json!({
        "sub": account.email,
        "email": account.email,
        "fullName": account.name,
        "role": account.role,
        "exp": now + DEMO_TOKEN_TTL_SECS,
    });
    format!("{}.{}.{}", b64_json(&header), b64_json(&claims), DEMO_SIGNATURE)
}
