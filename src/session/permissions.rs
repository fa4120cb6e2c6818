//! Static role → endpoint-prefix permission matrix. Advisory only: the
//! gateway logs when the matrix would deny a call but never blocks one;
//! enforcement stays on the server.

use std::collections::HashMap;

use once_cell::sync::Lazy;

pub const ROLE_ADMIN: &str = "ADMIN";
pub const ROLE_MANAGER: &str = "MANAGER";
pub const ROLE_SALES: &str = "SALES";
pub const ROLE_USER: &str = "USER";

/// Fallback display name when neither claims nor the cached record carry one.
pub const DEFAULT_DISPLAY_NAME: &str = "User";

static MATRIX: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
    m.insert(ROLE_ADMIN, &[
        "/api/users",
        "/api/customers",
        "/api/leads",
        "/api/tasks",
        "/api/sales",
        "/api/dashboard",
    ]);
    m.insert(ROLE_MANAGER, &[
        "/api/customers",
        "/api/leads",
        "/api/tasks",
        "/api/sales",
        "/api/dashboard",
    ]);
    m.insert(ROLE_SALES, &["/api/customers", "/api/leads", "/api/tasks", "/api/sales"]);
    m.insert(ROLE_USER, &["/api/tasks"]);
    m
});

/// True iff `endpoint` starts with one of the prefixes listed for `role`.
/// Roles are untrusted strings and compared case-insensitively; unknown
/// roles permit nothing. Total over all inputs, no side effects.
pub fn can_access(role: &str, endpoint: &str) -> bool {
    let normalized = role.trim().to_uppercase();
    match MATRIX.get(normalized.as_str()) {
        Some(prefixes) => prefixes.iter().any(|p| endpoint.starts_with(p)),
        None => false,
    }
}

/// Prefixes listed for a role, for display purposes. Empty for unknown roles.
pub fn allowed_prefixes(role: &str) -> &'static [&'static str] {
    let normalized = role.trim().to_uppercase();
    MATRIX.get(normalized.as_str()).copied().unwrap_or(&[])
}
