//! Gateway integration tests against an in-process stub backend. These cover
//! the credential attachment, the uniform classification of every failure
//! status, the 401 forced-logout side effect, and the demo/network login
//! equivalence from the resolver's point of view.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use parking_lot::Mutex;

use crm_client::session::{decode_claims, MemorySessionStore, SessionContext, TOKEN_KEY, USER_KEY};
use crm_client::{ApiError, ClientConfig, DeniedNotice, Gateway, SessionEvents};

fn b64(v: serde_json::Value) -> String {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(v.to_string())
}

fn token_with(claims: serde_json::Value) -> String {
    format!("{}.{}.sig0", b64(serde_json::json!({"alg": "HS256"})), b64(claims))
}

#[derive(Default)]
struct RecordingEvents {
    logged_out: AtomicBool,
    denials: Mutex<Vec<DeniedNotice>>,
}

impl SessionEvents for RecordingEvents {
    fn logged_out(&self) {
        self.logged_out.store(true, Ordering::SeqCst);
    }

    fn access_denied(&self, notice: &DeniedNotice) {
        self.denials.lock().push(notice.clone());
    }
}

async fn spawn_backend(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/api")
}

fn gateway_for(base: &str) -> (Gateway, SessionContext, Arc<RecordingEvents>) {
    let session = SessionContext::new(Arc::new(MemorySessionStore::new()));
    let events = Arc::new(RecordingEvents::default());
    let config = ClientConfig::default().with_api_url(base);
    let gw = Gateway::new(&config, session.clone(), events.clone()).unwrap();
    (gw, session, events)
}

#[tokio::test]
async fn bearer_header_is_attached_when_token_present() -> Result<()> {
    let seen: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
    let router = Router::new().route(
        "/api/tasks",
        get({
            let seen = seen.clone();
            move |headers: HeaderMap| {
                let seen = seen.clone();
                async move {
                    *seen.lock() = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(String::from);
                    Json(serde_json::json!([]))
                }
            }
        }),
    );
    let base = spawn_backend(router).await;
    let (gw, session, _) = gateway_for(&base);

    let raw = token_with(serde_json::json!({"role": "USER", "fullName": "Regular User"}));
    session.set_token(&raw);
    let tasks = gw.tasks().list().await?;
    assert!(tasks.is_empty());
    assert_eq!(seen.lock().as_deref(), Some(format!("Bearer {raw}").as_str()));
    Ok(())
}

#[tokio::test]
async fn request_without_token_is_still_sent() -> Result<()> {
    let router = Router::new().route("/api/tasks", get(|| async { Json(serde_json::json!([])) }));
    let base = spawn_backend(router).await;
    let (gw, session, _) = gateway_for(&base);

    assert_eq!(session.token(), None);
    assert!(gw.tasks().list().await.is_ok());
    Ok(())
}

#[tokio::test]
async fn unauthorized_purges_session_before_error_reaches_caller() -> Result<()> {
    let router = Router::new().route(
        "/api/customers",
        get(|| async {
            (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({"message": "token expired"})),
            )
        }),
    );
    let base = spawn_backend(router).await;
    let (gw, session, events) = gateway_for(&base);

    session.set_token(&token_with(serde_json::json!({"role": "ADMIN"})));
    session.set_current_user(&crm_client::CurrentUser {
        id: None,
        name: "Admin User".into(),
        full_name: None,
        email: None,
        role: "ADMIN".into(),
    });

    let err = gw.customers().list().await.unwrap_err();
    match err {
        ApiError::Unauthorized { message } => assert_eq!(message, "token expired"),
        other => panic!("expected Unauthorized, got {other:?}"),
    }
    // Both slots are gone and the logout navigation fired before the caller
    // ever saw the error.
    assert_eq!(session.token(), None);
    assert_eq!(session.current_user(), None);
    assert!(events.logged_out.load(Ordering::SeqCst));
    Ok(())
}

#[tokio::test]
async fn forbidden_leaves_session_intact_and_raises_notice() -> Result<()> {
    let router = Router::new().route(
        "/api/users",
        get(|| async {
            (
                StatusCode::FORBIDDEN,
                Json(serde_json::json!({"message": "admins only", "requiredRole": "ADMIN"})),
            )
        }),
    );
    let base = spawn_backend(router).await;
    let (gw, session, events) = gateway_for(&base);

    let raw = token_with(serde_json::json!({"role": "SALES", "fullName": "Sales Representative"}));
    session.set_token(&raw);

    let err = gw.users().list().await.unwrap_err();
    match &err {
        ApiError::Forbidden { role, required_role, message } => {
            assert_eq!(role.as_deref(), Some("SALES"));
            assert_eq!(required_role.as_deref(), Some("ADMIN"));
            assert_eq!(message, "admins only");
        }
        other => panic!("expected Forbidden, got {other:?}"),
    }
    // No logout; the denial notice carries the caller's role.
    assert_eq!(session.token().as_deref(), Some(raw.as_str()));
    assert!(!events.logged_out.load(Ordering::SeqCst));
    let denials = events.denials.lock();
    assert_eq!(denials.len(), 1);
    assert_eq!(denials[0].role.as_deref(), Some("SALES"));
    assert_eq!(denials[0].path, "/users");
    Ok(())
}

#[tokio::test]
async fn not_found_and_server_fault_do_not_touch_session() -> Result<()> {
    let router = Router::new()
        .route("/api/leads", get(|| async { StatusCode::NOT_FOUND }))
        .route(
            "/api/sales",
            get(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({"message": "boom"})),
                )
            }),
        );
    let base = spawn_backend(router).await;
    let (gw, session, events) = gateway_for(&base);

    let raw = token_with(serde_json::json!({"role": "MANAGER"}));
    session.set_token(&raw);

    match gw.leads().list().await.unwrap_err() {
        ApiError::NotFound { path } => assert_eq!(path, "/leads"),
        other => panic!("expected NotFound, got {other:?}"),
    }
    match gw.sales().list().await.unwrap_err() {
        ApiError::ServerFault { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("expected ServerFault, got {other:?}"),
    }
    assert_eq!(session.token().as_deref(), Some(raw.as_str()));
    assert!(!events.logged_out.load(Ordering::SeqCst));
    Ok(())
}

#[tokio::test]
async fn unreachable_backend_is_classified_distinctly() -> Result<()> {
    // Bind then drop to get a port nothing is listening on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let (gw, session, _) = gateway_for(&format!("http://{addr}/api"));
    session.set_token(&token_with(serde_json::json!({"role": "USER"})));

    let err = gw.tasks().list().await.unwrap_err();
    assert!(err.is_unreachable(), "got {err:?}");
    // Transport failures never mutate session state.
    assert!(session.token().is_some());
    Ok(())
}

#[tokio::test]
async fn demo_login_yields_admin_session_with_parseable_token() -> Result<()> {
    // No backend at all: demo credentials must still produce a session.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    let (gw, session, _) = gateway_for(&format!("http://{addr}/api"));

    let user = gw.login("admin@crm.com", "admin123").await?;
    assert_eq!(user.role, "ADMIN");
    assert_eq!(user.display_name(), "Admin User");

    let raw = session.token().expect("token stored");
    assert_eq!(raw.matches('.').count(), 2);
    let claims = decode_claims(&raw)?;
    assert_eq!(claims.role.as_deref(), Some("ADMIN"));
    // resolver state is fully populated, as after a network login
    assert_eq!(session.role().as_deref(), Some("ADMIN"));
    assert!(session.is_authenticated());
    Ok(())
}

#[tokio::test]
async fn network_login_state_matches_demo_login_state() -> Result<()> {
    let issued = token_with(serde_json::json!({
        "sub": "jane@corp.com",
        "fullName": "Jane Doe",
        "role": "MANAGER",
        "id": 12,
    }));
    let router = Router::new().route(
        "/api/login",
        post({
            let issued = issued.clone();
            move |Json(body): Json<serde_json::Value>| {
                let issued = issued.clone();
                async move {
                    assert_eq!(body["email"], "jane@corp.com");
                    Json(serde_json::json!({
                        "token": issued,
                        "email": "jane@corp.com",
                        "role": "MANAGER",
                        "name": "Jane Doe",
                    }))
                }
            }
        }),
    );
    let base = spawn_backend(router).await;
    let (gw, session, _) = gateway_for(&base);

    let user = gw.login("jane@corp.com", "secret").await?;
    assert_eq!(user.role, "MANAGER");
    assert_eq!(user.id.as_deref(), Some("12"));
    assert_eq!(session.token().as_deref(), Some(issued.as_str()));
    // Same observable surface as the demo path: token parses, user resolves.
    assert!(session.is_authenticated());
    assert_eq!(session.display_name(), "Jane Doe");
    Ok(())
}

#[tokio::test]
async fn failed_network_login_surfaces_to_caller() -> Result<()> {
    let router = Router::new().route(
        "/api/login",
        post(|| async {
            (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({"message": "bad credentials"})),
            )
        }),
    );
    let base = spawn_backend(router).await;
    let (gw, session, _) = gateway_for(&base);

    let err = gw.login("nobody@crm.com", "wrong").await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized { .. }), "got {err:?}");
    assert_eq!(session.current_user(), None);
    Ok(())
}

#[tokio::test]
async fn late_call_after_forced_logout_is_tolerated() -> Result<()> {
    // A 401 in one call races any other in-flight request; a follow-up call
    // that finds the store empty must go out unauthenticated, not crash.
    let router = Router::new()
        .route(
            "/api/customers",
            get(|| async { (StatusCode::UNAUTHORIZED, Json(serde_json::json!({}))) }),
        )
        .route("/api/tasks", get(|| async { Json(serde_json::json!([])) }));
    let base = spawn_backend(router).await;
    let (gw, session, _) = gateway_for(&base);

    session.set_token(&token_with(serde_json::json!({"role": "USER"})));
    let _ = gw.customers().list().await.unwrap_err();
    assert_eq!(session.token(), None);

    // second request proceeds without a credential and still classifies
    assert!(gw.tasks().list().await.is_ok());
    Ok(())
}

#[tokio::test]
async fn delete_with_no_content_body_succeeds() -> Result<()> {
    let router = Router::new().route(
        "/api/tasks/{id}",
        axum::routing::delete(|| async { StatusCode::NO_CONTENT }),
    );
    let base = spawn_backend(router).await;
    let (gw, session, _) = gateway_for(&base);
    session.set_token(&token_with(serde_json::json!({"role": "USER"})));

    gw.tasks().delete(7).await?;
    Ok(())
}

#[tokio::test]
async fn shared_store_observed_across_contexts() -> Result<()> {
    // Two gateways over one file store model two open tabs: a logout driven
    // by one context is seen by the other on its next read.
    let tmp = tempfile::tempdir()?;
    let store = Arc::new(crm_client::session::FileSessionStore::new(tmp.path()));
    let a = SessionContext::new(store.clone());
    let b = SessionContext::new(store);

    a.set_token(&token_with(serde_json::json!({"role": "SALES"})));
    assert_eq!(b.role().as_deref(), Some("SALES"));
    a.logout();
    assert_eq!(b.token(), None);
    assert_eq!(b.current_user(), None);
    Ok(())
}

// Keep the slot keys stable: external tooling reads the same files.
#[test]
fn slot_keys_are_fixed() {
    assert_eq!(TOKEN_KEY, "token");
    assert_eq!(USER_KEY, "user");
}
