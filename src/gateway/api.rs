//! Endpoint families. One thin wrapper per resource family, all funneled
//! through `Gateway::request`; nothing here bypasses classification.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use super::models::{LeadStatus, LoginResponse, RegisterRequest, TaskStatus, User};
use super::Gateway;
use crate::error::ApiError;
use crate::session::{demo, CurrentUser};

impl Gateway {
    /// Login. The fixed demo table is consulted first so the client works
    /// without a reachable backend; a miss falls through to `POST /login`.
    /// Both paths end with a stored token the decoder can parse and a
    /// resolvable `CurrentUser`.
    pub async fn login(&self, email: &str, password: &str) -> Result<CurrentUser, ApiError> {
        if let Some(account) = demo::match_credentials(email, password) {
            info!("demo credentials matched for {}; issuing local session", account.email);
            let token = demo::issue_demo_token(account, chrono::Utc::now().timestamp());
            self.session().set_token(&token);
            return self.session().current_user().ok_or_else(|| ApiError::InvalidRequest {
                message: "demo token did not resolve to a user".to_string(),
            });
        }

        let body = serde_json::json!({"email": email, "password": password});
        let resp: LoginResponse = serde_json::from_value(self.post("/login", &body).await?)?;
        self.session().set_token(&resp.token);
        // Cache the profile the backend returned, then let the resolver
        // reconcile it with the token claims (claims win where present).
        self.session().set_current_user(&CurrentUser {
            id: None,
            name: resp.name.clone().unwrap_or_else(|| "User".to_string()),
            full_name: resp.name,
            email: resp.email,
            role: resp.role.unwrap_or_else(|| "USER".to_string()),
        });
        debug!("network login succeeded for {}", email);
        self.session().current_user().ok_or_else(|| ApiError::InvalidRequest {
            message: "login response did not resolve to a user".to_string(),
        })
    }

    pub async fn register(&self, req: &RegisterRequest) -> Result<Value, ApiError> {
        self.post("/register", &serde_json::to_value(req)?).await
    }

    /// `GET /users/me`.
    pub async fn profile(&self) -> Result<User, ApiError> {
        Ok(serde_json::from_value(self.get("/users/me").await?)?)
    }

    /// Single refresh hook; no scheduling lives in this layer.
    pub async fn refresh_token(&self) -> Result<Value, ApiError> {
        self.post("/auth/refresh", &Value::Null).await
    }

    pub fn users(&self) -> Resource<'_, User> {
        Resource::new(self, "/users")
    }

    pub fn customers(&self) -> Resource<'_, super::models::Customer> {
        Resource::new(self, "/customers")
    }

    pub fn leads(&self) -> Resource<'_, super::models::Lead> {
        Resource::new(self, "/leads")
    }

    pub fn tasks(&self) -> Resource<'_, super::models::Task> {
        Resource::new(self, "/tasks")
    }

    pub fn sales(&self) -> Resource<'_, super::models::Sale> {
        Resource::new(self, "/sales")
    }

    /// `PATCH /users/{id}/role?role=...` — admin-only on the server side.
    pub async fn update_user_role(&self, id: i64, role: &str) -> Result<User, ApiError> {
        let value = self.patch(&format!("/users/{id}/role?role={role}"), None).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn update_lead_status(
        &self,
        id: i64,
        status: LeadStatus,
    ) -> Result<super::models::Lead, ApiError> {
        let body = serde_json::json!({"status": status});
        Ok(serde_json::from_value(self.patch(&format!("/leads/{id}/status"), Some(&body)).await?)?)
    }

    pub async fn convert_lead(&self, id: i64) -> Result<Value, ApiError> {
        self.post(&format!("/leads/{id}/convert"), &Value::Null).await
    }

    pub async fn update_task_status(
        &self,
        id: i64,
        status: TaskStatus,
    ) -> Result<super::models::Task, ApiError> {
        let body = serde_json::json!({"status": status});
        Ok(serde_json::from_value(self.patch(&format!("/tasks/{id}/status"), Some(&body)).await?)?)
    }

    /// Dashboard reads return loosely-shaped aggregates; kept as JSON.
    pub async fn dashboard_stats(&self) -> Result<Value, ApiError> {
        self.get("/dashboard/stats").await
    }

    pub async fn recent_activities(&self) -> Result<Value, ApiError> {
        self.get("/dashboard/recent-activities").await
    }
}

/// Typed CRUD family over one resource path. Every call goes through the
/// same gateway phases as the bespoke endpoints above.
pub struct Resource<'a, T> {
    gw: &'a Gateway,
    base: &'static str,
    _marker: PhantomData<T>,
}

impl<'a, T> Resource<'a, T>
where
    T: DeserializeOwned + Serialize,
{
    fn new(gw: &'a Gateway, base: &'static str) -> Self {
        Self { gw, base, _marker: PhantomData }
    }

    pub async fn list(&self) -> Result<Vec<T>, ApiError> {
        Ok(serde_json::from_value(self.gw.get(self.base).await?)?)
    }

    pub async fn get(&self, id: i64) -> Result<T, ApiError> {
        Ok(serde_json::from_value(self.gw.get(&format!("{}/{id}", self.base)).await?)?)
    }

    pub async fn create(&self, item: &T) -> Result<T, ApiError> {
        let body = serde_json::to_value(item)?;
        Ok(serde_json::from_value(self.gw.post(self.base, &body).await?)?)
    }

    pub async fn update(&self, id: i64, item: &T) -> Result<T, ApiError> {
        let body = serde_json::to_value(item)?;
        Ok(serde_json::from_value(self.gw.put(&format!("{}/{id}", self.base), &body).await?)?)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.gw.delete(&format!("{}/{id}", self.base)).await?;
        Ok(())
    }
}
