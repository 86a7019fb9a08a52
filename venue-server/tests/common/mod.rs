//! Shared harness for the HTTP integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use chrono::DateTime;
use http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use shared::models::UserRole;
use tower::ServiceExt;
use venue_server::audit::AuditAction;
use venue_server::utils::time::{ManualClock, SharedClock};
use venue_server::{Config, ServerState, build_app};

pub const MANAGER_EMAIL: &str = "manager@venue.test";
pub const OTHER_MANAGER_EMAIL: &str = "manager@other.test";
pub const PASSWORD: &str = "correct-password";
pub const VENUE: &str = "venue-1";
pub const OTHER_VENUE: &str = "venue-2";

pub struct TestApp {
    pub state: ServerState,
    pub app: Router,
    pub clock: Arc<ManualClock>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_env(&[])
    }

    /// App on an in-memory database with cheap argon2 and two seeded managers
    pub fn with_env(overrides: &[(&str, &str)]) -> Self {
        let mut env: HashMap<String, String> = [
            ("JWT_SECRET", "integration-test-secret-0123456789abcdef"),
            ("ARGON2_MEMORY_KIB", "1024"),
            ("ARGON2_ITERATIONS", "1"),
            ("RATE_LIMIT_AUTH", "1000"),
            ("RATE_LIMIT_TRACKING", "1000"),
            ("RATE_LIMIT_API", "1000"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        for (k, v) in overrides {
            env.insert(k.to_string(), v.to_string());
        }

        let config = Config::from_lookup(|name| env.get(name).cloned()).unwrap();
        let clock = ManualClock::shared(
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        );
        let shared_clock: SharedClock = clock.clone();
        let state = ServerState::in_memory(config, shared_clock).unwrap();

        state
            .auth()
            .provision_user(MANAGER_EMAIL, PASSWORD, UserRole::Manager, VENUE)
            .unwrap();
        state
            .auth()
            .provision_user(OTHER_MANAGER_EMAIL, PASSWORD, UserRole::Manager, OTHER_VENUE)
            .unwrap();

        let app = build_app(state.clone());
        Self { state, app, clock }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();
        self.send(request).await
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.call(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Access token for a seeded account
    pub async fn token(&self, email: &str) -> String {
        let (status, body) = self.login(email, PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// Create an order for `venue` totalling 15.00
    pub async fn create_order(&self, venue: &str) -> Value {
        let (status, body) = self
            .call(Method::POST, "/v1/orders", None, Some(order_body(venue)))
            .await;
        assert_eq!(status, StatusCode::OK, "create failed: {body}");
        body
    }

    pub async fn set_status(&self, token: &str, order_id: &str, status: &str) -> (StatusCode, Value) {
        self.call(
            Method::PUT,
            &format!("/v1/orders/{order_id}/status"),
            Some(token),
            Some(json!({ "status": status })),
        )
        .await
    }

    /// Wait for the audit worker to persist an entry with `action`
    pub async fn audited(&self, action: AuditAction) -> bool {
        for _ in 0..200 {
            let entries = self.state.audit().recent(100).unwrap();
            if entries.iter().any(|e| e.action == action) {
                return true;
            }
            tokio::task::yield_now().await;
        }
        false
    }
}

pub fn order_body(venue: &str) -> Value {
    json!({
        "venueId": venue,
        "tableNumber": "T5",
        "customerName": "Ana",
        "totalAmount": 1,
        "items": [
            { "id": "cola", "name": "Cola", "price": 5, "quantity": 2 },
            { "id": "burek", "name": "Burek", "nameAlbanian": "Burek me mish", "price": 5.0, "quantity": 1 }
        ]
    })
}
