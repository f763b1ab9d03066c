//! Common test utilities for integration tests
//!
//! This module provides shared infrastructure for integration tests:
//! - An app wired to the in-memory store (no database needed)
//! - JSON request helpers
//! - Refresh cookie extraction

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
};
use std::sync::Arc;
use tasktracker_api::{
    app::{build_router, AppState},
    config::{ApiConfig, Config, CookieConfig, DatabaseConfig},
};
use tasktracker_shared::{
    auth::password::{HashingParams, PasswordHasher},
    config::SessionConfig,
    session::{MemoryStore, SessionCore},
};
use tower::Service as _;

pub const EMAIL: &str = "user@example.com";
pub const PASSWORD: &str = "correct horse battery";

/// Test context containing all necessary resources
pub struct TestContext {
    pub app: axum::Router,
    pub store: Arc<MemoryStore>,
}

/// Response parts a test cares about
pub struct TestResponse {
    pub status: StatusCode,
    pub set_cookie: Option<String>,
    pub body: serde_json::Value,
}

impl TestResponse {
    /// Value of the `refreshToken` cookie being set, `None` if not set or cleared
    pub fn refresh_cookie(&self) -> Option<String> {
        let set_cookie = self.set_cookie.as_ref()?;
        let (pair, _) = set_cookie.split_once(';')?;
        let value = pair.strip_prefix("refreshToken=")?;

        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }
}

impl TestContext {
    /// Creates an app backed by a fresh in-memory store
    pub fn new() -> Self {
        Self::with_cookie_secure(false)
    }

    pub fn with_cookie_secure(secure: bool) -> Self {
        let session_config = SessionConfig::new("api-tests-secret-0123456789abcdef").unwrap();

        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["http://localhost:5173".to_string()],
            },
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 1,
            },
            session: session_config.clone(),
            cookie: CookieConfig { secure },
        };

        let store = Arc::new(MemoryStore::new());
        let hasher = PasswordHasher::new(HashingParams {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap();

        let session = SessionCore::new(store.clone(), store.clone(), hasher, &session_config);
        let app = build_router(AppState::new(Arc::new(session), config));

        Self { app, store }
    }

    /// Sends a request and collects status, `Set-Cookie` and JSON body
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().call(request).await.unwrap();
        read_response(response).await
    }

    /// POSTs a JSON body
    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        self.send(request).await
    }

    /// POSTs with an optional refresh cookie and no body
    pub async fn post_with_cookie(&self, uri: &str, refresh_token: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method("POST").uri(uri);
        if let Some(token) = refresh_token {
            builder = builder.header(header::COOKIE, format!("refreshToken={}", token));
        }

        self.send(builder.body(Body::empty()).unwrap()).await
    }

    /// GETs with an optional bearer token
    pub async fn get(&self, uri: &str, bearer: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        self.send(builder.body(Body::empty()).unwrap()).await
    }

    /// Registers the default user
    pub async fn register(&self) -> TestResponse {
        self.post_json(
            "/api/v1/auth/register",
            serde_json::json!({ "email": EMAIL, "password": PASSWORD }),
        )
        .await
    }

    /// Logs in as the default user
    pub async fn login(&self) -> TestResponse {
        self.post_json(
            "/api/v1/auth/login",
            serde_json::json!({ "email": EMAIL, "password": PASSWORD }),
        )
        .await
    }
}

async fn read_response(response: Response<Body>) -> TestResponse {
    let status = response.status();
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };

    TestResponse {
        status,
        set_cookie,
        body,
    }
}
