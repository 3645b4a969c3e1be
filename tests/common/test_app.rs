//! Test application setup utilities
//!
//! Provides utilities for setting up test instances of the application
//! backed by a throwaway SQLite file.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use tower::ServiceExt;
use uuid::Uuid;

use seatdesk::{
    api,
    config::{AppConfig, AuthConfig, BookingConfig, DatabaseConfig, LoggingConfig, ServerConfig},
    db,
    middleware::auth::{create_access_token, AuthUser, ROLE_ADMIN, ROLE_LIBRARIAN},
    models::{CreateLibraryRequest, Library},
    services::{BroadcastNotifier, NotificationSink},
    AppState,
};

/// Test application wrapper for integration testing
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    /// Create a new test application with a fresh database
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    /// Create a new test application with custom configuration
    pub async fn with_config(config: AppConfig) -> Self {
        let db = db::init_pool(&config.database)
            .await
            .expect("Failed to initialize test database");
        Self::from_state(AppState::new(config, db))
    }

    /// Create a test application whose ledger reports to `sink`
    pub async fn with_sink(sink: Arc<dyn NotificationSink>) -> Self {
        let config = test_config();
        let db = db::init_pool(&config.database)
            .await
            .expect("Failed to initialize test database");
        Self::from_state(AppState::with_notifier(
            config,
            db,
            BroadcastNotifier::new(),
            sink,
        ))
    }

    fn from_state(state: AppState) -> Self {
        Self {
            router: api::router(state.clone()),
            state,
        }
    }

    /// Register a library directly through the service layer
    pub async fn create_library(&self, name: &str) -> Library {
        self.state
            .libraries
            .register(&CreateLibraryRequest {
                name: name.to_string(),
                hourly_fee: None,
                monthly_fee: Some(120.0),
            })
            .await
            .expect("Failed to create library")
    }

    /// Token for a librarian of `library_id`
    pub fn librarian_token(&self, library_id: Uuid) -> String {
        generate_test_token(
            &self.state.config,
            Uuid::new_v4(),
            Some(library_id),
            "librarian",
            vec![ROLE_LIBRARIAN.to_string()],
        )
    }

    /// Token for a member of `library_id`
    pub fn member_token(&self, user_id: Uuid, library_id: Uuid) -> String {
        generate_test_token(&self.state.config, user_id, Some(library_id), "member", vec![])
    }

    /// Token for a platform administrator not bound to a library
    pub fn admin_token(&self) -> String {
        generate_test_token(
            &self.state.config,
            Uuid::new_v4(),
            None,
            "admin",
            vec![ROLE_ADMIN.to_string()],
        )
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None, None).await
    }

    pub async fn get_as(&self, uri: &str, token: &str) -> TestResponse {
        self.send(Method::GET, uri, None, Some(token)).await
    }

    pub async fn post_as(&self, uri: &str, body: serde_json::Value, token: &str) -> TestResponse {
        self.send(Method::POST, uri, Some(body), Some(token)).await
    }

    pub async fn put_as(&self, uri: &str, body: serde_json::Value, token: &str) -> TestResponse {
        self.send(Method::PUT, uri, Some(body), Some(token)).await
    }

    pub async fn delete_as(&self, uri: &str, token: &str) -> TestResponse {
        self.send(Method::DELETE, uri, None, Some(token)).await
    }

    /// Run one request through the router and buffer the response
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<serde_json::Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");

        TestResponse { status, body }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: bytes::Bytes,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse response as JSON")
    }

    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(self.status, expected, "Body: {}", self.text());
        self
    }

    pub fn assert_ok(&self) -> &Self {
        self.assert_status(StatusCode::OK)
    }

    pub fn assert_created(&self) -> &Self {
        self.assert_status(StatusCode::CREATED)
    }

    pub fn assert_unauthorized(&self) -> &Self {
        self.assert_status(StatusCode::UNAUTHORIZED)
    }

    pub fn assert_forbidden(&self) -> &Self {
        self.assert_status(StatusCode::FORBIDDEN)
    }

    pub fn assert_not_found(&self) -> &Self {
        self.assert_status(StatusCode::NOT_FOUND)
    }

    /// Assert the status and the `code` field of an error body
    pub fn assert_error(&self, status: StatusCode, code: &str) -> &Self {
        self.assert_status(status);
        let json: serde_json::Value = self.json();
        assert_eq!(json["code"], code, "Body: {}", self.text());
        self
    }

    pub fn assert_conflict_code(&self, code: &str) -> &Self {
        self.assert_error(StatusCode::CONFLICT, code)
    }

    pub fn assert_invalid_code(&self, code: &str) -> &Self {
        self.assert_error(StatusCode::UNPROCESSABLE_ENTITY, code)
    }
}

/// Configuration backed by a fresh SQLite file under the temp directory
pub fn test_config() -> AppConfig {
    let db_path = std::env::temp_dir().join(format!("seatdesk_test_{}.db", Uuid::new_v4().simple()));

    AppConfig {
        server: ServerConfig {
            workers: 1,
            ..ServerConfig::default()
        },
        database: DatabaseConfig {
            url: format!("sqlite://{}?mode=rwc", db_path.display()),
            busy_timeout_secs: 10,
            ..DatabaseConfig::default()
        },
        auth: AuthConfig {
            jwt_secret: "test_secret_key_that_is_at_least_32_bytes_long".to_string(),
            token_expiry_hours: 24,
        },
        logging: LoggingConfig::default(),
        booking: BookingConfig {
            max_bulk_seats: 10,
            ..BookingConfig::default()
        },
    }
}

/// Sign a one-hour token with the test secret
pub fn generate_test_token(
    config: &AppConfig,
    user_id: Uuid,
    library_id: Option<Uuid>,
    username: &str,
    roles: Vec<String>,
) -> String {
    let user = AuthUser {
        id: user_id,
        library_id,
        username: username.to_string(),
        roles,
    };
    create_access_token(&user, &config.auth.jwt_secret, 1).expect("Failed to generate test token")
}
