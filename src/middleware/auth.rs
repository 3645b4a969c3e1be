//! Bearer token authentication
//!
//! Tokens are issued by an external identity provider sharing the signing
//! secret. They name the user, the library the user acts in and the user's
//! roles; nothing else about users is stored here.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{utils::AppError, AppState};

/// Role allowed to administer seats, time slots and bookings
pub const ROLE_LIBRARIAN: &str = "librarian";
/// Role allowed to register libraries
pub const ROLE_ADMIN: &str = "admin";

/// Ten years
const MAX_TOKEN_HOURS: u64 = 24 * 365 * 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    pub username: String,
    /// Library the user acts in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_id: Option<Uuid>,
    #[serde(default)]
    pub roles: Vec<String>,
    pub iat: i64,
    pub exp: i64,
}

/// The caller of a protected route
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    /// Absent for platform administrators not bound to a library
    pub library_id: Option<Uuid>,
    pub username: String,
    pub roles: Vec<String>,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            library_id: claims.library_id,
            username: claims.username,
            roles: claims.roles,
        }
    }
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == ROLE_ADMIN)
    }

    /// Admins are librarians everywhere
    pub fn is_librarian(&self) -> bool {
        self.is_admin() || self.roles.iter().any(|r| r == ROLE_LIBRARIAN)
    }

    /// The library this request operates on
    pub fn library(&self) -> Result<Uuid, AppError> {
        self.library_id
            .ok_or_else(|| AppError::forbidden("Token is not bound to a library"))
    }

    pub fn require_librarian(&self) -> Result<(), AppError> {
        if self.is_librarian() {
            Ok(())
        } else {
            Err(AppError::forbidden("librarian role required"))
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::forbidden("admin role required"))
        }
    }
}

/// Handlers take `AuthUser` as a parameter once [`auth_middleware`] has run
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AuthError::MissingToken.into())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing authentication token")]
    MissingToken,
    #[error("Invalid authentication token")]
    InvalidToken,
    #[error("Authentication token has expired")]
    TokenExpired,
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Unauthorized(err.to_string())
    }
}

/// Sign a token for `user`, valid for `expiry_hours`
pub fn create_access_token(
    user: &AuthUser,
    secret: &str,
    expiry_hours: u64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let hours = i64::try_from(expiry_hours.min(MAX_TOKEN_HOURS)).unwrap_or(24);
    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        library_id: user.library_id,
        roles: user.roles.clone(),
        iat: now.timestamp(),
        exp: (now + Duration::hours(hours)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })
}

fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Validate the bearer token and attach the caller as an [`AuthUser`]
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingToken)?;
    let token = bearer_token(header).ok_or(AuthError::InvalidToken)?;

    let claims = validate_token(token, &state.config.auth.jwt_secret)?;
    request.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(request).await)
}
