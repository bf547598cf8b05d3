//! Admin session handlers: login, logout, password reset, and the shared
//! authorization gate used by every admin route.
//!
//! Login failures always answer `401 {"error": "Invalid credentials"}` and
//! gate failures always answer `401 {"error": "Unauthorized"}`, so an
//! attacker cannot tell an unknown email from a wrong password or an expired
//! token from a forged one.

use crate::{
    api::handlers::{
        bad_request, bearer_token, error_response, internal_error, unauthorized, SuccessBody,
    },
    auth::{hash_password, verify_password, TokenService},
};
use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use std::sync::Arc;
use tracing::{error, info_span, Instrument};
use uuid::Uuid;

const INVALID_CREDENTIALS: &str = "Invalid credentials";
const MIN_PASSWORD_LENGTH: usize = 6;

/// Shared state for the admin session handlers.
#[derive(Debug)]
pub struct AuthState {
    token_service: TokenService,
}

impl AuthState {
    #[must_use]
    pub fn new(token_service: TokenService) -> Self {
        Self { token_service }
    }

    #[must_use]
    pub fn token_service(&self) -> &TokenService {
        &self.token_service
    }
}

#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AdminInfo {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub token: String,
    pub admin: AdminInfo,
}

#[derive(Deserialize, Debug)]
pub struct ResetPasswordRequest {
    password: String,
}

/// Admin identity confirmed by the authorization gate.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AdminRecord {
    pub id: Uuid,
}

// axum handler for POST /api/admin/login
pub async fn login(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return error_response(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS);
    };

    let email = request.email.trim().to_lowercase();

    let query = "SELECT id, email, name, password_hash FROM admin_users WHERE email = $1";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = match sqlx::query(query)
        .bind(&email)
        .fetch_optional(&pool.0)
        .instrument(span)
        .await
    {
        Ok(row) => row,
        Err(error) => {
            error!("Admin lookup failed: {}", error);
            return internal_error();
        }
    };

    let Some(row) = row else {
        return error_response(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS);
    };

    let stored: String = row.get("password_hash");
    if !verify_password(&request.password, &stored) {
        return error_response(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS);
    }

    let admin_id: Uuid = row.get("id");
    let token = match auth_state.token_service().issue(&admin_id.to_string()) {
        Ok(token) => token,
        Err(error) => {
            error!("Failed to issue admin token: {}", error);
            return internal_error();
        }
    };

    Json(LoginResponse {
        token,
        admin: AdminInfo {
            id: admin_id,
            email: row.get("email"),
            name: row.get("name"),
        },
    })
    .into_response()
}

// axum handler for POST /api/admin/logout
//
// Logout always succeeds. Tokens are stateless so revocation is a no-op and
// the client simply discards its copy; the token stays valid until expiry.
pub async fn logout(headers: HeaderMap, auth_state: Extension<Arc<AuthState>>) -> Response {
    if let Some(token) = bearer_token(&headers) {
        auth_state.token_service().revoke(token);
    }

    Json(SuccessBody { success: true }).into_response()
}

// axum handler for POST /api/admin/reset-password
pub async fn reset_password(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> Response {
    let admin = match require_admin(&headers, &pool.0, &auth_state.0).await {
        Ok(admin) => admin,
        Err(response) => return response,
    };

    let Some(Json(request)) = payload else {
        return bad_request("Missing password");
    };

    if request.password.len() < MIN_PASSWORD_LENGTH {
        return bad_request("Password must be at least 6 characters");
    }

    let password_hash = hash_password(&request.password);

    let query = "UPDATE admin_users SET password_hash = $1 WHERE id = $2";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    match sqlx::query(query)
        .bind(&password_hash)
        .bind(admin.id)
        .execute(&pool.0)
        .instrument(span)
        .await
    {
        Ok(_) => Json(SuccessBody { success: true }).into_response(),
        Err(error) => {
            error!("Failed to update admin password: {}", error);
            internal_error()
        }
    }
}

/// Authorization gate shared by every admin route.
///
/// Extracts the bearer token, verifies it, and confirms the embedded admin
/// identity still exists. Every failure path answers the same 401 body.
pub(crate) async fn require_admin(
    headers: &HeaderMap,
    pool: &PgPool,
    auth_state: &AuthState,
) -> Result<AdminRecord, Response> {
    let token = bearer_token(headers).unwrap_or_default();

    let Some(admin_id) = auth_state.token_service().verify(token) else {
        return Err(unauthorized());
    };

    let Ok(admin_id) = Uuid::parse_str(&admin_id) else {
        return Err(unauthorized());
    };

    let query = "SELECT id FROM admin_users WHERE id = $1";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    match sqlx::query(query)
        .bind(admin_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
    {
        Ok(Some(row)) => Ok(AdminRecord {
            id: row.get("id"),
        }),
        Ok(None) => Err(unauthorized()),
        Err(error) => {
            error!("Admin lookup failed: {}", error);
            Err(internal_error())
        }
    }
}
