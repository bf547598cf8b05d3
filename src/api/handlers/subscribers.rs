use crate::api::handlers::{
    auth::{require_admin, AuthState},
    bad_request, format_timestamp, internal_error, valid_email, SuccessBody,
};
use axum::{
    extract::Extension,
    http::HeaderMap,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{error, info_span, Instrument};
use uuid::Uuid;

#[derive(Deserialize, Debug)]
pub struct SubscribeRequest {
    email: String,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    pub id: Uuid,
    pub email: String,
    pub read: bool,
    pub created_at: String,
}

// axum handler for POST /api/newsletter/subscribe
//
// Subscribing twice with the same address is not an error; the duplicate
// insert is simply skipped.
pub async fn subscribe(pool: Extension<PgPool>, payload: Option<Json<SubscribeRequest>>) -> Response {
    let Some(Json(request)) = payload else {
        return bad_request("Email is required");
    };

    let email = request.email.trim().to_lowercase();
    if !valid_email(&email) {
        return bad_request("Email is required");
    }

    let query = "INSERT INTO subscribers (email) VALUES ($1) ON CONFLICT (email) DO NOTHING";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    match sqlx::query(query)
        .bind(&email)
        .execute(&pool.0)
        .instrument(span)
        .await
    {
        Ok(_) => Json(SuccessBody { success: true }).into_response(),
        Err(error) => {
            error!("Failed to store subscriber: {}", error);
            internal_error()
        }
    }
}

// axum handler for GET /api/admin/subscribers
pub async fn admin_list_subscribers(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Response {
    if let Err(response) = require_admin(&headers, &pool.0, &auth_state.0).await {
        return response;
    }

    let query = "SELECT id, email, is_read, created_at FROM subscribers ORDER BY created_at DESC";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    match sqlx::query(query).fetch_all(&pool.0).instrument(span).await {
        Ok(rows) => {
            let subscribers: Vec<Subscriber> = rows
                .iter()
                .map(|row| Subscriber {
                    id: row.get("id"),
                    email: row.get("email"),
                    read: row.get("is_read"),
                    created_at: format_timestamp(row.get::<OffsetDateTime, _>("created_at")),
                })
                .collect();
            Json(subscribers).into_response()
        }
        Err(error) => {
            error!("Failed to list subscribers: {}", error);
            internal_error()
        }
    }
}

// axum handler for POST /api/admin/subscribers/mark-read
pub async fn admin_mark_subscribers_read(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Response {
    if let Err(response) = require_admin(&headers, &pool.0, &auth_state.0).await {
        return response;
    }

    let query = "UPDATE subscribers SET is_read = TRUE WHERE is_read = FALSE";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    match sqlx::query(query).execute(&pool.0).instrument(span).await {
        Ok(_) => Json(SuccessBody { success: true }).into_response(),
        Err(error) => {
            error!("Failed to mark subscribers read: {}", error);
            internal_error()
        }
    }
}
