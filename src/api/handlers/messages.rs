use crate::api::handlers::{
    auth::{require_admin, AuthState},
    bad_request, format_timestamp, internal_error, not_found_error, valid_email, SuccessBody,
};
use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{PgPool, Row};
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{error, info_span, Instrument};
use uuid::Uuid;

#[derive(Deserialize, Debug)]
pub struct ContactRequest {
    name: String,
    email: String,
    subject: String,
    message: String,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub read: bool,
    pub created_at: String,
}

// axum handler for POST /api/contact
pub async fn create_message(
    pool: Extension<PgPool>,
    payload: Option<Json<ContactRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return bad_request("Missing contact information");
    };

    let name = request.name.trim();
    let email = request.email.trim();
    let subject = request.subject.trim();
    let message = request.message.trim();
    if name.is_empty() || subject.is_empty() || message.is_empty() || !valid_email(email) {
        return bad_request("Missing contact information");
    }

    let query = "INSERT INTO messages (name, email, subject, message) VALUES ($1, $2, $3, $4)";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    match sqlx::query(query)
        .bind(name)
        .bind(email)
        .bind(subject)
        .bind(message)
        .execute(&pool.0)
        .instrument(span)
        .await
    {
        Ok(_) => (StatusCode::CREATED, Json(SuccessBody { success: true })).into_response(),
        Err(error) => {
            error!("Failed to store contact message: {}", error);
            internal_error()
        }
    }
}

// axum handler for GET /api/admin/messages
pub async fn admin_list_messages(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Response {
    if let Err(response) = require_admin(&headers, &pool.0, &auth_state.0).await {
        return response;
    }

    let query = "SELECT id, name, email, subject, message, is_read, created_at \
                 FROM messages ORDER BY created_at DESC";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    match sqlx::query(query).fetch_all(&pool.0).instrument(span).await {
        Ok(rows) => {
            let messages: Vec<Message> = rows
                .iter()
                .map(|row| Message {
                    id: row.get("id"),
                    name: row.get("name"),
                    email: row.get("email"),
                    subject: row.get("subject"),
                    message: row.get("message"),
                    read: row.get("is_read"),
                    created_at: format_timestamp(row.get::<OffsetDateTime, _>("created_at")),
                })
                .collect();
            Json(messages).into_response()
        }
        Err(error) => {
            error!("Failed to list messages: {}", error);
            internal_error()
        }
    }
}

// axum handler for POST /api/admin/messages/mark-read
pub async fn admin_mark_messages_read(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Response {
    if let Err(response) = require_admin(&headers, &pool.0, &auth_state.0).await {
        return response;
    }

    let query = "UPDATE messages SET is_read = TRUE WHERE is_read = FALSE";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    match sqlx::query(query).execute(&pool.0).instrument(span).await {
        Ok(_) => Json(SuccessBody { success: true }).into_response(),
        Err(error) => {
            error!("Failed to mark messages read: {}", error);
            internal_error()
        }
    }
}

// axum handler for DELETE /api/admin/messages/:id
pub async fn admin_delete_message(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = require_admin(&headers, &pool.0, &auth_state.0).await {
        return response;
    }

    let Ok(id) = Uuid::parse_str(&id) else {
        return not_found_error();
    };

    let query = "DELETE FROM messages WHERE id = $1";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    match sqlx::query(query)
        .bind(id)
        .execute(&pool.0)
        .instrument(span)
        .await
    {
        Ok(result) if result.rows_affected() == 0 => not_found_error(),
        Ok(_) => Json(json!({ "id": id })).into_response(),
        Err(error) => {
            error!("Failed to delete message: {}", error);
            internal_error()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_serializes_camel_case() {
        let message = Message {
            id: Uuid::nil(),
            name: "A".to_string(),
            email: "a@example.com".to_string(),
            subject: "Hi".to_string(),
            message: "Hello".to_string(),
            read: false,
            created_at: "2026-01-01T00:00:00Z".to_string(),
        };
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["read"], false);
        assert_eq!(value["createdAt"], "2026-01-01T00:00:00Z");
    }
}
