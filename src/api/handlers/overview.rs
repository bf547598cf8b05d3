use crate::api::handlers::{
    auth::{require_admin, AuthState},
    internal_error,
};
use axum::{
    extract::Extension,
    http::HeaderMap,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use std::sync::Arc;
use tracing::{error, info_span, Instrument};

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_products: i64,
    pub total_orders: i64,
    pub new_orders: i64,
    pub unread_messages: i64,
    pub unread_subscribers: i64,
}

// axum handler for GET /api/admin/overview
pub async fn overview(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Response {
    if let Err(response) = require_admin(&headers, &pool.0, &auth_state.0).await {
        return response;
    }

    // Unread messages are counted per sender so one chatty visitor does not
    // inflate the dashboard badge.
    let query = "SELECT \
                 (SELECT COUNT(*) FROM products) AS total_products, \
                 (SELECT COUNT(*) FROM orders) AS total_orders, \
                 (SELECT COUNT(*) FROM orders WHERE status = 'processing') AS new_orders, \
                 (SELECT COUNT(DISTINCT email) FROM messages WHERE is_read = FALSE) AS unread_messages, \
                 (SELECT COUNT(*) FROM subscribers WHERE is_read = FALSE) AS unread_subscribers";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    match sqlx::query(query).fetch_one(&pool.0).instrument(span).await {
        Ok(row) => Json(Overview {
            total_products: row.get("total_products"),
            total_orders: row.get("total_orders"),
            new_orders: row.get("new_orders"),
            unread_messages: row.get("unread_messages"),
            unread_subscribers: row.get("unread_subscribers"),
        })
        .into_response(),
        Err(error) => {
            error!("Failed to load overview counts: {}", error);
            internal_error()
        }
    }
}
