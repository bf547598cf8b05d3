//! Order intake and fulfilment handlers.
//!
//! Checkout inserts the order header and every line item inside a single
//! transaction, so a failed item insert never leaves a headless order
//! behind.

use crate::api::handlers::{
    auth::{require_admin, AuthState},
    bad_request, format_timestamp, internal_error, not_found_error,
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
pub struct CheckoutRequest {
    items: Option<Vec<CheckoutItem>>,
    customer: Option<CustomerPayload>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
    product_id: Option<Uuid>,
    name: String,
    quantity: i32,
    price: f64,
    #[serde(alias = "image")]
    image_url: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CustomerPayload {
    name: String,
    email: Option<String>,
    phone: String,
    address: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Customer {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub quantity: i32,
    pub price: f64,
    pub image_url: String,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub customer: Customer,
    pub status: String,
    pub created_at: String,
    pub items: Vec<OrderItem>,
}

#[derive(Deserialize, Debug)]
pub struct StatusUpdate {
    status: String,
}

// axum handler for POST /api/orders and POST /api/checkout
pub async fn create_order(
    pool: Extension<PgPool>,
    payload: Option<Json<CheckoutRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return bad_request("Missing order information");
    };

    let items = request.items.unwrap_or_default();
    let Some(customer) = request.customer else {
        return bad_request("Missing order information");
    };

    let name = customer.name.trim();
    let phone = customer.phone.trim();
    let address = customer.address.trim();
    if items.is_empty() || name.is_empty() || phone.is_empty() || address.is_empty() {
        return bad_request("Missing order information");
    }

    let mut tx = match pool.0.begin().await {
        Ok(tx) => tx,
        Err(error) => {
            error!("Failed to begin order transaction: {}", error);
            return internal_error();
        }
    };

    let order_id = Uuid::new_v4();
    let order_query = "INSERT INTO orders \
                       (id, customer_name, customer_email, customer_phone, customer_address) \
                       VALUES ($1, $2, $3, $4, $5)";
    let order_span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = order_query
    );
    if let Err(error) = sqlx::query(order_query)
        .bind(order_id)
        .bind(name)
        .bind(customer.email.as_deref().unwrap_or("").trim())
        .bind(phone)
        .bind(address)
        .execute(&mut *tx)
        .instrument(order_span)
        .await
    {
        error!("Failed to insert order: {}", error);
        return internal_error();
    }

    let item_query = "INSERT INTO order_items \
                      (order_id, product_id, product_name, quantity, price, image_url) \
                      VALUES ($1, $2, $3, $4, $5, $6)";
    for item in &items {
        let item_span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = item_query
        );
        if let Err(error) = sqlx::query(item_query)
            .bind(order_id)
            .bind(item.product_id)
            .bind(&item.name)
            .bind(item.quantity)
            .bind(item.price)
            .bind(item.image_url.as_deref().unwrap_or(""))
            .execute(&mut *tx)
            .instrument(item_span)
            .await
        {
            error!("Failed to insert order item: {}", error);
            return internal_error();
        }
    }

    if let Err(error) = tx.commit().await {
        error!("Failed to commit order transaction: {}", error);
        return internal_error();
    }

    (StatusCode::CREATED, Json(json!({ "orderId": order_id }))).into_response()
}

// axum handler for GET /api/orders/:id
pub async fn get_order(pool: Extension<PgPool>, Path(id): Path<String>) -> Response {
    let Ok(id) = Uuid::parse_str(&id) else {
        return not_found_error();
    };

    match load_order(&pool.0, id).await {
        Ok(Some(order)) => Json(order).into_response(),
        Ok(None) => not_found_error(),
        Err(error) => {
            error!("Failed to load order: {}", error);
            internal_error()
        }
    }
}

// axum handler for GET /api/admin/orders
pub async fn admin_list_orders(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Response {
    if let Err(response) = require_admin(&headers, &pool.0, &auth_state.0).await {
        return response;
    }

    let query = "SELECT id FROM orders ORDER BY created_at DESC";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = match sqlx::query(query).fetch_all(&pool.0).instrument(span).await {
        Ok(rows) => rows,
        Err(error) => {
            error!("Failed to list orders: {}", error);
            return internal_error();
        }
    };

    let mut orders = Vec::with_capacity(rows.len());
    for row in rows {
        let id: Uuid = row.get("id");
        match load_order(&pool.0, id).await {
            Ok(Some(order)) => orders.push(order),
            Ok(None) => {}
            Err(error) => {
                error!("Failed to load order: {}", error);
                return internal_error();
            }
        }
    }

    Json(orders).into_response()
}

// axum handler for GET /api/admin/orders/:id
pub async fn admin_get_order(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = require_admin(&headers, &pool.0, &auth_state.0).await {
        return response;
    }

    get_order(pool, Path(id)).await
}

// axum handler for PUT /api/admin/orders/:id
pub async fn admin_update_order(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Path(id): Path<String>,
    payload: Option<Json<StatusUpdate>>,
) -> Response {
    if let Err(response) = require_admin(&headers, &pool.0, &auth_state.0).await {
        return response;
    }

    let Ok(id) = Uuid::parse_str(&id) else {
        return not_found_error();
    };
    let Some(Json(update)) = payload else {
        return bad_request("Missing status");
    };

    let query = "UPDATE orders SET status = $1 WHERE id = $2";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    match sqlx::query(query)
        .bind(&update.status)
        .bind(id)
        .execute(&pool.0)
        .instrument(span)
        .await
    {
        Ok(result) if result.rows_affected() == 0 => not_found_error(),
        Ok(_) => Json(json!({ "id": id, "status": update.status })).into_response(),
        Err(error) => {
            error!("Failed to update order status: {}", error);
            internal_error()
        }
    }
}

// axum handler for DELETE /api/admin/orders/:id
pub async fn admin_delete_order(
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

    // Line items cascade with the order row.
    let query = "DELETE FROM orders WHERE id = $1";
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
            error!("Failed to delete order: {}", error);
            internal_error()
        }
    }
}

async fn load_order(pool: &PgPool, id: Uuid) -> Result<Option<Order>, sqlx::Error> {
    let order_query = "SELECT * FROM orders WHERE id = $1";
    let order_span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = order_query
    );
    let Some(row) = sqlx::query(order_query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(order_span)
        .await?
    else {
        return Ok(None);
    };

    let items_query = "SELECT product_id, product_name, quantity, price, image_url \
                       FROM order_items WHERE order_id = $1 ORDER BY id";
    let items_span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = items_query
    );
    let items = sqlx::query(items_query)
        .bind(id)
        .fetch_all(pool)
        .instrument(items_span)
        .await?
        .iter()
        .map(|item| OrderItem {
            product_id: item.get("product_id"),
            product_name: item.get("product_name"),
            quantity: item.get("quantity"),
            price: item.get("price"),
            image_url: item.get("image_url"),
        })
        .collect();

    Ok(Some(Order {
        id: row.get("id"),
        customer: Customer {
            name: row.get("customer_name"),
            email: row.get("customer_email"),
            phone: row.get("customer_phone"),
            address: row.get("customer_address"),
        },
        status: row.get("status"),
        created_at: format_timestamp(row.get::<OffsetDateTime, _>("created_at")),
        items,
    }))
}
