//! Product catalog handlers.
//!
//! The public listing joins categories so each product carries the tier of
//! its category; the admin surface exposes full CRUD behind the bearer gate.

use crate::api::handlers::{
    auth::{require_admin, AuthState},
    bad_request, format_timestamp, internal_error, not_found_error,
};
use axum::{
    extract::{Extension, Path, Query},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::{postgres::PgRow, PgPool, Postgres, QueryBuilder, Row};
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{error, info_span, Instrument};
use uuid::Uuid;

const DEFAULT_BRAND: &str = "ASSAIMART";
const DEFAULT_SIZE: &str = "100ml";
const DEFAULT_TIER: &str = "premium";

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub brand: String,
    pub size: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,
    pub category_slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
    pub segment: String,
    pub product_type: String,
    pub featured_home: bool,
    pub bestseller: bool,
    pub image_url: String,
    pub notes: Value,
    pub available: bool,
    pub rating: f64,
    pub rating_media: Value,
    pub created_at: String,
}

/// Query-string filters for the public listing. All optional and combinable.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    pub category: Option<String>,
    pub segment: Option<String>,
    pub tier: Option<String>,
    pub product_type: Option<String>,
    pub featured: Option<bool>,
    pub q: Option<String>,
}

/// Admin create/update payload. Every field is optional; create fills the
/// gaps with storefront defaults and update touches only what is present.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductPayload {
    pub name: Option<String>,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub size: Option<String>,
    pub price: Option<f64>,
    pub original_price: Option<f64>,
    pub category_slug: Option<String>,
    pub segment: Option<String>,
    pub product_type: Option<String>,
    pub featured_home: Option<bool>,
    pub bestseller: Option<bool>,
    pub image_url: Option<String>,
    pub notes: Option<Value>,
    pub available: Option<bool>,
    pub rating: Option<f64>,
    pub rating_media: Option<Value>,
}

fn product_from_row(row: &PgRow, tier: Option<String>) -> Product {
    Product {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        brand: row.get("brand"),
        size: row.get("size"),
        price: row.get("price"),
        original_price: row.get("original_price"),
        category_slug: row.get("category_slug"),
        tier,
        segment: row.get("segment"),
        product_type: row.get("product_type"),
        featured_home: row.get("is_featured"),
        bestseller: row.get("is_bestseller"),
        image_url: row.get("image_url"),
        notes: row.get("notes"),
        available: row.get("stock_status"),
        rating: row.get::<Option<f64>, _>("rating").unwrap_or(0.0),
        rating_media: row.get("rating_media"),
        created_at: format_timestamp(row.get::<OffsetDateTime, _>("created_at")),
    }
}

// axum handler for GET /api/products
pub async fn list_products(
    pool: Extension<PgPool>,
    filter: Option<Query<ProductFilter>>,
) -> Response {
    let Query(filter) = filter.unwrap_or_default();

    let mut builder = QueryBuilder::<Postgres>::new(
        "SELECT p.*, c.tier AS category_tier \
         FROM products p LEFT JOIN categories c ON p.category_slug = c.slug \
         WHERE 1=1",
    );
    if let Some(category) = &filter.category {
        builder.push(" AND p.category_slug = ");
        builder.push_bind(category.clone());
    }
    if let Some(segment) = &filter.segment {
        builder.push(" AND p.segment = ");
        builder.push_bind(segment.clone());
    }
    if let Some(tier) = &filter.tier {
        builder.push(" AND c.tier = ");
        builder.push_bind(tier.clone());
    }
    if let Some(product_type) = &filter.product_type {
        builder.push(" AND p.product_type = ");
        builder.push_bind(product_type.clone());
    }
    if filter.featured == Some(true) {
        builder.push(" AND p.is_featured = TRUE");
    }
    if let Some(term) = &filter.q {
        let pattern = format!("%{term}%");
        builder.push(" AND (p.name ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR p.description ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
    builder.push(" ORDER BY p.created_at DESC");

    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = "SELECT products (filtered)"
    );
    match builder.build().fetch_all(&pool.0).instrument(span).await {
        Ok(rows) => {
            let products: Vec<Product> = rows
                .iter()
                .map(|row| {
                    let tier = row
                        .get::<Option<String>, _>("category_tier")
                        .unwrap_or_else(|| DEFAULT_TIER.to_string());
                    product_from_row(row, Some(tier))
                })
                .collect();
            Json(products).into_response()
        }
        Err(error) => {
            error!("Failed to list products: {}", error);
            internal_error()
        }
    }
}

// axum handler for GET /api/products/:id
pub async fn get_product(pool: Extension<PgPool>, Path(id): Path<String>) -> Response {
    let Ok(id) = Uuid::parse_str(&id) else {
        return not_found_error();
    };

    let query = "SELECT p.*, c.tier AS category_tier \
                 FROM products p LEFT JOIN categories c ON p.category_slug = c.slug \
                 WHERE p.id = $1";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    match sqlx::query(query)
        .bind(id)
        .fetch_optional(&pool.0)
        .instrument(span)
        .await
    {
        Ok(Some(row)) => {
            let tier = row
                .get::<Option<String>, _>("category_tier")
                .unwrap_or_else(|| DEFAULT_TIER.to_string());
            Json(product_from_row(&row, Some(tier))).into_response()
        }
        Ok(None) => not_found_error(),
        Err(error) => {
            error!("Failed to load product: {}", error);
            internal_error()
        }
    }
}

// axum handler for GET /api/admin/products
pub async fn admin_list_products(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Response {
    if let Err(response) = require_admin(&headers, &pool.0, &auth_state.0).await {
        return response;
    }

    let query = "SELECT * FROM products ORDER BY created_at DESC";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    match sqlx::query(query).fetch_all(&pool.0).instrument(span).await {
        Ok(rows) => {
            let products: Vec<Product> =
                rows.iter().map(|row| product_from_row(row, None)).collect();
            Json(products).into_response()
        }
        Err(error) => {
            error!("Failed to list products: {}", error);
            internal_error()
        }
    }
}

// axum handler for POST /api/admin/products
pub async fn admin_create_product(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<ProductPayload>>,
) -> Response {
    if let Err(response) = require_admin(&headers, &pool.0, &auth_state.0).await {
        return response;
    }

    let Some(Json(payload)) = payload else {
        return bad_request("Invalid product payload");
    };

    let Some(name) = payload.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) else {
        return bad_request("Product name is required");
    };

    let id = Uuid::new_v4();
    let query = "INSERT INTO products \
                 (id, name, description, brand, size, price, original_price, category_slug, \
                  segment, product_type, is_featured, is_bestseller, image_url, notes, \
                  stock_status, rating, rating_media) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(id)
        .bind(name)
        .bind(payload.description.unwrap_or_default())
        .bind(payload.brand.unwrap_or_else(|| DEFAULT_BRAND.to_string()))
        .bind(payload.size.unwrap_or_else(|| DEFAULT_SIZE.to_string()))
        .bind(payload.price.unwrap_or(0.0))
        .bind(payload.original_price)
        .bind(
            payload
                .category_slug
                .unwrap_or_else(|| DEFAULT_TIER.to_string()),
        )
        .bind(payload.segment.unwrap_or_else(|| "unisex".to_string()))
        .bind(
            payload
                .product_type
                .unwrap_or_else(|| "Perfume".to_string()),
        )
        .bind(payload.featured_home.unwrap_or(false))
        .bind(payload.bestseller.unwrap_or(false))
        .bind(payload.image_url.unwrap_or_default())
        .bind(payload.notes.unwrap_or_else(|| json!({})))
        .bind(payload.available.unwrap_or(true))
        .bind(payload.rating.unwrap_or(0.0))
        .bind(payload.rating_media.unwrap_or_else(|| json!([])))
        .execute(&pool.0)
        .instrument(span)
        .await;

    if let Err(error) = result {
        error!("Failed to create product: {}", error);
        return internal_error();
    }

    match load_product(&pool.0, id).await {
        Ok(Some(product)) => (StatusCode::CREATED, Json(product)).into_response(),
        Ok(None) => internal_error(),
        Err(error) => {
            error!("Failed to load created product: {}", error);
            internal_error()
        }
    }
}

// axum handler for PUT /api/admin/products/:id
pub async fn admin_update_product(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Path(id): Path<String>,
    payload: Option<Json<ProductPayload>>,
) -> Response {
    if let Err(response) = require_admin(&headers, &pool.0, &auth_state.0).await {
        return response;
    }

    let Ok(id) = Uuid::parse_str(&id) else {
        return not_found_error();
    };
    let Some(Json(payload)) = payload else {
        return bad_request("Invalid product payload");
    };

    let mut builder = QueryBuilder::<Postgres>::new("UPDATE products SET ");
    let mut touched = false;
    {
        let mut fields = builder.separated(", ");
        macro_rules! set_field {
            ($column:literal, $value:expr) => {
                if let Some(value) = $value {
                    fields.push(concat!($column, " = "));
                    fields.push_bind_unseparated(value);
                    touched = true;
                }
            };
        }
        set_field!("name", payload.name);
        set_field!("description", payload.description);
        set_field!("brand", payload.brand);
        set_field!("size", payload.size);
        set_field!("price", payload.price);
        set_field!("original_price", payload.original_price);
        set_field!("category_slug", payload.category_slug);
        set_field!("segment", payload.segment);
        set_field!("product_type", payload.product_type);
        set_field!("is_featured", payload.featured_home);
        set_field!("is_bestseller", payload.bestseller);
        set_field!("image_url", payload.image_url);
        set_field!("notes", payload.notes);
        set_field!("stock_status", payload.available);
        set_field!("rating", payload.rating);
        set_field!("rating_media", payload.rating_media);
    }

    if !touched {
        return Json(json!({ "message": "Nothing to update" })).into_response();
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = "UPDATE products (partial)"
    );
    match builder.build().execute(&pool.0).instrument(span).await {
        Ok(result) if result.rows_affected() == 0 => not_found_error(),
        Ok(_) => match load_product(&pool.0, id).await {
            Ok(Some(product)) => Json(product).into_response(),
            Ok(None) => not_found_error(),
            Err(error) => {
                error!("Failed to load updated product: {}", error);
                internal_error()
            }
        },
        Err(error) => {
            error!("Failed to update product: {}", error);
            internal_error()
        }
    }
}

// axum handler for DELETE /api/admin/products/:id
pub async fn admin_delete_product(
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

    let query = "DELETE FROM products WHERE id = $1";
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
            error!("Failed to delete product: {}", error);
            internal_error()
        }
    }
}

async fn load_product(pool: &PgPool, id: Uuid) -> Result<Option<Product>, sqlx::Error> {
    let query = "SELECT * FROM products WHERE id = $1";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(span)
        .await?;
    Ok(row.map(|row| product_from_row(&row, None)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_deserializes_camel_case() {
        let filter: ProductFilter =
            serde_json::from_str(r#"{"productType":"Perfume","featured":true}"#).unwrap();
        assert_eq!(filter.product_type.as_deref(), Some("Perfume"));
        assert_eq!(filter.featured, Some(true));
        assert!(filter.category.is_none());
    }

    #[test]
    fn payload_tolerates_missing_fields() {
        let payload: ProductPayload = serde_json::from_str(r#"{"name":"Oud Royale"}"#).unwrap();
        assert_eq!(payload.name.as_deref(), Some("Oud Royale"));
        assert!(payload.price.is_none());
        assert!(payload.notes.is_none());
    }

    #[test]
    fn product_serializes_camel_case() {
        let product = Product {
            id: Uuid::nil(),
            name: "Oud Royale".to_string(),
            description: String::new(),
            brand: DEFAULT_BRAND.to_string(),
            size: DEFAULT_SIZE.to_string(),
            price: 120.0,
            original_price: None,
            category_slug: Some("premium".to_string()),
            tier: Some("premium".to_string()),
            segment: "unisex".to_string(),
            product_type: "Perfume".to_string(),
            featured_home: true,
            bestseller: false,
            image_url: String::new(),
            notes: json!({}),
            available: true,
            rating: 4.5,
            rating_media: json!([]),
            created_at: "2026-01-01T00:00:00Z".to_string(),
        };
        let value = serde_json::to_value(&product).unwrap();
        assert_eq!(value["categorySlug"], "premium");
        assert_eq!(value["featuredHome"], true);
        assert_eq!(value["imageUrl"], "");
        assert!(value.get("originalPrice").is_none());
    }
}
