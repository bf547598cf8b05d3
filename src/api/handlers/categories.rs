use crate::api::handlers::{format_timestamp, internal_error};
use axum::{
    extract::Extension,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use time::OffsetDateTime;
use tracing::{error, info_span, Instrument};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub tier: String,
    pub created_at: String,
}

// axum handler for GET /api/categories
pub async fn list_categories(pool: Extension<PgPool>) -> Response {
    let query = "SELECT id, name, slug, tier, created_at FROM categories ORDER BY created_at";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    match sqlx::query(query).fetch_all(&pool.0).instrument(span).await {
        Ok(rows) => {
            let categories: Vec<Category> = rows
                .iter()
                .map(|row| Category {
                    id: row.get("id"),
                    name: row.get("name"),
                    slug: row.get("slug"),
                    tier: row.get("tier"),
                    created_at: format_timestamp(row.get::<OffsetDateTime, _>("created_at")),
                })
                .collect();
            Json(categories).into_response()
        }
        Err(error) => {
            error!("Failed to list categories: {}", error);
            internal_error()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_serializes_camel_case() {
        let category = Category {
            id: Uuid::nil(),
            name: "Premium Perfumes".to_string(),
            slug: "premium".to_string(),
            tier: "premium".to_string(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
        };
        let value = serde_json::to_value(&category).unwrap();
        assert_eq!(value["slug"], "premium");
        assert_eq!(value["createdAt"], "2026-01-01T00:00:00Z");
    }
}
