//! First-boot seeding for categories and the initial admin account.
//!
//! Seeding runs inside a single transaction holding an advisory lock, so
//! several replicas starting against the same database insert the defaults
//! exactly once. Existing rows are never touched.

use crate::auth::hash_password;
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use sqlx::{PgPool, Row};
use tracing::{info, info_span, warn, Instrument};

const SEED_LOCK_ID: i64 = 7_412_030;

/// Category rows inserted on an empty database: (name, slug, tier).
const DEFAULT_CATEGORIES: &[(&str, &str, &str)] = &[
    ("Premium Perfumes", "premium", "premium"),
    ("Medium Range Perfumes", "medium", "medium"),
    ("Basic / Budget Perfumes", "basic", "basic"),
    ("Men", "men", "segment-men"),
    ("Women", "women", "segment-women"),
    ("Unisex", "unisex", "segment-unisex"),
];

/// Optional bootstrap credentials for the first admin account. When unset
/// and the admin table is empty, the server starts with no way to log in
/// until an account is created out of band.
#[derive(Debug)]
pub struct SeedConfig {
    pub admin_email: Option<String>,
    pub admin_password: Option<SecretString>,
}

/// Insert default categories and the bootstrap admin when their tables are
/// empty.
///
/// # Errors
/// Returns an error if any seeding query fails.
pub async fn ensure_seed(pool: &PgPool, config: &SeedConfig) -> Result<()> {
    let mut tx = pool
        .begin()
        .await
        .context("failed to begin seed transaction")?;

    let lock_query = "SELECT pg_advisory_xact_lock($1)";
    let lock_span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = lock_query
    );
    sqlx::query(lock_query)
        .bind(SEED_LOCK_ID)
        .execute(&mut *tx)
        .instrument(lock_span)
        .await
        .context("failed to acquire seed lock")?;

    let category_count: i64 = {
        let query = "SELECT COUNT(*) AS count FROM categories";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        sqlx::query(query)
            .fetch_one(&mut *tx)
            .instrument(span)
            .await
            .context("failed to count categories")?
            .get("count")
    };

    if category_count == 0 {
        let query = "INSERT INTO categories (name, slug, tier) VALUES ($1, $2, $3)";
        for (name, slug, tier) in DEFAULT_CATEGORIES {
            let span = info_span!(
                "db.query",
                db.system = "postgresql",
                db.operation = "INSERT",
                db.statement = query
            );
            sqlx::query(query)
                .bind(name)
                .bind(slug)
                .bind(tier)
                .execute(&mut *tx)
                .instrument(span)
                .await
                .context("failed to insert default category")?;
        }
        info!(count = DEFAULT_CATEGORIES.len(), "Seeded default categories");
    }

    let admin_count: i64 = {
        let query = "SELECT COUNT(*) AS count FROM admin_users";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        sqlx::query(query)
            .fetch_one(&mut *tx)
            .instrument(span)
            .await
            .context("failed to count admin users")?
            .get("count")
    };

    if admin_count == 0 {
        match (&config.admin_email, &config.admin_password) {
            (Some(email), Some(password)) => {
                let password_hash = hash_password(password.expose_secret());
                let query =
                    "INSERT INTO admin_users (email, password_hash, name) VALUES ($1, $2, $3)";
                let span = info_span!(
                    "db.query",
                    db.system = "postgresql",
                    db.operation = "INSERT",
                    db.statement = query
                );
                sqlx::query(query)
                    .bind(email.trim().to_lowercase())
                    .bind(password_hash)
                    .bind("Administrator")
                    .execute(&mut *tx)
                    .instrument(span)
                    .await
                    .context("failed to insert bootstrap admin")?;
                info!("Seeded bootstrap admin account");
            }
            _ => {
                warn!(
                    "admin_users is empty and no seed credentials are configured; \
                     admin login is impossible until an account is created"
                );
            }
        }
    }

    tx.commit().await.context("failed to commit seed transaction")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_categories_have_unique_slugs() {
        let mut slugs: Vec<&str> = DEFAULT_CATEGORIES.iter().map(|(_, slug, _)| *slug).collect();
        slugs.sort_unstable();
        slugs.dedup();
        assert_eq!(slugs.len(), DEFAULT_CATEGORIES.len());
    }

    #[test]
    fn seed_config_debug_redacts_password() {
        let config = SeedConfig {
            admin_email: Some("admin@example.com".to_string()),
            admin_password: Some(SecretString::from("hunter22".to_string())),
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter22"));
    }
}
