use crate::{
    api::handlers::{
        auth, categories, health, messages, orders, overview, products, subscribers,
    },
    api::seed::SeedConfig,
    auth::TokenService,
};
use anyhow::{anyhow, Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, Request,
    },
    routing::{delete, get, post, put},
    Extension, Router,
};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{error, info, info_span, Span};
use ulid::Ulid;
use url::Url;

// Keep these internal to the crate while allowing CLI/server wiring to reference them.
pub(crate) mod handlers;
pub mod seed;

/// Build the API router with all storefront and admin routes registered.
#[must_use]
pub fn router() -> Router {
    Router::new()
        // Public storefront routes
        .route("/api/health", get(health::health).options(health::health))
        .route("/api/products", get(products::list_products))
        .route("/api/products/:id", get(products::get_product))
        .route("/api/categories", get(categories::list_categories))
        .route("/api/orders", post(orders::create_order))
        .route("/api/checkout", post(orders::create_order))
        .route("/api/orders/:id", get(orders::get_order))
        .route("/api/contact", post(messages::create_message))
        .route("/api/newsletter/subscribe", post(subscribers::subscribe))
        // Admin session routes
        .route("/api/admin/login", post(auth::login))
        .route("/api/admin/logout", post(auth::logout))
        .route("/api/admin/reset-password", post(auth::reset_password))
        // Admin management routes, each handler enforces the bearer gate
        .route("/api/admin/overview", get(overview::overview))
        .route(
            "/api/admin/products",
            get(products::admin_list_products).post(products::admin_create_product),
        )
        .route(
            "/api/admin/products/:id",
            put(products::admin_update_product).delete(products::admin_delete_product),
        )
        .route("/api/admin/orders", get(orders::admin_list_orders))
        .route(
            "/api/admin/orders/:id",
            get(orders::admin_get_order)
                .put(orders::admin_update_order)
                .delete(orders::admin_delete_order),
        )
        .route("/api/admin/messages", get(messages::admin_list_messages))
        .route(
            "/api/admin/messages/mark-read",
            post(messages::admin_mark_messages_read),
        )
        .route(
            "/api/admin/messages/:id",
            delete(messages::admin_delete_message),
        )
        .route(
            "/api/admin/subscribers",
            get(subscribers::admin_list_subscribers),
        )
        .route(
            "/api/admin/subscribers/mark-read",
            post(subscribers::admin_mark_subscribers_read),
        )
        .fallback(handlers::not_found)
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(
    port: u16,
    dsn: String,
    token_service: TokenService,
    seed: SeedConfig,
    frontend_origin: Option<String>,
) -> Result<()> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    seed::ensure_seed(&pool, &seed)
        .await
        .context("Failed to seed database")?;

    let auth_state = Arc::new(auth::AuthState::new(token_service));

    let cors = cors_layer(frontend_origin.as_deref())?;

    let app = router()
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(auth_state.clone()))
                .layer(Extension(pool.clone())),
        )
        .layer(Extension(pool));

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", error);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => error!("Failed to install SIGTERM handler: {}", error),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Gracefully shutdown");
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

// When no frontend origin is configured the API answers any origin, which
// suits local development. Production deployments pass --frontend-origin.
fn cors_layer(frontend_origin: Option<&str>) -> Result<CorsLayer> {
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ]);

    match frontend_origin {
        Some(url) => Ok(cors.allow_origin(AllowOrigin::exact(origin_header(url)?))),
        None => Ok(cors.allow_origin(AllowOrigin::any())),
    }
}

fn origin_header(frontend_base_url: &str) -> Result<HeaderValue> {
    let parsed = Url::parse(frontend_base_url)
        .with_context(|| format!("Invalid frontend origin: {frontend_base_url}"))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow!("Frontend origin must include a valid host: {frontend_base_url}"))?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let origin = format!("{}://{}{}", parsed.scheme(), host, port);
    HeaderValue::from_str(&origin).context("Failed to build frontend origin header")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_header_strips_path_and_keeps_port() -> Result<()> {
        let origin = origin_header("https://shop.example.com:8443/admin")?;
        assert_eq!(origin, "https://shop.example.com:8443");
        Ok(())
    }

    #[test]
    fn origin_header_rejects_invalid_url() {
        assert!(origin_header("not a url").is_err());
    }

    #[test]
    fn cors_layer_accepts_missing_origin() {
        assert!(cors_layer(None).is_ok());
    }
}
