use axum::{extract::Extension, middleware, response::IntoResponse, routing::get, Json, Router};
use burrow::{
    config::{self, identity::IdentityConfig},
    migration, routes,
    services::{cache::CacheService, email::EmailService},
    utils::identity::init_identity_config,
};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use serde_json::json;
use std::env;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        // Verification
        burrow::handlers::verification::request_code,
        burrow::handlers::verification::verify_code,
        burrow::handlers::verification::verification_status,
        // Account
        burrow::handlers::auth::sign_up,
        burrow::handlers::user::get_user_profile,
        burrow::handlers::user::get_me,
        burrow::handlers::user::update_me,
        burrow::handlers::user::delete_me,
        // Listings
        burrow::handlers::listing::list_listings,
        burrow::handlers::listing::get_listing,
        burrow::handlers::listing::create_listing,
        burrow::handlers::listing::update_listing,
        burrow::handlers::listing::delete_listing,
        burrow::handlers::listing::my_listings,
        // Saved
        burrow::handlers::saved::toggle_save,
        burrow::handlers::saved::save_listing,
        burrow::handlers::saved::unsave_listing,
        burrow::handlers::saved::save_state,
        burrow::handlers::saved::list_saved,
    ),
    components(
        schemas(
            burrow::response::ApiResponse<serde_json::Value>,
            burrow::response::PaginatedResponse<serde_json::Value>,
            burrow::response::CursorPage<serde_json::Value>,
            burrow::response::PaginationQuery,
            burrow::error::AppError,
            burrow::models::PropertyType,
            burrow::models::Location,
            burrow::models::RoomType,
            burrow::models::ApartmentType,
            burrow::models::ListingModel,
            burrow::services::listing::ListingDetails,
            burrow::services::listing::ApartmentInfo,
            burrow::services::listing::HouseInfo,
            burrow::services::listing::ListingWithDetails,
            burrow::services::listing::NewListing,
            burrow::services::listing::ListingPatch,
            burrow::services::user::SignUp,
            burrow::services::user::ProfilePatch,
            burrow::handlers::user::PublicProfileResponse,
            burrow::handlers::user::AccountResponse,
            burrow::handlers::saved::SaveStateResponse,
            burrow::handlers::verification::RequestCodeRequest,
            burrow::handlers::verification::RequestCodeResponse,
            burrow::handlers::verification::VerifyCodeRequest,
            burrow::handlers::verification::VerifyCodeResponse,
            burrow::handlers::verification::VerificationStatusResponse,
        )
    ),
    modifiers(&IdentityTokenAddon),
    tags(
        (name = "verification", description = "Email verification codes"),
        (name = "auth", description = "Account creation"),
        (name = "users", description = "User profile operations"),
        (name = "listings", description = "Listing browse and management"),
        (name = "saved", description = "Saved listings"),
    )
)]
struct ApiDoc;

struct IdentityTokenAddon;

impl Modify for IdentityTokenAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "identity_token",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    burrow::init_tracing("burrow=debug,tower_http=debug,axum=debug");

    // Validate configuration before doing anything else
    let identity_config = validate_config()?;
    init_identity_config(identity_config)?;
    let verification = config::verification::VerificationConfig::global();
    tracing::debug!(?verification, "verification settings loaded");

    tracing::info!("Starting Burrow API v{}...", env!("CARGO_PKG_VERSION"));

    let db = config::database::get_database().await?;
    tracing::info!("Database connected successfully");

    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    // Redis/Cache is optional - graceful degradation if unavailable
    let cache = match config::redis::get_redis().await {
        Ok(conn) => {
            tracing::info!("Redis connected successfully");
            Some(CacheService::new(conn))
        }
        Err(e) => {
            tracing::warn!("Redis unavailable, running without cache: {}", e);
            None
        }
    };

    let email_service = EmailService::from_env();
    if email_service.is_configured() {
        tracing::info!("SMTP email service configured");
    } else {
        tracing::warn!("SMTP not configured, verification emails will be skipped");
    }

    let mut app = create_app()
        .layer(Extension(db))
        .layer(Extension(email_service));

    if let Some(cache) = cache {
        app = app.layer(Extension(cache));
    }

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Validate all required configuration at startup (fail-fast).
fn validate_config() -> anyhow::Result<IdentityConfig> {
    let identity_config = IdentityConfig::from_env()?;

    // DATABASE_URL — checked here for early error; actual connection happens later
    if env::var("DATABASE_URL").is_err() {
        return Err(anyhow::anyhow!(
            "DATABASE_URL environment variable must be set"
        ));
    }

    Ok(identity_config)
}

fn build_cors_layer() -> CorsLayer {
    use axum::http::{header, HeaderValue, Method};

    let origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins_str == "*" {
        cors.allow_origin(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = origins_str
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

fn create_app() -> Router {
    Router::new()
        .route("/", get(health_check))
        .merge(routes::create_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(
            burrow::middleware::security::security_headers_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Health check successful", body = serde_json::Value)
    )
)]
async fn health_check(Extension(db): Extension<DatabaseConnection>) -> impl IntoResponse {
    let db_ok = db
        .query_one(Statement::from_string(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT 1".to_string(),
        ))
        .await
        .is_ok();

    let status = if db_ok { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "service": "Burrow API",
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_ok,
    }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install CTRL+C signal handler: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, gracefully shutting down...");
}
