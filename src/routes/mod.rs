use crate::config::rate_limit::{RateLimitConfig, RateLimitRule};
use crate::handlers;
use crate::middleware::auth::auth_middleware;
use axum::{middleware, routing, Router};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

pub fn create_routes() -> Router {
    Router::new().nest("/api/v1", api_routes())
}

fn api_routes() -> Router {
    let rate_limit_config = RateLimitConfig::from_env();

    let verify = verification_routes(&rate_limit_config);
    let public_read = public_read_routes(&rate_limit_config);
    let protected =
        protected_routes(&rate_limit_config).layer(middleware::from_fn(auth_middleware));

    verify.merge(public_read).merge(protected)
}

/// Email verification: code issuance, checking and status.
fn verification_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route(
            "/verification/request",
            routing::post(handlers::verification::request_code),
        )
        .route(
            "/verification/verify",
            routing::post(handlers::verification::verify_code),
        )
        .route(
            "/verification/status",
            routing::get(handlers::verification::verification_status),
        );

    with_optional_rate_limit(router, config.enabled, config.verify)
}

/// Public read routes: listing browse and detail, public profiles.
fn public_read_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route("/listings", routing::get(handlers::listing::list_listings))
        .route("/listings/{id}", routing::get(handlers::listing::get_listing))
        .route(
            "/users/{id}",
            routing::get(handlers::user::get_user_profile),
        );

    with_optional_rate_limit(router, config.enabled, config.public_read)
}

/// Protected routes: everything acting as the signed-in identity.
fn protected_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Account
        .route("/auth/sign-up", routing::post(handlers::auth::sign_up))
        .route(
            "/users/me",
            routing::get(handlers::user::get_me)
                .put(handlers::user::update_me)
                .delete(handlers::user::delete_me),
        )
        // Listings
        .route("/listings", routing::post(handlers::listing::create_listing))
        .route(
            "/listings/{id}",
            routing::put(handlers::listing::update_listing)
                .delete(handlers::listing::delete_listing),
        )
        .route(
            "/users/me/listings",
            routing::get(handlers::listing::my_listings),
        )
        // Saved
        .route(
            "/listings/{id}/save",
            routing::post(handlers::saved::toggle_save)
                .put(handlers::saved::save_listing)
                .delete(handlers::saved::unsave_listing)
                .get(handlers::saved::save_state),
        )
        .route("/users/me/saved", routing::get(handlers::saved::list_saved));

    with_optional_rate_limit(router, config.enabled, config.protected)
}

fn with_optional_rate_limit(router: Router, enabled: bool, rule: RateLimitRule) -> Router {
    if !enabled {
        return router;
    }

    let governor_conf = GovernorConfigBuilder::default()
        .per_second(rule.per_second)
        .burst_size(rule.burst_size)
        .finish()
        .expect("Invalid rate limit configuration");

    router.layer(GovernorLayer::new(governor_conf))
}
