use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use domain::services::{Clock, LogNotifier, Notifier, SystemClock};
use shared::jwt::JwtConfig;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{metrics_middleware, trace_id};
use crate::routes::{circles, health, memberships, rides, users};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtConfig>,
    pub clock: Arc<dyn Clock>,
    pub notifier: Arc<dyn Notifier>,
}

pub fn create_app(config: Config, pool: PgPool) -> Router {
    let jwt = Arc::new(JwtConfig::new(
        &config.jwt.secret,
        config.jwt.access_token_expiry_secs,
        config.jwt.leeway_secs,
    ));
    create_app_with(config, pool, jwt, Arc::new(SystemClock), Arc::new(LogNotifier))
}

/// Router constructor with injectable clock and notifier, for tests.
pub fn create_app_with(
    config: Config,
    pool: PgPool,
    jwt: Arc<JwtConfig>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
) -> Router {
    let config = Arc::new(config);

    let state = AppState {
        pool,
        config: config.clone(),
        jwt,
        clock,
        notifier,
    };

    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Authorization happens inside the handlers: every protected route pulls
    // the caller out of the Bearer token with the UserAuth extractor and then
    // checks membership or ownership facts.
    let api_routes = Router::new()
        .route("/api/users/signup", post(users::signup))
        .route("/api/users/login", post(users::login))
        .route("/api/users/:username", get(users::get_user))
        .route(
            "/api/circles",
            post(circles::create_circle).get(circles::list_circles),
        )
        .route(
            "/api/circles/:slug",
            get(circles::get_circle).patch(circles::update_circle),
        )
        .route(
            "/api/circles/:slug/members",
            get(memberships::list_members).post(memberships::join_circle),
        )
        .route(
            "/api/circles/:slug/members/:username",
            get(memberships::get_member).delete(memberships::remove_member),
        )
        .route(
            "/api/circles/:slug/members/:username/invitations",
            get(memberships::invitation_pool),
        )
        .route(
            "/api/circles/:slug/rides",
            post(rides::create_ride).get(rides::list_rides),
        )
        .route(
            "/api/circles/:slug/rides/:ride_id",
            get(rides::get_ride).patch(rides::update_ride),
        )
        .route("/api/circles/:slug/rides/:ride_id/join", post(rides::join_ride))
        .route(
            "/api/circles/:slug/rides/:ride_id/finish",
            post(rides::finish_ride),
        )
        .route("/api/circles/:slug/rides/:ride_id/rate", post(rides::rate_ride));

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
