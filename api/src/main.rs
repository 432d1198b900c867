use std::net::SocketAddr;

use axum::Router;
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod advice_cache;
mod advisor;
mod auth;
mod error;
mod middleware;
mod pipeline;
mod routes;
mod state;
mod weather;

use advice_cache::AdviceCache;
use advisor::AdviceService;
use pipeline::AdvicePipeline;
use weather::WeatherService;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "SunnyDays API",
        version = "1.0.0",
        description = "Weather-aware activity recommendation backend."
    ),
    paths(
        routes::health::health_check,
        routes::auth::signup,
        routes::auth::login,
        routes::auth::logout,
        routes::auth::me,
        routes::activities::list_activities,
        routes::activities::create_activity,
        routes::activities::update_activity,
        routes::activities::delete_activity,
        routes::advice::weather_advice,
    ),
    components(schemas(
        HealthResponse,
        sunnydays_core::error::ApiError,
        sunnydays_core::advice::Advice,
        pipeline::AdviceSource,
        routes::auth::SignupRequest,
        routes::auth::LoginRequest,
        routes::auth::TokenResponse,
        routes::auth::MessageResponse,
        routes::auth::UserResponse,
        routes::activities::ActivityRequest,
        routes::activities::ActivityResponse,
        routes::advice::WeatherAdviceRequest,
        routes::advice::WeatherAdviceResponse,
    )),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            utoipa::openapi::security::SecurityScheme::Http(
                utoipa::openapi::security::Http::new(
                    utoipa::openapi::security::HttpAuthScheme::Bearer,
                ),
            ),
        );
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub version: String,
}

#[tokio::main]
async fn main() {
    // Load .env if present (dev only)
    let _ = dotenvy::dotenv();

    // Structured JSON logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sunnydays_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    // Database connection
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(&database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    sqlx::migrate!("../migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    // Provider handles are constructed once and shared across requests
    let weather = WeatherService::from_env();
    let advisor = AdviceService::from_env();
    let cache = AdviceCache::new(pool.clone());
    let pipeline = AdvicePipeline::new(cache, weather, advisor);

    let app_state = state::AppState {
        db: pool,
        pipeline,
        session_ttl: state::session_ttl_from_env(),
    };

    // CORS
    let cors_layer = middleware::cors::build_cors_layer();

    // Router with per-endpoint rate limiting on auth routes
    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .merge(routes::health::router())
        .merge(routes::auth::signup_router().layer(middleware::rate_limit::signup_layer()))
        .merge(routes::auth::login_router().layer(middleware::rate_limit::login_layer()))
        .merge(routes::auth::session_router())
        .merge(routes::activities::router())
        .merge(routes::advice::router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer),
        )
        .with_state(app_state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("SunnyDays API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}
