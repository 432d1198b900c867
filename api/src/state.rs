use sqlx::PgPool;

use crate::pipeline::AdvicePipeline;

/// Lifetime of an issued session token.
pub fn session_ttl_from_env() -> chrono::Duration {
    let secs = std::env::var("SESSION_TTL_SECS")
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(3600);
    chrono::Duration::seconds(secs)
}

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub pipeline: AdvicePipeline,
    pub session_ttl: chrono::Duration,
}
