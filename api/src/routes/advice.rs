use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sunnydays_core::advice::Advice;

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::pipeline::AdviceSource;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/v1/weather-advice", post(weather_advice))
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct WeatherAdviceRequest {
    pub date: DateTime<Utc>,
    pub activity: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct WeatherAdviceResponse {
    pub advice: Advice,
    pub explanation: String,
    pub source: AdviceSource,
}

fn validate_advice_request(req: &WeatherAdviceRequest) -> Result<(), AppError> {
    let activity_len = req.activity.chars().count();
    if !(1..=200).contains(&activity_len) {
        return Err(AppError::Validation {
            message: "activity must be 1-200 characters".to_string(),
            field: Some("activity".to_string()),
            received: Some(serde_json::Value::String(req.activity.clone())),
        });
    }
    Ok(())
}

/// Advise whether to do an activity on a date.
///
/// Served from the advice cache when a fresh record exists, otherwise
/// computed live (weather fetch + advisor) and cached.
#[utoipa::path(
    post,
    path = "/api/v1/weather-advice",
    request_body = WeatherAdviceRequest,
    responses(
        (status = 200, description = "Advisory", body = WeatherAdviceResponse),
        (status = 400, description = "Validation error", body = sunnydays_core::error::ApiError),
        (status = 401, description = "Not authenticated", body = sunnydays_core::error::ApiError),
        (status = 503, description = "No weather data available", body = sunnydays_core::error::ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "weather-advice"
)]
pub async fn weather_advice(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<WeatherAdviceRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_advice_request(&req)?;

    let outcome = state.pipeline.advise(req.date, &req.activity).await?;

    tracing::info!(
        email = %user.email,
        activity = %req.activity,
        source = ?outcome.source,
        "served weather advice"
    );

    Ok(Json(WeatherAdviceResponse {
        advice: outcome.advice,
        explanation: outcome.explanation,
        source: outcome.source,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request(activity: &str) -> WeatherAdviceRequest {
        WeatherAdviceRequest {
            date: Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap(),
            activity: activity.to_string(),
        }
    }

    #[test]
    fn activity_length_bounds() {
        assert!(validate_advice_request(&request("hiking")).is_ok());
        assert!(validate_advice_request(&request("")).is_err());
        assert!(validate_advice_request(&request(&"x".repeat(201))).is_err());
        assert!(validate_advice_request(&request(&"x".repeat(200))).is_ok());
    }
}
