use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::routes::auth::MessageResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/activities",
            get(list_activities).post(create_activity),
        )
        .route(
            "/api/v1/activities/{activity_id}",
            put(update_activity).delete(delete_activity),
        )
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ActivityRequest {
    pub title: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ActivityResponse {
    pub id: Uuid,
    pub title: String,
    pub date: DateTime<Utc>,
    pub status: String,
}

#[derive(sqlx::FromRow)]
struct ActivityRow {
    id: Uuid,
    title: String,
    date: DateTime<Utc>,
    status: String,
}

impl ActivityRow {
    fn into_response(self) -> ActivityResponse {
        ActivityResponse {
            id: self.id,
            title: self.title,
            date: self.date,
            status: self.status,
        }
    }
}

fn validate_activity(req: &ActivityRequest) -> Result<(), AppError> {
    let title_len = req.title.chars().count();
    if !(1..=200).contains(&title_len) {
        return Err(AppError::Validation {
            message: "title must be 1-200 characters".to_string(),
            field: Some("title".to_string()),
            received: Some(serde_json::Value::String(req.title.clone())),
        });
    }
    Ok(())
}

/// Activity status derived from its date: strictly before today (UTC) is
/// "past", today and later are "future".
fn status_for(date: DateTime<Utc>, now: DateTime<Utc>) -> &'static str {
    if date.date_naive() < now.date_naive() {
        "past"
    } else {
        "future"
    }
}

/// List the authenticated user's activities, newest date first.
#[utoipa::path(
    get,
    path = "/api/v1/activities",
    responses(
        (status = 200, description = "Activities for the current user", body = [ActivityResponse]),
        (status = 401, description = "Not authenticated", body = sunnydays_core::error::ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "activities"
)]
pub async fn list_activities(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let rows = sqlx::query_as::<_, ActivityRow>(
        "SELECT id, title, date, status FROM activities \
         WHERE user_id = $1 \
         ORDER BY date DESC",
    )
    .bind(user.user_id)
    .fetch_all(&state.db)
    .await
    .map_err(AppError::Database)?;

    let activities: Vec<ActivityResponse> =
        rows.into_iter().map(ActivityRow::into_response).collect();

    tracing::info!(email = %user.email, count = activities.len(), "listed activities");
    Ok(Json(activities))
}

/// Create an activity for the authenticated user.
#[utoipa::path(
    post,
    path = "/api/v1/activities",
    request_body = ActivityRequest,
    responses(
        (status = 200, description = "Activity created", body = ActivityResponse),
        (status = 400, description = "Validation error", body = sunnydays_core::error::ApiError),
        (status = 401, description = "Not authenticated", body = sunnydays_core::error::ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "activities"
)]
pub async fn create_activity(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<ActivityRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_activity(&req)?;

    let row = sqlx::query_as::<_, ActivityRow>(
        "INSERT INTO activities (id, user_id, title, date, status) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, title, date, status",
    )
    .bind(Uuid::now_v7())
    .bind(user.user_id)
    .bind(&req.title)
    .bind(req.date)
    .bind(status_for(req.date, Utc::now()))
    .fetch_one(&state.db)
    .await
    .map_err(AppError::Database)?;

    tracing::info!(email = %user.email, title = %req.title, "created activity");
    Ok(Json(row.into_response()))
}

/// Update an activity owned by the authenticated user.
#[utoipa::path(
    put,
    path = "/api/v1/activities/{activity_id}",
    request_body = ActivityRequest,
    params(("activity_id" = Uuid, Path, description = "Activity to update")),
    responses(
        (status = 200, description = "Activity updated", body = ActivityResponse),
        (status = 400, description = "Validation error", body = sunnydays_core::error::ApiError),
        (status = 401, description = "Not authenticated", body = sunnydays_core::error::ApiError),
        (status = 404, description = "Activity not found", body = sunnydays_core::error::ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "activities"
)]
pub async fn update_activity(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(activity_id): Path<Uuid>,
    Json(req): Json<ActivityRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_activity(&req)?;

    let row = sqlx::query_as::<_, ActivityRow>(
        "UPDATE activities \
         SET title = $1, date = $2, status = $3, updated_at = NOW() \
         WHERE id = $4 AND user_id = $5 \
         RETURNING id, title, date, status",
    )
    .bind(&req.title)
    .bind(req.date)
    .bind(status_for(req.date, Utc::now()))
    .bind(activity_id)
    .bind(user.user_id)
    .fetch_optional(&state.db)
    .await
    .map_err(AppError::Database)?
    .ok_or_else(|| AppError::NotFound {
        message: "Activity not found".to_string(),
    })?;

    tracing::info!(email = %user.email, %activity_id, "updated activity");
    Ok(Json(row.into_response()))
}

/// Delete an activity owned by the authenticated user.
#[utoipa::path(
    delete,
    path = "/api/v1/activities/{activity_id}",
    params(("activity_id" = Uuid, Path, description = "Activity to delete")),
    responses(
        (status = 200, description = "Activity deleted", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = sunnydays_core::error::ApiError),
        (status = 404, description = "Activity not found", body = sunnydays_core::error::ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "activities"
)]
pub async fn delete_activity(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(activity_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = sqlx::query("DELETE FROM activities WHERE id = $1 AND user_id = $2")
        .bind(activity_id)
        .bind(user.user_id)
        .execute(&state.db)
        .await
        .map_err(AppError::Database)?;

    if deleted.rows_affected() == 0 {
        return Err(AppError::NotFound {
            message: "Activity not found".to_string(),
        });
    }

    tracing::info!(email = %user.email, %activity_id, "deleted activity");
    Ok(Json(MessageResponse {
        message: "Activity deleted".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn status_is_past_only_before_today() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 14, 30, 0).unwrap();

        let yesterday = Utc.with_ymd_and_hms(2025, 6, 14, 23, 59, 59).unwrap();
        assert_eq!(status_for(yesterday, now), "past");

        // earlier the same day still counts as future
        let this_morning = Utc.with_ymd_and_hms(2025, 6, 15, 6, 0, 0).unwrap();
        assert_eq!(status_for(this_morning, now), "future");

        let tomorrow = Utc.with_ymd_and_hms(2025, 6, 16, 0, 0, 0).unwrap();
        assert_eq!(status_for(tomorrow, now), "future");
    }

    #[test]
    fn title_validation_bounds() {
        let ok = ActivityRequest {
            title: "Morning run".to_string(),
            date: Utc.with_ymd_and_hms(2025, 6, 15, 9, 0, 0).unwrap(),
        };
        assert!(validate_activity(&ok).is_ok());

        let empty = ActivityRequest {
            title: String::new(),
            date: ok.date,
        };
        assert!(validate_activity(&empty).is_err());

        let long = ActivityRequest {
            title: "x".repeat(201),
            date: ok.date,
        };
        assert!(validate_activity(&long).is_err());
    }
}
