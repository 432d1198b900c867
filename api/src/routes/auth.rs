use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sunnydays_core::auth as core_auth;

use crate::auth::{AuthenticatedUser, parse_bearer};
use crate::error::AppError;
use crate::state::AppState;

pub fn signup_router() -> Router<AppState> {
    Router::new().route("/api/v1/auth/signup", post(signup))
}

pub fn login_router() -> Router<AppState> {
    Router::new().route("/api/v1/auth/login", post(login))
}

pub fn session_router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/auth/logout", post(logout))
        .route("/api/v1/auth/me", get(me))
}

// ──────────────────────────────────────────────
// POST /api/v1/auth/signup
// ──────────────────────────────────────────────

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

fn validate_signup(req: &SignupRequest) -> Result<(), AppError> {
    if req.name.is_empty() || req.name.chars().count() > 100 {
        return Err(AppError::Validation {
            message: "name must be 1-100 characters".to_string(),
            field: Some("name".to_string()),
            received: None,
        });
    }
    validate_email(&req.email)?;
    let password_len = req.password.chars().count();
    if !(6..=100).contains(&password_len) {
        return Err(AppError::Validation {
            message: "password must be 6-100 characters".to_string(),
            field: Some("password".to_string()),
            received: None,
        });
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), AppError> {
    let looks_like_address = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !looks_like_address {
        return Err(AppError::Validation {
            message: "email must be a valid address".to_string(),
            field: Some("email".to_string()),
            received: Some(serde_json::Value::String(email.to_string())),
        });
    }
    Ok(())
}

/// Register a new user and return a session token for immediate use.
#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "User registered, session issued", body = TokenResponse),
        (status = 400, description = "Validation error or email already registered", body = sunnydays_core::error::ApiError)
    ),
    tag = "auth"
)]
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_signup(&req)?;

    let password_hash = core_auth::hash_password(&req.password).map_err(AppError::Internal)?;
    let user_id = Uuid::now_v7();

    sqlx::query("INSERT INTO users (id, name, email, password_hash) VALUES ($1, $2, $3, $4)")
        .bind(user_id)
        .bind(&req.name)
        .bind(&req.email)
        .bind(&password_hash)
        .execute(&state.db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.code().as_deref() == Some("23505") {
                    return AppError::Validation {
                        message: "Email already registered".to_string(),
                        field: Some("email".to_string()),
                        received: Some(serde_json::Value::String(req.email.clone())),
                    };
                }
            }
            AppError::Database(e)
        })?;

    let token = issue_session(&state, user_id).await?;

    tracing::info!(email = %req.email, "new user registered");
    Ok(Json(TokenResponse { token }))
}

// ──────────────────────────────────────────────
// POST /api/v1/auth/login
// ──────────────────────────────────────────────

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Authenticate with email + password and return a session token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = TokenResponse),
        (status = 401, description = "Incorrect email or password", body = sunnydays_core::error::ApiError)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let row = sqlx::query_as::<_, CredentialsRow>(
        "SELECT id, password_hash FROM users WHERE email = $1",
    )
    .bind(&req.email)
    .fetch_optional(&state.db)
    .await
    .map_err(AppError::Database)?;

    // Single undifferentiated message for unknown email and wrong password.
    let bad_credentials = || AppError::Unauthorized {
        message: "Incorrect email or password".to_string(),
    };

    let row = row.ok_or_else(bad_credentials)?;
    let verified =
        core_auth::verify_password(&req.password, &row.password_hash).unwrap_or(false);
    if !verified {
        return Err(bad_credentials());
    }

    let token = issue_session(&state, row.id).await?;

    tracing::info!(email = %req.email, "user logged in");
    Ok(Json(TokenResponse { token }))
}

#[derive(sqlx::FromRow)]
struct CredentialsRow {
    id: Uuid,
    password_hash: String,
}

// ──────────────────────────────────────────────
// POST /api/v1/auth/logout
// ──────────────────────────────────────────────

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Revoke the presented session token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses(
        (status = 200, description = "Session revoked", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = sunnydays_core::error::ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    // The extractor already validated the header; re-read it to know
    // which session row to revoke.
    if let Some(token) = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(parse_bearer)
    {
        sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(core_auth::hash_token(token))
            .execute(&state.db)
            .await
            .map_err(AppError::Database)?;
    }

    tracing::info!(email = %user.email, "user logged out");
    Ok(Json(MessageResponse {
        message: "Logged out".to_string(),
    }))
}

// ──────────────────────────────────────────────
// GET /api/v1/auth/me
// ──────────────────────────────────────────────

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Profile of the authenticated user.
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not authenticated", body = sunnydays_core::error::ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn me(user: AuthenticatedUser) -> Json<UserResponse> {
    Json(UserResponse {
        id: user.user_id,
        name: user.name,
        email: user.email,
    })
}

/// Create a session row for `user_id` and return the bearer token.
async fn issue_session(state: &AppState, user_id: Uuid) -> Result<String, AppError> {
    let (token, token_hash) = core_auth::generate_session_token();
    let expires_at = Utc::now() + state.session_ttl;

    sqlx::query(
        "INSERT INTO sessions (id, user_id, token_hash, expires_at) VALUES ($1, $2, $3, $4)",
    )
    .bind(Uuid::now_v7())
    .bind(user_id)
    .bind(&token_hash)
    .bind(expires_at)
    .execute(&state.db)
    .await
    .map_err(AppError::Database)?;

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup_request(name: &str, email: &str, password: &str) -> SignupRequest {
        SignupRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn signup_accepts_reasonable_input() {
        assert!(validate_signup(&signup_request("Ada", "ada@example.com", "hunter22")).is_ok());
    }

    #[test]
    fn signup_rejects_empty_name() {
        let err = validate_signup(&signup_request("", "ada@example.com", "hunter22"));
        assert!(matches!(err, Err(AppError::Validation { .. })));
    }

    #[test]
    fn signup_rejects_short_password() {
        let err = validate_signup(&signup_request("Ada", "ada@example.com", "pw"));
        assert!(matches!(err, Err(AppError::Validation { .. })));
    }

    #[test]
    fn email_validation_requires_local_part_and_domain_dot() {
        assert!(validate_email("ada@example.com").is_ok());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ada@localhost").is_err());
        assert!(validate_email("not-an-email").is_err());
    }
}
