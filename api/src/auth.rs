use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user resolved from the `Authorization: Bearer <token>`
/// header against the sessions table.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
}

/// Extract the token from a Bearer authorization header value.
pub fn parse_bearer(header: &str) -> Option<&str> {
    header.strip_prefix("Bearer ")
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized {
                message: "Missing Authorization header".to_string(),
            })?;

        let token = parse_bearer(auth_header).ok_or_else(|| AppError::Unauthorized {
            message: "Authorization header must use Bearer scheme".to_string(),
        })?;

        authenticate_session(token, &state.db).await
    }
}

/// Authenticate a session token. Uniform "could not validate" on unknown
/// tokens so callers cannot probe which part failed.
pub async fn authenticate_session(
    token: &str,
    pool: &sqlx::PgPool,
) -> Result<AuthenticatedUser, AppError> {
    if !token.starts_with("sd_at_") {
        return Err(AppError::Unauthorized {
            message: "Invalid token format".to_string(),
        });
    }

    let token_hash = sunnydays_core::auth::hash_token(token);

    let row = sqlx::query_as::<_, SessionRow>(
        "SELECT u.id AS user_id, u.name, u.email, s.expires_at \
         FROM sessions s \
         JOIN users u ON u.id = s.user_id \
         WHERE s.token_hash = $1",
    )
    .bind(&token_hash)
    .fetch_optional(pool)
    .await
    .map_err(AppError::Database)?
    .ok_or_else(|| AppError::Unauthorized {
        message: "Could not validate credentials".to_string(),
    })?;

    if Utc::now() > row.expires_at {
        return Err(AppError::Unauthorized {
            message: "Session has expired".to_string(),
        });
    }

    Ok(AuthenticatedUser {
        user_id: row.user_id,
        name: row.name,
        email: row.email,
    })
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    user_id: Uuid,
    name: String,
    email: String,
    expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::parse_bearer;

    #[test]
    fn parse_bearer_extracts_token() {
        assert_eq!(parse_bearer("Bearer sd_at_abc"), Some("sd_at_abc"));
    }

    #[test]
    fn parse_bearer_rejects_other_schemes() {
        assert_eq!(parse_bearer("Basic dXNlcjpwdw=="), None);
        assert_eq!(parse_bearer("bearer sd_at_abc"), None);
        assert_eq!(parse_bearer("sd_at_abc"), None);
    }
}
