use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use sunnydays_core::advice::Advice;
use sunnydays_core::weather::WeatherSummary;
use uuid::Uuid;

use crate::error::AppError;

/// Cached advice stays valid for this long after it was computed.
const FRESHNESS_WINDOW_HOURS: i64 = 6;

/// Oldest creation instant a record may have and still satisfy a lookup
/// performed at `now`.
pub fn freshness_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::hours(FRESHNESS_WINDOW_HOURS)
}

/// A persisted advisory for one (request date, activity) computation.
#[derive(Debug, Clone)]
pub struct AdviceRecord {
    pub id: Uuid,
    pub request_date: DateTime<Utc>,
    pub activity: String,
    pub weather: WeatherSummary,
    pub advice: Advice,
    pub explanation: String,
    pub created_at: DateTime<Utc>,
}

/// Read-through store of advice records in front of the forecast/advisor
/// pipeline. Rows are never updated or deleted here; stale rows simply
/// stop matching lookups.
#[derive(Clone)]
pub struct AdviceCache {
    pool: PgPool,
}

impl AdviceCache {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Newest record with exact (request_date, activity) equality created
    /// within the freshness window, or `None`.
    pub async fn lookup(
        &self,
        request_date: DateTime<Utc>,
        activity: &str,
    ) -> Result<Option<AdviceRecord>, AppError> {
        let cutoff = freshness_cutoff(Utc::now());

        let row = sqlx::query_as::<_, AdviceRow>(
            "SELECT id, request_date, activity, weather, advice, explanation, created_at \
             FROM advice_records \
             WHERE request_date = $1 AND activity = $2 AND created_at >= $3 \
             ORDER BY created_at DESC \
             LIMIT 1",
        )
        .bind(request_date)
        .bind(activity)
        .bind(cutoff)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        row.map(AdviceRow::into_record).transpose()
    }

    /// Insert a new record unconditionally. There is no uniqueness
    /// constraint on (request_date, activity): concurrent misses may each
    /// insert, and the newest row wins subsequent lookups.
    pub async fn store(
        &self,
        request_date: DateTime<Utc>,
        activity: &str,
        weather: &WeatherSummary,
        advice: Advice,
        explanation: &str,
    ) -> Result<AdviceRecord, AppError> {
        let weather_json = serde_json::to_value(weather)
            .map_err(|e| AppError::Internal(format!("Failed to serialize weather summary: {e}")))?;

        let row = sqlx::query_as::<_, AdviceRow>(
            "INSERT INTO advice_records (id, request_date, activity, weather, advice, explanation) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, request_date, activity, weather, advice, explanation, created_at",
        )
        .bind(Uuid::now_v7())
        .bind(request_date)
        .bind(activity)
        .bind(&weather_json)
        .bind(advice.as_str())
        .bind(explanation)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        row.into_record()
    }
}

#[derive(sqlx::FromRow)]
struct AdviceRow {
    id: Uuid,
    request_date: DateTime<Utc>,
    activity: String,
    weather: serde_json::Value,
    advice: String,
    explanation: String,
    created_at: DateTime<Utc>,
}

impl AdviceRow {
    fn into_record(self) -> Result<AdviceRecord, AppError> {
        let weather = serde_json::from_value(self.weather)
            .map_err(|e| AppError::Internal(format!("Corrupt weather blob in advice record: {e}")))?;
        let advice = Advice::try_from(self.advice.as_str()).map_err(AppError::Internal)?;

        Ok(AdviceRecord {
            id: self.id,
            request_date: self.request_date,
            activity: self.activity,
            weather,
            advice,
            explanation: self.explanation,
            created_at: self.created_at,
        })
    }
}
