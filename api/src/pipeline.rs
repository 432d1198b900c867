use chrono::{DateTime, Utc};
use serde::Serialize;
use sunnydays_core::advice::Advice;

use crate::advice_cache::AdviceCache;
use crate::advisor::AdviceService;
use crate::error::AppError;
use crate::weather::WeatherService;

/// Where an advisory came from. Callers cannot distinguish a live
/// provider answer from a fallback answer; both are `live`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AdviceSource {
    Cache,
    Live,
}

/// Uniform pipeline result regardless of source.
#[derive(Debug, Clone)]
pub struct AdviceOutcome {
    pub advice: Advice,
    pub explanation: String,
    pub source: AdviceSource,
}

/// Orchestrates cache → weather → advisor → cache-write for one request.
///
/// Holds constructed provider handles; requests share no other state, so
/// concurrent misses on the same key may each compute and insert. That
/// race resolves by last-write-wins on later freshness-filtered lookups.
#[derive(Clone)]
pub struct AdvicePipeline {
    cache: AdviceCache,
    weather: WeatherService,
    advisor: AdviceService,
}

impl AdvicePipeline {
    pub fn new(cache: AdviceCache, weather: WeatherService, advisor: AdviceService) -> Self {
        Self {
            cache,
            weather,
            advisor,
        }
    }

    pub async fn advise(
        &self,
        date: DateTime<Utc>,
        activity: &str,
    ) -> Result<AdviceOutcome, AppError> {
        if let Some(record) = self.cache.lookup(date, activity).await? {
            tracing::info!(activity, date = %date, cached_at = %record.created_at, "returning cached advice");
            return Ok(AdviceOutcome {
                advice: record.advice,
                explanation: record.explanation,
                source: AdviceSource::Cache,
            });
        }

        tracing::info!(activity, date = %date, "no fresh cached advice, computing live");

        let weather = self
            .weather
            .forecast(date)
            .await
            .map_err(|_| AppError::ServiceUnavailable {
                message: "Unable to fetch weather data at this time".to_string(),
            })?;

        let (advice, explanation) = self.advisor.recommend(&weather, activity).await;

        let record = self
            .cache
            .store(date, activity, &weather, advice, &explanation)
            .await?;
        tracing::debug!(
            record_id = %record.id,
            condition = %record.weather.condition,
            "stored advice record"
        );

        Ok(AdviceOutcome {
            advice,
            explanation,
            source: AdviceSource::Live,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::AdviceSource;

    #[test]
    fn source_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&AdviceSource::Cache).unwrap(), "\"cache\"");
        assert_eq!(serde_json::to_string(&AdviceSource::Live).unwrap(), "\"live\"");
    }
}
