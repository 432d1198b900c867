use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sunnydays_core::weather::{self, WeatherCondition, WeatherSummary};

const DEFAULT_BASE_URL: &str = "https://api.knmi.nl/open-data/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Returned when no summary can be produced at all. The synthetic
/// generator has no external dependency, so in practice this is the
/// pipeline's defensive branch rather than an expected outcome.
#[derive(Debug, thiserror::Error)]
#[error("no weather data available")]
pub struct WeatherUnavailable;

/// Forecast source with a live KNMI-style provider in front of the
/// seasonal synthetic generator.
#[derive(Clone)]
pub struct WeatherService {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl WeatherService {
    /// Build from `KNMI_API_KEY` / `KNMI_BASE_URL`. A missing key is a
    /// valid configuration: every forecast is then synthetic.
    pub fn from_env() -> Self {
        let api_key = std::env::var("KNMI_API_KEY")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        let base_url =
            std::env::var("KNMI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("failed to build weather HTTP client"),
            base_url,
            api_key,
        }
    }

    /// Fetch a weather summary for `date`. Live-provider errors are
    /// logged and absorbed; the caller always gets a summary unless the
    /// generator itself could not run.
    pub async fn forecast(&self, date: DateTime<Utc>) -> Result<WeatherSummary, WeatherUnavailable> {
        let Some(api_key) = &self.api_key else {
            tracing::warn!("weather API key not configured, generating synthetic forecast");
            return Ok(weather::synthetic_summary(date));
        };

        match self.fetch_live(api_key, date).await {
            Ok(summary) => Ok(summary),
            Err(err) => {
                tracing::error!(error = %err, "live weather fetch failed, falling back to synthetic forecast");
                Ok(weather::synthetic_summary(date))
            }
        }
    }

    async fn fetch_live(
        &self,
        api_key: &str,
        date: DateTime<Utc>,
    ) -> Result<WeatherSummary, reqwest::Error> {
        let forecast: LiveForecast = self
            .client
            .get(format!("{}/forecast", self.base_url))
            .header("Authorization", api_key)
            .query(&[("date", date.to_rfc3339())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(forecast.into_summary(date))
    }
}

/// Forecast document returned by the live provider.
#[derive(Debug, Deserialize)]
struct LiveForecast {
    temperature_c: i32,
    precipitation_mm: u32,
    wind_speed_kmh: u32,
    condition: WeatherCondition,
    humidity_pct: u32,
    visibility_km: u32,
}

impl LiveForecast {
    fn into_summary(self, date: DateTime<Utc>) -> WeatherSummary {
        WeatherSummary {
            date,
            temperature_c: self.temperature_c,
            precipitation_mm: self.precipitation_mm,
            wind_speed_kmh: self.wind_speed_kmh,
            condition: self.condition,
            humidity_pct: self.humidity_pct,
            visibility_km: self.visibility_km,
        }
    }
}
