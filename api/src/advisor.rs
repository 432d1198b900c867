use std::time::Duration;

use serde::{Deserialize, Serialize};
use sunnydays_core::advice::{self, Advice};
use sunnydays_core::weather::WeatherSummary;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const SYSTEM_PROMPT: &str = "You are a weather advisor. Respond with a JSON object containing \
     'advice' (either 'yes' or 'no') and 'explanation' (a brief reason for your recommendation).";

/// Advice source with an external text-generation provider in front of
/// the deterministic rule table.
#[derive(Clone)]
pub struct AdviceService {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl AdviceService {
    /// Build from `LLM_API_KEY` / `LLM_BASE_URL` / `LLM_MODEL`. A missing
    /// key is a valid configuration: every verdict is then rule-based.
    pub fn from_env() -> Self {
        let api_key = std::env::var("LLM_API_KEY")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        let base_url =
            std::env::var("LLM_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("failed to build advisor HTTP client"),
            base_url,
            api_key,
            model,
        }
    }

    /// Recommend for (weather, activity). Never fails outward: transport
    /// errors, non-success statuses, and unparseable responses all degrade
    /// to the rule table.
    pub async fn recommend(&self, weather: &WeatherSummary, activity: &str) -> (Advice, String) {
        let Some(api_key) = &self.api_key else {
            tracing::warn!("advisor API key not configured, using rule-based recommendation");
            return advice::recommend(weather, activity);
        };

        match self.ask_provider(api_key, weather, activity).await {
            Ok(content) => match parse_verdict(&content) {
                Some(verdict) => verdict,
                None => {
                    tracing::error!(content = %content, "failed to parse advisor response");
                    advice::recommend(weather, activity)
                }
            },
            Err(err) => {
                tracing::error!(error = %err, "advisor request failed, using rule-based recommendation");
                advice::recommend(weather, activity)
            }
        }
    }

    async fn ask_provider(
        &self,
        api_key: &str,
        weather: &WeatherSummary,
        activity: &str,
    ) -> Result<String, reqwest::Error> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: build_prompt(weather, activity),
                },
            ],
            max_tokens: 150,
            temperature: 0.3,
        };

        let response: ChatResponse = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default())
    }
}

/// Prompt handed to the text-generation provider.
fn build_prompt(weather: &WeatherSummary, activity: &str) -> String {
    format!(
        "Given the following weather conditions, should I do this activity: \"{activity}\"?\n\
         \n\
         Weather conditions:\n\
         - Temperature: {}°C\n\
         - Precipitation: {}mm\n\
         - Wind speed: {} km/h\n\
         - Condition: {}\n\
         - Humidity: {}%\n\
         - Visibility: {} km\n\
         \n\
         Please provide your recommendation as a JSON object with:\n\
         - \"advice\": either \"yes\" or \"no\"\n\
         - \"explanation\": a brief explanation of your reasoning (max 100 words)\n\
         \n\
         Consider safety, comfort, and enjoyment when making your recommendation.",
        weather.temperature_c,
        weather.precipitation_mm,
        weather.wind_speed_kmh,
        weather.condition,
        weather.humidity_pct,
        weather.visibility_km,
    )
}

/// Parse the provider's message content as a `{advice, explanation}`
/// object. Returns `None` when the content is not a JSON object (the
/// caller then takes the rule path); a parseable object with an
/// out-of-vocabulary or missing advice is coerced to "no".
fn parse_verdict(content: &str) -> Option<(Advice, String)> {
    let parsed: serde_json::Value = serde_json::from_str(content).ok()?;
    let object = parsed.as_object()?;

    let advice_raw = object
        .get("advice")
        .and_then(|v| v.as_str())
        .unwrap_or("no")
        .to_lowercase();
    let explanation = object
        .get("explanation")
        .and_then(|v| v.as_str())
        .unwrap_or("Unable to determine recommendation")
        .to_string();

    let advice = Advice::try_from(advice_raw.as_str()).unwrap_or(Advice::No);

    Some((advice, explanation))
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use sunnydays_core::weather::WeatherCondition;

    fn sample_weather() -> WeatherSummary {
        WeatherSummary {
            date: Utc.with_ymd_and_hms(2025, 7, 4, 10, 0, 0).unwrap(),
            temperature_c: 22,
            precipitation_mm: 0,
            wind_speed_kmh: 8,
            condition: WeatherCondition::Sunny,
            humidity_pct: 55,
            visibility_km: 25,
        }
    }

    #[test]
    fn parse_verdict_accepts_well_formed_response() {
        let (advice, explanation) =
            parse_verdict(r#"{"advice": "yes", "explanation": "Clear skies."}"#).unwrap();
        assert_eq!(advice, Advice::Yes);
        assert_eq!(explanation, "Clear skies.");
    }

    #[test]
    fn parse_verdict_normalizes_case() {
        let (advice, _) = parse_verdict(r#"{"advice": "YES", "explanation": "x"}"#).unwrap();
        assert_eq!(advice, Advice::Yes);
    }

    #[test]
    fn parse_verdict_coerces_out_of_vocabulary_advice_to_no() {
        let (advice, explanation) =
            parse_verdict(r#"{"advice": "maybe", "explanation": "Hard to say."}"#).unwrap();
        assert_eq!(advice, Advice::No);
        assert_eq!(explanation, "Hard to say.");
    }

    #[test]
    fn parse_verdict_defaults_missing_fields() {
        let (advice, explanation) = parse_verdict(r#"{}"#).unwrap();
        assert_eq!(advice, Advice::No);
        assert_eq!(explanation, "Unable to determine recommendation");
    }

    #[test]
    fn parse_verdict_rejects_non_object_content() {
        assert!(parse_verdict("Sure, go ahead!").is_none());
        assert!(parse_verdict(r#"["yes"]"#).is_none());
        assert!(parse_verdict("").is_none());
    }

    #[test]
    fn prompt_includes_activity_and_weather_fields() {
        let prompt = build_prompt(&sample_weather(), "hiking");
        assert!(prompt.contains("\"hiking\""));
        assert!(prompt.contains("Temperature: 22°C"));
        assert!(prompt.contains("Condition: sunny"));
        assert!(prompt.contains("Visibility: 25 km"));
    }
}
