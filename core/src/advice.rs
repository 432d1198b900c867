use serde::{Deserialize, Serialize};

use crate::weather::{WeatherCondition, WeatherSummary};

/// The yes/no verdict on doing an activity given the weather.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Advice {
    Yes,
    No,
}

impl Advice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Advice::Yes => "yes",
            Advice::No => "no",
        }
    }
}

impl std::fmt::Display for Advice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Advice {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "yes" => Ok(Advice::Yes),
            "no" => Ok(Advice::No),
            _ => Err(format!("advice must be 'yes' or 'no', got '{value}'")),
        }
    }
}

const INDOOR_KEYWORDS: &[&str] = &["shopping", "museum", "cinema", "reading", "cooking", "studying"];
const WINTER_KEYWORDS: &[&str] = &["skiing", "snowboarding", "ice skating", "sledding"];
const WATER_KEYWORDS: &[&str] = &["swimming", "sailing", "surfing", "fishing", "kayaking"];
const OUTDOOR_KEYWORDS: &[&str] = &[
    "hiking",
    "cycling",
    "running",
    "walking",
    "picnic",
    "camping",
    "gardening",
    "sports",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityCategory {
    Indoor,
    Winter,
    Water,
    Outdoor,
}

impl ActivityCategory {
    /// Classify a free-text activity by case-insensitive keyword substring.
    ///
    /// Keyword sets may overlap; the first matching category in the order
    /// indoor, winter, water, outdoor wins.
    pub fn classify(activity: &str) -> Option<Self> {
        let lower = activity.to_lowercase();
        let matches = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));

        if matches(INDOOR_KEYWORDS) {
            Some(ActivityCategory::Indoor)
        } else if matches(WINTER_KEYWORDS) {
            Some(ActivityCategory::Winter)
        } else if matches(WATER_KEYWORDS) {
            Some(ActivityCategory::Water)
        } else if matches(OUTDOOR_KEYWORDS) {
            Some(ActivityCategory::Outdoor)
        } else {
            None
        }
    }
}

/// Rule-based recommendation, used whenever the external advisor is
/// unconfigured or unusable.
///
/// Pure function of (weather, activity); the explanation strings are part
/// of the observable contract.
pub fn recommend(weather: &WeatherSummary, activity: &str) -> (Advice, String) {
    match ActivityCategory::classify(activity) {
        Some(ActivityCategory::Indoor) => (
            Advice::Yes,
            "Indoor activities are generally not affected by weather conditions.".to_string(),
        ),
        Some(ActivityCategory::Winter) => {
            if weather.temperature_c < 5
                && matches!(
                    weather.condition,
                    WeatherCondition::Snow | WeatherCondition::Cloudy
                )
            {
                (
                    Advice::Yes,
                    "Good conditions for winter activities with cold temperatures.".to_string(),
                )
            } else {
                (
                    Advice::No,
                    "Winter activities require colder temperatures and preferably snow."
                        .to_string(),
                )
            }
        }
        Some(ActivityCategory::Water) => {
            if weather.temperature_c < 15 {
                (
                    Advice::No,
                    "Water activities are not recommended in cold temperatures.".to_string(),
                )
            } else if weather.precipitation_mm > 20 {
                (
                    Advice::No,
                    "Heavy precipitation makes water activities unsafe.".to_string(),
                )
            } else if weather.wind_speed_kmh > 25 {
                (
                    Advice::No,
                    "Strong winds make water activities dangerous.".to_string(),
                )
            } else {
                (
                    Advice::Yes,
                    "Good conditions for water activities.".to_string(),
                )
            }
        }
        Some(ActivityCategory::Outdoor) => {
            if weather.precipitation_mm > 30 {
                (
                    Advice::No,
                    "Heavy rain makes outdoor activities unpleasant and potentially unsafe."
                        .to_string(),
                )
            } else if weather.wind_speed_kmh > 30 {
                (
                    Advice::No,
                    "Very strong winds make outdoor activities difficult and unsafe.".to_string(),
                )
            } else if weather.temperature_c < -5 {
                (
                    Advice::No,
                    "Extremely cold temperatures make outdoor activities uncomfortable."
                        .to_string(),
                )
            } else if weather.temperature_c > 35 {
                (
                    Advice::No,
                    "Very high temperatures can be dangerous for outdoor activities.".to_string(),
                )
            } else if weather.precipitation_mm > 10 {
                (
                    Advice::No,
                    "Light to moderate rain makes outdoor activities less enjoyable.".to_string(),
                )
            } else {
                (
                    Advice::Yes,
                    format!(
                        "Good weather conditions for outdoor activities. Temperature: {}°C, minimal precipitation.",
                        weather.temperature_c
                    ),
                )
            }
        }
        None => {
            if weather.precipitation_mm > 20 || weather.wind_speed_kmh > 25 {
                (
                    Advice::No,
                    "Weather conditions may not be suitable for this activity.".to_string(),
                )
            } else {
                (
                    Advice::Yes,
                    "Weather conditions appear suitable for this activity.".to_string(),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn summary(
        temperature_c: i32,
        precipitation_mm: u32,
        wind_speed_kmh: u32,
        condition: WeatherCondition,
    ) -> WeatherSummary {
        WeatherSummary {
            date: Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap(),
            temperature_c,
            precipitation_mm,
            wind_speed_kmh,
            condition,
            humidity_pct: 60,
            visibility_km: 20,
        }
    }

    #[test]
    fn advice_parses_case_insensitively() {
        assert_eq!(Advice::try_from("YES").unwrap(), Advice::Yes);
        assert_eq!(Advice::try_from("no").unwrap(), Advice::No);
        assert!(Advice::try_from("maybe").is_err());
    }

    #[test]
    fn reading_is_weather_independent() {
        let (advice, explanation) =
            recommend(&summary(-10, 80, 50, WeatherCondition::Snow), "reading");
        assert_eq!(advice, Advice::Yes);
        assert!(explanation.contains("not affected by weather"));
    }

    #[test]
    fn indoor_wins_over_outdoor_on_overlap() {
        // matches both "cooking" (indoor) and "camping" (outdoor)
        let category = ActivityCategory::classify("cooking while camping");
        assert_eq!(category, Some(ActivityCategory::Indoor));

        let (advice, _) = recommend(
            &summary(10, 40, 10, WeatherCondition::LightRain),
            "cooking while camping",
        );
        assert_eq!(advice, Advice::Yes);
    }

    #[test]
    fn sailing_in_cold_water_is_rejected() {
        let (advice, explanation) =
            recommend(&summary(10, 0, 5, WeatherCondition::Cloudy), "sailing");
        assert_eq!(advice, Advice::No);
        assert!(explanation.contains("cold temperatures"));
    }

    #[test]
    fn water_rules_check_precipitation_then_wind() {
        let (advice, explanation) =
            recommend(&summary(20, 25, 5, WeatherCondition::LightRain), "swimming");
        assert_eq!(advice, Advice::No);
        assert!(explanation.contains("precipitation"));

        let (advice, explanation) =
            recommend(&summary(20, 0, 30, WeatherCondition::Sunny), "swimming");
        assert_eq!(advice, Advice::No);
        assert!(explanation.contains("winds"));

        let (advice, _) = recommend(&summary(20, 0, 10, WeatherCondition::Sunny), "swimming");
        assert_eq!(advice, Advice::Yes);
    }

    #[test]
    fn hiking_in_mild_weather_is_approved() {
        let (advice, explanation) =
            recommend(&summary(18, 0, 10, WeatherCondition::PartlyCloudy), "hiking");
        assert_eq!(advice, Advice::Yes);
        assert!(explanation.contains("18°C"));
    }

    #[test]
    fn outdoor_thresholds_apply_in_order() {
        let cases = [
            (15, 35, 10, "Heavy rain"),
            (15, 0, 35, "strong winds"),
            (-10, 0, 10, "cold temperatures"),
            (40, 0, 10, "high temperatures"),
            (15, 15, 10, "less enjoyable"),
        ];
        for (temp, precip, wind, fragment) in cases {
            let (advice, explanation) =
                recommend(&summary(temp, precip, wind, WeatherCondition::Cloudy), "cycling");
            assert_eq!(advice, Advice::No, "case {fragment}");
            assert!(explanation.contains(fragment), "{explanation}");
        }
    }

    #[test]
    fn skiing_depends_on_cold_and_condition() {
        let (advice, _) = recommend(&summary(3, 0, 10, WeatherCondition::Snow), "skiing");
        assert_eq!(advice, Advice::Yes);

        let (advice, explanation) =
            recommend(&summary(10, 0, 10, WeatherCondition::Snow), "skiing");
        assert_eq!(advice, Advice::No);
        assert!(explanation.contains("colder temperatures"));

        // cold but clear sky also fails the condition check
        let (advice, _) = recommend(&summary(3, 0, 10, WeatherCondition::Sunny), "skiing");
        assert_eq!(advice, Advice::No);
    }

    #[test]
    fn unclassified_activity_uses_default_thresholds() {
        let (advice, explanation) =
            recommend(&summary(15, 25, 10, WeatherCondition::LightRain), "painting");
        assert_eq!(advice, Advice::No);
        assert!(explanation.contains("may not be suitable"));

        let (advice, _) = recommend(&summary(15, 0, 10, WeatherCondition::PartlyCloudy), "painting");
        assert_eq!(advice, Advice::Yes);
    }

    #[test]
    fn recommend_is_deterministic() {
        let weather = summary(12, 5, 18, WeatherCondition::Drizzle);
        let first = recommend(&weather, "gardening");
        let second = recommend(&weather, "gardening");
        assert_eq!(first, second);
    }
}
