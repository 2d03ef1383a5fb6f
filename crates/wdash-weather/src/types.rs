//! Places, forecast snapshots and the errors of the weather clients.

use chrono::{NaiveDate, NaiveDateTime};
use wdash_core::NetworkError;

pub use wdash_core::TemperatureUnit;

/// A resolved place: the first geocoding match for a query.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub display_name: String,
    pub lat: f64,
    pub lon: f64,
}

/// WMO weather code as reported by the forecast service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeatherCode(pub i32);

impl WeatherCode {
    /// Human-readable label for the code.
    /// See: https://open-meteo.com/en/docs#weathervariables
    pub fn description(self) -> &'static str {
        match self.0 {
            0 => "Clear",
            1 => "Mainly clear",
            2 => "Partly cloudy",
            3 => "Overcast",
            45 => "Fog",
            48 => "Rime fog",
            51 => "Light drizzle",
            53 => "Moderate drizzle",
            55 => "Dense drizzle",
            61 => "Slight rain",
            63 => "Moderate rain",
            65 => "Heavy rain",
            71 => "Slight snow",
            73 => "Moderate snow",
            75 => "Heavy snow",
            80 => "Rain showers",
            81 => "Heavy rain showers",
            95 => "Thunderstorm",
            99 => "Thunderstorm hail",
            _ => "Unknown",
        }
    }
}

/// Label for a possibly missing code.
pub fn describe(code: Option<WeatherCode>) -> &'static str {
    code.map_or("Unknown", WeatherCode::description)
}

/// Icon resource for a code; a missing code falls back to icon `0`.
pub fn icon_url(base_url: &str, code: Option<WeatherCode>) -> String {
    let number = code.map_or(0, |c| c.0);
    format!("{}/{}.svg", base_url.trim_end_matches('/'), number)
}

/// One day of the outlook. Temperatures are Celsius.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyEntry {
    pub date: NaiveDate,
    pub temp_min_c: Option<f64>,
    pub temp_max_c: Option<f64>,
    pub weather_code: WeatherCode,
}

/// Current conditions plus the daily outlook from a single forecast fetch.
///
/// Temperatures are canonical Celsius; display conversion happens at render time.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSnapshot {
    pub current_temperature_c: Option<f64>,
    pub wind_speed: Option<f64>,
    pub weather_code: Option<WeatherCode>,
    /// Observation time, local to the place
    pub observed_at: Option<NaiveDateTime>,
    pub humidity_percent: Option<u8>,
    pub daily: Vec<DailyEntry>,
}

/// Geocoding errors
#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    #[error("Geocoding request failed: {0}")]
    Transport(#[from] NetworkError),
    #[error("No place found for \"{0}\"")]
    NotFound(String),
    #[error("Malformed geocoding response: {0}")]
    MalformedResponse(String),
}

impl GeoError {
    pub fn user_message(&self) -> &'static str {
        match self {
            GeoError::NotFound(_) => "City not found. Try another spelling (e.g. \"Jakarta\").",
            GeoError::Transport(_) | GeoError::MalformedResponse(_) => {
                "Failed to reach the geocoding service. Check your connection."
            }
        }
    }
}

/// Forecast errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Forecast request failed: {0}")]
    Transport(#[from] NetworkError),
    #[error("Malformed forecast response: {0}")]
    MalformedResponse(String),
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        "Failed to reach the weather service. Check your connection."
    }
}

/// Location service errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    ServiceUnavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location error: {0}")]
    Other(String),
}

impl LocationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            LocationError::PermissionDenied | LocationError::Timeout => {
                "Location permission denied or timed out."
            }
            LocationError::ServiceUnavailable => "Geolocation is not available.",
            LocationError::Other(_) => "Failed to get your location.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_table() {
        let table = [
            (0, "Clear"),
            (1, "Mainly clear"),
            (2, "Partly cloudy"),
            (3, "Overcast"),
            (45, "Fog"),
            (48, "Rime fog"),
            (51, "Light drizzle"),
            (53, "Moderate drizzle"),
            (55, "Dense drizzle"),
            (61, "Slight rain"),
            (63, "Moderate rain"),
            (65, "Heavy rain"),
            (71, "Slight snow"),
            (73, "Moderate snow"),
            (75, "Heavy snow"),
            (80, "Rain showers"),
            (81, "Heavy rain showers"),
            (95, "Thunderstorm"),
            (99, "Thunderstorm hail"),
        ];
        for (code, label) in table {
            assert_eq!(WeatherCode(code).description(), label, "code {code}");
        }
    }

    #[test]
    fn test_unlisted_codes_are_unknown() {
        for code in [4, 56, 66, 77, 82, 85, 96, -1, 999] {
            assert_eq!(WeatherCode(code).description(), "Unknown", "code {code}");
        }
        assert_eq!(describe(None), "Unknown");
    }

    #[test]
    fn test_icon_url_falls_back_to_zero() {
        let base = "https://icons.example/svg/";
        assert_eq!(icon_url(base, Some(WeatherCode(61))), "https://icons.example/svg/61.svg");
        assert_eq!(icon_url(base, None), "https://icons.example/svg/0.svg");
    }

    #[test]
    fn test_user_messages_distinguish_not_found() {
        let not_found = GeoError::NotFound("Atlantis".into());
        let transport = GeoError::Transport(NetworkError::Timeout);
        assert!(not_found.user_message().contains("not found"));
        assert!(transport.user_message().contains("geocoding"));
        assert_ne!(not_found.user_message(), transport.user_message());
    }
}
