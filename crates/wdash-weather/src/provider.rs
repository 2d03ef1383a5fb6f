//! Open-Meteo forecast client.

use crate::types::{DailyEntry, WeatherCode, WeatherError, WeatherSnapshot};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;
use wdash_core::{NetworkError, ReqwestErrorExt, WeatherConfig};

const USER_AGENT: &str = concat!("wdash/", env!("CARGO_PKG_VERSION"));
const FORECAST_DAYS: &str = "5";

/// HTTP client shared settings for both remote services.
pub(crate) fn build_http_client(timeout_secs: Option<u64>) -> Result<Client, NetworkError> {
    let mut builder = Client::builder().user_agent(USER_AGENT);
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build().map_err(ReqwestErrorExt::into_network_error)
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    utc_offset_seconds: Option<i64>,
    current_weather: Option<RawCurrentWeather>,
    hourly: Option<RawHourly>,
    daily: Option<RawDaily>,
}

#[derive(Debug, Deserialize)]
struct RawCurrentWeather {
    temperature: Option<f64>,
    windspeed: Option<f64>,
    weathercode: Option<i32>,
    time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawHourly {
    time: Option<Vec<String>>,
    relativehumidity_2m: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDaily {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    weathercode: Vec<Option<i32>>,
}

/// Client for the forecast endpoint.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    forecast_url: String,
}

impl WeatherClient {
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let client = build_http_client(config.request_timeout_secs)?;
        Ok(Self {
            client,
            forecast_url: config.forecast_url.clone(),
        })
    }

    /// Fetch current conditions, hourly humidity and a 5-day outlook.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_forecast(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot, WeatherError> {
        let response = self
            .client
            .get(&self.forecast_url)
            .query(&[
                ("latitude", lat.to_string()),
                ("longitude", lon.to_string()),
                ("current_weather", "true".to_string()),
                ("hourly", "relativehumidity_2m".to_string()),
                (
                    "daily",
                    "temperature_2m_max,temperature_2m_min,weathercode".to_string(),
                ),
                ("timezone", "auto".to_string()),
                ("forecast_days", FORECAST_DAYS.to_string()),
            ])
            .send()
            .await
            .map_err(ReqwestErrorExt::into_network_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::debug!("Forecast returned status {}: {}", status, text);
            return Err(NetworkError::from_status(status, text).into());
        }

        let body = response
            .bytes()
            .await
            .map_err(ReqwestErrorExt::into_network_error)?;
        let parsed: ForecastResponse = serde_json::from_slice(&body)
            .map_err(|e| WeatherError::MalformedResponse(e.to_string()))?;

        let snapshot = into_snapshot(parsed, Utc::now())?;
        tracing::debug!(
            "Forecast: {:?}°C, {} daily entries, humidity {:?}",
            snapshot.current_temperature_c,
            snapshot.daily.len(),
            snapshot.humidity_percent
        );
        Ok(snapshot)
    }
}

fn into_snapshot(
    response: ForecastResponse,
    now: DateTime<Utc>,
) -> Result<WeatherSnapshot, WeatherError> {
    let offset = response.utc_offset_seconds.unwrap_or(0);

    let (current_temperature_c, wind_speed, weather_code, observed_at) =
        match response.current_weather {
            Some(cw) => (
                cw.temperature,
                cw.windspeed,
                cw.weathercode.map(WeatherCode),
                cw.time.as_deref().and_then(parse_local_time),
            ),
            None => (None, None, None, None),
        };

    let humidity_percent = response
        .hourly
        .as_ref()
        .and_then(|hourly| select_humidity(hourly, offset, now));

    let daily = parse_daily(response.daily.unwrap_or_default())?;

    Ok(WeatherSnapshot {
        current_temperature_c,
        wind_speed,
        weather_code,
        observed_at,
        humidity_percent,
        daily,
    })
}

fn parse_daily(raw: RawDaily) -> Result<Vec<DailyEntry>, WeatherError> {
    raw.time
        .iter()
        .enumerate()
        .map(|(i, day)| {
            let date = NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|e| {
                WeatherError::MalformedResponse(format!("daily date {day:?}: {e}"))
            })?;
            Ok(DailyEntry {
                date,
                temp_min_c: raw.temperature_2m_min.get(i).copied().flatten(),
                temp_max_c: raw.temperature_2m_max.get(i).copied().flatten(),
                weather_code: WeatherCode(raw.weathercode.get(i).copied().flatten().unwrap_or(0)),
            })
        })
        .collect()
}

/// Open-Meteo reports local wall-clock times, usually without seconds.
fn parse_local_time(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

fn local_to_utc(local: NaiveDateTime, utc_offset_seconds: i64) -> DateTime<Utc> {
    Utc.from_utc_datetime(&(local - chrono::Duration::seconds(utc_offset_seconds)))
}

fn select_humidity(hourly: &RawHourly, utc_offset_seconds: i64, now: DateTime<Utc>) -> Option<u8> {
    let times = hourly.time.as_ref()?;
    let values = hourly.relativehumidity_2m.as_ref()?;

    let instants: Vec<Option<DateTime<Utc>>> = times
        .iter()
        .map(|t| parse_local_time(t).map(|local| local_to_utc(local, utc_offset_seconds)))
        .collect();

    let index = nearest_sample_index(&instants, now)?;
    let value = values.get(index).copied().flatten()?;
    Some(value.round().clamp(0.0, 100.0) as u8)
}

/// Index of the sample closest to `now`.
///
/// Unparseable samples (`None`) are skipped; on equal distance the lowest index wins.
pub fn nearest_sample_index(times: &[Option<DateTime<Utc>>], now: DateTime<Utc>) -> Option<usize> {
    let mut best: Option<(usize, i64)> = None;
    for (i, time) in times.iter().enumerate() {
        let Some(time) = time else { continue };
        let diff = (*time - now).num_milliseconds().abs();
        if best.map_or(true, |(_, best_diff)| diff < best_diff) {
            best = Some((i, diff));
        }
    }
    best.map(|(i, _)| i)
}
