//! Map a forecast snapshot to what the panel shows.
//!
//! Everything here is pure: the same snapshot, name and unit always give the
//! same view, so toggling units is just another call to [`render`].

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

use crate::types::{describe, icon_url, TemperatureUnit, WeatherSnapshot};
use crate::units::{to_display, unit_label};

/// Number of days shown in the outlook
pub const MAX_FORECAST_DAYS: usize = 5;

/// Shown in place of a missing number
pub const PLACEHOLDER: &str = "-";

/// Shown when the favorites list is empty
pub const NO_FAVORITES: &str = "No favorites yet";

/// Current-conditions block
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    pub place_name: String,
    /// Observation time local to the place; `None` means "as of now"
    pub updated: Option<NaiveDateTime>,
    pub temperature: Option<i64>,
    pub unit: TemperatureUnit,
    pub humidity_percent: Option<u8>,
    /// km/h, as reported
    pub wind_speed: Option<f64>,
    pub description: &'static str,
    pub icon_url: String,
}

impl CurrentConditions {
    /// Temperature with its unit label, e.g. `30°C`.
    pub fn temperature_text(&self) -> String {
        format!("{}{}", number_or_placeholder(self.temperature), unit_label(self.unit))
    }
}

/// One day of the outlook
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastCell {
    pub date: NaiveDate,
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub unit: TemperatureUnit,
    pub description: &'static str,
    pub icon_url: String,
}

impl ForecastCell {
    /// `min / max` with unit labels, e.g. `24°C / 32°C`.
    pub fn range_text(&self) -> String {
        let label = unit_label(self.unit);
        format!(
            "{}{label} / {}{label}",
            number_or_placeholder(self.min),
            number_or_placeholder(self.max)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    pub current: CurrentConditions,
    pub forecast: Vec<ForecastCell>,
}

/// Build the view for `snapshot` at `place_name`, converting temperatures to `unit`.
pub fn render(
    snapshot: &WeatherSnapshot,
    place_name: &str,
    unit: TemperatureUnit,
    icon_base_url: &str,
) -> ViewModel {
    let current = CurrentConditions {
        place_name: place_name.to_string(),
        updated: snapshot.observed_at,
        temperature: convert(snapshot.current_temperature_c, unit),
        unit,
        humidity_percent: snapshot.humidity_percent,
        wind_speed: snapshot.wind_speed.filter(|w| w.is_finite()),
        description: describe(snapshot.weather_code),
        icon_url: icon_url(icon_base_url, snapshot.weather_code),
    };

    let forecast = snapshot
        .daily
        .iter()
        .take(MAX_FORECAST_DAYS)
        .map(|day| ForecastCell {
            date: day.date,
            min: convert(day.temp_min_c, unit),
            max: convert(day.temp_max_c, unit),
            unit,
            description: day.weather_code.description(),
            icon_url: icon_url(icon_base_url, Some(day.weather_code)),
        })
        .collect();

    ViewModel { current, forecast }
}

fn convert(temp_c: Option<f64>, unit: TemperatureUnit) -> Option<i64> {
    temp_c.filter(|t| t.is_finite()).map(|t| to_display(t, unit))
}

fn number_or_placeholder<T: fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| PLACEHOLDER.to_string(), |v| v.to_string())
}

impl fmt::Display for ViewModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let current = &self.current;
        writeln!(f, "{}", current.place_name)?;
        match current.updated {
            Some(at) => writeln!(f, "Updated: {}", at.format("%Y-%m-%d %H:%M"))?,
            None => writeln!(f, "Updated: just now")?,
        }
        writeln!(f, "{}  {}", current.temperature_text(), current.description)?;
        writeln!(
            f,
            "Humidity: {}% • Wind: {} km/h",
            number_or_placeholder(current.humidity_percent),
            number_or_placeholder(current.wind_speed)
        )?;
        writeln!(f, "Icon: {}", current.icon_url)?;

        if !self.forecast.is_empty() {
            writeln!(f)?;
        }
        for cell in &self.forecast {
            writeln!(
                f,
                "{}  {:<20} {}",
                cell.date.format("%a %d %b"),
                cell.description,
                cell.range_text()
            )?;
        }
        Ok(())
    }
}

/// The favorites strip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FavoritesView {
    Empty,
    Places(Vec<String>),
}

pub fn favorites_view(names: &[String]) -> FavoritesView {
    if names.is_empty() {
        FavoritesView::Empty
    } else {
        FavoritesView::Places(names.to_vec())
    }
}

impl fmt::Display for FavoritesView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FavoritesView::Empty => f.write_str(NO_FAVORITES),
            FavoritesView::Places(names) => f.write_str(&names.join(" | ")),
        }
    }
}
