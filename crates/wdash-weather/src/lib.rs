//! Weather lookup for wdash
//!
//! Resolves place names with Nominatim, fetches forecasts from Open-Meteo
//! and turns them into a renderable view.

pub mod geocode;
pub mod location;
pub mod provider;
pub mod render;
pub mod types;
pub mod units;

pub use geocode::GeocodingClient;
pub use location::{FixedLocation, LocationProvider, NoLocation};
pub use provider::{nearest_sample_index, WeatherClient};
pub use render::{favorites_view, render, FavoritesView, ViewModel};
pub use types::*;
pub use units::{to_display, unit_label};
