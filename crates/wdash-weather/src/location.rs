//! Device location sources.

use async_trait::async_trait;
use wdash_core::LocationConfig;

use crate::types::LocationError;

/// A source of the device's current coordinates.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Returns `(latitude, longitude)`.
    async fn current_location(&self) -> Result<(f64, f64), LocationError>;
}

/// A location pinned in configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedLocation {
    pub latitude: f64,
    pub longitude: f64,
}

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_location(&self) -> Result<(f64, f64), LocationError> {
        Ok((self.latitude, self.longitude))
    }
}

/// Used when no location source is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocation;

#[async_trait]
impl LocationProvider for NoLocation {
    async fn current_location(&self) -> Result<(f64, f64), LocationError> {
        Err(LocationError::ServiceUnavailable)
    }
}

/// Pick the provider described by `config`.
pub fn from_config(config: &LocationConfig) -> Box<dyn LocationProvider> {
    match config.coordinates() {
        Some((latitude, longitude)) => {
            tracing::debug!("Using configured location {}, {}", latitude, longitude);
            Box::new(FixedLocation {
                latitude,
                longitude,
            })
        }
        None => Box::new(NoLocation),
    }
}
