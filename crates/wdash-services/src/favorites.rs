//! Favorite places and the last searched city.

use std::sync::Arc;

use wdash_core::StorageError;

use crate::store::KeyValueStore;

/// Key holding the JSON array of favorite place names
pub const FAVORITES_KEY: &str = "fav";
/// Key holding the last successfully searched place name
pub const LAST_CITY_KEY: &str = "lastCity";

/// Favorites list and session state on top of a [`KeyValueStore`].
#[derive(Clone)]
pub struct FavoritesStore {
    store: Arc<dyn KeyValueStore>,
}

impl FavoritesStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Favorites in insertion order. Unreadable data reads as an empty list.
    pub fn list(&self) -> Vec<String> {
        let raw = match self.store.get(FAVORITES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read favorites: {}", e);
                return Vec::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!("Ignoring malformed favorites list: {}", e);
            Vec::new()
        })
    }

    /// Append `name` unless it is already present (exact match).
    ///
    /// Returns whether the list changed.
    pub fn add(&self, name: &str) -> Result<bool, StorageError> {
        let mut names = self.list();
        if names.iter().any(|n| n == name) {
            return Ok(false);
        }
        names.push(name.to_string());
        self.save(&names)?;
        tracing::info!("Added favorite: {}", name);
        Ok(true)
    }

    /// Remove `name` if present. The list is written back either way.
    pub fn remove(&self, name: &str) -> Result<(), StorageError> {
        let mut names = self.list();
        names.retain(|n| n != name);
        self.save(&names)?;
        tracing::info!("Removed favorite: {}", name);
        Ok(())
    }

    pub fn last_searched(&self) -> Option<String> {
        match self.store.get(LAST_CITY_KEY) {
            Ok(value) => value.filter(|city| !city.trim().is_empty()),
            Err(e) => {
                tracing::warn!("Failed to read last searched city: {}", e);
                None
            }
        }
    }

    pub fn set_last_searched(&self, name: &str) -> Result<(), StorageError> {
        self.store.set(LAST_CITY_KEY, name)
    }

    fn save(&self, names: &[String]) -> Result<(), StorageError> {
        let json =
            serde_json::to_string(names).map_err(|e| StorageError::Serialize(e.to_string()))?;
        self.store.set(FAVORITES_KEY, &json)
    }
}
