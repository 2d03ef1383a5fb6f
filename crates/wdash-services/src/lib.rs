pub mod favorites;
pub mod orchestrator;
pub mod scheduler;
pub mod store;

pub use favorites::{FavoritesStore, FAVORITES_KEY, LAST_CITY_KEY};
pub use orchestrator::{
    Panel, SearchError, SearchOrchestrator, SearchOutcome, SearchPhase, ViewState,
    CURRENT_LOCATION_LABEL, SAMPLE_CITIES,
};
pub use scheduler::{AutoRefresh, RefreshFuture, RefreshTask};
pub use store::{FileStore, KeyValueStore, MemoryStore};
