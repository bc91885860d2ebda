//! Store configuration.

use std::time::Duration;

/// Default storage key for the persisted document.
pub const DEFAULT_STORAGE_KEY: &str = "slideDeckState";

/// Default quiet period before a dirtied slide's thumbnail is regenerated.
pub const DEFAULT_THUMBNAIL_DEBOUNCE: Duration = Duration::from_millis(300);

/// Default edge length of the square thumbnail target.
pub const DEFAULT_THUMBNAIL_SIZE: u32 = 100;

/// Default capacity of the change notification channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Tunables for a [`DocumentStore`](crate::store::DocumentStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Key the document record is persisted under.
    pub storage_key: String,
    /// Thumbnail debounce period.
    pub thumbnail_debounce: Duration,
    /// Thumbnail target edge in pixels.
    pub thumbnail_size: u32,
    /// Notification channel capacity. Slow subscribers that fall further
    /// behind than this observe a lag.
    pub event_capacity: usize,
    /// Seed for generated geometry; `None` seeds from the OS.
    pub rng_seed: Option<u64>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            thumbnail_debounce: DEFAULT_THUMBNAIL_DEBOUNCE,
            thumbnail_size: DEFAULT_THUMBNAIL_SIZE,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            rng_seed: None,
        }
    }
}

impl StoreConfig {
    /// Set the storage key.
    #[must_use]
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Set the thumbnail debounce period.
    #[must_use]
    pub fn with_thumbnail_debounce(mut self, debounce: Duration) -> Self {
        self.thumbnail_debounce = debounce;
        self
    }

    /// Set the thumbnail target size.
    #[must_use]
    pub fn with_thumbnail_size(mut self, size: u32) -> Self {
        self.thumbnail_size = size;
        self
    }

    /// Set the notification channel capacity (at least 1).
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// Seed generated geometry for reproducible output.
    #[must_use]
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.storage_key, "slideDeckState");
        assert_eq!(config.thumbnail_debounce, Duration::from_millis(300));
        assert_eq!(config.thumbnail_size, 100);
        assert!(config.rng_seed.is_none());
    }

    #[test]
    fn test_builders() {
        let config = StoreConfig::default()
            .with_storage_key("deck")
            .with_thumbnail_debounce(Duration::from_millis(20))
            .with_event_capacity(0)
            .with_rng_seed(9);
        assert_eq!(config.storage_key, "deck");
        assert_eq!(config.thumbnail_debounce, Duration::from_millis(20));
        assert_eq!(config.event_capacity, 1);
        assert_eq!(config.rng_seed, Some(9));
    }
}
