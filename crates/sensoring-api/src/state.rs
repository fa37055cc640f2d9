use sensoring_core::config::EnrichmentSettings;
use sensoring_core::DetectionRules;
use sensoring_enrichment::WeatherEnricher;
use sensoring_store::ports::{DetectionStore, WeatherStore};
use sensoring_store::MemoryStore;
use sensoring_weather::WeatherLookup;
use std::sync::Arc;

use crate::config::Passwords;

pub struct AppState {
    pub detection_store: Arc<dyn DetectionStore>,
    pub enricher: WeatherEnricher,
    pub rules: DetectionRules,
    pub passwords: Passwords,
}

impl AppState {
    pub fn new(
        detection_store: Arc<dyn DetectionStore>,
        enricher: WeatherEnricher,
        rules: DetectionRules,
        passwords: Passwords,
    ) -> Self {
        Self {
            detection_store,
            enricher,
            rules,
            passwords,
        }
    }

    /// Wire one store behind both the weather cache and detection ports
    pub fn with_store<S>(
        store: Arc<S>,
        lookup: Arc<dyn WeatherLookup>,
        settings: EnrichmentSettings,
        rules: DetectionRules,
        passwords: Passwords,
    ) -> Self
    where
        S: DetectionStore + WeatherStore + 'static,
    {
        let weather_store: Arc<dyn WeatherStore> = store.clone();
        let enricher = WeatherEnricher::new(lookup, weather_store, settings);
        Self::new(store, enricher, rules, passwords)
    }

    /// State backed by a fresh in-memory store
    pub fn in_memory(
        lookup: Arc<dyn WeatherLookup>,
        settings: EnrichmentSettings,
        rules: DetectionRules,
        passwords: Passwords,
    ) -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), lookup, settings, rules, passwords)
    }
}
