use crate::error::{Result, SensoringError};
use crate::rules::{DetectionRules, DEFAULT_WASTE_TYPES};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default Open-Meteo forecast endpoint
pub const DEFAULT_WEATHER_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Where a setting's current value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl ConfigSource {
    /// Environment beats file beats default
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
        }
    }
}

/// A setting tagged with the layer that supplied it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Replace the value only when `source` outranks the current one
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Settings for the weather enricher
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentSettings {
    /// Weather groups resolved concurrently within one batch
    pub max_concurrent_lookups: usize,
    /// Upper bound on a single weather lookup
    pub lookup_timeout: Duration,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            max_concurrent_lookups: 4,
            lookup_timeout: Duration::from_secs(10),
        }
    }
}

/// Service settings resolved from defaults, an optional TOML file and the
/// environment, in that order
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub allowed_types: ConfigValue<Vec<String>>,
    pub valid_from: ConfigValue<NaiveDate>,
    pub valid_until: ConfigValue<NaiveDate>,
    pub confidence_min: ConfigValue<f32>,
    pub confidence_max: ConfigValue<f32>,
    pub max_concurrent_lookups: ConfigValue<usize>,
    pub weather_base_url: ConfigValue<String>,
    pub weather_timeout_secs: ConfigValue<u64>,
}

impl LayeredConfig {
    pub fn with_defaults() -> Self {
        let defaults = EnrichmentSettings::default();
        Self {
            allowed_types: ConfigValue::new(
                DEFAULT_WASTE_TYPES.iter().map(|t| t.to_string()).collect(),
                ConfigSource::Default,
            ),
            valid_from: ConfigValue::new(
                NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default(),
                ConfigSource::Default,
            ),
            valid_until: ConfigValue::new(
                NaiveDate::from_ymd_opt(2099, 12, 31).unwrap_or_default(),
                ConfigSource::Default,
            ),
            confidence_min: ConfigValue::new(0.0, ConfigSource::Default),
            confidence_max: ConfigValue::new(1.0, ConfigSource::Default),
            max_concurrent_lookups: ConfigValue::new(
                defaults.max_concurrent_lookups,
                ConfigSource::Default,
            ),
            weather_base_url: ConfigValue::new(
                DEFAULT_WEATHER_URL.to_string(),
                ConfigSource::Default,
            ),
            weather_timeout_secs: ConfigValue::new(
                defaults.lookup_timeout.as_secs(),
                ConfigSource::Default,
            ),
        }
    }

    /// Apply the `[detection]`, `[enrichment]` and `[weather]` tables of a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| SensoringError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("cannot read {}: {}", path.as_ref().display(), e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| SensoringError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("not valid TOML: {}", e),
            })?;

        if let Some(detection) = file_config.detection {
            if let Some(types) = detection.allowed_types {
                self.allowed_types.update(types, ConfigSource::File);
            }
            if let Some(valid_from) = detection.valid_from {
                self.valid_from.update(valid_from, ConfigSource::File);
            }
            if let Some(valid_until) = detection.valid_until {
                self.valid_until.update(valid_until, ConfigSource::File);
            }
            if let Some(min) = detection.confidence_min {
                self.confidence_min.update(min, ConfigSource::File);
            }
            if let Some(max) = detection.confidence_max {
                self.confidence_max.update(max, ConfigSource::File);
            }
        }

        if let Some(enrichment) = file_config.enrichment {
            if let Some(limit) = enrichment.max_concurrent_lookups {
                self.max_concurrent_lookups.update(limit, ConfigSource::File);
            }
        }

        if let Some(weather) = file_config.weather {
            if let Some(base_url) = weather.base_url {
                self.weather_base_url.update(base_url, ConfigSource::File);
            }
            if let Some(timeout) = weather.timeout_secs {
                self.weather_timeout_secs.update(timeout, ConfigSource::File);
            }
        }

        Ok(self)
    }

    /// Apply `SENSORING_*` environment overrides. Unparseable values are
    /// logged and ignored.
    pub fn load_from_env(mut self) -> Self {
        // SENSORING_ALLOWED_TYPES
        if let Ok(types_str) = env::var("SENSORING_ALLOWED_TYPES") {
            let types = parse_type_list(&types_str);
            if types.is_empty() {
                tracing::warn!(
                    "Invalid SENSORING_ALLOWED_TYPES value '{}': expected a comma separated list",
                    types_str
                );
            } else {
                self.allowed_types.update(types, ConfigSource::Environment);
            }
        }

        // SENSORING_VALID_FROM / SENSORING_VALID_UNTIL
        if let Ok(date_str) = env::var("SENSORING_VALID_FROM") {
            match parse_date(&date_str) {
                Ok(date) => self.valid_from.update(date, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid SENSORING_VALID_FROM value '{}': expected YYYY-MM-DD",
                    date_str
                ),
            }
        }
        if let Ok(date_str) = env::var("SENSORING_VALID_UNTIL") {
            match parse_date(&date_str) {
                Ok(date) => self.valid_until.update(date, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid SENSORING_VALID_UNTIL value '{}': expected YYYY-MM-DD",
                    date_str
                ),
            }
        }

        // SENSORING_CONFIDENCE_MIN / SENSORING_CONFIDENCE_MAX
        if let Ok(min_str) = env::var("SENSORING_CONFIDENCE_MIN") {
            match min_str.trim().parse::<f32>() {
                Ok(min) => self.confidence_min.update(min, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid SENSORING_CONFIDENCE_MIN value '{}': expected a number",
                    min_str
                ),
            }
        }
        if let Ok(max_str) = env::var("SENSORING_CONFIDENCE_MAX") {
            match max_str.trim().parse::<f32>() {
                Ok(max) => self.confidence_max.update(max, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid SENSORING_CONFIDENCE_MAX value '{}': expected a number",
                    max_str
                ),
            }
        }

        // SENSORING_MAX_CONCURRENT_LOOKUPS
        if let Ok(limit_str) = env::var("SENSORING_MAX_CONCURRENT_LOOKUPS") {
            match limit_str.trim().parse::<usize>() {
                Ok(limit) if limit > 0 => {
                    self.max_concurrent_lookups.update(limit, ConfigSource::Environment)
                }
                _ => tracing::warn!(
                    "Invalid SENSORING_MAX_CONCURRENT_LOOKUPS value '{}': expected a positive integer",
                    limit_str
                ),
            }
        }

        // SENSORING_WEATHER_URL
        if let Ok(base_url) = env::var("SENSORING_WEATHER_URL") {
            self.weather_base_url.update(base_url, ConfigSource::Environment);
        }

        // SENSORING_WEATHER_TIMEOUT_SECS
        if let Ok(timeout_str) = env::var("SENSORING_WEATHER_TIMEOUT_SECS") {
            match timeout_str.trim().parse::<u64>() {
                Ok(timeout) if timeout > 0 => {
                    self.weather_timeout_secs.update(timeout, ConfigSource::Environment)
                }
                _ => tracing::warn!(
                    "Invalid SENSORING_WEATHER_TIMEOUT_SECS value '{}': expected a positive integer",
                    timeout_str
                ),
            }
        }

        self
    }

    /// Build the immutable detection rules
    pub fn detection_rules(&self) -> Result<DetectionRules> {
        DetectionRules::new(
            self.allowed_types.value.clone(),
            self.valid_from.value,
            self.valid_until.value,
            self.confidence_min.value,
            self.confidence_max.value,
        )
    }

    /// Settings for the weather enricher
    pub fn enrichment_settings(&self) -> Result<EnrichmentSettings> {
        if self.max_concurrent_lookups.value == 0 {
            return Err(SensoringError::ConfigInvalid {
                key: "enrichment.max_concurrent_lookups".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.weather_timeout_secs.value == 0 {
            return Err(SensoringError::ConfigInvalid {
                key: "weather.timeout_secs".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(EnrichmentSettings {
            max_concurrent_lookups: self.max_concurrent_lookups.value,
            lookup_timeout: Duration::from_secs(self.weather_timeout_secs.value),
        })
    }

    /// Every setting as `key -> (rendered value, source)`
    pub fn to_inspection_map(&self) -> BTreeMap<String, (String, ConfigSource)> {
        let mut map = BTreeMap::new();

        map.insert(
            "detection.allowed_types".to_string(),
            (self.allowed_types.value.join(", "), self.allowed_types.source),
        );
        map.insert(
            "detection.valid_from".to_string(),
            (self.valid_from.value.to_string(), self.valid_from.source),
        );
        map.insert(
            "detection.valid_until".to_string(),
            (self.valid_until.value.to_string(), self.valid_until.source),
        );
        map.insert(
            "detection.confidence_min".to_string(),
            (self.confidence_min.value.to_string(), self.confidence_min.source),
        );
        map.insert(
            "detection.confidence_max".to_string(),
            (self.confidence_max.value.to_string(), self.confidence_max.source),
        );
        map.insert(
            "enrichment.max_concurrent_lookups".to_string(),
            (self.max_concurrent_lookups.value.to_string(), self.max_concurrent_lookups.source),
        );
        map.insert(
            "weather.base_url".to_string(),
            (self.weather_base_url.value.clone(), self.weather_base_url.source),
        );
        map.insert(
            "weather.timeout_secs".to_string(),
            (self.weather_timeout_secs.value.to_string(), self.weather_timeout_secs.source),
        );

        map
    }
}

/// Shape of the TOML settings file; every key is optional
#[derive(Debug, Default, Deserialize, Serialize)]
struct FileConfig {
    detection: Option<DetectionSection>,
    enrichment: Option<EnrichmentSection>,
    weather: Option<WeatherSection>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct DetectionSection {
    allowed_types: Option<Vec<String>>,
    valid_from: Option<NaiveDate>,
    valid_until: Option<NaiveDate>,
    confidence_min: Option<f32>,
    confidence_max: Option<f32>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct EnrichmentSection {
    max_concurrent_lookups: Option<usize>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct WeatherSection {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

/// Parse a comma separated list of waste types
pub fn parse_type_list(s: &str) -> Vec<String> {
    s.split(',').map(str::trim).filter(|t| !t.is_empty()).map(str::to_string).collect()
}

/// Parse a calendar date in YYYY-MM-DD form
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| SensoringError::ConfigInvalid {
        key: "date".to_string(),
        reason: format!("Invalid date '{}': {}", s, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_match_rules_and_settings() {
        let config = LayeredConfig::with_defaults();
        assert_eq!(config.allowed_types.value.len(), DEFAULT_WASTE_TYPES.len());
        assert_eq!(config.allowed_types.source, ConfigSource::Default);
        assert_eq!(config.valid_from.value, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert_eq!(config.weather_base_url.value, DEFAULT_WEATHER_URL);
        assert_eq!(config.weather_timeout_secs.value, 10);
        assert_eq!(config.max_concurrent_lookups.value, 4);
    }

    #[test]
    fn test_higher_layer_wins() {
        let mut limit = ConfigValue::new(4usize, ConfigSource::Default);

        limit.update(8, ConfigSource::File);
        assert_eq!((limit.value, limit.source), (8, ConfigSource::File));

        limit.update(2, ConfigSource::Environment);
        assert_eq!((limit.value, limit.source), (2, ConfigSource::Environment));

        // a later file value cannot undo an environment override
        limit.update(16, ConfigSource::File);
        assert_eq!((limit.value, limit.source), (2, ConfigSource::Environment));

        // equal precedence keeps the first value
        limit.update(32, ConfigSource::Environment);
        assert_eq!(limit.value, 2);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut toml_file = NamedTempFile::new().unwrap();
        writeln!(
            toml_file,
            r#"
[detection]
allowed_types = ["Glas", "Blikje"]
valid_from = "2024-01-01"
confidence_min = 0.5

[enrichment]
max_concurrent_lookups = 8

[weather]
base_url = "http://localhost:8080/v1/forecast"
timeout_secs = 3
"#
        )
        .unwrap();

        let config = LayeredConfig::with_defaults()
            .load_from_file(toml_file.path())
            .unwrap();

        assert_eq!(config.allowed_types.value, vec!["Glas", "Blikje"]);
        assert_eq!(config.allowed_types.source, ConfigSource::File);
        assert_eq!(config.valid_from.value, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(config.valid_until.source, ConfigSource::Default);
        assert_eq!(config.confidence_min.value, 0.5);
        assert_eq!(config.max_concurrent_lookups.value, 8);
        assert_eq!(config.weather_base_url.value, "http://localhost:8080/v1/forecast");

        let settings = config.enrichment_settings().unwrap();
        assert_eq!(settings.lookup_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_detection_rules_from_config() {
        let config = LayeredConfig::with_defaults();
        let rules = config.detection_rules().unwrap();
        assert_eq!(rules, DetectionRules::default());
    }

    #[test]
    fn test_invalid_rules_rejected() {
        let mut config = LayeredConfig::with_defaults();
        config.confidence_min.update(0.9, ConfigSource::File);
        config.confidence_max.update(0.1, ConfigSource::File);
        assert!(config.detection_rules().is_err());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = LayeredConfig::with_defaults();
        config.max_concurrent_lookups.update(0, ConfigSource::File);
        assert!(config.enrichment_settings().is_err());
    }

    #[test]
    fn test_parse_type_list() {
        assert_eq!(parse_type_list("Glas, Papier ,,Gft"), vec!["Glas", "Papier", "Gft"]);
        assert!(parse_type_list(" , ").is_empty());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-06-18").unwrap(), NaiveDate::from_ymd_opt(2024, 6, 18).unwrap());
        assert!(parse_date("18-06-2024").is_err());
    }

    #[test]
    fn test_inspection_lists_every_setting() {
        let settings = LayeredConfig::with_defaults().to_inspection_map();
        assert_eq!(settings.len(), 8);

        let keys: Vec<&str> = settings.keys().map(String::as_str).collect();
        assert_eq!(keys.first(), Some(&"detection.allowed_types"));
        assert_eq!(keys.last(), Some(&"weather.timeout_secs"));

        let (timeout, source) = &settings["weather.timeout_secs"];
        assert_eq!(timeout, "10");
        assert_eq!(*source, ConfigSource::Default);
    }
}
