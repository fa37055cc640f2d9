//! Acceptance rules for submitted detections
//!
//! The allowed waste types and the accepted timestamp and confidence ranges are
//! built once from configuration at startup and shared read-only.

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{Result, SensoringError};
use crate::models::DetectionEvent;

/// Waste types accepted when no configuration overrides them
pub const DEFAULT_WASTE_TYPES: [&str; 8] = [
    "Glas",
    "Papier",
    "Plastic",
    "Plastic Fles",
    "Plastic Overig",
    "Rookwaar",
    "Blikje",
    "Gft",
];

/// Immutable validation rules for detections and query filters
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionRules {
    allowed_types: Vec<String>,
    valid_from: DateTime<Utc>,
    valid_until: DateTime<Utc>,
    confidence_min: f32,
    confidence_max: f32,
}

impl Default for DetectionRules {
    fn default() -> Self {
        Self {
            allowed_types: DEFAULT_WASTE_TYPES.iter().map(|t| t.to_string()).collect(),
            valid_from: start_of_day(NaiveDate::from_ymd_opt(2020, 1, 1)),
            valid_until: end_of_day(NaiveDate::from_ymd_opt(2099, 12, 31)),
            confidence_min: 0.0,
            confidence_max: 1.0,
        }
    }
}

impl DetectionRules {
    /// Build rules, rejecting empty or inverted ranges.
    ///
    /// `valid_from` and `valid_until` are inclusive calendar days.
    pub fn new(
        allowed_types: Vec<String>,
        valid_from: NaiveDate,
        valid_until: NaiveDate,
        confidence_min: f32,
        confidence_max: f32,
    ) -> Result<Self> {
        let allowed_types: Vec<String> = allowed_types
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        if allowed_types.is_empty() {
            return Err(SensoringError::ConfigInvalid {
                key: "detection.allowed_types".to_string(),
                reason: "at least one waste type is required".to_string(),
            });
        }

        if valid_from > valid_until {
            return Err(SensoringError::ConfigInvalid {
                key: "detection.valid_from".to_string(),
                reason: format!("{} is after valid_until {}", valid_from, valid_until),
            });
        }

        if !(0.0..=1.0).contains(&confidence_min)
            || !(0.0..=1.0).contains(&confidence_max)
            || confidence_min > confidence_max
        {
            return Err(SensoringError::ConfigInvalid {
                key: "detection.confidence_min".to_string(),
                reason: format!(
                    "confidence range [{}, {}] must be ordered and within [0.0, 1.0]",
                    confidence_min, confidence_max
                ),
            });
        }

        Ok(Self {
            allowed_types,
            valid_from: start_of_day(Some(valid_from)),
            valid_until: end_of_day(Some(valid_until)),
            confidence_min,
            confidence_max,
        })
    }

    pub fn allowed_types(&self) -> &[String] {
        &self.allowed_types
    }

    /// Canonical spelling of a waste type, matched without regard to case
    pub fn canonical_type(&self, waste_type: &str) -> Option<&str> {
        let needle = waste_type.trim();
        self.allowed_types
            .iter()
            .find(|t| t.eq_ignore_ascii_case(needle))
            .map(String::as_str)
    }

    fn type_issue(&self, waste_type: &str) -> String {
        format!(
            "type '{}' is not allowed. Allowed values: {}.",
            waste_type,
            self.allowed_types.join(", ")
        )
    }

    /// Check a query type filter and return its canonical spelling
    pub fn check_type_filter(&self, waste_type: &str) -> std::result::Result<String, String> {
        self.canonical_type(waste_type)
            .map(str::to_string)
            .ok_or_else(|| self.type_issue(waste_type))
    }

    /// Collect every rule the detection violates
    pub fn issues(&self, event: &DetectionEvent) -> Vec<String> {
        let mut issues = Vec::new();

        if event.camera_id.trim().is_empty() {
            issues.push("cameraId is required.".to_string());
        }

        if event.timestamp < self.valid_from || event.timestamp > self.valid_until {
            issues.push(format!(
                "dateTime must be between {} and {}.",
                self.valid_from.format("%Y-%m-%d"),
                self.valid_until.format("%Y-%m-%d")
            ));
        }

        issues.extend(event.location.issues());

        if self.canonical_type(&event.waste_type).is_none() {
            issues.push(self.type_issue(&event.waste_type));
        }

        if !event.confidence.is_finite()
            || event.confidence < self.confidence_min
            || event.confidence > self.confidence_max
        {
            issues.push(format!(
                "confidence must be between {:.1} and {:.1}.",
                self.confidence_min, self.confidence_max
            ));
        }

        issues
    }

    /// Validate a submitted detection, normalising camera id and waste type
    pub fn validate(&self, mut event: DetectionEvent) -> Result<DetectionEvent> {
        let issues = self.issues(&event);
        if !issues.is_empty() {
            return Err(SensoringError::InvalidDetection(issues));
        }

        if let Some(canonical) = self.canonical_type(&event.waste_type) {
            event.waste_type = canonical.to_string();
        }
        event.camera_id = event.camera_id.trim().to_string();

        Ok(event)
    }
}

fn start_of_day(date: Option<NaiveDate>) -> DateTime<Utc> {
    date.and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn end_of_day(date: Option<NaiveDate>) -> DateTime<Utc> {
    date.and_then(|d| d.and_hms_nano_opt(23, 59, 59, 999_999_999))
        .map(|dt| dt.and_utc())
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
