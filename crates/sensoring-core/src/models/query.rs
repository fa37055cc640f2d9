use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DetectionId, StoredDetection, WeatherCondition};
use crate::error::{Result, SensoringError};

/// Page size used when the caller does not ask for one
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Requested page sizes above this are clamped
pub const MAX_PAGE_SIZE: u32 = 200;

/// Filters and pagination for listing stored detections.
///
/// Every filter is optional and inclusive. Results are ordered by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionQuery {
    pub camera_id: Option<String>,
    pub from_id: Option<DetectionId>,
    pub waste_type: Option<String>,
    pub weather_condition: Option<WeatherCondition>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub confidence_min: Option<f32>,
    pub confidence_max: Option<f32>,
    pub page_number: u32,
    pub page_size: u32,
}

impl Default for DetectionQuery {
    fn default() -> Self {
        Self {
            camera_id: None,
            from_id: None,
            waste_type: None,
            weather_condition: None,
            from: None,
            to: None,
            confidence_min: None,
            confidence_max: None,
            page_number: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl DetectionQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_camera(mut self, camera_id: impl Into<String>) -> Self {
        self.camera_id = Some(camera_id.into());
        self
    }

    pub fn with_page(mut self, page_number: u32, page_size: u32) -> Self {
        self.page_number = page_number;
        self.page_size = page_size;
        self
    }

    /// Collect every violated rule
    pub fn issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.page_number < 1 {
            issues.push("pageNumber must be at least 1.".to_string());
        }
        if self.page_size < 1 {
            issues.push("pageSize must be at least 1.".to_string());
        }
        if let Some(min) = self.confidence_min {
            if !(0.0..=1.0).contains(&min) {
                issues.push("confidenceMin must be between 0.0 and 1.0.".to_string());
            }
        }
        if let Some(max) = self.confidence_max {
            if !(0.0..=1.0).contains(&max) {
                issues.push("confidenceMax must be between 0.0 and 1.0.".to_string());
            }
        }
        if let (Some(min), Some(max)) = (self.confidence_min, self.confidence_max) {
            if min > max {
                issues.push("confidenceMin cannot be greater than confidenceMax.".to_string());
            }
        }
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                issues.push("fromDate cannot be after toDate.".to_string());
            }
        }

        issues
    }

    pub fn validate(&self) -> Result<()> {
        let issues = self.issues();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(SensoringError::InvalidQuery(issues))
        }
    }

    /// Page size after clamping to [`MAX_PAGE_SIZE`]
    pub fn effective_page_size(&self) -> u32 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }

    /// Number of rows to skip for the requested page
    pub fn offset(&self) -> u64 {
        u64::from(self.page_number.saturating_sub(1)) * u64::from(self.effective_page_size())
    }

    /// Whether a stored detection passes every filter
    pub fn matches(&self, detection: &StoredDetection) -> bool {
        let event = &detection.event;

        if let Some(camera_id) = self.camera_id.as_deref() {
            if event.camera_id != camera_id {
                return false;
            }
        }
        if let Some(from_id) = self.from_id {
            if detection.id < from_id {
                return false;
            }
        }
        if let Some(waste_type) = self.waste_type.as_deref() {
            if !event.waste_type.eq_ignore_ascii_case(waste_type) {
                return false;
            }
        }
        if let Some(condition) = self.weather_condition {
            if event.weather.condition() != Some(condition) {
                return false;
            }
        }
        if let Some(from) = self.from {
            if event.timestamp < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if event.timestamp > to {
                return false;
            }
        }
        if let Some(min) = self.confidence_min {
            if event.confidence < min {
                return false;
            }
        }
        if let Some(max) = self.confidence_max {
            if event.confidence > max {
                return false;
            }
        }

        true
    }
}

/// One page of query results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionPage {
    pub page_number: u32,
    pub page_size: u32,
    pub total_pages: u64,
    pub total_count: u64,
    pub data: Vec<StoredDetection>,
}

impl DetectionPage {
    /// Assemble a page, deriving the page count from the total
    pub fn new(query: &DetectionQuery, total_count: u64, data: Vec<StoredDetection>) -> Self {
        let page_size = query.effective_page_size();
        Self {
            page_number: query.page_number,
            page_size,
            total_pages: total_count.div_ceil(u64::from(page_size)),
            total_count,
            data,
        }
    }
}
