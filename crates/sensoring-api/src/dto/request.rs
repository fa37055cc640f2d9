use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sensoring_core::models::{DetectionEvent, DetectionId, DetectionQuery, Location, WeatherCondition};
use sensoring_core::{DetectionRules, Result, SensoringError};
use serde::{Deserialize, Serialize};

/// Position as sent and returned on the wire
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationDto {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<Location> for LocationDto {
    fn from(location: Location) -> Self {
        Self {
            latitude: location.latitude,
            longitude: location.longitude,
        }
    }
}

/// Detection submitted by a camera
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionRequest {
    pub camera_id: Option<String>,
    pub date_time: Option<String>,
    pub location: Option<LocationDto>,
    #[serde(rename = "type")]
    pub waste_type: Option<String>,
    pub confidence: Option<f32>,
}

impl DetectionRequest {
    /// Convert into a validated detection, collecting every problem
    pub fn into_event(self, rules: &DetectionRules) -> Result<DetectionEvent> {
        let mut issues = Vec::new();

        let camera_id = self.camera_id.unwrap_or_default();
        let timestamp = match self.date_time.as_deref() {
            None => {
                issues.push("dateTime is required.".to_string());
                None
            }
            Some(raw) => {
                let parsed = parse_timestamp(raw);
                if parsed.is_none() {
                    issues.push("dateTime is not a valid timestamp.".to_string());
                }
                parsed
            }
        };
        if self.location.is_none() {
            issues.push("location is required.".to_string());
        }
        if self.waste_type.is_none() {
            issues.push("type is required.".to_string());
        }
        if self.confidence.is_none() {
            issues.push("confidence is required.".to_string());
        }

        let (Some(timestamp), Some(location), Some(waste_type), Some(confidence)) =
            (timestamp, self.location, self.waste_type, self.confidence)
        else {
            if camera_id.trim().is_empty() {
                issues.insert(0, "cameraId is required.".to_string());
            }
            return Err(SensoringError::InvalidDetection(issues));
        };

        let event = DetectionEvent::new(
            camera_id,
            timestamp,
            Location::new(location.latitude, location.longitude),
            waste_type,
            confidence,
        );
        rules.validate(event)
    }
}

/// Query string for listing detections
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionQueryParams {
    pub camera_id: Option<String>,
    pub from_waste_detection_id: Option<i64>,
    #[serde(rename = "type")]
    pub waste_type: Option<String>,
    pub weather_condition: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub confidence_min: Option<f32>,
    pub confidence_max: Option<f32>,
    pub page_number: Option<u32>,
    pub page_size: Option<u32>,
}

impl DetectionQueryParams {
    /// Convert into a validated query, collecting every problem
    pub fn into_query(self, rules: &DetectionRules) -> Result<DetectionQuery> {
        let mut issues = Vec::new();
        let defaults = DetectionQuery::default();

        let waste_type = match non_blank(self.waste_type) {
            Some(raw) => match rules.check_type_filter(&raw) {
                Ok(canonical) => Some(canonical),
                Err(issue) => {
                    issues.push(issue);
                    None
                }
            },
            None => None,
        };

        let weather_condition = match non_blank(self.weather_condition) {
            Some(raw) => match raw.parse::<WeatherCondition>() {
                Ok(condition) => Some(condition),
                Err(_) => {
                    let allowed: Vec<&str> =
                        WeatherCondition::ALL.iter().map(|c| c.label()).collect();
                    issues.push(format!(
                        "weatherCondition '{}' is not valid. Allowed values: {}.",
                        raw,
                        allowed.join(", ")
                    ));
                    None
                }
            },
            None => None,
        };

        let from = parse_bound(self.from_date, "fromDate", &mut issues);
        let to = parse_bound(self.to_date, "toDate", &mut issues);

        let query = DetectionQuery {
            camera_id: non_blank(self.camera_id),
            from_id: self.from_waste_detection_id.map(DetectionId),
            waste_type,
            weather_condition,
            from,
            to,
            confidence_min: self.confidence_min,
            confidence_max: self.confidence_max,
            page_number: self.page_number.unwrap_or(defaults.page_number),
            page_size: self.page_size.unwrap_or(defaults.page_size),
        };

        issues.extend(query.issues());
        if issues.is_empty() {
            Ok(query)
        } else {
            Err(SensoringError::InvalidQuery(issues))
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_bound(
    value: Option<String>,
    name: &str,
    issues: &mut Vec<String>,
) -> Option<DateTime<Utc>> {
    let raw = non_blank(value)?;
    let parsed = parse_timestamp(&raw);
    if parsed.is_none() {
        issues.push(format!("{} is not a valid timestamp.", name));
    }
    parsed
}

/// Parse an RFC 3339 timestamp, a timestamp without offset (taken as UTC), or
/// a plain date (midnight UTC)
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ts.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ts| ts.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request() -> DetectionRequest {
        DetectionRequest {
            camera_id: Some("cam-1".to_string()),
            date_time: Some("2024-06-18T12:10:00Z".to_string()),
            location: Some(LocationDto {
                latitude: 52.1,
                longitude: 4.3,
            }),
            waste_type: Some("plastic fles".to_string()),
            confidence: Some(0.8),
        }
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 6, 18, 12, 10, 0).unwrap();
        assert_eq!(parse_timestamp("2024-06-18T12:10:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-06-18T14:10:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-06-18T12:10:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-06-18T12:10"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-06-18"),
            Some(Utc.with_ymd_and_hms(2024, 6, 18, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_request_into_event_canonicalizes_type() {
        let event = request().into_event(&DetectionRules::default()).unwrap();
        assert_eq!(event.waste_type, "Plastic Fles");
        assert!(!event.weather.is_present());
    }

    #[test]
    fn test_request_missing_fields() {
        let err = DetectionRequest::default()
            .into_event(&DetectionRules::default())
            .unwrap_err();

        let issues = err.issues().unwrap();
        assert_eq!(issues[0], "cameraId is required.");
        assert!(issues.contains(&"dateTime is required.".to_string()));
        assert!(issues.contains(&"confidence is required.".to_string()));
    }

    #[test]
    fn test_request_rule_violations() {
        let mut req = request();
        req.waste_type = Some("Karton".to_string());
        req.confidence = Some(1.5);

        let err = req.into_event(&DetectionRules::default()).unwrap_err();
        assert_eq!(err.issues().map(|i| i.len()), Some(2));
    }

    #[test]
    fn test_query_params_defaults() {
        let query = DetectionQueryParams::default()
            .into_query(&DetectionRules::default())
            .unwrap();
        assert_eq!(query, DetectionQuery::default());
    }

    #[test]
    fn test_query_params_collect_all_issues() {
        let params = DetectionQueryParams {
            waste_type: Some("Karton".to_string()),
            weather_condition: Some("Winderig".to_string()),
            from_date: Some("not a date".to_string()),
            page_number: Some(0),
            confidence_min: Some(2.0),
            ..DetectionQueryParams::default()
        };

        let err = params.into_query(&DetectionRules::default()).unwrap_err();
        let issues = err.issues().unwrap();

        assert_eq!(issues.len(), 5);
        assert!(issues.iter().any(|i| i.starts_with("type 'Karton' is not allowed")));
        assert!(issues.iter().any(|i| i.starts_with("weatherCondition 'Winderig'")));
        assert!(issues.contains(&"fromDate is not a valid timestamp.".to_string()));
        assert!(issues.contains(&"pageNumber must be at least 1.".to_string()));
        assert!(issues.contains(&"confidenceMin must be between 0.0 and 1.0.".to_string()));
    }

    #[test]
    fn test_query_params_parse_filters() {
        let params = DetectionQueryParams {
            camera_id: Some(" cam-1 ".to_string()),
            waste_type: Some("glas".to_string()),
            weather_condition: Some("regenachtig".to_string()),
            from_date: Some("2024-06-01".to_string()),
            from_waste_detection_id: Some(10),
            page_size: Some(500),
            ..DetectionQueryParams::default()
        };

        let query = params.into_query(&DetectionRules::default()).unwrap();
        assert_eq!(query.camera_id.as_deref(), Some("cam-1"));
        assert_eq!(query.waste_type.as_deref(), Some("Glas"));
        assert_eq!(query.weather_condition, Some(WeatherCondition::Rainy));
        assert_eq!(query.from_id, Some(DetectionId(10)));
        assert_eq!(query.effective_page_size(), 200);
    }
}
