mod request;
mod response;

pub use request::{parse_timestamp, DetectionQueryParams, DetectionRequest, LocationDto};
pub use response::{
    BatchResponse, DetectionResponse, EnrichmentSummary, FailedGroup, HealthResponse, PageResponse,
};
