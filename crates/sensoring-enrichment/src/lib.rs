//! Sensoring Enrichment - bucket grouping and weather get-or-create
//!
//! Detections that share a rounded location and hour share one weather
//! record. The grouper partitions a batch by bucket; the enricher resolves one
//! record per bucket and attaches it to every member.

pub mod enricher;
pub mod grouper;

pub use enricher::{EnrichedBatch, GroupFailure, Resolution, WeatherEnricher};
pub use grouper::{group, DetectionGroup};
