//! Sensoring Core - Domain models, rules, and configuration
//!
//! This crate contains the detection and weather domain types, the bucket
//! rounding rules shared by the enricher and the stores, and the layered
//! service configuration.

pub mod config;
pub mod error;
pub mod models;
pub mod rounding;
pub mod rules;

pub use error::{Result, SensoringError};
pub use rules::DetectionRules;
