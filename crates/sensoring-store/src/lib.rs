//! Sensoring Store - Storage ports and adapters
//!
//! This crate defines the weather and detection storage ports and provides
//! an in-memory adapter and a PostgreSQL adapter.

pub mod memory;
pub mod ports;
pub mod postgres;

pub use memory::MemoryStore;
pub use ports::{DetectionStore, InsertOutcome, WeatherStore};
pub use postgres::{PostgresConfig, PostgresStore};
