//! Sensoring Weather - hourly weather lookup port and the Open-Meteo adapter

pub mod error;
pub mod open_meteo;
pub mod ports;

pub use error::WeatherError;
pub use open_meteo::OpenMeteoClient;
pub use ports::{closest_index, closest_observation, HourlyObservation, WeatherLookup};
