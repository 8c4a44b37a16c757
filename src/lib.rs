//! `davis-www` library.
//!
//! Polls Davis Instruments web reporters (WeatherLink Live and AirLink) and
//! merges their current conditions into one observation per cycle.
//!
//! The binary (`src/main.rs`) is responsible for logging setup and process
//! exit codes. The poll loop lives in [`crate::app`] and the reporter adapter
//! in [`crate::station`], both testable with an injected [`Fetcher`].

pub mod app;
pub mod conditions;
pub mod config;
pub mod fetch;
pub mod mapping;
pub mod observation;
pub mod output;
pub mod sensor;
pub mod station;
pub mod transmitter;

// Re-export commonly used types at the crate root
pub use config::{ConfigError, Settings, StationConfig};
pub use fetch::{FetchError, Fetcher, HttpFetcher};
pub use mapping::{Mapping, parse_mapping};
pub use observation::{Observation, Reading};
pub use output::OutputFormatter;
pub use output::influxdb::InfluxDbFormatter;
pub use output::json::JsonFormatter;
pub use station::{Station, TransientFetchError};
pub use transmitter::TransmitterId;
