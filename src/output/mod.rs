//! Output formatters for station observations.
//!
//! The formatter plus the output stream act as the sink that receives one
//! merged observation per poll cycle. InfluxDB line protocol suits Telegraf's
//! `execd` input; JSON lines suit everything else.

pub mod influxdb;
pub mod json;

use crate::observation::Observation;

/// Trait for formatting observations into output lines.
pub trait OutputFormatter: Send + Sync {
    /// Format an observation as a single line (without trailing newline).
    fn format(&self, observation: &Observation) -> String;
}

/// Available output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Format {
    /// InfluxDB line protocol
    #[default]
    Influxdb,
    /// One JSON object per line
    Json,
}

impl Format {
    /// Build the formatter for this format.
    ///
    /// `measurement` is only used by the InfluxDB formatter; `station` names
    /// the station in every format.
    pub fn formatter(self, measurement: &str, station: &str) -> Box<dyn OutputFormatter> {
        match self {
            Format::Influxdb => Box::new(influxdb::InfluxDbFormatter::new(
                measurement.to_string(),
                station.to_string(),
            )),
            Format::Json => Box::new(json::JsonFormatter::new(station.to_string())),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Format::Influxdb => write!(f, "influxdb"),
            Format::Json => write!(f, "json"),
        }
    }
}
