//! Station configuration.
//!
//! Configuration is read from the `[DavisWWW]` section of a TOML file:
//!
//! ```toml
//! [DavisWWW]
//! weather_host = "10.0.0.100"
//! aqi_host = "10.0.0.101"
//! poll_interval = 60
//! weather_transmitter_id = 1
//! mappings = "outTemp:A windSpeed:5 soilTemp1:2"
//! ```
//!
//! [`StationConfig`] mirrors the file; [`StationConfig::validate`] turns it
//! into [`Settings`], the only form the station accepts.

use crate::mapping::{Mapping, parse_mappings};
use crate::sensor::{RainCollector, WindMeasurement};
use crate::transmitter::{ParseTransmitterError, TransmitterId, TransmitterOrder};
use log::{debug, error};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Name of the configuration file section.
pub const SECTION: &str = "DavisWWW";

/// Default hardware name reported by the station.
pub const DEFAULT_HARDWARE: &str = "DavisWWW";

pub const DEFAULT_POLL_INTERVAL_SECS: f64 = 60.0;
pub const MIN_POLL_INTERVAL_SECS: f64 = 5.0;
pub const MAX_POLL_INTERVAL_SECS: f64 = 600.0;
pub const DEFAULT_TIMEOUT_SECS: f64 = 4.0;

/// Transmitters used for weather and soil sensors when none are configured.
pub const DEFAULT_WEATHER_TRANSMITTER: TransmitterId = TransmitterId::Radio(1);
pub const DEFAULT_SOIL_TRANSMITTER: TransmitterId = TransmitterId::Radio(2);

/// Errors returned while loading or validating the configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Must specify weather_host and/or aqi_host")]
    NoHost,
    #[error("Invalid {key}: {source}")]
    Transmitter {
        key: &'static str,
        #[source]
        source: ParseTransmitterError,
    },
    #[error("Invalid timeout {0}: must be a positive number of seconds")]
    Timeout(f64),
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Configuration has no [{0}] section")]
    MissingSection(&'static str),
}

/// A transmitter id as written in the file: `weather_transmitter_id = 1`
/// and `weather_transmitter_id = "A"` are both accepted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TransmitterSetting {
    Number(i64),
    Text(String),
}

impl TransmitterSetting {
    fn resolve(&self, key: &'static str) -> Result<TransmitterId, ConfigError> {
        let parsed = match self {
            TransmitterSetting::Number(n) => u8::try_from(*n)
                .map_err(|_| ParseTransmitterError::Invalid(n.to_string()))
                .and_then(TransmitterId::radio),
            TransmitterSetting::Text(s) => s.parse(),
        };
        parsed.map_err(|source| ConfigError::Transmitter { key, source })
    }
}

/// The `[DavisWWW]` section as written in the configuration file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    /// Hostname or address of the WeatherLink Live
    pub weather_host: Option<String>,
    /// Hostname or address of the AirLink
    pub aqi_host: Option<String>,
    /// Driver name used by the host application; recorded, otherwise unused
    pub driver: Option<String>,
    pub hardware: String,
    /// Seconds between polls
    pub poll_interval: f64,
    /// Per-request timeout in seconds
    pub timeout: f64,
    pub weather_transmitter_id: Option<TransmitterSetting>,
    pub soil_transmitter_id: Option<TransmitterSetting>,
    /// 0 = latest, 1 = 1 minute average, 2 = 2 minute average
    pub wind_measurement: i64,
    /// Rain collector type 1-4
    pub rain_collector: i64,
    /// `field:transmitter` pairs, whitespace or comma separated
    pub mappings: Option<String>,
    pub transmitters_ordered: Option<String>,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            weather_host: None,
            aqi_host: None,
            driver: None,
            hardware: DEFAULT_HARDWARE.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL_SECS,
            timeout: DEFAULT_TIMEOUT_SECS,
            weather_transmitter_id: None,
            soil_transmitter_id: None,
            wind_measurement: 1,
            rain_collector: 1,
            mappings: None,
            transmitters_ordered: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(rename = "DavisWWW")]
    station: Option<StationConfig>,
}

impl StationConfig {
    /// Parse the `[DavisWWW]` section out of a TOML document.
    pub fn from_toml(src: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(src)?;
        file.station.ok_or(ConfigError::MissingSection(SECTION))
    }

    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let src = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&src)
    }

    /// Check the configuration and resolve it into [`Settings`].
    ///
    /// Missing hosts and malformed transmitter ids are errors. Out-of-range
    /// poll intervals, wind averaging and rain collector values are logged
    /// and replaced by their defaults.
    pub fn validate(&self) -> Result<Settings, ConfigError> {
        let hosts = Hosts::new(
            non_empty(self.weather_host.as_deref()),
            non_empty(self.aqi_host.as_deref()),
        )
        .ok_or(ConfigError::NoHost)?;

        if let Some(driver) = &self.driver {
            debug!("configured driver: {driver}");
        }

        let poll_interval = if (MIN_POLL_INTERVAL_SECS..=MAX_POLL_INTERVAL_SECS)
            .contains(&self.poll_interval)
        {
            self.poll_interval
        } else {
            error!(
                "invalid poll_interval {} ({MIN_POLL_INTERVAL_SECS} <= poll_interval <= {MAX_POLL_INTERVAL_SECS}), using default of {DEFAULT_POLL_INTERVAL_SECS}",
                self.poll_interval
            );
            DEFAULT_POLL_INTERVAL_SECS
        };

        if self.timeout <= 0.0 {
            return Err(ConfigError::Timeout(self.timeout));
        }
        let timeout = Duration::try_from_secs_f64(self.timeout)
            .map_err(|_| ConfigError::Timeout(self.timeout))?;

        let weather_transmitter = match &self.weather_transmitter_id {
            Some(setting) => setting.resolve("weather_transmitter_id")?,
            None => DEFAULT_WEATHER_TRANSMITTER,
        };
        let soil_transmitter = match &self.soil_transmitter_id {
            Some(setting) => setting.resolve("soil_transmitter_id")?,
            None => DEFAULT_SOIL_TRANSMITTER,
        };

        let ordering = match self.transmitters_ordered.as_deref() {
            Some(src) => src.parse().map_err(|source| ConfigError::Transmitter {
                key: "transmitters_ordered",
                source,
            })?,
            None => TransmitterOrder::default(),
        };

        Ok(Settings {
            hosts,
            hardware: self.hardware.clone(),
            poll_interval: Duration::from_secs_f64(poll_interval),
            timeout,
            weather_transmitter,
            soil_transmitter,
            wind_measurement: WindMeasurement::from_config(self.wind_measurement),
            rain_collector: RainCollector::from_config(self.rain_collector),
            mappings: self
                .mappings
                .as_deref()
                .map(parse_mappings)
                .unwrap_or_default(),
            ordering,
        })
    }
}

fn non_empty(host: Option<&str>) -> Option<String> {
    host.map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string)
}

/// The reporters to poll. At least one is always present.
#[derive(Debug, Clone, PartialEq)]
pub enum Hosts {
    Weather(String),
    AirQuality(String),
    Both { weather: String, aqi: String },
}

impl Hosts {
    pub fn new(weather: Option<String>, aqi: Option<String>) -> Option<Self> {
        match (weather, aqi) {
            (Some(weather), Some(aqi)) => Some(Hosts::Both { weather, aqi }),
            (Some(weather), None) => Some(Hosts::Weather(weather)),
            (None, Some(aqi)) => Some(Hosts::AirQuality(aqi)),
            (None, None) => None,
        }
    }

    pub fn weather(&self) -> Option<&str> {
        match self {
            Hosts::Weather(host) | Hosts::Both { weather: host, .. } => Some(host),
            Hosts::AirQuality(_) => None,
        }
    }

    pub fn aqi(&self) -> Option<&str> {
        match self {
            Hosts::AirQuality(host) | Hosts::Both { aqi: host, .. } => Some(host),
            Hosts::Weather(_) => None,
        }
    }
}

/// Validated station settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub hosts: Hosts,
    pub hardware: String,
    pub poll_interval: Duration,
    pub timeout: Duration,
    /// Preferred transmitter for weather-group sensors
    pub weather_transmitter: TransmitterId,
    /// Preferred transmitter for soil-group sensors
    pub soil_transmitter: TransmitterId,
    pub wind_measurement: WindMeasurement,
    pub rain_collector: RainCollector,
    /// Per-field overrides, later entries win
    pub mappings: Vec<Mapping>,
    pub ordering: TransmitterOrder,
}

/// Parse a duration from a human-readable string.
///
/// Supports the following suffixes:
/// - `s` or no suffix: seconds
/// - `m`: minutes
/// - `h`: hours
/// - `ms`: milliseconds
///
/// # Examples
/// ```
/// use davis_www::config::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
/// assert_eq!(parse_duration("1m").unwrap(), Duration::from_secs(60));
/// assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
/// ```
pub fn parse_duration(src: &str) -> Result<Duration, String> {
    let src = src.trim();

    if src.is_empty() {
        return Err("empty duration string".to_string());
    }

    let (num, scale_ms, unit) = if let Some(num) = src.strip_suffix("ms") {
        (num, 1, "milliseconds")
    } else if let Some(num) = src.strip_suffix('h') {
        (num, 3_600_000, "hours")
    } else if let Some(num) = src.strip_suffix('m') {
        (num, 60_000, "minutes")
    } else if let Some(num) = src.strip_suffix('s') {
        (num, 1_000, "seconds")
    } else {
        (src, 1_000, "duration")
    };

    let invalid = || format!("invalid {unit}: {num}");
    let value: u64 = num.trim().parse().map_err(|_| invalid())?;
    let millis = value.checked_mul(scale_ms).ok_or_else(invalid)?;
    Ok(Duration::from_millis(millis))
}
