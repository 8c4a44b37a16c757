//! The reporter adapter.
//!
//! A [`Station`] polls the configured Davis reporters once per call to
//! [`Station::poll`], picks each field's value from the right transmitter
//! and returns a single merged [`Observation`]. It owns no timer: the caller
//! decides when to poll again.

use crate::conditions::{Payload, StationData, parse_current_conditions};
use crate::config::Settings;
use crate::fetch::{FetchError, Fetcher, current_conditions_url};
use crate::observation::{Observation, Reading};
use crate::sensor::{SensorInfo, Transform, sensor_table};
use crate::transmitter::{TransmitterId, TransmitterOrder};
use log::{debug, info, warn};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::time::SystemTime;
use thiserror::Error;

/// Kind of reporter a host was configured as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// WeatherLink Live (`weather_host`)
    Weather,
    /// AirLink (`aqi_host`)
    AirQuality,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Weather => write!(f, "weather"),
            Source::AirQuality => write!(f, "air quality"),
        }
    }
}

/// A failure to get data from one reporter.
#[derive(Error, Debug)]
#[error("{source_kind} host {host}: {error}")]
pub struct SourceFailure {
    pub source_kind: Source,
    pub host: String,
    #[source]
    pub error: FetchError,
}

/// Every configured reporter failed during a cycle.
///
/// Not fatal: the next cycle tries again.
#[derive(Error, Debug)]
#[error("no reporter answered ({})", summarize(.failures))]
pub struct TransientFetchError {
    pub failures: Vec<SourceFailure>,
}

fn summarize(failures: &[SourceFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone)]
struct Reporter {
    source: Source,
    host: String,
    url: String,
}

impl Reporter {
    fn new(source: Source, host: &str) -> Self {
        Reporter {
            source,
            host: host.to_string(),
            url: current_conditions_url(host),
        }
    }
}

/// Tracks the monthly rain total between cycles to report rain per cycle.
#[derive(Debug, Clone)]
pub struct RainTracker {
    scale: f64,
    last_total: Option<f64>,
}

impl RainTracker {
    /// `scale` is inches per reported count.
    pub fn new(scale: f64) -> Self {
        RainTracker {
            scale,
            last_total: None,
        }
    }

    pub fn scale(&self, counts: f64) -> f64 {
        counts * self.scale
    }

    /// Rain that fell since the previous call, in inches.
    ///
    /// The first call only records the total and returns 0. A total lower
    /// than the previous one means the monthly counter was reset, so the
    /// whole new total is reported.
    pub fn delta(&mut self, monthly_counts: f64) -> f64 {
        let total = self.scale(monthly_counts);
        let previous = match self.last_total {
            None => total,
            Some(last) if total < last => 0.0,
            Some(last) => last,
        };
        self.last_total = Some(total);
        total - previous
    }
}

/// Polls Davis reporters and merges their readings.
pub struct Station<'a> {
    fetcher: &'a dyn Fetcher,
    hardware: String,
    reporters: Vec<Reporter>,
    sensors: Vec<SensorInfo>,
    /// Preferred transmitter per device condition name
    preferred: HashMap<&'static str, TransmitterId>,
    ordering: TransmitterOrder,
    rain: RainTracker,
}

impl<'a> Station<'a> {
    /// Set up a station from validated settings.
    pub fn new(settings: &Settings, fetcher: &'a dyn Fetcher) -> Self {
        let sensors = sensor_table(settings.wind_measurement);

        let mut preferred = HashMap::new();
        for sensor in &sensors {
            let txid = sensor
                .group
                .default_transmitter(settings.weather_transmitter, settings.soil_transmitter);
            preferred.insert(sensor.condition, txid);
        }
        for mapping in &settings.mappings {
            match sensors.iter().find(|s| s.field == mapping.field) {
                Some(sensor) => {
                    preferred.insert(sensor.condition, mapping.transmitter);
                }
                None => warn!("ignoring mapping for unknown field '{}'", mapping.field),
            }
        }

        // Air quality first so the weather host's timestamp wins when both answer
        let mut reporters = Vec::new();
        if let Some(host) = settings.hosts.aqi() {
            reporters.push(Reporter::new(Source::AirQuality, host));
        }
        if let Some(host) = settings.hosts.weather() {
            reporters.push(Reporter::new(Source::Weather, host));
        }

        for reporter in &reporters {
            info!("polling {} host at {}", reporter.source, reporter.url);
        }
        debug!("rain collector: {} per tip", settings.rain_collector);

        Station {
            fetcher,
            hardware: settings.hardware.clone(),
            reporters,
            sensors,
            preferred,
            ordering: settings.ordering.clone(),
            rain: RainTracker::new(settings.rain_collector.scale()),
        }
    }

    pub fn hardware_name(&self) -> &str {
        &self.hardware
    }

    async fn fetch_payload(&self, reporter: &Reporter) -> Result<Payload, FetchError> {
        let body = self.fetcher.fetch(&reporter.url).await?;
        Ok(parse_current_conditions(&body)?)
    }

    /// Run one poll cycle.
    ///
    /// A reporter that fails is logged and skipped; the cycle only fails when
    /// none of the configured reporters returned data.
    pub async fn poll(&mut self) -> Result<Observation, TransientFetchError> {
        let mut data = StationData::default();
        let mut timestamp = None;
        let mut failures = Vec::new();

        for reporter in &self.reporters {
            match self.fetch_payload(reporter).await {
                Ok(payload) => {
                    debug!(
                        "{} host {} reported {} condition records",
                        reporter.source,
                        reporter.host,
                        payload.conditions.len()
                    );
                    timestamp = Some(payload.ts);
                    data.absorb(&payload);
                }
                Err(error) => {
                    let failure = SourceFailure {
                        source_kind: reporter.source,
                        host: reporter.host.clone(),
                        error,
                    };
                    warn!("{failure}");
                    failures.push(failure);
                }
            }
        }

        if failures.len() == self.reporters.len() {
            return Err(TransientFetchError { failures });
        }

        let mut observation = match timestamp {
            Some(ts) => Observation::at_unix_seconds(ts),
            None => Observation::new(SystemTime::now()),
        };

        for sensor in &self.sensors {
            let Some(value) = select(&self.preferred, &self.ordering, &data, sensor.condition)
            else {
                continue;
            };
            let reading = match (value, sensor.transform) {
                (Value::Number(num), transform) => {
                    let Some(num) = num.as_f64() else { continue };
                    let num = match transform {
                        Transform::None => num,
                        Transform::RainScale => self.rain.scale(num),
                        Transform::RainDelta => self.rain.delta(num),
                    };
                    Reading::Number(num)
                }
                (Value::String(text), Transform::None) => Reading::Text(text.clone()),
                (Value::Bool(flag), Transform::None) => Reading::Number(f64::from(u8::from(*flag))),
                (other, _) => {
                    debug!("ignoring non-numeric {}: {other}", sensor.condition);
                    continue;
                }
            };
            observation.insert(sensor.field, reading);
        }

        Ok(observation)
    }
}

/// Pick the value of `condition`: from its preferred transmitter when that
/// one reported it, otherwise from the first transmitter in `ordering` that did.
fn select<'d>(
    preferred: &HashMap<&'static str, TransmitterId>,
    ordering: &TransmitterOrder,
    data: &'d StationData,
    condition: &str,
) -> Option<&'d Value> {
    preferred
        .get(condition)
        .and_then(|txid| data.get(*txid, condition))
        .or_else(|| ordering.iter().find_map(|txid| data.get(txid, condition)))
}
