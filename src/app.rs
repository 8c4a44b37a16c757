//! Core application runner for `davis-www`.
//!
//! This module is decoupled from process setup (logging, exit codes) so the
//! poll loop can be tested deterministically with an injected fetcher and
//! output stream.

use crate::config::{ConfigError, Settings, StationConfig};
use crate::fetch::{FetchError, Fetcher};
use crate::mapping::Mapping;
use crate::observation::Observation;
use crate::output::{Format, OutputFormatter};
use crate::station::Station;
use clap::Parser;
use log::{debug, info, warn};
use std::io;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Command line options.
#[derive(Parser, Debug, Clone)]
#[command(author, about, version)]
pub struct Options {
    /// TOML configuration file with a [DavisWWW] section.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Hostname or address of the WeatherLink Live (overrides the config file).
    #[arg(long)]
    pub weather_host: Option<String>,

    /// Hostname or address of the AirLink (overrides the config file).
    #[arg(long)]
    pub aqi_host: Option<String>,

    /// Time between polls, 5s to 10m.
    /// Accepts duration with suffix: 30s, 1m, 500ms.
    /// Without suffix, value is interpreted as seconds.
    #[arg(long, value_parser = crate::config::parse_duration)]
    pub poll_interval: Option<Duration>,

    /// Read a field from a specific transmitter, applied after the config file mappings.
    /// Format: --map outTemp:A
    #[arg(long = "map", value_parser = crate::mapping::parse_mapping, value_name = "FIELD:TX")]
    pub mappings: Vec<Mapping>,

    /// Output format
    #[arg(long, default_value_t, value_enum)]
    pub format: Format,

    /// The name of the measurement in InfluxDB line protocol.
    #[arg(long, default_value = "davis_www")]
    pub influxdb_measurement: String,

    /// Stop after this many poll cycles instead of running forever.
    #[arg(long)]
    pub count: Option<u64>,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Options {
    /// Load the config file (if any), apply command line overrides and validate.
    pub fn load_settings(&self) -> Result<Settings, ConfigError> {
        let mut config = match &self.config {
            Some(path) => StationConfig::load(path)?,
            None => StationConfig::default(),
        };

        if let Some(host) = &self.weather_host {
            config.weather_host = Some(host.clone());
        }
        if let Some(host) = &self.aqi_host {
            config.aqi_host = Some(host.clone());
        }
        if let Some(interval) = self.poll_interval {
            config.poll_interval = interval.as_secs_f64();
        }

        let mut settings = config.validate()?;
        settings.mappings.extend(self.mappings.iter().cloned());
        Ok(settings)
    }
}

/// Errors returned by the core run loop.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Counts of what happened during a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub emitted: u64,
    pub failed: u64,
}

fn write_observation(
    formatter: &dyn OutputFormatter,
    observation: &Observation,
    out: &mut dyn Write,
) -> io::Result<()> {
    let line = formatter.format(observation);
    writeln!(out, "{line}")?;
    out.flush()
}

/// Run the poll loop, writing one formatted line per successful cycle to `out`.
///
/// - Cycles where every reporter failed are logged and retried after the poll interval.
/// - Cycles that produced no readings write nothing.
/// - The loop ends after `options.count` cycles, or never when no count is given.
pub async fn run_with_io(
    options: &Options,
    settings: &Settings,
    fetcher: &dyn Fetcher,
    out: &mut dyn Write,
) -> Result<RunSummary, RunError> {
    let mut station = Station::new(settings, fetcher);
    let formatter = options
        .format
        .formatter(&options.influxdb_measurement, station.hardware_name());
    let mut summary = RunSummary::default();

    info!(
        "{} writing {} every {:?}",
        station.hardware_name(),
        options.format,
        settings.poll_interval
    );

    loop {
        summary.cycles += 1;
        match station.poll().await {
            // A record without fields has no valid line protocol form
            Ok(observation) if observation.is_empty() => {
                debug!("reporters answered without any readings, nothing to write");
            }
            Ok(observation) => {
                write_observation(formatter.as_ref(), &observation, out)?;
                summary.emitted += 1;
            }
            Err(error) => {
                warn!("{error}; retrying in {:?}", settings.poll_interval);
                summary.failed += 1;
            }
        }

        if options.count.is_some_and(|count| summary.cycles >= count) {
            break;
        }
        tokio::time::sleep(settings.poll_interval).await;
    }

    Ok(summary)
}
