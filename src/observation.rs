//! Merged observation record produced by one poll cycle.

use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

/// A single reading value.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    Number(f64),
    Text(String),
}

impl Reading {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Reading::Number(num) => Some(*num),
            Reading::Text(_) => None,
        }
    }
}

impl From<f64> for Reading {
    fn from(value: f64) -> Self {
        Reading::Number(value)
    }
}

/// An observation from the station.
///
/// Values are in the units the Davis devices report (US customary):
/// - Temperatures in degrees Fahrenheit
/// - Humidity in percent (0-100)
/// - Pressure in inches of mercury
/// - Wind speed in miles per hour, direction in degrees
/// - Rain in inches, rain rate in inches per hour
/// - Particulate matter in ug/m3
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Timestamp reported by the device (or poll time when it reported none)
    pub timestamp: SystemTime,
    /// Readings keyed by field name (e.g. "outTemp")
    pub fields: BTreeMap<String, Reading>,
}

impl Observation {
    pub fn new(timestamp: SystemTime) -> Self {
        Self {
            timestamp,
            fields: BTreeMap::new(),
        }
    }

    /// Build an observation stamped with a device timestamp in Unix seconds.
    ///
    /// Timestamps before the epoch are clamped to it.
    pub fn at_unix_seconds(ts: i64) -> Self {
        let secs = u64::try_from(ts).unwrap_or(0);
        Self::new(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Reading>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Reading> {
        self.fields.get(field)
    }

    /// Numeric value of a field, if present.
    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Reading::as_f64)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Seconds since the Unix epoch.
    pub fn unix_seconds(&self) -> u64 {
        self.timestamp
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}
