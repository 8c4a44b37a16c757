//! InfluxDB line protocol output formatter.

use crate::observation::{Observation, Reading};
use crate::output::OutputFormatter;
use std::collections::BTreeMap;
use std::fmt;
use std::time::SystemTime;

/// Field values for InfluxDB line protocol
#[derive(Debug, PartialEq)]
pub enum FieldValue {
    Float(f64),
    String(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FieldValue::Float(num) => write!(f, "{num}"),
            FieldValue::String(s) => {
                write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
            }
        }
    }
}

impl From<&Reading> for FieldValue {
    fn from(reading: &Reading) -> Self {
        match reading {
            Reading::Number(num) => FieldValue::Float(*num),
            Reading::Text(text) => FieldValue::String(text.clone()),
        }
    }
}

/// Escape commas, equals signs and spaces in tag keys/values and field keys.
fn escape_key(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    for c in src.chars() {
        if matches!(c, ',' | '=' | ' ') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Data point in InfluxDB line protocol
#[derive(Debug)]
pub struct DataPoint {
    pub measurement: String,
    pub tag_set: BTreeMap<String, String>,
    pub field_set: BTreeMap<String, FieldValue>,
    pub timestamp: Option<SystemTime>,
}

fn fmt_tags(data_point: &DataPoint, fmt: &mut fmt::Formatter) -> fmt::Result {
    for (key, value) in data_point.tag_set.iter() {
        write!(fmt, ",{}={}", escape_key(key), escape_key(value))?;
    }
    Ok(())
}

fn fmt_fields(data_point: &DataPoint, fmt: &mut fmt::Formatter) -> fmt::Result {
    let mut first = true;
    for (key, value) in data_point.field_set.iter() {
        if first {
            first = false;
        } else {
            write!(fmt, ",")?;
        }
        write!(fmt, "{}={}", escape_key(key), value)?;
    }
    Ok(())
}

fn fmt_timestamp(data_point: &DataPoint, fmt: &mut fmt::Formatter) -> fmt::Result {
    if let Some(nanos) = data_point
        .timestamp
        .and_then(|time| time.duration_since(SystemTime::UNIX_EPOCH).ok())
        .map(|d| d.as_nanos())
    {
        write!(fmt, " {}", nanos)?;
    }
    Ok(())
}

impl fmt::Display for DataPoint {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", escape_key(&self.measurement))?;
        fmt_tags(self, fmt)?;
        write!(fmt, " ")?;
        fmt_fields(self, fmt)?;
        fmt_timestamp(self, fmt)
    }
}

/// InfluxDB line protocol formatter.
///
/// Every field of the observation becomes a field of the data point; the
/// station name is the only tag.
pub struct InfluxDbFormatter {
    /// The measurement name in InfluxDB
    measurement_name: String,
    /// Station name used for the `station` tag
    station: String,
}

impl InfluxDbFormatter {
    pub fn new(measurement_name: String, station: String) -> Self {
        Self {
            measurement_name,
            station,
        }
    }

    fn to_data_point(&self, observation: &Observation) -> DataPoint {
        let mut tag_set = BTreeMap::new();
        tag_set.insert("station".to_string(), self.station.clone());

        DataPoint {
            measurement: self.measurement_name.clone(),
            tag_set,
            field_set: observation
                .fields
                .iter()
                .map(|(name, reading)| (name.clone(), FieldValue::from(reading)))
                .collect(),
            timestamp: Some(observation.timestamp),
        }
    }
}

impl OutputFormatter for InfluxDbFormatter {
    fn format(&self, observation: &Observation) -> String {
        self.to_data_point(observation).to_string()
    }
}
