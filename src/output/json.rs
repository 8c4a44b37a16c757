//! JSON lines output formatter.

use crate::observation::{Observation, Reading};
use crate::output::OutputFormatter;
use serde_json::{Map, Value, json};

/// Formats each observation as a single JSON object:
///
/// `{"dateTime": 1531754005, "station": "DavisWWW", "fields": {"outTemp": 62.7}}`
pub struct JsonFormatter {
    station: String,
}

impl JsonFormatter {
    pub fn new(station: String) -> Self {
        Self { station }
    }
}

fn reading_to_json(reading: &Reading) -> Value {
    match reading {
        // NaN and infinities have no JSON representation
        Reading::Number(num) => serde_json::Number::from_f64(*num)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Reading::Text(text) => Value::String(text.clone()),
    }
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, observation: &Observation) -> String {
        let fields: Map<String, Value> = observation
            .fields
            .iter()
            .map(|(name, reading)| (name.clone(), reading_to_json(reading)))
            .collect();

        json!({
            "dateTime": observation.unix_seconds(),
            "station": self.station,
            "fields": fields,
        })
        .to_string()
    }
}
