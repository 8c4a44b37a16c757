//! Decoding of the `/v1/current_conditions` payload.
//!
//! WeatherLink Live and AirLink devices answer with the same envelope:
//!
//! ```json
//! {"data": {"did": "001D0A...", "ts": 1700000000, "conditions": [
//!     {"lsid": 48308, "data_structure_type": 1, "txid": 1, "temp": 62.7, ...},
//!     {"lsid": 48307, "data_structure_type": 4, "temp_in": 70.1, ...}
//! ]}, "error": null}
//! ```
//!
//! Each condition record is attributed to a transmitter so that readings
//! from several sensors of the same type can be kept apart.

use crate::transmitter::TransmitterId;
use log::debug;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;

/// Error types for decoding a current-conditions response.
#[derive(Error, Debug)]
pub enum ParseError {
    /// Body is not the expected JSON shape
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Device answered, but without data
    #[error("No data in response: {0}")]
    NoData(String),
}

#[derive(Debug, Deserialize)]
struct Envelope {
    data: Option<Payload>,
    #[serde(default)]
    error: Option<Value>,
}

/// The `data` object of a current-conditions response.
#[derive(Debug, Clone, Deserialize)]
pub struct Payload {
    /// Device id
    #[serde(default)]
    pub did: Option<String>,
    /// Unix timestamp of the readings, in seconds
    pub ts: i64,
    pub conditions: Vec<Map<String, Value>>,
}

/// Decode a response body.
pub fn parse_current_conditions(body: &str) -> Result<Payload, ParseError> {
    let envelope: Envelope = serde_json::from_str(body)?;
    match envelope.data {
        Some(payload) => Ok(payload),
        None => {
            let reason = match envelope.error {
                Some(Value::Null) | None => "data is null".to_string(),
                Some(error) => error.to_string(),
            };
            Err(ParseError::NoData(reason))
        }
    }
}

/// Work out which transmitter produced a condition record.
///
/// Types 1 (ISS) and 2 (leaf/soil) carry their radio `txid`; type 3 is the
/// console barometer, 4 the console indoor sensor and 6 the AirLink.
fn transmitter_for(condition: &Map<String, Value>) -> Option<TransmitterId> {
    let record_type = condition.get("data_structure_type")?.as_u64()?;
    match record_type {
        1 | 2 => {
            let txid = condition.get("txid")?.as_u64()?;
            TransmitterId::radio(u8::try_from(txid).ok()?).ok()
        }
        3 => Some(TransmitterId::Barometer),
        4 => Some(TransmitterId::Indoor),
        6 => Some(TransmitterId::AirQuality),
        _ => None,
    }
}

/// Readings from one or more payloads, keyed by transmitter and condition name.
#[derive(Debug, Default, Clone)]
pub struct StationData {
    readings: HashMap<TransmitterId, HashMap<String, Value>>,
}

impl StationData {
    /// Add every reading in `payload`. A later payload overwrites readings
    /// for the same transmitter and condition.
    pub fn absorb(&mut self, payload: &Payload) {
        for condition in &payload.conditions {
            let Some(txid) = transmitter_for(condition) else {
                debug!(
                    "skipping condition record with data_structure_type {:?}",
                    condition.get("data_structure_type")
                );
                continue;
            };
            let readings = self.readings.entry(txid).or_default();
            for (name, value) in condition {
                readings.insert(name.clone(), value.clone());
            }
        }
    }

    /// The reading for `condition` from `txid`, if it was reported and is not null.
    pub fn get(&self, txid: TransmitterId, condition: &str) -> Option<&Value> {
        self.readings
            .get(&txid)?
            .get(condition)
            .filter(|value| !value.is_null())
    }

    pub fn is_empty(&self) -> bool {
        self.readings.values().all(HashMap::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WLL_BODY: &str = r#"{
        "data": {
            "did": "001D0A700002",
            "ts": 1531754005,
            "conditions": [
                {"lsid": 48308, "data_structure_type": 1, "txid": 1, "temp": 62.7, "hum": 1.1, "rain_rate_last": 0},
                {"lsid": 48309, "data_structure_type": 2, "txid": 3, "temp_1": null, "moist_soil_1": 12},
                {"lsid": 48306, "data_structure_type": 3, "bar_sea_level": 30.008, "bar_absolute": 29.9},
                {"lsid": 48307, "data_structure_type": 4, "temp_in": 78.0, "hum_in": 41.1},
                {"lsid": 1, "data_structure_type": 99, "temp": 1000.0}
            ]
        },
        "error": null
    }"#;

    #[test]
    fn test_parse_weatherlink_payload() {
        let payload = parse_current_conditions(WLL_BODY).unwrap();
        assert_eq!(payload.did.as_deref(), Some("001D0A700002"));
        assert_eq!(payload.ts, 1531754005);
        assert_eq!(payload.conditions.len(), 5);
    }

    #[test]
    fn test_absorb_attributes_transmitters() {
        let payload = parse_current_conditions(WLL_BODY).unwrap();
        let mut data = StationData::default();
        data.absorb(&payload);

        assert_eq!(
            data.get(TransmitterId::Radio(1), "temp").and_then(Value::as_f64),
            Some(62.7)
        );
        assert_eq!(
            data.get(TransmitterId::Radio(3), "moist_soil_1")
                .and_then(Value::as_f64),
            Some(12.0)
        );
        assert!(data.get(TransmitterId::Barometer, "bar_sea_level").is_some());
        assert!(data.get(TransmitterId::Indoor, "temp_in").is_some());
        // null readings count as missing
        assert!(data.get(TransmitterId::Radio(3), "temp_1").is_none());
        assert!(data.get(TransmitterId::Radio(7), "temp").is_none());
    }

    #[test]
    fn test_airlink_condition_maps_to_air_quality() {
        let body = r#"{"data": {"ts": 1, "conditions": [
            {"data_structure_type": 6, "pm_2p5": 4.2, "temp": 70.0}
        ]}}"#;
        let payload = parse_current_conditions(body).unwrap();
        let mut data = StationData::default();
        data.absorb(&payload);
        assert_eq!(
            data.get(TransmitterId::AirQuality, "pm_2p5")
                .and_then(Value::as_f64),
            Some(4.2)
        );
    }

    #[test]
    fn test_radio_record_without_valid_txid_is_skipped() {
        let body = r#"{"data": {"ts": 1, "conditions": [
            {"data_structure_type": 1, "temp": 70.0},
            {"data_structure_type": 1, "txid": 12, "temp": 71.0}
        ]}}"#;
        let payload = parse_current_conditions(body).unwrap();
        let mut data = StationData::default();
        data.absorb(&payload);
        assert!(data.is_empty());
    }

    #[test]
    fn test_later_payload_wins() {
        let first = parse_current_conditions(
            r#"{"data": {"ts": 1, "conditions": [{"data_structure_type": 6, "pm_1": 1.0}]}}"#,
        )
        .unwrap();
        let second = parse_current_conditions(
            r#"{"data": {"ts": 2, "conditions": [{"data_structure_type": 6, "pm_1": 2.0}]}}"#,
        )
        .unwrap();
        let mut data = StationData::default();
        data.absorb(&first);
        data.absorb(&second);
        assert_eq!(
            data.get(TransmitterId::AirQuality, "pm_1").and_then(Value::as_f64),
            Some(2.0)
        );
    }

    #[test]
    fn test_null_data_is_an_error() {
        let err = parse_current_conditions(r#"{"data": null, "error": {"code": 409, "message": "busy"}}"#)
            .unwrap_err();
        assert!(matches!(err, ParseError::NoData(ref msg) if msg.contains("busy")));

        let err = parse_current_conditions(r#"{"data": null}"#).unwrap_err();
        assert_eq!(err.to_string(), "No data in response: data is null");
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(matches!(
            parse_current_conditions("<html>oops</html>"),
            Err(ParseError::Json(_))
        ));
        assert!(matches!(
            parse_current_conditions(r#"{"temp": 21.5}"#),
            Err(ParseError::NoData(_))
        ));
    }
}
