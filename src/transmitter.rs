//! Transmitter identifiers for Davis consoles.
//!
//! A WeatherLink Live can receive from up to eight radio transmitters, and
//! also reports readings from units attached to the console itself. Each
//! source of readings gets a single-character identifier so that several
//! sensors of the same type can be told apart.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default fallback order used when a field has no preferred transmitter.
pub const DEFAULT_ORDERING: &str = "12345678BIA";

/// Where a set of readings came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TransmitterId {
    /// Radio transmitter 1-8 (ISS, soil/leaf stations, ...)
    Radio(u8),
    /// Console barometer (`B`)
    Barometer,
    /// Console indoor temperature/humidity sensor (`I`)
    Indoor,
    /// AirLink air-quality unit (`A`)
    AirQuality,
}

impl TransmitterId {
    /// Build a radio transmitter id, rejecting anything outside 1-8.
    pub fn radio(id: u8) -> Result<Self, ParseTransmitterError> {
        if (1..=8).contains(&id) {
            Ok(TransmitterId::Radio(id))
        } else {
            Err(ParseTransmitterError::OutOfRange(id))
        }
    }
}

impl fmt::Display for TransmitterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransmitterId::Radio(id) => write!(f, "{id}"),
            TransmitterId::Barometer => write!(f, "B"),
            TransmitterId::Indoor => write!(f, "I"),
            TransmitterId::AirQuality => write!(f, "A"),
        }
    }
}

/// Errors returned when parsing a transmitter id or ordering.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseTransmitterError {
    #[error("invalid transmitter id: empty string")]
    Empty,
    #[error("invalid transmitter id: radio transmitter {0} is outside 1-8")]
    OutOfRange(u8),
    #[error("invalid transmitter id: '{0}' (expected 1-8, A, B or I)")]
    Invalid(String),
}

impl TryFrom<char> for TransmitterId {
    type Error = ParseTransmitterError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c.to_ascii_uppercase() {
            'A' => Ok(TransmitterId::AirQuality),
            'B' => Ok(TransmitterId::Barometer),
            'I' => Ok(TransmitterId::Indoor),
            d @ '0'..='9' => TransmitterId::radio(d as u8 - b'0'),
            other => Err(ParseTransmitterError::Invalid(other.to_string())),
        }
    }
}

impl FromStr for TransmitterId {
    type Err = ParseTransmitterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (None, _) => Err(ParseTransmitterError::Empty),
            (Some(c), None) => TransmitterId::try_from(c),
            _ => Err(ParseTransmitterError::Invalid(s.to_string())),
        }
    }
}

/// Order in which transmitters are searched when a field has no preferred
/// transmitter, or the preferred one reported nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct TransmitterOrder(Vec<TransmitterId>);

impl TransmitterOrder {
    pub fn iter(&self) -> impl Iterator<Item = TransmitterId> + '_ {
        self.0.iter().copied()
    }
}

impl Default for TransmitterOrder {
    fn default() -> Self {
        // DEFAULT_ORDERING only contains valid ids
        DEFAULT_ORDERING
            .parse()
            .unwrap_or_else(|_| TransmitterOrder(Vec::new()))
    }
}

impl FromStr for TransmitterOrder {
    type Err = ParseTransmitterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut order = Vec::new();
        for c in s.chars().filter(|c| !c.is_whitespace()) {
            let id = TransmitterId::try_from(c)?;
            if !order.contains(&id) {
                order.push(id);
            }
        }
        if order.is_empty() {
            return Err(ParseTransmitterError::Empty);
        }
        Ok(TransmitterOrder(order))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(TransmitterId::Radio(3).to_string(), "3");
        assert_eq!(TransmitterId::Barometer.to_string(), "B");
        assert_eq!(TransmitterId::Indoor.to_string(), "I");
        assert_eq!(TransmitterId::AirQuality.to_string(), "A");
    }

    #[test]
    fn test_from_str() {
        assert_eq!("5".parse::<TransmitterId>(), Ok(TransmitterId::Radio(5)));
        assert_eq!("a".parse::<TransmitterId>(), Ok(TransmitterId::AirQuality));
        assert_eq!(" I ".parse::<TransmitterId>(), Ok(TransmitterId::Indoor));
    }

    #[test]
    fn test_from_str_invalid() {
        assert_eq!(
            "".parse::<TransmitterId>(),
            Err(ParseTransmitterError::Empty)
        );
        assert_eq!(
            "0".parse::<TransmitterId>(),
            Err(ParseTransmitterError::OutOfRange(0))
        );
        assert_eq!(
            "9".parse::<TransmitterId>(),
            Err(ParseTransmitterError::OutOfRange(9))
        );
        assert!(matches!(
            "12".parse::<TransmitterId>(),
            Err(ParseTransmitterError::Invalid(_))
        ));
        assert!(matches!(
            "X".parse::<TransmitterId>(),
            Err(ParseTransmitterError::Invalid(_))
        ));
    }

    #[test]
    fn test_default_ordering() {
        let order: Vec<_> = TransmitterOrder::default().iter().collect();
        assert_eq!(order.len(), 11);
        assert_eq!(order[0], TransmitterId::Radio(1));
        assert_eq!(order[7], TransmitterId::Radio(8));
        assert_eq!(order[8], TransmitterId::Barometer);
        assert_eq!(order[9], TransmitterId::Indoor);
        assert_eq!(order[10], TransmitterId::AirQuality);
    }

    #[test]
    fn test_ordering_dedups_and_skips_whitespace() {
        let order: TransmitterOrder = "A 1 2 A".parse().unwrap();
        let ids: Vec<_> = order.iter().collect();
        assert_eq!(
            ids,
            vec![
                TransmitterId::AirQuality,
                TransmitterId::Radio(1),
                TransmitterId::Radio(2)
            ]
        );
    }

    #[test]
    fn test_ordering_invalid() {
        assert!("".parse::<TransmitterOrder>().is_err());
        assert!("12Z".parse::<TransmitterOrder>().is_err());
    }

    #[test]
    fn test_hash_equality() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(TransmitterId::Radio(2), "soil");

        assert_eq!(map.get(&"2".parse().unwrap()), Some(&"soil"));
    }
}
