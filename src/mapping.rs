//! Per-field transmitter mappings.
//!
//! A mapping pins one observation field to a transmitter, for example
//! `outTemp:A` reads the outdoor temperature from the AirLink instead of
//! the ISS. Mappings only need to be given where the group default is wrong.

use crate::transmitter::TransmitterId;
use log::warn;

/// A parsed mapping from an observation field to a transmitter.
#[derive(Debug, Clone, PartialEq)]
pub struct Mapping {
    /// Observation field name (e.g. "outTemp")
    pub field: String,
    /// Transmitter that should supply the field
    pub transmitter: TransmitterId,
}

/// Parse a mapping from a string in the format "FIELD:TRANSMITTER".
///
/// # Example
/// ```
/// use davis_www::mapping::parse_mapping;
/// use davis_www::TransmitterId;
///
/// let mapping = parse_mapping("soilTemp1:2").unwrap();
/// assert_eq!(mapping.field, "soilTemp1");
/// assert_eq!(mapping.transmitter, TransmitterId::Radio(2));
/// ```
pub fn parse_mapping(src: &str) -> Result<Mapping, String> {
    let (field, transmitter) = src
        .split_once(':')
        .ok_or_else(|| "invalid mapping: expected format FIELD:TRANSMITTER".to_string())?;

    let field = field.trim();
    if field.is_empty() {
        return Err("invalid mapping: empty field name".into());
    }

    let transmitter = transmitter
        .parse()
        .map_err(|e| format!("invalid mapping '{src}': {e}"))?;

    Ok(Mapping {
        field: field.into(),
        transmitter,
    })
}

/// Parse a whitespace or comma separated list of mappings.
///
/// Malformed entries are logged and skipped so that one typo in the
/// configuration does not take the whole station down.
pub fn parse_mappings(src: &str) -> Vec<Mapping> {
    src.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .filter_map(|token| match parse_mapping(token) {
            Ok(mapping) => Some(mapping),
            Err(error) => {
                warn!("ignoring mapping: {error}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mapping_valid() {
        let mapping = parse_mapping("outTemp:A").unwrap();
        assert_eq!(mapping.field, "outTemp");
        assert_eq!(mapping.transmitter, TransmitterId::AirQuality);
    }

    #[test]
    fn test_parse_mapping_invalid() {
        assert!(parse_mapping("no-colon").is_err());
        assert!(parse_mapping(":5").is_err());
        assert!(parse_mapping("windSpeed:9").is_err());
        assert!(parse_mapping("windSpeed:").is_err());
    }

    #[test]
    fn test_parse_mappings_mixed_separators() {
        let mappings = parse_mappings("outTemp:A, windSpeed:5 soil1:2,soil2:2  moist1:2");
        let fields: Vec<_> = mappings.iter().map(|m| m.field.as_str()).collect();
        assert_eq!(fields, vec!["outTemp", "windSpeed", "soil1", "soil2", "moist1"]);
        assert_eq!(mappings[1].transmitter, TransmitterId::Radio(5));
    }

    #[test]
    fn test_parse_mappings_skips_bad_entries() {
        let mappings = parse_mappings("outTemp:A bogus windSpeed:Q UV:3");
        assert_eq!(mappings.len(), 2);
        assert_eq!(mappings[0].field, "outTemp");
        assert_eq!(mappings[1].field, "UV");
    }

    #[test]
    fn test_parse_mappings_empty() {
        assert!(parse_mappings("").is_empty());
        assert!(parse_mappings(" , ").is_empty());
    }
}
