//! Sensor table for Davis reporters.
//!
//! Maps each observation field to the condition name used in the
//! WeatherLink Live / AirLink JSON, the group that decides its default
//! transmitter, and any transform applied to the raw value.

use crate::transmitter::TransmitterId;
use log::error;
use std::fmt;

const MM_TO_INCH: f64 = 0.0393701;

/// Groups of sensors that share a default transmitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorGroup {
    /// ISS readings (temperature, wind, rain, solar, ...)
    Weather,
    /// Soil/leaf station readings
    Soil,
    /// Console barometer
    Barometer,
    /// Console indoor sensor
    Indoor,
    /// AirLink particulate readings
    AirQuality,
}

impl SensorGroup {
    /// Default transmitter for this group.
    ///
    /// Weather and soil sensors can live on any radio transmitter, so their
    /// transmitter comes from the configuration.
    pub fn default_transmitter(self, weather: TransmitterId, soil: TransmitterId) -> TransmitterId {
        match self {
            SensorGroup::Weather => weather,
            SensorGroup::Soil => soil,
            SensorGroup::Barometer => TransmitterId::Barometer,
            SensorGroup::Indoor => TransmitterId::Indoor,
            SensorGroup::AirQuality => TransmitterId::AirQuality,
        }
    }
}

/// Transform applied to a raw reading before it enters the observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    None,
    /// Multiply by the rain collector scale
    RainScale,
    /// Scaled difference from the previous monthly rain total
    RainDelta,
}

/// A row of the sensor table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorInfo {
    /// Observation field name
    pub field: &'static str,
    /// Condition name in the device JSON
    pub condition: &'static str,
    pub group: SensorGroup,
    pub transform: Transform,
}

const fn sensor(
    field: &'static str,
    condition: &'static str,
    group: SensorGroup,
    transform: Transform,
) -> SensorInfo {
    SensorInfo {
        field,
        condition,
        group,
        transform,
    }
}

/// Wind averaging period reported as `windSpeed`/`windDir`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindMeasurement {
    /// Most recent reading
    Latest,
    /// Average over the past minute
    #[default]
    OneMinute,
    /// Average over the past two minutes
    TwoMinutes,
}

impl WindMeasurement {
    /// Map a configuration value, logging and falling back to the default
    /// when it is not one of 0, 1 or 2.
    pub fn from_config(value: i64) -> Self {
        match value {
            0 => WindMeasurement::Latest,
            1 => WindMeasurement::OneMinute,
            2 => WindMeasurement::TwoMinutes,
            other => {
                error!("invalid wind_measurement {other}, defaulting to 1");
                WindMeasurement::default()
            }
        }
    }

    fn conditions(self) -> (&'static str, &'static str) {
        match self {
            WindMeasurement::Latest => ("wind_speed_last", "wind_dir_last"),
            WindMeasurement::OneMinute => {
                ("wind_speed_avg_last_1_min", "wind_dir_scalar_avg_last_1_min")
            }
            WindMeasurement::TwoMinutes => {
                ("wind_speed_avg_last_2_min", "wind_dir_scalar_avg_last_2_min")
            }
        }
    }
}

/// Rain collector type, which decides how much rain one bucket tip is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RainCollector {
    /// 0.01 in per tip
    #[default]
    HundredthInch,
    /// 0.2 mm per tip
    FifthMillimeter,
    /// 0.1 in per tip
    TenthInch,
    /// 0.001 mm per tip
    ThousandthMillimeter,
}

impl RainCollector {
    /// Map a configuration value (1-4), logging and falling back to the
    /// default for anything else.
    pub fn from_config(value: i64) -> Self {
        match value {
            1 => RainCollector::HundredthInch,
            2 => RainCollector::FifthMillimeter,
            3 => RainCollector::TenthInch,
            4 => RainCollector::ThousandthMillimeter,
            other => {
                error!("invalid rain_collector {other}, defaulting to 1");
                RainCollector::default()
            }
        }
    }

    /// Inches of rain per reported count.
    pub fn scale(self) -> f64 {
        match self {
            RainCollector::HundredthInch => 0.01,
            RainCollector::FifthMillimeter => 0.2 * MM_TO_INCH,
            RainCollector::TenthInch => 0.1,
            RainCollector::ThousandthMillimeter => 0.001 * MM_TO_INCH,
        }
    }
}

impl fmt::Display for RainCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RainCollector::HundredthInch => "0.01 in",
            RainCollector::FifthMillimeter => "0.2 mm",
            RainCollector::TenthInch => "0.1 in",
            RainCollector::ThousandthMillimeter => "0.001 mm",
        };
        write!(f, "{label}")
    }
}

/// Build the sensor table for the chosen wind averaging period.
pub fn sensor_table(wind: WindMeasurement) -> Vec<SensorInfo> {
    use SensorGroup::*;
    use Transform::{RainDelta, RainScale};

    let (wind_speed, wind_dir) = wind.conditions();

    vec![
        sensor("outTemp", "temp", Weather, Transform::None),
        sensor("outHumidity", "hum", Weather, Transform::None),
        sensor("dewpoint", "dew_point", Weather, Transform::None),
        sensor("heatindex", "heat_index", Weather, Transform::None),
        sensor("THSW", "thsw_index", Weather, Transform::None),
        sensor("windchill", "wind_chill", Weather, Transform::None),
        sensor("windSpeed", wind_speed, Weather, Transform::None),
        sensor("windDir", wind_dir, Weather, Transform::None),
        sensor("windGust", "wind_speed_hi_last_2_min", Weather, Transform::None),
        sensor("windGustDir", "wind_dir_at_hi_speed_last_2_min", Weather, Transform::None),
        sensor("rain", "rainfall_monthly", Weather, RainDelta),
        sensor("rainRate", "rain_rate_last", Weather, RainScale),
        sensor("radiation", "solar_rad", Weather, Transform::None),
        sensor("UV", "uv_index", Weather, Transform::None),
        sensor("txBatteryStatus", "trans_battery_flag", Weather, Transform::None),
        sensor("soilTemp1", "temp_1", Soil, Transform::None),
        sensor("soilTemp2", "temp_2", Soil, Transform::None),
        sensor("soilTemp3", "temp_3", Soil, Transform::None),
        sensor("soilTemp4", "temp_4", Soil, Transform::None),
        sensor("soilMoist1", "moist_soil_1", Soil, Transform::None),
        sensor("soilMoist2", "moist_soil_2", Soil, Transform::None),
        sensor("soilMoist3", "moist_soil_3", Soil, Transform::None),
        sensor("soilMoist4", "moist_soil_4", Soil, Transform::None),
        sensor("barometer", "bar_sea_level", Barometer, Transform::None),
        sensor("pressure", "bar_absolute", Barometer, Transform::None),
        sensor("inTemp", "temp_in", Indoor, Transform::None),
        sensor("inHumidity", "hum_in", Indoor, Transform::None),
        sensor("inDewpoint", "dew_point_in", Indoor, Transform::None),
        sensor("pm1_0", "pm_1", AirQuality, Transform::None),
        sensor("pm2_5", "pm_2p5", AirQuality, Transform::None),
        sensor("pm10_0", "pm_10", AirQuality, Transform::None),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(table: &[SensorInfo], field: &str) -> SensorInfo {
        *table.iter().find(|s| s.field == field).unwrap()
    }

    #[test]
    fn test_wind_measurement_selects_conditions() {
        let latest = sensor_table(WindMeasurement::Latest);
        assert_eq!(find(&latest, "windSpeed").condition, "wind_speed_last");
        assert_eq!(find(&latest, "windDir").condition, "wind_dir_last");

        let two = sensor_table(WindMeasurement::TwoMinutes);
        assert_eq!(find(&two, "windSpeed").condition, "wind_speed_avg_last_2_min");
        assert_eq!(find(&two, "windDir").condition, "wind_dir_scalar_avg_last_2_min");
    }

    #[test]
    fn test_wind_measurement_from_config() {
        assert_eq!(WindMeasurement::from_config(0), WindMeasurement::Latest);
        assert_eq!(WindMeasurement::from_config(2), WindMeasurement::TwoMinutes);
        assert_eq!(WindMeasurement::from_config(7), WindMeasurement::OneMinute);
    }

    #[test]
    fn test_rain_collector_scale() {
        assert_eq!(RainCollector::from_config(1).scale(), 0.01);
        assert_eq!(RainCollector::from_config(3).scale(), 0.1);
        assert!((RainCollector::from_config(2).scale() - 0.00787402).abs() < 1e-8);
        assert_eq!(RainCollector::from_config(0), RainCollector::HundredthInch);
        assert_eq!(RainCollector::FifthMillimeter.to_string(), "0.2 mm");
    }

    #[test]
    fn test_table_fields_and_conditions_are_unique() {
        let table = sensor_table(WindMeasurement::default());
        for (i, a) in table.iter().enumerate() {
            for b in &table[i + 1..] {
                assert_ne!(a.field, b.field);
                assert_ne!(a.condition, b.condition);
            }
        }
    }

    #[test]
    fn test_group_defaults() {
        let weather = TransmitterId::Radio(1);
        let soil = TransmitterId::Radio(2);
        assert_eq!(SensorGroup::Weather.default_transmitter(weather, soil), weather);
        assert_eq!(SensorGroup::Soil.default_transmitter(weather, soil), soil);
        assert_eq!(
            SensorGroup::Barometer.default_transmitter(weather, soil),
            TransmitterId::Barometer
        );
        assert_eq!(
            SensorGroup::AirQuality.default_transmitter(weather, soil),
            TransmitterId::AirQuality
        );
    }
}
