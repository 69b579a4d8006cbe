//! Sensor parameter categories and the normalized reading series.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Threshold applied when an upload carries no threshold column.
///
/// Values at or above the threshold are "normal"; below it they are
/// "notify" readings.
pub const DEFAULT_THRESHOLD: f64 = 31.7;

/// The fixed set of monitored sensor parameters.
///
/// Each parameter owns an independent report collection; the set is part
/// of the persisted-state layout and must not grow without a migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Parameter {
    Temperature,
    Pressure,
    Humidity,
    Vibration,
}

impl Parameter {
    /// All categories, in persisted-document order.
    pub const ALL: [Parameter; 4] = [
        Parameter::Temperature,
        Parameter::Pressure,
        Parameter::Humidity,
        Parameter::Vibration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Parameter::Temperature => "Temperature",
            Parameter::Pressure => "Pressure",
            Parameter::Humidity => "Humidity",
            Parameter::Vibration => "Vibration",
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Parameter {
    type Err = UnknownParameter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Temperature" => Ok(Parameter::Temperature),
            "Pressure" => Ok(Parameter::Pressure),
            "Humidity" => Ok(Parameter::Humidity),
            "Vibration" => Ok(Parameter::Vibration),
            other => Err(UnknownParameter(other.to_string())),
        }
    }
}

/// Error for parameter names outside the fixed category set.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown parameter: {0} (expected Temperature, Pressure, Humidity, or Vibration)")]
pub struct UnknownParameter(pub String);

/// A normalized, time-ordered series of readings for one parameter.
///
/// `timestamps` holds display labels (clock times or dates as they appeared
/// in the upload), not parseable instants. Invariant:
/// `timestamps.len() == values.len()` — rows whose value failed to parse
/// are dropped from both sides in lockstep. An empty series is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub timestamps: Vec<String>,
    pub values: Vec<f64>,
    pub threshold: f64,
}

impl Series {
    pub fn empty() -> Self {
        Self {
            timestamps: Vec::new(),
            values: Vec::new(),
            threshold: DEFAULT_THRESHOLD,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Default for Series {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_round_trips_through_str() {
        for p in Parameter::ALL {
            assert_eq!(p.as_str().parse::<Parameter>().ok(), Some(p));
        }
    }

    #[test]
    fn unknown_parameter_is_rejected() {
        assert!("temperature".parse::<Parameter>().is_err());
        assert!("Voltage".parse::<Parameter>().is_err());
    }

    #[test]
    fn empty_series_is_valid() {
        let s = Series::empty();
        assert!(s.is_empty());
        assert_eq!(s.len(), 0);
        assert_eq!(s.threshold, DEFAULT_THRESHOLD);
    }
}
