//! Sensor state shared between the registry, the typed facades and the
//! update drivers.
//!
//! All sensors implement the [`Sensor`] trait which provides version tracking
//! for change detection.

pub mod facade;
pub mod record;

pub use facade::{
    Accelerometer, AccelerometerEvent, Light, LightEvent, Proximity, ProximityEvent,
};
pub use record::{Reading, ReadingCallback, SensorRecord, SensorSnapshot, SensorSpec};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, FromRepr};

/// Sensor classes a script can declare.
///
/// Parsed from and displayed as the script token (`accel`, `proximity`, `light`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
pub enum SensorType {
    #[strum(serialize = "accel")]
    #[serde(rename = "accel")]
    Accelerometer,
    #[strum(serialize = "proximity")]
    #[serde(rename = "proximity")]
    Proximity,
    #[strum(serialize = "light")]
    #[serde(rename = "light")]
    Light,
}

impl SensorType {
    /// Whether the sensor has a continuous value range.
    pub fn is_ranged(self) -> bool {
        !matches!(self, SensorType::Proximity)
    }
}

/// Discrete proximity class, in the platform's C representation.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    FromRepr,
)]
#[repr(u32)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProximityDistance {
    /// Not reported yet.
    #[default]
    Unknown = 0,
    Near = 1,
    Far = 2,
}

/// Status code returned by enable/disable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr)]
#[repr(i32)]
pub enum UStatus {
    Success = 0,
    Error = 1,
}

/// Trait for sensors with change detection.
///
/// The version number is incremented each time the reading changes, so
/// polling consumers can compare versions instead of values.
pub trait Sensor: Send + Sync {
    /// Get the current version number.
    fn version(&self) -> u32;
}
