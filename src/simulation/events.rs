//! Timed reading changes listed after the declaration block.
//!
//! Grammar, one event per line:
//! ```text
//! <delay_ms> accel <x> <y> <z>
//! <delay_ms> proximity near|far|unknown
//! <delay_ms> light <lux>
//! ```
//! The delay is relative to the previous event.

use crate::error::{Result, SensorError};
use crate::registry::SensorRegistry;
use crate::script::{ScriptLine, parse_f32};
use crate::sensors::{ProximityDistance, SensorType};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventValue {
    Acceleration { x: f32, y: f32, z: f32 },
    Distance(ProximityDistance),
    Light(f32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SensorEvent {
    pub delay: Duration,
    pub sensor: SensorType,
    pub value: EventValue,
    /// Script line the event came from.
    pub line: usize,
}

impl SensorEvent {
    /// Parse an event line against the declared sensors.
    pub fn parse(line: &ScriptLine, registry: &SensorRegistry) -> Result<Self> {
        let mut tokens = line.text.split_whitespace();

        let delay_token = tokens.next().unwrap_or_default();
        let delay = delay_token
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| SensorError::InvalidNumber {
                line: line.number,
                token: delay_token.to_string(),
                command: line.text.clone(),
            })?;

        let name = tokens.next().unwrap_or_default();
        let sensor = SensorType::from_str(name).map_err(|_| SensorError::UnknownSensorType {
            line: line.number,
            name: name.to_string(),
        })?;
        let record = registry
            .get(sensor)
            .ok_or_else(|| SensorError::UndeclaredSensor {
                line: line.number,
                name: name.to_string(),
            })?;

        let in_range = |value: f32| -> Result<f32> {
            if record.spec().contains(value) {
                Ok(value)
            } else {
                Err(SensorError::ValueOutOfRange {
                    line: line.number,
                    value,
                    min: record.min_value(),
                    max: record.max_value(),
                    command: line.text.clone(),
                })
            }
        };

        let value = match sensor {
            SensorType::Accelerometer => EventValue::Acceleration {
                x: in_range(parse_f32(tokens.next(), "x", line)?)?,
                y: in_range(parse_f32(tokens.next(), "y", line)?)?,
                z: in_range(parse_f32(tokens.next(), "z", line)?)?,
            },
            SensorType::Light => EventValue::Light(in_range(parse_f32(tokens.next(), "lux", line)?)?),
            SensorType::Proximity => {
                let token = tokens.next().ok_or_else(|| SensorError::MissingValue {
                    line: line.number,
                    field: "distance",
                    command: line.text.clone(),
                })?;
                let distance = ProximityDistance::from_str(token).map_err(|_| {
                    SensorError::UnknownDistance {
                        line: line.number,
                        token: token.to_string(),
                    }
                })?;
                EventValue::Distance(distance)
            }
        };

        Ok(Self {
            delay,
            sensor,
            value,
            line: line.number,
        })
    }
}
