//! Writer side of a sensor record.
//!
//! Test drivers use this to move simulated readings; every write stamps the
//! reading with the current wall-clock time.

use crate::sensors::{ProximityDistance, Reading, SensorRecord};
use chrono::Utc;

/// Nanoseconds since the Unix epoch.
pub fn now_nanos() -> u64 {
    Utc::now()
        .timestamp_nanos_opt()
        .and_then(|nanos| u64::try_from(nanos).ok())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy)]
pub struct SensorUpdater<'r> {
    record: &'r SensorRecord,
}

impl<'r> SensorUpdater<'r> {
    pub fn new(record: &'r SensorRecord) -> Self {
        Self { record }
    }

    pub fn record(&self) -> &'r SensorRecord {
        self.record
    }

    pub fn set_acceleration(&self, x: f32, y: f32, z: f32) {
        let timestamp = now_nanos();
        self.record.update(|reading| {
            reading.x = x;
            reading.y = y;
            reading.z = z;
            reading.timestamp = timestamp;
        });
    }

    pub fn set_distance(&self, distance: ProximityDistance) {
        let timestamp = now_nanos();
        self.record.update(|reading| {
            reading.distance = distance;
            reading.timestamp = timestamp;
        });
    }

    /// Illuminance in lux.
    pub fn set_light(&self, lux: f32) {
        let timestamp = now_nanos();
        self.record.update(|reading| {
            reading.x = lux;
            reading.timestamp = timestamp;
        });
    }

    /// Replace the whole reading, including its timestamp.
    pub fn set_reading(&self, reading: Reading) {
        self.record.update(|current| *current = reading);
    }
}
