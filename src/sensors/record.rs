//! Per-sensor state owned by the registry.
//!
//! Static characteristics are fixed at creation. The live fields are guarded
//! so the record can be shared between threads:
//! - `enabled` is an atomic flag,
//! - the reading (x, y, z, distance, timestamp) sits behind one lock, so a
//!   snapshot is always consistent,
//! - the callback has its own lock.

use super::{ProximityDistance, Sensor, SensorType};
use parking_lot::RwLock;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Callback registered by a consumer; receives the record as the event.
pub type ReadingCallback = Arc<dyn Fn(&SensorRecord) + Send + Sync>;

/// Static characteristics captured from a `create` command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorSpec {
    pub sensor_type: SensorType,
    pub min_value: f32,
    pub max_value: f32,
    pub resolution: f32,
    pub min_delay: u32,
}

impl SensorSpec {
    /// Characteristics of a ranged sensor. `min_delay` is always 0.
    pub fn new(sensor_type: SensorType, min_value: f32, max_value: f32, resolution: f32) -> Self {
        Self {
            sensor_type,
            min_value,
            max_value,
            resolution,
            min_delay: 0,
        }
    }

    /// Proximity sensors have no continuous range.
    pub fn proximity() -> Self {
        Self::new(SensorType::Proximity, 0.0, 0.0, 0.0)
    }

    /// Whether `value` lies within `[min_value, max_value]`, bounds included.
    pub fn contains(&self, value: f32) -> bool {
        value >= self.min_value && value <= self.max_value
    }
}

/// Current reading. Light uses `x` as illuminance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Reading {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub distance: ProximityDistance,
    /// Nanoseconds; 0 until the first update.
    pub timestamp: u64,
}

/// JSON-friendly view of a record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorSnapshot {
    #[serde(flatten)]
    pub spec: SensorSpec,
    pub enabled: bool,
    pub reading: Reading,
    pub version: u32,
}

/// One declared sensor.
///
/// Starts disabled with a zeroed reading, an `Unknown` distance and no callback.
pub struct SensorRecord {
    spec: SensorSpec,
    enabled: AtomicBool,
    reading: RwLock<Reading>,
    version: AtomicU32,
    callback: RwLock<Option<ReadingCallback>>,
}

impl SensorRecord {
    /// Create a record in its initial state.
    pub fn new(spec: SensorSpec) -> Self {
        Self {
            spec,
            enabled: AtomicBool::new(false),
            reading: RwLock::new(Reading::default()),
            version: AtomicU32::new(0),
            callback: RwLock::new(None),
        }
    }

    /// Static characteristics from the `create` line.
    pub fn spec(&self) -> &SensorSpec {
        &self.spec
    }

    pub fn sensor_type(&self) -> SensorType {
        self.spec.sensor_type
    }

    pub fn min_value(&self) -> f32 {
        self.spec.min_value
    }

    pub fn max_value(&self) -> f32 {
        self.spec.max_value
    }

    pub fn resolution(&self) -> f32 {
        self.spec.resolution
    }

    pub fn min_delay(&self) -> u32 {
        self.spec.min_delay
    }

    /// Check if the sensor is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Set the enabled flag. Readings are unaffected.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Copy of the current reading.
    pub fn reading(&self) -> Reading {
        *self.reading.read()
    }

    /// Timestamp of the last update, 0 if none.
    pub fn timestamp(&self) -> u64 {
        self.reading.read().timestamp
    }

    /// Replace the reading and bump the version.
    pub fn update(&self, f: impl FnOnce(&mut Reading)) {
        let mut reading = self.reading.write();
        f(&mut *reading);
        drop(reading);
        self.version.fetch_add(1, Ordering::SeqCst);
    }

    /// Store the consumer callback, replacing any previous one.
    ///
    /// The record never invokes it; update drivers do.
    pub fn set_reading_cb(&self, callback: ReadingCallback) {
        *self.callback.write() = Some(callback);
    }

    /// Remove the consumer callback.
    pub fn clear_reading_cb(&self) {
        *self.callback.write() = None;
    }

    /// Clone of the stored callback, if any.
    pub fn reading_cb(&self) -> Option<ReadingCallback> {
        self.callback.read().clone()
    }

    /// Point-in-time copy of the whole record for serialization.
    pub fn snapshot(&self) -> SensorSnapshot {
        SensorSnapshot {
            spec: self.spec,
            enabled: self.is_enabled(),
            reading: self.reading(),
            version: self.version(),
        }
    }
}

impl Sensor for SensorRecord {
    fn version(&self) -> u32 {
        self.version.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for SensorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SensorRecord")
            .field("spec", &self.spec)
            .field("enabled", &self.is_enabled())
            .field("reading", &self.reading())
            .field("has_callback", &self.callback.read().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn accel() -> SensorRecord {
        SensorRecord::new(SensorSpec::new(SensorType::Accelerometer, -10.0, 10.0, 0.5))
    }

    #[test]
    fn test_initial_state() {
        let record = accel();
        assert!(!record.is_enabled());
        assert_eq!(record.reading(), Reading::default());
        assert_eq!(record.reading().distance, ProximityDistance::Unknown);
        assert_eq!(record.timestamp(), 0);
        assert_eq!(record.min_delay(), 0);
        assert_eq!(record.version(), 0);
        assert!(record.reading_cb().is_none());
    }

    #[test]
    fn test_enable_is_idempotent() {
        let record = accel();
        record.set_enabled(true);
        record.set_enabled(true);
        assert!(record.is_enabled());
        record.set_enabled(false);
        record.set_enabled(false);
        assert!(!record.is_enabled());
    }

    #[test]
    fn test_update_increments_version() {
        let record = accel();
        record.update(|r| {
            r.x = 1.0;
            r.timestamp = 42;
        });
        assert_eq!(record.reading().x, 1.0);
        assert_eq!(record.timestamp(), 42);
        assert_eq!(record.version(), 1);
    }

    #[test]
    fn test_callback_is_stored_not_invoked() {
        let record = accel();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        record.set_reading_cb(Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        record.update(|r| r.x = 2.0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        (record.reading_cb().unwrap())(&record);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        record.clear_reading_cb();
        assert!(record.reading_cb().is_none());
    }

    #[test]
    fn test_callback_is_overwritten() {
        let record = accel();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let (a, b) = (first.clone(), second.clone());
        record.set_reading_cb(Arc::new(move |_| {
            a.fetch_add(1, Ordering::SeqCst);
        }));
        record.set_reading_cb(Arc::new(move |_| {
            b.fetch_add(1, Ordering::SeqCst);
        }));

        (record.reading_cb().unwrap())(&record);
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_snapshot_serializes() {
        let record = accel();
        record.set_enabled(true);
        let json = serde_json::to_value(record.snapshot()).unwrap();
        assert_eq!(json["sensor_type"], "accel");
        assert_eq!(json["min_value"], -10.0);
        assert_eq!(json["enabled"], true);
        assert_eq!(json["reading"]["distance"], "unknown");
    }

    #[test]
    fn test_spec_contains() {
        let spec = SensorSpec::new(SensorType::Light, 0.0, 1000.0, 1.0);
        assert!(spec.contains(0.0));
        assert!(spec.contains(1000.0));
        assert!(!spec.contains(-0.1));
        assert!(!spec.contains(1000.5));
    }
}
