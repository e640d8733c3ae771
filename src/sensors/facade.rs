//! Typed sensor handles.
//!
//! Each handle borrows its record from a [`SensorRegistry`]; it owns nothing
//! and forwards every call. Events are views of the same record: there is no
//! event queue, every accessor returns what the record currently holds.
//!
//! # Example
//!
//! ```ignore
//! let registry = SensorRegistry::from_path(Path::new("sensors.txt"))?;
//! if let Some(light) = Light::new(&registry) {
//!     light.set_reading_cb(|event| println!("{} lux", event.light()));
//!     light.enable();
//! }
//! ```

use super::{ProximityDistance, ReadingCallback, SensorRecord, SensorType, UStatus};
use crate::registry::SensorRegistry;
use std::sync::Arc;

/// Methods every sensor class shares.
macro_rules! sensor_handle {
    ($handle:ident, $event:ident, $sensor_type:expr) => {
        /// Borrowed handle to a declared sensor.
        #[derive(Debug, Clone, Copy)]
        pub struct $handle<'r> {
            record: &'r SensorRecord,
        }

        impl<'r> $handle<'r> {
            /// Handle for the declared sensor, or `None` if the script never created one.
            pub fn new(registry: &'r SensorRegistry) -> Option<Self> {
                registry.get($sensor_type).map(|record| Self { record })
            }

            /// The shared record behind this handle.
            pub fn record(&self) -> &'r SensorRecord {
                self.record
            }

            /// Enable the sensor. Always succeeds, also when already enabled.
            pub fn enable(&self) -> UStatus {
                self.record.set_enabled(true);
                UStatus::Success
            }

            /// Disable the sensor. The last reading is kept.
            pub fn disable(&self) -> UStatus {
                self.record.set_enabled(false);
                UStatus::Success
            }

            pub fn is_enabled(&self) -> bool {
                self.record.is_enabled()
            }

            /// Minimum delay between events; scripted sensors report 0.
            pub fn min_delay(&self) -> u32 {
                self.record.min_delay()
            }

            /// Register the reading callback, replacing any previous one.
            pub fn set_reading_cb<F>(&self, callback: F)
            where
                F: Fn($event<'_>) + Send + Sync + 'static,
            {
                let callback: ReadingCallback =
                    Arc::new(move |record: &SensorRecord| callback($event { record }));
                self.record.set_reading_cb(callback);
            }

            /// Current reading as an event view.
            pub fn event(&self) -> $event<'r> {
                $event {
                    record: self.record,
                }
            }
        }

        /// Live view of the sensor's current reading.
        #[derive(Debug, Clone, Copy)]
        pub struct $event<'a> {
            record: &'a SensorRecord,
        }

        impl $event<'_> {
            /// Nanoseconds of the last update, 0 before the first one.
            pub fn timestamp(&self) -> u64 {
                self.record.timestamp()
            }
        }
    };
}

sensor_handle!(Accelerometer, AccelerometerEvent, SensorType::Accelerometer);
sensor_handle!(Proximity, ProximityEvent, SensorType::Proximity);
sensor_handle!(Light, LightEvent, SensorType::Light);

impl Accelerometer<'_> {
    /// Lower bound from the `create` line, in m/s².
    pub fn min_value(&self) -> f32 {
        self.record.min_value()
    }

    pub fn max_value(&self) -> f32 {
        self.record.max_value()
    }

    pub fn resolution(&self) -> f32 {
        self.record.resolution()
    }
}

// Proximity only reports discrete classes; range queries are always zero.
impl Proximity<'_> {
    pub fn min_value(&self) -> f32 {
        0.0
    }

    pub fn max_value(&self) -> f32 {
        0.0
    }

    pub fn resolution(&self) -> f32 {
        0.0
    }
}

impl Light<'_> {
    pub fn min_value(&self) -> f32 {
        self.record.min_value()
    }

    pub fn max_value(&self) -> f32 {
        self.record.max_value()
    }

    pub fn resolution(&self) -> f32 {
        self.record.resolution()
    }
}

impl AccelerometerEvent<'_> {
    pub fn acceleration_x(&self) -> f32 {
        self.record.reading().x
    }

    pub fn acceleration_y(&self) -> f32 {
        self.record.reading().y
    }

    pub fn acceleration_z(&self) -> f32 {
        self.record.reading().z
    }

    /// All three axes from one snapshot.
    pub fn acceleration(&self) -> (f32, f32, f32) {
        let reading = self.record.reading();
        (reading.x, reading.y, reading.z)
    }
}

impl ProximityEvent<'_> {
    /// Last reported class; `Unknown` until the first event.
    pub fn distance(&self) -> ProximityDistance {
        self.record.reading().distance
    }
}

impl LightEvent<'_> {
    /// Illuminance in lux.
    pub fn light(&self) -> f32 {
        self.record.reading().x
    }
}
