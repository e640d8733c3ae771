//! Scripted test backend for the platform sensor API.
//!
//! Sensors (accelerometer, proximity, light) are declared by a script file
//! instead of real hardware, and their readings are driven by test code or by
//! timed events in the same script.

pub mod config;
pub mod error;
pub mod ffi;
pub mod registry;
pub mod script;
pub mod sensors;
pub mod simulation;

pub use error::{Result, SensorError};
pub use registry::SensorRegistry;
pub use sensors::{ProximityDistance, SensorRecord, SensorType, UStatus};
