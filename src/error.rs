use std::path::PathBuf;

use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum SensorError {
    #[error("Need $UBUNTU_PLATFORM_API_SENSOR_TEST to point to a data file")]
    ScriptPathMissing,

    #[error("Failed to open data file {path}: {source}")]
    ScriptOpenFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown sensor type {name} (line {line})")]
    UnknownSensorType { line: usize, name: String },

    #[error("duplicate creation of sensor type {name} (line {line})")]
    DuplicateSensor { line: usize, name: String },

    #[error("missing {field} in line {line}: {command}")]
    MissingValue {
        line: usize,
        field: &'static str,
        command: String,
    },

    #[error("invalid number '{token}' in line {line}: {command}")]
    InvalidNumber {
        line: usize,
        token: String,
        command: String,
    },

    #[error("max_value must be > min_value in line {line}: {command}")]
    InvalidRange { line: usize, command: String },

    #[error("resolution must be > 0 in line {line}: {command}")]
    InvalidResolution { line: usize, command: String },

    #[error("event for undeclared sensor {name} (line {line})")]
    UndeclaredSensor { line: usize, name: String },

    #[error("unknown proximity distance '{token}' (line {line})")]
    UnknownDistance { line: usize, token: String },

    #[error("value {value} outside [{min}, {max}] in line {line}: {command}")]
    ValueOutOfRange {
        line: usize,
        value: f32,
        min: f32,
        max: f32,
        command: String,
    },

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),
}

impl SensorError {
    /// Script line the error refers to, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            SensorError::UnknownSensorType { line, .. }
            | SensorError::DuplicateSensor { line, .. }
            | SensorError::MissingValue { line, .. }
            | SensorError::InvalidNumber { line, .. }
            | SensorError::InvalidRange { line, .. }
            | SensorError::InvalidResolution { line, .. }
            | SensorError::UndeclaredSensor { line, .. }
            | SensorError::UnknownDistance { line, .. }
            | SensorError::ValueOutOfRange { line, .. } => Some(*line),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SensorError>;
