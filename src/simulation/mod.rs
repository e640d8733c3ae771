//! Sensor simulation for testing.
//!
//! Drives the live readings of a [`SensorRegistry`]: programmatically through
//! [`SensorUpdater`], or from the event lines of a script through
//! [`EventPlayer`].

pub mod events;
pub mod player;
pub mod updater;

pub use events::{EventValue, SensorEvent};
pub use player::EventPlayer;
pub use updater::{SensorUpdater, now_nanos};

use crate::error::Result;
use crate::registry::SensorRegistry;
use crate::script::ScriptReader;
use std::path::Path;

/// Load a whole script: the declarations, then the events that follow them.
pub fn load_script(path: &Path) -> Result<(SensorRegistry, EventPlayer)> {
    let mut script = ScriptReader::open(path)?;
    let registry = SensorRegistry::from_script(&mut script)?;
    let player = EventPlayer::from_script(&mut script, &registry)?;
    Ok((registry, player))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SensorError;

    #[test]
    fn test_load_script() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sensors.txt");
        std::fs::write(
            &path,
            "# fixture\ncreate accel -10 10 0.5\ncreate proximity\n\n100 proximity far\n",
        )
        .unwrap();

        let (registry, player) = load_script(&path).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(player.len(), 1);
    }

    #[test]
    fn test_load_script_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sensors.txt");
        std::fs::write(&path, "create light 0 10 1\n\n0 accel 1 1 1\n").unwrap();

        let err = load_script(&path).unwrap_err();
        assert!(matches!(err, SensorError::UndeclaredSensor { .. }));
        assert_eq!(err.line(), Some(3));
    }
}
