//! Registry of the sensors a script declares.
//!
//! Built once from the `create` block at the top of a script and then only
//! read; the records inside carry their own synchronization for the live
//! fields. Loading stops at the first line that is not a `create` command;
//! that line is pushed back into the reader for the event player.

use crate::error::{Result, SensorError};
use crate::script::{ScriptLine, ScriptReader, parse_f32};
use crate::sensors::{
    Accelerometer, Light, Proximity, SensorRecord, SensorSnapshot, SensorSpec, SensorType,
};
use crate::simulation::SensorUpdater;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::Path;
use std::str::FromStr;

const CREATE: &str = "create";

#[derive(Debug, Default)]
pub struct SensorRegistry {
    sensors: BTreeMap<SensorType, SensorRecord>,
}

impl SensorRegistry {
    /// Load the declarations of the script at `path`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let mut script = ScriptReader::open(path)?;
        Self::from_script(&mut script)
    }

    /// Load the declarations from any buffered reader.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        Self::from_script(&mut ScriptReader::new(reader))
    }

    /// Consume `create` commands until the first other command or EOF.
    pub fn from_script<R: BufRead>(script: &mut ScriptReader<R>) -> Result<Self> {
        let mut registry = Self::default();

        while let Some(line) = script.next_line()? {
            if line.keyword() != CREATE {
                debug!(
                    "Declarations end at line {}: '{}'",
                    line.number, line.text
                );
                script.push_back(line);
                break;
            }
            registry.create(&line)?;
        }

        info!(
            "Sensor registry ready with {} sensor(s): {}",
            registry.len(),
            registry
                .sensors
                .keys()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(registry)
    }

    /// Handle one `create <type> [<min> <max> <resolution>]` line.
    fn create(&mut self, line: &ScriptLine) -> Result<()> {
        let mut tokens = line.text.split_whitespace().skip(1);

        let name = tokens.next().unwrap_or_default();
        let sensor_type =
            SensorType::from_str(name).map_err(|_| SensorError::UnknownSensorType {
                line: line.number,
                name: name.to_string(),
            })?;

        if self.sensors.contains_key(&sensor_type) {
            return Err(SensorError::DuplicateSensor {
                line: line.number,
                name: name.to_string(),
            });
        }

        let spec = if sensor_type.is_ranged() {
            let min = parse_f32(tokens.next(), "min_value", line)?;
            let max = parse_f32(tokens.next(), "max_value", line)?;
            let resolution = parse_f32(tokens.next(), "resolution", line)?;

            if max <= min {
                return Err(SensorError::InvalidRange {
                    line: line.number,
                    command: line.text.clone(),
                });
            }
            if resolution <= 0.0 {
                return Err(SensorError::InvalidResolution {
                    line: line.number,
                    command: line.text.clone(),
                });
            }
            SensorSpec::new(sensor_type, min, max, resolution)
        } else {
            SensorSpec::proximity()
        };

        if tokens.next().is_some() {
            warn!(
                "Ignoring trailing tokens in line {}: '{}'",
                line.number, line.text
            );
        }

        debug!(
            "Created {} sensor: min {} max {} resolution {}",
            sensor_type, spec.min_value, spec.max_value, spec.resolution
        );
        self.sensors.insert(sensor_type, SensorRecord::new(spec));
        Ok(())
    }

    /// Record for `sensor_type`, or `None` if the script never declared it.
    pub fn get(&self, sensor_type: SensorType) -> Option<&SensorRecord> {
        self.sensors.get(&sensor_type)
    }

    pub fn contains(&self, sensor_type: SensorType) -> bool {
        self.sensors.contains_key(&sensor_type)
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    pub fn sensors(&self) -> impl Iterator<Item = &SensorRecord> {
        self.sensors.values()
    }

    pub fn accelerometer(&self) -> Option<Accelerometer<'_>> {
        Accelerometer::new(self)
    }

    pub fn proximity(&self) -> Option<Proximity<'_>> {
        Proximity::new(self)
    }

    pub fn light(&self) -> Option<Light<'_>> {
        Light::new(self)
    }

    /// Writer for the live reading of a declared sensor.
    pub fn updater(&self, sensor_type: SensorType) -> Option<SensorUpdater<'_>> {
        self.get(sensor_type).map(SensorUpdater::new)
    }

    pub fn snapshot(&self) -> Vec<SensorSnapshot> {
        self.sensors().map(SensorRecord::snapshot).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::{ProximityDistance, Reading};
    use std::io::Cursor;

    fn load(script: &str) -> Result<SensorRegistry> {
        SensorRegistry::from_reader(Cursor::new(script))
    }

    const FIXTURE: &str = "# test fixture\ncreate accel -10 10 0.5\ncreate light 0 1000 1\ncreate proximity\n";

    #[test]
    fn test_fixture_declares_three_sensors() {
        let registry = load(FIXTURE).unwrap();
        assert_eq!(registry.len(), 3);

        let accel = registry.get(SensorType::Accelerometer).unwrap();
        assert_eq!(
            (accel.min_value(), accel.max_value(), accel.resolution()),
            (-10.0, 10.0, 0.5)
        );

        let light = registry.get(SensorType::Light).unwrap();
        assert_eq!(
            (light.min_value(), light.max_value(), light.resolution()),
            (0.0, 1000.0, 1.0)
        );

        let proximity = registry.get(SensorType::Proximity).unwrap();
        assert_eq!(
            (
                proximity.min_value(),
                proximity.max_value(),
                proximity.resolution()
            ),
            (0.0, 0.0, 0.0)
        );
    }

    #[test]
    fn test_new_records_start_cleared() {
        let registry = load(FIXTURE).unwrap();
        for record in registry.sensors() {
            assert!(!record.is_enabled());
            assert_eq!(record.reading(), Reading::default());
            assert_eq!(record.reading().distance, ProximityDistance::Unknown);
        }
    }

    #[test]
    fn test_undeclared_sensor_is_absent() {
        let registry = load("create proximity\n").unwrap();
        assert!(registry.get(SensorType::Accelerometer).is_none());
        assert!(registry.accelerometer().is_none());
        assert!(registry.light().is_none());
        assert!(registry.proximity().is_some());
    }

    #[test]
    fn test_empty_script() {
        let registry = load("# nothing here\n\n").unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_comments_interleaved_with_commands() {
        let registry =
            load("\n# a\ncreate light 0 10 1\n   # b\n\n\t\ncreate accel -1 1 0.1\n#c\n").unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.contains(SensorType::Light));
        assert!(registry.contains(SensorType::Accelerometer));
    }

    #[test]
    fn test_values_round_trip() {
        for (min, max, res) in [(-19.6133_f32, 19.6133, 0.0383), (0.0, 65535.0, 1.0), (1e-3, 2e-3, 1e-6)] {
            let registry = load(&format!("create accel {min} {max} {res}\n")).unwrap();
            let accel = registry.accelerometer().unwrap();
            assert_eq!(accel.min_value(), min);
            assert_eq!(accel.max_value(), max);
            assert_eq!(accel.resolution(), res);
        }
    }

    #[test]
    fn test_unknown_sensor_type() {
        match load("create gyro -1 1 0.1\n") {
            Err(SensorError::UnknownSensorType { line, name }) => {
                assert_eq!(line, 1);
                assert_eq!(name, "gyro");
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(matches!(
            load("create Light 0 1 1\n"),
            Err(SensorError::UnknownSensorType { .. })
        ));
        assert!(matches!(
            load("create\n"),
            Err(SensorError::UnknownSensorType { .. })
        ));
    }

    #[test]
    fn test_duplicate_sensor_is_rejected() {
        assert!(matches!(
            load("create light 0 10 1\ncreate light 0 20 1\n"),
            Err(SensorError::DuplicateSensor { line: 2, .. })
        ));
        assert!(matches!(
            load("create proximity\n# again\ncreate proximity\n"),
            Err(SensorError::DuplicateSensor { line: 3, .. })
        ));
    }

    #[test]
    fn test_duplicate_checked_before_values() {
        assert!(matches!(
            load("create accel -1 1 1\ncreate accel\n"),
            Err(SensorError::DuplicateSensor { .. })
        ));
    }

    #[test]
    fn test_max_must_exceed_min() {
        assert!(matches!(
            load("create accel 10 5 1\n"),
            Err(SensorError::InvalidRange { line: 1, .. })
        ));
        assert!(matches!(
            load("create light 5 5 1\n"),
            Err(SensorError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_resolution_must_be_positive() {
        assert!(matches!(
            load("create accel -1 1 0\n"),
            Err(SensorError::InvalidResolution { .. })
        ));
        assert!(matches!(
            load("create light 0 1 -0.5\n"),
            Err(SensorError::InvalidResolution { .. })
        ));
    }

    #[test]
    fn test_missing_and_invalid_values() {
        assert!(matches!(
            load("create accel -1 1\n"),
            Err(SensorError::MissingValue {
                field: "resolution",
                ..
            })
        ));
        assert!(matches!(
            load("create light\n"),
            Err(SensorError::MissingValue {
                field: "min_value",
                ..
            })
        ));
        assert!(matches!(
            load("create light zero 1 1\n"),
            Err(SensorError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_non_finite_bounds_are_rejected() {
        for script in [
            "create accel NaN 1 1\n",
            "create accel -1 nan 1\n",
            "create light 0 10 nan\n",
            "create light 0 inf 1\n",
            "create accel -infinity 0 1\n",
        ] {
            assert!(
                matches!(load(script), Err(SensorError::InvalidNumber { line: 1, .. })),
                "{script:?} should fail"
            );
        }
    }

    #[test]
    fn test_latin1_comment_does_not_fail_load() {
        let registry =
            SensorRegistry::from_reader(Cursor::new(&b"# caf\xe9\ncreate proximity\n"[..]))
                .unwrap();
        assert!(registry.contains(SensorType::Proximity));
    }

    #[test]
    fn test_proximity_ignores_trailing_values() {
        let registry = load("create proximity 1 0 -5\n").unwrap();
        let proximity = registry.get(SensorType::Proximity).unwrap();
        assert_eq!(proximity.max_value(), 0.0);
    }

    #[test]
    fn test_error_after_valid_lines_fails_whole_load() {
        assert!(load("create light 0 10 1\ncreate accel 10 5 1\n").is_err());
    }

    #[test]
    fn test_declarations_stop_at_first_other_command() {
        let mut script = ScriptReader::new(Cursor::new(
            "create light 0 10 1\n100 light 5\ncreate accel -1 1 0.1\n",
        ));
        let registry = SensorRegistry::from_script(&mut script).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(!registry.contains(SensorType::Accelerometer));

        // the stop line is handed back to the reader
        let next = script.next_line().unwrap().unwrap();
        assert_eq!(next.text, "100 light 5");
        assert_eq!(next.number, 2);
    }

    #[test]
    fn test_bad_create_after_stop_is_not_parsed() {
        let registry = load("create light 0 10 1\nstop\ncreate gyro 1 2 3\n").unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sensors.txt");
        std::fs::write(&path, FIXTURE).unwrap();
        let registry = SensorRegistry::from_path(&path).unwrap();
        assert_eq!(registry.len(), 3);

        assert!(matches!(
            SensorRegistry::from_path(&dir.path().join("nope.txt")),
            Err(SensorError::ScriptOpenFailed { .. })
        ));
    }

    #[test]
    fn test_snapshot_order() {
        let registry = load(FIXTURE).unwrap();
        let types: Vec<_> = registry
            .snapshot()
            .into_iter()
            .map(|s| s.spec.sensor_type)
            .collect();
        assert_eq!(
            types,
            vec![
                SensorType::Accelerometer,
                SensorType::Proximity,
                SensorType::Light
            ]
        );
    }
}
