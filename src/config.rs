use crate::error::{Result, SensorError};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming the sensor script.
pub const SCRIPT_PATH_VAR: &str = "UBUNTU_PLATFORM_API_SENSOR_TEST";

/// Environment variable toggling automatic event playback in the C ABI.
pub const PLAYBACK_VAR: &str = "SENSOR_TEST_PLAYBACK";

/// Load environment variables from a .env file.
/// Values with spaces do not need quotes; variables already set win.
pub fn load_dotenv() {
    load_dotenv_from(Path::new(".env"));
}

fn load_dotenv_from(env_path: &Path) {
    let content = match fs::read_to_string(env_path) {
        Ok(c) => c,
        Err(_) => return,
    };

    for (key, value) in parse_dotenv(&content) {
        if std::env::var(key).is_err() {
            // SAFETY: called from startup code before any sensor thread is spawned
            unsafe { std::env::set_var(key, value) };
        }
    }
}

fn parse_dotenv(content: &str) -> Vec<(&str, &str)> {
    let mut pairs = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            let mut value = value.trim();
            if value.len() >= 2
                && ((value.starts_with('"') && value.ends_with('"'))
                    || (value.starts_with('\'') && value.ends_with('\'')))
            {
                value = &value[1..value.len() - 1];
            }
            pairs.push((key.trim(), value));
        }
    }
    pairs
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the sensor script.
    pub script_path: Option<PathBuf>,
    /// Replay event lines after the declarations.
    pub playback: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            script_path: None,
            playback: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup(SCRIPT_PATH_VAR).filter(|p| !p.is_empty()) {
            config.script_path = Some(PathBuf::from(path));
        }
        if let Some(playback) = lookup(PLAYBACK_VAR) {
            config.playback = !matches!(
                playback.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "no" | "off"
            );
        }

        config
    }

    /// The script path, or the fatal "not configured" error.
    pub fn require_script_path(&self) -> Result<&Path> {
        self.script_path
            .as_deref()
            .ok_or(SensorError::ScriptPathMissing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_script_path_is_fatal() {
        let config = Config::from_lookup(lookup(&[]));
        assert!(config.script_path.is_none());
        assert!(matches!(
            config.require_script_path(),
            Err(SensorError::ScriptPathMissing)
        ));
    }

    #[test]
    fn test_script_path_from_env() {
        let config = Config::from_lookup(lookup(&[(SCRIPT_PATH_VAR, "/tmp/sensors.txt")]));
        assert_eq!(
            config.require_script_path().unwrap(),
            Path::new("/tmp/sensors.txt")
        );
        assert!(config.playback);
    }

    #[test]
    fn test_playback_can_be_disabled() {
        for value in ["0", "false", "OFF", " no "] {
            let config = Config::from_lookup(lookup(&[(PLAYBACK_VAR, value)]));
            assert!(!config.playback, "{value} should disable playback");
        }
        let config = Config::from_lookup(lookup(&[(PLAYBACK_VAR, "1")]));
        assert!(config.playback);
    }

    #[test]
    fn test_parse_dotenv() {
        let pairs = parse_dotenv(
            "# comment\n\nUBUNTU_PLATFORM_API_SENSOR_TEST = /tmp/my script.txt\nQUOTED='x y'\nbroken line\n",
        );
        assert_eq!(
            pairs,
            vec![
                ("UBUNTU_PLATFORM_API_SENSOR_TEST", "/tmp/my script.txt"),
                ("QUOTED", "x y"),
            ]
        );
    }
}
