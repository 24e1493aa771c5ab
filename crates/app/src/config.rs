use std::f64::consts::FRAC_PI_6;
use std::fs;
use std::path::{Path, PathBuf};

use control::PdConfig;
use mechanics::ArmConfig;
use serde::{Deserialize, Serialize};

use crate::driver::DriverConfig;
use crate::error::{AppError, Result};
use crate::transport::TransportConfig;

/// Everything a run needs. Every field has a default, so a config file only
/// has to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub arm: ArmConfig,
    pub driver: DriverConfig,
    /// Starting angles (rad); the arm starts at rest
    pub initial_angles: (f64, f64),
    /// Recorded transitions used by the local and remote oracles
    pub dataset_path: PathBuf,
    pub remote: TransportConfig,
    pub pd: PdConfig,
    /// Seed for the PD oracle's noise
    pub seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            arm: ArmConfig::default(),
            driver: DriverConfig::default(),
            initial_angles: (FRAC_PI_6, FRAC_PI_6),
            dataset_path: PathBuf::from("robot-control.txt"),
            remote: TransportConfig::default(),
            pd: PdConfig::default(),
            seed: None,
        }
    }
}

impl AppConfig {
    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|err| AppError::io(path, err))?;
        Self::from_json_str(&text).map_err(|source| AppError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    pub fn with_initial_angles(mut self, theta1: f64, theta2: f64) -> Self {
        self.initial_angles = (theta1, theta2);
        self
    }

    pub fn with_dataset_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.dataset_path = path.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.driver.max_steps, 1000);
        assert_eq!(config.driver.tolerance, 0.01);
        assert_eq!(config.arm.dt, 0.01);
        assert_eq!(config.pd.kp1, 50.0);
        assert!((config.initial_angles.0 - std::f64::consts::PI / 6.0).abs() < 1e-15);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = AppConfig::from_json_str(
            r#"{
                "driver": { "max_steps": 50 },
                "arm": { "length2": 2.0 },
                "remote": { "model": "llama3.1-8b", "timeout_secs": 5 },
                "seed": 9
            }"#,
        )
        .unwrap();
        assert_eq!(config.driver.max_steps, 50);
        assert_eq!(config.driver.tolerance, 0.01);
        assert_eq!(config.arm.length2, 2.0);
        assert_eq!(config.arm.mass2, 1.5);
        assert_eq!(config.remote.model, "llama3.1-8b");
        assert_eq!(config.remote.endpoint, TransportConfig::cerebras().endpoint);
        assert_eq!(config.seed, Some(9));
    }

    #[test]
    fn test_angles_and_target_are_arrays() {
        let config = AppConfig::from_json_str(
            r#"{ "initial_angles": [0.25, -0.5], "driver": { "target": [0.1, 0.0] } }"#,
        )
        .unwrap();
        assert_eq!(config.initial_angles, (0.25, -0.5));
        assert_eq!(config.driver.target, (0.1, 0.0));
    }

    #[test]
    fn test_bad_json_names_file() {
        let path = std::env::temp_dir().join(format!("arm-sim-config-{}.json", std::process::id()));
        fs::write(&path, "{ not json").unwrap();
        let err = AppConfig::load(&path).unwrap_err();
        assert!(matches!(err, AppError::Config { .. }));
        fs::remove_file(&path).unwrap();
    }
}
