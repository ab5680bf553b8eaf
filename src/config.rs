// Timeouts, loop rates, motor tuning and the optional JSON config layer
use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::imu::AxisMap;
use crate::motor::MotorTuning;
use crate::safety::SafetyThresholds;

// Serial link (115200 8N1 on both nodes)
pub const DEFAULT_BAUDRATE: u32 = 115_200;
pub const DEFAULT_HEAD_PORT: &str = "/dev/ttyAMA0";
pub const DEFAULT_BODY_PORT: &str = "/dev/ttyACM0";

// Receive buffer size, terminator excluded (one byte is reserved)
pub const LINE_BUFFER_SIZE: usize = 256;

// Body loop yield between iterations
pub const BODY_YIELD: Duration = Duration::from_millis(1);

// IMU sampling / telemetry period (20 Hz)
pub const IMU_PERIOD_MS: u64 = 50;

// Comm watchdog: no accepted command for this long enters reduced mode
pub const COMM_TIMEOUT_MS: u64 = 5000;

// Head poll period for the serial consumer
pub const HEAD_POLL_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Serial port settings shared by both nodes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LinkConfig {
    pub port: String,
    pub baud_rate: u32,
}

impl LinkConfig {
    fn with_port(port: &str) -> Self {
        Self {
            port: port.to_string(),
            baud_rate: DEFAULT_BAUDRATE,
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self::with_port(DEFAULT_HEAD_PORT)
    }
}

/// Motion node configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BodyConfig {
    pub link: LinkConfig,
    pub motor: MotorTuning,
    pub axis_map: AxisMap,
    pub imu_period_ms: u64,
    pub comm_timeout_ms: u64,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            link: LinkConfig::with_port(DEFAULT_BODY_PORT),
            motor: MotorTuning::default(),
            axis_map: AxisMap::mounted(),
            imu_period_ms: IMU_PERIOD_MS,
            comm_timeout_ms: COMM_TIMEOUT_MS,
        }
    }
}

/// Host node configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HeadConfig {
    pub link: LinkConfig,
    pub safety: SafetyThresholds,
    pub poll_interval_ms: u64,
}

impl Default for HeadConfig {
    fn default() -> Self {
        Self {
            link: LinkConfig::default(),
            safety: SafetyThresholds::default(),
            poll_interval_ms: HEAD_POLL_INTERVAL.as_millis() as u64,
        }
    }
}

/// Load a config from a JSON file, or fall back to defaults when no path is given
pub fn load<T>(path: Option<&Path>) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Default,
{
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&text)?)
        }
        None => Ok(T::default()),
    }
}
