// Safety failsafes
//
// Head side: fall / lift detection from the IMU stream.
// Body side: comm-timeout watchdog. If the Head goes quiet the robot must
// not keep driving on its last command.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::messages::{ImuReading, LinkHealth};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SafetyThresholds {
    /// Roll or pitch beyond this many degrees is a fall
    pub max_tilt_deg: f32,
    /// Acceleration magnitude below this is a lift.
    /// Compared directly against the m/s² magnitude.
    pub min_accel_magnitude: f32,
}

impl Default for SafetyThresholds {
    fn default() -> Self {
        Self {
            max_tilt_deg: 45.0,
            min_accel_magnitude: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyFault {
    Fall,
    Lift,
}

impl SafetyFault {
    /// Reason string carried by the alert
    pub fn reason(&self) -> &'static str {
        match self {
            SafetyFault::Fall => "FALL",
            SafetyFault::Lift => "LIFT",
        }
    }
}

/// Roll and pitch in degrees, derived from gravity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attitude {
    pub roll_deg: f32,
    pub pitch_deg: f32,
}

impl Attitude {
    pub fn from_accel(accel: [f32; 3]) -> Self {
        let [ax, ay, az] = accel;
        let roll = ay.atan2(az);
        let pitch = (-ax).atan2((ay * ay + az * az).sqrt());
        Self {
            roll_deg: roll.to_degrees(),
            pitch_deg: pitch.to_degrees(),
        }
    }
}

pub fn accel_magnitude(accel: [f32; 3]) -> f32 {
    accel.iter().map(|a| a * a).sum::<f32>().sqrt()
}

/// Evaluates every decoded IMU sample on the Head
#[derive(Debug, Clone, Default)]
pub struct SafetyMonitor {
    thresholds: SafetyThresholds,
}

impl SafetyMonitor {
    pub fn new(thresholds: SafetyThresholds) -> Self {
        Self { thresholds }
    }

    /// Faults present in this sample, fall first
    pub fn evaluate(&self, reading: &ImuReading) -> Vec<SafetyFault> {
        let mut faults = Vec::new();

        let attitude = Attitude::from_accel(reading.accel);
        if attitude.roll_deg.abs() > self.thresholds.max_tilt_deg
            || attitude.pitch_deg.abs() > self.thresholds.max_tilt_deg
        {
            warn!(
                "Fall detected: roll={:.1}°, pitch={:.1}°",
                attitude.roll_deg, attitude.pitch_deg
            );
            faults.push(SafetyFault::Fall);
        }

        let magnitude = accel_magnitude(reading.accel);
        if magnitude < self.thresholds.min_accel_magnitude {
            warn!("Lift detected: |a|={:.2}", magnitude);
            faults.push(SafetyFault::Lift);
        }

        faults
    }
}

/// Body-side link state: time of the last accepted command and reduced mode
pub struct CommWatchdog {
    timeout_ms: u64,
    last_command_ms: u64,
    reduced_mode: bool,
}

impl CommWatchdog {
    /// Start the clock at `now_ms` as if a command had just arrived
    pub fn new(timeout_ms: u64, now_ms: u64) -> Self {
        Self {
            timeout_ms,
            last_command_ms: now_ms,
            reduced_mode: false,
        }
    }

    /// Record an accepted command; leaves reduced mode if active
    pub fn accept(&mut self, now_ms: u64) {
        self.last_command_ms = now_ms;
        if self.reduced_mode {
            self.reduced_mode = false;
            info!("Command received, leaving reduced mode");
        }
    }

    /// Returns true exactly once, on the transition into reduced mode
    pub fn check(&mut self, now_ms: u64) -> bool {
        if self.reduced_mode {
            return false;
        }

        let silence = now_ms.saturating_sub(self.last_command_ms);
        if silence > self.timeout_ms {
            self.reduced_mode = true;
            warn!("No command for {} ms, entering reduced mode", silence);
            return true;
        }
        false
    }

    pub fn reduced_mode(&self) -> bool {
        self.reduced_mode
    }

    pub fn health(&self) -> LinkHealth {
        if self.reduced_mode {
            LinkHealth::ReducedMode
        } else {
            LinkHealth::Ok
        }
    }
}
