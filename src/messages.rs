// Message types exchanged over the Head <-> Body serial link

/// Largest commanded speed magnitude
pub const SPEED_LIMIT: i8 = 100;

/// Clamp any requested speed into [-100, 100]
pub fn clamp_speed(speed: i64) -> i8 {
    speed.clamp(-(SPEED_LIMIT as i64), SPEED_LIMIT as i64) as i8
}

/// Command from Head -> Body, one per received line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SetRotation(i8),
    SetDrive(i8),
    Stop,
    Calibrate,
    Reset,
}

/// Accelerometer (m/s²) and gyroscope (rad/s) triples as carried by an IMU line
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ImuReading {
    pub accel: [f32; 3],
    pub gyro: [f32; 3],
}

impl ImuReading {
    pub fn new(accel: [f32; 3], gyro: [f32; 3]) -> Self {
        Self { accel, gyro }
    }

    /// Values in wire order: ax, ay, az, gx, gy, gz
    pub fn as_array(&self) -> [f32; 6] {
        let [ax, ay, az] = self.accel;
        let [gx, gy, gz] = self.gyro;
        [ax, ay, az, gx, gy, gz]
    }

    pub fn from_array(values: [f32; 6]) -> Self {
        let [ax, ay, az, gx, gy, gz] = values;
        Self::new([ax, ay, az], [gx, gy, gz])
    }
}

/// Telemetry from Body -> Head, one per line
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryMessage {
    Imu(ImuReading),
    Alert(String),
    Info(String),
    Ack(String),
    Ng { command: String, reason: String },
}

/// Link health reported by the Body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkHealth {
    Ok,
    ReducedMode,
}
