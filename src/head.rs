// Host node ("Head") side of the link
//
// Decodes telemetry from the Body, runs the fall/lift monitor on every IMU
// sample, and exposes the command-issuing API used by higher-level
// behaviours (teleop, vision, voice).

use std::io::{Read, Write};
use tracing::{debug, error, info, warn};

use crate::link::{LinkError, SerialLink};
use crate::messages::{Command, ImuReading, TelemetryMessage, clamp_speed};
use crate::protocol::{decode_telemetry, encode_command};
use crate::safety::{SafetyFault, SafetyMonitor};

/// Receives decoded telemetry, synchronously and in arrival order.
/// Implementations must not block: a slow handler stalls the link.
pub trait TelemetryHandler {
    fn on_imu(&mut self, _reading: &ImuReading) {}
    fn on_alert(&mut self, _reason: &str) {}
    fn on_info(&mut self, _text: &str) {}
}

/// Handler that only logs
pub struct LogHandler;

impl TelemetryHandler for LogHandler {
    fn on_imu(&mut self, reading: &ImuReading) {
        debug!(accel = ?reading.accel, gyro = ?reading.gyro, "IMU");
    }

    fn on_alert(&mut self, reason: &str) {
        warn!("ALERT: {}", reason);
    }

    fn on_info(&mut self, text: &str) {
        info!("INFO: {}", text);
    }
}

pub struct Head<T: Read + Write> {
    link: SerialLink<T>,
    safety: SafetyMonitor,
}

impl<T: Read + Write> Head<T> {
    pub fn new(link: SerialLink<T>, safety: SafetyMonitor) -> Self {
        Self { link, safety }
    }

    /// Rotation speed, clamped to [-100, 100]
    pub fn set_rotation(&mut self, speed: i32) -> Result<(), LinkError> {
        self.send(Command::SetRotation(clamp_speed(speed as i64)))
    }

    /// Drive speed, clamped to [-100, 100]
    pub fn set_drive(&mut self, speed: i32) -> Result<(), LinkError> {
        self.send(Command::SetDrive(clamp_speed(speed as i64)))
    }

    pub fn stop(&mut self) -> Result<(), LinkError> {
        self.send(Command::Stop)
    }

    pub fn calibrate(&mut self) -> Result<(), LinkError> {
        self.send(Command::Calibrate)
    }

    pub fn reset(&mut self) -> Result<(), LinkError> {
        self.send(Command::Reset)
    }

    pub fn send(&mut self, command: Command) -> Result<(), LinkError> {
        self.link.send_line(&encode_command(&command))
    }

    /// Process every complete line currently available. Returns the number
    /// of lines that decoded into telemetry.
    pub fn poll(&mut self, handler: &mut impl TelemetryHandler) -> Result<usize, LinkError> {
        let mut decoded = 0;
        for line in self.link.poll_lines()? {
            match decode_telemetry(&line) {
                Some(message) => {
                    decoded += 1;
                    self.deliver(message, handler);
                }
                None => debug!("Dropping unrecognised line: {:?}", line),
            }
        }
        Ok(decoded)
    }

    fn deliver(&mut self, message: TelemetryMessage, handler: &mut impl TelemetryHandler) {
        match message {
            TelemetryMessage::Imu(reading) => {
                handler.on_imu(&reading);
                for fault in self.safety.evaluate(&reading) {
                    self.trip(fault, handler);
                }
            }
            TelemetryMessage::Alert(reason) => handler.on_alert(&reason),
            TelemetryMessage::Info(text) => handler.on_info(&text),
            TelemetryMessage::Ack(command) => info!("ACK: {}", command),
            TelemetryMessage::Ng { command, reason } => warn!("NG: {} ({})", command, reason),
        }
    }

    /// Stop the robot and raise the alert locally
    fn trip(&mut self, fault: SafetyFault, handler: &mut impl TelemetryHandler) {
        if let Err(e) = self.stop() {
            error!("Failed to send stop after {:?}: {}", fault, e);
        }
        handler.on_alert(fault.reason());
    }

    pub fn link(&self) -> &SerialLink<T> {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut SerialLink<T> {
        &mut self.link
    }
}

impl<T: Read + Write> Drop for Head<T> {
    fn drop(&mut self) {
        // Leave the robot stopped when the Head goes away
        if let Err(e) = self.stop() {
            warn!("Failed to stop robot on drop: {}", e);
        }
    }
}
