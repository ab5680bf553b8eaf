// Motion node ("Body") context
//
// Owns the serial link, motors, IMU sampler and comm watchdog. The control
// loop calls `tick` once per iteration; everything runs on that one thread.

use embedded_hal::i2c::I2c;
use std::io::{Read, Write};
use tracing::{debug, info, warn};

use crate::imu::ImuSampler;
use crate::link::{LinkError, SerialLink};
use crate::messages::{Command, LinkHealth, TelemetryMessage};
use crate::motor::{Actuator, Motor, MotorControl};
use crate::protocol::{encode_command, encode_telemetry, parse_command};
use crate::safety::CommWatchdog;

/// Reason sent with NG when CALIB arrives and no IMU is fitted
pub const IMU_NOT_AVAILABLE: &str = "IMU_NOT_AVAILABLE";

pub struct Body<T, R, D, I> {
    link: SerialLink<T>,
    motors: MotorControl<R, D>,
    imu: ImuSampler<I>,
    watchdog: CommWatchdog,
}

impl<T, R, D, I, E> Body<T, R, D, I>
where
    T: Read + Write,
    R: Actuator,
    D: Actuator,
    I: I2c<Error = E>,
    E: std::fmt::Debug,
{
    pub fn new(
        link: SerialLink<T>,
        motors: MotorControl<R, D>,
        imu: ImuSampler<I>,
        comm_timeout_ms: u64,
        now_ms: u64,
    ) -> Self {
        Self {
            link,
            motors,
            imu,
            watchdog: CommWatchdog::new(comm_timeout_ms, now_ms),
        }
    }

    /// Tell the Head who we are
    pub fn announce(&mut self) {
        let banner = format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        self.send(TelemetryMessage::Info(banner));
    }

    /// One loop iteration: input, motors, watchdog, telemetry
    pub fn tick(&mut self, now_ms: u64) -> Result<(), LinkError> {
        for line in self.link.poll_lines()? {
            self.handle_line(&line, now_ms);
        }

        self.motors.update(now_ms);

        if self.watchdog.check(now_ms) {
            self.motors.stop();
        }

        if let Some(sample) = self.imu.poll(now_ms) {
            self.send(TelemetryMessage::Imu(sample.reading()));
        }

        Ok(())
    }

    /// Parse and execute one received line
    pub fn handle_line(&mut self, line: &str, now_ms: u64) {
        let Some(command) = parse_command(line) else {
            debug!("Ignoring unknown command: {:?}", line);
            return;
        };

        info!("Received command: {:?}", command);
        self.watchdog.accept(now_ms);

        match command {
            Command::SetRotation(speed) => {
                self.motors.set_speed(Motor::Rotation, speed as i32, now_ms)
            }
            Command::SetDrive(speed) => self.motors.set_speed(Motor::Drive, speed as i32, now_ms),
            Command::Stop => self.motors.stop(),
            Command::Calibrate => {
                let reply = if self.imu.is_available() {
                    TelemetryMessage::Ack(encode_command(&command))
                } else {
                    TelemetryMessage::Ng {
                        command: encode_command(&command),
                        reason: IMU_NOT_AVAILABLE.to_string(),
                    }
                };
                self.send(reply);
            }
            Command::Reset => {
                self.motors.stop();
                self.send(TelemetryMessage::Ack(encode_command(&command)));
            }
        }
    }

    /// Best-effort send; the protocol has no retransmission
    fn send(&mut self, message: TelemetryMessage) {
        if let Err(e) = self.link.send_line(&encode_telemetry(&message)) {
            warn!("Failed to send telemetry: {}", e);
        }
    }

    pub fn motors(&self) -> &MotorControl<R, D> {
        &self.motors
    }

    pub fn motors_mut(&mut self) -> &mut MotorControl<R, D> {
        &mut self.motors
    }

    pub fn imu(&self) -> &ImuSampler<I> {
        &self.imu
    }

    pub fn link(&self) -> &SerialLink<T> {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut SerialLink<T> {
        &mut self.link
    }

    pub fn reduced_mode(&self) -> bool {
        self.watchdog.reduced_mode()
    }

    pub fn health(&self) -> LinkHealth {
        self.watchdog.health()
    }
}
