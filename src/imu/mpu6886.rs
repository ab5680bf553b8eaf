// MPU6886 accelerometer/gyroscope over I2C
//
// Configured for ±8 g and ±2000 dps. One burst read of 14 bytes starting at
// ACCEL_XOUT_H returns accel (6 bytes), temperature (2 bytes) and gyro (6 bytes),
// all big-endian signed 16-bit.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use std::f32::consts::PI;
use tracing::{debug, info};

/// Default 7-bit bus address
pub const DEFAULT_ADDRESS: u8 = 0x68;

/// Expected WHO_AM_I value
pub const DEVICE_ID: u8 = 0x19;

/// Standard gravity, m/s²
pub const GRAVITY: f32 = 9.80665;

/// LSB per g at ±8 g
const ACCEL_LSB_PER_G: f32 = 4096.0;

/// LSB per deg/s at ±2000 dps
const GYRO_LSB_PER_DPS: f32 = 16.4;

/// Length of the accel + temp + gyro burst
pub const SAMPLE_BLOCK_LEN: usize = 14;

/// Register addresses
#[repr(u8)]
#[derive(Debug, Clone, Copy)]
pub enum Register {
    GyroConfig = 0x1B,
    AccelConfig = 0x1C,
    AccelXoutH = 0x3B,
    PwrMgmt1 = 0x6B,
    WhoAmI = 0x75,
}

/// PWR_MGMT_1 values
const PWR_DEVICE_RESET: u8 = 0x80;
const PWR_CLOCK_AUTO: u8 = 0x01;

/// ACCEL_CONFIG ±8 g
const ACCEL_FS_8G: u8 = 0x10;

/// GYRO_CONFIG ±2000 dps
const GYRO_FS_2000DPS: u8 = 0x18;

#[derive(Debug, thiserror::Error)]
pub enum ImuError<E: std::fmt::Debug> {
    #[error("I2C bus error: {0:?}")]
    Bus(E),

    #[error("Unexpected WHO_AM_I 0x{found:02X} (expected 0x{expected:02X})")]
    WrongDevice { found: u8, expected: u8 },
}

pub type Result<T, E> = std::result::Result<T, ImuError<E>>;

/// Raw accel and gyro counts in sensor frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawSample {
    pub accel: [i16; 3],
    pub gyro: [i16; 3],
}

impl RawSample {
    /// Split a burst read; the two temperature bytes between the blocks are skipped
    pub fn from_block(block: &[u8; SAMPLE_BLOCK_LEN]) -> Self {
        let word = |i: usize| i16::from_be_bytes([block[i], block[i + 1]]);
        Self {
            accel: [word(0), word(2), word(4)],
            gyro: [word(8), word(10), word(12)],
        }
    }

    /// Accelerometer in m/s²
    pub fn accel_mps2(&self) -> [f32; 3] {
        self.accel.map(|raw| raw as f32 / ACCEL_LSB_PER_G * GRAVITY)
    }

    /// Gyroscope in rad/s
    pub fn gyro_radps(&self) -> [f32; 3] {
        self.gyro.map(|raw| raw as f32 / GYRO_LSB_PER_DPS * (PI / 180.0))
    }
}

pub struct Mpu6886<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C, E> Mpu6886<I2C>
where
    I2C: I2c<Error = E>,
    E: std::fmt::Debug,
{
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, DEFAULT_ADDRESS)
    }

    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Check identity, reset, and configure full-scale ranges
    pub fn init(&mut self, delay: &mut impl DelayNs) -> Result<(), E> {
        let id = self.read_register(Register::WhoAmI)?;
        debug!("IMU WHO_AM_I = 0x{:02X}", id);
        if id != DEVICE_ID {
            return Err(ImuError::WrongDevice {
                found: id,
                expected: DEVICE_ID,
            });
        }

        self.write_register(Register::PwrMgmt1, PWR_DEVICE_RESET)?;
        delay.delay_ms(100);

        self.write_register(Register::PwrMgmt1, PWR_CLOCK_AUTO)?;
        delay.delay_ms(10);

        self.write_register(Register::AccelConfig, ACCEL_FS_8G)?;
        self.write_register(Register::GyroConfig, GYRO_FS_2000DPS)?;
        delay.delay_ms(50);

        info!("IMU initialized (±8 g, ±2000 dps)");
        Ok(())
    }

    /// One burst read of accel and gyro counts
    pub fn read_raw(&mut self) -> Result<RawSample, E> {
        let mut block = [0u8; SAMPLE_BLOCK_LEN];
        self.i2c
            .write_read(self.address, &[Register::AccelXoutH as u8], &mut block)
            .map_err(ImuError::Bus)?;
        Ok(RawSample::from_block(&block))
    }

    fn read_register(&mut self, register: Register) -> Result<u8, E> {
        let mut value = [0u8; 1];
        self.i2c
            .write_read(self.address, &[register as u8], &mut value)
            .map_err(ImuError::Bus)?;
        Ok(value[0])
    }

    fn write_register(&mut self, register: Register, value: u8) -> Result<(), E> {
        self.i2c
            .write(self.address, &[register as u8, value])
            .map_err(ImuError::Bus)
    }

    /// Give the bus back
    pub fn release(self) -> I2C {
        self.i2c
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTrans};

    fn init_transactions() -> Vec<I2cTrans> {
        vec![
            I2cTrans::write_read(DEFAULT_ADDRESS, vec![0x75], vec![DEVICE_ID]),
            I2cTrans::write(DEFAULT_ADDRESS, vec![0x6B, 0x80]),
            I2cTrans::write(DEFAULT_ADDRESS, vec![0x6B, 0x01]),
            I2cTrans::write(DEFAULT_ADDRESS, vec![0x1C, 0x10]),
            I2cTrans::write(DEFAULT_ADDRESS, vec![0x1B, 0x18]),
        ]
    }

    #[test]
    fn test_init_sequence() {
        let mut imu = Mpu6886::new(I2cMock::new(&init_transactions()));
        imu.init(&mut NoopDelay::new()).unwrap();
        imu.release().done();
    }

    #[test]
    fn test_wrong_device_id() {
        let expectations = [I2cTrans::write_read(DEFAULT_ADDRESS, vec![0x75], vec![0x68])];
        let mut imu = Mpu6886::new(I2cMock::new(&expectations));

        let err = imu.init(&mut NoopDelay::new()).unwrap_err();
        assert!(matches!(
            err,
            ImuError::WrongDevice {
                found: 0x68,
                expected: DEVICE_ID
            }
        ));
        imu.release().done();
    }

    #[test]
    fn test_bus_error_on_identity_read() {
        let expectations = [I2cTrans::write_read(DEFAULT_ADDRESS, vec![0x75], vec![0x00])
            .with_error(ErrorKind::Other)];
        let mut imu = Mpu6886::new(I2cMock::new(&expectations));

        assert!(matches!(
            imu.init(&mut NoopDelay::new()),
            Err(ImuError::Bus(ErrorKind::Other))
        ));
        imu.release().done();
    }

    #[test]
    fn test_block_layout_skips_temperature() {
        let block = [
            0x10, 0x00, // ax = 4096 (1 g)
            0xF0, 0x00, // ay = -4096
            0x00, 0x00, // az = 0
            0x7F, 0xFF, // temperature, ignored
            0x00, 0x29, // gx = 41
            0xFF, 0xD7, // gy = -41
            0x00, 0x00, // gz = 0
        ];
        let raw = RawSample::from_block(&block);
        assert_eq!(raw.accel, [4096, -4096, 0]);
        assert_eq!(raw.gyro, [41, -41, 0]);

        let accel = raw.accel_mps2();
        assert!((accel[0] - GRAVITY).abs() < 1e-4);
        assert!((accel[1] + GRAVITY).abs() < 1e-4);

        // 41 LSB = 2.5 deg/s
        let gyro = raw.gyro_radps();
        assert!((gyro[0] - 2.5f32.to_radians()).abs() < 1e-5);
        assert!((gyro[1] + 2.5f32.to_radians()).abs() < 1e-5);
    }

    #[test]
    fn test_read_raw() {
        let mut block = vec![0u8; SAMPLE_BLOCK_LEN];
        block[4] = 0x10; // az = 4096
        let expectations = [I2cTrans::write_read(DEFAULT_ADDRESS, vec![0x3B], block)];
        let mut imu = Mpu6886::new(I2cMock::new(&expectations));

        let raw = imu.read_raw().unwrap();
        assert_eq!(raw.accel, [0, 0, 4096]);
        imu.release().done();
    }
}
