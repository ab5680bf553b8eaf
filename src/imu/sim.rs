// Simulated MPU6886 on an embedded-hal I2C bus, for running the Body without hardware

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, Operation};

use super::mpu6886::{DEVICE_ID, Register, SAMPLE_BLOCK_LEN};

/// One g at ±8 g full scale
const ONE_G_RAW: i16 = 4096;

/// Sensor lying still with gravity on sensor +Y, as mounted on the robot.
/// Answers WHO_AM_I and the accel/temp/gyro burst; every other register reads 0.
#[derive(Debug, Default)]
pub struct SimBus {
    register: u8,
}

impl SimBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn fill(&self, buf: &mut [u8]) {
        match self.register {
            r if r == Register::WhoAmI as u8 => buf.fill(DEVICE_ID),
            r if r == Register::AccelXoutH as u8 => {
                let mut block = [0u8; SAMPLE_BLOCK_LEN];
                block[2..4].copy_from_slice(&ONE_G_RAW.to_be_bytes());
                let n = buf.len().min(SAMPLE_BLOCK_LEN);
                buf[..n].copy_from_slice(&block[..n]);
            }
            _ => buf.fill(0),
        }
    }
}

impl ErrorType for SimBus {
    type Error = ErrorKind;
}

impl I2c for SimBus {
    fn transaction(&mut self, _address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        for op in operations {
            match op {
                // First written byte selects the register
                Operation::Write(bytes) => {
                    if let Some(&register) = bytes.first() {
                        self.register = register;
                    }
                }
                Operation::Read(buf) => self.fill(buf),
            }
        }
        Ok(())
    }
}
