// Inertial sensor support for the Body
//
// Provides:
// - Axis remapping from sensor frame to body frame
// - MPU6886 register protocol over an embedded-hal I2C bus
// - A fixed-period sampler that keeps the last good sample
// - A simulated sensor bus for running without hardware

mod axis;
pub mod mpu6886;
mod sampler;
mod sim;

pub use axis::{Axis, AxisMap};
pub use mpu6886::{ImuError, Mpu6886};
pub use sampler::{ImuSample, ImuSampler};
pub use sim::SimBus;
