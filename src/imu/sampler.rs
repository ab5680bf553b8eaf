// Fixed-period IMU sampling for the Body loop

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use tracing::{debug, warn};

use super::axis::AxisMap;
use super::mpu6886::Mpu6886;
use crate::messages::ImuReading;

/// One converted, remapped sample
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ImuSample {
    /// m/s², body frame
    pub accel: [f32; 3],
    /// rad/s, body frame
    pub gyro: [f32; 3],
    /// Monotonic ms at which the sample was read
    pub timestamp_ms: u64,
}

impl ImuSample {
    pub fn reading(&self) -> ImuReading {
        ImuReading::new(self.accel, self.gyro)
    }
}

pub struct ImuSampler<I2C> {
    sensor: Option<Mpu6886<I2C>>,
    axis_map: AxisMap,
    period_ms: u64,
    last_cycle_ms: Option<u64>,
    latest: Option<ImuSample>,
}

impl<I2C, E> ImuSampler<I2C>
where
    I2C: I2c<Error = E>,
    E: std::fmt::Debug,
{
    /// Initialise the sensor on `i2c`. An init failure leaves the sampler
    /// without a sensor; the rest of the Body keeps running.
    pub fn start(i2c: I2C, delay: &mut impl DelayNs, axis_map: AxisMap, period_ms: u64) -> Self {
        let mut sensor = Mpu6886::new(i2c);
        let sensor = match sensor.init(delay) {
            Ok(()) => Some(sensor),
            Err(e) => {
                warn!("IMU not available, continuing without it: {}", e);
                None
            }
        };
        Self::with_sensor(sensor, axis_map, period_ms)
    }

    /// Sampler with no sensor attached
    pub fn unavailable(period_ms: u64) -> Self {
        Self::with_sensor(None, AxisMap::identity(), period_ms)
    }

    pub fn with_sensor(sensor: Option<Mpu6886<I2C>>, axis_map: AxisMap, period_ms: u64) -> Self {
        Self {
            sensor,
            axis_map,
            period_ms,
            last_cycle_ms: None,
            latest: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.sensor.is_some()
    }

    /// Last good sample, if any
    pub fn latest(&self) -> Option<&ImuSample> {
        self.latest.as_ref()
    }

    /// Run one sample cycle if the period has elapsed.
    ///
    /// Returns the fresh sample to publish. A failed read keeps the previous
    /// sample and returns `None` so that cycle emits no telemetry.
    pub fn poll(&mut self, now_ms: u64) -> Option<ImuSample> {
        let sensor = self.sensor.as_mut()?;

        if let Some(last) = self.last_cycle_ms {
            if now_ms.saturating_sub(last) < self.period_ms {
                return None;
            }
        }
        self.last_cycle_ms = Some(now_ms);

        let raw = match sensor.read_raw() {
            Ok(raw) => raw,
            Err(e) => {
                debug!("IMU read failed, skipping cycle: {}", e);
                return None;
            }
        };

        let sample = ImuSample {
            accel: self.axis_map.apply(raw.accel_mps2()),
            gyro: self.axis_map.apply(raw.gyro_radps()),
            timestamp_ms: now_ms,
        };
        self.latest = Some(sample);
        Some(sample)
    }
}
