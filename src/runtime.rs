// Control loops for both nodes
//
// Body: cooperative loop, ~1 ms yield between iterations; motor and IMU
// periods are enforced inside the components from a monotonic ms clock.
// Head: fixed-interval poll of the serial consumer.

use embedded_hal::i2c::I2c;
use std::io::{Read, Write};
use std::time::{Duration, Instant};
use tokio::time::{MissedTickBehavior, interval, sleep};
use tracing::{info, warn};

use crate::body::Body;
use crate::config::{BODY_YIELD, HeadConfig};
use crate::head::{Head, LogHandler};
use crate::link::SerialLink;
use crate::motor::Actuator;
use crate::safety::SafetyMonitor;

pub type RunResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Milliseconds since the clock was created
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

pub async fn run_head(config: HeadConfig) -> RunResult {
    let link = SerialLink::open(&config.link.port, config.link.baud_rate)?;
    let mut head = Head::new(link, SafetyMonitor::new(config.safety.clone()));
    let mut handler = LogHandler;

    let mut tick = interval(Duration::from_millis(config.poll_interval_ms.max(1)));
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        "Head started: polling every {} ms, tilt limit {}°",
        config.poll_interval_ms, config.safety.max_tilt_deg
    );

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutting down, stopping robot");
                head.stop()?;
                return Ok(());
            }
            _ = tick.tick() => {
                head.poll(&mut handler)?;
            }
        }
    }
}

/// Run the Body loop until Ctrl-C or a link failure. `clock` must be the
/// clock the Body was created against.
pub async fn run_body<T, R, D, I, E>(mut body: Body<T, R, D, I>, clock: MonotonicClock) -> RunResult
where
    T: Read + Write,
    R: Actuator,
    D: Actuator,
    I: I2c<Error = E>,
    E: std::fmt::Debug,
{
    body.announce();
    info!(
        "Body started: IMU {}",
        if body.imu().is_available() { "available" } else { "not available" }
    );

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutting down");
                body.motors_mut().stop();
                return Ok(());
            }
            _ = sleep(BODY_YIELD) => {}
        }

        if let Err(e) = body.tick(clock.now_ms()) {
            warn!("Link failure, stopping motors: {}", e);
            body.motors_mut().stop();
            return Err(e.into());
        }
    }
}
