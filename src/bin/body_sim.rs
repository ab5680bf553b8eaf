// Body loop on a host serial port, with simulated motor outputs and IMU.
// Point the Head (or teleop) at the other end of the serial cable / pty pair.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use embedded_hal::delay::DelayNs;
use tracing::info;
use tracing_subscriber::EnvFilter;

use robot_link::body::Body;
use robot_link::config::{self, BodyConfig};
use robot_link::imu::{ImuSampler, SimBus};
use robot_link::link::SerialLink;
use robot_link::motor::{HBridge, MotorControl, SimLeg};
use robot_link::runtime::{MonotonicClock, RunResult, run_body};

/// Full-scale PWM count for the simulated legs (16-bit counter)
const PWM_MAX: u16 = 65535;

#[derive(Parser)]
#[command(version)]
struct Opts {
    /// Serial device connected to the Head
    #[arg(long)]
    port: Option<String>,
    /// Baud rate
    #[arg(long)]
    baud: Option<u32>,
    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Run without the simulated IMU
    #[arg(long)]
    no_imu: bool,
}

struct ThreadDelay;

impl DelayNs for ThreadDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(ns as u64));
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run(Opts::parse()).await {
        eprintln!("Body error: {}", e);
        std::process::exit(1);
    }
}

async fn run(opts: Opts) -> RunResult {
    let mut config: BodyConfig = config::load(opts.config.as_deref())?;
    if let Some(port) = opts.port {
        config.link.port = port;
    }
    if let Some(baud) = opts.baud {
        config.link.baud_rate = baud;
    }

    // Serial link and motor outputs are mandatory; startup aborts without them
    let link = SerialLink::open(&config.link.port, config.link.baud_rate)?;

    let tuning = config.motor.clone().sanitized();
    let rotation = HBridge::new(
        "rotation",
        SimLeg::new("rotation.a", PWM_MAX),
        SimLeg::new("rotation.b", PWM_MAX),
        tuning.rotation_deadband,
    );
    let drive = HBridge::new(
        "drive",
        SimLeg::new("drive.a", PWM_MAX),
        SimLeg::new("drive.b", PWM_MAX),
        tuning.drive_deadband,
    );
    let motors = MotorControl::new(rotation, drive, tuning);
    info!("Motor outputs initialized");

    let imu = if opts.no_imu {
        ImuSampler::unavailable(config.imu_period_ms)
    } else {
        ImuSampler::start(
            SimBus::new(),
            &mut ThreadDelay,
            config.axis_map,
            config.imu_period_ms,
        )
    };

    let clock = MonotonicClock::new();
    let body = Body::new(link, motors, imu, config.comm_timeout_ms, clock.now_ms());
    run_body(body, clock).await
}
