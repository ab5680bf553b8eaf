// Keyboard teleop: W/S drive, A/D rotate, Space stop, R/F speed, C calibrate, X reset, Q quit
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use serialport::SerialPort;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

use robot_link::config::{DEFAULT_BAUDRATE, DEFAULT_HEAD_PORT};
use robot_link::head::{Head, LogHandler};
use robot_link::link::{LinkError, SerialLink};
use robot_link::messages::Command;
use robot_link::safety::SafetyMonitor;

const SPEEDS: [i8; 3] = [40, 70, 100];
// Stop after this much time with no movement key. Must exceed the keyboard
// auto-repeat delay (up to ~660 ms), or a held key stops and re-boosts the drive.
const INPUT_TIMEOUT: Duration = Duration::from_millis(800);
const KEEPALIVE: Duration = Duration::from_millis(1000); // Re-send the held command so the Body watchdog stays quiet

/// What the held motion needs from the link this iteration
#[derive(Debug, PartialEq)]
enum HoldAction {
    Send(Command),
    Stop,
}

/// Motion command held by the operator
struct Hold {
    command: Option<Command>,
    last_sent: Instant,
    last_input: Instant,
}

impl Hold {
    fn new(now: Instant) -> Self {
        Self {
            command: None,
            last_sent: now,
            last_input: now,
        }
    }

    /// Movement key seen (press or auto-repeat). Only a changed command is sent.
    fn press(&mut self, command: Command, now: Instant) -> Option<HoldAction> {
        self.last_input = now;
        if self.command == Some(command) {
            return None;
        }
        self.command = Some(command);
        self.last_sent = now;
        Some(HoldAction::Send(command))
    }

    /// Motion ended by an explicit stop or reset
    fn clear(&mut self) {
        self.command = None;
    }

    fn tick(&mut self, now: Instant) -> Option<HoldAction> {
        let command = self.command?;
        if now.duration_since(self.last_input) > INPUT_TIMEOUT {
            self.command = None;
            Some(HoldAction::Stop)
        } else if now.duration_since(self.last_sent) > KEEPALIVE {
            self.last_sent = now;
            Some(HoldAction::Send(command))
        } else {
            None
        }
    }
}

#[derive(Parser)]
#[command(version)]
struct Opts {
    /// Serial device connected to the Body
    #[arg(long, default_value = DEFAULT_HEAD_PORT)]
    port: String,
    /// Baud rate
    #[arg(long, default_value_t = DEFAULT_BAUDRATE)]
    baud: u32,
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let opts = Opts::parse();
    let link = SerialLink::open(&opts.port, opts.baud)?;
    let mut head = Head::new(link, SafetyMonitor::default());

    info!("Controls: W/S=drive, A/D=rotate, Space=stop, R/F=speed, C=calibrate, X=reset, Q=quit");
    print_speed(0);

    enable_raw_mode()?;
    let result = run_teleop(&mut head);
    disable_raw_mode()?;

    result
}

fn run_teleop(head: &mut Head<Box<dyn SerialPort>>) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut speed_idx: usize = 0;
    let mut handler = LogHandler;

    let mut hold = Hold::new(Instant::now());

    loop {
        // Poll for key with 20ms timeout (50Hz effective rate)
        if event::poll(Duration::from_millis(20))? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;
                let speed = SPEEDS[speed_idx];

                let motion = match code {
                    KeyCode::Char('w') if pressed => Some(Command::SetDrive(speed)),
                    KeyCode::Char('s') if pressed => Some(Command::SetDrive(-speed)),
                    KeyCode::Char('a') if pressed => Some(Command::SetRotation(speed)),
                    KeyCode::Char('d') if pressed => Some(Command::SetRotation(-speed)),
                    _ => None,
                };

                if let Some(command) = motion {
                    if let Some(action) = hold.press(command, Instant::now()) {
                        apply(head, action)?;
                    }
                } else {
                    match code {
                        KeyCode::Char(' ') if pressed => {
                            head.stop()?;
                            hold.clear();
                        }
                        KeyCode::Char('c') if pressed => head.calibrate()?,
                        KeyCode::Char('x') if pressed => {
                            head.reset()?;
                            hold.clear();
                        }

                        // Speed control
                        KeyCode::Char('r') if pressed => {
                            speed_idx = (speed_idx + 1).min(SPEEDS.len() - 1);
                            print_speed(speed_idx);
                        }
                        KeyCode::Char('f') if pressed => {
                            speed_idx = speed_idx.saturating_sub(1);
                            print_speed(speed_idx);
                        }

                        // Quit
                        KeyCode::Char('q') | KeyCode::Esc if pressed => break,

                        _ => {}
                    }
                }
            }
        }

        if let Some(action) = hold.tick(Instant::now()) {
            apply(head, action)?;
        }

        head.poll(&mut handler)?;
    }

    Ok(())
}

fn apply(head: &mut Head<Box<dyn SerialPort>>, action: HoldAction) -> Result<(), LinkError> {
    match action {
        HoldAction::Send(command) => head.send(command),
        HoldAction::Stop => head.stop(),
    }
}

fn print_speed(idx: usize) {
    let label = ["LOW", "MED", "HIGH"][idx];
    info!("Speed: {} ({})", label, SPEEDS[idx]);
}
