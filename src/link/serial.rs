// Line-oriented serial link
//
// Wraps any Read + Write transport (a serialport handle on real hardware,
// an in-memory pipe in tests). Reads are drained until the transport has
// nothing more to give; writes are a single attempt per line.

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;
use tracing::{debug, info};

use super::framing::LineFramer;

/// Read timeout for the serial port; bounds how long a poll can block
pub const READ_TIMEOUT_MS: u64 = 1;

#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Short write: {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },
}

pub type Result<T> = std::result::Result<T, LinkError>;

pub struct SerialLink<T> {
    port: T,
    framer: LineFramer,
}

impl SerialLink<Box<dyn SerialPort>> {
    /// Open a serial port configured for the link (8N1, no flow control)
    pub fn open(port_name: &str, baudrate: u32) -> Result<Self> {
        let port = serialport::new(port_name, baudrate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_millis(READ_TIMEOUT_MS))
            .open()?;

        info!("Serial link open on {} at {} baud", port_name, baudrate);
        Ok(Self::new(port))
    }
}

impl<T: Read + Write> SerialLink<T> {
    pub fn new(port: T) -> Self {
        Self {
            port,
            framer: LineFramer::new(),
        }
    }

    /// Drain everything the transport has buffered and return completed lines in arrival order
    pub fn poll_lines(&mut self) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        let mut chunk = [0u8; 256];

        loop {
            match self.port.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => self.framer.extend(&chunk[..n], &mut lines),
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(LinkError::Io(e)),
            }
        }

        Ok(lines)
    }

    /// Send one line plus terminator. Partial writes are reported, not retried.
    pub fn send_line(&mut self, line: &str) -> Result<()> {
        let mut packet = Vec::with_capacity(line.len() + 1);
        packet.extend_from_slice(line.as_bytes());
        packet.push(b'\n');

        let written = self.port.write(&packet)?;
        self.port.flush()?;
        if written != packet.len() {
            return Err(LinkError::ShortWrite {
                written,
                expected: packet.len(),
            });
        }

        debug!("Sent line: {}", line);
        Ok(())
    }

    pub fn get_ref(&self) -> &T {
        &self.port
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.port
    }
}
