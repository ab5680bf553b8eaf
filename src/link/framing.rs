// Line framing for the ASCII serial protocol
//
// Bytes accumulate until '\n' or '\r'. A line that would not fit the buffer
// is discarded and accumulation starts over from the next byte.

use tracing::debug;

use crate::config::LINE_BUFFER_SIZE;

pub struct LineFramer {
    buffer: Vec<u8>,
    capacity: usize,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::with_buffer_size(LINE_BUFFER_SIZE)
    }

    /// `size` includes the reserved terminator slot, so at most `size - 1` payload bytes fit
    pub fn with_buffer_size(size: usize) -> Self {
        let capacity = size.saturating_sub(1).max(1);
        Self {
            buffer: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Feed one byte, returning a completed line if this byte terminated one
    pub fn push(&mut self, byte: u8) -> Option<String> {
        match byte {
            b'\n' | b'\r' => {
                if self.buffer.is_empty() {
                    return None;
                }
                let line = String::from_utf8_lossy(&self.buffer).into_owned();
                self.buffer.clear();
                Some(line)
            }
            _ if self.buffer.len() < self.capacity => {
                self.buffer.push(byte);
                None
            }
            _ => {
                debug!("Line buffer overflow, dropping {} bytes", self.buffer.len());
                self.buffer.clear();
                None
            }
        }
    }

    /// Feed a chunk of bytes, appending completed lines in arrival order
    pub fn extend(&mut self, bytes: &[u8], lines: &mut Vec<String>) {
        lines.extend(bytes.iter().filter_map(|&b| self.push(b)));
    }

    /// Bytes held for the line in progress
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}
