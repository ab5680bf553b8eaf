// Test doubles shared by the integration tests
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::rc::Rc;

use robot_link::motor::Actuator;

type Queue = Rc<RefCell<VecDeque<u8>>>;

/// One end of an in-memory serial cable. Reads report `WouldBlock` when
/// nothing is pending, like a serial port hitting its read timeout.
#[derive(Clone, Default)]
pub struct MemPort {
    rx: Queue,
    tx: Queue,
}

impl MemPort {
    /// Two ends of the same cable
    pub fn pair() -> (MemPort, MemPort) {
        let a: Queue = Rc::default();
        let b: Queue = Rc::default();
        (
            MemPort { rx: a.clone(), tx: b.clone() },
            MemPort { rx: b, tx: a },
        )
    }

    /// Send bytes from this end; the peer reads them
    pub fn inject(&self, data: &str) {
        self.tx.borrow_mut().extend(data.bytes());
    }

    /// Everything the peer has written that this end has not read yet, split into lines
    pub fn received_lines(&self) -> Vec<String> {
        let bytes: Vec<u8> = self.rx.borrow_mut().drain(..).collect();
        String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl Read for MemPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut rx = self.rx.borrow_mut();
        if rx.is_empty() {
            return Err(io::ErrorKind::WouldBlock.into());
        }
        let n = buf.len().min(rx.len());
        for (slot, byte) in buf.iter_mut().zip(rx.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for MemPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.tx.borrow_mut().extend(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Records every speed it is driven at
#[derive(Clone, Default)]
pub struct Recorder(Rc<RefCell<Vec<i8>>>);

impl Recorder {
    pub fn history(&self) -> Vec<i8> {
        self.0.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }
}

impl Actuator for Recorder {
    fn drive(&mut self, speed: i8) {
        self.0.borrow_mut().push(speed);
    }
}
