// Command line parsing (Body side) and encoding (Head side)

use crate::messages::{Command, clamp_speed};

const CALIBRATE: &str = "CALIB";
const RESET: &str = "RESET";

/// Parse one received line into a command.
///
/// `CALIB` and `RESET` are matched as literal prefixes first. Otherwise the
/// first byte is a case-insensitive opcode and the rest is read as a signed
/// decimal with leading-integer semantics. Unknown opcodes yield `None`.
pub fn parse_command(line: &str) -> Option<Command> {
    if line.starts_with(CALIBRATE) {
        return Some(Command::Calibrate);
    }
    if line.starts_with(RESET) {
        return Some(Command::Reset);
    }

    let (&opcode, rest) = line.as_bytes().split_first()?;
    match opcode.to_ascii_uppercase() {
        b'R' => Some(Command::SetRotation(clamp_speed(leading_int(rest)))),
        b'D' => Some(Command::SetDrive(clamp_speed(leading_int(rest)))),
        b'S' => Some(Command::Stop),
        _ => None,
    }
}

/// Render a command as a line (without terminator)
pub fn encode_command(command: &Command) -> String {
    match command {
        Command::SetRotation(speed) => format!("R{}", speed),
        Command::SetDrive(speed) => format!("D{}", speed),
        Command::Stop => "S".to_string(),
        Command::Calibrate => CALIBRATE.to_string(),
        Command::Reset => RESET.to_string(),
    }
}

/// Leading signed integer: optional whitespace, optional sign, digits.
/// Anything unparsable is 0; the result saturates instead of overflowing.
fn leading_int(bytes: &[u8]) -> i64 {
    let mut iter = bytes
        .iter()
        .copied()
        .skip_while(|b| b.is_ascii_whitespace())
        .peekable();

    let negative = match iter.peek() {
        Some(b'-') => {
            iter.next();
            true
        }
        Some(b'+') => {
            iter.next();
            false
        }
        _ => false,
    };

    let magnitude = iter
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, d| acc.saturating_mul(10).saturating_add((d - b'0') as i64));

    if negative { -magnitude } else { magnitude }
}
