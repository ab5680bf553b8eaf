// ASCII line protocol
//
// Head -> Body: R<int>, D<int>, S, CALIB, RESET
// Body -> Head: IMU,f,f,f,f,f,f / ALERT,<reason> / INFO,<text> / ACK,<cmd> / NG,<cmd>,<reason>

pub mod command;
pub mod telemetry;

pub use command::{encode_command, parse_command};
pub use telemetry::{decode_telemetry, encode_telemetry};
