// Serial link between Head and Body
//
// Provides:
// - Line framing over a raw byte stream (bounded buffer, CR/LF terminators)
// - A line-oriented wrapper over any Read + Write transport, including a real serial port

mod framing;
pub mod serial;

pub use framing::LineFramer;
pub use serial::{LinkError, SerialLink};
