// src/io/serial/mod.rs
//
// Serial transport for W800RF32 receivers.
// Fixed 4800 8N1 line, 4-byte frames, one reader thread per connection.

pub mod reader;
pub(crate) mod utils;

pub use reader::{list_serial_ports, AcquisitionWorker, ConnectionState, SerialPortInfo, StreamEnd};
pub use utils::{BAUD_RATE, JOIN_TIMEOUT, READ_TIMEOUT};
