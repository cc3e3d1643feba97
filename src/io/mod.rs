// src/io/mod.rs
//
// Byte-source I/O for receivers. Only the serial transport exists today.

pub mod serial;

pub use serial::{list_serial_ports, AcquisitionWorker, ConnectionState, SerialPortInfo, StreamEnd};
