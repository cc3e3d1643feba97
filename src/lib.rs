//! Decoder and serial reader for W800RF32 X10 RF receivers.
//!
//! The receiver emits one 4-byte frame per RF transmission. [`decoder`] turns
//! a frame into an [`Event`] (standard X10 command or DS10A/KR10A security
//! report), and [`AcquisitionWorker`] reads frames from the serial port on a
//! background thread and hands each event to a sink.
//!
//! ```no_run
//! use w800rf32_lib::AcquisitionWorker;
//!
//! let mut worker = AcquisitionWorker::new();
//! worker.connect("/dev/ttyUSB0", |event| println!("{}", event))?;
//! // ...
//! worker.disconnect();
//! # Ok::<(), w800rf32_lib::W800Error>(())
//! ```

#[macro_use]
pub mod logging;

pub mod decoder;
pub mod error;
pub mod io;
pub mod sensors;
pub mod settings;

pub use decoder::{route, route_bytes, ContactState, Event, Frame, SecurityEvent, X10Command, X10Event};
pub use error::{InvalidFrame, Result, W800Error};
pub use io::{list_serial_ports, AcquisitionWorker, ConnectionState, StreamEnd};
pub use sensors::{SensorAddress, SensorRegistry, SensorUpdate};
pub use settings::Settings;
