// src/io/serial/reader.rs
//
// Background reader for a W800RF32 receiver.
// Reads 4-byte frames on a dedicated thread, decodes them, and hands each
// event to a caller-supplied sink on that same thread.

use serde::Serialize;
use std::io::Read;
use std::sync::mpsc as std_mpsc;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread::JoinHandle;

use super::utils::{port_builder, read_frame, BAUD_RATE, JOIN_TIMEOUT};
use crate::decoder::{route, Event, Frame, FRAME_LEN};
use crate::error::{Result, W800Error};

// ============================================================================
// Types
// ============================================================================

/// Lifecycle of a single connection. An instance only ever moves forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Running,
    Stopping,
    Closed,
}

/// Why the read loop ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamEnd {
    /// `disconnect` cleared the running flag
    Stopped,
    /// The byte source reported end of stream (device removed, replay finished)
    Disconnected,
    /// Read error or reader thread failure
    Error(String),
}

impl std::fmt::Display for StreamEnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamEnd::Stopped => write!(f, "stopped"),
            StreamEnd::Disconnected => write!(f, "disconnected"),
            StreamEnd::Error(e) => write!(f, "error: {}", e),
        }
    }
}

/// A serial port as shown by `w800rf32 ports`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SerialPortInfo {
    pub port_name: String,
    /// "usb", "pci", "bluetooth" or "unknown"
    pub port_type: &'static str,
    /// Manufacturer and product strings reported by USB adapters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `vid:pid` in hex, e.g. "0403:6001"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usb_id: Option<String>,
}

/// Clears the running flag when the reader thread exits, panics included.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ============================================================================
// Acquisition Worker
// ============================================================================

/// Owns one receiver connection and its reader thread.
///
/// `connect` starts the reader, `disconnect` stops it. Reconnecting after a
/// disconnect or a fatal read error needs a fresh instance.
pub struct AcquisitionWorker {
    label: String,
    state: ConnectionState,
    running: Arc<AtomicBool>,
    task_handle: Option<JoinHandle<()>>,
    ended_rx: Option<std_mpsc::Receiver<StreamEnd>>,
    end_reason: Option<StreamEnd>,
}

impl Default for AcquisitionWorker {
    fn default() -> Self {
        Self::new()
    }
}

impl AcquisitionWorker {
    pub fn new() -> Self {
        Self {
            label: String::new(),
            state: ConnectionState::Idle,
            running: Arc::new(AtomicBool::new(false)),
            task_handle: None,
            ended_rx: None,
            end_reason: None,
        }
    }

    /// Current lifecycle state. A reader that ended on its own (end of
    /// stream, read error) reports `Closed` before `disconnect` is called.
    pub fn state(&self) -> ConnectionState {
        if self.state == ConnectionState::Running && !self.running.load(Ordering::Acquire) {
            ConnectionState::Closed
        } else {
            self.state
        }
    }

    /// True while the reader thread is still reading frames.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Why the reader stopped. Known once `disconnect` has returned.
    pub fn end_reason(&self) -> Option<&StreamEnd> {
        self.end_reason.as_ref()
    }

    /// Open `port_path` at 4800 8N1 and start reading frames.
    ///
    /// On failure the worker stays `Idle` and no thread is started.
    pub fn connect<F>(&mut self, port_path: &str, sink: F) -> Result<()>
    where
        F: FnMut(Event) + Send + 'static,
    {
        self.ensure_idle()?;
        self.state = ConnectionState::Connecting;

        let port = match port_builder(port_path).open() {
            Ok(p) => p,
            Err(e) => {
                tlog!("[w800rf32] Failed to connect to {}: {}", port_path, e);
                self.state = ConnectionState::Idle;
                return Err(W800Error::Open {
                    port: port_path.to_string(),
                    source: e,
                });
            }
        };

        self.spawn(port_path, port, sink)?;
        tlog!(
            "[w800rf32] Connected to W800RF32 on {} ({} baud 8N1)",
            port_path,
            BAUD_RATE
        );
        Ok(())
    }

    /// Start reading frames from an arbitrary byte source, e.g. a capture file.
    pub fn connect_reader<R, F>(&mut self, label: &str, reader: R, sink: F) -> Result<()>
    where
        R: Read + Send + 'static,
        F: FnMut(Event) + Send + 'static,
    {
        self.ensure_idle()?;
        self.state = ConnectionState::Connecting;
        self.spawn(label, reader, sink)?;
        tlog!("[w800rf32] Reading frames from {}", label);
        Ok(())
    }

    /// Stop the reader and release the port.
    ///
    /// Waits at most `JOIN_TIMEOUT` for the thread; a reader stuck past that is
    /// detached and closes the port when its read returns. Safe to call any
    /// number of times, before or after `connect`.
    pub fn disconnect(&mut self) {
        let Some(handle) = self.task_handle.take() else {
            if self.state != ConnectionState::Idle {
                self.state = ConnectionState::Closed;
            }
            return;
        };

        self.state = ConnectionState::Stopping;
        self.running.store(false, Ordering::Release);

        let ended = match self.ended_rx.take() {
            Some(rx) => rx.recv_timeout(JOIN_TIMEOUT),
            None => Err(std_mpsc::RecvTimeoutError::Disconnected),
        };

        match ended {
            Ok(reason) => {
                let _ = handle.join();
                self.end_reason = Some(reason);
            }
            Err(std_mpsc::RecvTimeoutError::Timeout) => {
                tlog!(
                    "[w800rf32] Reader on {} did not stop within {:?}, detaching",
                    self.label,
                    JOIN_TIMEOUT
                );
                self.end_reason = Some(StreamEnd::Stopped);
            }
            Err(std_mpsc::RecvTimeoutError::Disconnected) => {
                // Sender dropped without a report: the thread panicked
                let _ = handle.join();
                tlog!("[w800rf32] Reader thread for {} panicked", self.label);
                self.end_reason = Some(StreamEnd::Error("reader thread panicked".to_string()));
            }
        }

        self.state = ConnectionState::Closed;
        tlog!("[w800rf32] Disconnected from {}", self.label);
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.state == ConnectionState::Idle {
            Ok(())
        } else {
            Err(W800Error::AlreadyStarted)
        }
    }

    fn spawn<R, F>(&mut self, label: &str, reader: R, sink: F) -> Result<()>
    where
        R: Read + Send + 'static,
        F: FnMut(Event) + Send + 'static,
    {
        let (ended_tx, ended_rx) = std_mpsc::sync_channel::<StreamEnd>(1);
        self.running.store(true, Ordering::Release);

        let running = self.running.clone();
        let thread_label = label.to_string();
        let spawned = std::thread::Builder::new()
            .name("w800rf32-reader".to_string())
            .spawn(move || {
                let _guard = RunningGuard(running.clone());
                let end = run_read_loop(&thread_label, reader, &running, sink);
                let _ = ended_tx.send(end);
            });

        match spawned {
            Ok(handle) => {
                self.label = label.to_string();
                self.task_handle = Some(handle);
                self.ended_rx = Some(ended_rx);
                self.state = ConnectionState::Running;
                Ok(())
            }
            Err(e) => {
                tlog!("[w800rf32] Failed to start reader for {}: {}", label, e);
                self.running.store(false, Ordering::Release);
                self.state = ConnectionState::Idle;
                Err(W800Error::Spawn(e))
            }
        }
    }
}

impl Drop for AcquisitionWorker {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Blocking read loop. Runs until the running flag is cleared or the source fails.
fn run_read_loop<R, F>(label: &str, mut reader: R, running: &AtomicBool, mut sink: F) -> StreamEnd
where
    R: Read,
    F: FnMut(Event),
{
    let mut frame: Frame = [0u8; FRAME_LEN];

    while running.load(Ordering::Acquire) {
        match read_frame(&mut reader, &mut frame) {
            Ok(FRAME_LEN) => {
                tdebug!("[w800rf32] RAW PACKET: {}", hex::encode(frame));
                if let Some(event) = route(&frame) {
                    sink(event);
                }
            }
            Ok(_) => {
                // Timed out before a full frame arrived
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                tlog!("[w800rf32] {} closed", label);
                running.store(false, Ordering::Release);
                return StreamEnd::Disconnected;
            }
            Err(e) => {
                tlog!("[w800rf32] Serial error on {}: {}", label, e);
                running.store(false, Ordering::Release);
                return StreamEnd::Error(e.to_string());
            }
        }
    }

    StreamEnd::Stopped
}

// ============================================================================
// Port Listing
// ============================================================================

/// List serial ports a receiver could be attached to.
pub fn list_serial_ports() -> Result<Vec<SerialPortInfo>> {
    let ports = serialport::available_ports().map_err(W800Error::Enumerate)?;
    Ok(ports
        .into_iter()
        .filter(|p| !is_dial_in_device(&p.port_name))
        .map(describe_port)
        .collect())
}

/// macOS lists every port twice; the /dev/tty.* side blocks on open waiting
/// for carrier detect, which a W800RF32 never raises.
fn is_dial_in_device(port_name: &str) -> bool {
    cfg!(target_os = "macos") && port_name.starts_with("/dev/tty.")
}

fn describe_port(port: serialport::SerialPortInfo) -> SerialPortInfo {
    let (port_type, description, usb_id) = match port.port_type {
        serialport::SerialPortType::UsbPort(usb) => {
            let description = match (usb.manufacturer, usb.product) {
                (Some(m), Some(p)) => Some(format!("{} {}", m, p)),
                (m, p) => p.or(m),
            };
            ("usb", description, Some(format!("{:04x}:{:04x}", usb.vid, usb.pid)))
        }
        serialport::SerialPortType::PciPort => ("pci", None, None),
        serialport::SerialPortType::BluetoothPort => ("bluetooth", None, None),
        serialport::SerialPortType::Unknown => ("unknown", None, None),
    };
    SerialPortInfo {
        port_name: port.port_name,
        port_type,
        description,
        usb_id,
    }
}

// ============================================================================
// Tests
// ============================================================================
