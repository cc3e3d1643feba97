// src/error.rs
//
// Error types for frame decoding and receiver connections.
// Decode errors never leave the router; W800Error is what callers see.

use thiserror::Error;

/// Why a candidate X10 frame was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidFrame {
    /// Byte 1 is not the complement of byte 0, or byte 3 of byte 2.
    #[error("checksum pair mismatch: {0:02x?}")]
    Checksum([u8; 4]),

    /// The (bit-reversed) command byte maps to Dim/Bright or nothing we decode.
    #[error("unsupported command code {0:#04x}")]
    UnsupportedCommand(u8),
}

/// Connection, configuration, and host-side errors.
#[derive(Debug, Error)]
pub enum W800Error {
    #[error("failed to open {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },

    /// `connect` was called on an instance that is not idle.
    #[error("receiver already started; create a new instance to reconnect")]
    AlreadyStarted,

    #[error("failed to spawn reader thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to enumerate serial ports: {0}")]
    Enumerate(#[source] serialport::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid sensor address: {0:?}")]
    InvalidAddress(String),
}

pub type Result<T> = std::result::Result<T, W800Error>;
