// src/io/serial/utils.rs
//
// Line settings for the W800RF32 and the fixed-size frame read.
// All serial parameters are protocol constants, not configuration.

use std::io::{self, Read};
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPortBuilder, StopBits};

use crate::decoder::Frame;

// ============================================================================
// Constants
// ============================================================================

pub const BAUD_RATE: u32 = 4800;

/// Per-read timeout. Also bounds how long a stop request takes to be noticed.
pub const READ_TIMEOUT: Duration = Duration::from_secs(1);

/// How long `disconnect` waits for the reader thread before giving up on it.
pub const JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// 4800 8N1, no flow control.
pub fn port_builder(port: &str) -> SerialPortBuilder {
    serialport::new(port, BAUD_RATE)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(READ_TIMEOUT)
}

// ============================================================================
// Frame Reads
// ============================================================================

/// Fill `frame` from `reader`, stopping early on a read timeout.
///
/// Returns the number of bytes read; anything short of a full frame means the
/// timeout fired first. End of stream is reported as `UnexpectedEof`.
pub fn read_frame<R: Read + ?Sized>(reader: &mut R, frame: &mut Frame) -> io::Result<usize> {
    let mut filled = 0;
    while filled < frame.len() {
        match reader.read(&mut frame[filled..]) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "serial stream closed",
                ))
            }
            Ok(n) => filled += n,
            Err(ref e) if e.kind() == io::ErrorKind::TimedOut => return Ok(filled),
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Reader that replays a script of chunks and errors.
    struct Scripted(VecDeque<io::Result<Vec<u8>>>);

    impl Read for Scripted {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.pop_front() {
                Some(Ok(chunk)) => {
                    let n = chunk.len().min(buf.len());
                    buf[..n].copy_from_slice(&chunk[..n]);
                    Ok(n)
                }
                Some(Err(e)) => Err(e),
                None => Ok(0),
            }
        }
    }

    fn timed_out() -> io::Result<Vec<u8>> {
        Err(io::Error::new(io::ErrorKind::TimedOut, "timed out"))
    }

    #[test]
    fn test_read_full_frame() {
        let mut reader = io::Cursor::new(vec![0x56, 0x55, 0x81, 0x00]);
        let mut frame = [0u8; 4];
        assert_eq!(read_frame(&mut reader, &mut frame).unwrap(), 4);
        assert_eq!(frame, [0x56, 0x55, 0x81, 0x00]);
    }

    #[test]
    fn test_read_accumulates_partial_reads() {
        let mut reader = Scripted(VecDeque::from(vec![Ok(vec![0x60]), Ok(vec![0x9F, 0x00]), Ok(vec![0xFF])]));
        let mut frame = [0u8; 4];
        assert_eq!(read_frame(&mut reader, &mut frame).unwrap(), 4);
        assert_eq!(frame, [0x60, 0x9F, 0x00, 0xFF]);
    }

    #[test]
    fn test_timeout_gives_short_read() {
        let mut reader = Scripted(VecDeque::from(vec![Ok(vec![0x60, 0x9F]), timed_out()]));
        let mut frame = [0u8; 4];
        assert_eq!(read_frame(&mut reader, &mut frame).unwrap(), 2);

        let mut reader = Scripted(VecDeque::from(vec![timed_out()]));
        assert_eq!(read_frame(&mut reader, &mut frame).unwrap(), 0);
    }

    #[test]
    fn test_interrupted_is_retried() {
        let mut reader = Scripted(VecDeque::from(vec![
            Err(io::Error::new(io::ErrorKind::Interrupted, "signal")),
            Ok(vec![1, 2, 3, 4]),
        ]));
        let mut frame = [0u8; 4];
        assert_eq!(read_frame(&mut reader, &mut frame).unwrap(), 4);
    }

    #[test]
    fn test_eof_is_an_error() {
        let mut reader = io::Cursor::new(vec![0x01, 0x02]);
        let mut frame = [0u8; 4];
        let err = read_frame(&mut reader, &mut frame).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_other_errors_propagate() {
        let mut reader = Scripted(VecDeque::from(vec![Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"))]));
        let mut frame = [0u8; 4];
        let err = read_frame(&mut reader, &mut frame).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
