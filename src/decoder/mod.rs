// src/decoder/mod.rs
//
// Frame classification and decoding for W800RF32 receivers.
// Security frames are tried first; everything else must pass as standard X10.

pub mod security;
pub mod types;
pub mod x10;

pub use security::{decode_security, is_security_frame, SECURITY_FUNCTION_MASK};
pub use types::{ContactState, Event, Frame, SecurityEvent, X10Command, X10Event, FRAME_LEN};
pub use x10::{checksum_valid, decode_x10, reverse_bits_8, HOUSE_CODES};

/// Decode a frame into at most one event.
///
/// A frame is never reported as both kinds. Frames that fail X10 validation
/// are dropped; the transmitter repeats itself on the next press anyway.
pub fn route(frame: &Frame) -> Option<Event> {
    if let Some(event) = decode_security(frame) {
        tdebug!("[w800rf32] Security event: {}", event.address_hex());
        return Some(Event::Security(event));
    }

    match decode_x10(frame) {
        Ok(event) => {
            tdebug!("[w800rf32] X10 event: {} {:?}", event.device_id(), event.command);
            Some(Event::X10(event))
        }
        Err(e) => {
            tdebug!("[w800rf32] Dropped frame {}: {}", hex::encode(frame), e);
            None
        }
    }
}

/// Like `route`, for a slice of unknown length. Anything but a full frame is ignored.
pub fn route_bytes(bytes: &[u8]) -> Option<Event> {
    let frame: &Frame = bytes.try_into().ok()?;
    route(frame)
}
