// src/decoder/security.rs
//
// DS10A/KR10A security sensor frames.
//
// Layout:
//   byte 0: high nibble = tag, low nibble = address high nibble
//   byte 1: high nibble = tag (same as byte 0), low nibble = address low nibble
//   byte 2: function byte (bit 0 low battery, bit 4 min delay, bit 7 closed)
//   byte 3: unused

use super::types::{ContactState, Frame, SecurityEvent};

/// Only bits 0, 2 and 7 may be set in a DS10A function byte.
pub const SECURITY_FUNCTION_MASK: u8 = 0x85;

const LOW_BATTERY_BIT: u8 = 0x01;
const MAX_DELAY_BIT: u8 = 0x10;
const CLOSED_BIT: u8 = 0x80;

/// A frame is a security candidate when bytes 0 and 1 share their high nibble.
pub fn is_security_frame(frame: &Frame) -> bool {
    frame[0] >> 4 == frame[1] >> 4
}

/// Decode a security sensor frame, or `None` if it is not one.
pub fn decode_security(frame: &Frame) -> Option<SecurityEvent> {
    if !is_security_frame(frame) {
        return None;
    }

    let function = frame[2];
    if function & !SECURITY_FUNCTION_MASK != 0 {
        return None;
    }

    let address = ((frame[0] & 0x0F) << 4) | (frame[1] & 0x0F);
    let state = if function & CLOSED_BIT != 0 {
        ContactState::Closed
    } else {
        ContactState::Open
    };

    Some(SecurityEvent {
        address,
        state,
        low_battery: function & LOW_BATTERY_BIT != 0,
        // Read from the function byte; older firmware notes put this bit in byte 1
        min_delay: function & MAX_DELAY_BIT == 0,
    })
}
