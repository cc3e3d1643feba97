// src/decoder/x10.rs
//
// Standard X10 RF frames.
//
// Layout: [addr, !addr, func, !func]. The receiver hands each byte over
// least-significant bit first, so both data bytes are bit-reversed before the
// house code, unit and command are pulled out.

use super::types::{Frame, X10Command, X10Event};
use crate::error::InvalidFrame;

/// House code letter for each 4-bit code. The order is fixed by the X10 encoding.
pub static HOUSE_CODES: [char; 16] = [
    'M', // 0000
    'E', // 0001
    'C', // 0010
    'K', // 0011
    'O', // 0100
    'G', // 0101
    'A', // 0110
    'I', // 0111
    'N', // 1000
    'F', // 1001
    'D', // 1010
    'L', // 1011
    'P', // 1100
    'H', // 1101
    'B', // 1110
    'J', // 1111
];

const CMD_OFF_ALT: u8 = 0x19;
const CMD_ON_ALT: u8 = 0x11;
const CMD_BITS: u8 = 0x05;
const CMD_OFF: u8 = 0x04;
const CMD_ON: u8 = 0x00;

/// Reverse the bit order of a byte (`0b1011_0000` -> `0b0000_1101`).
pub fn reverse_bits_8(byte: u8) -> u8 {
    byte.reverse_bits()
}

/// Both halves of the frame must be complement pairs.
pub fn checksum_valid(frame: &Frame) -> bool {
    frame[0] as u16 + frame[1] as u16 == 0xFF && frame[2] as u16 + frame[3] as u16 == 0xFF
}

/// Decode a standard X10 frame.
pub fn decode_x10(frame: &Frame) -> Result<X10Event, InvalidFrame> {
    if !checksum_valid(frame) {
        return Err(InvalidFrame::Checksum(*frame));
    }

    let addr = reverse_bits_8(frame[0]);
    let func = reverse_bits_8(frame[2]);

    let house_code = HOUSE_CODES[(addr & 0x0F) as usize];

    // Not clamped to 1-16: function bytes no transmitter sends decode past 16
    let mut unit = (func >> 3) + ((func & 0x02) << 1) + ((addr & 0x20) >> 2) + 1;

    // 0x19/0x11 are Dim/Bright on 5-key pads but Off/On on 4-key pads (RSS18)
    let command = if func == CMD_OFF_ALT {
        X10Command::Off
    } else if func == CMD_ON_ALT {
        unit += 1;
        X10Command::On
    } else if func & CMD_BITS == CMD_OFF {
        X10Command::Off
    } else if func & CMD_BITS == CMD_ON {
        X10Command::On
    } else {
        return Err(InvalidFrame::UnsupportedCommand(func));
    };

    Ok(X10Event {
        house_code,
        unit: Some(unit),
        command,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a checksum-valid frame from already-reversed address/function bytes.
    fn frame(addr: u8, func: u8) -> Frame {
        let b0 = reverse_bits_8(addr);
        let b2 = reverse_bits_8(func);
        [b0, !b0, b2, !b2]
    }

    #[test]
    fn test_reverse_bits_examples() {
        assert_eq!(reverse_bits_8(0b1011_0000), 0b0000_1101);
        assert_eq!(reverse_bits_8(0x06), 0x60);
        assert_eq!(reverse_bits_8(0x01), 0x80);
        assert_eq!(reverse_bits_8(0xFF), 0xFF);
    }

    #[test]
    fn test_reverse_bits_self_inverse() {
        for x in 0..=u8::MAX {
            assert_eq!(reverse_bits_8(reverse_bits_8(x)), x);
        }
    }

    #[test]
    fn test_house_code_table() {
        let expected: [(usize, char); 16] = [
            (0b0110, 'A'), (0b1110, 'B'), (0b0010, 'C'), (0b1010, 'D'),
            (0b0001, 'E'), (0b1001, 'F'), (0b0101, 'G'), (0b1101, 'H'),
            (0b0111, 'I'), (0b1111, 'J'), (0b0011, 'K'), (0b1011, 'L'),
            (0b0000, 'M'), (0b1000, 'N'), (0b0100, 'O'), (0b1100, 'P'),
        ];
        for (code, letter) in expected {
            assert_eq!(HOUSE_CODES[code], letter, "code {:04b}", code);
        }
    }

    #[test]
    fn test_a1_on_and_off() {
        let on = decode_x10(&[0x60, 0x9F, 0x00, 0xFF]).unwrap();
        assert_eq!(on, X10Event { house_code: 'A', unit: Some(1), command: X10Command::On });

        let off = decode_x10(&[0x60, 0x9F, 0x20, 0xDF]).unwrap();
        assert_eq!(off, X10Event { house_code: 'A', unit: Some(1), command: X10Command::Off });
    }

    #[test]
    fn test_house_from_reversed_low_nibble() {
        // reverse(0x06) = 0x60: low nibble 0000 -> 'M', bit 5 set -> unit + 8
        let event = decode_x10(&[0x06, 0xF9, 0x00, 0xFF]).unwrap();
        assert_eq!(event.house_code, HOUSE_CODES[(reverse_bits_8(0x06) & 0x0F) as usize]);
        assert_eq!(event.house_code, 'M');
        assert_eq!(event.unit, Some(9));
        assert_eq!(event.command, X10Command::On);
    }

    #[test]
    fn test_unit_bits() {
        // func bit 3 -> +1, func bit 1 -> +4, addr bit 5 -> +8
        assert_eq!(decode_x10(&frame(0x06, 0x08)).unwrap().unit, Some(2));
        assert_eq!(decode_x10(&frame(0x06, 0x02)).unwrap().unit, Some(5));
        assert_eq!(decode_x10(&frame(0x26, 0x00)).unwrap().unit, Some(9));
        assert_eq!(decode_x10(&frame(0x26, 0x1A)).unwrap().unit, Some(16));
    }

    #[test]
    fn test_unit_is_not_clamped() {
        // reversed function 0xF8 with address bit 5 set: 31 + 8 + 1
        let event = decode_x10(&frame(0x26, 0xF8)).unwrap();
        assert_eq!(event.unit, Some(40));
    }

    #[test]
    fn test_alternate_codes() {
        let off = decode_x10(&frame(0x0E, 0x19)).unwrap();
        assert_eq!(off.house_code, 'B');
        assert_eq!(off.command, X10Command::Off);
        assert_eq!(off.unit, Some(4));

        // 0x11 shifts the unit by one
        let on = decode_x10(&frame(0x0E, 0x11)).unwrap();
        assert_eq!(on.command, X10Command::On);
        assert_eq!(on.unit, Some(4));
    }

    #[test]
    fn test_unsupported_command_rejected() {
        assert_eq!(
            decode_x10(&frame(0x06, 0x01)),
            Err(InvalidFrame::UnsupportedCommand(0x01))
        );
        assert_eq!(
            decode_x10(&frame(0x06, 0x05)),
            Err(InvalidFrame::UnsupportedCommand(0x05))
        );
    }

    #[test]
    fn test_checksum_mismatch_rejected() {
        let bad = [0x60, 0x9E, 0x00, 0xFF];
        assert_eq!(decode_x10(&bad), Err(InvalidFrame::Checksum(bad)));
        let bad = [0x60, 0x9F, 0x00, 0xFE];
        assert!(matches!(decode_x10(&bad), Err(InvalidFrame::Checksum(_))));
        assert!(decode_x10(&[0x00, 0x00, 0x00, 0x00]).is_err());
    }

    #[test]
    fn test_command_resolution_over_all_function_bytes() {
        for b2 in 0..=u8::MAX {
            let f = [0x60, 0x9F, b2, !b2];
            let func = reverse_bits_8(b2);
            let supported = func == 0x19 || func == 0x11 || func & 0x05 == 0x04 || func & 0x05 == 0x00;
            assert_eq!(decode_x10(&f).is_ok(), supported, "b2 = {:#04x}", b2);
        }
    }

    #[test]
    fn test_decode_is_pure() {
        let f = frame(0x0A, 0x04);
        assert_eq!(decode_x10(&f), decode_x10(&f));
    }
}
