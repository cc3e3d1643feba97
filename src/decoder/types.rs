// src/decoder/types.rs
//
// Decoded event types handed to event sinks.
// Serialized shapes match what home-automation consumers key on:
//   {"device_type":"x10","house_code":"A","unit":1,"command":"on"}
//   {"device_type":"ds10a","address":"55","state":"closed",...}

use serde::{Serialize, Serializer};

/// Every frame on the wire is exactly this long.
pub const FRAME_LEN: usize = 4;

/// One receiver frame.
pub type Frame = [u8; FRAME_LEN];

// ============================================================================
// Events
// ============================================================================

/// A decoded receiver event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "device_type")]
pub enum Event {
    #[serde(rename = "x10")]
    X10(X10Event),
    #[serde(rename = "ds10a")]
    Security(SecurityEvent),
}

/// Standard X10 lighting/switch command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct X10Event {
    /// House code letter, 'A' through 'P'
    pub house_code: char,
    /// Unit number; absent for Dim/Bright which act on the selected unit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<u8>,
    pub command: X10Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum X10Command {
    On,
    Off,
    Dim,
    Bright,
}

/// DS10A/KR10A security sensor report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityEvent {
    #[serde(serialize_with = "serialize_hex_address")]
    pub address: u8,
    pub state: ContactState,
    pub low_battery: bool,
    pub min_delay: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactState {
    Open,
    Closed,
}

impl SecurityEvent {
    /// Sensor address as two lowercase hex digits.
    pub fn address_hex(&self) -> String {
        format!("{:02x}", self.address)
    }
}

impl X10Event {
    /// Device id in the `<house><unit>` form, lowercase (e.g. "a1", or "a" for Dim/Bright).
    pub fn device_id(&self) -> String {
        let house = self.house_code.to_ascii_lowercase();
        match self.unit {
            Some(unit) => format!("{}{}", house, unit),
            None => house.to_string(),
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Event::X10(e) => write!(f, "x10 {} {:?}", e.device_id(), e.command),
            Event::Security(e) => write!(
                f,
                "ds10a {} {:?} (low_battery: {}, min_delay: {})",
                e.address_hex(),
                e.state,
                e.low_battery,
                e.min_delay
            ),
        }
    }
}

fn serialize_hex_address<S: Serializer>(address: &u8, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{:02x}", address))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_security_event_json() {
        let event = Event::Security(SecurityEvent {
            address: 0x5a,
            state: ContactState::Closed,
            low_battery: true,
            min_delay: false,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["device_type"], "ds10a");
        assert_eq!(json["address"], "5a");
        assert_eq!(json["state"], "closed");
        assert_eq!(json["low_battery"], true);
        assert_eq!(json["min_delay"], false);
    }

    #[test]
    fn test_x10_event_json() {
        let event = Event::X10(X10Event {
            house_code: 'B',
            unit: Some(3),
            command: X10Command::Off,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["device_type"], "x10");
        assert_eq!(json["house_code"], "B");
        assert_eq!(json["unit"], 3);
        assert_eq!(json["command"], "off");
    }

    #[test]
    fn test_x10_event_without_unit_omits_field() {
        let event = X10Event {
            house_code: 'C',
            unit: None,
            command: X10Command::Dim,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("unit").is_none());
        assert_eq!(event.device_id(), "c");
    }

    #[test]
    fn test_device_id_lowercase() {
        let event = X10Event {
            house_code: 'P',
            unit: Some(16),
            command: X10Command::On,
        };
        assert_eq!(event.device_id(), "p16");
    }

    #[test]
    fn test_address_hex_pads() {
        let event = SecurityEvent {
            address: 0x05,
            state: ContactState::Open,
            low_battery: false,
            min_delay: true,
        };
        assert_eq!(event.address_hex(), "05");
    }
}
