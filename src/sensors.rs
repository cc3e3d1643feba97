// src/sensors.rs
//
// Binary sensors bound to decoded events.
// Security sensors are on while open; X10 sensors follow On/Off commands.
// Either kind can turn itself off again after a configured delay.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use crate::decoder::{ContactState, Event, X10Command};
use crate::error::{Result, W800Error};
use crate::settings::{SensorKind, Settings};

const DEFAULT_SECURITY_CLASS: &str = "door";

// ============================================================================
// Addresses
// ============================================================================

/// The key consumers use to pick out their events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorAddress {
    Security(u8),
    X10 { house_code: char, unit: Option<u8> },
}

impl SensorAddress {
    /// Parse a config key. Two hex digits read as a security address unless
    /// `kind` says otherwise; anything else must be `<a-p>[1-16]`.
    pub fn parse(key: &str, kind: Option<SensorKind>) -> Result<Self> {
        let key = key.trim().to_ascii_lowercase();
        let parsed = match kind {
            Some(SensorKind::Security) => parse_security(&key),
            Some(SensorKind::X10) => parse_x10(&key),
            None => parse_security(&key).or_else(|| parse_x10(&key)),
        };
        parsed.ok_or(W800Error::InvalidAddress(key))
    }

}

fn parse_security(key: &str) -> Option<SensorAddress> {
    if key.len() != 2 {
        return None;
    }
    u8::from_str_radix(key, 16).ok().map(SensorAddress::Security)
}

fn parse_x10(key: &str) -> Option<SensorAddress> {
    let mut chars = key.chars();
    let house = chars.next()?;
    if !('a'..='p').contains(&house) {
        return None;
    }
    let rest = chars.as_str();
    let unit = if rest.is_empty() {
        None
    } else {
        let unit: u8 = rest.parse().ok()?;
        if !(1..=16).contains(&unit) {
            return None;
        }
        Some(unit)
    };
    Some(SensorAddress::X10 {
        house_code: house.to_ascii_uppercase(),
        unit,
    })
}

impl FromStr for SensorAddress {
    type Err = W800Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s, None)
    }
}

impl fmt::Display for SensorAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorAddress::Security(addr) => write!(f, "{:02x}", addr),
            SensorAddress::X10 { house_code, unit } => {
                write!(f, "{}", house_code.to_ascii_lowercase())?;
                if let Some(unit) = unit {
                    write!(f, "{}", unit)?;
                }
                Ok(())
            }
        }
    }
}

impl Event {
    /// Address this event is delivered to.
    pub fn address(&self) -> SensorAddress {
        match self {
            Event::X10(e) => SensorAddress::X10 {
                house_code: e.house_code,
                unit: e.unit,
            },
            Event::Security(e) => SensorAddress::Security(e.address),
        }
    }
}

// ============================================================================
// Sensors
// ============================================================================

/// Extra state reported by security sensors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityAttributes {
    pub low_battery: bool,
    pub min_delay: bool,
    /// RFC 3339 UTC time of the last report
    pub last_update: String,
}

/// Why a sensor update was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateCause {
    Event,
    OffDelay,
}

/// State change emitted for a configured sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensorUpdate {
    pub address: String,
    pub name: String,
    pub device_class: Option<String>,
    pub is_on: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<SecurityAttributes>,
    pub cause: UpdateCause,
}

#[derive(Debug, Clone)]
pub struct BinarySensor {
    address: SensorAddress,
    name: String,
    device_class: Option<String>,
    off_delay: Option<Duration>,
    is_on: bool,
    attributes: Option<SecurityAttributes>,
    off_deadline: Option<Instant>,
}

impl BinarySensor {
    pub fn new(
        address: SensorAddress,
        name: String,
        device_class: Option<String>,
        off_delay: Option<Duration>,
    ) -> Self {
        let device_class = match address {
            SensorAddress::Security(_) => {
                device_class.or_else(|| Some(DEFAULT_SECURITY_CLASS.to_string()))
            }
            SensorAddress::X10 { .. } => device_class,
        };
        Self {
            address,
            name,
            device_class,
            off_delay,
            is_on: false,
            attributes: None,
            off_deadline: None,
        }
    }

    pub fn address(&self) -> SensorAddress {
        self.address
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_on(&self) -> bool {
        self.is_on
    }

    fn apply(&mut self, event: &Event, now: Instant, at: DateTime<Utc>) {
        match event {
            Event::X10(e) => match e.command {
                X10Command::On => {
                    self.is_on = true;
                    self.arm_off_delay(now);
                }
                X10Command::Off => {
                    self.is_on = false;
                    self.off_deadline = None;
                }
                X10Command::Dim | X10Command::Bright => {}
            },
            Event::Security(e) => {
                self.is_on = e.state == ContactState::Open;
                self.attributes = Some(SecurityAttributes {
                    low_battery: e.low_battery,
                    min_delay: e.min_delay,
                    last_update: at.to_rfc3339(),
                });
                if self.is_on {
                    self.arm_off_delay(now);
                } else {
                    self.off_deadline = None;
                }
            }
        }
    }

    fn arm_off_delay(&mut self, now: Instant) {
        self.off_deadline = self.off_delay.map(|delay| now + delay);
    }

    fn update(&self, cause: UpdateCause) -> SensorUpdate {
        SensorUpdate {
            address: self.address.to_string(),
            name: self.name.clone(),
            device_class: self.device_class.clone(),
            is_on: self.is_on,
            attributes: self.attributes.clone(),
            cause,
        }
    }
}

// ============================================================================
// Registry
// ============================================================================

/// All configured sensors. Several sensors may share an address.
#[derive(Debug, Clone, Default)]
pub struct SensorRegistry {
    sensors: Vec<BinarySensor>,
}

impl SensorRegistry {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut sensors = Vec::with_capacity(settings.devices.len());
        for (key, cfg) in &settings.devices {
            let address = SensorAddress::parse(key, cfg.kind)?;
            sensors.push(BinarySensor::new(
                address,
                cfg.name.clone(),
                cfg.device_class.clone(),
                cfg.off_delay.map(Duration::from_secs),
            ));
        }
        tlog!("[sensors] {} sensors configured", sensors.len());
        Ok(Self { sensors })
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    pub fn sensors(&self) -> &[BinarySensor] {
        &self.sensors
    }

    /// Apply an event to every sensor at its address.
    ///
    /// `now` drives off-delays; `at` is the wall-clock time recorded as
    /// `last_update` on security sensors.
    pub fn handle(&mut self, event: &Event, now: Instant, at: DateTime<Utc>) -> Vec<SensorUpdate> {
        let address = event.address();
        self.sensors
            .iter_mut()
            .filter(|s| s.address == address)
            .map(|s| {
                s.apply(event, now, at);
                s.update(UpdateCause::Event)
            })
            .collect()
    }

    /// Turn off sensors whose off-delay has run out.
    pub fn expire(&mut self, now: Instant) -> Vec<SensorUpdate> {
        let mut updates = Vec::new();
        for sensor in &mut self.sensors {
            if matches!(sensor.off_deadline, Some(deadline) if deadline <= now) {
                sensor.off_deadline = None;
                sensor.is_on = false;
                tdebug!("[sensors] {} off after delay", sensor.name);
                updates.push(sensor.update(UpdateCause::OffDelay));
            }
        }
        updates
    }

    /// Earliest pending off-delay, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.sensors.iter().filter_map(|s| s.off_deadline).min()
    }
}
