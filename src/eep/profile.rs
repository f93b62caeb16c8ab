//! Profile identities and their data decoders
//!
//! Every decoder is a pure function of the telegram data bytes.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::trace;

use super::reading::{ContactState, Reading, RockerButton};
use crate::error::DecodeError;
use crate::esp3::Telegram;

/// A5-xx temperature data byte (DB1 in EEP numbering)
const TEMPERATURE_BYTE: usize = 2;
/// A5-10-03 set point control byte
const SET_POINT_BYTE: usize = 1;
/// A5-04-01 humidity byte
const HUMIDITY_BYTE: usize = 1;
/// D5/F6 single data byte
const SWITCH_BYTE: usize = 0;

const CONTACT_OPEN: u8 = 0b0000_1000;

/// Rocker bit patterns, checked in this order
const ROCKER_PATTERNS: [(u8, RockerButton); 4] = [
    (0b1000_1000, RockerButton::BI),
    (0b1000_0100, RockerButton::BO),
    (0b1000_0010, RockerButton::AI),
    (0b1000_0001, RockerButton::AO),
];

/// Supported EnOcean Equipment Profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Profile {
    /// A5-10-03: room panel, temperature and set point control
    TemperatureSetPoint,
    /// A5-02-05: temperature sensor 0..40 °C
    Temperature,
    /// A5-04-01: temperature and humidity sensor
    TemperatureHumidity,
    /// D5-00-01: single input contact
    SingleContact,
    /// F6-02-04: light and blind control rocker
    RockerSwitch,
}

impl Profile {
    pub const ALL: [Profile; 5] = [
        Profile::TemperatureSetPoint,
        Profile::Temperature,
        Profile::TemperatureHumidity,
        Profile::SingleContact,
        Profile::RockerSwitch,
    ];

    /// Full EEP identifier (RORG-FUNC-TYPE)
    pub fn eep(self) -> &'static str {
        match self {
            Profile::TemperatureSetPoint => "A5-10-03",
            Profile::Temperature => "A5-02-05",
            Profile::TemperatureHumidity => "A5-04-01",
            Profile::SingleContact => "D5-00-01",
            Profile::RockerSwitch => "F6-02-04",
        }
    }

    /// FUNC-TYPE part of the identifier, e.g. "10-03"
    pub fn short_id(self) -> &'static str {
        &self.eep()[3..]
    }

    /// Profile used by a device model from the device list
    ///
    /// ```
    /// use enocean_gateway::eep::Profile;
    ///
    /// assert_eq!(Profile::for_model("STM431JS"), Some(Profile::TemperatureSetPoint));
    /// assert_eq!(Profile::for_model("UNKNOWN"), None);
    /// ```
    pub fn for_model(model: &str) -> Option<Profile> {
        match model {
            "STM431JS" => Some(Profile::TemperatureSetPoint),
            "STM431J" => Some(Profile::Temperature),
            "STM431JH" => Some(Profile::TemperatureHumidity),
            "STM429J" => Some(Profile::SingleContact),
            "PTM210J" => Some(Profile::RockerSwitch),
            _ => None,
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.eep())
    }
}

impl Serialize for Profile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.eep())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown profile: {0}")]
pub struct ParseProfileError(String);

impl FromStr for Profile {
    type Err = ParseProfileError;

    /// Accepts either the full EEP id ("A5-10-03") or FUNC-TYPE ("10-03")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        Profile::ALL
            .into_iter()
            .find(|p| p.eep() == wanted || p.short_id() == wanted)
            .ok_or_else(|| ParseProfileError(s.to_string()))
    }
}

fn byte_at(profile: Profile, data: &[u8], index: usize) -> Result<u8, DecodeError> {
    data.get(index).copied().ok_or(DecodeError::MissingDataByte {
        profile,
        index,
        len: data.len(),
    })
}

/// 255..0 maps to 0..40 °C
fn inverted_temperature(raw: u8) -> f64 {
    (255.0 - raw as f64) * 40.0 / 255.0
}

/// Decode raw telegram data bytes with the given profile
pub fn decode_data(profile: Profile, data: &[u8]) -> Result<Reading, DecodeError> {
    let reading = match profile {
        Profile::TemperatureSetPoint => {
            let celsius = inverted_temperature(byte_at(profile, data, TEMPERATURE_BYTE)?);
            let point_control = byte_at(profile, data, SET_POINT_BYTE)?;
            Reading::TemperatureSoilMoisture {
                celsius,
                point_control,
            }
        }
        Profile::Temperature => Reading::Temperature {
            celsius: inverted_temperature(byte_at(profile, data, TEMPERATURE_BYTE)?),
        },
        Profile::TemperatureHumidity => {
            let raw_temp = byte_at(profile, data, TEMPERATURE_BYTE)?;
            let raw_hum = byte_at(profile, data, HUMIDITY_BYTE)?;
            Reading::TemperatureHumidity {
                celsius: raw_temp as f64 / 250.0 * 40.0,
                humidity_percent: raw_hum as f64 / 250.0 * 100.0,
            }
        }
        Profile::SingleContact => {
            let state = if byte_at(profile, data, SWITCH_BYTE)? == CONTACT_OPEN {
                ContactState::Open
            } else {
                ContactState::Closed
            };
            Reading::Contact { state }
        }
        Profile::RockerSwitch => {
            let raw = byte_at(profile, data, SWITCH_BYTE)?;
            let buttons = ROCKER_PATTERNS
                .iter()
                .filter(|(mask, _)| raw & mask == *mask)
                .map(|&(_, button)| button)
                .collect();
            Reading::RockerPresses { buttons }
        }
    };

    trace!(%profile, %reading, "decoded profile data");
    Ok(reading)
}

/// Decode a telegram's data bytes with the given profile
pub fn decode(profile: Profile, telegram: &Telegram) -> Result<Reading, DecodeError> {
    decode_data(profile, &telegram.data)
}
