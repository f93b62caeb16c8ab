//! Decoded sensor readings

use serde::Serialize;
use std::fmt;

/// State of a single input contact (door/window sensor)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactState {
    Open,
    Closed,
}

impl fmt::Display for ContactState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContactState::Open => f.write_str("open"),
            ContactState::Closed => f.write_str("closed"),
        }
    }
}

/// Rocker switch buttons: rocker A/B, position I/O
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RockerButton {
    BI,
    BO,
    AI,
    AO,
}

impl RockerButton {
    pub fn label(self) -> &'static str {
        match self {
            RockerButton::BI => "BI",
            RockerButton::BO => "BO",
            RockerButton::AI => "AI",
            RockerButton::AO => "AO",
        }
    }
}

impl fmt::Display for RockerButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A decoded physical reading
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reading {
    Temperature {
        celsius: f64,
    },
    TemperatureHumidity {
        celsius: f64,
        humidity_percent: f64,
    },
    TemperatureSoilMoisture {
        celsius: f64,
        point_control: u8,
    },
    Contact {
        state: ContactState,
    },
    RockerPresses {
        buttons: Vec<RockerButton>,
    },
}

impl Reading {
    /// Temperature in °C, for the profiles that report one
    pub fn temperature(&self) -> Option<f64> {
        match self {
            Reading::Temperature { celsius }
            | Reading::TemperatureHumidity { celsius, .. }
            | Reading::TemperatureSoilMoisture { celsius, .. } => Some(*celsius),
            _ => None,
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Temperature { celsius } => write!(f, "temperature={:.2}", celsius),
            Reading::TemperatureHumidity {
                celsius,
                humidity_percent,
            } => write!(
                f,
                "temperature={:.2} humidity={:.0}",
                celsius, humidity_percent
            ),
            Reading::TemperatureSoilMoisture {
                celsius,
                point_control,
            } => write!(
                f,
                "temperature={:.2} soil_moisture={}",
                celsius, point_control
            ),
            Reading::Contact { state } => write!(f, "contact={}", state),
            Reading::RockerPresses { buttons } => {
                let labels: Vec<&str> = buttons.iter().map(|b| b.label()).collect();
                write!(f, "rocker={}", labels.join(","))
            }
        }
    }
}
