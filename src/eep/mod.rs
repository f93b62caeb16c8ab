//! # EnOcean Equipment Profiles
//!
//! Turns the data bytes of an ERP2 telegram into physical readings.
//!
//! Supported profiles:
//! - A5-10-03: temperature 0..40 °C and set point control (used as soil moisture proxy)
//! - A5-02-05: temperature 0..40 °C
//! - A5-04-01: temperature 0..40 °C and humidity 0..100 %
//! - D5-00-01: single input contact
//! - F6-02-04: rocker switch, 2 rockers

pub mod profile;
pub mod reading;

pub use profile::{decode, decode_data, Profile};
pub use reading::{ContactState, Reading, RockerButton};
