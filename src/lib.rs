//! # EnOcean Gateway Library
//!
//! Receive EnOcean radio telegrams from an ESP3 transceiver and decode sensor readings.
//!
//! This library provides the layers between the serial byte stream and decoded
//! readings: frame assembly, ESP3 envelope parsing, ERP2 telegram parsing and
//! EEP profile decoding, plus the task pipeline that connects them.

pub mod config;
pub mod device;
pub mod eep;
pub mod error;
pub mod esp3;
pub mod pipeline;
pub mod serial;
pub mod telemetry;
