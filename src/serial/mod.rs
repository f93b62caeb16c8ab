//! # Serial Communication Module
//!
//! Handles serial communication with the EnOcean USB/serial transceiver.
//!
//! This module handles:
//! - Opening the serial port at 57,600 baud (ESP3 default), 8N1
//! - Async byte reads for the frame assembler

pub mod port_trait;

use async_trait::async_trait;
use std::io;

use crate::error::{GatewayError, Result};
use port_trait::SerialPortIO;
use tracing::{debug, info, warn};

/// ESP3 baud rate
pub const ESP3_BAUD_RATE: u32 = 57_600;

/// Default transceiver device paths to try (in order of preference)
pub const DEFAULT_DEVICE_PATHS: &[&str] = &[
    "/dev/ttyUSB0", // USB 300 / USB-to-serial adapters
    "/dev/ttyAMA0", // Raspberry Pi UART (EnOcean Pi)
];

/// EnOcean transceiver serial port handler
pub struct EnoceanSerial {
    /// Serial port handle
    port: tokio_serial::SerialStream,
    /// Device path (e.g., /dev/ttyUSB0)
    device_path: String,
}

/// Configured path first, then the remaining defaults
fn preferred_paths(path: &str) -> Vec<&str> {
    std::iter::once(path)
        .chain(DEFAULT_DEVICE_PATHS.iter().copied().filter(|p| *p != path))
        .collect()
}

impl std::fmt::Debug for EnoceanSerial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnoceanSerial")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl EnoceanSerial {
    /// Open the transceiver on the configured path
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Serial` if the port cannot be opened
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use enocean_gateway::serial::{EnoceanSerial, ESP3_BAUD_RATE};
    ///
    /// fn main() -> anyhow::Result<()> {
    ///     let serial = EnoceanSerial::open("/dev/ttyUSB0", ESP3_BAUD_RATE)?;
    ///     println!("Connected to: {}", serial.device_path());
    ///     Ok(())
    /// }
    /// ```
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        let port = Self::open_port(path, baud_rate)?;
        info!("Successfully opened EnOcean transceiver at {}", path);
        Ok(Self {
            port,
            device_path: path.to_string(),
        })
    }

    /// Open the first path that works
    ///
    /// # Arguments
    ///
    /// * `paths` - Device paths to try (e.g., &["/dev/ttyUSB0"])
    /// * `baud_rate` - Line speed
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::SerialPortNotFound` listing every path tried
    pub fn open_with_paths(paths: &[&str], baud_rate: u32) -> Result<Self> {
        for path in paths {
            debug!("Trying to open serial port: {}", path);

            match Self::open(path, baud_rate) {
                Ok(serial) => return Ok(serial),
                Err(e) => {
                    warn!("Failed to open {}: {}", path, e);
                    continue;
                }
            }
        }

        Err(GatewayError::SerialPortNotFound(paths.join(", ")))
    }

    /// Open the configured path, falling back to `DEFAULT_DEVICE_PATHS`
    ///
    /// The configured path is tried first; the defaults follow in order,
    /// skipping a duplicate of the configured path.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::SerialPortNotFound` listing every path tried
    pub fn open_preferred(path: &str, baud_rate: u32) -> Result<Self> {
        let candidates = preferred_paths(path);
        Self::open_with_paths(&candidates, baud_rate)
    }

    /// Open a specific serial port with ESP3 settings
    fn open_port(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream> {
        use tokio_serial::SerialPortBuilderExt;

        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| GatewayError::Serial(format!("Failed to open {}: {}", path, e)))?;

        Ok(port)
    }

    /// Get the device path of the opened serial port
    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}

#[async_trait]
impl SerialPortIO for EnoceanSerial {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        use tokio::io::AsyncReadExt;
        self.port.read(buf).await
    }
}
