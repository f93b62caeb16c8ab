//! Trait abstraction for serial port operations to enable testing

use async_trait::async_trait;
use std::io;

/// Trait for the receive side of a serial port
#[async_trait]
pub trait SerialPortIO: Send {
    /// Read whatever bytes are available into `buf`
    ///
    /// Waits until at least one byte arrives. `Ok(0)` means the port is gone.
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}
