//! Serial link abstraction.
//!
//! The plotter is driven over a plain byte stream (UART, USB CDC, or stdin
//! on the desktop simulator). The protocol itself lives in
//! [`crate::protocol`]; this trait only moves bytes.
//!
//! ```text
//! host -> plotter   M 100 -100\n     move both axes
//! host -> plotter   T                telemetry request (single byte)
//! plotter -> host   100,-100\n       telemetry reply
//! ```

/// Byte-oriented serial link.
///
/// This trait uses a **polling design**: [`read_byte`](Self::read_byte) must
/// never block, so the motion loop keeps stepping while waiting for input.
///
/// # Example
///
/// ```rust
/// use ploptart::traits::SerialPort;
/// use ploptart::hal::MockSerial;
///
/// let mut serial = MockSerial::new();
/// serial.queue_input(b"T");
///
/// assert_eq!(serial.read_byte().unwrap(), Some(b'T'));
/// assert_eq!(serial.read_byte().unwrap(), None);
///
/// serial.write_all(b"0,0\n").unwrap();
/// assert_eq!(serial.output_str(), "0,0\n");
/// ```
pub trait SerialPort {
    /// Error type for serial operations.
    type Error;

    /// Try to read the next byte (non-blocking).
    ///
    /// Returns `Ok(None)` if no byte is available.
    fn read_byte(&mut self) -> Result<Option<u8>, Self::Error>;

    /// Write the whole buffer to the link.
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
}
