//! Host link over an ESP32 UART.

use esp_idf_hal::delay::NON_BLOCK;
use esp_idf_hal::gpio::{AnyIOPin, InputPin, OutputPin};
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::sys::EspError;
use esp_idf_hal::uart::{config::Config as UartConfig, Uart, UartDriver};
use esp_idf_hal::units::Hertz;

use crate::config::SerialConfig;
use crate::traits::SerialPort;

/// UART serial link with non-blocking reads.
///
/// # Example
///
/// ```ignore
/// use ploptart::hal::esp32::Esp32Serial;
///
/// let peripherals = Peripherals::take()?;
/// let serial = Esp32Serial::new(
///     peripherals.uart0,
///     peripherals.pins.gpio21,
///     peripherals.pins.gpio20,
///     &SerialConfig::default(),
/// )?;
/// ```
pub struct Esp32Serial<'d> {
    uart: UartDriver<'d>,
}

impl<'d> Esp32Serial<'d> {
    /// Open the UART at the configured baud rate, 8N1, no flow control.
    pub fn new<U: Uart>(
        uart: impl Peripheral<P = U> + 'd,
        tx: impl Peripheral<P = impl OutputPin> + 'd,
        rx: impl Peripheral<P = impl InputPin> + 'd,
        config: &SerialConfig,
    ) -> Result<Self, EspError> {
        let uart_config = UartConfig::default().baudrate(Hertz(config.baud_rate));
        let uart = UartDriver::new(
            uart,
            tx,
            rx,
            Option::<AnyIOPin>::None,
            Option::<AnyIOPin>::None,
            &uart_config,
        )?;
        Ok(Self { uart })
    }
}

impl SerialPort for Esp32Serial<'_> {
    type Error = EspError;

    fn read_byte(&mut self) -> Result<Option<u8>, EspError> {
        let mut buf = [0u8; 1];
        match self.uart.read(&mut buf, NON_BLOCK)? {
            0 => Ok(None),
            _ => Ok(Some(buf[0])),
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), EspError> {
        let mut remaining = bytes;
        while !remaining.is_empty() {
            let written = self.uart.write(remaining)?;
            remaining = &remaining[written..];
        }
        Ok(())
    }
}
