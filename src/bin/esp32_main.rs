//! ESP32-C3 SuperMini cable plotter firmware.
//!
//! This is the main entry point for the physical plotter. It runs a tight
//! cooperative loop that:
//! - Reads `M` and `T` commands from UART0
//! - Replies to telemetry requests immediately
//! - Steps both motors whenever a step is due
//!
//! # Hardware Setup
//!
//! See [`ploptart::hal::esp32::pins`] for the wiring.
//!
//! # Build
//!
//! ```bash
//! cargo build --release --features esp32 --bin esp32_main
//! espflash flash --monitor target/riscv32imc-esp-espidf/release/esp32_main
//! ```

use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{OutputPin, PinDriver};
use esp_idf_hal::peripherals::Peripherals;
use ploptart::hal::esp32::{pins as wiring, Esp32Clock, Esp32Serial, Esp32Stepper};
use ploptart::hal::CoilStepper;
use ploptart::traits::Clock;
use ploptart::{Config, PlotterController, SerialServiceRunner};

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_hal::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    let config = Config::default();
    config.validate()?;

    log::info!("================================");
    log::info!("  {} cable plotter", config.device.name);
    log::info!("================================");

    let peripherals = Peripherals::take()?;
    let pins = peripherals.pins;

    // =========================================================================
    // Initialize Motors (ULN2003, IN1/IN3/IN2/IN4 order, see `wiring`)
    // =========================================================================
    let left: Esp32Stepper = CoilStepper::new(
        [
            PinDriver::output(pins.gpio0.downgrade_output())?,
            PinDriver::output(pins.gpio1.downgrade_output())?,
            PinDriver::output(pins.gpio2.downgrade_output())?,
            PinDriver::output(pins.gpio3.downgrade_output())?,
        ],
        config.axes[0].home_position,
    );
    let right: Esp32Stepper = CoilStepper::new(
        [
            PinDriver::output(pins.gpio4.downgrade_output())?,
            PinDriver::output(pins.gpio5.downgrade_output())?,
            PinDriver::output(pins.gpio6.downgrade_output())?,
            PinDriver::output(pins.gpio7.downgrade_output())?,
        ],
        config.axes[1].home_position,
    );
    log::info!(
        "[OK] Motors initialized (left GPIO{}/{}/{}/{}, right GPIO{}/{}/{}/{})",
        wiring::LEFT_IN1,
        wiring::LEFT_IN3,
        wiring::LEFT_IN2,
        wiring::LEFT_IN4,
        wiring::RIGHT_IN1,
        wiring::RIGHT_IN3,
        wiring::RIGHT_IN2,
        wiring::RIGHT_IN4
    );

    // =========================================================================
    // Initialize Serial (UART0 on GPIO21/20)
    // =========================================================================
    let serial = Esp32Serial::new(
        peripherals.uart0,
        pins.gpio21,
        pins.gpio20,
        &config.serial,
    )?;
    log::info!(
        "[OK] Serial initialized (TX GPIO{}, RX GPIO{}, {} baud)",
        wiring::UART_TX,
        wiring::UART_RX,
        config.serial.baud_rate
    );

    let serial_config = config.serial.clone();
    let controller = PlotterController::new(config, [left, right])?;
    let mut runner = SerialServiceRunner::new(controller, serial, &serial_config);
    let clock = Esp32Clock::new();

    log::info!("Ready");

    // =========================================================================
    // Main Loop
    // =========================================================================
    loop {
        match runner.tick(clock.now_us()) {
            Ok(report) => {
                // Give the idle task a turn only while nothing is moving.
                if report.command.is_none() && !runner.controller().is_running() {
                    FreeRtos::delay_ms(1);
                }
            }
            Err(e) => log::error!("{}", e),
        }
    }
}
