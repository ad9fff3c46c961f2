//! ESP32-C3 SuperMini hardware abstraction layer for the cable plotter.
//!
//! This module provides hardware implementations for an ESP32-C3 SuperMini
//! driving two 28BYJ-48 steppers through ULN2003 boards.
//!
//! # Hardware Configuration
//!
//! - **MCU**: ESP32-C3 SuperMini (RISC-V 160MHz, 4MB Flash)
//! - **Motor Drivers**: 2x ULN2003 darlington array, HALF4WIRE drive
//! - **Motors**: 2x 28BYJ-48 (4095 half-steps per output revolution)
//! - **Host link**: UART0 at 115200 baud
//!
//! # Pin Assignments
//!
//! See the [`pins`] module for GPIO assignments matching the SuperMini layout.

mod clock;
mod serial;

pub use clock::Esp32Clock;
pub use serial::Esp32Serial;

use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};

use super::CoilStepper;

/// ULN2003 coil driver on four ESP32 GPIOs.
pub type Esp32Stepper<'d> = CoilStepper<PinDriver<'d, AnyOutputPin, Output>>;

/// Pin assignments for SuperMini ESP32-C3.
///
/// Coil pins are listed in drive order `IN1, IN3, IN2, IN4`, which is the
/// order the half-step sequence expects.
pub mod pins {
    // =========================================================================
    // Left motor (ULN2003)
    // =========================================================================

    /// Left IN1
    pub const LEFT_IN1: i32 = 0;

    /// Left IN3
    pub const LEFT_IN3: i32 = 1;

    /// Left IN2
    pub const LEFT_IN2: i32 = 2;

    /// Left IN4
    pub const LEFT_IN4: i32 = 3;

    // =========================================================================
    // Right motor (ULN2003)
    // =========================================================================

    /// Right IN1
    pub const RIGHT_IN1: i32 = 4;

    /// Right IN3
    pub const RIGHT_IN3: i32 = 5;

    /// Right IN2
    pub const RIGHT_IN2: i32 = 6;

    /// Right IN4
    pub const RIGHT_IN4: i32 = 7;

    // =========================================================================
    // Host link (UART0)
    // =========================================================================

    /// UART0 TX
    pub const UART_TX: i32 = 21;

    /// UART0 RX
    pub const UART_RX: i32 = 20;
}
