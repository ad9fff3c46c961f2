//! Trait definitions for hardware abstraction.
//!
//! This module defines the core abstractions that allow ploptart to:
//! - Run on different hardware (ESP32, desktop simulator, test mocks)
//! - Talk over any byte-oriented serial link
//!
//! # Submodules
//!
//! - `hardware`: Stepper drivers, clock, half-step coil sequence
//! - `serial`: Non-blocking serial link
//!
//! # Hardware Abstraction
//!
//! The key traits are:
//!
//! - [`StepperDriver`]: Emits single steps on one motor
//! - [`Clock`]: Microsecond time source shared by all axes
//! - [`SerialPort`]: Command input and telemetry output

pub mod hardware;
pub mod serial;

pub use hardware::*;
pub use serial::*;
