//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`] for various platforms.
//!
//! # Available Implementations
//!
//! - `mock`: Test implementations for desktop development
//! - `coil`: Half-step coil driver over any `embedded-hal` output pins
//! - `host`: Wall clock and stdin/stdout serial link (requires `std` feature)
//! - `esp32`: ESP32-C3 SuperMini with two ULN2003 boards (requires `esp32` feature)

pub mod coil;
pub mod mock;

#[cfg(feature = "std")]
pub mod host;

#[cfg(feature = "esp32")]
pub mod esp32;

pub use coil::CoilStepper;
pub use mock::*;

#[cfg(feature = "std")]
pub use host::*;

#[cfg(feature = "esp32")]
pub use esp32::*;
