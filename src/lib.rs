//! # ploptart
//!
//! A two-stepper cable plotter controller: a pen hangs from two cables, and
//! both motors are driven so that they start and stop together for every
//! move. Moves and position queries arrive over a serial link.
//!
//! ## Features
//!
//! - **Hardware abstraction**: Traits for stepper drivers, the time source and the serial link
//! - **Coordinated motion**: Per-axis speed scaling so all axes finish together
//! - **Trapezoidal profiles**: Step-interval acceleration ramps on every axis
//! - **Serial protocol**: `M <left> <right>` moves, single-byte `T` telemetry
//! - **Cable geometry**: Host-side pen coordinate to step target conversion
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Hardware abstractions
//! - `axis` - Single-axis stepper model
//! - `group` - Coordinated multi-axis mover
//! - `controller` - Main controller that ties everything together
//! - `commands` / `protocol` - Command types and the wire format
//! - `runner` - One cooperative loop iteration: read, dispatch, poll
//! - `kinematics` - Cable lengths and step targets for pen positions
//! - `hal` - Concrete implementations (mock for testing, host, esp32 for hardware)
//!
//! ## Example
//!
//! ```rust
//! use ploptart::{Config, PlotterController};
//! use ploptart::hal::{MockClock, MockStepper};
//! use ploptart::traits::Clock;
//!
//! // Create controller with mock drivers
//! let drivers = [MockStepper::new(), MockStepper::new()];
//! let mut controller = PlotterController::new(Config::default(), drivers).unwrap();
//! let mut clock = MockClock::new();
//!
//! // Left travels twice as far, so the right axis runs at half speed
//! controller.move_to(&[200, 100]).unwrap();
//! assert_eq!(controller.axis(1).unwrap().max_speed(), 375.0);
//!
//! // Poll in your main loop
//! while controller.is_running() {
//!     controller.poll(clock.now_us()).unwrap();
//!     clock.advance(50);
//! }
//! assert_eq!(controller.positions().as_slice(), &[200, 100]);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Single-axis stepper model with trapezoidal velocity profiles.
pub mod axis;
/// Command types and outcomes.
pub mod commands;
/// Shared configuration system for desktop and ESP32.
pub mod config;
/// Main plotter controller that owns axes and drivers.
pub mod controller;
/// Coordinated multi-axis motion.
pub mod group;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Pen coordinates to cable lengths to step targets.
pub mod kinematics;
/// Serial wire format: framing, decoding, telemetry.
pub mod protocol;
/// Serial service loop shared by firmware and simulator.
pub mod runner;
/// Core traits for hardware abstraction.
pub mod traits;

// Re-exports for convenience
pub use axis::Axis;
pub use commands::{Command, CommandOutcome, MoveError, Targets};
pub use controller::{AxisState, ControllerState, PlotterController};
pub use group::{AxisId, MotionGroup, MoveOutcome, MovePlan, SyncPolicy};
pub use kinematics::{CableGeometry, Point};
pub use protocol::CommandReader;
pub use runner::{RunnerError, SerialServiceRunner, TickReport};
pub use traits::{
    // Hardware
    Clock,
    Direction,
    SerialPort,
    StepperDriver,
};

// Config re-exports
pub use config::{
    AxisConfig, Config, ConfigError, DeviceConfig, GeometryConfig, MotionConfig, SerialConfig,
};
