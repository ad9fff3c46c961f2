//! Hardware abstraction traits for step outputs and the time source.
//!
//! This module defines the core hardware interfaces that allow ploptart to
//! run the same motion code on an ESP32, on a desktop simulator and in tests.
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`StepperDriver`] | Emits one step on a motor's coils |
//! | [`Clock`] | Monotonic microsecond time source |
//!
//! # Implementation
//!
//! For testing and desktop development, use the mock implementations
//! from [`crate::hal::mock`]. For coil-level drivers on any
//! `embedded-hal` platform use [`crate::hal::CoilStepper`].
//!
//! # Example
//!
//! ```rust
//! use ploptart::traits::{Direction, StepperDriver};
//! use ploptart::hal::MockStepper;
//!
//! let mut motor = MockStepper::new();
//! motor.step(1, Direction::Forward).unwrap();
//! motor.step(2, Direction::Forward).unwrap();
//!
//! assert_eq!(motor.forward_steps, 2);
//! assert_eq!(motor.last_position, Some(2));
//! ```

/// Direction of travel of a single axis.
///
/// [`Forward`](Self::Forward) increases the step count,
/// [`Reverse`](Self::Reverse) decreases it.
///
/// # Default
///
/// Defaults to [`Stopped`](Self::Stopped).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    /// Step count increasing.
    Forward,
    /// Step count decreasing.
    Reverse,
    /// Not moving.
    #[default]
    Stopped,
}

impl Direction {
    /// Returns the direction as a lowercase string.
    ///
    /// # Examples
    ///
    /// ```
    /// use ploptart::Direction;
    ///
    /// assert_eq!(Direction::Forward.as_str(), "forward");
    /// assert_eq!(Direction::Reverse.as_str(), "reverse");
    /// assert_eq!(Direction::Stopped.as_str(), "stopped");
    /// ```
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Reverse => "reverse",
            Direction::Stopped => "stopped",
        }
    }

    /// Unit step count for this direction (`+1`, `-1` or `0`).
    #[inline]
    pub const fn sign(&self) -> i64 {
        match self {
            Direction::Forward => 1,
            Direction::Reverse => -1,
            Direction::Stopped => 0,
        }
    }

    /// Direction that moves a position toward a signed step delta.
    ///
    /// ```
    /// use ploptart::Direction;
    ///
    /// assert_eq!(Direction::toward(12), Direction::Forward);
    /// assert_eq!(Direction::toward(-3), Direction::Reverse);
    /// assert_eq!(Direction::toward(0), Direction::Stopped);
    /// ```
    #[inline]
    pub const fn toward(delta: i64) -> Self {
        if delta > 0 {
            Direction::Forward
        } else if delta < 0 {
            Direction::Reverse
        } else {
            Direction::Stopped
        }
    }
}

/// Stepper driver trait - abstracts the coils or step/dir pins of one motor.
///
/// The motion core decides *when* to step; the driver only has to make the
/// motor move one step. `position` is the step count *after* the step, which
/// lets coil-level drivers pick the next phase of their sequence directly
/// (see [`half_step_pattern`]).
///
/// # Example Implementation
///
/// ```rust,ignore
/// use ploptart::traits::{Direction, StepperDriver};
///
/// struct StepDirPins { /* hardware handles */ }
///
/// impl StepperDriver for StepDirPins {
///     type Error = ();
///
///     fn step(&mut self, _position: i64, direction: Direction) -> Result<(), ()> {
///         // Set DIR from `direction`, then pulse STEP...
///         Ok(())
///     }
/// }
/// ```
pub trait StepperDriver {
    /// Error type for driver operations.
    type Error;

    /// Emit one step in `direction`, ending at `position`.
    fn step(&mut self, position: i64, direction: Direction) -> Result<(), Self::Error>;

    /// Energize the outputs before motion starts.
    fn enable_outputs(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// De-energize the outputs (the motor may then be back-driven).
    fn disable_outputs(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Monotonic time source.
///
/// Step timing needs sub-millisecond resolution, so time is reported in
/// microseconds since an arbitrary epoch. Every axis of a controller must be
/// polled against the same clock.
///
/// # Example
///
/// ```rust
/// use ploptart::traits::Clock;
/// use ploptart::hal::MockClock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_us(), 0);
///
/// clock.advance(250);
/// assert_eq!(clock.now_us(), 250);
/// ```
pub trait Clock {
    /// Returns current time in microseconds since an arbitrary epoch.
    ///
    /// Must be monotonically increasing.
    fn now_us(&self) -> u64;
}

/// Coil pattern for a 4-wire unipolar motor in half-step mode.
///
/// Bit `i` energizes coil output `i`. The sequence has eight phases and is
/// indexed by the absolute step position, so a driver never has to remember
/// where it is in the cycle.
///
/// ```
/// use ploptart::traits::half_step_pattern;
///
/// assert_eq!(half_step_pattern(0), 0b0001);
/// assert_eq!(half_step_pattern(1), 0b0101);
/// assert_eq!(half_step_pattern(8), half_step_pattern(0));
/// assert_eq!(half_step_pattern(-1), half_step_pattern(7));
/// ```
pub const fn half_step_pattern(position: i64) -> u8 {
    const SEQUENCE: [u8; 8] = [
        0b0001, 0b0101, 0b0100, 0b0110, 0b0010, 0b1010, 0b1000, 0b1001,
    ];
    SEQUENCE[position.rem_euclid(8) as usize]
}
