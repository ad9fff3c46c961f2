//! Coil-level driver for 4-wire unipolar steppers (28BYJ-48 on a ULN2003
//! board and similar), generic over `embedded-hal` output pins.
//!
//! Each step writes the [`half_step_pattern`] for the new position to the
//! four coil pins, so the motor follows the 8-phase half-step sequence in
//! either direction.

use embedded_hal::digital::OutputPin;

use crate::traits::{half_step_pattern, Direction, StepperDriver};

/// Half-step coil driver over four output pins.
///
/// Pin `i` is driven by bit `i` of the half-step pattern. For a ULN2003
/// board wired as `IN1, IN3, IN2, IN4` this matches the usual 28BYJ-48
/// sequence.
///
/// # Example
///
/// ```rust,ignore
/// use ploptart::hal::CoilStepper;
///
/// let left = CoilStepper::new([in1, in3, in2, in4], 0);
/// ```
pub struct CoilStepper<P: OutputPin> {
    pins: [P; 4],
    pattern: u8,
}

impl<P: OutputPin> CoilStepper<P> {
    /// Wrap four coil pins. `position` is the axis' home step count, which
    /// selects the phase energized by [`enable_outputs`](StepperDriver::enable_outputs).
    pub fn new(pins: [P; 4], position: i64) -> Self {
        Self {
            pins,
            pattern: half_step_pattern(position),
        }
    }

    /// Pattern currently (or last) applied to the coils.
    pub fn pattern(&self) -> u8 {
        self.pattern
    }

    /// Borrow the coil pins.
    pub fn pins(&self) -> &[P; 4] {
        &self.pins
    }

    fn write(&mut self, pattern: u8) -> Result<(), P::Error> {
        for (bit, pin) in self.pins.iter_mut().enumerate() {
            if pattern & (1 << bit) != 0 {
                pin.set_high()?;
            } else {
                pin.set_low()?;
            }
        }
        Ok(())
    }
}

impl<P: OutputPin> StepperDriver for CoilStepper<P> {
    type Error = P::Error;

    fn step(&mut self, position: i64, _direction: Direction) -> Result<(), Self::Error> {
        self.pattern = half_step_pattern(position);
        self.write(self.pattern)
    }

    fn enable_outputs(&mut self) -> Result<(), Self::Error> {
        self.write(self.pattern)
    }

    fn disable_outputs(&mut self) -> Result<(), Self::Error> {
        self.write(0)
    }
}
