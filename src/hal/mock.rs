//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for all hardware traits, enabling
//! development and testing on desktop without a plotter attached.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockStepper`] | [`StepperDriver`] | Counts steps, records position and output state |
//! | [`MockClock`] | [`Clock`] | Controllable microsecond time source |
//! | [`MockSerial`] | [`SerialPort`] | Queued input bytes, captured output |
//!
//! # Example
//!
//! ```rust
//! use ploptart::{Config, PlotterController};
//! use ploptart::hal::{MockClock, MockStepper};
//! use ploptart::traits::Clock;
//!
//! let drivers = [MockStepper::new(), MockStepper::new()];
//! let mut controller = PlotterController::new(Config::default(), drivers).unwrap();
//! let mut clock = MockClock::new();
//!
//! controller.move_to(&[10, -10]).unwrap();
//! while controller.is_running() {
//!     controller.poll(clock.now_us()).unwrap();
//!     clock.advance(100);
//! }
//!
//! assert_eq!(controller.driver(0).unwrap().forward_steps, 10);
//! assert_eq!(controller.driver(1).unwrap().reverse_steps, 10);
//! ```
//!
//! [`StepperDriver`]: crate::traits::StepperDriver
//! [`Clock`]: crate::traits::Clock
//! [`SerialPort`]: crate::traits::SerialPort

use alloc::collections::VecDeque;
use alloc::string::String;
use alloc::vec::Vec;

use crate::traits::{Clock, Direction, SerialPort, StepperDriver};

// ============================================================================
// Hardware Mocks
// ============================================================================

/// Mock stepper driver for testing.
///
/// Records every step for verification. Use the public fields to inspect
/// state after test operations.
///
/// # Example
///
/// ```rust
/// use ploptart::hal::MockStepper;
/// use ploptart::traits::{Direction, StepperDriver};
///
/// let mut motor = MockStepper::new();
/// motor.enable_outputs().unwrap();
/// motor.step(1, Direction::Forward).unwrap();
/// motor.step(0, Direction::Reverse).unwrap();
///
/// assert_eq!(motor.forward_steps, 1);
/// assert_eq!(motor.reverse_steps, 1);
/// assert_eq!(motor.last_position, Some(0));
/// assert!(motor.enabled);
/// ```
#[derive(Debug, Default)]
pub struct MockStepper {
    /// Steps taken in [`Direction::Forward`].
    pub forward_steps: usize,
    /// Steps taken in [`Direction::Reverse`].
    pub reverse_steps: usize,
    /// Position reported by the most recent step.
    pub last_position: Option<i64>,
    /// Direction of the most recent step.
    pub last_direction: Direction,
    /// Whether the outputs are energized.
    pub enabled: bool,
    /// Number of times `enable_outputs` was called.
    pub enable_count: usize,
    /// Number of times `disable_outputs` was called.
    pub disable_count: usize,
    fail: bool,
}

impl MockStepper {
    /// Creates a new mock stepper with outputs off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `step` call fail.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Net steps taken (forward minus reverse).
    pub fn net_steps(&self) -> i64 {
        self.forward_steps as i64 - self.reverse_steps as i64
    }
}

impl StepperDriver for MockStepper {
    type Error = ();

    fn step(&mut self, position: i64, direction: Direction) -> Result<(), ()> {
        if self.fail {
            return Err(());
        }
        match direction {
            Direction::Forward => self.forward_steps += 1,
            Direction::Reverse => self.reverse_steps += 1,
            Direction::Stopped => {}
        }
        self.last_position = Some(position);
        self.last_direction = direction;
        Ok(())
    }

    fn enable_outputs(&mut self) -> Result<(), ()> {
        self.enabled = true;
        self.enable_count += 1;
        Ok(())
    }

    fn disable_outputs(&mut self) -> Result<(), ()> {
        self.enabled = false;
        self.disable_count += 1;
        Ok(())
    }
}

/// Mock clock for testing.
///
/// Provides controllable time for testing time-dependent behavior like
/// step scheduling and acceleration ramps.
///
/// # Example
///
/// ```rust
/// use ploptart::hal::MockClock;
/// use ploptart::traits::Clock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_us(), 0);
///
/// clock.set(1000);
/// assert_eq!(clock.now_us(), 1000);
///
/// clock.advance(500);
/// assert_eq!(clock.now_us(), 1500);
/// ```
#[derive(Debug)]
pub struct MockClock {
    current_us: u64,
}

impl MockClock {
    /// Creates a new mock clock starting at 0µs.
    pub fn new() -> Self {
        Self { current_us: 0 }
    }

    /// Sets the current time in microseconds.
    pub fn set(&mut self, us: u64) {
        self.current_us = us;
    }

    /// Advances the clock by the given duration.
    pub fn advance(&mut self, us: u64) {
        self.current_us += us;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now_us(&self) -> u64 {
        self.current_us
    }
}

// ============================================================================
// Serial Mock
// ============================================================================

/// Mock serial link for testing.
///
/// Bytes queued with [`queue_input`](Self::queue_input) are returned one at
/// a time by `read_byte`; everything written is captured.
#[derive(Debug, Default)]
pub struct MockSerial {
    input: VecDeque<u8>,
    output: Vec<u8>,
    fail_writes: bool,
}

impl MockSerial {
    /// Creates an empty mock serial link.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail.
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Queue bytes for the device to read.
    pub fn queue_input(&mut self, bytes: &[u8]) {
        self.input.extend(bytes.iter().copied());
    }

    /// Number of queued bytes not yet read.
    pub fn pending_input(&self) -> usize {
        self.input.len()
    }

    /// Everything written so far.
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Everything written so far, as text.
    pub fn output_str(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }

    /// Take and clear the captured output.
    pub fn take_output(&mut self) -> String {
        let text = self.output_str();
        self.output.clear();
        text
    }
}

impl SerialPort for MockSerial {
    type Error = ();

    fn read_byte(&mut self) -> Result<Option<u8>, ()> {
        Ok(self.input.pop_front())
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), ()> {
        if self.fail_writes {
            return Err(());
        }
        self.output.extend_from_slice(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // MockStepper Tests
    // =========================================================================

    #[test]
    fn mock_stepper_default() {
        let motor = MockStepper::new();
        assert_eq!(motor.forward_steps, 0);
        assert_eq!(motor.reverse_steps, 0);
        assert_eq!(motor.last_position, None);
        assert_eq!(motor.last_direction, Direction::Stopped);
        assert!(!motor.enabled);
    }

    #[test]
    fn mock_stepper_counts_both_directions() {
        let mut motor = MockStepper::new();
        motor.step(1, Direction::Forward).unwrap();
        motor.step(2, Direction::Forward).unwrap();
        motor.step(1, Direction::Reverse).unwrap();
        assert_eq!(motor.net_steps(), 1);
        assert_eq!(motor.last_direction, Direction::Reverse);
    }

    #[test]
    fn mock_stepper_output_toggles() {
        let mut motor = MockStepper::new();
        motor.enable_outputs().unwrap();
        motor.disable_outputs().unwrap();
        assert!(!motor.enabled);
        assert_eq!(motor.enable_count, 1);
        assert_eq!(motor.disable_count, 1);
    }

    #[test]
    fn mock_stepper_failing() {
        let mut motor = MockStepper::new().failing();
        assert_eq!(motor.step(1, Direction::Forward), Err(()));
        assert_eq!(motor.forward_steps, 0);
    }

    // =========================================================================
    // MockClock Tests
    // =========================================================================

    #[test]
    fn mock_clock_starts_at_zero() {
        assert_eq!(MockClock::default().now_us(), 0);
    }

    #[test]
    fn mock_clock_set_and_advance() {
        let mut clock = MockClock::new();
        clock.set(10);
        clock.advance(5);
        assert_eq!(clock.now_us(), 15);
    }

    // =========================================================================
    // MockSerial Tests
    // =========================================================================

    #[test]
    fn mock_serial_reads_in_order() {
        let mut serial = MockSerial::new();
        serial.queue_input(b"M 1");
        assert_eq!(serial.pending_input(), 3);
        assert_eq!(serial.read_byte(), Ok(Some(b'M')));
        assert_eq!(serial.read_byte(), Ok(Some(b' ')));
        assert_eq!(serial.read_byte(), Ok(Some(b'1')));
        assert_eq!(serial.read_byte(), Ok(None));
    }

    #[test]
    fn mock_serial_take_output_clears() {
        let mut serial = MockSerial::new();
        serial.write_all(b"1,2\n").unwrap();
        assert_eq!(serial.take_output(), "1,2\n");
        assert!(serial.output().is_empty());
    }

    #[test]
    fn mock_serial_failing_writes() {
        let mut serial = MockSerial::new().failing_writes();
        assert_eq!(serial.write_all(b"x"), Err(()));
        assert_eq!(serial.output_str(), "");
    }
}
