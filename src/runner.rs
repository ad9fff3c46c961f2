//! Serial service runner for unified polling across platforms.
//!
//! Provides a platform-agnostic loop body that works with any
//! [`SerialPort`] and [`StepperDriver`] implementation. The ESP32 firmware
//! and the desktop simulator both drive the plotter through it.
//!
//! # Example
//!
//! ```rust
//! use ploptart::{Config, PlotterController, SerialServiceRunner};
//! use ploptart::hal::{MockSerial, MockStepper};
//!
//! let config = Config::default();
//! let serial_config = config.serial.clone();
//! let controller =
//!     PlotterController::new(config, [MockStepper::new(), MockStepper::new()]).unwrap();
//! let mut runner = SerialServiceRunner::new(controller, MockSerial::new(), &serial_config);
//!
//! runner.serial_mut().queue_input(b"M 20 10\n");
//! let mut now_us = 0;
//! loop {
//!     runner.tick(now_us).unwrap();
//!     if !runner.controller().is_running() {
//!         break;
//!     }
//!     now_us += 100;
//! }
//!
//! runner.serial_mut().queue_input(b"T");
//! runner.tick(now_us).unwrap();
//! assert_eq!(runner.serial().output_str(), "20,10\n");
//! ```

use core::fmt;

use crate::commands::{Command, CommandOutcome};
use crate::config::SerialConfig;
use crate::controller::PlotterController;
use crate::protocol::{format_telemetry, CommandReader};
use crate::traits::{SerialPort, StepperDriver};

// ============================================================================
// Errors
// ============================================================================

/// Hardware failure during a runner tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunnerError<D, S> {
    /// A stepper driver failed.
    Driver(D),
    /// The serial link failed.
    Serial(S),
}

impl<D: fmt::Debug, S: fmt::Debug> fmt::Display for RunnerError<D, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunnerError::Driver(e) => write!(f, "stepper driver error: {:?}", e),
            RunnerError::Serial(e) => write!(f, "serial error: {:?}", e),
        }
    }
}

#[cfg(feature = "std")]
impl<D: fmt::Debug, S: fmt::Debug> std::error::Error for RunnerError<D, S> {}

/// What one [`SerialServiceRunner::tick`] did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    /// Command framed during this tick, if any.
    pub command: Option<Command>,
    /// Outcome of applying it; `None` if there was no command or it was rejected.
    pub outcome: Option<CommandOutcome>,
    /// Steps taken by the poll at the end of the tick.
    pub steps: usize,
}

// ============================================================================
// Serial Service Runner
// ============================================================================

/// Unified serial service runner for both desktop and ESP32.
///
/// Owns the controller and the serial link, and provides:
/// - Non-blocking command framing
/// - Immediate telemetry replies
/// - Motion polling
pub struct SerialServiceRunner<D, S>
where
    D: StepperDriver,
    S: SerialPort,
{
    controller: PlotterController<D>,
    serial: S,
    reader: CommandReader,
}

impl<D, S> SerialServiceRunner<D, S>
where
    D: StepperDriver,
    S: SerialPort,
{
    /// Create a new serial service runner.
    pub fn new(controller: PlotterController<D>, serial: S, config: &SerialConfig) -> Self {
        let reader = CommandReader::new(controller.axis_count(), config.line_capacity);
        Self {
            controller,
            serial,
            reader,
        }
    }

    /// Get a reference to the controller.
    pub fn controller(&self) -> &PlotterController<D> {
        &self.controller
    }

    /// Get a mutable reference to the controller.
    pub fn controller_mut(&mut self) -> &mut PlotterController<D> {
        &mut self.controller
    }

    /// Get a reference to the serial link.
    pub fn serial(&self) -> &S {
        &self.serial
    }

    /// Get a mutable reference to the serial link.
    pub fn serial_mut(&mut self) -> &mut S {
        &mut self.serial
    }

    /// Run one loop iteration.
    ///
    /// Reads bytes until a command is complete or none are left, applies
    /// the command, then polls the motion. At most one command is handled
    /// per tick so stepping is never starved by a burst of input.
    pub fn tick(&mut self, now_us: u64) -> Result<TickReport, RunnerError<D::Error, S::Error>> {
        let mut report = TickReport::default();

        if let Some(command) = self.read_command()? {
            report.outcome = self.dispatch(command.clone())?;
            report.command = Some(command);
        }

        report.steps = self
            .controller
            .poll(now_us)
            .map_err(RunnerError::Driver)?;
        Ok(report)
    }

    fn read_command(&mut self) -> Result<Option<Command>, RunnerError<D::Error, S::Error>> {
        while let Some(byte) = self.serial.read_byte().map_err(RunnerError::Serial)? {
            if let Some(command) = self.reader.push(byte) {
                return Ok(Some(command));
            }
        }
        Ok(None)
    }

    fn dispatch(
        &mut self,
        command: Command,
    ) -> Result<Option<CommandOutcome>, RunnerError<D::Error, S::Error>> {
        let outcome = match self.controller.apply_command(command) {
            Ok(outcome) => outcome,
            Err(e) => {
                log::debug!("move rejected: {}", e);
                return Ok(None);
            }
        };
        if let CommandOutcome::Telemetry(positions) = &outcome {
            let line = format_telemetry(positions);
            self.serial
                .write_all(line.as_bytes())
                .map_err(RunnerError::Serial)?;
        }
        Ok(Some(outcome))
    }
}
