//! Main plotter controller that ties everything together.
//!
//! This module provides [`PlotterController`], the central component that
//! owns the axes and their drivers and moves them as one [`MotionGroup`].
//!
//! # Overview
//!
//! The plotter controller:
//! - Builds one [`Axis`] per configured motor at its home position
//! - Accepts move and telemetry commands
//! - Advances all axes against one shared clock
//! - Energizes the motors while moving, and optionally releases them when idle
//! - Provides state snapshots for logging and tooling
//!
//! # Example
//!
//! ```rust
//! use ploptart::{Command, CommandOutcome, Config, PlotterController};
//! use ploptart::hal::MockStepper;
//!
//! let drivers = [MockStepper::new(), MockStepper::new()];
//! let mut controller = PlotterController::new(Config::default(), drivers).unwrap();
//!
//! controller.apply_command(Command::move_to(&[400, 200]).unwrap()).unwrap();
//!
//! // Main loop - poll well below the shortest step interval
//! let mut now_us = 0;
//! while controller.is_running() {
//!     controller.poll(now_us).unwrap();
//!     now_us += 100;
//! }
//!
//! let outcome = controller.apply_command(Command::Telemetry).unwrap();
//! assert!(matches!(outcome, CommandOutcome::Telemetry(ref p) if p.as_slice() == [400, 200]));
//! assert_eq!(controller.telemetry_line().as_str(), "400,200\n");
//! ```

use heapless::Vec as HVec;

use crate::axis::Axis;
use crate::commands::{Command, CommandOutcome, MoveError, Targets};
use crate::config::{Config, ConfigError, ShortString, MAX_AXES};
use crate::group::{AxisId, MotionGroup, MoveOutcome, SyncPolicy};
use crate::protocol::{format_telemetry, TelemetryLine};
use crate::traits::{Direction, StepperDriver};

/// Main plotter controller.
///
/// # Type Parameter
///
/// - `D`: The stepper driver implementation ([`StepperDriver`] trait), one
///   instance per axis
///
/// # Thread Safety
///
/// The controller is polled from a single context and holds no locks. All
/// axis state must be touched only from the polling loop.
pub struct PlotterController<D: StepperDriver> {
    axes: HVec<Axis, MAX_AXES>,
    names: HVec<ShortString, MAX_AXES>,
    drivers: HVec<D, MAX_AXES>,
    group: MotionGroup,
    sync_policy: SyncPolicy,
    release_when_idle: bool,
    was_running: bool,
}

impl<D: StepperDriver> PlotterController<D> {
    /// Create a controller from a validated configuration.
    ///
    /// `drivers` are matched to axes by position; exactly one driver per
    /// configured axis is required.
    pub fn new<I>(config: Config, drivers: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = D>,
    {
        config.validate()?;

        let mut axes = HVec::new();
        let mut names = HVec::new();
        for (id, axis_config) in config.axes.iter().enumerate() {
            let axis = Axis::new(id, axis_config)?;
            if axes.push(axis).is_err() || names.push(axis_config.name.clone()).is_err() {
                return Err(ConfigError::TooManyAxes {
                    count: config.axes.len(),
                });
            }
        }

        let mut supplied = 0;
        let mut driver_list = HVec::new();
        for driver in drivers {
            supplied += 1;
            let _ = driver_list.push(driver);
        }
        if supplied != axes.len() {
            return Err(ConfigError::DriverCountMismatch {
                axes: axes.len(),
                drivers: supplied,
            });
        }

        log::debug!(
            "{}: {} axes, {:?}",
            config.device.name,
            axes.len(),
            config.motion.sync_policy
        );

        let group = MotionGroup::all(axes.len()).ok_or(ConfigError::TooManyAxes {
            count: axes.len(),
        })?;

        Ok(Self {
            group,
            axes,
            names,
            drivers: driver_list,
            sync_policy: config.motion.sync_policy,
            release_when_idle: config.motion.release_when_idle,
            was_running: false,
        })
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Move all axes to `targets`, arriving together.
    pub fn move_to(&mut self, targets: &[i64]) -> Result<MoveOutcome, MoveError> {
        self.group.move_to(&mut self.axes, targets, self.sync_policy)
    }

    /// Apply a decoded host command.
    pub fn apply_command(&mut self, command: Command) -> Result<CommandOutcome, MoveError> {
        match command {
            Command::Move(targets) => self.move_to(&targets).map(CommandOutcome::Moved),
            Command::Telemetry => Ok(CommandOutcome::Telemetry(self.positions())),
        }
    }

    /// Re-home every axis: the current locations become `positions` and any
    /// motion stops.
    pub fn home(&mut self, positions: &[i64]) -> Result<(), MoveError> {
        if positions.len() != self.axes.len() {
            return Err(MoveError::AxisCountMismatch {
                expected: self.axes.len(),
                actual: positions.len(),
            });
        }
        for (axis, position) in self.axes.iter_mut().zip(positions) {
            axis.set_current_position(*position);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Polling
    // ------------------------------------------------------------------

    /// Advance every axis whose step is due at `now_us`.
    ///
    /// Returns the number of steps taken. Outputs are enabled when motion
    /// starts and, with `release_when_idle`, disabled once it ends.
    pub fn poll(&mut self, now_us: u64) -> Result<usize, D::Error> {
        let running = self.group.is_running(&self.axes);
        if running && !self.was_running {
            for driver in self.drivers.iter_mut() {
                driver.enable_outputs()?;
            }
        }

        let steps = self.group.poll(&mut self.axes, &mut self.drivers, now_us)?;

        let still_running = self.group.is_running(&self.axes);
        if running && !still_running {
            log::debug!("idle at {:?}", self.positions().as_slice());
            if self.release_when_idle {
                for driver in self.drivers.iter_mut() {
                    driver.disable_outputs()?;
                }
            }
        }
        self.was_running = still_running;
        Ok(steps)
    }

    /// True while any axis has yet to settle on its target.
    pub fn is_running(&self) -> bool {
        self.group.is_running(&self.axes)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Current step positions in axis order.
    pub fn positions(&self) -> Targets {
        self.axes.iter().map(Axis::current_position).collect()
    }

    /// Current targets in axis order.
    pub fn targets(&self) -> Targets {
        self.axes.iter().map(Axis::target_position).collect()
    }

    /// Telemetry reply for the current positions.
    pub fn telemetry_line(&self) -> TelemetryLine {
        format_telemetry(&self.positions())
    }

    /// Number of axes.
    pub fn axis_count(&self) -> usize {
        self.axes.len()
    }

    /// Borrow an axis.
    pub fn axis(&self, id: AxisId) -> Option<&Axis> {
        self.axes.get(id)
    }

    /// Borrow the driver for an axis.
    pub fn driver(&self, id: AxisId) -> Option<&D> {
        self.drivers.get(id)
    }

    /// Mutably borrow the driver for an axis.
    pub fn driver_mut(&mut self, id: AxisId) -> Option<&mut D> {
        self.drivers.get_mut(id)
    }

    /// Coordination policy in use.
    pub fn sync_policy(&self) -> SyncPolicy {
        self.sync_policy
    }

    /// Get the current state for logging and tooling
    pub fn state(&self) -> ControllerState {
        let axes = self
            .axes
            .iter()
            .zip(self.names.iter())
            .map(|(axis, name)| AxisState {
                name: name.clone(),
                position: axis.current_position(),
                target: axis.target_position(),
                speed: axis.speed(),
                max_speed: axis.max_speed(),
                direction: axis.direction(),
            })
            .collect();
        ControllerState {
            running: self.is_running(),
            sync_policy: self.sync_policy,
            axes,
        }
    }
}

/// Full state snapshot.
///
/// Implements `serde::Serialize` when the `serde` feature is enabled.
///
/// # Example
///
/// ```rust
/// use ploptart::{Config, Direction, PlotterController};
/// use ploptart::hal::MockStepper;
///
/// let controller =
///     PlotterController::new(Config::default(), [MockStepper::new(), MockStepper::new()]).unwrap();
///
/// let state = controller.state();
/// assert!(!state.running);
/// assert_eq!(state.axes[0].name.as_str(), "left");
/// assert_eq!(state.axes[1].direction, Direction::Stopped);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControllerState {
    /// Whether any axis is still moving.
    pub running: bool,
    /// Coordination policy in use.
    pub sync_policy: SyncPolicy,
    /// Per-axis state in axis order.
    pub axes: HVec<AxisState, MAX_AXES>,
}

/// One axis in a [`ControllerState`].
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AxisState {
    /// Configured axis name.
    pub name: ShortString,
    /// Current step count.
    pub position: i64,
    /// Target step count.
    pub target: i64,
    /// Signed speed (steps/s).
    pub speed: f32,
    /// Working speed cap (steps/s).
    pub max_speed: f32,
    /// Current direction of travel.
    pub direction: Direction,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AxisConfig;
    use crate::hal::MockStepper;

    fn controller() -> PlotterController<MockStepper> {
        PlotterController::new(Config::default(), [MockStepper::new(), MockStepper::new()])
            .unwrap()
    }

    fn run(controller: &mut PlotterController<MockStepper>, now_us: &mut u64) {
        while controller.is_running() {
            controller.poll(*now_us).unwrap();
            *now_us += 100;
        }
    }

    // =========================================================================
    // Construction
    // =========================================================================

    #[test]
    fn new_requires_one_driver_per_axis() {
        let result = PlotterController::new(Config::default(), [MockStepper::new()]);
        assert!(matches!(
            result,
            Err(ConfigError::DriverCountMismatch {
                axes: 2,
                drivers: 1
            })
        ));
    }

    #[test]
    fn new_rejects_invalid_axis() {
        let config = Config::default()
            .with_axes(&[AxisConfig::new("a").with_acceleration(0.0)])
            .unwrap();
        let result = PlotterController::new(config, [MockStepper::new()]);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidAcceleration { axis: 0, .. })
        ));
    }

    #[test]
    fn axes_start_at_home() {
        let config = Config::default()
            .with_axes(&[
                AxisConfig::new("left").with_home_position(100),
                AxisConfig::new("right").with_home_position(-100),
            ])
            .unwrap();
        let controller =
            PlotterController::new(config, [MockStepper::new(), MockStepper::new()]).unwrap();
        assert_eq!(controller.positions().as_slice(), &[100, -100]);
        assert_eq!(controller.targets().as_slice(), &[100, -100]);
        assert!(!controller.is_running());
    }

    // =========================================================================
    // Commands
    // =========================================================================

    #[test]
    fn telemetry_reports_positions() {
        let mut controller = controller();
        let outcome = controller.apply_command(Command::Telemetry).unwrap();
        assert_eq!(
            outcome,
            CommandOutcome::Telemetry(Targets::from_slice(&[0, 0]).unwrap())
        );
        assert_eq!(controller.telemetry_line().as_str(), "0,0\n");
    }

    #[test]
    fn move_with_wrong_arity_rejected() {
        let mut controller = controller();
        let result = controller.apply_command(Command::move_to(&[1, 2, 3]).unwrap());
        assert!(matches!(result, Err(MoveError::AxisCountMismatch { .. })));
        assert!(!controller.is_running());
    }

    #[test]
    fn home_resets_positions() {
        let mut controller = controller();
        controller.move_to(&[50, 50]).unwrap();
        controller.home(&[7, -7]).unwrap();
        assert_eq!(controller.positions().as_slice(), &[7, -7]);
        assert!(!controller.is_running());
        assert!(controller.home(&[1]).is_err());
    }

    // =========================================================================
    // Polling
    // =========================================================================

    #[test]
    fn poll_enables_outputs_when_motion_starts() {
        let mut controller = controller();
        controller.poll(0).unwrap();
        assert!(!controller.driver(0).unwrap().enabled);

        controller.move_to(&[5, 5]).unwrap();
        controller.poll(0).unwrap();
        assert!(controller.driver(0).unwrap().enabled);
        assert!(controller.driver(1).unwrap().enabled);
    }

    #[test]
    fn outputs_stay_on_by_default() {
        let mut controller = controller();
        let mut now = 0;
        controller.move_to(&[5, 5]).unwrap();
        run(&mut controller, &mut now);
        assert!(controller.driver(0).unwrap().enabled);
        assert_eq!(controller.driver(0).unwrap().disable_count, 0);
    }

    #[test]
    fn release_when_idle_disables_outputs() {
        let config = Config::default().with_motion(
            crate::config::MotionConfig::default().with_release_when_idle(true),
        );
        let mut controller =
            PlotterController::new(config, [MockStepper::new(), MockStepper::new()]).unwrap();
        let mut now = 0;
        controller.move_to(&[5, -5]).unwrap();
        run(&mut controller, &mut now);
        assert!(!controller.driver(0).unwrap().enabled);
        assert!(!controller.driver(1).unwrap().enabled);

        controller.move_to(&[0, 0]).unwrap();
        controller.poll(now).unwrap();
        assert!(controller.driver(0).unwrap().enabled);
        assert_eq!(controller.driver(0).unwrap().enable_count, 2);
    }

    #[test]
    fn state_snapshot_tracks_motion() {
        let mut controller = controller();
        controller.move_to(&[100, 0]).unwrap();
        controller.poll(0).unwrap();
        let state = controller.state();
        assert!(state.running);
        assert_eq!(state.axes[0].target, 100);
        assert_eq!(state.axes[0].position, 1);
        assert_eq!(state.axes[0].direction, Direction::Forward);
        assert_eq!(state.axes[1].max_speed, 750.0);
    }
}
