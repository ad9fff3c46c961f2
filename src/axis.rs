//! Single-axis stepper model.
//!
//! [`Axis`] tracks one motor's step position, target, speed and limits, and
//! decides when the next step is due. It never touches hardware: the caller
//! polls [`Axis::advance`] with the current time and pulses the driver when
//! a step is returned.
//!
//! # Velocity profile
//!
//! Speed follows a trapezoidal profile (triangular when the move is too
//! short to reach the cap). Instead of integrating velocity over wall-clock
//! time, the step interval itself is updated after every step with the
//! constant-acceleration recurrence
//!
//! ```text
//! c0 = 0.676 * sqrt(2 / a)                 first interval (s)
//! cn = c(n-1) - 2 * c(n-1) / (4n + 1)      following intervals
//! cn >= 1 / max_speed                      speed cap
//! ```
//!
//! `n` counts steps along the ramp; a negative `n` means the axis is
//! decelerating and the same recurrence lengthens the interval again. The
//! ramp switches to deceleration as soon as the distance needed to stop,
//! `v² / 2a`, reaches the distance left to go.
//!
//! # Example
//!
//! ```rust
//! use ploptart::axis::Axis;
//! use ploptart::config::AxisConfig;
//!
//! let mut axis = Axis::new(0, &AxisConfig::new("left")).unwrap();
//! axis.set_target(3);
//!
//! let mut now_us = 0;
//! while axis.is_running() {
//!     axis.advance(now_us);
//!     now_us += 100;
//! }
//! assert_eq!(axis.current_position(), 3);
//! assert_eq!(axis.speed(), 0.0);
//! ```

use libm::{ceilf, sqrtf};

use crate::config::{AxisConfig, ConfigError};
use crate::group::AxisId;
use crate::traits::Direction;

const MICROS_PER_SECOND: f32 = 1_000_000.0;

/// Correction applied to the ideal first-step interval `sqrt(2 / a)`.
const FIRST_STEP_FACTOR: f32 = 0.676;

/// One stepper motor's open-loop motion state.
///
/// Created once at startup at its configured home position; lives for the
/// lifetime of the controller.
#[derive(Clone, Debug)]
pub struct Axis {
    current_position: i64,
    target_position: i64,
    configured_max_speed: f32,
    configured_acceleration: f32,
    max_speed: f32,
    acceleration: f32,
    /// Signed steps/s, positive toward increasing positions.
    speed: f32,
    direction: Direction,
    /// Interval until the next step is due, 0 while stopped.
    step_interval_us: u64,
    /// When the previous step was taken. `None` while stopped.
    last_step_us: Option<u64>,
    ramp_step: i64,
    first_interval_us: f32,
    interval_us: f32,
    min_interval_us: f32,
}

impl Axis {
    /// Build axis `id` at its home position.
    ///
    /// Rejects non-positive or non-finite speed and acceleration; the error
    /// names `id`.
    pub fn new(id: AxisId, config: &AxisConfig) -> Result<Self, ConfigError> {
        config.validate(id)?;
        Ok(Self {
            current_position: config.home_position,
            target_position: config.home_position,
            configured_max_speed: config.max_speed,
            configured_acceleration: config.acceleration,
            max_speed: config.max_speed,
            acceleration: config.acceleration,
            speed: 0.0,
            direction: Direction::Stopped,
            step_interval_us: 0,
            last_step_us: None,
            ramp_step: 0,
            first_interval_us: first_interval_us(config.acceleration),
            interval_us: 0.0,
            min_interval_us: MICROS_PER_SECOND / config.max_speed,
        })
    }

    // ------------------------------------------------------------------
    // Targets
    // ------------------------------------------------------------------

    /// Record a new target. Nothing moves until the axis is polled.
    pub fn set_target(&mut self, position: i64) {
        if self.target_position != position {
            self.target_position = position;
            self.compute_speed();
        }
    }

    /// Re-home: the current location becomes `position`, motion stops.
    pub fn set_current_position(&mut self, position: i64) {
        self.current_position = position;
        self.target_position = position;
        self.halt();
    }

    // ------------------------------------------------------------------
    // Limits
    // ------------------------------------------------------------------

    /// Set the working speed cap (steps/s).
    ///
    /// Lowering the cap below the current speed takes effect immediately.
    /// Non-positive values are ignored.
    pub fn set_max_speed(&mut self, steps_per_s: f32) {
        if !(steps_per_s.is_finite() && steps_per_s > 0.0) || steps_per_s == self.max_speed {
            return;
        }
        self.max_speed = steps_per_s;
        self.min_interval_us = MICROS_PER_SECOND / steps_per_s;

        if self.step_interval_us != 0 && self.interval_us < self.min_interval_us {
            self.interval_us = self.min_interval_us;
            self.apply_interval();
        }
        // Keep the ramp position consistent with the (possibly clamped) speed.
        let steps_to_stop = self.steps_to_stop().max(1);
        if self.ramp_step > 0 {
            self.ramp_step = steps_to_stop;
        } else if self.ramp_step < 0 {
            self.ramp_step = -steps_to_stop;
        }
    }

    /// Set the working acceleration (steps/s²). Non-positive values are ignored.
    pub fn set_acceleration(&mut self, steps_per_s2: f32) {
        if !(steps_per_s2.is_finite() && steps_per_s2 > 0.0) || steps_per_s2 == self.acceleration
        {
            return;
        }
        if self.ramp_step != 0 {
            let scaled = (self.ramp_step as f32 * (self.acceleration / steps_per_s2)) as i64;
            self.ramp_step = if scaled == 0 {
                self.ramp_step.signum()
            } else {
                scaled
            };
        }
        self.acceleration = steps_per_s2;
        self.first_interval_us = first_interval_us(steps_per_s2);
    }

    /// Restore the configured speed cap and acceleration.
    pub fn restore_limits(&mut self) {
        self.set_acceleration(self.configured_acceleration);
        self.set_max_speed(self.configured_max_speed);
    }

    // ------------------------------------------------------------------
    // Motion
    // ------------------------------------------------------------------

    /// Recompute speed and step interval for the step about to be taken.
    ///
    /// Called after every step and whenever the target changes. Returns the
    /// new signed speed in steps/s.
    pub fn compute_speed(&mut self) -> f32 {
        let distance_to = self.distance_to_go();
        let steps_to_stop = self.steps_to_stop();

        if distance_to == 0 && steps_to_stop <= 1 {
            self.halt();
            return 0.0;
        }

        if distance_to > 0 {
            if self.ramp_step > 0 {
                if steps_to_stop >= distance_to || self.direction == Direction::Reverse {
                    self.ramp_step = -steps_to_stop;
                }
            } else if self.ramp_step < 0
                && steps_to_stop < distance_to
                && self.direction == Direction::Forward
            {
                self.ramp_step = -self.ramp_step;
            }
        } else if distance_to < 0 {
            if self.ramp_step > 0 {
                if steps_to_stop >= -distance_to || self.direction == Direction::Forward {
                    self.ramp_step = -steps_to_stop;
                }
            } else if self.ramp_step < 0
                && steps_to_stop < -distance_to
                && self.direction == Direction::Reverse
            {
                self.ramp_step = -self.ramp_step;
            }
        }

        if self.ramp_step == 0 {
            if distance_to == 0 {
                self.halt();
                return 0.0;
            }
            self.interval_us = self.first_interval_us.max(self.min_interval_us);
            self.direction = Direction::toward(distance_to);
        } else {
            self.interval_us -= 2.0 * self.interval_us / (4.0 * self.ramp_step as f32 + 1.0);
            self.interval_us = self.interval_us.max(self.min_interval_us);
        }
        self.ramp_step += 1;
        self.apply_interval();
        self.speed
    }

    /// Whether a step is due at `now_us`. Never true at zero speed.
    pub fn step_due(&self, now_us: u64) -> bool {
        if self.step_interval_us == 0 {
            return false;
        }
        match self.last_step_us {
            Some(last) => now_us.saturating_sub(last) >= self.step_interval_us,
            None => true,
        }
    }

    /// Take one step if it is due and schedule the next one.
    ///
    /// Returns the direction stepped, so the caller can pulse the driver.
    pub fn advance(&mut self, now_us: u64) -> Option<Direction> {
        if !self.step_due(now_us) {
            return None;
        }
        let direction = self.direction;
        if direction == Direction::Stopped {
            self.compute_speed();
            return None;
        }

        self.current_position += direction.sign();
        // The next interval runs from when this step actually went out, so
        // no two steps are ever closer than the speed cap allows.
        self.last_step_us = Some(now_us);
        self.compute_speed();
        Some(direction)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Step count of the motor right now.
    #[inline]
    pub fn current_position(&self) -> i64 {
        self.current_position
    }

    /// Last target set.
    #[inline]
    pub fn target_position(&self) -> i64 {
        self.target_position
    }

    /// Signed steps remaining to the target.
    #[inline]
    pub fn distance_to_go(&self) -> i64 {
        self.target_position - self.current_position
    }

    /// Signed speed in steps/s.
    #[inline]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Working speed cap in steps/s.
    #[inline]
    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    /// Speed cap from configuration.
    #[inline]
    pub fn configured_max_speed(&self) -> f32 {
        self.configured_max_speed
    }

    /// Working acceleration in steps/s².
    #[inline]
    pub fn acceleration(&self) -> f32 {
        self.acceleration
    }

    /// Acceleration from configuration.
    #[inline]
    pub fn configured_acceleration(&self) -> f32 {
        self.configured_acceleration
    }

    /// Interval until the next step, 0 while stopped.
    #[inline]
    pub fn step_interval_us(&self) -> u64 {
        self.step_interval_us
    }

    /// Current direction of travel.
    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// True until the axis sits on its target at zero speed.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.speed != 0.0 || self.target_position != self.current_position
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn steps_to_stop(&self) -> i64 {
        ((self.speed * self.speed) / (2.0 * self.acceleration)) as i64
    }

    fn apply_interval(&mut self) {
        self.step_interval_us = (ceilf(self.interval_us) as u64).max(1);
        self.speed = MICROS_PER_SECOND / self.interval_us * self.direction.sign() as f32;
    }

    fn halt(&mut self) {
        self.speed = 0.0;
        self.step_interval_us = 0;
        self.interval_us = 0.0;
        self.ramp_step = 0;
        self.direction = Direction::Stopped;
        self.last_step_us = None;
    }
}

fn first_interval_us(acceleration: f32) -> f32 {
    FIRST_STEP_FACTOR * sqrtf(2.0 / acceleration) * MICROS_PER_SECOND
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis(max_speed: f32, acceleration: f32) -> Axis {
        Axis::new(
            0,
            &AxisConfig::new("test")
                .with_max_speed(max_speed)
                .with_acceleration(acceleration),
        )
        .unwrap()
    }

    /// Poll every `dt_us` until idle; returns (finish time, peak |speed|).
    fn run(axis: &mut Axis, start_us: u64, dt_us: u64) -> (u64, f32) {
        let mut now = start_us;
        let mut peak: f32 = 0.0;
        let mut last_step = now;
        while axis.is_running() {
            if axis.advance(now).is_some() {
                last_step = now;
            }
            peak = peak.max(axis.speed().abs());
            assert!(
                axis.speed().abs() <= axis.max_speed() * 1.0001,
                "speed {} above cap {}",
                axis.speed(),
                axis.max_speed()
            );
            now += dt_us;
            assert!(now < start_us + 120_000_000, "axis never settled");
        }
        (last_step, peak)
    }

    // =========================================================================
    // Construction
    // =========================================================================

    #[test]
    fn starts_at_home_position() {
        let axis = Axis::new(1, &AxisConfig::new("r").with_home_position(-42)).unwrap();
        assert_eq!(axis.current_position(), -42);
        assert_eq!(axis.target_position(), -42);
        assert!(!axis.is_running());
        assert_eq!(axis.speed(), 0.0);
        assert_eq!(axis.direction(), Direction::Stopped);
    }

    #[test]
    fn rejects_zero_acceleration() {
        let result = Axis::new(0, &AxisConfig::new("x").with_acceleration(0.0));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidAcceleration { .. })
        ));
    }

    #[test]
    fn error_names_the_axis() {
        let result = Axis::new(3, &AxisConfig::new("z").with_max_speed(-1.0));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidMaxSpeed { axis: 3, .. })
        ));
    }

    // =========================================================================
    // Stepping
    // =========================================================================

    #[test]
    fn set_target_does_not_step() {
        let mut axis = axis(750.0, 250.0);
        axis.set_target(100);
        assert_eq!(axis.current_position(), 0);
        assert!(axis.is_running());
        assert!(axis.speed() > 0.0);
        assert_eq!(axis.direction(), Direction::Forward);
    }

    #[test]
    fn zero_speed_never_due() {
        let axis = axis(750.0, 250.0);
        assert!(!axis.step_due(0));
        assert!(!axis.step_due(u64::MAX));
    }

    #[test]
    fn first_step_is_immediate() {
        let mut axis = axis(750.0, 250.0);
        axis.set_target(10);
        assert!(axis.step_due(0));
        assert_eq!(axis.advance(0), Some(Direction::Forward));
        assert_eq!(axis.current_position(), 1);
        assert!(!axis.step_due(1));
    }

    #[test]
    fn step_waits_for_interval() {
        let mut axis = axis(750.0, 250.0);
        axis.set_target(10);
        axis.advance(0);
        let interval = axis.step_interval_us();
        assert!(interval > 0);
        assert_eq!(axis.advance(interval - 1), None);
        assert_eq!(axis.advance(interval), Some(Direction::Forward));
        assert_eq!(axis.current_position(), 2);
    }

    #[test]
    fn reaches_positive_target() {
        let mut axis = axis(750.0, 250.0);
        axis.set_target(500);
        run(&mut axis, 0, 50);
        assert_eq!(axis.current_position(), 500);
        assert_eq!(axis.speed(), 0.0);
        assert_eq!(axis.step_interval_us(), 0);
    }

    #[test]
    fn reaches_negative_target() {
        let mut axis = axis(750.0, 250.0);
        axis.set_target(-321);
        assert_eq!(axis.direction(), Direction::Reverse);
        assert!(axis.speed() < 0.0);
        run(&mut axis, 0, 50);
        assert_eq!(axis.current_position(), -321);
        assert!(!axis.is_running());
    }

    #[test]
    fn single_step_move() {
        let mut axis = axis(750.0, 250.0);
        axis.set_target(1);
        run(&mut axis, 0, 50);
        assert_eq!(axis.current_position(), 1);
    }

    // =========================================================================
    // Profile shape
    // =========================================================================

    #[test]
    fn long_move_cruises_at_max_speed() {
        let mut axis = axis(750.0, 250.0);
        axis.set_target(4000);
        let (_, peak) = run(&mut axis, 0, 50);
        assert!(peak > 740.0, "peak {}", peak);
        assert!(peak <= 750.1);
    }

    #[test]
    fn short_move_is_triangular() {
        // v² / 2a = 1125 steps to reach 750 steps/s: 200 steps never gets there.
        let mut axis = axis(750.0, 250.0);
        axis.set_target(200);
        let (_, peak) = run(&mut axis, 0, 50);
        assert!(peak < 400.0, "peak {}", peak);
        assert_eq!(axis.current_position(), 200);
    }

    #[test]
    fn accelerates_then_decelerates() {
        let mut axis = axis(750.0, 250.0);
        axis.set_target(2000);
        let mut now = 0;
        let mut speeds = Vec::new();
        while axis.is_running() {
            if axis.advance(now).is_some() {
                speeds.push(axis.speed());
            }
            now += 50;
        }
        let peak_index = speeds
            .iter()
            .enumerate()
            .fold(0, |best, (i, s)| if *s > speeds[best] { i } else { best });
        assert!(speeds[..peak_index].windows(2).all(|w| w[1] >= w[0]));
        assert!(peak_index > 100);
        assert!(peak_index < speeds.len() - 100);
    }

    #[test]
    fn travel_time_matches_trapezoid() {
        // 3 s ramp up, 3 s ramp down, (4095 - 2250) / 750 s cruise.
        let mut axis = axis(750.0, 250.0);
        axis.set_target(4095);
        let (finish, _) = run(&mut axis, 0, 20);
        let expected = 6.0 + (4095.0 - 2250.0) / 750.0;
        let actual = finish as f32 / 1e6;
        assert!(
            (actual - expected).abs() < expected * 0.03,
            "expected ~{}s, got {}s",
            expected,
            actual
        );
    }

    // =========================================================================
    // Retargeting and limits
    // =========================================================================

    #[test]
    fn retarget_behind_reverses_and_converges() {
        let mut axis = axis(750.0, 250.0);
        axis.set_target(2000);
        let mut now = 0;
        while axis.current_position() < 1000 {
            axis.advance(now);
            now += 50;
        }
        axis.set_target(0);
        let (_, _) = run(&mut axis, now, 50);
        assert_eq!(axis.current_position(), 0);
    }

    #[test]
    fn retarget_same_value_is_noop() {
        let mut axis = axis(750.0, 250.0);
        axis.set_target(100);
        axis.advance(0);
        let speed = axis.speed();
        let interval = axis.step_interval_us();
        axis.set_target(100);
        assert_eq!(axis.speed(), speed);
        assert_eq!(axis.step_interval_us(), interval);
    }

    #[test]
    fn lowering_max_speed_clamps_immediately() {
        let mut axis = axis(750.0, 250.0);
        axis.set_target(4000);
        let mut now = 0;
        while axis.speed() < 600.0 {
            axis.advance(now);
            now += 50;
        }
        axis.set_max_speed(200.0);
        assert!(axis.speed() <= 200.0 * 1.0001);
        run(&mut axis, now, 50);
        assert_eq!(axis.current_position(), 4000);
    }

    #[test]
    fn invalid_limits_ignored() {
        let mut axis = axis(750.0, 250.0);
        axis.set_max_speed(0.0);
        axis.set_max_speed(f32::INFINITY);
        axis.set_acceleration(-5.0);
        assert_eq!(axis.max_speed(), 750.0);
        assert_eq!(axis.acceleration(), 250.0);
    }

    #[test]
    fn restore_limits_returns_to_configuration() {
        let mut axis = axis(750.0, 250.0);
        axis.set_max_speed(100.0);
        axis.set_acceleration(50.0);
        axis.restore_limits();
        assert_eq!(axis.max_speed(), axis.configured_max_speed());
        assert_eq!(axis.acceleration(), axis.configured_acceleration());
    }

    #[test]
    fn set_current_position_stops_motion() {
        let mut axis = axis(750.0, 250.0);
        axis.set_target(100);
        axis.advance(0);
        axis.set_current_position(7);
        assert_eq!(axis.current_position(), 7);
        assert_eq!(axis.target_position(), 7);
        assert!(!axis.is_running());
        assert!(!axis.step_due(1_000_000));
    }

    #[test]
    fn late_polling_resyncs_schedule() {
        let mut axis = axis(100.0, 1_000_000.0);
        axis.set_target(10);
        axis.advance(0);
        // 10 ms per step; poll 35 ms late. Only one step is taken, and the
        // next one is measured from the late step.
        assert_eq!(axis.advance(45_000), Some(Direction::Forward));
        assert!(!axis.step_due(50_000));
        assert!(axis.step_due(55_000));
    }

    #[test]
    fn jittered_polling_never_steps_faster_than_cap() {
        let mut axis = axis(750.0, 250.0);
        axis.set_target(4095);
        let cap_period_us = (MICROS_PER_SECOND / 750.0) as u64 + 1;
        let mut now = 0;
        let mut last_step = None;
        let mut min_gap = u64::MAX;
        let mut tick = 0u32;
        while axis.is_running() {
            if axis.advance(now).is_some() {
                if let Some(last) = last_step {
                    min_gap = min_gap.min(now - last);
                }
                last_step = Some(now);
            }
            now += if tick % 2 == 0 { 50 } else { 900 };
            tick += 1;
        }
        assert_eq!(axis.current_position(), 4095);
        assert!(
            min_gap >= cap_period_us,
            "min gap {}us, cap period {}us",
            min_gap,
            cap_period_us
        );
    }

    #[test]
    fn interval_rounds_up() {
        // 1e6 / 750 = 1333.3 us
        let mut axis = axis(750.0, 1_000_000.0);
        axis.set_target(10);
        assert_eq!(axis.step_interval_us(), 1334);
    }
}
