//! Cable geometry: pen coordinates to motor step targets.
//!
//! The pen hangs from two cables wound on pulleys mounted
//! `motor_distance_mm` apart. Coordinates are in millimetres with the
//! origin at the left anchor, x to the right and y pointing down:
//!
//! ```text
//! (0,0) L ─────────────── R (d,0)
//!         \             /
//!   left   \           /  right
//!           \         /
//!            ●  pen (x, y)
//! ```
//!
//! Each cable length is the distance from its anchor to the pen. Step
//! targets are measured from the home point, where the motors sit at their
//! home step counts when the plotter is switched on.
//!
//! This is a host-side helper: the firmware itself only ever sees step
//! targets.
//!
//! ```rust
//! use ploptart::config::GeometryConfig;
//! use ploptart::kinematics::{CableGeometry, Point};
//!
//! let geometry = CableGeometry::new(GeometryConfig::default());
//! assert_eq!(geometry.targets_for(geometry.home_point()), [0, 0]);
//!
//! // Moving straight down lengthens both cables; the right motor is
//! // mirrored so its count goes negative.
//! let [left, right] = geometry.targets_for(Point::new(117.5, 85.0));
//! assert!(left > 0);
//! assert_eq!(right, -left);
//! ```

use libm::{roundf, sqrtf};

use crate::config::{GeometryConfig, HOME_STEP_COUNT};
use crate::traits::Direction;

/// A pen position in millimetres.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    /// Distance right of the left anchor.
    pub x: f32,
    /// Distance below the anchors.
    pub y: f32,
}

impl Point {
    /// Create a point.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance_to(&self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        sqrtf(dx * dx + dy * dy)
    }
}

/// Two-cable plotter geometry.
#[derive(Clone, Debug)]
pub struct CableGeometry {
    config: GeometryConfig,
    home_steps: [i64; 2],
    home_lengths: (f32, f32),
}

impl CableGeometry {
    /// Build the geometry. Home step counts default to the firmware's
    /// (`HOME_STEP_COUNT`, mirrored on the right motor).
    pub fn new(config: GeometryConfig) -> Self {
        let mut geometry = Self {
            config,
            home_steps: [HOME_STEP_COUNT, -HOME_STEP_COUNT],
            home_lengths: (0.0, 0.0),
        };
        geometry.home_lengths = geometry.cable_lengths(geometry.home_point());
        geometry
    }

    /// Use different home step counts.
    pub fn with_home_steps(mut self, steps: [i64; 2]) -> Self {
        self.home_steps = steps;
        self
    }

    /// The configured geometry.
    pub fn config(&self) -> &GeometryConfig {
        &self.config
    }

    /// Pen position at power-on.
    pub fn home_point(&self) -> Point {
        Point::new(self.config.home_x_mm, self.config.home_y_mm)
    }

    /// Left and right cable lengths for a pen position.
    pub fn cable_lengths(&self, pen: Point) -> (f32, f32) {
        let left_anchor = Point::new(0.0, 0.0);
        let right_anchor = Point::new(self.config.motor_distance_mm, 0.0);
        (pen.distance_to(left_anchor), pen.distance_to(right_anchor))
    }

    /// Motor steps per millimetre of cable.
    pub fn steps_per_mm(&self) -> f32 {
        self.config.steps_per_revolution as f32 / self.config.mm_per_revolution
    }

    /// Absolute step targets that put the pen at `pen`, rounded to the
    /// nearest step.
    pub fn targets_for(&self, pen: Point) -> [i64; 2] {
        let (left, right) = self.cable_lengths(pen);
        [
            self.to_steps(left - self.home_lengths.0, self.config.left_winding)
                + self.home_steps[0],
            self.to_steps(right - self.home_lengths.1, self.config.right_winding)
                + self.home_steps[1],
        ]
    }

    /// Pen position for absolute step counts, the inverse of
    /// [`targets_for`](Self::targets_for) up to rounding.
    ///
    /// Returns `None` when the cable lengths cannot meet below the anchors.
    pub fn pen_for(&self, steps: [i64; 2]) -> Option<Point> {
        let left = self.home_lengths.0
            + self.to_mm(steps[0] - self.home_steps[0], self.config.left_winding);
        let right = self.home_lengths.1
            + self.to_mm(steps[1] - self.home_steps[1], self.config.right_winding);
        let d = self.config.motor_distance_mm;

        let x = (left * left - right * right + d * d) / (2.0 * d);
        let y_squared = left * left - x * x;
        if left < 0.0 || right < 0.0 || y_squared < 0.0 {
            return None;
        }
        Some(Point::new(x, sqrtf(y_squared)))
    }

    fn to_steps(&self, mm: f32, winding: Direction) -> i64 {
        roundf(mm * self.steps_per_mm()) as i64 * winding.sign()
    }

    fn to_mm(&self, steps: i64, winding: Direction) -> f32 {
        (steps * winding.sign()) as f32 / self.steps_per_mm()
    }
}

impl Default for CableGeometry {
    fn default() -> Self {
        Self::new(GeometryConfig::default())
    }
}
