//! Shared configuration system for desktop and ESP32.
//!
//! Uses `heapless` strings and vectors for `no_std` compatibility while
//! remaining ergonomic to use on desktop with `std`. The defaults describe
//! the reference plotter: two 28BYJ-48 style motors in half-step mode
//! (4095 steps per revolution), 750 steps/s, 250 steps/s².
//!
//! Configuration is validated once at startup ([`Config::validate`]); a bad
//! value is a [`ConfigError`], never a runtime fault.
//!
//! # Example
//!
//! ```rust
//! use ploptart::config::{AxisConfig, Config, SerialConfig};
//!
//! // Use defaults
//! let config = Config::default();
//! assert!(config.validate().is_ok());
//!
//! // Or customize
//! let config = Config::default()
//!     .with_axes(&[
//!         AxisConfig::new("left").with_max_speed(500.0),
//!         AxisConfig::new("right").with_max_speed(500.0).with_home_position(-20),
//!     ])
//!     .unwrap()
//!     .with_serial(SerialConfig::default().with_baud_rate(57_600));
//! assert_eq!(config.axes[1].home_position, -20);
//! ```

use core::fmt;

use heapless::String as HString;
use heapless::Vec as HVec;

use crate::group::SyncPolicy;
use crate::traits::Direction;

/// Maximum number of axes a controller can own.
pub const MAX_AXES: usize = 4;

/// Number of axes on the reference two-cable plotter.
pub const PLOTTER_AXES: usize = 2;

/// Steps per output shaft revolution in half-step mode.
pub const ONE_REVOLUTION: u32 = 4095;

/// Step count assigned to the home position at startup.
pub const HOME_STEP_COUNT: i64 = 0;

/// Default per-axis speed cap (steps/s).
pub const DEFAULT_MAX_SPEED: f32 = 750.0;

/// Default per-axis acceleration (steps/s²).
pub const DEFAULT_ACCELERATION: f32 = 250.0;

/// Default serial link speed.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Upper bound for a buffered command line, newline excluded.
pub const MAX_LINE_LEN: usize = 64;

/// Maximum length for short config strings (names, ids)
pub const MAX_SHORT_STRING: usize = 32;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Fixed-capacity list of axis configurations.
pub type AxisList = HVec<AxisConfig, MAX_AXES>;

// ============================================================================
// Helper for creating heapless strings
// ============================================================================

/// Create a ShortString from a &str, truncating if too long
pub fn short_string(s: &str) -> ShortString {
    let mut hs = ShortString::new();
    for c in s.chars() {
        if hs.push(c).is_err() {
            break;
        }
    }
    hs
}

// ============================================================================
// Errors
// ============================================================================

/// Configuration rejected at startup.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConfigError {
    /// No axes configured.
    NoAxes,
    /// More axes than [`MAX_AXES`].
    TooManyAxes {
        /// Number of axes requested.
        count: usize,
    },
    /// Max speed must be finite and greater than zero.
    InvalidMaxSpeed {
        /// Offending axis index.
        axis: usize,
        /// Value given.
        value: f32,
    },
    /// Acceleration must be finite and greater than zero.
    InvalidAcceleration {
        /// Offending axis index.
        axis: usize,
        /// Value given.
        value: f32,
    },
    /// One driver is required per configured axis.
    DriverCountMismatch {
        /// Configured axes.
        axes: usize,
        /// Drivers supplied.
        drivers: usize,
    },
    /// Line buffer larger than [`MAX_LINE_LEN`] or zero.
    InvalidLineCapacity {
        /// Capacity requested.
        requested: usize,
    },
    /// Cable geometry parameter out of range.
    InvalidGeometry(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoAxes => write!(f, "no axes configured"),
            ConfigError::TooManyAxes { count } => {
                write!(f, "{} axes configured, at most {} supported", count, MAX_AXES)
            }
            ConfigError::InvalidMaxSpeed { axis, value } => {
                write!(f, "axis {}: max speed {} must be positive", axis, value)
            }
            ConfigError::InvalidAcceleration { axis, value } => {
                write!(f, "axis {}: acceleration {} must be positive", axis, value)
            }
            ConfigError::DriverCountMismatch { axes, drivers } => {
                write!(f, "{} axes configured but {} drivers supplied", axes, drivers)
            }
            ConfigError::InvalidLineCapacity { requested } => write!(
                f,
                "line capacity {} must be between 1 and {}",
                requested, MAX_LINE_LEN
            ),
            ConfigError::InvalidGeometry(what) => write!(f, "invalid geometry: {}", what),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

// ============================================================================
// Main Config
// ============================================================================

/// Complete application configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Axes in controller order (axis id = index)
    pub axes: AxisList,
    /// Coordination policy
    pub motion: MotionConfig,
    /// Serial link configuration
    pub serial: SerialConfig,
    /// Cable geometry for host-side coordinate conversion
    pub geometry: GeometryConfig,
    /// Device identification
    pub device: DeviceConfig,
}

impl Default for Config {
    fn default() -> Self {
        let mut axes = AxisList::new();
        let _ = axes.push(AxisConfig::new("left").with_home_position(HOME_STEP_COUNT));
        // The right motor is mounted mirrored, so its home count is negated.
        let _ = axes.push(AxisConfig::new("right").with_home_position(-HOME_STEP_COUNT));
        Self {
            axes,
            motion: MotionConfig::default(),
            serial: SerialConfig::default(),
            geometry: GeometryConfig::default(),
            device: DeviceConfig::default(),
        }
    }
}

impl Config {
    /// Replace the axis list
    pub fn with_axes(mut self, axes: &[AxisConfig]) -> Result<Self, ConfigError> {
        self.axes = AxisList::from_slice(axes)
            .map_err(|_| ConfigError::TooManyAxes { count: axes.len() })?;
        Ok(self)
    }

    /// Set motion configuration
    pub fn with_motion(mut self, motion: MotionConfig) -> Self {
        self.motion = motion;
        self
    }

    /// Set serial configuration
    pub fn with_serial(mut self, serial: SerialConfig) -> Self {
        self.serial = serial;
        self
    }

    /// Set geometry configuration
    pub fn with_geometry(mut self, geometry: GeometryConfig) -> Self {
        self.geometry = geometry;
        self
    }

    /// Set device configuration
    pub fn with_device(mut self, device: DeviceConfig) -> Self {
        self.device = device;
        self
    }

    /// Check every value that would otherwise misbehave at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.axes.is_empty() {
            return Err(ConfigError::NoAxes);
        }
        for (index, axis) in self.axes.iter().enumerate() {
            axis.validate(index)?;
        }
        self.serial.validate()?;
        self.geometry.validate()
    }

    /// Parse a JSON configuration; missing fields take their defaults.
    ///
    /// The result is not validated, call [`Config::validate`] afterwards.
    #[cfg(feature = "sim")]
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

// ============================================================================
// Axis Config
// ============================================================================

/// Per-motor limits and home reference
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AxisConfig {
    /// Human-readable axis name
    pub name: ShortString,
    /// Speed cap in steps/s
    pub max_speed: f32,
    /// Acceleration and deceleration in steps/s²
    pub acceleration: f32,
    /// Step count assigned at startup
    pub home_position: i64,
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self::new("axis")
    }
}

impl AxisConfig {
    /// Axis with the default limits, homed at [`HOME_STEP_COUNT`]
    pub fn new(name: &str) -> Self {
        Self {
            name: short_string(name),
            max_speed: DEFAULT_MAX_SPEED,
            acceleration: DEFAULT_ACCELERATION,
            home_position: HOME_STEP_COUNT,
        }
    }

    /// Set the speed cap
    pub fn with_max_speed(mut self, steps_per_s: f32) -> Self {
        self.max_speed = steps_per_s;
        self
    }

    /// Set the acceleration
    pub fn with_acceleration(mut self, steps_per_s2: f32) -> Self {
        self.acceleration = steps_per_s2;
        self
    }

    /// Set the home step count
    pub fn with_home_position(mut self, position: i64) -> Self {
        self.home_position = position;
        self
    }

    /// Validate limits for the axis at `index`
    pub fn validate(&self, index: usize) -> Result<(), ConfigError> {
        if !(self.max_speed.is_finite() && self.max_speed > 0.0) {
            return Err(ConfigError::InvalidMaxSpeed {
                axis: index,
                value: self.max_speed,
            });
        }
        if !(self.acceleration.is_finite() && self.acceleration > 0.0) {
            return Err(ConfigError::InvalidAcceleration {
                axis: index,
                value: self.acceleration,
            });
        }
        Ok(())
    }
}

// ============================================================================
// Motion Config
// ============================================================================

/// Coordination behavior shared by all axes
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MotionConfig {
    /// How per-axis limits are scaled for a coordinated move
    pub sync_policy: SyncPolicy,
    /// De-energize coils once every axis has settled
    pub release_when_idle: bool,
}

impl MotionConfig {
    /// Set the sync policy
    pub fn with_sync_policy(mut self, policy: SyncPolicy) -> Self {
        self.sync_policy = policy;
        self
    }

    /// Set coil release on idle
    pub fn with_release_when_idle(mut self, release: bool) -> Self {
        self.release_when_idle = release;
        self
    }
}

// ============================================================================
// Serial Config
// ============================================================================

/// Serial link configuration
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SerialConfig {
    /// Link speed in baud
    pub baud_rate: u32,
    /// Longest accepted command line (bytes, newline excluded)
    pub line_capacity: usize,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            line_capacity: MAX_LINE_LEN,
        }
    }
}

impl SerialConfig {
    /// Set the baud rate
    pub fn with_baud_rate(mut self, baud: u32) -> Self {
        self.baud_rate = baud;
        self
    }

    /// Set the line capacity
    pub fn with_line_capacity(mut self, capacity: usize) -> Self {
        self.line_capacity = capacity;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.line_capacity == 0 || self.line_capacity > MAX_LINE_LEN {
            return Err(ConfigError::InvalidLineCapacity {
                requested: self.line_capacity,
            });
        }
        Ok(())
    }
}

// ============================================================================
// Geometry Config
// ============================================================================

/// Cable plotter geometry (millimetres)
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GeometryConfig {
    /// Steps per pulley revolution
    pub steps_per_revolution: u32,
    /// Cable paid out per pulley revolution
    pub mm_per_revolution: f32,
    /// Horizontal distance between the two cable anchors
    pub motor_distance_mm: f32,
    /// Pen x at the home position, measured from the left anchor
    pub home_x_mm: f32,
    /// Pen y at the home position, measured down from the anchors
    pub home_y_mm: f32,
    /// Step direction that lengthens the left cable
    pub left_winding: Direction,
    /// Step direction that lengthens the right cable
    pub right_winding: Direction,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            steps_per_revolution: ONE_REVOLUTION,
            mm_per_revolution: 55.0,
            motor_distance_mm: 235.0,
            home_x_mm: 117.5,
            home_y_mm: 75.0,
            left_winding: Direction::Forward,
            right_winding: Direction::Reverse,
        }
    }
}

impl GeometryConfig {
    /// Set the anchor spacing
    pub fn with_motor_distance_mm(mut self, mm: f32) -> Self {
        self.motor_distance_mm = mm;
        self
    }

    /// Set the home point
    pub fn with_home_mm(mut self, x: f32, y: f32) -> Self {
        self.home_x_mm = x;
        self.home_y_mm = y;
        self
    }

    /// Set the pulley resolution
    pub fn with_steps_per_revolution(mut self, steps: u32, mm_per_revolution: f32) -> Self {
        self.steps_per_revolution = steps;
        self.mm_per_revolution = mm_per_revolution;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.steps_per_revolution == 0 {
            return Err(ConfigError::InvalidGeometry("steps_per_revolution is zero"));
        }
        if !(self.mm_per_revolution.is_finite() && self.mm_per_revolution > 0.0) {
            return Err(ConfigError::InvalidGeometry("mm_per_revolution must be positive"));
        }
        if !(self.motor_distance_mm.is_finite() && self.motor_distance_mm > 0.0) {
            return Err(ConfigError::InvalidGeometry("motor_distance_mm must be positive"));
        }
        if self.left_winding == Direction::Stopped || self.right_winding == Direction::Stopped {
            return Err(ConfigError::InvalidGeometry("winding direction must be forward or reverse"));
        }
        Ok(())
    }
}

// ============================================================================
// Device Config
// ============================================================================

/// Device identification configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DeviceConfig {
    /// Human-readable device name
    pub name: ShortString,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: short_string("ploptart"),
        }
    }
}

impl DeviceConfig {
    /// Set the device name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = short_string(name);
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
