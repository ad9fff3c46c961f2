//! Command types for the plotter controller.
//!
//! Commands arrive as bytes on the serial link, are framed and decoded by
//! [`crate::protocol`], and are applied with
//! [`PlotterController::apply_command`](crate::PlotterController::apply_command).
//!
//! # Command Flow
//!
//! 1. [`CommandReader`](crate::protocol::CommandReader) turns bytes into a [`Command`]
//! 2. The controller applies it and returns a [`CommandOutcome`]
//! 3. For [`CommandOutcome::Telemetry`] the caller writes the reply line
//!
//! ```rust
//! use ploptart::{Command, Targets};
//!
//! let cmd = Command::move_to(&[100, -100]).unwrap();
//! assert!(matches!(cmd, Command::Move(ref t) if t.as_slice() == [100, -100]));
//! assert!(Command::Telemetry.is_telemetry());
//! ```

use core::fmt;

use heapless::Vec as HVec;

use crate::config::MAX_AXES;
use crate::group::{AxisId, MoveOutcome};

/// One target step count per axis, in axis id order.
pub type Targets = HVec<i64, MAX_AXES>;

// ============================================================================
// Commands
// ============================================================================

/// A decoded host command.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Command {
    /// Move every axis to its target, all arriving together.
    Move(Targets),
    /// Report current positions.
    Telemetry,
}

impl Command {
    /// Build a move command. Returns `None` for more than [`MAX_AXES`] targets.
    pub fn move_to(targets: &[i64]) -> Option<Self> {
        Targets::from_slice(targets).ok().map(Command::Move)
    }

    /// True for a telemetry request.
    pub fn is_telemetry(&self) -> bool {
        matches!(self, Command::Telemetry)
    }
}

// ============================================================================
// Outcomes
// ============================================================================

/// Result of applying a [`Command`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CommandOutcome {
    /// A move was accepted (possibly as a no-op).
    Moved(MoveOutcome),
    /// Current axis positions, to be sent back to the host.
    Telemetry(Targets),
}

/// Why a move was rejected.
///
/// Moves are only rejected for shape errors. Target values themselves are
/// never range-checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MoveError {
    /// The number of targets does not match the number of axes.
    AxisCountMismatch {
        /// Axes in the group.
        expected: usize,
        /// Targets given.
        actual: usize,
    },
    /// A group member refers to an axis that does not exist.
    UnknownAxis(AxisId),
}

impl fmt::Display for MoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveError::AxisCountMismatch { expected, actual } => {
                write!(f, "expected {} targets, got {}", expected, actual)
            }
            MoveError::UnknownAxis(id) => write!(f, "unknown axis {}", id),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MoveError {}
