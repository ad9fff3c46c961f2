//! Coordinated multi-axis motion.
//!
//! A [`MotionGroup`] moves a set of [`Axis`] records so that they start and
//! finish together. For every move the axis travelling furthest runs at its
//! full configured speed; every other axis has its speed cap scaled by
//! `distance / max_distance`, so at cruise all axes cover their distance in
//! the same wall-clock time. On a cable plotter this keeps both cables taut
//! and the pen on a straight-ish path between targets.
//!
//! The group does not own axis state. It holds axis ids and operates on the
//! controller's axis arena, so the same axes outlive any single move.
//!
//! # State machine
//!
//! ```text
//! Idle --move_to--> Running --all axes settled--> Idle
//!                   Running --move_to--> Running (re-targeted in place)
//! ```
//!
//! # Example
//!
//! ```rust
//! use ploptart::axis::Axis;
//! use ploptart::config::AxisConfig;
//! use ploptart::group::{MotionGroup, MoveOutcome, SyncPolicy};
//! use ploptart::hal::MockStepper;
//!
//! let mut axes = [
//!     Axis::new(0, &AxisConfig::new("left")).unwrap(),
//!     Axis::new(1, &AxisConfig::new("right")).unwrap(),
//! ];
//! let mut drivers = [MockStepper::new(), MockStepper::new()];
//! let group = MotionGroup::all(2).unwrap();
//!
//! let outcome = group.move_to(&mut axes, &[40, 20], SyncPolicy::SpeedOnly).unwrap();
//! assert!(matches!(outcome, MoveOutcome::Started(_)));
//! assert_eq!(axes[1].max_speed(), 375.0);
//!
//! let mut now_us = 0;
//! while group.is_running(&axes) {
//!     group.poll(&mut axes, &mut drivers, now_us).unwrap();
//!     now_us += 100;
//! }
//! assert_eq!(axes[0].current_position(), 40);
//! assert_eq!(axes[1].current_position(), 20);
//! ```

use heapless::Vec as HVec;

use crate::axis::Axis;
use crate::commands::MoveError;
use crate::config::MAX_AXES;
use crate::traits::StepperDriver;

/// Index of an axis in the controller's arena.
pub type AxisId = usize;

/// How per-axis limits are scaled for a coordinated move.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SyncPolicy {
    /// Scale only the speed cap. Acceleration stays as configured, so short
    /// axes spend proportionally less time ramping and may settle slightly
    /// before the lead axis.
    #[default]
    SpeedOnly,
    /// Scale speed cap and acceleration by the same factor. Every profile
    /// becomes a time-scaled copy of the lead axis.
    SpeedAndAcceleration,
}

/// Summary of an accepted move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MovePlan {
    /// Axis that runs at full speed, `None` if no axis has to travel.
    pub lead_axis: Option<AxisId>,
    /// Longest distance (steps) any member has to travel.
    pub max_distance: u64,
}

/// What [`MotionGroup::move_to`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MoveOutcome {
    /// Every target already matched; nothing was touched.
    Unchanged,
    /// The group was idle and is now running.
    Started(MovePlan),
    /// The group was running and has been re-targeted in place.
    Retargeted(MovePlan),
}

/// An ordered set of axes moved together.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MotionGroup {
    members: HVec<AxisId, MAX_AXES>,
}

impl MotionGroup {
    /// Group the given axis ids, in stepping order.
    ///
    /// Returns `None` for more than [`MAX_AXES`] members.
    pub fn new(members: &[AxisId]) -> Option<Self> {
        HVec::from_slice(members)
            .ok()
            .map(|members| Self { members })
    }

    /// Group axes `0..count`. Returns `None` if `count` exceeds [`MAX_AXES`].
    pub fn all(count: usize) -> Option<Self> {
        if count > MAX_AXES {
            return None;
        }
        Some(Self {
            members: (0..count).collect(),
        })
    }

    /// Member axis ids in stepping order.
    pub fn members(&self) -> &[AxisId] {
        &self.members
    }

    /// Number of member axes.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True if the group has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Send every member to its target so that all of them arrive together.
    ///
    /// `targets[i]` belongs to `members()[i]`. Calling this while the group is
    /// running re-targets in place.
    pub fn move_to(
        &self,
        axes: &mut [Axis],
        targets: &[i64],
        policy: SyncPolicy,
    ) -> Result<MoveOutcome, MoveError> {
        if targets.len() != self.members.len() {
            return Err(MoveError::AxisCountMismatch {
                expected: self.members.len(),
                actual: targets.len(),
            });
        }
        if let Some(&id) = self.members.iter().find(|id| **id >= axes.len()) {
            return Err(MoveError::UnknownAxis(id));
        }

        let unchanged = self
            .members
            .iter()
            .zip(targets)
            .all(|(id, target)| axes[*id].target_position() == *target);
        if unchanged {
            return Ok(MoveOutcome::Unchanged);
        }

        let was_running = self.is_running(axes);

        let mut plan = MovePlan {
            lead_axis: None,
            max_distance: 0,
        };
        for (id, target) in self.members.iter().zip(targets) {
            let distance = target.abs_diff(axes[*id].current_position());
            if distance > plan.max_distance {
                plan.max_distance = distance;
                plan.lead_axis = Some(*id);
            }
        }

        for (id, target) in self.members.iter().zip(targets) {
            let axis = &mut axes[*id];
            let distance = target.abs_diff(axis.current_position());
            if distance == 0 {
                axis.restore_limits();
            } else {
                let scale = distance as f32 / plan.max_distance as f32;
                axis.set_max_speed(axis.configured_max_speed() * scale);
                match policy {
                    SyncPolicy::SpeedOnly => {
                        axis.set_acceleration(axis.configured_acceleration());
                    }
                    SyncPolicy::SpeedAndAcceleration => {
                        axis.set_acceleration(axis.configured_acceleration() * scale);
                    }
                }
            }
            axis.set_target(*target);
        }

        log::debug!(
            "move to {:?}: lead axis {:?}, {} steps",
            targets,
            plan.lead_axis,
            plan.max_distance
        );

        Ok(if was_running {
            MoveOutcome::Retargeted(plan)
        } else {
            MoveOutcome::Started(plan)
        })
    }

    /// True while any member is off target or still moving.
    pub fn is_running(&self, axes: &[Axis]) -> bool {
        self.members
            .iter()
            .filter_map(|id| axes.get(*id))
            .any(Axis::is_running)
    }

    /// Advance every member whose step is due at `now_us`.
    ///
    /// All members see the same `now_us`. Returns the number of steps taken.
    /// Call this at least as often as the shortest step interval.
    pub fn poll<D: StepperDriver>(
        &self,
        axes: &mut [Axis],
        drivers: &mut [D],
        now_us: u64,
    ) -> Result<usize, D::Error> {
        let mut steps = 0;
        for id in self.members.iter() {
            let (Some(axis), Some(driver)) = (axes.get_mut(*id), drivers.get_mut(*id)) else {
                continue;
            };
            if let Some(direction) = axis.advance(now_us) {
                driver.step(axis.current_position(), direction)?;
                steps += 1;
            }
        }
        Ok(steps)
    }
}
