//! Routine scripts as data.
//!
//! A [`Routine`] is an ordered list of [`Step`]s.  It carries no behaviour of
//! its own; the [`Sequencer`][crate::sequencer::Sequencer] interprets it.
//! The free functions in this module are the vocabulary the routines in
//! [`routines`][crate::routines] are written in:
//!
//! ```rust
//! use matchbot_runtime::script::{drive, turn, ExitCondition, Step};
//! use matchbot_kernel::MechanismEvent;
//!
//! let steps = vec![
//!     drive(10.0, 110.0).chain(),
//!     turn(-60.0, 100.0).settle(),
//!     Step::mechanism(MechanismEvent::IntakeIn),
//!     Step::delay_ms(100),
//! ];
//! assert!(matches!(&steps[0], Step::Motion(m) if m.exit == ExitCondition::Chain));
//! ```

use std::time::Duration;

use matchbot_kernel::MechanismEvent;
use matchbot_types::{
    BrakeMode, Direction, DriveTarget, Point, SolenoidId, TurnTarget, Waypoint,
};
use serde::Serialize;

/// When a motion step hands control to the next step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitCondition {
    /// Block until the drivetrain reaches full precision.
    Settle,
    /// Block until the chain threshold; the tail of the motion overlaps the
    /// next step.
    Chain,
    /// Do not block.  The next motion request supersedes this one.
    Queued,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum MotionTarget {
    Drive(DriveTarget),
    Turn(TurnTarget),
}

/// One request to the drivetrain controller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MotionSegment {
    pub target: MotionTarget,
    pub speed: f64,
    pub exit: ExitCondition,
}

impl MotionSegment {
    fn new(target: MotionTarget, speed: f64) -> Self {
        Self {
            target,
            speed,
            exit: ExitCondition::Settle,
        }
    }

    pub fn settle(self) -> Step {
        self.exit(ExitCondition::Settle)
    }

    pub fn chain(self) -> Step {
        self.exit(ExitCondition::Chain)
    }

    pub fn queued(self) -> Step {
        self.exit(ExitCondition::Queued)
    }

    fn exit(mut self, exit: ExitCondition) -> Step {
        self.exit = exit;
        Step::Motion(self)
    }
}

/// A single step of a routine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// Issue a motion request and wait according to its exit condition.
    Motion(MotionSegment),
    /// Wait on a motion issued by an earlier step.
    Await { exit: ExitCondition },
    /// Block until the robot passes a point of the current odometry path.
    WaitUntil { point: Point },
    /// Hand an event to the mechanism coordinator.
    Mechanism { event: MechanismEvent },
    /// Sleep for a fixed time regardless of anything else.
    Delay { duration: Duration },
    /// Ranging correction to `target_in` inches from the goal.
    Correct { target_in: f64, timeout: Duration },
    /// Open-loop oscillation to free a jammed piece.
    Unstick { duration: Duration },
    /// Read the distance sensor once and keep the reading for a later
    /// [`Step::RangedDrive`].
    MeasureRange,
    /// Odometry drive of `-reading / 25.4 + offset_in` inches using the last
    /// measured range, then wait to settle.
    RangedDrive { offset_in: f64, speed: f64 },
    /// Zero the pose and the drive sensors.
    ResetPose,
    /// Change the drive brake mode.
    Brake { mode: BrakeMode },
}

impl Step {
    pub fn delay_ms(ms: u64) -> Self {
        Step::Delay {
            duration: Duration::from_millis(ms),
        }
    }

    pub fn correct(target_in: f64, timeout_ms: u64) -> Self {
        Step::Correct {
            target_in,
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    pub fn unstick_ms(ms: u64) -> Self {
        Step::Unstick {
            duration: Duration::from_millis(ms),
        }
    }

    pub fn mechanism(event: MechanismEvent) -> Self {
        Step::Mechanism { event }
    }

    pub fn extend(solenoid: SolenoidId) -> Self {
        Step::mechanism(MechanismEvent::Extend(solenoid))
    }

    pub fn retract(solenoid: SolenoidId) -> Self {
        Step::mechanism(MechanismEvent::Retract(solenoid))
    }

    pub fn wait_until(x: f64, y: f64) -> Self {
        Step::WaitUntil {
            point: Point::new(x, y),
        }
    }

    /// Short name used in logs and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Step::Motion(MotionSegment {
                target: MotionTarget::Drive(_),
                ..
            }) => "drive",
            Step::Motion(MotionSegment {
                target: MotionTarget::Turn(_),
                ..
            }) => "turn",
            Step::Await { .. } => "await",
            Step::WaitUntil { .. } => "wait_until",
            Step::Mechanism { .. } => "mechanism",
            Step::Delay { .. } => "delay",
            Step::Correct { .. } => "correct",
            Step::Unstick { .. } => "unstick",
            Step::MeasureRange => "measure_range",
            Step::RangedDrive { .. } => "ranged_drive",
            Step::ResetPose => "reset_pose",
            Step::Brake { .. } => "brake",
        }
    }

    /// Whether this step writes raw drive power and therefore needs an idle
    /// drivetrain.
    pub fn needs_idle_drive(&self) -> bool {
        matches!(self, Step::Correct { .. } | Step::Unstick { .. })
    }
}

/// A named, immutable step list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Routine {
    pub name: String,
    pub steps: Vec<Step>,
}

impl Routine {
    pub fn new(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            name: name.into(),
            steps,
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of motion requests the routine sends to the drivetrain.
    pub fn motion_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, Step::Motion(_) | Step::RangedDrive { .. }))
            .count()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Motion vocabulary
// ─────────────────────────────────────────────────────────────────────────────

/// Encoder drive of a signed distance along the current heading.
pub fn drive(inches: f64, speed: f64) -> MotionSegment {
    MotionSegment::new(MotionTarget::Drive(DriveTarget::Distance { inches }), speed)
}

/// Odometry drive of a signed distance along the current heading.
pub fn odom(inches: f64, speed: f64) -> MotionSegment {
    MotionSegment::new(
        MotionTarget::Drive(DriveTarget::OdomDistance { inches }),
        speed,
    )
}

/// Turn by `degrees` relative to the current heading.
pub fn turn(degrees: f64, speed: f64) -> MotionSegment {
    MotionSegment::new(MotionTarget::Turn(TurnTarget::Relative { degrees }), speed)
}

/// Turn to an absolute heading.
pub fn turn_to(degrees: f64, speed: f64) -> MotionSegment {
    MotionSegment::new(MotionTarget::Turn(TurnTarget::Absolute { degrees }), speed)
}

/// Follow odometry waypoints.  The request speed is the fastest waypoint's.
pub fn path(waypoints: Vec<Waypoint>) -> MotionSegment {
    let speed = waypoints.iter().map(|w| w.speed).fold(0.0, f64::max);
    MotionSegment::new(MotionTarget::Drive(DriveTarget::Path { waypoints }), speed)
}

pub fn waypoint(x: f64, y: f64, direction: Direction, speed: f64) -> Waypoint {
    Waypoint {
        point: Point::new(x, y),
        heading_deg: None,
        direction,
        speed,
    }
}

/// A waypoint approached at a fixed final heading.
pub fn waypoint_facing(
    x: f64,
    y: f64,
    heading_deg: f64,
    direction: Direction,
    speed: f64,
) -> Waypoint {
    Waypoint {
        heading_deg: Some(heading_deg),
        ..waypoint(x, y, direction, speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_builders_set_condition() {
        for (step, exit) in [
            (drive(1.0, 1.0).settle(), ExitCondition::Settle),
            (drive(1.0, 1.0).chain(), ExitCondition::Chain),
            (turn(1.0, 1.0).queued(), ExitCondition::Queued),
        ] {
            match step {
                Step::Motion(segment) => assert_eq!(segment.exit, exit),
                other => panic!("expected motion, got {other:?}"),
            }
        }
    }

    #[test]
    fn kinds_name_the_request() {
        assert_eq!(drive(10.0, 110.0).chain().kind(), "drive");
        assert_eq!(odom(10.0, 110.0).settle().kind(), "drive");
        assert_eq!(turn_to(-135.0, 100.0).chain().kind(), "turn");
        assert_eq!(Step::correct(4.0, 1000).kind(), "correct");
        assert_eq!(Step::MeasureRange.kind(), "measure_range");
    }

    #[test]
    fn path_speed_is_fastest_waypoint() {
        let segment = path(vec![
            waypoint(12.0, -24.0, Direction::Forward, 100.0),
            waypoint_facing(12.0, -12.0, 180.0, Direction::Forward, 90.0),
        ]);
        assert!((segment.speed - 100.0).abs() < f64::EPSILON);
        let MotionTarget::Drive(DriveTarget::Path { waypoints }) = segment.target else {
            panic!("expected a path");
        };
        assert_eq!(waypoints[1].heading_deg, Some(180.0));
        assert_eq!(waypoints[0].heading_deg, None);
    }

    #[test]
    fn only_raw_power_steps_need_idle_drive() {
        assert!(Step::correct(4.0, 1000).needs_idle_drive());
        assert!(Step::unstick_ms(500).needs_idle_drive());
        assert!(!drive(1.0, 1.0).settle().needs_idle_drive());
        assert!(!Step::delay_ms(100).needs_idle_drive());
    }

    #[test]
    fn motion_count_includes_ranged_drive() {
        let routine = Routine::new(
            "t",
            vec![
                drive(1.0, 1.0).settle(),
                Step::MeasureRange,
                Step::RangedDrive {
                    offset_in: 3.0,
                    speed: 85.0,
                },
                Step::delay_ms(10),
            ],
        );
        assert_eq!(routine.len(), 4);
        assert_eq!(routine.motion_count(), 2);
    }

    #[test]
    fn steps_serialize_with_tag() {
        let json = serde_json::to_string(&Step::delay_ms(250)).unwrap();
        assert!(json.contains("\"step\":\"delay\""));
    }
}
