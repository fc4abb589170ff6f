//! [`Sequencer`] – interprets a [`Routine`] against a [`Robot`].
//!
//! Steps run strictly in order, each exactly once.  Nothing a step does can
//! stop the routine: a failed motion request, a faulty sensor or a timed-out
//! correction is logged, recorded in the [`RunReport`], and the next step
//! runs.
//!
//! Raw-power steps ([`Step::Correct`], [`Step::Unstick`]) require an idle
//! drivetrain.  When a previous motion is still executing (for example one
//! issued with [`ExitCondition::Queued`]) the sequencer first waits for it to
//! settle, so the drivetrain controller and the raw writes never overlap.
//!
//! # Example
//!
//! ```rust
//! use matchbot_runtime::robot::SimRobot;
//! use matchbot_runtime::script::{drive, Routine, Step};
//! use matchbot_runtime::sequencer::Sequencer;
//!
//! let mut sim = SimRobot::new(300);
//! let routine = Routine::new(
//!     "demo",
//!     vec![drive(12.0, 110.0).settle(), Step::correct(4.0, 1000)],
//! );
//!
//! let report = Sequencer::default().run(&mut sim.robot, &routine);
//! assert_eq!(report.steps.len(), 2);
//! ```

use matchbot_kernel::MechanismState;
use matchbot_hal::Chassis;
use matchbot_types::{DriveTarget, MM_PER_INCH, Pose};
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::ranging::{CorrectionOutcome, RangingCorrector};
use crate::robot::Robot;
use crate::script::{ExitCondition, MotionTarget, Routine, Step};

// ─────────────────────────────────────────────────────────────────────────────
// Report
// ─────────────────────────────────────────────────────────────────────────────

/// What happened during one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    Done,
    /// The step hit a hardware error and was skipped.
    Faulted { details: String },
    Correction { result: CorrectionOutcome },
    Unstuck { cycles: u32 },
    Measured { reading_mm: Option<i32> },
    /// `None` when there was no valid measurement and the drive was skipped.
    RangedDrive { inches: Option<f64> },
    Mechanism { state: MechanismState },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    pub index: usize,
    pub kind: &'static str,
    /// Time since the routine started, in milliseconds.
    pub started_ms: u64,
    pub outcome: StepOutcome,
}

/// Summary of one routine run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub routine: String,
    pub steps: Vec<StepRecord>,
    pub elapsed_ms: u64,
}

impl RunReport {
    /// Outcomes of every ranging correction, in order.
    pub fn corrections(&self) -> Vec<CorrectionOutcome> {
        self.steps
            .iter()
            .filter_map(|s| match s.outcome {
                StepOutcome::Correction { result } => Some(result),
                _ => None,
            })
            .collect()
    }

    /// Number of steps that were skipped because of a hardware error.
    pub fn faults(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s.outcome, StepOutcome::Faulted { .. }))
            .count()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sequencer
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    corrector: RangingCorrector,
}

impl Sequencer {
    pub fn new(corrector: RangingCorrector) -> Self {
        Self { corrector }
    }

    pub fn corrector(&self) -> &RangingCorrector {
        &self.corrector
    }

    /// Run every step of `routine` once, in order.
    pub fn run(&self, robot: &mut Robot, routine: &Routine) -> RunReport {
        let span = info_span!("routine", name = %routine.name);
        let _enter = span.enter();

        info!(steps = routine.len(), "routine started");
        let start = robot.clock.now();
        let mut last_range_mm = None;
        let mut steps = Vec::with_capacity(routine.len());

        for (index, step) in routine.steps.iter().enumerate() {
            let kind = step.kind();
            let started_ms = robot.clock.since(start).as_millis() as u64;
            debug!(step = index, kind, started_ms, "step");

            let outcome = self.execute(robot, step, &mut last_range_mm);
            if let StepOutcome::Faulted { details } = &outcome {
                warn!(step = index, kind, %details, "step failed; continuing");
            }
            steps.push(StepRecord {
                index,
                kind,
                started_ms,
                outcome,
            });
        }

        let elapsed_ms = robot.clock.since(start).as_millis() as u64;
        info!(elapsed_ms, "routine finished");
        RunReport {
            routine: routine.name.clone(),
            steps,
            elapsed_ms,
        }
    }

    fn execute(&self, robot: &mut Robot, step: &Step, last_range_mm: &mut Option<i32>) -> StepOutcome {
        if step.needs_idle_drive() && !robot.chassis.is_idle() {
            debug!("waiting for the drivetrain before raw power");
            robot.chassis.wait_settled();
        }

        match step {
            Step::Motion(segment) => {
                let issued = match &segment.target {
                    MotionTarget::Drive(target) => robot.chassis.drive_to(target.clone(), segment.speed),
                    MotionTarget::Turn(target) => robot.chassis.turn_to(*target, segment.speed),
                };
                match issued {
                    Ok(()) => {
                        await_motion(robot.chassis.as_mut(), segment.exit);
                        StepOutcome::Done
                    }
                    Err(e) => StepOutcome::Faulted {
                        details: e.to_string(),
                    },
                }
            }
            Step::Await { exit } => {
                await_motion(robot.chassis.as_mut(), *exit);
                StepOutcome::Done
            }
            Step::WaitUntil { point } => {
                robot.chassis.wait_until(*point);
                StepOutcome::Done
            }
            Step::Mechanism { event } => StepOutcome::Mechanism {
                state: robot.mechanisms.handle(*event),
            },
            Step::Delay { duration } => {
                robot.clock.sleep(*duration);
                StepOutcome::Done
            }
            Step::Correct { target_in, timeout } => {
                let result = self.corrector.correct(
                    robot.chassis.as_mut(),
                    robot.range.as_mut(),
                    robot.clock.as_ref(),
                    *target_in,
                    *timeout,
                );
                info!(?result, target_in, "ranging correction");
                StepOutcome::Correction { result }
            }
            Step::Unstick { duration } => StepOutcome::Unstuck {
                cycles: self
                    .corrector
                    .unstick(robot.chassis.as_mut(), robot.clock.as_ref(), *duration),
            },
            Step::MeasureRange => {
                *last_range_mm = self.corrector.measure(robot.range.as_mut());
                StepOutcome::Measured {
                    reading_mm: *last_range_mm,
                }
            }
            Step::RangedDrive { offset_in, speed } => {
                let Some(reading_mm) = *last_range_mm else {
                    warn!("no valid range measurement; ranged drive skipped");
                    return StepOutcome::RangedDrive { inches: None };
                };
                let inches = ranged_distance(reading_mm, *offset_in);
                debug!(reading_mm, inches, "ranged drive");
                if let Err(e) = robot
                    .chassis
                    .drive_to(DriveTarget::OdomDistance { inches }, *speed)
                {
                    return StepOutcome::Faulted {
                        details: e.to_string(),
                    };
                }
                robot.chassis.wait_settled();
                StepOutcome::RangedDrive {
                    inches: Some(inches),
                }
            }
            Step::ResetPose => {
                robot.chassis.reset_pose_and_sensors();
                robot.chassis.set_pose(Pose::ORIGIN);
                StepOutcome::Done
            }
            Step::Brake { mode } => match robot.chassis.set_brake_mode(*mode) {
                Ok(()) => StepOutcome::Done,
                Err(e) => StepOutcome::Faulted {
                    details: e.to_string(),
                },
            },
        }
    }
}

/// Signed distance that leaves the robot `offset_in` inches past the point
/// the sensor measured to.  Negative drives backward.
pub fn ranged_distance(reading_mm: i32, offset_in: f64) -> f64 {
    -f64::from(reading_mm) / MM_PER_INCH + offset_in
}

fn await_motion(chassis: &mut dyn Chassis, exit: ExitCondition) {
    match exit {
        ExitCondition::Settle => chassis.wait_settled(),
        ExitCondition::Chain => chassis.wait_chainable(),
        ExitCondition::Queued => {}
    }
}
