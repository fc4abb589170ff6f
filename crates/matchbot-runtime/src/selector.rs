//! Match-start routine selection and dispatch.
//!
//! [`RoutineSelector`] is the on-robot picker: it cycles through
//! [`RoutineId::ALL`] and shows the current label.  [`Dispatcher`] runs the
//! picked routine once, after the same preamble the robot always performs at
//! the start of autonomous.

use matchbot_types::BrakeMode;
use tracing::{info, warn};

use crate::robot::Robot;
use crate::routines::RoutineId;
use crate::sequencer::{RunReport, Sequencer};

/// Cycles through the routines in selector order, wrapping at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutineSelector {
    index: usize,
}

impl Default for RoutineSelector {
    fn default() -> Self {
        Self::new(RoutineId::ALL[0])
    }
}

impl RoutineSelector {
    pub fn new(initial: RoutineId) -> Self {
        let index = RoutineId::ALL
            .iter()
            .position(|id| *id == initial)
            .unwrap_or(0);
        Self { index }
    }

    pub fn current(&self) -> RoutineId {
        RoutineId::ALL[self.index]
    }

    pub fn label(&self) -> &'static str {
        self.current().label()
    }

    pub fn next(&mut self) -> RoutineId {
        self.index = (self.index + 1) % RoutineId::ALL.len();
        self.current()
    }

    pub fn previous(&mut self) -> RoutineId {
        self.index = (self.index + RoutineId::ALL.len() - 1) % RoutineId::ALL.len();
        self.current()
    }
}

/// Runs one routine per call.  Calling it twice runs the routine twice; the
/// caller decides when that is allowed.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    sequencer: Sequencer,
}

impl Dispatcher {
    pub fn new(sequencer: Sequencer) -> Self {
        Self { sequencer }
    }

    pub fn run(&self, robot: &mut Robot, id: RoutineId) -> RunReport {
        info!(routine = id.slug(), label = id.label(), "autonomous start");
        robot.chassis.reset_pose_and_sensors();
        if let Err(e) = robot.chassis.set_brake_mode(BrakeMode::Hold) {
            warn!(error = %e, "could not hold the drive before autonomous");
        }
        self.sequencer.run(robot, &id.routine())
    }
}
