//! [`Robot`] – the set of devices a routine runs against.

use std::sync::Arc;

use matchbot_hal::clock::SimClock;
use matchbot_hal::sim::{ActuationLog, ChassisProbe, SimChassis, SimRangeSensor, SimRegistry};
use matchbot_hal::{Chassis, Clock, RangeSensor};
use matchbot_kernel::MechanismCoordinator;
use matchbot_types::DriveTuning;

/// Everything the sequencer and the operator mapping drive.
///
/// The mechanism coordinator lives here for the whole process so the state
/// autonomous leaves behind carries into driver control.
pub struct Robot {
    pub chassis: Box<dyn Chassis>,
    pub range: Box<dyn RangeSensor>,
    pub mechanisms: MechanismCoordinator,
    pub clock: Arc<dyn Clock>,
}

impl Robot {
    pub fn new(
        chassis: Box<dyn Chassis>,
        range: Box<dyn RangeSensor>,
        mechanisms: MechanismCoordinator,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            chassis,
            range,
            mechanisms,
            clock,
        }
    }

    /// Push drivetrain tuning to the chassis.  Done once at start-up.
    pub fn apply_tuning(&mut self, tuning: &DriveTuning) {
        self.chassis.apply_tuning(tuning);
    }
}

/// A fully simulated [`Robot`] plus handles to inspect what it did.
pub struct SimRobot {
    pub robot: Robot,
    pub clock: SimClock,
    pub chassis: ChassisProbe,
    pub actuations: ActuationLog,
}

impl SimRobot {
    /// Simulated robot whose chassis settles instantly and whose distance
    /// sensor always reads `range_mm`.
    pub fn new(range_mm: i32) -> Self {
        Self::with_sensor(SimRangeSensor::constant(range_mm))
    }

    pub fn with_sensor(range: Box<dyn RangeSensor>) -> Self {
        let clock = SimClock::new();
        Self::build(SimChassis::new(clock.clone()), range, clock)
    }

    /// Assemble around an already configured chassis, e.g. one built with
    /// [`SimChassis::with_motion_time`].  `clock` must be the chassis clock.
    pub fn build(chassis: SimChassis, range: Box<dyn RangeSensor>, clock: SimClock) -> Self {
        let probe = chassis.probe();
        let registry = SimRegistry::new(clock.clone()).with_all_mechanisms();
        let actuations = registry.log();
        let shared: Arc<dyn Clock> = Arc::new(clock.clone());
        let mechanisms = MechanismCoordinator::new(registry.build(), Arc::clone(&shared));

        Self {
            robot: Robot::new(Box::new(chassis), range, mechanisms, shared),
            clock,
            chassis: probe,
            actuations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matchbot_hal::sim::ChassisCommand;
    use matchbot_kernel::{Mechanism, MechanismEvent};
    use std::time::Duration;

    #[test]
    fn sim_robot_shares_one_clock() {
        let mut sim = SimRobot::new(500);
        sim.robot
            .mechanisms
            .handle(MechanismEvent::Toggle(Mechanism::Matchload));
        // The interlock settle runs on the shared clock.
        assert_eq!(sim.clock.now(), Duration::from_millis(250));
        assert_eq!(sim.robot.clock.now(), Duration::from_millis(250));
        assert!(!sim.actuations.records().is_empty());
    }

    #[test]
    fn apply_tuning_reaches_the_chassis() {
        let mut sim = SimRobot::new(500);
        sim.robot.apply_tuning(&DriveTuning::default());
        assert_eq!(sim.chassis.commands(), vec![ChassisCommand::ApplyTuning]);
    }

    #[test]
    fn sensor_reads_the_configured_range() {
        let mut sim = SimRobot::new(420);
        assert_eq!(sim.robot.range.distance_mm(), Ok(420));
    }
}
