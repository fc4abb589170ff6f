//! In-process simulation drivers for testing without a robot.
//!
//! Every simulated device shares a [`SimClock`] and records what it was told
//! to do, so tests can replay a full routine instantly and then assert on the
//! exact timeline of actuator writes.
//!
//! # Example
//!
//! ```rust
//! use matchbot_hal::clock::SimClock;
//! use matchbot_hal::sim::SimRegistry;
//! use matchbot_types::{ActuatorCommand, SolenoidId};
//!
//! let clock = SimClock::new();
//! let sim = SimRegistry::new(clock).with_all_mechanisms();
//! let log = sim.log();
//! let mut registry = sim.build();
//!
//! registry
//!     .dispatch(ActuatorCommand::extend(SolenoidId::Aligner))
//!     .expect("sim solenoid must succeed");
//! assert_eq!(log.records().len(), 1);
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use matchbot_types::{
    ActuatorCommand, BotError, BrakeMode, DriveTarget, DriveTuning, Point, Pose, RollerId,
    SolenoidId, TurnTarget,
};

use crate::chassis::Chassis;
use crate::clock::{Clock, SimClock};
use crate::motor::{clamp_power, Motor};
use crate::range::RangeSensor;
use crate::registry::HardwareRegistry;
use crate::solenoid::Solenoid;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panicking test thread must not hide the log from the others.
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ────────────────────────────────────────────────────────────────────────────
// Actuation log
// ────────────────────────────────────────────────────────────────────────────

/// One mechanism write as seen by a simulated device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActuationRecord {
    pub at: Duration,
    pub command: ActuatorCommand,
}

/// Shared, timestamped record of every write to simulated mechanism devices.
#[derive(Clone, Default)]
pub struct ActuationLog {
    records: Arc<Mutex<Vec<ActuationRecord>>>,
}

impl ActuationLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, at: Duration, command: ActuatorCommand) {
        lock(&self.records).push(ActuationRecord { at, command });
    }

    /// Snapshot of all records in write order.
    pub fn records(&self) -> Vec<ActuationRecord> {
        lock(&self.records).clone()
    }

    /// Writes to one solenoid, as `(time, extended)` pairs.
    pub fn solenoid_history(&self, id: SolenoidId) -> Vec<(Duration, bool)> {
        lock(&self.records)
            .iter()
            .filter_map(|r| match r.command {
                ActuatorCommand::Solenoid { solenoid, extended } if solenoid == id => {
                    Some((r.at, extended))
                }
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        lock(&self.records).clear();
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stub solenoid
// ────────────────────────────────────────────────────────────────────────────

/// A simulated solenoid that logs every write.  Always succeeds.
pub struct SimSolenoid {
    id: SolenoidId,
    extended: bool,
    clock: SimClock,
    log: ActuationLog,
}

impl SimSolenoid {
    pub fn new(id: SolenoidId, clock: SimClock, log: ActuationLog) -> Box<Self> {
        Box::new(Self {
            id,
            extended: false,
            clock,
            log,
        })
    }
}

impl Solenoid for SimSolenoid {
    fn id(&self) -> SolenoidId {
        self.id
    }

    fn set_extended(&mut self, extended: bool) -> Result<(), BotError> {
        self.extended = extended;
        self.log.push(
            self.clock.now(),
            ActuatorCommand::Solenoid {
                solenoid: self.id,
                extended,
            },
        );
        Ok(())
    }

    fn extended(&self) -> bool {
        self.extended
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stub motor
// ────────────────────────────────────────────────────────────────────────────

/// A simulated roller motor that logs every write.  Always succeeds.
pub struct SimMotor {
    id: RollerId,
    power: f64,
    clock: SimClock,
    log: ActuationLog,
}

impl SimMotor {
    pub fn new(id: RollerId, clock: SimClock, log: ActuationLog) -> Box<Self> {
        Box::new(Self {
            id,
            power: 0.0,
            clock,
            log,
        })
    }
}

impl Motor for SimMotor {
    fn id(&self) -> RollerId {
        self.id
    }

    fn set_power(&mut self, power: f64) -> Result<(), BotError> {
        self.power = clamp_power(power);
        self.log.push(
            self.clock.now(),
            ActuatorCommand::Roller {
                roller: self.id,
                power: self.power,
            },
        );
        Ok(())
    }

    fn set_brake_mode(&mut self, mode: BrakeMode) -> Result<(), BotError> {
        self.log.push(
            self.clock.now(),
            ActuatorCommand::RollerBrake {
                roller: self.id,
                mode,
            },
        );
        Ok(())
    }

    fn power(&self) -> f64 {
        self.power
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stub range sensor
// ────────────────────────────────────────────────────────────────────────────

/// A simulated distance sensor replaying scripted readings.
///
/// Readings are returned in order; once the script runs out the last reading
/// repeats forever.
pub struct SimRangeSensor {
    id: String,
    pending: VecDeque<Result<i32, BotError>>,
    last: Result<i32, BotError>,
}

impl SimRangeSensor {
    /// A sensor that always reports `mm`.
    pub fn constant(mm: i32) -> Box<Self> {
        Self::scripted(vec![mm])
    }

    /// A sensor that reports `readings` in order, then repeats the last one.
    pub fn scripted(readings: Vec<i32>) -> Box<Self> {
        Box::new(Self {
            id: "dist_sensor".to_string(),
            pending: readings.into_iter().map(Ok).collect(),
            last: Ok(0),
        })
    }

    /// A sensor whose every read fails.
    pub fn disconnected() -> Box<Self> {
        let fault = Err(BotError::SensorFault {
            sensor: "dist_sensor".to_string(),
            details: "device not responding".to_string(),
        });
        Box::new(Self {
            id: "dist_sensor".to_string(),
            pending: VecDeque::new(),
            last: fault,
        })
    }
}

impl RangeSensor for SimRangeSensor {
    fn id(&self) -> &str {
        &self.id
    }

    fn distance_mm(&mut self) -> Result<i32, BotError> {
        if let Some(next) = self.pending.pop_front() {
            self.last = next;
        }
        self.last.clone()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stub chassis
// ────────────────────────────────────────────────────────────────────────────

/// Everything a [`SimChassis`] was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum ChassisCommand {
    Drive { target: DriveTarget, speed: f64 },
    Turn { target: TurnTarget, speed: f64 },
    WaitSettled,
    WaitChainable,
    WaitUntil(Point),
    ResetPoseAndSensors,
    SetPose(Pose),
    TankPower { left: f64, right: f64 },
    BrakeMode(BrakeMode),
    ApplyTuning,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChassisRecord {
    pub at: Duration,
    pub command: ChassisCommand,
    /// Whether a motion request was executing when the command arrived.
    pub busy: bool,
}

/// Read access to a [`SimChassis`] after it has been handed off as a
/// `Box<dyn Chassis>`.
#[derive(Clone)]
pub struct ChassisProbe {
    records: Arc<Mutex<Vec<ChassisRecord>>>,
}

impl ChassisProbe {
    pub fn records(&self) -> Vec<ChassisRecord> {
        lock(&self.records).clone()
    }

    pub fn commands(&self) -> Vec<ChassisCommand> {
        lock(&self.records)
            .iter()
            .map(|r| r.command.clone())
            .collect()
    }

    /// Every raw `(left, right)` power write, in order.
    pub fn tank_powers(&self) -> Vec<(f64, f64)> {
        lock(&self.records)
            .iter()
            .filter_map(|r| match r.command {
                ChassisCommand::TankPower { left, right } => Some((left, right)),
                _ => None,
            })
            .collect()
    }

    pub fn last_brake_mode(&self) -> Option<BrakeMode> {
        lock(&self.records)
            .iter()
            .rev()
            .find_map(|r| match r.command {
                ChassisCommand::BrakeMode(mode) => Some(mode),
                _ => None,
            })
    }
}

/// A drivetrain controller that settles every motion a fixed (default
/// zero) amount of simulated time after it was requested.  Time spent
/// elsewhere, e.g. in a delay, counts towards the motion.
pub struct SimChassis {
    clock: SimClock,
    records: Arc<Mutex<Vec<ChassisRecord>>>,
    settles_at: Duration,
    motion_time: Duration,
    pose: Pose,
    tuning: DriveTuning,
}

impl SimChassis {
    pub fn new(clock: SimClock) -> Self {
        Self {
            clock,
            records: Arc::new(Mutex::new(Vec::new())),
            settles_at: Duration::ZERO,
            motion_time: Duration::ZERO,
            pose: Pose::ORIGIN,
            tuning: DriveTuning::default(),
        }
    }

    /// Simulated time each motion takes to settle.  A chained wait releases
    /// at the halfway point while the motion keeps converging.
    pub fn with_motion_time(mut self, motion_time: Duration) -> Self {
        self.motion_time = motion_time;
        self
    }

    pub fn probe(&self) -> ChassisProbe {
        ChassisProbe {
            records: Arc::clone(&self.records),
        }
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn tuning(&self) -> &DriveTuning {
        &self.tuning
    }

    fn record(&self, command: ChassisCommand) {
        lock(&self.records).push(ChassisRecord {
            at: self.clock.now(),
            command,
            busy: !self.is_idle(),
        });
    }

    fn start_motion(&mut self) {
        self.settles_at = self.clock.now() + self.motion_time;
    }

    fn sleep_until(&self, at: Duration) {
        self.clock.sleep(at.saturating_sub(self.clock.now()));
    }
}

impl Chassis for SimChassis {
    fn drive_to(&mut self, target: DriveTarget, speed: f64) -> Result<(), BotError> {
        self.record(ChassisCommand::Drive { target, speed });
        self.start_motion();
        Ok(())
    }

    fn turn_to(&mut self, target: TurnTarget, speed: f64) -> Result<(), BotError> {
        self.pose.heading_deg = match target {
            TurnTarget::Relative { degrees } => self.pose.heading_deg + degrees,
            TurnTarget::Absolute { degrees } => degrees,
        };
        self.record(ChassisCommand::Turn { target, speed });
        self.start_motion();
        Ok(())
    }

    fn wait_settled(&mut self) {
        self.record(ChassisCommand::WaitSettled);
        self.sleep_until(self.settles_at);
    }

    fn wait_chainable(&mut self) {
        self.record(ChassisCommand::WaitChainable);
        self.sleep_until(self.settles_at.saturating_sub(self.motion_time / 2));
    }

    fn wait_until(&mut self, point: Point) {
        self.record(ChassisCommand::WaitUntil(point));
    }

    fn reset_pose_and_sensors(&mut self) {
        self.record(ChassisCommand::ResetPoseAndSensors);
        self.settles_at = self.clock.now();
    }

    fn set_pose(&mut self, pose: Pose) {
        self.record(ChassisCommand::SetPose(pose));
        self.pose = pose;
    }

    fn is_idle(&self) -> bool {
        self.clock.now() >= self.settles_at
    }

    fn set_tank_power(&mut self, left: f64, right: f64) -> Result<(), BotError> {
        self.record(ChassisCommand::TankPower {
            left: clamp_power(left),
            right: clamp_power(right),
        });
        Ok(())
    }

    fn set_brake_mode(&mut self, mode: BrakeMode) -> Result<(), BotError> {
        self.record(ChassisCommand::BrakeMode(mode));
        Ok(())
    }

    fn apply_tuning(&mut self, tuning: &DriveTuning) {
        self.record(ChassisCommand::ApplyTuning);
        self.tuning = tuning.clone();
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SimRegistry builder
// ────────────────────────────────────────────────────────────────────────────

/// Builder that constructs a [`HardwareRegistry`] pre-populated with
/// simulated mechanism drivers sharing one clock and one [`ActuationLog`].
pub struct SimRegistry {
    clock: SimClock,
    log: ActuationLog,
    solenoids: Vec<Box<dyn Solenoid>>,
    rollers: Vec<Box<dyn Motor>>,
}

impl SimRegistry {
    pub fn new(clock: SimClock) -> Self {
        Self {
            clock,
            log: ActuationLog::new(),
            solenoids: Vec::new(),
            rollers: Vec::new(),
        }
    }

    /// Handle to the log every device built by this registry writes to.
    pub fn log(&self) -> ActuationLog {
        self.log.clone()
    }

    pub fn with_solenoid(mut self, id: SolenoidId) -> Self {
        self.solenoids
            .push(SimSolenoid::new(id, self.clock.clone(), self.log.clone()));
        self
    }

    pub fn with_roller(mut self, id: RollerId) -> Self {
        self.rollers
            .push(SimMotor::new(id, self.clock.clone(), self.log.clone()));
        self
    }

    /// Register all five solenoids and both rollers.
    pub fn with_all_mechanisms(self) -> Self {
        let with_solenoids = SolenoidId::ALL
            .into_iter()
            .fold(self, |sim, id| sim.with_solenoid(id));
        RollerId::ALL
            .into_iter()
            .fold(with_solenoids, |sim, id| sim.with_roller(id))
    }

    pub fn build(self) -> HardwareRegistry {
        let mut registry = HardwareRegistry::new();
        for s in self.solenoids {
            registry.register_solenoid(s);
        }
        for r in self.rollers {
            registry.register_roller(r);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_registry_registers_every_device() {
        let mut registry = SimRegistry::new(SimClock::new())
            .with_all_mechanisms()
            .build();
        for id in SolenoidId::ALL {
            registry
                .dispatch(ActuatorCommand::extend(id))
                .expect("sim solenoid must succeed");
        }
        for id in RollerId::ALL {
            registry
                .dispatch(ActuatorCommand::roller(id, 50.0))
                .expect("sim roller must succeed");
        }
        assert_eq!(registry.extended_solenoids().len(), 5);
    }

    #[test]
    fn actuation_log_is_timestamped() {
        let clock = SimClock::new();
        let sim = SimRegistry::new(clock.clone()).with_solenoid(SolenoidId::Aligner);
        let log = sim.log();
        let mut registry = sim.build();

        registry
            .dispatch(ActuatorCommand::extend(SolenoidId::Aligner))
            .unwrap();
        clock.sleep(Duration::from_millis(250));
        registry
            .dispatch(ActuatorCommand::retract(SolenoidId::Aligner))
            .unwrap();

        assert_eq!(
            log.solenoid_history(SolenoidId::Aligner),
            vec![
                (Duration::ZERO, true),
                (Duration::from_millis(250), false)
            ]
        );
    }

    #[test]
    fn sim_motor_clamps_and_records() {
        let log = ActuationLog::new();
        let mut motor = SimMotor::new(RollerId::Intake, SimClock::new(), log.clone());
        motor.set_power(200.0).unwrap();
        assert!((motor.power() - 127.0).abs() < f64::EPSILON);
        assert_eq!(log.records().len(), 1);
    }

    #[test]
    fn scripted_range_sensor_repeats_last_reading() {
        let mut sensor = SimRangeSensor::scripted(vec![500, 300]);
        assert_eq!(sensor.distance_mm(), Ok(500));
        assert_eq!(sensor.distance_mm(), Ok(300));
        assert_eq!(sensor.distance_mm(), Ok(300));
    }

    #[test]
    fn disconnected_range_sensor_faults() {
        let mut sensor = SimRangeSensor::disconnected();
        assert!(matches!(
            sensor.distance_mm(),
            Err(BotError::SensorFault { .. })
        ));
    }

    #[test]
    fn sim_chassis_tracks_busy_state() {
        let clock = SimClock::new();
        let mut chassis = SimChassis::new(clock.clone()).with_motion_time(Duration::from_millis(400));
        assert!(chassis.is_idle());

        chassis
            .drive_to(DriveTarget::Distance { inches: 10.0 }, 110.0)
            .unwrap();
        assert!(!chassis.is_idle());

        chassis.wait_chainable();
        assert!(!chassis.is_idle());
        assert_eq!(clock.now(), Duration::from_millis(200));

        chassis.wait_settled();
        assert!(chassis.is_idle());
        assert_eq!(clock.now(), Duration::from_millis(400));
    }

    #[test]
    fn sim_chassis_motion_progresses_while_waiting_elsewhere() {
        let clock = SimClock::new();
        let mut chassis = SimChassis::new(clock.clone()).with_motion_time(Duration::from_millis(400));
        chassis
            .turn_to(TurnTarget::Relative { degrees: 30.0 }, 100.0)
            .unwrap();
        clock.sleep(Duration::from_millis(300));
        chassis.wait_chainable();
        assert_eq!(clock.now(), Duration::from_millis(300));
        chassis.wait_settled();
        assert_eq!(clock.now(), Duration::from_millis(400));
    }

    #[test]
    fn sim_chassis_probe_sees_records_after_boxing() {
        let chassis = SimChassis::new(SimClock::new());
        let probe = chassis.probe();
        let mut boxed: Box<dyn Chassis> = Box::new(chassis);

        boxed.set_tank_power(60.0, 60.0).unwrap();
        boxed.set_brake_mode(BrakeMode::Hold).unwrap();

        assert_eq!(probe.tank_powers(), vec![(60.0, 60.0)]);
        assert_eq!(probe.last_brake_mode(), Some(BrakeMode::Hold));
    }

    #[test]
    fn sim_chassis_relative_turns_accumulate_heading() {
        let mut chassis = SimChassis::new(SimClock::new());
        chassis
            .turn_to(TurnTarget::Relative { degrees: 90.0 }, 100.0)
            .unwrap();
        chassis
            .turn_to(TurnTarget::Relative { degrees: -135.0 }, 100.0)
            .unwrap();
        assert!((chassis.pose().heading_deg + 45.0).abs() < 1e-9);
    }
}
