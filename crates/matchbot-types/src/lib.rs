use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Full-scale magnitude of a motor power command.
///
/// Every motor output in the robot (drive sides and rollers) accepts a signed
/// command in `[-MAX_POWER, MAX_POWER]`.
pub const MAX_POWER: f64 = 127.0;

/// Millimetres per inch, used wherever ranging readings meet motion targets.
pub const MM_PER_INCH: f64 = 25.4;

/// Motor behaviour when commanded power is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrakeMode {
    /// Motor freewheels.
    #[default]
    Coast,
    /// Motor shorts its windings to slow down.
    Brake,
    /// Motor actively resists any displacement from its current position.
    Hold,
}

/// A pneumatic solenoid on the robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolenoidId {
    Matchload,
    RightDescore,
    MiddleGoal,
    Hood,
    Aligner,
}

impl SolenoidId {
    pub const ALL: [SolenoidId; 5] = [
        SolenoidId::Matchload,
        SolenoidId::RightDescore,
        SolenoidId::MiddleGoal,
        SolenoidId::Hood,
        SolenoidId::Aligner,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SolenoidId::Matchload => "matchload_piston",
            SolenoidId::RightDescore => "right_descore_piston",
            SolenoidId::MiddleGoal => "middle_goal_piston",
            SolenoidId::Hood => "hood_piston",
            SolenoidId::Aligner => "aligner_piston",
        }
    }
}

impl fmt::Display for SolenoidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A roller motor that moves game pieces through the robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollerId {
    Intake,
    Hood,
}

impl RollerId {
    pub const ALL: [RollerId; 2] = [RollerId::Intake, RollerId::Hood];

    pub fn as_str(&self) -> &'static str {
        match self {
            RollerId::Intake => "intake",
            RollerId::Hood => "hood_motor",
        }
    }
}

impl fmt::Display for RollerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single physical write to a mechanism device.
///
/// `matchbot-kernel` produces these from mechanism transitions and
/// `matchbot-hal` routes them to the registered driver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "device", rename_all = "snake_case")]
pub enum ActuatorCommand {
    /// Extend (`true`) or retract (`false`) a solenoid.
    Solenoid { solenoid: SolenoidId, extended: bool },
    /// Spin a roller at a signed power in `[-127, 127]`.
    Roller { roller: RollerId, power: f64 },
    /// Change a roller's brake mode.
    RollerBrake { roller: RollerId, mode: BrakeMode },
}

impl ActuatorCommand {
    pub fn extend(solenoid: SolenoidId) -> Self {
        ActuatorCommand::Solenoid {
            solenoid,
            extended: true,
        }
    }

    pub fn retract(solenoid: SolenoidId) -> Self {
        ActuatorCommand::Solenoid {
            solenoid,
            extended: false,
        }
    }

    pub fn roller(roller: RollerId, power: f64) -> Self {
        ActuatorCommand::Roller { roller, power }
    }
}

/// A point on the field in inches.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A field pose: position in inches and heading in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub heading_deg: f64,
}

impl Pose {
    pub const ORIGIN: Pose = Pose {
        x: 0.0,
        y: 0.0,
        heading_deg: 0.0,
    };
}

/// Which way the robot faces while travelling to a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

/// One waypoint of an odometry path.
///
/// A waypoint without a heading is a pure-pursuit point; with a heading the
/// drivetrain controller approaches it boomerang-style.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub point: Point,
    pub heading_deg: Option<f64>,
    pub direction: Direction,
    pub speed: f64,
}

/// A translation request for the external drivetrain controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DriveTarget {
    /// Drive a signed distance along the current heading using encoder PID.
    Distance { inches: f64 },
    /// Drive a signed distance along the current heading using odometry.
    OdomDistance { inches: f64 },
    /// Follow odometry waypoints in the global frame.
    Path { waypoints: Vec<Waypoint> },
}

/// A rotation request for the external drivetrain controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnTarget {
    /// Turn by a signed number of degrees from the current heading.
    Relative { degrees: f64 },
    /// Turn to an absolute heading in the odometry frame.
    Absolute { degrees: f64 },
}

/// Gains of one PID loop in the drivetrain controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    /// Error band in which the integral accumulates. `0` means always.
    #[serde(default)]
    pub start_i: f64,
}

impl PidGains {
    pub const fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            start_i: 0.0,
        }
    }
}

/// Exit conditions of one motion type.
///
/// `small_*` and `big_*` are the precise and coarse settle bands; the motion
/// exits once error has stayed inside a band for its timeout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExitConditions {
    pub small_exit_ms: u64,
    pub small_error: f64,
    pub big_exit_ms: u64,
    pub big_error: f64,
    pub velocity_exit_ms: u64,
    pub stall_exit_ms: u64,
}

/// Slew limiting at the start of a motion: power ramps up over `distance`
/// starting from `min_power`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Slew {
    pub distance: f64,
    pub min_power: f64,
}

/// Opaque tuning for the external drivetrain controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveTuning {
    pub drive: PidGains,
    pub heading: PidGains,
    pub turn: PidGains,
    pub swing: PidGains,
    pub drive_exit: ExitConditions,
    pub turn_exit: ExitConditions,
    pub swing_exit: ExitConditions,
    pub drive_slew: Slew,
    pub turn_slew: Slew,
    pub swing_slew: Slew,
    /// Inches from target at which a chained drive releases.
    pub drive_chain_in: f64,
    /// Degrees from target at which a chained turn releases.
    pub turn_chain_deg: f64,
}

impl Default for DriveTuning {
    fn default() -> Self {
        let angular_exit = ExitConditions {
            small_exit_ms: 90,
            small_error: 3.0,
            big_exit_ms: 250,
            big_error: 7.0,
            velocity_exit_ms: 500,
            stall_exit_ms: 500,
        };
        Self {
            drive: PidGains::new(20.0, 0.0, 100.0),
            heading: PidGains::new(11.0, 0.0, 20.0),
            turn: PidGains {
                kp: 3.0,
                ki: 0.05,
                kd: 20.0,
                start_i: 15.0,
            },
            swing: PidGains::new(6.0, 0.0, 65.0),
            drive_exit: ExitConditions {
                small_exit_ms: 90,
                small_error: 1.0,
                big_exit_ms: 250,
                big_error: 3.0,
                velocity_exit_ms: 500,
                stall_exit_ms: 500,
            },
            turn_exit: angular_exit,
            swing_exit: angular_exit,
            drive_slew: Slew {
                distance: 3.0,
                min_power: 70.0,
            },
            turn_slew: Slew {
                distance: 5.0,
                min_power: 50.0,
            },
            swing_slew: Slew {
                distance: 3.0,
                min_power: 80.0,
            },
            drive_chain_in: 3.0,
            turn_chain_deg: 5.0,
        }
    }
}

/// Global error type for hardware access.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BotError {
    #[error("Hardware Fault on {component}: {details}")]
    HardwareFault { component: String, details: String },

    #[error("Device not registered: {0}")]
    NotRegistered(String),

    #[error("Sensor Fault on {sensor}: {details}")]
    SensorFault { sensor: String, details: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actuator_command_serializes_with_device_tag() {
        let cmd = ActuatorCommand::extend(SolenoidId::Aligner);
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains("\"device\":\"solenoid\""));
        assert!(json.contains("\"aligner\""));
        let back: ActuatorCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cmd);
    }

    #[test]
    fn default_tuning_matches_competition_constants() {
        let tuning = DriveTuning::default();
        assert_eq!(tuning.drive, PidGains::new(20.0, 0.0, 100.0));
        assert!((tuning.turn.start_i - 15.0).abs() < f64::EPSILON);
        assert_eq!(tuning.drive_exit.small_exit_ms, 90);
        assert!((tuning.drive_chain_in - 3.0).abs() < f64::EPSILON);
        assert!((tuning.turn_chain_deg - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_tuning_fills_defaults() {
        let tuning: DriveTuning = serde_json::from_str(r#"{"drive_chain_in": 2.0}"#).unwrap();
        assert!((tuning.drive_chain_in - 2.0).abs() < f64::EPSILON);
        assert_eq!(tuning.heading, DriveTuning::default().heading);
    }

    #[test]
    fn device_names_match_wiring_labels() {
        assert_eq!(SolenoidId::Matchload.to_string(), "matchload_piston");
        assert_eq!(RollerId::Hood.to_string(), "hood_motor");
    }

    #[test]
    fn bot_error_display() {
        let err = BotError::HardwareFault {
            component: "intake".to_string(),
            details: "overtemp".to_string(),
        };
        assert!(err.to_string().contains("intake"));
        assert!(BotError::NotRegistered("aligner_piston".into())
            .to_string()
            .contains("aligner_piston"));
    }
}
