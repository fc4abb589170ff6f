//! Interface to the external drivetrain motion controller.
//!
//! The controller owns PID, odometry and motion chaining.  It runs its own
//! control loop in the background: motion requests return as soon as they
//! are queued, and the `wait_*` calls block until one of its exit conditions
//! fires.  The raw [`Chassis::set_tank_power`] override bypasses that loop and
//! must only be used while [`Chassis::is_idle`] is `true`.

use matchbot_types::{BotError, BrakeMode, DriveTarget, DriveTuning, Point, Pose, TurnTarget};

pub trait Chassis: Send {
    /// Queue a translation at `speed` (command units, `0..=127`).
    ///
    /// # Errors
    ///
    /// Returns [`BotError::HardwareFault`] if the controller rejects the request.
    fn drive_to(&mut self, target: DriveTarget, speed: f64) -> Result<(), BotError>;

    /// Queue a rotation at `speed` (command units, `0..=127`).
    ///
    /// # Errors
    ///
    /// Returns [`BotError::HardwareFault`] if the controller rejects the request.
    fn turn_to(&mut self, target: TurnTarget, speed: f64) -> Result<(), BotError>;

    /// Block until the active motion is inside its precise exit band.
    fn wait_settled(&mut self);

    /// Block until the active motion crosses its chain threshold.  The
    /// controller keeps converging in the background.
    fn wait_chainable(&mut self);

    /// Block until the robot passes within the controller's tolerance of
    /// `point` while the active motion continues.
    fn wait_until(&mut self, point: Point);

    /// Zero accumulated drive sensors and clear any queued targets.
    fn reset_pose_and_sensors(&mut self);

    /// Overwrite the odometry pose.
    fn set_pose(&mut self, pose: Pose);

    /// `true` when no motion request is executing.
    fn is_idle(&self) -> bool;

    /// Write raw power to both sides, bypassing the controller.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::HardwareFault`] if the drive motors reject the write.
    fn set_tank_power(&mut self, left: f64, right: f64) -> Result<(), BotError>;

    /// Change the brake mode of every drive motor.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::HardwareFault`] if the drive motors reject the mode.
    fn set_brake_mode(&mut self, mode: BrakeMode) -> Result<(), BotError>;

    /// Replace the controller's gains, exit conditions and slew limits.
    fn apply_tuning(&mut self, tuning: &DriveTuning);
}
