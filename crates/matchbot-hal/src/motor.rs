//! Generic `Motor` trait for the roller motors.
//!
//! Drivers implement this trait and register themselves with a
//! [`HardwareRegistry`][crate::registry::HardwareRegistry] under a
//! [`RollerId`].  Mechanism logic only ever talks to the trait, so a V5 smart
//! motor, a simulated motor and a test double are interchangeable.

use matchbot_types::{BotError, BrakeMode, RollerId, MAX_POWER};

/// An open-loop motor driven by a signed power command.
pub trait Motor: Send + Sync {
    /// Which roller this motor spins.
    fn id(&self) -> RollerId;

    /// Command a signed power in `[-127, 127]`.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::HardwareFault`] if the command cannot be applied
    /// (e.g. the motor is disconnected or over temperature).
    fn set_power(&mut self, power: f64) -> Result<(), BotError>;

    /// Change how the motor behaves at zero power.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::HardwareFault`] if the mode cannot be applied.
    fn set_brake_mode(&mut self, mode: BrakeMode) -> Result<(), BotError>;

    /// The most recently commanded power.
    fn power(&self) -> f64;
}

/// Clamp a requested power to the motor command range.
pub fn clamp_power(power: f64) -> f64 {
    power.clamp(-MAX_POWER, MAX_POWER)
}
