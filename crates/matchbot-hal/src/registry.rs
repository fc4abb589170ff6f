//! [`HardwareRegistry`] – mechanism driver registry and command dispatcher.
//!
//! The registry stores every registered [`Solenoid`] and roller [`Motor`]
//! keyed by its identifier.  When the mechanism coordinator issues an
//! [`ActuatorCommand`], the registry resolves the target driver and calls the
//! matching trait method.  The drivetrain is not in here: it belongs to the
//! external motion controller behind [`Chassis`][crate::chassis::Chassis].

use std::collections::BTreeMap;

use matchbot_types::{ActuatorCommand, BotError, RollerId, SolenoidId};
use tracing::trace;

use crate::motor::{clamp_power, Motor};
use crate::solenoid::Solenoid;

/// Central mechanism driver registry and [`ActuatorCommand`] dispatcher.
#[derive(Default)]
pub struct HardwareRegistry {
    solenoids: BTreeMap<SolenoidId, Box<dyn Solenoid>>,
    rollers: BTreeMap<RollerId, Box<dyn Motor>>,
}

impl HardwareRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a solenoid driver.  Any previously registered driver with the
    /// same id is replaced.
    pub fn register_solenoid(&mut self, solenoid: Box<dyn Solenoid>) {
        self.solenoids.insert(solenoid.id(), solenoid);
    }

    /// Register a roller motor driver.  Any previously registered driver with
    /// the same id is replaced.
    pub fn register_roller(&mut self, motor: Box<dyn Motor>) {
        self.rollers.insert(motor.id(), motor);
    }

    /// Route a command to its driver.
    ///
    /// Roller power is clamped to `[-127, 127]` before it reaches the driver.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::NotRegistered`] when the target driver is missing,
    /// or the driver's own error when the write fails.
    pub fn dispatch(&mut self, command: ActuatorCommand) -> Result<(), BotError> {
        trace!(?command, "dispatch");
        match command {
            ActuatorCommand::Solenoid { solenoid, extended } => self
                .solenoids
                .get_mut(&solenoid)
                .ok_or_else(|| BotError::NotRegistered(solenoid.to_string()))?
                .set_extended(extended),
            ActuatorCommand::Roller { roller, power } => {
                self.roller_mut(roller)?.set_power(clamp_power(power))
            }
            ActuatorCommand::RollerBrake { roller, mode } => {
                self.roller_mut(roller)?.set_brake_mode(mode)
            }
        }
    }

    /// Last commanded position of a solenoid, `None` if unregistered.
    pub fn solenoid_extended(&self, id: SolenoidId) -> Option<bool> {
        self.solenoids.get(&id).map(|s| s.extended())
    }

    /// Last commanded power of a roller, `None` if unregistered.
    pub fn roller_power(&self, id: RollerId) -> Option<f64> {
        self.rollers.get(&id).map(|m| m.power())
    }

    /// Every solenoid currently commanded extended, in id order.
    pub fn extended_solenoids(&self) -> Vec<SolenoidId> {
        self.solenoids
            .iter()
            .filter(|(_, s)| s.extended())
            .map(|(id, _)| *id)
            .collect()
    }

    fn roller_mut(&mut self, id: RollerId) -> Result<&mut Box<dyn Motor>, BotError> {
        self.rollers
            .get_mut(&id)
            .ok_or_else(|| BotError::NotRegistered(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matchbot_types::BrakeMode;

    struct MockSolenoid {
        id: SolenoidId,
        extended: bool,
    }
    impl MockSolenoid {
        fn new(id: SolenoidId) -> Box<Self> {
            Box::new(Self {
                id,
                extended: false,
            })
        }
    }
    impl Solenoid for MockSolenoid {
        fn id(&self) -> SolenoidId {
            self.id
        }
        fn set_extended(&mut self, extended: bool) -> Result<(), BotError> {
            self.extended = extended;
            Ok(())
        }
        fn extended(&self) -> bool {
            self.extended
        }
    }

    struct MockMotor {
        id: RollerId,
        power: f64,
        brake: BrakeMode,
    }
    impl MockMotor {
        fn new(id: RollerId) -> Box<Self> {
            Box::new(Self {
                id,
                power: 0.0,
                brake: BrakeMode::Coast,
            })
        }
    }
    impl Motor for MockMotor {
        fn id(&self) -> RollerId {
            self.id
        }
        fn set_power(&mut self, power: f64) -> Result<(), BotError> {
            self.power = power;
            Ok(())
        }
        fn set_brake_mode(&mut self, mode: BrakeMode) -> Result<(), BotError> {
            self.brake = mode;
            Ok(())
        }
        fn power(&self) -> f64 {
            self.power
        }
    }

    struct BrokenSolenoid;
    impl Solenoid for BrokenSolenoid {
        fn id(&self) -> SolenoidId {
            SolenoidId::Hood
        }
        fn set_extended(&mut self, _extended: bool) -> Result<(), BotError> {
            Err(BotError::HardwareFault {
                component: "hood_piston".into(),
                details: "no air".into(),
            })
        }
        fn extended(&self) -> bool {
            false
        }
    }

    #[test]
    fn dispatch_solenoid() {
        let mut registry = HardwareRegistry::new();
        registry.register_solenoid(MockSolenoid::new(SolenoidId::Aligner));

        registry
            .dispatch(ActuatorCommand::extend(SolenoidId::Aligner))
            .unwrap();
        assert_eq!(registry.solenoid_extended(SolenoidId::Aligner), Some(true));
        assert_eq!(registry.extended_solenoids(), vec![SolenoidId::Aligner]);

        registry
            .dispatch(ActuatorCommand::retract(SolenoidId::Aligner))
            .unwrap();
        assert!(registry.extended_solenoids().is_empty());
    }

    #[test]
    fn dispatch_roller_clamps_power() {
        let mut registry = HardwareRegistry::new();
        registry.register_roller(MockMotor::new(RollerId::Intake));

        registry
            .dispatch(ActuatorCommand::roller(RollerId::Intake, -500.0))
            .unwrap();
        assert_eq!(registry.roller_power(RollerId::Intake), Some(-127.0));
    }

    #[test]
    fn dispatch_roller_brake() {
        let mut registry = HardwareRegistry::new();
        registry.register_roller(MockMotor::new(RollerId::Intake));
        registry
            .dispatch(ActuatorCommand::RollerBrake {
                roller: RollerId::Intake,
                mode: BrakeMode::Coast,
            })
            .unwrap();
    }

    #[test]
    fn dispatch_missing_solenoid_returns_error() {
        let mut registry = HardwareRegistry::new();
        let result = registry.dispatch(ActuatorCommand::extend(SolenoidId::Matchload));
        assert!(matches!(result, Err(BotError::NotRegistered(_))));
        assert_eq!(registry.solenoid_extended(SolenoidId::Matchload), None);
    }

    #[test]
    fn dispatch_missing_roller_returns_error() {
        let mut registry = HardwareRegistry::new();
        let result = registry.dispatch(ActuatorCommand::roller(RollerId::Hood, 10.0));
        assert!(matches!(result, Err(BotError::NotRegistered(_))));
    }

    #[test]
    fn driver_errors_are_returned() {
        let mut registry = HardwareRegistry::new();
        registry.register_solenoid(Box::new(BrokenSolenoid));
        let result = registry.dispatch(ActuatorCommand::extend(SolenoidId::Hood));
        assert!(matches!(result, Err(BotError::HardwareFault { .. })));
    }

    #[test]
    fn re_registering_replaces_old_driver() {
        let mut registry = HardwareRegistry::new();
        registry.register_solenoid(MockSolenoid::new(SolenoidId::Hood));
        registry
            .dispatch(ActuatorCommand::extend(SolenoidId::Hood))
            .unwrap();

        registry.register_solenoid(MockSolenoid::new(SolenoidId::Hood));
        assert_eq!(registry.solenoid_extended(SolenoidId::Hood), Some(false));
    }
}
