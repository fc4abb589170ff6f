//! Generic `Solenoid` trait for the pneumatic pistons (matchload, aligner,
//! descore, middle goal, hood).

use matchbot_types::{BotError, SolenoidId};

/// A two-position pneumatic actuator.
///
/// Drivers implement this trait and register themselves with a
/// [`HardwareRegistry`][crate::registry::HardwareRegistry].
pub trait Solenoid: Send + Sync {
    /// Which piston this solenoid drives.
    fn id(&self) -> SolenoidId;

    /// Extend (`true`) or retract (`false`) the piston.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::HardwareFault`] if the command cannot be applied.
    fn set_extended(&mut self, extended: bool) -> Result<(), BotError>;

    /// The most recently commanded position (`true` = extended).
    fn extended(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockSolenoid {
        extended: bool,
    }

    impl Solenoid for MockSolenoid {
        fn id(&self) -> SolenoidId {
            SolenoidId::Aligner
        }

        fn set_extended(&mut self, extended: bool) -> Result<(), BotError> {
            self.extended = extended;
            Ok(())
        }

        fn extended(&self) -> bool {
            self.extended
        }
    }

    #[test]
    fn mock_solenoid_toggle() {
        let mut piston = MockSolenoid { extended: false };
        assert_eq!(piston.id(), SolenoidId::Aligner);
        assert!(!piston.extended());

        piston.set_extended(true).unwrap();
        assert!(piston.extended());

        piston.set_extended(false).unwrap();
        assert!(!piston.extended());
    }
}
