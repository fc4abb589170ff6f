//! Mechanism identities, their activation flags, and the events that change
//! them.

use std::fmt;

use matchbot_types::SolenoidId;
use serde::{Deserialize, Serialize};

/// An operator-facing mechanism with a single on/off flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mechanism {
    Matchload,
    RightDescore,
    MiddleGoal,
    TopOutake,
    BottomIntake,
    Aligner,
}

impl Mechanism {
    pub const ALL: [Mechanism; 6] = [
        Mechanism::Matchload,
        Mechanism::RightDescore,
        Mechanism::MiddleGoal,
        Mechanism::TopOutake,
        Mechanism::BottomIntake,
        Mechanism::Aligner,
    ];

    /// The mechanism whose flag mirrors `solenoid`, if any.  The hood piston
    /// is shared by several mechanisms and has no flag of its own.
    pub fn for_solenoid(solenoid: SolenoidId) -> Option<Mechanism> {
        match solenoid {
            SolenoidId::Matchload => Some(Mechanism::Matchload),
            SolenoidId::RightDescore => Some(Mechanism::RightDescore),
            SolenoidId::MiddleGoal => Some(Mechanism::MiddleGoal),
            SolenoidId::Aligner => Some(Mechanism::Aligner),
            SolenoidId::Hood => None,
        }
    }
}

impl fmt::Display for Mechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mechanism::Matchload => "matchload",
            Mechanism::RightDescore => "right_descore",
            Mechanism::MiddleGoal => "middle_goal",
            Mechanism::TopOutake => "top_outake",
            Mechanism::BottomIntake => "bottom_intake",
            Mechanism::Aligner => "aligner",
        };
        f.write_str(name)
    }
}

/// Activation flag of every mechanism.
///
/// Lives for the whole process, so whatever autonomous leaves behind is what
/// the operator starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MechanismState {
    pub matchload: bool,
    pub right_descore: bool,
    pub middle_goal: bool,
    pub top_outake: bool,
    pub bottom_intake: bool,
    pub aligner: bool,
}

impl MechanismState {
    pub fn is_active(&self, mechanism: Mechanism) -> bool {
        match mechanism {
            Mechanism::Matchload => self.matchload,
            Mechanism::RightDescore => self.right_descore,
            Mechanism::MiddleGoal => self.middle_goal,
            Mechanism::TopOutake => self.top_outake,
            Mechanism::BottomIntake => self.bottom_intake,
            Mechanism::Aligner => self.aligner,
        }
    }

    pub fn set(&mut self, mechanism: Mechanism, active: bool) {
        let flag = match mechanism {
            Mechanism::Matchload => &mut self.matchload,
            Mechanism::RightDescore => &mut self.right_descore,
            Mechanism::MiddleGoal => &mut self.middle_goal,
            Mechanism::TopOutake => &mut self.top_outake,
            Mechanism::BottomIntake => &mut self.bottom_intake,
            Mechanism::Aligner => &mut self.aligner,
        };
        *flag = active;
    }

    /// Mechanisms whose flag is set, in [`Mechanism::ALL`] order.
    pub fn active(&self) -> Vec<Mechanism> {
        Mechanism::ALL
            .into_iter()
            .filter(|m| self.is_active(*m))
            .collect()
    }
}

/// Something that asks the mechanisms to change.
///
/// The first four come from the operator; the rest are the shorthand used by
/// autonomous scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "target", rename_all = "snake_case")]
pub enum MechanismEvent {
    /// Flip a mechanism: activate when inactive, deactivate when active.
    Toggle(Mechanism),
    /// Activate; no-op when already active.
    Activate(Mechanism),
    /// Deactivate; no-op when already inactive.
    Deactivate(Mechanism),
    /// Stop both rollers and drop the hood.
    StopRollers,
    /// Run the intake inward with the intake motor coasting.
    IntakeIn,
    /// Run the intake outward.
    IntakeOut,
    /// Stop the hood roller and retract the hood so pieces stay in the robot.
    TopIntake,
    /// Score through the top: hood up, both rollers feeding.
    TopScore,
    /// Score into the middle goal.
    MiddleGoalScore,
    /// Extend a single solenoid.
    Extend(SolenoidId),
    /// Retract a single solenoid.
    Retract(SolenoidId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_all_inactive() {
        let state = MechanismState::default();
        assert!(state.active().is_empty());
    }

    #[test]
    fn set_and_read_every_flag() {
        let mut state = MechanismState::default();
        for m in Mechanism::ALL {
            state.set(m, true);
            assert!(state.is_active(m), "{m} should be active");
        }
        assert_eq!(state.active().len(), 6);
        state.set(Mechanism::TopOutake, false);
        assert!(!state.top_outake);
    }

    #[test]
    fn hood_has_no_flag() {
        assert_eq!(Mechanism::for_solenoid(SolenoidId::Hood), None);
        assert_eq!(
            Mechanism::for_solenoid(SolenoidId::Aligner),
            Some(Mechanism::Aligner)
        );
    }
}
