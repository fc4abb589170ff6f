//! Pure mechanism transitions.
//!
//! [`transition`] maps `(state, event)` to the next [`MechanismState`] and
//! the ordered device writes that get there.  Nothing here touches hardware
//! or sleeps, so every cross-mechanism rule can be checked directly.
//!
//! # Interlocks
//!
//! The matchload and aligner pistons share space: one is always retracted
//! and [`SETTLE_DELAY`] allowed to pass before the other extends.  Every
//! other cross-mechanism rule is flag bookkeeping only; clearing another
//! mechanism's flag does not necessarily switch its hardware off.

use std::time::Duration;

use matchbot_types::{ActuatorCommand, BrakeMode, RollerId, SolenoidId, MAX_POWER};
use serde::Serialize;

use crate::mechanism::{Mechanism, MechanismEvent, MechanismState};

/// Time the matchload/aligner pistons need to clear each other.
pub const SETTLE_DELAY: Duration = Duration::from_millis(250);

/// Roller power that pulls pieces into the robot (and up through the hood).
const INWARD: f64 = -MAX_POWER;
/// Roller power that pushes pieces back out.
const OUTWARD: f64 = MAX_POWER;

/// One step of executing a transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MechanismCommand {
    Actuate(ActuatorCommand),
    /// Block for the given time before the next write.
    Settle(Duration),
}

/// The result of applying one event.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: MechanismState,
    pub commands: Vec<MechanismCommand>,
}

impl Transition {
    fn start(state: MechanismState) -> Self {
        Self {
            state,
            commands: Vec::new(),
        }
    }

    /// `true` when the event changed neither flags nor hardware.
    pub fn is_noop(&self, previous: &MechanismState) -> bool {
        self.commands.is_empty() && self.state == *previous
    }

    fn write(&mut self, command: ActuatorCommand) -> &mut Self {
        self.commands.push(MechanismCommand::Actuate(command));
        self
    }

    fn extend(&mut self, solenoid: SolenoidId) -> &mut Self {
        self.write(ActuatorCommand::extend(solenoid))
    }

    fn retract(&mut self, solenoid: SolenoidId) -> &mut Self {
        self.write(ActuatorCommand::retract(solenoid))
    }

    fn roller(&mut self, roller: RollerId, power: f64) -> &mut Self {
        self.write(ActuatorCommand::roller(roller, power))
    }

    fn settle(&mut self) -> &mut Self {
        self.commands.push(MechanismCommand::Settle(SETTLE_DELAY));
        self
    }

    fn flag(&mut self, mechanism: Mechanism, active: bool) -> &mut Self {
        self.state.set(mechanism, active);
        self
    }
}

/// Apply `event` to `state`.
pub fn transition(state: MechanismState, event: MechanismEvent) -> Transition {
    let mut t = Transition::start(state);
    match event {
        MechanismEvent::Toggle(m) if state.is_active(m) => deactivate(&mut t, m),
        MechanismEvent::Toggle(m) => activate(&mut t, m),
        MechanismEvent::Activate(m) if !state.is_active(m) => activate(&mut t, m),
        MechanismEvent::Deactivate(m) if state.is_active(m) => deactivate(&mut t, m),
        MechanismEvent::Activate(_) | MechanismEvent::Deactivate(_) => {}
        MechanismEvent::StopRollers => {
            t.roller(RollerId::Intake, 0.0)
                .roller(RollerId::Hood, 0.0)
                .retract(SolenoidId::Hood)
                .flag(Mechanism::BottomIntake, false)
                .flag(Mechanism::TopOutake, false);
        }
        MechanismEvent::IntakeIn => {
            t.roller(RollerId::Intake, INWARD)
                .write(ActuatorCommand::RollerBrake {
                    roller: RollerId::Intake,
                    mode: BrakeMode::Coast,
                })
                .flag(Mechanism::BottomIntake, true);
        }
        MechanismEvent::IntakeOut => {
            t.roller(RollerId::Intake, OUTWARD)
                .flag(Mechanism::BottomIntake, false);
        }
        MechanismEvent::TopIntake => {
            t.roller(RollerId::Hood, 0.0)
                .retract(SolenoidId::Hood)
                .flag(Mechanism::TopOutake, false);
        }
        MechanismEvent::TopScore => {
            t.roller(RollerId::Hood, INWARD)
                .extend(SolenoidId::Hood)
                .retract(SolenoidId::Matchload)
                .retract(SolenoidId::MiddleGoal)
                .roller(RollerId::Intake, INWARD)
                .flag(Mechanism::TopOutake, true)
                .flag(Mechanism::Matchload, false)
                .flag(Mechanism::MiddleGoal, false)
                .flag(Mechanism::BottomIntake, true);
        }
        MechanismEvent::MiddleGoalScore => score_middle(&mut t),
        MechanismEvent::Extend(solenoid) => {
            if let Some(peer) = interlocked_peer(solenoid)
                && state.is_active(peer)
            {
                t.retract(peer_solenoid(peer)).flag(peer, false).settle();
            }
            t.extend(solenoid);
            if let Some(m) = Mechanism::for_solenoid(solenoid) {
                t.flag(m, true);
            }
        }
        MechanismEvent::Retract(solenoid) => {
            t.retract(solenoid);
            if let Some(m) = Mechanism::for_solenoid(solenoid) {
                t.flag(m, false);
            }
        }
    }
    t
}

fn activate(t: &mut Transition, mechanism: Mechanism) {
    match mechanism {
        Mechanism::Matchload => {
            t.retract(SolenoidId::Aligner)
                .flag(Mechanism::Aligner, false)
                .settle()
                .extend(SolenoidId::Matchload)
                .flag(Mechanism::Matchload, true)
                .retract(SolenoidId::MiddleGoal)
                .flag(Mechanism::MiddleGoal, false)
                .flag(Mechanism::TopOutake, false)
                .flag(Mechanism::BottomIntake, true)
                .roller(RollerId::Intake, INWARD)
                .retract(SolenoidId::Hood)
                .roller(RollerId::Hood, 0.0);
        }
        Mechanism::Aligner => {
            t.retract(SolenoidId::Matchload)
                .flag(Mechanism::Matchload, false)
                .settle()
                .extend(SolenoidId::Aligner)
                .flag(Mechanism::Aligner, true);
        }
        Mechanism::MiddleGoal => score_middle(t),
        Mechanism::TopOutake => {
            let matchload_was_out = t.state.matchload;
            t.roller(RollerId::Hood, INWARD)
                .extend(SolenoidId::Hood)
                .retract(SolenoidId::MiddleGoal)
                .retract(SolenoidId::Matchload);
            if matchload_was_out {
                t.settle();
            }
            t.extend(SolenoidId::Aligner)
                .retract(SolenoidId::RightDescore)
                .roller(RollerId::Intake, INWARD)
                .flag(Mechanism::TopOutake, true)
                .flag(Mechanism::Aligner, true)
                .flag(Mechanism::RightDescore, false)
                .flag(Mechanism::MiddleGoal, false)
                .flag(Mechanism::Matchload, false)
                .flag(Mechanism::BottomIntake, true);
        }
        Mechanism::RightDescore => {
            t.extend(SolenoidId::RightDescore)
                .flag(Mechanism::RightDescore, true)
                .roller(RollerId::Hood, 0.0)
                .retract(SolenoidId::Hood)
                .flag(Mechanism::TopOutake, false);
        }
        Mechanism::BottomIntake => {
            t.roller(RollerId::Intake, INWARD)
                .flag(Mechanism::BottomIntake, true);
        }
    }
}

fn deactivate(t: &mut Transition, mechanism: Mechanism) {
    match mechanism {
        Mechanism::Matchload => {
            // Dropping the matchload hands the space back to the aligner.
            t.retract(SolenoidId::Matchload)
                .flag(Mechanism::Matchload, false)
                .settle()
                .extend(SolenoidId::Aligner)
                .flag(Mechanism::Aligner, true);
        }
        Mechanism::Aligner => {
            t.retract(SolenoidId::Aligner)
                .flag(Mechanism::Aligner, false);
        }
        Mechanism::MiddleGoal => {
            t.retract(SolenoidId::MiddleGoal)
                .flag(Mechanism::MiddleGoal, false);
        }
        Mechanism::TopOutake => {
            t.roller(RollerId::Hood, 0.0)
                .retract(SolenoidId::Hood)
                .flag(Mechanism::TopOutake, false);
        }
        Mechanism::RightDescore => {
            t.retract(SolenoidId::RightDescore)
                .flag(Mechanism::RightDescore, false);
        }
        Mechanism::BottomIntake => {
            t.roller(RollerId::Intake, OUTWARD)
                .flag(Mechanism::BottomIntake, false);
        }
    }
}

fn score_middle(t: &mut Transition) {
    t.extend(SolenoidId::MiddleGoal)
        .retract(SolenoidId::Hood)
        .roller(RollerId::Hood, INWARD)
        .roller(RollerId::Intake, INWARD)
        .flag(Mechanism::MiddleGoal, true)
        .flag(Mechanism::TopOutake, false)
        .flag(Mechanism::BottomIntake, false);
}

/// The mechanism that must be retracted before `solenoid` may extend.
fn interlocked_peer(solenoid: SolenoidId) -> Option<Mechanism> {
    match solenoid {
        SolenoidId::Matchload => Some(Mechanism::Aligner),
        SolenoidId::Aligner => Some(Mechanism::Matchload),
        _ => None,
    }
}

fn peer_solenoid(peer: Mechanism) -> SolenoidId {
    match peer {
        Mechanism::Aligner => SolenoidId::Aligner,
        _ => SolenoidId::Matchload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writes(t: &Transition) -> Vec<ActuatorCommand> {
        t.commands
            .iter()
            .filter_map(|c| match c {
                MechanismCommand::Actuate(a) => Some(*a),
                MechanismCommand::Settle(_) => None,
            })
            .collect()
    }

    fn position_of(t: &Transition, command: MechanismCommand) -> usize {
        t.commands
            .iter()
            .position(|c| *c == command)
            .unwrap_or_else(|| panic!("{command:?} not in {:?}", t.commands))
    }

    fn extend(id: SolenoidId) -> MechanismCommand {
        MechanismCommand::Actuate(ActuatorCommand::extend(id))
    }

    fn retract(id: SolenoidId) -> MechanismCommand {
        MechanismCommand::Actuate(ActuatorCommand::retract(id))
    }

    const SETTLE: MechanismCommand = MechanismCommand::Settle(SETTLE_DELAY);

    #[test]
    fn matchload_over_aligner_retracts_settles_then_extends() {
        let state = MechanismState {
            aligner: true,
            ..Default::default()
        };
        let t = transition(state, MechanismEvent::Toggle(Mechanism::Matchload));

        let off = position_of(&t, retract(SolenoidId::Aligner));
        let wait = position_of(&t, SETTLE);
        let on = position_of(&t, extend(SolenoidId::Matchload));
        assert!(off < wait && wait < on);

        assert!(t.state.matchload);
        assert!(!t.state.aligner);
        assert!(t.state.bottom_intake);
        assert!(!t.state.middle_goal);
        assert!(!t.state.top_outake);
        assert!(writes(&t).contains(&ActuatorCommand::roller(RollerId::Intake, -127.0)));
        assert!(writes(&t).contains(&ActuatorCommand::roller(RollerId::Hood, 0.0)));
    }

    #[test]
    fn aligner_over_matchload_retracts_settles_then_extends() {
        let state = MechanismState {
            matchload: true,
            ..Default::default()
        };
        let t = transition(state, MechanismEvent::Toggle(Mechanism::Aligner));
        assert_eq!(
            t.commands,
            vec![retract(SolenoidId::Matchload), SETTLE, extend(SolenoidId::Aligner)]
        );
        assert!(t.state.aligner && !t.state.matchload);
    }

    #[test]
    fn matchload_release_hands_over_to_aligner() {
        let state = MechanismState {
            matchload: true,
            ..Default::default()
        };
        let t = transition(state, MechanismEvent::Toggle(Mechanism::Matchload));
        assert_eq!(
            t.commands,
            vec![retract(SolenoidId::Matchload), SETTLE, extend(SolenoidId::Aligner)]
        );
        assert!(!t.state.matchload && t.state.aligner);
    }

    #[test]
    fn middle_goal_clears_outake_and_intake_flags() {
        let state = MechanismState {
            top_outake: true,
            bottom_intake: true,
            ..Default::default()
        };
        let t = transition(state, MechanismEvent::Toggle(Mechanism::MiddleGoal));
        assert!(t.state.middle_goal);
        assert!(!t.state.top_outake);
        assert!(!t.state.bottom_intake);
        assert_eq!(
            writes(&t),
            vec![
                ActuatorCommand::extend(SolenoidId::MiddleGoal),
                ActuatorCommand::retract(SolenoidId::Hood),
                ActuatorCommand::roller(RollerId::Hood, -127.0),
                ActuatorCommand::roller(RollerId::Intake, -127.0),
            ]
        );
    }

    #[test]
    fn top_outake_forces_aligner_out_and_peers_off() {
        let state = MechanismState {
            right_descore: true,
            middle_goal: true,
            ..Default::default()
        };
        let t = transition(state, MechanismEvent::Toggle(Mechanism::TopOutake));
        assert!(t.state.top_outake);
        assert!(t.state.aligner);
        assert!(t.state.bottom_intake);
        assert!(!t.state.right_descore);
        assert!(!t.state.middle_goal);
        assert!(!t.state.matchload);
        assert!(!t.commands.contains(&SETTLE));
        let w = writes(&t);
        assert!(w.contains(&ActuatorCommand::extend(SolenoidId::Hood)));
        assert!(w.contains(&ActuatorCommand::retract(SolenoidId::RightDescore)));
        assert!(w.contains(&ActuatorCommand::extend(SolenoidId::Aligner)));
    }

    #[test]
    fn top_outake_settles_when_matchload_was_out() {
        let state = MechanismState {
            matchload: true,
            ..Default::default()
        };
        let t = transition(state, MechanismEvent::Toggle(Mechanism::TopOutake));
        let off = position_of(&t, retract(SolenoidId::Matchload));
        let wait = position_of(&t, SETTLE);
        let on = position_of(&t, extend(SolenoidId::Aligner));
        assert!(off < wait && wait < on);
    }

    #[test]
    fn top_outake_release_only_stops_hood() {
        let state = MechanismState {
            top_outake: true,
            aligner: true,
            bottom_intake: true,
            ..Default::default()
        };
        let t = transition(state, MechanismEvent::Toggle(Mechanism::TopOutake));
        assert_eq!(
            writes(&t),
            vec![
                ActuatorCommand::roller(RollerId::Hood, 0.0),
                ActuatorCommand::retract(SolenoidId::Hood),
            ]
        );
        assert!(t.state.aligner && t.state.bottom_intake && !t.state.top_outake);
    }

    #[test]
    fn right_descore_clears_outake_flag() {
        let state = MechanismState {
            top_outake: true,
            ..Default::default()
        };
        let t = transition(state, MechanismEvent::Toggle(Mechanism::RightDescore));
        assert!(t.state.right_descore);
        assert!(!t.state.top_outake);
        assert_eq!(writes(&t)[0], ActuatorCommand::extend(SolenoidId::RightDescore));
    }

    #[test]
    fn bottom_intake_spins_in_then_out() {
        let on = transition(
            MechanismState::default(),
            MechanismEvent::Toggle(Mechanism::BottomIntake),
        );
        assert_eq!(writes(&on), vec![ActuatorCommand::roller(RollerId::Intake, -127.0)]);

        let off = transition(on.state, MechanismEvent::Toggle(Mechanism::BottomIntake));
        assert_eq!(writes(&off), vec![ActuatorCommand::roller(RollerId::Intake, 127.0)]);
        assert!(!off.state.bottom_intake);
    }

    #[test]
    fn clearing_a_flag_does_not_switch_its_hardware_off() {
        // MiddleGoal clears the intake flag but keeps the intake running.
        let state = MechanismState {
            bottom_intake: true,
            ..Default::default()
        };
        let t = transition(state, MechanismEvent::Activate(Mechanism::MiddleGoal));
        assert!(!t.state.bottom_intake);
        assert!(!writes(&t).contains(&ActuatorCommand::roller(RollerId::Intake, 0.0)));
    }

    #[test]
    fn deactivate_when_inactive_is_a_noop() {
        let busy = MechanismState {
            right_descore: true,
            top_outake: true,
            bottom_intake: true,
            ..Default::default()
        };
        for m in Mechanism::ALL {
            let mut state = busy;
            state.set(m, false);
            let t = transition(state, MechanismEvent::Deactivate(m));
            assert!(t.is_noop(&state), "deactivating inactive {m} changed something");
        }
    }

    #[test]
    fn activate_when_active_is_a_noop() {
        let state = MechanismState {
            aligner: true,
            ..Default::default()
        };
        let t = transition(state, MechanismEvent::Activate(Mechanism::Aligner));
        assert!(t.is_noop(&state));
    }

    #[test]
    fn stop_rollers_clears_roller_flags() {
        let state = MechanismState {
            top_outake: true,
            bottom_intake: true,
            aligner: true,
            ..Default::default()
        };
        let t = transition(state, MechanismEvent::StopRollers);
        assert!(!t.state.top_outake && !t.state.bottom_intake);
        assert!(t.state.aligner);
        assert_eq!(writes(&t).len(), 3);
    }

    #[test]
    fn scripted_extend_respects_interlock() {
        let state = MechanismState {
            aligner: true,
            ..Default::default()
        };
        let t = transition(state, MechanismEvent::Extend(SolenoidId::Matchload));
        assert_eq!(
            t.commands,
            vec![retract(SolenoidId::Aligner), SETTLE, extend(SolenoidId::Matchload)]
        );
        assert!(t.state.matchload && !t.state.aligner);
    }

    #[test]
    fn scripted_extend_without_conflict_is_a_single_write() {
        let t = transition(
            MechanismState::default(),
            MechanismEvent::Extend(SolenoidId::Aligner),
        );
        assert_eq!(t.commands, vec![extend(SolenoidId::Aligner)]);
        assert!(t.state.aligner);
    }

    #[test]
    fn hood_writes_leave_flags_alone() {
        let state = MechanismState {
            top_outake: true,
            ..Default::default()
        };
        let t = transition(state, MechanismEvent::Retract(SolenoidId::Hood));
        assert_eq!(t.state, state);
        assert_eq!(t.commands, vec![retract(SolenoidId::Hood)]);
    }

    #[test]
    fn top_score_macro_retracts_matchload_without_touching_aligner() {
        let state = MechanismState {
            matchload: true,
            ..Default::default()
        };
        let t = transition(state, MechanismEvent::TopScore);
        assert!(!t.state.matchload && !t.state.aligner && t.state.top_outake);
        assert!(!writes(&t).iter().any(|w| matches!(
            w,
            ActuatorCommand::Solenoid {
                solenoid: SolenoidId::Aligner,
                ..
            }
        )));
    }

    #[test]
    fn intake_in_sets_coast() {
        let t = transition(MechanismState::default(), MechanismEvent::IntakeIn);
        assert!(writes(&t).contains(&ActuatorCommand::RollerBrake {
            roller: RollerId::Intake,
            mode: BrakeMode::Coast,
        }));
        assert!(t.state.bottom_intake);
    }
}
