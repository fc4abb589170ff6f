//! Driver-control button mapping.
//!
//! [`OperatorControl::poll`] takes the set of buttons held during one
//! controller sample and turns new presses into [`OperatorAction`]s.  Holding
//! B and Down together asks for the autonomous routine; the request fires
//! once when the combination is first made, not on every sample.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use matchbot_kernel::{Mechanism, MechanismEvent, MechanismState};
use matchbot_types::BrakeMode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::robot::Robot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Button {
    A,
    B,
    X,
    Y,
    Up,
    Down,
    Left,
    Right,
    L1,
    L2,
    R1,
    R2,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown button `{0}`")]
pub struct UnknownButton(pub String);

impl Button {
    pub const ALL: [Button; 12] = [
        Button::A,
        Button::B,
        Button::X,
        Button::Y,
        Button::Up,
        Button::Down,
        Button::Left,
        Button::Right,
        Button::L1,
        Button::L2,
        Button::R1,
        Button::R2,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Button::A => "A",
            Button::B => "B",
            Button::X => "X",
            Button::Y => "Y",
            Button::Up => "UP",
            Button::Down => "DOWN",
            Button::Left => "LEFT",
            Button::Right => "RIGHT",
            Button::L1 => "L1",
            Button::L2 => "L2",
            Button::R1 => "R1",
            Button::R2 => "R2",
        }
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Button {
    type Err = UnknownButton;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        Button::ALL
            .into_iter()
            .find(|b| b.as_str() == wanted)
            .ok_or_else(|| UnknownButton(s.to_string()))
    }
}

/// What the surrounding loop should do after a controller sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "event", rename_all = "snake_case")]
pub enum OperatorAction {
    Mechanism(MechanismEvent),
    RunAutonomous,
}

/// Button → mechanism event table.
#[derive(Debug, Clone, PartialEq)]
pub struct ButtonMap {
    bindings: BTreeMap<Button, MechanismEvent>,
}

impl Default for ButtonMap {
    /// The competition layout.
    fn default() -> Self {
        let bindings = [
            (Button::L1, MechanismEvent::Toggle(Mechanism::RightDescore)),
            (Button::Y, MechanismEvent::Toggle(Mechanism::MiddleGoal)),
            (Button::A, MechanismEvent::Toggle(Mechanism::Matchload)),
            (Button::L2, MechanismEvent::Toggle(Mechanism::Aligner)),
            (Button::R2, MechanismEvent::Toggle(Mechanism::BottomIntake)),
            (Button::R1, MechanismEvent::Toggle(Mechanism::TopOutake)),
            (Button::Up, MechanismEvent::StopRollers),
        ];
        Self {
            bindings: bindings.into_iter().collect(),
        }
    }
}

impl ButtonMap {
    pub fn event_for(&self, button: Button) -> Option<MechanismEvent> {
        self.bindings.get(&button).copied()
    }

    pub fn bindings(&self) -> impl Iterator<Item = (Button, MechanismEvent)> + '_ {
        self.bindings.iter().map(|(b, e)| (*b, *e))
    }
}

const AUTONOMOUS_COMBO: [Button; 2] = [Button::B, Button::Down];

/// Edge detection over successive controller samples.
#[derive(Debug, Clone, Default)]
pub struct OperatorControl {
    map: ButtonMap,
    held: BTreeSet<Button>,
}

impl OperatorControl {
    pub fn new(map: ButtonMap) -> Self {
        Self {
            map,
            held: BTreeSet::new(),
        }
    }

    /// Drive brake for driver control.
    pub fn begin(&mut self, robot: &mut Robot) {
        self.held.clear();
        if let Err(e) = robot.chassis.set_brake_mode(BrakeMode::Coast) {
            warn!(error = %e, "could not set coast for driver control");
        }
    }

    /// Compare one sample against the previous one.  Mechanism actions come
    /// out in [`Button`] order.
    pub fn poll(&mut self, held: &BTreeSet<Button>) -> Vec<OperatorAction> {
        let combo = |set: &BTreeSet<Button>| AUTONOMOUS_COMBO.iter().all(|b| set.contains(b));

        let mut actions = Vec::new();
        if combo(held) && !combo(&self.held) {
            actions.push(OperatorAction::RunAutonomous);
        }
        actions.extend(
            held.difference(&self.held)
                .filter_map(|b| self.map.event_for(*b))
                .map(OperatorAction::Mechanism),
        );

        self.held = held.clone();
        actions
    }

    /// Poll and apply mechanism actions to `robot`.  Returns the resulting
    /// mechanism state and whether autonomous was requested.
    pub fn step(&mut self, robot: &mut Robot, held: &BTreeSet<Button>) -> (MechanismState, bool) {
        let mut run_autonomous = false;
        for action in self.poll(held) {
            match action {
                OperatorAction::Mechanism(event) => {
                    debug!(?event, "operator");
                    robot.mechanisms.handle(event);
                }
                OperatorAction::RunAutonomous => run_autonomous = true,
            }
        }
        (robot.mechanisms.state(), run_autonomous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matchbot_hal::sim::ChassisCommand;

    use crate::robot::SimRobot;

    fn held(buttons: &[Button]) -> BTreeSet<Button> {
        buttons.iter().copied().collect()
    }

    #[test]
    fn only_new_presses_fire() {
        let mut control = OperatorControl::default();
        let first = control.poll(&held(&[Button::R2]));
        assert_eq!(
            first,
            vec![OperatorAction::Mechanism(MechanismEvent::Toggle(Mechanism::BottomIntake))]
        );
        assert!(control.poll(&held(&[Button::R2])).is_empty());
        assert!(control.poll(&held(&[])).is_empty());
        assert_eq!(control.poll(&held(&[Button::R2])).len(), 1);
    }

    #[test]
    fn unmapped_buttons_do_nothing() {
        let mut control = OperatorControl::default();
        assert!(control.poll(&held(&[Button::X, Button::Left])).is_empty());
    }

    #[test]
    fn combo_requests_autonomous_once() {
        let mut control = OperatorControl::default();
        assert!(control.poll(&held(&[Button::B])).is_empty());
        assert_eq!(
            control.poll(&held(&[Button::B, Button::Down])),
            vec![OperatorAction::RunAutonomous]
        );
        assert!(control.poll(&held(&[Button::B, Button::Down])).is_empty());
    }

    #[test]
    fn step_applies_to_the_robot() {
        let mut sim = SimRobot::new(500);
        let mut control = OperatorControl::default();
        control.begin(&mut sim.robot);
        assert_eq!(sim.chassis.last_brake_mode(), Some(BrakeMode::Coast));

        let (state, auto) = control.step(&mut sim.robot, &held(&[Button::L2]));
        assert!(state.aligner);
        assert!(!auto);

        control.step(&mut sim.robot, &held(&[]));
        let (state, _) = control.step(&mut sim.robot, &held(&[Button::A]));
        assert!(state.matchload && !state.aligner);
        assert!(!sim.chassis.commands().contains(&ChassisCommand::WaitSettled));
    }

    #[test]
    fn buttons_parse_case_insensitively() {
        assert_eq!("l2".parse::<Button>(), Ok(Button::L2));
        assert_eq!("Down".parse::<Button>(), Ok(Button::Down));
        assert!("Z".parse::<Button>().is_err());
    }

    #[test]
    fn default_map_covers_seven_buttons() {
        assert_eq!(ButtonMap::default().bindings().count(), 7);
        assert_eq!(
            ButtonMap::default().event_for(Button::Up),
            Some(MechanismEvent::StopRollers)
        );
    }
}
