//! The seven competition routines.
//!
//! Each routine is a fixed step list written in the
//! [`script`][crate::script] vocabulary.  Distances are inches, turns are
//! degrees, speeds are drive command units out of 127.

use std::fmt;
use std::str::FromStr;

use matchbot_kernel::MechanismEvent;
use matchbot_kernel::MechanismEvent::{
    IntakeIn, IntakeOut, MiddleGoalScore, StopRollers, TopIntake, TopScore,
};
use matchbot_types::SolenoidId::{self, Aligner, Hood, Matchload, MiddleGoal};
use matchbot_types::{BrakeMode, Direction};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::script::{
    ExitCondition, Routine, Step, drive, odom, path, turn, turn_to, waypoint, waypoint_facing,
};

const TURN_SPEED: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoutineId {
    LeftAwp,
    RightSide,
    SkillsOpener,
    LeftNoAwp,
    SkillsPark,
    SkillsFull,
    RangedPark,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown routine `{0}` (try `matchbot list`)")]
pub struct UnknownRoutine(pub String);

impl RoutineId {
    /// Selector order.
    pub const ALL: [RoutineId; 7] = [
        RoutineId::LeftAwp,
        RoutineId::RightSide,
        RoutineId::SkillsOpener,
        RoutineId::LeftNoAwp,
        RoutineId::SkillsPark,
        RoutineId::SkillsFull,
        RoutineId::RangedPark,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            RoutineId::LeftAwp => "left-awp",
            RoutineId::RightSide => "right-side",
            RoutineId::SkillsOpener => "skills-opener",
            RoutineId::LeftNoAwp => "left-no-awp",
            RoutineId::SkillsPark => "skills-park",
            RoutineId::SkillsFull => "skills-full",
            RoutineId::RangedPark => "ranged-park",
        }
    }

    /// Text shown on the selector.
    pub fn label(&self) -> &'static str {
        match self {
            RoutineId::LeftAwp => "Left side route (AWP)",
            RoutineId::RightSide => "Right side route",
            RoutineId::SkillsOpener => "Skills opener (global frame)",
            RoutineId::LeftNoAwp => "Left side route (no AWP)",
            RoutineId::SkillsPark => "Skills: just park",
            RoutineId::SkillsFull => "Full skills run",
            RoutineId::RangedPark => "Ranged park",
        }
    }

    pub fn routine(&self) -> Routine {
        let steps = match self {
            RoutineId::LeftAwp => left_awp(),
            RoutineId::RightSide => right_side(),
            RoutineId::SkillsOpener => skills_opener(),
            RoutineId::LeftNoAwp => left_no_awp(),
            RoutineId::SkillsPark => skills_park(),
            RoutineId::SkillsFull => skills_full(),
            RoutineId::RangedPark => ranged_park(),
        };
        Routine::new(self.slug(), steps)
    }
}

impl fmt::Display for RoutineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for RoutineId {
    type Err = UnknownRoutine;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        RoutineId::ALL
            .into_iter()
            .find(|id| id.slug() == wanted)
            .ok_or_else(|| UnknownRoutine(s.to_string()))
    }
}

fn ev(event: MechanismEvent) -> Step {
    Step::mechanism(event)
}

fn extend(solenoid: SolenoidId) -> Step {
    Step::extend(solenoid)
}

fn retract(solenoid: SolenoidId) -> Step {
    Step::retract(solenoid)
}

fn wait(ms: u64) -> Step {
    Step::delay_ms(ms)
}

// ─────────────────────────────────────────────────────────────────────────────
// Match routines
// ─────────────────────────────────────────────────────────────────────────────

fn left_awp() -> Vec<Step> {
    vec![
        drive(10.0, 110.0).chain(),
        turn(-60.0, TURN_SPEED).settle(),
        ev(IntakeIn),
        ev(TopIntake),
        wait(100),
        drive(21.0, 110.0).chain(),
        turn(-75.0, TURN_SPEED).settle(),
        drive(26.25, 110.0).chain(),
        turn(-42.5, TURN_SPEED).settle(),
        // back into the goal, then square up on the sensor
        drive(-9.0, 110.0).settle(),
        Step::correct(4.0, 1000),
        ev(TopScore),
        wait(1250),
        extend(Matchload),
        ev(IntakeIn),
        ev(TopIntake),
        turn(-6.0, TURN_SPEED).queued(),
        drive(28.5, 110.0).chain(),
        wait(450),
        drive(-14.0, 110.0).settle(),
        retract(Matchload),
        turn(49.5, TURN_SPEED).settle(),
        drive(-48.5, 110.0).settle(),
        ev(MiddleGoalScore),
        wait(1000),
        retract(MiddleGoal),
        ev(TopIntake),
        drive(14.0, 110.0).settle(),
        turn(-136.0, TURN_SPEED).chain(),
        drive(43.0, 110.0).settle(),
        ev(StopRollers),
        turn(-135.0, TURN_SPEED).chain(),
        drive(11.5, 110.0).settle(),
        ev(IntakeOut),
    ]
}

fn right_side() -> Vec<Step> {
    vec![
        drive(10.0, 100.0).chain(),
        turn(60.0, TURN_SPEED).settle(),
        ev(IntakeIn),
        ev(TopIntake),
        drive(22.0, 100.0).chain(),
        wait(100),
        turn(85.0, TURN_SPEED).settle(),
        drive(25.0, 110.0).chain(),
        turn(41.5, TURN_SPEED).settle(),
        extend(Aligner),
        drive(-14.0, 100.0).settle(),
        Step::correct(4.0, 1000),
        ev(TopScore),
        wait(1250),
        turn(-4.0, TURN_SPEED).chain(),
        extend(Matchload),
        ev(IntakeIn),
        ev(TopIntake),
        retract(Aligner),
        drive(28.0, 90.0).chain(),
        wait(150),
        Step::unstick_ms(500),
        drive(-7.5, 110.0).settle(),
        retract(Matchload),
        turn(135.5, TURN_SPEED).settle(),
        drive(48.0, 110.0).settle(),
        ev(IntakeOut),
    ]
}

fn left_no_awp() -> Vec<Step> {
    vec![
        drive(10.0, 100.0).chain(),
        turn(-60.0, TURN_SPEED).settle(),
        ev(IntakeIn),
        ev(TopIntake),
        wait(100),
        drive(21.0, 100.0).chain(),
        turn(-85.0, TURN_SPEED).settle(),
        drive(25.0, 110.0).chain(),
        turn(-40.5, TURN_SPEED).settle(),
        extend(Aligner),
        drive(-14.0, 100.0).settle(),
        ev(TopScore),
        wait(1250),
        extend(Matchload),
        ev(IntakeIn),
        ev(TopIntake),
        retract(Aligner),
        turn(4.0, TURN_SPEED).chain(),
        drive(28.0, 80.0).chain(),
        wait(150),
        Step::unstick_ms(600),
        drive(-13.0, 110.0).settle(),
        retract(Matchload),
        turn(52.0, TURN_SPEED).settle(),
        drive(-47.5, 110.0).settle(),
        ev(MiddleGoalScore),
        wait(500),
        ev(IntakeOut),
        wait(250),
        ev(MiddleGoalScore),
    ]
}

// ─────────────────────────────────────────────────────────────────────────────
// Skills routines
// ─────────────────────────────────────────────────────────────────────────────

fn skills_opener() -> Vec<Step> {
    vec![
        Step::ResetPose,
        ev(IntakeIn),
        path(vec![waypoint_facing(-7.0, 38.0, 0.0, Direction::Forward, 110.0)]).queued(),
        Step::wait_until(-4.0, 33.0),
        extend(Matchload),
        Step::Await {
            exit: ExitCondition::Settle,
        },
        turn_to(-135.0, TURN_SPEED).chain(),
        wait(1000),
        path(vec![waypoint(-5.0, 44.0, Direction::Reverse, 100.0)]).settle(),
        ev(MiddleGoalScore),
        wait(1000),
        path(vec![
            waypoint(12.0, -24.0, Direction::Forward, 100.0),
            waypoint_facing(12.0, -12.0, 180.0, Direction::Forward, 100.0),
        ])
        .chain(),
        wait(1000),
    ]
}

fn skills_park() -> Vec<Step> {
    vec![
        drive(-9.25, 100.0).settle(),
        extend(Matchload),
        ev(IntakeIn),
        drive(10.0, 75.0).settle(),
        drive(25.0, 127.0).settle(),
        wait(4000),
        retract(Matchload),
        drive(6.0, 85.0).settle(),
    ]
}

/// Score one goal from the far side: back in, square up, score, then
/// reload from the loader and score the second batch.
fn score_goal_and_reload(reload_ms: u64, second_pause_ms: Option<u64>) -> Vec<Step> {
    let mut steps = vec![
        extend(Aligner),
        odom(-13.0, 100.0).settle(),
        Step::correct(3.5, 1000),
        ev(TopScore),
        ev(IntakeIn),
        wait(2250),
        // reload
        retract(Aligner),
        wait(250),
        extend(Matchload),
        ev(TopIntake),
        odom(29.0, 85.0).settle(),
        wait(reload_ms),
        // second batch
        extend(Aligner),
        odom(-29.0, 85.0).settle(),
        ev(TopScore),
        ev(IntakeIn),
        wait(2500),
        retract(Hood),
    ];
    if let Some(ms) = second_pause_ms {
        steps.push(wait(ms));
    }
    steps
}

/// Back out of a loader, cross the field along the wall and line up in
/// front of a goal.
fn cross_field(back_out_speed: f64, lead_in_ms: Option<u64>, approach_in: f64) -> Vec<Step> {
    let mut steps = vec![
        odom(-15.0, back_out_speed).settle(),
        turn(-135.0, TURN_SPEED).chain(),
        odom(20.0, 100.0).settle(),
        retract(Aligner),
        turn(-45.0, TURN_SPEED).chain(),
        extend(Matchload),
    ];
    if let Some(ms) = lead_in_ms {
        steps.push(wait(ms));
    }
    steps.extend([
        odom(55.0, 100.0).settle(),
        turn(-40.0, TURN_SPEED).chain(),
        odom(approach_in, 100.0).settle(),
        retract(Matchload),
        turn(40.0, TURN_SPEED).chain(),
    ]);
    steps
}

fn skills_full() -> Vec<Step> {
    let mut steps = vec![
        Step::ResetPose,
        odom(42.5, 100.0).settle(),
        turn(-90.0, TURN_SPEED).chain(),
        extend(Matchload),
        ev(IntakeIn),
        wait(300),
        // first loader
        drive(13.0, 80.0).settle(),
        wait(1200),
    ];
    steps.extend(cross_field(80.0, None, 26.5));
    steps.extend(score_goal_and_reload(1800, Some(700)));

    steps.extend([
        ev(TopScore),
        retract(Aligner),
        odom(15.0, 80.0).settle(),
        turn(90.0, TURN_SPEED).chain(),
        extend(Matchload),
        // long crossing to the third loader
        odom(96.0, 100.0).settle(),
        ev(TopIntake),
        turn(-90.0, TURN_SPEED).chain(),
        odom(17.5, 85.0).settle(),
        wait(1650),
    ]);
    steps.extend(cross_field(100.0, Some(100), 33.5));
    steps.extend(score_goal_and_reload(1650, None));

    steps.extend([
        odom(15.0, 80.0).settle(),
        turn(90.0, TURN_SPEED).chain(),
        odom(24.0, 85.0).settle(),
        turn(90.0, TURN_SPEED).chain(),
        Step::MeasureRange,
        retract(Aligner),
        Step::RangedDrive {
            offset_in: 3.0,
            speed: 85.0,
        },
        turn(-95.0, TURN_SPEED).chain(),
        // park
        ev(IntakeOut),
        odom(10.0, 100.0).settle(),
        odom(24.0, 80.0).settle(),
    ]);
    steps
}

fn ranged_park() -> Vec<Step> {
    vec![
        Step::ResetPose,
        odom(15.0, 80.0).settle(),
        turn(90.0, TURN_SPEED).chain(),
        odom(24.0, 85.0).settle(),
        turn(90.0, TURN_SPEED).chain(),
        extend(Aligner),
        wait(250),
        Step::MeasureRange,
        wait(250),
        retract(Aligner),
        Step::RangedDrive {
            offset_in: 3.0,
            speed: 105.0,
        },
        turn(-95.0, TURN_SPEED).chain(),
        ev(IntakeOut),
        odom(10.0, 100.0).settle(),
        odom(26.0, 80.0).settle(),
        wait(500),
        ev(IntakeIn),
        Step::Brake {
            mode: BrakeMode::Hold,
        },
    ]
}
