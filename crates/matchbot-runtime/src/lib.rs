//! `matchbot-runtime` – Autonomous Routines and Driver Control
//!
//! Everything that decides *when* the robot does something: the seven match
//! routines, the interpreter that plays them back, terminal positioning on
//! the distance sensor, and the driver's button layout.
//!
//! # Modules
//!
//! - [`ranging`] – [`RangingCorrector`][ranging::RangingCorrector]:
//!   proportional standoff correction on the rear distance sensor and the
//!   open-loop unstick oscillation.  Both write raw drive power.
//! - [`script`] – [`Step`][script::Step] and [`Routine`][script::Routine]:
//!   the data vocabulary routines are written in.
//! - [`sequencer`] – [`Sequencer`][sequencer::Sequencer]: runs a routine
//!   step by step against a [`Robot`][robot::Robot] and returns a
//!   [`RunReport`][sequencer::RunReport].  No step can stop a routine.
//! - [`routines`] – [`RoutineId`][routines::RoutineId] and the seven step
//!   lists.
//! - [`selector`] – [`RoutineSelector`][selector::RoutineSelector] and the
//!   match-start [`Dispatcher`][selector::Dispatcher].
//! - [`operator`] – driver-control [`ButtonMap`][operator::ButtonMap] and
//!   press detection.
//! - [`robot`] – [`Robot`][robot::Robot], the device bundle, and
//!   [`SimRobot`][robot::SimRobot] for hardware-free runs.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: console
//!   logging with optional OTLP span export.

pub mod operator;
pub mod ranging;
pub mod robot;
pub mod routines;
pub mod script;
pub mod selector;
pub mod sequencer;
pub mod telemetry;

pub use operator::{Button, ButtonMap, OperatorAction, OperatorControl};
pub use ranging::{CorrectionConfig, CorrectionOutcome, RangingCorrector};
pub use robot::{Robot, SimRobot};
pub use routines::{RoutineId, UnknownRoutine};
pub use script::{ExitCondition, MotionSegment, Routine, Step};
pub use selector::{Dispatcher, RoutineSelector};
pub use sequencer::{RunReport, Sequencer, StepOutcome, StepRecord};
pub use telemetry::{init_tracing, TracerProviderGuard};
