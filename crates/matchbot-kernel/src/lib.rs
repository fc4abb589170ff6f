//! `matchbot-kernel` – Mechanism State Machine
//!
//! Owns the on/off state of the robot's six mechanisms and enforces the
//! rules between them.  It does not decide what to do; it makes sure that
//! whatever the operator or a script asks for is done in a safe order.
//!
//! # Modules
//!
//! - [`mechanism`] – [`Mechanism`], [`MechanismState`] and
//!   [`MechanismEvent`].
//! - [`transition`] – the pure function [`transition`][transition::transition]
//!   from `(state, event)` to the next state and its device writes, including
//!   the matchload/aligner interlock.
//! - [`coordinator`] – [`MechanismCoordinator`]: executes transitions against
//!   a [`HardwareRegistry`][matchbot_hal::HardwareRegistry].

pub mod coordinator;
pub mod mechanism;
pub mod transition;

pub use coordinator::MechanismCoordinator;
pub use mechanism::{Mechanism, MechanismEvent, MechanismState};
pub use transition::{transition, MechanismCommand, Transition, SETTLE_DELAY};
