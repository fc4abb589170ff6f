//! `matchbot-hal` – Hardware Abstraction Layer
//!
//! Everything above this crate talks to hardware through traits, so the same
//! mechanism and routine logic runs on the robot and in headless tests.
//!
//! # Modules
//!
//! - [`motor`] – [`Motor`][motor::Motor]: roller motors driven by signed power.
//! - [`solenoid`] – [`Solenoid`][solenoid::Solenoid]: pneumatic pistons.
//! - [`range`] – [`RangeSensor`][range::RangeSensor]: millimetre distance
//!   sensor and its trusted reading window.
//! - [`chassis`] – [`Chassis`][chassis::Chassis]: the external drivetrain
//!   motion controller, plus its raw power override.
//! - [`clock`] – [`Clock`][clock::Clock]: wall-clock and simulated time.
//! - [`registry`] – [`HardwareRegistry`][registry::HardwareRegistry]: routes
//!   [`ActuatorCommand`][matchbot_types::ActuatorCommand]s to drivers.
//! - [`pid`] – [`PidController`][pid::PidController].
//! - [`sim`] – simulated drivers for CI.

pub mod chassis;
pub mod clock;
pub mod motor;
pub mod pid;
pub mod range;
pub mod registry;
pub mod sim;
pub mod solenoid;

pub use chassis::Chassis;
pub use clock::{Clock, SimClock, SystemClock};
pub use motor::Motor;
pub use range::RangeSensor;
pub use registry::HardwareRegistry;
pub use solenoid::Solenoid;
