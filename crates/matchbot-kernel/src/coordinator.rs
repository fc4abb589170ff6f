//! [`MechanismCoordinator`] – single owner of the mechanism flags and the
//! only path from mechanism events to mechanism hardware.
//!
//! Operator buttons and autonomous scripts both call
//! [`MechanismCoordinator::handle`].  The coordinator computes the
//! [`Transition`][crate::transition::Transition], performs its writes in
//! order (sleeping through settle delays), and then commits the new flags.
//!
//! Writes are fire-and-forget: a failing device is logged and the remaining
//! writes still go out.  There is no locking; the coordinator must only ever
//! be driven from one thread.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use matchbot_hal::{clock::SimClock, sim::SimRegistry};
//! use matchbot_kernel::{Mechanism, MechanismCoordinator, MechanismEvent};
//!
//! let clock = SimClock::new();
//! let registry = SimRegistry::new(clock.clone()).with_all_mechanisms().build();
//! let mut mechanisms = MechanismCoordinator::new(registry, Arc::new(clock));
//!
//! mechanisms.handle(MechanismEvent::Toggle(Mechanism::Aligner));
//! assert!(mechanisms.state().aligner);
//! ```

use std::sync::Arc;

use matchbot_hal::{Clock, HardwareRegistry};
use tracing::{debug, warn};

use crate::mechanism::{MechanismEvent, MechanismState};
use crate::transition::{transition, MechanismCommand};

pub struct MechanismCoordinator {
    state: MechanismState,
    registry: HardwareRegistry,
    clock: Arc<dyn Clock>,
}

impl MechanismCoordinator {
    /// Start with every mechanism inactive.
    pub fn new(registry: HardwareRegistry, clock: Arc<dyn Clock>) -> Self {
        Self::with_state(registry, clock, MechanismState::default())
    }

    pub fn with_state(
        registry: HardwareRegistry,
        clock: Arc<dyn Clock>,
        state: MechanismState,
    ) -> Self {
        Self {
            state,
            registry,
            clock,
        }
    }

    pub fn state(&self) -> MechanismState {
        self.state
    }

    pub fn registry(&self) -> &HardwareRegistry {
        &self.registry
    }

    /// Apply `event` to the hardware and return the resulting flags.
    pub fn handle(&mut self, event: MechanismEvent) -> MechanismState {
        let next = transition(self.state, event);
        if next.is_noop(&self.state) {
            debug!(?event, "mechanism event changed nothing");
            return self.state;
        }

        debug!(?event, writes = next.commands.len(), "mechanism transition");
        for command in &next.commands {
            match *command {
                MechanismCommand::Actuate(write) => {
                    if let Err(e) = self.registry.dispatch(write) {
                        warn!(?write, error = %e, "mechanism write failed; continuing");
                    }
                }
                MechanismCommand::Settle(delay) => self.clock.sleep(delay),
            }
        }

        self.state = next.state;
        self.state
    }
}
