//! [`RangingCorrector`] – terminal positioning against a goal using the rear
//! distance sensor, plus the open-loop [`unstick`][RangingCorrector::unstick]
//! oscillation.
//!
//! Both routines bypass the drivetrain controller and write raw tank power,
//! so they must only run while the chassis is idle.  Every exit path leaves
//! the drive stopped with a brake engaged.
//!
//! # Algorithm
//!
//! [`correct`][RangingCorrector::correct] polls the sensor every
//! [`CorrectionConfig::poll_interval_ms`]:
//!
//! 1. A read error or a reading outside the valid window ends the loop
//!    without touching the wheels ([`CorrectionOutcome::SensorFault`]).
//! 2. Within [`CorrectionConfig::tolerance_mm`] of the target ends the loop
//!    ([`CorrectionOutcome::Reached`]).
//! 3. Otherwise both sides receive `clamp(gain * (target - reading), ±cap)`:
//!    too far means negative power (backward), too close means forward.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use matchbot_hal::clock::SimClock;
//! use matchbot_hal::sim::{SimChassis, SimRangeSensor};
//! use matchbot_runtime::ranging::{CorrectionOutcome, RangingCorrector};
//! use matchbot_types::BrakeMode;
//!
//! let clock = SimClock::new();
//! let mut chassis = SimChassis::new(clock.clone());
//! let probe = chassis.probe();
//! let mut sensor = SimRangeSensor::scripted(vec![500, 300, 110]);
//!
//! let outcome = RangingCorrector::default().correct(
//!     &mut chassis,
//!     sensor.as_mut(),
//!     &clock,
//!     4.0,
//!     Duration::from_millis(1000),
//! );
//!
//! assert_eq!(outcome, CorrectionOutcome::Reached);
//! assert_eq!(probe.last_brake_mode(), Some(BrakeMode::Hold));
//! ```

use std::time::Duration;

use matchbot_hal::range::{MAX_VALID_MM, MIN_VALID_MM};
use matchbot_hal::{Chassis, Clock, RangeSensor, pid::PidController};
use matchbot_types::{BrakeMode, MM_PER_INCH};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Power of each unstick pulse, in drive command units.
pub const UNSTICK_POWER: f64 = 45.0;
const UNSTICK_FORWARD: Duration = Duration::from_millis(250);
const UNSTICK_PAUSE: Duration = Duration::from_millis(100);
const UNSTICK_REVERSE: Duration = Duration::from_millis(100);

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Tuning of the correction loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionConfig {
    /// Time between two sensor samples.
    pub poll_interval_ms: u64,
    /// Distance from the target that counts as arrived.
    pub tolerance_mm: f64,
    /// Proportional gain, in power units per millimetre.
    pub gain: f64,
    /// Largest power magnitude the loop may command.
    pub max_power: f64,
    /// Smallest plausible reading; anything below is a fault.
    pub min_valid_mm: i32,
    /// Largest plausible reading; anything above is a fault.
    pub max_valid_mm: i32,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 20,
            tolerance_mm: 15.0,
            gain: 1.5,
            max_power: 60.0,
            min_valid_mm: MIN_VALID_MM,
            max_valid_mm: MAX_VALID_MM,
        }
    }
}

impl CorrectionConfig {
    /// Poll interval, never shorter than 1 ms.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Whether `mm` is inside the inclusive valid window.
    pub fn accepts(&self, mm: i32) -> bool {
        (self.min_valid_mm..=self.max_valid_mm).contains(&mm)
    }
}

/// How a correction ended.  Informational only: callers proceed either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionOutcome {
    Reached,
    TimedOut,
    SensorFault,
}

// ─────────────────────────────────────────────────────────────────────────────
// RangingCorrector
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct RangingCorrector {
    config: CorrectionConfig,
}

impl RangingCorrector {
    pub fn new(config: CorrectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CorrectionConfig {
        &self.config
    }

    /// Sample the sensor once, returning the reading only when it is valid.
    pub fn measure(&self, sensor: &mut dyn RangeSensor) -> Option<i32> {
        match sensor.distance_mm() {
            Ok(mm) if self.config.accepts(mm) => Some(mm),
            Ok(mm) => {
                warn!(sensor = sensor.id(), reading_mm = mm, "range reading outside valid window");
                None
            }
            Err(e) => {
                warn!(error = %e, "range sensor read failed");
                None
            }
        }
    }

    /// Drive along the current heading until the sensor reads `target_in`
    /// inches, the sensor faults, or `timeout` elapses.
    ///
    /// Always finishes with zero power and [`BrakeMode::Hold`].
    pub fn correct(
        &self,
        chassis: &mut dyn Chassis,
        sensor: &mut dyn RangeSensor,
        clock: &dyn Clock,
        target_in: f64,
        timeout: Duration,
    ) -> CorrectionOutcome {
        let start = clock.now();
        let target_mm = target_in * MM_PER_INCH;
        let poll = self.config.poll_interval();

        let mut pid = PidController::proportional(self.config.gain);
        pid.set_set_point(target_mm);
        pid.set_output_limits(-self.config.max_power, self.config.max_power);

        let outcome = loop {
            if clock.since(start) >= timeout {
                break CorrectionOutcome::TimedOut;
            }

            let Some(reading) = self.measure(sensor) else {
                break CorrectionOutcome::SensorFault;
            };
            let reading = f64::from(reading);
            if pid.error(reading).abs() < self.config.tolerance_mm {
                break CorrectionOutcome::Reached;
            }

            let power = pid.update(reading, poll.as_secs_f64());
            debug!(reading_mm = reading, power, "ranging correction");
            if let Err(e) = chassis.set_tank_power(power, power) {
                warn!(error = %e, "correction power write failed");
            }
            clock.sleep(poll);
        };

        stop(chassis, BrakeMode::Hold);
        debug!(?outcome, target_mm, elapsed_ms = clock.since(start).as_millis() as u64, "correction finished");
        outcome
    }

    /// Rock the robot back and forth to free a jammed game piece.
    ///
    /// Coasts during the pulses, repeats whole cycles while less than
    /// `duration` has elapsed, and finishes stopped with [`BrakeMode::Brake`].
    /// Returns the number of cycles run.
    pub fn unstick(&self, chassis: &mut dyn Chassis, clock: &dyn Clock, duration: Duration) -> u32 {
        let start = clock.now();
        set_brake(chassis, BrakeMode::Coast);

        let mut cycles = 0;
        while clock.since(start) < duration {
            for (power, dwell) in [
                (UNSTICK_POWER, UNSTICK_FORWARD),
                (0.0, UNSTICK_PAUSE),
                (-UNSTICK_POWER, UNSTICK_REVERSE),
            ] {
                if let Err(e) = chassis.set_tank_power(power, power) {
                    warn!(error = %e, "unstick power write failed");
                }
                clock.sleep(dwell);
            }
            cycles += 1;
        }

        stop(chassis, BrakeMode::Brake);
        debug!(cycles, "unstick finished");
        cycles
    }
}

fn set_brake(chassis: &mut dyn Chassis, mode: BrakeMode) {
    if let Err(e) = chassis.set_brake_mode(mode) {
        warn!(?mode, error = %e, "drive brake write failed");
    }
}

fn stop(chassis: &mut dyn Chassis, mode: BrakeMode) {
    if let Err(e) = chassis.set_tank_power(0.0, 0.0) {
        warn!(error = %e, "drive stop write failed");
    }
    set_brake(chassis, mode);
}
