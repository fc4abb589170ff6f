//! PID controller over [`PidGains`].
//!
//! The caller supplies the measurement and the time since the last update,
//! and applies the output to whatever it drives.  The ranging correction
//! loop uses it as a clamped P controller on a distance reading.
//!
//! # Example
//!
//! ```rust
//! use matchbot_hal::pid::PidController;
//!
//! // Drive backward when the reading is farther than the target.
//! let mut pid = PidController::proportional(1.5);
//! pid.set_set_point(101.6);
//! pid.set_output_limits(-60.0, 60.0);
//!
//! let output = pid.update(500.0, 0.02);
//! assert_eq!(output, -60.0);
//! ```

use matchbot_types::PidGains;

#[derive(Debug, Clone)]
pub struct PidController {
    gains: PidGains,
    set_point: f64,
    integral: f64,
    last_error: Option<f64>,
    limit: (f64, f64),
}

impl PidController {
    /// Output is unclamped until [`set_output_limits`](Self::set_output_limits).
    pub fn new(gains: PidGains) -> Self {
        Self {
            gains,
            set_point: 0.0,
            integral: 0.0,
            last_error: None,
            limit: (f64::NEG_INFINITY, f64::INFINITY),
        }
    }

    pub fn proportional(kp: f64) -> Self {
        Self::new(PidGains::new(kp, 0.0, 0.0))
    }

    pub fn set_set_point(&mut self, set_point: f64) {
        self.set_point = set_point;
    }

    /// Clamp output (and the integral contribution) to `[min, max]`.
    pub fn set_output_limits(&mut self, min: f64, max: f64) {
        self.limit = (min, max);
    }

    /// `set_point - measurement`.
    pub fn error(&self, measurement: f64) -> f64 {
        self.set_point - measurement
    }

    /// Next output for `measurement`, `dt` seconds after the previous call.
    ///
    /// A non-positive `dt` returns `0.0` and leaves the controller untouched.
    /// The integral only accumulates while the error is inside the
    /// `start_i` band (always, when `start_i` is zero).
    pub fn update(&mut self, measurement: f64, dt: f64) -> f64 {
        if dt <= 0.0 {
            return 0.0;
        }
        let (min, max) = self.limit;
        let PidGains { kp, ki, kd, start_i } = self.gains;
        let error = self.error(measurement);

        if start_i == 0.0 || error.abs() < start_i {
            self.integral += error * dt;
        }
        let i = (ki * self.integral).clamp(min, max);
        if ki != 0.0 {
            self.integral = i / ki;
        }

        let d = self
            .last_error
            .map_or(0.0, |prev| kd * (error - prev) / dt);
        self.last_error = Some(error);

        (kp * error + i + d).clamp(min, max)
    }
}
