//! Generic `RangeSensor` trait for single-axis distance sensors.

use matchbot_types::BotError;

/// Smallest reading treated as a real measurement.
pub const MIN_VALID_MM: i32 = 10;
/// Largest reading treated as a real measurement.
pub const MAX_VALID_MM: i32 = 2000;

/// A distance sensor reporting whole millimetres.
pub trait RangeSensor: Send + Sync {
    /// Stable identifier for this sensor, e.g. `"dist_sensor"`.
    fn id(&self) -> &str;

    /// Sample the current distance in millimetres.
    ///
    /// Drivers return whatever the device reports; callers decide whether
    /// the value lies inside the trusted window (see [`is_valid_reading`]).
    ///
    /// # Errors
    ///
    /// Returns [`BotError::SensorFault`] if the device cannot be read.
    fn distance_mm(&mut self) -> Result<i32, BotError>;
}

/// `true` when `mm` lies inside the default trusted window
/// `[MIN_VALID_MM, MAX_VALID_MM]`.
pub fn is_valid_reading(mm: i32) -> bool {
    (MIN_VALID_MM..=MAX_VALID_MM).contains(&mm)
}
