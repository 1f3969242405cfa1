// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Constants Module
//!
//! Fixed domain parameters. Unlike the calibration values in
//! [`crate::config`], these are part of the model definitions themselves and
//! are not user-configurable.

/// Performance Management Chart parameters (Banister impulse-response model).
pub mod pmc {
    /// Chronic training load time constant in days.
    pub const CTL_TIME_CONSTANT_DAYS: f64 = 42.0;

    /// Acute training load time constant in days.
    pub const ATL_TIME_CONSTANT_DAYS: f64 = 7.0;

    /// Acute window for the workload ratio, in days.
    pub const ACWR_ACUTE_WINDOW_DAYS: i64 = 7;

    /// Chronic window for the workload ratio, in days.
    pub const ACWR_CHRONIC_WINDOW_DAYS: i64 = 28;
}

/// Physical constants used by the power and aerodynamics models.
pub mod physics {
    /// Standard gravity (m/s^2).
    pub const G: f64 = 9.80665;

    /// Sea-level air density at 15 C (kg/m^3).
    pub const RHO: f64 = 1.225;

    /// Crank length assumed when converting cadence to pedal velocity (m).
    pub const CRANK_LENGTH_M: f64 = 0.1725;
}

/// Banister TRIMP exponential weighting coefficients.
pub mod trimp {
    /// Multiplier and exponent factor for male athletes.
    pub const MALE: (f64, f64) = (0.64, 1.92);

    /// Multiplier and exponent factor for female athletes.
    pub const FEMALE: (f64, f64) = (0.86, 1.67);
}

/// Grade-adjusted pace output bounds (min/km). Clamping keeps near-zero
/// speeds from producing degenerate paces.
pub mod gap {
    pub const MIN_PACE_MIN_KM: f64 = 2.0;
    pub const MAX_PACE_MIN_KM: f64 = 15.0;
}

/// Reference effort shared by the endurance index and the race predictor:
/// VMA is the speed an athlete can hold for roughly this long.
pub const VMA_REFERENCE_EFFORT_MIN: f64 = 7.0;
