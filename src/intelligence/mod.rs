// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Intelligence Module
//!
//! The analytical core of the engine. Everything in here is pure
//! computation over profiles and activity samples.
//!
//! This module includes:
//! - Training zone derivation (HR, speed, power)
//! - Per-activity science metrics (TRIMP, stress scores, efficiency)
//! - Biomechanics series (grade-adjusted pace, VAM, quadrant analysis)
//! - Power models (W' balance, power-duration curve, AeroLab fit)
//! - Performance management (CTL/ATL/TSB, ACWR, history summaries)
//! - Predictions, fatigue classification, and coaching insights

pub mod biomechanics;
pub mod pmc;
pub mod power;
pub mod prediction;
pub mod science;
pub mod series;
pub mod zones;

pub use biomechanics::{Quadrant, QuadrantAnalysis, QuadrantPoint};
pub use pmc::TrainingSummary;
pub use power::{AeroFit, PowerCurvePoint, WPrimeBalance};
pub use prediction::{
    Confidence, FatigueLevel, PredictionMethod, RacePrediction, TrainingInsight,
};
pub use science::ScienceCalculator;
