// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Orbital Engine
//!
//! A sports-science analytics engine for endurance training data. Feeds on
//! athlete profiles and recorded activities (with optional per-second sensor
//! series) and produces training zones, stress scores, load charts, and
//! forward-looking coaching signals.
//!
//! ## Features
//!
//! - **Training zones**: heart-rate, speed, and power zones from a profile
//! - **Science metrics**: TRIMP, RSS/rTSS, efficiency factor, endurance
//!   index, swim efficiency, HR drift, aerobic decoupling
//! - **Biomechanics**: grade-adjusted pace, VAM, quadrant analysis
//! - **Power models**: W' balance, power-duration curve, AeroLab CdA/Crr fit
//! - **Load management**: PMC (CTL/ATL/TSB), ACWR, history summaries
//! - **Predictions**: race-time forecasting, fatigue classification,
//!   coaching insights
//!
//! ## Design
//!
//! The engine is deliberately forgiving about data quality: the only hard
//! error it ever raises is an invalid athlete profile. Every metric that
//! cannot be computed from the samples at hand degrades to `None` rather
//! than failing the whole analysis.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use orbital_engine::config::CalibrationConfig;
//! use orbital_engine::engine::AnalysisEngine;
//! use orbital_engine::models::{ActivityRecord, SportType, UserProfile};
//! use chrono::Utc;
//!
//! fn main() -> anyhow::Result<()> {
//!     let profile = UserProfile {
//!         age: Some(34),
//!         is_female: false,
//!         weight_kg: 70.0,
//!         resting_hr: 60,
//!         max_hr: 190,
//!         vma_kmh: Some(16.0),
//!         vo2max: None,
//!         weekly_volume_km: Some(45.0),
//!         goal_distance_km: Some(10.0),
//!         goal_time_min: None,
//!         race_date: None,
//!     };
//!     let engine = AnalysisEngine::new(profile, CalibrationConfig::load(None)?)?;
//!
//!     let run = ActivityRecord::basic("morning", SportType::Running, Utc::now(), 10.0, 50.0);
//!     let analysis = engine.analyze_activity_sync(&run, None);
//!     println!("rTSS: {:?}", analysis.science.rtss);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod intelligence;
pub mod logging;
pub mod models;

pub use engine::{AnalysisEngine, Analyzer};
pub use errors::EngineError;
