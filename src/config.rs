// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Calibration configuration for the analytics engine.
//!
//! The shape of every formula (the RSS quadratic, the asymmetric GAP
//! coefficients, the bounded AeroLab search) is fixed by the engine; the
//! literal numeric defaults are calibration choices and live here so they can
//! be tuned without touching the algorithms. Loads from a TOML file when one
//! exists, otherwise falls back to embedded defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level calibration configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub stress: StressConfig,
    pub gap: GapConfig,
    pub aero: AeroConfig,
    pub w_prime: WPrimeConfig,
    pub power_curve: PowerCurveConfig,
    pub fatigue: FatigueConfig,
    pub insight: InsightConfig,
}

/// Thresholds feeding the stress scores (RSS/rTSS) and running power model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StressConfig {
    /// Default cycling FTP in watts when the profile supplies none.
    pub default_ftp_watts: f64,
    /// Fraction of VMA treated as threshold pace for rTSS.
    pub threshold_vma_fraction: f64,
    /// Energy cost of running in kJ per kg per km, for the speed-to-power
    /// model.
    pub running_energy_cost: f64,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            default_ftp_watts: 220.0,
            threshold_vma_fraction: 0.85,
            running_energy_cost: 0.98,
        }
    }
}

/// Grade-adjusted pace coefficients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GapConfig {
    /// Seconds of pace added per meter of net gain in an interval.
    pub uphill_sec_per_meter: f64,
    /// Seconds of pace removed per meter of net loss in an interval.
    /// Asymmetric with the uphill coefficient: climbing costs more than
    /// descending saves.
    pub downhill_sec_per_meter: f64,
}

impl Default for GapConfig {
    fn default() -> Self {
        Self {
            uphill_sec_per_meter: 1.8,
            downhill_sec_per_meter: 0.8,
        }
    }
}

/// AeroLab (Chung virtual elevation) search space.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AeroConfig {
    pub cda_min: f64,
    pub cda_max: f64,
    pub crr_min: f64,
    pub crr_max: f64,
    /// Grid resolution per axis for the coarse pass.
    pub grid_steps: usize,
    /// Total evaluation cap; hitting it returns the best pair found so far.
    pub max_iterations: usize,
    /// Drivetrain efficiency crank-to-wheel.
    pub drivetrain_efficiency: f64,
    /// Combined rider + bike mass added to body weight, in kg.
    pub bike_mass_kg: f64,
}

impl Default for AeroConfig {
    fn default() -> Self {
        Self {
            cda_min: 0.15,
            cda_max: 0.50,
            crr_min: 0.002,
            crr_max: 0.012,
            grid_steps: 15,
            max_iterations: 600,
            drivetrain_efficiency: 0.975,
            bike_mass_kg: 8.5,
        }
    }
}

/// W' balance (Skiba) model parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WPrimeConfig {
    /// Anaerobic work capacity in joules.
    pub w_prime_joules: f64,
    /// Critical power as a fraction of FTP when no CP estimate exists.
    pub cp_ftp_fraction: f64,
    /// Recovery time-constant coefficients: tau = a * exp(-b * dcp) + c.
    pub tau_scale: f64,
    pub tau_decay: f64,
    pub tau_floor: f64,
}

impl Default for WPrimeConfig {
    fn default() -> Self {
        Self {
            w_prime_joules: 20_000.0,
            cp_ftp_fraction: 1.0,
            tau_scale: 546.0,
            tau_decay: 0.01,
            tau_floor: 316.0,
        }
    }
}

/// Power-duration curve sampling durations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerCurveConfig {
    /// Window lengths in seconds, ascending.
    pub durations_sec: Vec<u64>,
}

impl Default for PowerCurveConfig {
    fn default() -> Self {
        Self {
            durations_sec: vec![1, 5, 15, 30, 60, 120, 300, 600, 1200, 3600, 10800, 18000],
        }
    }
}

/// Thresholds for the three fatigue signals (HR drift, pace CV, decoupling),
/// each as (moderate, high) percentages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FatigueConfig {
    pub hr_drift_moderate: f64,
    pub hr_drift_high: f64,
    pub pace_cv_moderate: f64,
    pub pace_cv_high: f64,
    pub decoupling_moderate: f64,
    pub decoupling_high: f64,
}

impl Default for FatigueConfig {
    fn default() -> Self {
        Self {
            hr_drift_moderate: 5.0,
            hr_drift_high: 10.0,
            pace_cv_moderate: 8.0,
            pace_cv_high: 15.0,
            decoupling_moderate: 5.0,
            decoupling_high: 10.0,
        }
    }
}

/// Coaching insight decision-table thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightConfig {
    /// ACWR above this triggers the overtraining warning.
    pub acwr_overtraining: f64,
    /// TSB below this triggers the fatigue warning.
    pub tsb_fatigue: f64,
    /// TSB above this (with ACWR above `acwr_peak`) signals peak form.
    pub tsb_peak: f64,
    pub acwr_peak: f64,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            acwr_overtraining: 1.5,
            tsb_fatigue: -20.0,
            tsb_peak: 10.0,
            acwr_peak: 1.0,
        }
    }
}

impl CalibrationConfig {
    /// Load calibration from an explicit path, the default file, or embedded
    /// defaults, in that order.
    pub fn load(path: Option<String>) -> Result<Self> {
        dotenv::dotenv().ok();

        if let Some(config_path) = path {
            return Self::load_from_file(&config_path);
        }

        if Path::new("calibration.toml").exists() {
            return Self::load_from_file("calibration.toml");
        }

        if let Some(config_dir) = dirs::config_dir() {
            let default_path = config_dir.join("orbital-engine/calibration.toml");
            if default_path.exists() {
                return Self::load_from_file(&default_path.to_string_lossy());
            }
        }

        Ok(Self::default())
    }

    /// Load calibration from a specific TOML file.
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read calibration file: {path}"))?;

        let config: CalibrationConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse calibration file: {path}"))?;

        Ok(config)
    }
}
