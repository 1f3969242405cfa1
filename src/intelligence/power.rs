// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Power-based models: W' balance (Skiba), the power-duration curve, and the
//! AeroLab virtual-elevation fit for CdA and Crr.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{AeroConfig, WPrimeConfig};
use crate::constants::physics;
use crate::intelligence::series;
use crate::models::{ActivityRecord, SamplePoint};

/// W' balance trajectory over one activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WPrimeBalance {
    /// Remaining anaerobic capacity in joules, one point per second.
    pub series: Vec<SamplePoint>,
    /// Lowest balance reached (J).
    pub min_joules: f64,
    /// Critical power used for the depletion threshold (W).
    pub cp_watts: f64,
}

/// Track remaining anaerobic work capacity through an activity.
///
/// Above critical power the balance depletes linearly with the excess work;
/// below it the spent capacity recovers exponentially with a time constant
/// that shrinks as the recovery power drops further under CP. The balance is
/// held inside `[0, W']` throughout. `None` without a power series or a
/// usable CP.
pub fn w_prime_balance(
    activity: &ActivityRecord,
    ftp_watts: f64,
    config: &WPrimeConfig,
) -> Option<WPrimeBalance> {
    let power = activity.power_series.as_ref()?;
    let cp = ftp_watts * config.cp_ftp_fraction;
    if cp <= 0.0 || config.w_prime_joules <= 0.0 {
        return None;
    }

    let grid = series::resample_1hz(power);
    if grid.is_empty() {
        return None;
    }
    let start = power.points()[0].time_offset_sec;

    let w_prime = config.w_prime_joules;
    let mut balance = w_prime;
    let mut min_joules = w_prime;
    let mut out = Vec::with_capacity(grid.len());

    for (s, &p) in grid.iter().enumerate() {
        let p = p.max(0.0);
        if p > cp {
            balance -= p - cp;
        } else {
            // Spent capacity recovers toward full with tau shrinking as the
            // recovery power drops further under CP.
            let tau = config.tau_scale * (-config.tau_decay * (cp - p)).exp() + config.tau_floor;
            let spent = w_prime - balance;
            balance = w_prime - spent * (-1.0 / tau).exp();
        }
        balance = balance.clamp(0.0, w_prime);
        min_joules = min_joules.min(balance);
        out.push(SamplePoint {
            time_offset_sec: start + s as f64,
            value: balance,
        });
    }

    Some(WPrimeBalance {
        series: out,
        min_joules,
        cp_watts: cp,
    })
}

/// One point of the power-duration curve.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PowerCurvePoint {
    pub duration_sec: u64,
    /// Best average power held over the window (W).
    pub max_avg_power: f64,
    /// Offset of the start of the best window from the first sample.
    pub start_offset_sec: f64,
}

/// Best average power over each requested window length.
///
/// Windows longer than the activity are dropped rather than reported with
/// padded data. Ties go to the earliest window.
pub fn power_duration_curve(activity: &ActivityRecord, durations_sec: &[u64]) -> Vec<PowerCurvePoint> {
    let power = match &activity.power_series {
        Some(power) => power,
        None => return Vec::new(),
    };
    let grid = series::resample_1hz(power);
    if grid.is_empty() {
        return Vec::new();
    }

    // Prefix sums make each window a constant-time lookup.
    let mut prefix = Vec::with_capacity(grid.len() + 1);
    prefix.push(0.0);
    for &p in &grid {
        prefix.push(prefix.last().copied().unwrap_or(0.0) + p.max(0.0));
    }

    let mut out = Vec::new();
    for &duration in durations_sec {
        let window = duration as usize;
        if window == 0 || window > grid.len() {
            continue;
        }
        let mut best = f64::NEG_INFINITY;
        let mut best_start = 0usize;
        for start in 0..=(grid.len() - window) {
            let avg = (prefix[start + window] - prefix[start]) / window as f64;
            // Strict comparison keeps the earliest window on ties.
            if avg > best {
                best = avg;
                best_start = start;
            }
        }
        out.push(PowerCurvePoint {
            duration_sec: duration,
            max_avg_power: best,
            start_offset_sec: best_start as f64,
        });
    }
    out
}

/// Result of the virtual-elevation fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AeroFit {
    /// Fitted drag area (m^2).
    pub cda: f64,
    /// Fitted rolling resistance coefficient.
    pub crr: f64,
    /// RMS error between virtual and recorded elevation (m).
    pub rmse: f64,
    /// Elevation profile implied by the fitted coefficients.
    pub virtual_elevation: Vec<SamplePoint>,
    /// Recorded elevation over the same intervals.
    pub actual_elevation: Vec<SamplePoint>,
}

struct AeroSample {
    t: f64,
    v: f64,
    dt: f64,
    /// Wheel power after drivetrain losses (W)
    wheel_watts: f64,
    /// Kinetic-energy change over the interval (J)
    kinetic_joules: f64,
    actual_elevation: f64,
}

/// Fit CdA and Crr against recorded elevation (the Chung method).
///
/// Each candidate pair implies a virtual elevation profile: whatever wheel
/// power is not spent on drag, rolling resistance, or accelerating must have
/// gone into climbing. The search runs a coarse grid over the configured
/// bounds, then refines around the best cell, stopping early when the
/// evaluation cap is hit. `None` when power, speed, or elevation data is
/// missing or the rider's mass is unknown.
pub fn fit_aero(
    activity: &ActivityRecord,
    rider_weight_kg: f64,
    config: &AeroConfig,
) -> Option<AeroFit> {
    if rider_weight_kg <= 0.0 {
        return None;
    }
    let power = activity.power_series.as_ref()?;
    let speed = activity.speed_series.as_ref()?;
    let elevation = activity.elevation_series.as_ref()?;
    if power.len() < 2 || speed.len() < 2 || elevation.len() < 2 {
        return None;
    }

    let mass = rider_weight_kg + config.bike_mass_kg;
    let samples = collect_aero_samples(speed, power, elevation, mass, config)?;
    if samples.len() < 10 {
        return None;
    }

    let mut evaluations = 0usize;
    let mut best = (f64::INFINITY, config.cda_min, config.crr_min);

    let search = |best: &mut (f64, f64, f64),
                  evaluations: &mut usize,
                  cda_lo: f64,
                  cda_hi: f64,
                  crr_lo: f64,
                  crr_hi: f64,
                  steps: usize| {
        let cda_step = (cda_hi - cda_lo) / steps as f64;
        let crr_step = (crr_hi - crr_lo) / steps as f64;
        for i in 0..=steps {
            for j in 0..=steps {
                if *evaluations >= config.max_iterations {
                    return;
                }
                *evaluations += 1;
                let cda = (cda_lo + cda_step * i as f64).clamp(config.cda_min, config.cda_max);
                let crr = (crr_lo + crr_step * j as f64).clamp(config.crr_min, config.crr_max);
                let rmse = elevation_rmse(&samples, cda, crr, mass);
                if rmse < best.0 {
                    *best = (rmse, cda, crr);
                }
            }
        }
    };

    // Coarse pass over the full space, then a refinement pass around the
    // winning cell at one-grid-cell radius.
    search(
        &mut best,
        &mut evaluations,
        config.cda_min,
        config.cda_max,
        config.crr_min,
        config.crr_max,
        config.grid_steps,
    );
    let cda_radius = (config.cda_max - config.cda_min) / config.grid_steps as f64;
    let crr_radius = (config.crr_max - config.crr_min) / config.grid_steps as f64;
    let (_, best_cda, best_crr) = best;
    search(
        &mut best,
        &mut evaluations,
        best_cda - cda_radius,
        best_cda + cda_radius,
        best_crr - crr_radius,
        best_crr + crr_radius,
        config.grid_steps,
    );

    let (rmse, cda, crr) = best;
    if !rmse.is_finite() {
        return None;
    }
    debug!(cda, crr, rmse, evaluations, "aero fit converged");

    let virtual_elevation = virtual_profile(&samples, cda, crr, mass);
    let actual_elevation = samples
        .iter()
        .map(|s| SamplePoint {
            time_offset_sec: s.t,
            value: s.actual_elevation,
        })
        .collect();

    Some(AeroFit {
        cda,
        crr,
        rmse,
        virtual_elevation,
        actual_elevation,
    })
}

fn collect_aero_samples(
    speed: &crate::models::SampleSeries,
    power: &crate::models::SampleSeries,
    elevation: &crate::models::SampleSeries,
    mass: f64,
    config: &AeroConfig,
) -> Option<Vec<AeroSample>> {
    let points = speed.points();
    let mut samples = Vec::with_capacity(points.len().saturating_sub(1));

    for pair in points.windows(2) {
        let dt = pair[1].time_offset_sec - pair[0].time_offset_sec;
        if dt <= 0.0 {
            continue;
        }
        let v = pair[0].value;
        if v <= 0.5 {
            // Near-stationary intervals carry no aero signal and blow up the
            // slope division.
            continue;
        }
        let watts = match power.value_at(pair[0].time_offset_sec) {
            Some(w) if w >= 0.0 => w,
            _ => continue,
        };
        let actual = match elevation.value_at(pair[1].time_offset_sec) {
            Some(h) if h.is_finite() => h,
            _ => continue,
        };

        let dv = pair[1].value - v;
        samples.push(AeroSample {
            t: pair[1].time_offset_sec,
            v,
            dt,
            wheel_watts: watts * config.drivetrain_efficiency,
            kinetic_joules: mass * v * dv,
            actual_elevation: actual,
        });
    }

    if samples.is_empty() {
        None
    } else {
        Some(samples)
    }
}

/// Integrate the elevation implied by `(cda, crr)`, anchored at the first
/// recorded elevation.
fn virtual_profile(samples: &[AeroSample], cda: f64, crr: f64, mass: f64) -> Vec<SamplePoint> {
    let mut elevation = samples[0].actual_elevation;
    let mut out = Vec::with_capacity(samples.len());
    for s in samples {
        let drag_watts = 0.5 * physics::RHO * cda * s.v.powi(3);
        let rolling_watts = crr * mass * physics::G * s.v;
        let kinetic_watts = s.kinetic_joules / s.dt;
        let climb_watts = s.wheel_watts - drag_watts - rolling_watts - kinetic_watts;
        // P_climb = m * g * v * slope; dh = slope * v * dt
        let dh = climb_watts / (mass * physics::G) * s.dt;
        if dh.is_finite() {
            elevation += dh;
        }
        out.push(SamplePoint {
            time_offset_sec: s.t,
            value: elevation,
        });
    }
    out
}

fn elevation_rmse(samples: &[AeroSample], cda: f64, crr: f64, mass: f64) -> f64 {
    let profile = virtual_profile(samples, cda, crr, mass);
    let sum_sq: f64 = profile
        .iter()
        .zip(samples)
        .map(|(virtual_point, s)| (virtual_point.value - s.actual_elevation).powi(2))
        .sum();
    (sum_sq / samples.len() as f64).sqrt()
}
