// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Forward-looking analysis: race-time prediction, fatigue classification,
//! and the coaching insight decision table.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{FatigueConfig, InsightConfig};
use crate::constants::VMA_REFERENCE_EFFORT_MIN;
use crate::intelligence::series;
use crate::models::{ActivityRecord, ScienceBundle, SportType};

/// Riegel endurance exponent: time scales with distance to this power.
const RIEGEL_EXPONENT: f64 = 1.06;

/// Comparable efforts for the trend model must cover at least this fraction
/// of the goal distance.
const COMPARABLE_DISTANCE_FRACTION: f64 = 0.4;

const TREND_MIN_ACTIVITIES: usize = 3;

/// How much faith to put in a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Where a predicted time came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionMethod {
    /// Riegel extrapolation from the VMA reference effort.
    VmaReference,
    /// Linear trend over recent Riegel-normalized efforts.
    RecentTrend,
}

/// A predicted race result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RacePrediction {
    pub distance_km: f64,
    pub predicted_time_min: f64,
    pub confidence: Confidence,
    pub method: PredictionMethod,
}

/// Predict a race time from VMA alone.
///
/// VMA is treated as the speed sustainable for the reference effort
/// (roughly seven minutes); Riegel's power law extrapolates from that anchor
/// to the goal distance. `None` for non-positive inputs.
pub fn predict_race_time(vma_kmh: f64, distance_km: f64) -> Option<f64> {
    if vma_kmh <= 0.0 || distance_km <= 0.0 {
        return None;
    }
    let reference_km = vma_kmh * VMA_REFERENCE_EFFORT_MIN / 60.0;
    let predicted = VMA_REFERENCE_EFFORT_MIN * (distance_km / reference_km).powf(RIEGEL_EXPONENT);
    predicted.is_finite().then_some(predicted)
}

/// Predict a race result from the training history, falling back to the VMA
/// anchor when the history is too thin.
///
/// With at least three comparable efforts (the goal's sport, at least 40% of
/// the goal distance), each effort is Riegel-normalized to the goal distance
/// and a linear trend over calendar days projects the equivalent time forward
/// to `target_date`. Fewer efforts, a degenerate fit, or a nonsense
/// projection all degrade to the VMA prediction at low confidence rather
/// than erroring.
pub fn predict_performance(
    history: &[ActivityRecord],
    vma_kmh: Option<f64>,
    sport: &SportType,
    goal_distance_km: f64,
    target_date: NaiveDate,
) -> Option<RacePrediction> {
    if goal_distance_km <= 0.0 {
        return None;
    }

    let fallback = vma_kmh.and_then(|vma| {
        predict_race_time(vma, goal_distance_km).map(|time| RacePrediction {
            distance_km: goal_distance_km,
            predicted_time_min: time,
            confidence: Confidence::Low,
            method: PredictionMethod::VmaReference,
        })
    });

    let comparable: Vec<&ActivityRecord> = history
        .iter()
        .filter(|a| {
            a.sport == *sport
                && a.duration_min > 0.0
                && a.distance_km >= goal_distance_km * COMPARABLE_DISTANCE_FRACTION
                && a.date() <= target_date
        })
        .collect();

    if comparable.len() < TREND_MIN_ACTIVITIES {
        return fallback;
    }

    let first_date = comparable.iter().map(|a| a.date()).min()?;
    let points: Vec<(f64, f64)> = comparable
        .iter()
        .map(|a| {
            let days = (a.date() - first_date).num_days() as f64;
            let equivalent_min =
                a.duration_min * (goal_distance_km / a.distance_km).powf(RIEGEL_EXPONENT);
            (days, equivalent_min)
        })
        .collect();

    let (slope, intercept, r_squared) = match series::linear_regression(&points) {
        Some(fit) => fit,
        None => return fallback,
    };

    let target_days = (target_date - first_date).num_days() as f64;
    let projected = slope * target_days + intercept;
    if !projected.is_finite() || projected <= 0.0 {
        return fallback;
    }

    let confidence = if comparable.len() >= 6 && r_squared >= 0.5 {
        Confidence::High
    } else {
        Confidence::Medium
    };
    debug!(
        efforts = comparable.len(),
        r_squared, projected, "trend prediction"
    );

    Some(RacePrediction {
        distance_km: goal_distance_km,
        predicted_time_min: projected,
        confidence,
        method: PredictionMethod::RecentTrend,
    })
}

/// Within-activity fatigue classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FatigueLevel {
    Low,
    Moderate,
    High,
}

/// Classify fatigue from the three within-activity signals: heart-rate
/// drift, pace variability, and aerobic decoupling.
///
/// `High` needs at least two signals over their high thresholds; one signal
/// over its moderate threshold is enough for `Moderate`. Signals the bundle
/// could not compute simply do not vote, so sparse data biases toward `Low`.
pub fn classify_fatigue(bundle: &ScienceBundle, config: &FatigueConfig) -> FatigueLevel {
    let pace_cv = bundle.pace_consistency.map(|c| 100.0 - c);

    let signals = [
        (bundle.hr_drift_pct, config.hr_drift_moderate, config.hr_drift_high),
        (pace_cv, config.pace_cv_moderate, config.pace_cv_high),
        (
            bundle.aerobic_decoupling_pct,
            config.decoupling_moderate,
            config.decoupling_high,
        ),
    ];

    let mut moderate_votes = 0;
    let mut high_votes = 0;
    for (value, moderate, high) in signals {
        if let Some(v) = value {
            if v >= high {
                high_votes += 1;
            }
            if v >= moderate {
                moderate_votes += 1;
            }
        }
    }

    if high_votes >= 2 {
        FatigueLevel::High
    } else if moderate_votes >= 1 {
        FatigueLevel::Moderate
    } else {
        FatigueLevel::Low
    }
}

/// Coaching insight chosen from the athlete's load state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingInsight {
    /// Acute load has spiked well past the chronic baseline.
    OvertrainingRisk,
    /// Form is deeply negative; recovery is overdue.
    DeepFatigue,
    /// Fresh and fit at once: the window to race.
    PeakForm,
    /// Nothing demands intervention.
    SteadyProgress,
}

impl TrainingInsight {
    pub fn message(&self) -> &'static str {
        match self {
            Self::OvertrainingRisk => {
                "Training load is ramping much faster than your base can absorb. \
                 Cut volume this week to reduce injury risk."
            }
            Self::DeepFatigue => {
                "Accumulated fatigue is deep. Prioritize easy days or full rest \
                 until form recovers."
            }
            Self::PeakForm => {
                "Fitness is high and fatigue has cleared. This is a good window \
                 for a race or key session."
            }
            Self::SteadyProgress => {
                "Load and recovery are balanced. Keep the current progression."
            }
        }
    }
}

/// First-match-wins decision table over ACWR and TSB.
///
/// Overload warnings outrank form signals: a spiking ratio is reported even
/// when TSB looks healthy. Without an ACWR (thin history) only the TSB rules
/// apply.
pub fn select_insight(acwr: Option<f64>, tsb: f64, config: &InsightConfig) -> TrainingInsight {
    if let Some(ratio) = acwr {
        if ratio > config.acwr_overtraining {
            return TrainingInsight::OvertrainingRisk;
        }
    }
    if tsb < config.tsb_fatigue {
        return TrainingInsight::DeepFatigue;
    }
    if tsb > config.tsb_peak && acwr.is_some_and(|ratio| ratio >= config.acwr_peak) {
        return TrainingInsight::PeakForm;
    }
    TrainingInsight::SteadyProgress
}
