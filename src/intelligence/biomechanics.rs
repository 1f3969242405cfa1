// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Terrain- and pedaling-derived series: grade-adjusted pace, ascent
//! velocity, and quadrant analysis.

use serde::{Deserialize, Serialize};

use crate::config::GapConfig;
use crate::constants::{gap, physics};
use crate::intelligence::series;
use crate::models::{ActivityRecord, SamplePoint, SportType};

/// Grade-adjusted pace series, one point per elevation interval, pace in
/// min/km.
///
/// Uphill meters make the adjusted pace slower by the uphill coefficient,
/// downhill meters make it faster by the smaller downhill coefficient
/// (climbing costs more than descending saves). Every output pace is clamped
/// to the configured bounds so near-zero speeds cannot produce degenerate
/// values. Returns an empty series unless speed and elevation samples with
/// overlapping timestamps exist.
pub fn grade_adjusted_pace(activity: &ActivityRecord, config: &GapConfig) -> Vec<SamplePoint> {
    let (speed, elevation) = match (&activity.speed_series, &activity.elevation_series) {
        (Some(speed), Some(elevation)) if speed.len() >= 2 && elevation.len() >= 2 => {
            (speed, elevation)
        }
        _ => return Vec::new(),
    };

    let mut out = Vec::with_capacity(elevation.len().saturating_sub(1));
    for pair in elevation.points().windows(2) {
        let dt = pair[1].time_offset_sec - pair[0].time_offset_sec;
        if dt <= 0.0 {
            continue;
        }

        let v = match speed.value_at(pair[0].time_offset_sec) {
            Some(v) if v > 0.0 => v,
            _ => continue,
        };

        // m/s -> min/km
        let raw_pace = 1000.0 / v / 60.0;
        let delta_h = pair[1].value - pair[0].value;
        let adjustment_sec = if delta_h >= 0.0 {
            config.uphill_sec_per_meter * delta_h
        } else {
            -config.downhill_sec_per_meter * delta_h.abs()
        };

        let adjusted =
            (raw_pace + adjustment_sec / 60.0).clamp(gap::MIN_PACE_MIN_KM, gap::MAX_PACE_MIN_KM);
        out.push(SamplePoint {
            time_offset_sec: pair[1].time_offset_sec,
            value: adjusted,
        });
    }
    out
}

/// Ascent velocity series in meters climbed per hour, one point per
/// elevation interval. Flat and descending intervals contribute 0, never a
/// negative value.
pub fn vam_series(activity: &ActivityRecord) -> Vec<SamplePoint> {
    let elevation = match &activity.elevation_series {
        Some(elevation) if elevation.len() >= 2 => elevation,
        _ => return Vec::new(),
    };

    let mut out = Vec::with_capacity(elevation.len() - 1);
    for pair in elevation.points().windows(2) {
        let dt = pair[1].time_offset_sec - pair[0].time_offset_sec;
        if dt <= 0.0 {
            continue;
        }
        let delta_h = pair[1].value - pair[0].value;
        let vam = if delta_h > 0.0 {
            delta_h / dt * 3600.0
        } else {
            0.0
        };
        out.push(SamplePoint {
            time_offset_sec: pair[1].time_offset_sec,
            value: vam,
        });
    }
    out
}

/// The four pedaling quadrants, split at the rider's FTP-implied force and
/// the activity's median cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quadrant {
    /// High force, high velocity: sprinting
    HighForceHighVelocity,
    /// High force, low velocity: grinding
    HighForceLowVelocity,
    /// Low force, low velocity: recovery/coasting
    LowForceLowVelocity,
    /// Low force, high velocity: spinning
    LowForceHighVelocity,
}

/// One classified pedaling sample.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QuadrantPoint {
    pub time_offset_sec: f64,
    /// Circumferential pedal velocity (m/s)
    pub pedal_velocity: f64,
    /// Effective pedal force (N)
    pub pedal_force: f64,
    pub quadrant: Quadrant,
}

/// Quadrant analysis of one ride.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuadrantAnalysis {
    pub points: Vec<QuadrantPoint>,
    /// Force boundary between high and low (N)
    pub force_boundary: f64,
    /// Pedal-velocity boundary between high and low (m/s)
    pub velocity_boundary: f64,
    /// Sample counts per quadrant, ordered Q1..Q4
    pub counts: [usize; 4],
    /// Share of samples per quadrant, percent, ordered Q1..Q4
    pub distribution_pct: [f64; 4],
}

/// Classify each power+cadence sample of a ride into pedaling quadrants.
///
/// Boundaries are recomputed per activity: the velocity boundary is the
/// pedal velocity at the ride's median cadence and the force boundary is the
/// force required to hold `ftp_watts` at that velocity. `None` for non-rides
/// or when either series is missing.
pub fn quadrant_analysis(activity: &ActivityRecord, ftp_watts: f64) -> Option<QuadrantAnalysis> {
    if activity.sport != SportType::Cycling || ftp_watts <= 0.0 {
        return None;
    }
    let power = activity.power_series.as_ref()?;
    let cadence = activity.cadence_series.as_ref()?;
    if power.is_empty() || cadence.is_empty() {
        return None;
    }

    // Pedal velocity from cadence: rpm -> rad/s times crank length
    let to_velocity =
        |rpm: f64| rpm * 2.0 * std::f64::consts::PI * physics::CRANK_LENGTH_M / 60.0;

    let mut raw: Vec<(f64, f64, f64)> = Vec::with_capacity(power.len());
    let mut cadences = Vec::with_capacity(power.len());
    for p in power.points() {
        let rpm = match cadence.value_at(p.time_offset_sec) {
            Some(rpm) if rpm > 0.0 => rpm,
            _ => continue,
        };
        let velocity = to_velocity(rpm);
        if velocity <= 0.0 || p.value < 0.0 {
            continue;
        }
        raw.push((p.time_offset_sec, velocity, p.value / velocity));
        cadences.push(rpm);
    }
    if raw.is_empty() {
        return None;
    }

    let median_cadence = series::median(&cadences)?;
    let velocity_boundary = to_velocity(median_cadence);
    if velocity_boundary <= 0.0 {
        return None;
    }
    let force_boundary = ftp_watts / velocity_boundary;

    let mut counts = [0usize; 4];
    let points: Vec<QuadrantPoint> = raw
        .into_iter()
        .map(|(t, velocity, force)| {
            let quadrant = match (force >= force_boundary, velocity >= velocity_boundary) {
                (true, true) => Quadrant::HighForceHighVelocity,
                (true, false) => Quadrant::HighForceLowVelocity,
                (false, false) => Quadrant::LowForceLowVelocity,
                (false, true) => Quadrant::LowForceHighVelocity,
            };
            counts[match quadrant {
                Quadrant::HighForceHighVelocity => 0,
                Quadrant::HighForceLowVelocity => 1,
                Quadrant::LowForceLowVelocity => 2,
                Quadrant::LowForceHighVelocity => 3,
            }] += 1;
            QuadrantPoint {
                time_offset_sec: t,
                pedal_velocity: velocity,
                pedal_force: force,
                quadrant,
            }
        })
        .collect();

    let total = points.len() as f64;
    let distribution_pct = [
        counts[0] as f64 / total * 100.0,
        counts[1] as f64 / total * 100.0,
        counts[2] as f64 / total * 100.0,
        counts[3] as f64 / total * 100.0,
    ];

    Some(QuadrantAnalysis {
        points,
        force_boundary,
        velocity_boundary,
        counts,
        distribution_pct,
    })
}
