// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Generic numeric helpers over time-stamped sample sequences: resampling to
//! splits, rolling averages, derivatives, and the small statistics the rest
//! of the engine leans on.

use crate::models::{ActivityRecord, SamplePoint, SampleSeries, Split};

/// Arithmetic mean, `None` when empty.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation, `None` when empty.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let avg = mean(values)?;
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Median value, `None` when empty. Non-finite inputs are ignored.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Coefficient of variation as a percentage, `None` when empty or when the
/// mean is zero.
pub fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    let avg = mean(values)?;
    if avg == 0.0 {
        return None;
    }
    let sd = std_dev(values)?;
    Some(sd / avg.abs() * 100.0)
}

/// Centered rolling average. Window widths of 0 or 1, or inputs shorter than
/// the window, pass through unchanged.
pub fn rolling_average(values: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 || values.len() < window {
        return values.to_vec();
    }

    let half = window / 2;
    let mut out = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        let start = i.saturating_sub(half);
        let end = (i + half + 1).min(values.len());
        let slice = &values[start..end];
        out.push(slice.iter().sum::<f64>() / slice.len() as f64);
    }
    out
}

/// Per-interval rate of change (value units per second). Intervals with a
/// non-positive time step are skipped. Each output point carries the
/// timestamp of the interval's end.
pub fn derivative(series: &SampleSeries) -> Vec<SamplePoint> {
    let points = series.points();
    let mut out = Vec::with_capacity(points.len().saturating_sub(1));
    for pair in points.windows(2) {
        let dt = pair[1].time_offset_sec - pair[0].time_offset_sec;
        if dt <= 0.0 {
            continue;
        }
        let rate = (pair[1].value - pair[0].value) / dt;
        if rate.is_finite() {
            out.push(SamplePoint {
                time_offset_sec: pair[1].time_offset_sec,
                value: rate,
            });
        }
    }
    out
}

/// Ordinary least-squares fit of `y` on `x`: `(slope, intercept, r_squared)`.
/// `None` with fewer than two points or a degenerate x spread.
pub fn linear_regression(points: &[(f64, f64)]) -> Option<(f64, f64, f64)> {
    if points.len() < 2 {
        return None;
    }

    let n = points.len() as f64;
    let sum_x: f64 = points.iter().map(|(x, _)| x).sum();
    let sum_y: f64 = points.iter().map(|(_, y)| y).sum();
    let sum_xy: f64 = points.iter().map(|(x, y)| x * y).sum();
    let sum_x2: f64 = points.iter().map(|(x, _)| x * x).sum();
    let sum_y2: f64 = points.iter().map(|(_, y)| y * y).sum();

    let denom_x = n * sum_x2 - sum_x * sum_x;
    if denom_x.abs() < 1e-12 {
        return None;
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denom_x;
    let intercept = (sum_y - slope * sum_x) / n;

    let denom_y = n * sum_y2 - sum_y * sum_y;
    let r_squared = if denom_y.abs() < 1e-12 {
        // All y identical: the flat fit is exact.
        1.0
    } else {
        let r = (n * sum_xy - sum_x * sum_y) / (denom_x * denom_y).sqrt();
        r * r
    };

    Some((slope, intercept, r_squared))
}

/// Derive per-distance splits for an activity.
///
/// Recorded splits win; otherwise splits are cut from the speed series by
/// integrating distance, and when no series exists either, a constant-pace
/// fallback spreads the activity totals evenly.
pub fn derive_splits(activity: &ActivityRecord, split_distance_m: f64) -> Vec<Split> {
    if split_distance_m <= 0.0 {
        return Vec::new();
    }
    if let Some(recorded) = &activity.splits {
        if !recorded.is_empty() {
            return recorded.clone();
        }
    }
    if let Some(speed) = &activity.speed_series {
        let cut = splits_from_speed(speed, activity, split_distance_m);
        if !cut.is_empty() {
            return cut;
        }
    }
    constant_pace_splits(activity, split_distance_m)
}

fn splits_from_speed(
    speed: &SampleSeries,
    activity: &ActivityRecord,
    split_distance_m: f64,
) -> Vec<Split> {
    let points = speed.points();
    if points.len() < 2 {
        return Vec::new();
    }

    let mut splits = Vec::new();
    let mut split_start_t = points[0].time_offset_sec;
    let mut accumulated_m = 0.0;
    let mut index = 1u32;

    for pair in points.windows(2) {
        let dt = pair[1].time_offset_sec - pair[0].time_offset_sec;
        if dt <= 0.0 {
            continue;
        }
        let v = pair[0].value.max(0.0);
        accumulated_m += v * dt;

        while accumulated_m >= split_distance_m {
            let overshoot_m = accumulated_m - split_distance_m;
            // Back out the time spent past the boundary within this interval.
            let overshoot_t = if v > 0.0 { overshoot_m / v } else { 0.0 };
            let split_end_t = pair[1].time_offset_sec - overshoot_t;

            splits.push(build_split(
                activity,
                index,
                split_distance_m,
                split_start_t,
                split_end_t,
            ));
            index += 1;
            split_start_t = split_end_t;
            accumulated_m -= split_distance_m;
        }
    }

    splits
}

fn build_split(
    activity: &ActivityRecord,
    index: u32,
    distance_m: f64,
    start_t: f64,
    end_t: f64,
) -> Split {
    Split {
        index,
        distance_m,
        duration_sec: (end_t - start_t).max(0.0),
        avg_heart_rate: window_mean(&activity.heart_rate_series, start_t, end_t),
        avg_power: window_mean(&activity.power_series, start_t, end_t),
        avg_cadence: window_mean(&activity.cadence_series, start_t, end_t),
        stroke_count: None,
    }
}

fn window_mean(series: &Option<SampleSeries>, start_t: f64, end_t: f64) -> Option<f64> {
    let series = series.as_ref()?;
    let values: Vec<f64> = series
        .points()
        .iter()
        .filter(|p| p.time_offset_sec >= start_t && p.time_offset_sec < end_t)
        .map(|p| p.value)
        .collect();
    mean(&values)
}

/// Spread the activity's scalar totals evenly across whole splits.
fn constant_pace_splits(activity: &ActivityRecord, split_distance_m: f64) -> Vec<Split> {
    let total_m = activity.distance_km * 1000.0;
    let total_sec = activity.duration_sec();
    if total_m <= 0.0 || total_sec <= 0.0 {
        return Vec::new();
    }

    let count = (total_m / split_distance_m).floor() as u32;
    let sec_per_split = total_sec * split_distance_m / total_m;

    (1..=count)
        .map(|index| Split {
            index,
            distance_m: split_distance_m,
            duration_sec: sec_per_split,
            avg_heart_rate: activity.avg_heart_rate,
            avg_power: activity.avg_power,
            avg_cadence: activity.avg_cadence,
            stroke_count: None,
        })
        .collect()
}

/// Resample a series to a fixed 1 Hz grid using step interpolation (the last
/// reading holds until the next one). Returns an empty vector for series
/// spanning less than one second.
pub fn resample_1hz(series: &SampleSeries) -> Vec<f64> {
    let points = series.points();
    if points.len() < 2 {
        return Vec::new();
    }

    let start = points[0].time_offset_sec;
    let end = points[points.len() - 1].time_offset_sec;
    let seconds = (end - start).floor() as usize;
    if seconds == 0 {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(seconds + 1);
    let mut cursor = 0usize;
    for s in 0..=seconds {
        let t = start + s as f64;
        while cursor + 1 < points.len() && points[cursor + 1].time_offset_sec <= t {
            cursor += 1;
        }
        out.push(points[cursor].value);
    }
    out
}
