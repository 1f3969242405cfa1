// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Per-activity science engine.
//!
//! Consumes one activity's full sample set and produces a [`ScienceBundle`]
//! of scalar metrics. A bundle never fails as a whole: each metric that
//! cannot be computed from the available samples comes back as `None`.

use tracing::debug;

use crate::config::CalibrationConfig;
use crate::constants::{trimp, VMA_REFERENCE_EFFORT_MIN};
use crate::intelligence::biomechanics;
use crate::intelligence::series;
use crate::models::{ActivityRecord, SampleSeries, ScienceBundle, SportType, TrainingPlan, UserProfile};

/// Minimum activity duration for the endurance index (minutes). Shorter
/// efforts carry no usable decay signal.
const ENDURANCE_INDEX_MIN_DURATION_MIN: f64 = 20.0;

/// Minimum span per activity half for drift/decoupling (seconds).
const HALF_MIN_SPAN_SEC: f64 = 120.0;

/// Swim splits are cut every 100 m, everything else every kilometer.
fn split_distance_for(sport: &SportType) -> f64 {
    match sport {
        SportType::Swimming => 100.0,
        _ => 1000.0,
    }
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Calculator bound to a profile and calibration snapshot.
pub struct ScienceCalculator<'a> {
    profile: &'a UserProfile,
    config: &'a CalibrationConfig,
}

impl<'a> ScienceCalculator<'a> {
    pub fn new(profile: &'a UserProfile, config: &'a CalibrationConfig) -> Self {
        Self { profile, config }
    }

    /// Compute the full science bundle for one activity.
    pub fn calculate_science(
        &self,
        activity: &ActivityRecord,
        plan: Option<&TrainingPlan>,
    ) -> ScienceBundle {
        let mut bundle = ScienceBundle {
            trimp: self.calculate_trimp(activity),
            rss: self.calculate_rss(activity, plan),
            rtss: self.calculate_rtss(activity, plan),
            efficiency_factor: self.calculate_efficiency_factor(activity),
            running_effectiveness: self.calculate_running_effectiveness(activity),
            endurance_index: self.calculate_endurance_index(activity, plan),
            r_ftp_w: self.estimate_running_ftp(plan),
            hr_drift_pct: self.calculate_hr_drift(activity),
            aerobic_decoupling_pct: self.calculate_decoupling(activity),
            pace_consistency: self.calculate_pace_consistency(activity),
            ..ScienceBundle::default()
        };

        if activity.sport == SportType::Swimming {
            let (swolf, stroke_index, dps) = self.calculate_swim_metrics(activity);
            bundle.swolf = swolf;
            bundle.stroke_index = stroke_index;
            bundle.distance_per_stroke = dps;
        }

        debug!(
            activity_id = %activity.id,
            rss = ?bundle.rss,
            rtss = ?bundle.rtss,
            trimp = ?bundle.trimp,
            "science bundle computed"
        );

        bundle
    }

    /// Banister training impulse with the sex-specific exponential weighting.
    fn calculate_trimp(&self, activity: &ActivityRecord) -> Option<f64> {
        let avg_hr = self.average_hr(activity)?;
        let duration_min = activity.duration_min;
        if duration_min <= 0.0 {
            return None;
        }

        let reserve = (self.profile.max_hr as f64) - (self.profile.resting_hr as f64);
        if reserve <= 0.0 {
            return None;
        }

        let hr_ratio = ((avg_hr - self.profile.resting_hr as f64) / reserve).clamp(0.0, 1.0);
        let (scale, exponent) = if self.profile.is_female {
            trimp::FEMALE
        } else {
            trimp::MALE
        };

        finite(duration_min * hr_ratio * scale * (exponent * hr_ratio).exp())
    }

    /// Stress score from power: `100 * hours * (P / FTP)^2`.
    fn calculate_rss(&self, activity: &ActivityRecord, plan: Option<&TrainingPlan>) -> Option<f64> {
        let avg_power = self.average_power(activity)?;
        if avg_power <= 0.0 || activity.duration_min <= 0.0 {
            return None;
        }
        let ftp = self.threshold_power(plan);
        let intensity = avg_power / ftp;
        finite(100.0 * (activity.duration_sec() / 3600.0) * intensity * intensity)
    }

    /// Running stress score from grade-adjusted pace when no power sensor is
    /// present. Normalized speed comes from the GAP series when terrain data
    /// exists, otherwise from the raw average speed.
    fn calculate_rtss(
        &self,
        activity: &ActivityRecord,
        plan: Option<&TrainingPlan>,
    ) -> Option<f64> {
        if activity.sport != SportType::Running || activity.duration_min <= 0.0 {
            return None;
        }
        // RSS covers activities with power data; rTSS is the substitute.
        if self.average_power(activity).is_some() {
            return None;
        }

        let threshold_speed_kmh = self.threshold_speed_kmh(plan)?;
        let normalized_speed_kmh = self
            .gap_speed_kmh(activity)
            .or_else(|| activity.avg_speed_ms().map(|v| v * 3.6))?;
        if normalized_speed_kmh <= 0.0 {
            return None;
        }

        let intensity = normalized_speed_kmh / threshold_speed_kmh;
        finite(100.0 * (activity.duration_sec() / 3600.0) * intensity * intensity)
    }

    /// Efficiency factor: meters per minute produced per heart beat.
    fn calculate_efficiency_factor(&self, activity: &ActivityRecord) -> Option<f64> {
        let avg_hr = self.average_hr(activity)?;
        if avg_hr <= 0.0 {
            return None;
        }
        let speed = activity.avg_speed_ms()?;
        finite(speed * 60.0 / avg_hr)
    }

    /// Running effectiveness: speed per watt of body-mass-relative power.
    /// Values near 1.0 are typical for trained runners.
    fn calculate_running_effectiveness(&self, activity: &ActivityRecord) -> Option<f64> {
        let power = self.average_power(activity)?;
        if power <= 0.0 || self.profile.weight_kg <= 0.0 {
            return None;
        }
        let speed = activity.avg_speed_ms()?;
        finite(speed / (power / self.profile.weight_kg))
    }

    /// Peronnet-style endurance index: speed deficit against VMA per log unit
    /// of duration beyond the reference effort. Closer to zero is better.
    fn calculate_endurance_index(
        &self,
        activity: &ActivityRecord,
        plan: Option<&TrainingPlan>,
    ) -> Option<f64> {
        if activity.duration_min < ENDURANCE_INDEX_MIN_DURATION_MIN {
            return None;
        }
        let vma = self.vma_kmh(plan)?;
        let speed_kmh = activity.avg_speed_ms()? * 3.6;
        let time_ratio = activity.duration_min / VMA_REFERENCE_EFFORT_MIN;
        if time_ratio <= 1.0 {
            return None;
        }
        finite((speed_kmh - vma) / time_ratio.ln())
    }

    /// SWOLF, stroke index and distance-per-stroke from swim splits with
    /// stroke counts.
    fn calculate_swim_metrics(
        &self,
        activity: &ActivityRecord,
    ) -> (Option<f64>, Option<f64>, Option<f64>) {
        let splits = match &activity.splits {
            Some(splits) if !splits.is_empty() => splits,
            _ => return (None, None, None),
        };

        let counted: Vec<_> = splits
            .iter()
            .filter(|s| s.stroke_count.is_some() && s.duration_sec > 0.0)
            .collect();
        if counted.is_empty() {
            return (None, None, None);
        }

        let swolf_values: Vec<f64> = counted
            .iter()
            .map(|s| s.duration_sec + f64::from(s.stroke_count.unwrap_or(0)))
            .collect();
        let swolf = series::mean(&swolf_values).and_then(finite);

        let total_strokes: f64 = counted
            .iter()
            .map(|s| f64::from(s.stroke_count.unwrap_or(0)))
            .sum();
        let total_distance_m: f64 = counted.iter().map(|s| s.distance_m).sum();

        if total_strokes <= 0.0 || total_distance_m <= 0.0 {
            return (swolf, None, None);
        }

        let dps = finite(total_distance_m / total_strokes);
        let stroke_index = match (activity.avg_speed_ms(), dps) {
            (Some(speed), Some(dps)) => finite(speed * dps),
            _ => None,
        };

        (swolf, stroke_index, dps)
    }

    /// Estimated running FTP in watts from threshold pace and body weight.
    fn estimate_running_ftp(&self, plan: Option<&TrainingPlan>) -> Option<f64> {
        let threshold_speed_kmh = self.threshold_speed_kmh(plan)?;
        if self.profile.weight_kg <= 0.0 {
            return None;
        }
        finite(
            threshold_speed_kmh / 3.6
                * self.config.stress.running_energy_cost
                * self.profile.weight_kg,
        )
    }

    /// Percentage rise of the HR-to-speed ratio between activity halves.
    /// Positive drift means the same pace cost more heart beats late in the
    /// activity.
    fn calculate_hr_drift(&self, activity: &ActivityRecord) -> Option<f64> {
        let hr = activity.heart_rate_series.as_ref()?;
        let speed = activity.speed_series.as_ref()?;

        let (first, second) = half_ratios(hr, speed, |hr_mean, speed_mean| {
            if speed_mean <= 0.0 {
                None
            } else {
                Some(hr_mean / speed_mean)
            }
        })?;

        if first <= 0.0 {
            return None;
        }
        finite((second - first) / first * 100.0)
    }

    /// Aerobic decoupling: percentage loss of speed-per-beat efficiency
    /// between halves.
    fn calculate_decoupling(&self, activity: &ActivityRecord) -> Option<f64> {
        let hr = activity.heart_rate_series.as_ref()?;
        let speed = activity.speed_series.as_ref()?;

        let (first, second) = half_ratios(hr, speed, |hr_mean, speed_mean| {
            if hr_mean <= 0.0 {
                None
            } else {
                Some(speed_mean / hr_mean)
            }
        })?;

        if first <= 0.0 {
            return None;
        }
        finite((first - second) / first * 100.0)
    }

    /// Pace consistency: 100 minus the coefficient of variation of split
    /// durations, clamped to [0, 100].
    fn calculate_pace_consistency(&self, activity: &ActivityRecord) -> Option<f64> {
        let splits = series::derive_splits(activity, split_distance_for(&activity.sport));
        if splits.len() < 2 {
            return None;
        }
        let durations: Vec<f64> = splits.iter().map(|s| s.duration_sec).collect();
        let cv = series::coefficient_of_variation(&durations)?;
        finite((100.0 - cv).clamp(0.0, 100.0))
    }

    fn average_hr(&self, activity: &ActivityRecord) -> Option<f64> {
        activity
            .avg_heart_rate
            .or_else(|| activity.heart_rate_series.as_ref().and_then(SampleSeries::mean))
            .filter(|hr| *hr > 0.0)
    }

    fn average_power(&self, activity: &ActivityRecord) -> Option<f64> {
        activity
            .avg_power
            .or_else(|| activity.power_series.as_ref().and_then(SampleSeries::mean))
            .filter(|p| *p > 0.0)
    }

    fn threshold_power(&self, plan: Option<&TrainingPlan>) -> f64 {
        plan.and_then(|p| p.ftp_watts)
            .unwrap_or(self.config.stress.default_ftp_watts)
    }

    fn vma_kmh(&self, plan: Option<&TrainingPlan>) -> Option<f64> {
        plan.and_then(|p| p.vma_kmh)
            .or(self.profile.vma_kmh)
            .filter(|v| *v > 0.0)
    }

    /// Threshold pace as a speed: the configured fraction of VMA, or the
    /// zone-4 lower boundary when the plan carries explicit speed zones.
    fn threshold_speed_kmh(&self, plan: Option<&TrainingPlan>) -> Option<f64> {
        if let Some(zones) = plan.and_then(|p| p.speed_zones.as_ref()) {
            if let Some(zone4) = zones.iter().find(|z| z.number == 4) {
                if zone4.lower > 0.0 {
                    return Some(zone4.lower);
                }
            }
        }
        self.vma_kmh(plan)
            .map(|vma| vma * self.config.stress.threshold_vma_fraction)
    }

    /// Mean grade-adjusted speed in km/h, when terrain data allows it.
    fn gap_speed_kmh(&self, activity: &ActivityRecord) -> Option<f64> {
        let gap = biomechanics::grade_adjusted_pace(activity, &self.config.gap);
        if gap.is_empty() {
            return None;
        }
        let speeds: Vec<f64> = gap.iter().map(|p| 60.0 / p.value).collect();
        series::mean(&speeds).and_then(finite)
    }
}

/// Split two aligned series at the time midpoint and map each half's means
/// through `ratio`. `None` unless both halves span at least two minutes and
/// contain samples from both channels.
fn half_ratios<F>(hr: &SampleSeries, speed: &SampleSeries, ratio: F) -> Option<(f64, f64)>
where
    F: Fn(f64, f64) -> Option<f64>,
{
    let span = hr.span_sec().min(speed.span_sec());
    if span < 2.0 * HALF_MIN_SPAN_SEC {
        return None;
    }

    let start = hr.points().first()?.time_offset_sec;
    let midpoint = start + span / 2.0;

    let half_mean = |s: &SampleSeries, lo: f64, hi: f64| -> Option<f64> {
        let values: Vec<f64> = s
            .points()
            .iter()
            .filter(|p| p.time_offset_sec >= lo && p.time_offset_sec < hi)
            .map(|p| p.value)
            .collect();
        series::mean(&values)
    };

    let first = ratio(
        half_mean(hr, start, midpoint)?,
        half_mean(speed, start, midpoint)?,
    )?;
    let second = ratio(
        half_mean(hr, midpoint, start + span + 1.0)?,
        half_mean(speed, midpoint, start + span + 1.0)?,
    )?;

    Some((first, second))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Split;
    use chrono::Utc;

    fn profile() -> UserProfile {
        UserProfile {
            age: Some(32),
            is_female: false,
            weight_kg: 70.0,
            resting_hr: 60,
            max_hr: 190,
            vma_kmh: Some(16.0),
            vo2max: Some(56.0),
            weekly_volume_km: Some(40.0),
            goal_distance_km: None,
            goal_time_min: None,
            race_date: None,
        }
    }

    fn calc_fixture() -> (UserProfile, CalibrationConfig) {
        (profile(), CalibrationConfig::default())
    }

    fn run_with_hr(duration_min: f64, avg_hr: f64) -> ActivityRecord {
        let mut activity = ActivityRecord::basic(
            "run",
            SportType::Running,
            Utc::now(),
            duration_min * 12.0 / 60.0, // 12 km/h
            duration_min,
        );
        activity.avg_heart_rate = Some(avg_hr);
        activity
    }

    #[test]
    fn test_trimp_positive_and_scales_with_duration() {
        let (profile, config) = calc_fixture();
        let calc = ScienceCalculator::new(&profile, &config);

        let short = calc.calculate_trimp(&run_with_hr(30.0, 150.0)).unwrap();
        let long = calc.calculate_trimp(&run_with_hr(60.0, 150.0)).unwrap();
        assert!(short > 0.0);
        assert!((long / short - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_trimp_none_without_hr() {
        let (profile, config) = calc_fixture();
        let calc = ScienceCalculator::new(&profile, &config);
        let activity = ActivityRecord::basic("a", SportType::Running, Utc::now(), 10.0, 50.0);
        assert!(calc.calculate_trimp(&activity).is_none());
    }

    #[test]
    fn test_rss_formula() {
        let (profile, config) = calc_fixture();
        let calc = ScienceCalculator::new(&profile, &config);

        let mut activity = ActivityRecord::basic("c", SportType::Cycling, Utc::now(), 30.0, 60.0);
        activity.avg_power = Some(220.0);

        // One hour exactly at the default threshold power -> 100
        let rss = calc.calculate_rss(&activity, None).unwrap();
        assert!((rss - 100.0).abs() < 1e-9);

        // Plan FTP overrides the configured default
        let plan = TrainingPlan {
            ftp_watts: Some(110.0),
            ..TrainingPlan::default()
        };
        let rss = calc.calculate_rss(&activity, Some(&plan)).unwrap();
        assert!((rss - 400.0).abs() < 1e-9);
    }

    #[test]
    fn test_rtss_only_without_power() {
        let (profile, config) = calc_fixture();
        let calc = ScienceCalculator::new(&profile, &config);

        // Threshold speed = 16 * 0.85 = 13.6 km/h; running at 12 km/h for 1 h
        let activity = run_with_hr(60.0, 150.0);
        let rtss = calc.calculate_rtss(&activity, None).unwrap();
        let expected = 100.0 * (12.0_f64 / 13.6).powi(2);
        assert!((rtss - expected).abs() < 1e-6);

        let mut powered = run_with_hr(60.0, 150.0);
        powered.avg_power = Some(250.0);
        assert!(calc.calculate_rtss(&powered, None).is_none());
    }

    #[test]
    fn test_efficiency_factor() {
        let (profile, config) = calc_fixture();
        let calc = ScienceCalculator::new(&profile, &config);

        let activity = run_with_hr(60.0, 150.0);
        // 12 km/h = 200 m/min over 150 bpm
        let ef = calc.calculate_efficiency_factor(&activity).unwrap();
        assert!((ef - 200.0 / 150.0).abs() < 1e-9);

        let mut without_hr = run_with_hr(60.0, 150.0);
        without_hr.avg_heart_rate = Some(0.0);
        assert!(calc.calculate_efficiency_factor(&without_hr).is_none());
    }

    #[test]
    fn test_running_effectiveness_target_near_one() {
        let (profile, config) = calc_fixture();
        let calc = ScienceCalculator::new(&profile, &config);

        let mut activity = run_with_hr(60.0, 150.0);
        // 12 km/h = 3.333 m/s at ~233 W for 70 kg -> RE = 1.0
        activity.avg_power = Some(12.0 / 3.6 * 70.0);
        let re = calc.calculate_running_effectiveness(&activity).unwrap();
        assert!((re - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_endurance_index_needs_duration() {
        let (profile, config) = calc_fixture();
        let calc = ScienceCalculator::new(&profile, &config);

        assert!(calc
            .calculate_endurance_index(&run_with_hr(15.0, 150.0), None)
            .is_none());

        let ei = calc
            .calculate_endurance_index(&run_with_hr(60.0, 150.0), None)
            .unwrap();
        // Running below VMA: the index is negative
        assert!(ei < 0.0);
    }

    #[test]
    fn test_swim_metrics() {
        let (profile, config) = calc_fixture();
        let calc = ScienceCalculator::new(&profile, &config);

        let mut swim = ActivityRecord::basic("s", SportType::Swimming, Utc::now(), 0.4, 8.0);
        swim.splits = Some(
            (1..=4)
                .map(|i| Split {
                    index: i,
                    distance_m: 100.0,
                    duration_sec: 110.0,
                    avg_heart_rate: None,
                    avg_power: None,
                    avg_cadence: None,
                    stroke_count: Some(40),
                })
                .collect(),
        );

        let bundle = calc.calculate_science(&swim, None);
        assert!((bundle.swolf.unwrap() - 150.0).abs() < 1e-9);
        assert!((bundle.distance_per_stroke.unwrap() - 2.5).abs() < 1e-9);
        assert!(bundle.stroke_index.is_some());
    }

    #[test]
    fn test_swim_metrics_null_for_runs() {
        let (profile, config) = calc_fixture();
        let calc = ScienceCalculator::new(&profile, &config);
        let bundle = calc.calculate_science(&run_with_hr(60.0, 150.0), None);
        assert!(bundle.swolf.is_none());
        assert!(bundle.stroke_index.is_none());
        assert!(bundle.distance_per_stroke.is_none());
    }

    fn drifting_activity() -> ActivityRecord {
        let mut activity = ActivityRecord::basic("d", SportType::Running, Utc::now(), 10.0, 60.0);
        // Constant speed, HR climbing from 140 to 160 over the hour
        let hr: Vec<(f64, f64)> = (0..=3600)
            .step_by(10)
            .map(|t| (t as f64, 140.0 + 20.0 * t as f64 / 3600.0))
            .collect();
        let speed: Vec<(f64, f64)> = (0..=3600).step_by(10).map(|t| (t as f64, 3.0)).collect();
        activity.heart_rate_series = Some(SampleSeries::from_pairs(&hr));
        activity.speed_series = Some(SampleSeries::from_pairs(&speed));
        activity
    }

    #[test]
    fn test_hr_drift_detects_climb() {
        let (profile, config) = calc_fixture();
        let calc = ScienceCalculator::new(&profile, &config);

        let drift = calc.calculate_hr_drift(&drifting_activity()).unwrap();
        // HR rose ~7% at constant speed
        assert!(drift > 5.0 && drift < 9.0);

        let decoupling = calc.calculate_decoupling(&drifting_activity()).unwrap();
        assert!(decoupling > 0.0);
    }

    #[test]
    fn test_hr_drift_needs_two_minutes_per_half() {
        let (profile, config) = calc_fixture();
        let calc = ScienceCalculator::new(&profile, &config);

        let mut activity = ActivityRecord::basic("short", SportType::Running, Utc::now(), 0.5, 3.0);
        let hr: Vec<(f64, f64)> = (0..=180).map(|t| (t as f64, 150.0)).collect();
        let speed: Vec<(f64, f64)> = (0..=180).map(|t| (t as f64, 3.0)).collect();
        activity.heart_rate_series = Some(SampleSeries::from_pairs(&hr));
        activity.speed_series = Some(SampleSeries::from_pairs(&speed));

        assert!(calc.calculate_hr_drift(&activity).is_none());
    }

    #[test]
    fn test_pace_consistency_steady_vs_erratic() {
        let (profile, config) = calc_fixture();
        let calc = ScienceCalculator::new(&profile, &config);

        // Constant-pace fallback splits are perfectly even
        let steady = ActivityRecord::basic("p", SportType::Running, Utc::now(), 5.0, 25.0);
        let consistency = calc.calculate_pace_consistency(&steady).unwrap();
        assert!((consistency - 100.0).abs() < 1e-9);

        // Wildly uneven recorded splits drag the score down
        let mut erratic = ActivityRecord::basic("e", SportType::Running, Utc::now(), 5.0, 27.0);
        erratic.splits = Some(
            [240.0, 420.0, 250.0, 430.0, 280.0]
                .iter()
                .enumerate()
                .map(|(i, &duration_sec)| Split {
                    index: (i + 1) as u32,
                    distance_m: 1000.0,
                    duration_sec,
                    avg_heart_rate: None,
                    avg_power: None,
                    avg_cadence: None,
                    stroke_count: None,
                })
                .collect(),
        );
        let erratic_score = calc.calculate_pace_consistency(&erratic).unwrap();
        assert!(erratic_score < 90.0, "uneven splits scored {erratic_score}");
        assert!(erratic_score < consistency);
    }

    #[test]
    fn test_bundle_never_fails_on_empty_activity() {
        let (profile, config) = calc_fixture();
        let calc = ScienceCalculator::new(&profile, &config);

        let empty = ActivityRecord::basic("e", SportType::Other("rowing".into()), Utc::now(), 0.0, 0.0);
        let bundle = calc.calculate_science(&empty, None);
        assert!(bundle.trimp.is_none());
        assert!(bundle.rss.is_none());
        assert!(bundle.efficiency_factor.is_none());
        // The running FTP estimate only needs the profile
        assert!(bundle.r_ftp_w.is_some());
    }
}
