// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Performance Management Chart: daily CTL/ATL/TSB from the activity
//! history, the acute:chronic workload ratio, and whole-history summary
//! stats.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::pmc;
use crate::intelligence::science::ScienceCalculator;
use crate::models::{ActivityRecord, PmcPoint, TrainingPlan};

/// Daily training stress for every calendar day from the first activity
/// through `today`, rest days included at zero.
///
/// Each activity contributes its power-based stress score when one can be
/// computed, its pace-based score otherwise, and TRIMP as the heart-rate
/// fallback; activities yielding none of the three count as zero.
fn daily_stress(
    history: &[ActivityRecord],
    calculator: &ScienceCalculator<'_>,
    plan: Option<&TrainingPlan>,
) -> BTreeMap<NaiveDate, f64> {
    let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for activity in history {
        let bundle = calculator.calculate_science(activity, plan);
        let stress = bundle
            .rss
            .or(bundle.rtss)
            .or(bundle.trimp)
            .unwrap_or(0.0);
        *by_day.entry(activity.date()).or_insert(0.0) += stress;
    }
    by_day
}

/// Compute the Performance Management Chart over the full history.
///
/// Produces exactly one point per calendar day from the earliest activity
/// through `today`. CTL and ATL follow the impulse-response recursion with
/// 42- and 7-day time constants, seeded at the first day's stress so the
/// chart does not start from an artificial zero. Deterministic: the same
/// history and `today` always yield the same chart.
pub fn calculate_daily_pmc(
    history: &[ActivityRecord],
    calculator: &ScienceCalculator<'_>,
    plan: Option<&TrainingPlan>,
    today: NaiveDate,
) -> Vec<PmcPoint> {
    let stress_by_day = daily_stress(history, calculator, plan);
    let first_day = match stress_by_day.keys().next() {
        Some(day) => *day,
        None => return Vec::new(),
    };
    if first_day > today {
        return Vec::new();
    }

    let days = (today - first_day).num_days();
    let mut out = Vec::with_capacity(days as usize + 1);

    let seed = stress_by_day.get(&first_day).copied().unwrap_or(0.0);
    let mut ctl = seed;
    let mut atl = seed;
    out.push(PmcPoint {
        date: first_day,
        stress: seed,
        ctl,
        atl,
        tsb: ctl - atl,
    });

    for offset in 1..=days {
        let date = first_day + Duration::days(offset);
        let stress = stress_by_day.get(&date).copied().unwrap_or(0.0);
        ctl += (stress - ctl) / pmc::CTL_TIME_CONSTANT_DAYS;
        atl += (stress - atl) / pmc::ATL_TIME_CONSTANT_DAYS;
        out.push(PmcPoint {
            date,
            stress,
            ctl,
            atl,
            tsb: ctl - atl,
        });
    }

    debug!(days = out.len(), "pmc chart computed");
    out
}

/// Acute:chronic workload ratio at the end of a PMC chart.
///
/// Acute load is the stress summed over the trailing 7 days; chronic load is
/// the mean weekly stress over the trailing 28 days. `None` when the chart
/// spans less than a full acute window or the chronic load is zero (a ratio
/// against zero means nothing).
pub fn acwr(chart: &[PmcPoint]) -> Option<f64> {
    if (chart.len() as i64) < pmc::ACWR_ACUTE_WINDOW_DAYS {
        return None;
    }
    let last = chart.last()?;
    let acute_start = last.date - Duration::days(pmc::ACWR_ACUTE_WINDOW_DAYS - 1);
    let chronic_start = last.date - Duration::days(pmc::ACWR_CHRONIC_WINDOW_DAYS - 1);

    let acute: f64 = chart
        .iter()
        .filter(|p| p.date >= acute_start)
        .map(|p| p.stress)
        .sum();
    let chronic: f64 = chart
        .iter()
        .filter(|p| p.date >= chronic_start)
        .map(|p| p.stress)
        .sum();

    let chronic_weekly = chronic / (pmc::ACWR_CHRONIC_WINDOW_DAYS as f64 / 7.0);
    if chronic_weekly <= 0.0 {
        return None;
    }
    Some(acute / chronic_weekly)
}

/// Whole-history aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub total_activities: usize,
    pub total_distance_km: f64,
    pub total_duration_hours: f64,
    /// Summed elevation gain across the history (m), from the recorded
    /// scalar or the elevation series of each activity.
    pub total_elevation_gain_m: f64,
    /// Largest E such that E distinct days carried at least E kilometers.
    pub eddington_km: u32,
    /// Consecutive training days ending at `today` (or yesterday, so a
    /// morning query does not zero an unbroken evening streak).
    pub current_streak_days: u32,
    pub longest_streak_days: u32,
}

/// Summarize the full activity history.
pub fn global_summary(history: &[ActivityRecord], today: NaiveDate) -> TrainingSummary {
    let total_distance_km: f64 = history.iter().map(|a| a.distance_km).sum();
    let total_duration_hours: f64 = history.iter().map(|a| a.duration_min).sum::<f64>() / 60.0;
    let total_elevation_gain_m: f64 = history
        .iter()
        .filter_map(ActivityRecord::elevation_gain)
        .sum();

    // Eddington over daily kilometer totals
    let mut km_by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for activity in history {
        *km_by_day.entry(activity.date()).or_insert(0.0) += activity.distance_km;
    }
    let mut daily_km: Vec<f64> = km_by_day.values().copied().collect();
    daily_km.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    let mut eddington_km = 0u32;
    for (i, km) in daily_km.iter().enumerate() {
        if *km >= (i + 1) as f64 {
            eddington_km = (i + 1) as u32;
        } else {
            break;
        }
    }

    let active_days: BTreeSet<NaiveDate> = km_by_day.keys().copied().collect();
    let (current_streak_days, longest_streak_days) = streaks(&active_days, today);

    TrainingSummary {
        total_activities: history.len(),
        total_distance_km,
        total_duration_hours,
        total_elevation_gain_m,
        eddington_km,
        current_streak_days,
        longest_streak_days,
    }
}

fn streaks(active_days: &BTreeSet<NaiveDate>, today: NaiveDate) -> (u32, u32) {
    let mut longest = 0u32;
    let mut run = 0u32;
    let mut prev: Option<NaiveDate> = None;
    for &day in active_days {
        run = match prev {
            Some(p) if day - p == Duration::days(1) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(day);
    }

    let anchor = if active_days.contains(&today) {
        Some(today)
    } else if active_days.contains(&(today - Duration::days(1))) {
        Some(today - Duration::days(1))
    } else {
        None
    };
    let current = match anchor {
        Some(mut day) => {
            let mut count = 0u32;
            while active_days.contains(&day) {
                count += 1;
                day -= Duration::days(1);
            }
            count
        }
        None => 0,
    };

    (current, longest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CalibrationConfig;
    use crate::models::{SportType, UserProfile};

    fn profile() -> UserProfile {
        UserProfile {
            age: Some(35),
            is_female: false,
            weight_kg: 70.0,
            resting_hr: 60,
            max_hr: 190,
            vma_kmh: Some(16.0),
            vo2max: None,
            weekly_volume_km: Some(40.0),
            goal_distance_km: None,
            goal_time_min: None,
            race_date: None,
        }
    }

    fn run_on(day: &str, distance_km: f64, duration_min: f64, avg_hr: Option<f64>) -> ActivityRecord {
        let date = format!("{day}T08:00:00Z").parse().unwrap();
        let mut activity = ActivityRecord::basic(day, SportType::Running, date, distance_km, duration_min);
        activity.avg_heart_rate = avg_hr;
        activity
    }

    fn ride_with_stress(day: &str, watts: f64, duration_min: f64) -> ActivityRecord {
        let date = format!("{day}T08:00:00Z").parse().unwrap();
        let mut activity =
            ActivityRecord::basic(day, SportType::Cycling, date, 30.0, duration_min);
        activity.avg_power = Some(watts);
        activity
    }

    #[test]
    fn test_pmc_reference_three_days() {
        // Daily stresses [50, 0, 80]: seeded at 50, then the recursion
        let p = profile();
        let config = CalibrationConfig::default();
        let calculator = ScienceCalculator::new(&p, &config);

        // FTP defaults to 220 W; one hour at 220 W is RSS 100, so scale
        // average power to hit the target stresses.
        let history = vec![
            ride_with_stress("2024-03-01", 220.0 * 0.5f64.sqrt(), 60.0),
            ride_with_stress("2024-03-03", 220.0 * 0.8f64.sqrt(), 60.0),
        ];
        let today = NaiveDate::from_ymd_opt(2024, 3, 3).unwrap();
        let chart = calculate_daily_pmc(&history, &calculator, None, today);

        assert_eq!(chart.len(), 3);
        assert!((chart[0].stress - 50.0).abs() < 0.5);
        assert_eq!(chart[0].ctl, chart[0].atl);
        assert!((chart[0].tsb).abs() < 1e-9);

        // Day 2 rest: ctl = 50 + (0-50)/42, atl = 50 + (0-50)/7
        assert!((chart[1].ctl - (50.0 - 50.0 / 42.0)).abs() < 0.5);
        assert!((chart[1].atl - (50.0 - 50.0 / 7.0)).abs() < 0.5);
        // ATL decays faster, so form goes positive on the rest day
        assert!(chart[1].tsb > 0.0);

        // Day 3: a hard day pushes ATL over CTL
        assert!((chart[2].stress - 80.0).abs() < 0.5);
        assert!(chart[2].tsb < chart[1].tsb);
    }

    #[test]
    fn test_pmc_one_point_per_day_and_deterministic() {
        let p = profile();
        let config = CalibrationConfig::default();
        let calculator = ScienceCalculator::new(&p, &config);
        let history = vec![
            run_on("2024-03-01", 10.0, 50.0, Some(150.0)),
            run_on("2024-03-01", 5.0, 25.0, Some(140.0)),
            run_on("2024-03-05", 12.0, 60.0, Some(155.0)),
        ];
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();

        let chart = calculate_daily_pmc(&history, &calculator, None, today);
        assert_eq!(chart.len(), 10);
        for pair in chart.windows(2) {
            assert_eq!(pair[1].date - pair[0].date, Duration::days(1));
        }
        // Two same-day runs sum into one point
        assert!(chart[0].stress > 0.0);
        assert_eq!(chart[1].stress, 0.0);

        let again = calculate_daily_pmc(&history, &calculator, None, today);
        for (a, b) in chart.iter().zip(&again) {
            assert_eq!(a.ctl, b.ctl);
            assert_eq!(a.atl, b.atl);
        }
    }

    #[test]
    fn test_pmc_invariants_hold() {
        let p = profile();
        let config = CalibrationConfig::default();
        let calculator = ScienceCalculator::new(&p, &config);
        let history: Vec<ActivityRecord> = (1..=20)
            .map(|d| run_on(&format!("2024-03-{d:02}"), 8.0, 40.0, Some(145.0)))
            .collect();
        let today = NaiveDate::from_ymd_opt(2024, 3, 25).unwrap();

        let chart = calculate_daily_pmc(&history, &calculator, None, today);
        for point in &chart {
            assert!(point.ctl >= 0.0);
            assert!(point.atl >= 0.0);
            assert!((point.tsb - (point.ctl - point.atl)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_pmc_empty_history() {
        let p = profile();
        let config = CalibrationConfig::default();
        let calculator = ScienceCalculator::new(&p, &config);
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert!(calculate_daily_pmc(&[], &calculator, None, today).is_empty());
    }

    fn chart_with_daily_stress(stress: f64, days: i64) -> Vec<PmcPoint> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..days)
            .map(|d| PmcPoint {
                date: start + Duration::days(d),
                stress,
                ctl: 0.0,
                atl: 0.0,
                tsb: 0.0,
            })
            .collect()
    }

    #[test]
    fn test_acwr_steady_load_is_one() {
        let chart = chart_with_daily_stress(50.0, 40);
        let ratio = acwr(&chart).unwrap();
        assert!((ratio - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_acwr_spike_detected() {
        let mut chart = chart_with_daily_stress(30.0, 40);
        for point in chart.iter_mut().rev().take(7) {
            point.stress = 90.0;
        }
        let ratio = acwr(&chart).unwrap();
        assert!(ratio > 1.5, "spiked load gave ratio {ratio}");
    }

    #[test]
    fn test_acwr_none_without_chronic_load() {
        assert!(acwr(&[]).is_none());
        assert!(acwr(&chart_with_daily_stress(0.0, 40)).is_none());
        // Less than a full acute window of history
        assert!(acwr(&chart_with_daily_stress(50.0, 5)).is_none());
    }

    #[test]
    fn test_global_summary_totals_and_eddington() {
        let mut history: Vec<ActivityRecord> = vec![
            run_on("2024-03-01", 5.0, 25.0, None),
            run_on("2024-03-02", 3.0, 15.0, None),
            run_on("2024-03-03", 4.0, 20.0, None),
            run_on("2024-03-05", 2.0, 10.0, None),
        ];
        // One recorded gain scalar, one derived from the elevation series
        // (+30 m climbed, the descent does not count)
        history[0].elevation_gain_m = Some(120.0);
        history[1].elevation_series = Some(crate::models::SampleSeries::from_pairs(&[
            (0.0, 100.0),
            (300.0, 130.0),
            (600.0, 110.0),
        ]));
        let today = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let summary = global_summary(&history, today);

        assert_eq!(summary.total_activities, 4);
        assert!((summary.total_distance_km - 14.0).abs() < 1e-9);
        assert!((summary.total_duration_hours - 70.0 / 60.0).abs() < 1e-9);
        assert!((summary.total_elevation_gain_m - 150.0).abs() < 1e-9);
        // Days with [5, 4, 3, 2] km: 3 days had >= 3 km
        assert_eq!(summary.eddington_km, 3);
    }

    #[test]
    fn test_streaks() {
        let history: Vec<ActivityRecord> = vec![
            run_on("2024-03-01", 5.0, 25.0, None),
            run_on("2024-03-02", 5.0, 25.0, None),
            run_on("2024-03-03", 5.0, 25.0, None),
            run_on("2024-03-07", 5.0, 25.0, None),
            run_on("2024-03-08", 5.0, 25.0, None),
        ];

        // Queried the morning after the last run, the streak survives
        let summary = global_summary(
            &history,
            NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
        );
        assert_eq!(summary.longest_streak_days, 3);
        assert_eq!(summary.current_streak_days, 2);

        // Two days later it is broken
        let later = global_summary(
            &history,
            NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(),
        );
        assert_eq!(later.current_streak_days, 0);
        assert_eq!(later.longest_streak_days, 3);
    }
}
