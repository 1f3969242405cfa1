// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Property-style checks over the load model: the invariants here must hold
//! for any activity history, not just the happy path.

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use orbital_engine::config::CalibrationConfig;
use orbital_engine::intelligence::{pmc, ScienceCalculator};
use orbital_engine::models::{ActivityRecord, SportType, UserProfile};

fn profile() -> UserProfile {
    UserProfile {
        age: Some(30),
        is_female: true,
        weight_kg: 58.0,
        resting_hr: 52,
        max_hr: 186,
        vma_kmh: Some(17.5),
        vo2max: None,
        weekly_volume_km: Some(60.0),
        goal_distance_km: None,
        goal_time_min: None,
        race_date: None,
    }
}

/// Pseudo-random but deterministic history: varied sports, distances, HRs,
/// rest days, and same-day doubles.
fn varied_history(days: i64) -> Vec<ActivityRecord> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 7, 0, 0).unwrap();
    let mut history = Vec::new();
    for d in 0..days {
        // Skip every fifth day entirely
        if d % 5 == 4 {
            continue;
        }
        let sport = match d % 3 {
            0 => SportType::Running,
            1 => SportType::Cycling,
            _ => SportType::Swimming,
        };
        let mut activity = ActivityRecord::basic(
            &format!("a-{d}"),
            sport,
            start + Duration::days(d),
            5.0 + (d % 7) as f64 * 2.0,
            30.0 + (d % 4) as f64 * 15.0,
        );
        activity.avg_heart_rate = Some(130.0 + (d % 30) as f64);
        history.push(activity);

        // Occasional double day
        if d % 9 == 0 {
            history.push(ActivityRecord::basic(
                &format!("b-{d}"),
                SportType::Running,
                start + Duration::days(d) + Duration::hours(10),
                4.0,
                22.0,
            ));
        }
    }
    history
}

#[test]
fn chart_holds_structural_invariants_for_any_history() {
    let p = profile();
    let config = CalibrationConfig::default();
    let calculator = ScienceCalculator::new(&p, &config);
    let history = varied_history(90);
    let today = NaiveDate::from_ymd_opt(2024, 4, 10).unwrap();

    let chart = pmc::calculate_daily_pmc(&history, &calculator, None, today);

    // One point per calendar day, gapless, ending at today
    assert_eq!(chart.first().unwrap().date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    assert_eq!(chart.last().unwrap().date, today);
    for pair in chart.windows(2) {
        assert_eq!(pair[1].date - pair[0].date, Duration::days(1));
    }

    for point in &chart {
        assert!(point.stress >= 0.0);
        assert!(point.ctl >= 0.0);
        assert!(point.atl >= 0.0);
        assert!((point.tsb - (point.ctl - point.atl)).abs() < 1e-12);
        assert!(point.ctl.is_finite() && point.atl.is_finite());
    }
}

#[test]
fn chart_is_deterministic_and_order_independent() {
    let p = profile();
    let config = CalibrationConfig::default();
    let calculator = ScienceCalculator::new(&p, &config);
    let today = NaiveDate::from_ymd_opt(2024, 4, 10).unwrap();

    let history = varied_history(60);
    let mut shuffled = history.clone();
    shuffled.reverse();

    let a = pmc::calculate_daily_pmc(&history, &calculator, None, today);
    let b = pmc::calculate_daily_pmc(&shuffled, &calculator, None, today);

    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(&b) {
        assert_eq!(x.date, y.date);
        assert_eq!(x.stress, y.stress);
        assert_eq!(x.ctl, y.ctl);
        assert_eq!(x.atl, y.atl);
    }
}

#[test]
fn atl_responds_faster_than_ctl() {
    let p = profile();
    let config = CalibrationConfig::default();
    let calculator = ScienceCalculator::new(&p, &config);

    // Quiet month then a sudden hard week
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 7, 0, 0).unwrap();
    let mut history: Vec<ActivityRecord> = (0..28)
        .map(|d| {
            let mut a = ActivityRecord::basic(
                &format!("e-{d}"),
                SportType::Running,
                start + Duration::days(d),
                4.0,
                20.0,
            );
            a.avg_heart_rate = Some(120.0);
            a
        })
        .collect();
    for d in 28..35 {
        let mut a = ActivityRecord::basic(
            &format!("h-{d}"),
            SportType::Running,
            start + Duration::days(d),
            18.0,
            95.0,
        );
        a.avg_heart_rate = Some(165.0);
        history.push(a);
    }

    let today = NaiveDate::from_ymd_opt(2024, 2, 4).unwrap();
    let chart = pmc::calculate_daily_pmc(&history, &calculator, None, today);

    let before_spike = &chart[27];
    let after_spike = chart.last().unwrap();
    let atl_rise = after_spike.atl - before_spike.atl;
    let ctl_rise = after_spike.ctl - before_spike.ctl;
    assert!(atl_rise > ctl_rise, "fatigue must outpace fitness in a spike");
    assert!(after_spike.tsb < before_spike.tsb);
}

#[test]
fn acwr_flags_the_same_spike() {
    let p = profile();
    let config = CalibrationConfig::default();
    let calculator = ScienceCalculator::new(&p, &config);

    let start = Utc.with_ymd_and_hms(2024, 1, 1, 7, 0, 0).unwrap();
    let mut history: Vec<ActivityRecord> = (0..28)
        .map(|d| {
            let mut a = ActivityRecord::basic(
                &format!("e-{d}"),
                SportType::Running,
                start + Duration::days(d),
                4.0,
                20.0,
            );
            a.avg_heart_rate = Some(120.0);
            a
        })
        .collect();
    let steady_chart = pmc::calculate_daily_pmc(
        &history,
        &calculator,
        None,
        NaiveDate::from_ymd_opt(2024, 1, 28).unwrap(),
    );
    let steady_ratio = pmc::acwr(&steady_chart).unwrap();
    assert!((steady_ratio - 1.0).abs() < 0.15);

    for d in 28..35 {
        let mut a = ActivityRecord::basic(
            &format!("h-{d}"),
            SportType::Running,
            start + Duration::days(d),
            18.0,
            95.0,
        );
        a.avg_heart_rate = Some(165.0);
        history.push(a);
    }
    let spiked_chart = pmc::calculate_daily_pmc(
        &history,
        &calculator,
        None,
        NaiveDate::from_ymd_opt(2024, 2, 4).unwrap(),
    );
    let spiked_ratio = pmc::acwr(&spiked_chart).unwrap();
    assert!(spiked_ratio > steady_ratio + 0.5, "spike ratio {spiked_ratio}");
}

#[test]
fn summary_streaks_and_eddington_track_the_history() {
    let history = varied_history(30);
    let today = NaiveDate::from_ymd_opt(2024, 1, 30).unwrap();
    let summary = pmc::global_summary(&history, today);

    assert_eq!(summary.total_activities, history.len());
    assert!(summary.total_distance_km > 0.0);
    // Every fifth day rests, so no streak passes four days
    assert_eq!(summary.longest_streak_days, 4);
    assert!(summary.eddington_km >= 5);
    assert!(summary.eddington_km as f64 <= summary.total_distance_km);
}
