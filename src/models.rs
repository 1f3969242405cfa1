// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Data Models
//!
//! Core value types consumed and produced by the analytics engine. The engine
//! never owns or mutates these: activity records and profiles arrive as
//! immutable snapshots from the persistence collaborator, and every result
//! type is a plain serializable value with no behavior.
//!
//! ## Design Principles
//!
//! - **Flat records**: one activity type with optional sample-series fields,
//!   not a class hierarchy per sport
//! - **Tagged optionals**: a missing sensor is `None`, never a sentinel value
//! - **Serializable**: all models support JSON round-trips for caching and
//!   testing
//! - **Derived data is transient**: [`PmcPoint`] series and [`ScienceBundle`]
//!   are recomputed on demand and carry no identity

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::EngineError;

/// Athlete profile snapshot used to parameterize the engine.
///
/// # Examples
///
/// ```rust
/// use orbital_engine::models::UserProfile;
///
/// let profile = UserProfile {
///     age: Some(34),
///     is_female: false,
///     weight_kg: 70.0,
///     resting_hr: 55,
///     max_hr: 190,
///     vma_kmh: Some(16.5),
///     vo2max: Some(55.0),
///     weekly_volume_km: Some(40.0),
///     goal_distance_km: Some(21.1),
///     goal_time_min: None,
///     race_date: None,
/// };
/// assert!(profile.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Age in years
    pub age: Option<u32>,
    /// Sex flag used by the sex-specific TRIMP weighting
    pub is_female: bool,
    /// Body weight in kilograms
    pub weight_kg: f64,
    /// Resting heart rate (BPM)
    pub resting_hr: u32,
    /// Maximum heart rate / FCM (BPM)
    pub max_hr: u32,
    /// Maximal aerobic speed in km/h, if assessed
    pub vma_kmh: Option<f64>,
    /// VO2max in ml/kg/min, if assessed
    pub vo2max: Option<f64>,
    /// Current weekly training volume in kilometers
    pub weekly_volume_km: Option<f64>,
    /// Goal race distance in kilometers
    pub goal_distance_km: Option<f64>,
    /// Goal race time in minutes
    pub goal_time_min: Option<f64>,
    /// Goal race date
    pub race_date: Option<NaiveDate>,
}

impl UserProfile {
    /// Check the physiological invariants the engine relies on.
    ///
    /// Weight must be positive and FCM must exceed the resting heart rate.
    /// This is the only place the engine raises a hard failure; every other
    /// computation degrades to `None` instead.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.weight_kg <= 0.0 {
            return Err(EngineError::InvalidProfile(format!(
                "weight must be positive, got {} kg",
                self.weight_kg
            )));
        }
        if self.resting_hr >= self.max_hr {
            return Err(EngineError::InvalidProfile(format!(
                "resting HR ({}) must be below max HR ({})",
                self.resting_hr, self.max_hr
            )));
        }
        if let Some(vma) = self.vma_kmh {
            if vma <= 0.0 {
                return Err(EngineError::InvalidProfile(format!(
                    "VMA must be positive, got {vma} km/h"
                )));
            }
        }
        Ok(())
    }
}

/// Supported activity types.
///
/// The engine only needs to distinguish the sports whose metrics differ;
/// anything else maps to `Other` and still receives the generic metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SportType {
    /// Running activity
    Running,
    /// Cycling activity
    Cycling,
    /// Swimming activity
    Swimming,
    /// Walking activity
    Walking,
    /// Hiking activity
    Hiking,
    /// Any other activity type
    Other(String),
}

impl SportType {
    /// Human-readable name for summaries and insight messages.
    pub fn display_name(&self) -> &str {
        match self {
            SportType::Running => "run",
            SportType::Cycling => "ride",
            SportType::Swimming => "swim",
            SportType::Walking => "walk",
            SportType::Hiking => "hike",
            SportType::Other(_) => "activity",
        }
    }
}

/// A single time-stamped sensor reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplePoint {
    /// Seconds since activity start
    pub time_offset_sec: f64,
    /// Sensor value (unit depends on the series)
    pub value: f64,
}

/// An ordered sequence of sensor readings for one channel.
///
/// Timestamps are monotonic non-decreasing; [`SampleSeries::new`] sorts its
/// input to guarantee this.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleSeries {
    points: Vec<SamplePoint>,
}

impl SampleSeries {
    /// Build a series, restoring the time-ordering invariant if needed.
    pub fn new(mut points: Vec<SamplePoint>) -> Self {
        points.sort_by(|a, b| {
            a.time_offset_sec
                .partial_cmp(&b.time_offset_sec)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        points.retain(|p| p.time_offset_sec.is_finite() && p.value.is_finite());
        Self { points }
    }

    /// Build a series from `(time_offset_sec, value)` pairs.
    pub fn from_pairs(pairs: &[(f64, f64)]) -> Self {
        Self::new(
            pairs
                .iter()
                .map(|&(t, v)| SamplePoint {
                    time_offset_sec: t,
                    value: v,
                })
                .collect(),
        )
    }

    /// The ordered readings.
    pub fn points(&self) -> &[SamplePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Raw values without timestamps.
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Time covered by the series in seconds (0 for fewer than two points).
    pub fn span_sec(&self) -> f64 {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => last.time_offset_sec - first.time_offset_sec,
            _ => 0.0,
        }
    }

    /// Value of the last sample at or before `t`, if any.
    pub fn value_at(&self, t: f64) -> Option<f64> {
        self.points
            .iter()
            .take_while(|p| p.time_offset_sec <= t)
            .last()
            .map(|p| p.value)
    }

    /// Arithmetic mean of the values, `None` when empty.
    pub fn mean(&self) -> Option<f64> {
        if self.points.is_empty() {
            return None;
        }
        Some(self.points.iter().map(|p| p.value).sum::<f64>() / self.points.len() as f64)
    }
}

/// Per-distance-unit aggregate (1 km, or 100 m for swims).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Split {
    /// 1-based split index
    pub index: u32,
    /// Distance covered by this split in meters
    pub distance_m: f64,
    /// Split duration in seconds
    pub duration_sec: f64,
    /// Average heart rate over the split (BPM)
    pub avg_heart_rate: Option<f64>,
    /// Average power over the split (W)
    pub avg_power: Option<f64>,
    /// Average cadence over the split
    pub avg_cadence: Option<f64>,
    /// Stroke count for swim laps
    pub stroke_count: Option<u32>,
}

/// A recorded activity handed to the engine as an immutable snapshot.
///
/// Scalar averages and sample series are both optional; every metric that
/// needs an absent channel comes back as `None` rather than failing the
/// whole computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Provider-supplied identifier
    pub id: String,
    /// Type of sport
    pub sport: SportType,
    /// When the activity started (UTC)
    pub start_date: DateTime<Utc>,
    /// Total distance in kilometers
    pub distance_km: f64,
    /// Total duration in minutes
    pub duration_min: f64,
    /// Average heart rate (BPM)
    pub avg_heart_rate: Option<f64>,
    /// Average power (W)
    pub avg_power: Option<f64>,
    /// Average cadence (RPM or strides/min)
    pub avg_cadence: Option<f64>,
    /// Ambient temperature (Celsius)
    pub temperature_c: Option<f64>,
    /// Total elevation gain in meters
    pub elevation_gain_m: Option<f64>,
    /// Heart-rate samples (BPM)
    pub heart_rate_series: Option<SampleSeries>,
    /// Speed samples (m/s)
    pub speed_series: Option<SampleSeries>,
    /// Power samples (W)
    pub power_series: Option<SampleSeries>,
    /// Elevation samples (m)
    pub elevation_series: Option<SampleSeries>,
    /// Cadence samples (RPM or strides/min)
    pub cadence_series: Option<SampleSeries>,
    /// Stride length samples (m)
    pub stride_length_series: Option<SampleSeries>,
    /// Ground contact time samples (ms)
    pub ground_contact_series: Option<SampleSeries>,
    /// Vertical oscillation samples (cm)
    pub vertical_oscillation_series: Option<SampleSeries>,
    /// Recorded splits, when the device provides them
    pub splits: Option<Vec<Split>>,
}

impl ActivityRecord {
    /// Duration in seconds.
    pub fn duration_sec(&self) -> f64 {
        self.duration_min * 60.0
    }

    /// Average speed in m/s, preferring the recorded series over the
    /// distance/duration quotient.
    pub fn avg_speed_ms(&self) -> Option<f64> {
        if let Some(series) = &self.speed_series {
            if let Some(mean) = series.mean() {
                return Some(mean);
            }
        }
        if self.duration_min > 0.0 && self.distance_km > 0.0 {
            return Some(self.distance_km * 1000.0 / self.duration_sec());
        }
        None
    }

    /// Calendar day the activity occurred on.
    pub fn date(&self) -> NaiveDate {
        self.start_date.date_naive()
    }

    /// Total elevation gain in meters, preferring the recorded scalar over
    /// the sum of positive deltas in the elevation series.
    pub fn elevation_gain(&self) -> Option<f64> {
        if let Some(gain) = self.elevation_gain_m {
            return Some(gain);
        }
        let series = self.elevation_series.as_ref()?;
        if series.len() < 2 {
            return None;
        }
        let gain: f64 = series
            .points()
            .windows(2)
            .map(|pair| (pair[1].value - pair[0].value).max(0.0))
            .sum();
        Some(gain)
    }

    /// Minimal record with only the required scalar fields set.
    pub fn basic(
        id: &str,
        sport: SportType,
        start_date: DateTime<Utc>,
        distance_km: f64,
        duration_min: f64,
    ) -> Self {
        Self {
            id: id.to_string(),
            sport,
            start_date,
            distance_km,
            duration_min,
            avg_heart_rate: None,
            avg_power: None,
            avg_cadence: None,
            temperature_c: None,
            elevation_gain_m: None,
            heart_rate_series: None,
            speed_series: None,
            power_series: None,
            elevation_series: None,
            cadence_series: None,
            stride_length_series: None,
            ground_contact_series: None,
            vertical_oscillation_series: None,
            splits: None,
        }
    }
}

/// Zone and threshold data supplied by the onboarding/profile collaborator.
///
/// When present it overrides the engine's configured defaults for threshold
/// power and pace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingPlan {
    /// Maximal aerobic speed in km/h
    pub vma_kmh: Option<f64>,
    /// Maximum heart rate (BPM)
    pub fcm: Option<u32>,
    /// VO2max in ml/kg/min
    pub vo2max: Option<f64>,
    /// Functional threshold power in watts
    pub ftp_watts: Option<f64>,
    /// Precomputed speed zones, easiest first
    pub speed_zones: Option<Vec<Zone>>,
}

/// A training zone with inclusive-low/exclusive-high numeric bounds.
///
/// Zone arrays are always exactly five entries, ordered easiest-first,
/// contiguous and non-overlapping. The top zone may be unbounded above
/// (`upper == f64::INFINITY`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    /// Zone id, 1 (easiest) through 5
    pub number: u8,
    /// Lower bound, inclusive
    pub lower: f64,
    /// Upper bound, exclusive (infinite for the top zone)
    pub upper: f64,
    /// Display label
    pub label: String,
}

impl Zone {
    /// Whether `value` falls inside this zone.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && (value < self.upper || self.upper.is_infinite())
    }
}

/// One day of the Performance Management Chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PmcPoint {
    /// Calendar day
    pub date: NaiveDate,
    /// Total training stress recorded that day
    pub stress: f64,
    /// Chronic training load (42-day impulse response)
    pub ctl: f64,
    /// Acute training load (7-day impulse response)
    pub atl: f64,
    /// Training stress balance (CTL - ATL)
    pub tsb: f64,
}

/// Per-activity science metrics. Every field degrades to `None` when its
/// inputs are missing or degenerate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScienceBundle {
    /// Training impulse (Banister)
    pub trimp: Option<f64>,
    /// Running/riding stress score from power data
    pub rss: Option<f64>,
    /// Running stress score from grade-adjusted pace
    pub rtss: Option<f64>,
    /// Efficiency factor (speed per heart beat)
    pub efficiency_factor: Option<f64>,
    /// Running effectiveness (speed per W/kg)
    pub running_effectiveness: Option<f64>,
    /// Endurance index (speed decay vs reference effort)
    pub endurance_index: Option<f64>,
    /// Average SWOLF score (swim)
    pub swolf: Option<f64>,
    /// Stroke index (swim)
    pub stroke_index: Option<f64>,
    /// Distance per stroke in meters (swim)
    pub distance_per_stroke: Option<f64>,
    /// Estimated running FTP in watts
    pub r_ftp_w: Option<f64>,
    /// Heart-rate drift between activity halves (percent)
    pub hr_drift_pct: Option<f64>,
    /// Aerobic decoupling between activity halves (percent)
    pub aerobic_decoupling_pct: Option<f64>,
    /// Pace consistency score, 0-100
    pub pace_consistency: Option<f64>,
}

/// Closed enumeration of every metric the engine can explain.
///
/// UI lookups go through this enum instead of metric-name strings so that
/// coverage stays exhaustive at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricId {
    Ctl,
    Atl,
    Tsb,
    Acwr,
    Trimp,
    Rss,
    Rtss,
    EfficiencyFactor,
    RunningEffectiveness,
    EnduranceIndex,
    Swolf,
    StrokeIndex,
    DistancePerStroke,
    RunningFtp,
    HrDrift,
    AerobicDecoupling,
    PaceConsistency,
    GradeAdjustedPace,
    Vam,
    WPrimeBalance,
    Cda,
    Crr,
}

impl MetricId {
    /// Short display name.
    pub fn display_name(self) -> &'static str {
        match self {
            MetricId::Ctl => "CTL",
            MetricId::Atl => "ATL",
            MetricId::Tsb => "TSB",
            MetricId::Acwr => "ACWR",
            MetricId::Trimp => "TRIMP",
            MetricId::Rss => "RSS",
            MetricId::Rtss => "rTSS",
            MetricId::EfficiencyFactor => "Efficiency Factor",
            MetricId::RunningEffectiveness => "Running Effectiveness",
            MetricId::EnduranceIndex => "Endurance Index",
            MetricId::Swolf => "SWOLF",
            MetricId::StrokeIndex => "Stroke Index",
            MetricId::DistancePerStroke => "Distance per Stroke",
            MetricId::RunningFtp => "Running FTP",
            MetricId::HrDrift => "HR Drift",
            MetricId::AerobicDecoupling => "Aerobic Decoupling",
            MetricId::PaceConsistency => "Pace Consistency",
            MetricId::GradeAdjustedPace => "Grade-Adjusted Pace",
            MetricId::Vam => "VAM",
            MetricId::WPrimeBalance => "W' Balance",
            MetricId::Cda => "CdA",
            MetricId::Crr => "Crr",
        }
    }

    /// One-line explanation suitable for an info dialog.
    pub fn explanation(self) -> &'static str {
        match self {
            MetricId::Ctl => "Chronic training load: 42-day weighted average of daily stress, a proxy for fitness.",
            MetricId::Atl => "Acute training load: 7-day weighted average of daily stress, a proxy for fatigue.",
            MetricId::Tsb => "Training stress balance: CTL minus ATL, positive when fresh.",
            MetricId::Acwr => "Acute:chronic workload ratio over 7 vs 28 days, an injury-risk proxy.",
            MetricId::Trimp => "Training impulse: duration weighted by heart-rate reserve intensity.",
            MetricId::Rss => "Stress score from power relative to threshold power.",
            MetricId::Rtss => "Running stress score from grade-adjusted pace relative to threshold pace.",
            MetricId::EfficiencyFactor => "Speed produced per heart beat; higher is better.",
            MetricId::RunningEffectiveness => "Speed per watt of body-mass-relative power; around 1.0 is typical.",
            MetricId::EnduranceIndex => "How well pace holds up as duration grows beyond the reference effort.",
            MetricId::Swolf => "Lap seconds plus strokes per lap; lower is more efficient swimming.",
            MetricId::StrokeIndex => "Swim speed multiplied by distance per stroke.",
            MetricId::DistancePerStroke => "Meters traveled per swim stroke.",
            MetricId::RunningFtp => "Estimated running functional threshold power in watts.",
            MetricId::HrDrift => "Rise of the HR-to-speed ratio between activity halves at matched effort.",
            MetricId::AerobicDecoupling => "Loss of pace-per-heartbeat efficiency between activity halves.",
            MetricId::PaceConsistency => "100 minus the pace coefficient of variation, clamped to 0-100.",
            MetricId::GradeAdjustedPace => "Pace normalized for terrain slope.",
            MetricId::Vam => "Mean ascent velocity in meters climbed per hour.",
            MetricId::WPrimeBalance => "Remaining anaerobic work capacity above critical power.",
            MetricId::Cda => "Aerodynamic drag coefficient times frontal area, fitted from the ride.",
            MetricId::Crr => "Rolling resistance coefficient, fitted from the ride.",
        }
    }
}
