// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The analysis engine facade.
//!
//! Wraps the intelligence modules behind one struct bound to a validated
//! profile and a calibration snapshot. All computation is synchronous and
//! pure; the [`Analyzer`] trait offers async wrappers that push the heavier
//! calls (AeroLab fits, long-history PMC) onto the blocking pool so async
//! callers never stall their runtime.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::CalibrationConfig;
use crate::errors::EngineError;
use crate::intelligence::{
    biomechanics, pmc, power, prediction, series, zones, AeroFit, FatigueLevel, PowerCurvePoint,
    QuadrantAnalysis, RacePrediction, ScienceCalculator, TrainingInsight, TrainingSummary,
    WPrimeBalance,
};
use crate::models::{
    ActivityRecord, MetricId, PmcPoint, SamplePoint, ScienceBundle, SportType, TrainingPlan,
    UserProfile, Zone,
};

/// Everything the engine derives from a single activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityAnalysis {
    pub science: ScienceBundle,
    pub fatigue: FatigueLevel,
    /// Grade-adjusted pace per elevation interval (min/km)
    pub grade_adjusted_pace: Vec<SamplePoint>,
    /// Ascent velocity per elevation interval (m/h)
    pub vam: Vec<SamplePoint>,
    /// Mean ascent velocity over climbing intervals, when any exist
    pub avg_vam: Option<f64>,
    pub quadrant: Option<QuadrantAnalysis>,
    pub w_prime: Option<WPrimeBalance>,
    pub power_curve: Vec<PowerCurvePoint>,
}

/// The athlete's load state derived from the whole history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingStatus {
    pub chart: Vec<PmcPoint>,
    pub acwr: Option<f64>,
    pub insight: TrainingInsight,
    pub summary: TrainingSummary,
}

impl TrainingStatus {
    /// The most recent chart point, when any history exists.
    pub fn current(&self) -> Option<&PmcPoint> {
        self.chart.last()
    }
}

/// Analysis engine bound to one athlete.
#[derive(Clone)]
pub struct AnalysisEngine {
    profile: Arc<UserProfile>,
    config: Arc<CalibrationConfig>,
}

impl AnalysisEngine {
    /// Build an engine for a profile, rejecting physiologically impossible
    /// setup data up front.
    pub fn new(profile: UserProfile, config: CalibrationConfig) -> Result<Self, EngineError> {
        profile.validate()?;
        info!(
            weight_kg = profile.weight_kg,
            vma_kmh = ?profile.vma_kmh,
            "analysis engine initialized"
        );
        Ok(Self {
            profile: Arc::new(profile),
            config: Arc::new(config),
        })
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// Heart-rate zones from the profile's resting and max HR.
    pub fn hr_zones(&self) -> Result<Vec<Zone>, EngineError> {
        zones::calculate_hr_zones(self.profile.resting_hr, self.profile.max_hr)
    }

    /// Speed zones from the profile's VMA.
    pub fn speed_zones(&self) -> Result<Vec<Zone>, EngineError> {
        let vma = self.profile.vma_kmh.ok_or_else(|| {
            EngineError::InvalidProfile("speed zones require an assessed VMA".into())
        })?;
        zones::calculate_speed_zones(vma)
    }

    /// Running power zones from the speed zones and body weight.
    pub fn running_power_zones(&self) -> Result<Vec<Zone>, EngineError> {
        let speed_zones = self.speed_zones()?;
        zones::calculate_power_zones(
            &speed_zones,
            self.profile.weight_kg,
            self.config.stress.running_energy_cost,
        )
    }

    /// Cycling power zones from an FTP.
    pub fn cycling_power_zones(&self, ftp_watts: f64) -> Result<Vec<Zone>, EngineError> {
        zones::calculate_cycling_power_zones(ftp_watts)
    }

    /// Assemble a training plan snapshot from the profile: thresholds plus
    /// derived speed zones when a VMA is assessed.
    pub fn build_plan(&self) -> TrainingPlan {
        TrainingPlan {
            vma_kmh: self.profile.vma_kmh,
            fcm: Some(self.profile.max_hr),
            vo2max: self.profile.vo2max,
            ftp_watts: None,
            speed_zones: self.speed_zones().ok(),
        }
    }

    /// Full per-activity analysis. Never fails: metrics that cannot be
    /// computed from the available samples come back empty or `None`.
    pub fn analyze_activity_sync(
        &self,
        activity: &ActivityRecord,
        plan: Option<&TrainingPlan>,
    ) -> ActivityAnalysis {
        let calculator = ScienceCalculator::new(&self.profile, &self.config);
        let science = calculator.calculate_science(activity, plan);
        let fatigue = prediction::classify_fatigue(&science, &self.config.fatigue);

        let grade_adjusted_pace = biomechanics::grade_adjusted_pace(activity, &self.config.gap);
        let vam = biomechanics::vam_series(activity);
        let climbing: Vec<f64> = vam.iter().map(|p| p.value).filter(|v| *v > 0.0).collect();
        let avg_vam = series::mean(&climbing);

        let ftp = plan
            .and_then(|p| p.ftp_watts)
            .unwrap_or(self.config.stress.default_ftp_watts);
        let quadrant = biomechanics::quadrant_analysis(activity, ftp);
        let w_prime = if activity.sport == SportType::Cycling {
            power::w_prime_balance(activity, ftp, &self.config.w_prime)
        } else {
            None
        };
        let power_curve =
            power::power_duration_curve(activity, &self.config.power_curve.durations_sec);

        ActivityAnalysis {
            science,
            fatigue,
            grade_adjusted_pace,
            vam,
            avg_vam,
            quadrant,
            w_prime,
            power_curve,
        }
    }

    /// AeroLab CdA/Crr fit for one ride. Separate from
    /// [`Self::analyze_activity_sync`] because the grid search is by far the
    /// most expensive thing the engine does.
    pub fn fit_aero_sync(&self, activity: &ActivityRecord) -> Option<AeroFit> {
        if activity.sport != SportType::Cycling {
            return None;
        }
        power::fit_aero(activity, self.profile.weight_kg, &self.config.aero)
    }

    /// PMC chart, workload ratio, history summary, and the coaching insight,
    /// all as of `today`. Deterministic for a fixed history and date.
    pub fn training_status_sync(
        &self,
        history: &[ActivityRecord],
        plan: Option<&TrainingPlan>,
        today: NaiveDate,
    ) -> TrainingStatus {
        let calculator = ScienceCalculator::new(&self.profile, &self.config);
        let chart = pmc::calculate_daily_pmc(history, &calculator, plan, today);
        let acwr = pmc::acwr(&chart);
        let tsb = chart.last().map_or(0.0, |p| p.tsb);
        let insight = prediction::select_insight(acwr, tsb, &self.config.insight);
        let summary = pmc::global_summary(history, today);

        TrainingStatus {
            chart,
            acwr,
            insight,
            summary,
        }
    }

    /// Race prediction for one sport from the history, falling back to the
    /// profile's VMA.
    pub fn predict_race_sync(
        &self,
        history: &[ActivityRecord],
        sport: &SportType,
        goal_distance_km: f64,
        target_date: NaiveDate,
    ) -> Option<RacePrediction> {
        prediction::predict_performance(
            history,
            self.profile.vma_kmh,
            sport,
            goal_distance_km,
            target_date,
        )
    }
}

/// Scalar value for a metric out of computed results, for UI tables that
/// iterate [`MetricId`] exhaustively. Series-valued metrics surface a summary
/// scalar (mean GAP, mean VAM, minimum W' balance).
pub fn metric_value(
    analysis: &ActivityAnalysis,
    status: Option<&TrainingStatus>,
    aero: Option<&AeroFit>,
    id: MetricId,
) -> Option<f64> {
    let current = status.and_then(TrainingStatus::current);
    match id {
        MetricId::Ctl => current.map(|p| p.ctl),
        MetricId::Atl => current.map(|p| p.atl),
        MetricId::Tsb => current.map(|p| p.tsb),
        MetricId::Acwr => status.and_then(|s| s.acwr),
        MetricId::Trimp => analysis.science.trimp,
        MetricId::Rss => analysis.science.rss,
        MetricId::Rtss => analysis.science.rtss,
        MetricId::EfficiencyFactor => analysis.science.efficiency_factor,
        MetricId::RunningEffectiveness => analysis.science.running_effectiveness,
        MetricId::EnduranceIndex => analysis.science.endurance_index,
        MetricId::Swolf => analysis.science.swolf,
        MetricId::StrokeIndex => analysis.science.stroke_index,
        MetricId::DistancePerStroke => analysis.science.distance_per_stroke,
        MetricId::RunningFtp => analysis.science.r_ftp_w,
        MetricId::HrDrift => analysis.science.hr_drift_pct,
        MetricId::AerobicDecoupling => analysis.science.aerobic_decoupling_pct,
        MetricId::PaceConsistency => analysis.science.pace_consistency,
        MetricId::GradeAdjustedPace => {
            let paces: Vec<f64> = analysis.grade_adjusted_pace.iter().map(|p| p.value).collect();
            series::mean(&paces)
        }
        MetricId::Vam => analysis.avg_vam,
        MetricId::WPrimeBalance => analysis.w_prime.as_ref().map(|w| w.min_joules),
        MetricId::Cda => aero.map(|fit| fit.cda),
        MetricId::Crr => aero.map(|fit| fit.crr),
    }
}

/// Async interface over the engine for server-style callers.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze_activity(
        &self,
        activity: ActivityRecord,
        plan: Option<TrainingPlan>,
    ) -> Result<ActivityAnalysis, EngineError>;

    async fn fit_aero(&self, activity: ActivityRecord) -> Result<Option<AeroFit>, EngineError>;

    async fn training_status(
        &self,
        history: Vec<ActivityRecord>,
        plan: Option<TrainingPlan>,
        today: NaiveDate,
    ) -> Result<TrainingStatus, EngineError>;

    async fn predict_race(
        &self,
        history: Vec<ActivityRecord>,
        sport: SportType,
        goal_distance_km: f64,
        target_date: NaiveDate,
    ) -> Result<Option<RacePrediction>, EngineError>;
}

#[async_trait]
impl Analyzer for AnalysisEngine {
    async fn analyze_activity(
        &self,
        activity: ActivityRecord,
        plan: Option<TrainingPlan>,
    ) -> Result<ActivityAnalysis, EngineError> {
        let engine = self.clone();
        tokio::task::spawn_blocking(move || {
            engine.analyze_activity_sync(&activity, plan.as_ref())
        })
        .await
        .map_err(|e| EngineError::Task(e.to_string()))
    }

    async fn fit_aero(&self, activity: ActivityRecord) -> Result<Option<AeroFit>, EngineError> {
        let engine = self.clone();
        tokio::task::spawn_blocking(move || engine.fit_aero_sync(&activity))
            .await
            .map_err(|e| EngineError::Task(e.to_string()))
    }

    async fn training_status(
        &self,
        history: Vec<ActivityRecord>,
        plan: Option<TrainingPlan>,
        today: NaiveDate,
    ) -> Result<TrainingStatus, EngineError> {
        let engine = self.clone();
        tokio::task::spawn_blocking(move || {
            engine.training_status_sync(&history, plan.as_ref(), today)
        })
        .await
        .map_err(|e| EngineError::Task(e.to_string()))
    }

    async fn predict_race(
        &self,
        history: Vec<ActivityRecord>,
        sport: SportType,
        goal_distance_km: f64,
        target_date: NaiveDate,
    ) -> Result<Option<RacePrediction>, EngineError> {
        let engine = self.clone();
        tokio::task::spawn_blocking(move || {
            engine.predict_race_sync(&history, &sport, goal_distance_km, target_date)
        })
        .await
        .map_err(|e| EngineError::Task(e.to_string()))
    }
}
