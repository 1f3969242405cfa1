// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Training zone derivation.
//!
//! Heart-rate zones are percentage bands of heart-rate reserve, speed zones
//! are percentage bands of VMA, and power zones come either from the running
//! power model applied to the speed zones or from FTP bands for cycling.
//! Every derivation returns exactly five contiguous, ordered zones.

use crate::errors::EngineError;
use crate::models::Zone;

/// Heart-rate reserve band boundaries, Z1 through Z5.
const HR_RESERVE_BANDS: [f64; 6] = [0.0, 0.60, 0.70, 0.80, 0.90, 1.0];

/// VMA percentage band boundaries. The top zone is unbounded above.
const VMA_BANDS: [f64; 5] = [0.0, 0.75, 0.85, 0.95, 1.00];

/// Cycling FTP percentage band boundaries (Coggan-style).
const FTP_BANDS: [f64; 5] = [0.0, 0.55, 0.75, 0.90, 1.05];

const ZONE_LABELS: [&str; 5] = ["Recovery", "Endurance", "Tempo", "Threshold", "VO2max"];

fn labelled(number: u8, lower: f64, upper: f64) -> Zone {
    Zone {
        number,
        lower,
        upper,
        label: ZONE_LABELS[(number - 1) as usize].to_string(),
    }
}

/// Derive the five heart-rate zones from resting HR and FCM.
///
/// Bands are percentages of the heart-rate reserve mapped back to absolute
/// BPM via `resting + pct * (fcm - resting)`; zone 1 starts at the resting
/// rate and zone 5 tops out at FCM.
pub fn calculate_hr_zones(resting_hr: u32, fcm: u32) -> Result<Vec<Zone>, EngineError> {
    if resting_hr >= fcm {
        return Err(EngineError::InvalidProfile(format!(
            "resting HR ({resting_hr}) must be below max HR ({fcm})"
        )));
    }

    let reserve = (fcm - resting_hr) as f64;
    let base = resting_hr as f64;

    Ok((0..5)
        .map(|i| {
            labelled(
                (i + 1) as u8,
                base + HR_RESERVE_BANDS[i] * reserve,
                base + HR_RESERVE_BANDS[i + 1] * reserve,
            )
        })
        .collect())
}

/// Derive the five speed zones (km/h) from VMA.
///
/// Each zone is a `[min, max)` interval; the union covers `[0, +inf)` with
/// the top zone unbounded above.
pub fn calculate_speed_zones(vma_kmh: f64) -> Result<Vec<Zone>, EngineError> {
    if vma_kmh <= 0.0 || !vma_kmh.is_finite() {
        return Err(EngineError::InvalidProfile(format!(
            "VMA must be positive, got {vma_kmh} km/h"
        )));
    }

    Ok((0..5)
        .map(|i| {
            let upper = if i == 4 {
                f64::INFINITY
            } else {
                VMA_BANDS[i + 1] * vma_kmh
            };
            labelled((i + 1) as u8, VMA_BANDS[i] * vma_kmh, upper)
        })
        .collect())
}

/// Derive running power zones (W) from speed zones and body weight using the
/// energy-cost model `P = v * weight * cost`.
///
/// `energy_cost` is the running energy cost in kJ/kg/km (see
/// [`crate::config::StressConfig`]), numerically equal to J/kg/m, so the
/// product with speed in m/s and mass in kg comes out in watts.
pub fn calculate_power_zones(
    speed_zones: &[Zone],
    weight_kg: f64,
    energy_cost: f64,
) -> Result<Vec<Zone>, EngineError> {
    if weight_kg <= 0.0 {
        return Err(EngineError::InvalidProfile(format!(
            "weight must be positive, got {weight_kg} kg"
        )));
    }

    let to_watts = |speed_kmh: f64| -> f64 {
        if speed_kmh.is_infinite() {
            f64::INFINITY
        } else {
            // kJ/kg/km is numerically J/kg/m, so P = v(m/s) * cost * mass
            speed_kmh / 3.6 * energy_cost * weight_kg
        }
    };

    Ok(speed_zones
        .iter()
        .map(|z| {
            let mut zone = labelled(z.number, to_watts(z.lower), to_watts(z.upper));
            zone.label = z.label.clone();
            zone
        })
        .collect())
}

/// Derive cycling power zones (W) from FTP percentage bands.
pub fn calculate_cycling_power_zones(ftp_watts: f64) -> Result<Vec<Zone>, EngineError> {
    if ftp_watts <= 0.0 || !ftp_watts.is_finite() {
        return Err(EngineError::InvalidProfile(format!(
            "FTP must be positive, got {ftp_watts} W"
        )));
    }

    Ok((0..5)
        .map(|i| {
            let upper = if i == 4 {
                f64::INFINITY
            } else {
                FTP_BANDS[i + 1] * ftp_watts
            };
            labelled((i + 1) as u8, FTP_BANDS[i] * ftp_watts, upper)
        })
        .collect())
}

/// Find the zone a value falls in.
pub fn zone_for(zones: &[Zone], value: f64) -> Option<&Zone> {
    zones.iter().find(|z| z.contains(value))
}
