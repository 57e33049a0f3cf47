//! Endocrine profile: cortisol and melatonin over a day
//!
//! Cortisol follows the awakening response (peak ~08:00). Melatonin is low
//! all day, rises in the evening and peaks ~02:00. High cortisol suppresses
//! melatonin synthesis, which is what a late stress spike does.

use serde::{Deserialize, Serialize};

/// Cortisol level above which melatonin synthesis is suppressed (µg/dL)
pub const MELATONIN_SUPPRESSION_CORTISOL: f64 = 8.0;

const MELATONIN_SUPPRESSION_FACTOR: f64 = 0.2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HormoneSample {
    pub hour: u32,
    pub label: String,
    /// µg/dL
    pub cortisol: f64,
    /// pg/mL
    pub melatonin: f64,
}

impl HormoneSample {
    pub fn melatonin_suppressed(&self) -> bool {
        self.cortisol > MELATONIN_SUPPRESSION_CORTISOL
    }
}

/// Cortisol at an hour of the day, with an optional acute evening stress spike
pub fn cortisol(hour: f64, stress_spike: bool) -> f64 {
    let mut level = 5.0 + 15.0 * (-(hour - 8.0).powi(2) / 8.0).exp();
    if stress_spike && hour > 16.0 {
        level += 10.0 * (-(hour - 20.0).powi(2) / 2.0).exp();
    }
    level
}

/// Melatonin before cortisol suppression
pub fn melatonin_baseline(hour: f64) -> f64 {
    let night = hour > 18.0 || hour < 8.0;
    if !night {
        return 0.0;
    }
    // distance to the 02:00 peak, wrapping over midnight
    let dist = if hour < 8.0 { hour - 2.0 } else { hour - 26.0 };
    50.0 * (-dist.powi(2) / 10.0).exp()
}

/// Hourly cortisol/melatonin curves, 00:00 through 24:00 inclusive.
pub fn hormone_profile(stress_spike: bool) -> Vec<HormoneSample> {
    (0..=24u32)
        .map(|hour| {
            let h = f64::from(hour);
            let cortisol = cortisol(h, stress_spike);
            let mut melatonin = melatonin_baseline(h);
            if cortisol > MELATONIN_SUPPRESSION_CORTISOL {
                melatonin *= MELATONIN_SUPPRESSION_FACTOR;
            }
            HormoneSample {
                hour,
                label: format!("{hour}:00"),
                cortisol,
                melatonin,
            }
        })
        .collect()
}
