//! Two-Process Model of sleep regulation (Borbély, 1982)
//!
//! - Process S: homeostatic sleep pressure, rises exponentially while awake
//!   and dissipates during sleep.
//! - Process C: circadian alertness, a ~24h oscillation independent of prior
//!   sleep history.
//!
//! Sleep onset becomes likely when S climbs over the threshold set by C. The
//! margin between the two is the "sleep gate".

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Process S rise time constant (hours)
pub const TAU_RISE_HOURS: f64 = 18.2;

/// Process S decay time constant (hours)
pub const TAU_DECAY_HOURS: f64 = 4.2;

/// Sleep pressure right after waking (rested, not fully zero)
pub const WAKE_PRESSURE: f64 = 0.1;

/// Series resolution (hours)
pub const SERIES_STEP_HOURS: f64 = 0.5;

/// Number of samples in a 24h series at 30 minute resolution, both ends included
pub const SERIES_LEN: usize = 49;

/// Hours awake before a pressure crossing counts as a crash
const CRASH_MIN_HOURS_AWAKE: f64 = 12.0;

/// Homeostatic pressure after `hours_awake`: S(t) = 1 - (1 - S0) * e^(-t / τ_rise)
pub fn sleep_pressure(hours_awake: f64, initial_pressure: f64) -> f64 {
    1.0 - (1.0 - initial_pressure) * (-hours_awake / TAU_RISE_HOURS).exp()
}

/// Recovery during sleep: S(t) = S0 * e^(-t / τ_decay)
pub fn sleep_pressure_decay(hours_asleep: f64, pressure_at_onset: f64) -> f64 {
    pressure_at_onset * (-hours_asleep / TAU_DECAY_HOURS).exp()
}

/// Relative alertness for an hour of the day, roughly in [-1.3, 1.3].
///
/// Fundamental 24h wave phase-shifted so the trough falls in the small
/// hours, plus a 12h harmonic that carves out the post-lunch dip.
pub fn circadian_alertness(hour_of_day: f64) -> f64 {
    let omega = 2.0 * PI / 24.0;
    let fundamental = (omega * (hour_of_day - 8.0)).sin();
    let harmonic = 0.3 * (2.0 * omega * (hour_of_day - 14.0)).sin();
    fundamental + harmonic
}

/// Maps alertness into the [0, 1] band of Process S.
/// High alertness means a high threshold, i.e. hard to fall asleep.
pub fn sleep_threshold(hour_of_day: f64) -> f64 {
    0.5 + circadian_alertness(hour_of_day) * 0.25
}

/// One point of the daily S/C interaction curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessSample {
    /// Clock hour of this sample (0.0 - 23.5)
    pub hour: f64,
    /// Hours since wake-up
    pub hours_awake: f64,
    /// "H:MM" label for chart axes
    pub time_label: String,
    /// Process S
    pub sleep_pressure: f64,
    /// Process C mapped to the threshold band
    pub threshold: f64,
    /// Sleep gate margin: threshold - S
    pub delta: f64,
    /// At or beyond the estimated bedtime
    pub past_bedtime: bool,
}

impl ProcessSample {
    /// Pressure has overtaken the circadian threshold
    pub fn gate_open(&self) -> bool {
        self.delta < 0.0
    }
}

/// 24h of S and C starting at `wake_hour`, one sample every 30 minutes.
///
/// Always returns [`SERIES_LEN`] samples. The bed hour only marks samples;
/// pressure keeps rising past it since the series models staying awake.
pub fn generate_daily_series(wake_hour: f64, estimated_bed_hour: f64) -> Vec<ProcessSample> {
    let awake_window = (estimated_bed_hour - wake_hour).rem_euclid(24.0);

    (0..SERIES_LEN)
        .map(|i| {
            let hours_awake = i as f64 * SERIES_STEP_HOURS;
            let hour = (wake_hour + hours_awake).rem_euclid(24.0);
            let sleep_pressure = sleep_pressure(hours_awake, WAKE_PRESSURE);
            let threshold = sleep_threshold(hour);

            ProcessSample {
                hour,
                hours_awake,
                time_label: time_label(hour),
                sleep_pressure,
                threshold,
                delta: threshold - sleep_pressure,
                past_bedtime: hours_awake >= awake_window,
            }
        })
        .collect()
}

/// First sample, after at least 12h awake, where pressure beats the threshold
pub fn find_crash_point(series: &[ProcessSample]) -> Option<&ProcessSample> {
    series
        .iter()
        .find(|s| s.hours_awake > CRASH_MIN_HOURS_AWAKE && s.sleep_pressure > s.threshold)
}

fn time_label(hour: f64) -> String {
    let whole = hour.floor();
    let minutes = if hour - whole >= 0.5 { "30" } else { "00" };
    format!("{}:{}", whole as u32, minutes)
}
