//! Sleep architecture under stressors
//!
//! A night is a stack of cycles. Early cycles are dominated by deep sleep
//! (N3), late cycles by REM. Stressors erode specific parts of the stack:
//!
//! - Alcohol suppresses REM in the first two cycles
//! - Blue light delays the first deep-sleep block
//! - Late caffeine thins every cycle
//!
//! The resulting recovery quality feeds the HRV estimate that collaborators
//! push into the store.

use serde::{Deserialize, Serialize};

pub const MAX_CYCLES: usize = 5;

/// HRV floor (ms) no matter how bad the night was
const HRV_FLOOR_MS: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CycleArchitecture {
    /// 1-based cycle number
    pub id: u32,
    /// Deep sleep share (%)
    pub n3_pct: f64,
    /// REM share (%)
    pub rem_pct: f64,
    /// 1.0 = undisturbed
    pub quality: f64,
}

const BASE_CYCLES: [CycleArchitecture; MAX_CYCLES] = [
    CycleArchitecture { id: 1, n3_pct: 80.0, rem_pct: 10.0, quality: 1.0 },
    CycleArchitecture { id: 2, n3_pct: 60.0, rem_pct: 20.0, quality: 1.0 },
    CycleArchitecture { id: 3, n3_pct: 40.0, rem_pct: 40.0, quality: 1.0 },
    CycleArchitecture { id: 4, n3_pct: 20.0, rem_pct: 60.0, quality: 1.0 },
    CycleArchitecture { id: 5, n3_pct: 10.0, rem_pct: 80.0, quality: 1.0 },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stressor {
    Alcohol,
    BlueLight,
    LateCaffeine,
}

impl Stressor {
    pub const ALL: [Stressor; 3] = [Stressor::Alcohol, Stressor::BlueLight, Stressor::LateCaffeine];

    pub fn key(self) -> &'static str {
        match self {
            Stressor::Alcohol => "ALCOHOL",
            Stressor::BlueLight => "BLUELIGHT",
            Stressor::LateCaffeine => "LATECAFFEINE",
        }
    }

    /// Event-log lines for switching this stressor on
    pub fn detected_messages(self) -> Vec<String> {
        let mut lines = vec![format!("{}_DETECTED::INITIATING_PROTOCOL", self.key())];
        match self {
            Stressor::Alcohol => lines.push("REM_SUPPRESSION_ACTIVE".to_string()),
            Stressor::LateCaffeine => lines.push("ADENOSINE_BLOCKAGE_DETECTED".to_string()),
            Stressor::BlueLight => {}
        }
        lines
    }

    pub fn cleared_message(self) -> String {
        format!("{}_CLEARED", self.key())
    }
}

/// Which stressors are present tonight
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stressors {
    pub alcohol: bool,
    pub blue_light: bool,
    pub late_caffeine: bool,
}

impl Stressors {
    pub fn is_active(&self, stressor: Stressor) -> bool {
        match stressor {
            Stressor::Alcohol => self.alcohol,
            Stressor::BlueLight => self.blue_light,
            Stressor::LateCaffeine => self.late_caffeine,
        }
    }

    /// Flip a stressor, returning its new state
    pub fn toggle(&mut self, stressor: Stressor) -> bool {
        let flag = match stressor {
            Stressor::Alcohol => &mut self.alcohol,
            Stressor::BlueLight => &mut self.blue_light,
            Stressor::LateCaffeine => &mut self.late_caffeine,
        };
        *flag = !*flag;
        *flag
    }
}

/// The first `active_cycles` cycles of the night with stressor damage applied.
/// `active_cycles` is clamped to 1..=5.
pub fn build_architecture(active_cycles: usize, stressors: Stressors) -> Vec<CycleArchitecture> {
    let count = active_cycles.clamp(1, MAX_CYCLES);

    BASE_CYCLES[..count]
        .iter()
        .map(|base| {
            let mut cycle = *base;

            if stressors.alcohol && cycle.id <= 2 {
                cycle.rem_pct = 0.0;
                cycle.quality -= 0.3;
            }
            if stressors.blue_light && cycle.id == 1 {
                cycle.n3_pct -= 30.0;
                cycle.quality -= 0.2;
            }
            if stressors.late_caffeine {
                cycle.n3_pct -= 10.0;
                cycle.rem_pct -= 10.0;
                cycle.quality -= 0.4;
            }

            cycle.n3_pct = cycle.n3_pct.max(0.0);
            cycle.rem_pct = cycle.rem_pct.max(0.0);
            cycle
        })
        .collect()
}

/// Mean cycle quality as a percentage (100 = undisturbed night)
pub fn recovery_quality_pct(cycles: &[CycleArchitecture]) -> f64 {
    if cycles.is_empty() {
        return 0.0;
    }
    let total: f64 = cycles.iter().map(|c| c.quality).sum();
    total / cycles.len() as f64 * 100.0
}

/// HRV estimate from recovery quality: 100% maps to the 65ms baseline
pub fn estimate_hrv_ms(quality_pct: f64) -> f64 {
    (quality_pct * 0.65).round().max(HRV_FLOOR_MS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_night() {
        let cycles = build_architecture(5, Stressors::default());
        assert_eq!(cycles.len(), 5);
        assert_eq!(cycles, BASE_CYCLES.to_vec());
        assert_eq!(recovery_quality_pct(&cycles), 100.0);
        assert_eq!(estimate_hrv_ms(100.0), 65.0);
    }

    #[test]
    fn test_alcohol_strips_early_rem() {
        let stressors = Stressors { alcohol: true, ..Default::default() };
        let cycles = build_architecture(5, stressors);
        assert_eq!(cycles[0].rem_pct, 0.0);
        assert_eq!(cycles[1].rem_pct, 0.0);
        assert_eq!(cycles[2].rem_pct, 40.0);
        // (0.7 + 0.7 + 1 + 1 + 1) / 5
        assert!((recovery_quality_pct(&cycles) - 88.0).abs() < 1e-9);
    }

    #[test]
    fn test_blue_light_hits_first_cycle() {
        let stressors = Stressors { blue_light: true, ..Default::default() };
        let cycles = build_architecture(3, stressors);
        assert_eq!(cycles[0].n3_pct, 50.0);
        assert_eq!(cycles[1].n3_pct, 60.0);
    }

    #[test]
    fn test_everything_floors_hrv() {
        let stressors = Stressors { alcohol: true, blue_light: true, late_caffeine: true };
        let cycles = build_architecture(5, stressors);
        assert!(cycles.iter().all(|c| c.n3_pct >= 0.0 && c.rem_pct >= 0.0));
        let quality = recovery_quality_pct(&cycles);
        assert!(quality < 60.0);
        assert!(estimate_hrv_ms(quality) >= 20.0);
        assert_eq!(estimate_hrv_ms(-10.0), 20.0);
    }

    #[test]
    fn test_cycle_count_clamped() {
        assert_eq!(build_architecture(0, Stressors::default()).len(), 1);
        assert_eq!(build_architecture(9, Stressors::default()).len(), 5);
    }

    #[test]
    fn test_toggle_and_messages() {
        let mut stressors = Stressors::default();
        assert!(stressors.toggle(Stressor::LateCaffeine));
        assert!(stressors.is_active(Stressor::LateCaffeine));
        assert!(!stressors.toggle(Stressor::LateCaffeine));

        let lines = Stressor::Alcohol.detected_messages();
        assert_eq!(lines[0], "ALCOHOL_DETECTED::INITIATING_PROTOCOL");
        assert_eq!(lines[1], "REM_SUPPRESSION_ACTIVE");
        assert_eq!(Stressor::BlueLight.detected_messages().len(), 1);
        assert_eq!(Stressor::BlueLight.cleared_message(), "BLUELIGHT_CLEARED");
    }
}
