//! Bio-state store
//!
//! `BioStore` is the single owner of the simulated physiology. Everything
//! outside only ever sees cloned [`BioState`] snapshots and changes state
//! through the mutators below. Mutators take `&mut self`, so exclusive
//! access is enforced by the borrow checker rather than by locks.
//!
//! Caller obligations (not validated here): doses are non-negative, hours lie
//! in 0..24, percentages in 0..=100.

use crate::pharmacokinetics::{decay_concentration, receptor_occupancy, Metabolism};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use uuid::Uuid;

/// Maximum number of entries kept in the event log
pub const LOG_CAPACITY: usize = 50;

/// Below this the blood level is treated as fully cleared (mg)
pub const CAFFEINE_EPSILON_MG: f64 = 0.1;

/// Awake, active core body temperature (°C)
pub const BASELINE_CORE_TEMP_C: f64 = 37.0;

/// Core temperature after a heat dump (°C)
pub const VASODILATED_CORE_TEMP_C: f64 = 36.2;

/// At or below this the thermal sleep gate is open (°C)
pub const SLEEP_GATE_CORE_TEMP_C: f64 = 36.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Alert,
    Success,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Alert => "alert",
            Severity::Success => "success",
        };
        f.write_str(name)
    }
}

/// One line of the system event log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,
    /// Local wall-clock time, "HH:MM:SS"
    pub timestamp: String,
    pub message: String,
    pub severity: Severity,
}

impl LogEntry {
    fn now(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Local::now().format("%H:%M:%S").to_string(),
            message: message.into(),
            severity,
        }
    }
}

/// Snapshot of the simulated physiology
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BioState {
    /// Anchor hour for the daily S/C computation (0-23)
    pub wake_hour: u8,
    /// Hour of the last caffeine intake, if any
    pub caffeine_intake_hour: Option<u8>,
    /// Stress level (0.0 - 1.0)
    pub stress_level: f64,

    /// Blood caffeine (mg)
    pub caffeine_level_mg: f64,
    /// High-water mark of `caffeine_level_mg`, for display scaling
    pub max_caffeine_seen_mg: f64,
    /// Fraction of adenosine receptors occupied (0.0 - 0.95)
    pub receptor_blockage: f64,

    /// Core body temperature (°C)
    pub core_body_temp_c: f64,
    /// Latched once a heat dump fires
    pub vasodilation_active: bool,

    /// Set by collaborators from their recovery estimates (ms)
    pub heart_rate_variability_ms: f64,
    /// Set by collaborators (0 - 100)
    pub cognitive_load_pct: f64,

    /// Newest first, at most [`LOG_CAPACITY`] entries
    pub event_log: VecDeque<LogEntry>,
}

impl Default for BioState {
    fn default() -> Self {
        let mut event_log = VecDeque::with_capacity(LOG_CAPACITY);
        event_log.push_front(LogEntry {
            id: Uuid::new_v4(),
            timestamp: "00:00:01".to_string(),
            message: "SYSTEM_BOOT::SEQUENCE_INIT".to_string(),
            severity: Severity::Info,
        });

        Self {
            wake_hour: 7,
            caffeine_intake_hour: None,
            stress_level: 0.0,
            caffeine_level_mg: 0.0,
            // 1mg floor keeps level/max defined before the first dose
            max_caffeine_seen_mg: 1.0,
            receptor_blockage: 0.0,
            core_body_temp_c: BASELINE_CORE_TEMP_C,
            vasodilation_active: false,
            heart_rate_variability_ms: 65.0,
            cognitive_load_pct: 45.0,
            event_log,
        }
    }
}

impl BioState {
    /// Caffeine relative to the highest level seen (0.0 - 1.0)
    pub fn caffeine_fraction(&self) -> f64 {
        if self.max_caffeine_seen_mg <= 0.0 {
            return 0.0;
        }
        (self.caffeine_level_mg / self.max_caffeine_seen_mg).clamp(0.0, 1.0)
    }

    /// Core temperature is low enough for sleep onset
    pub fn sleep_gate_open(&self) -> bool {
        self.core_body_temp_c <= SLEEP_GATE_CORE_TEMP_C
    }

    pub fn latest_log(&self) -> Option<&LogEntry> {
        self.event_log.front()
    }
}

/// Owner of the bio-state; the only place it can change
#[derive(Debug, Clone)]
pub struct BioStore {
    state: BioState,
    metabolism: Metabolism,
}

impl Default for BioStore {
    fn default() -> Self {
        Self::new(BioState::default(), Metabolism::Normal)
    }
}

impl BioStore {
    pub fn new(state: BioState, metabolism: Metabolism) -> Self {
        Self { state, metabolism }
    }

    pub fn snapshot(&self) -> BioState {
        self.state.clone()
    }

    pub fn state(&self) -> &BioState {
        &self.state
    }

    pub fn metabolism(&self) -> Metabolism {
        self.metabolism
    }

    pub fn set_wake_hour(&mut self, hour: u8) {
        tracing::debug!("wake hour {} -> {}", self.state.wake_hour, hour);
        self.state.wake_hour = hour;
    }

    pub fn set_stress_level(&mut self, level: f64) {
        self.state.stress_level = level;
    }

    pub fn set_caffeine_intake_hour(&mut self, hour: Option<u8>) {
        self.state.caffeine_intake_hour = hour;
    }

    pub fn set_heart_rate_variability(&mut self, ms: f64) {
        self.state.heart_rate_variability_ms = ms;
    }

    pub fn set_cognitive_load(&mut self, pct: f64) {
        self.state.cognitive_load_pct = pct;
    }

    /// Prepend a log entry, dropping the oldest past capacity
    pub fn append_log(&mut self, message: impl Into<String>, severity: Severity) {
        let entry = LogEntry::now(message, severity);
        tracing::trace!("[{}] {}", entry.severity, entry.message);
        self.state.event_log.push_front(entry);
        self.state.event_log.truncate(LOG_CAPACITY);
    }

    pub fn log_info(&mut self, message: impl Into<String>) {
        self.append_log(message, Severity::Info);
    }

    /// Add a dose on top of the current blood level
    pub fn ingest_caffeine(&mut self, dose_mg: f64) {
        let level = self.state.caffeine_level_mg + dose_mg;
        self.set_caffeine_level(level);
        self.state.max_caffeine_seen_mg = self.state.max_caffeine_seen_mg.max(level);

        self.append_log(format!("INGESTION_DETECTED::{dose_mg}mg_CAFFEINE"), Severity::Alert);
        self.append_log("RECEPTOR_ANTAGONISM_INITIATED", Severity::Warning);
        tracing::debug!(
            "ingested {:.1}mg, level={:.2}mg, blockage={:.3}",
            dose_mg,
            level,
            self.state.receptor_blockage
        );
    }

    /// Clear caffeine for `elapsed_hours` of virtual time
    pub fn advance_chemistry(&mut self, elapsed_hours: f64) {
        let level = decay_concentration(
            self.state.caffeine_level_mg,
            elapsed_hours,
            self.metabolism.half_life_hours(),
        );
        if level <= CAFFEINE_EPSILON_MG {
            self.state.caffeine_level_mg = 0.0;
            self.state.receptor_blockage = 0.0;
        } else {
            self.set_caffeine_level(level);
        }
    }

    /// Heat dump: drop core temperature to the sleep-onset target
    pub fn trigger_vasodilation(&mut self) {
        self.state.core_body_temp_c = VASODILATED_CORE_TEMP_C;
        self.state.vasodilation_active = true;
        self.append_log("THERMAL_REGULATION::VASODILATION_TRIGGERED", Severity::Success);
        self.append_log("HEAT_DUMP_ACTIVE::CBT_DROPPING", Severity::Info);
    }

    /// Level and blockage only ever change together
    fn set_caffeine_level(&mut self, level: f64) {
        self.state.caffeine_level_mg = level;
        self.state.receptor_blockage = receptor_occupancy(level);
    }
}
