//! # Circa Core
//!
//! Closed-form circadian biology and the bio-state store.
//!
//! ## Models
//!
//! - **Pharmacokinetics**: first-order caffeine clearance, Michaelis-Menten
//!   adenosine receptor occupancy
//! - **Two-Process Model** (Borbély): homeostatic pressure (S) against the
//!   circadian threshold (C)
//! - **Sleep cycles**: 90 minute quantized bedtime / wake time planning
//! - **Endocrine profile**: cortisol and melatonin over a day
//! - **Hypnogram**: per-cycle sleep architecture under stressors
//!
//! Everything here is synchronous and pure except [`BioStore`], which owns
//! the mutable state. The async clock lives in `circa_engine`.

pub mod config;
pub mod hormones;
pub mod hypnogram;
pub mod pharmacokinetics;
pub mod sleep_cycle;
pub mod store;
pub mod two_process;

pub use config::{BiologyConfig, CircaConfig, ClockConfig};
pub use hormones::{hormone_profile, HormoneSample};
pub use hypnogram::{
    build_architecture, estimate_hrv_ms, recovery_quality_pct, CycleArchitecture, Stressor,
    Stressors,
};
pub use pharmacokinetics::{decay_concentration, receptor_occupancy, Metabolism};
pub use sleep_cycle::{
    bedtimes_for_wake, plan_windows, resolve_wake_target, waketimes_for_bed,
    windows_for_immediate_sleep, windows_for_target_wake, CycleTable, Direction, SleepQuality,
    SleepWindow, WindowOrder,
};
pub use store::{BioState, BioStore, LogEntry, Severity, LOG_CAPACITY};
pub use two_process::{
    circadian_alertness, find_crash_point, generate_daily_series, sleep_pressure,
    sleep_pressure_decay, ProcessSample,
};
