//! Property-based tests for circa_core.
//!
//! Uses proptest to verify invariants that must hold for ALL possible inputs,
//! not just hand-picked examples.

use chrono::{NaiveDate, NaiveDateTime};
use circa_core::pharmacokinetics::MAX_RECEPTOR_OCCUPANCY;
use circa_core::store::CAFFEINE_EPSILON_MG;
use circa_core::two_process::SERIES_LEN;
use circa_core::{
    bedtimes_for_wake, decay_concentration, generate_daily_series, receptor_occupancy,
    sleep_pressure, windows_for_immediate_sleep, windows_for_target_wake, BioStore,
    SleepQuality, LOG_CAPACITY,
};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

/// Any minute within a few years
fn arb_datetime() -> impl Strategy<Value = NaiveDateTime> {
    (0i64..(3 * 365 * 24 * 60)).prop_map(|minutes| {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + chrono::Duration::minutes(minutes)
    })
}

/// A store mutation as a collaborator would issue it
#[derive(Debug, Clone)]
enum Op {
    Ingest(f64),
    Advance(f64),
    Vasodilate,
    Log,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0.0f64..=400.0).prop_map(Op::Ingest),
        (0.0f64..=12.0).prop_map(Op::Advance),
        Just(Op::Vasodilate),
        Just(Op::Log),
    ]
}

// ============================================================================
// Pharmacokinetics
// ============================================================================

proptest! {
    #[test]
    fn decay_zero_elapsed_is_identity(dose in 0.0f64..=1000.0, h in 0.1f64..=24.0) {
        prop_assert_eq!(decay_concentration(dose, 0.0, h), dose);
    }

    #[test]
    fn decay_one_half_life_halves(dose in 0.0f64..=1000.0, h in 0.1f64..=24.0) {
        let remaining = decay_concentration(dose, h, h);
        prop_assert!((remaining - dose / 2.0).abs() < 1e-9);
    }

    #[test]
    fn occupancy_bounded_and_monotonic(a in 0.0f64..=1.0e6, b in 0.0f64..=1.0e6) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let (occ_lo, occ_hi) = (receptor_occupancy(lo), receptor_occupancy(hi));
        prop_assert!(occ_lo >= 0.0 && occ_hi <= MAX_RECEPTOR_OCCUPANCY);
        prop_assert!(occ_lo <= occ_hi, "occ({}) = {} > occ({}) = {}", lo, occ_lo, hi, occ_hi);
    }
}

// ============================================================================
// Two-Process model
// ============================================================================

proptest! {
    #[test]
    fn pressure_strictly_increases(s0 in 0.0f64..0.9, t in 0.0f64..=48.0, dt in 0.01f64..=6.0) {
        prop_assert!(sleep_pressure(t + dt, s0) > sleep_pressure(t, s0));
        prop_assert!(sleep_pressure(t + dt, s0) < 1.0);
    }

    #[test]
    fn series_always_has_49_finite_samples(wake in -48i32..=48, bed in -48i32..=48) {
        let series = generate_daily_series(f64::from(wake), f64::from(bed));
        prop_assert_eq!(series.len(), SERIES_LEN);
        for (i, sample) in series.iter().enumerate() {
            prop_assert_eq!(sample.hours_awake, i as f64 * 0.5);
            prop_assert!((0.0..24.0).contains(&sample.hour));
            prop_assert!(sample.sleep_pressure.is_finite());
            prop_assert!(sample.threshold.is_finite());
            prop_assert!(sample.delta.is_finite());
        }
    }
}

// ============================================================================
// Sleep-cycle scheduler
// ============================================================================

proptest! {
    #[test]
    fn immediate_sleep_sorted_with_optimal_five(now in arb_datetime()) {
        let windows = windows_for_immediate_sleep(now);
        prop_assert_eq!(windows.len(), 5);
        prop_assert!(windows.windows(2).all(|w| w[0].time <= w[1].time));
        prop_assert!(windows.iter().all(|w| w.time > now));
        let five = windows.iter().find(|w| w.cycle_count == 5).unwrap();
        prop_assert_eq!(five.label, SleepQuality::Optimal);
    }

    #[test]
    fn target_wake_sorted_and_before_wake(wake in arb_datetime()) {
        let windows = windows_for_target_wake(wake);
        prop_assert_eq!(windows.len(), 4);
        prop_assert!(windows.windows(2).all(|w| w[0].time <= w[1].time));
        for w in &windows {
            let minutes = (wake - w.time).num_minutes();
            prop_assert_eq!(minutes, i64::from(w.cycle_count) * 90 + 14);
        }
    }

    #[test]
    fn both_presentations_agree(wake in arb_datetime()) {
        let tagged = windows_for_target_wake(wake);
        for w in bedtimes_for_wake(wake) {
            let twin = tagged.iter().find(|t| t.cycle_count == w.cycle_count).unwrap();
            prop_assert_eq!(w.time, twin.time);
        }
    }
}

// ============================================================================
// Store invariants
// ============================================================================

proptest! {
    /// **Core invariant**: after any sequence of well-formed mutations the
    /// level is non-negative, blockage matches the level exactly, the log is
    /// bounded and the high-water mark covers the level.
    #[test]
    fn store_invariants_hold(ops in prop::collection::vec(arb_op(), 0..120)) {
        let mut store = BioStore::default();
        for op in ops {
            match op {
                Op::Ingest(mg) => store.ingest_caffeine(mg),
                Op::Advance(h) => store.advance_chemistry(h),
                Op::Vasodilate => store.trigger_vasodilation(),
                Op::Log => store.log_info("tick"),
            }

            let state = store.state();
            prop_assert!(state.caffeine_level_mg >= 0.0);
            prop_assert_eq!(state.receptor_blockage, receptor_occupancy(state.caffeine_level_mg));
            prop_assert!(state.event_log.len() <= LOG_CAPACITY);
            prop_assert!(state.max_caffeine_seen_mg >= state.caffeine_level_mg);
        }
    }

    #[test]
    fn split_advance_matches_single(dose in 1.0f64..=500.0, parts in 1usize..=50) {
        let mut split = BioStore::default();
        split.ingest_caffeine(dose);
        let step = 5.7 / parts as f64;
        for _ in 0..parts {
            split.advance_chemistry(step);
        }
        let level = split.state().caffeine_level_mg;
        prop_assert!((level - dose / 2.0).abs() < 1e-6);
        prop_assert!(level > CAFFEINE_EPSILON_MG);
    }
}
