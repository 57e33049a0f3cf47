//! Sleep-cycle scheduling
//!
//! Sleep is quantized into 90 minute cycles. Waking at a cycle boundary
//! (light sleep) instead of mid-cycle (deep sleep) avoids sleep inertia.
//!
//! Every calculator here is the same arithmetic over a [`CycleTable`]:
//! which cycle counts to offer, how to label them and how to order them.

use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const CYCLE_MINUTES: i64 = 90;

/// Average time to fall asleep
pub const ONSET_LATENCY_MINUTES: i64 = 14;

/// Which way to count from the anchor time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Anchor is bedtime; count forward to wake times
    Forward,
    /// Anchor is wake time; count backward to bedtimes
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowOrder {
    /// Earliest time first
    ByTime,
    /// Fewest cycles first, regardless of direction
    ByCycleCount,
}

/// Configuration of one presentation of the cycle arithmetic
#[derive(Debug, Clone)]
pub struct CycleTable<L> {
    pub cycle_counts: &'static [u32],
    pub label: fn(u32) -> L,
    pub order: WindowOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SleepQuality {
    Optimal,
    Good,
    Emergency,
    PowerNap,
}

impl SleepQuality {
    pub fn for_cycles(cycles: u32) -> Self {
        match cycles {
            5 => SleepQuality::Optimal,
            3 => SleepQuality::Emergency,
            1 => SleepQuality::PowerNap,
            _ => SleepQuality::Good,
        }
    }
}

impl fmt::Display for SleepQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SleepQuality::Optimal => "Optimal",
            SleepQuality::Good => "Good",
            SleepQuality::Emergency => "Emergency",
            SleepQuality::PowerNap => "Power Nap",
        };
        f.write_str(name)
    }
}

/// Textual labels of the duration-oriented presentation
pub fn duration_label(cycles: u32) -> String {
    match cycles {
        6 => "Optimal (9h)".to_string(),
        5 => "Standard (7.5h)".to_string(),
        4 => "Minimum (6h)".to_string(),
        n => format!("{n} Cycles"),
    }
}

/// "Sleep now": 9h, 7.5h, 6h, 4.5h and a power nap
pub const IMMEDIATE_SLEEP: CycleTable<SleepQuality> = CycleTable {
    cycle_counts: &[6, 5, 4, 3, 1],
    label: SleepQuality::for_cycles,
    order: WindowOrder::ByTime,
};

/// "Wake at": 9h, 7.5h, 6h, 4.5h
pub const TARGET_WAKE: CycleTable<SleepQuality> = CycleTable {
    cycle_counts: &[6, 5, 4, 3],
    label: SleepQuality::for_cycles,
    order: WindowOrder::ByTime,
};

/// Full-night options only, labeled by duration
pub const FULL_NIGHT: CycleTable<String> = CycleTable {
    cycle_counts: &[4, 5, 6],
    label: duration_label,
    order: WindowOrder::ByCycleCount,
};

/// A candidate bedtime or wake time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepWindow<L = SleepQuality> {
    pub cycle_count: u32,
    pub time: NaiveDateTime,
    pub label: L,
}

impl<L> SleepWindow<L> {
    /// Time actually asleep, excluding onset latency
    pub fn sleep_duration(&self) -> Duration {
        Duration::minutes(i64::from(self.cycle_count) * CYCLE_MINUTES)
    }

    pub fn hours(&self) -> i64 {
        self.sleep_duration().num_minutes() / 60
    }

    pub fn minutes(&self) -> i64 {
        self.sleep_duration().num_minutes() % 60
    }

    /// 12h clock rendering, e.g. "06:14 AM"
    pub fn clock_label(&self) -> String {
        self.time.format("%I:%M %p").to_string()
    }
}

/// Core arithmetic shared by every calculator.
///
/// Forward: `anchor + latency + n * 90min`.
/// Backward: `anchor - (n * 90min + latency)`.
pub fn plan_windows<L>(
    anchor: NaiveDateTime,
    direction: Direction,
    table: &CycleTable<L>,
) -> Vec<SleepWindow<L>> {
    let latency = Duration::minutes(ONSET_LATENCY_MINUTES);

    let mut windows: Vec<SleepWindow<L>> = table
        .cycle_counts
        .iter()
        .map(|&cycles| {
            let asleep = Duration::minutes(i64::from(cycles) * CYCLE_MINUTES);
            let time = match direction {
                Direction::Forward => anchor + latency + asleep,
                Direction::Backward => anchor - (asleep + latency),
            };
            SleepWindow {
                cycle_count: cycles,
                time,
                label: (table.label)(cycles),
            }
        })
        .collect();

    match table.order {
        WindowOrder::ByTime => windows.sort_by_key(|w| w.time),
        WindowOrder::ByCycleCount => windows.sort_by_key(|w| w.cycle_count),
    }
    windows
}

/// Wake-up windows when lying down at `now`
pub fn windows_for_immediate_sleep(now: NaiveDateTime) -> Vec<SleepWindow> {
    plan_windows(now, Direction::Forward, &IMMEDIATE_SLEEP)
}

/// Bedtimes that land a wake-up at `wake_time` on a cycle boundary
pub fn windows_for_target_wake(wake_time: NaiveDateTime) -> Vec<SleepWindow> {
    plan_windows(wake_time, Direction::Backward, &TARGET_WAKE)
}

/// Duration-labeled bedtimes for a wake time
pub fn bedtimes_for_wake(wake_time: NaiveDateTime) -> Vec<SleepWindow<String>> {
    plan_windows(wake_time, Direction::Backward, &FULL_NIGHT)
}

/// Duration-labeled wake times for a bedtime
pub fn waketimes_for_bed(bed_time: NaiveDateTime) -> Vec<SleepWindow<String>> {
    plan_windows(bed_time, Direction::Forward, &FULL_NIGHT)
}

/// Next occurrence of a wall-clock wake time: today, or tomorrow if it has
/// already passed.
pub fn resolve_wake_target(now: NaiveDateTime, wake: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(wake);
    if today < now {
        today + Duration::days(1)
    } else {
        today
    }
}
