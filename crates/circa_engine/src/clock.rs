//! Simulation clock
//!
//! A state machine over wall-clock instants. Each tick measures the actual
//! time since the previous tick rather than assuming the nominal period, so
//! late ticks never accumulate error. The elapsed wall time is scaled by the
//! speed factor into virtual hours. Pausing or switching speed settles the
//! partial interval at the speed that was in force, so wall time is never
//! dropped or charged at the wrong rate.
//!
//! ```text
//! Stopped --start--> Running --pause--> Paused --resume--> Running
//!    ^                  |                  |
//!    +------stop--------+-------stop-------+
//! ```

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Configuration for the tick loop
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Nominal wall-clock period between ticks (default: 1s)
    pub interval: Duration,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
        }
    }
}

impl TickConfig {
    pub fn from_millis(ms: u64) -> Self {
        Self {
            interval: Duration::from_millis(ms.max(1)),
        }
    }
}

/// Time dilation: simulated seconds per wall-clock second
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpeedFactor {
    #[default]
    RealTime,
    MinutePerSecond,
    HourPerSecond,
}

impl SpeedFactor {
    pub fn multiplier(self) -> u32 {
        match self {
            SpeedFactor::RealTime => 1,
            SpeedFactor::MinutePerSecond => 60,
            SpeedFactor::HourPerSecond => 3600,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SpeedFactor::RealTime => "REAL TIME",
            SpeedFactor::MinutePerSecond => "1 MIN / SEC",
            SpeedFactor::HourPerSecond => "1 HOUR / SEC",
        }
    }

    /// Virtual hours covered by `elapsed` wall time at this speed
    pub fn virtual_hours(self, elapsed: Duration) -> f64 {
        elapsed.as_secs_f64() * f64::from(self.multiplier()) / SECONDS_PER_HOUR
    }
}

impl TryFrom<u32> for SpeedFactor {
    type Error = EngineError;

    fn try_from(factor: u32) -> Result<Self, Self::Error> {
        match factor {
            1 => Ok(SpeedFactor::RealTime),
            60 => Ok(SpeedFactor::MinutePerSecond),
            3600 => Ok(SpeedFactor::HourPerSecond),
            other => Err(EngineError::UnsupportedSpeed(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClockState {
    #[default]
    Stopped,
    Running,
    Paused,
}

/// Externally visible clock summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockStatus {
    pub state: ClockState,
    pub speed: SpeedFactor,
}

#[derive(Debug, Clone)]
pub struct SimulationClock {
    state: ClockState,
    speed: SpeedFactor,
    /// Reference point for the next delta; only set while running
    last_tick: Option<Instant>,
}

impl SimulationClock {
    pub fn new(speed: SpeedFactor) -> Self {
        Self {
            state: ClockState::Stopped,
            speed,
            last_tick: None,
        }
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn speed(&self) -> SpeedFactor {
        self.speed
    }

    pub fn status(&self) -> ClockStatus {
        ClockStatus {
            state: self.state,
            speed: self.speed,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == ClockState::Running
    }

    /// Stopped -> Running. Returns whether the transition happened.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.state != ClockState::Stopped {
            return false;
        }
        self.state = ClockState::Running;
        self.last_tick = Some(now);
        true
    }

    /// Running -> Paused. Returns the virtual hours run since the previous
    /// tick, or `None` if the clock was not running. Nothing accrues until
    /// resumed.
    pub fn pause(&mut self, now: Instant) -> Option<f64> {
        let hours = self.tick(now)?;
        self.state = ClockState::Paused;
        self.last_tick = None;
        Some(hours)
    }

    /// Paused -> Running, measuring from `now` so the pause is never counted.
    pub fn resume(&mut self, now: Instant) -> bool {
        if self.state != ClockState::Paused {
            return false;
        }
        self.state = ClockState::Running;
        self.last_tick = Some(now);
        true
    }

    pub fn stop(&mut self) -> bool {
        if self.state == ClockState::Stopped {
            return false;
        }
        self.state = ClockState::Stopped;
        self.last_tick = None;
        true
    }

    /// Switch speed at `now`. While running, the time since the previous tick
    /// is settled at the old speed and returned; only later time uses the new
    /// one.
    pub fn set_speed(&mut self, speed: SpeedFactor, now: Instant) -> Option<f64> {
        let settled = self.tick(now);
        self.speed = speed;
        settled
    }

    /// Virtual hours since the previous tick, or `None` unless running.
    pub fn tick(&mut self, now: Instant) -> Option<f64> {
        if !self.is_running() {
            return None;
        }
        let last = self.last_tick.replace(now)?;
        let elapsed = now.saturating_duration_since(last);
        Some(self.speed.virtual_hours(elapsed))
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(SpeedFactor::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Instant {
        Instant::from_std(std::time::Instant::now())
    }

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[test]
    fn test_speed_factor_conversion() {
        assert_eq!(SpeedFactor::try_from(1), Ok(SpeedFactor::RealTime));
        assert_eq!(SpeedFactor::try_from(60), Ok(SpeedFactor::MinutePerSecond));
        assert_eq!(SpeedFactor::try_from(3600), Ok(SpeedFactor::HourPerSecond));
        assert_eq!(
            SpeedFactor::try_from(10),
            Err(EngineError::UnsupportedSpeed(10))
        );
    }

    #[test]
    fn test_one_wall_second_at_each_speed() {
        assert!((SpeedFactor::RealTime.virtual_hours(secs(1.0)) - 1.0 / 3600.0).abs() < 1e-15);
        assert!((SpeedFactor::MinutePerSecond.virtual_hours(secs(1.0)) - 1.0 / 60.0).abs() < 1e-15);
        assert_eq!(SpeedFactor::HourPerSecond.virtual_hours(secs(1.0)), 1.0);
    }

    #[test]
    fn test_ticks_only_while_running() {
        let t0 = origin();
        let mut clock = SimulationClock::default();
        assert_eq!(clock.tick(t0), None);

        assert!(clock.start(t0));
        assert!(!clock.start(t0));
        assert!(clock.tick(t0 + secs(1.0)).is_some());

        assert!(clock.pause(t0 + secs(1.5)).is_some());
        assert_eq!(clock.tick(t0 + secs(2.0)), None);

        assert!(clock.stop());
        assert_eq!(clock.state(), ClockState::Stopped);
        assert_eq!(clock.tick(t0 + secs(3.0)), None);
    }

    #[test]
    fn test_drift_tolerant_delta() {
        let t0 = origin();
        let mut clock = SimulationClock::new(SpeedFactor::HourPerSecond);
        clock.start(t0);

        // late and early ticks still add up to the real elapsed time
        let mut total = 0.0;
        for at in [1.3, 2.1, 3.9, 4.0, 5.0] {
            total += clock.tick(t0 + secs(at)).unwrap();
        }
        assert!((total - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_pause_is_never_counted() {
        let t0 = origin();
        let mut clock = SimulationClock::new(SpeedFactor::HourPerSecond);
        clock.start(t0);
        clock.tick(t0 + secs(1.0));
        let settled = clock.pause(t0 + secs(1.5)).unwrap();
        assert!((settled - 0.5).abs() < 1e-9);
        assert!(clock.resume(t0 + secs(100.0)));
        assert!(clock.is_running());

        let delta = clock.tick(t0 + secs(101.0)).unwrap();
        assert!((delta - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_speed_change_not_retroactive() {
        let t0 = origin();
        let mut clock = SimulationClock::new(SpeedFactor::RealTime);
        clock.start(t0);

        let first = clock.tick(t0 + secs(1.0)).unwrap();
        assert_eq!(clock.set_speed(SpeedFactor::HourPerSecond, t0 + secs(1.0)), Some(0.0));
        let second = clock.tick(t0 + secs(2.0)).unwrap();

        assert!((first - 1.0 / 3600.0).abs() < 1e-12);
        assert!((second - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_speed_change_between_ticks() {
        let t0 = origin();
        let mut clock = SimulationClock::new(SpeedFactor::RealTime);
        clock.start(t0);
        clock.tick(t0 + secs(1.0));

        // 0.9s at 1x, then 0.1s at 3600x
        let settled = clock
            .set_speed(SpeedFactor::HourPerSecond, t0 + secs(1.9))
            .unwrap();
        let after = clock.tick(t0 + secs(2.0)).unwrap();

        assert!((settled - 0.9 / 3600.0).abs() < 1e-12);
        assert!((after - 0.1).abs() < 1e-9);
        assert!(settled + after <= 0.10025 + 1e-9);
    }

    #[test]
    fn test_speed_change_while_stopped() {
        let t0 = origin();
        let mut clock = SimulationClock::default();
        assert_eq!(clock.set_speed(SpeedFactor::MinutePerSecond, t0), None);
        assert_eq!(clock.speed(), SpeedFactor::MinutePerSecond);
    }

    #[test]
    fn test_resume_requires_pause() {
        let t0 = origin();
        let mut clock = SimulationClock::default();
        assert!(!clock.resume(t0));
        assert_eq!(clock.pause(t0), None);
        assert!(!clock.stop());
        assert_eq!(clock.status(), ClockStatus::default());
    }
}
