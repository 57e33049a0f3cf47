//! Interactive console commands
//!
//! Each input line parses into a [`ReplCommand`]; a [`Session`] runs it against
//! the engine and renders the result as text.

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDateTime, NaiveTime};
use circa_core::{
    bedtimes_for_wake, build_architecture, estimate_hrv_ms, find_crash_point,
    generate_daily_series, hormone_profile, recovery_quality_pct, resolve_wake_target,
    waketimes_for_bed, windows_for_immediate_sleep, windows_for_target_wake, BioState, Severity,
    SleepWindow, Stressor, Stressors,
};
use circa_engine::{BioEngine, SpeedFactor};
use std::fmt::{Display, Write as _};
use std::str::FromStr;

/// Nominal waking day used to mark the bedtime in the pressure series
const WAKING_DAY_HOURS: f64 = 16.0;

/// Cycles shown by the hypnogram
const NIGHT_CYCLES: usize = 5;

pub const HELP: &str = "\
commands:
  status [json]                  current bio-state
  caffeine <mg>                  ingest a dose
  heat                           trigger vasodilation (heat dump)
  wake <hour>                    set the wake hour (0-23)
  speed <1|60|3600>              time dilation
  start | pause | resume | stop  clock control
  series                         sleep pressure against the circadian gate
  sleep-now                      wake times if you fall asleep now
  wake-at HH:MM                  bedtimes for a target wake time
  bed-at HH:MM                   wake times for a bedtime
  hormones [stress]              cortisol / melatonin profile
  hypnogram [alcohol] [blue-light] [late-caffeine]
                                 sleep architecture under stressors
  logs                           event log, newest first
  quit";

#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Status { json: bool },
    Caffeine(f64),
    Heat,
    Wake(u8),
    Speed(SpeedFactor),
    Start,
    Pause,
    Resume,
    Stop,
    Series,
    SleepNow,
    WakeAt(NaiveTime),
    BedAt(NaiveTime),
    Hormones { stress: bool },
    Hypnogram(Vec<Stressor>),
    Logs,
    Help,
    Quit,
}

impl FromStr for ReplCommand {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace();
        let Some(head) = parts.next() else {
            bail!("empty command");
        };
        let args: Vec<&str> = parts.collect();

        let command = match (head, args.as_slice()) {
            ("status", []) => ReplCommand::Status { json: false },
            ("status", ["json"]) => ReplCommand::Status { json: true },
            ("caffeine", [mg]) => {
                let mg: f64 = mg.parse().with_context(|| format!("invalid dose: {mg}"))?;
                if !mg.is_finite() || mg < 0.0 {
                    bail!("dose must be a non-negative number of mg");
                }
                ReplCommand::Caffeine(mg)
            }
            ("heat", []) => ReplCommand::Heat,
            ("wake", [hour]) => {
                let hour: u8 = hour
                    .parse()
                    .with_context(|| format!("invalid hour: {hour}"))?;
                if hour > 23 {
                    bail!("wake hour must be within 0-23");
                }
                ReplCommand::Wake(hour)
            }
            ("speed", [factor]) => {
                let factor: u32 = factor
                    .parse()
                    .with_context(|| format!("invalid speed: {factor}"))?;
                ReplCommand::Speed(SpeedFactor::try_from(factor)?)
            }
            ("start", []) => ReplCommand::Start,
            ("pause", []) => ReplCommand::Pause,
            ("resume", []) => ReplCommand::Resume,
            ("stop", []) => ReplCommand::Stop,
            ("series", []) => ReplCommand::Series,
            ("sleep-now", []) => ReplCommand::SleepNow,
            ("wake-at", [time]) => ReplCommand::WakeAt(parse_clock_time(time)?),
            ("bed-at", [time]) => ReplCommand::BedAt(parse_clock_time(time)?),
            ("hormones", []) => ReplCommand::Hormones { stress: false },
            ("hormones", ["stress"]) => ReplCommand::Hormones { stress: true },
            ("hypnogram", names) => {
                let stressors = names
                    .iter()
                    .map(|name| parse_stressor(name))
                    .collect::<Result<Vec<_>>>()?;
                ReplCommand::Hypnogram(stressors)
            }
            ("logs", []) => ReplCommand::Logs,
            ("help", []) => ReplCommand::Help,
            ("quit" | "exit", []) => ReplCommand::Quit,
            _ => bail!("unknown command: {line} (type 'help')"),
        };
        Ok(command)
    }
}

fn parse_clock_time(text: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(text, "%H:%M")
        .with_context(|| format!("expected HH:MM, got {text}"))
}

fn parse_stressor(name: &str) -> Result<Stressor> {
    match name {
        "alcohol" => Ok(Stressor::Alcohol),
        "blue-light" => Ok(Stressor::BlueLight),
        "late-caffeine" => Ok(Stressor::LateCaffeine),
        other => bail!("unknown stressor: {other}"),
    }
}

pub enum Outcome {
    Print(String),
    Quit,
}

/// Console-side toggles that persist between commands
#[derive(Debug, Default)]
pub struct Session {
    stressors: Stressors,
    stress_spike: bool,
}

impl Session {
    pub async fn execute(&mut self, engine: &BioEngine, command: ReplCommand) -> Result<Outcome> {
        let text = match command {
            ReplCommand::Status { json: false } => render_status(engine, &engine.snapshot()),
            ReplCommand::Status { json: true } => serde_json::to_string_pretty(&engine.snapshot())
                .context("Failed to serialize bio-state")?,
            ReplCommand::Caffeine(mg) => {
                let state = engine.ingest_caffeine(mg).await?;
                format!(
                    "caffeine {:.1} mg, receptor blockage {:.1}%",
                    state.caffeine_level_mg,
                    state.receptor_blockage * 100.0
                )
            }
            ReplCommand::Heat => {
                let state = engine.trigger_vasodilation().await?;
                format!(
                    "core temp {:.1} °C, sleep gate {}",
                    state.core_body_temp_c,
                    gate_label(state.sleep_gate_open())
                )
            }
            ReplCommand::Wake(hour) => {
                engine.set_wake_hour(hour).await?;
                engine
                    .append_log(format!("BOOT_TIME_UPDATED::{hour}:00"), Severity::Info)
                    .await?;
                engine
                    .append_log("RECALCULATING_ADENOSINE_LOAD...", Severity::Warning)
                    .await?;
                format!("wake hour set to {hour:02}:00")
            }
            ReplCommand::Speed(speed) => {
                let status = engine.set_speed(speed).await?;
                format!("time warp: {} ({:?})", status.speed.label(), status.state)
            }
            ReplCommand::Start => format!("clock {:?}", engine.start().await?.state),
            ReplCommand::Pause => format!("clock {:?}", engine.pause().await?.state),
            ReplCommand::Resume => format!("clock {:?}", engine.resume().await?.state),
            ReplCommand::Stop => format!("clock {:?}", engine.stop().await?.state),
            ReplCommand::Series => render_series(engine.snapshot().wake_hour),
            ReplCommand::SleepNow => {
                let now = Local::now().naive_local();
                render_windows("fall asleep now, wake at:", &windows_for_immediate_sleep(now))
            }
            ReplCommand::WakeAt(time) => render_wake_at(Local::now().naive_local(), time),
            ReplCommand::BedAt(time) => {
                let bed = Local::now().date_naive().and_time(time);
                render_windows("wake at:", &waketimes_for_bed(bed))
            }
            ReplCommand::Hormones { stress } => self.hormones(engine, stress).await?,
            ReplCommand::Hypnogram(active) => self.hypnogram(engine, &active).await?,
            ReplCommand::Logs => render_logs(&engine.snapshot()),
            ReplCommand::Help => HELP.to_string(),
            ReplCommand::Quit => return Ok(Outcome::Quit),
        };
        Ok(Outcome::Print(text))
    }

    async fn hormones(&mut self, engine: &BioEngine, stress: bool) -> Result<String> {
        if stress != self.stress_spike {
            self.stress_spike = stress;
            if stress {
                engine.set_stress_level(1.0).await?;
                engine
                    .append_log("CORTISOL_SPIKE::MELATONIN_SUPPRESSED", Severity::Alert)
                    .await?;
            } else {
                engine.set_stress_level(0.0).await?;
                engine
                    .append_log("CORTISOL_LEVELS_NORMALIZING", Severity::Success)
                    .await?;
            }
        }

        let mut out = String::from("time   cortisol  melatonin\n");
        for sample in hormone_profile(stress) {
            let _ = writeln!(
                out,
                "{:<6} {:>8.2}  {:>9.2}{}",
                sample.label,
                sample.cortisol,
                sample.melatonin,
                if sample.melatonin_suppressed() && sample.melatonin > 0.0 {
                    "  suppressed"
                } else {
                    ""
                }
            );
        }
        Ok(out.trim_end().to_string())
    }

    /// Switch stressors to exactly `active`, logging each change, and feed
    /// the resulting HRV estimate back into the state.
    async fn hypnogram(&mut self, engine: &BioEngine, active: &[Stressor]) -> Result<String> {
        for stressor in Stressor::ALL {
            let wanted = active.contains(&stressor);
            if self.stressors.is_active(stressor) == wanted {
                continue;
            }
            if self.stressors.toggle(stressor) {
                for (i, message) in stressor.detected_messages().into_iter().enumerate() {
                    let severity = if i == 0 { Severity::Alert } else { Severity::Warning };
                    engine.append_log(message, severity).await?;
                }
            } else {
                engine
                    .append_log(stressor.cleared_message(), Severity::Success)
                    .await?;
            }
        }

        let cycles = build_architecture(NIGHT_CYCLES, self.stressors);
        let quality = recovery_quality_pct(&cycles);
        let hrv = estimate_hrv_ms(quality);
        engine.set_heart_rate_variability(hrv).await?;

        let mut out = String::from("cycle  deep(N3)  REM   quality\n");
        for cycle in &cycles {
            let _ = writeln!(
                out,
                "{:<5}  {:>7.0}%  {:>3.0}%  {:>6.0}%",
                cycle.id,
                cycle.n3_pct,
                cycle.rem_pct,
                cycle.quality * 100.0
            );
        }
        let _ = write!(out, "recovery {quality:.0}%, HRV {hrv:.0} ms");
        Ok(out)
    }
}

fn gate_label(open: bool) -> &'static str {
    if open {
        "OPEN"
    } else {
        "closed"
    }
}

fn render_status(engine: &BioEngine, state: &BioState) -> String {
    let clock = engine.clock_status();
    format!(
        "clock      {:?} @ {}\n\
         caffeine   {:.1} mg (peak {:.1} mg), receptor blockage {:.1}%\n\
         core temp  {:.2} °C, sleep gate {}\n\
         hrv        {:.0} ms, cognitive load {:.0}%\n\
         wake hour  {:02}:00, stress {:.2}",
        clock.state,
        clock.speed.label(),
        state.caffeine_level_mg,
        state.max_caffeine_seen_mg,
        state.receptor_blockage * 100.0,
        state.core_body_temp_c,
        gate_label(state.sleep_gate_open()),
        state.heart_rate_variability_ms,
        state.cognitive_load_pct,
        state.wake_hour,
        state.stress_level,
    )
}

fn render_series(wake_hour: u8) -> String {
    let wake = f64::from(wake_hour);
    let series = generate_daily_series(wake, wake + WAKING_DAY_HOURS);

    let mut out = String::from("time   awake   S      gate\n");
    for sample in series.iter().step_by(2) {
        let _ = writeln!(
            out,
            "{:<6} {:>5.1}h  {:.3}  {:.3}{}{}",
            sample.time_label,
            sample.hours_awake,
            sample.sleep_pressure,
            sample.threshold,
            if sample.gate_open() { "  *" } else { "" },
            if sample.past_bedtime { "  (past bedtime)" } else { "" },
        );
    }
    match find_crash_point(&series) {
        Some(crash) => {
            let _ = write!(
                out,
                "crash point {} after {:.1}h awake",
                crash.time_label, crash.hours_awake
            );
        }
        None => out.push_str("no crash point within 24h"),
    }
    out
}

fn render_wake_at(now: NaiveDateTime, time: NaiveTime) -> String {
    let wake = resolve_wake_target(now, time);
    let mut out = render_windows(
        &format!("to wake at {}, go to bed at:", wake.format("%H:%M")),
        &windows_for_target_wake(wake),
    );
    out.push('\n');
    out.push_str(&render_windows("full night:", &bedtimes_for_wake(wake)));
    out
}

fn render_windows<L: Display>(title: &str, windows: &[SleepWindow<L>]) -> String {
    let mut out = String::from(title);
    for window in windows {
        let _ = write!(
            out,
            "\n  {}  {} cycles  {}h{:02}m  {}",
            window.clock_label(),
            window.cycle_count,
            window.hours(),
            window.minutes(),
            window.label
        );
    }
    out
}

fn render_logs(state: &BioState) -> String {
    state
        .event_log
        .iter()
        .map(|entry| format!("{} [{}] {}", entry.timestamp, entry.severity, entry.message))
        .collect::<Vec<_>>()
        .join("\n")
}
