//! Bio engine: the single writer of the simulated physiology
//!
//! The engine owns a [`BioStore`] and a [`SimulationClock`] inside one
//! background task. That task:
//! - ticks the clock while it is running and decays chemistry
//! - applies mutations sent by collaborators, one at a time
//! - publishes a fresh snapshot after every change
//!
//! Because ticks and mutations are serialized through one `select!` loop, no
//! mutation ever observes another one half-applied and the store needs no
//! lock.

use crate::clock::{ClockStatus, SimulationClock, SpeedFactor, TickConfig};
use crate::error::EngineError;
use circa_core::{BioState, BioStore, CircaConfig, Severity};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior};

/// A write against the bio-state
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    SetWakeHour(u8),
    SetStressLevel(f64),
    SetCaffeineIntakeHour(Option<u8>),
    SetHeartRateVariability(f64),
    SetCognitiveLoad(f64),
    AppendLog { message: String, severity: Severity },
    IngestCaffeine(f64),
    AdvanceChemistry(f64),
    TriggerVasodilation,
}

impl Mutation {
    fn apply(self, store: &mut BioStore) {
        match self {
            Mutation::SetWakeHour(hour) => store.set_wake_hour(hour),
            Mutation::SetStressLevel(level) => store.set_stress_level(level),
            Mutation::SetCaffeineIntakeHour(hour) => store.set_caffeine_intake_hour(hour),
            Mutation::SetHeartRateVariability(ms) => store.set_heart_rate_variability(ms),
            Mutation::SetCognitiveLoad(pct) => store.set_cognitive_load(pct),
            Mutation::AppendLog { message, severity } => store.append_log(message, severity),
            Mutation::IngestCaffeine(mg) => store.ingest_caffeine(mg),
            Mutation::AdvanceChemistry(hours) => store.advance_chemistry(hours),
            Mutation::TriggerVasodilation => store.trigger_vasodilation(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClockControl {
    Start,
    Pause,
    Resume,
    Stop,
    SetSpeed(SpeedFactor),
}

enum Command {
    Mutate(Mutation, oneshot::Sender<BioState>),
    Clock(ClockControl, oneshot::Sender<ClockStatus>),
    Shutdown(oneshot::Sender<()>),
}

/// Handle to the running simulation
pub struct BioEngine {
    command_tx: mpsc::Sender<Command>,
    state_rx: watch::Receiver<BioState>,
    clock_rx: watch::Receiver<ClockStatus>,
}

impl BioEngine {
    /// Default biology, real time, clock stopped
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn new() -> Self {
        Self::with_parts(
            BioStore::default(),
            TickConfig::default(),
            SpeedFactor::RealTime,
            false,
        )
    }

    pub fn from_config(config: &CircaConfig) -> Result<Self, EngineError> {
        let speed = SpeedFactor::try_from(config.clock.speed)?;
        Ok(Self::with_parts(
            config.biology.build_store(),
            TickConfig::from_millis(config.clock.tick_interval_ms),
            speed,
            config.clock.autostart,
        ))
    }

    /// Spawn the driver task.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn with_parts(
        store: BioStore,
        tick_config: TickConfig,
        speed: SpeedFactor,
        autostart: bool,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::channel(64);
        let (state_tx, state_rx) = watch::channel(store.snapshot());
        let mut clock = SimulationClock::new(speed);
        if autostart {
            clock.start(Instant::now());
        }
        let (clock_tx, clock_rx) = watch::channel(clock.status());

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick_config.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.reset();

            let driver = Driver {
                store,
                clock,
                interval,
                state_tx,
                clock_tx,
            };
            driver.run(command_rx).await;
        });

        Self {
            command_tx,
            state_rx,
            clock_rx,
        }
    }

    /// Latest published snapshot; never blocks
    pub fn snapshot(&self) -> BioState {
        self.state_rx.borrow().clone()
    }

    /// Subscribe to snapshot updates
    pub fn subscribe(&self) -> watch::Receiver<BioState> {
        self.state_rx.clone()
    }

    pub fn clock_status(&self) -> ClockStatus {
        *self.clock_rx.borrow()
    }

    pub fn subscribe_clock(&self) -> watch::Receiver<ClockStatus> {
        self.clock_rx.clone()
    }

    /// Apply a mutation and return the snapshot it produced
    pub async fn apply(&self, mutation: Mutation) -> Result<BioState, EngineError> {
        self.request(|reply| Command::Mutate(mutation, reply)).await
    }

    pub async fn set_wake_hour(&self, hour: u8) -> Result<BioState, EngineError> {
        self.apply(Mutation::SetWakeHour(hour)).await
    }

    pub async fn set_stress_level(&self, level: f64) -> Result<BioState, EngineError> {
        self.apply(Mutation::SetStressLevel(level)).await
    }

    pub async fn set_caffeine_intake_hour(&self, hour: Option<u8>) -> Result<BioState, EngineError> {
        self.apply(Mutation::SetCaffeineIntakeHour(hour)).await
    }

    pub async fn set_heart_rate_variability(&self, ms: f64) -> Result<BioState, EngineError> {
        self.apply(Mutation::SetHeartRateVariability(ms)).await
    }

    pub async fn set_cognitive_load(&self, pct: f64) -> Result<BioState, EngineError> {
        self.apply(Mutation::SetCognitiveLoad(pct)).await
    }

    pub async fn append_log(
        &self,
        message: impl Into<String>,
        severity: Severity,
    ) -> Result<BioState, EngineError> {
        self.apply(Mutation::AppendLog {
            message: message.into(),
            severity,
        })
        .await
    }

    pub async fn ingest_caffeine(&self, dose_mg: f64) -> Result<BioState, EngineError> {
        self.apply(Mutation::IngestCaffeine(dose_mg)).await
    }

    /// Manual chemistry step, outside the clock
    pub async fn advance_chemistry(&self, elapsed_hours: f64) -> Result<BioState, EngineError> {
        self.apply(Mutation::AdvanceChemistry(elapsed_hours)).await
    }

    pub async fn trigger_vasodilation(&self) -> Result<BioState, EngineError> {
        self.apply(Mutation::TriggerVasodilation).await
    }

    pub async fn start(&self) -> Result<ClockStatus, EngineError> {
        self.clock(ClockControl::Start).await
    }

    pub async fn pause(&self) -> Result<ClockStatus, EngineError> {
        self.clock(ClockControl::Pause).await
    }

    pub async fn resume(&self) -> Result<ClockStatus, EngineError> {
        self.clock(ClockControl::Resume).await
    }

    pub async fn stop(&self) -> Result<ClockStatus, EngineError> {
        self.clock(ClockControl::Stop).await
    }

    pub async fn set_speed(&self, speed: SpeedFactor) -> Result<ClockStatus, EngineError> {
        self.clock(ClockControl::SetSpeed(speed)).await
    }

    /// Stop the clock and end the driver task
    pub async fn shutdown(&self) -> Result<(), EngineError> {
        self.request(Command::Shutdown).await
    }

    async fn clock(&self, control: ClockControl) -> Result<ClockStatus, EngineError> {
        self.request(|reply| Command::Clock(control, reply)).await
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(build(reply_tx))
            .await
            .map_err(|_| EngineError::Closed)?;
        reply_rx.await.map_err(|_| EngineError::Closed)
    }
}

/// # Panics
///
/// Panics when called outside a tokio runtime, like [`BioEngine::new`].
impl Default for BioEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// State owned by the background task
struct Driver {
    store: BioStore,
    clock: SimulationClock,
    interval: Interval,
    state_tx: watch::Sender<BioState>,
    clock_tx: watch::Sender<ClockStatus>,
}

impl Driver {
    async fn run(mut self, mut command_rx: mpsc::Receiver<Command>) {
        loop {
            tokio::select! {
                _ = self.interval.tick(), if self.clock.is_running() => {
                    self.on_tick();
                }

                command = command_rx.recv() => match command {
                    Some(Command::Mutate(mutation, reply)) => {
                        mutation.apply(&mut self.store);
                        let _ = reply.send(self.publish_state());
                    }
                    Some(Command::Clock(control, reply)) => {
                        self.on_clock(control);
                        let _ = reply.send(self.publish_clock());
                    }
                    Some(Command::Shutdown(reply)) => {
                        self.clock.stop();
                        self.publish_clock();
                        let _ = reply.send(());
                        break;
                    }
                    None => break,
                },
            }
        }
        tracing::debug!("Simulation engine stopped");
    }

    fn on_tick(&mut self) {
        if let Some(hours) = self.clock.tick(Instant::now()) {
            self.advance(hours);
        }
    }

    fn advance(&mut self, hours: f64) {
        self.store.advance_chemistry(hours);
        self.publish_state();
        tracing::trace!(
            "tick: +{:.4}h virtual, caffeine={:.2}mg",
            hours,
            self.store.state().caffeine_level_mg
        );
    }

    fn on_clock(&mut self, control: ClockControl) {
        let now = Instant::now();
        match control {
            ClockControl::Start => {
                if self.clock.start(now) {
                    self.interval.reset();
                    tracing::info!("Simulation clock started at {}x", self.clock.speed().multiplier());
                }
            }
            ClockControl::Pause => {
                if let Some(hours) = self.clock.pause(now) {
                    self.advance(hours);
                    tracing::info!("Simulation clock paused");
                }
            }
            ClockControl::Resume => {
                if self.clock.resume(now) {
                    self.interval.reset();
                    tracing::info!("Simulation clock resumed");
                }
            }
            ClockControl::Stop => {
                if self.clock.stop() {
                    tracing::info!("Simulation clock stopped");
                }
            }
            ClockControl::SetSpeed(speed) => {
                if let Some(hours) = self.clock.set_speed(speed, now) {
                    self.advance(hours);
                }
                self.store
                    .log_info(format!("TIME_WARP::ENGAGED::{}", speed.label()));
                self.publish_state();
            }
        }
    }

    fn publish_state(&self) -> BioState {
        let snapshot = self.store.snapshot();
        let _ = self.state_tx.send(snapshot.clone());
        snapshot
    }

    fn publish_clock(&self) -> ClockStatus {
        let status = self.clock.status();
        let _ = self.clock_tx.send(status);
        status
    }
}
