//! Fixed-period poll thread with statum lifecycle
//!
//! ```text
//! Idle ──start──► Running ──stop──► Stopped
//! ```
//!
//! The loop runs on a dedicated OS thread rather than a tokio task so a busy
//! runtime never stretches the tick period.

use crate::mapping::engine::EngineCore;
use crate::mapping::EngineError;
use chrono::Local;
use statum::{machine, state};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info};

#[state]
#[derive(Debug, Clone)]
pub enum PollState {
    Idle,
    Running,
    Stopped,
}

#[machine]
pub struct PollLoop<S: PollState> {
    core: Arc<EngineCore>,
    period: Duration,
    keep_running: Arc<AtomicBool>,
    worker: Option<JoinHandle<u64>>,
    ticks: u64,
}

impl PollLoop<Idle> {
    pub fn create(core: Arc<EngineCore>, period: Duration) -> Self {
        debug!("Creating poll loop with {:?} period", period);
        Self::new(
            core,
            period,
            Arc::new(AtomicBool::new(false)),
            None, // worker
            0,    // ticks
        )
    }

    /// Spawns the poll thread
    pub fn start(mut self) -> Result<PollLoop<Running>, EngineError> {
        self.keep_running.store(true, Ordering::Release);

        let core = self.core.clone();
        let keep_running = self.keep_running.clone();
        let period = self.period;
        let worker = thread::Builder::new()
            .name("poll-loop".to_string())
            .spawn(move || run_poll_loop(core, period, keep_running))
            .map_err(|e| {
                error!("Failed to spawn poll thread: {}", e);
                EngineError::ThreadError(format!("Failed to spawn poll thread: {}", e))
            })?;

        self.worker = Some(worker);
        info!("Poll loop running every {:?}", self.period);
        Ok(self.transition())
    }
}

impl PollLoop<Running> {
    /// Signals the thread and waits for its current tick to finish
    pub fn stop(mut self) -> PollLoop<Stopped> {
        debug!("Stopping poll loop");
        self.keep_running.store(false, Ordering::Release);

        if let Some(worker) = self.worker.take() {
            match worker.join() {
                Ok(ticks) => self.ticks = ticks,
                Err(_) => error!("Poll thread panicked"),
            }
        }
        self.transition()
    }
}

impl PollLoop<Stopped> {
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

fn run_poll_loop(core: Arc<EngineCore>, period: Duration, keep_running: Arc<AtomicBool>) -> u64 {
    info!("Poll thread started");

    let mut total_ticks = 0u64;
    let mut window_ticks = 0u64;
    let mut last_stats_time = Local::now();
    let stats_interval = chrono::Duration::seconds(30);

    while keep_running.load(Ordering::Acquire) {
        core.tick();
        total_ticks += 1;
        window_ticks += 1;

        let now = Local::now();
        if now.signed_duration_since(last_stats_time) >= stats_interval {
            info!(
                "Poll loop stats: {} ticks in last {} seconds (avg {:.1}/sec) at {}",
                window_ticks,
                stats_interval.num_seconds(),
                window_ticks as f64 / stats_interval.num_seconds() as f64,
                now.format("%H:%M:%S.%3f")
            );
            window_ticks = 0;
            last_stats_time = now;
        }

        thread::sleep(period);
    }

    info!("Poll thread exiting after {} ticks", total_ticks);
    total_ticks
}
