//! Timer-driven demo player
//!
//! Wraps a [`DemoSequencer`] with a tokio task that arms the pending timer,
//! re-arms it whenever a command changes the state, and feeds elapsed timers
//! back to the sequencer. Snapshots are published on a `watch` channel.
//!
//! The task is aborted when the player is dropped.

use crate::catalog::DemoCatalog;
use crate::completion::CompletionStore;
use crate::error::DemoError;
use crate::sequencer::{DemoSequencer, DemoSnapshot, TimerOutcome};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

/// Player tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerOptions {
    /// Playback speed multiplier; 2.0 halves every step's delay
    pub speed: f64,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self { speed: 1.0 }
    }
}

impl PlayerOptions {
    /// Whether `speed` is a usable multiplier
    #[inline]
    #[must_use]
    pub fn is_valid_speed(speed: f64) -> bool {
        speed.is_finite() && speed > 0.0
    }

    /// Step delay at this speed; unusable speeds or unrepresentable results
    /// play at normal speed
    fn scale(&self, duration: Duration) -> Duration {
        if !Self::is_valid_speed(self.speed) {
            return duration;
        }
        Duration::try_from_secs_f64(duration.as_secs_f64() / self.speed).unwrap_or(duration)
    }
}

struct Shared {
    sequencer: Mutex<DemoSequencer>,
    changed: Notify,
    snapshots: watch::Sender<DemoSnapshot>,
    completions: Arc<dyn CompletionStore>,
    options: PlayerOptions,
}

impl Shared {
    /// Run a command; publish and wake the timer loop if it changed state
    fn command<R>(&self, f: impl FnOnce(&mut DemoSequencer) -> R, changed: impl Fn(&R) -> bool) -> R {
        let (result, snapshot) = {
            let mut sequencer = self.sequencer.lock();
            let result = f(&mut sequencer);
            let snapshot = changed(&result).then(|| sequencer.snapshot());
            (result, snapshot)
        };
        if let Some(snapshot) = snapshot {
            self.snapshots.send_replace(snapshot);
            self.changed.notify_one();
        }
        result
    }

    fn on_timer(&self, generation: u64) {
        let (outcome, snapshot) = {
            let mut sequencer = self.sequencer.lock();
            let outcome = sequencer.on_timer_elapsed(generation);
            (outcome, sequencer.snapshot())
        };
        match outcome {
            TimerOutcome::Stale => return,
            TimerOutcome::Advanced { step_index } => {
                tracing::debug!(step_index, "Demo advanced");
            }
            TimerOutcome::Stalled => {
                tracing::debug!(step_index = snapshot.step_index, "Demo waiting for click");
            }
            TimerOutcome::Completed { ref demo_id } => {
                tracing::info!(demo = %demo_id, "Demo completed");
                if let Err(e) = self.completions.mark_completed(demo_id) {
                    tracing::warn!(demo = %demo_id, error = %e, "Failed to record demo completion");
                }
            }
        }
        self.snapshots.send_replace(snapshot);
    }
}

async fn run(shared: Arc<Shared>) {
    loop {
        let timer = shared.sequencer.lock().pending_timer();
        match timer {
            Some(timer) => {
                let delay = shared.options.scale(timer.duration);
                tokio::select! {
                    () = tokio::time::sleep(delay) => shared.on_timer(timer.generation),
                    () = shared.changed.notified() => {}
                }
            }
            None => shared.changed.notified().await,
        }
    }
}

/// Demo sequencer driven by real (or paused test) time
pub struct DemoPlayer {
    shared: Arc<Shared>,
    task: JoinHandle<()>,
}

impl DemoPlayer {
    /// Create player and spawn its timer task
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(catalog: Arc<DemoCatalog>, completions: Arc<dyn CompletionStore>) -> Self {
        Self::with_options(catalog, completions, PlayerOptions::default())
    }

    /// Create player with options
    pub fn with_options(
        catalog: Arc<DemoCatalog>,
        completions: Arc<dyn CompletionStore>,
        options: PlayerOptions,
    ) -> Self {
        let (snapshots, _) = watch::channel(DemoSnapshot::default());
        let shared = Arc::new(Shared {
            sequencer: Mutex::new(DemoSequencer::new(catalog)),
            changed: Notify::new(),
            snapshots,
            completions,
            options,
        });
        let task = tokio::spawn(run(Arc::clone(&shared)));
        Self { shared, task }
    }

    /// Load a demo at step 0, paused
    ///
    /// # Errors
    /// `UnknownDemo` if the id is not in the catalog.
    pub fn start_demo(&self, id: &str) -> Result<(), DemoError> {
        self.shared
            .command(|s| s.start_demo(id), Result::is_ok)?;
        tracing::info!(demo = %id, "Demo started");
        Ok(())
    }

    /// Unload the demo
    pub fn stop_demo(&self) -> Option<String> {
        let stopped = self.shared.command(DemoSequencer::stop_demo, Option::is_some);
        if let Some(id) = &stopped {
            tracing::info!(demo = %id, "Demo stopped");
        }
        stopped
    }

    /// Start auto-advance
    pub fn play(&self) -> bool {
        self.shared.command(DemoSequencer::play, |c| *c)
    }

    /// Stop auto-advance
    pub fn pause(&self) -> bool {
        self.shared.command(DemoSequencer::pause, |c| *c)
    }

    /// Flip auto-advance
    pub fn toggle_play(&self) -> bool {
        self.shared.command(DemoSequencer::toggle_play, |c| *c)
    }

    /// Advance one step
    pub fn next_step(&self) -> bool {
        self.shared.command(DemoSequencer::next_step, |c| *c)
    }

    /// Go back one step
    pub fn prev_step(&self) -> bool {
        self.shared.command(DemoSequencer::prev_step, |c| *c)
    }

    /// Jump to a step; out-of-range indices are ignored
    pub fn go_to_step(&self, index: usize) -> bool {
        self.shared.command(|s| s.go_to_step(index), |c| *c)
    }

    /// Current view
    #[must_use]
    pub fn snapshot(&self) -> DemoSnapshot {
        self.shared.snapshots.borrow().clone()
    }

    /// Receive every published view
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<DemoSnapshot> {
        self.shared.snapshots.subscribe()
    }

    /// Whether a demo was ever completed
    #[must_use]
    pub fn is_completed(&self, demo_id: &str) -> bool {
        self.shared.completions.is_completed(demo_id)
    }
}

impl Drop for DemoPlayer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl fmt::Debug for DemoPlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DemoPlayer")
            .field("snapshot", &*self.shared.snapshots.borrow())
            .field("options", &self.shared.options)
            .finish_non_exhaustive()
    }
}
