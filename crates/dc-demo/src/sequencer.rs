//! Demo step state machine
//!
//! Pure and synchronous: the sequencer never sleeps. It reports the timer it
//! wants armed through [`DemoSequencer::pending_timer`] and is told when that
//! timer fires through [`DemoSequencer::on_timer_elapsed`]. Every state
//! change bumps a generation counter, so a timer armed for an earlier state
//! is recognised as stale and ignored.
//!
//! ```text
//! Inactive --start_demo--> Active { step 0, paused }
//! Active   --play/pause/next/prev/go_to--> Active
//! Active   --timer on last step--> Active { completed, paused }
//! Active   --stop_demo--> Inactive
//! ```

use crate::catalog::DemoCatalog;
use crate::error::DemoError;
use crate::model::{Demo, DemoStep};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Coarse sequencer state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoState {
    /// No demo running
    Inactive,
    /// A demo is loaded
    Active {
        /// Current step
        step_index: usize,
        /// Auto-advance is on
        is_playing: bool,
    },
}

/// Timer the driver should arm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTimer {
    /// State generation the timer belongs to
    pub generation: u64,
    /// Delay before firing
    pub duration: Duration,
}

/// What happened when a timer fired
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerOutcome {
    /// Timer belonged to an earlier state
    Stale,
    /// Moved to the next step
    Advanced {
        /// New step index
        step_index: usize,
    },
    /// Current step waits for a manual advance
    Stalled,
    /// Final step elapsed; playback stopped
    Completed {
        /// Finished demo
        demo_id: String,
    },
}

/// Published view of the sequencer
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoSnapshot {
    pub demo_id: Option<String>,
    pub demo_name: Option<String>,
    pub step_index: usize,
    pub total_steps: usize,
    pub current_step: Option<DemoStep>,
    pub is_playing: bool,
    /// Playing, but held on a click-to-continue step
    pub awaiting_click: bool,
    /// Last step elapsed during playback
    pub completed: bool,
    pub progress: f64,
}

#[derive(Debug, Clone)]
struct ActiveDemo {
    demo: Arc<Demo>,
    step_index: usize,
    is_playing: bool,
    stalled: bool,
    completed: bool,
}

/// Demo step state machine
#[derive(Debug, Clone)]
pub struct DemoSequencer {
    catalog: Arc<DemoCatalog>,
    active: Option<ActiveDemo>,
    generation: u64,
}

impl DemoSequencer {
    /// Create inactive sequencer over a catalog
    #[must_use]
    pub fn new(catalog: Arc<DemoCatalog>) -> Self {
        Self {
            catalog,
            active: None,
            generation: 0,
        }
    }

    /// Catalog in use
    #[must_use]
    pub fn catalog(&self) -> &Arc<DemoCatalog> {
        &self.catalog
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Load a demo at step 0, paused
    ///
    /// # Errors
    /// `UnknownDemo` if the id is not in the catalog.
    pub fn start_demo(&mut self, id: &str) -> Result<(), DemoError> {
        let demo = self
            .catalog
            .get(id)
            .cloned()
            .ok_or_else(|| DemoError::UnknownDemo(id.to_string()))?;
        self.active = Some(ActiveDemo {
            demo: Arc::new(demo),
            step_index: 0,
            is_playing: false,
            stalled: false,
            completed: false,
        });
        self.bump();
        Ok(())
    }

    /// Unload the demo; returns its id if one was active
    pub fn stop_demo(&mut self) -> Option<String> {
        let active = self.active.take()?;
        self.bump();
        Some(active.demo.id.clone())
    }

    /// Start auto-advance
    pub fn play(&mut self) -> bool {
        self.set_playing(true)
    }

    /// Stop auto-advance
    pub fn pause(&mut self) -> bool {
        self.set_playing(false)
    }

    /// Flip auto-advance
    pub fn toggle_play(&mut self) -> bool {
        match self.active.as_ref().map(|a| a.is_playing) {
            Some(playing) => self.set_playing(!playing),
            None => false,
        }
    }

    /// Advance one step; no-op on the final step
    pub fn next_step(&mut self) -> bool {
        let target = match &self.active {
            Some(a) if a.step_index < a.demo.last_index() => a.step_index + 1,
            _ => return false,
        };
        self.move_to(target)
    }

    /// Go back one step; no-op on step 0
    pub fn prev_step(&mut self) -> bool {
        let target = match &self.active {
            Some(a) if a.step_index > 0 => a.step_index - 1,
            _ => return false,
        };
        self.move_to(target)
    }

    /// Jump to a step; out-of-range indices are ignored
    pub fn go_to_step(&mut self, index: usize) -> bool {
        let in_range = self
            .active
            .as_ref()
            .is_some_and(|a| index < a.demo.steps.len());
        in_range && self.move_to(index)
    }

    // ------------------------------------------------------------------
    // Timer
    // ------------------------------------------------------------------

    /// Timer that should currently be armed, if any
    #[must_use]
    pub fn pending_timer(&self) -> Option<PendingTimer> {
        let active = self.active.as_ref()?;
        if !active.is_playing || active.stalled {
            return None;
        }
        let step = active.demo.steps.get(active.step_index)?;
        Some(PendingTimer {
            generation: self.generation,
            duration: step.duration(),
        })
    }

    /// Handle a fired timer
    pub fn on_timer_elapsed(&mut self, generation: u64) -> TimerOutcome {
        if generation != self.generation {
            return TimerOutcome::Stale;
        }
        let Some(active) = self.active.as_mut() else {
            return TimerOutcome::Stale;
        };
        if !active.is_playing || active.stalled {
            return TimerOutcome::Stale;
        }

        let wait = active
            .demo
            .steps
            .get(active.step_index)
            .is_some_and(|s| s.wait_for_click);
        if wait {
            active.stalled = true;
            self.bump();
            return TimerOutcome::Stalled;
        }

        if active.step_index < active.demo.last_index() {
            active.step_index += 1;
            let step_index = active.step_index;
            self.bump();
            TimerOutcome::Advanced { step_index }
        } else {
            active.is_playing = false;
            active.completed = true;
            let demo_id = active.demo.id.clone();
            self.bump();
            TimerOutcome::Completed { demo_id }
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Coarse state
    #[must_use]
    pub fn state(&self) -> DemoState {
        match &self.active {
            Some(a) => DemoState::Active {
                step_index: a.step_index,
                is_playing: a.is_playing,
            },
            None => DemoState::Inactive,
        }
    }

    /// Whether a demo is loaded
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Whether auto-advance is on
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.active.as_ref().is_some_and(|a| a.is_playing)
    }

    /// Loaded demo
    #[must_use]
    pub fn current_demo(&self) -> Option<&Demo> {
        self.active.as_ref().map(|a| a.demo.as_ref())
    }

    /// Current step
    #[must_use]
    pub fn current_step(&self) -> Option<&DemoStep> {
        let active = self.active.as_ref()?;
        active.demo.steps.get(active.step_index)
    }

    /// Current step index, 0 when inactive
    #[must_use]
    pub fn step_index(&self) -> usize {
        self.active.as_ref().map_or(0, |a| a.step_index)
    }

    /// Fraction of steps reached, `(step_index + 1) / steps`
    #[must_use]
    pub fn progress(&self) -> f64 {
        match &self.active {
            Some(a) if !a.demo.steps.is_empty() => {
                (a.step_index + 1) as f64 / a.demo.steps.len() as f64
            }
            _ => 0.0,
        }
    }

    /// State generation
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Published view
    #[must_use]
    pub fn snapshot(&self) -> DemoSnapshot {
        let Some(active) = &self.active else {
            return DemoSnapshot::default();
        };
        DemoSnapshot {
            demo_id: Some(active.demo.id.clone()),
            demo_name: Some(active.demo.name.clone()),
            step_index: active.step_index,
            total_steps: active.demo.steps.len(),
            current_step: active.demo.steps.get(active.step_index).cloned(),
            is_playing: active.is_playing,
            awaiting_click: active.is_playing && active.stalled,
            completed: active.completed,
            progress: self.progress(),
        }
    }

    fn set_playing(&mut self, playing: bool) -> bool {
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        if active.is_playing == playing {
            return false;
        }
        active.is_playing = playing;
        active.stalled = false;
        if playing {
            active.completed = false;
        }
        self.bump();
        true
    }

    fn move_to(&mut self, index: usize) -> bool {
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        if active.step_index == index {
            return false;
        }
        active.step_index = index;
        active.stalled = false;
        active.completed = false;
        self.bump();
        true
    }

    fn bump(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin;
    use crate::model::DemoStep;
    use proptest::prelude::*;

    fn catalog() -> Arc<DemoCatalog> {
        let mut catalog = DemoCatalog::new();
        catalog
            .insert(Demo::new(
                "three",
                "Three",
                vec![
                    DemoStep::new("a", "A", 2.0),
                    DemoStep::new("b", "B", 3.0).wait_for_click(),
                    DemoStep::new("c", "C", 1.0),
                ],
            ))
            .unwrap();
        Arc::new(catalog)
    }

    fn started() -> DemoSequencer {
        let mut seq = DemoSequencer::new(catalog());
        seq.start_demo("three").unwrap();
        seq
    }

    #[test]
    fn start_is_step_zero_paused() {
        let seq = started();
        assert_eq!(
            seq.state(),
            DemoState::Active {
                step_index: 0,
                is_playing: false
            }
        );
        assert_eq!(seq.pending_timer(), None);
    }

    #[test]
    fn unknown_demo_is_error() {
        let mut seq = DemoSequencer::new(catalog());
        assert!(matches!(
            seq.start_demo("nope"),
            Err(DemoError::UnknownDemo(ref id)) if id == "nope"
        ));
        assert_eq!(seq.state(), DemoState::Inactive);
    }

    #[test]
    fn timer_advances_while_playing() {
        let mut seq = started();
        seq.play();
        let timer = seq.pending_timer().unwrap();
        assert_eq!(timer.duration, Duration::from_secs(2));

        assert_eq!(
            seq.on_timer_elapsed(timer.generation),
            TimerOutcome::Advanced { step_index: 1 }
        );
        assert!(seq.is_playing());
    }

    #[test]
    fn wait_for_click_stalls_until_next_step() {
        let mut seq = started();
        seq.go_to_step(1);
        seq.play();
        let timer = seq.pending_timer().unwrap();

        assert_eq!(seq.on_timer_elapsed(timer.generation), TimerOutcome::Stalled);
        assert_eq!(seq.step_index(), 1);
        assert_eq!(seq.pending_timer(), None);
        assert!(seq.snapshot().awaiting_click);

        assert!(seq.next_step());
        assert_eq!(seq.step_index(), 2);
        assert!(seq.pending_timer().is_some());
    }

    #[test]
    fn timer_on_final_step_completes() {
        let mut seq = started();
        seq.go_to_step(2);
        seq.play();
        let timer = seq.pending_timer().unwrap();

        assert_eq!(
            seq.on_timer_elapsed(timer.generation),
            TimerOutcome::Completed {
                demo_id: "three".into()
            }
        );
        assert!(!seq.is_playing());
        assert!(seq.snapshot().completed);
        assert_eq!(seq.pending_timer(), None);
    }

    #[test]
    fn stale_timer_is_ignored() {
        let mut seq = started();
        seq.play();
        let timer = seq.pending_timer().unwrap();
        seq.pause();
        seq.play();

        assert_eq!(seq.on_timer_elapsed(timer.generation), TimerOutcome::Stale);
        assert_eq!(seq.step_index(), 0);
    }

    #[test]
    fn next_on_last_and_prev_on_first_are_noops() {
        let mut seq = started();
        assert!(!seq.prev_step());
        seq.go_to_step(2);
        let generation = seq.generation();
        assert!(!seq.next_step());
        assert_eq!(seq.step_index(), 2);
        assert_eq!(seq.generation(), generation);
    }

    #[test]
    fn out_of_range_go_to_is_ignored() {
        let mut seq = started();
        assert!(!seq.go_to_step(3));
        assert!(!seq.go_to_step(usize::MAX));
        assert_eq!(seq.step_index(), 0);
    }

    #[test]
    fn stop_returns_to_inactive() {
        let mut seq = started();
        seq.play();
        assert_eq!(seq.stop_demo().as_deref(), Some("three"));
        assert_eq!(seq.state(), DemoState::Inactive);
        assert_eq!(seq.pending_timer(), None);
        assert_eq!(seq.stop_demo(), None);
        assert_eq!(seq.snapshot(), DemoSnapshot::default());
    }

    #[test]
    fn toggle_play_flips() {
        let mut seq = started();
        assert!(seq.toggle_play());
        assert!(seq.is_playing());
        assert!(seq.toggle_play());
        assert!(!seq.is_playing());
    }

    #[test]
    fn progress_counts_reached_steps() {
        let mut seq = started();
        assert!((seq.progress() - 1.0 / 3.0).abs() < 1e-9);
        seq.go_to_step(2);
        assert!((seq.progress() - 1.0).abs() < 1e-9);
        seq.stop_demo();
        assert!(seq.progress().abs() < 1e-9);
    }

    #[test]
    fn builtin_executive_overview_starts_paused() {
        let mut seq = DemoSequencer::new(Arc::new(DemoCatalog::builtin()));
        seq.start_demo(builtin::EXECUTIVE_OVERVIEW).unwrap();
        assert_eq!(seq.step_index(), 0);
        assert!(!seq.is_playing());
    }

    proptest! {
        #[test]
        fn prop_index_stays_in_bounds(ops in prop::collection::vec(0u8..6, 0..64), jump in 0usize..10) {
            let mut seq = started();
            for op in ops {
                match op {
                    0 => { seq.next_step(); }
                    1 => { seq.prev_step(); }
                    2 => { seq.go_to_step(jump); }
                    3 => { seq.toggle_play(); }
                    4 => {
                        if let Some(timer) = seq.pending_timer() {
                            seq.on_timer_elapsed(timer.generation);
                        }
                    }
                    _ => { seq.on_timer_elapsed(seq.generation().wrapping_sub(1)); }
                }
                prop_assert!(seq.step_index() < 3);
                prop_assert!(seq.progress() > 0.0 && seq.progress() <= 1.0);
            }
        }
    }
}
