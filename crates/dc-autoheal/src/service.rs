//! Auto-heal service
//!
//! Owns the capture queue, the generated fixes and the hourly limiter.
//! Construct it once, share it behind an `Arc`, and hand clones to the
//! capture hooks in [`crate::hooks`].
//!
//! Processing pulls one eligible error per call:
//! 1. Skip if another pass is running, the service is disabled, or the hourly
//!    cap is reached
//! 2. Remove the first queued error at or above the severity threshold
//! 3. Ask the generator for a fix and parse it strictly
//! 4. Auto-apply safe fixes when approval is not required, otherwise park the
//!    fix for [`AutoHealService::approve_fix`]

use crate::applier::{FixApplier, LogApplier};
use crate::capture::{should_capture_console, CapturedError, ErrorId, ErrorReport, ErrorSource};
use crate::clock::{Clock, SystemClock};
use crate::config::AutoHealConfig;
use crate::error::{AutoHealError, AutoHealResult};
use crate::fix::{parse_fix_response, FixStatus, FixSuggestion};
use crate::generator::{build_request, FixGenerator};
use crate::rate_limit::HourlyRateLimiter;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Result of one [`AutoHealService::process_error_queue`] call
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    /// Another pass was already running
    AlreadyProcessing,
    /// Auto-heal is switched off
    Disabled,
    /// Hourly cap reached
    RateLimited {
        /// When the current window ends
        resets_at: DateTime<Utc>,
    },
    /// No queued error meets the severity threshold
    Idle,
    /// Fix generated and applied
    Applied(FixSuggestion),
    /// Fix generated and waiting for approval
    AwaitingApproval(FixSuggestion),
    /// Fix generated but the applier failed
    ApplyFailed {
        /// The failed fix
        fix: FixSuggestion,
        /// Applier message
        reason: String,
    },
    /// Error dropped without a fix
    Skipped {
        /// Dropped error
        error_id: ErrorId,
        /// Why no fix was produced
        reason: String,
    },
}

impl ProcessOutcome {
    /// Whether another call could make progress right away
    #[inline]
    #[must_use]
    pub fn made_progress(&self) -> bool {
        matches!(
            self,
            Self::Applied(_)
                | Self::AwaitingApproval(_)
                | Self::ApplyFailed { .. }
                | Self::Skipped { .. }
        )
    }
}

/// Point-in-time counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoHealStats {
    pub queued_errors: usize,
    pub pending_fixes: usize,
    pub fixes_applied_this_hour: u32,
    pub max_auto_fixes_per_hour: u32,
    pub window_resets_at: DateTime<Utc>,
    pub total_captured: u64,
    pub total_applied: u64,
    pub total_rejected: u64,
    pub total_skipped: u64,
}

#[derive(Debug, Default)]
struct Totals {
    captured: AtomicU64,
    applied: AtomicU64,
    rejected: AtomicU64,
    skipped: AtomicU64,
}

impl Totals {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Clears the processing flag on drop
struct ProcessingGuard<'a>(&'a AtomicBool);

impl<'a> ProcessingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Error capture queue with rate-limited fix generation
pub struct AutoHealService {
    config: RwLock<AutoHealConfig>,
    queue: Mutex<VecDeque<CapturedError>>,
    fixes: DashMap<Uuid, FixSuggestion>,
    limiter: Mutex<HourlyRateLimiter>,
    processing: AtomicBool,
    totals: Totals,
    generator: Arc<dyn FixGenerator>,
    applier: Arc<dyn FixApplier>,
    clock: Arc<dyn Clock>,
}

impl AutoHealService {
    /// Create service with the system clock and the logging applier
    pub fn new(config: AutoHealConfig, generator: Arc<dyn FixGenerator>) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let limiter = HourlyRateLimiter::new(config.max_auto_fixes_per_hour, clock.now());
        Self {
            config: RwLock::new(config),
            queue: Mutex::new(VecDeque::new()),
            fixes: DashMap::new(),
            limiter: Mutex::new(limiter),
            processing: AtomicBool::new(false),
            totals: Totals::default(),
            generator,
            applier: Arc::new(LogApplier),
            clock,
        }
    }

    /// With clock; restarts the rate window at the clock's time
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        let max = self.config.read().max_auto_fixes_per_hour;
        self.limiter = Mutex::new(HourlyRateLimiter::new(max, clock.now()));
        self.clock = clock;
        self
    }

    /// With applier
    #[must_use]
    pub fn with_applier(mut self, applier: Arc<dyn FixApplier>) -> Self {
        self.applier = applier;
        self
    }

    // ------------------------------------------------------------------
    // Capture
    // ------------------------------------------------------------------

    /// Capture an error
    ///
    /// Returns the queue entry's id, or `None` if the error was filtered out.
    /// A repeat of a queued message from the same source bumps that entry's
    /// occurrence count instead of enqueuing.
    pub fn capture(&self, source: ErrorSource, report: ErrorReport) -> Option<ErrorId> {
        if !Self::accepts(&self.config.read(), source, &report.message) {
            return None;
        }
        let now = self.clock.now();
        let captured = Self::enqueue(&mut self.queue.lock(), source, report, now);
        Some(self.note_capture(&captured))
    }

    /// Capture without blocking
    ///
    /// Used from hooks that may fire while this service holds its own locks
    /// (a panic inside a callback, an error event logged mid-operation).
    /// Drops the error if a lock is contended.
    pub fn try_capture(&self, source: ErrorSource, report: ErrorReport) -> Option<ErrorId> {
        {
            let config = self.config.try_read()?;
            if !Self::accepts(&config, source, &report.message) {
                return None;
            }
        }
        let now = self.clock.now();
        let captured = {
            let mut queue = self.queue.try_lock()?;
            Self::enqueue(&mut queue, source, report, now)
        };
        Some(self.note_capture(&captured))
    }

    /// Capture an uncaught error
    pub fn capture_error(&self, report: ErrorReport) -> Option<ErrorId> {
        self.capture(ErrorSource::WindowError, report)
    }

    /// Capture an unhandled rejection
    pub fn capture_rejection(&self, reason: impl Into<String>) -> Option<ErrorId> {
        self.capture(ErrorSource::UnhandledRejection, ErrorReport::new(reason))
    }

    /// Capture an error-level log line, subject to the console filter
    pub fn capture_console_error(&self, message: impl Into<String>) -> Option<ErrorId> {
        self.capture(ErrorSource::ConsoleError, ErrorReport::new(message))
    }

    fn accepts(config: &AutoHealConfig, source: ErrorSource, message: &str) -> bool {
        if !config.enabled {
            return false;
        }
        if source == ErrorSource::ConsoleError {
            return config.capture_console_errors && should_capture_console(message);
        }
        true
    }

    fn enqueue(
        queue: &mut VecDeque<CapturedError>,
        source: ErrorSource,
        report: ErrorReport,
        now: DateTime<Utc>,
    ) -> CapturedError {
        if let Some(existing) = queue
            .iter_mut()
            .find(|e| e.is_duplicate_of(&report.message, source))
        {
            existing.occurrences = existing.occurrences.saturating_add(1);
            return existing.clone();
        }
        let captured = CapturedError::from_report(report, source, now);
        queue.push_back(captured.clone());
        captured
    }

    fn note_capture(&self, captured: &CapturedError) -> ErrorId {
        if captured.occurrences == 1 {
            Totals::bump(&self.totals.captured);
            tracing::info!(
                error_id = %captured.id,
                severity = %captured.severity,
                agent = %captured.assigned_agent,
                source = ?captured.source,
                "Captured error: {}",
                captured.message
            );
        } else {
            tracing::debug!(
                error_id = %captured.id,
                occurrences = captured.occurrences,
                "Repeated error folded into queue entry"
            );
        }
        captured.id
    }

    // ------------------------------------------------------------------
    // Processing
    // ------------------------------------------------------------------

    /// Process at most one queued error
    pub async fn process_error_queue(&self) -> ProcessOutcome {
        let Some(_guard) = ProcessingGuard::acquire(&self.processing) else {
            return ProcessOutcome::AlreadyProcessing;
        };

        let config = self.config.read().clone();
        if !config.enabled {
            return ProcessOutcome::Disabled;
        }

        let now = self.clock.now();
        {
            let mut limiter = self.limiter.lock();
            if limiter.is_exhausted(now) {
                let resets_at = limiter.resets_at();
                tracing::debug!(%resets_at, "Hourly auto-fix limit reached");
                return ProcessOutcome::RateLimited { resets_at };
            }
        }

        let error = {
            let mut queue = self.queue.lock();
            queue
                .iter()
                .position(|e| e.severity.meets(config.auto_fix_severity))
                .and_then(|pos| queue.remove(pos))
        };
        let Some(error) = error else {
            return ProcessOutcome::Idle;
        };

        tracing::info!(
            error_id = %error.id,
            severity = %error.severity,
            agent = %error.assigned_agent,
            "Generating fix"
        );

        let request = build_request(&error, &config.model);
        let raw = match self.generator.generate(&request).await {
            Ok(raw) => raw,
            Err(e) => return self.skip(&error, e.to_string()),
        };
        let draft = match parse_fix_response(&raw) {
            Ok(draft) => draft,
            Err(e) => return self.skip(&error, e.to_string()),
        };

        let mut fix = FixSuggestion::from_draft(draft, &error, self.clock.now());

        if !fix.is_auto_applicable(config.require_approval) {
            tracing::info!(
                fix_id = %fix.id,
                risk = %fix.risk_level,
                "Fix awaiting approval: {}",
                fix.description
            );
            self.fixes.insert(fix.id, fix.clone());
            return ProcessOutcome::AwaitingApproval(fix);
        }

        let result = self.applier.apply(&fix).await;
        let now = self.clock.now();
        match result {
            Ok(()) => {
                fix.resolve(FixStatus::Applied, now);
                self.limiter.lock().record(now);
                Totals::bump(&self.totals.applied);
                tracing::info!(fix_id = %fix.id, "Auto-applied fix");
                self.fixes.insert(fix.id, fix.clone());
                ProcessOutcome::Applied(fix)
            }
            Err(e) => {
                fix.resolve(FixStatus::Failed, now);
                tracing::warn!(fix_id = %fix.id, error = %e, "Auto-apply failed");
                self.fixes.insert(fix.id, fix.clone());
                ProcessOutcome::ApplyFailed {
                    fix,
                    reason: e.to_string(),
                }
            }
        }
    }

    fn skip(&self, error: &CapturedError, reason: String) -> ProcessOutcome {
        Totals::bump(&self.totals.skipped);
        tracing::warn!(error_id = %error.id, %reason, "No fix produced");
        ProcessOutcome::Skipped {
            error_id: error.id,
            reason,
        }
    }

    /// Process until nothing more can be done right now
    pub async fn run_until_idle(&self) -> Vec<ProcessOutcome> {
        let mut outcomes = Vec::new();
        loop {
            let outcome = self.process_error_queue().await;
            let progressed = outcome.made_progress();
            outcomes.push(outcome);
            if !progressed {
                return outcomes;
            }
        }
    }

    /// Drain the queue on a fixed interval until the task is aborted
    pub fn spawn_processor(self: &Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let outcomes = service.run_until_idle().await;
                if outcomes.len() > 1 {
                    tracing::debug!(processed = outcomes.len() - 1, "Processor pass finished");
                }
            }
        })
    }

    // ------------------------------------------------------------------
    // Approval
    // ------------------------------------------------------------------

    /// Apply a pending fix
    ///
    /// # Errors
    /// - `FixNotFound` / `FixNotPending`
    /// - `Apply` if the applier fails; the fix is then marked failed
    pub async fn approve_fix(&self, id: Uuid) -> AutoHealResult<FixSuggestion> {
        let fix = self.claim_pending(id)?;

        let result = self.applier.apply(&fix).await;
        let now = self.clock.now();
        let status = if result.is_ok() {
            FixStatus::Applied
        } else {
            FixStatus::Failed
        };
        let updated = match self.fixes.get_mut(&id) {
            Some(mut entry) => {
                entry.resolve(status, now);
                entry.clone()
            }
            None => return Err(AutoHealError::FixNotFound(id)),
        };

        result?;
        Totals::bump(&self.totals.applied);
        tracing::info!(fix_id = %id, "Approved fix applied");
        Ok(updated)
    }

    /// Reject a pending fix
    ///
    /// # Errors
    /// `FixNotFound` / `FixNotPending`.
    pub fn reject_fix(&self, id: Uuid) -> AutoHealResult<FixSuggestion> {
        let mut entry = self
            .fixes
            .get_mut(&id)
            .ok_or(AutoHealError::FixNotFound(id))?;
        if entry.status != FixStatus::Pending {
            return Err(AutoHealError::FixNotPending {
                id,
                status: entry.status,
            });
        }
        entry.resolve(FixStatus::Rejected, self.clock.now());
        Totals::bump(&self.totals.rejected);
        tracing::info!(fix_id = %id, "Fix rejected");
        Ok(entry.clone())
    }

    /// Move a pending fix to `Applying` under the entry lock
    fn claim_pending(&self, id: Uuid) -> AutoHealResult<FixSuggestion> {
        let mut entry = self
            .fixes
            .get_mut(&id)
            .ok_or(AutoHealError::FixNotFound(id))?;
        if entry.status != FixStatus::Pending {
            return Err(AutoHealError::FixNotPending {
                id,
                status: entry.status,
            });
        }
        entry.status = FixStatus::Applying;
        Ok(entry.clone())
    }

    // ------------------------------------------------------------------
    // Queries and settings
    // ------------------------------------------------------------------

    /// Fixes waiting for approval, oldest first
    #[must_use]
    pub fn pending_fixes(&self) -> Vec<FixSuggestion> {
        let mut pending: Vec<_> = self
            .fixes
            .iter()
            .filter(|f| f.status == FixStatus::Pending)
            .map(|f| f.clone())
            .collect();
        pending.sort_by_key(|f| f.created_at);
        pending
    }

    /// Every fix produced so far, oldest first
    #[must_use]
    pub fn fixes(&self) -> Vec<FixSuggestion> {
        let mut all: Vec<_> = self.fixes.iter().map(|f| f.clone()).collect();
        all.sort_by_key(|f| f.created_at);
        all
    }

    /// Look up a fix
    #[must_use]
    pub fn fix(&self, id: Uuid) -> Option<FixSuggestion> {
        self.fixes.get(&id).map(|f| f.clone())
    }

    /// Snapshot of the queue in capture order
    #[must_use]
    pub fn queued_errors(&self) -> Vec<CapturedError> {
        self.queue.lock().iter().cloned().collect()
    }

    /// Number of queued errors
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Drop every queued error
    pub fn clear_queue(&self) {
        self.queue.lock().clear();
    }

    /// Whether a processing pass is running
    #[inline]
    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::Acquire)
    }

    /// Current settings
    #[must_use]
    pub fn config(&self) -> AutoHealConfig {
        self.config.read().clone()
    }

    /// Replace settings; the hourly cap takes effect immediately
    pub fn set_config(&self, config: AutoHealConfig) {
        self.limiter.lock().set_max(config.max_auto_fixes_per_hour);
        *self.config.write() = config;
    }

    /// Write current settings to `path`
    ///
    /// # Errors
    /// Filesystem failures.
    pub fn save_config(&self, path: impl AsRef<Path>) -> AutoHealResult<()> {
        self.config().save(path)?;
        Ok(())
    }

    /// Current counters
    #[must_use]
    pub fn stats(&self) -> AutoHealStats {
        let (applied_this_hour, max, resets_at) = {
            let mut limiter = self.limiter.lock();
            limiter.roll(self.clock.now());
            (limiter.applied(), limiter.max_per_hour(), limiter.resets_at())
        };
        AutoHealStats {
            queued_errors: self.queue_len(),
            pending_fixes: self
                .fixes
                .iter()
                .filter(|f| f.status == FixStatus::Pending)
                .count(),
            fixes_applied_this_hour: applied_this_hour,
            max_auto_fixes_per_hour: max,
            window_resets_at: resets_at,
            total_captured: self.totals.captured.load(Ordering::Relaxed),
            total_applied: self.totals.applied.load(Ordering::Relaxed),
            total_rejected: self.totals.rejected.load(Ordering::Relaxed),
            total_skipped: self.totals.skipped.load(Ordering::Relaxed),
        }
    }
}

impl fmt::Debug for AutoHealService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoHealService")
            .field("config", &*self.config.read())
            .field("queued", &self.queue.lock().len())
            .field("fixes", &self.fixes.len())
            .field("processing", &self.is_processing())
            .finish_non_exhaustive()
    }
}
