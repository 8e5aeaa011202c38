//! Datacendia Auto-Heal
//!
//! Runtime error capture with LLM-drafted fixes:
//! - Capture from panics, error-level tracing events and explicit calls
//! - Keyword severity policy and specialist agent routing
//! - One-at-a-time processing with an hourly auto-apply cap
//! - Strict parsing of model output into typed fix suggestions
//! - Approval workflow for anything not safe to auto-apply
//!
//! # Example
//!
//! ```rust,ignore
//! use dc_autoheal::{AutoHealConfig, AutoHealService, CaptureLayer, HttpFixGenerator};
//! use std::sync::Arc;
//!
//! let generator = Arc::new(HttpFixGenerator::new(api));
//! let service = Arc::new(AutoHealService::new(AutoHealConfig::default(), generator));
//! dc_autoheal::install_panic_hook(Arc::clone(&service));
//! dc_core::init_tracing_with(&options, Some(Box::new(CaptureLayer::new(Arc::clone(&service)))))?;
//! let processor = service.spawn_processor(std::time::Duration::from_secs(10));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod agent;
pub mod applier;
pub mod capture;
pub mod clock;
pub mod config;
pub mod error;
pub mod fix;
pub mod generator;
pub mod hooks;
pub mod rate_limit;
pub mod service;
pub mod severity;

// Re-exports for convenience
pub use agent::{assign_agent, FixAgent};
pub use applier::{ApplyError, FixApplier, LogApplier};
pub use capture::{should_capture_console, CapturedError, ErrorId, ErrorReport, ErrorSource, SourceLocation};
pub use clock::{Clock, SystemClock};
pub use config::{AutoHealConfig, ConfigError};
pub use error::{AutoHealError, AutoHealResult};
pub use fix::{parse_fix_response, FixDraft, FixParseError, FixStatus, FixSuggestion, RiskLevel};
pub use generator::{build_request, FixGenerator, FixRequest, GenerateError, HttpFixGenerator};
pub use hooks::{install_panic_hook, CaptureLayer};
pub use rate_limit::HourlyRateLimiter;
pub use service::{AutoHealService, AutoHealStats, ProcessOutcome};
pub use severity::{classify, Severity};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
