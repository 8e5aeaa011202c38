//! Datacendia Demo Mode
//!
//! Guided product demos as a linear step machine:
//! - [`DemoSequencer`]: pure state machine with generation-checked timers
//! - [`DemoPlayer`]: tokio task that arms timers and publishes snapshots
//! - [`DemoCatalog`]: built-in demos plus YAML/JSON definitions
//! - [`CompletionStore`]: `demo-completed:<id>` flags in memory or on disk
//!
//! # Example
//!
//! ```rust,ignore
//! use dc_demo::{DemoCatalog, DemoPlayer, MemoryCompletionStore};
//! use std::sync::Arc;
//!
//! let player = DemoPlayer::new(
//!     Arc::new(DemoCatalog::builtin()),
//!     Arc::new(MemoryCompletionStore::new()),
//! );
//! player.start_demo("executive-overview")?;
//! player.play();
//! let mut updates = player.subscribe();
//! while updates.changed().await.is_ok() {
//!     println!("{:?}", updates.borrow().current_step);
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod catalog;
pub mod completion;
pub mod error;
pub mod model;
pub mod player;
pub mod sequencer;

// Re-exports for convenience
pub use catalog::{builtin, parse_json, parse_yaml, DemoCatalog, DemoFile};
pub use completion::{
    completion_key, CompletionStore, FileCompletionStore, MemoryCompletionStore,
    COMPLETION_KEY_PREFIX,
};
pub use error::DemoError;
pub use model::{Demo, DemoStep, MAX_STEP_SECS};
pub use player::{DemoPlayer, PlayerOptions};
pub use sequencer::{DemoSequencer, DemoSnapshot, DemoState, PendingTimer, TimerOutcome};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
