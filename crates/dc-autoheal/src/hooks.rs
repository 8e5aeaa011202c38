//! Process-wide capture hooks
//!
//! - [`install_panic_hook`]: panics become [`ErrorSource::Panic`] captures;
//!   the previously installed hook still runs afterwards
//! - [`CaptureLayer`]: `ERROR`-level tracing events become
//!   [`ErrorSource::ConsoleError`] captures, subject to the console filter
//!
//! Both capture with [`AutoHealService::try_capture`] so a hook firing while
//! the service holds a lock drops the error instead of deadlocking.

use crate::capture::{ErrorReport, ErrorSource};
use crate::service::AutoHealService;
use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt::{self, Write as _};
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// Events from this crate are never captured
const OWN_TARGET: &str = "dc_autoheal";

/// Chain a panic hook that captures into `service`
pub fn install_panic_hook(service: Arc<AutoHealService>) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let mut report = ErrorReport::new(payload_message(info.payload()));
        if let Some(location) = info.location() {
            report = report.with_location(location.file(), location.line(), location.column());
        }
        if let Some(name) = std::thread::current().name() {
            report = report.with_component(name);
        }
        let backtrace = Backtrace::capture();
        if backtrace.status() == BacktraceStatus::Captured {
            report = report.with_stack(backtrace.to_string());
        }
        service.try_capture(ErrorSource::Panic, report);
        previous(info);
    }));
}

/// Text of a panic payload
#[must_use]
pub fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

/// Tracing layer feeding `ERROR` events into the capture queue
#[derive(Debug, Clone)]
pub struct CaptureLayer {
    service: Arc<AutoHealService>,
}

impl CaptureLayer {
    /// Create layer
    #[must_use]
    pub fn new(service: Arc<AutoHealService>) -> Self {
        Self { service }
    }
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if *meta.level() != Level::ERROR || meta.target().starts_with(OWN_TARGET) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let message = visitor.finish();
        if message.is_empty() {
            return;
        }

        let mut report = ErrorReport::new(message).with_component(meta.target());
        if let (Some(file), Some(line)) = (meta.file(), meta.line()) {
            report = report.with_location(file, line, 0);
        }
        self.service.try_capture(ErrorSource::ConsoleError, report);
    }
}

/// Flattens an event into `message key=value ...`
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        match (self.message.is_empty(), self.fields.is_empty()) {
            (_, true) => self.message,
            (true, false) => self.fields,
            (false, false) => format!("{} {}", self.message, self.fields),
        }
    }

    fn push_field(&mut self, name: &str, value: fmt::Arguments<'_>) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{name}={value}");
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.push_field(field.name(), format_args!("{value}"));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.push_field(field.name(), format_args!("{value:?}"));
        }
    }
}
