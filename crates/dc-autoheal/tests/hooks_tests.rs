//! Panic hook and tracing layer capture

use dc_autoheal::{AutoHealConfig, AutoHealService, CaptureLayer, ErrorSource, Severity};
use dc_test_utils::ScriptedFixGenerator;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;

fn service() -> Arc<AutoHealService> {
    Arc::new(AutoHealService::new(
        AutoHealConfig::default(),
        Arc::new(ScriptedFixGenerator::new()),
    ))
}

#[test]
fn panic_hook_captures_and_chains() {
    let service = service();
    dc_autoheal::install_panic_hook(Arc::clone(&service));

    let result = std::thread::Builder::new()
        .name("ledger-writer".into())
        .spawn(|| panic!("fatal: ledger index corrupted"))
        .unwrap()
        .join();
    assert!(result.is_err());

    let queued = service.queued_errors();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].source, ErrorSource::Panic);
    assert_eq!(queued[0].severity, Severity::Critical);
    assert_eq!(queued[0].message, "fatal: ledger index corrupted");
    assert_eq!(queued[0].component.as_deref(), Some("ledger-writer"));
    assert!(queued[0].location.as_ref().unwrap().file.ends_with("hooks_tests.rs"));
}

#[test]
fn error_events_are_captured() {
    let service = service();
    let subscriber = tracing_subscriber::registry().with(CaptureLayer::new(Arc::clone(&service)));

    tracing::subscriber::with_default(subscriber, || {
        tracing::error!(route = "/fleet", "TypeError: markers is not a function");
        tracing::error!("Rendered map without tiles");
        tracing::warn!("TypeError: only a warning");
        tracing::error!(target: "dc_autoheal::service", "TypeError: internal");
    });

    let queued = service.queued_errors();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].source, ErrorSource::ConsoleError);
    assert_eq!(
        queued[0].message,
        "TypeError: markers is not a function route=/fleet"
    );
    assert_eq!(queued[0].severity, Severity::High);
}
