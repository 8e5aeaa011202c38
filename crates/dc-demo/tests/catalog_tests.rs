//! Loading demo definitions from disk

use dc_demo::{DemoCatalog, DemoError, DemoSequencer};
use std::sync::Arc;

const YAML: &str = r"
demos:
  - id: fleet-ops
    name: Fleet Operations
    category: logistics
    steps:
      - id: map
        title: Live map
        duration: 5
        route: /fleet/map
      - id: alerts
        title: Alerts
        duration: 4
        waitForClick: true
";

const JSON: &str = r#"{
  "demos": [
    {"id": "claims", "name": "Claims", "steps": [{"id": "inbox", "title": "Inbox", "duration": 3}]}
  ]
}"#;

#[test]
fn loads_yaml_and_json_files() {
    let dir = tempfile::tempdir().unwrap();
    let yaml = dir.path().join("fleet.yaml");
    let json = dir.path().join("claims.json");
    std::fs::write(&yaml, YAML).unwrap();
    std::fs::write(&json, JSON).unwrap();

    let mut catalog = DemoCatalog::builtin();
    assert_eq!(catalog.load_file(&yaml).unwrap(), 1);
    assert_eq!(catalog.load_file(&json).unwrap(), 1);
    assert_eq!(catalog.len(), 5);

    let fleet = catalog.get("fleet-ops").unwrap();
    assert_eq!(fleet.category, "logistics");
    assert_eq!(fleet.steps[0].route.as_deref(), Some("/fleet/map"));

    let mut sequencer = DemoSequencer::new(Arc::new(catalog));
    sequencer.start_demo("claims").unwrap();
    assert_eq!(sequencer.current_step().unwrap().id, "inbox");
}

#[test]
fn invalid_definitions_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.yml");
    std::fs::write(
        &path,
        "demos:\n  - id: broken\n    name: Broken\n    steps:\n      - id: a\n        title: A\n        duration: -1\n",
    )
    .unwrap();

    let mut catalog = DemoCatalog::new();
    assert!(matches!(
        catalog.load_file(&path),
        Err(DemoError::InvalidDemo { ref id, .. }) if id == "broken"
    ));
    assert!(catalog.is_empty());
}

#[test]
fn partly_bad_file_loads_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mixed.yaml");
    std::fs::write(
        &path,
        "demos:
  - id: first
    name: First
    steps:
      - id: a
        title: A
        duration: 2
  - id: second
    name: Second
    steps:
      - id: a
        title: A
        duration: 3
  - id: runaway
    name: Runaway
    steps:
      - id: a
        title: A
        duration: 1.0e20
",
    )
    .unwrap();

    let mut catalog = DemoCatalog::builtin();
    let before = catalog.len();
    assert!(matches!(
        catalog.load_file(&path),
        Err(DemoError::InvalidDemo { ref id, .. }) if id == "runaway"
    ));
    assert_eq!(catalog.len(), before);
    assert!(catalog.get("first").is_none());
}

#[test]
fn unsupported_extension_and_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let txt = dir.path().join("demos.txt");
    std::fs::write(&txt, JSON).unwrap();

    let mut catalog = DemoCatalog::new();
    assert!(matches!(
        catalog.load_file(&txt),
        Err(DemoError::UnsupportedFormat(_))
    ));
    assert!(matches!(
        catalog.load_file(dir.path().join("absent.yaml")),
        Err(DemoError::Io { .. })
    ));
}
