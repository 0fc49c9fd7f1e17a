//! End-to-end scenario scripts, as run by `navscope run`

use navscope::NavConfig;
use navscope::cli::scenario::{Scenario, ScenarioRunner};
use std::fs;
use tempfile::TempDir;

const SCRIPT: &str = r#"
[[steps]]
action = "push"
id = "home"
container = 2

[[steps]]
action = "push_into"
parent = "home"
id = "detail"
title = "Order 42"

[[steps]]
action = "save"

[[steps]]
action = "restore"

[[steps]]
action = "dump"

[[steps]]
action = "wait"
id = "spinner"
message = "Saving"

[[steps]]
action = "back"

[[steps]]
action = "close"
id = "spinner"

[[steps]]
action = "back"

[[steps]]
action = "dump"
"#;

/// Test a full script loaded from disk
#[test]
fn test_script_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.toml");
    fs::write(&path, SCRIPT).unwrap();

    let scenario = Scenario::load(&path).unwrap();
    let mut runner = ScenarioRunner::new(NavConfig::default());
    let reports = runner.run_all(&scenario).unwrap();

    assert_eq!(reports.len(), 10);
    assert!(reports.iter().all(|r| r.ok));
    assert_eq!(reports[3].lines, vec!["restored 2 screen(s)"]);
    assert_eq!(
        reports[4].lines,
        vec!["container #1", "  home (Page)", "    container #2", "      detail (Page)"]
    );
    // The spinner swallowed the first back, the second one closed `detail`
    assert_eq!(reports[9].lines, vec!["container #1", "  home (Page)"]);
}

/// Test that steps after finish are refused but do not abort the run
#[test]
fn test_steps_after_finish_are_refused() {
    let scenario = Scenario::from_toml(
        r#"
        [[steps]]
        action = "finish"

        [[steps]]
        action = "push"
        id = "late"

        [[steps]]
        action = "back"
        "#,
    )
    .unwrap();

    let mut runner = ScenarioRunner::new(NavConfig::default());
    let reports = runner.run_all(&scenario).unwrap();

    assert!(reports[0].ok);
    assert!(!reports[1].ok);
    assert!(!reports[2].ok);
    assert!(runner.host().is_finished());
}

/// Test that a missing scenario file is reported with its path
#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = Scenario::load(&dir.path().join("nope.toml")).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to read scenario file"));
}
