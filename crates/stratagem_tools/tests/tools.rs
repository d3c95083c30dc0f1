//! Tool tests against files on disk.

use std::io::Write;
use std::sync::Arc;

use stratagem_test_utils::fixtures::{CONTENT, SCENARIO};
use stratagem_tools::{requirements, simulate, validate, ToolError};
use tempfile::NamedTempFile;

fn write_temp(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

#[test]
fn test_validate_clean_content() {
    let file = write_temp(CONTENT);
    let report = validate::validate_content(file.path()).unwrap();

    assert!(report.is_clean());
    assert_eq!(report.unit_types, 6);
    assert_eq!(report.upgrades, 1);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["unit_types"], 6);
    assert!(json["errors"].as_array().unwrap().is_empty());
}

#[test]
fn test_validate_reports_content_errors() {
    let file = write_temp(
        r#"ContentData(
            unit_types: [
                (ident: "scout", name: "Scout", hit_points: 20,
                 dependency: (tag: "unit_type", unit_type: "tower")),
                (ident: "scout", name: "Scout Again", hit_points: 20),
            ],
        )"#,
    );
    let report = validate::validate_content(file.path()).unwrap();

    assert_eq!(report.unit_types, 1);
    assert_eq!(report.errors.len(), 2);
    assert!(report.errors.iter().any(|e| e.contains("tower")));
    assert!(report.errors.iter().any(|e| e.contains("duplicate")));

    assert!(matches!(
        validate::load_clean_content(file.path()),
        Err(ToolError::InvalidContent { count: 2, .. })
    ));
}

#[test]
fn test_validate_io_and_parse_errors() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.ron");
    assert!(matches!(
        validate::validate_content(&missing),
        Err(ToolError::Io { .. })
    ));

    let file = write_temp("ContentData(unit_types: [(ident: 3)])");
    assert!(matches!(
        validate::validate_content(file.path()),
        Err(ToolError::Parse { .. })
    ));
}

#[test]
fn test_render_requirements() {
    let file = write_temp(CONTENT);
    let catalog = validate::load_clean_content(file.path()).unwrap();
    let text = requirements::render_requirements(&catalog);

    assert!(text.contains("[knight]\nRequirements:\n\tOR:\n\t\tBarracks\n\t\tMasonry\n"));
    assert!(text.contains("[masonry]\nRequirements:\n\tBronze Age\n\tBarracks\n"));
    assert!(!text.contains("[wagon]"));
}

#[test]
fn test_simulate_scenario() {
    let content = write_temp(CONTENT);
    let scenario_file = write_temp(SCENARIO);
    let catalog = Arc::new(validate::load_clean_content(content.path()).unwrap());
    let scenario = simulate::load_scenario(scenario_file.path()).unwrap();

    let report = simulate::run_scenario(Arc::clone(&catalog), &scenario, 200).unwrap();
    assert_eq!(report.scenario, "repair drill");
    assert_eq!(report.ticks, 200);

    let wagon = report.units.iter().find(|u| u.id == 1).unwrap();
    assert_eq!(wagon.hit_points, 100);
    assert_eq!(wagon.orders, vec![r#"{"action-still"}"#.to_string()]);

    let barracks = report.units.iter().find(|u| u.id == 3).unwrap();
    assert!(barracks.constructed);
    assert!(report
        .notifications
        .iter()
        .any(|n| n == "Red: New Barracks done"));

    let again = simulate::run_scenario(catalog, &scenario, 200).unwrap();
    assert_eq!(again.state_hash, report.state_hash);
}
