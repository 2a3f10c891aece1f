// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz
//
// Bulk import and the add-place form, driven through the planner.
// Covers: lenient per-record filtering, top-level shape errors leaving the
// store untouched, panel/error housekeeping, export re-import.

use wanderlist_core::scene::SceneGraph;
use wanderlist_core::surface::MarkerStyles;
use wanderlist_core::validator::ImportError;
use wanderlist_core::{MapThemeKind, Place, TripPlanner};

fn planner() -> TripPlanner<SceneGraph> {
    // Dropped records are only reported through the log; surface them in test output.
    let _ = simplelog::TestLogger::init(log::LevelFilter::Debug, simplelog::Config::default());
    let mut planner = TripPlanner::new(
        SceneGraph::new(),
        MapThemeKind::OpenStreetMap,
        MarkerStyles::default(),
    );
    planner.mount();
    planner
}

fn seed(planner: &mut TripPlanner<SceneGraph>) {
    planner.add_place(Place::new("Cubbon Park", 12.9763, 77.5929, "Green lung").unwrap());
}

// =====================================================================
// Lenient record filtering
// =====================================================================

#[test]
fn test_valid_and_invalid_record_yields_one_place_and_no_error() {
    let mut planner = planner();
    planner.toggle_import_form();
    planner.set_import_text(
        r#"[
            {"name":"MG Road","latitude":12.9758,"longitude":77.6045,"description":"Shopping street"},
            {"name":"Nowhere","latitude":123.0,"longitude":77.0,"description":"bad latitude"}
        ]"#
        .to_string(),
    );

    let count = planner.import().unwrap();

    assert_eq!(count, 1);
    assert_eq!(planner.places().len(), 1);
    assert_eq!(planner.places().as_slice()[0].name(), "MG Road");
    assert!(planner.error().is_none());
}

#[test]
fn test_all_invalid_records_give_empty_store() {
    let mut planner = planner();
    seed(&mut planner);
    planner.set_import_text(
        r#"[{"name":"","latitude":1,"longitude":1,"description":""}, 42, "text"]"#.to_string(),
    );

    assert_eq!(planner.import().unwrap(), 0);
    assert!(planner.places().is_empty());
    assert!(planner.surface().marker_positions().is_empty());
}

// =====================================================================
// Top-level shape errors
// =====================================================================

#[test]
fn test_object_payload_is_not_an_array_and_store_unchanged() {
    let mut planner = planner();
    seed(&mut planner);
    let revision = planner.places().revision();

    planner.set_import_text(
        r#"{"name":"MG Road","latitude":12.9758,"longitude":77.6045,"description":""}"#
            .to_string(),
    );
    let err = planner.import().unwrap_err();

    assert!(matches!(err, ImportError::NotAnArray));
    assert_eq!(planner.places().len(), 1);
    assert_eq!(planner.places().revision(), revision);
    assert!(planner.error().unwrap().contains("expected an array"));
}

#[test]
fn test_broken_text_is_malformed_and_store_unchanged() {
    let mut planner = planner();
    seed(&mut planner);

    planner.set_import_text(r#"[{"name": "MG Road", "latitude": 12.97,"#.to_string());
    let err = planner.import().unwrap_err();

    assert!(matches!(err, ImportError::Malformed(_)));
    assert_eq!(planner.places().names(), vec!["Cubbon Park"]);
    assert!(planner.error().is_some());
    // The text stays so the user can fix it.
    assert!(!planner.import_panel().text.is_empty());
}

// =====================================================================
// Panel housekeeping
// =====================================================================

#[test]
fn test_successful_import_closes_panel_and_clears_error() {
    let mut planner = planner();
    planner.toggle_import_form();
    planner.set_import_text("{}".to_string());
    assert!(planner.import().is_err());
    assert!(planner.error().is_some());

    planner.set_import_text(
        r#"[{"name":"Lalbagh","latitude":12.9507,"longitude":77.5848,"description":""}]"#
            .to_string(),
    );
    planner.import().unwrap();

    assert!(!planner.import_panel().visible);
    assert!(planner.import_panel().text.is_empty());
    assert!(planner.error().is_none());
}

#[test]
fn test_toggle_resets_text_and_error() {
    let mut planner = planner();
    planner.toggle_import_form();
    planner.set_import_text("not json".to_string());
    let _ = planner.import();

    planner.toggle_import_form();

    assert!(!planner.import_panel().visible);
    assert!(planner.import_panel().text.is_empty());
    assert!(planner.error().is_none());
}

#[test]
fn test_export_then_import_reproduces_places() {
    let mut planner = planner();
    planner.add_place(Place::new("MG Road", 12.9758, 77.6045, "Shopping street").unwrap());
    planner.add_place(Place::new("Lalbagh", 12.9507, 77.5848, "").unwrap());
    let exported = planner.export().unwrap();
    let before: Vec<Place> = planner.places().iter().cloned().collect();

    planner.set_import_text(exported);
    planner.import().unwrap();

    let after: Vec<Place> = planner.places().iter().cloned().collect();
    assert_eq!(before, after);
}

// =====================================================================
// Add-place form
// =====================================================================

#[test]
fn test_add_destination_clears_form() {
    let mut planner = planner();
    planner.set_name("MG Road".to_string());
    planner.set_latitude("12.9758".to_string());
    planner.set_longitude("77.6045".to_string());
    planner.set_description("Shopping street".to_string());

    planner.add_destination().unwrap();

    assert_eq!(planner.places().len(), 1);
    assert_eq!(planner.form(), &Default::default());
}

#[test]
fn test_invalid_form_keeps_input_and_sets_error() {
    let mut planner = planner();
    planner.set_name("MG Road".to_string());
    planner.set_latitude("north".to_string());
    planner.set_longitude("77.6".to_string());

    let err = planner.add_destination().unwrap_err();

    assert_eq!(err.issues.len(), 1);
    assert!(planner.places().is_empty());
    assert_eq!(planner.form().latitude, "north");
    assert!(planner.error().is_some());
}
