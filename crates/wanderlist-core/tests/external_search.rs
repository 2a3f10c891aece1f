// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz
//
// External place search against a canned geocoder.
// Covers: marker placement and replacement, local rejections, service
// failures, stale completions after refresh/dispose, completion ordering.

use std::cell::RefCell;
use std::collections::HashMap;

use wanderlist_core::scene::SceneGraph;
use wanderlist_core::search::{GeocodeMatch, Geocoder, SearchError};
use wanderlist_core::surface::{MarkerKind, MarkerStyles};
use wanderlist_core::{LatLon, MapThemeKind, Place, TripPlanner, FALLBACK_ZOOM, FOCUS_ZOOM};

/// Answers from a fixed table and remembers what it was asked.
#[derive(Default)]
struct CannedGeocoder {
    answers: HashMap<String, Result<Option<GeocodeMatch>, SearchError>>,
    asked: RefCell<Vec<String>>,
}

impl CannedGeocoder {
    fn with(mut self, query: &str, answer: Result<Option<GeocodeMatch>, SearchError>) -> Self {
        self.answers.insert(query.to_string(), answer);
        self
    }

    fn hit(self, query: &str, lat: f64, lon: f64, label: &str) -> Self {
        self.with(
            query,
            Ok(Some(GeocodeMatch {
                position: LatLon::new(lat, lon),
                display_name: label.to_string(),
            })),
        )
    }
}

impl Geocoder for CannedGeocoder {
    fn geocode(&self, query: &str) -> Result<Option<GeocodeMatch>, SearchError> {
        self.asked.borrow_mut().push(query.to_string());
        self.answers.get(query).cloned().unwrap_or(Ok(None))
    }
}

fn geocoder() -> CannedGeocoder {
    CannedGeocoder::default()
        .hit("Lalbagh", 12.95, 77.58, "Lalbagh Botanical Garden")
        .hit("Ulsoor Lake", 12.983, 77.619, "Ulsoor Lake, Bengaluru")
        .with(
            "Down",
            Err(SearchError::TransportFailure("HTTP 503".to_string())),
        )
}

fn planner() -> TripPlanner<SceneGraph> {
    let mut planner = TripPlanner::new(
        SceneGraph::new(),
        MapThemeKind::OpenStreetMap,
        MarkerStyles::default(),
    );
    planner.mount();
    planner
}

fn search_markers(planner: &TripPlanner<SceneGraph>) -> Vec<LatLon> {
    planner
        .surface()
        .backend()
        .markers()
        .into_iter()
        .filter(|(_, m)| m.kind == MarkerKind::SearchResult)
        .map(|(_, m)| m.position)
        .collect()
}

// =====================================================================
// Successful lookups
// =====================================================================

#[test]
fn test_lalbagh_places_one_marker_and_focuses() {
    let mut planner = planner();
    planner.set_search_query("Lalbagh".to_string());

    planner.search_with(&geocoder()).unwrap();

    assert_eq!(search_markers(&planner), vec![LatLon::new(12.95, 77.58)]);
    assert_eq!(
        planner.surface().backend().view(),
        Some((LatLon::new(12.95, 77.58), FOCUS_ZOOM))
    );
    assert_eq!(planner.search_query(), "");
    let result = planner.search_result().unwrap();
    assert_eq!(result.label, "Lalbagh Botanical Garden");
}

#[test]
fn test_query_is_trimmed_before_lookup() {
    let mut planner = planner();
    let geocoder = geocoder();
    planner.set_search_query("  Lalbagh \n".to_string());

    planner.search_with(&geocoder).unwrap();

    assert_eq!(*geocoder.asked.borrow(), vec!["Lalbagh".to_string()]);
}

#[test]
fn test_second_search_replaces_marker() {
    let mut planner = planner();
    let geocoder = geocoder();

    planner.set_search_query("Lalbagh".to_string());
    planner.search_with(&geocoder).unwrap();
    planner.set_search_query("Ulsoor Lake".to_string());
    planner.search_with(&geocoder).unwrap();

    assert_eq!(search_markers(&planner), vec![LatLon::new(12.983, 77.619)]);
}

#[test]
fn test_search_marker_survives_place_edits() {
    let mut planner = planner();
    planner.set_search_query("Lalbagh".to_string());
    planner.search_with(&geocoder()).unwrap();

    planner.add_place(Place::new("MG Road", 12.9758, 77.6045, "").unwrap());

    assert_eq!(search_markers(&planner).len(), 1);
    assert_eq!(planner.surface().backend().markers().len(), 2);
}

// =====================================================================
// Rejections and failures
// =====================================================================

#[test]
fn test_blank_query_is_rejected_locally() {
    let mut planner = planner();
    let geocoder = geocoder();
    planner.set_search_query("   ".to_string());

    assert_eq!(planner.search_with(&geocoder), Err(SearchError::EmptyQuery));
    assert!(geocoder.asked.borrow().is_empty());
    assert!(planner.notice().is_some());
}

#[test]
fn test_search_before_mount_is_map_not_ready() {
    let mut planner = TripPlanner::new(
        SceneGraph::new(),
        MapThemeKind::OpenStreetMap,
        MarkerStyles::default(),
    );
    planner.set_search_query("Lalbagh".to_string());

    assert_eq!(planner.search_with(&geocoder()), Err(SearchError::MapNotReady));
    assert!(planner.begin_search().is_none());
}

#[test]
fn test_no_results_keeps_previous_marker() {
    let mut planner = planner();
    let geocoder = geocoder();
    planner.set_search_query("Lalbagh".to_string());
    planner.search_with(&geocoder).unwrap();

    planner.set_search_query("Atlantis".to_string());
    assert_eq!(planner.search_with(&geocoder), Err(SearchError::NoResults));

    assert_eq!(search_markers(&planner), vec![LatLon::new(12.95, 77.58)]);
    assert_eq!(planner.search_query(), "Atlantis");
    assert_eq!(planner.notice(), Some("No results found."));
}

#[test]
fn test_transport_failure_is_reported() {
    let mut planner = planner();
    planner.set_search_query("Down".to_string());

    let err = planner.search_with(&geocoder()).unwrap_err();

    assert_eq!(err, SearchError::TransportFailure("HTTP 503".to_string()));
    assert!(planner.notice().unwrap().contains("HTTP 503"));
    assert!(search_markers(&planner).is_empty());
}

#[test]
fn test_successful_search_clears_old_notice() {
    let mut planner = planner();
    let geocoder = geocoder();
    planner.set_search_query("Down".to_string());
    let _ = planner.search_with(&geocoder);

    planner.set_search_query("Lalbagh".to_string());
    planner.search_with(&geocoder).unwrap();

    assert!(planner.notice().is_none());
}

// =====================================================================
// Async completions
// =====================================================================

#[test]
fn test_result_after_refresh_is_discarded() {
    let mut planner = planner();
    planner.set_search_query("Lalbagh".to_string());
    let request = planner.begin_search().unwrap();

    planner.refresh();
    planner.finish_search(request.run(&geocoder())).unwrap();

    assert!(search_markers(&planner).is_empty());
    assert!(planner.search_result().is_none());
    assert_eq!(planner.surface().view().map(|(_, z)| z), Some(FALLBACK_ZOOM));
}

#[test]
fn test_result_after_dispose_is_discarded() {
    let mut planner = planner();
    planner.set_search_query("Down".to_string());
    let request = planner.begin_search().unwrap();

    planner.dispose();
    planner.finish_search(request.run(&geocoder())).unwrap();

    assert!(planner.notice().is_none());
    assert!(planner.surface().backend().map().is_none());
}

#[test]
fn test_last_completed_search_wins() {
    let mut planner = planner();
    let geocoder = geocoder();

    planner.set_search_query("Lalbagh".to_string());
    let first = planner.begin_search().unwrap();
    planner.set_search_query("Ulsoor Lake".to_string());
    let second = planner.begin_search().unwrap();

    let second = second.run(&geocoder);
    let first = first.run(&geocoder);
    planner.finish_search(second).unwrap();
    planner.finish_search(first).unwrap();

    assert_eq!(search_markers(&planner), vec![LatLon::new(12.95, 77.58)]);
    assert_eq!(
        planner.search_result().unwrap().label,
        "Lalbagh Botanical Garden"
    );
}
