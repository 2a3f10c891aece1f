// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::geolocation::{GeolocationOutcome, GeolocationRequest};
use crate::route::{RouteController, RouteSelection, RouteState, RouteSummary};
use crate::search::{
    ExternalSearchController, ExternalSearchResult, Geocoder, SearchError, SearchOutcome,
    SearchRequest,
};
use crate::surface::{Liveness, MapBackend, MapSurface, MarkerStyles};
use crate::theme::MapThemeKind;
use crate::validator::{self, FormValidationError, ImportError};
use crate::{LatLon, Place, PlaceStore};

/// Text fields of the "Add New Place" form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceForm {
    pub name: String,
    pub latitude: String,
    pub longitude: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportPanel {
    pub visible: bool,
    pub text: String,
}

/// The whole trip-planning component: places, forms, map and overlays.
///
/// Every method that changes state finishes with [`reconcile`](Self::reconcile),
/// so the map always matches the store when control returns to the caller.
pub struct TripPlanner<B: MapBackend> {
    store: PlaceStore,
    form: PlaceForm,
    import: ImportPanel,
    theme: MapThemeKind,
    surface: MapSurface<B>,
    routes: RouteController,
    search: ExternalSearchController,
    error: Option<String>,
    notice: Option<String>,
}

impl<B: MapBackend> TripPlanner<B> {
    pub fn new(backend: B, theme: MapThemeKind, styles: MarkerStyles) -> Self {
        Self {
            store: PlaceStore::new(),
            form: PlaceForm::default(),
            import: ImportPanel::default(),
            theme,
            surface: MapSurface::new(backend, styles),
            routes: RouteController::new(),
            search: ExternalSearchController::new(),
            error: None,
            notice: None,
        }
    }

    /// Creates the map and draws whatever state already exists.
    pub fn mount(&mut self) -> Liveness {
        let ticket = self.surface.initialize(self.theme);
        self.reconcile();
        ticket
    }

    pub fn reconcile(&mut self) {
        self.surface.set_theme(self.theme);
        self.surface.sync_markers(&self.store);
        self.routes.reconcile(&mut self.surface, &self.store);
    }

    // --- Read access ---

    pub fn places(&self) -> &PlaceStore {
        &self.store
    }

    pub fn form(&self) -> &PlaceForm {
        &self.form
    }

    pub fn import_panel(&self) -> &ImportPanel {
        &self.import
    }

    pub fn theme(&self) -> MapThemeKind {
        self.theme
    }

    pub fn surface(&self) -> &MapSurface<B> {
        &self.surface
    }

    pub fn route_selection(&self) -> &RouteSelection {
        self.routes.selection()
    }

    pub fn route_state(&self) -> RouteState {
        self.routes.state()
    }

    pub fn route_summary(&self) -> Option<&RouteSummary> {
        self.routes.summary()
    }

    pub fn search_query(&self) -> &str {
        self.search.query()
    }

    pub fn search_result(&self) -> Option<&ExternalSearchResult> {
        self.search.result()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    // --- Add place form ---

    pub fn set_name(&mut self, value: String) {
        self.form.name = value;
    }

    pub fn set_latitude(&mut self, value: String) {
        self.form.latitude = value;
    }

    pub fn set_longitude(&mut self, value: String) {
        self.form.longitude = value;
    }

    pub fn set_description(&mut self, value: String) {
        self.form.description = value;
    }

    pub fn add_destination(&mut self) -> Result<(), FormValidationError> {
        self.error = None;
        let result = validator::validate_place(
            &self.form.name,
            &self.form.latitude,
            &self.form.longitude,
            &self.form.description,
        );

        match result {
            Ok(place) => {
                self.add_place(place);
                self.form = PlaceForm::default();
                Ok(())
            }
            Err(e) => {
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Appends an already validated place.
    pub fn add_place(&mut self, place: Place) {
        self.store.add(place);
        self.reconcile();
    }

    // --- Import / export ---

    /// Shows or hides the import panel; either way the text and error reset.
    pub fn toggle_import_form(&mut self) {
        self.import.visible = !self.import.visible;
        self.import.text.clear();
        self.error = None;
    }

    pub fn set_import_text(&mut self, text: String) {
        self.import.text = text;
    }

    /// Replaces every saved place with the valid records of the payload.
    pub fn import(&mut self) -> Result<usize, ImportError> {
        match validator::validate_import_payload(&self.import.text) {
            Ok(places) => {
                let count = places.len();
                self.store.replace_all(places);
                self.import = ImportPanel::default();
                self.error = None;
                self.reconcile();
                Ok(count)
            }
            Err(e) => {
                log::warn!("Import rejected: reason={}", e);
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn export(&self) -> Result<String, serde_json::Error> {
        validator::export_places(self.store.as_slice())
    }

    // --- Theme ---

    pub fn select_theme(&mut self, theme: MapThemeKind) {
        self.theme = theme;
        self.reconcile();
    }

    // --- Routing ---

    pub fn select_route_start(&mut self, name: Option<String>) {
        self.routes.select_start(name);
        self.reconcile();
    }

    pub fn select_route_end(&mut self, name: Option<String>) {
        self.routes.select_end(name);
        self.reconcile();
    }

    pub fn calculate_route(&mut self) -> RouteState {
        self.routes.calculate();
        self.reconcile();
        self.routes.state()
    }

    // --- External search ---

    pub fn set_search_query(&mut self, query: String) {
        self.search.set_query(query);
    }

    /// Local checks before a lookup. Failures are surfaced as a notice.
    pub fn begin_search(&mut self) -> Option<SearchRequest> {
        match self.search.begin(&self.surface) {
            Ok(request) => {
                self.notice = None;
                Some(request)
            }
            Err(e) => {
                self.notice = Some(e.to_string());
                None
            }
        }
    }

    pub fn finish_search(&mut self, outcome: SearchOutcome) -> Result<(), SearchError> {
        let result = self.search.complete(&mut self.surface, outcome);
        if let Err(e) = &result {
            self.notice = Some(e.to_string());
        }
        result
    }

    /// Synchronous search, for callers that can block.
    pub fn search_with(&mut self, geocoder: &dyn Geocoder) -> Result<(), SearchError> {
        let result = self.search.search(&mut self.surface, geocoder);
        self.notice = result.as_ref().err().map(|e| e.to_string());
        result
    }

    // --- Geolocation ---

    pub fn begin_geolocation(&self) -> Option<GeolocationRequest> {
        self.surface.begin_geolocation()
    }

    pub fn finish_geolocation(&mut self, outcome: GeolocationOutcome) {
        if let Err(e) = self.surface.apply_geolocation(outcome) {
            self.notice = Some(e.to_string());
        }
    }

    // --- View ---

    pub fn set_view(&mut self, center: LatLon, zoom: f64) {
        self.surface.set_view(center, zoom);
    }

    /// Soft reset: markers, route, search marker and view. Places stay.
    pub fn refresh(&mut self) {
        self.surface.refresh();
        self.routes.reset(&mut self.surface);
        self.search.clear(&mut self.surface);
        self.reconcile();
        log::info!("Planner refreshed: places={}", self.store.len());
    }

    pub fn dispose(&mut self) {
        self.search.clear(&mut self.surface);
        self.surface.dispose();
        self.reconcile();
    }
}
