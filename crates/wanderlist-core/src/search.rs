// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::surface::{LayerHandle, Liveness, MapBackend, MapSurface, MarkerKind, MarkerSpec};
use crate::{LatLon, FOCUS_ZOOM};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("Please enter a place to search for.")]
    EmptyQuery,
    #[error("The map is not ready yet.")]
    MapNotReady,
    #[error("No results found.")]
    NoResults,
    #[error("Search failed: {0}")]
    TransportFailure(String),
}

/// Best match returned by a geocoding service.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeMatch {
    pub position: LatLon,
    pub display_name: String,
}

/// Free-text place lookup. `Ok(None)` means the service found nothing.
pub trait Geocoder {
    fn geocode(&self, query: &str) -> Result<Option<GeocodeMatch>, SearchError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExternalSearchResult {
    pub position: LatLon,
    pub label: String,
}

/// A search that passed the local checks and may now hit the network.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    ticket: Liveness,
}

impl SearchRequest {
    pub fn run(self, geocoder: &dyn Geocoder) -> SearchOutcome {
        log::debug!("Geocoding: query={}", self.query);
        let result = geocoder.geocode(&self.query);
        SearchOutcome {
            query: self.query,
            ticket: self.ticket,
            result,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub query: String,
    ticket: Liveness,
    pub result: Result<Option<GeocodeMatch>, SearchError>,
}

/// Owns the single "search result" marker.
#[derive(Debug, Default)]
pub struct ExternalSearchController {
    query: String,
    result: Option<ExternalSearchResult>,
    marker: Option<LayerHandle>,
}

impl ExternalSearchController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: String) {
        self.query = query;
    }

    pub fn result(&self) -> Option<&ExternalSearchResult> {
        self.result.as_ref()
    }

    pub fn begin<B: MapBackend>(&self, surface: &MapSurface<B>) -> Result<SearchRequest, SearchError> {
        let query = self.query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        let ticket = surface.liveness().ok_or(SearchError::MapNotReady)?;
        Ok(SearchRequest {
            query: query.to_string(),
            ticket,
        })
    }

    /// Applies a finished lookup. Results for a map that was reset or
    /// disposed since the request went out are discarded.
    pub fn complete<B: MapBackend>(
        &mut self,
        surface: &mut MapSurface<B>,
        outcome: SearchOutcome,
    ) -> Result<(), SearchError> {
        if !surface.is_current(&outcome.ticket) {
            log::debug!("Discarding stale search result: query={}", outcome.query);
            return Ok(());
        }

        let found = match outcome.result {
            Ok(Some(found)) => found,
            Ok(None) => return Err(SearchError::NoResults),
            Err(e) => {
                log::warn!("Geocoding failed: query={} error={}", outcome.query, e);
                return Err(e);
            }
        };

        self.clear(surface);

        let style = surface.styles().search_result;
        self.marker = surface.add_marker(MarkerSpec {
            kind: MarkerKind::SearchResult,
            position: found.position,
            title: found.display_name.clone(),
            body: String::new(),
            style,
        });
        surface.set_view(found.position, FOCUS_ZOOM);

        log::info!(
            "Search result placed: query={} position={} label={}",
            outcome.query,
            found.position,
            found.display_name
        );
        self.result = Some(ExternalSearchResult {
            position: found.position,
            label: found.display_name,
        });
        self.query.clear();
        Ok(())
    }

    /// Blocking begin + lookup + apply.
    pub fn search<B: MapBackend>(
        &mut self,
        surface: &mut MapSurface<B>,
        geocoder: &dyn Geocoder,
    ) -> Result<(), SearchError> {
        let request = self.begin(surface)?;
        let outcome = request.run(geocoder);
        self.complete(surface, outcome)
    }

    pub fn clear<B: MapBackend>(&mut self, surface: &mut MapSurface<B>) {
        if let Some(marker) = self.marker.take() {
            surface.remove_layer(marker);
        }
        self.result = None;
    }
}
