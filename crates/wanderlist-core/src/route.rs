// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::surface::{LayerHandle, Liveness, MapBackend, MapSurface, RouteSpec};
use crate::{LatLon, PlaceStore};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteSelection {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl RouteSelection {
    /// Both ends chosen and different.
    pub fn is_complete(&self) -> bool {
        matches!((&self.start, &self.end), (Some(a), Some(b)) if a != b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteState {
    NoRoute,
    RouteActive,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteSummary {
    pub start: String,
    pub end: String,
    pub from: LatLon,
    pub to: LatLon,
    pub distance_km: f64,
}

// Everything a rebuild depends on; if none of it moved, reconcile is a no-op.
#[derive(Debug, Clone, PartialEq)]
struct Inputs {
    selection: RouteSelection,
    store_revision: u64,
    trigger: u64,
    map: Option<Liveness>,
}

#[derive(Debug)]
struct Overlay {
    handle: LayerHandle,
    summary: RouteSummary,
}

/// Keeps at most one route overlay on the map.
///
/// Changing the selection never draws a route by itself; a route appears only
/// after [`calculate`](Self::calculate) for the pair currently selected.
#[derive(Debug, Default)]
pub struct RouteController {
    selection: RouteSelection,
    trigger: u64,
    requested: Option<RouteSelection>,
    overlay: Option<Overlay>,
    last_inputs: Option<Inputs>,
}

impl RouteController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &RouteSelection {
        &self.selection
    }

    pub fn select_start(&mut self, name: Option<String>) {
        let name = name.filter(|n| !n.is_empty());
        if self.selection.start != name {
            self.selection.start = name;
            self.requested = None;
        }
    }

    pub fn select_end(&mut self, name: Option<String>) {
        let name = name.filter(|n| !n.is_empty());
        if self.selection.end != name {
            self.selection.end = name;
            self.requested = None;
        }
    }

    /// Asks for a route between the current pair on the next reconcile.
    /// Editing either end afterwards cancels the request.
    pub fn calculate(&mut self) {
        self.trigger += 1;
        self.requested = Some(self.selection.clone());
    }

    pub fn state(&self) -> RouteState {
        if self.overlay.is_some() {
            RouteState::RouteActive
        } else {
            RouteState::NoRoute
        }
    }

    pub fn summary(&self) -> Option<&RouteSummary> {
        self.overlay.as_ref().map(|o| &o.summary)
    }

    /// Brings the overlay in line with selection, store and map.
    ///
    /// Any change tears the old overlay down first; a new one is built only if
    /// a calculation was requested for exactly this pair and both names still
    /// resolve. A request that fails once is dropped.
    pub fn reconcile<B: MapBackend>(&mut self, surface: &mut MapSurface<B>, store: &PlaceStore) {
        let inputs = Inputs {
            selection: self.selection.clone(),
            store_revision: store.revision(),
            trigger: self.trigger,
            map: surface.liveness(),
        };
        if self.last_inputs.as_ref() == Some(&inputs) {
            return;
        }
        self.last_inputs = Some(inputs);

        self.teardown(surface);

        if self.requested.as_ref() != Some(&self.selection) {
            return;
        }
        // A request that cannot be honoured now is spent; bringing a name
        // back later must not redraw without a new calculate.
        if !self.selection.is_complete() {
            self.requested = None;
            return;
        }
        let (Some(start_name), Some(end_name)) = (&self.selection.start, &self.selection.end)
        else {
            return;
        };
        let (Some(start), Some(end)) = (store.find(start_name), store.find(end_name)) else {
            log::debug!(
                "Route endpoint no longer exists: start={} end={}",
                start_name,
                end_name
            );
            self.requested = None;
            return;
        };

        let from = start.position();
        let to = end.position();
        let summary = RouteSummary {
            start: start_name.clone(),
            end: end_name.clone(),
            from,
            to,
            distance_km: from.distance_km(&to),
        };
        let spec = RouteSpec {
            waypoints: vec![from, to],
            label: format!("{} → {}", start_name, end_name),
            style: surface.styles().route,
        };

        match surface.add_route(spec) {
            Some(handle) => {
                log::info!(
                    "Route drawn: start={} end={} distance_km={:.2}",
                    summary.start,
                    summary.end,
                    summary.distance_km
                );
                self.overlay = Some(Overlay { handle, summary });
            }
            None => self.requested = None,
        }
    }

    /// Drops the overlay and forgets the selection.
    pub fn reset<B: MapBackend>(&mut self, surface: &mut MapSurface<B>) {
        self.teardown(surface);
        self.selection = RouteSelection::default();
        self.requested = None;
        self.last_inputs = None;
    }

    fn teardown<B: MapBackend>(&mut self, surface: &mut MapSurface<B>) {
        if let Some(overlay) = self.overlay.take() {
            surface.remove_layer(overlay.handle);
            log::debug!(
                "Route removed: start={} end={}",
                overlay.summary.start,
                overlay.summary.end
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_completeness() {
        let mut sel = RouteSelection::default();
        assert!(!sel.is_complete());

        sel.start = Some("A".into());
        sel.end = Some("A".into());
        assert!(!sel.is_complete());

        sel.end = Some("B".into());
        assert!(sel.is_complete());
    }

    #[test]
    fn test_empty_names_count_as_unselected() {
        let mut routes = RouteController::new();
        routes.select_start(Some(String::new()));
        routes.select_end(Some("B".into()));
        assert_eq!(routes.selection().start, None);
        assert_eq!(routes.selection().end.as_deref(), Some("B"));
    }

    #[test]
    fn test_editing_an_end_cancels_the_request() {
        let mut routes = RouteController::new();
        routes.select_start(Some("A".into()));
        routes.select_end(Some("B".into()));
        routes.calculate();
        assert_eq!(routes.requested.as_ref(), Some(routes.selection()));

        // Re-selecting the same name is not an edit.
        routes.select_end(Some("B".into()));
        assert!(routes.requested.is_some());

        routes.select_end(Some("C".into()));
        routes.select_end(Some("B".into()));
        assert!(routes.requested.is_none());
    }
}
