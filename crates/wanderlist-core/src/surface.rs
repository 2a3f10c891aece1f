// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Ownership of the map object graph.
//!
//! The map, its layers and markers live in a [`MapBackend`] that we do not
//! control. [`MapSurface`] holds the only handle to the live map and rebuilds
//! derived layers from application state instead of patching them.

use crate::geolocation::{GeolocationError, GeolocationOutcome, GeolocationRequest};
use crate::place::Place;
use crate::theme::{MapThemeKind, TileSource};
use crate::{LatLon, PlaceStore, FALLBACK_CENTER, FALLBACK_ZOOM, FOCUS_ZOOM};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerStyle {
    pub fill: [f32; 3],
    pub outline: [f32; 3],
    pub size: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteStyle {
    pub color: [f32; 3],
    pub width: f32,
}

/// Appearance for everything the surface draws, handed in at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerStyles {
    pub place: MarkerStyle,
    pub search_result: MarkerStyle,
    pub route: RouteStyle,
}

impl Default for MarkerStyles {
    fn default() -> Self {
        Self {
            place: MarkerStyle {
                fill: [0.16, 0.5, 0.79],
                outline: [0.0, 0.0, 0.0],
                size: 12.0,
            },
            search_result: MarkerStyle {
                fill: [0.98, 0.45, 0.09],
                outline: [1.0, 1.0, 1.0],
                size: 14.0,
            },
            route: RouteStyle {
                color: [1.0, 0.0, 1.0],
                width: 3.0,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Place,
    SearchResult,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub kind: MarkerKind,
    pub position: LatLon,
    pub title: String,
    pub body: String,
    pub style: MarkerStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteSpec {
    pub waypoints: Vec<LatLon>,
    pub label: String,
    pub style: RouteStyle,
}

/// The externally owned, imperative map API.
///
/// Mirrors what a slippy-map library offers: one map per backend, layers
/// addressed by opaque ids, markers either on the map or inside a group.
pub trait MapBackend {
    fn create_map(&mut self, center: LatLon, zoom: f64);
    fn destroy_map(&mut self);
    fn set_view(&mut self, center: LatLon, zoom: f64);
    fn add_tile_layer(&mut self, source: TileSource) -> LayerId;
    fn add_layer_group(&mut self) -> LayerId;
    fn clear_layer_group(&mut self, group: LayerId);
    fn add_marker(&mut self, group: Option<LayerId>, marker: MarkerSpec) -> LayerId;
    fn add_route(&mut self, route: RouteSpec) -> LayerId;
    fn remove_layer(&mut self, id: LayerId);
}

/// Identifies the map instance and reset epoch an async job was started for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Liveness {
    instance: u64,
    epoch: u64,
}

/// A layer created on one particular map instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerHandle {
    id: LayerId,
    instance: u64,
}

#[derive(Debug)]
struct LiveMap {
    instance: u64,
    theme: MapThemeKind,
    tile_layer: LayerId,
    marker_group: LayerId,
    marker_positions: Vec<LatLon>,
    marker_revision: Option<u64>,
    center: LatLon,
    zoom: f64,
}

pub struct MapSurface<B: MapBackend> {
    backend: B,
    styles: MarkerStyles,
    live: Option<LiveMap>,
    instances_created: u64,
    epoch: u64,
}

impl<B: MapBackend> MapSurface<B> {
    pub fn new(backend: B, styles: MarkerStyles) -> Self {
        Self {
            backend,
            styles,
            live: None,
            instances_created: 0,
            epoch: 0,
        }
    }

    /// Creates the map if there is none yet.
    pub fn initialize(&mut self, theme: MapThemeKind) -> Liveness {
        if let Some(live) = &self.live {
            return Liveness {
                instance: live.instance,
                epoch: self.epoch,
            };
        }

        self.instances_created += 1;
        let instance = self.instances_created;

        self.backend.create_map(FALLBACK_CENTER, FALLBACK_ZOOM);
        let tile_layer = self.backend.add_tile_layer(theme.source());
        let marker_group = self.backend.add_layer_group();

        log::info!(
            "Map initialised: instance={} theme={} center={} zoom={}",
            instance,
            theme,
            FALLBACK_CENTER,
            FALLBACK_ZOOM
        );

        self.live = Some(LiveMap {
            instance,
            theme,
            tile_layer,
            marker_group,
            marker_positions: Vec::new(),
            marker_revision: None,
            center: FALLBACK_CENTER,
            zoom: FALLBACK_ZOOM,
        });

        Liveness {
            instance,
            epoch: self.epoch,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.live.is_some()
    }

    pub fn liveness(&self) -> Option<Liveness> {
        self.live.as_ref().map(|live| Liveness {
            instance: live.instance,
            epoch: self.epoch,
        })
    }

    /// True while the map instance the ticket was issued for still exists.
    pub fn is_alive(&self, ticket: &Liveness) -> bool {
        self.live
            .as_ref()
            .is_some_and(|live| live.instance == ticket.instance)
    }

    /// Like [`is_alive`](Self::is_alive), and no reset happened since.
    pub fn is_current(&self, ticket: &Liveness) -> bool {
        self.is_alive(ticket) && ticket.epoch == self.epoch
    }

    pub fn theme(&self) -> Option<MapThemeKind> {
        self.live.as_ref().map(|live| live.theme)
    }

    pub fn styles(&self) -> &MarkerStyles {
        &self.styles
    }

    pub fn view(&self) -> Option<(LatLon, f64)> {
        self.live.as_ref().map(|live| (live.center, live.zoom))
    }

    pub fn set_view(&mut self, center: LatLon, zoom: f64) {
        if let Some(live) = self.live.as_mut() {
            live.center = center;
            live.zoom = zoom;
            self.backend.set_view(center, zoom);
        }
    }

    /// Swaps the basemap. The old tile layer is removed before the new one
    /// is added so two never coexist.
    pub fn set_theme(&mut self, theme: MapThemeKind) {
        let Some(live) = self.live.as_mut() else {
            return;
        };
        if live.theme == theme {
            return;
        }

        self.backend.remove_layer(live.tile_layer);
        live.tile_layer = self.backend.add_tile_layer(theme.source());
        log::debug!("Tile layer swapped: from={} to={}", live.theme, theme);
        live.theme = theme;
    }

    /// Rebuilds markers if the store changed since the last rebuild.
    pub fn sync_markers(&mut self, store: &PlaceStore) {
        let stale = self
            .live
            .as_ref()
            .is_some_and(|live| live.marker_revision != Some(store.revision()));
        if stale {
            self.rebuild_markers(store.as_slice());
            if let Some(live) = self.live.as_mut() {
                live.marker_revision = Some(store.revision());
            }
        }
    }

    /// Clears the marker layer and adds one marker per place.
    pub fn rebuild_markers(&mut self, places: &[Place]) {
        let Some(live) = self.live.as_mut() else {
            return;
        };

        self.backend.clear_layer_group(live.marker_group);
        live.marker_positions.clear();

        for place in places {
            self.backend.add_marker(
                Some(live.marker_group),
                MarkerSpec {
                    kind: MarkerKind::Place,
                    position: place.position(),
                    title: place.name().to_string(),
                    body: place.description().to_string(),
                    style: self.styles.place,
                },
            );
            live.marker_positions.push(place.position());
        }

        log::debug!("Marker layer rebuilt: markers={}", live.marker_positions.len());
    }

    /// Positions currently shown in the marker layer, in store order.
    pub fn marker_positions(&self) -> &[LatLon] {
        self.live
            .as_ref()
            .map(|live| live.marker_positions.as_slice())
            .unwrap_or(&[])
    }

    /// Adds a standalone marker (outside the place layer).
    pub fn add_marker(&mut self, marker: MarkerSpec) -> Option<LayerHandle> {
        let live = self.live.as_ref()?;
        let id = self.backend.add_marker(None, marker);
        Some(LayerHandle {
            id,
            instance: live.instance,
        })
    }

    pub fn add_route(&mut self, route: RouteSpec) -> Option<LayerHandle> {
        let live = self.live.as_ref()?;
        let id = self.backend.add_route(route);
        Some(LayerHandle {
            id,
            instance: live.instance,
        })
    }

    /// Removes a layer if it belongs to the live map. Handles from a disposed
    /// map are simply forgotten.
    pub fn remove_layer(&mut self, handle: LayerHandle) {
        let owned = self
            .live
            .as_ref()
            .is_some_and(|live| live.instance == handle.instance);
        if owned {
            self.backend.remove_layer(handle.id);
        }
    }

    pub fn begin_geolocation(&self) -> Option<GeolocationRequest> {
        self.liveness().map(GeolocationRequest::new)
    }

    /// Recentres on the user's position. Failures leave the view alone and
    /// come back for the caller to show as a notice.
    pub fn apply_geolocation(&mut self, outcome: GeolocationOutcome) -> Result<(), GeolocationError> {
        if !self.is_alive(&outcome.ticket) {
            log::debug!("Dropping geolocation result for a disposed map");
            return Ok(());
        }

        match outcome.result {
            Ok(position) => {
                log::info!("Centring on current position: position={}", position);
                self.set_view(position, FOCUS_ZOOM);
                Ok(())
            }
            Err(e) => {
                log::warn!("Geolocation failed; keeping fallback view: reason={}", e);
                Err(e)
            }
        }
    }

    /// Clears the place markers and resets the view. Any async work issued
    /// before this call becomes stale.
    pub fn refresh(&mut self) {
        self.epoch += 1;
        let Some(live) = self.live.as_mut() else {
            return;
        };

        self.backend.clear_layer_group(live.marker_group);
        // marker_revision is left alone, so the layer stays empty until the
        // store changes again.
        live.marker_positions.clear();
        live.center = FALLBACK_CENTER;
        live.zoom = FALLBACK_ZOOM;
        self.backend.set_view(FALLBACK_CENTER, FALLBACK_ZOOM);

        log::debug!("Map refreshed: instance={} epoch={}", live.instance, self.epoch);
    }

    /// Destroys the map. Safe to call repeatedly or before initialisation.
    pub fn dispose(&mut self) {
        self.epoch += 1;
        if let Some(live) = self.live.take() {
            self.backend.destroy_map();
            log::info!("Map disposed: instance={}", live.instance);
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: MapBackend> Drop for MapSurface<B> {
    fn drop(&mut self) {
        self.dispose();
    }
}
