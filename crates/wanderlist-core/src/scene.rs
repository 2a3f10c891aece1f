// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Retained in-memory map object graph.
//!
//! This is the map "library" the application drives through [`MapBackend`].
//! The GUI widget only reads it; all writes go through `MapSurface`.

use crate::surface::{LayerId, MapBackend, MarkerSpec, RouteSpec};
use crate::theme::TileSource;
use crate::LatLon;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    Tiles(TileSource),
    Group(Vec<LayerId>),
    Marker(MarkerSpec),
    Route(RouteSpec),
}

#[derive(Debug, Clone)]
pub struct SceneMap {
    pub center: LatLon,
    pub zoom: f64,
    // Keyed by id so iteration follows creation order, which is draw order.
    layers: BTreeMap<LayerId, Layer>,
}

#[derive(Debug, Default)]
pub struct SceneGraph {
    map: Option<SceneMap>,
    next_id: u64,
    maps_created: u64,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map(&self) -> Option<&SceneMap> {
        self.map.as_ref()
    }

    pub fn maps_created(&self) -> u64 {
        self.maps_created
    }

    pub fn view(&self) -> Option<(LatLon, f64)> {
        self.map.as_ref().map(|m| (m.center, m.zoom))
    }

    pub fn layer_count(&self) -> usize {
        self.map.as_ref().map_or(0, |m| m.layers.len())
    }

    pub fn tile_layers(&self) -> Vec<&TileSource> {
        self.layers()
            .filter_map(|(_, layer)| match layer {
                Layer::Tiles(source) => Some(source),
                _ => None,
            })
            .collect()
    }

    /// Every marker on the map, grouped or not, in creation order.
    pub fn markers(&self) -> Vec<(LayerId, &MarkerSpec)> {
        self.layers()
            .filter_map(|(id, layer)| match layer {
                Layer::Marker(spec) => Some((*id, spec)),
                _ => None,
            })
            .collect()
    }

    pub fn routes(&self) -> Vec<&RouteSpec> {
        self.layers()
            .filter_map(|(_, layer)| match layer {
                Layer::Route(route) => Some(route),
                _ => None,
            })
            .collect()
    }

    fn layers(&self) -> impl Iterator<Item = (&LayerId, &Layer)> {
        self.map.iter().flat_map(|m| m.layers.iter())
    }

    fn allocate(&mut self) -> LayerId {
        self.next_id += 1;
        LayerId(self.next_id)
    }

    fn insert(&mut self, layer: Layer) -> LayerId {
        let id = self.allocate();
        match self.map.as_mut() {
            Some(map) => {
                map.layers.insert(id, layer);
            }
            None => log::warn!("Layer added with no map present: id={:?}", id),
        }
        id
    }
}

impl MapBackend for SceneGraph {
    fn create_map(&mut self, center: LatLon, zoom: f64) {
        if self.map.is_some() {
            log::warn!("create_map called twice; replacing the existing map");
        }
        self.maps_created += 1;
        self.map = Some(SceneMap {
            center,
            zoom,
            layers: BTreeMap::new(),
        });
    }

    fn destroy_map(&mut self) {
        self.map = None;
    }

    fn set_view(&mut self, center: LatLon, zoom: f64) {
        if let Some(map) = self.map.as_mut() {
            map.center = center;
            map.zoom = zoom;
        }
    }

    fn add_tile_layer(&mut self, source: TileSource) -> LayerId {
        self.insert(Layer::Tiles(source))
    }

    fn add_layer_group(&mut self) -> LayerId {
        self.insert(Layer::Group(Vec::new()))
    }

    fn clear_layer_group(&mut self, group: LayerId) {
        let Some(map) = self.map.as_mut() else {
            return;
        };
        let members = match map.layers.get_mut(&group) {
            Some(Layer::Group(members)) => std::mem::take(members),
            _ => return,
        };
        for id in members {
            map.layers.remove(&id);
        }
    }

    fn add_marker(&mut self, group: Option<LayerId>, marker: MarkerSpec) -> LayerId {
        let id = self.insert(Layer::Marker(marker));
        if let (Some(group), Some(map)) = (group, self.map.as_mut()) {
            if let Some(Layer::Group(members)) = map.layers.get_mut(&group) {
                members.push(id);
            }
        }
        id
    }

    fn add_route(&mut self, route: RouteSpec) -> LayerId {
        self.insert(Layer::Route(route))
    }

    fn remove_layer(&mut self, id: LayerId) {
        let Some(map) = self.map.as_mut() else {
            return;
        };
        if let Some(Layer::Group(members)) = map.layers.remove(&id) {
            for member in members {
                map.layers.remove(&member);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{MarkerKind, MarkerStyles};
    use crate::theme::MapThemeKind;

    fn marker(lat: f64) -> MarkerSpec {
        MarkerSpec {
            kind: MarkerKind::Place,
            position: LatLon::new(lat, 77.0),
            title: "m".to_string(),
            body: String::new(),
            style: MarkerStyles::default().place,
        }
    }

    #[test]
    fn test_group_clear_removes_only_members() {
        let mut scene = SceneGraph::new();
        scene.create_map(LatLon::new(0.0, 0.0), 3.0);
        let group = scene.add_layer_group();
        scene.add_marker(Some(group), marker(1.0));
        scene.add_marker(Some(group), marker(2.0));
        scene.add_marker(None, marker(3.0));

        scene.clear_layer_group(group);

        let markers = scene.markers();
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].1.position.lat, 3.0);
    }

    #[test]
    fn test_remove_tile_layer() {
        let mut scene = SceneGraph::new();
        scene.create_map(LatLon::new(0.0, 0.0), 3.0);
        let tiles = scene.add_tile_layer(MapThemeKind::OpenStreetMap.source());
        assert_eq!(scene.tile_layers().len(), 1);

        scene.remove_layer(tiles);
        assert!(scene.tile_layers().is_empty());
    }

    #[test]
    fn test_destroy_drops_everything() {
        let mut scene = SceneGraph::new();
        scene.create_map(LatLon::new(0.0, 0.0), 3.0);
        scene.add_marker(None, marker(1.0));
        scene.destroy_map();

        assert!(scene.map().is_none());
        assert_eq!(scene.layer_count(), 0);
        assert_eq!(scene.maps_created(), 1);
    }
}
