// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::Message;
use iced::advanced::{self, layout, renderer, widget, Layout, Widget};
use iced::widget::image;
use iced::{mouse, Border, Color, Element, Event, Length, Radians, Rectangle};
use lru::LruCache;
use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use wanderlist_core::scene::SceneGraph;
use wanderlist_core::surface::{LayerId, MarkerSpec};
use wanderlist_core::theme::TileSource;
use wanderlist_core::{LatLon, FALLBACK_CENTER, FALLBACK_ZOOM};

// --- Slippy Map / Mercator Math ---
pub const TILE_SIZE: f64 = 256.0;
const MAX_LAT: f64 = 85.0511;

pub fn lon_to_x(lon: f64, zoom: f64) -> f64 {
    ((lon + 180.0) / 360.0) * 2.0f64.powf(zoom) * TILE_SIZE
}

pub fn lat_to_y(lat: f64, zoom: f64) -> f64 {
    let lat_rad = lat.to_radians();
    (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / std::f64::consts::PI) / 2.0
        * 2.0f64.powf(zoom)
        * TILE_SIZE
}

pub fn x_to_lon(x: f64, zoom: f64) -> f64 {
    (x / (TILE_SIZE * 2.0f64.powf(zoom))) * 360.0 - 180.0
}

pub fn y_to_lat(y: f64, zoom: f64) -> f64 {
    let n = std::f64::consts::PI - 2.0 * std::f64::consts::PI * y / (TILE_SIZE * 2.0f64.powf(zoom));
    (0.5 * (n.exp() - (-n).exp())).atan().to_degrees()
}

fn world(position: LatLon) -> (f64, f64) {
    (lon_to_x(position.lon, 0.0), lat_to_y(position.lat, 0.0))
}

fn color(rgb: [f32; 3]) -> Color {
    Color::from_rgb(rgb[0], rgb[1], rgb[2])
}

/// Marker under a world-space (zoom 0) point, within `radius_px` screen pixels.
/// The most recently added marker wins when several overlap.
pub fn marker_at(
    markers: &[(LayerId, &MarkerSpec)],
    point: (f64, f64),
    scale: f64,
    radius_px: f64,
) -> Option<LayerId> {
    let limit = (radius_px / scale).powi(2);
    markers
        .iter()
        .rev()
        .find(|(_, spec)| {
            let (mx, my) = world(spec.position);
            (mx - point.0).powi(2) + (my - point.1).powi(2) < limit
        })
        .map(|(id, _)| *id)
}

// --- Tile Management ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoords {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct TileKey {
    template: &'static str,
    coords: TileCoords,
}

// Failed tiles are not asked for again until this has passed.
const FAILED_TILE_RETRY: Duration = Duration::from_secs(60);

fn is_backing_off(failed: &HashMap<TileKey, Instant>, key: &TileKey, now: Instant) -> bool {
    failed
        .get(key)
        .is_some_and(|at| now.saturating_duration_since(*at) < FAILED_TILE_RETRY)
}

pub struct TileManager {
    tiles: Arc<Mutex<LruCache<TileKey, image::Handle>>>,
    pending: Arc<Mutex<HashSet<TileKey>>>,
    failed: Arc<Mutex<HashMap<TileKey, Instant>>>,
    user_agent: String,
}

impl TileManager {
    pub fn new(user_agent: String) -> Self {
        Self {
            tiles: Arc::new(Mutex::new(LruCache::new(
                NonZeroUsize::new(400).unwrap_or(NonZeroUsize::MIN),
            ))),
            pending: Arc::new(Mutex::new(HashSet::new())),
            failed: Arc::new(Mutex::new(HashMap::new())),
            user_agent,
        }
    }

    pub fn get_tile(&self, source: &TileSource, coords: TileCoords) -> Option<image::Handle> {
        let key = TileKey {
            template: source.url_template,
            coords,
        };
        self.tiles.lock().ok()?.get(&key).cloned()
    }

    pub fn request_tile(&self, source: &TileSource, coords: TileCoords) {
        let key = TileKey {
            template: source.url_template,
            coords,
        };
        {
            let (Ok(mut pending), Ok(tiles), Ok(failed)) =
                (self.pending.lock(), self.tiles.lock(), self.failed.lock())
            else {
                return;
            };
            if pending.contains(&key)
                || tiles.contains(&key)
                || is_backing_off(&failed, &key, Instant::now())
            {
                return;
            }
            pending.insert(key);
        }

        let tiles_arc = Arc::clone(&self.tiles);
        let pending_arc = Arc::clone(&self.pending);
        let failed_arc = Arc::clone(&self.failed);
        let url = source.tile_url(coords.z, coords.x, coords.y);
        let user_agent = self.user_agent.clone();

        // Background fetcher; the periodic redraw picks the tile up.
        std::thread::spawn(move || {
            let resp = ureq::get(&url)
                .set("User-Agent", &user_agent)
                .timeout(std::time::Duration::from_secs(10))
                .call();

            let fetched = match resp {
                Ok(response) => {
                    let mut bytes = Vec::new();
                    match std::io::Read::read_to_end(&mut response.into_reader(), &mut bytes) {
                        Ok(_) => {
                            if let Ok(mut tiles) = tiles_arc.lock() {
                                tiles.put(key, image::Handle::from_bytes(bytes));
                            }
                            true
                        }
                        Err(e) => {
                            log::warn!("Tile body unreadable: url={} error={}", url, e);
                            false
                        }
                    }
                }
                Err(e) => {
                    log::warn!("Tile fetch failed: url={} error={}", url, e);
                    false
                }
            };
            if let Ok(mut failed) = failed_arc.lock() {
                if fetched {
                    failed.remove(&key);
                } else {
                    failed.insert(key, Instant::now());
                }
            }
            if let Ok(mut pending) = pending_arc.lock() {
                pending.remove(&key);
            }
        });
    }
}

/// Read-only renderer for the scene graph the planner drives.
pub struct MapView<'a> {
    pub scene: &'a SceneGraph,
    pub tile_manager: &'a TileManager,
    pub selected_marker: Option<LayerId>,
}

impl<'a> MapView<'a> {
    fn view(&self) -> (LatLon, f64) {
        self.scene
            .view()
            .unwrap_or((FALLBACK_CENTER, FALLBACK_ZOOM))
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct MapState {
    is_dragging: bool,
    press_position: Option<iced::Point>,
    last_cursor: Option<iced::Point>,
    // Track values between prop updates to handle multiple events per frame
    current_center: (f64, f64), // (lat, lon)
    current_zoom: f64,
    last_prop_center: Option<(f64, f64)>,
    last_prop_zoom: Option<f64>,
}

impl<'a, Theme, Renderer> Widget<Message, Theme, Renderer> for MapView<'a>
where
    Renderer: renderer::Renderer + advanced::image::Renderer<Handle = image::Handle>,
{
    fn size(&self) -> iced::Size<Length> {
        iced::Size {
            width: Length::Fill,
            height: Length::Fill,
        }
    }

    fn tag(&self) -> widget::tree::Tag {
        widget::tree::Tag::of::<MapState>()
    }

    fn state(&self) -> widget::tree::State {
        widget::tree::State::new(MapState::default())
    }

    fn layout(
        &self,
        _tree: &mut widget::Tree,
        _renderer: &Renderer,
        limits: &layout::Limits,
    ) -> layout::Node {
        layout::Node::new(limits.max())
    }

    fn draw(
        &self,
        tree: &widget::Tree,
        renderer: &mut Renderer,
        _theme: &Theme,
        _style: &renderer::Style,
        layout: Layout<'_>,
        _cursor: mouse::Cursor,
        _viewport: &Rectangle,
    ) {
        let state = tree.state.downcast_ref::<MapState>();
        let bounds = layout.bounds();
        let (prop_center, prop_zoom) = self.view();

        // Prefer internal state for zero-latency feedback during interactions,
        // unless the planner moved the view since (refresh, search, geolocation).
        let props_unchanged = state.last_prop_center == Some((prop_center.lat, prop_center.lon))
            && state.last_prop_zoom == Some(prop_zoom);
        let (zoom, (center_lat, center_lon)) = if props_unchanged {
            (state.current_zoom, state.current_center)
        } else {
            (prop_zoom, (prop_center.lat, prop_center.lon))
        };

        let zoom_scale = 2.0f64.powf(zoom);
        let camera_center_x = lon_to_x(center_lon, 0.0);
        let camera_center_y = lat_to_y(center_lat, 0.0);

        let to_screen = |(wx, wy): (f64, f64)| -> (f32, f32) {
            (
                bounds.x + (bounds.width / 2.0) + ((wx - camera_center_x) * zoom_scale) as f32,
                bounds.y + (bounds.height / 2.0) + ((wy - camera_center_y) * zoom_scale) as f32,
            )
        };

        renderer.with_layer(bounds, |renderer| {
            renderer.fill_quad(
                renderer::Quad {
                    bounds,
                    border: Border::default(),
                    ..Default::default()
                },
                Color::from_rgb(0.05, 0.05, 0.05),
            );

            // --- Tile Layer ---
            let Some(source) = self.scene.tile_layers().first().map(|s| **s) else {
                return;
            };
            let z = zoom.floor().clamp(0.0, source.max_zoom as f64) as u32;
            let num_tiles = 2u32.pow(z);
            let tile_size_z0 = TILE_SIZE / 2.0f64.powf(z as f64);

            let half_w = (bounds.width as f64 / 2.0) / zoom_scale;
            let half_h = (bounds.height as f64 / 2.0) / zoom_scale;

            let min_tx = ((camera_center_x - half_w) / tile_size_z0).floor() as i32;
            let max_tx = ((camera_center_x + half_w) / tile_size_z0).ceil() as i32;
            let min_ty = ((camera_center_y - half_h) / tile_size_z0).floor() as i32;
            let max_ty = ((camera_center_y + half_h) / tile_size_z0).ceil() as i32;

            for tx in min_tx..=max_tx {
                if tx < 0 || tx >= num_tiles as i32 {
                    continue;
                }
                for ty in min_ty..=max_ty {
                    if ty < 0 || ty >= num_tiles as i32 {
                        continue;
                    }

                    let coords = TileCoords {
                        x: tx as u32,
                        y: ty as u32,
                        z,
                    };
                    let (screen_x, screen_y) =
                        to_screen((tx as f64 * tile_size_z0, ty as f64 * tile_size_z0));
                    let current_tile_size = (tile_size_z0 * zoom_scale) as f32;

                    let tile_rect = Rectangle {
                        x: screen_x,
                        y: screen_y,
                        width: current_tile_size,
                        height: current_tile_size,
                    };

                    if let Some(handle) = self.tile_manager.get_tile(&source, coords) {
                        renderer.draw_image(
                            advanced::image::Image {
                                handle,
                                filter_method: image::FilterMethod::Linear,
                                rotation: Radians(0.0),
                                opacity: 1.0,
                                snap: false,
                            },
                            tile_rect,
                        );
                    } else {
                        renderer.fill_quad(
                            renderer::Quad {
                                bounds: tile_rect,
                                ..Default::default()
                            },
                            Color::from_rgb(0.1, 0.1, 0.1),
                        );
                        self.tile_manager.request_tile(&source, coords);
                    }
                }
            }
        });

        // --- Route Layer ---
        renderer.with_layer(bounds, |renderer| {
            for route in self.scene.routes() {
                let line_color = color(route.style.color);
                let width = route.style.width;

                for pair in route.waypoints.windows(2) {
                    let (sx1, sy1) = to_screen(world(pair[0]));
                    let (sx2, sy2) = to_screen(world(pair[1]));

                    // Polyline approximated with small quads
                    let dx = sx2 - sx1;
                    let dy = sy2 - sy1;
                    let distance = (dx * dx + dy * dy).sqrt();
                    let steps = (distance / 2.0).ceil().max(1.0) as usize;
                    for i in 0..=steps {
                        let t = i as f32 / steps as f32;
                        renderer.fill_quad(
                            renderer::Quad {
                                bounds: Rectangle {
                                    x: sx1 + dx * t - width / 2.0,
                                    y: sy1 + dy * t - width / 2.0,
                                    width,
                                    height: width,
                                },
                                border: Border {
                                    radius: (width / 2.0).into(),
                                    ..Default::default()
                                },
                                ..Default::default()
                            },
                            line_color,
                        );
                    }
                }
            }
        });

        // --- Marker Layer ---
        renderer.with_layer(bounds, |renderer| {
            for (id, spec) in self.scene.markers() {
                let (sx, sy) = to_screen(world(spec.position));
                let selected = self.selected_marker == Some(id);
                let size = if selected {
                    spec.style.size * 1.5
                } else {
                    spec.style.size
                };
                let half_size = size / 2.0;

                renderer.fill_quad(
                    renderer::Quad {
                        bounds: Rectangle {
                            x: sx - half_size,
                            y: sy - half_size,
                            width: size,
                            height: size,
                        },
                        border: Border {
                            color: if selected {
                                Color::from_rgb(1.0, 1.0, 0.0)
                            } else {
                                color(spec.style.outline)
                            },
                            width: if selected { 2.0 } else { 1.5 },
                            radius: half_size.into(),
                        },
                        ..Default::default()
                    },
                    color(spec.style.fill),
                );
            }
        });
    }

    fn on_event(
        &mut self,
        tree: &mut widget::Tree,
        event: Event,
        layout: iced::advanced::Layout<'_>,
        cursor: mouse::Cursor,
        _renderer: &Renderer,
        _clipboard: &mut dyn advanced::Clipboard,
        shell: &mut advanced::Shell<'_, Message>,
        _viewport: &Rectangle,
    ) -> advanced::graphics::core::event::Status {
        let state = tree.state.downcast_mut::<MapState>();
        let bounds = layout.bounds();
        let (prop_center, zoom_prop) = self.view();
        let center_prop = (prop_center.lat, prop_center.lon);

        // Initialize or sync internal state from props if props changed externally
        if state.last_prop_center != Some(center_prop) || state.last_prop_zoom != Some(zoom_prop) {
            state.current_center = center_prop;
            state.current_zoom = zoom_prop;
            state.last_prop_center = Some(center_prop);
            state.last_prop_zoom = Some(zoom_prop);
        }

        if self.scene.map().is_none() {
            return advanced::graphics::core::event::Status::Ignored;
        }

        let current_zoom = state.current_zoom;
        let (center_lat, center_lon) = state.current_center;

        let camera_x = lon_to_x(center_lon, 0.0);
        let camera_y = lat_to_y(center_lat, 0.0);
        let scale = 2.0f64.powf(current_zoom);

        let cursor_point = cursor.position_in(bounds);
        let mouse_z0 = cursor_point.map(|p| {
            let rx = (p.x as f64) - (bounds.width as f64 / 2.0);
            let ry = (p.y as f64) - (bounds.height as f64 / 2.0);
            (camera_x + rx / scale, camera_y + ry / scale)
        });

        match event {
            Event::Mouse(mouse::Event::WheelScrolled { delta }) => {
                if let Some(p) = cursor_point {
                    let d = match delta {
                        mouse::ScrollDelta::Lines { y, .. } => y as f64,
                        mouse::ScrollDelta::Pixels { y, .. } => (y as f64) / 100.0,
                    };
                    let max_zoom = self
                        .scene
                        .tile_layers()
                        .first()
                        .map_or(19.0, |s| s.max_zoom as f64);
                    let min_zoom = (bounds.width as f64 / TILE_SIZE).log2().max(0.0);
                    let new_zoom = (current_zoom + d * 0.25).clamp(min_zoom, max_zoom);

                    if (new_zoom - current_zoom).abs() > 0.001 {
                        let new_scale = 2.0f64.powf(new_zoom);

                        let mx = (p.x as f64) - (bounds.width as f64 / 2.0);
                        let my = (p.y as f64) - (bounds.height as f64 / 2.0);

                        // Keep the point under the cursor fixed
                        let new_camera_x = camera_x + mx / scale - mx / new_scale;
                        let new_camera_y = camera_y + my / scale - my / new_scale;

                        let new_half_w = (bounds.width as f64 / 2.0) / new_scale;
                        let new_camera_x_clamped = if new_half_w * 2.0 >= TILE_SIZE {
                            TILE_SIZE / 2.0
                        } else {
                            new_camera_x.clamp(new_half_w, TILE_SIZE - new_half_w)
                        };
                        let new_camera_y_clamped = new_camera_y.clamp(0.0, TILE_SIZE);

                        let new_center = (
                            y_to_lat(new_camera_y_clamped, 0.0).clamp(-MAX_LAT, MAX_LAT),
                            x_to_lon(new_camera_x_clamped, 0.0),
                        );

                        // Update internal state immediately for next event in same frame
                        state.current_center = new_center;
                        state.current_zoom = new_zoom;

                        shell.publish(Message::MapZoom {
                            new_center,
                            new_zoom,
                        });
                        return advanced::graphics::core::event::Status::Captured;
                    }
                }
            }
            Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                if cursor.is_over(bounds) {
                    if let Some(position) = cursor.position() {
                        state.is_dragging = true;
                        state.press_position = Some(position);
                        state.last_cursor = Some(position);
                        return advanced::graphics::core::event::Status::Captured;
                    }
                }
            }
            Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                let was_dragging = state.is_dragging;
                let press_pos = state.press_position;
                let release_pos = cursor.position();

                state.is_dragging = false;
                state.press_position = None;
                state.last_cursor = None;

                if was_dragging {
                    // Minimal movement counts as a click
                    if let (Some(p1), Some(p2), Some(point)) = (press_pos, release_pos, mouse_z0) {
                        if (p1.x - p2.x).hypot(p1.y - p2.y) < 5.0 {
                            let markers = self.scene.markers();
                            let hit = marker_at(&markers, point, scale, 10.0);
                            if hit != self.selected_marker {
                                shell.publish(Message::SelectMarker(hit));
                            }
                        }
                    }
                    return advanced::graphics::core::event::Status::Captured;
                }
            }
            Event::Mouse(mouse::Event::CursorMoved { position }) => {
                if state.is_dragging {
                    if let Some(last_pos) = state.last_cursor {
                        let delta = position - last_pos;
                        state.last_cursor = Some(position);

                        let new_wx = camera_x - delta.x as f64 / scale;
                        let new_wy = camera_y - delta.y as f64 / scale;

                        let half_vw = (bounds.width as f64 / 2.0) / scale;
                        let half_vh = (bounds.height as f64 / 2.0) / scale;

                        let clamped_wx = if half_vw * 2.0 >= TILE_SIZE {
                            TILE_SIZE / 2.0 // Center if viewport >= world
                        } else {
                            new_wx.clamp(half_vw, TILE_SIZE - half_vw)
                        };
                        let clamped_wy = if half_vh * 2.0 >= TILE_SIZE {
                            TILE_SIZE / 2.0
                        } else {
                            new_wy.clamp(half_vh, TILE_SIZE - half_vh)
                        };

                        let new_center = (y_to_lat(clamped_wy, 0.0), x_to_lon(clamped_wx, 0.0));
                        state.current_center = new_center;

                        shell.publish(Message::MapZoom {
                            new_center,
                            new_zoom: current_zoom,
                        });
                        return advanced::graphics::core::event::Status::Captured;
                    }
                }
            }
            _ => {}
        }

        advanced::graphics::core::event::Status::Ignored
    }

    fn mouse_interaction(
        &self,
        tree: &widget::Tree,
        layout: iced::advanced::Layout<'_>,
        cursor: mouse::Cursor,
        _viewport: &Rectangle,
        _renderer: &Renderer,
    ) -> mouse::Interaction {
        let state = tree.state.downcast_ref::<MapState>();
        if state.is_dragging {
            mouse::Interaction::Grabbing
        } else if cursor.is_over(layout.bounds()) {
            mouse::Interaction::Grab
        } else {
            mouse::Interaction::default()
        }
    }
}

impl<'a, Theme, Renderer> From<MapView<'a>> for Element<'a, Message, Theme, Renderer>
where
    Theme: 'a,
    Renderer: 'a + renderer::Renderer + advanced::image::Renderer<Handle = image::Handle>,
{
    fn from(map_view: MapView<'a>) -> Self {
        Self::new(map_view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wanderlist_core::surface::{MarkerKind, MarkerStyles};

    fn spec(lat: f64, lon: f64) -> MarkerSpec {
        MarkerSpec {
            kind: MarkerKind::Place,
            position: LatLon::new(lat, lon),
            title: String::new(),
            body: String::new(),
            style: MarkerStyles::default().place,
        }
    }

    #[test]
    fn test_mercator_origin() {
        assert!((lon_to_x(0.0, 0.0) - TILE_SIZE / 2.0).abs() < 1e-9);
        assert!((lat_to_y(0.0, 0.0) - TILE_SIZE / 2.0).abs() < 1e-9);
        assert!((y_to_lat(lat_to_y(12.9716, 11.0), 11.0) - 12.9716).abs() < 1e-9);
    }

    #[test]
    fn test_marker_hit_prefers_topmost() {
        let a = spec(12.97, 77.59);
        let b = spec(12.97, 77.59);
        let markers = vec![(LayerId(1), &a), (LayerId(2), &b)];
        let scale = 2.0f64.powf(13.0);

        let hit = marker_at(&markers, world(LatLon::new(12.97, 77.59)), scale, 10.0);
        assert_eq!(hit, Some(LayerId(2)));
    }

    #[test]
    fn test_marker_miss_outside_radius() {
        let a = spec(12.97, 77.59);
        let markers = vec![(LayerId(1), &a)];
        let scale = 2.0f64.powf(13.0);

        // About a kilometre away is far more than ten pixels at zoom 13.
        let hit = marker_at(&markers, world(LatLon::new(12.98, 77.59)), scale, 10.0);
        assert_eq!(hit, None);
    }

    #[test]
    fn test_failed_tile_backs_off_then_expires() {
        let key = TileKey {
            template: "https://tile.example/{z}/{x}/{y}.png",
            coords: TileCoords { x: 1, y: 2, z: 3 },
        };
        let now = Instant::now();
        let mut failed = HashMap::new();
        assert!(!is_backing_off(&failed, &key, now));

        failed.insert(key, now);
        assert!(is_backing_off(&failed, &key, now + Duration::from_secs(5)));
        assert!(!is_backing_off(&failed, &key, now + FAILED_TILE_RETRY));
    }

    #[test]
    fn test_recently_failed_tile_is_not_requested() {
        let manager = TileManager::new("wanderlist-test".to_string());
        let source = wanderlist_core::MapThemeKind::OpenStreetMap.source();
        let coords = TileCoords { x: 0, y: 0, z: 0 };
        let key = TileKey {
            template: source.url_template,
            coords,
        };
        manager.failed.lock().unwrap().insert(key, Instant::now());

        manager.request_tile(&source, coords);

        assert!(!manager.pending.lock().unwrap().contains(&key));
        assert!(manager.get_tile(&source, coords).is_none());
    }
}
