// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

pub mod config;
pub mod geocode;
pub mod geolocation;
pub mod place;
pub mod planner;
pub mod route;
pub mod scene;
pub mod search;
pub mod surface;
pub mod theme;
pub mod validator;

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

pub use place::{Place, PlaceStore};
pub use planner::TripPlanner;
pub use theme::MapThemeKind;

/// Bengaluru city centre; the map opens here until geolocation answers.
pub const FALLBACK_CENTER: LatLon = LatLon {
    lat: 12.9716,
    lon: 77.5946,
};
pub const FALLBACK_ZOOM: f64 = 11.0;
/// Zoom used when focusing a single point (own position, search hit).
pub const FOCUS_ZOOM: f64 = 13.0;

/// A WGS84 coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle distance in kilometres.
    pub fn distance_km(&self, other: &LatLon) -> f64 {
        let r_km = 6371.0088;
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.lat.to_radians().cos()
                * other.lat.to_radians().cos()
                * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        r_km * c
    }
}

impl std::fmt::Display for LatLon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lon)
    }
}

/// Per-user configuration directory.
///
/// `WANDERLIST_CONFIG_DIR` wins when set, otherwise the platform config dir
/// (e.g. `~/.config/wanderlist` on Linux). Falls back to `./.wanderlist` if the
/// platform has no home directory.
pub fn get_config_root() -> PathBuf {
    if let Ok(dir) = env::var("WANDERLIST_CONFIG_DIR") {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }

    directories::ProjectDirs::from("com", "StarTuz", "wanderlist")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".wanderlist"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_km() {
        let mg_road = LatLon::new(12.9758, 77.6045);
        let lalbagh = LatLon::new(12.9507, 77.5848);
        let d = mg_road.distance_km(&lalbagh);
        assert!(d > 3.0 && d < 4.0, "unexpected distance {}", d);

        assert_eq!(mg_road.distance_km(&mg_road), 0.0);
    }

    #[test]
    fn test_latlon_display() {
        assert_eq!(FALLBACK_CENTER.to_string(), "12.9716, 77.5946");
    }
}
