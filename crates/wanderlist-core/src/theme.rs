// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use serde::{Deserialize, Serialize};

/// A basemap tile source in Leaflet URL-template form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileSource {
    pub display_name: &'static str,
    pub url_template: &'static str,
    pub attribution: &'static str,
    pub subdomains: &'static [&'static str],
    pub max_zoom: u32,
}

impl TileSource {
    /// Expands `{s}`, `{z}`, `{x}`, `{y}` and `{r}` for one tile.
    pub fn tile_url(&self, z: u32, x: u32, y: u32) -> String {
        let mut url = self
            .url_template
            .replace("{z}", &z.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
            .replace("{r}", "");

        if !self.subdomains.is_empty() {
            let idx = (x as usize + y as usize) % self.subdomains.len();
            url = url.replace("{s}", self.subdomains[idx]);
        }
        url
    }
}

/// The fixed catalog of basemaps a user can pick from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapThemeKind {
    #[default]
    OpenStreetMap,
    OpenTopoMap,
    CartoLight,
    CartoDark,
    EsriImagery,
}

const ABC: &[&str] = &["a", "b", "c"];
const ABCD: &[&str] = &["a", "b", "c", "d"];

impl MapThemeKind {
    pub const ALL: [MapThemeKind; 5] = [
        MapThemeKind::OpenStreetMap,
        MapThemeKind::OpenTopoMap,
        MapThemeKind::CartoLight,
        MapThemeKind::CartoDark,
        MapThemeKind::EsriImagery,
    ];

    pub fn source(&self) -> TileSource {
        match self {
            MapThemeKind::OpenStreetMap => TileSource {
                display_name: "OpenStreetMap",
                url_template: "https://tile.openstreetmap.org/{z}/{x}/{y}.png",
                attribution: "© OpenStreetMap contributors",
                subdomains: &[],
                max_zoom: 19,
            },
            MapThemeKind::OpenTopoMap => TileSource {
                display_name: "OpenTopoMap",
                url_template: "https://{s}.tile.opentopomap.org/{z}/{x}/{y}.png",
                attribution: "© OpenStreetMap contributors, SRTM | © OpenTopoMap (CC-BY-SA)",
                subdomains: ABC,
                max_zoom: 17,
            },
            MapThemeKind::CartoLight => TileSource {
                display_name: "CARTO Positron",
                url_template: "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png",
                attribution: "© OpenStreetMap contributors © CARTO",
                subdomains: ABCD,
                max_zoom: 19,
            },
            MapThemeKind::CartoDark => TileSource {
                display_name: "CARTO Dark Matter",
                url_template: "https://{s}.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}{r}.png",
                attribution: "© OpenStreetMap contributors © CARTO",
                subdomains: ABCD,
                max_zoom: 19,
            },
            MapThemeKind::EsriImagery => TileSource {
                display_name: "Esri World Imagery",
                url_template: "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}",
                attribution: "Tiles © Esri — Source: Esri, Maxar, Earthstar Geographics",
                subdomains: &[],
                max_zoom: 18,
            },
        }
    }
}

impl std::fmt::Display for MapThemeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.source().display_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_url_expansion() {
        let osm = MapThemeKind::OpenStreetMap.source();
        assert_eq!(
            osm.tile_url(11, 1462, 945),
            "https://tile.openstreetmap.org/11/1462/945.png"
        );

        // Esri swaps x and y in the path.
        let esri = MapThemeKind::EsriImagery.source();
        assert!(esri.tile_url(3, 5, 2).ends_with("/tile/3/2/5"));
    }

    #[test]
    fn test_subdomain_rotation_and_retina_placeholder() {
        let carto = MapThemeKind::CartoDark.source();
        let url = carto.tile_url(1, 0, 1);
        assert_eq!(url, "https://b.basemaps.cartocdn.com/dark_all/1/0/1.png");
        assert!(!url.contains('{'));
    }

    #[test]
    fn test_catalog_is_complete_and_named() {
        for theme in MapThemeKind::ALL {
            let source = theme.source();
            assert!(!source.display_name.is_empty());
            assert!(!source.attribution.is_empty());
            assert!(source.url_template.contains("{z}"));
        }
        assert_eq!(MapThemeKind::default(), MapThemeKind::OpenStreetMap);
    }
}
