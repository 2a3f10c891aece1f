// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::config::GeocoderConfig;
use crate::search::{GeocodeMatch, Geocoder, SearchError};
use crate::LatLon;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
}

/// Geocoder for the Nominatim `/search` API.
pub struct NominatimGeocoder {
    endpoint: String,
    user_agent: String,
    limit: u32,
    timeout: Duration,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocoderConfig) -> Self {
        Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            user_agent: config.user_agent.clone(),
            limit: config.result_limit.max(1),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn search_url(&self, query: &str) -> Result<url::Url, SearchError> {
        let limit = self.limit.to_string();
        url::Url::parse_with_params(
            &format!("{}/search", self.endpoint),
            &[("format", "json"), ("limit", limit.as_str()), ("q", query)],
        )
        .map_err(|e| SearchError::TransportFailure(format!("bad geocoder endpoint: {}", e)))
    }
}

impl Geocoder for NominatimGeocoder {
    fn geocode(&self, query: &str) -> Result<Option<GeocodeMatch>, SearchError> {
        let url = self.search_url(query)?;
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.clone())
            .build()
            .map_err(transport)?;

        let response = client.get(url).send().map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::TransportFailure(format!("HTTP {}", status.as_u16())));
        }

        let body = response.text().map_err(transport)?;
        parse_response(&body)
    }
}

fn transport(e: reqwest::Error) -> SearchError {
    if e.is_timeout() {
        SearchError::TransportFailure("request timed out".to_string())
    } else {
        SearchError::TransportFailure(e.to_string())
    }
}

/// Picks the top hit out of a Nominatim JSON response.
pub fn parse_response(body: &str) -> Result<Option<GeocodeMatch>, SearchError> {
    let places: Vec<NominatimPlace> = serde_json::from_str(body)
        .map_err(|e| SearchError::TransportFailure(format!("unexpected response: {}", e)))?;

    let Some(top) = places.into_iter().next() else {
        return Ok(None);
    };

    let lat = top.lat.trim().parse::<f64>();
    let lon = top.lon.trim().parse::<f64>();
    match (lat, lon) {
        (Ok(lat), Ok(lon)) if lat.is_finite() && lon.is_finite() => Ok(Some(GeocodeMatch {
            position: LatLon::new(lat, lon),
            display_name: top.display_name,
        })),
        _ => Err(SearchError::TransportFailure(format!(
            "unexpected coordinates {:?}, {:?}",
            top.lat, top.lon
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_top_match() {
        let body = r#"[
            {"place_id":1,"lat":"12.9507","lon":"77.5848","display_name":"Lalbagh Botanical Garden, Bengaluru"},
            {"place_id":2,"lat":"0","lon":"0","display_name":"Elsewhere"}
        ]"#;
        let found = parse_response(body).unwrap().unwrap();
        assert_eq!(found.position, LatLon::new(12.9507, 77.5848));
        assert_eq!(found.display_name, "Lalbagh Botanical Garden, Bengaluru");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(parse_response("[]").unwrap(), None);
    }

    #[test]
    fn test_parse_errors_are_transport_failures() {
        assert!(matches!(
            parse_response(r#"{"error":"nope"}"#),
            Err(SearchError::TransportFailure(_))
        ));
        assert!(matches!(
            parse_response(r#"[{"lat":"north","lon":"1","display_name":"x"}]"#),
            Err(SearchError::TransportFailure(_))
        ));
    }

    #[test]
    fn test_search_url_encodes_query() {
        let geocoder = NominatimGeocoder::new(&GeocoderConfig {
            endpoint: "https://nominatim.example.org/".to_string(),
            ..GeocoderConfig::default()
        });
        let url = geocoder.search_url("Lalbagh & Garden").unwrap();
        assert_eq!(url.path(), "/search");
        let q = url
            .query_pairs()
            .find(|(k, _)| k == "q")
            .map(|(_, v)| v.into_owned());
        assert_eq!(q.as_deref(), Some("Lalbagh & Garden"));
        assert!(url.as_str().contains("limit=1"));
    }
}
