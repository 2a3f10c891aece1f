// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::config::GeolocationConfig;
use crate::surface::Liveness;
use crate::LatLon;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("Locating you took too long; showing the default view.")]
    Timeout,
    #[error("Location access was denied; showing the default view.")]
    PermissionDenied,
    #[error("Your position is unavailable; showing the default view.")]
    PositionUnavailable,
    #[error("Geolocation is not supported here; showing the default view.")]
    Unsupported,
}

/// One-shot "where am I" lookup.
pub trait Geolocator {
    fn current_position(&self) -> Result<LatLon, GeolocationError>;
}

/// A geolocation lookup bound to the map instance that asked for it.
#[derive(Debug, Clone, Copy)]
pub struct GeolocationRequest {
    ticket: Liveness,
}

impl GeolocationRequest {
    pub(crate) fn new(ticket: Liveness) -> Self {
        Self { ticket }
    }

    pub fn run(self, locator: &dyn Geolocator) -> GeolocationOutcome {
        GeolocationOutcome {
            ticket: self.ticket,
            result: locator.current_position(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeolocationOutcome {
    pub ticket: Liveness,
    pub result: Result<LatLon, GeolocationError>,
}

/// Used when geolocation is switched off.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoGeolocation;

impl Geolocator for NoGeolocation {
    fn current_position(&self) -> Result<LatLon, GeolocationError> {
        Err(GeolocationError::Unsupported)
    }
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(default)]
    message: Option<String>,
}

/// Approximate position from the public IP address (ip-api.com JSON format).
pub struct IpGeolocator {
    endpoint: String,
    timeout: Duration,
}

impl IpGeolocator {
    pub fn new(config: &GeolocationConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Builds the locator the config asks for.
    pub fn from_config(config: &GeolocationConfig) -> Box<dyn Geolocator + Send + Sync> {
        if config.enabled {
            Box::new(Self::new(config))
        } else {
            Box::new(NoGeolocation)
        }
    }
}

impl Geolocator for IpGeolocator {
    fn current_position(&self) -> Result<LatLon, GeolocationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| {
                log::error!("Could not build geolocation client: {}", e);
                GeolocationError::Unsupported
            })?;

        log::debug!("Requesting IP geolocation: url={}", self.endpoint);
        let response = client.get(&self.endpoint).send().map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status.as_u16()));
        }

        let body = response.text().map_err(classify_transport)?;
        parse_position(&body)
    }
}

fn classify_transport(e: reqwest::Error) -> GeolocationError {
    if e.is_timeout() {
        GeolocationError::Timeout
    } else {
        log::warn!("Geolocation request failed: error={}", e);
        GeolocationError::PositionUnavailable
    }
}

fn classify_status(status: u16) -> GeolocationError {
    match status {
        401 | 403 | 429 => GeolocationError::PermissionDenied,
        408 | 504 => GeolocationError::Timeout,
        _ => GeolocationError::PositionUnavailable,
    }
}

fn parse_position(body: &str) -> Result<LatLon, GeolocationError> {
    let parsed: IpApiResponse =
        serde_json::from_str(body).map_err(|_| GeolocationError::PositionUnavailable)?;

    if parsed.status.as_deref() == Some("fail") {
        log::warn!(
            "Geolocation service could not place this address: message={}",
            parsed.message.as_deref().unwrap_or("unknown")
        );
        return Err(GeolocationError::PositionUnavailable);
    }

    match (parsed.lat, parsed.lon) {
        (Some(lat), Some(lon))
            if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) =>
        {
            Ok(LatLon::new(lat, lon))
        }
        _ => Err(GeolocationError::PositionUnavailable),
    }
}
