// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::place::Place;
use serde_json::Value;
use thiserror::Error;

pub const LATITUDE_RANGE: std::ops::RangeInclusive<f64> = -90.0..=90.0;
pub const LONGITUDE_RANGE: std::ops::RangeInclusive<f64> = -180.0..=180.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldIssue {
    #[error("Please enter a destination name.")]
    BlankName,
    #[error("Latitude is not a number.")]
    LatitudeNotANumber,
    #[error("Please enter a valid latitude (-90 to 90), got {0}.")]
    LatitudeOutOfRange(f64),
    #[error("Longitude is not a number.")]
    LongitudeNotANumber,
    #[error("Please enter a valid longitude (-180 to 180), got {0}.")]
    LongitudeOutOfRange(f64),
}

/// Every problem found in one submission of the add-place form.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", join_issues(.issues))]
pub struct FormValidationError {
    pub issues: Vec<FieldIssue>,
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Invalid JSON: please check the format of your JSON data ({0}).")]
    Malformed(#[from] serde_json::Error),
    #[error("Invalid JSON: expected an array of places.")]
    NotAnArray,
}

/// Validates the text fields of the add-place form.
pub fn validate_place(
    name: &str,
    latitude: &str,
    longitude: &str,
    description: &str,
) -> Result<Place, FormValidationError> {
    let mut issues = Vec::new();

    let name = name.trim();
    if name.is_empty() {
        issues.push(FieldIssue::BlankName);
    }

    let lat = match parse_number(latitude) {
        Some(v) if LATITUDE_RANGE.contains(&v) => Some(v),
        Some(v) => {
            issues.push(FieldIssue::LatitudeOutOfRange(v));
            None
        }
        None => {
            issues.push(FieldIssue::LatitudeNotANumber);
            None
        }
    };

    let lon = match parse_number(longitude) {
        Some(v) if LONGITUDE_RANGE.contains(&v) => Some(v),
        Some(v) => {
            issues.push(FieldIssue::LongitudeOutOfRange(v));
            None
        }
        None => {
            issues.push(FieldIssue::LongitudeNotANumber);
            None
        }
    };

    match (lat, lon) {
        (Some(lat), Some(lon)) if issues.is_empty() => Ok(Place::from_checked(
            name.to_string(),
            lat,
            lon,
            description.to_string(),
        )),
        _ => Err(FormValidationError { issues }),
    }
}

/// Same rules as [`validate_place`] for callers that already hold numbers.
pub fn validate_coordinates(
    name: &str,
    latitude: f64,
    longitude: f64,
    description: &str,
) -> Result<Place, FormValidationError> {
    let mut issues = Vec::new();
    let name = name.trim();
    if name.is_empty() {
        issues.push(FieldIssue::BlankName);
    }
    if latitude.is_nan() {
        issues.push(FieldIssue::LatitudeNotANumber);
    } else if !LATITUDE_RANGE.contains(&latitude) {
        issues.push(FieldIssue::LatitudeOutOfRange(latitude));
    }
    if longitude.is_nan() {
        issues.push(FieldIssue::LongitudeNotANumber);
    } else if !LONGITUDE_RANGE.contains(&longitude) {
        issues.push(FieldIssue::LongitudeOutOfRange(longitude));
    }

    if issues.is_empty() {
        Ok(Place::from_checked(
            name.to_string(),
            latitude,
            longitude,
            description.to_string(),
        ))
    } else {
        Err(FormValidationError { issues })
    }
}

// NaN parses fine with str::parse but is still "not a number" for the form.
fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Parses a bulk import payload.
///
/// Only the outer shape can fail the import. Individual records that do not
/// pass the place predicate are dropped and logged.
pub fn validate_import_payload(raw: &str) -> Result<Vec<Place>, ImportError> {
    let parsed: Value = serde_json::from_str(raw)?;
    let Value::Array(items) = parsed else {
        return Err(ImportError::NotAnArray);
    };

    let total = items.len();
    let places: Vec<Place> = items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let place = record_to_place(item);
            if place.is_none() {
                log::warn!("Skipping invalid place record: index={} record={}", index, item);
            }
            place
        })
        .collect();

    log::info!(
        "Import payload validated: records={} accepted={} dropped={}",
        total,
        places.len(),
        total - places.len()
    );
    Ok(places)
}

fn record_to_place(item: &Value) -> Option<Place> {
    let obj = item.as_object()?;
    let name = obj.get("name")?.as_str()?;
    // Only JSON numbers count; "12.9" as a string is rejected. Numbers beyond
    // f64 (1e400) still parse and fail here rather than sinking the payload.
    let latitude = obj.get("latitude").filter(|v| v.is_number())?.as_f64()?;
    let longitude = obj.get("longitude").filter(|v| v.is_number())?.as_f64()?;
    let description = obj.get("description")?.as_str()?;

    validate_coordinates(name, latitude, longitude, description).ok()
}

/// Serialises places in the same shape the importer accepts.
pub fn export_places(places: &[Place]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(places)
}
