// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::validator::{self, FormValidationError};
use crate::LatLon;
use serde::Serialize;

/// A saved, named point on the map.
///
/// Fields are private: a `Place` can only come out of the validator, so every
/// value in a [`PlaceStore`] has a non-blank trimmed name and in-range
/// coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Place {
    name: String,
    latitude: f64,
    longitude: f64,
    description: String,
}

impl Place {
    /// Builds a place from already-numeric coordinates.
    pub fn new(
        name: &str,
        latitude: f64,
        longitude: f64,
        description: &str,
    ) -> Result<Self, FormValidationError> {
        validator::validate_coordinates(name, latitude, longitude, description)
    }

    pub(crate) fn from_checked(
        name: String,
        latitude: f64,
        longitude: f64,
        description: String,
    ) -> Self {
        Self {
            name,
            latitude,
            longitude,
            description,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn position(&self) -> LatLon {
        LatLon::new(self.latitude, self.longitude)
    }
}

/// Ordered list of saved places. Append and full replace only.
///
/// Every mutation bumps [`PlaceStore::revision`], which is how the map layers
/// notice they are out of date.
#[derive(Debug, Clone, Default)]
pub struct PlaceStore {
    places: Vec<Place>,
    revision: u64,
}

impl PlaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, place: Place) {
        log::debug!(
            "Adding place: name={} position={}",
            place.name,
            place.position()
        );
        self.places.push(place);
        self.revision += 1;
    }

    pub fn replace_all(&mut self, places: Vec<Place>) {
        log::debug!(
            "Replacing place list: old_count={} new_count={}",
            self.places.len(),
            places.len()
        );
        self.places = places;
        self.revision += 1;
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// First place with this name. Duplicate names alias to the earliest entry.
    pub fn find(&self, name: &str) -> Option<&Place> {
        self.places.iter().find(|p| p.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.places.iter().map(|p| p.name.clone()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Place> {
        self.places.iter()
    }

    pub fn as_slice(&self) -> &[Place] {
        &self.places
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

impl<'a> IntoIterator for &'a PlaceStore {
    type Item = &'a Place;
    type IntoIter = std::slice::Iter<'a, Place>;

    fn into_iter(self) -> Self::IntoIter {
        self.places.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(name: &str) -> Place {
        Place::new(name, 12.97, 77.59, "").unwrap()
    }

    #[test]
    fn test_add_preserves_order_and_bumps_revision() {
        let mut store = PlaceStore::new();
        assert_eq!(store.revision(), 0);

        store.add(place("Cubbon Park"));
        store.add(place("MG Road"));

        assert_eq!(store.names(), vec!["Cubbon Park", "MG Road"]);
        assert_eq!(store.revision(), 2);
    }

    #[test]
    fn test_replace_all_swaps_everything() {
        let mut store = PlaceStore::new();
        store.add(place("Cubbon Park"));
        store.replace_all(vec![place("Ulsoor Lake")]);

        assert_eq!(store.len(), 1);
        assert!(store.find("Cubbon Park").is_none());
        assert!(store.find("Ulsoor Lake").is_some());
        assert_eq!(store.revision(), 2);
    }

    #[test]
    fn test_duplicate_names_alias_to_first() {
        let mut store = PlaceStore::new();
        store.add(Place::new("Temple", 12.0, 77.0, "first").unwrap());
        store.add(Place::new("Temple", 13.0, 78.0, "second").unwrap());

        assert_eq!(store.find("Temple").unwrap().description(), "first");
    }
}
