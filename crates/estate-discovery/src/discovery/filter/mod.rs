//! Compound filtering and ranking over the discovery working set.
//!
//! Every dimension of [`FilterCriteria`] is independent. An empty set or an
//! open range means "unconstrained"; the combined filter is the AND of the
//! constrained dimensions only. Entities lacking a measured field fail an
//! active constraint on that field and pass when it is unconstrained.

mod predicates;
mod ranking;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

use super::domain::{normalize_label, EntityKind, ListingType, PropertyType, RankedEntity};
use predicates::Predicate;

pub use ranking::{rank, rank_by_distance, sort_entities, SortOrder};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("{dimension} range has min greater than max")]
    InvalidFilterRange { dimension: &'static str },
}

/// Inclusive `[min, max]` bound; either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl ValueRange {
    pub const fn unconstrained() -> Self {
        Self {
            min: None,
            max: None,
        }
    }

    pub const fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub const fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    pub const fn at_most(max: f64) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    pub fn is_active(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }

    fn is_inverted(&self) -> bool {
        match (self.min, self.max) {
            (Some(min), Some(max)) => min > max || min.is_nan() || max.is_nan(),
            (Some(bound), None) | (None, Some(bound)) => bound.is_nan(),
            (None, None) => false,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }

    /// A missing measurement never satisfies an active range.
    pub fn contains_measured(&self, value: Option<f64>) -> bool {
        value.is_some_and(|value| self.contains(value))
    }
}

/// Immutable set of constraints applied to the working set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub kinds: BTreeSet<EntityKind>,
    pub listing_types: BTreeSet<ListingType>,
    pub cities: BTreeSet<String>,
    pub property_types: BTreeSet<PropertyType>,
    pub price: ValueRange,
    pub area_sqm: ValueRange,
    pub bedrooms: Option<u8>,
    pub bathrooms: Option<u8>,
    pub amenities: BTreeSet<String>,
    pub max_distance_km: Option<f64>,
    pub keyword: Option<String>,
}

impl FilterCriteria {
    pub fn unconstrained() -> Self {
        Self::default()
    }

    pub fn with_kind(mut self, kind: EntityKind) -> Self {
        self.kinds.insert(kind);
        self
    }

    pub fn with_listing_type(mut self, listing_type: ListingType) -> Self {
        self.listing_types.insert(listing_type);
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.cities.insert(city.into());
        self
    }

    pub fn with_property_type(mut self, property_type: PropertyType) -> Self {
        self.property_types.insert(property_type);
        self
    }

    pub fn with_price(mut self, range: ValueRange) -> Self {
        self.price = range;
        self
    }

    pub fn with_area(mut self, range: ValueRange) -> Self {
        self.area_sqm = range;
        self
    }

    pub fn with_bedrooms(mut self, count: u8) -> Self {
        self.bedrooms = Some(count);
        self
    }

    pub fn with_bathrooms(mut self, count: u8) -> Self {
        self.bathrooms = Some(count);
        self
    }

    pub fn with_amenity(mut self, amenity: impl Into<String>) -> Self {
        self.amenities.insert(amenity.into());
        self
    }

    pub fn with_max_distance_km(mut self, limit: f64) -> Self {
        self.max_distance_km = Some(limit);
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    /// True when no dimension is constrained.
    pub fn is_unconstrained(&self) -> bool {
        self.predicates().is_empty()
    }

    pub fn validate(&self) -> Result<(), FilterError> {
        if self.price.is_inverted() {
            return Err(FilterError::InvalidFilterRange { dimension: "price" });
        }
        if self.area_sqm.is_inverted() {
            return Err(FilterError::InvalidFilterRange { dimension: "area" });
        }
        if let Some(limit) = self.max_distance_km {
            if limit.is_nan() || limit < 0.0 {
                return Err(FilterError::InvalidFilterRange {
                    dimension: "distance",
                });
            }
        }
        Ok(())
    }

    pub(crate) fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();

        if !self.kinds.is_empty() {
            predicates.push(Predicate::Kind(self.kinds.clone()));
        }
        if !self.listing_types.is_empty() {
            predicates.push(Predicate::ListingType(self.listing_types.clone()));
        }
        let cities = normalized_set(&self.cities);
        if !cities.is_empty() {
            predicates.push(Predicate::City(cities));
        }
        if !self.property_types.is_empty() {
            predicates.push(Predicate::PropertyType(self.property_types.clone()));
        }
        if self.price.is_active() {
            predicates.push(Predicate::Price(self.price));
        }
        if self.area_sqm.is_active() {
            predicates.push(Predicate::Area(self.area_sqm));
        }
        if let Some(count) = self.bedrooms {
            predicates.push(Predicate::Bedrooms(count));
        }
        if let Some(count) = self.bathrooms {
            predicates.push(Predicate::Bathrooms(count));
        }
        let amenities = normalized_set(&self.amenities);
        if !amenities.is_empty() {
            predicates.push(Predicate::Amenities(amenities));
        }
        if let Some(limit) = self.max_distance_km {
            predicates.push(Predicate::MaxDistance(limit));
        }
        if let Some(keyword) = self.keyword.as_deref().map(normalize_label) {
            if !keyword.is_empty() {
                predicates.push(Predicate::Keyword(keyword));
            }
        }

        predicates
    }
}

fn normalized_set(values: &BTreeSet<String>) -> BTreeSet<String> {
    values
        .iter()
        .map(|value| normalize_label(value))
        .filter(|value| !value.is_empty())
        .collect()
}

/// Keeps the entities satisfying every active constraint, preserving order.
///
/// Invalid ranges (e.g. min above max) yield no matches instead of an error;
/// they are reachable through ordinary slider interaction.
pub fn apply_filters(entities: &[RankedEntity], criteria: &FilterCriteria) -> Vec<RankedEntity> {
    if let Err(err) = criteria.validate() {
        debug!(error = %err, "filter criteria cannot match anything");
        return Vec::new();
    }

    let predicates = criteria.predicates();
    entities
        .iter()
        .filter(|entity| predicates.iter().all(|predicate| predicate.matches(entity)))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::tests::common::{listing, office, project, ranked_fixture};

    #[test]
    fn unconstrained_criteria_is_identity() {
        let entities = ranked_fixture();
        let criteria = FilterCriteria::unconstrained();
        assert!(criteria.is_unconstrained());
        assert_eq!(apply_filters(&entities, &criteria), entities);
    }

    #[test]
    fn blank_strings_do_not_constrain() {
        let entities = ranked_fixture();
        let criteria = FilterCriteria::default()
            .with_city("   ")
            .with_amenity("")
            .with_keyword(" ");
        assert!(criteria.is_unconstrained());
        assert_eq!(apply_filters(&entities, &criteria), entities);
    }

    #[test]
    fn missing_area_is_excluded_only_under_active_area_filter() {
        let entities = vec![
            RankedEntity::unranked(listing("with-area", 400_000.0, Some(150.0), &[])),
            RankedEntity::unranked(listing("no-area", 400_000.0, None, &[])),
        ];

        let unfiltered = apply_filters(&entities, &FilterCriteria::default());
        assert_eq!(unfiltered.len(), 2);

        let filtered = apply_filters(
            &entities,
            &FilterCriteria::default().with_area(ValueRange::between(100.0, 200.0)),
        );
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].entity.id.0, "with-area");
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let entities = vec![
            RankedEntity::unranked(listing("low", 100.0, None, &[])),
            RankedEntity::unranked(listing("high", 200.0, None, &[])),
            RankedEntity::unranked(listing("over", 200.01, None, &[])),
        ];
        let filtered = apply_filters(
            &entities,
            &FilterCriteria::default().with_price(ValueRange::between(100.0, 200.0)),
        );
        let ids: Vec<_> = filtered.iter().map(|e| e.entity.id.0.as_str()).collect();
        assert_eq!(ids, vec!["low", "high"]);
    }

    #[test]
    fn inverted_range_yields_no_matches() {
        let entities = ranked_fixture();
        let criteria = FilterCriteria::default().with_price(ValueRange::between(900.0, 100.0));
        assert_eq!(
            criteria.validate(),
            Err(FilterError::InvalidFilterRange { dimension: "price" })
        );
        assert!(apply_filters(&entities, &criteria).is_empty());
    }

    #[test]
    fn city_match_ignores_case_and_spacing() {
        let entities = ranked_fixture();
        let filtered = apply_filters(&entities, &FilterCriteria::default().with_city(" riyadh"));
        assert!(!filtered.is_empty());
        assert!(filtered
            .iter()
            .all(|entity| entity.entity.city.as_deref() == Some("Riyadh")));
    }

    #[test]
    fn price_filter_covers_projects_but_not_offices() {
        let entities = vec![
            RankedEntity::unranked(project("p-1", Some(750_000.0))),
            RankedEntity::unranked(office("o-1")),
        ];
        let filtered = apply_filters(
            &entities,
            &FilterCriteria::default().with_price(ValueRange::at_most(800_000.0)),
        );
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].entity.kind(), EntityKind::DeveloperProject);
    }

    #[test]
    fn max_distance_is_ignored_without_user_location() {
        let entities = ranked_fixture();
        let filtered = apply_filters(
            &entities,
            &FilterCriteria::default().with_max_distance_km(0.5),
        );
        assert_eq!(filtered, entities);
    }

    #[test]
    fn negative_distance_limit_is_invalid() {
        let criteria = FilterCriteria::default().with_max_distance_km(-1.0);
        assert!(criteria.validate().is_err());
        assert!(apply_filters(&ranked_fixture(), &criteria).is_empty());
    }

    #[test]
    fn criteria_deserialize_with_missing_fields() {
        let criteria: FilterCriteria =
            serde_json::from_str(r#"{"cities":["Jeddah"],"price":{"max":900000}}"#)
                .expect("criteria parse");
        assert_eq!(criteria.price, ValueRange::at_most(900_000.0));
        assert!(criteria.kinds.is_empty());
        assert_eq!(criteria.predicates().len(), 2);
    }
}
