use std::collections::BTreeSet;

use super::ValueRange;
use crate::discovery::domain::{
    normalize_label, EntityKind, ListingType, PropertyType, RankedEntity,
};

/// One active constraint. Unconstrained dimensions never produce a predicate.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Predicate {
    Kind(BTreeSet<EntityKind>),
    ListingType(BTreeSet<ListingType>),
    City(BTreeSet<String>),
    PropertyType(BTreeSet<PropertyType>),
    Price(ValueRange),
    Area(ValueRange),
    Bedrooms(u8),
    Bathrooms(u8),
    Amenities(BTreeSet<String>),
    MaxDistance(f64),
    Keyword(String),
}

impl Predicate {
    pub(crate) fn matches(&self, candidate: &RankedEntity) -> bool {
        let entity = &candidate.entity;
        match self {
            Predicate::Kind(kinds) => kinds.contains(&entity.kind()),
            Predicate::ListingType(types) => entity
                .listing_type()
                .is_some_and(|listing_type| types.contains(&listing_type)),
            Predicate::City(cities) => entity
                .city
                .as_deref()
                .is_some_and(|city| cities.contains(&normalize_label(city))),
            Predicate::PropertyType(types) => entity
                .property_type()
                .is_some_and(|property_type| types.contains(&property_type)),
            Predicate::Price(range) => range.contains_measured(entity.price()),
            Predicate::Area(range) => range.contains_measured(entity.area_sqm()),
            Predicate::Bedrooms(count) => entity.bedrooms() == Some(*count),
            Predicate::Bathrooms(count) => entity.bathrooms() == Some(*count),
            Predicate::Amenities(required) => entity
                .amenities()
                .is_some_and(|available| required.is_subset(available)),
            // unknown distance means no user location; the constraint is ignored
            Predicate::MaxDistance(limit) => candidate
                .distance_km
                .map_or(true, |distance| distance <= *limit),
            Predicate::Keyword(needle) => entity.search_text().contains(needle.as_str()),
        }
    }
}
