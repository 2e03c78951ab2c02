use std::collections::{BTreeSet, HashMap};

use super::domain::{
    normalize_label, EntityDetails, EntityId, ListingDetails, ListingType, LocatedEntity,
    MarkerCategory, ProfessionalDetails, Profession, ProjectDetails, PropertyType,
};
use super::feeds::{DeveloperProjectRecord, ListingRecord, ProfessionalRecord};
use crate::geo::Coordinate;

/// Why a source record did not make it into the working set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Rejection {
    MissingCoordinate,
    UnknownCategory(String),
}

pub(crate) fn normalize_listing(record: ListingRecord) -> Result<LocatedEntity, Rejection> {
    let coordinate = Coordinate::from_parts(record.latitude, record.longitude)
        .ok_or(Rejection::MissingCoordinate)?;
    let listing_type = ListingType::parse(&record.listing_type)
        .ok_or_else(|| Rejection::UnknownCategory(record.listing_type.clone()))?;

    Ok(LocatedEntity {
        id: EntityId(record.id),
        coordinate,
        city: clean_text(record.city),
        category: listing_type.marker_category(),
        details: EntityDetails::Listing(ListingDetails {
            title: record.title.trim().to_string(),
            listing_type,
            property_type: record.property_type.as_deref().and_then(PropertyType::parse),
            price: measured(record.price),
            area_sqm: measured(record.area_sqm),
            bedrooms: record.bedrooms,
            bathrooms: record.bathrooms,
            amenities: normalize_amenities(&record.amenities),
            listed_on: record.listed_on,
        }),
    })
}

/// `names` holds whatever the profile lookup resolved; absent ids blank the field.
pub(crate) fn normalize_professional(
    record: ProfessionalRecord,
    names: &HashMap<String, String>,
) -> Result<LocatedEntity, Rejection> {
    let coordinate = Coordinate::from_parts(record.latitude, record.longitude)
        .ok_or(Rejection::MissingCoordinate)?;
    let profession = Profession::parse(&record.profession)
        .ok_or_else(|| Rejection::UnknownCategory(record.profession.clone()))?;
    let display_name = record
        .owner_profile_id
        .as_ref()
        .and_then(|profile_id| names.get(profile_id))
        .cloned()
        .unwrap_or_default();

    Ok(LocatedEntity {
        id: EntityId(record.id),
        coordinate,
        city: clean_text(record.city),
        category: profession.marker_category(),
        details: EntityDetails::Professional(ProfessionalDetails {
            office_name: record.office_name.trim().to_string(),
            profession,
            display_name,
            phone: clean_text(record.phone),
        }),
    })
}

pub(crate) fn normalize_project(
    record: DeveloperProjectRecord,
) -> Result<LocatedEntity, Rejection> {
    let coordinate = Coordinate::from_parts(record.latitude, record.longitude)
        .ok_or(Rejection::MissingCoordinate)?;

    Ok(LocatedEntity {
        id: EntityId(record.id),
        coordinate,
        city: clean_text(record.city),
        category: MarkerCategory::Developer,
        details: EntityDetails::DeveloperProject(ProjectDetails {
            name: record.name.trim().to_string(),
            developer_name: record.developer_name.trim().to_string(),
            starting_price: measured(record.starting_price),
            unit_count: record.unit_count,
            expected_completion: record.expected_completion,
        }),
    })
}

pub(crate) fn normalize_amenities(values: &[String]) -> BTreeSet<String> {
    values
        .iter()
        .map(|value| normalize_label(value))
        .filter(|value| !value.is_empty())
        .collect()
}

fn measured(value: Option<f64>) -> Option<f64> {
    value.filter(|number| number.is_finite() && *number >= 0.0)
}

fn clean_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
